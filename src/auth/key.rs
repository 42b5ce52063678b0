//! Cache-key derivation for credential pairs.

// self
use crate::{_prelude::*, auth::credentials::Credentials};

/// Map key identifying a credential pair without storing the raw secret.
///
/// The secret fingerprint is a 32-bit non-cryptographic string hash; it only keeps the secret
/// out of the key space and is not a security boundary.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);
impl CacheKey {
	/// Derives the key for an `(app_id, app_secret)` pair.
	pub fn derive(app_id: &str, app_secret: &str) -> Self {
		Self(format!("{app_id}_{}", fingerprint(app_secret)))
	}

	/// Derives the key for a [`Credentials`] value.
	pub fn for_credentials(credentials: &Credentials) -> Self {
		Self::derive(credentials.app_id(), credentials.app_secret().expose())
	}

	/// Returns the key as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Debug for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "CacheKey({})", self.0)
	}
}
impl Display for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// `h = h * 31 + unit` over UTF-16 code units with 32-bit wrap-around, rendered as the base-36
/// absolute value.
fn fingerprint(value: &str) -> String {
	let hash = value.encode_utf16().fold(0_i32, |hash, unit| {
		hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(i32::from(unit))
	});

	to_base36(i64::from(hash).unsigned_abs())
}

fn to_base36(mut value: u64) -> String {
	const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

	if value == 0 {
		return "0".into();
	}

	let mut buf = Vec::new();

	while value > 0 {
		buf.push(DIGITS[(value % 36) as usize]);
		value /= 36;
	}

	buf.iter().rev().map(|&digit| char::from(digit)).collect()
}
