use sha2::{Digest, Sha256};

/// SHA-256 fingerprint of `bytes`, truncated to `length` lowercase hex characters.
pub fn content_fingerprint(bytes: &[u8], length: usize) -> String {
  let digest = Sha256::digest(bytes);
  let mut hex = format!("{:x}", digest);
  hex.truncate(length.min(hex.len()));
  hex
}
