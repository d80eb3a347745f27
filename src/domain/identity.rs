//! Content-addressed product identity.
//!
//! Products and their reviews land in two separate datasets; the identity is
//! the only join key between them, so it must be stable across runs and must
//! not depend on page state. It is derived from the product URL plus the
//! product title (title may be empty when the page failed to expose one).

/// Derive the stable 8-character product identity from `url` and `title`.
///
/// The identity is the first 8 hex characters of a BLAKE3 digest of
/// `url || title`, always lowercase. Identical inputs always produce the
/// identical identity.
pub fn identity(url: &str, title: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(url.as_bytes());
    hasher.update(title.as_bytes());
    hasher.finalize().to_hex()[..8].to_string()
}
