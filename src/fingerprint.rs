//! Content fingerprints
//!
//! A fingerprint is the SHA-256 digest of a file's full byte content, rendered
//! as 64 lowercase hex characters. It is used purely as a content-equality
//! test: two files with the same fingerprint are treated as the same content.
//!
//! Files are streamed through the hasher in fixed-size chunks, so arbitrarily
//! large files can be fingerprinted without loading them into memory.
//!
//! ```rust,no_run
//! use mtimekeeper::fingerprint::fingerprint_file;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let hash = fingerprint_file(Path::new("Cargo.toml"))?;
//! assert_eq!(hash.len(), 64);
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Length of a fingerprint in hex characters
pub const FINGERPRINT_LEN: usize = 64;

const BUFFER_SIZE: usize = 8192;

/// Hash a file's content using SHA-256
///
/// # Errors
///
/// - [`MtimeError::Io`](crate::MtimeError::Io) if the file cannot be opened or
///   a read fails part way through
pub fn fingerprint_file(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    fingerprint_reader(file)
}

/// Hash everything a reader yields until EOF
pub fn fingerprint_reader<R: Read>(mut reader: R) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Hash data that is already in memory
pub fn fingerprint_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Check that a string has the shape of a fingerprint
pub fn is_valid_fingerprint(value: &str) -> bool {
    value.len() == FINGERPRINT_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}
