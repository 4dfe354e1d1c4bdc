//! Derives the stable 32-bit key a bulkhead's resource name maps to.

use sha1::{Digest, Sha1};

/// A stable 32-bit key derived from a resource name: the first four bytes of
/// `SHA-1(name)`, big-endian. Two processes registering the same name always
/// arrive at the same key, which is what lets them attach to the same named
/// semaphore set without a side channel.
pub fn resource_key(name: &str) -> u32 {
    let digest = Sha1::digest(name.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// The OS object name a resource key maps to, kept short enough for platforms
/// that cap named-semaphore/shared-memory identifiers (macOS: `PSHMNAMLEN` = 31).
pub fn semaphore_name(prefix: Option<&str>, key: u32) -> String {
    match prefix {
        Some(p) => format!("/sm{p}{key:08x}"),
        None => format!("/sm{key:08x}"),
    }
}
