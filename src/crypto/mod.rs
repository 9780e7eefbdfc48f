//! Hashing and MAC comparison primitives.
//! 哈希与 MAC 比较原语。

pub mod block;
pub mod mac;

pub use block::{BlockHasher, Sha256Block, Sha384Block};
pub use mac::mac_verify;
