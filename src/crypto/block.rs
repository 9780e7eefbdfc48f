//! Merkle-Damgård compression primitives behind the transcript hash.
//!
//! A [`BlockHasher`] exposes the raw compression step and the length padding of
//! an existing hash function, so the transcript can keep its own
//! `(length, accumulator, pending)` state and finalize any prefix without
//! consuming it.
//!
//! 握手记录哈希所依赖的 Merkle-Damgård 压缩原语。
//!
//! [`BlockHasher`] 暴露已有哈希函数的原始压缩步骤和长度填充，
//! 使握手记录能够自行维护 `(长度, 累加器, 待处理字节)` 状态，
//! 并在不消耗状态的情况下对任意前缀进行最终计算。
use sha2::digest::generic_array::GenericArray;
use std::fmt::Debug;

/// A fixed-block compression function with an injective length suffix.
///
/// Implementations must satisfy:
/// - `(len + suffix(len).len()) % BLOCK_LEN == 0`
/// - `suffix(len)` is non-empty and distinct lengths yield distinct padded encodings.
pub trait BlockHasher: Debug + Clone + 'static {
    /// Size of one compression block in bytes.
    const BLOCK_LEN: usize;
    /// Size of a finalized tag in bytes.
    const TAG_LEN: usize;

    /// The accumulator carried between blocks.
    type State: Debug + Clone + PartialEq + Eq;

    /// The accumulator before any block has been consumed.
    fn initial() -> Self::State;

    /// Folds exactly one block of `BLOCK_LEN` bytes into `state`.
    fn compress(state: &mut Self::State, block: &[u8]);

    /// Padding appended to a message of `len` bytes before the last blocks are folded.
    fn suffix(len: u64) -> Vec<u8>;

    /// Serializes the accumulator into a (possibly truncated) tag.
    fn output(state: &Self::State) -> Vec<u8>;
}

/// SHA-256 compression: 64-byte blocks, 32-byte tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Block;

const SHA256_IV: [u32; 8] = [
    0x6a09e667, 0xbb67ae85, 0x3c6ef372, 0xa54ff53a, 0x510e527f, 0x9b05688c, 0x1f83d9ab,
    0x5be0cd19,
];

impl BlockHasher for Sha256Block {
    const BLOCK_LEN: usize = 64;
    const TAG_LEN: usize = 32;
    type State = [u32; 8];

    fn initial() -> Self::State {
        SHA256_IV
    }

    fn compress(state: &mut Self::State, block: &[u8]) {
        debug_assert_eq!(block.len(), Self::BLOCK_LEN);
        sha2::compress256(state, std::slice::from_ref(GenericArray::from_slice(block)));
    }

    fn suffix(len: u64) -> Vec<u8> {
        md_suffix(len as u128, Self::BLOCK_LEN, 8)
    }

    fn output(state: &Self::State) -> Vec<u8> {
        state.iter().flat_map(|word| word.to_be_bytes()).collect()
    }
}

/// SHA-384 compression: SHA-512 blocks of 128 bytes, tag truncated to 48 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha384Block;

const SHA384_IV: [u64; 8] = [
    0xcbbb9d5dc1059ed8,
    0x629a292a367cd507,
    0x9159015a3070dd17,
    0x152fecd8f70e5939,
    0x67332667ffc00b31,
    0x8eb44a8768581511,
    0xdb0c2e0d64f98fa7,
    0x47b5481dbefa4fa4,
];

impl BlockHasher for Sha384Block {
    const BLOCK_LEN: usize = 128;
    const TAG_LEN: usize = 48;
    type State = [u64; 8];

    fn initial() -> Self::State {
        SHA384_IV
    }

    fn compress(state: &mut Self::State, block: &[u8]) {
        debug_assert_eq!(block.len(), Self::BLOCK_LEN);
        sha2::compress512(state, std::slice::from_ref(GenericArray::from_slice(block)));
    }

    fn suffix(len: u64) -> Vec<u8> {
        md_suffix(len as u128, Self::BLOCK_LEN, 16)
    }

    fn output(state: &Self::State) -> Vec<u8> {
        state
            .iter()
            .take(Self::TAG_LEN / 8)
            .flat_map(|word| word.to_be_bytes())
            .collect()
    }
}

/// Standard Merkle-Damgård strengthening: `0x80`, zero fill, then the big-endian
/// bit length in a field of `len_field` bytes.
fn md_suffix(len: u128, block_len: usize, len_field: usize) -> Vec<u8> {
    let used = (len % block_len as u128) as usize;
    let zeros = (2 * block_len - used - 1 - len_field) % block_len;

    let mut suffix = Vec::with_capacity(1 + zeros + len_field);
    suffix.push(0x80);
    suffix.resize(1 + zeros, 0);
    let bits = len.wrapping_mul(8).to_be_bytes();
    suffix.extend_from_slice(&bits[bits.len() - len_field..]);
    suffix
}
