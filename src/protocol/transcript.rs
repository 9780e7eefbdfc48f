//! Incremental hashing of the handshake transcript.
//!
//! [`HashState`] keeps `(total length, accumulator, pending bytes)` and can only
//! be built by [`HashState::start`] and advanced by [`HashState::extend`], so a
//! state always describes exactly the bytes that were fed to it. Finalizing
//! works on a copy, which lets the log take a tag at any prefix and keep going.
//!
//! 握手记录的增量哈希。
//!
//! [`HashState`] 维护 `(总长度, 累加器, 待处理字节)`，只能通过
//! [`HashState::start`] 创建、通过 [`HashState::extend`] 推进，
//! 因此状态总是精确对应于已输入的字节。最终计算作用于副本，
//! 使日志可以在任意前缀处取标签并继续累积。
use crate::crypto::block::{BlockHasher, Sha256Block};
use crate::error::{EncodeError, HandshakeError, Result};
use crate::protocol::message::HandshakeMessage;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// A finalized transcript hash, bound to the byte prefix that produced it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Tag(Vec<u8>);

impl Tag {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Tag(")?;
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        f.write_str(")")
    }
}

/// Running hash state over a byte stream.
pub struct HashState<H: BlockHasher = Sha256Block> {
    total_len: u64,
    accumulator: H::State,
    pending: Vec<u8>,
    _hasher: PhantomData<H>,
}

impl<H: BlockHasher> HashState<H> {
    /// The state of the empty input.
    pub fn start() -> Self {
        Self {
            total_len: 0,
            accumulator: H::initial(),
            pending: Vec::with_capacity(H::BLOCK_LEN),
            _hasher: PhantomData,
        }
    }

    /// Appends `bytes`, folding every completed block into the accumulator.
    ///
    /// Any split of the input across calls yields the same state.
    ///
    /// 追加 `bytes`，并将每个已填满的块折叠进累加器。
    /// 无论输入如何在多次调用间切分，得到的状态都相同。
    pub fn extend(&mut self, bytes: &[u8]) {
        self.total_len += bytes.len() as u64;
        let mut input = bytes;

        if !self.pending.is_empty() {
            let missing = H::BLOCK_LEN - self.pending.len();
            if input.len() < missing {
                self.pending.extend_from_slice(input);
                return;
            }
            let (head, rest) = input.split_at(missing);
            self.pending.extend_from_slice(head);
            H::compress(&mut self.accumulator, &self.pending);
            self.pending.clear();
            input = rest;
        }

        let mut blocks = input.chunks_exact(H::BLOCK_LEN);
        for block in &mut blocks {
            H::compress(&mut self.accumulator, block);
        }
        self.pending.extend_from_slice(blocks.remainder());
    }

    /// Tag of everything fed so far. Does not consume the state.
    pub fn finalize(&self) -> Tag {
        let mut accumulator = self.accumulator.clone();
        let mut tail = self.pending.clone();
        tail.extend_from_slice(&H::suffix(self.total_len));
        debug_assert_eq!(tail.len() % H::BLOCK_LEN, 0);
        for block in tail.chunks_exact(H::BLOCK_LEN) {
            H::compress(&mut accumulator, block);
        }
        Tag(H::output(&accumulator))
    }

    pub fn total_len(&self) -> u64 {
        self.total_len
    }

    /// The bytes not yet folded into the accumulator.
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    pub fn accumulator(&self) -> &H::State {
        &self.accumulator
    }
}

impl<H: BlockHasher> Default for HashState<H> {
    fn default() -> Self {
        Self::start()
    }
}

impl<H: BlockHasher> Clone for HashState<H> {
    fn clone(&self) -> Self {
        Self {
            total_len: self.total_len,
            accumulator: self.accumulator.clone(),
            pending: self.pending.clone(),
            _hasher: PhantomData,
        }
    }
}

impl<H: BlockHasher> PartialEq for HashState<H> {
    fn eq(&self, other: &Self) -> bool {
        self.total_len == other.total_len
            && self.accumulator == other.accumulator
            && self.pending == other.pending
    }
}

impl<H: BlockHasher> Eq for HashState<H> {}

impl<H: BlockHasher> fmt::Debug for HashState<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashState")
            .field("total_len", &self.total_len)
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// One-shot hash of `bytes`.
pub fn hash<H: BlockHasher>(bytes: &[u8]) -> Tag {
    let mut state = HashState::<H>::start();
    state.extend(bytes);
    state.finalize()
}

/// The ordered, append-only sequence of handshake messages.
///
/// Messages can be appended by the log but never removed or reordered.
///
/// 有序且只追加的握手消息序列。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<HandshakeMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, message: HandshakeMessage) {
        self.messages.push(message);
    }

    pub(crate) fn append_all(&mut self, messages: impl IntoIterator<Item = HandshakeMessage>) {
        self.messages.extend(messages);
    }

    pub fn messages(&self) -> &[HandshakeMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HandshakeMessage> {
        self.messages.iter()
    }

    /// Concatenated canonical encoding of every message.
    pub fn to_bytes(&self) -> std::result::Result<Vec<u8>, EncodeError> {
        transcript_bytes(&self.messages)
    }
}

/// Concatenated canonical encoding of `messages`.
pub fn transcript_bytes(
    messages: &[HandshakeMessage],
) -> std::result::Result<Vec<u8>, EncodeError> {
    let mut bytes = Vec::new();
    for message in messages {
        bytes.extend(message.encode()?);
    }
    Ok(bytes)
}

/// Audit record of every `(content, tag)` pair produced.
///
/// Used by tests and fuzzing harnesses to check empirically that no two
/// distinct transcripts were ever finalized to the same tag.
///
/// 记录每一对 `(内容, 标签)` 的审计账本。
///
/// 用于测试与模糊测试，经验性地检查不存在两个不同的握手记录得到相同标签。
#[derive(Debug, Default, Clone)]
pub struct TagLedger {
    entries: HashMap<Tag, Vec<u8>>,
}

impl TagLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `content` finalized to `tag`.
    ///
    /// Witnessing the same pair twice is fine; a second content for a known
    /// tag is a collision.
    pub fn witness(&mut self, content: &[u8], tag: &Tag) -> Result<()> {
        match self.entries.get(tag) {
            Some(known) if known.as_slice() != content => Err(HandshakeError::TagCollision),
            Some(_) => Ok(()),
            None => {
                self.entries.insert(tag.clone(), content.to_vec());
                Ok(())
            }
        }
    }

    /// The content recorded for `tag`, if any.
    pub fn content_for(&self, tag: &Tag) -> Option<&[u8]> {
        self.entries.get(tag).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
