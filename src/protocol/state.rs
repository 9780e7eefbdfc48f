//! States of the handshake log and of the handshake drivers.
//!
//! The driver states are zero-sized markers used to enforce the protocol flow
//! at compile time. [`LogState`] is the data a single log owns.
//!
//! 握手日志与握手驱动的状态。
//!
//! 驱动状态是零大小的标记类型，用于在编译时强制执行协议流程。
//! [`LogState`] 是单个日志独占的数据。
use crate::crypto::block::{BlockHasher, Sha256Block};
use crate::protocol::message::HandshakeMessage;
use crate::protocol::transcript::{HashState, Tag, Transcript};

// --- Driver states (markers) ---

/// The initial state of a handshake, client or server.
#[derive(Debug)]
pub struct Ready;

/// A client state: the ClientHello has been sent and the server's flight is expected.
#[derive(Debug)]
pub struct AwaitingServerFlight;

/// The final state of a successful handshake.
#[derive(Debug)]
pub struct Established;

// --- Log state ---

/// Whether the log is between flights or in the middle of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogPhase {
    /// No message of an unfinished flight has been received.
    Idle,
    /// At least one message of the current flight has been received.
    Accumulating,
}

/// Everything a handshake log owns.
///
/// `hash` always describes exactly `encode(prior ++ pending)`, and
/// `pending_tags` holds one tag per tagged message in `pending`, in order.
///
/// 握手日志所拥有的全部数据。
///
/// `hash` 始终精确对应 `encode(prior ++ pending)`，
/// `pending_tags` 按顺序为 `pending` 中每条需标记的消息保存一个标签。
#[derive(Debug, Clone)]
pub struct LogState<H: BlockHasher = Sha256Block> {
    pub(crate) prior: Transcript,
    pub(crate) pending: Vec<HandshakeMessage>,
    pub(crate) pending_tags: Vec<Tag>,
    pub(crate) hash: HashState<H>,
}

impl<H: BlockHasher> LogState<H> {
    pub fn new() -> Self {
        Self {
            prior: Transcript::new(),
            pending: Vec::new(),
            pending_tags: Vec::new(),
            hash: HashState::start(),
        }
    }

    pub fn phase(&self) -> LogPhase {
        if self.pending.is_empty() {
            LogPhase::Idle
        } else {
            LogPhase::Accumulating
        }
    }

    /// Moves the open flight into the committed transcript.
    pub(crate) fn commit_flight(&mut self) -> (Vec<HandshakeMessage>, Vec<Tag>) {
        let messages = std::mem::take(&mut self.pending);
        let tags = std::mem::take(&mut self.pending_tags);
        self.prior.append_all(messages.iter().cloned());
        (messages, tags)
    }
}

impl<H: BlockHasher> Default for LogState<H> {
    fn default() -> Self {
        Self::new()
    }
}
