//! The append-only handshake log.
//!
//! A [`HandshakeLog`] parses raw handshake bytes one message at a time, folds
//! the exact wire bytes of each message into the running transcript hash,
//! finalizes a tag after every tagged message and hands back a complete
//! [`Flight`] when a flight-terminating message arrives. The caller verifies
//! the flight (MAC, negotiation) before acting on it.
//!
//! Every fallible step runs before any state is committed, so a failed call
//! leaves the log exactly as it was.
//!
//! 只追加的握手日志。
//!
//! [`HandshakeLog`] 逐条解析原始握手字节，将每条消息的线上字节折叠进运行中的握手记录哈希，
//! 在每条需标记的消息之后生成标签，并在收到结束飞行的消息时返回完整的 [`Flight`]。
//! 调用方需先验证该飞行（MAC、协商）再据此行动。
//!
//! 所有可能失败的步骤都在提交状态之前执行，因此失败的调用不会改变日志。
use crate::crypto::block::{BlockHasher, Sha256Block};
use crate::error::{HandshakeError, Result};
use crate::protocol::message::{HandshakeMessage, parse_one_message};
use crate::protocol::state::{LogPhase, LogState};
use crate::protocol::transcript::{HashState, Tag, TagLedger, Transcript};
use crate::protocol::types::HandshakeType;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Which message kinds get a tag and which ones close a flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogPolicy {
    pub tagged: Vec<HandshakeType>,
    pub terminating: Vec<HandshakeType>,
}

impl LogPolicy {
    pub fn is_tagged(&self, kind: HandshakeType) -> bool {
        self.tagged.contains(&kind)
    }

    pub fn terminates_flight(&self, kind: HandshakeType) -> bool {
        self.terminating.contains(&kind)
    }
}

impl Default for LogPolicy {
    fn default() -> Self {
        Self {
            tagged: vec![HandshakeType::ServerHello],
            terminating: vec![HandshakeType::ClientHello, HandshakeType::Finished],
        }
    }
}

/// A completed flight: its messages in order and one tag per tagged message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flight {
    pub messages: Vec<HandshakeMessage>,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The flight is not complete yet.
    NeedMore,
    Flight(Flight),
}

/// Result of one [`HandshakeLog::receive`] call.
///
/// `consumed` is zero when the input held no complete message; otherwise the
/// caller drops that many bytes from its buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub consumed: usize,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default)]
struct Audit {
    ledger: TagLedger,
    content: Vec<u8>,
}

impl Audit {
    /// Appends `bytes` to the witnessed content and records `tag` for it.
    /// Leaves the content untouched on collision.
    fn absorb(&mut self, bytes: &[u8], tag: Option<&Tag>) -> Result<()> {
        let before = self.content.len();
        self.content.extend_from_slice(bytes);
        if let Some(tag) = tag {
            if let Err(e) = self.ledger.witness(&self.content, tag) {
                self.content.truncate(before);
                return Err(e);
            }
        }
        Ok(())
    }
}

/// An append-only, hashed log of handshake messages for one direction of one epoch.
///
/// 单个纪元单个方向上只追加、带哈希的握手消息日志。
#[derive(Debug, Clone)]
pub struct HandshakeLog<H: BlockHasher = Sha256Block> {
    state: LogState<H>,
    policy: LogPolicy,
    audit: Option<Audit>,
}

impl<H: BlockHasher> HandshakeLog<H> {
    pub fn new() -> Self {
        Self::with_policy(LogPolicy::default())
    }

    pub fn with_policy(policy: LogPolicy) -> Self {
        Self {
            state: LogState::new(),
            policy,
            audit: None,
        }
    }

    /// Records every tag this log finalizes in a [`TagLedger`].
    pub fn with_ledger(mut self) -> Self {
        self.audit = Some(Audit::default());
        self
    }

    /// Absorbs at most one message from the front of `raw`.
    ///
    /// Incomplete input yields `NeedMore` with nothing consumed. Malformed
    /// input is an error and the log is left unchanged.
    ///
    /// 从 `raw` 开头吸收至多一条消息。
    ///
    /// 输入不完整时返回 `NeedMore` 且不消耗任何字节。
    /// 格式错误的输入返回错误，日志保持不变。
    pub fn receive(&mut self, raw: &[u8]) -> Result<Received> {
        let Some((message, consumed)) = parse_one_message(raw)? else {
            trace!(available = raw.len(), "incomplete handshake message");
            return Ok(Received {
                consumed: 0,
                outcome: Outcome::NeedMore,
            });
        };
        let bytes = &raw[..consumed];
        let kind = message.handshake_type();

        let mut hash = self.state.hash.clone();
        hash.extend(bytes);
        let tag = self.policy.is_tagged(kind).then(|| hash.finalize());
        if let Some(audit) = self.audit.as_mut() {
            audit.absorb(bytes, tag.as_ref())?;
        }

        // Nothing below can fail.
        self.state.hash = hash;
        self.state.pending.push(message);
        if let Some(tag) = tag {
            self.state.pending_tags.push(tag);
        }
        trace!(
            ?kind,
            len = consumed,
            total_len = self.state.hash.total_len(),
            "absorbed handshake message"
        );

        if !self.policy.terminates_flight(kind) {
            return Ok(Received {
                consumed,
                outcome: Outcome::NeedMore,
            });
        }
        let (messages, tags) = self.state.commit_flight();
        debug!(
            messages = messages.len(),
            tags = tags.len(),
            transcript_len = self.state.prior.len(),
            "flight complete"
        );
        Ok(Received {
            consumed,
            outcome: Outcome::Flight(Flight { messages, tags }),
        })
    }

    /// Feeds `raw` through [`receive`](Self::receive) until no complete message remains.
    ///
    /// Returns every flight completed along the way and the number of bytes consumed.
    /// On error, messages absorbed before the failing one stay in the log.
    pub fn receive_all(&mut self, raw: &[u8]) -> Result<(Vec<Flight>, usize)> {
        let mut flights = Vec::new();
        let mut offset = 0;
        while offset < raw.len() {
            let received = self.receive(&raw[offset..])?;
            if received.consumed == 0 {
                break;
            }
            offset += received.consumed;
            if let Outcome::Flight(flight) = received.outcome {
                flights.push(flight);
            }
        }
        Ok((flights, offset))
    }

    /// Appends a locally produced message to the committed transcript and
    /// returns its wire bytes.
    ///
    /// Only legal between flights.
    ///
    /// 将本端产生的消息追加到已提交的握手记录中并返回其线上字节。仅在两个飞行之间合法。
    pub fn send(&mut self, message: &HandshakeMessage) -> Result<Vec<u8>> {
        self.append_local(message, false).map(|(bytes, _)| bytes)
    }

    /// Like [`send`](Self::send), also returning the tag of the transcript
    /// ending at `message`.
    pub fn send_tagged(&mut self, message: &HandshakeMessage) -> Result<(Vec<u8>, Tag)> {
        let (bytes, tag) = self.append_local(message, true)?;
        let tag = tag.ok_or(HandshakeError::InvalidState)?;
        Ok((bytes, tag))
    }

    fn append_local(
        &mut self,
        message: &HandshakeMessage,
        tagged: bool,
    ) -> Result<(Vec<u8>, Option<Tag>)> {
        if self.phase() != LogPhase::Idle {
            return Err(HandshakeError::InvalidState);
        }
        let bytes = message.encode()?;

        let mut hash = self.state.hash.clone();
        hash.extend(&bytes);
        let tag = tagged.then(|| hash.finalize());
        if let Some(audit) = self.audit.as_mut() {
            audit.absorb(&bytes, tag.as_ref())?;
        }

        self.state.hash = hash;
        self.state.prior.append(message.clone());
        trace!(
            kind = ?message.handshake_type(),
            len = bytes.len(),
            tagged,
            "sent handshake message"
        );
        Ok((bytes, tag))
    }

    /// Tag of the transcript so far, including any open flight.
    pub fn current_tag(&self) -> Tag {
        self.state.hash.finalize()
    }

    /// The committed transcript.
    pub fn transcript(&self) -> &Transcript {
        &self.state.prior
    }

    /// Messages of the flight in progress.
    pub fn pending(&self) -> &[HandshakeMessage] {
        &self.state.pending
    }

    pub fn pending_tags(&self) -> &[Tag] {
        &self.state.pending_tags
    }

    pub fn phase(&self) -> LogPhase {
        self.state.phase()
    }

    pub fn hash_state(&self) -> &HashState<H> {
        &self.state.hash
    }

    pub fn policy(&self) -> &LogPolicy {
        &self.policy
    }

    pub fn ledger(&self) -> Option<&TagLedger> {
        self.audit.as_ref().map(|a| &a.ledger)
    }
}

impl<H: BlockHasher> Default for HandshakeLog<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::{ClientHello, ServerHello};
    use crate::protocol::transcript::{hash, transcript_bytes};
    use crate::protocol::types::{CipherSuite, ProtocolVersion};

    fn client_hello() -> HandshakeMessage {
        HandshakeMessage::ClientHello(ClientHello {
            legacy_version: ProtocolVersion::TLS12,
            random: [1; 32],
            session_id: vec![],
            cipher_suites: vec![CipherSuite::TLS13_AES_128_GCM_SHA256],
            compression_methods: vec![0],
            extensions: vec![],
        })
    }

    fn server_hello() -> HandshakeMessage {
        HandshakeMessage::ServerHello(ServerHello {
            legacy_version: ProtocolVersion::TLS12,
            random: [2; 32],
            session_id: vec![],
            cipher_suite: CipherSuite::TLS13_AES_128_GCM_SHA256,
            compression_method: 0,
            extensions: vec![],
        })
    }

    fn finished() -> HandshakeMessage {
        HandshakeMessage::Finished(Tag::from_bytes(vec![3; 32]))
    }

    #[test]
    fn client_hello_is_a_flight_of_one() {
        let mut log = HandshakeLog::<Sha256Block>::new();
        let bytes = client_hello().encode().unwrap();
        let received = log.receive(&bytes).unwrap();
        assert_eq!(received.consumed, bytes.len());
        assert_eq!(
            received.outcome,
            Outcome::Flight(Flight {
                messages: vec![client_hello()],
                tags: vec![]
            })
        );
        assert_eq!(log.transcript().len(), 1);
        assert_eq!(log.phase(), LogPhase::Idle);
    }

    #[test]
    fn server_hello_is_tagged_and_flight_waits_for_finished() {
        let mut log = HandshakeLog::<Sha256Block>::new();
        let ch = client_hello().encode().unwrap();
        let sh = server_hello().encode().unwrap();
        log.receive(&ch).unwrap();

        let received = log.receive(&sh).unwrap();
        assert_eq!(received.outcome, Outcome::NeedMore);
        assert_eq!(log.phase(), LogPhase::Accumulating);
        let expected = hash::<Sha256Block>(&[ch.clone(), sh.clone()].concat());
        assert_eq!(log.pending_tags(), &[expected.clone()]);

        let received = log.receive(&finished().encode().unwrap()).unwrap();
        let Outcome::Flight(flight) = received.outcome else {
            panic!("expected a flight");
        };
        assert_eq!(flight.messages, vec![server_hello(), finished()]);
        assert_eq!(flight.tags, vec![expected]);
        assert!(log.pending().is_empty());
        assert!(log.pending_tags().is_empty());
    }

    #[test]
    fn partial_input_consumes_nothing() {
        let mut log = HandshakeLog::<Sha256Block>::new();
        let bytes = client_hello().encode().unwrap();
        let before = log.hash_state().clone();
        let received = log.receive(&bytes[..bytes.len() - 1]).unwrap();
        assert_eq!(received.consumed, 0);
        assert_eq!(received.outcome, Outcome::NeedMore);
        assert_eq!(log.hash_state(), &before);
    }

    #[test]
    fn malformed_input_leaves_log_unchanged() {
        let mut log = HandshakeLog::<Sha256Block>::new();
        log.receive(&client_hello().encode().unwrap()).unwrap();
        let before = log.current_tag();
        // Finished with an empty body.
        assert!(log.receive(&[20, 0, 0, 0]).is_err());
        assert_eq!(log.current_tag(), before);
        assert_eq!(log.transcript().len(), 1);
        assert_eq!(log.phase(), LogPhase::Idle);
    }

    #[test]
    fn hash_tracks_encoded_transcript() {
        let mut log = HandshakeLog::<Sha256Block>::new();
        let messages = [client_hello(), server_hello(), finished()];
        let wire = transcript_bytes(&messages).unwrap();
        let (flights, consumed) = log.receive_all(&wire).unwrap();
        assert_eq!(flights.len(), 2);
        assert_eq!(consumed, wire.len());
        assert_eq!(log.current_tag(), hash::<Sha256Block>(&wire));
        assert_eq!(log.transcript().to_bytes().unwrap(), wire);
    }

    #[test]
    fn send_requires_idle() {
        let mut log = HandshakeLog::<Sha256Block>::new();
        log.send(&client_hello()).unwrap();
        log.receive(&server_hello().encode().unwrap()).unwrap();
        assert!(matches!(
            log.send(&finished()),
            Err(HandshakeError::InvalidState)
        ));
    }

    #[test]
    fn send_tagged_matches_receiving_side() {
        let mut server = HandshakeLog::<Sha256Block>::new();
        let mut client = HandshakeLog::<Sha256Block>::new();
        let ch = client.send(&client_hello()).unwrap();
        server.receive(&ch).unwrap();

        let (sh, tag) = server.send_tagged(&server_hello()).unwrap();
        client.receive(&sh).unwrap();
        assert_eq!(client.pending_tags(), &[tag]);
    }

    #[test]
    fn custom_policy() {
        let policy = LogPolicy {
            tagged: vec![HandshakeType::ClientHello],
            terminating: vec![HandshakeType::Finished],
        };
        let mut log = HandshakeLog::<Sha256Block>::with_policy(policy);
        let received = log.receive(&client_hello().encode().unwrap()).unwrap();
        assert_eq!(received.outcome, Outcome::NeedMore);
        assert_eq!(log.pending_tags().len(), 1);
    }

    #[test]
    fn ledger_sees_every_tag() {
        let mut log = HandshakeLog::<Sha256Block>::new().with_ledger();
        log.send(&client_hello()).unwrap();
        let (_, tag) = log.send_tagged(&server_hello()).unwrap();
        let ledger = log.ledger().unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(
            ledger.content_for(&tag).unwrap(),
            transcript_bytes(&[client_hello(), server_hello()]).unwrap()
        );
    }
}
