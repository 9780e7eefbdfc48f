use crate::protocol::types::{CipherSuite, ExtensionType, NamedGroup, ProtocolVersion, Role};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// The TLS alert a failure maps to when it is reported to the peer.
///
/// 失败向对端报告时所对应的 TLS 警报。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alert {
    UnexpectedMessage,
    HandshakeFailure,
    IllegalParameter,
    DecodeError,
    DecryptError,
    ProtocolVersion,
    InternalError,
    MissingExtension,
    UnsupportedExtension,
    UnrecognizedName,
}

impl Alert {
    /// The alert description byte.
    pub fn code(self) -> u8 {
        match self {
            Alert::UnexpectedMessage => 10,
            Alert::HandshakeFailure => 40,
            Alert::IllegalParameter => 47,
            Alert::DecodeError => 50,
            Alert::DecryptError => 51,
            Alert::ProtocolVersion => 70,
            Alert::InternalError => 80,
            Alert::MissingExtension => 109,
            Alert::UnsupportedExtension => 110,
            Alert::UnrecognizedName => 112,
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Alert::UnexpectedMessage => "unexpected_message",
            Alert::HandshakeFailure => "handshake_failure",
            Alert::IllegalParameter => "illegal_parameter",
            Alert::DecodeError => "decode_error",
            Alert::DecryptError => "decrypt_error",
            Alert::ProtocolVersion => "protocol_version",
            Alert::InternalError => "internal_error",
            Alert::MissingExtension => "missing_extension",
            Alert::UnsupportedExtension => "unsupported_extension",
            Alert::UnrecognizedName => "unrecognized_name",
        };
        f.write_str(name)
    }
}

/// A malformed or unacceptable wire encoding.
///
/// Decoding fails closed: the first problem found is returned and nothing
/// decoded before it is kept.
///
/// 格式错误或不可接受的线上编码。
///
/// 解码采用失败即关闭策略：返回发现的第一个问题，之前解码的内容全部丢弃。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{alert}: {reason}")]
pub struct DecodeError {
    pub alert: Alert,
    pub reason: Cow<'static, str>,
}

impl DecodeError {
    pub fn new(alert: Alert, reason: impl Into<Cow<'static, str>>) -> Self {
        Self {
            alert,
            reason: reason.into(),
        }
    }

    /// A structural problem: bad lengths, truncation, trailing bytes.
    pub fn malformed(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Alert::DecodeError, reason)
    }

    /// A well-formed value the protocol forbids.
    pub fn illegal(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::new(Alert::IllegalParameter, reason)
    }
}

/// A value that has no valid wire encoding for the requested role.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("{what} is {len} bytes, exceeding the {max} byte limit")]
    TooLong {
        what: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{ext} in this form cannot be sent by the {role}")]
    WrongRole { ext: ExtensionType, role: Role },

    #[error("extension {0} appears more than once in a list")]
    DuplicateExtension(ExtensionType),

    #[error("opaque extension uses the registered type {0}")]
    ReservedUnknownType(ExtensionType),

    #[error("invalid value: {0}")]
    Invalid(&'static str),
}

/// The peer's extensions cannot be reconciled with what was offered.
///
/// Every negotiation error aborts the handshake.
///
/// 对端的扩展无法与本端的提议相协调。
///
/// 任何协商错误都会中止握手。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationError {
    #[error("server sent {0} which the client did not offer")]
    UnsolicitedExtension(ExtensionType),

    #[error("mandatory extension {ext} missing for {version}")]
    MissingExtension {
        ext: ExtensionType,
        version: ProtocolVersion,
    },

    #[error("{ext} is not permitted under {version}")]
    IllegalForVersion {
        ext: ExtensionType,
        version: ProtocolVersion,
    },

    #[error("{0} was sent in a form reserved for the other role")]
    UnexpectedForm(ExtensionType),

    #[error("no signature algorithm in common")]
    IncompatibleSignatureAlgorithms,

    #[error("{0} was not offered or is not supported")]
    UnsupportedVersion(ProtocolVersion),

    #[error("no cipher suite in common")]
    NoCommonCipherSuite,

    #[error("server selected {0} which the client did not offer")]
    UnofferedCipherSuite(CipherSuite),

    #[error("no key exchange group in common")]
    NoCommonGroup,

    #[error("server key share uses {0} which the client did not offer")]
    KeyShareMismatch(NamedGroup),

    #[error("server selected PSK identity {selected} but only {offered} were offered")]
    PskIdentityOutOfRange { selected: u16, offered: usize },

    #[error("PSK resumption is disabled by configuration")]
    PskNotAllowed,

    #[error("server did not accept the uncompressed point format")]
    UnsupportedPointFormat,

    #[error("server accepted early data without selecting the first PSK identity")]
    EarlyDataWithoutPsk,
}

impl NegotiationError {
    pub fn alert(&self) -> Alert {
        match self {
            NegotiationError::UnsolicitedExtension(_) => Alert::UnsupportedExtension,
            NegotiationError::MissingExtension { .. } => Alert::MissingExtension,
            NegotiationError::UnsupportedVersion(_) => Alert::ProtocolVersion,
            NegotiationError::IncompatibleSignatureAlgorithms
            | NegotiationError::NoCommonCipherSuite
            | NegotiationError::NoCommonGroup
            | NegotiationError::PskNotAllowed => Alert::HandshakeFailure,
            NegotiationError::IllegalForVersion { .. }
            | NegotiationError::UnexpectedForm(_)
            | NegotiationError::UnofferedCipherSuite(_)
            | NegotiationError::KeyShareMismatch(_)
            | NegotiationError::PskIdentityOutOfRange { .. }
            | NegotiationError::UnsupportedPointFormat
            | NegotiationError::EarlyDataWithoutPsk => Alert::IllegalParameter,
        }
    }
}

#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("decoding failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("encoding failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("negotiation failed: {0}")]
    Negotiation(#[from] NegotiationError),

    /// The peer's Finished does not match the transcript we hashed.
    /// Fatal; the handshake must not be retried.
    ///
    /// 对端的 Finished 与本端计算的握手记录哈希不一致。致命错误，不得重试。
    #[error("finished verification failed (bad MAC)")]
    BadMac,

    #[error("two distinct transcripts produced the same tag")]
    TagCollision,

    #[error("invalid state transition attempted")]
    InvalidState,

    #[error("received an unexpected or invalid message for the current state")]
    InvalidMessage,

    #[error("builder is missing required field `{0}`")]
    BuilderMissingField(&'static str),
}

impl HandshakeError {
    /// The alert to send before closing the connection.
    pub fn alert(&self) -> Alert {
        match self {
            HandshakeError::Decode(e) => e.alert,
            HandshakeError::Negotiation(e) => e.alert(),
            HandshakeError::BadMac => Alert::DecryptError,
            HandshakeError::InvalidMessage => Alert::UnexpectedMessage,
            HandshakeError::Encode(_)
            | HandshakeError::TagCollision
            | HandshakeError::InvalidState
            | HandshakeError::BuilderMissingField(_) => Alert::InternalError,
        }
    }
}

pub type Result<T> = std::result::Result<T, HandshakeError>;
