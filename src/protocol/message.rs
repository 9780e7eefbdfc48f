//! Handshake messages and their framing.
//!
//! Each message is framed as `msg_type(u8) || length(u24) || body`. Every
//! variable-length field inside a body is length-prefixed, so the concatenation
//! of encoded messages is unambiguous and the transcript encoding is injective.
//!
//! 握手消息及其分帧。
//!
//! 每条消息的格式为 `类型(u8) || 长度(u24) || 消息体`。消息体内所有变长字段都带有
//! 长度前缀，因此编码后的消息串联无歧义，握手记录编码是单射的。
use crate::error::{Alert, DecodeError, EncodeError, HandshakeError, Result};
use crate::protocol::codec::{Reader, Writer};
use crate::protocol::extension::{self, Extension, PreSharedKeyExt, PskOffer, SupportedVersionsExt};
use crate::protocol::transcript::Tag;
use crate::protocol::types::{CipherSuite, ExtensionType, HandshakeType, ProtocolVersion, Role};

/// Largest message body accepted before the whole body has arrived.
pub const MAX_MESSAGE_LEN: usize = 1 << 17;

const HEADER_LEN: usize = 4;
const MAX_SESSION_ID_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHello {
    pub legacy_version: ProtocolVersion,
    pub random: [u8; 32],
    pub session_id: Vec<u8>,
    pub cipher_suites: Vec<CipherSuite>,
    pub compression_methods: Vec<u8>,
    pub extensions: Vec<Extension>,
}

impl ClientHello {
    pub fn extension(&self, typ: ExtensionType) -> Option<&Extension> {
        extension::find(&self.extensions, typ)
    }

    pub fn psk_offer(&self) -> Option<&PskOffer> {
        match self.extension(ExtensionType::PRE_SHARED_KEY) {
            Some(Extension::PreSharedKey(PreSharedKeyExt::Offer(offer))) => Some(offer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHello {
    pub legacy_version: ProtocolVersion,
    pub random: [u8; 32],
    pub session_id: Vec<u8>,
    pub cipher_suite: CipherSuite,
    pub compression_method: u8,
    pub extensions: Vec<Extension>,
}

impl ServerHello {
    pub fn extension(&self, typ: ExtensionType) -> Option<&Extension> {
        extension::find(&self.extensions, typ)
    }

    /// The version the server chose: `supported_versions` if present, otherwise the legacy field.
    pub fn selected_version(&self) -> ProtocolVersion {
        match self.extension(ExtensionType::SUPPORTED_VERSIONS) {
            Some(Extension::SupportedVersions(SupportedVersionsExt::Selected(v))) => *v,
            _ => self.legacy_version,
        }
    }
}

/// Defines the messages exchanged during the handshake.
///
/// 定义握手过程中交换的消息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeMessage {
    ClientHello(ClientHello),
    ServerHello(ServerHello),
    EncryptedExtensions(Vec<Extension>),
    /// The MAC over the transcript so far.
    Finished(Tag),
}

impl HandshakeMessage {
    pub fn handshake_type(&self) -> HandshakeType {
        match self {
            HandshakeMessage::ClientHello(_) => HandshakeType::ClientHello,
            HandshakeMessage::ServerHello(_) => HandshakeType::ServerHello,
            HandshakeMessage::EncryptedExtensions(_) => HandshakeType::EncryptedExtensions,
            HandshakeMessage::Finished(_) => HandshakeType::Finished,
        }
    }

    /// Canonical wire encoding, header included.
    pub fn encode(&self) -> std::result::Result<Vec<u8>, EncodeError> {
        let mut w = Writer::new();
        w.write_u8(self.handshake_type().to_u8());
        w.with_u24_prefix("handshake message", |w| self.write_body(w))?;
        Ok(w.into_vec())
    }

    fn write_body(&self, w: &mut Writer) -> std::result::Result<(), EncodeError> {
        match self {
            HandshakeMessage::ClientHello(hello) => {
                if hello.cipher_suites.is_empty() {
                    return Err(EncodeError::Invalid("ClientHello offers no cipher suites"));
                }
                if hello.compression_methods.is_empty() {
                    return Err(EncodeError::Invalid("ClientHello offers no compression methods"));
                }
                w.write_u16(hello.legacy_version.0);
                w.write_bytes(&hello.random);
                write_session_id(&hello.session_id, w)?;
                w.with_u16_prefix("cipher suites", |w| {
                    hello.cipher_suites.iter().for_each(|s| w.write_u16(s.0));
                    Ok(())
                })?;
                w.with_u8_prefix("compression methods", |w| {
                    w.write_bytes(&hello.compression_methods);
                    Ok(())
                })?;
                extension::write_list(Role::Client, &hello.extensions, w)
            }
            HandshakeMessage::ServerHello(hello) => {
                w.write_u16(hello.legacy_version.0);
                w.write_bytes(&hello.random);
                write_session_id(&hello.session_id, w)?;
                w.write_u16(hello.cipher_suite.0);
                w.write_u8(hello.compression_method);
                extension::write_list(Role::Server, &hello.extensions, w)
            }
            HandshakeMessage::EncryptedExtensions(extensions) => {
                extension::write_list(Role::Server, extensions, w)
            }
            HandshakeMessage::Finished(tag) => {
                if tag.is_empty() {
                    return Err(EncodeError::Invalid("empty Finished"));
                }
                w.write_bytes(tag.as_bytes());
                Ok(())
            }
        }
    }

    /// The encoded ClientHello truncated just before its PSK binders list.
    ///
    /// Binders are computed over this prefix, which is why `pre_shared_key`
    /// must be the last extension.
    ///
    /// 截断至 PSK 绑定值列表之前的 ClientHello 编码。
    ///
    /// 绑定值基于此前缀计算，这也是 `pre_shared_key` 必须是最后一个扩展的原因。
    pub fn binder_prefix(&self) -> Result<Vec<u8>> {
        let HandshakeMessage::ClientHello(hello) = self else {
            return Err(HandshakeError::InvalidMessage);
        };
        let Some(Extension::PreSharedKey(PreSharedKeyExt::Offer(offer))) = hello.extensions.last()
        else {
            return Err(HandshakeError::InvalidMessage);
        };
        let mut bytes = self.encode()?;
        bytes.truncate(bytes.len() - offer.binders_wire_len());
        Ok(bytes)
    }
}

fn write_session_id(session_id: &[u8], w: &mut Writer) -> std::result::Result<(), EncodeError> {
    if session_id.len() > MAX_SESSION_ID_LEN {
        return Err(EncodeError::TooLong {
            what: "session id",
            len: session_id.len(),
            max: MAX_SESSION_ID_LEN,
        });
    }
    w.with_u8_prefix("session id", |w| {
        w.write_bytes(session_id);
        Ok(())
    })
}

/// Extracts one message from the front of `bytes`.
///
/// Returns `Ok(None)` while the message is incomplete, and the message with the
/// number of bytes it occupies once it is whole. Malformed input is an error;
/// so is any encoding that does not re-encode to the exact bytes consumed.
///
/// 从 `bytes` 开头提取一条消息。
///
/// 消息不完整时返回 `Ok(None)`；完整时返回消息及其占用的字节数。
/// 格式错误的输入返回错误，重新编码后与所消耗字节不一致的编码同样视为错误。
pub fn parse_one_message(
    bytes: &[u8],
) -> std::result::Result<Option<(HandshakeMessage, usize)>, DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Ok(None);
    }
    let mut header = Reader::new(&bytes[..HEADER_LEN]);
    let raw_type = header.read_u8()?;
    let body_len = header.read_u24()? as usize;

    let kind = HandshakeType::from_u8(raw_type).ok_or_else(|| {
        DecodeError::new(
            Alert::UnexpectedMessage,
            format!("unsupported handshake message type {raw_type}"),
        )
    })?;
    if body_len > MAX_MESSAGE_LEN {
        return Err(DecodeError::malformed(format!(
            "handshake message of {body_len} bytes exceeds limit"
        )));
    }
    let consumed = HEADER_LEN + body_len;
    if bytes.len() < consumed {
        return Ok(None);
    }

    let mut body = Reader::new(&bytes[HEADER_LEN..consumed]);
    let message = match kind {
        HandshakeType::ClientHello => HandshakeMessage::ClientHello(read_client_hello(&mut body)?),
        HandshakeType::ServerHello => HandshakeMessage::ServerHello(read_server_hello(&mut body)?),
        HandshakeType::EncryptedExtensions => {
            HandshakeMessage::EncryptedExtensions(extension::read_list(Role::Server, &mut body)?)
        }
        HandshakeType::Finished => {
            let verify_data = body.rest();
            if verify_data.is_empty() {
                return Err(DecodeError::malformed("empty Finished"));
            }
            HandshakeMessage::Finished(Tag::from_bytes(verify_data))
        }
    };
    body.finish()?;

    let canonical = message
        .encode()
        .map_err(|e| DecodeError::malformed(format!("unencodable message: {e}")))?;
    if canonical.as_slice() != &bytes[..consumed] {
        return Err(DecodeError::malformed("non-canonical message encoding"));
    }
    Ok(Some((message, consumed)))
}

fn read_session_id(r: &mut Reader<'_>) -> std::result::Result<Vec<u8>, DecodeError> {
    let session_id = r.sub_u8()?.rest().to_vec();
    if session_id.len() > MAX_SESSION_ID_LEN {
        return Err(DecodeError::malformed("session id longer than 32 bytes"));
    }
    Ok(session_id)
}

fn read_client_hello(r: &mut Reader<'_>) -> std::result::Result<ClientHello, DecodeError> {
    let legacy_version = ProtocolVersion(r.read_u16()?);
    let random = r.read_array::<32>()?;
    let session_id = read_session_id(r)?;

    let mut suites = r.sub_u16()?;
    if suites.is_empty() || suites.remaining() % 2 != 0 {
        return Err(DecodeError::malformed("bad cipher suite list length"));
    }
    let mut cipher_suites = Vec::with_capacity(suites.remaining() / 2);
    while !suites.is_empty() {
        cipher_suites.push(CipherSuite(suites.read_u16()?));
    }

    let compression_methods = r.sub_u8()?.rest().to_vec();
    if compression_methods.is_empty() {
        return Err(DecodeError::malformed("no compression methods"));
    }
    let extensions = extension::read_list(Role::Client, r)?;

    Ok(ClientHello {
        legacy_version,
        random,
        session_id,
        cipher_suites,
        compression_methods,
        extensions,
    })
}

fn read_server_hello(r: &mut Reader<'_>) -> std::result::Result<ServerHello, DecodeError> {
    Ok(ServerHello {
        legacy_version: ProtocolVersion(r.read_u16()?),
        random: r.read_array::<32>()?,
        session_id: read_session_id(r)?,
        cipher_suite: CipherSuite(r.read_u16()?),
        compression_method: r.read_u8()?,
        extensions: extension::read_list(Role::Server, r)?,
    })
}
