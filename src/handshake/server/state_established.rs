use super::{Established, HandshakeServer};
use crate::crypto::block::BlockHasher;
use crate::error::{HandshakeError, Result};
use crate::protocol::message::{ClientHello, ServerHello};
use crate::protocol::transcript::{Tag, Transcript};

impl<H: BlockHasher> HandshakeServer<Established, H> {
    pub fn client_hello(&self) -> Result<&ClientHello> {
        self.client_hello.as_ref().ok_or(HandshakeError::InvalidState)
    }

    /// The ServerHello that was sent, carrying the negotiated parameters.
    ///
    /// 已发送的 ServerHello，携带协商结果。
    pub fn server_hello(&self) -> Result<&ServerHello> {
        self.server_hello.as_ref().ok_or(HandshakeError::InvalidState)
    }

    pub fn transcript(&self) -> &Transcript {
        self.log.transcript()
    }

    /// Tag over the complete handshake transcript.
    pub fn transcript_tag(&self) -> Tag {
        self.log.current_tag()
    }
}
