use super::{Established, HandshakeClient};
use crate::crypto::block::BlockHasher;
use crate::error::{HandshakeError, Result};
use crate::handshake::negotiate::NegotiatedExtensions;
use crate::protocol::message::ServerHello;
use crate::protocol::transcript::{Tag, Transcript};

impl<H: BlockHasher> HandshakeClient<Established, H> {
    /// The parameters agreed with the server.
    ///
    /// 与服务器协商一致的参数。
    pub fn negotiated(&self) -> Result<&NegotiatedExtensions> {
        // Only reachable after negotiation succeeded.
        self.negotiated.as_ref().ok_or(HandshakeError::InvalidState)
    }

    pub fn server_hello(&self) -> Result<&ServerHello> {
        self.server_hello.as_ref().ok_or(HandshakeError::InvalidState)
    }

    /// The server's Finished, already verified against the transcript.
    pub fn server_finished(&self) -> Result<&Tag> {
        self.server_finished
            .as_ref()
            .ok_or(HandshakeError::InvalidState)
    }

    pub fn transcript(&self) -> &Transcript {
        self.log.transcript()
    }

    /// Tag over the complete handshake transcript.
    ///
    /// 整个握手记录的标签。
    pub fn transcript_tag(&self) -> Tag {
        self.log.current_tag()
    }
}
