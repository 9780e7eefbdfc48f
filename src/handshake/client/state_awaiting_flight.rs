use super::{AwaitingServerFlight, ClientStep, Established, HandshakeClient};
use crate::crypto::block::BlockHasher;
use crate::crypto::mac::mac_verify;
use crate::error::{HandshakeError, NegotiationError, Result};
use crate::handshake::negotiate::negotiate_client_extensions;
use crate::protocol::log::{Flight, Outcome};
use crate::protocol::message::HandshakeMessage;
use tracing::{debug, warn};

impl<H: BlockHasher> HandshakeClient<AwaitingServerFlight, H> {
    /// Feeds bytes of the server's flight into the handshake.
    ///
    /// Returns the next step and the number of bytes consumed. Once the flight
    /// `ServerHello, Finished` is complete, the Finished MAC is checked against
    /// the tag the log took after the ServerHello, and only then are the
    /// server's extensions negotiated.
    ///
    /// 将服务器飞行的字节输入握手。
    ///
    /// 返回下一步以及消耗的字节数。当 `ServerHello, Finished` 飞行完整后，
    /// 先用日志在 ServerHello 之后生成的标签校验 Finished MAC，之后才协商服务器的扩展。
    pub fn receive(mut self, bytes: &[u8]) -> Result<(ClientStep<H>, usize)> {
        let mut offset = 0;
        while offset < bytes.len() {
            let received = self.log.receive(&bytes[offset..])?;
            if received.consumed == 0 {
                break;
            }
            offset += received.consumed;
            if let Outcome::Flight(flight) = received.outcome {
                let established = self.process_server_flight(flight)?;
                return Ok((ClientStep::Established(established), offset));
            }
        }
        Ok((ClientStep::NeedMore(self), offset))
    }

    /// Verifies and negotiates a completed server flight.
    fn process_server_flight(mut self, flight: Flight) -> Result<HandshakeClient<Established, H>> {
        let (server_hello, finished) = match flight.messages.as_slice() {
            [
                HandshakeMessage::ServerHello(server_hello),
                HandshakeMessage::Finished(finished),
            ] => (server_hello.clone(), finished.clone()),
            _ => {
                warn!(messages = flight.messages.len(), "unexpected server flight");
                return Err(HandshakeError::InvalidMessage);
            }
        };
        let [expected] = flight.tags.as_slice() else {
            return Err(HandshakeError::InvalidState);
        };

        if !mac_verify(expected, &finished) {
            warn!("server Finished does not match transcript");
            return Err(HandshakeError::BadMac);
        }

        let client_hello = self
            .client_hello
            .as_ref()
            .ok_or(HandshakeError::InvalidState)?;
        if !client_hello.cipher_suites.contains(&server_hello.cipher_suite) {
            warn!(
                cipher_suite = %server_hello.cipher_suite,
                "server chose an unoffered cipher suite"
            );
            return Err(NegotiationError::UnofferedCipherSuite(server_hello.cipher_suite).into());
        }
        if server_hello.compression_method != 0 {
            return Err(HandshakeError::InvalidMessage);
        }
        if server_hello.session_id != client_hello.session_id {
            warn!("server did not echo the legacy session id");
            return Err(HandshakeError::InvalidMessage);
        }

        let negotiated = negotiate_client_extensions(
            &self.config,
            &client_hello.extensions,
            &server_hello.extensions,
            server_hello.cipher_suite,
        )
        .inspect_err(|e| warn!(error = %e, alert = %e.alert(), "negotiation failed"))?;

        debug!(
            version = %negotiated.version(),
            cipher_suite = %negotiated.cipher_suite(),
            transcript_len = self.log.transcript().len(),
            "handshake established"
        );
        self.server_hello = Some(server_hello);
        self.negotiated = Some(negotiated);
        self.server_finished = Some(finished);
        Ok(self.transition())
    }
}
