use super::{HandshakeServer, HandshakeServerBuilder, Missing, Ready, ServerStep};
use crate::crypto::block::{BlockHasher, Sha256Block};
use crate::error::{HandshakeError, Result};
use crate::handshake::negotiate::negotiate_server_hello;
use crate::protocol::extension::PskOffer;
use crate::protocol::log::Outcome;
use crate::protocol::message::HandshakeMessage;
use tracing::{debug, warn};

impl HandshakeServer<Ready> {
    /// Creates a new `HandshakeServerBuilder` to construct a `HandshakeServer`
    /// hashing with SHA-256.
    ///
    /// 创建一个用于构造 `HandshakeServer`（使用 SHA-256）的构建器。
    pub fn builder() -> HandshakeServerBuilder<Missing, Missing, Sha256Block> {
        HandshakeServerBuilder::new()
    }
}

impl<H: BlockHasher> HandshakeServer<Ready, H> {
    /// Processes the client's `ClientHello` without accepting any PSK.
    ///
    /// See [`process_client_hello_with`](Self::process_client_hello_with).
    pub fn process_client_hello(self, bytes: &[u8]) -> Result<(ServerStep<H>, usize)> {
        self.process_client_hello_with(bytes, |_| None)
    }

    /// Processes the client's `ClientHello` and produces the server flight.
    ///
    /// `select_psk` is asked which offered identity, if any, the server can
    /// resume. On success the flight `ServerHello || Finished` is returned,
    /// where Finished carries the transcript tag taken right after the
    /// ServerHello.
    ///
    /// 处理客户端的 `ClientHello` 并生成服务器飞行。
    ///
    /// `select_psk` 用于决定服务器能够恢复哪个已提供的身份（如有）。
    /// 成功时返回 `ServerHello || Finished` 飞行，其中 Finished 携带
    /// 紧接 ServerHello 之后的握手记录标签。
    pub fn process_client_hello_with<F>(
        mut self,
        bytes: &[u8],
        select_psk: F,
    ) -> Result<(ServerStep<H>, usize)>
    where
        F: FnOnce(&PskOffer) -> Option<u16>,
    {
        let received = self.log.receive(bytes)?;
        let client_hello = match received.outcome {
            Outcome::NeedMore if received.consumed == 0 => {
                return Ok((ServerStep::NeedMore(self), 0));
            }
            Outcome::Flight(flight) => match flight.messages.as_slice() {
                [HandshakeMessage::ClientHello(hello)] => hello.clone(),
                _ => {
                    warn!(messages = flight.messages.len(), "expected a lone ClientHello");
                    return Err(HandshakeError::InvalidMessage);
                }
            },
            Outcome::NeedMore => {
                warn!("handshake opened with a message other than ClientHello");
                return Err(HandshakeError::InvalidMessage);
            }
        };

        let selected_psk = client_hello.psk_offer().and_then(select_psk);
        let server_hello = negotiate_server_hello(
            &self.config,
            &client_hello,
            self.random,
            &self.key_shares,
            selected_psk,
        )
        .inspect_err(|e| warn!(error = %e, alert = %e.alert(), "rejecting ClientHello"))?;

        let (mut flight, tag) = self
            .log
            .send_tagged(&HandshakeMessage::ServerHello(server_hello.clone()))?;
        flight.extend(self.log.send(&HandshakeMessage::Finished(tag))?);
        debug!(
            cipher_suite = %server_hello.cipher_suite,
            version = %server_hello.selected_version(),
            flight_len = flight.len(),
            "sent ServerHello and Finished"
        );

        self.client_hello = Some(client_hello);
        self.server_hello = Some(server_hello);
        Ok((
            ServerStep::Established {
                flight,
                server: self.transition(),
            },
            received.consumed,
        ))
    }
}
