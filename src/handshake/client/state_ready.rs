use super::{AwaitingServerFlight, HandshakeClient, HandshakeClientBuilder, Ready};
use crate::crypto::block::{BlockHasher, Sha256Block};
use crate::error::Result;
use crate::handshake::negotiate::prepare_client_extensions;
use crate::protocol::message::{ClientHello, HandshakeMessage};
use crate::protocol::types::ProtocolVersion;
use tracing::debug;

impl HandshakeClient<Ready> {
    /// Creates a new `HandshakeClientBuilder` to construct a `HandshakeClient`
    /// hashing with SHA-256.
    ///
    /// 创建一个用于构造 `HandshakeClient`（使用 SHA-256）的构建器。
    pub fn builder() -> HandshakeClientBuilder<Sha256Block> {
        HandshakeClientBuilder::new()
    }
}

impl<H: BlockHasher> HandshakeClient<Ready, H> {
    /// Starts the handshake by creating the `ClientHello`.
    ///
    /// Returns the encoded message to send and transitions the client to the
    /// `AwaitingServerFlight` state.
    ///
    /// 通过创建 `ClientHello` 启动握手。
    ///
    /// 返回待发送的编码消息，并将客户端转换到 `AwaitingServerFlight` 状态。
    pub fn start_handshake(
        mut self,
    ) -> Result<(Vec<u8>, HandshakeClient<AwaitingServerFlight, H>)> {
        let hello = ClientHello {
            legacy_version: ProtocolVersion::TLS12,
            random: self.random,
            session_id: self.session_id.clone(),
            cipher_suites: self.config.cipher_suites.clone(),
            compression_methods: vec![0],
            extensions: prepare_client_extensions(&self.config, &self.offer),
        };
        let bytes = self
            .log
            .send(&HandshakeMessage::ClientHello(hello.clone()))?;
        debug!(
            len = bytes.len(),
            extensions = hello.extensions.len(),
            "sent ClientHello"
        );

        self.client_hello = Some(hello);
        Ok((bytes, self.transition()))
    }
}
