use super::{HandshakeClient, Ready};
use crate::crypto::block::BlockHasher;
use crate::error::{HandshakeError, Result};
use crate::handshake::config::Config;
use crate::handshake::negotiate::ClientOffer;
use crate::protocol::extension::{KeyShareEntry, PskOffer};
use crate::protocol::log::HandshakeLog;
use std::marker::PhantomData;

/// A builder for creating a `HandshakeClient`.
///
/// This builder ensures that all required fields are provided before constructing the client.
///
/// 用于创建 `HandshakeClient` 的构建器。
///
/// 此构建器确保在构造客户端之前提供了所有必需的字段。
#[derive(Debug)]
pub struct HandshakeClientBuilder<H: BlockHasher> {
    config: Option<Config>,
    random: Option<[u8; 32]>,
    session_id: Vec<u8>,
    offer: ClientOffer,
    with_ledger: bool,
    _hasher: PhantomData<H>,
}

impl<H: BlockHasher> HandshakeClientBuilder<H> {
    /// Creates a new `HandshakeClientBuilder`.
    pub fn new() -> Self {
        Self {
            config: None,
            random: None,
            session_id: Vec::new(),
            offer: ClientOffer::default(),
            with_ledger: false,
            _hasher: PhantomData,
        }
    }

    /// Sets the negotiation preferences.
    ///
    /// 设置协商偏好。
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the 32-byte client random, drawn by the caller.
    ///
    /// 设置由调用方生成的 32 字节客户端随机数。
    pub fn random(mut self, random: [u8; 32]) -> Self {
        self.random = Some(random);
        self
    }

    /// Sets the legacy session id (at most 32 bytes).
    pub fn session_id(mut self, session_id: Vec<u8>) -> Self {
        self.session_id = session_id;
        self
    }

    /// Adds a key share produced by the caller's key exchange.
    ///
    /// 添加由调用方密钥交换产生的密钥共享。
    pub fn key_share(mut self, share: KeyShareEntry) -> Self {
        self.offer.key_shares.push(share);
        self
    }

    /// Provides a PSK offer from a previous session to attempt resumption.
    ///
    /// 提供来自前一个会话的 PSK 提议以尝试会话恢复。
    pub fn resumption(mut self, psk: PskOffer, early_data: bool) -> Self {
        self.offer.psk = Some(psk);
        self.offer.early_data = early_data;
        self
    }

    /// Echoes a cookie received in a HelloRetryRequest.
    pub fn cookie(mut self, cookie: Vec<u8>) -> Self {
        self.offer.cookie = Some(cookie);
        self
    }

    /// Records every transcript tag in an audit ledger.
    pub fn with_ledger(mut self) -> Self {
        self.with_ledger = true;
        self
    }

    /// Builds the `HandshakeClient`.
    ///
    /// Returns an error if any required fields are missing.
    ///
    /// 构建 `HandshakeClient`。
    ///
    /// 如果任何必需字段缺失，则返回错误。
    pub fn build(self) -> Result<HandshakeClient<Ready, H>> {
        let config = self
            .config
            .ok_or(HandshakeError::BuilderMissingField("config"))?;
        config.validate()?;
        let random = self
            .random
            .ok_or(HandshakeError::BuilderMissingField("random"))?;

        let log = HandshakeLog::new();
        let log = if self.with_ledger { log.with_ledger() } else { log };

        Ok(HandshakeClient {
            state: PhantomData,
            config,
            offer: self.offer,
            random,
            session_id: self.session_id,
            log,
            client_hello: None,
            server_hello: None,
            negotiated: None,
            server_finished: None,
        })
    }
}
