use super::{HandshakeServer, Ready};
use crate::crypto::block::BlockHasher;
use crate::error::Result;
use crate::handshake::config::Config;
use crate::protocol::extension::KeyShareEntry;
use crate::protocol::log::HandshakeLog;
use std::marker::PhantomData;

/// Marker type for a missing field in the builder.
///
/// 用于在构建器中标记缺失字段的类型。
#[derive(Debug)]
pub struct Missing;

/// A builder for creating a `HandshakeServer`.
///
/// `build` is only available once both the config and the server random are set.
///
/// 用于创建 `HandshakeServer` 的构建器。
///
/// 仅当配置与服务器随机数均已设置时才能调用 `build`。
#[derive(Debug)]
pub struct HandshakeServerBuilder<C, R, H: BlockHasher> {
    config: C,
    random: R,
    key_shares: Vec<KeyShareEntry>,
    with_ledger: bool,
    _hasher: PhantomData<H>,
}

impl<H: BlockHasher> HandshakeServerBuilder<Missing, Missing, H> {
    /// Creates a new `HandshakeServerBuilder`.
    pub fn new() -> Self {
        Self {
            config: Missing,
            random: Missing,
            key_shares: Vec::new(),
            with_ledger: false,
            _hasher: PhantomData,
        }
    }
}

impl<C, R, H: BlockHasher> HandshakeServerBuilder<C, R, H> {
    /// Sets the negotiation preferences.
    ///
    /// 设置协商偏好。
    pub fn config(self, config: Config) -> HandshakeServerBuilder<Config, R, H> {
        HandshakeServerBuilder {
            config,
            random: self.random,
            key_shares: self.key_shares,
            with_ledger: self.with_ledger,
            _hasher: PhantomData,
        }
    }

    /// Sets the 32-byte server random, drawn by the caller.
    ///
    /// 设置由调用方生成的 32 字节服务器随机数。
    pub fn random(self, random: [u8; 32]) -> HandshakeServerBuilder<C, [u8; 32], H> {
        HandshakeServerBuilder {
            config: self.config,
            random,
            key_shares: self.key_shares,
            with_ledger: self.with_ledger,
            _hasher: PhantomData,
        }
    }

    /// Adds the server's share for one group.
    /// Without a share for a group the client offered, a full handshake cannot use that group.
    ///
    /// 添加服务器在某个组上的密钥共享。
    /// 如果没有客户端所提供组的共享，完整握手将无法使用该组。
    pub fn key_share(mut self, share: KeyShareEntry) -> Self {
        self.key_shares.push(share);
        self
    }

    pub fn with_ledger(mut self) -> Self {
        self.with_ledger = true;
        self
    }
}

impl<H: BlockHasher> HandshakeServerBuilder<Config, [u8; 32], H> {
    /// Builds the `HandshakeServer`.
    ///
    /// This method is only available when all required fields have been provided.
    ///
    /// 构建 `HandshakeServer`。
    ///
    /// 此方法仅在提供了所有必需字段时可用。
    pub fn build(self) -> Result<HandshakeServer<Ready, H>> {
        self.config.validate()?;
        let log = HandshakeLog::new();
        let log = if self.with_ledger { log.with_ledger() } else { log };

        Ok(HandshakeServer {
            state: PhantomData,
            config: self.config,
            random: self.random,
            key_shares: self.key_shares,
            log,
            client_hello: None,
            server_hello: None,
        })
    }
}
