//! Implements the server side of the handshake state machine.
//! 实现握手协议状态机的服务器端。

use crate::crypto::block::{BlockHasher, Sha256Block};
use crate::handshake::config::Config;
use crate::protocol::{
    extension::KeyShareEntry,
    log::HandshakeLog,
    message::{ClientHello, ServerHello},
    state::{Established, Ready},
};
use std::marker::PhantomData;

mod builder;
mod state_established;
mod state_ready;

pub use builder::{HandshakeServerBuilder, Missing};

/// The server-side handshake state machine.
///
/// Generic over the state `State` to enforce protocol flow at compile time.
/// This ensures that methods can only be called in the correct sequence,
/// preventing logical errors in the protocol's implementation.
///
/// 服务器端握手协议状态机。
///
/// 通过泛型状态 `State` 在编译时强制执行协议流程。
/// 这确保了方法只能按正确的顺序调用，防止了协议实现中的逻辑错误。
#[derive(Debug)]
pub struct HandshakeServer<State, H: BlockHasher = Sha256Block> {
    /// Zero-sized marker to hold the current state.
    /// This doesn't take up space but allows the type system to track the machine's state.
    ///
    /// 零大小标记，用于持有当前状态。
    /// 它不占用空间，但允许类型系统跟踪机器的状态。
    state: PhantomData<State>,
    config: Config,
    random: [u8; 32],
    /// The server's own share for every group it is prepared to use.
    ///
    /// 服务器为每个可用组准备的密钥共享。
    key_shares: Vec<KeyShareEntry>,
    /// A running hash of the handshake transcript.
    /// Its tag after the ServerHello becomes the server's Finished.
    ///
    /// 握手记录的运行哈希。ServerHello 之后的标签即为服务器的 Finished。
    log: HandshakeLog<H>,
    client_hello: Option<ClientHello>,
    server_hello: Option<ServerHello>,
}

/// What one call to [`HandshakeServer::process_client_hello`] produced.
#[derive(Debug)]
pub enum ServerStep<H: BlockHasher = Sha256Block> {
    /// The ClientHello is incomplete; feed more bytes.
    NeedMore(HandshakeServer<Ready, H>),
    /// The server flight `ServerHello || Finished` to send, and the established server.
    Established {
        flight: Vec<u8>,
        server: HandshakeServer<Established, H>,
    },
}

impl<State, H: BlockHasher> HandshakeServer<State, H> {
    fn transition<Next>(self) -> HandshakeServer<Next, H> {
        HandshakeServer {
            state: PhantomData,
            config: self.config,
            random: self.random,
            key_shares: self.key_shares,
            log: self.log,
            client_hello: self.client_hello,
            server_hello: self.server_hello,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn log(&self) -> &HandshakeLog<H> {
        &self.log
    }
}
