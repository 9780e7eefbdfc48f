//! Implements the client side of the handshake state machine.
//! 实现握手协议状态机的客户端。

use crate::crypto::block::{BlockHasher, Sha256Block};
use crate::handshake::config::Config;
use crate::handshake::negotiate::{ClientOffer, NegotiatedExtensions};
use crate::protocol::{
    log::HandshakeLog,
    message::{ClientHello, ServerHello},
    state::{AwaitingServerFlight, Established, Ready},
    transcript::Tag,
};
use std::marker::PhantomData;

mod builder;
mod state_awaiting_flight;
mod state_established;
mod state_ready;

pub use builder::HandshakeClientBuilder;

/// The client-side handshake state machine.
///
/// Generic over the state `State` to enforce protocol flow at compile time.
/// This prevents out-of-order operations, such as reading negotiated
/// parameters before the server's flight has been verified.
///
/// 客户端握手协议状态机。
///
/// 通过泛型状态 `State` 在编译时强制执行协议流程。
/// 这可以防止乱序操作，例如在服务器飞行通过验证之前读取协商参数。
#[derive(Debug)]
pub struct HandshakeClient<State, H: BlockHasher = Sha256Block> {
    /// Zero-sized marker to hold the current state.
    ///
    /// 零大小标记，用于持有当前状态。
    state: PhantomData<State>,
    config: Config,
    /// Per-handshake offer: key shares, PSK, cookie.
    ///
    /// 每次握手的提议：密钥共享、PSK、cookie。
    offer: ClientOffer,
    random: [u8; 32],
    session_id: Vec<u8>,
    /// The hashed transcript of this handshake. Both directions are logged here.
    ///
    /// 本次握手的带哈希握手记录。双方向的消息都记录于此。
    log: HandshakeLog<H>,
    /// The ClientHello as sent. Available from `AwaitingServerFlight` on.
    ///
    /// 已发送的 ClientHello。自 `AwaitingServerFlight` 状态起可用。
    client_hello: Option<ClientHello>,
    /// The verified ServerHello. Available only in the `Established` state.
    ///
    /// 已验证的 ServerHello。仅在 `Established` 状态下可用。
    server_hello: Option<ServerHello>,
    /// Available only in the `Established` state.
    ///
    /// 仅在 `Established` 状态下可用。
    negotiated: Option<NegotiatedExtensions>,
    /// The server's verified Finished tag.
    ///
    /// 服务器已验证的 Finished 标签。
    server_finished: Option<Tag>,
}

/// What one call to [`HandshakeClient::receive`] produced.
#[derive(Debug)]
pub enum ClientStep<H: BlockHasher = Sha256Block> {
    /// The server's flight is not complete yet; feed more bytes.
    NeedMore(HandshakeClient<AwaitingServerFlight, H>),
    /// The flight was verified and negotiation succeeded.
    Established(HandshakeClient<Established, H>),
}

impl<State, H: BlockHasher> HandshakeClient<State, H> {
    /// Moves the handshake data into the next state.
    fn transition<Next>(self) -> HandshakeClient<Next, H> {
        HandshakeClient {
            state: PhantomData,
            config: self.config,
            offer: self.offer,
            random: self.random,
            session_id: self.session_id,
            log: self.log,
            client_hello: self.client_hello,
            server_hello: self.server_hello,
            negotiated: self.negotiated,
            server_finished: self.server_finished,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The handshake log, for inspecting the transcript and its hash.
    pub fn log(&self) -> &HandshakeLog<H> {
        &self.log
    }
}
