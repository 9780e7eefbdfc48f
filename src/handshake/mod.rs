//! Negotiation and the typestate handshake drivers built on the log.
//! 协商逻辑以及基于握手日志的类型状态驱动。

pub mod client;
pub mod config;
pub mod negotiate;
pub mod server;

pub use client::{ClientStep, HandshakeClient};
pub use config::{Config, ConfigBuilder};
pub use negotiate::{ClientOffer, NegotiatedExtensions};
pub use server::{HandshakeServer, ServerStep};
