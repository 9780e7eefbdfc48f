pub mod codec;
pub mod extension;
pub mod log;
pub mod message;
pub mod state;
pub mod transcript;
pub mod types;
