pub mod crypto;
pub mod error;
pub mod handshake;
pub mod protocol;

pub use error::{HandshakeError, Result};
pub use handshake::{client, server};
pub use protocol::log::{Flight, HandshakeLog, LogPolicy, Outcome, Received};
pub use protocol::transcript::{HashState, Tag, TagLedger, Transcript};
