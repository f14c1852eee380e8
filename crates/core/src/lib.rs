pub mod backoff;
pub mod bridge;
pub mod config;
pub mod error;
pub mod login;
pub mod media;
pub mod protocol;
pub mod publisher;
pub mod session;
pub mod source;

pub use bridge::Bridge;
pub use config::{AppConfig, Codec, StreamConfig};
pub use error::{BridgeError, Result};
pub use media::Packetizer;
pub use publisher::VideoPublisher;
