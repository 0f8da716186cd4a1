//! RakNet transport layer: reliable, ordered, fragmenting UDP sessions
//! as used by Minecraft Bedrock Edition clients.

pub mod address;
pub mod codec;
pub mod constants;
pub mod error;
pub mod fragmentation;
pub mod ordering;
pub mod packet;
pub mod reliability;
pub mod server;
pub mod session;

pub use address::RakNetAddress;
pub use error::RakNetError;
pub use packet::frame::Reliability;
pub use packet::offline::ServerDescriptor;
pub use server::{RakNetConfig, RakNetEvent, RakNetServer, ServerCommand, ServerHandle};
pub use session::SessionState;
