pub mod protocol;
pub mod registry;
pub mod ws;

pub use protocol::ClientEvent;
pub use registry::{ConnectionId, ConnectionRegistry, ServerEvent};
