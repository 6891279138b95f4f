//! Live channel adapter: WebSocket transport for the debate room.

mod connection;
mod error;
pub mod protocol;

pub use connection::SessionConnection;
pub use error::ConnectionError;
