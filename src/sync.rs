mod codec;
mod connection;
mod gateway;
mod loader;
mod reconciler;
mod router;
mod sink;
mod store;
mod transport;

pub use codec::*;
pub use connection::*;
pub use gateway::*;
pub use loader::*;
pub use reconciler::*;
pub use router::*;
pub use sink::*;
pub use store::*;
pub use transport::*;
