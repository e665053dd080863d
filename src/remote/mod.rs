mod connection;
mod rpc_error;

pub use connection::{Connection, ConnectionBuilder, RequestContext};
