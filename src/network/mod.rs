//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread (the caller of `Server::run`)
//! - Worker thread pool fed through a bounded queue
//! - Commands routed through a shared Engine (one writer, many readers)

mod server;
mod connection;

pub use server::{Server, ShutdownHandle};
pub use connection::Connection;
