//! Line-oriented remote file browser served over TCP.
//!
//! Every connection gets a [`session::Session`] with its own working directory.
//! The [`server::Server`] multiplexes all of them on one thread with `poll(2)`.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod fs;
pub mod logging;
pub mod parser;
pub mod server;
pub mod session;

pub use config::Config;
pub use error::ServerError;
pub use fs::{Filesystem, LocalFs};
pub use server::Server;
