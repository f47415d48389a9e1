use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures of the listener and event loop. Per-connection and filesystem
/// errors never reach this type: they close one session or become a reply line.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("root directory {path} is not usable: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("root {0} is not a directory")]
    RootNotDirectory(PathBuf),

    #[error("readiness wait failed: {0}")]
    Poll(#[from] nix::errno::Errno),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
