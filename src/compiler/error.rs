//! Compiler error types.

use crate::{fs::FsError, utils::error_chain};
use std::{io, time::Duration};
use thiserror::Error;

/// Why a single file could not be compiled.
///
/// Every variant is recoverable: the build reports it against the source
/// file and moves on to the next one.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Compiler command is empty")]
    EmptyCommand,

    #[error("Failed to start `{name}`")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("`{name}` did not finish within {}s and was killed", .timeout.as_secs())]
    Timeout { name: String, timeout: Duration },

    #[error("IO error while running `{name}`")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },

    /// The compiler ran and rejected the input.
    #[error("{message}")]
    Diagnostics { label: String, message: String },

    #[error("Compiler produced an invalid source map")]
    SourceMap(#[from] serde_json::Error),

    #[error("Failed to prepare scratch workspace")]
    Scratch(#[source] io::Error),

    #[error(transparent)]
    Fs(#[from] FsError),
}

impl CompileError {
    /// Short label shown next to the file name.
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Diagnostics { label, .. } => Some(label),
            Self::SourceMap(_) => Some("source map"),
            _ => None,
        }
    }

    /// Full message, including the chain of underlying causes.
    pub fn message(&self) -> String {
        if let Self::Diagnostics { message, .. } = self {
            return message.clone();
        }

        error_chain(self)
    }
}
