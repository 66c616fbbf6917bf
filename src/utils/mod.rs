//! Utility modules for the asset pipeline.

pub mod path;
pub mod sort;

use std::error::Error;

/// Render an error and all of its causes on one line, `outer: inner`.
pub fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
