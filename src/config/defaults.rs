//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [tools] Section Defaults
// ============================================================================

pub mod tools {
    use std::path::PathBuf;

    pub fn runtime() -> Option<PathBuf> {
        None
    }

    pub fn command() -> Option<Vec<String>> {
        None
    }

    /// Seconds before a compiler process is killed.
    pub fn timeout() -> u64 {
        300
    }

    /// Directory name of the bundled Ruby runtime inside `runtime`.
    pub const RUBY_BUNDLE: &str = "ruby_bundle";
}

// ============================================================================
// [groups.<name>] Section Defaults
// ============================================================================

pub mod group {
    use std::path::PathBuf;

    pub fn src() -> PathBuf {
        "src".into()
    }

    pub fn dest() -> PathBuf {
        "build".into()
    }

    pub fn bower() -> Option<PathBuf> {
        None
    }
}
