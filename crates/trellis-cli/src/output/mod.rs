//! Terminal output formatting.
//!
//! Command results go to stdout; status lines and errors go to stderr so
//! that `trellis resolve --json` stays machine readable.

pub mod colors;
pub mod errors;
pub mod progress;

/// Output handler for consistent terminal formatting
#[derive(Debug, Clone)]
pub struct OutputHandler {
    colors: colors::ColorSupport,
}

impl OutputHandler {
    /// Create a new output handler
    pub fn new() -> Self {
        Self {
            colors: colors::ColorSupport::detect(),
        }
    }

    /// Handler that never emits escape codes
    pub fn plain() -> Self {
        Self {
            colors: colors::ColorSupport::disabled(),
        }
    }

    /// Print a line of command output
    pub fn print(&self, message: &str) {
        println!("{}", message);
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", self.colors.green("✓"), message);
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", self.colors.red("✗"), message);
    }

    /// One `project version` line of a resolved mapping
    pub fn format_pin(&self, project: &str, version: &str) -> String {
        format!("{} {}", self.colors.bold(project), version)
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}
