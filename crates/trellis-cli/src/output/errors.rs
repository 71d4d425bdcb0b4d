//! Error message formatting with actionable suggestions.

use trellis_core::error::TrellisError;
use trellis_resolver::ResolutionError;

use super::colors::ColorSupport;

/// Error formatter with suggestions
#[derive(Debug, Clone)]
pub struct ErrorFormatter {
    colors: ColorSupport,
}

impl ErrorFormatter {
    pub fn new() -> Self {
        Self {
            colors: ColorSupport::detect(),
        }
    }

    /// Format an error with its cause chain and, when the root error is one
    /// of ours, a suggestion
    pub fn format_error(&self, error: &anyhow::Error) -> String {
        let mut output = String::new();

        output.push_str(&self.colors.red("error"));
        output.push_str(": ");
        output.push_str(&error.to_string());

        for cause in error.chain().skip(1) {
            output.push('\n');
            output.push_str(&self.colors.dim("caused by"));
            output.push_str(": ");
            output.push_str(&cause.to_string());
        }

        if let Some(suggestion) = Self::suggestion(error) {
            output.push_str("\n\n");
            output.push_str(&self.colors.dim("help"));
            output.push_str(": ");
            output.push_str(suggestion);
        }

        output
    }

    fn suggestion(error: &anyhow::Error) -> Option<&'static str> {
        error.chain().find_map(|cause| {
            if let Some(resolution) = cause.downcast_ref::<ResolutionError>() {
                resolution.suggestion()
            } else {
                cause.downcast_ref::<TrellisError>().and_then(TrellisError::suggestion)
            }
        })
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}
