use colored::*;

use crate::utils::error::ZapError;

/// Formats diagnostics written to stderr
pub struct OutputFormatter;

impl OutputFormatter {
    /// Format an error for CLI display.
    ///
    /// Argument parsing errors keep clap's own rendering, which already
    /// carries the usage hint.
    pub fn format_error(error: &anyhow::Error) -> String {
        match error.downcast_ref::<ZapError>() {
            Some(ZapError::Cli(parse_error)) => parse_error.to_string().trim_end().to_string(),
            _ => format!("{} {}", "Error:".red().bold(), format!("{:#}", error).red()),
        }
    }
}
