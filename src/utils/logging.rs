use tracing_subscriber::EnvFilter;

/// Verbosity levels understood by zap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    #[default]
    Standard,
    Stats,
    Verbose,
    Debug,
}

impl LogLevel {
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Standard => "warn",
            LogLevel::Stats => "info",
            LogLevel::Verbose => "debug",
            LogLevel::Debug => "trace",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Standard => write!(f, "standard"),
            LogLevel::Stats => write!(f, "stats"),
            LogLevel::Verbose => write!(f, "verbose"),
            LogLevel::Debug => write!(f, "debug"),
        }
    }
}

/// Install the process-wide subscriber at the standard level.
///
/// Diagnostics go to stderr so they never mix with command output. Calling
/// this more than once is harmless: later attempts are ignored.
pub fn setup_logging() {
    setup_logging_at(LogLevel::Standard);
}

fn setup_logging_at(level: LogLevel) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(_) => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.as_filter_str())),
        Err(_) => EnvFilter::new(level.as_filter_str()),
    };

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();

    if installed.is_ok() {
        tracing::debug!(level = %level, "logging initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_strings() {
        assert_eq!(LogLevel::Standard.as_filter_str(), "warn");
        assert_eq!(LogLevel::Stats.as_filter_str(), "info");
        assert_eq!(LogLevel::Verbose.as_filter_str(), "debug");
        assert_eq!(LogLevel::Debug.as_filter_str(), "trace");
    }

    #[test]
    fn test_display_names() {
        let names: Vec<String> = [LogLevel::Standard, LogLevel::Stats, LogLevel::Verbose, LogLevel::Debug]
            .iter()
            .map(|level| level.to_string())
            .collect();
        assert_eq!(names, vec!["standard", "stats", "verbose", "debug"]);
        assert_eq!(LogLevel::default(), LogLevel::Standard);
    }

    #[test]
    fn test_setup_logging_twice_does_not_panic() {
        setup_logging();
        setup_logging_at(LogLevel::Debug);
    }
}
