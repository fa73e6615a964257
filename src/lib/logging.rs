use env_logger::Env;

#[derive(Debug, clap::ValueEnum, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Verbose,
    Normal,
    Silent,
}

impl LogLevel {
    pub fn default_filter(&self) -> &'static str {
        match self {
            LogLevel::Verbose => "debug",
            LogLevel::Normal => "info",
            LogLevel::Silent => "off",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Verbose => write!(f, "verbose"),
            LogLevel::Normal => write!(f, "normal"),
            LogLevel::Silent => write!(f, "silent"),
        }
    }
}

/// Initialise env_logger; `RUST_LOG` still overrides the verbosity flag.
pub fn init_logging(verbosity: LogLevel) {
    env_logger::Builder::from_env(Env::default().default_filter_or(verbosity.default_filter()))
        .target(env_logger::Target::Stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filters() {
        assert_eq!(LogLevel::Verbose.default_filter(), "debug");
        assert_eq!(LogLevel::Normal.default_filter(), "info");
        assert_eq!(LogLevel::Silent.default_filter(), "off");
    }

    #[test]
    fn test_display() {
        assert_eq!(LogLevel::Silent.to_string(), "silent");
    }
}
