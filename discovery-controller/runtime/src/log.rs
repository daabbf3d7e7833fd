use anyhow::{anyhow, Context, Result};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Selects how log lines are written to stderr.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("invalid log format {0:?}: expected 'plain' or 'json'")]
pub struct InvalidLogFormat(String);

// === impl LogFormat ===

impl LogFormat {
    /// Installs the global subscriber, filtering with the given directives.
    pub fn try_init(self, directives: &str) -> Result<()> {
        let filter = EnvFilter::try_new(directives)
            .with_context(|| format!("invalid log level {directives:?}"))?;
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);
        match self {
            Self::Plain => builder.try_init(),
            Self::Json => builder.json().with_current_span(false).try_init(),
        }
        .map_err(|error| anyhow!(error))
    }
}

impl FromStr for LogFormat {
    type Err = InvalidLogFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            _ => Err(InvalidLogFormat(s.to_string())),
        }
    }
}
