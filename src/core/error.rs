use thiserror::Error;

/// Failures that abort a whole deck analysis.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("No cards found in decklist")]
    EmptyInput,

    #[error("No valid cards found in decklist")]
    NoCardsResolved,

    #[error("Error analyzing deck: {0:#}")]
    Unexpected(#[from] anyhow::Error),
}

impl AnalyzeError {
    /// Bad input as opposed to a fault on our side.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::EmptyInput | Self::NoCardsResolved)
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            Self::EmptyInput => "empty_input",
            Self::NoCardsResolved => "no_cards_resolved",
            Self::Unexpected(_) => "unexpected",
        }
    }
}

/// A single card lookup that did not produce attributes. Never fatal to the batch.
#[derive(Debug, Error)]
pub enum UnresolvedCard {
    #[error("card '{name}' not found: {details}")]
    NotFound { name: String, details: String },

    #[error("lookup for '{name}' returned HTTP {status}")]
    Status { name: String, status: u16 },

    #[error("lookup for '{name}' timed out")]
    Timeout { name: String },

    #[error("lookup for '{name}' failed: {source}")]
    Transport {
        name: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("lookup for '{name}' returned an unreadable body: {reason}")]
    Malformed { name: String, reason: String },
}

impl UnresolvedCard {
    pub fn from_reqwest(name: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                name: name.to_string(),
            }
        } else if err.is_decode() {
            Self::Malformed {
                name: name.to_string(),
                reason: err.to_string(),
            }
        } else {
            Self::Transport {
                name: name.to_string(),
                source: err,
            }
        }
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Status { .. } => "status",
            Self::Timeout { .. } => "timeout",
            Self::Transport { .. } => "transport",
            Self::Malformed { .. } => "malformed",
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    /// Nothing to draw; callers substitute an empty image.
    #[error("no data to render the {0} chart")]
    Unavailable(&'static str),

    #[error("rendering the {chart} chart failed")]
    Failed {
        chart: &'static str,
        #[source]
        source: std::fmt::Error,
    },

    #[error("rasterizing the {chart} chart failed: {reason}")]
    Raster { chart: &'static str, reason: String },
}
