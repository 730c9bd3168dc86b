use thiserror::Error;

/// Failure of one source during one pass.
///
/// Every variant is contained at single-source granularity by the service;
/// none aborts the batch or the process.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to fetch snapshot for {url}")]
    Fetch {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to look up previous snapshot for {url}")]
    Lookup {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to deliver change notification for {url}")]
    Delivery {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to persist snapshot for {url}")]
    Persist {
        url: String,
        #[source]
        source: anyhow::Error,
    },
}

impl SourceError {
    pub(crate) fn fetch(url: &str, source: anyhow::Error) -> Self {
        Self::Fetch { url: url.to_string(), source }
    }

    pub(crate) fn lookup(url: &str, source: anyhow::Error) -> Self {
        Self::Lookup { url: url.to_string(), source }
    }

    pub(crate) fn delivery(url: &str, source: anyhow::Error) -> Self {
        Self::Delivery { url: url.to_string(), source }
    }

    pub(crate) fn persist(url: &str, source: anyhow::Error) -> Self {
        Self::Persist { url: url.to_string(), source }
    }

    /// The source URL this failure belongs to.
    pub fn url(&self) -> &str {
        match self {
            Self::Fetch { url, .. }
            | Self::Lookup { url, .. }
            | Self::Delivery { url, .. }
            | Self::Persist { url, .. } => url,
        }
    }
}
