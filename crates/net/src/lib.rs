//! Blocking text fetch for questionnaire content and stylesheets.
//!
//! `http(s)` goes through a ureq agent with a 10 s timeout; `file` URLs are read
//! from disk so local questionnaires can load their side files the same way.

use std::sync::OnceLock;
use std::time::{Duration, Instant};
use url::Url;

const TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "questrender/0.1";

static AGENT: OnceLock<ureq::Agent> = OnceLock::new();

fn agent() -> &'static ureq::Agent {
    AGENT.get_or_init(|| {
        ureq::AgentBuilder::new()
            .timeout(TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
    })
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported url scheme `{0}`")]
    UnsupportedScheme(String),

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("failed to read {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone, Debug)]
pub struct FetchResult {
    /// Where the body came from once redirects are followed.
    pub url: String,
    pub duration_ms: u128,
    pub body: String,
}

pub fn parse_url(url: &str) -> Result<Url, FetchError> {
    Url::parse(url).map_err(|source| FetchError::InvalidUrl {
        url: url.to_string(),
        source,
    })
}

/// Resolve `relative` against the directory of `base`.
pub fn resolve(base: &Url, relative: &str) -> Result<Url, FetchError> {
    base.join(relative).map_err(|source| FetchError::InvalidUrl {
        url: relative.to_string(),
        source,
    })
}

/// Fetch `url` as text.
pub fn fetch_text(url: &Url) -> Result<FetchResult, FetchError> {
    let start = Instant::now();

    let result = match url.scheme() {
        "http" | "https" => fetch_http(url),
        "file" => read_file(url),
        other => Err(FetchError::UnsupportedScheme(other.to_string())),
    };

    match &result {
        Ok(ok) => log::debug!(
            target: "net",
            "fetched {} bytes={} in {}ms",
            ok.url,
            ok.body.len(),
            start.elapsed().as_millis()
        ),
        Err(err) => log::warn!(target: "net", "fetch {url} failed: {err}"),
    }
    result.map(|ok| FetchResult {
        duration_ms: start.elapsed().as_millis(),
        ..ok
    })
}

fn fetch_http(url: &Url) -> Result<FetchResult, FetchError> {
    let resp = match agent().get(url.as_str()).call() {
        Ok(resp) => resp,
        Err(ureq::Error::Status(status, _)) => {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        Err(ureq::Error::Transport(err)) => {
            return Err(FetchError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            });
        }
    };

    let final_url = resp.get_url().to_string();
    let body = resp.into_string().map_err(|source| FetchError::Io {
        url: url.to_string(),
        source,
    })?;

    Ok(FetchResult {
        url: final_url,
        duration_ms: 0,
        body,
    })
}

fn read_file(url: &Url) -> Result<FetchResult, FetchError> {
    let path = url
        .to_file_path()
        .map_err(|()| FetchError::UnsupportedScheme(url.scheme().to_string()))?;
    let body = std::fs::read_to_string(&path).map_err(|source| FetchError::Io {
        url: url.to_string(),
        source,
    })?;
    Ok(FetchResult {
        url: url.to_string(),
        duration_ms: 0,
        body,
    })
}
