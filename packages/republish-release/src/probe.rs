use std::collections::HashMap;
use std::fmt;

use republish_utils::http::{head, http_status_is_ok};

/// Outcome of a HEAD request against a public download URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub url: String,
    /// `None` when no response was received at all.
    pub status: Option<u16>,
    pub description: String,
}

impl ProbeReport {
    pub fn is_reachable(&self) -> bool {
        self.status.is_some_and(http_status_is_ok)
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} test status {} {}", self.url, status, self.description),
            None => write!(f, "{} test failed: {}", self.url, self.description),
        }
    }
}

/// Issues a HEAD request to `url` without following redirects. GitHub
/// answers asset downloads with a redirect, which counts as reachable.
pub async fn probe_url(url: &str) -> ProbeReport {
    let parsed = match url.parse() {
        Ok(parsed) => parsed,
        Err(e) => {
            return ProbeReport {
                url: url.to_string(),
                status: None,
                description: format!("invalid url: {e}"),
            }
        }
    };
    match head(parsed, &HashMap::new()).await {
        Ok(rsp) => ProbeReport {
            url: url.to_string(),
            status: Some(rsp.status),
            description: rsp.reason().to_string(),
        },
        Err(e) => ProbeReport {
            url: url.to_string(),
            status: None,
            description: e.to_string(),
        },
    }
}
