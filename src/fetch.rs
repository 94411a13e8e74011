//! Remote resource access with a deadline
//!
//! Every remote read goes through [`fetch_with_deadline`]. The deadline
//! bounds the whole exchange (connect, headers and body), and bodies larger
//! than the byte limit are refused both from the declared length and while
//! reading.

use std::io::Read;
use std::time::Duration;

use log::debug;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid URL '{0}'")]
    InvalidUrl(String),

    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} is {size} bytes, limit is {limit}")]
    TooLarge { url: String, size: u64, limit: u64 },
}

/// Limits applied to one remote read.
#[derive(Debug, Clone)]
pub struct Deadline {
    pub timeout: Duration,
    pub max_bytes: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

pub fn is_remote(source: &str) -> bool {
    let lower = source.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// GET `url`, failing on timeout, non-success status or an oversize body.
pub fn fetch_with_deadline(url: &str, deadline: &Deadline) -> Result<Fetched, FetchError> {
    let url = url.trim();
    let parsed = reqwest::Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;

    let client = reqwest::blocking::Client::builder()
        .timeout(deadline.timeout)
        .user_agent(deadline.user_agent.as_str())
        .build()
        .map_err(|e| FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    let classify = |e: reqwest::Error| {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout: deadline.timeout,
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    };

    let response = client.get(parsed).send().map_err(classify)?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    if let Some(declared) = response.content_length() {
        if declared > deadline.max_bytes {
            return Err(FetchError::TooLarge {
                url: url.to_string(),
                size: declared,
                limit: deadline.max_bytes,
            });
        }
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase());

    let mut bytes = Vec::new();
    response
        .take(deadline.max_bytes + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| {
            // Body reads surface reqwest timeouts as io errors.
            if e.kind() == std::io::ErrorKind::TimedOut {
                FetchError::Timeout {
                    url: url.to_string(),
                    timeout: deadline.timeout,
                }
            } else {
                FetchError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;
    if bytes.len() as u64 > deadline.max_bytes {
        return Err(FetchError::TooLarge {
            url: url.to_string(),
            size: bytes.len() as u64,
            limit: deadline.max_bytes,
        });
    }

    debug!("fetched {} ({} bytes, {:?})", url, bytes.len(), content_type);
    Ok(Fetched { bytes, content_type })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://cdn.example.org/logo.png"));
        assert!(is_remote("  HTTP://host/a.jpg"));
        assert!(!is_remote("/var/uploads/logo.png"));
        assert!(!is_remote("uploads/photo.jpg"));
    }

    #[test]
    fn test_invalid_url() {
        let deadline = Deadline {
            timeout: Duration::from_secs(1),
            max_bytes: 1024,
            user_agent: "test".to_string(),
        };
        assert!(matches!(
            fetch_with_deadline("http://", &deadline),
            Err(FetchError::InvalidUrl(_))
        ));
    }
}
