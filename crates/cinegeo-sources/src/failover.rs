//! One logical request, many mirrors: try each endpoint once, in order.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::error::SourcesError;

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Builds the shared HTTP client every upstream uses.
///
/// `timeout_secs` bounds each individual call, so a hung mirror costs at most
/// one timeout before the next is tried.
///
/// # Errors
///
/// Returns [`SourcesError::Client`] if the `reqwest::Client` cannot be built.
pub fn build_http_client(timeout_secs: u64, user_agent: &str) -> Result<Client, SourcesError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS.min(timeout_secs)))
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// Why a single endpoint did not produce a usable response.
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("invalid target URL {target}: {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("request to {target} timed out")]
    Timeout { target: String },

    #[error("transport error from {target}: {source}")]
    Transport {
        target: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{target} is temporarily unavailable (HTTP {status})")]
    Unavailable { target: String, status: u16 },

    #[error("unexpected HTTP status {status} from {target}")]
    Status { target: String, status: u16 },

    #[error("undecodable response from {target}: {reason}")]
    Decode { target: String, reason: String },
}

/// Outcome of a logical call when no endpoint succeeded.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no endpoints configured for {upstream}")]
    NoTargets { upstream: String },

    #[error("all {attempts} endpoint(s) for {upstream} failed; last: {last}")]
    Exhausted {
        upstream: String,
        attempts: usize,
        #[source]
        last: FetchFailure,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Get,
    PostForm,
}

/// What to send to each endpoint.
///
/// `params` become the query string for GET and the urlencoded body for a
/// form POST. Path segments are percent-encoded and appended to every target
/// base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    method: Method,
    segments: Vec<String>,
    params: Vec<(String, String)>,
}

impl RequestSpec {
    /// `path` is split on `/`; use [`Self::segment`] for opaque identifiers.
    #[must_use]
    pub fn get(path: &str) -> Self {
        Self::new(Method::Get, path)
    }

    #[must_use]
    pub fn post_form(path: &str) -> Self {
        Self::new(Method::PostForm, path)
    }

    fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            params: Vec::new(),
        }
    }

    /// Appends one path segment, escaping any `/` or `?` it contains.
    #[must_use]
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    fn url_for(&self, target: &str) -> Result<Url, FetchFailure> {
        let invalid = |reason: String| FetchFailure::InvalidTarget {
            target: target.to_string(),
            reason,
        };
        let mut url = Url::parse(target).map_err(|e| invalid(e.to_string()))?;
        if !self.segments.is_empty() {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| invalid("URL cannot carry a path".to_string()))?;
            path.pop_if_empty().extend(&self.segments);
        }
        Ok(url)
    }
}

/// A named upstream with its ordered mirror list.
#[derive(Debug, Clone)]
pub struct Failover {
    client: Client,
    upstream: String,
    targets: Vec<String>,
}

impl Failover {
    #[must_use]
    pub fn new(client: Client, upstream: impl Into<String>, targets: Vec<String>) -> Self {
        Self {
            client,
            upstream: upstream.into(),
            targets,
        }
    }

    #[must_use]
    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    #[must_use]
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Returns the first successful response body as text.
    ///
    /// # Errors
    ///
    /// [`FetchError::NoTargets`] for an empty mirror list, otherwise
    /// [`FetchError::Exhausted`] carrying the last target's failure.
    pub async fn execute(&self, spec: &RequestSpec) -> Result<String, FetchError> {
        self.execute_with(spec, |body| Ok(body.to_string())).await
    }

    /// Like [`Self::execute`], decoding the body as JSON. A mirror that
    /// answers 2xx with a body of the wrong shape counts as failed and the
    /// next mirror is tried.
    ///
    /// # Errors
    ///
    /// Same as [`Self::execute`].
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        spec: &RequestSpec,
    ) -> Result<T, FetchError> {
        self.execute_with(spec, |body| {
            serde_json::from_str::<T>(body).map_err(|e| e.to_string())
        })
        .await
    }

    async fn execute_with<T, D>(&self, spec: &RequestSpec, decode: D) -> Result<T, FetchError>
    where
        D: Fn(&str) -> Result<T, String>,
    {
        let mut last = None;

        for (index, target) in self.targets.iter().enumerate() {
            let attempt = index + 1;
            match self.attempt(target, spec, &decode).await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(
                            source = %self.upstream,
                            target = %target,
                            attempt,
                            "upstream succeeded after failover"
                        );
                    }
                    return Ok(value);
                }
                Err(failure) => {
                    tracing::warn!(
                        source = %self.upstream,
                        target = %target,
                        attempt,
                        error = %failure,
                        "upstream endpoint failed"
                    );
                    last = Some(failure);
                }
            }
        }

        match last {
            Some(last) => Err(FetchError::Exhausted {
                upstream: self.upstream.clone(),
                attempts: self.targets.len(),
                last,
            }),
            None => Err(FetchError::NoTargets {
                upstream: self.upstream.clone(),
            }),
        }
    }

    async fn attempt<T, D>(
        &self,
        target: &str,
        spec: &RequestSpec,
        decode: &D,
    ) -> Result<T, FetchFailure>
    where
        D: Fn(&str) -> Result<T, String>,
    {
        let url = spec.url_for(target)?;
        let label = url.to_string();

        let request = match spec.method {
            Method::Get => self.client.get(url).query(&spec.params),
            Method::PostForm => self.client.post(url).form(&spec.params),
        };

        let response = request
            .send()
            .await
            .map_err(|e| transport_failure(&label, e))?;

        let status = response.status();
        if is_unavailable(status) {
            return Err(FetchFailure::Unavailable {
                target: label,
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(FetchFailure::Status {
                target: label,
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| transport_failure(&label, e))?;

        decode(&body).map_err(|reason| FetchFailure::Decode {
            target: label,
            reason,
        })
    }
}

fn is_unavailable(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn transport_failure(target: &str, error: reqwest::Error) -> FetchFailure {
    if error.is_timeout() {
        FetchFailure::Timeout {
            target: target.to_string(),
        }
    } else {
        FetchFailure::Transport {
            target: target.to_string(),
            source: error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_for_joins_path_without_double_slash() {
        let spec = RequestSpec::get("/locations");
        let url = spec.url_for("https://catalog.example.com/api/").unwrap();
        assert_eq!(url.as_str(), "https://catalog.example.com/api/locations");
    }

    #[test]
    fn url_for_uses_bare_target_when_path_is_empty() {
        let spec = RequestSpec::post_form("");
        let url = spec
            .url_for("https://overpass-api.de/api/interpreter")
            .unwrap();
        assert_eq!(url.as_str(), "https://overpass-api.de/api/interpreter");
    }

    #[test]
    fn url_for_escapes_opaque_segments() {
        let spec = RequestSpec::get("venues").segment("B0/42").segment("showtimes");
        let url = spec.url_for("http://localhost:8787/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8787/api/venues/B0%2F42/showtimes");
    }

    #[test]
    fn url_for_rejects_garbage_target() {
        let spec = RequestSpec::get("x");
        assert!(matches!(
            spec.url_for("not a url"),
            Err(FetchFailure::InvalidTarget { .. })
        ));
    }

    #[test]
    fn unavailable_statuses_are_the_transient_set() {
        assert!(is_unavailable(StatusCode::GATEWAY_TIMEOUT));
        assert!(is_unavailable(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_unavailable(StatusCode::NOT_FOUND));
        assert!(!is_unavailable(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn empty_target_list_is_no_targets() {
        let client = build_http_client(5, "cinegeo-test/0.1").unwrap();
        let failover = Failover::new(client, "directory", Vec::new());
        let result = failover.execute(&RequestSpec::get("")).await;
        assert!(matches!(result, Err(FetchError::NoTargets { .. })));
    }
}
