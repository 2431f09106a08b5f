// HTTP readiness check implementation

use crate::{ProbeOutcome, ReadinessError, ReadinessResult};
use http_body_util::Empty;
use hyper::body::Bytes;
use hyper::header::USER_AGENT;
use hyper::{Method, Request, Uri};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use tokio::time::timeout;
use tracing::trace;

/// Parse and validate a probe target. Only plain `http://host:port/...` URLs
/// are accepted.
pub fn parse_probe_uri(url: &str) -> ReadinessResult<Uri> {
    let uri: Uri = url.parse().map_err(|e| ReadinessError::InvalidUrl {
        url: url.to_string(),
        reason: format!("{}", e),
    })?;

    if uri.scheme_str() != Some("http") {
        return Err(ReadinessError::InvalidUrl {
            url: url.to_string(),
            reason: "only http:// URLs can be probed".to_string(),
        });
    }

    if uri.authority().is_none() {
        return Err(ReadinessError::InvalidUrl {
            url: url.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(uri)
}

/// Issue one GET against `uri`.
///
/// Every failure mode (refused connection, non-2xx, timeout) is reported as
/// an outcome rather than an error: while the server is still binding its
/// port these are expected.
pub async fn check_http_ready(uri: &Uri, request_timeout: Duration) -> ProbeOutcome {
    let client = Client::builder(TokioExecutor::new()).build_http::<Empty<Bytes>>();

    let request = match Request::builder()
        .method(Method::GET)
        .uri(uri.clone())
        .header(USER_AGENT, "suite-supervisor/0.1")
        .body(Empty::<Bytes>::new())
    {
        Ok(request) => request,
        Err(e) => {
            return ProbeOutcome::Unreachable {
                reason: format!("Failed to build request: {}", e),
            }
        }
    };

    match timeout(request_timeout, client.request(request)).await {
        Ok(Ok(response)) => {
            let status = response.status();
            trace!("Readiness probe {} answered {}", uri, status);
            if status.is_success() {
                ProbeOutcome::Ready {
                    status: status.as_u16(),
                }
            } else {
                ProbeOutcome::NotReady {
                    status: status.as_u16(),
                }
            }
        }
        Ok(Err(e)) => ProbeOutcome::Unreachable {
            reason: e.to_string(),
        },
        Err(_) => ProbeOutcome::TimedOut,
    }
}
