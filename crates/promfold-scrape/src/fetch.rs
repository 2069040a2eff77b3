//! HTTP/1.1 scrape of a metrics endpoint.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use tracing::debug;

use crate::error::FetchError;
use crate::host::HostUrl;

const USER_AGENT: &str = "promfold/0.1";
const ACCEPT: &str = "text/plain;version=0.0.4;q=0.9,*/*;q=0.1";

/// Fetch the exposition payload at `url`, bounded by `timeout` end to end.
pub async fn fetch(url: &HostUrl, timeout: Duration) -> Result<String, FetchError> {
    let target = url.to_string();
    let result = tokio::time::timeout(timeout, fetch_inner(url, &target)).await;
    match result {
        Ok(result) => result,
        Err(_) => {
            debug!(url = %target, "scrape timed out");
            Err(FetchError::Timeout {
                url: target,
                timeout,
            })
        }
    }
}

async fn fetch_inner(url: &HostUrl, target: &str) -> Result<String, FetchError> {
    let address = url.address();
    let stream = tokio::net::TcpStream::connect(&address)
        .await
        .map_err(|e| FetchError::Connect {
            address: address.clone(),
            reason: e.to_string(),
        })?;

    let io = hyper_util::rt::TokioIo::new(stream);
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| FetchError::Connect {
            address: address.clone(),
            reason: e.to_string(),
        })?;

    // Drive the connection in the background.
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!(error = %e, "scrape connection closed with error");
        }
    });

    let req = http::Request::builder()
        .method("GET")
        .uri(&url.path)
        .header("host", &address)
        .header("user-agent", USER_AGENT)
        .header("accept", ACCEPT)
        .body(Empty::<Bytes>::new())
        .map_err(|e| FetchError::Request {
            url: target.to_string(),
            reason: e.to_string(),
        })?;

    let resp = sender
        .send_request(req)
        .await
        .map_err(|e| FetchError::Request {
            url: target.to_string(),
            reason: e.to_string(),
        })?;

    if !resp.status().is_success() {
        debug!(status = %resp.status(), url = %target, "scrape non-2xx");
        return Err(FetchError::Status {
            url: target.to_string(),
            status: resp.status().as_u16(),
        });
    }

    let body = resp
        .into_body()
        .collect()
        .await
        .map_err(|e| FetchError::Body {
            url: target.to_string(),
            reason: e.to_string(),
        })?
        .to_bytes();

    let text = String::from_utf8(body.to_vec()).map_err(|e| FetchError::Body {
        url: target.to_string(),
        reason: e.to_string(),
    })?;
    debug!(url = %target, bytes = text.len(), "scrape complete");
    Ok(text)
}
