// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Infrastructure functions that every web call goes through.

use std::time::Duration;

use hyper::client::ResponseFuture;
use hyper::http::response::Parts;
use hyper::{Body, Client, Request};

use crate::error::{self, Error};

#[cfg(feature = "native_tls")]
fn new_client() -> Client<hyper_tls::HttpsConnector<hyper::client::HttpConnector>> {
    Client::builder().build(hyper_tls::HttpsConnector::new())
}

#[cfg(all(feature = "rustls", not(feature = "native_tls")))]
fn new_client() -> Client<hyper_rustls::HttpsConnector<hyper::client::HttpConnector>> {
    Client::builder().build(hyper_rustls::HttpsConnector::with_native_roots())
}

#[cfg(all(
    feature = "rustls_webpki",
    not(any(feature = "native_tls", feature = "rustls"))
))]
fn new_client() -> Client<hyper_rustls::HttpsConnector<hyper::client::HttpConnector>> {
    Client::builder().build(hyper_rustls::HttpsConnector::with_webpki_roots())
}

#[cfg(not(any(feature = "native_tls", feature = "rustls", feature = "rustls_webpki")))]
fn new_client() -> Client<hyper::client::HttpConnector> {
    Client::new()
}

// n.b. this function is re-exported in the `raw` module - these docs are public!
/// Starts the given request on a new hyper client and returns the pending response.
///
/// No status inspection or timeout is applied; use `response_raw_bytes` for that.
pub fn get_response(request: Request<Body>) -> ResponseFuture {
    new_client().request(request)
}

// n.b. this function is re-exported in the `raw` module - these docs are public!
/// Sends the given request and reads its whole body, failing with `Error::Timeout` if that takes
/// longer than `timeout`.
///
/// The status code is *not* inspected here: Facebook and MySpace report failures differently,
/// so each client checks the returned `Parts` itself.
pub async fn raw_request(request: Request<Body>, timeout: Duration) -> error::Result<(Parts, Vec<u8>)> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    tracing::debug!(%method, host = ?uri.host(), path = uri.path(), "sending request");

    let call = async {
        let resp = get_response(request).await?;
        let (parts, body) = resp.into_parts();
        let body = hyper::body::to_bytes(body).await?.to_vec();
        Ok::<_, Error>((parts, body))
    };

    match tokio::time::timeout(timeout, call).await {
        Ok(Ok((parts, body))) => {
            tracing::debug!(status = parts.status.as_u16(), len = body.len(), "received response");
            Ok((parts, body))
        }
        Ok(Err(err)) => {
            tracing::debug!(%method, path = uri.path(), error = %err, "request failed");
            Err(err)
        }
        Err(_) => {
            tracing::debug!(%method, path = uri.path(), ?timeout, "request timed out");
            Err(Error::Timeout)
        }
    }
}
