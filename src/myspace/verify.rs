// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Verification of the OAuth signatures MySpace puts on requests it sends to an app.

use chrono::{DateTime, Duration, Utc};
use subtle::ConstantTimeEq;

use crate::common::*;
use crate::error::{self, OAuthError};
use crate::links::oauth;
use crate::secret::Secret;

use super::raw;

/// Checks signed requests that MySpace sends to an app's canvas and callback URLs.
///
/// MySpace signs these with the app's own consumer key and secret and an empty token, the same
/// way the app signs its calls to MySpace. A request is accepted if its signature matches and its
/// timestamp is within the freshness window of the local clock, in either direction.
#[derive(Clone, Debug)]
pub struct Verifier {
    consumer_key: String,
    consumer_secret: Secret,
    freshness_window: Duration,
}

impl Verifier {
    /// Creates a verifier for the given consumer credentials, with the default 15-minute
    /// freshness window.
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<Secret>) -> Verifier {
        Verifier {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            freshness_window: Duration::seconds(oauth::FRESHNESS_WINDOW_SECS),
        }
    }

    /// Sets how far a request timestamp may stray from the local clock.
    pub fn with_freshness_window(mut self, window: Duration) -> Verifier {
        self.freshness_window = window;
        self
    }

    /// Verifies a request against the current time.
    ///
    /// `url` is the full URL the request was made to; its query string is ignored, so the query
    /// parameters must be included in `params` along with any form parameters.
    ///
    /// Returns `Ok(false)` if the request carries no `oauth_signature` at all, `Ok(true)` if it
    /// is signed and valid, and an `OAuthError` if it is signed but fails verification.
    pub fn verify(&self, method: &str, url: &str, params: &ParamList) -> error::Result<bool> {
        self.verify_at(method, url, params, Utc::now())
    }

    /// Verifies a request as if the local clock read `now`.
    pub fn verify_at(
        &self,
        method: &str,
        url: &str,
        params: &ParamList,
        now: DateTime<Utc>,
    ) -> error::Result<bool> {
        let given = match params.get_str(oauth::SIGNATURE) {
            Some(sig) => sig,
            None => return Ok(false),
        };

        let timestamp = params
            .get_str(oauth::TIMESTAMP)
            .ok_or(OAuthError::MissingParameter(oauth::TIMESTAMP))?;
        params
            .get_str(oauth::NONCE)
            .ok_or(OAuthError::MissingParameter(oauth::NONCE))?;

        self.check_timestamp(timestamp, now)?;

        if let Some(key) = params.get_str(oauth::CONSUMER_KEY) {
            if key != self.consumer_key {
                tracing::warn!(consumer_key = key, "signed request for another consumer");
                return Err(OAuthError::InvalidSignature.into());
            }
        }

        let expected = raw::signature(method, url, params, &self.consumer_secret)?;
        if bool::from(expected.as_bytes().ct_eq(given.as_bytes())) {
            Ok(true)
        } else {
            tracing::warn!(%method, url = %url, "oauth_signature mismatch");
            Err(OAuthError::InvalidSignature.into())
        }
    }

    fn check_timestamp(&self, timestamp: &str, now: DateTime<Utc>) -> Result<(), OAuthError> {
        let given: i64 = timestamp
            .trim()
            .parse()
            .map_err(|_| OAuthError::InvalidTimestamp(timestamp.to_string()))?;
        let now = now.timestamp();
        let threshold = self.freshness_window.num_seconds();

        let lapsed = now.saturating_sub(given);
        if lapsed > threshold || lapsed < -threshold {
            tracing::warn!(given, now, threshold, "oauth_timestamp outside freshness window");
            return Err(OAuthError::ExpiredTimestamp {
                given,
                now,
                threshold,
            });
        }

        Ok(())
    }
}

/// Verifies a signed request from MySpace with a one-off `Verifier`.
///
/// See [`Verifier::verify`] for the meaning of the result.
///
/// [`Verifier::verify`]: struct.Verifier.html#method.verify
pub fn verify_request(
    consumer_key: &str,
    consumer_secret: &Secret,
    method: &str,
    url: &str,
    params: &ParamList,
) -> error::Result<bool> {
    Verifier::new(consumer_key, consumer_secret.clone()).verify(method, url, params)
}
