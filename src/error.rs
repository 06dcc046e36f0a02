// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A composite error type for errors that can occur while interacting with either platform.
//!
//! Any action that crosses the network to call a platform API has many points where it can go
//! wrong. This module collects them into one [`Error`] enum so callers only have one type to
//! match against. The variants break down like this:
//!
//! * The remote service answered, but with a failure: [`FacebookError`] for Facebook's
//!   error-in-a-200 replies, [`MySpaceError`] for MySpace's non-2xx responses, and `BadStatus`
//!   for any other unexpected HTTP status.
//! * The request never got a usable answer: `NetError` and `Timeout`.
//! * A signed inbound request didn't check out: [`OAuthError`].
//! * Something local went wrong assembling or decoding a request: `DeserializeError`,
//!   `UnsupportedValue`, `BadUrl`, `RequestError`.
//!
//! None of the functions in this crate retry on their own. Every failure is handed straight back
//! to the caller.
//!
//! [`Error`]: enum.Error.html
//! [`FacebookError`]: struct.FacebookError.html
//! [`MySpaceError`]: struct.MySpaceError.html
//! [`OAuthError`]: enum.OAuthError.html

use std::fmt;

use hyper::StatusCode;

/// Convenient alias to a Result containing a local Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// An error code and message returned by a Facebook REST call.
///
/// Facebook reports method failures with an HTTP 200 whose payload is an object carrying
/// `error_code` and `error_msg`. The complete list of codes is in [Facebook's API
/// documentation][fb-err].
///
/// [fb-err]: http://wiki.developers.facebook.com/index.php/Error_codes
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct FacebookError {
    /// The numeric error code.
    #[serde(rename = "error_code")]
    pub code: i64,
    /// The human-readable message.
    #[serde(rename = "error_msg")]
    pub message: String,
}

impl fmt::Display for FacebookError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Facebook Error {}: {}", self.code, self.message)
    }
}

/// A non-success response from the MySpace REST service.
#[derive(Debug, Clone)]
pub struct MySpaceError {
    /// The HTTP status code of the response.
    pub status: StatusCode,
    /// The reason for the failure.
    ///
    /// This starts out as the canonical reason phrase for `status`. When the body is an XML error
    /// document, the text of its `<message>` element is used instead.
    pub reason: String,
    /// The URL that was requested, without the query string.
    pub url: String,
    /// The raw body of the response.
    pub body: String,
}

impl fmt::Display for MySpaceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {} - {}", self.status.as_u16(), self.reason, self.url)
    }
}

/// Reasons an inbound signed request can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OAuthError {
    /// The request carried a signature that does not match its parameters.
    #[error("Invalid signature")]
    InvalidSignature,
    /// The request's timestamp is outside the freshness window.
    #[error(
        "Expired timestamp: given {given} and now {now} has a greater difference than threshold {threshold}"
    )]
    ExpiredTimestamp {
        /// The timestamp carried by the request.
        given: i64,
        /// The local clock at verification time.
        now: i64,
        /// The freshness window, in seconds.
        threshold: i64,
    },
    /// The request's timestamp could not be parsed as unix seconds.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// A signed request was missing a required OAuth parameter.
    #[error("Parameter not found: {0}")]
    MissingParameter(&'static str),
}

/// Represents the kinds of errors that can occur when calling either platform.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A Facebook method returned an error payload. The enclosed value has the code and message.
    #[error("{0}")]
    FacebookError(FacebookError),
    /// MySpace returned a non-success status. The enclosed value carries status, reason, URL and
    /// body.
    #[error("{0}")]
    MySpace(MySpaceError),
    /// An inbound request was signed, but failed verification.
    #[error("OAuth error: {0}")]
    OAuth(#[from] OAuthError),
    /// The server returned an unexpected HTTP status.
    #[error("Error status received: {0}")]
    BadStatus(StatusCode),
    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,
    /// The network connection failed. The enclosed error was returned by hyper.
    #[error("Network error: {0}")]
    NetError(#[from] hyper::Error),
    /// The request could not be assembled.
    #[error("Invalid request: {0}")]
    RequestError(#[from] hyper::http::Error),
    /// A URL could not be parsed.
    #[error("Invalid URL: {0}")]
    BadUrl(#[from] url::ParseError),
    /// A parameter value has no canonical string form. The enclosed string describes it.
    #[error("Unsupported parameter value: {0}")]
    UnsupportedValue(String),
    /// A response body could not be decoded as JSON.
    #[error("JSON deserialize error: {0}")]
    DeserializeError(#[from] serde_json::Error),
}

impl From<FacebookError> for Error {
    fn from(err: FacebookError) -> Error {
        Error::FacebookError(err)
    }
}

impl From<MySpaceError> for Error {
    fn from(err: MySpaceError) -> Error {
        Error::MySpace(err)
    }
}

impl Error {
    /// Returns the MySpace service error inside this error, if that is what it holds.
    pub fn as_myspace(&self) -> Option<&MySpaceError> {
        match self {
            Error::MySpace(err) => Some(err),
            _ => None,
        }
    }
}
