// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Client for the MySpace apps REST API, signed with OAuth 1.0.
//!
//! Every call made through this module goes out as a [`Consumer`], which holds the "Application
//! Uri" and "Security Key" MySpace issues to an app (the OAuth consumer key and secret). There is
//! no user token involved: requests are signed with the consumer credentials alone and an empty
//! token, which is how MySpace expects apps to call it.
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() -> social_rest::error::Result<()> {
//! use social_rest::myspace::{Consumer, FriendsQuery};
//!
//! let consumer = Consumer::new("http://www.myspace.com/my_app", "security-key");
//!
//! let user = consumer.user(28568917).await?;
//! let friends = consumer
//!     .friends(28568917, FriendsQuery { page_size: Some(50), ..Default::default() })
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! All the resource methods hand back the parsed JSON response as a `serde_json::Value`, or
//! `None` if the service answered with an empty body. A non-success status is turned into
//! [`Error::MySpace`], which carries the status code and the most descriptive reason MySpace gave.
//!
//! ## Types
//!
//! * [`Consumer`]: the client itself. Cheap to clone.
//! * [`FriendsQuery`]: paging and filtering options for `Consumer::friends`.
//! * [`AppData`] and [`FriendsAppData`]: lazily loaded, explicitly saved views of an app's
//!   key-value storage.
//! * [`Verifier`]: checks the signature on requests MySpace sends to your app.
//!
//! [`Consumer`]: struct.Consumer.html
//! [`FriendsQuery`]: struct.FriendsQuery.html
//! [`AppData`]: struct.AppData.html
//! [`FriendsAppData`]: struct.FriendsAppData.html
//! [`Verifier`]: struct.Verifier.html
//! [`Error::MySpace`]: ../error/enum.Error.html#variant.MySpace

use std::fmt;
use std::time::Duration;

use hyper::{Method, StatusCode};
use regex::Regex;

use crate::common::*;
use crate::config::{ConfigReadError, MySpaceSection};
use crate::error::{self, MySpaceError};
use crate::links;
use crate::secret::Secret;

mod appdata;
mod fun;
mod raw;
mod verify;

pub use self::appdata::{AppData, FriendsAppData};
pub use self::fun::FriendsQuery;
pub use self::raw::{normalize_url, signature, signed_request};
pub use self::verify::{verify_request, Verifier};

/// A client for the MySpace REST services.
///
/// Holds the consumer credentials and the location of the API. The viewer id, when set, is the
/// user that `current_user` resolves to; the web layer fills it in from the
/// `opensocial_viewer_id` of an inbound request.
#[derive(Clone)]
pub struct Consumer {
    key: String,
    secret: Secret,
    viewer_id: Option<u64>,
    server: String,
    port: u16,
    version: String,
    timeout: Duration,
}

impl fmt::Debug for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("key", &self.key)
            .field("viewer_id", &self.viewer_id)
            .field("server", &self.server)
            .field("port", &self.port)
            .field("version", &self.version)
            .finish()
    }
}

impl Consumer {
    /// Creates a client with the given "Application Uri" (consumer key) and "Security Key"
    /// (consumer secret), pointed at `api.myspace.com`.
    pub fn new(key: impl Into<String>, secret: impl Into<Secret>) -> Consumer {
        Consumer {
            key: key.into(),
            secret: secret.into(),
            viewer_id: None,
            server: links::myspace::SERVER.to_string(),
            port: links::myspace::PORT,
            version: links::myspace::VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Builds a client from the `myspace` section of a configuration file.
    pub fn from_config(config: &MySpaceSection) -> Result<Consumer, ConfigReadError> {
        let mut consumer = Consumer::new(config.key.clone(), config.secret.clone());
        if let Some(server) = &config.server {
            if server.is_empty() || server.contains('/') {
                return Err(ConfigReadError::InvalidHost(server.clone()));
            }
            consumer.server = server.clone();
        }
        if let Some(port) = config.port {
            consumer.port = port;
        }
        if let Some(version) = &config.version {
            consumer.version = version.clone();
        }
        if let Some(secs) = config.timeout_secs {
            consumer.timeout = Duration::from_secs(secs);
        }
        Ok(consumer)
    }

    /// Points this client at a different host and port.
    pub fn with_server(mut self, server: impl Into<String>, port: u16) -> Consumer {
        self.server = server.into();
        self.port = port;
        self
    }

    /// Sets the API version segment of every request path.
    pub fn with_version(mut self, version: impl Into<String>) -> Consumer {
        self.version = version.into();
        self
    }

    /// Sets the user that `current_user` looks up.
    pub fn with_viewer(mut self, viewer_id: Option<u64>) -> Consumer {
        self.viewer_id = viewer_id;
        self
    }

    /// Sets how long a single call may take before failing with `Error::Timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Consumer {
        self.timeout = timeout;
        self
    }

    /// The consumer key ("Application Uri") this client signs with.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The consumer secret ("Security Key") this client signs with.
    pub fn secret(&self) -> &Secret {
        &self.secret
    }

    /// The viewer this client acts for, if any.
    pub fn viewer_id(&self) -> Option<u64> {
        self.viewer_id
    }

    /// Returns the full URL of the given resource path.
    pub fn resource_url(&self, path: &str) -> String {
        format!(
            "http://{}:{}/{}/{}.json",
            self.server, self.port, self.version, path
        )
    }

    /// Signs and sends a request for the given resource path, returning the parsed JSON body.
    ///
    /// `path` is relative to the API version, without the `.json` suffix, e.g.
    /// `users/28568917/friends`. For `GET` and `DELETE` the signed parameters are sent in the
    /// query string; for other methods they are sent as the request body.
    ///
    /// An empty response body gives `Ok(None)`. Any status other than 2xx fails with
    /// `Error::MySpace`.
    pub async fn request(
        &self,
        path: &str,
        params: Option<&ParamList>,
        method: Method,
    ) -> error::Result<Option<serde_json::Value>> {
        let url = self.resource_url(path);
        let request = raw::signed_request(method, &url, params, &self.key, &self.secret)?;
        let (parts, body) = raw_request(request, self.timeout).await?;

        if !parts.status.is_success() {
            let err = service_error(parts.status, url, &body);
            tracing::debug!(status = err.status.as_u16(), reason = %err.reason, "MySpace call failed");
            return Err(err.into());
        }

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        Ok(Some(serde_json::from_slice(&body)?))
    }

    pub(crate) async fn get(&self, path: &str) -> error::Result<Option<serde_json::Value>> {
        self.request(path, None, Method::GET).await
    }
}

/// Assembles the error for a non-success response.
///
/// MySpace sometimes answers with an XML error document carrying a more descriptive message than
/// the status line. If so, that message becomes the reason. A body that can't be read that way is
/// left alone.
fn service_error(status: StatusCode, url: String, body: &[u8]) -> MySpaceError {
    lazy_static::lazy_static! {
        static ref XML_ERROR: Regex = Regex::new(r"^<error\s+xmlns=").unwrap();
        static ref XML_MESSAGE: Regex = Regex::new(r"(?s)<message>(.*?)</message>").unwrap();
    }

    let body = String::from_utf8_lossy(body).into_owned();
    let mut reason = status.canonical_reason().unwrap_or_default().to_string();

    if XML_ERROR.is_match(&body) {
        let message = XML_MESSAGE
            .captures(&body)
            .and_then(|caps| caps.get(1))
            .map(|m| unescape_xml(m.as_str().trim()))
            .filter(|m| !m.is_empty());
        if let Some(message) = message {
            reason = message;
        }
    }

    MySpaceError {
        status,
        reason,
        url,
        body,
    }
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
