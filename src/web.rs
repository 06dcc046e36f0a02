// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Helpers for serving a MySpace app's pages.
//!
//! MySpace loads an app's canvas pages with OpenSocial parameters in the query string, signed
//! with the app's consumer credentials. [`MySpaceMiddleware`] checks that signature on an inbound
//! hyper request and produces a [`MySpaceContext`]: a `Consumer` set up to act for the viewing
//! user, the owner and viewer ids, and whether the request was signed. A request that is signed
//! but fails verification never reaches your handler; it gets a `403` instead.
//!
//! ```rust,no_run
//! use hyper::{Body, Request, Response};
//! use social_rest::web::{self, MySpaceContext, MySpaceMiddleware};
//!
//! async fn canvas(middleware: &MySpaceMiddleware, req: Request<Body>) -> Response<Body> {
//!     let req = match middleware.process_request(req).await {
//!         Ok(req) => req,
//!         Err(rejection) => return rejection,
//!     };
//!     let ctx = match req.extensions().get::<MySpaceContext>() {
//!         Some(ctx) => ctx,
//!         None => return Response::new(Body::empty()),
//!     };
//!
//!     web::signed_required(ctx, || async {
//!         web::has_app(ctx, "http://profile.myspace.com/my_app", || async {
//!             let name = match ctx.user().await {
//!                 Ok(Some(user)) => user["name"].as_str().unwrap_or_default().to_string(),
//!                 _ => String::new(),
//!             };
//!             Response::new(Body::from(format!("Hello, {}!", name)))
//!         })
//!         .await
//!     })
//!     .await
//! }
//! ```
//!
//! [`MySpaceMiddleware`]: struct.MySpaceMiddleware.html
//! [`MySpaceContext`]: struct.MySpaceContext.html

use std::future::Future;

use hyper::header::{HeaderValue, CONTENT_TYPE, HOST};
use hyper::http::request::Parts;
use hyper::{Body, Method, Request, Response, StatusCode};
use serde_json::Value;
use tokio::sync::OnceCell;

use crate::common::*;
use crate::config::{ConfigReadError, MySpaceSection};
use crate::error::{self, Error};
use crate::links;
use crate::myspace::{Consumer, Verifier};
use crate::secret::Secret;

/// Verifies inbound requests from MySpace and builds the context handlers work with.
#[derive(Clone, Debug)]
pub struct MySpaceMiddleware {
    consumer: Consumer,
    verifier: Verifier,
    app_profile: Option<String>,
}

impl MySpaceMiddleware {
    /// Creates a middleware for the app with the given "Application Uri" and "Security Key".
    pub fn new(key: impl Into<String>, secret: impl Into<Secret>) -> MySpaceMiddleware {
        let key = key.into();
        let secret = secret.into();
        MySpaceMiddleware {
            verifier: Verifier::new(key.clone(), secret.clone()),
            consumer: Consumer::new(key, secret),
            app_profile: None,
        }
    }

    /// Builds a middleware from the `myspace` section of a configuration file.
    pub fn from_config(config: &MySpaceSection) -> Result<MySpaceMiddleware, ConfigReadError> {
        let mut verifier = Verifier::new(config.key.clone(), config.secret.clone());
        if let Some(secs) = config.freshness_window_secs {
            let window = chrono::Duration::try_seconds(secs)
                .filter(|window| *window > chrono::Duration::zero())
                .ok_or(ConfigReadError::InvalidFreshnessWindow(secs))?;
            verifier = verifier.with_freshness_window(window);
        }

        Ok(MySpaceMiddleware {
            consumer: Consumer::from_config(config)?,
            verifier,
            app_profile: config.app_profile.clone(),
        })
    }

    /// Sets the app profile URL handlers can pass to [`has_app`].
    ///
    /// [`has_app`]: fn.has_app.html
    pub fn with_app_profile(self, app_profile: impl Into<String>) -> MySpaceMiddleware {
        MySpaceMiddleware {
            app_profile: Some(app_profile.into()),
            ..self
        }
    }

    /// The configured app profile URL, if any.
    pub fn app_profile(&self) -> Option<&str> {
        self.app_profile.as_deref()
    }

    /// Uses the given client as the base for each context's `Consumer`.
    pub fn with_consumer(self, consumer: Consumer) -> MySpaceMiddleware {
        MySpaceMiddleware { consumer, ..self }
    }

    /// Replaces the verifier used to check inbound signatures.
    pub fn with_verifier(self, verifier: Verifier) -> MySpaceMiddleware {
        MySpaceMiddleware { verifier, ..self }
    }

    /// Reads the body of `req`, verifies it, and puts the resulting `MySpaceContext` in its
    /// extensions.
    ///
    /// On success the request is handed back with its body intact. On failure the returned
    /// response should be sent as-is.
    pub async fn process_request(&self, req: Request<Body>) -> Result<Request<Body>, Response<Body>> {
        let (mut parts, body) = req.into_parts();
        let body_bytes = hyper::body::to_bytes(body)
            .await
            .map_err(|_| text_response(StatusCode::BAD_REQUEST, "Unable to read request body"))?;

        let context = self.context(&parts, &body_bytes)?;
        parts.extensions.insert(context);

        Ok(Request::from_parts(parts, Body::from(body_bytes)))
    }

    /// Verifies a request from its head and body, and builds its context.
    ///
    /// The verified parameters are those of the query string, plus those of the body for a
    /// form-encoded `POST`. The owner and viewer ids are read from the query string only.
    pub fn context(&self, parts: &Parts, body: &[u8]) -> Result<MySpaceContext, Response<Body>> {
        let query = ParamList::from_urlencoded(parts.uri.query().unwrap_or_default());

        let mut params = query.clone();
        if parts.method == Method::POST && is_form(parts) {
            params.extend_urlencoded(body);
        }

        let url = request_url(parts)
            .ok_or_else(|| text_response(StatusCode::BAD_REQUEST, "Missing Host header"))?;

        let signed = match self.verifier.verify(parts.method.as_str(), &url, &params) {
            Ok(signed) => signed,
            Err(Error::OAuth(err)) => {
                return Err(text_response(
                    StatusCode::FORBIDDEN,
                    format!("OAuthError: {}", err),
                ))
            }
            Err(err) => {
                tracing::debug!(error = %err, "unable to verify request");
                return Err(text_response(StatusCode::BAD_REQUEST, err.to_string()));
            }
        };

        let owner_id = query.get_str(links::myspace::OWNER_ID).and_then(parse_id);
        let viewer_id = query.get_str(links::myspace::VIEWER_ID).and_then(parse_id);
        tracing::debug!(signed, ?owner_id, ?viewer_id, "built MySpace context");

        Ok(MySpaceContext {
            consumer: self.consumer.clone().with_viewer(viewer_id),
            owner_id,
            viewer_id,
            signed,
            user: OnceCell::new(),
        })
    }
}

/// What a handler knows about the MySpace request it is serving.
#[derive(Debug)]
pub struct MySpaceContext {
    consumer: Consumer,
    owner_id: Option<u64>,
    viewer_id: Option<u64>,
    signed: bool,
    user: OnceCell<Option<Value>>,
}

impl MySpaceContext {
    /// A client acting for the viewer of this request.
    pub fn consumer(&self) -> &Consumer {
        &self.consumer
    }

    /// The id of the user whose page the app is on.
    pub fn owner_id(&self) -> Option<u64> {
        self.owner_id
    }

    /// The id of the user viewing the page, if they are not anonymous.
    pub fn viewer_id(&self) -> Option<u64> {
        self.viewer_id
    }

    /// Whether the request carried a valid signature.
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Looks up the viewing user.
    ///
    /// The lookup is made once per context. A failed lookup is not remembered, so calling this
    /// again retries it.
    pub async fn user(&self) -> error::Result<Option<&Value>> {
        let user = self
            .user
            .get_or_try_init(|| self.consumer.current_user())
            .await?;
        Ok(user.as_ref())
    }
}

/// Runs `view` only if the request was signed. Otherwise responds `403 Signed request required.`
pub async fn signed_required<F, Fut>(ctx: &MySpaceContext, view: F) -> Response<Body>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Response<Body>>,
{
    if ctx.is_signed() {
        view().await
    } else {
        text_response(StatusCode::FORBIDDEN, "Signed request required.")
    }
}

/// Runs `view` only if the viewer has the app installed.
///
/// This looks the viewer up. If MySpace refuses with a `401`, the viewer hasn't added the app,
/// and the response is a page that sends the browser's top frame to `app_profile` instead. Any
/// other failure is a `500` naming the status and reason.
pub async fn has_app<F, Fut>(ctx: &MySpaceContext, app_profile: &str, view: F) -> Response<Body>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Response<Body>>,
{
    match ctx.user().await {
        Ok(_) => view().await,
        Err(Error::MySpace(err)) if err.status == StatusCode::UNAUTHORIZED => redirect_page(app_profile),
        Err(Error::MySpace(err)) => text_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{}: {}", err.status.as_u16(), err.reason),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "unable to look up MySpace viewer");
            text_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn is_form(parts: &Parts) -> bool {
    parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .map_or(false, |ct| {
            ct.starts_with(mime::APPLICATION_WWW_FORM_URLENCODED.as_ref())
        })
}

/// Rebuilds the URL the request was made to, from its `Host` header and path.
fn request_url(parts: &Parts) -> Option<String> {
    let host = match parts.headers.get(HOST) {
        Some(host) => host.to_str().ok()?.to_string(),
        None => parts.uri.authority()?.to_string(),
    };
    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    Some(format!("http://{}{}", host, path))
}

/// Anonymous viewers are sent as `-1`, which never parses.
fn parse_id(id: &str) -> Option<u64> {
    id.parse().ok()
}

fn text_response(status: StatusCode, text: impl Into<String>) -> Response<Body> {
    let mut resp = Response::new(Body::from(text.into()));
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    resp
}

fn redirect_page(url: &str) -> Response<Body> {
    // `</` would end the script element early.
    let script_url = serde_json::to_string(url)
        .unwrap_or_default()
        .replace("</", "<\\/");
    let page = format!(
        r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.01 Transitional//EN"
  "http://www.w3.org/TR/html4/loose.dtd">
<html>
  <head>
    <script type="text/javascript">
      window.parent.location = {script_url};
    </script>
  </head>
  <body>
    Attempting to redirect you to:
    <a target="_parent" href="{url}">Application Profile</a>
    <p/>
    If you are not redirected momentarily please click the link above to continue.
  </body>
</html>
"#,
        script_url = script_url,
        url = escape_html(url)
    );

    let mut resp = Response::new(Body::from(page));
    resp.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    resp
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
