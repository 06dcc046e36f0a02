// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Calls to Facebook's legacy REST server, and validation of the parameters it signs.
//!
//! Every Facebook REST method is reached the same way: a form POST to `restserver.php` with the
//! method name, your API key, a protocol version, a response format and a call id, signed with
//! your application secret. A [`FacebookClient`] fills in all of those for you, so a call only
//! needs the method name and its own arguments:
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() {
//! use social_rest::facebook::{Args, FacebookClient};
//!
//! let client = FacebookClient::new("my-api-key", "my-secret");
//! let args = Args::new()
//!     .add_param("session_key", "1a2b3c4d5e")
//!     .add_param("uids", 609143784u64)
//!     .add_param("fields", "name,pic_square");
//! let info = client.call("facebook.users.getInfo", args).await.unwrap();
//! # }
//! ```
//!
//! Going the other way, Facebook signs the `fb_sig_*` parameters it sends to canvas pages and
//! callbacks. Hand those to [`validate`] along with your secret to get back the signed values, or
//! nothing at all if they were tampered with.
//!
//! ## Parameter values
//!
//! The signature covers the string form of every parameter, so the string form has to be fixed.
//! Values are one of the [`ParamValue`] variants, each with one canonical rendering; see its
//! documentation for the exact rules. A one-element list renders the same as its element, and
//! any other list is rejected with `Error::UnsupportedValue` instead of being guessed at.
//!
//! ## Call ids
//!
//! Facebook asks for a strictly increasing `call_id` on session-keyed calls. Each
//! `FacebookClient` owns an atomic sequence for this, shared by its clones. Use
//! [`Args::call_id`] to send a specific value or none at all.
//!
//! [`FacebookClient`]: struct.FacebookClient.html
//! [`validate`]: fn.validate.html
//! [`ParamValue`]: enum.ParamValue.html
//! [`Args::call_id`]: struct.Args.html#method.call_id

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper::header::CONTENT_TYPE;
use hyper::{Body, Method, Request};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::common::*;
use crate::config::{ConfigReadError, FacebookSection};
use crate::error::{self, Error, FacebookError};
use crate::links;
use crate::secret::Secret;

mod fun;
mod raw;

pub use self::fun::Session;
pub use self::raw::{signature, validate, InboundParams};

/// A single parameter value for a Facebook call.
///
/// Each variant has exactly one string form, which is both what gets sent and what gets signed:
///
/// | Variant | Rendering |
/// |---|---|
/// | `Str(s)` | `s`, unchanged |
/// | `Int(i)`, `UInt(u)` | decimal digits, with a leading `-` for negatives |
/// | `Float(f)` | Rust's `Display` for `f64`, e.g. `1.5`, or `2` for `2.0` |
/// | `Bool(b)` | `true` or `false` |
/// | `Seq(v)` | the rendering of its single element; other lengths are an error |
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// A text value.
    Str(String),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer, for ids beyond `i64`.
    UInt(u64),
    /// A floating-point number.
    Float(f64),
    /// A boolean flag.
    Bool(bool),
    /// A list, which must hold exactly one value.
    Seq(Vec<ParamValue>),
}

impl ParamValue {
    /// Returns the canonical string form of this value.
    pub fn canonical(&self) -> error::Result<Cow<'_, str>> {
        Ok(match self {
            ParamValue::Str(s) => Cow::Borrowed(s.as_str()),
            ParamValue::Int(i) => Cow::Owned(i.to_string()),
            ParamValue::UInt(u) => Cow::Owned(u.to_string()),
            ParamValue::Float(f) => Cow::Owned(f.to_string()),
            ParamValue::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            ParamValue::Seq(items) => match items.as_slice() {
                [only] => only.canonical()?,
                _ => {
                    return Err(Error::UnsupportedValue(format!(
                        "list of {} values; only single-element lists can be signed",
                        items.len()
                    )))
                }
            },
        })
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> ParamValue {
        ParamValue::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> ParamValue {
        ParamValue::Str(s)
    }
}

impl From<i32> for ParamValue {
    fn from(i: i32) -> ParamValue {
        ParamValue::Int(i as i64)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> ParamValue {
        ParamValue::Int(i)
    }
}

impl From<u32> for ParamValue {
    fn from(u: u32) -> ParamValue {
        ParamValue::UInt(u as u64)
    }
}

impl From<u64> for ParamValue {
    fn from(u: u64) -> ParamValue {
        ParamValue::UInt(u)
    }
}

impl From<f64> for ParamValue {
    fn from(f: f64) -> ParamValue {
        ParamValue::Float(f)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> ParamValue {
        ParamValue::Bool(b)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(items: Vec<T>) -> ParamValue {
        ParamValue::Seq(items.into_iter().map(Into::into).collect())
    }
}

/// How the `call_id` parameter of a call is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallId {
    /// Take the next value from the client's sequence.
    Auto,
    /// Send this value.
    Explicit(u64),
    /// Don't send a `call_id`.
    Omit,
}

impl Default for CallId {
    fn default() -> CallId {
        CallId::Auto
    }
}

/// The arguments to a Facebook REST call.
///
/// This wraps a `BTreeMap<Cow<'static, str>, ParamValue>` and follows the same builder pattern
/// as `ParamList`. The keys `api_key`, `format`, `method` and `v` are filled in by the client if
/// they're not given here. `sig` and `call_id` are always set by the client; use
/// [`call_id`](#method.call_id) to control the latter.
///
/// Giving a `format` or `callback` argument makes the call a "custom format" call, which returns
/// the raw response bytes instead of parsed JSON.
#[derive(Debug, Clone, Default)]
pub struct Args {
    params: BTreeMap<CowStr, ParamValue>,
    call_id: CallId,
}

impl Args {
    /// Creates an empty argument list that will use an automatic call id.
    pub fn new() -> Args {
        Args::default()
    }

    /// Adds the given key/value argument.
    pub fn add_param(mut self, key: impl Into<CowStr>, value: impl Into<ParamValue>) -> Args {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Adds the given key/value argument only if the value is `Some`.
    pub fn add_opt_param(self, key: impl Into<CowStr>, value: Option<impl Into<ParamValue>>) -> Args {
        match value {
            Some(val) => self.add_param(key, val),
            None => self,
        }
    }

    /// Sets how the `call_id` parameter is chosen for this call.
    pub fn call_id(self, call_id: CallId) -> Args {
        Args { call_id, ..self }
    }

    /// Returns whether this call asks for a custom response format.
    pub fn is_custom_format(&self) -> bool {
        self.params.contains_key("format") || self.params.contains_key("callback")
    }
}

impl std::ops::Deref for Args {
    type Target = BTreeMap<CowStr, ParamValue>;

    fn deref(&self) -> &Self::Target {
        &self.params
    }
}

impl std::ops::DerefMut for Args {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.params
    }
}

/// The result of a successful Facebook call.
#[derive(Debug, Clone, PartialEq)]
pub enum FacebookResponse {
    /// The decoded JSON reply.
    Data(serde_json::Value),
    /// The unprocessed response body of a custom-format call.
    Raw(Vec<u8>),
}

impl FacebookResponse {
    /// Returns the decoded JSON reply, or `None` for a raw reply.
    pub fn into_data(self) -> Option<serde_json::Value> {
        match self {
            FacebookResponse::Data(v) => Some(v),
            FacebookResponse::Raw(_) => None,
        }
    }

    /// Returns the response body of a raw reply, or `None` for decoded JSON.
    pub fn into_raw(self) -> Option<Vec<u8>> {
        match self {
            FacebookResponse::Raw(b) => Some(b),
            FacebookResponse::Data(_) => None,
        }
    }
}

/// A decoded JSON reply: either Facebook's error object, or anything else.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Reply {
    Failure(FacebookError),
    Success(serde_json::Value),
}

/// A client for Facebook's REST server, holding your API key and secret.
///
/// Cloning a `FacebookClient` is cheap, and the clones share one call-id sequence.
#[derive(Clone)]
pub struct FacebookClient {
    api_key: String,
    secret: Secret,
    endpoint: String,
    timeout: Duration,
    call_counter: Arc<AtomicU64>,
}

impl fmt::Debug for FacebookClient {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FacebookClient")
            .field("api_key", &self.api_key)
            .field("secret", &self.secret)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl FacebookClient {
    /// Creates a client for the given API key and secret, talking to the public REST server.
    pub fn new(api_key: impl Into<String>, secret: impl Into<Secret>) -> FacebookClient {
        FacebookClient {
            api_key: api_key.into(),
            secret: secret.into(),
            endpoint: links::facebook::REST_SERVER.to_string(),
            timeout: DEFAULT_TIMEOUT,
            call_counter: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Builds a client from the `facebook` section of a configuration file.
    pub fn from_config(config: &FacebookSection) -> Result<FacebookClient, ConfigReadError> {
        let mut client = FacebookClient::new(config.api_key.clone(), config.secret.clone());
        if let Some(endpoint) = &config.endpoint {
            url::Url::parse(endpoint)?;
            client.endpoint = endpoint.clone();
        }
        if let Some(secs) = config.timeout_secs {
            client.timeout = Duration::from_secs(secs);
        }
        Ok(client)
    }

    /// Points this client at a different REST server URL.
    pub fn with_endpoint(self, endpoint: impl Into<String>) -> FacebookClient {
        FacebookClient {
            endpoint: endpoint.into(),
            ..self
        }
    }

    /// Sets how long a single call may take.
    pub fn with_timeout(self, timeout: Duration) -> FacebookClient {
        FacebookClient { timeout, ..self }
    }

    /// Returns the API key this client signs with.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns the secret this client signs with.
    pub fn secret(&self) -> &Secret {
        &self.secret
    }

    fn next_call_id(&self) -> u64 {
        self.call_counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Fills in the default arguments of a call to `method`, then signs it.
    ///
    /// The returned map holds the canonical string form of every argument plus `sig`, exactly as
    /// it will be sent.
    pub fn sign_call(&self, method: &str, args: &Args) -> error::Result<BTreeMap<String, String>> {
        let mut params = BTreeMap::new();
        for (key, value) in args.iter() {
            params.insert(key.to_string(), value.canonical()?.into_owned());
        }
        params.remove("sig");
        params.remove("call_id");

        match args.call_id {
            CallId::Auto => {
                params.insert("call_id".to_string(), self.next_call_id().to_string());
            }
            CallId::Explicit(id) => {
                params.insert("call_id".to_string(), id.to_string());
            }
            CallId::Omit => (),
        }

        params
            .entry("format".to_string())
            .or_insert_with(|| links::facebook::DEFAULT_FORMAT.to_string());
        params
            .entry("v".to_string())
            .or_insert_with(|| links::facebook::API_VERSION.to_string());
        params
            .entry("api_key".to_string())
            .or_insert_with(|| self.api_key.clone());
        params
            .entry("method".to_string())
            .or_insert_with(|| method.to_string());

        let sig = signature(&params, &self.secret);
        params.insert("sig".to_string(), sig);

        Ok(params)
    }

    /// Calls the given REST method.
    ///
    /// If `args` asks for a custom format (see [`Args`]), the response body comes back as
    /// `FacebookResponse::Raw` whatever it contains. Otherwise the body is decoded as JSON, and an
    /// object with `error_code` and `error_msg` becomes `Error::FacebookError`.
    ///
    /// [`Args`]: struct.Args.html
    pub async fn call(&self, method: &str, args: Args) -> error::Result<FacebookResponse> {
        let custom_format = args.is_custom_format();
        let params = self.sign_call(method, &args)?;

        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter())
            .finish();
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.as_str())
            .header(CONTENT_TYPE, mime::APPLICATION_WWW_FORM_URLENCODED.as_ref())
            .body(Body::from(body))?;

        tracing::debug!(method, custom_format, "calling facebook");
        let (parts, body) = raw_request(request, self.timeout).await?;
        if !parts.status.is_success() {
            return Err(Error::BadStatus(parts.status));
        }

        if custom_format {
            return Ok(FacebookResponse::Raw(body));
        }

        match serde_json::from_slice::<Reply>(&body)? {
            Reply::Failure(err) => {
                tracing::debug!(method, code = err.code, "facebook returned an error");
                Err(err.into())
            }
            Reply::Success(data) => Ok(FacebookResponse::Data(data)),
        }
    }

    /// Calls the given REST method and deserializes its reply into `T`.
    ///
    /// Custom-format arguments are rejected here, since their reply isn't necessarily JSON.
    pub async fn call_json<T: DeserializeOwned>(&self, method: &str, args: Args) -> error::Result<T> {
        if args.is_custom_format() {
            return Err(Error::UnsupportedValue(
                "custom format calls return raw bytes; use `call` instead".to_string(),
            ));
        }
        match self.call(method, args).await? {
            FacebookResponse::Data(data) => Ok(serde_json::from_value(data)?),
            FacebookResponse::Raw(bytes) => Ok(serde_json::from_slice(&bytes)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> FacebookClient {
        FacebookClient::new("d3adb33f", "8c2ab4b1e9d6f0a7")
    }

    #[test]
    fn canonical_values() {
        assert_eq!(ParamValue::from("abc").canonical().unwrap(), "abc");
        assert_eq!(ParamValue::from(-42i64).canonical().unwrap(), "-42");
        assert_eq!(ParamValue::from(609143784u64).canonical().unwrap(), "609143784");
        assert_eq!(ParamValue::from(1.5).canonical().unwrap(), "1.5");
        assert_eq!(ParamValue::from(true).canonical().unwrap(), "true");
        assert_eq!(ParamValue::from(false).canonical().unwrap(), "false");
    }

    #[test]
    fn single_element_list_collapses() {
        let list = ParamValue::from(vec!["only"]);
        assert_eq!(list.canonical().unwrap(), "only");

        let with_list = Args::new().add_param("uids", vec![4u64]).call_id(CallId::Omit);
        let with_scalar = Args::new().add_param("uids", 4u64).call_id(CallId::Omit);
        let client = client();

        assert_eq!(
            client.sign_call("facebook.users.getInfo", &with_list).unwrap(),
            client.sign_call("facebook.users.getInfo", &with_scalar).unwrap()
        );
    }

    #[test]
    fn other_lists_are_rejected() {
        let empty = ParamValue::Seq(Vec::new());
        let pair = ParamValue::from(vec![1i64, 2]);

        assert!(matches!(empty.canonical(), Err(Error::UnsupportedValue(_))));
        assert!(matches!(pair.canonical(), Err(Error::UnsupportedValue(_))));

        let args = Args::new().add_param("uids", vec![1i64, 2]);
        assert!(client().sign_call("facebook.users.getInfo", &args).is_err());
    }

    #[test]
    fn defaults_are_filled_in() {
        let params = client()
            .sign_call("facebook.auth.getSession", &Args::new().add_param("auth_token", "tok"))
            .unwrap();

        assert_eq!(params["format"], "JSON");
        assert_eq!(params["v"], "1.0");
        assert_eq!(params["api_key"], "d3adb33f");
        assert_eq!(params["method"], "facebook.auth.getSession");
        assert_eq!(params["auth_token"], "tok");
        assert!(params.contains_key("call_id"));
        assert_eq!(params["sig"].len(), 32);
    }

    #[test]
    fn explicit_defaults_are_kept() {
        let args = Args::new().add_param("format", "XML").add_param("v", "1.1");
        let params = client().sign_call("facebook.users.getInfo", &args).unwrap();

        assert_eq!(params["format"], "XML");
        assert_eq!(params["v"], "1.1");
        assert!(args.is_custom_format());
    }

    #[test]
    fn signature_covers_everything_but_sig() {
        let client = client();
        let mut params = client
            .sign_call("facebook.profile.setFBML", &Args::new().add_param("uid", 4u64))
            .unwrap();
        let sig = params.remove("sig").unwrap();

        assert_eq!(sig, signature(&params, client.secret()));
    }

    #[test]
    fn signing_is_deterministic_without_auto_call_id() {
        let client = client();
        let args = Args::new()
            .add_param("uids", 4u64)
            .call_id(CallId::Explicit(17));

        let first = client.sign_call("facebook.users.getInfo", &args).unwrap();
        let second = client.sign_call("facebook.users.getInfo", &args).unwrap();
        assert_eq!(first, second);
        assert_eq!(first["call_id"], "17");

        let other_secret = FacebookClient::new("d3adb33f", "different");
        assert_ne!(
            first["sig"],
            other_secret.sign_call("facebook.users.getInfo", &args).unwrap()["sig"]
        );
    }

    #[test]
    fn call_ids() {
        let client = client();
        let first = client.sign_call("m", &Args::new()).unwrap();
        let second = client.clone().sign_call("m", &Args::new()).unwrap();
        let omitted = client.sign_call("m", &Args::new().call_id(CallId::Omit)).unwrap();

        let first: u64 = first["call_id"].parse().unwrap();
        let second: u64 = second["call_id"].parse().unwrap();
        assert!(second > first);
        assert!(!omitted.contains_key("call_id"));
    }

    #[test]
    fn reply_decoding() {
        let err: Reply =
            serde_json::from_str(r#"{"error_code": 100, "error_msg": "Invalid parameter", "request_args": []}"#)
                .unwrap();
        match err {
            Reply::Failure(err) => {
                assert_eq!(err.code, 100);
                assert_eq!(err.message, "Invalid parameter");
            }
            Reply::Success(_) => panic!("error payload decoded as success"),
        }

        let ok: Reply = serde_json::from_str(r#"[{"uid": 4, "name": "Mark"}]"#).unwrap();
        assert!(matches!(ok, Reply::Success(_)));

        let scalar: Reply = serde_json::from_str("true").unwrap();
        assert!(matches!(scalar, Reply::Success(serde_json::Value::Bool(true))));
    }

    #[test]
    fn debug_hides_secret() {
        let printed = format!("{:?}", client());
        assert!(!printed.contains("8c2ab4b1e9d6f0a7"));
    }
}
