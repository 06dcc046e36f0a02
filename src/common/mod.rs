// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Set of structs and methods that act as a sort of internal prelude.
//!
//! The elements available in this module and its children are fairly basic building blocks that
//! the other modules all glob-import to make available as a common language.
//!
//! # Module contents
//!
//! ## Type Aliases
//!
//! * `Cow<'static, str>` (re-exported as the alias `CowStr`)
//!
//! ## `ParamList`
//!
//! `ParamList` is the string-to-string parameter collection used by the MySpace client. It's
//! consumed by the OAuth signer in `myspace::raw`, and can also be built from an inbound
//! `application/x-www-form-urlencoded` string so the verifier can work from the same type.
//! Facebook calls need typed values for their signature rules, so they use `facebook::Args`
//! instead.
//!
//! ## `percent_encode`
//!
//! The RFC 3986 encoder required by OAuth 1.0 signature base strings. The encode sets in the
//! `percent_encoding` crate are all a little too lenient, so the set is built here.
//!
//! ## Web calls
//!
//! The `response` module holds the functions that every network call goes through:
//! `get_response` starts the request on a fresh hyper client, and `raw_request` drives it to
//! completion under a timeout and hands back the response head and body bytes.

use std::borrow::Cow;
use std::collections::HashMap;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, PercentEncode};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

mod response;

pub use crate::common::response::*;

pub type CowStr = Cow<'static, str>;

/// How long a single web call may take, including reading the body, unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// n.b. this type is re-exported in the `raw` module - these docs are public!
/// Represents a list of parameters to a MySpace API call.
///
/// This type is a wrapper around a `HashMap<Cow<'static, str>, Cow<'static, str>>` to collect a
/// set of parameter key/value pairs. These are then used to assemble and sign a request. All the
/// functions that add parameters accept `impl Into<Cow<'static, str>>`, meaning that either a
/// string literal or an owned `String` may be used.
///
/// ```
/// use social_rest::raw::ParamList;
///
/// let params = ParamList::new()
///     .add_param("page", "2")
///     .add_opt_param("list", None::<String>);
/// assert_eq!(params.len(), 1);
/// ```
#[derive(Debug, Clone, Default, derive_more::Deref, derive_more::DerefMut, derive_more::From)]
pub struct ParamList(HashMap<Cow<'static, str>, Cow<'static, str>>);

impl ParamList {
    /// Creates a new, empty `ParamList`.
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Parses an `application/x-www-form-urlencoded` string into a `ParamList`.
    ///
    /// If a key is repeated, the last value wins.
    pub fn from_urlencoded(input: &str) -> Self {
        let mut params = ParamList::new();
        params.extend_urlencoded(input.as_bytes());
        params
    }

    /// Adds every pair of the given `application/x-www-form-urlencoded` data to this
    /// `ParamList`, replacing values of keys that are already present.
    pub fn extend_urlencoded(&mut self, input: &[u8]) {
        for (k, v) in url::form_urlencoded::parse(input) {
            self.add_param_ref(k.into_owned(), v.into_owned());
        }
    }

    /// Adds the given key/value parameter to this `ParamList`.
    pub fn add_param(
        mut self,
        key: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.insert(key.into(), value.into());
        self
    }

    /// Adds the given key/value parameter to this `ParamList` only if the given value is `Some`.
    pub fn add_opt_param(
        self,
        key: impl Into<Cow<'static, str>>,
        value: Option<impl Into<Cow<'static, str>>>,
    ) -> Self {
        match value {
            Some(val) => self.add_param(key.into(), val.into()),
            None => self,
        }
    }

    /// Adds the given key/value to this `ParamList` by mutating it in place, rather than consuming
    /// it as in `add_param`.
    pub fn add_param_ref(
        &mut self,
        key: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
    ) {
        self.0.insert(key.into(), value.into());
    }

    /// Looks up a parameter by name.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|v| v.as_ref())
    }

    /// Renders this `ParamList` as an `application/x-www-form-urlencoded` string.
    ///
    /// The key/value pairs are printed as `key1=value1&key2=value2` in key order, with all keys
    /// and values percent-encoded with [`percent_encode`].
    ///
    /// [`percent_encode`]: fn.percent_encode.html
    pub fn to_urlencoded(&self) -> String {
        let mut pairs = self
            .0
            .iter()
            .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>();
        pairs.sort();
        pairs.join("&")
    }
}

impl<K, V> std::iter::FromIterator<(K, V)> for ParamList
where
    K: Into<Cow<'static, str>>,
    V: Into<Cow<'static, str>>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ParamList(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// Helper trait to stringify the contents of an Option
pub(crate) trait MapString {
    fn map_string(&self) -> Option<String>;
}

impl<T: std::fmt::Display> MapString for Option<T> {
    fn map_string(&self) -> Option<String> {
        self.as_ref().map(|v| v.to_string())
    }
}

/// Joins the `Display` forms of the given items with `sep`.
pub(crate) fn join_display<T, I>(items: I, sep: &str) -> String
where
    T: std::fmt::Display,
    I: IntoIterator<Item = T>,
{
    items
        .into_iter()
        .map(|x| x.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

/// Reads a numeric id that may be sent either as a JSON number or as a string of digits.
pub fn deserialize_id<'de, D>(ser: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(ser)? {
        serde_json::Value::Number(n) => n.as_u64().ok_or_else(|| D::Error::custom("id out of range")),
        serde_json::Value::String(s) => s.parse().map_err(|e| D::Error::custom(e)),
        other => Err(D::Error::custom(format!("unexpected id: {}", other))),
    }
}

/// Percent-encodes the given string per RFC 3986, Section 2.1.
///
/// Every *byte* that is not an ASCII number or letter, or one of the ASCII characters `-`, `.`,
/// `_`, or `~`, is replaced with a percent sign (`%`) and the byte value in uppercase
/// hexadecimal. This is the encoding OAuth 1.0 requires when building a signature base string.
pub fn percent_encode(src: &str) -> PercentEncode {
    lazy_static::lazy_static! {
        static ref ENCODER: AsciiSet = percent_encoding::NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');
    }
    utf8_percent_encode(src, &*ENCODER)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Read;

    pub(crate) fn load_file(path: &str) -> String {
        let mut file = File::open(path).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn percent_encode_reserved() {
        assert_eq!(percent_encode("a b&c=d~e").to_string(), "a%20b%26c%3Dd~e");
        assert_eq!(percent_encode("Ladies + Gentlemen").to_string(), "Ladies%20%2B%20Gentlemen");
        assert_eq!(percent_encode("☃").to_string(), "%E2%98%83");
    }

    #[test]
    fn urlencoded_is_sorted() {
        let params = ParamList::new()
            .add_param("page_size", "20")
            .add_param("list", "top friends")
            .add_param("page", "1");

        assert_eq!(params.to_urlencoded(), "list=top%20friends&page=1&page_size=20");
    }

    #[test]
    fn ids_from_numbers_or_strings() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(deserialize_with = "deserialize_id")]
            id: u64,
        }

        let num: Holder = serde_json::from_str(r#"{"id": 28568917}"#).unwrap();
        let text: Holder = serde_json::from_str(r#"{"id": "28568917"}"#).unwrap();
        assert_eq!(num.id, 28568917);
        assert_eq!(text.id, 28568917);
        assert!(serde_json::from_str::<Holder>(r#"{"id": -1}"#).is_err());
    }

    #[test]
    fn from_urlencoded_last_wins() {
        let params = ParamList::from_urlencoded("a=1&b=two+words&a=3");

        assert_eq!(params.get_str("a"), Some("3"));
        assert_eq!(params.get_str("b"), Some("two words"));
    }
}
