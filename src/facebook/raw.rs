// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Signature computation and inbound validation for the Facebook REST protocol.

use std::collections::BTreeMap;

use subtle::ConstantTimeEq;

use crate::links;
use crate::secret::Secret;

/// Computes the Facebook signature of the given canonical parameters.
///
/// The digest is MD5 over `key=value` for every pair in ascending key order, followed by the raw
/// secret bytes, rendered as lowercase hex. Passing a `BTreeMap` guarantees the ordering.
pub fn signature(params: &BTreeMap<String, String>, secret: &Secret) -> String {
    let mut ctx = md5::Context::new();
    for (key, value) in params {
        ctx.consume(key.as_bytes());
        ctx.consume(b"=");
        ctx.consume(value.as_bytes());
    }
    ctx.consume(secret.as_bytes());
    format!("{:x}", ctx.compute())
}

/// A set of parameters received from Facebook, from a canvas POST or a callback redirect.
///
/// Build one from a map of already-decoded values with `collect()`, or from raw request data with
/// [`from_query`]. Keys may carry several values when they were repeated in a query string.
///
/// [`from_query`]: #method.from_query
#[derive(Debug, Clone, Default)]
pub struct InboundParams(BTreeMap<String, Vec<String>>);

impl InboundParams {
    /// Parses `application/x-www-form-urlencoded` data, such as a POST body or a query string.
    pub fn from_query(data: &str) -> InboundParams {
        let mut params = InboundParams::default();
        for (k, v) in url::form_urlencoded::parse(data.as_bytes()) {
            params.0.entry(k.into_owned()).or_default().push(v.into_owned());
        }
        params
    }

    /// Returns the value of `key` if it was given exactly once.
    pub fn single(&self, key: &str) -> Option<&str> {
        match self.0.get(key).map(Vec::as_slice) {
            Some([value]) => Some(value.as_str()),
            _ => None,
        }
    }

    fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.0.remove(key)
    }
}

impl<K: Into<String>, V: Into<String>> std::iter::FromIterator<(K, V)> for InboundParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = InboundParams::default();
        for (k, v) in iter {
            params.0.insert(k.into(), vec![v.into()]);
        }
        params
    }
}

impl From<&str> for InboundParams {
    fn from(data: &str) -> InboundParams {
        InboundParams::from_query(data)
    }
}

impl From<BTreeMap<String, String>> for InboundParams {
    fn from(map: BTreeMap<String, String>) -> InboundParams {
        map.into_iter().collect()
    }
}

impl From<std::collections::HashMap<String, String>> for InboundParams {
    fn from(map: std::collections::HashMap<String, String>) -> InboundParams {
        map.into_iter().collect()
    }
}

/// Validates the signed parameters Facebook sends to canvas pages and callbacks.
///
/// The `fb_sig` parameter is taken as the signature. Every other parameter whose key begins with
/// `fb_sig_` is part of the signed set; the prefix is stripped from those keys, the signature is
/// recomputed as in [`signature`], and compared to the given one in constant time.
///
/// Returns the signed parameters with their prefixes removed. If there is no signature, if the
/// signature doesn't match, or if a signed key was repeated so that its value is ambiguous, the
/// returned map is empty. This function never fails.
///
/// ```
/// use social_rest::facebook;
/// use social_rest::Secret;
///
/// let secret = Secret::from("not-a-real-secret");
/// let args = facebook::validate(&secret, facebook::InboundParams::from_query("fb_sig_user=1"));
/// assert!(args.is_empty());
/// ```
///
/// [`signature`]: fn.signature.html
pub fn validate(secret: &Secret, inbound: impl Into<InboundParams>) -> BTreeMap<String, String> {
    let mut values = inbound.into();

    let given = match values.remove(links::facebook::SIG_FIELD) {
        Some(sig) => match sig.as_slice() {
            [sig] if !sig.is_empty() => sig.clone(),
            _ => return BTreeMap::new(),
        },
        None => return BTreeMap::new(),
    };

    let mut signed = BTreeMap::new();
    for (key, mut value) in values.0 {
        if let Some(stripped) = key.strip_prefix(links::facebook::SIG_PREFIX) {
            if value.len() != 1 {
                tracing::warn!(key = %key, "signed parameter repeated, rejecting");
                return BTreeMap::new();
            }
            signed.insert(stripped.to_string(), value.remove(0));
        }
    }

    let expected = signature(&signed, secret);
    if bool::from(expected.as_bytes().ct_eq(given.as_bytes())) {
        signed
    } else {
        tracing::warn!(params = signed.len(), "fb_sig signature mismatch");
        BTreeMap::new()
    }
}
