// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Opaque container for API signing secrets.

use std::fmt;

/// A shared secret used to sign requests and verify signatures.
///
/// The only way to read the secret back out is [`as_bytes`], which the signing code uses as
/// digest input. `Debug` is redacted and there is no `Display` impl, so a `Secret` that ends up
/// in a log line or an error report does not leak its value.
///
/// [`as_bytes`]: #method.as_bytes
#[derive(Clone)]
pub struct Secret(Vec<u8>);

impl Secret {
    /// Wraps the given secret value.
    pub fn new(value: impl Into<Vec<u8>>) -> Secret {
        Secret(value.into())
    }

    /// Returns the raw secret bytes for use in a signature.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the secret as text, for protocols that percent-encode it into a signing key.
    pub(crate) fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Secret {
        Secret::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Secret {
        Secret::new(value)
    }
}

impl From<&[u8]> for Secret {
    fn from(value: &[u8]) -> Secret {
        Secret::new(value)
    }
}

impl<'de> serde::Deserialize<'de> for Secret {
    fn deserialize<D>(deserializer: D) -> Result<Secret, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        <String as serde::Deserialize>::deserialize(deserializer).map(Secret::from)
    }
}

#[cfg(test)]
mod tests {
    use super::Secret;

    #[test]
    fn debug_is_redacted() {
        let secret = Secret::from("hunter2");
        let printed = format!("{:?}", secret);

        assert!(!printed.contains("hunter2"));
        assert_eq!(printed, "Secret(<redacted>)");
        assert_eq!(secret.as_bytes(), b"hunter2");
    }

    #[test]
    fn deserialize_from_string() {
        let secret: Secret = serde_json::from_str(r#""hunter2""#).unwrap();
        assert_eq!(secret.as_bytes(), b"hunter2");
    }
}
