// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! OAuth 1.0 request signing for the MySpace REST API.
//!
//! MySpace signs with a consumer key and secret only: the token is always empty, so the HMAC key
//! is `enc(consumer_secret)&`. Parameters travel in the query string or body rather than in an
//! `Authorization` header.

use hmac::{Hmac, Mac, NewMac};
use hyper::header::CONTENT_TYPE;
use hyper::{Body, Method, Request};
use rand::{self, Rng};
use sha1::Sha1;

use crate::common::*;
use crate::error::{self, Error};
use crate::links::oauth;
use crate::secret::Secret;

/// OAuth parameter set used to create a signature.
#[derive(Clone, Debug)]
pub(crate) struct OAuthParams {
    /// The consumer key that represents the app making the API request.
    consumer_key: String,
    /// A random token representing the request itself.
    nonce: String,
    /// A Unix timestamp for when the request was created.
    timestamp: i64,
}

impl OAuthParams {
    /// Creates a new `OAuthParams` set for the given consumer key, with a fresh `timestamp` and
    /// `nonce`.
    pub(crate) fn new(consumer_key: impl Into<String>) -> OAuthParams {
        let timestamp = chrono::Utc::now().timestamp();
        let mut rng = rand::thread_rng();
        let nonce = ::std::iter::repeat(())
            .map(|()| char::from(rng.sample(rand::distributions::Alphanumeric)))
            .take(32)
            .collect::<String>();
        OAuthParams {
            consumer_key: consumer_key.into(),
            nonce,
            timestamp,
        }
    }

    #[cfg(test)]
    pub(crate) fn fixed(consumer_key: &str, nonce: &str, timestamp: i64) -> OAuthParams {
        OAuthParams {
            consumer_key: consumer_key.to_string(),
            nonce: nonce.to_string(),
            timestamp,
        }
    }

    /// Adds the OAuth parameters to `params`, then signs the whole set for the given request,
    /// returning it with `oauth_signature` included.
    pub(crate) fn sign_request(
        self,
        method: &Method,
        uri: &str,
        params: Option<&ParamList>,
        consumer_secret: &Secret,
    ) -> error::Result<ParamList> {
        let mut signed = params
            .cloned()
            .unwrap_or_default()
            .add_param(oauth::CONSUMER_KEY, self.consumer_key)
            .add_param(oauth::NONCE, self.nonce)
            .add_param(oauth::SIGNATURE_METHOD, oauth::HMAC_SHA1)
            .add_param(oauth::TIMESTAMP, self.timestamp.to_string())
            .add_param(oauth::TOKEN, "")
            .add_param(oauth::VERSION, oauth::PROTOCOL_VERSION);

        let sig = signature(method.as_str(), uri, &signed, consumer_secret)?;
        signed.add_param_ref(oauth::SIGNATURE, sig);

        Ok(signed)
    }
}

/// Reduces a request URL to the form used in a signature base string: lowercase scheme and host,
/// no default port, no query or fragment.
pub fn normalize_url(uri: &str) -> error::Result<String> {
    let url = url::Url::parse(uri)?;
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    let port = match url.port() {
        Some(port) => format!(":{}", port),
        None => String::new(),
    };
    Ok(format!("{}://{}{}{}", url.scheme(), host, port, url.path()))
}

/// Computes the HMAC-SHA1 OAuth signature of a request, with an empty token secret.
///
/// Every parameter except `oauth_signature` is signed. The result is base64-encoded.
pub fn signature(
    method: &str,
    uri: &str,
    params: &ParamList,
    consumer_secret: &Secret,
) -> error::Result<String> {
    let query_string = {
        let mut query = params
            .iter()
            .filter(|(k, _)| k.as_ref() != oauth::SIGNATURE)
            .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>();
        query.sort();

        query.join("&")
    };

    let base_str = format!(
        "{}&{}&{}",
        percent_encode(&method.to_ascii_uppercase()),
        percent_encode(&normalize_url(uri)?),
        percent_encode(&query_string)
    );
    let key = format!("{}&", percent_encode(&consumer_secret.as_str_lossy()));

    let mut digest = Hmac::<Sha1>::new_from_slice(key.as_bytes())
        .map_err(|_| Error::UnsupportedValue("HMAC signing key".to_string()))?;
    digest.update(base_str.as_bytes());

    Ok(base64::encode(&digest.finalize().into_bytes()))
}

/// Assembles a signed request to the given URL.
///
/// For `GET` and `DELETE`, the signed parameters are appended to `uri` as a query string. For
/// other methods they form the request body, sent as `text/plain`.
pub fn signed_request(
    method: Method,
    uri: &str,
    params: Option<&ParamList>,
    consumer_key: &str,
    consumer_secret: &Secret,
) -> error::Result<Request<Body>> {
    let signed = OAuthParams::new(consumer_key).sign_request(&method, uri, params, consumer_secret)?;
    build_request(method, uri, &signed)
}

pub(crate) fn build_request(method: Method, uri: &str, signed: &ParamList) -> error::Result<Request<Body>> {
    let request = Request::builder().method(method.clone());
    let request = if method == Method::GET || method == Method::DELETE {
        request
            .uri(format!("{}?{}", uri, signed.to_urlencoded()))
            .body(Body::empty())?
    } else {
        request
            .uri(uri)
            .header(CONTENT_TYPE, mime::TEXT_PLAIN.as_ref())
            .body(Body::from(signed.to_urlencoded()))?
    };
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    // The worked example from the OAuth 1.0 specification, Appendix A.5, reduced to an empty
    // token the same way MySpace signs.
    fn example_params() -> ParamList {
        ParamList::new()
            .add_param("file", "vacation.jpg")
            .add_param("size", "original")
    }

    #[test]
    fn normalized_urls() {
        assert_eq!(
            normalize_url("HTTP://Api.MySpace.com:80/v1/users/1.json?a=b#frag").unwrap(),
            "http://api.myspace.com/v1/users/1.json"
        );
        assert_eq!(
            normalize_url("http://localhost:8080/v1/appdata/global.json").unwrap(),
            "http://localhost:8080/v1/appdata/global.json"
        );
        assert_eq!(
            normalize_url("https://example.com:443/r").unwrap(),
            "https://example.com/r"
        );
        assert!(normalize_url("not a url").is_err());
    }

    #[test]
    fn signature_matches_manual_computation() {
        let secret = Secret::from("kd94hf93k423kf44");
        let params = OAuthParams::fixed("dpf43f3p2l4k3l03", "kllo9940pd9333jh", 1191242096)
            .sign_request(&Method::GET, "http://photos.example.net/photos", Some(&example_params()), &secret)
            .unwrap();

        let base = "GET&http%3A%2F%2Fphotos.example.net%2Fphotos&\
            file%3Dvacation.jpg%26oauth_consumer_key%3Ddpf43f3p2l4k3l03%26oauth_nonce%3Dkllo9940pd9333jh\
            %26oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1191242096%26oauth_token%3D\
            %26oauth_version%3D1.0%26size%3Doriginal";
        let mut mac = Hmac::<Sha1>::new_from_slice(b"kd94hf93k423kf44&").unwrap();
        mac.update(base.as_bytes());
        let expected = base64::encode(&mac.finalize().into_bytes());

        assert_eq!(params.get_str("oauth_signature"), Some(expected.as_str()));
    }

    #[test]
    fn signature_ignores_existing_signature_param() {
        let secret = Secret::from("s3cr3t");
        let params = OAuthParams::fixed("key", "nonce", 1)
            .sign_request(&Method::GET, "http://api.myspace.com/v1/users/1.json", None, &secret)
            .unwrap();
        let sig = params.get_str("oauth_signature").unwrap();

        let recomputed =
            signature("GET", "http://api.myspace.com/v1/users/1.json", &params, &secret).unwrap();
        assert_eq!(sig, recomputed);
    }

    #[test]
    fn signature_depends_on_method_url_and_secret() {
        let secret = Secret::from("s3cr3t");
        let params = ParamList::new().add_param("a", "1");
        let url = "http://api.myspace.com/v1/users/1.json";
        let base = signature("GET", url, &params, &secret).unwrap();

        assert_ne!(base, signature("PUT", url, &params, &secret).unwrap());
        assert_ne!(base, signature("GET", "http://api.myspace.com/v1/users/2.json", &params, &secret).unwrap());
        assert_ne!(base, signature("GET", url, &params, &Secret::from("other")).unwrap());
        assert_eq!(base, signature("get", url, &params, &secret).unwrap());
    }

    #[test]
    fn read_requests_carry_params_in_query() {
        let secret = Secret::from("s3cr3t");
        let req = signed_request(
            Method::GET,
            "http://api.myspace.com/v1/users/1/friends.json",
            Some(&ParamList::new().add_param("page", "2")),
            "key",
            &secret,
        )
        .unwrap();

        let query = req.uri().query().unwrap();
        let params = ParamList::from_urlencoded(query);
        assert_eq!(params.get_str("page"), Some("2"));
        assert_eq!(params.get_str("oauth_consumer_key"), Some("key"));
        assert_eq!(params.get_str("oauth_token"), Some(""));
        assert_eq!(params.get_str("oauth_signature_method"), Some("HMAC-SHA1"));
        assert_eq!(params.get_str("oauth_nonce").map(str::len), Some(32));
        assert!(params.get_str("oauth_signature").is_some());
        assert!(req.headers().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn write_requests_carry_params_in_body() {
        let secret = Secret::from("s3cr3t");
        let req = signed_request(
            Method::PUT,
            "http://api.myspace.com/v1/users/1/mood.json",
            Some(&ParamList::new().add_param("mood", "happy")),
            "key",
            &secret,
        )
        .unwrap();

        assert_eq!(req.uri().query(), None);
        assert_eq!(req.headers()[CONTENT_TYPE], "text/plain");
    }
}
