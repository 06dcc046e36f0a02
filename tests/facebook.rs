// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::BTreeMap;
use std::time::Duration;

use social_rest::facebook::{Args, FacebookClient, FacebookResponse};
use social_rest::{raw, Error, Secret};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "d3adb33f";
const SECRET: &str = "8c2ab4b1e9d6f0a7";

const ERROR_PAYLOAD: &str =
    r#"{"error_code":102,"error_msg":"Session key invalid or no longer valid","request_args":[]}"#;

fn client(server: &MockServer) -> FacebookClient {
    FacebookClient::new(API_KEY, SECRET).with_endpoint(format!("{}/restserver.php", server.uri()))
}

async fn sent_params(server: &MockServer) -> Vec<BTreeMap<String, String>> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|req| url::form_urlencoded::parse(&req.body).into_owned().collect())
        .collect()
}

#[tokio::test]
async fn error_payload_is_facebook_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/restserver.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ERROR_PAYLOAD))
        .mount(&server)
        .await;

    let err = client(&server)
        .call("facebook.users.getInfo", Args::new().add_param("uids", 4u64))
        .await
        .unwrap_err();

    match err {
        Error::FacebookError(err) => {
            assert_eq!(err.code, 102);
            assert_eq!(err.message, "Session key invalid or no longer valid");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn custom_format_returns_raw_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/restserver.php"))
        .and(body_string_contains("format=XML"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ERROR_PAYLOAD))
        .mount(&server)
        .await;

    let resp = client(&server)
        .call(
            "facebook.users.getInfo",
            Args::new().add_param("uids", 4u64).add_param("format", "XML"),
        )
        .await
        .unwrap();

    assert_eq!(resp.into_raw().unwrap(), ERROR_PAYLOAD.as_bytes());
}

#[tokio::test]
async fn signed_form_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/restserver.php"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"uid":4,"name":"Mark"}]"#))
        .expect(2)
        .mount(&server)
        .await;

    let client = client(&server);
    for _ in 0..2 {
        let resp = client
            .call(
                "facebook.users.getInfo",
                Args::new().add_param("uids", vec![4u64]).add_param("fields", "name"),
            )
            .await
            .unwrap();
        assert!(matches!(resp, FacebookResponse::Data(_)));
    }

    let sent = sent_params(&server).await;
    assert_eq!(sent.len(), 2);

    for params in &sent {
        assert_eq!(params["api_key"], API_KEY);
        assert_eq!(params["method"], "facebook.users.getInfo");
        assert_eq!(params["format"], "JSON");
        assert_eq!(params["v"], "1.0");
        assert_eq!(params["uids"], "4");

        let mut unsigned = params.clone();
        let sig = unsigned.remove("sig").unwrap();
        assert_eq!(sig, raw::facebook_signature(&unsigned, &Secret::from(SECRET)));
    }

    let first: u64 = sent[0]["call_id"].parse().unwrap();
    let second: u64 = sent[1]["call_id"].parse().unwrap();
    assert!(second > first);
}

#[tokio::test]
async fn session_from_auth_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("auth_token=t0k3n"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(std::fs::read_to_string("sample_payloads/auth.getSession.json").unwrap()),
        )
        .mount(&server)
        .await;

    let session = client(&server).auth_get_session("t0k3n").await.unwrap();
    assert_eq!(session.uid, 8055);
    assert_eq!(session.session_key, "5f34e11bfb97c762e439e6a5-8055");
}

#[tokio::test]
async fn http_failure_is_bad_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = client(&server)
        .call("facebook.users.getInfo", Args::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::BadStatus(status) if status.as_u16() == 502));
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("true")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .with_timeout(Duration::from_millis(100))
        .call("facebook.profile.setFBML", Args::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout));
}

#[tokio::test]
async fn profile_fbml_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("markup="))
        .respond_with(ResponseTemplate::new(200).set_body_string("1"))
        .mount(&server)
        .await;

    let set = client(&server)
        .profile_set_fbml("1a2b3c", 609143784, "<fb:name uid=\"609143784\"/>")
        .await
        .unwrap();
    assert!(set);
}

#[tokio::test]
async fn refused_connection_is_net_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let err = FacebookClient::new(API_KEY, SECRET)
        .with_endpoint(format!("http://127.0.0.1:{}/restserver.php", port))
        .call("facebook.users.getInfo", Args::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NetError(_)), "unexpected error: {:?}", err);
}
