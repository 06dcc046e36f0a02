// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use serde::Deserialize;

use crate::common::*;
use crate::error::Result;
use crate::links;

use super::*;

/// A user session obtained from an auth token.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Session {
    /// The key to pass as `session_key` on calls made on the user's behalf.
    pub session_key: String,
    /// The id of the user who owns the session.
    #[serde(deserialize_with = "deserialize_id")]
    pub uid: u64,
    /// Unix time at which the session expires, or 0 for an infinite session.
    #[serde(default)]
    pub expires: i64,
}

impl FacebookClient {
    /// Exchanges the `auth_token` Facebook handed to your post-add callback for a session.
    pub async fn auth_get_session(&self, auth_token: &str) -> Result<Session> {
        let args = Args::new().add_param("auth_token", auth_token);

        self.call_json(links::facebook::methods::AUTH_GET_SESSION, args).await
    }

    /// Looks up the given profile `fields` for each of `uids`.
    ///
    /// Each returned object holds the requested fields plus `uid`.
    pub async fn users_get_info<I, F>(
        &self,
        session_key: &str,
        uids: I,
        fields: F,
    ) -> Result<Vec<serde_json::Map<String, serde_json::Value>>>
    where
        I: IntoIterator<Item = u64>,
        F: IntoIterator,
        F::Item: std::fmt::Display,
    {
        let args = Args::new()
            .add_param("session_key", session_key)
            .add_param("uids", join_display(uids, ","))
            .add_param("fields", join_display(fields, ","));

        self.call_json(links::facebook::methods::USERS_GET_INFO, args).await
    }

    /// Sets the FBML markup of a user's profile box.
    pub async fn profile_set_fbml(&self, session_key: &str, uid: u64, markup: &str) -> Result<bool> {
        let args = Args::new()
            .add_param("session_key", session_key)
            .add_param("uid", uid)
            .add_param("markup", markup);

        let reply: serde_json::Value = self
            .call_json(links::facebook::methods::PROFILE_SET_FBML, args)
            .await?;
        Ok(match reply {
            serde_json::Value::Bool(b) => b,
            serde_json::Value::Number(n) => n.as_i64() == Some(1),
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::tests::load_file;

    #[test]
    fn parse_session() {
        let content = load_file("sample_payloads/auth.getSession.json");
        let session: Session = serde_json::from_str(&content).unwrap();

        assert_eq!(session.session_key, "5f34e11bfb97c762e439e6a5-8055");
        assert_eq!(session.uid, 8055);
        assert_eq!(session.expires, 1173309298);
    }

    #[test]
    fn parse_session_string_uid() {
        let session: Session =
            serde_json::from_str(r#"{"session_key": "abc", "uid": "609143784"}"#).unwrap();

        assert_eq!(session.uid, 609143784);
        assert_eq!(session.expires, 0);
    }
}
