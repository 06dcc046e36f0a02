// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Map-like views of an app's remote key-value storage.

use std::collections::btree_map;
use std::collections::BTreeMap;

use hyper::Method;
use serde::Deserialize;
use serde_json::Value;

use crate::common::*;
use crate::error::Result;
use crate::links;

use super::Consumer;

/// The global, or one user's, stored app data.
///
/// `AppData` behaves like a map from string keys to JSON values. The contents are fetched from
/// MySpace on the first read or write, and are kept in memory after that: further access makes
/// no more calls until [`reload`] is called. Changes are local until [`save`] sends them back.
///
/// MySpace stores every value as a string. To keep other types intact, values are decoded as JSON
/// on load where possible, and anything that isn't a string, number or boolean is JSON-encoded on
/// save. Keys are always strings.
///
/// ```rust,no_run
/// # #[tokio::main]
/// # async fn main() -> social_rest::error::Result<()> {
/// # let consumer = social_rest::myspace::Consumer::new("", "");
/// let mut data = consumer.appdata(None, Some(28568917));
///
/// let visits = data.get("visits").await?.and_then(|v| v.as_i64()).unwrap_or(0);
/// data.insert("visits", visits + 1).await?;
/// data.save().await?;
/// # Ok(())
/// # }
/// ```
///
/// [`reload`]: #method.reload
/// [`save`]: #method.save
#[derive(Debug, Clone)]
pub struct AppData {
    consumer: Consumer,
    user_id: Option<u64>,
    keys: Option<Vec<String>>,
    data: Option<BTreeMap<String, Value>>,
}

impl AppData {
    pub(crate) fn new(consumer: Consumer, keys: Option<Vec<String>>, user_id: Option<u64>) -> AppData {
        AppData {
            consumer,
            user_id,
            keys,
            data: None,
        }
    }

    /// The user whose data this is, or `None` for the app's global data.
    pub fn user_id(&self) -> Option<u64> {
        self.user_id
    }

    /// Whether the contents have been fetched yet.
    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    fn path(&self) -> String {
        match self.user_id {
            Some(id) => format!("users/{}/appdata", id),
            None => links::myspace::GLOBAL_APPDATA.to_string(),
        }
    }

    async fn load(&mut self) -> Result<&mut BTreeMap<String, Value>> {
        if self.data.is_none() {
            let mut path = self.path();
            push_keys(&mut path, self.keys.as_deref());

            tracing::trace!(path = %path, "loading app data");
            let response = self.consumer.get(&path).await?;
            let collection = response.as_ref().and_then(|r| r.get("keyvaluecollection"));
            self.data = Some(parse_collection(collection));
        }

        Ok(self.data.get_or_insert_with(BTreeMap::new))
    }

    /// Drops the cached contents and fetches them again.
    ///
    /// Unsaved changes are lost.
    pub async fn reload(&mut self) -> Result<()> {
        self.data = None;
        self.load().await?;
        Ok(())
    }

    /// Returns the value stored under `key`.
    pub async fn get(&mut self, key: &str) -> Result<Option<&Value>> {
        Ok(self.load().await?.get(key))
    }

    /// Returns whether a value is stored under `key`.
    pub async fn contains_key(&mut self, key: &str) -> Result<bool> {
        Ok(self.load().await?.contains_key(key))
    }

    /// Stores `value` under `key`, returning the value it replaced.
    pub async fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<Option<Value>> {
        Ok(self.load().await?.insert(key.into(), value.into()))
    }

    /// Removes the value stored under `key`, returning it.
    pub async fn remove(&mut self, key: &str) -> Result<Option<Value>> {
        Ok(self.load().await?.remove(key))
    }

    /// Iterates over the stored keys, in order.
    pub async fn keys(&mut self) -> Result<btree_map::Keys<'_, String, Value>> {
        Ok(self.load().await?.keys())
    }

    /// Iterates over the stored values, in key order.
    pub async fn values(&mut self) -> Result<btree_map::Values<'_, String, Value>> {
        Ok(self.load().await?.values())
    }

    /// Iterates over the stored entries, in key order.
    pub async fn iter(&mut self) -> Result<btree_map::Iter<'_, String, Value>> {
        Ok(self.load().await?.iter())
    }

    /// The number of stored entries.
    pub async fn len(&mut self) -> Result<usize> {
        Ok(self.load().await?.len())
    }

    /// Whether nothing is stored.
    pub async fn is_empty(&mut self) -> Result<bool> {
        Ok(self.load().await?.is_empty())
    }

    /// Removes every entry.
    pub async fn clear(&mut self) -> Result<()> {
        self.load().await?.clear();
        Ok(())
    }

    /// Stores every entry of `entries`, replacing existing values.
    pub async fn extend<I, K, V>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.load()
            .await?
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        Ok(())
    }

    /// Sends the current contents back to MySpace in a single `PUT`.
    ///
    /// Does nothing if the contents were never loaded.
    pub async fn save(&self) -> Result<()> {
        let data = match &self.data {
            Some(data) => data,
            None => return Ok(()),
        };

        let params = data
            .iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect::<ParamList>();

        tracing::trace!(path = %self.path(), entries = params.len(), "saving app data");
        self.consumer
            .request(&self.path(), Some(&params), Method::PUT)
            .await?;
        Ok(())
    }
}

/// The app data of each of a user's friends, keyed by friend id.
///
/// Everything is fetched in one call on first access. Each friend's `AppData` comes back already
/// loaded, so reading it makes no further calls; saving it writes to that friend's storage.
#[derive(Debug, Clone)]
pub struct FriendsAppData {
    consumer: Consumer,
    user_id: u64,
    keys: Option<Vec<String>>,
    data: Option<BTreeMap<u64, AppData>>,
}

#[derive(Deserialize)]
struct FriendEntry {
    #[serde(deserialize_with = "deserialize_id")]
    userid: u64,
    #[serde(default)]
    keyvaluecollection: Option<Value>,
}

impl FriendsAppData {
    pub(crate) fn new(consumer: Consumer, user_id: u64, keys: Option<Vec<String>>) -> FriendsAppData {
        FriendsAppData {
            consumer,
            user_id,
            keys,
            data: None,
        }
    }

    async fn load(&mut self) -> Result<&mut BTreeMap<u64, AppData>> {
        if self.data.is_none() {
            let mut path = format!("users/{}/friends/appdata", self.user_id);
            push_keys(&mut path, self.keys.as_deref());

            tracing::trace!(path = %path, "loading friends' app data");
            let entries: Vec<FriendEntry> = match self.consumer.get(&path).await? {
                Some(response) => serde_json::from_value(response)?,
                None => Vec::new(),
            };

            let mut friends = BTreeMap::new();
            for entry in entries {
                let mut appdata = AppData::new(self.consumer.clone(), self.keys.clone(), Some(entry.userid));
                appdata.data = Some(parse_collection(entry.keyvaluecollection.as_ref()));
                friends.insert(entry.userid, appdata);
            }
            self.data = Some(friends);
        }

        Ok(self.data.get_or_insert_with(BTreeMap::new))
    }

    /// Drops the cached contents and fetches them again.
    pub async fn reload(&mut self) -> Result<()> {
        self.data = None;
        self.load().await?;
        Ok(())
    }

    /// Returns the app data of the given friend.
    pub async fn get(&mut self, friend_id: u64) -> Result<Option<&mut AppData>> {
        Ok(self.load().await?.get_mut(&friend_id))
    }

    /// Returns whether app data was returned for the given friend.
    pub async fn contains_key(&mut self, friend_id: u64) -> Result<bool> {
        Ok(self.load().await?.contains_key(&friend_id))
    }

    /// Iterates over the friend ids, in order.
    pub async fn keys(&mut self) -> Result<btree_map::Keys<'_, u64, AppData>> {
        Ok(self.load().await?.keys())
    }

    /// Iterates over each friend's app data, in id order.
    pub async fn iter(&mut self) -> Result<btree_map::IterMut<'_, u64, AppData>> {
        Ok(self.load().await?.iter_mut())
    }

    /// The number of friends returned.
    pub async fn len(&mut self) -> Result<usize> {
        Ok(self.load().await?.len())
    }

    /// Whether no friends were returned.
    pub async fn is_empty(&mut self) -> Result<bool> {
        Ok(self.load().await?.is_empty())
    }
}

/// Appends `/key1;key2` to a resource path, encoding each key as a path segment.
fn push_keys(path: &mut String, keys: Option<&[String]>) {
    if let Some(keys) = keys.filter(|k| !k.is_empty()) {
        path.push('/');
        path.push_str(&join_display(keys.iter().map(|k| percent_encode(k)), ";"));
    }
}

/// Reads a `keyvaluecollection` array into a map, leaving out OAuth parameters echoed back by
/// the service.
fn parse_collection(collection: Option<&Value>) -> BTreeMap<String, Value> {
    let mut data = BTreeMap::new();
    let pairs = match collection.and_then(Value::as_array) {
        Some(pairs) => pairs,
        None => return data,
    };

    for pair in pairs {
        let key = match pair.get("key").and_then(Value::as_str) {
            Some(key) if !key.is_empty() && !key.starts_with("oauth_") => key,
            _ => continue,
        };
        let value = match pair.get("value") {
            Some(Value::String(raw)) => {
                serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()))
            }
            Some(other) => other.clone(),
            None => Value::Null,
        };
        data.insert(key.to_string(), value);
    }

    data
}

/// Renders a value the way it is stored: strings as-is, numbers and booleans in their usual
/// text form, and everything else as JSON.
fn encode_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::tests::load_file;

    #[test]
    fn parse_sample_collection() {
        let content: Value = serde_json::from_str(&load_file("sample_payloads/appdata.json")).unwrap();
        let data = parse_collection(content.get("keyvaluecollection"));

        assert_eq!(data["theme"], Value::String("dark".to_string()));
        assert_eq!(data["visits"], serde_json::json!(42));
        assert_eq!(data["prefs"]["sound"], serde_json::json!(true));
        assert_eq!(data["prefs"]["volume"], serde_json::json!(7));
        assert_eq!(data["nickname"], Value::String("{not json".to_string()));
        assert!(!data.keys().any(|k| k.starts_with("oauth_")));
    }

    #[test]
    fn key_list_in_path() {
        let mut path = "users/7/appdata".to_string();
        push_keys(&mut path, Some(&[][..]));
        assert_eq!(path, "users/7/appdata");

        let keys = vec!["high score".to_string(), "a;b".to_string(), "café".to_string()];
        push_keys(&mut path, Some(&keys[..]));
        assert_eq!(path, "users/7/appdata/high%20score;a%3Bb;caf%C3%A9");
    }

    #[test]
    fn parse_missing_collection() {
        assert!(parse_collection(None).is_empty());
        assert!(parse_collection(Some(&Value::Null)).is_empty());
    }

    #[test]
    fn encoded_values() {
        assert_eq!(encode_value(&serde_json::json!("plain")), "plain");
        assert_eq!(encode_value(&serde_json::json!(12)), "12");
        assert_eq!(encode_value(&serde_json::json!(1.5)), "1.5");
        assert_eq!(encode_value(&serde_json::json!(true)), "true");
        assert_eq!(encode_value(&Value::Null), "null");
        assert_eq!(encode_value(&serde_json::json!([1, 2])), "[1,2]");
        assert_eq!(encode_value(&serde_json::json!({"a": "b"})), r#"{"a":"b"}"#);
    }

    #[test]
    fn storage_paths() {
        let consumer = Consumer::new("key", "secret");
        assert_eq!(consumer.appdata(None, None).path(), "appdata/global");
        assert_eq!(
            consumer.appdata(Some(vec!["a".into()]), Some(7)).path(),
            "users/7/appdata"
        );
    }

    #[tokio::test]
    async fn save_before_load_is_a_no_op() {
        // nothing listens on this port; a request would fail
        let consumer = Consumer::new("key", "secret").with_server("127.0.0.1", 9);
        let data = consumer.appdata(None, None);

        data.save().await.unwrap();
        assert!(!data.is_loaded());
    }
}
