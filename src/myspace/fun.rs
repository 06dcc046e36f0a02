// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use hyper::Method;
use serde_json::Value;

use crate::common::*;
use crate::error::Result;

use super::*;

/// Paging and filtering options for a friends listing.
///
/// Every field is optional; leave them at their defaults to get MySpace's first page.
#[derive(Debug, Clone, Default)]
pub struct FriendsQuery {
    /// The page of results to return.
    pub page: Option<u32>,
    /// How many friends to include per page.
    pub page_size: Option<u32>,
    /// Restrict the listing to a named friend list, like `top`.
    pub list: Option<String>,
    /// Extra fields to include for each friend, like `mood` or `status`.
    pub show: Vec<String>,
}

impl FriendsQuery {
    fn to_params(&self) -> ParamList {
        let show = if self.show.is_empty() {
            None
        } else {
            Some(self.show.join("|"))
        };

        ParamList::new()
            .add_opt_param("page", self.page.filter(|&p| p > 0).map_string())
            .add_opt_param("page_size", self.page_size.filter(|&p| p > 0).map_string())
            .add_opt_param("list", self.list.clone().filter(|l| !l.is_empty()))
            .add_opt_param("show", show)
    }
}

impl Consumer {
    /// Lists the photos in one of a user's albums.
    pub async fn album(&self, user_id: u64, album_id: u64) -> Result<Option<Value>> {
        self.get(&format!("users/{}/albums/{}/photos", user_id, album_id))
            .await
    }

    /// Lists a user's photo albums.
    pub async fn albums(&self, user_id: u64) -> Result<Option<Value>> {
        self.get(&format!("users/{}/albums", user_id)).await
    }

    /// Looks up the details of one of a user's albums.
    pub async fn album_info(&self, user_id: u64, album_id: u64) -> Result<Option<Value>> {
        self.get(&format!("users/{}/albums/{}", user_id, album_id))
            .await
    }

    /// Opens the app's key-value store: the global one when `user_id` is `None`, otherwise the
    /// given user's. If `keys` is given, only those keys are loaded.
    ///
    /// Nothing is fetched until the returned `AppData` is first read or written.
    pub fn appdata(&self, keys: Option<Vec<String>>, user_id: Option<u64>) -> AppData {
        AppData::new(self.clone(), keys, user_id)
    }

    /// Opens the app data of every friend of the given user.
    ///
    /// Nothing is fetched until the returned `FriendsAppData` is first read.
    pub fn appdata_friends(&self, user_id: u64, keys: Option<Vec<String>>) -> FriendsAppData {
        FriendsAppData::new(self.clone(), user_id, keys)
    }

    /// Looks up the user this client acts for.
    ///
    /// Returns `None` without making a call when no viewer is set, or when the viewer is
    /// anonymous.
    pub async fn current_user(&self) -> Result<Option<Value>> {
        match self.viewer_id {
            Some(viewer) => self.user(viewer).await,
            None => Ok(None),
        }
    }

    /// Looks up a user's extended details.
    pub async fn details(&self, user_id: u64) -> Result<Option<Value>> {
        self.get(&format!("users/{}/details", user_id)).await
    }

    /// Lists a user's friends.
    pub async fn friends(&self, user_id: u64, query: FriendsQuery) -> Result<Option<Value>> {
        let params = query.to_params();
        self.request(&format!("users/{}/friends", user_id), Some(&params), Method::GET)
            .await
    }

    /// Checks whether each of `user_ids` is a friend of `user_id`.
    pub async fn friendship<I>(&self, user_id: u64, user_ids: I) -> Result<Option<Value>>
    where
        I: IntoIterator<Item = u64>,
    {
        let ids = join_display(user_ids, ";");
        self.get(&format!("users/{}/friends/{}", user_id, ids)).await
    }

    /// Lists the groups a user belongs to.
    pub async fn groups(&self, user_id: u64) -> Result<Option<Value>> {
        self.get(&format!("users/{}/groups", user_id)).await
    }

    /// Looks up a user's notification indicators.
    pub async fn indicators(&self, user_id: u64) -> Result<Option<Value>> {
        self.get(&format!("users/{}/indicators", user_id)).await
    }

    /// Looks up a user's listed interests.
    pub async fn interests(&self, user_id: u64) -> Result<Option<Value>> {
        self.get(&format!("users/{}/interests", user_id)).await
    }

    /// Looks up a user's mood.
    pub async fn mood(&self, user_id: u64) -> Result<Option<Value>> {
        self.get(&format!("users/{}/mood", user_id)).await
    }

    /// Sets a user's mood.
    pub async fn set_mood(&self, user_id: u64, mood: &str) -> Result<Option<Value>> {
        let params = ParamList::new().add_param("mood", mood.to_string());
        self.request(&format!("users/{}/mood", user_id), Some(&params), Method::PUT)
            .await
    }

    /// Looks up a single photo.
    pub async fn photo(&self, user_id: u64, photo_id: u64) -> Result<Option<Value>> {
        self.get(&format!("users/{}/photos/{}", user_id, photo_id))
            .await
    }

    /// Lists a user's photos.
    pub async fn photos(&self, user_id: u64) -> Result<Option<Value>> {
        self.get(&format!("users/{}/photos", user_id)).await
    }

    /// Looks up a user's profile.
    pub async fn profile(&self, user_id: u64) -> Result<Option<Value>> {
        self.get(&format!("users/{}/profile", user_id)).await
    }

    /// Looks up a user's status message.
    pub async fn status(&self, user_id: u64) -> Result<Option<Value>> {
        self.get(&format!("users/{}/status", user_id)).await
    }

    /// Looks up a user.
    pub async fn user(&self, user_id: u64) -> Result<Option<Value>> {
        self.get(&format!("users/{}", user_id)).await
    }

    /// Looks up a single video.
    pub async fn video(&self, user_id: u64, video_id: u64) -> Result<Option<Value>> {
        self.get(&format!("users/{}/videos/{}", user_id, video_id))
            .await
    }

    /// Lists a user's videos.
    pub async fn videos(&self, user_id: u64) -> Result<Option<Value>> {
        self.get(&format!("users/{}/videos", user_id)).await
    }
}
