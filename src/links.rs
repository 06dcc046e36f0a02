// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

pub mod facebook {
    pub const REST_SERVER: &'static str = "http://api.facebook.com/restserver.php";
    pub const API_VERSION: &'static str = "1.0";
    pub const DEFAULT_FORMAT: &'static str = "JSON";

    /// Name of the signature field on signed canvas/callback parameters.
    pub const SIG_FIELD: &'static str = "fb_sig";
    /// Prefix shared by every signed canvas/callback parameter.
    pub const SIG_PREFIX: &'static str = "fb_sig_";

    pub mod methods {
        pub const AUTH_GET_SESSION: &'static str = "facebook.auth.getSession";
        pub const USERS_GET_INFO: &'static str = "facebook.users.getInfo";
        pub const PROFILE_SET_FBML: &'static str = "facebook.profile.setFBML";
    }
}

pub mod myspace {
    pub const SERVER: &'static str = "api.myspace.com";
    pub const PORT: u16 = 80;
    pub const VERSION: &'static str = "v1";

    pub const GLOBAL_APPDATA: &'static str = "appdata/global";

    pub const OWNER_ID: &'static str = "opensocial_owner_id";
    pub const VIEWER_ID: &'static str = "opensocial_viewer_id";
}

pub mod oauth {
    pub const CONSUMER_KEY: &'static str = "oauth_consumer_key";
    pub const NONCE: &'static str = "oauth_nonce";
    pub const SIGNATURE: &'static str = "oauth_signature";
    pub const SIGNATURE_METHOD: &'static str = "oauth_signature_method";
    pub const TIMESTAMP: &'static str = "oauth_timestamp";
    pub const TOKEN: &'static str = "oauth_token";
    pub const VERSION: &'static str = "oauth_version";

    pub const HMAC_SHA1: &'static str = "HMAC-SHA1";
    pub const PROTOCOL_VERSION: &'static str = "1.0";

    /// Default maximum age of an inbound request timestamp, in seconds.
    pub const FRESHNESS_WINDOW_SECS: i64 = 15 * 60;
}
