// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Signed REST clients for Facebook's legacy REST server and the MySpace apps API.
//!
//! This library covers the two halves of building an app on either platform: signing the calls
//! your app makes, and checking the signatures on the requests the platform makes to your app.
//!
//! To start using this library, you need the credentials the platform issued when you
//! registered your app. Facebook calls these the API key and secret; MySpace calls them the
//! "Application Uri" and "Security Key", which act as an OAuth consumer key and secret. Both are
//! held as a [`Secret`], which never prints its value.
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() -> social_rest::error::Result<()> {
//! use social_rest::facebook::FacebookClient;
//! use social_rest::myspace::Consumer;
//!
//! let facebook = FacebookClient::new("api-key", "api-secret");
//! let session = facebook.auth_get_session("auth-token").await?;
//!
//! let myspace = Consumer::new("http://www.myspace.com/my_app", "security-key");
//! let friends = myspace.friends(28568917, Default::default()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! The credentials can also be kept in a YAML file; see the [`config`] module.
//!
//! # Modules
//!
//! * [`facebook`]: `FacebookClient` for calling REST methods, and `validate` for checking the
//!   `fb_sig` parameters Facebook sends to canvas pages and callbacks.
//! * [`myspace`]: `Consumer` for calling the MySpace REST resources, `AppData` for the app's
//!   key-value storage, and `Verifier` for checking inbound OAuth signatures.
//! * [`web`]: a middleware that verifies inbound MySpace requests and hands handlers a
//!   `MySpaceContext`, plus guards for "signed" and "app installed".
//! * [`raw`]: the signing and transport primitives underneath, for calls the clients don't wrap.
//!
//! Every network call is async, runs on tokio through hyper, and is bounded by a timeout that
//! defaults to 30 seconds. Failures come back as the crate's [`Error`] type and are never
//! retried. The library logs through `tracing` and installs no subscriber of its own.
//!
//! [`Secret`]: struct.Secret.html
//! [`config`]: config/index.html
//! [`facebook`]: facebook/index.html
//! [`myspace`]: myspace/index.html
//! [`web`]: web/index.html
//! [`raw`]: raw/index.html
//! [`Error`]: error/enum.Error.html

mod common;
pub mod config;
pub mod error;
pub mod facebook;
mod links;
pub mod myspace;
pub mod raw;
mod secret;
pub mod web;

pub use crate::common::DEFAULT_TIMEOUT;
pub use crate::error::{Error, Result};
pub use crate::secret::Secret;
