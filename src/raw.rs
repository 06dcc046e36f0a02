// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Raw access to the request-signing and response-reading primitives used internally by
//! social-rest.
//!
//! The functions exposed here let you reach API methods that aren't wrapped by `FacebookClient`
//! or `Consumer`, or handle the responses yourself. In return, much more knowledge of each
//! platform's protocol is required to use them effectively.
//!
//! The functions in this module can be divided into two categories: assembling and signing a
//! request, and executing it to get a response.
//!
//! * For Facebook, `FacebookClient::sign_call` produces the complete signed parameter set of a
//!   call, and `facebook_signature` computes the signature of any parameter map. Inbound
//!   parameters are checked with `facebook_validate`.
//! * For MySpace, `myspace_request` assembles a fully signed `Request`, with its parameters
//!   placed in the query string or body according to the method. `myspace_signature` and
//!   `normalize_url` expose the pieces of the OAuth base string.
//!
//! Once you have a `Request`, hand it to one of the `response_*` functions:
//!
//! * `response_future` starts the request and hands off the `ResponseFuture` from `hyper`, giving
//!   you the most control over the response.
//! * `response_raw_bytes` drives the request to completion under a timeout and returns the
//!   response head and body bytes, without inspecting the status code.

pub use crate::common::ParamList;
pub use crate::common::percent_encode;

pub use crate::facebook::signature as facebook_signature;
pub use crate::facebook::validate as facebook_validate;
pub use crate::facebook::InboundParams;

pub use crate::myspace::normalize_url;
pub use crate::myspace::signature as myspace_signature;
pub use crate::myspace::signed_request as myspace_request;

pub use crate::common::get_response as response_future;
pub use crate::common::raw_request as response_raw_bytes;
