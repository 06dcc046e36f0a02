// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Loading API credentials and endpoints from a YAML file.
//!
//! By default the file is `.social_rest.yml` in the current user's home directory. Both sections
//! are optional, so an app that only talks to one platform only needs that one:
//!
//! ```yaml
//! facebook:
//!   api_key: 0123456789abcdef
//!   secret: fedcba9876543210
//!   timeout_secs: 10
//! myspace:
//!   key: http://www.myspace.com/my_app
//!   secret: security-key
//!   app_profile: http://profile.myspace.com/my_app
//!   freshness_window_secs: 900
//! ```
//!
//! Each section is handed to the matching `from_config` constructor:
//! [`FacebookClient::from_config`], [`Consumer::from_config`] and
//! [`MySpaceMiddleware::from_config`].
//!
//! [`FacebookClient::from_config`]: ../facebook/struct.FacebookClient.html#method.from_config
//! [`Consumer::from_config`]: ../myspace/struct.Consumer.html#method.from_config
//! [`MySpaceMiddleware::from_config`]: ../web/struct.MySpaceMiddleware.html#method.from_config

use std::io;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::secret::Secret;

const CONFIG_FILE: &str = ".social_rest.yml";

/// The contents of a configuration file.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Config {
    pub facebook: Option<FacebookSection>,
    pub myspace: Option<MySpaceSection>,
}

/// Settings for a `FacebookClient`.
#[derive(Deserialize, Clone, Debug)]
pub struct FacebookSection {
    pub api_key: String,
    pub secret: Secret,
    /// REST server URL, if not the public one.
    pub endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Settings for a MySpace `Consumer` and the web middleware built on it.
#[derive(Deserialize, Clone, Debug)]
pub struct MySpaceSection {
    /// The "Application Uri".
    pub key: String,
    /// The "Security Key".
    pub secret: Secret,
    pub server: Option<String>,
    pub port: Option<u16>,
    pub version: Option<String>,
    /// Where `has_app` sends users who haven't added the app. Available to handlers through
    /// `MySpaceMiddleware::app_profile`.
    pub app_profile: Option<String>,
    pub freshness_window_secs: Option<i64>,
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Reads `.social_rest.yml` from the current user's home directory.
    pub fn from_default_file() -> Result<Config, ConfigReadError> {
        let mut home = dirs::home_dir().ok_or(ConfigReadError::NoHomeDir)?;
        home.push(CONFIG_FILE);
        Config::from_file(&home)
    }

    /// Reads the given file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Config, ConfigReadError> {
        let config_data = std::fs::read_to_string(path)?;
        Config::from_yaml(&config_data)
    }

    /// Parses configuration from a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Config, ConfigReadError> {
        let config: Config = serde_yml::from_str(yaml)?;
        tracing::debug!(
            facebook = config.facebook.is_some(),
            myspace = config.myspace.is_some(),
            "read configuration"
        );
        Ok(config)
    }

    /// Returns the `facebook` section, or an error naming it if it's absent.
    pub fn facebook(&self) -> Result<&FacebookSection, ConfigReadError> {
        self.facebook
            .as_ref()
            .ok_or(ConfigReadError::MissingSection("facebook"))
    }

    /// Returns the `myspace` section, or an error naming it if it's absent.
    pub fn myspace(&self) -> Result<&MySpaceSection, ConfigReadError> {
        self.myspace
            .as_ref()
            .ok_or(ConfigReadError::MissingSection("myspace"))
    }
}

/// All of the errors that can take place when reading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigReadError {
    #[error("File Read Error: {0}")]
    FileReadError(#[from] io::Error),
    #[error("Not a valid configuration file: {0}")]
    InvalidFile(#[from] serde_yml::Error),
    #[error("Could not determine the home directory")]
    NoHomeDir,
    #[error("Configuration section `{0}` is missing")]
    MissingSection(&'static str),
    #[error("Endpoint URL not valid: {0}")]
    InvalidUri(#[from] url::ParseError),
    #[error("Server host not valid: {0}")]
    InvalidHost(String),
    #[error("Freshness window must be a positive number of seconds, not {0}")]
    InvalidFreshnessWindow(i64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facebook::FacebookClient;
    use crate::myspace::Consumer;
    use crate::web::MySpaceMiddleware;

    const FULL: &str = "
facebook:
  api_key: fb-key
  secret: fb-secret
  endpoint: http://localhost:9000/restserver.php
  timeout_secs: 5
myspace:
  key: http://www.myspace.com/my_app
  secret: ms-secret
  server: localhost
  port: 8080
  app_profile: http://profile.myspace.com/my_app
";

    #[test]
    fn parse_full_file() {
        let config = Config::from_yaml(FULL).unwrap();

        let facebook = config.facebook().unwrap();
        assert_eq!(facebook.api_key, "fb-key");
        assert_eq!(facebook.secret.as_bytes(), b"fb-secret");
        assert_eq!(facebook.timeout_secs, Some(5));

        let myspace = config.myspace().unwrap();
        assert_eq!(myspace.port, Some(8080));
        assert_eq!(myspace.version, None);
        assert_eq!(myspace.freshness_window_secs, None);
    }

    #[test]
    fn debug_hides_secrets() {
        let config = Config::from_yaml(FULL).unwrap();
        let printed = format!("{:?}", config);

        assert!(!printed.contains("fb-secret"));
        assert!(!printed.contains("ms-secret"));
    }

    #[test]
    fn missing_section_returns_right_error() {
        let config = Config::from_yaml("facebook:\n  api_key: k\n  secret: s\n").unwrap();
        assert!(matches!(
            config.myspace(),
            Err(ConfigReadError::MissingSection("myspace"))
        ));
    }

    #[test]
    fn invalid_yaml_returns_right_error() {
        let result = Config::from_yaml("facebook: [unclosed");
        assert!(matches!(result, Err(ConfigReadError::InvalidFile(_))));

        let result = Config::from_yaml("myspace:\n  key: k\n");
        assert!(matches!(result, Err(ConfigReadError::InvalidFile(_))));
    }

    #[test]
    fn bad_file_path_returns_right_error() {
        let result = Config::from_file("no_such_file.yml");
        assert!(matches!(result, Err(ConfigReadError::FileReadError(_))));
    }

    #[test]
    fn invalid_endpoint_returns_right_error() {
        let section = FacebookSection {
            api_key: "k".to_string(),
            secret: Secret::from("s"),
            endpoint: Some("dfaedfaewrfaew".to_string()),
            timeout_secs: None,
        };
        assert!(matches!(
            FacebookClient::from_config(&section),
            Err(ConfigReadError::InvalidUri(_))
        ));
    }

    #[test]
    fn clients_from_sections() {
        let config = Config::from_yaml(FULL).unwrap();

        let client = FacebookClient::from_config(config.facebook().unwrap()).unwrap();
        assert_eq!(client.api_key(), "fb-key");

        let consumer = Consumer::from_config(config.myspace().unwrap()).unwrap();
        assert_eq!(
            consumer.resource_url("users/1"),
            "http://localhost:8080/v1/users/1.json"
        );
    }

    #[test]
    fn middleware_keeps_app_profile() {
        let config = Config::from_yaml(FULL).unwrap();
        let middleware = MySpaceMiddleware::from_config(config.myspace().unwrap()).unwrap();
        assert_eq!(middleware.app_profile(), Some("http://profile.myspace.com/my_app"));

        let middleware = MySpaceMiddleware::new("k", "s");
        assert_eq!(middleware.app_profile(), None);
    }

    #[test]
    fn out_of_range_freshness_window_returns_right_error() {
        for secs in &["100000000000000000", "-5", "0"] {
            let yaml = format!("myspace:\n  key: k\n  secret: s\n  freshness_window_secs: {}\n", secs);
            let config = Config::from_yaml(&yaml).unwrap();
            let expected: i64 = secs.parse().unwrap();

            match MySpaceMiddleware::from_config(config.myspace().unwrap()) {
                Err(ConfigReadError::InvalidFreshnessWindow(n)) => assert_eq!(n, expected),
                other => panic!("unexpected result for {}: {:?}", secs, other.map(|_| ())),
            }
        }

        let config = Config::from_yaml("myspace:\n  key: k\n  secret: s\n  freshness_window_secs: 60\n").unwrap();
        assert!(MySpaceMiddleware::from_config(config.myspace().unwrap()).is_ok());
    }

    #[test]
    fn invalid_host_returns_right_error() {
        let mut section = Config::from_yaml(FULL).unwrap().myspace.unwrap();
        section.server = Some("http://localhost/".to_string());

        assert!(matches!(
            Consumer::from_config(&section),
            Err(ConfigReadError::InvalidHost(_))
        ));
    }
}
