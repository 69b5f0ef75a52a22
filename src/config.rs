use std::collections::HashMap;
use std::time::Duration;

use config::Environment;
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/mix";
pub const DEFAULT_BRIDGE_URL: &str = "ws://127.0.0.1:9300/bridge";

const ENV_PREFIX: &str = "MASHUP";

/// Raw settings as read from the environment, e.g. `MASHUP_DEFAULT_VOLUME=70`
/// sets `default_volume`. Checked and turned into a [`Config`] by
/// [`Settings::validate`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    pub bridge_url: String,
    pub poll_interval_ms: u64,
    pub default_volume: u8,
    pub video_rate: f64,
    pub http_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            bridge_url: DEFAULT_BRIDGE_URL.to_string(),
            poll_interval_ms: 500,
            default_volume: 50,
            video_rate: 1.5,
            http_timeout_secs: 10,
        }
    }
}

impl Settings {
    pub fn validate(self) -> Result<Config> {
        let api_base_url = base_url(&self.api_base_url).map_err(|_| Error::Config {
            key: "MASHUP_API_BASE_URL",
            value: self.api_base_url.clone(),
        })?;

        let bridge_url = match Url::parse(&self.bridge_url) {
            Ok(url) if matches!(url.scheme(), "ws" | "wss") => url,
            _ => {
                return Err(Error::Config {
                    key: "MASHUP_BRIDGE_URL",
                    value: self.bridge_url,
                })
            }
        };
        if self.poll_interval_ms == 0 {
            return Err(Error::Config {
                key: "MASHUP_POLL_INTERVAL_MS",
                value: self.poll_interval_ms.to_string(),
            });
        }
        if self.default_volume > 100 {
            return Err(Error::Config {
                key: "MASHUP_DEFAULT_VOLUME",
                value: self.default_volume.to_string(),
            });
        }
        if !self.video_rate.is_finite() || self.video_rate <= 0.0 {
            return Err(Error::Config {
                key: "MASHUP_VIDEO_RATE",
                value: self.video_rate.to_string(),
            });
        }

        Ok(Config {
            api_base_url,
            bridge_url,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            default_volume: self.default_volume,
            video_playback_rate: self.video_rate,
            http_timeout: Duration::from_secs(self.http_timeout_secs),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Always ends with `/` so endpoints can be joined onto it.
    pub api_base_url: Url,
    pub bridge_url: Url,
    pub poll_interval: Duration,
    pub default_volume: u8,
    pub video_playback_rate: f64,
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Settings::default()
            .validate()
            .expect("default settings are valid")
    }
}

impl Config {
    /// Defaults overridden by `MASHUP_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::load(Environment::with_prefix(ENV_PREFIX))
    }

    /// Same as [`Config::from_env`], reading from `vars` instead of the
    /// process environment.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::load(Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
    }

    fn load(environment: Environment) -> Result<Self> {
        let settings: Settings = config::Config::builder()
            .add_source(environment)
            .build()?
            .try_deserialize()?;
        settings.validate()
    }
}

fn base_url(raw: &str) -> std::result::Result<Url, url::ParseError> {
    if raw.ends_with('/') {
        Url::parse(raw)
    } else {
        Url::parse(&format!("{}/", raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_match_the_web_client() {
        let config = Config::from_vars(vars(&[])).unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://localhost:8080/api/mix/");
        assert_eq!(config.bridge_url.as_str(), DEFAULT_BRIDGE_URL);
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.default_volume, 50);
        assert_eq!(config.video_playback_rate, 1.5);
        assert_eq!(config.http_timeout, Duration::from_secs(10));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = Config::from_vars(vars(&[
            ("MASHUP_POLL_INTERVAL_MS", "250"),
            ("MASHUP_DEFAULT_VOLUME", "70"),
            ("MASHUP_VIDEO_RATE", "2"),
            ("MASHUP_HTTP_TIMEOUT_SECS", "3"),
            ("MASHUP_BRIDGE_URL", "wss://player.example/bridge"),
        ]))
        .unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.default_volume, 70);
        assert_eq!(config.video_playback_rate, 2.0);
        assert_eq!(config.http_timeout, Duration::from_secs(3));
        assert_eq!(config.bridge_url.scheme(), "wss");
    }

    #[test]
    fn unrelated_variables_are_ignored() {
        let config = Config::from_vars(vars(&[("OTHER_DEFAULT_VOLUME", "90")])).unwrap();
        assert_eq!(config.default_volume, 50);
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let config =
            Config::from_vars(vars(&[("MASHUP_API_BASE_URL", "http://backend:9000/api/mix")]))
                .unwrap();
        assert_eq!(
            config.api_base_url.join("random").unwrap().as_str(),
            "http://backend:9000/api/mix/random"
        );
    }

    #[test]
    fn rejects_out_of_range_volume() {
        let err = Config::from_vars(vars(&[("MASHUP_DEFAULT_VOLUME", "150")])).unwrap_err();
        assert!(matches!(err, Error::Config { key: "MASHUP_DEFAULT_VOLUME", .. }));
    }

    #[test]
    fn rejects_unparseable_numbers() {
        let err = Config::from_vars(vars(&[("MASHUP_POLL_INTERVAL_MS", "soon")])).unwrap_err();
        assert!(matches!(err, Error::Settings(_)));
    }

    #[test]
    fn rejects_non_websocket_bridge() {
        let err =
            Config::from_vars(vars(&[("MASHUP_BRIDGE_URL", "http://localhost:9300")])).unwrap_err();
        assert!(matches!(err, Error::Config { key: "MASHUP_BRIDGE_URL", .. }));
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let err = Config::from_vars(vars(&[("MASHUP_POLL_INTERVAL_MS", "0")])).unwrap_err();
        assert!(matches!(err, Error::Config { key: "MASHUP_POLL_INTERVAL_MS", .. }));
    }

    #[test]
    fn rejects_non_positive_rate() {
        let err = Config::from_vars(vars(&[("MASHUP_VIDEO_RATE", "-1.5")])).unwrap_err();
        assert!(matches!(err, Error::Config { key: "MASHUP_VIDEO_RATE", .. }));
    }
}
