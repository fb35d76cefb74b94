use std::env;
use std::time::Duration;

use thiserror::Error;
use url::Url;

pub static LOGIN_VAR: &str = "FABRIC_API_LOGIN";
pub static PASSWORD_VAR: &str = "FABRIC_API_PASSWORD";
pub static URL_VAR: &str = "FABRIC_API_URL";
pub static TIMEOUT_VAR: &str = "FABRIC_API_TIMEOUT";

pub static DEFAULT_URL: &str = "https://api.fabricgenomics.com";
/// Whole request deadline for everything except genome uploads
pub static DEFAULT_TIMEOUT_SECS: u64 = 600;
/// Uploads have no overall deadline, only this bound on establishing the connection
pub static CONNECT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable missing")]
    MissingVariable(&'static str),
    #[error("FABRIC_API_URL is not a valid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("FABRIC_API_TIMEOUT must be a whole number of seconds, got {0:?}")]
    InvalidTimeout(String),
}

/// Connection settings shared by every request
///
/// Built once at start up and passed to the client, so nothing below `main` touches the
/// process environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: Url,
    pub login: String,
    pub password: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let password = lookup(PASSWORD_VAR).ok_or(ConfigError::MissingVariable(PASSWORD_VAR))?;
        let login = lookup(LOGIN_VAR).ok_or(ConfigError::MissingVariable(LOGIN_VAR))?;

        let raw_url = lookup(URL_VAR).unwrap_or_else(|| DEFAULT_URL.to_string());
        let base_url = Url::parse(raw_url.trim_end_matches('/'))?;

        let timeout = match lookup(TIMEOUT_VAR) {
            Some(secs) => secs
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidTimeout(secs))?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Config { base_url, login, password, timeout, connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS) })
    }

    /// Join path segments onto the base URL, keeping any path prefix the base URL carries
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_base_url_and_timeout() {
        let config = Config::from_lookup(lookup(&[(LOGIN_VAR, "me"), (PASSWORD_VAR, "secret")])).unwrap();
        assert_eq!(config.base_url.as_str(), "https://api.fabricgenomics.com/");
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.connect_timeout, Duration::from_secs(CONNECT_TIMEOUT_SECS));
        assert_eq!(config.login, "me");
    }

    #[test]
    fn missing_credentials_are_fatal() {
        let err = Config::from_lookup(lookup(&[(LOGIN_VAR, "me")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVariable(var) if var == PASSWORD_VAR));

        let err = Config::from_lookup(lookup(&[(PASSWORD_VAR, "secret")])).unwrap_err();
        assert_eq!(err.to_string(), "FABRIC_API_LOGIN environment variable missing");
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let config = Config::from_lookup(lookup(&[
            (LOGIN_VAR, "me"),
            (PASSWORD_VAR, "secret"),
            (URL_VAR, "https://api-test.example.com/v1/"),
            (TIMEOUT_VAR, "30"),
        ]))
        .unwrap();
        assert_eq!(
            config.endpoint(&["reports", "42", "variants"]).as_str(),
            "https://api-test.example.com/v1/reports/42/variants"
        );
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn rejects_bad_timeout() {
        let err = Config::from_lookup(lookup(&[
            (LOGIN_VAR, "me"),
            (PASSWORD_VAR, "secret"),
            (TIMEOUT_VAR, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(_)));
    }
}
