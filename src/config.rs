use reqwest::Url;
use std::env;
use std::time::Duration;

use crate::error::{BotError, Result};
use crate::fetcher::GOOGLE_SEARCH_URL;
use crate::telegram::DEFAULT_API_URL;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_WORKERS: usize = 8;
const DEFAULT_QUEUE_CAPACITY: usize = 64;
const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub telegram_token: String,
    /// Public base url for the webhook. `None` means long polling.
    pub webhook_host: Option<Url>,
    pub port: u16,
    pub search_url: String,
    pub search_timeout: Duration,
    pub workers: usize,
    pub queue_capacity: usize,
    pub telegram_api_url: String,
}

impl Config {
    /// Reads the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Config> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let telegram_token = get("TELEGRAMBOT_TOKEN")
            .ok_or_else(|| BotError::Config("TELEGRAMBOT_TOKEN is not set".to_string()))?;

        let webhook_host = get("WEBHOOK_HOST")
            .map(|raw| parse_webhook_host(&raw))
            .transpose()?;

        Ok(Config {
            telegram_token,
            webhook_host,
            port: parse_or("PORT", get("PORT"), DEFAULT_PORT)?,
            search_url: get("SEARCH_URL").unwrap_or_else(|| GOOGLE_SEARCH_URL.to_string()),
            search_timeout: Duration::from_secs(parse_or(
                "SEARCH_TIMEOUT_SECS",
                get("SEARCH_TIMEOUT_SECS"),
                DEFAULT_SEARCH_TIMEOUT_SECS,
            )?),
            workers: non_zero("BOT_WORKERS", parse_or("BOT_WORKERS", get("BOT_WORKERS"), DEFAULT_WORKERS)?)?,
            queue_capacity: non_zero(
                "BOT_QUEUE_CAPACITY",
                parse_or("BOT_QUEUE_CAPACITY", get("BOT_QUEUE_CAPACITY"), DEFAULT_QUEUE_CAPACITY)?,
            )?,
            telegram_api_url: get("TELEGRAM_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        })
    }

    /// Full url Telegram should post updates to: `<webhook_host>/<token>`.
    pub fn webhook_url(&self) -> Option<String> {
        self.webhook_host.as_ref().map(|host| {
            format!(
                "{}/{}",
                host.as_str().trim_end_matches('/'),
                self.telegram_token
            )
        })
    }
}

fn parse_webhook_host(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| BotError::Config(format!("bad WEBHOOK_HOST {raw}: {e}")))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(BotError::Config(format!(
            "bad WEBHOOK_HOST {raw}: scheme must be http or https"
        )));
    }
    Ok(url)
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| BotError::Config(format!("{key} has an invalid value: {v}"))),
        None => Ok(default),
    }
}

fn non_zero(key: &str, value: usize) -> Result<usize> {
    if value == 0 {
        return Err(BotError::Config(format!("{key} must be greater than zero")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("TELEGRAMBOT_TOKEN", "123:abc")])).unwrap();
        assert_eq!(config.telegram_token, "123:abc");
        assert_eq!(config.webhook_host, None);
        assert_eq!(config.port, 8080);
        assert_eq!(config.search_url, GOOGLE_SEARCH_URL);
        assert_eq!(config.workers, 8);
        assert_eq!(config.queue_capacity, 64);
        assert_eq!(config.webhook_url(), None);
    }

    #[test]
    fn test_missing_token() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, BotError::Config(_)));
        let err = Config::from_lookup(lookup(&[("TELEGRAMBOT_TOKEN", "  ")])).unwrap_err();
        assert!(matches!(err, BotError::Config(_)));
    }

    #[test]
    fn test_webhook_mode() {
        let config = Config::from_lookup(lookup(&[
            ("TELEGRAMBOT_TOKEN", "123:abc"),
            ("WEBHOOK_HOST", "https://bot.example.com/"),
            ("PORT", "8443"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8443);
        assert_eq!(
            config.webhook_url().as_deref(),
            Some("https://bot.example.com/123:abc")
        );
    }

    #[test]
    fn test_bad_webhook_host() {
        for host in ["bot.example.com", "ftp://bot.example.com"] {
            let err = Config::from_lookup(lookup(&[
                ("TELEGRAMBOT_TOKEN", "123:abc"),
                ("WEBHOOK_HOST", host),
            ]))
            .unwrap_err();
            assert!(matches!(err, BotError::Config(_)), "{host}");
        }
    }

    #[test]
    fn test_bad_numbers() {
        let err = Config::from_lookup(lookup(&[("TELEGRAMBOT_TOKEN", "t"), ("PORT", "http")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
        let err = Config::from_lookup(lookup(&[("TELEGRAMBOT_TOKEN", "t"), ("BOT_WORKERS", "0")])).unwrap_err();
        assert!(err.to_string().contains("BOT_WORKERS"));
    }
}
