//! Runtime settings read from the environment.
//!
//! - `OPTIMA_API_URL`: backend host, default `http://127.0.0.1:5000`
//! - `SUPABASE_URL` and `SUPABASE_ANON_KEY` (or `SUPABASE_KEY`): sign-up provider
//! - `OPTIMA_REDIRECT_DELAY_MS`: default 1000
//! - `OPTIMA_REQUEST_TIMEOUT_SECS`: default 30, `0` disables the timeout
//! - `OPTIMA_TOAST_SECS`: default 4

use std::time::Duration;

use log::warn;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_REDIRECT_DELAY_MS: u64 = 1000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TOAST_SECS: u64 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub provider: Option<ProviderConfig>,
    pub redirect_delay: Duration,
    pub request_timeout: Option<Duration>,
    pub toast_duration: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Loads an optional `.env` first, then reads the process environment.
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                warn!("Ignoring unreadable .env file: {}", e);
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("OPTIMA_API_URL")
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let provider_url = lookup("SUPABASE_URL").filter(|url| !url.trim().is_empty());
        let anon_key = lookup("SUPABASE_ANON_KEY")
            .or_else(|| lookup("SUPABASE_KEY"))
            .filter(|key| !key.trim().is_empty());
        let provider = match (provider_url, anon_key) {
            (Some(url), Some(anon_key)) => Some(ProviderConfig {
                url: url.trim_end_matches('/').to_string(),
                anon_key,
            }),
            _ => None,
        };

        let redirect_delay = Duration::from_millis(parse_u64(
            &lookup,
            "OPTIMA_REDIRECT_DELAY_MS",
            DEFAULT_REDIRECT_DELAY_MS,
        ));
        let request_timeout = match parse_u64(
            &lookup,
            "OPTIMA_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        ) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let toast_duration =
            Duration::from_secs(parse_u64(&lookup, "OPTIMA_TOAST_SECS", DEFAULT_TOAST_SECS));

        Self {
            api_url,
            provider,
            redirect_delay,
            request_timeout,
            toast_duration,
        }
    }
}

fn parse_u64<F>(lookup: &F, key: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} is not a number ({:?}), using {}", key, raw, default);
            default
        }),
        None => default,
    }
}
