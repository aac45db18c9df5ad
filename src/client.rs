//! Thin HTTP client for the exchange's public REST endpoints, with bounded
//! retries and rate-limit ban handling.

use crate::config::ClientConfig;
use crate::error::FetchError;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; SignalScreener/0.1)";
const BAN_PATTERN: &str = r"until\s+(\d+)";

pub struct BinanceClient {
    http: Client,
    base_url: String,
    retries: u32,
    backoff: Duration,
    max_ban_wait: Duration,
    ban_re: Regex,
}

impl BinanceClient {
    pub fn new(base_url: &str, config: &ClientConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            retries: config.retries.max(1),
            backoff: Duration::try_from_secs_f64(config.backoff_secs)
                .map_err(|e| anyhow::anyhow!("backoff {}s: {e}", config.backoff_secs))?,
            max_ban_wait: Duration::from_secs(config.max_ban_wait_secs),
            ban_re: Regex::new(BAN_PATTERN)?,
        })
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff * attempt
    }

    /// GETs `path` and decodes the body, retrying any failure with linear
    /// backoff until the attempt budget runs out.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let mut last = String::new();

        for attempt in 1..=self.retries {
            match self.attempt(&url, query).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    log::warn!("[{attempt}/{}] {path} failed: {err}", self.retries);
                    last = err.to_string();
                    if attempt < self.retries {
                        tokio::time::sleep(self.backoff(attempt)).await;
                    }
                }
            }
        }

        Err(FetchError::RetriesExhausted {
            attempts: self.retries,
            last,
        })
    }

    async fn attempt<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let response = self.http.get(url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::IM_A_TEAPOT || status == StatusCode::TOO_MANY_REQUESTS {
            if let Some(wait) = self.ban_wait(&body, chrono::Utc::now().timestamp_millis()) {
                log::warn!("rate limited, waiting {:.0}s", wait.as_secs_f64());
                tokio::time::sleep(wait).await;
            }
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: body.chars().take(120).collect(),
            });
        }

        decode_body(&body)
    }

    /// Time left on a `-1003` IP ban notice plus a 5 s margin, capped.
    fn ban_wait(&self, body: &str, now_ms: i64) -> Option<Duration> {
        if !body.contains("-1003") {
            return None;
        }
        let caps = self.ban_re.captures(body)?;
        let ban_until: i64 = caps.get(1)?.as_str().parse().ok()?;
        if ban_until <= now_ms {
            return None;
        }
        let wait = Duration::from_millis((ban_until - now_ms) as u64) + Duration::from_secs(5);
        Some(wait.min(self.max_ban_wait))
    }
}

/// Parses a response body, turning the provider's `{"code": .., "msg": ..}`
/// error payload into a `FetchError`.
pub fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, FetchError> {
    if body.trim().is_empty() {
        return Err(FetchError::Empty);
    }
    let value: Value = serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    if let Some(err) = provider_error(&value) {
        return Err(err);
    }
    serde_json::from_value(value).map_err(|e| FetchError::Decode(e.to_string()))
}

fn provider_error(value: &Value) -> Option<FetchError> {
    let obj = value.as_object()?;
    let code = obj.get("code")?.as_i64()?;
    let msg = obj
        .get("msg")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some(FetchError::Provider { code, msg })
}
