use std::env::var;
use std::str::FromStr;

use dotenvy::dotenv;

pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub redis_url: String,
    pub nats_url: String,
    pub nats_stream: String,
    pub nats_subject: String,
    pub nats_durable: String,
    pub pull_batch: usize,
    pub ack_wait_seconds: u64,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_from_number: String,
    pub twilio_api_base_url: String,
    pub twilio_content_base_url: String,
    pub status_callback_url: Option<String>,
    pub send_timeout_secs: u64,
    pub rate_limit_max_requests: u64,
    pub rate_limit_window_secs: u64,
    pub retry_max_attempts: u32,
    pub retry_backoff_secs: Vec<u64>,
}

impl Config {
    pub fn try_parse() -> Result<Config, String> {
        let _ = dotenv();

        Ok(Config {
            port: parsed_or("PORT", 8080)?,
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            nats_url: required("NATS_URL")?,
            nats_stream: or_default("NATS_STREAM", "sendhub"),
            nats_subject: or_default("NATS_SUBJECT", "sendhub.dispatch"),
            nats_durable: or_default("NATS_DURABLE", "dispatcher"),
            pull_batch: parsed_or("NATS_PULL_BATCH", 16)?,
            ack_wait_seconds: parsed_or("NATS_ACK_WAIT_SECONDS", 30)?,
            twilio_account_sid: required("TWILIO_ACCOUNT_SID")?,
            twilio_auth_token: required("TWILIO_AUTH_TOKEN")?,
            twilio_from_number: required("TWILIO_WHATSAPP_NUMBER")?,
            twilio_api_base_url: or_default("TWILIO_API_BASE_URL", "https://api.twilio.com"),
            twilio_content_base_url: or_default(
                "TWILIO_CONTENT_BASE_URL",
                "https://content.twilio.com/v1/Content",
            ),
            status_callback_url: var("TWILIO_STATUS_CALLBACK_URL").ok(),
            send_timeout_secs: parsed_or("SEND_TIMEOUT_SECS", 15)?,
            rate_limit_max_requests: parsed_or("RATE_LIMIT_MAX_REQUESTS", 50)?,
            rate_limit_window_secs: parsed_or("RATE_LIMIT_WINDOW_SECS", 3600)?,
            retry_max_attempts: parsed_or("RETRY_MAX_ATTEMPTS", 3)?,
            retry_backoff_secs: backoff_schedule("RETRY_BACKOFF_SECS", &[60, 120, 300])?,
        })
    }
}

fn required(name: &'static str) -> Result<String, String> {
    var(name).map_err(|_| format!("missing required env param {name}"))
}

fn or_default(name: &'static str, default: &str) -> String {
    var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed_or<T: FromStr>(name: &'static str, default: T) -> Result<T, String> {
    match var(name) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|_| format!("invalid value for env param {name}")),
        Err(_) => Ok(default),
    }
}

fn backoff_schedule(name: &'static str, default: &[u64]) -> Result<Vec<u64>, String> {
    match var(name) {
        Ok(value) => value
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<u64>()
                    .map_err(|_| format!("invalid value for env param {name}"))
            })
            .collect(),
        Err(_) => Ok(default.to_vec()),
    }
}
