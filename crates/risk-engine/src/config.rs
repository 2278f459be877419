use std::env;

pub struct Config {
    pub port: u16,
    pub db_path: String,
    pub service_token: Option<String>,
    pub alert_threshold: u32,
    pub alert_webhook_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            port: env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8085),
            db_path: env::var("RISK_DB_PATH").unwrap_or_else(|_| "risk-engine.redb".to_string()),
            service_token: env::var("SERVICE_AUTH_TOKEN").ok(),
            alert_threshold: env::var("RISK_ALERT_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(60),
            alert_webhook_url: env::var("RISK_ALERT_WEBHOOK_URL").ok(),
        }
    }
}
