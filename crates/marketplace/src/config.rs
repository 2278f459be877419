use std::env;

pub struct Config {
    pub port: u16,
    pub db_path: String,
    pub service_token: Option<String>,
    pub certificate_service_url: Option<String>,
    pub reconciliation_service_url: Option<String>,
    pub risk_stream_url: Option<String>,
    pub dispute_service_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            port: env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8084),
            db_path: env::var("MARKETPLACE_DB_PATH").unwrap_or_else(|_| "marketplace.redb".to_string()),
            service_token: env::var("SERVICE_AUTH_TOKEN").ok(),
            certificate_service_url: env::var("CERTIFICATE_SERVICE_URL").ok(),
            reconciliation_service_url: env::var("RECONCILIATION_SERVICE_URL").ok(),
            risk_stream_url: env::var("RISK_STREAM_URL").ok(),
            dispute_service_url: env::var("DISPUTE_SERVICE_URL").ok(),
        }
    }
}
