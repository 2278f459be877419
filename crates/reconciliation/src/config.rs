use std::env;

pub struct Config {
    pub port: u16,
    pub db_path: String,
    pub service_token: Option<String>,
    pub certificate_service_url: Option<String>,
    pub risk_stream_url: Option<String>,
    pub custody_total_gram: Option<String>,
    pub mismatch_threshold_gram: String,
    pub unfreeze_allowed_roles: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            port: env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8086),
            db_path: env::var("RECON_DB_PATH").unwrap_or_else(|_| "reconciliation.redb".to_string()),
            service_token: env::var("SERVICE_AUTH_TOKEN").ok(),
            certificate_service_url: env::var("CERTIFICATE_SERVICE_URL").ok(),
            risk_stream_url: env::var("RISK_STREAM_URL").ok(),
            custody_total_gram: env::var("CUSTODY_TOTAL_GRAM").ok(),
            mismatch_threshold_gram: env::var("RECON_MISMATCH_THRESHOLD_GRAM").unwrap_or_else(|_| "0.5000".to_string()),
            unfreeze_allowed_roles: env::var("RECON_UNFREEZE_ALLOWED_ROLES").ok(),
        }
    }
}
