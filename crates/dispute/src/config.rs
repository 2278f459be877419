use std::env;

pub struct Config {
    pub port: u16,
    pub db_path: String,
    pub service_token: Option<String>,
    pub assign_allowed_roles: Option<String>,
    pub resolve_allowed_roles: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            port: env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8087),
            db_path: env::var("DISPUTE_DB_PATH").unwrap_or_else(|_| "dispute.redb".to_string()),
            service_token: env::var("SERVICE_AUTH_TOKEN").ok(),
            assign_allowed_roles: env::var("DISPUTE_ASSIGN_ALLOWED_ROLES").ok(),
            resolve_allowed_roles: env::var("DISPUTE_RESOLVE_ALLOWED_ROLES").ok(),
        }
    }
}
