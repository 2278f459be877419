use std::env;

pub struct Config {
    pub port: u16,
    pub db_path: String,
    pub issuer_sk_hex: String,
    pub service_token: Option<String>,
    pub ledger_adapter_url: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let issuer_sk_hex = env::var("ISSUER_PRIVATE_KEY_HEX")
            .map_err(|_| anyhow::anyhow!("ISSUER_PRIVATE_KEY_HEX is required"))?;
        Ok(Config {
            port: env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8081),
            db_path: env::var("CERT_DB_PATH").unwrap_or_else(|_| "certificate-authority.redb".to_string()),
            issuer_sk_hex,
            service_token: env::var("SERVICE_AUTH_TOKEN").ok(),
            ledger_adapter_url: env::var("LEDGER_ADAPTER_URL").ok(),
        })
    }
}
