//! Process-scoped, init-time configuration (spec §9: "issuer secret, service
//! token, role allow-sets, and freeze singleton are process-scoped init-time
//! config; no runtime reload is specified").

use std::env;

pub struct Config {
    pub port: u16,
    pub db_path: String,
    pub service_token: Option<String>,
    pub risk_stream_url: Option<String>,
    pub chain_rpc_url: Option<String>,
    pub chain_registry_address: Option<String>,
    pub chain_signer_address: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            port: env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8082),
            db_path: env::var("CERT_DB_PATH").unwrap_or_else(|_| "ledger-adapter.redb".to_string()),
            service_token: env::var("SERVICE_AUTH_TOKEN").ok(),
            risk_stream_url: env::var("RISK_STREAM_URL").ok(),
            chain_rpc_url: env::var("CHAIN_RPC_URL").ok(),
            chain_registry_address: env::var("DGC_REGISTRY_ADDRESS").ok(),
            chain_signer_address: env::var("CHAIN_PRIVATE_KEY")
                .ok()
                .and_then(|sk| dgc_crypto::derive_pk(&sk).ok()),
        }
    }
}
