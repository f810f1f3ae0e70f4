use serde::Deserialize;
use std::env;

use crate::constants::{DEFAULT_ACTIONS_LOG_TABLE, DEFAULT_USERS_TABLE};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Supabase REST
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub users_table: String,
    pub actions_log_table: String,

    // CORS
    pub cors_allowed_origins: String,
}

/// Reads `primary`, falling back to the `NEXT_PUBLIC_` name the mini-app frontend
/// deployment exports.
fn env_with_fallback(primary: &str, fallback: &str) -> Option<String> {
    env::var(primary)
        .ok()
        .or_else(|| env::var(fallback).ok())
        .filter(|value| !value.trim().is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            supabase_url: env_with_fallback("SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL")
                .ok_or_else(|| anyhow::anyhow!("SUPABASE_URL is not set"))?,
            supabase_anon_key: env_with_fallback(
                "SUPABASE_ANON_KEY",
                "NEXT_PUBLIC_SUPABASE_ANON_KEY",
            )
            .ok_or_else(|| anyhow::anyhow!("SUPABASE_ANON_KEY is not set"))?,
            users_table: env::var("USERS_TABLE")
                .unwrap_or_else(|_| DEFAULT_USERS_TABLE.to_string()),
            actions_log_table: env::var("ACTIONS_LOG_TABLE")
                .unwrap_or_else(|_| DEFAULT_ACTIONS_LOG_TABLE.to_string()),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = self.supabase_url.trim();
        if url.is_empty() {
            anyhow::bail!("SUPABASE_URL is empty");
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!("SUPABASE_URL must start with http:// or https://");
        }
        if self.supabase_anon_key.trim().is_empty() {
            anyhow::bail!("SUPABASE_ANON_KEY is empty");
        }
        if self.users_table.trim().is_empty() || self.actions_log_table.trim().is_empty() {
            anyhow::bail!("Table names must not be empty");
        }

        if url.starts_with("http://") && self.environment == "production" {
            tracing::warn!("Supabase URL is not using TLS in production");
        }

        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 3000,
        environment: "test".to_string(),
        supabase_url: "https://example.supabase.co".to_string(),
        supabase_anon_key: "anon-key".to_string(),
        users_table: DEFAULT_USERS_TABLE.to_string(),
        actions_log_table: DEFAULT_ACTIONS_LOG_TABLE.to_string(),
        cors_allowed_origins: "*".to_string(),
    }
}
