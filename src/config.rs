use std::{env, str::FromStr, time::Duration};

use anyhow::{bail, Context};

pub const DEFAULT_AIRTABLE_API_URL: &str = "https://api.airtable.com/v0";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_MOCK_SEED: u64 = 2024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Airtable,
    Postgres,
    Mock,
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "airtable" => Ok(SourceKind::Airtable),
            "postgres" | "postgresql" => Ok(SourceKind::Postgres),
            "mock" => Ok(SourceKind::Mock),
            other => Err(format!("unknown data source {other:?}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub source: SourceKind,
    pub airtable_api_key: Option<String>,
    pub airtable_base_id: Option<String>,
    pub airtable_api_url: String,
    pub database_url: Option<String>,
    /// How long a fetched table is served from the cache.
    pub cache_ttl: Duration,
    pub mock_seed: u64,
}

/// Loads `.env` if present, then reads the process environment.
pub fn load() -> anyhow::Result<Config> {
    let _ = dotenvy::dotenv();
    Config::from_lookup(|key| env::var(key).ok())
}

impl Config {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let airtable_api_key = var("AIRTABLE_API_KEY");
        let airtable_base_id = var("AIRTABLE_BASE_ID");
        let airtable_api_url =
            var("AIRTABLE_API_URL").unwrap_or_else(|| DEFAULT_AIRTABLE_API_URL.to_string());
        let database_url = var("DATABASE_URL");

        let force_mock = var("DASHBOARD_USE_MOCK").is_some_and(|value| truthy(&value));
        let source = if force_mock {
            SourceKind::Mock
        } else if let Some(name) = var("DASHBOARD_SOURCE") {
            name.parse::<SourceKind>()
                .map_err(anyhow::Error::msg)
                .context("DASHBOARD_SOURCE must be airtable, postgres or mock")?
        } else if airtable_api_key.is_some() && airtable_base_id.is_some() {
            SourceKind::Airtable
        } else {
            SourceKind::Mock
        };

        match source {
            SourceKind::Airtable if airtable_api_key.is_none() || airtable_base_id.is_none() => {
                bail!("AIRTABLE_API_KEY and AIRTABLE_BASE_ID must be set for the airtable source")
            }
            SourceKind::Postgres if database_url.is_none() => {
                bail!("DATABASE_URL must be set for the postgres source")
            }
            _ => {}
        }

        let cache_ttl_secs = match var("DASHBOARD_CACHE_TTL_SECS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .context("DASHBOARD_CACHE_TTL_SECS must be a whole number of seconds")?,
            None => DEFAULT_CACHE_TTL_SECS,
        };

        let mock_seed = match var("DASHBOARD_MOCK_SEED") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .context("DASHBOARD_MOCK_SEED must be an unsigned integer")?,
            None => DEFAULT_MOCK_SEED,
        };

        Ok(Self {
            source,
            airtable_api_key,
            airtable_base_id,
            airtable_api_url,
            database_url,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            mock_seed,
        })
    }
}

fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
