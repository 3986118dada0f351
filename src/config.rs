use anyhow::{bail, Context};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::session::{SearchBackend, SearchSession, DEFAULT_DEBOUNCE};

pub const DEFAULT_BIND: &str = "0.0.0.0:4003";
pub const DEFAULT_SEED_PATH: &str = "data/seed.json";

/// Where listings come from
#[derive(Debug, Clone, PartialEq)]
pub enum StoreConfig {
    /// Hosted PostgREST endpoint
    Rest {
        url: String,
        api_key: Option<String>,
        timeout: Duration,
    },
    /// In-process store loaded from a seed file
    Seed { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind: String,
    pub store: StoreConfig,
    pub profile_cache_ttl: Duration,
    pub debounce: Duration,
}

impl Config {
    /// Read `EXPLORE_*` variables. Unset variables take defaults; malformed ones are an error.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind = var("EXPLORE_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let timeout = Duration::from_secs(number(&var, "EXPLORE_STORE_TIMEOUT_SECS", 30)?);
        if timeout.is_zero() {
            bail!("EXPLORE_STORE_TIMEOUT_SECS must be positive");
        }

        let store = match var("EXPLORE_STORE_URL") {
            Some(url) => StoreConfig::Rest {
                url,
                api_key: var("EXPLORE_STORE_KEY"),
                timeout,
            },
            None => StoreConfig::Seed {
                path: var("EXPLORE_SEED_PATH")
                    .unwrap_or_else(|| DEFAULT_SEED_PATH.to_string())
                    .into(),
            },
        };

        let default_debounce = DEFAULT_DEBOUNCE.as_millis() as u64;
        Ok(Self {
            bind,
            store,
            profile_cache_ttl: Duration::from_secs(number(
                &var,
                "EXPLORE_PROFILE_CACHE_TTL_SECS",
                300,
            )?),
            debounce: Duration::from_millis(number(&var, "EXPLORE_DEBOUNCE_MS", default_debounce)?),
        })
    }

    /// Search session over `backend` using the configured debounce window
    pub fn session<B: SearchBackend>(&self, backend: Arc<B>) -> SearchSession<B> {
        SearchSession::with_debounce(backend, self.debounce)
    }
}

fn number(var: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> anyhow::Result<u64> {
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a whole number, got {:?}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_use_the_seed_store() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind, DEFAULT_BIND);
        assert_eq!(
            config.store,
            StoreConfig::Seed {
                path: PathBuf::from(DEFAULT_SEED_PATH)
            }
        );
        assert_eq!(config.profile_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.debounce, Duration::from_millis(350));
    }

    #[test]
    fn store_url_selects_the_rest_store() {
        let config = config(&[
            ("EXPLORE_STORE_URL", "https://db.example.ng/rest/v1"),
            ("EXPLORE_STORE_KEY", "anon"),
            ("EXPLORE_STORE_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(
            config.store,
            StoreConfig::Rest {
                url: "https://db.example.ng/rest/v1".to_string(),
                api_key: Some("anon".to_string()),
                timeout: Duration::from_secs(5),
            }
        );
    }

    #[test]
    fn sessions_take_the_configured_debounce() {
        use crate::explore::{Explorer, PlaceholderCounters, ProfileCache};
        use crate::store::MemoryStore;

        let config = config(&[("EXPLORE_DEBOUNCE_MS", "120")]).unwrap();
        let store = Arc::new(MemoryStore::default());
        let profiles = Arc::new(ProfileCache::new(store.clone(), config.profile_cache_ttl));
        let explorer = Explorer::over(store, profiles, Arc::new(PlaceholderCounters));

        let session = config.session(Arc::new(explorer));
        assert_eq!(session.debounce(), Duration::from_millis(120));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = config(&[("EXPLORE_DEBOUNCE_MS", "fast")]).unwrap_err();
        assert!(err.to_string().contains("EXPLORE_DEBOUNCE_MS"));
        assert!(config(&[("EXPLORE_STORE_TIMEOUT_SECS", "0")]).is_err());
    }
}
