//! In-memory caching using moka
//!
//! Holds the stored pricing rule for each scope. Absence is cached too, so a
//! scope with no rule of its own does not hit the database on every lookup.

use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};

use crate::config::CacheConfig;
use crate::pricing::queries;
use crate::pricing::rules::{PricingRule, PricingRuleSettings, RuleScope};

/// Application cache
#[derive(Clone)]
pub struct AppCache {
    /// Stored rule per scope (scope -> rule, or None when the scope has none)
    pub rules: Cache<RuleScope, Option<PricingRule>>,
}

impl AppCache {
    /// Create a new cache instance with configured TTLs
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            rules: Cache::builder()
                .max_capacity(config.rule_capacity)
                .time_to_live(config.rule_ttl)
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            rules_size: self.rules.entry_count(),
        }
    }

    /// Replace the cached rule of one scope after a write.
    ///
    /// A lookup that read the row before the write may still insert the
    /// older value afterwards; it is corrected on the next write or after
    /// `rule_ttl`.
    pub async fn store_rule(&self, scope: RuleScope, rule: Option<PricingRule>) {
        self.rules.insert(scope, rule).await;
        info!("Rule cache updated for {}", scope);
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub rules_size: u64,
}

/// Start background cache warmer
///
/// Warms the cache on startup and refreshes on the configured interval.
pub async fn start_cache_warmer(cache: AppCache, db: PgPool, every: Duration) {
    let mut interval = interval(every);
    loop {
        // First tick completes immediately
        interval.tick().await;
        warm_cache(&cache, &db).await;
    }
}

/// Load every stored rule into the cache
async fn warm_cache(cache: &AppCache, db: &PgPool) {
    info!("Starting cache warm-up...");

    let rows = match queries::list_pricing_rules(db).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Failed to warm rule cache: {}", e);
            return;
        }
    };

    for row in rows {
        let scope = match RuleScope::parse(&row.scope_type, row.scope_id) {
            Ok(scope) => scope,
            Err(e) => {
                warn!("Skipping stored rule: {}", e);
                continue;
            }
        };
        let rule = PricingRuleSettings::try_from(row)
            .map_err(|e| e.to_string())
            .and_then(|settings| settings.to_rule().map_err(|e| e.to_string()));
        match rule {
            Ok(rule) => cache.rules.insert(scope, Some(rule)).await,
            Err(e) => warn!("Skipping stored rule for {}: {}", scope, e),
        }
    }

    info!("Cache warm-up complete. Stats: {:?}", cache.stats());
}
