//! Optimization Cycle
//!
//! One pass of collect stats → decide → act → collect stats → emit.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::cache::{CacheStats, Store};
use crate::config::{OptimizerConfig, Region};
use crate::error::Result;
use crate::events::{EventSink, OptimizerEvent};
use crate::optimizer::{
    EvictionConfig, EvictionEngine, EvictionStrategy, PreloadConfig, PreloadEngine,
    PreloadStrategy, StatsCollector, TtlRebalancer,
};

/// Eviction fires when peak memory exceeds this share of `max_size`.
pub const MEMORY_PRESSURE_RATIO: f64 = 0.8;
/// Eviction target as a share of `max_size`.
pub const EVICTION_TARGET_RATIO: f64 = 0.7;
/// Preload fires below this hit rate.
pub const HIT_RATE_FLOOR: f64 = 0.8;
pub const PRELOAD_LIMIT: usize = 1000;
pub const PRELOAD_CONCURRENCY: usize = 5;
/// TTL assigned to entries below the floor.
pub const TTL_TARGET: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Resize,
    Evict,
    Preload,
    Ttl,
}

/// Expected effect in percent. Heuristic annotation, not a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Impact {
    pub memory: f64,
    pub hit_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub description: String,
    pub impact: Impact,
    /// Keys evicted, preloaded or re-expired by the action
    pub affected_keys: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheOptimizationResult {
    pub before: CacheStats,
    pub after: CacheStats,
    pub recommendations: Vec<Recommendation>,
}

impl CacheOptimizationResult {
    pub fn kinds(&self) -> Vec<RecommendationKind> {
        self.recommendations.iter().map(|r| r.kind).collect()
    }
}

// == Optimization Cycle ==
pub struct OptimizationCycle {
    collector: StatsCollector,
    eviction: EvictionEngine,
    preload: PreloadEngine,
    rebalancer: TtlRebalancer,
    sink: Arc<dyn EventSink>,
    policy: Arc<OptimizerConfig>,
}

impl OptimizationCycle {
    pub fn new(
        store: Arc<dyn Store>,
        sink: Arc<dyn EventSink>,
        policy: Arc<OptimizerConfig>,
    ) -> Self {
        Self {
            collector: StatsCollector::new(store.clone()),
            eviction: EvictionEngine::new(store.clone()),
            preload: PreloadEngine::new(store.clone()).with_policy(policy.clone()),
            rebalancer: TtlRebalancer::new(store).with_floor(policy.settings.ttl_floor),
            sink,
            policy,
        }
    }

    pub fn policy(&self) -> &OptimizerConfig {
        &self.policy
    }

    /// Runs one optimization pass over `region`.
    ///
    /// Branches run in order: evict, preload, TTL rebalance. Eviction and
    /// preload are triggered by the `before` snapshot; the TTL check reads the
    /// store as left by the earlier branches. Any `StoreUnavailable` aborts
    /// the pass without emitting.
    pub async fn run(&self, region: &Region) -> Result<CacheOptimizationResult> {
        match self.run_inner(region).await {
            Ok(result) => {
                info!(
                    region = %region.name,
                    recommendations = ?result.kinds(),
                    "Optimization cycle complete"
                );
                self.sink.emit(OptimizerEvent::Optimized(result.clone()));
                Ok(result)
            }
            Err(e) => {
                error!(
                    region = %region.name,
                    operation = "optimize",
                    error = %e,
                    "Optimization cycle failed"
                );
                Err(e)
            }
        }
    }

    async fn run_inner(&self, region: &Region) -> Result<CacheOptimizationResult> {
        let before = self.collector.collect(region).await?;
        let mut recommendations = Vec::new();
        let max_size = region.config.max_size as f64;

        if before.memory as f64 > max_size * MEMORY_PRESSURE_RATIO {
            let config = EvictionConfig {
                strategy: EvictionStrategy::Lru,
                threshold: (max_size * EVICTION_TARGET_RATIO) as u64,
                min_age: self.policy.settings.eviction_min_age,
            };
            let evicted = self.eviction.evict(region, &config).await?;
            recommendations.push(Recommendation {
                kind: RecommendationKind::Evict,
                description: format!(
                    "Evicted {} least recently used entries to bring usage under {} bytes",
                    evicted.len(),
                    config.threshold
                ),
                impact: Impact {
                    memory: -30.0,
                    hit_rate: -5.0,
                },
                affected_keys: evicted.len(),
            });

            let current = self.collector.collect(region).await?;
            if current.size > config.threshold {
                recommendations.push(Recommendation {
                    kind: RecommendationKind::Resize,
                    description: format!(
                        "Usage of {} bytes remains above the {} byte target; raise maxSize",
                        current.size, config.threshold
                    ),
                    impact: Impact {
                        memory: 0.0,
                        hit_rate: 0.0,
                    },
                    affected_keys: 0,
                });
            }
        }

        if before.hit_rate < HIT_RATE_FLOOR {
            let config = PreloadConfig {
                patterns: region.preload_patterns.clone(),
                strategy: PreloadStrategy::Popular,
                limit: PRELOAD_LIMIT,
                concurrency: PRELOAD_CONCURRENCY,
                deadline: self.policy.settings.preload_deadline_ms.map(Duration::from_millis),
            };
            let loaded = self.preload.preload(region, &config).await?;
            recommendations.push(Recommendation {
                kind: RecommendationKind::Preload,
                description: format!("Refreshed {} popular entries", loaded.len()),
                impact: Impact {
                    memory: 10.0,
                    hit_rate: 15.0,
                },
                affected_keys: loaded.len(),
            });
        }

        if self.rebalancer.should_rebalance(region).await? {
            let bumped = self.rebalancer.rebalance(region, TTL_TARGET).await?;
            recommendations.push(Recommendation {
                kind: RecommendationKind::Ttl,
                description: format!(
                    "Raised {} short TTLs to {} seconds",
                    bumped.len(),
                    TTL_TARGET
                ),
                impact: Impact {
                    memory: 0.0,
                    hit_rate: 10.0,
                },
                affected_keys: bumped.len(),
            });
        }

        let after = self.collector.collect(region).await?;
        Ok(CacheOptimizationResult {
            before,
            after,
            recommendations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::config::CacheConfig;
    use crate::events::MemorySink;

    fn setup(
        config: CacheConfig,
    ) -> (Arc<MemoryStore>, Arc<MemorySink>, OptimizationCycle, Region) {
        let store = Arc::new(MemoryStore::new(config.clone()));
        let sink = Arc::new(MemorySink::new());
        let policy = OptimizerConfig {
            cache: config,
            ..OptimizerConfig::default()
        };
        let region = policy.default_region();
        let cycle = OptimizationCycle::new(store.clone(), sink.clone(), Arc::new(policy));
        (store, sink, cycle, region)
    }

    #[tokio::test]
    async fn test_healthy_cache_produces_no_recommendations() {
        let (store, sink, cycle, region) = setup(CacheConfig {
            max_size: 10_000,
            max_age: 0,
            ..CacheConfig::default()
        });
        store.set("a", "1".to_string(), Some(3600)).await.unwrap();
        for _ in 0..10 {
            store.get("a").await.unwrap();
        }

        let result = cycle.run(&region).await.unwrap();

        assert!(result.recommendations.is_empty());
        assert_eq!(result.before, result.after);
        assert_eq!(sink.optimizations(), vec![result]);
    }

    #[tokio::test]
    async fn test_low_hit_rate_triggers_preload() {
        let (store, sink, cycle, region) = setup(CacheConfig {
            max_size: 10_000,
            max_age: 0,
            ..CacheConfig::default()
        });
        store.set("a", "1".to_string(), None).await.unwrap();
        store.get("missing").await.unwrap();

        let result = cycle.run(&region).await.unwrap();

        assert_eq!(result.kinds(), vec![RecommendationKind::Preload]);
        assert_eq!(result.recommendations[0].affected_keys, 1);
        assert_eq!(result.recommendations[0].impact.hit_rate, 15.0);
        assert_eq!(sink.optimizations().len(), 1);
    }

    #[tokio::test]
    async fn test_short_ttls_trigger_rebalance() {
        let (store, _sink, cycle, region) = setup(CacheConfig {
            max_size: 10_000,
            max_age: 0,
            ..CacheConfig::default()
        });
        store.set("a", "1".to_string(), Some(10)).await.unwrap();
        store.get("a").await.unwrap();

        let result = cycle.run(&region).await.unwrap();

        assert_eq!(result.kinds(), vec![RecommendationKind::Ttl]);
        assert_eq!(store.ttl("a").await.unwrap(), Some(TTL_TARGET));
    }

    #[tokio::test]
    async fn test_memory_pressure_triggers_eviction() {
        // 10 entries of 100 bytes against a 1100 byte cap: peak 1000 > 880
        let (store, _sink, cycle, region) = setup(CacheConfig {
            max_size: 1_100,
            max_age: 0,
            ..CacheConfig::default()
        });
        for i in 0..10 {
            let key = format!("k{}", i);
            store.set(&key, "x".repeat(98), None).await.unwrap();
            store.get(&key).await.unwrap();
        }

        let result = cycle.run(&region).await.unwrap();

        // freshly written entries are protected, so the fallback evicts them
        assert_eq!(result.kinds(), vec![RecommendationKind::Evict]);
        assert!(result.after.size <= 770);
        assert_eq!(result.recommendations[0].affected_keys, 3);
    }
}
