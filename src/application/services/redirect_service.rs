//! Redirect resolution and publishing.

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::rule_snapshot::RuleSnapshot;
use crate::domain::conditions::ConditionRegistry;
use crate::domain::errors::RuleError;
use crate::domain::location::{RedirectOptions, RedirectResponse, build_response};
use crate::domain::match_event::{MatchEvent, MatchEventBus};
use crate::domain::matcher::RuleMatch;
use crate::domain::repositories::RuleRepository;
use crate::domain::signature::RequestSignature;
use crate::error::AppError;
use crate::infrastructure::cache::{CacheService, CachedMatch};

/// Whether a resolution may touch shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Read-through cache, match events emitted.
    Live,
    /// Tester traffic: matching and conditions only, no cache, no events.
    DryRun,
}

/// Outcome of resolving one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    NoMatch,
    /// A rule matched but a condition vetoed the redirect.
    Vetoed { rule_id: i64, condition: &'static str },
    Redirect {
        rule_id: i64,
        response: RedirectResponse,
    },
}

/// Result of a publish.
#[derive(Debug, Clone)]
pub struct PublishReport {
    pub generation: String,
    pub indexed: usize,
    pub skipped: Vec<RuleError>,
    pub published_at: DateTime<Utc>,
}

/// The matching engine: owns the published snapshot and orchestrates cache,
/// matcher, conditions and response construction.
///
/// # Publishing
///
/// [`Self::publish`] loads rules from the repository, builds a new snapshot
/// off to the side, swaps it in atomically and invalidates the cache before
/// returning. A repository failure leaves the previous snapshot untouched.
///
/// # Caching
///
/// Both matches and no-matches are cached under
/// `{generation}:{scheme}:{path}`. The cache stores the *match*, not the final
/// decision: conditions run on every request, cache hit or not.
pub struct RedirectService {
    repository: Arc<dyn RuleRepository>,
    cache: Arc<dyn CacheService>,
    conditions: ConditionRegistry,
    condition_names: Vec<String>,
    events: MatchEventBus,
    options: RedirectOptions,
    snapshot: ArcSwap<RuleSnapshot>,
    publish_lock: Mutex<()>,
}

impl RedirectService {
    /// Creates a service with an empty rule set; call [`Self::publish`] to load rules.
    pub fn new(
        repository: Arc<dyn RuleRepository>,
        cache: Arc<dyn CacheService>,
        conditions: ConditionRegistry,
        condition_names: Vec<String>,
        events: MatchEventBus,
        options: RedirectOptions,
    ) -> Self {
        Self {
            repository,
            cache,
            conditions,
            condition_names,
            events,
            options,
            snapshot: ArcSwap::from_pointee(RuleSnapshot::empty()),
            publish_lock: Mutex::new(()),
        }
    }

    /// Rebuilds the rule index from the repository and invalidates the cache.
    ///
    /// Idempotent: publishing an unchanged rule set yields the same
    /// generation and the same matching behavior. Concurrent calls are
    /// serialized.
    ///
    /// # Errors
    ///
    /// Returns the repository error if rules cannot be loaded; the engine
    /// then keeps serving the previous snapshot.
    pub async fn publish(&self) -> Result<PublishReport, AppError> {
        let _guard = self.publish_lock.lock().await;

        let records = self.repository.list_rules().await?;
        let gate = self.conditions.resolve(&self.condition_names);
        let snapshot = RuleSnapshot::build(records, gate, Utc::now());

        let report = PublishReport {
            generation: snapshot.generation.clone(),
            indexed: snapshot.rule_count(),
            skipped: snapshot.skipped.as_ref().clone(),
            published_at: snapshot.published_at,
        };

        self.snapshot.store(Arc::new(snapshot));

        if let Err(e) = self.cache.invalidate_all().await {
            // Keys are generation-scoped, so stale entries stay unreachable.
            warn!(error = %e, "Cache invalidation failed during publish");
        }

        info!(
            generation = %report.generation,
            indexed = report.indexed,
            skipped = report.skipped.len(),
            "Redirect rules published"
        );

        Ok(report)
    }

    /// Current snapshot, refreshed first if an activity window boundary has
    /// passed since it was built.
    ///
    /// A refresh changes the generation, so the cache is invalidated just as
    /// on publish.
    pub async fn snapshot(&self) -> Arc<RuleSnapshot> {
        let current = self.snapshot.load_full();
        let now = Utc::now();
        if !current.is_stale(now) {
            return current;
        }

        let refreshed = Arc::new(current.refreshed(now));
        // The guard returned by compare_and_swap must not live across an await.
        let swapped = {
            let previous = self.snapshot.compare_and_swap(&current, refreshed.clone());
            Arc::ptr_eq(&*previous, &current)
        };
        if swapped {
            info!(generation = %refreshed.generation, "Rule activity window changed, snapshot refreshed");
            if let Err(e) = self.cache.invalidate_all().await {
                warn!(error = %e, "Cache invalidation failed during snapshot refresh");
            }
            refreshed
        } else {
            // Another request or a publish got there first.
            self.snapshot.load_full()
        }
    }

    /// Resolves a request signature to a redirect decision.
    ///
    /// Never fails: cache errors degrade to direct matching.
    pub async fn resolve(&self, signature: &RequestSignature, mode: ResolveMode) -> Resolution {
        let snapshot = self.snapshot().await;
        let now = Utc::now();

        let matched = match mode {
            ResolveMode::Live => self.find_cached(&snapshot, signature, now).await,
            ResolveMode::DryRun => snapshot.index.find(&signature.path, signature.scheme, now),
        };

        let Some(matched) = matched else {
            return Resolution::NoMatch;
        };
        let rule_id = matched.rule().id;

        if mode == ResolveMode::Live {
            self.events.publish(MatchEvent::new(rule_id, signature.clone()));
        }

        if let Some(condition) = snapshot.gate.first_veto(matched.rule(), signature) {
            return Resolution::Vetoed { rule_id, condition };
        }

        Resolution::Redirect {
            rule_id,
            response: build_response(&matched, signature.query.as_deref(), self.options),
        }
    }

    pub fn events(&self) -> &MatchEventBus {
        &self.events
    }

    pub fn cache(&self) -> &Arc<dyn CacheService> {
        &self.cache
    }

    pub fn repository(&self) -> &Arc<dyn RuleRepository> {
        &self.repository
    }

    /// Read-through lookup: cached outcome if present, matcher otherwise.
    async fn find_cached(
        &self,
        snapshot: &RuleSnapshot,
        signature: &RequestSignature,
        now: DateTime<Utc>,
    ) -> Option<RuleMatch> {
        let key = format!("{}:{}", snapshot.generation, signature.cache_key());

        match self.cache.get(&key).await {
            Ok(Some(CachedMatch::NoMatch)) => {
                metrics::counter!("redirect_cache_hits_total").increment(1);
                debug!(key = %key, "Cache HIT (no match)");
                return None;
            }
            Ok(Some(CachedMatch::Rule(rule_id))) => {
                if let Some(matched) =
                    snapshot
                        .index
                        .rematch(rule_id, &signature.path, signature.scheme, now)
                {
                    metrics::counter!("redirect_cache_hits_total").increment(1);
                    debug!(key = %key, rule_id, "Cache HIT");
                    return Some(matched);
                }
                debug!(key = %key, rule_id, "Cached rule no longer applies, re-matching");
            }
            Ok(None) => {
                debug!(key = %key, "Cache MISS");
            }
            Err(e) => {
                warn!(error = %e, path = %signature.path, "Cache error, matching directly");
                return snapshot.index.find(&signature.path, signature.scheme, now);
            }
        }

        metrics::counter!("redirect_cache_misses_total").increment(1);
        let matched = snapshot.index.find(&signature.path, signature.scheme, now);
        let value = matched
            .as_ref()
            .map_or(CachedMatch::NoMatch, |m| CachedMatch::Rule(m.rule().id));

        if let Err(e) = self.cache.put(&key, value).await {
            warn!(error = %e, key = %key, "Failed to cache match result");
        }

        matched
    }
}
