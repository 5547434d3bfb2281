//! Published, immutable view of the rule set.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::domain::conditions::ConditionGate;
use crate::domain::entities::{Rule, RuleRecord};
use crate::domain::errors::RuleError;
use crate::domain::matcher::RuleIndex;

/// Everything a request needs from one publish.
///
/// Swapped in as a whole; a request that loaded a snapshot keeps using it to
/// completion even if a publish happens meanwhile.
pub struct RuleSnapshot {
    /// Fingerprint of the rules eligible at build time and the condition
    /// list. Cache keys are scoped by it.
    pub generation: String,
    pub index: Arc<RuleIndex>,
    pub gate: ConditionGate,
    /// Rules that failed validation or compilation.
    pub skipped: Arc<Vec<RuleError>>,
    pub published_at: DateTime<Utc>,
    /// Earliest future activity-window boundary. Past it, the eligible set
    /// differs from the one the generation was computed for.
    pub valid_until: Option<DateTime<Utc>>,
    rules: Arc<Vec<Rule>>,
}

impl RuleSnapshot {
    /// Snapshot with no rules, used before the first publish.
    pub fn empty() -> Self {
        Self::assemble(
            Arc::new(Vec::new()),
            Arc::new(RuleIndex::default()),
            Arc::new(Vec::new()),
            ConditionGate::default(),
            Utc::now(),
        )
    }

    /// Validates, compiles and indexes stored records.
    pub fn build(records: Vec<RuleRecord>, gate: ConditionGate, now: DateTime<Utc>) -> Self {
        let mut skipped = Vec::new();
        let mut rules = Vec::with_capacity(records.len());

        for record in records {
            match Rule::try_from(record) {
                Ok(rule) => rules.push(rule),
                Err(e) => {
                    tracing::warn!(rule_id = e.rule_id(), error = %e, "Skipping rule");
                    skipped.push(e);
                }
            }
        }

        let (index, compile_errors) = RuleIndex::build(rules.iter().cloned());
        skipped.extend(compile_errors);
        skipped.sort_by_key(RuleError::rule_id);

        Self::assemble(
            Arc::new(rules),
            Arc::new(index),
            Arc::new(skipped),
            gate,
            now,
        )
    }

    /// Same rules and index, re-fingerprinted for `now`.
    pub fn refreshed(&self, now: DateTime<Utc>) -> Self {
        Self::assemble(
            self.rules.clone(),
            self.index.clone(),
            self.skipped.clone(),
            self.gate.clone(),
            now,
        )
    }

    /// Returns true once `now` has reached [`Self::valid_until`].
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.is_some_and(|until| now >= until)
    }

    pub fn rule_count(&self) -> usize {
        self.index.len()
    }

    pub fn active_rule_count(&self, now: DateTime<Utc>) -> usize {
        self.rules.iter().filter(|r| r.is_active_at(now)).count()
    }

    fn assemble(
        rules: Arc<Vec<Rule>>,
        index: Arc<RuleIndex>,
        skipped: Arc<Vec<RuleError>>,
        gate: ConditionGate,
        now: DateTime<Utc>,
    ) -> Self {
        let indexed: Vec<&Rule> = rules.iter().filter(|r| index.get(r.id).is_some()).collect();

        let valid_until = indexed
            .iter()
            .filter_map(|r| r.next_transition_after(now))
            .min();

        let eligible: Vec<&Rule> = indexed
            .iter()
            .copied()
            .filter(|r| r.is_active_at(now))
            .collect();

        Self {
            generation: fingerprint(&eligible, &gate),
            index,
            gate,
            skipped,
            published_at: now,
            valid_until,
            rules,
        }
    }
}

/// Short SHA-256 fingerprint over eligible rules and condition names.
fn fingerprint(eligible: &[&Rule], gate: &ConditionGate) -> String {
    let mut hasher = Sha256::new();
    // Serializing plain data cannot fail.
    hasher.update(serde_json::to_vec(eligible).unwrap_or_default());
    for name in gate.names() {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(&hasher.finalize()[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_build_reports_skipped_rules() {
        let records = vec![
            RuleRecord::new(1, "exact", "/a", "/b"),
            RuleRecord::new(2, "wildcard", "/c", "/d"),
            RuleRecord::new(3, "regex", "(", "/e"),
        ];

        let snapshot = RuleSnapshot::build(records, ConditionGate::default(), Utc::now());

        assert_eq!(snapshot.rule_count(), 1);
        let skipped: Vec<i64> = snapshot.skipped.iter().map(|e| e.rule_id()).collect();
        assert_eq!(skipped, vec![2, 3]);
    }

    #[test]
    fn test_same_rules_same_generation() {
        let now = Utc::now();
        let records = vec![
            RuleRecord::new(1, "exact", "/a", "/b"),
            RuleRecord::new(2, "placeholder", "/x/{y}", "/z/{y}"),
        ];

        let first = RuleSnapshot::build(records.clone(), ConditionGate::default(), now);
        let second = RuleSnapshot::build(records, ConditionGate::default(), now);

        assert_eq!(first.generation, second.generation);
    }

    #[test]
    fn test_changed_rules_change_generation() {
        let now = Utc::now();
        let before = RuleSnapshot::build(
            vec![RuleRecord::new(1, "exact", "/a", "/b")],
            ConditionGate::default(),
            now,
        );
        let after = RuleSnapshot::build(
            vec![RuleRecord::new(1, "exact", "/a", "/c")],
            ConditionGate::default(),
            now,
        );

        assert_ne!(before.generation, after.generation);
    }

    #[test]
    fn test_window_boundary_makes_snapshot_stale() {
        let now = Utc::now();
        let mut record = RuleRecord::new(1, "exact", "/a", "/b");
        record.from_date = Some(now + Duration::minutes(10));

        let snapshot = RuleSnapshot::build(vec![record], ConditionGate::default(), now);

        assert_eq!(snapshot.valid_until, Some(now + Duration::minutes(10)));
        assert!(!snapshot.is_stale(now));
        assert!(snapshot.is_stale(now + Duration::minutes(10)));
        assert_eq!(snapshot.active_rule_count(now), 0);

        let later = now + Duration::minutes(11);
        let refreshed = snapshot.refreshed(later);
        assert_ne!(refreshed.generation, snapshot.generation);
        assert!(refreshed.valid_until.is_none());
        assert_eq!(refreshed.active_rule_count(later), 1);
    }
}
