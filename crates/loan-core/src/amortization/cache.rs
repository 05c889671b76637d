//! Bounded memo of computed schedules, keyed by `(principal, rate, term)`.
//!
//! The engine itself keeps no state; a host that wants memoization owns a
//! `ScheduleCache` and routes requests through it.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::schedule::{compute_schedule, LoanCalculationResult, LoanTerms, ScheduleKey};
use crate::config::LoanLimits;
use crate::LoanResult;

/// Thread-safe schedule memo. When full, it is emptied before the next insert.
pub struct ScheduleCache {
    capacity: usize,
    entries: Mutex<HashMap<ScheduleKey, LoanCalculationResult>>,
}

impl Default for ScheduleCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl ScheduleCache {
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// A cache holding at most `capacity` schedules (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every entry, returning how many there were.
    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let evicted = entries.len();
        entries.clear();
        evicted
    }

    /// The schedule for `terms`, computed on a miss.
    ///
    /// Terms are always validated against `limits` first, so a hit never
    /// bypasses validation. Dated requests are computed directly: the start
    /// date is not part of the key. A hit echoes the caller's own `terms`.
    pub fn get_or_compute(
        &self,
        terms: &LoanTerms,
        limits: &LoanLimits,
    ) -> LoanResult<LoanCalculationResult> {
        terms.validate(limits)?;
        if terms.start_date.is_some() {
            return compute_schedule(terms, limits);
        }

        let key = ScheduleKey::from_terms(terms);
        if let Some(hit) = self.lock().get(&key) {
            let mut result = hit.clone();
            result.terms = terms.clone();
            return Ok(result);
        }

        // Computed outside the lock; a concurrent duplicate yields identical figures.
        let result = compute_schedule(terms, limits)?;

        let mut entries = self.lock();
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            debug!(capacity = self.capacity, "schedule cache full, clearing");
            entries.clear();
        }
        entries.entry(key).or_insert_with(|| result.clone());
        Ok(result)
    }

    // A panic elsewhere cannot leave a half-written entry, so a poisoned
    // lock is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<ScheduleKey, LoanCalculationResult>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn terms(principal: rust_decimal::Decimal) -> LoanTerms {
        LoanTerms {
            principal,
            annual_rate_percent: dec!(5),
            term_months: 12,
            start_date: None,
        }
    }

    #[test]
    fn test_hit_echoes_callers_terms() {
        let cache = ScheduleCache::default();
        let limits = LoanLimits::default();
        let first = cache.get_or_compute(&terms(dec!(10000)), &limits).unwrap();
        let second = cache.get_or_compute(&terms(dec!(10000.00)), &limits).unwrap();

        assert_eq!(cache.len(), 1);
        assert!(first.schedule == second.schedule);
        assert_eq!(first.terms.principal.to_string(), "10000");
        assert_eq!(second.terms.principal.to_string(), "10000.00");
        let json = serde_json::to_value(&second).unwrap();
        assert_eq!(json["terms"]["principal"], serde_json::json!("10000.00"));
    }

    #[test]
    fn test_hit_still_validates() {
        let cache = ScheduleCache::default();
        cache
            .get_or_compute(&terms(dec!(10000)), &LoanLimits::default())
            .unwrap();
        let tight = LoanLimits {
            max_principal: dec!(5000),
            ..LoanLimits::default()
        };
        let err = cache.get_or_compute(&terms(dec!(10000)), &tight).unwrap_err();
        assert_eq!(err.field(), Some("principal"));
    }

    #[test]
    fn test_dated_requests_bypass_cache() {
        let cache = ScheduleCache::default();
        let mut t = terms(dec!(10000));
        t.start_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 15);
        let result = cache.get_or_compute(&t, &LoanLimits::default()).unwrap();
        assert!(cache.is_empty());
        assert_eq!(result.schedule[0].payment_date, t.start_date);
    }

    #[test]
    fn test_capacity_bounds_entries() {
        let cache = ScheduleCache::new(2);
        let limits = LoanLimits::default();
        for principal in [dec!(1000), dec!(2000), dec!(3000)] {
            cache.get_or_compute(&terms(principal), &limits).unwrap();
        }
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.clear(), 1);
        assert!(cache.is_empty());
    }
}
