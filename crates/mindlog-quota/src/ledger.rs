// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage ledger gating expensive, inference-backed features.
//!
//! A request is first checked read-only with [`QuotaLedger::check`], then
//! immediately before expensive work a [`Reservation`] is taken with
//! [`QuotaLedger::check_and_reserve`]. The reservation is an atomic
//! conditional increment; an attempt that is never realized hands its
//! slot back through [`Reservation::release`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mindlog_config::model::QuotaConfig;
use mindlog_core::{
    Clock, FeatureKey, Limit, MindlogError, Tier, TierRule, UsageStore, UserId,
};
use tracing::{debug, info, warn};

use crate::window::{window_end, window_key};

/// Read-only verdict for one (user, feature) at a moment in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDecision {
    /// The feature may be used; `remaining` is `None` when uncapped.
    Allowed { used: u32, remaining: Option<u32> },
    /// The cap is reached until the current window ends.
    Denied { next_allowed_at: DateTime<Utc> },
    /// The tier does not include the feature.
    Unavailable,
}

/// Tiered usage ledger over a [`UsageStore`].
pub struct QuotaLedger {
    usage: Arc<dyn UsageStore>,
    config: QuotaConfig,
    clock: Arc<dyn Clock>,
}

impl QuotaLedger {
    pub fn new(usage: Arc<dyn UsageStore>, config: QuotaConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            usage,
            config,
            clock,
        }
    }

    pub fn rule(&self, feature: FeatureKey, tier: Tier) -> TierRule {
        self.config.rule(feature, tier)
    }

    /// Whether fallback results consume quota.
    pub fn charge_on_fallback(&self) -> bool {
        self.config.charge_on_fallback
    }

    /// Evaluates the tier rule without touching the counter.
    pub async fn check(
        &self,
        user: &UserId,
        feature: FeatureKey,
        tier: Tier,
    ) -> Result<QuotaDecision, MindlogError> {
        let rule = self.rule(feature, tier);
        if rule.limit == Limit::Disabled {
            return Ok(QuotaDecision::Unavailable);
        }
        let now = self.clock.now();
        let key = window_key(rule.window, now);
        let used = self.usage.get_count(user, feature, &key).await?;

        Ok(match rule.limit {
            Limit::Capped(cap) if used >= cap => QuotaDecision::Denied {
                next_allowed_at: window_end(rule.window, now),
            },
            Limit::Capped(cap) => QuotaDecision::Allowed {
                used,
                remaining: Some(cap - used),
            },
            _ => QuotaDecision::Allowed {
                used,
                remaining: None,
            },
        })
    }

    /// Atomically takes one use in the current window.
    ///
    /// Fails with `FeatureUnavailable` for a disabled rule and with
    /// `QuotaExceeded` (carrying the window end) when the cap is reached.
    /// Uncapped tiers are counted too, so usage stays observable.
    pub async fn check_and_reserve(
        &self,
        user: &UserId,
        feature: FeatureKey,
        tier: Tier,
    ) -> Result<Reservation, MindlogError> {
        let rule = self.rule(feature, tier);
        let cap = match rule.limit {
            Limit::Disabled => return Err(MindlogError::FeatureUnavailable { feature, tier }),
            Limit::Capped(cap) => Some(cap),
            Limit::Unlimited => None,
        };

        let now = self.clock.now();
        let key = window_key(rule.window, now);
        match self.usage.try_increment(user, feature, &key, cap).await? {
            Some(count) => {
                debug!(user = %user, %feature, window = %key, count, "quota reserved");
                Ok(Reservation {
                    usage: self.usage.clone(),
                    user: user.clone(),
                    feature,
                    window_key: key,
                    count,
                })
            }
            None => {
                let next_allowed_at = window_end(rule.window, now);
                info!(user = %user, %feature, window = %key, %next_allowed_at, "quota exhausted");
                Err(MindlogError::QuotaExceeded {
                    feature,
                    next_allowed_at,
                })
            }
        }
    }

    /// Settles a reservation for an attempt that ended in a fallback result.
    pub async fn settle_fallback(&self, reservation: Reservation) -> Result<(), MindlogError> {
        if self.charge_on_fallback() {
            reservation.commit();
            Ok(())
        } else {
            reservation.release().await
        }
    }
}

/// One reserved use. Consume it with [`commit`](Self::commit) once the
/// attempt is realized, or [`release`](Self::release) when it is not.
#[must_use = "a reservation must be committed or released"]
pub struct Reservation {
    usage: Arc<dyn UsageStore>,
    user: UserId,
    feature: FeatureKey,
    window_key: String,
    count: u32,
}

impl std::fmt::Debug for Reservation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reservation")
            .field("user", &self.user)
            .field("feature", &self.feature)
            .field("window_key", &self.window_key)
            .field("count", &self.count)
            .finish()
    }
}

impl Reservation {
    pub fn window_key(&self) -> &str {
        &self.window_key
    }

    /// Count in the window including this reservation.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Keeps the increment.
    pub fn commit(self) -> u32 {
        self.count
    }

    /// Hands the use back with a compensating decrement.
    pub async fn release(self) -> Result<(), MindlogError> {
        self.usage
            .decrement(&self.user, self.feature, &self.window_key)
            .await
            .inspect_err(|e| {
                warn!(user = %self.user, feature = %self.feature, error = %e, "failed to release quota reservation");
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use mindlog_config::model::FeatureQuota;
    use mindlog_core::WindowKind;
    use mindlog_storage::SqliteStorage;
    use mindlog_test_utils::ManualClock;

    struct Fixture {
        ledger: QuotaLedger,
        storage: Arc<SqliteStorage>,
        clock: Arc<ManualClock>,
    }

    async fn fixture(config: QuotaConfig) -> Fixture {
        let storage = Arc::new(SqliteStorage::in_memory().await.unwrap());
        let clock = Arc::new(ManualClock::at("2026-03-10T09:00:00Z"));
        let ledger = QuotaLedger::new(storage.clone(), config, clock.clone());
        Fixture {
            ledger,
            storage,
            clock,
        }
    }

    fn user() -> UserId {
        UserId("u1".into())
    }

    #[tokio::test]
    async fn fourth_daily_use_denied_until_next_day() {
        let f = fixture(QuotaConfig::default()).await;

        for expected in 1..=3 {
            let r = f
                .ledger
                .check_and_reserve(&user(), FeatureKey::Challenges, Tier::Standard)
                .await
                .unwrap();
            assert_eq!(r.commit(), expected);
        }

        let err = f
            .ledger
            .check_and_reserve(&user(), FeatureKey::Challenges, Tier::Standard)
            .await
            .unwrap_err();
        match err {
            MindlogError::QuotaExceeded {
                feature,
                next_allowed_at,
            } => {
                assert_eq!(feature, FeatureKey::Challenges);
                assert_eq!(next_allowed_at.to_rfc3339(), "2026-03-11T00:00:00+00:00");
            }
            other => panic!("expected QuotaExceeded, got {other:?}"),
        }
        assert_eq!(
            f.storage
                .get_count(&user(), FeatureKey::Challenges, "2026-03-10")
                .await
                .unwrap(),
            3,
            "a denied attempt must not increment"
        );

        f.clock.advance(Duration::days(1));
        assert!(
            f.ledger
                .check_and_reserve(&user(), FeatureKey::Challenges, Tier::Standard)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn check_is_read_only() {
        let f = fixture(QuotaConfig::default()).await;
        for _ in 0..3 {
            let decision = f
                .ledger
                .check(&user(), FeatureKey::Growth, Tier::Standard)
                .await
                .unwrap();
            assert_eq!(
                decision,
                QuotaDecision::Allowed {
                    used: 0,
                    remaining: Some(1)
                }
            );
        }

        f.ledger
            .check_and_reserve(&user(), FeatureKey::Growth, Tier::Standard)
            .await
            .unwrap()
            .commit();
        assert!(matches!(
            f.ledger
                .check(&user(), FeatureKey::Growth, Tier::Standard)
                .await
                .unwrap(),
            QuotaDecision::Denied { .. }
        ));
    }

    #[tokio::test]
    async fn basic_tier_is_unavailable() {
        let f = fixture(QuotaConfig::default()).await;
        assert_eq!(
            f.ledger
                .check(&user(), FeatureKey::Growth, Tier::Basic)
                .await
                .unwrap(),
            QuotaDecision::Unavailable
        );
        assert!(matches!(
            f.ledger
                .check_and_reserve(&user(), FeatureKey::Growth, Tier::Basic)
                .await,
            Err(MindlogError::FeatureUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn premium_is_unlimited_but_counted() {
        let f = fixture(QuotaConfig::default()).await;
        for _ in 0..10 {
            f.ledger
                .check_and_reserve(&user(), FeatureKey::Growth, Tier::Premium)
                .await
                .unwrap()
                .commit();
        }
        assert_eq!(
            f.ledger
                .check(&user(), FeatureKey::Growth, Tier::Premium)
                .await
                .unwrap(),
            QuotaDecision::Allowed {
                used: 10,
                remaining: None
            }
        );
    }

    #[tokio::test]
    async fn release_restores_the_slot() {
        let f = fixture(QuotaConfig::default()).await;
        let r = f
            .ledger
            .check_and_reserve(&user(), FeatureKey::Growth, Tier::Standard)
            .await
            .unwrap();
        r.release().await.unwrap();

        assert!(
            f.ledger
                .check_and_reserve(&user(), FeatureKey::Growth, Tier::Standard)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn fallback_charging_follows_policy() {
        for (charge, expected) in [(true, 1), (false, 0)] {
            let f = fixture(QuotaConfig {
                charge_on_fallback: charge,
                ..QuotaConfig::default()
            })
            .await;
            let r = f
                .ledger
                .check_and_reserve(&user(), FeatureKey::Challenges, Tier::Standard)
                .await
                .unwrap();
            f.ledger.settle_fallback(r).await.unwrap();
            assert_eq!(
                f.storage
                    .get_count(&user(), FeatureKey::Challenges, "2026-03-10")
                    .await
                    .unwrap(),
                expected
            );
        }
    }

    #[tokio::test]
    async fn monthly_window_denial_points_at_next_month() {
        let f = fixture(QuotaConfig {
            monthly: FeatureQuota {
                window: WindowKind::Monthly,
                standard_count: 1,
                premium_count: None,
            },
            ..QuotaConfig::default()
        })
        .await;
        f.ledger
            .check_and_reserve(&user(), FeatureKey::Monthly, Tier::Standard)
            .await
            .unwrap()
            .commit();
        let decision = f
            .ledger
            .check(&user(), FeatureKey::Monthly, Tier::Standard)
            .await
            .unwrap();
        assert_eq!(
            decision,
            QuotaDecision::Denied {
                next_allowed_at: DateTime::parse_from_rfc3339("2026-04-01T00:00:00Z")
                    .unwrap()
                    .with_timezone(&Utc)
            }
        );
    }

    #[tokio::test]
    async fn concurrent_reservations_never_exceed_cap() {
        let f = fixture(QuotaConfig::default()).await;
        let ledger = Arc::new(f.ledger);
        let mut handles = Vec::new();
        for _ in 0..12 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger
                    .check_and_reserve(&user(), FeatureKey::Challenges, Tier::Standard)
                    .await
                    .map(Reservation::commit)
                    .is_ok()
            }));
        }
        let mut granted = 0;
        for h in handles {
            if h.await.unwrap() {
                granted += 1;
            }
        }
        assert_eq!(granted, 3);
    }
}
