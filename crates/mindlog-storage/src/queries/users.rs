// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plan lookups for effective-tier resolution.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use mindlog_core::{MindlogError, Tier, UserId};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err, opt_time_col, to_db_time};

/// Creates or replaces a user's plan.
pub async fn upsert_user(
    db: &Database,
    user: &UserId,
    tier: Tier,
    plan_expires_at: Option<DateTime<Utc>>,
) -> Result<(), MindlogError> {
    let id = user.0.clone();
    let tier = tier.to_string();
    let expires = plan_expires_at.map(to_db_time);
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO users (id, tier, plan_expires_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET tier = excluded.tier,
                     plan_expires_at = excluded.plan_expires_at",
                params![id, tier, expires],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Effective tier at `now`: paid plans without a future expiry count as basic.
pub async fn effective_tier(
    db: &Database,
    user: &UserId,
    now: DateTime<Utc>,
) -> Result<Tier, MindlogError> {
    let id = user.0.clone();
    let row = db
        .connection()
        .call(move |conn| -> Result<Option<(String, Option<DateTime<Utc>>)>, rusqlite::Error> {
            conn.query_row(
                "SELECT tier, plan_expires_at FROM users WHERE id = ?1",
                params![id],
                |row| Ok((row.get(0)?, opt_time_col(row, 1)?)),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    let Some((raw_tier, expires)) = row else {
        return Ok(Tier::Basic);
    };
    let tier = Tier::from_str(&raw_tier).map_err(|_| MindlogError::Storage {
        source: format!("unknown tier `{raw_tier}` for user {user}").into(),
    })?;
    Ok(resolve_tier(tier, expires, now))
}

fn resolve_tier(tier: Tier, expires: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Tier {
    match (tier, expires) {
        (Tier::Basic, _) => Tier::Basic,
        (paid, Some(until)) if until > now => paid,
        _ => Tier::Basic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_plans_degrade_to_basic() {
        let now = Utc::now();
        let later = now + chrono::Duration::days(3);
        let earlier = now - chrono::Duration::seconds(1);

        assert_eq!(resolve_tier(Tier::Premium, Some(later), now), Tier::Premium);
        assert_eq!(resolve_tier(Tier::Premium, Some(earlier), now), Tier::Basic);
        assert_eq!(resolve_tier(Tier::Standard, None, now), Tier::Basic);
        assert_eq!(resolve_tier(Tier::Standard, Some(now), now), Tier::Basic);
    }

    #[tokio::test]
    async fn unknown_user_is_basic() {
        let db = Database::open_in_memory().await.unwrap();
        let tier = effective_tier(&db, &UserId("ghost".into()), Utc::now())
            .await
            .unwrap();
        assert_eq!(tier, Tier::Basic);
    }

    #[tokio::test]
    async fn upsert_replaces_plan() {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserId("u1".into());
        let now = Utc::now();
        let until = now + chrono::Duration::days(30);

        upsert_user(&db, &user, Tier::Standard, Some(until)).await.unwrap();
        assert_eq!(effective_tier(&db, &user, now).await.unwrap(), Tier::Standard);

        upsert_user(&db, &user, Tier::Premium, Some(until)).await.unwrap();
        assert_eq!(effective_tier(&db, &user, now).await.unwrap(), Tier::Premium);
    }
}
