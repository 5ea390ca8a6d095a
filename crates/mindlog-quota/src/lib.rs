// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quota accounting for Mindlog.
//!
//! Tier rules come from configuration; counters live in a `UsageStore`
//! keyed by (user, feature, window key). Every counter mutation is a single
//! atomic store operation, so concurrent requests for the same user can
//! neither lose nor double-count a use.

pub mod ledger;
pub mod window;

pub use ledger::{QuotaDecision, QuotaLedger, Reservation};
pub use window::{window_end, window_key, window_start};
