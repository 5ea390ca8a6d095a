// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::time::Duration;

const MAX_SHIFT: u32 = 20;

/// Delay before retrying after failed attempt number `attempt` (1-based):
/// `base * 2^(attempt - 1)`, saturating.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let shift = attempt.saturating_sub(1).min(MAX_SHIFT);
    base.saturating_mul(1u32 << shift)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_per_attempt() {
        let base = Duration::from_secs(10);
        assert_eq!(backoff_delay(base, 1), Duration::from_secs(10));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(20));
        assert_eq!(backoff_delay(base, 4), Duration::from_secs(80));
    }

    #[test]
    fn attempt_zero_is_treated_as_first() {
        assert_eq!(backoff_delay(Duration::from_millis(5), 0), Duration::from_millis(5));
    }

    #[test]
    fn large_attempts_saturate() {
        let huge = backoff_delay(Duration::from_secs(u64::MAX / 2), 40);
        assert_eq!(huge, Duration::MAX);
    }
}
