// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Mindlog integration tests.
//!
//! Provides test doubles and harness infrastructure for fast,
//! deterministic tests without a real inference endpoint.
//!
//! # Components
//!
//! - [`MockInference`] - Scripted inference provider with request capture
//! - [`ManualClock`] - Clock that only moves when told to
//! - [`TestHarness`] - Temp SQLite storage, mock inference, clock, and config

pub mod clock;
pub mod harness;
pub mod mock_inference;

pub use clock::ManualClock;
pub use harness::TestHarness;
pub use mock_inference::{MockInference, MockReply};
