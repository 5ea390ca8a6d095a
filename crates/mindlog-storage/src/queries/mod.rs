// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per table.

pub mod cache;
pub mod entries;
pub mod jobs;
pub mod results;
pub mod usage;
pub mod users;
