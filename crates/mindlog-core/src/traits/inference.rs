// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider trait for the remote text-completion endpoint.

use async_trait::async_trait;

use crate::error::MindlogError;
use crate::types::{Completion, InferenceRequest};

/// Sends completion requests to a model endpoint.
///
/// Failures are reported as [`MindlogError::Inference`] carrying one of the
/// classified [`InferenceFailure`](crate::error::InferenceFailure) kinds.
#[async_trait]
pub trait InferenceProvider: Send + Sync + 'static {
    async fn complete(&self, request: InferenceRequest) -> Result<Completion, MindlogError>;
}
