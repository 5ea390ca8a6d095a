// SPDX-FileCopyrightText: 2026 Mindlog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock inference provider for deterministic testing.
//!
//! `MockInference` implements `InferenceProvider` with scripted replies,
//! enabling fast tests without calls to a real model endpoint.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use mindlog_core::{Completion, InferenceFailure, InferenceProvider, InferenceRequest, MindlogError};

/// One scripted outcome.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Fail(InferenceFailure),
}

impl From<&str> for MockReply {
    fn from(text: &str) -> Self {
        MockReply::Text(text.to_string())
    }
}

impl From<InferenceFailure> for MockReply {
    fn from(failure: InferenceFailure) -> Self {
        MockReply::Fail(failure)
    }
}

/// A mock provider that returns pre-configured replies.
///
/// Replies are popped from a FIFO queue. When the queue is empty, the
/// default reply is returned (the text "mock response" unless overridden).
pub struct MockInference {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    default_reply: Mutex<MockReply>,
    requests: Mutex<Vec<InferenceRequest>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockInference {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            default_reply: Mutex::new(MockReply::Text("mock response".to_string())),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Create a mock pre-loaded with the given replies.
    pub fn with_replies<I, R>(replies: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<MockReply>,
    {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().map(Into::into).collect())),
            ..Self::new()
        }
    }

    /// Sleep this long before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn push(&self, reply: impl Into<MockReply>) {
        self.replies.lock().await.push_back(reply.into());
    }

    /// Reply used once the scripted queue is drained.
    pub async fn set_default(&self, reply: impl Into<MockReply>) {
        *self.default_reply.lock().await = reply.into();
    }

    /// Number of completed calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in call order.
    pub async fn requests(&self) -> Vec<InferenceRequest> {
        self.requests.lock().await.clone()
    }

    async fn next_reply(&self) -> MockReply {
        let scripted = self.replies.lock().await.pop_front();
        match scripted {
            Some(reply) => reply,
            None => self.default_reply.lock().await.clone(),
        }
    }
}

impl Default for MockInference {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceProvider for MockInference {
    async fn complete(&self, request: InferenceRequest) -> Result<Completion, MindlogError> {
        self.requests.lock().await.push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let reply = self.next_reply().await;
        self.calls.fetch_add(1, Ordering::SeqCst);
        match reply {
            MockReply::Text(content) => Ok(Completion { content }),
            MockReply::Fail(failure) => Err(failure.into()),
        }
    }
}
