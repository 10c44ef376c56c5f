//! Bounded, append-only mission transcript.
//!
//! [`Transcript`] keeps the most recent `capacity` messages of a mission in a
//! ring buffer. Appends never rewrite existing messages; once full, the
//! oldest message is evicted and counted. Sequence numbers keep increasing
//! across evictions, so ordering survives even after the head is dropped.

use super::message::{AgentMessage, MessageKind};
use crate::util::truncate_head_tail;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Limits applied to a [`Transcript`].
///
/// - `capacity`: messages retained before oldest-first eviction
/// - `max_message_bytes`: per-message cap (head+tail truncated on append)
/// - `prompt_window`: how many recent messages are rendered into prompts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptBudget {
    capacity: usize,
    max_message_bytes: usize,
    prompt_window: usize,
}

impl Default for TranscriptBudget {
    fn default() -> Self {
        Self {
            capacity: 256,
            max_message_bytes: 16_000,
            prompt_window: 12,
        }
    }
}

impl TranscriptBudget {
    pub fn new(capacity: usize, max_message_bytes: usize, prompt_window: usize) -> Self {
        Self {
            capacity,
            max_message_bytes,
            prompt_window,
        }
    }

    /// Tight limits for cost-sensitive workspaces.
    pub fn strict() -> Self {
        Self {
            capacity: 64,
            max_message_bytes: 4_000,
            prompt_window: 6,
        }
    }

    /// No eviction, no truncation.
    pub fn unlimited() -> Self {
        Self {
            capacity: usize::MAX,
            max_message_bytes: usize::MAX,
            prompt_window: usize::MAX,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn max_message_bytes(&self) -> usize {
        self.max_message_bytes
    }

    pub fn prompt_window(&self) -> usize {
        self.prompt_window
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_max_message_bytes(mut self, bytes: usize) -> Self {
        self.max_message_bytes = bytes;
        self
    }

    pub fn with_prompt_window(mut self, window: usize) -> Self {
        self.prompt_window = window;
        self
    }

    /// Validate this budget, returning a list of issues.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.capacity < 1 {
            issues.push("transcript: capacity must be >= 1".to_string());
        }
        if self.max_message_bytes < 64 {
            issues.push(format!(
                "transcript: max_message_bytes ({}) must be >= 64",
                self.max_message_bytes
            ));
        }
        if self.prompt_window < 1 {
            issues.push("transcript: prompt_window must be >= 1".to_string());
        }
        issues
    }
}

/// Ordered ring buffer of [`AgentMessage`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    budget: TranscriptBudget,
    messages: VecDeque<AgentMessage>,
    next_seq: u64,
    evicted: u64,
}

impl Transcript {
    pub fn new(budget: TranscriptBudget) -> Self {
        Self {
            budget,
            messages: VecDeque::new(),
            next_seq: 0,
            evicted: 0,
        }
    }

    /// Append a message and return its sequence number.
    ///
    /// Oversized content is head+tail truncated. When the buffer is full the
    /// oldest message is evicted first.
    pub fn push(
        &mut self,
        role: impl Into<String>,
        kind: MessageKind,
        content: impl AsRef<str>,
    ) -> u64 {
        let content = truncate_head_tail(content.as_ref(), self.budget.max_message_bytes());
        let seq = self.next_seq;
        self.next_seq += 1;

        while self.messages.len() >= self.budget.capacity().max(1) {
            self.messages.pop_front();
            self.evicted += 1;
        }
        self.messages
            .push_back(AgentMessage::new(seq, role, kind, content));
        seq
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &AgentMessage> + ExactSizeIterator {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&AgentMessage> {
        self.messages.back()
    }

    /// Messages dropped by oldest-first eviction so far.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Total messages ever appended.
    pub fn appended(&self) -> u64 {
        self.next_seq
    }

    pub fn budget(&self) -> &TranscriptBudget {
        &self.budget
    }

    /// Whether any real specialist thought is still retained.
    pub fn has_contribution(&self) -> bool {
        self.messages.iter().any(AgentMessage::is_contribution)
    }

    /// The last `n` messages in order.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &AgentMessage> {
        let skip = self.messages.len().saturating_sub(n);
        self.messages.iter().skip(skip)
    }

    /// Render the prompt window as `[role] content` blocks.
    pub fn render_recent(&self) -> String {
        let mut rendered = String::new();
        if self.evicted > 0 || self.messages.len() > self.budget.prompt_window() {
            let hidden = self.next_seq - self.messages.len() as u64
                + self.messages.len().saturating_sub(self.budget.prompt_window()) as u64;
            rendered.push_str(&format!("[{} earlier messages omitted]\n\n", hidden));
        }
        for message in self.recent(self.budget.prompt_window()) {
            rendered.push_str(&format!("[{}] {}\n\n", message.role, message.content));
        }
        rendered.trim_end().to_string()
    }

    /// Owned copy of the retained messages.
    pub fn to_vec(&self) -> Vec<AgentMessage> {
        self.messages.iter().cloned().collect()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new(TranscriptBudget::default())
    }
}
