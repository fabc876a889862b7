//! Conversation state: the user profile plus the ordered turn log.
//!
//! The turn log is the exact message sequence replayed to the completion
//! endpoint on every request, so the protocol ordering rules live here:
//! a tool turn may only follow an assistant turn that requested it, and
//! must answer a call id that assistant turn actually issued.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use fitcoach_core::types::{ChatMessage, Role};

use crate::coordinator::AgentError;

/// A profile entry: free-form scalar supplied by the user or a front end
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ProfileValue {
    Str(String),
    Num(f64),
    Bool(bool),
}

/// Durable view of one conversation, as written to disk
#[derive(Serialize, Deserialize)]
struct StoredSession {
    user_profile: BTreeMap<String, ProfileValue>,
    conversation: Vec<ChatMessage>,
}

/// In-memory session: user profile plus turn history
#[derive(Debug, Default)]
pub struct Session {
    profile: BTreeMap<String, ProfileValue>,
    turns: Vec<ChatMessage>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(&self) -> &BTreeMap<String, ProfileValue> {
        &self.profile
    }

    pub fn turns(&self) -> &[ChatMessage] {
        &self.turns
    }

    /// Merge profile entries; later values win per key.
    pub fn merge_profile(&mut self, entries: BTreeMap<String, ProfileValue>) {
        for (key, value) in entries {
            self.profile.insert(key, value);
        }
    }

    /// Profile serialized for embedding in the system message.
    pub fn profile_json(&self) -> Value {
        serde_json::to_value(&self.profile).unwrap_or(Value::Null)
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.turns.push(ChatMessage::user(text));
    }

    pub fn push_assistant(&mut self, message: ChatMessage) {
        self.turns.push(message);
    }

    /// Append a tool turn, validating it against the preceding assistant turn.
    ///
    /// The completion endpoint rejects histories where a tool message does
    /// not directly answer a pending call, so the violation is surfaced here
    /// instead of on the wire.
    pub fn push_tool_turn(&mut self, message: ChatMessage) -> Result<(), AgentError> {
        let call_id = message
            .tool_call_id
            .as_deref()
            .ok_or_else(|| AgentError::Protocol("tool turn is missing a call id".to_string()))?;

        let pending = self
            .turns
            .iter()
            .rev()
            .find(|turn| turn.role == Role::Assistant)
            .and_then(|turn| turn.tool_calls.as_ref())
            .map(|calls| calls.iter().any(|call| call.id == call_id))
            .unwrap_or(false);

        if !pending {
            return Err(AgentError::Protocol(format!(
                "tool turn answers unknown call id {}",
                call_id
            )));
        }

        self.turns.push(message);
        Ok(())
    }

    /// Drop the turn history; the profile survives a reset.
    pub fn reset(&mut self) {
        debug!(turns = self.turns.len(), "resetting conversation");
        self.turns.clear();
    }

    /// Persist profile and turns as a single JSON document.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AgentError> {
        let stored = StoredSession {
            user_profile: self.profile.clone(),
            conversation: self.turns.clone(),
        };
        let json = serde_json::to_string_pretty(&stored)?;
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)?;
        Ok(())
    }

    /// Restore a previously saved session, replacing profile and turns.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AgentError> {
        let json = fs::read_to_string(path)?;
        let stored: StoredSession = serde_json::from_str(&json)?;
        Ok(Self {
            profile: stored.user_profile,
            turns: stored.conversation,
        })
    }
}
