//! The orchestration loop: one user turn in, one coach reply out.
//!
//! Each turn is at most two round trips to the completion endpoint. The
//! first advertises the tool catalog; if the model requests calls they are
//! executed in the order listed and their results appended as tool turns,
//! then a second request with tools withheld produces the reply the user
//! sees. The model never gets a second tool round within one turn.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use fitcoach_core::client::{ChatClient, CompletionBackend};
use fitcoach_core::config::CoachConfig;
use fitcoach_core::errors::CoreError;
use fitcoach_core::types::{ChatMessage, ChatRequest};
use fitcoach_tools::{declarations, ToolContext, ToolRegistry};

use crate::session::{ProfileValue, Session};

const PERSONA: &str = "You are FitCoach AI, an expert personal fitness and nutrition assistant.

Your capabilities include:
- Analyzing body composition and calculating metrics (BMI, body fat estimation)
- Creating personalized meal plans based on TDEE and dietary preferences
- Generating customized workout plans for different goals and experience levels
- Tracking calories from meal descriptions or photos
- Suggesting running routes and finding nearby gyms using location data
- Integrating data from Hevy, Strava, and health apps
- Analyzing workout progress and suggesting improvements
- Managing fridge inventory and suggesting meals
- Exporting comprehensive reports (PDF/Excel)

Always be:
- Professional and encouraging
- Data-driven and precise with calculations
- Personalized based on user's profile and goals
- Supportive of sustainable fitness and nutrition habits

When gathering information:
- Ask for essential details (weight, height, age, gender, activity level, goals)
- Be conversational and don't overwhelm with too many questions at once
- Use emojis sparingly but appropriately to make interactions friendly

Current user profile: ";

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("completion backend error: {0}")]
    Backend(#[from] CoreError),
    #[error("conversation protocol violation: {0}")]
    Protocol(String),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("session storage error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AgentResult<T> = Result<T, AgentError>;

/// The conversational coach: session state, tool registry, and the
/// completion backend wired together.
pub struct CoachAgent {
    backend: Arc<dyn CompletionBackend>,
    registry: ToolRegistry,
    session: Session,
    config: Arc<CoachConfig>,
}

impl CoachAgent {
    /// Build an agent backed by the real chat-completion endpoint.
    /// Fails when no API key is configured.
    pub fn new(config: CoachConfig) -> AgentResult<Self> {
        let config = Arc::new(config);
        let client = ChatClient::new(&config)?;
        Ok(Self::with_backend(Arc::new(client), config))
    }

    /// Build an agent over an arbitrary backend (the seam tests use).
    pub fn with_backend(backend: Arc<dyn CompletionBackend>, config: Arc<CoachConfig>) -> Self {
        let registry = ToolRegistry::new(ToolContext::new(backend.clone(), config.clone()));
        Self {
            backend,
            registry,
            session: Session::new(),
            config,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn merge_profile(&mut self, entries: BTreeMap<String, ProfileValue>) {
        self.session.merge_profile(entries);
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }

    pub fn save_session(&self, path: impl AsRef<Path>) -> AgentResult<()> {
        self.session.save(path)
    }

    pub fn load_session(&mut self, path: impl AsRef<Path>) -> AgentResult<()> {
        self.session = Session::load(path)?;
        Ok(())
    }

    /// Handle one user turn and return the coach's reply text.
    pub async fn handle(&mut self, user_text: &str) -> AgentResult<String> {
        self.session.push_user(user_text);

        let reply = self
            .backend
            .complete(self.request(Some(declarations())))
            .await?;

        if !reply.has_tool_calls() {
            let text = reply.content.unwrap_or_default();
            self.session.push_assistant(ChatMessage::assistant(text.clone()));
            return Ok(text);
        }

        info!(calls = reply.tool_calls.len(), "model requested tool calls");
        let calls = reply.tool_calls.clone();
        self.session
            .push_assistant(ChatMessage::assistant_tool_calls(calls.clone(), reply.content));

        for call in &calls {
            let args: Value = match serde_json::from_str(&call.function.arguments) {
                Ok(args) => args,
                // Malformed argument blobs become error results the model
                // can read, not hard failures.
                Err(e) => {
                    debug!(tool = %call.function.name, "undecodable tool arguments");
                    serde_json::json!({"__decode_error": e.to_string()})
                }
            };
            let result = self.registry.dispatch(&call.function.name, args).await;
            let body = serde_json::to_string(&result)?;
            self.session.push_tool_turn(ChatMessage::tool_result(
                &call.id,
                &call.function.name,
                body,
            ))?;
        }

        // Second round: tools withheld so the model must answer in prose.
        let final_reply = self.backend.complete(self.request(None)).await?;
        let text = final_reply.content.unwrap_or_default();
        self.session.push_assistant(ChatMessage::assistant(text.clone()));
        Ok(text)
    }

    /// Assemble the wire request: fresh system message plus the whole log.
    fn request(&self, tools: Option<Vec<fitcoach_core::types::ToolDeclaration>>) -> ChatRequest {
        let system = self.system_message();
        let mut messages = Vec::with_capacity(self.session.turns().len() + 1);
        messages.push(system);
        messages.extend(self.session.turns().iter().cloned());

        let tool_choice = tools.as_ref().map(|_| "auto".to_string());
        ChatRequest {
            model: self.config.model().to_string(),
            messages,
            tools,
            tool_choice,
            temperature: Some(self.config.temperature()),
            max_tokens: None,
        }
    }

    /// The system message is rebuilt per request so profile edits made
    /// mid-conversation show up immediately.
    fn system_message(&self) -> ChatMessage {
        let profile = serde_json::to_string_pretty(&self.session.profile_json())
            .unwrap_or_else(|_| "{}".to_string());
        let text = match self.config.system_prompt.as_deref() {
            Some(custom) => format!("{}\n\nCurrent user profile: {}", custom, profile),
            None => format!("{}{}", PERSONA, profile),
        };
        ChatMessage::system(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fitcoach_core::errors::CoreResult;
    use fitcoach_core::types::{AssistantReply, FunctionCall, Role, ToolCallRequest};
    use std::sync::Mutex;

    /// Backend that replays a fixed script of replies and records requests.
    struct ScriptedBackend {
        script: Mutex<Vec<AssistantReply>>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedBackend {
        fn new(mut replies: Vec<AssistantReply>) -> Self {
            replies.reverse();
            Self {
                script: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn complete(&self, request: ChatRequest) -> CoreResult<AssistantReply> {
            self.seen.lock().unwrap().push(request);
            Ok(self
                .script
                .lock()
                .unwrap()
                .pop()
                .expect("script exhausted"))
        }
    }

    fn text_reply(text: &str) -> AssistantReply {
        AssistantReply {
            content: Some(text.to_string()),
            tool_calls: vec![],
        }
    }

    fn tool_reply(name: &str, arguments: &str) -> AssistantReply {
        AssistantReply {
            content: None,
            tool_calls: vec![ToolCallRequest {
                id: "call_1".to_string(),
                kind: "function".to_string(),
                function: FunctionCall {
                    name: name.to_string(),
                    arguments: arguments.to_string(),
                },
            }],
        }
    }

    fn agent(backend: Arc<ScriptedBackend>) -> CoachAgent {
        CoachAgent::with_backend(backend, Arc::new(CoachConfig::default()))
    }

    #[tokio::test]
    async fn text_only_turn_is_a_single_round_trip() {
        let backend = Arc::new(ScriptedBackend::new(vec![text_reply("Hello! Ready to train?")]));
        let mut agent = agent(backend.clone());

        let out = agent.handle("hi").await.unwrap();
        assert_eq!(out, "Hello! Ready to train?");

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].tools.is_some());
        assert_eq!(seen[0].tool_choice.as_deref(), Some("auto"));
        assert_eq!(agent.session().turns().len(), 2);
    }

    #[tokio::test]
    async fn tool_round_relays_results_and_disables_tools() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            tool_reply("calculate_bmi", r#"{"weight": 70, "height": 175}"#),
            text_reply("Your BMI is 22.9, right in the healthy range."),
        ]));
        let mut agent = agent(backend.clone());

        let out = agent.handle("what's my bmi? 70kg, 175cm").await.unwrap();
        assert!(out.contains("22.9"));

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[1].tools.is_none());
        assert!(seen[1].tool_choice.is_none());

        // History: user, assistant(tool_calls), tool, assistant(final)
        let turns = agent.session().turns();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[2].role, Role::Tool);
        assert_eq!(turns[2].tool_call_id.as_deref(), Some("call_1"));
        let body: Value = serde_json::from_str(turns[2].text_content().unwrap()).unwrap();
        assert_eq!(body["classification"], "Normal weight");
    }

    #[tokio::test]
    async fn unknown_tool_becomes_an_error_turn_and_the_loop_survives() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            tool_reply("summon_dragon", "{}"),
            text_reply("I couldn't do that, but I can help with fitness."),
        ]));
        let mut agent = agent(backend);

        let out = agent.handle("summon a dragon").await.unwrap();
        assert!(out.contains("help with fitness"));

        let turns = agent.session().turns();
        let body: Value = serde_json::from_str(turns[2].text_content().unwrap()).unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Tool summon_dragon not found");
    }

    #[tokio::test]
    async fn system_message_embeds_the_profile() {
        let backend = Arc::new(ScriptedBackend::new(vec![text_reply("Noted.")]));
        let mut agent = agent(backend.clone());
        agent.merge_profile(BTreeMap::from([(
            "goal".to_string(),
            ProfileValue::Str("marathon".to_string()),
        )]));

        agent.handle("remember my goal").await.unwrap();

        let seen = backend.seen.lock().unwrap();
        let system = seen[0].messages[0].text_content().unwrap();
        assert!(system.contains("FitCoach AI"));
        assert!(system.contains("marathon"));
    }
}
