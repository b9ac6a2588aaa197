use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use tia_core::profile::ProfileUpdate;
use tia_core::render::Artifact;

use crate::conversation::SessionStore;
use crate::llm::{ChatMessage, LlmClient};
use crate::prompts;
use crate::tools::ToolRegistry;

/// One advisor turn: the texts to send back, in order, plus any rendered
/// artifacts (premium tables) produced by tool calls along the way.
#[derive(Debug, Default)]
pub struct AgentResponse {
    pub replies: Vec<String>,
    pub artifacts: Vec<Artifact>,
}

/// The envelope the system prompt asks the model to emit.
#[derive(Deserialize)]
struct ReplyEnvelope {
    #[serde(default)]
    next_responses: Vec<String>,
    #[serde(default)]
    updated_user_info_state: Option<ProfileUpdate>,
}

/// Drives one customer message through the prompt / tool / reply cycle.
///
/// The loop is deliberately shallow: at most one tool round per turn, then a
/// forced text completion. Tool payloads go back to the model verbatim; the
/// model's job is phrasing, never recomputing catalog answers.
pub struct AgentRuntime {
    llm: Arc<dyn LlmClient>,
    registry: ToolRegistry,
    sessions: SessionStore,
}

impl AgentRuntime {
    pub fn new(llm: Arc<dyn LlmClient>, registry: ToolRegistry, sessions: SessionStore) -> Self {
        Self { llm, registry, sessions }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Holds the user's session lock for the full turn, so overlapping
    /// deliveries for one customer run in sequence.
    #[instrument(skip(self, text), fields(user = user_id))]
    pub async fn process_message(&self, user_id: &str, text: &str) -> Result<AgentResponse> {
        let handle = self.sessions.session(user_id).await;
        let mut session = handle.lock().await;
        session.record_customer(text);

        let mut messages = vec![
            ChatMessage::system(prompts::ADVISOR_SYSTEM),
            ChatMessage::user(prompts::build_user_prompt(
                &session.window.transcript(),
                &session.profile,
            )),
        ];
        let schemas = prompts::tool_schemas();

        let mut reply = self.llm.complete(&messages, Some(&schemas)).await?;
        session.total_input_tokens += reply.usage.prompt_tokens;
        session.total_output_tokens += reply.usage.completion_tokens;

        let mut artifacts = Vec::new();
        if !reply.tool_calls.is_empty() {
            messages.push(ChatMessage::assistant_tool_calls(reply.raw_tool_calls.clone()));
            for call in &reply.tool_calls {
                debug!(tool = %call.name, "executing tool call");
                let outcome = self.registry.execute(&call.name, call.arguments.clone()).await?;
                if let Some(artifact) = outcome.artifact {
                    artifacts.push(artifact);
                }
                let payload = outcome.payload.to_string();
                messages.push(ChatMessage::tool_result(call.id.clone(), payload));
            }

            // Follow-up completion phrases the tool results; no further tools.
            reply = self.llm.complete(&messages, None).await?;
            session.total_input_tokens += reply.usage.prompt_tokens;
            session.total_output_tokens += reply.usage.completion_tokens;
        }

        let content = reply.content.unwrap_or_default();
        let (replies, update) = parse_reply(&content);
        if let Some(update) = update {
            session.merge_profile(update);
        }
        for line in &replies {
            session.record_assistant(line.clone());
        }

        info!(
            replies = replies.len(),
            artifacts = artifacts.len(),
            input_tokens = session.total_input_tokens,
            output_tokens = session.total_output_tokens,
            "turn complete"
        );

        Ok(AgentResponse { replies, artifacts })
    }
}

/// Decodes the model's JSON envelope, tolerating a Markdown code fence around
/// it. Anything unparseable is passed through as a single plain reply.
fn parse_reply(content: &str) -> (Vec<String>, Option<ProfileUpdate>) {
    let stripped = strip_code_fence(content);
    match serde_json::from_str::<ReplyEnvelope>(stripped) {
        Ok(envelope) => {
            let replies: Vec<String> = envelope
                .next_responses
                .into_iter()
                .filter(|line| !line.trim().is_empty())
                .collect();
            (replies, envelope.updated_user_info_state)
        }
        Err(error) => {
            if content.trim().is_empty() {
                warn!(%error, "model reply was empty");
                return (Vec::new(), None);
            }
            warn!(%error, "model reply was not the expected envelope, forwarding raw text");
            (vec![content.trim().to_string()], None)
        }
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Stock reply for inbound messages the runtime cannot read (audio, stickers,
/// reactions). Sent without consulting the model.
pub const UNSUPPORTED_MESSAGE_REPLY: &str =
    "I can only read text messages for now. Could you type that out for me?";

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    use tia_core::render::TextTableRenderer;
    use tia_db::{connect_memory, migrations, CatalogStore, SeedCatalog};

    use crate::conversation::SessionStore;
    use crate::llm::{
        ChatMessage, LlmClient, LlmReply, TokenUsage, ToolCallRequest, WireFunctionCall,
        WireToolCall,
    };
    use crate::tools::{CatalogToolkit, ToolRegistry};

    use super::{parse_reply, strip_code_fence, AgentRuntime};

    struct ScriptedLlm {
        replies: Mutex<Vec<LlmReply>>,
    }

    impl ScriptedLlm {
        fn new(mut replies: Vec<LlmReply>) -> Self {
            replies.reverse();
            Self { replies: Mutex::new(replies) }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _tools: Option<&Value>,
        ) -> Result<LlmReply> {
            Ok(self.replies.lock().expect("lock").pop().expect("scripted reply available"))
        }
    }

    fn text_reply(envelope: Value) -> LlmReply {
        LlmReply {
            content: Some(envelope.to_string()),
            usage: TokenUsage { prompt_tokens: 10, completion_tokens: 5 },
            ..Default::default()
        }
    }

    fn tool_call_reply(name: &str, arguments: Value) -> LlmReply {
        let raw = WireToolCall {
            id: "call_1".to_string(),
            call_type: "function".to_string(),
            function: WireFunctionCall { name: name.to_string(), arguments: arguments.to_string() },
        };
        LlmReply {
            content: None,
            tool_calls: vec![ToolCallRequest {
                id: "call_1".to_string(),
                name: name.to_string(),
                arguments,
            }],
            raw_tool_calls: vec![raw],
            usage: TokenUsage { prompt_tokens: 20, completion_tokens: 8 },
        }
    }

    async fn seeded_registry() -> ToolRegistry {
        let pool = connect_memory().await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        SeedCatalog::load(&pool).await.expect("seed");
        CatalogToolkit::registry(CatalogStore::new(pool), Arc::new(TextTableRenderer), 2)
    }

    fn runtime(replies: Vec<LlmReply>, registry: ToolRegistry) -> AgentRuntime {
        AgentRuntime::new(Arc::new(ScriptedLlm::new(replies)), registry, SessionStore::new(5))
    }

    #[tokio::test]
    async fn plain_turn_parses_envelope_and_updates_profile() {
        let runtime = runtime(
            vec![text_reply(json!({
                "next_responses": ["Hi Ravi!", "How old are you?"],
                "updated_user_info_state": {"name": "Ravi"}
            }))],
            seeded_registry().await,
        );

        let response =
            runtime.process_message("+911111111111", "hi, I'm Ravi").await.expect("turn");
        assert_eq!(response.replies, vec!["Hi Ravi!", "How old are you?"]);
        assert!(response.artifacts.is_empty());

        let handle = runtime.sessions().session("+911111111111").await;
        let session = handle.lock().await;
        assert_eq!(session.profile.name.as_deref(), Some("Ravi"));
        assert_eq!(session.profile.version, 1);
        // customer message + two assistant lines
        assert_eq!(session.window.len(), 3);
        assert_eq!(session.total_input_tokens, 10);
    }

    #[tokio::test]
    async fn tool_round_collects_artifact_and_phrases_result() {
        let runtime = runtime(
            vec![
                tool_call_reply(
                    "basic_plan_and_premium_lookup",
                    json!({"age": 32, "term": 11, "coverage_amount": 1500000, "income": 600000}),
                ),
                text_reply(json!({
                    "next_responses": ["Here are plans that fit your profile."],
                    "updated_user_info_state": {}
                })),
            ],
            seeded_registry().await,
        );

        let response =
            runtime.process_message("+912222222222", "show me plans").await.expect("turn");
        assert_eq!(response.replies, vec!["Here are plans that fit your profile."]);
        assert_eq!(response.artifacts.len(), 1);

        let handle = runtime.sessions().session("+912222222222").await;
        let session = handle.lock().await;
        // both completions contribute to the token totals
        assert_eq!(session.total_input_tokens, 30);
        assert_eq!(session.total_output_tokens, 13);
    }

    #[tokio::test]
    async fn overlapping_turns_for_one_user_both_land() {
        let runtime = runtime(
            vec![
                text_reply(json!({"next_responses": ["Term insurance pays out a fixed sum."]})),
                text_reply(json!({"next_responses": ["Ten to fifteen times income is typical."]})),
            ],
            seeded_registry().await,
        );

        let (first, second) = tokio::join!(
            runtime.process_message("+914444444444", "what is term insurance?"),
            runtime.process_message("+914444444444", "how much cover do I need?"),
        );
        first.expect("first turn");
        second.expect("second turn");

        let handle = runtime.sessions().session("+914444444444").await;
        let session = handle.lock().await;
        // both customer messages and both assistant lines, nothing overwritten
        assert_eq!(session.window.len(), 4);
        assert_eq!(session.total_input_tokens, 20);
        assert_eq!(session.total_output_tokens, 10);
    }

    #[tokio::test]
    async fn unparseable_reply_is_forwarded_verbatim() {
        let raw = LlmReply {
            content: Some("Sorry, let me rephrase that.".to_string()),
            ..Default::default()
        };
        let runtime = runtime(vec![raw], seeded_registry().await);

        let response = runtime.process_message("+913333333333", "hello").await.expect("turn");
        assert_eq!(response.replies, vec!["Sorry, let me rephrase that."]);
    }

    #[test]
    fn fence_stripping_handles_json_and_bare_fences() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn envelope_with_blank_lines_is_filtered() {
        let (replies, update) = parse_reply(
            "```json\n{\"next_responses\": [\"keep\", \"  \"], \"updated_user_info_state\": {\"age\": 32}}\n```",
        );
        assert_eq!(replies, vec!["keep"]);
        assert!(update.is_some());
    }
}
