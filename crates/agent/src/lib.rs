//! Agent runtime - the conversational layer of TIA.
//!
//! This crate glues the language model to the deterministic catalog:
//! - **Conversation** (`conversation`) - bounded per-user message window,
//!   the versioned customer profile, and the session store
//! - **Prompts** (`prompts`) - the advisor system prompt, per-turn user
//!   prompt, and the tool schemas advertised to the model
//! - **LLM boundary** (`llm`) - role-tagged messages in, text or tool-call
//!   requests out, behind a pluggable trait
//! - **Tools** (`tools`) - the five catalog operations the model may invoke
//! - **Runtime** (`runtime`) - the constrained loop: prompt, optional tool
//!   round, parse, merge profile, reply
//!
//! The model never decides eligibility or ranking. Those are deterministic
//! answers from `tia-db`/`tia-core`; the model only phrases them.

pub mod conversation;
pub mod llm;
pub mod prompts;
pub mod runtime;
pub mod tools;

pub use conversation::{ChatSession, ConversationWindow, SessionStore, Speaker};
pub use llm::{ChatMessage, ChatRole, LlmClient, LlmReply, OpenAiChatClient, ToolCallRequest};
pub use runtime::{AgentResponse, AgentRuntime, UNSUPPORTED_MESSAGE_REPLY};
pub use tools::{CatalogToolkit, Tool, ToolOutcome, ToolRegistry};
