//! Agent facade: a session driven by an orchestrator.
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use interlink::agent::{Agent, AgentConfiguration, Session};
//! use interlink::config::LlmSettings;
//!
//! let config = AgentConfiguration::new("journalist")
//!     .with_instructions("Act as sports journalist");
//! let mut agent = Agent::new(Session::new(config), &LlmSettings::default())?;
//! let answer = agent.call("Who won the match?").await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod configuration;
pub mod session;

pub use configuration::{AgentConfiguration, LlmConfiguration};
pub use session::Session;

use crate::config::LlmSettings;
use crate::errors::{AgentError, TransportError};
use crate::llm::{ChatBackend, ChatClient, Orchestrator};

pub struct Agent<B: ChatBackend = ChatClient> {
    orchestrator: Orchestrator<B>,
}

impl Agent {
    /// Agent talking to the backend selected by the session's provider.
    pub fn new(session: Session, settings: &LlmSettings) -> Result<Self, TransportError> {
        Ok(Self {
            orchestrator: session.into_orchestrator(settings)?,
        })
    }
}

impl<B: ChatBackend> Agent<B> {
    pub fn with_backend(session: Session, backend: B) -> Self {
        Self {
            orchestrator: Orchestrator::new(session, backend),
        }
    }

    /// Ask the agent and wait for its final answer.
    pub async fn call(&mut self, prompt: impl Into<String>) -> Result<String, AgentError> {
        self.orchestrator.call(prompt).await
    }

    pub async fn resume(&mut self) -> Result<String, AgentError> {
        self.orchestrator.resume().await
    }

    pub fn session(&self) -> &Session {
        self.orchestrator.session()
    }

    pub fn into_session(self) -> Session {
        self.orchestrator.into_session()
    }
}
