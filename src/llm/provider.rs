use super::{ChatClient, Orchestrator};
use crate::agent::Session;
use crate::config::LlmSettings;
use crate::errors::TransportError;
use anyhow::bail;
use std::fmt;
use std::str::FromStr;

/// Supported model backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Provider {
    #[default]
    OpenAi,
}

impl Provider {
    /// Orchestrator over a transport for this provider.
    pub fn build_orchestrator(
        self,
        session: Session,
        settings: &LlmSettings,
    ) -> Result<Orchestrator, TransportError> {
        match self {
            Self::OpenAi => {
                let mut client = ChatClient::new(settings)?;
                if let Some(key) = &session.configuration().llm.api_key {
                    client = client.with_api_key(key.clone());
                }
                Ok(Orchestrator::new(session, client))
            }
        }
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open_ai" | "openai" => Ok(Self::OpenAi),
            other => bail!("Unknown provider: {}", other),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAi => write!(f, "open_ai"),
        }
    }
}
