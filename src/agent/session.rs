//! Conversation state: an immutable configuration plus the message history.

use super::AgentConfiguration;
use crate::config::LlmSettings;
use crate::errors::TransportError;
use crate::llm::Orchestrator;
use crate::types::Message;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use ulid::Ulid;

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    configuration: Arc<AgentConfiguration>,
    messages: Vec<Message>,
    tool_results: HashMap<String, String>,
}

impl Session {
    pub fn new(configuration: AgentConfiguration) -> Self {
        Self::shared(Arc::new(configuration))
    }

    /// Several sessions may share one configuration.
    pub fn shared(configuration: Arc<AgentConfiguration>) -> Self {
        Self {
            id: Ulid::new().to_string(),
            configuration,
            messages: Vec::new(),
            tool_results: HashMap::new(),
        }
    }

    pub fn configuration(&self) -> &AgentConfiguration {
        &self.configuration
    }

    pub fn add_message(&mut self, message: Message) {
        debug!("Session {}: +{} message", self.id, message.role);
        self.messages.push(message);
    }

    /// Stored history, without the system message.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// History as sent to the backend: the instructions as a system message,
    /// then every stored message.
    pub fn all_messages(&self) -> Vec<Message> {
        std::iter::once(Message::system(self.configuration.instructions.clone()))
            .chain(self.messages.iter().cloned())
            .collect()
    }

    pub(crate) fn cached_tool_result(&self, name: &str, arguments: &str) -> Option<&str> {
        self.tool_results
            .get(&cache_key(name, arguments))
            .map(String::as_str)
    }

    pub(crate) fn cache_tool_result(&mut self, name: &str, arguments: &str, result: &str) {
        self.tool_results
            .insert(cache_key(name, arguments), result.to_string());
    }

    /// Hand the session to an orchestrator built by its provider.
    pub fn into_orchestrator(self, settings: &LlmSettings) -> Result<Orchestrator, TransportError> {
        let provider = self.configuration.llm.provider;
        provider.build_orchestrator(self, settings)
    }
}

fn cache_key(name: &str, arguments: &str) -> String {
    format!("{} -> {}", name, arguments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatRole;

    #[test]
    fn system_message_is_virtual() {
        let mut session =
            Session::new(AgentConfiguration::new("a").with_instructions("Be brief"));
        session.add_message(Message::user("Q"));
        session.add_message(Message::assistant(Some("A".into())));

        assert_eq!(session.messages().len(), 2);
        let all = session.all_messages();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].role, ChatRole::System);
        assert_eq!(all[0].content.as_deref(), Some("Be brief"));
        assert_eq!(all[1].content.as_deref(), Some("Q"));
        assert_eq!(session.last_message().unwrap().role, ChatRole::Assistant);
    }

    #[test]
    fn tool_cache_is_keyed_by_name_and_arguments() {
        let mut session = Session::new(AgentConfiguration::new("a"));
        session.cache_tool_result("sum", r#"{"a":1}"#, "1");

        assert_eq!(session.cached_tool_result("sum", r#"{"a":1}"#), Some("1"));
        assert_eq!(session.cached_tool_result("sum", r#"{"a":2}"#), None);
        assert_eq!(session.cached_tool_result("diff", r#"{"a":1}"#), None);
    }

    #[test]
    fn sessions_sharing_configuration_have_distinct_ids() {
        let config = Arc::new(AgentConfiguration::new("a"));
        let first = Session::shared(config.clone());
        let second = Session::shared(config);
        assert_ne!(first.id, second.id);
        assert_eq!(first.configuration().id, second.configuration().id);
    }
}
