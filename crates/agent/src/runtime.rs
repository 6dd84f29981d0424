use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::tools::ToolRegistry;
use crate::workflow::BidCardWorkflow;

/// Dispatches tool calls from the conversational agent.
///
/// Every call yields a JSON envelope; failures are reported in-band with
/// `status: "error"` rather than as transport errors.
pub struct AgentRuntime {
    workflow: Arc<BidCardWorkflow>,
    tools: ToolRegistry,
}

impl AgentRuntime {
    pub fn new(workflow: BidCardWorkflow) -> Self {
        let workflow = Arc::new(workflow);
        let tools = ToolRegistry::bid_card_tools(workflow.clone());
        Self { workflow, tools }
    }

    pub fn workflow(&self) -> &BidCardWorkflow {
        &self.workflow
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.names()
    }

    pub async fn handle_tool_call(&self, name: &str, arguments: Value) -> Value {
        let Some(tool) = self.tools.get(name) else {
            warn!(event_name = "agent.tool.unknown", tool = name, "tool call rejected");
            return error_envelope(format!("Unknown tool: {name}"));
        };

        match tool.execute(arguments).await {
            Ok(envelope) => {
                let status = envelope.get("status").and_then(Value::as_str).unwrap_or("unknown");
                info!(
                    event_name = "agent.tool.completed",
                    tool = name,
                    status,
                    "tool call completed"
                );
                envelope
            }
            Err(error) => {
                warn!(
                    event_name = "agent.tool.failed",
                    tool = name,
                    error = %error,
                    "tool call failed"
                );
                error_envelope(error.to_string())
            }
        }
    }
}

fn error_envelope(message: String) -> Value {
    json!({ "status": "error", "error": message })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use instabids_core::events::{BidCardEventPayload, InMemoryEventPublisher};
    use instabids_core::service::BidCardService;
    use instabids_db::InMemoryBidCardRepository;
    use serde_json::json;

    use super::AgentRuntime;
    use crate::workflow::BidCardWorkflow;

    fn runtime(publisher: InMemoryEventPublisher) -> AgentRuntime {
        let service = BidCardService::new(Arc::new(InMemoryBidCardRepository::default()));
        AgentRuntime::new(BidCardWorkflow::new(service, Arc::new(publisher)))
    }

    #[tokio::test]
    async fn unknown_tool_returns_error_envelope() {
        let runtime = runtime(InMemoryEventPublisher::default());

        let output = runtime.handle_tool_call("search_contractors", json!({})).await;

        assert_eq!(output["status"], json!("error"));
        assert_eq!(output["error"], json!("Unknown tool: search_contractors"));
    }

    #[tokio::test]
    async fn save_tool_call_emits_created_event_with_session() {
        let publisher = InMemoryEventPublisher::default();
        let runtime = runtime(publisher.clone());

        let output = runtime
            .handle_tool_call(
                "save_bid_card",
                json!({
                    "homeowner_id": "h42",
                    "session_id": "chat-7",
                    "project_type": "fence installation",
                    "project_scope": "120 ft cedar fence",
                    "timeline": {"duration_weeks": 2},
                    "location": {"city": "Portland", "state": "OR"},
                    "budget_range": {"min": 4000, "max": 6500}
                }),
            )
            .await;

        assert_eq!(output["status"], json!("success"));
        let events = publisher.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].session_id, "chat-7");
        assert!(matches!(events[0].payload, BidCardEventPayload::BidCardCreated { .. }));
        assert_eq!(runtime.tool_names().len(), 3);
    }

    #[tokio::test]
    async fn update_of_missing_card_reports_not_found() {
        let runtime = runtime(InMemoryEventPublisher::default());

        let output = runtime
            .handle_tool_call(
                "update_bid_card",
                json!({"bid_card_id": "missing", "updates": {"project_scope": "x"}}),
            )
            .await;

        assert_eq!(output["status"], json!("error"));
        assert_eq!(output["error"], json!("Bid card not found: missing"));
        assert_eq!(output["bid_card"], json!(null));
    }
}
