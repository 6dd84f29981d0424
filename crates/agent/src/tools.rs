use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use instabids_core::builder::BidCardRequest;
use instabids_core::domain::bid_card::{BidCardId, HomeownerId};
use instabids_core::envelope::{CreateEnvelope, DraftEnvelope, UpdateEnvelope};
use instabids_core::errors::BidCardError;
use serde::Deserialize;
use serde_json::Value;

use crate::workflow::BidCardWorkflow;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    async fn execute(&self, input: Value) -> Result<Value>;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Registry holding the three bid card tools over one workflow.
    pub fn bid_card_tools(workflow: Arc<BidCardWorkflow>) -> Self {
        let mut registry = Self::default();
        registry.register(GenerateBidCardTool::new(workflow.clone()));
        registry.register(SaveBidCardTool::new(workflow.clone()));
        registry.register(UpdateBidCardTool::new(workflow));
        registry
    }

    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(Box::as_ref)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

pub struct GenerateBidCardTool {
    workflow: Arc<BidCardWorkflow>,
}

impl GenerateBidCardTool {
    pub fn new(workflow: Arc<BidCardWorkflow>) -> Self {
        Self { workflow }
    }
}

#[async_trait]
impl Tool for GenerateBidCardTool {
    fn name(&self) -> &'static str {
        "generate_bid_card"
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let outcome = serde_json::from_value::<BidCardRequest>(input)
            .map_err(|error| BidCardError::Internal(error.to_string()))
            .and_then(|request| self.workflow.generate(request));
        Ok(serde_json::to_value(DraftEnvelope::from(outcome))?)
    }
}

#[derive(Debug, Deserialize)]
struct SaveArguments {
    homeowner_id: HomeownerId,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(flatten)]
    request: BidCardRequest,
}

pub struct SaveBidCardTool {
    workflow: Arc<BidCardWorkflow>,
}

impl SaveBidCardTool {
    pub fn new(workflow: Arc<BidCardWorkflow>) -> Self {
        Self { workflow }
    }
}

#[async_trait]
impl Tool for SaveBidCardTool {
    fn name(&self) -> &'static str {
        "save_bid_card"
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let outcome = match parse_arguments::<SaveArguments>(self.name(), input) {
            Ok(args) => {
                self.workflow
                    .create(&args.homeowner_id, args.session_id.as_deref(), args.request)
                    .await
            }
            Err(error) => Err(error),
        };
        Ok(serde_json::to_value(CreateEnvelope::from(outcome))?)
    }
}

#[derive(Debug, Deserialize)]
struct UpdateArguments {
    bid_card_id: BidCardId,
    updates: Value,
    #[serde(default)]
    session_id: Option<String>,
}

pub struct UpdateBidCardTool {
    workflow: Arc<BidCardWorkflow>,
}

impl UpdateBidCardTool {
    pub fn new(workflow: Arc<BidCardWorkflow>) -> Self {
        Self { workflow }
    }
}

#[async_trait]
impl Tool for UpdateBidCardTool {
    fn name(&self) -> &'static str {
        "update_bid_card"
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let outcome = match parse_arguments::<UpdateArguments>(self.name(), input) {
            Ok(args) => {
                self.workflow
                    .update(&args.bid_card_id, args.session_id.as_deref(), args.updates)
                    .await
            }
            Err(error) => Err(error),
        };
        Ok(serde_json::to_value(UpdateEnvelope::from(outcome))?)
    }
}

fn parse_arguments<T: for<'de> Deserialize<'de>>(
    tool: &str,
    input: Value,
) -> Result<T, BidCardError> {
    serde_json::from_value(input)
        .map_err(|error| BidCardError::Input(format!("Invalid arguments for {tool}: {error}")))
}
