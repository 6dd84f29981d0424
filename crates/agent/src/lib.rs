//! Agent-facing surface of the bid card engine.
//!
//! The external conversational agent drives bid cards through three tools:
//! `generate_bid_card` produces a draft, `save_bid_card` commits it, and
//! `update_bid_card` applies a partial update. Every call returns a
//! status-discriminated JSON envelope.
//!
//! # Modules
//!
//! - `workflow` - service calls followed by lifecycle event emission
//! - `tools` - the `Tool` trait, registry and the three bid card tools
//! - `runtime` - name-based dispatch used by the HTTP tool route
//! - `a2a` - JSON-RPC `tasks/send` delivery of events to a peer agent

pub mod a2a;
pub mod runtime;
pub mod tools;
pub mod workflow;

pub use a2a::A2aEventPublisher;
pub use runtime::AgentRuntime;
pub use tools::{Tool, ToolRegistry};
pub use workflow::BidCardWorkflow;
