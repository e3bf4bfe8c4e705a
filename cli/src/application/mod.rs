//! Application layer: port trait definitions and use-case orchestration.
//!
//! This module depends only on `crate::domain`, never on `crate::infra`,
//! `crate::commands`, or `crate::output`.

pub mod ports;
pub mod services;

pub use ports::{Connector, InventoryStore, NullSink, TagSink, Wiring};
pub use services::agent::{
    Agent, AgentBuilder, AgentKind, AgentRef, AgentReport, Endpoint, Operation, RemoteTarget,
    aggregate_exit_code,
};
pub use services::agents::AgentRegistry;
pub use services::dispatch::{Dispatcher, Step, StepReport};
pub use services::inventory::Inventory;
pub use services::task::{Procedure, Task, TaskBuilder, TaskRegistry, procedure, scripted};
