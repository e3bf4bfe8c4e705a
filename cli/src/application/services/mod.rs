//! Application services: agents, groups, tasks and dispatch.
//!
//! Services import only from `crate::domain` and `crate::application::ports`,
//! never from `crate::infra`, `crate::commands`, or `crate::output`.

pub mod agent;
pub mod agents;
pub mod dispatch;
pub mod group;
pub mod inventory;
pub mod session;
pub mod task;
