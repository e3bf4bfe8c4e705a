//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod dependency;
pub mod error;
pub mod registry;
pub mod sentinel;
pub mod tag;
pub mod template;

pub use config::{
    AgentKindSpec, AgentSpec, GroupSpec, InventoryConfig, LOCAL_AGENT, Settings, TaskSpec,
    TransmitMode, validate_inventory, validate_name,
};
pub use dependency::Dependency;
pub use error::{AgentError, InventoryError, RegistryError, TaskError};
pub use registry::Registry;
pub use sentinel::CommandOutcome;
pub use tag::Tag;
pub use template::Attributes;
