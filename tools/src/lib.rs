//! Fitness tool implementations and the registry that exposes them to the
//! completion endpoint as callable functions.

pub mod body;
pub mod context;
pub mod export;
pub mod integrations;
pub mod nutrition;
pub mod registry;
pub mod repair;
pub mod routes;
pub mod tracker;
pub mod usda;
pub mod vision;
pub mod workout;

pub use context::ToolContext;
pub use registry::{declarations, ToolName, ToolRegistry};
