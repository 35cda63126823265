//! Host execution contract.
//!
//! - [`ExecuteFunctions`]: what a node may ask of its host
//! - [`ParameterResolver`]: typed per-item parameter access
//! - [`StaticExecutionContext`]: an in-memory host

mod execution;
mod host;
mod parameters;

pub use execution::{CredentialData, ExecuteFunctions};
pub use host::StaticExecutionContext;
pub use parameters::ParameterResolver;
