//! Tool handlers.
//!
//! Each handler receives arguments already normalized by its schema and
//! deserialized into a typed struct.

use crate::{error::ToolError, roots::AllowedRoots};
use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;

pub mod file_analyzer;
pub mod greeting;
pub mod system_info;

pub use file_analyzer::FileAnalyzer;
pub use greeting::Greeting;
pub use system_info::SystemInfo;

/// Uniform execution contract shared by every tool.
pub trait Tool: Send + Sync {
    /// Typed arguments produced from the validated argument map.
    type Args: DeserializeOwned + Send;
    /// Structured result, serialized into the success envelope.
    type Output: Serialize + Send;

    fn execute(
        &self,
        args: Self::Args,
        roots: &AllowedRoots,
    ) -> impl Future<Output = Result<Self::Output, ToolError>> + Send;
}
