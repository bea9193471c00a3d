//! Tool registry and the dispatch boundary.
//!
//! [`Dispatcher::dispatch`] is the only way a call reaches a handler. It
//! looks the tool up, validates the arguments against its schema, runs the
//! handler and folds every outcome, including a panic, into an
//! [`Envelope`]. Nothing escapes unwrapped.

use crate::{
    error::ToolError,
    roots::AllowedRoots,
    schema::{Arguments, Schema},
    tools::{self, FileAnalyzer, Greeting, SystemInfo, Tool},
};
use futures::FutureExt;
use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::Value;
use std::{any::Any, future::Future, panic::AssertUnwindSafe, sync::Arc};

/// Handler behind a registered tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Greeting,
    FileAnalyzer,
    SystemInfo,
}

/// A registered tool: its public name, description and input schema.
#[derive(Debug)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub schema: &'static Schema,
    pub kind: ToolKind,
}

static TOOLS: [ToolDescriptor; 3] = [
    ToolDescriptor {
        name: "hello",
        description: "A simple greeting tool",
        schema: &tools::greeting::SCHEMA,
        kind: ToolKind::Greeting,
    },
    ToolDescriptor {
        name: "file_analyzer",
        description: "Analyze files in allowed directories",
        schema: &tools::file_analyzer::SCHEMA,
        kind: ToolKind::FileAnalyzer,
    },
    ToolDescriptor {
        name: "system_info",
        description: "Get runtime and system information",
        schema: &tools::system_info::SCHEMA,
        kind: ToolKind::SystemInfo,
    },
];

/// The fixed set of tools, in discovery order.
#[derive(Debug, Clone, Copy)]
pub struct Registry {
    tools: &'static [ToolDescriptor],
}

impl Default for Registry {
    fn default() -> Self {
        Self { tools: &TOOLS }
    }
}

impl Registry {
    pub fn list(&self) -> &'static [ToolDescriptor] {
        self.tools
    }

    pub fn get(&self, name: &str) -> Option<&'static ToolDescriptor> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    /// Look up `name` and normalize `arguments` against its schema.
    pub fn validate(
        &self,
        name: &str,
        arguments: &Arguments,
    ) -> Result<(&'static ToolDescriptor, Arguments), ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_owned()))?;
        let arguments = tool.schema.validate(arguments)?;
        Ok((tool, arguments))
    }
}

/// Error details of a failure envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Offending argument, for `InvalidArguments`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

/// Uniform response for every tool call.
///
/// Serializes as `{ success, ...payload, tool }` or
/// `{ success: false, error: { message, type }, tool }`.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Success { tool: String, payload: Arguments },
    Failure { tool: String, error: ErrorBody },
}

impl Envelope {
    pub fn failure(tool: &str, error: &ToolError) -> Self {
        let field = match error {
            ToolError::InvalidArguments(e) => Some(e.field()),
            _ => None,
        };
        Envelope::Failure {
            tool: tool.to_owned(),
            error: ErrorBody {
                message: error.to_string(),
                kind: error.kind(),
                field,
            },
        }
    }

    /// Whether the handler ran to completion. A soft error inside the
    /// payload still counts as success.
    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success { .. })
    }

    pub fn tool(&self) -> &str {
        match self {
            Envelope::Success { tool, .. } | Envelope::Failure { tool, .. } => tool,
        }
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            Envelope::Success { tool, payload } => {
                let success = payload
                    .get("success")
                    .and_then(Value::as_bool)
                    .unwrap_or(true);
                map.serialize_entry("success", &success)?;
                for (key, value) in payload {
                    if key != "success" && key != "tool" {
                        map.serialize_entry(key, value)?;
                    }
                }
                map.serialize_entry("tool", tool)?;
            }
            Envelope::Failure { tool, error } => {
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", error)?;
                map.serialize_entry("tool", tool)?;
            }
        }
        map.end()
    }
}

/// Routes calls to handlers. Cheap to clone; all state is read-only.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Registry,
    roots: Arc<AllowedRoots>,
}

impl Dispatcher {
    pub fn new(roots: AllowedRoots) -> Self {
        Self {
            registry: Registry::default(),
            roots: Arc::new(roots),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn roots(&self) -> &AllowedRoots {
        &self.roots
    }

    /// Run one tool call and wrap the outcome.
    pub async fn dispatch(&self, name: &str, arguments: Arguments) -> Envelope {
        match self.run(name, &arguments).await {
            Ok(payload) => Envelope::Success {
                tool: name.to_owned(),
                payload,
            },
            Err(e) => {
                tracing::error!(tool = name, kind = e.kind(), "tool call failed: {e}");
                Envelope::failure(name, &e)
            }
        }
    }

    async fn run(&self, name: &str, arguments: &Arguments) -> Result<Arguments, ToolError> {
        let (tool, arguments) = self.registry.validate(name, arguments)?;
        tracing::debug!(tool = name, "dispatching");
        let roots = self.roots.as_ref();
        guard(async move {
            match tool.kind {
                ToolKind::Greeting => invoke(&Greeting, arguments, roots).await,
                ToolKind::FileAnalyzer => invoke(&FileAnalyzer, arguments, roots).await,
                ToolKind::SystemInfo => invoke(&SystemInfo, arguments, roots).await,
            }
        })
        .await
    }
}

/// Deserialize validated arguments, execute, and serialize the output.
async fn invoke<T: Tool>(
    tool: &T,
    arguments: Arguments,
    roots: &AllowedRoots,
) -> Result<Arguments, ToolError> {
    let args: T::Args = serde_json::from_value(Value::Object(arguments))?;
    let output = tool.execute(args, roots).await?;
    Ok(match serde_json::to_value(output)? {
        Value::Object(payload) => payload,
        other => Arguments::from_iter([("result".to_owned(), other)]),
    })
}

/// Convert a panic inside a handler into a `HandlerError`.
async fn guard<F>(handler: F) -> Result<Arguments, ToolError>
where
    F: Future<Output = Result<Arguments, ToolError>>,
{
    AssertUnwindSafe(handler)
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            let message = panic_message(panic.as_ref());
            tracing::error!("tool handler panicked: {message}");
            Err(ToolError::Panicked(message))
        })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
