//! MCP extension server with a fixed set of sandboxed tools.
//!
//! Three tools are registered at startup: `hello`, `file_analyzer` and
//! `system_info`. Every call goes through the [`Dispatcher`], which
//! validates arguments against the tool's schema, runs the handler and
//! returns a uniform JSON [`Envelope`]. File access is restricted to the
//! [`AllowedRoots`] configured at startup.

use rmcp::{
    RoleServer, ServerHandler,
    model::{
        CallToolRequestParams, CallToolResult, Content, ErrorData, Implementation,
        ListToolsResult, PaginatedRequestParams, ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
};
use std::sync::Arc;

pub mod dispatch;
pub mod error;
pub mod roots;
pub mod schema;
pub mod tools;

pub use dispatch::{Dispatcher, Envelope};
pub use roots::AllowedRoots;

/// Server name reported to clients and in tool payloads.
pub const SERVER_NAME: &str = "wmcp-extension";

/// MCP server exposing the registered tools over any rmcp transport.
#[derive(Debug, Clone)]
pub struct ExtensionServer {
    dispatcher: Dispatcher,
}

impl ExtensionServer {
    pub fn new(roots: AllowedRoots) -> Self {
        Self {
            dispatcher: Dispatcher::new(roots),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Tool definitions advertised to clients, in registry order.
    pub fn tools(&self) -> Vec<Tool> {
        self.dispatcher
            .registry()
            .list()
            .iter()
            .map(|tool| {
                Tool::new(
                    tool.name,
                    tool.description,
                    Arc::new(tool.schema.to_json_schema()),
                )
            })
            .collect()
    }
}

impl ServerHandler for ExtensionServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.into(),
                title: Some("Walrus MCP Extension Server".into()),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(
                "Extension server providing greeting, sandboxed file analysis and system info tools."
                    .into(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let arguments = request.arguments.unwrap_or_default();
        let envelope = self.dispatcher.dispatch(&request.name, arguments).await;
        let text = serde_json::to_string_pretty(&envelope)
            .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;
        let content = vec![Content::text(text)];
        Ok(if envelope.is_success() {
            CallToolResult::success(content)
        } else {
            CallToolResult::error(content)
        })
    }
}
