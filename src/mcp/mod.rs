//! MCP (Model Context Protocol) server: the aggregator exposed as remote tools.

pub mod server;
mod tools;

pub use server::McpServer;
pub use tools::{Tool, ToolHandler, ToolRegistry};
