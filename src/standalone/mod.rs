//! MCP serving surface: the rmcp server handler and config hot-reload.

pub mod hot_reload;
pub mod server;
