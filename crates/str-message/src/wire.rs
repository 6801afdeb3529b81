//! Provider wire formats, treated as plain data
//!
//! - chat completion messages, requests and responses
//! - Response API input items, including MCP listings and calls
pub mod chat;
pub mod responses;
