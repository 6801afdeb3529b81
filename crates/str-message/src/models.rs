//! These models represent the canonical conversation objects
//!
//! Every provider payload is converted into [`message::Message`] on the way in,
//! and projected back out into the shape a provider expects on the way out.
//! Tool calls are correlated with their outputs through a
//! [`registry::ToolCallRegistry`] owned by the [`conversation::Conversation`].
pub mod content;
pub mod conversation;
pub mod message;
pub mod registry;
pub mod tool;
pub mod usage;
