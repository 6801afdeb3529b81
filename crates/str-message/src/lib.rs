pub mod classify;
pub mod errors;
pub mod models;
pub mod objectid;
pub mod prompt_template;
pub mod serialize;
pub mod settings;
pub mod wire;

pub use classify::{messages_from_any, AnyMessage};
pub use errors::{MessageError, MessageResult, SettingsError};
pub use models::content::{ContentPart, ContentPartType, DataUrl};
pub use models::conversation::{Conversation, UsageRecord};
pub use models::message::{Channel, Message, MessageKind, Role};
pub use models::registry::ToolCallRegistry;
pub use models::tool::FunctionDefinition;
pub use models::usage::{ModelPricing, PriceTable, StaticPriceTable, Usage};
pub use serialize::transcript::InstructionOptions;
pub use settings::Settings;
