// Models module - data structures shared by the gateway crates
pub mod events;
pub mod registry;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use events::{ErrorInfo, EventKind, StreamEvent, Usage, UNKNOWN_CONVERSATION_ID};
pub use registry::{
    CatalogModel, CatalogProvider, ModelConfig, ModelRegistry, Provider, UnknownModel,
    DEFAULT_MODEL, PROVIDER_CATALOG,
};
pub use types::{ChatRequest, ContentPart, Message, MessageContent, Role, ValidationError};
