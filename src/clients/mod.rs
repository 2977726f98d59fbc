pub mod gemini;
pub mod scripted;
pub mod traits;

pub use gemini::GeminiClient;
pub use scripted::ScriptedModel;
pub use traits::{ModelCapability, ModelError};
