pub mod chat;
pub mod gemini;

pub use chat::{ChatRequest, ChatResponse, ErrorResponse};
pub use gemini::{GenerateContentRequest, GenerateContentResponse, GeminiError};
