//! Gemini API module
//!
//! HTTP client and wire types for the Gemini REST API.

pub mod api_client;
pub mod error;
pub mod types;

pub use api_client::{FragmentStream, GeminiClient, GenerativeApi};
pub use error::GenerationError;
pub use types::{Content, GeminiApiRequest, GeminiApiResponse, InlineData, Part};
