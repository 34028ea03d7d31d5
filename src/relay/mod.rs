pub mod engine;
pub mod error;
pub mod handler;
pub mod key_ring;
pub mod upstream;

pub use engine::{Prompt, RelayEngine};
pub use error::RelayError;
pub use handler::RelayHandler;
pub use key_ring::{KeyRing, KeyTier};
pub use upstream::{GeminiClient, Generator, RemoteError};
