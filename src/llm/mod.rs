// LLM abstraction layer

pub mod dispatcher;
pub mod inference;
pub mod mock;
pub mod provider;

pub use dispatcher::*;
pub use inference::InferenceAdapter;
pub use mock::MockLLMAdapter;
pub use provider::*;
