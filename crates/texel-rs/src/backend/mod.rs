//! Collaborator interfaces and the per-call execution context.

pub mod engine;
pub mod handler;
pub mod hashing;
pub mod program;
pub mod store;

pub use engine::{CompiledKernel, ExecutionEngine};
pub use handler::InferenceHandler;
pub use program::{Binding, ProgramDescriptor};
pub use store::{TextureData, TextureId, TextureStore};
