//! Packed and unpacked texture layouts for texture-backed tensors.
//!
//! Tensors live in 2-D textures. A packed texture stores the 2x2 block of the
//! two innermost axes in the four channels of one texel; an unpacked texture
//! stores one scalar per texel. This crate maps logical coordinates onto both
//! layouts, generates the kernels that convert between them, and wires those
//! kernels to an external execution engine and texture store.

pub mod backend;
pub mod config;
mod env;
pub mod error;
pub mod kernel;
pub mod layout;
pub mod ops;
pub mod packing;
pub mod tensor;

pub use backend::{
    Binding, CompiledKernel, ExecutionEngine, InferenceHandler, ProgramDescriptor, TextureData,
    TextureId, TextureStore,
};
pub use config::TexelConfig;
pub use error::{
    KernelBuildError, KernelCompileError, LayoutError, OpError, OpResult, ShapeError,
};
pub use layout::{Channels, TextureLayout};
pub use ops::{OperatorRegistry, PackOperator, TextureOperator, UnpackOperator};
pub use tensor::{DType, DataId, Shape, Tensor};
