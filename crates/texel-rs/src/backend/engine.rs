use std::sync::Arc;

use super::program::{Binding, ProgramDescriptor};
use super::store::TextureStore;
use crate::error::{KernelCompileError, OpResult};

/// A program accepted by an engine, ready to dispatch.
#[derive(Debug, Clone)]
pub struct CompiledKernel {
    pub fingerprint: u64,
    pub descriptor: ProgramDescriptor,
}

/// Compiles generated programs and submits them against a texture store.
///
/// A compile failure is final: the same descriptor always produces the same
/// source, so callers never retry.
pub trait ExecutionEngine {
    fn engine_name(&self) -> &str;

    fn compile(
        &self,
        descriptor: &ProgramDescriptor,
    ) -> Result<Arc<CompiledKernel>, KernelCompileError>;

    fn dispatch(
        &self,
        kernel: &CompiledKernel,
        binding: &Binding,
        store: &mut dyn TextureStore,
    ) -> OpResult<()>;
}
