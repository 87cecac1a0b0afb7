//! Texture operators.
//!
//! Every operator describes its program, binds resources for it, and runs through
//! an [`InferenceHandler`]. Operators are looked up by name in an
//! [`OperatorRegistry`].

mod pack;
mod registry;
mod unpack;

pub use pack::PackOperator;
pub use registry::OperatorRegistry;
pub use unpack::UnpackOperator;

use crate::backend::{Binding, InferenceHandler, ProgramDescriptor, TextureStore};
use crate::error::{OpError, OpResult};
use crate::tensor::Tensor;

pub trait TextureOperator: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, handler: &mut InferenceHandler<'_>, inputs: &[Tensor]) -> OpResult<Vec<Tensor>>;

    fn create_program_descriptor(
        &self,
        store: &dyn TextureStore,
        inputs: &[Tensor],
    ) -> OpResult<ProgramDescriptor>;

    fn create_binding(
        &self,
        store: &mut dyn TextureStore,
        descriptor: &ProgramDescriptor,
        inputs: &[Tensor],
    ) -> OpResult<Binding>;
}

fn single_input<'t>(op: &str, inputs: &'t [Tensor]) -> OpResult<&'t Tensor> {
    match inputs {
        [input] => Ok(input),
        _ => Err(OpError::invalid_argument(format!(
            "{op} expects exactly 1 input tensor, got {}",
            inputs.len()
        ))),
    }
}
