use tracing::debug;

use super::{single_input, TextureOperator};
use crate::backend::{Binding, InferenceHandler, ProgramDescriptor, TextureStore};
use crate::error::{OpError, OpResult};
use crate::kernel::generate_pack_kernel;
use crate::layout::TextureLayout;
use crate::tensor::Tensor;

/// Gathers each 2x2 block of the innermost axes into one four-channel texel.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackOperator;

impl PackOperator {
    pub const NAME: &'static str = "Pack";
}

impl TextureOperator for PackOperator {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn run(&self, handler: &mut InferenceHandler<'_>, inputs: &[Tensor]) -> OpResult<Vec<Tensor>> {
        single_input(Self::NAME, inputs)?;
        handler.run(self, inputs)
    }

    fn create_program_descriptor(
        &self,
        store: &dyn TextureStore,
        inputs: &[Tensor],
    ) -> OpResult<ProgramDescriptor> {
        let input = single_input(Self::NAME, inputs)?;
        let input_layout = store.get_or_create_layout(input)?;
        if input_layout.is_packed() {
            return Err(OpError::invalid_argument(format!(
                "{} is already packed",
                input.data_id()
            )));
        }
        let output_layout = TextureLayout::packed(input.shape(), store.config())?;
        let kernel = generate_pack_kernel(input.shape())?;

        debug!(
            input = %input.data_id(),
            shape = %input.shape(),
            width = output_layout.width,
            height = output_layout.height,
            "pack program"
        );

        Ok(ProgramDescriptor::new(
            kernel,
            vec![input_layout],
            output_layout,
            false,
            true,
        ))
    }

    fn create_binding(
        &self,
        store: &mut dyn TextureStore,
        descriptor: &ProgramDescriptor,
        inputs: &[Tensor],
    ) -> OpResult<Binding> {
        let input = single_input(Self::NAME, inputs)?;
        let input_layout = descriptor
            .input_layouts
            .first()
            .ok_or_else(|| OpError::invalid_argument("pack program declares no input layout"))?;
        let input_data = store.get_or_create_resource(input, input_layout)?;
        let output =
            store.create_resource_from_layout(&descriptor.output_layout, input_data.tensor.dtype())?;
        Ok(Binding::new(vec![input_data], output))
    }
}
