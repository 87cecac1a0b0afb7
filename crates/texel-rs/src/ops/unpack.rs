use tracing::debug;

use super::{single_input, TextureOperator};
use crate::backend::{Binding, InferenceHandler, ProgramDescriptor, TextureStore};
use crate::error::{OpError, OpResult};
use crate::kernel::build_unpack_kernel;
use crate::packing::{channel_symbols, source_coord_expr};
use crate::tensor::Tensor;

/// Expands a packed texture into one scalar per texel.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnpackOperator;

impl UnpackOperator {
    pub const NAME: &'static str = "Unpack";
}

impl TextureOperator for UnpackOperator {
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
        let packed = store
            .lookup_texture(input.data_id())
            .filter(|data| data.layout.is_packed())
            .ok_or(OpError::ResourceMissing {
                data_id: input.data_id(),
                what: "packed input texture",
            })?;

        // The recorded unpacked shape is authoritative; the packed width and
        // height cannot recover odd extents.
        let output_layout = store.create_layout_from_shape(&packed.layout.unpacked_shape)?;
        let rank = output_layout.rank();
        let symbols = channel_symbols(rank)?;
        let source_coords = source_coord_expr(rank, &symbols);
        let kernel = build_unpack_kernel(rank, &symbols, &source_coords)?;

        debug!(
            input = %input.data_id(),
            rank,
            shape = %output_layout.unpacked_shape,
            packed_width = packed.layout.width,
            packed_height = packed.layout.height,
            "unpack program"
        );

        Ok(ProgramDescriptor::new(
            kernel,
            vec![store.get_or_create_layout(input)?],
            output_layout,
            true,
            false,
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
            .ok_or_else(|| OpError::invalid_argument("unpack program declares no input layout"))?;
        let input_data = store.get_or_create_resource(input, input_layout)?;
        let output =
            store.create_resource_from_layout(&descriptor.output_layout, input_data.tensor.dtype())?;
        Ok(Binding::new(vec![input_data], output))
    }
}
