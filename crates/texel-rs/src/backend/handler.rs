use tracing::{debug, warn};

use super::engine::ExecutionEngine;
use super::store::TextureStore;
use crate::error::OpResult;
use crate::ops::TextureOperator;
use crate::tensor::Tensor;

/// Borrowed execution context for operator calls.
///
/// The engine and store are owned by the caller; the handler only holds them
/// for as long as it lives and keeps no state of its own.
pub struct InferenceHandler<'a> {
    engine: &'a dyn ExecutionEngine,
    store: &'a mut dyn TextureStore,
}

impl<'a> InferenceHandler<'a> {
    pub fn new(engine: &'a dyn ExecutionEngine, store: &'a mut dyn TextureStore) -> Self {
        Self { engine, store }
    }

    pub fn store(&self) -> &dyn TextureStore {
        &*self.store
    }

    pub fn store_mut(&mut self) -> &mut dyn TextureStore {
        &mut *self.store
    }

    /// Describes, compiles, binds and dispatches `op`, returning its output tensor.
    pub fn run(&mut self, op: &dyn TextureOperator, inputs: &[Tensor]) -> OpResult<Vec<Tensor>> {
        let descriptor = op.create_program_descriptor(&*self.store, inputs)?;
        let kernel = self.engine.compile(&descriptor).inspect_err(|err| {
            warn!(
                op = op.name(),
                engine = self.engine.engine_name(),
                error = %err,
                "kernel rejected"
            );
        })?;
        let binding = op.create_binding(&mut *self.store, &descriptor, inputs)?;
        self.engine.dispatch(&kernel, &binding, &mut *self.store)?;
        debug!(
            op = op.name(),
            output = %binding.output.tensor.data_id(),
            texture = %binding.output.texture,
            "dispatched"
        );
        Ok(vec![binding.output.tensor.clone()])
    }
}
