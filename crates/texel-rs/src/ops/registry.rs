use std::collections::HashMap;
use std::sync::Arc;

use super::{PackOperator, TextureOperator, UnpackOperator};
use crate::backend::InferenceHandler;
use crate::error::{OpError, OpResult};
use crate::tensor::Tensor;

/// Name-keyed table of operators.
///
/// Owned by whoever drives execution; there is no process-wide instance.
#[derive(Clone, Default)]
pub struct OperatorRegistry {
    ops: HashMap<&'static str, Arc<dyn TextureOperator>>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the pack and unpack operators.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(UnpackOperator));
        registry.register(Arc::new(PackOperator));
        registry
    }

    /// Registers `op` under its own name, replacing any previous entry.
    pub fn register(&mut self, op: Arc<dyn TextureOperator>) {
        self.ops.insert(op.name(), op);
    }

    pub fn get(&self, name: &str) -> OpResult<Arc<dyn TextureOperator>> {
        self.ops
            .get(name)
            .cloned()
            .ok_or_else(|| OpError::UnknownOperator(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.ops.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn run(
        &self,
        name: &str,
        handler: &mut InferenceHandler<'_>,
        inputs: &[Tensor],
    ) -> OpResult<Vec<Tensor>> {
        self.get(name)?.run(handler, inputs)
    }
}
