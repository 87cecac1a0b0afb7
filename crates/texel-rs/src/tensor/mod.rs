//! Immutable tensor descriptors.
//!
//! A [`Tensor`] carries no data of its own: its [`DataId`] is the key under which
//! the texture store records the backing resource.

mod dtype;
mod shape;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

pub use dtype::DType;
pub use shape::{Coords, Shape};

static NEXT_DATA_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity used to look up the storage backing a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DataId(u64);

impl DataId {
    /// Allocates a process-unique identity.
    pub fn fresh() -> Self {
        DataId(NEXT_DATA_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data#{}", self.0)
    }
}

/// Logical tensor: shape, element type and the identity of its storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tensor {
    shape: Shape,
    dtype: DType,
    data_id: DataId,
}

impl Tensor {
    /// Creates a tensor descriptor with a freshly allocated [`DataId`].
    pub fn new(shape: Shape, dtype: DType) -> Self {
        Self::with_data_id(shape, dtype, DataId::fresh())
    }

    pub fn with_data_id(shape: Shape, dtype: DType, data_id: DataId) -> Self {
        Tensor {
            shape,
            dtype,
            data_id,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn data_id(&self) -> DataId {
        self.data_id
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }
}
