//! Enumerates the scalar element types a texture can carry.

use serde::{Deserialize, Serialize};

/// Logical dtype identifier shared between tensors and texture resources.
///
/// Packing never changes the dtype; it is carried through to the output texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    /// 32-bit floating point following IEEE-754 semantics.
    F32,
    /// 16-bit floating point (half-float textures).
    F16,
    /// 32-bit signed integer, primarily for index tensors.
    I32,
}

impl DType {
    /// Returns the number of bytes required per scalar element.
    pub fn size_in_bytes(self) -> usize {
        match self {
            DType::F32 | DType::I32 => 4,
            DType::F16 => 2,
        }
    }
}
