//! The texture resource table.
//!
//! The store owns every texture resource and the record of which tensor each
//! one backs. Operators borrow it for the duration of one call: a lookup of the
//! input resource followed by the allocation of a fresh output resource.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::TexelConfig;
use crate::error::{LayoutError, OpResult};
use crate::layout::TextureLayout;
use crate::tensor::{DType, DataId, Shape, Tensor};

/// Handle of one texture resource inside a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureId(pub u64);

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "texture#{}", self.0)
    }
}

/// A texture resource together with the tensor it backs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureData {
    pub tensor: Tensor,
    pub layout: TextureLayout,
    pub texture: TextureId,
}

pub trait TextureStore {
    fn config(&self) -> &TexelConfig;

    /// The texture recorded for `data_id`, if any.
    fn lookup_texture(&self, data_id: DataId) -> Option<&TextureData>;

    /// Unpacked layout for `shape`.
    fn create_layout_from_shape(&self, shape: &Shape) -> Result<TextureLayout, LayoutError> {
        TextureLayout::unpacked(shape, self.config())
    }

    /// The recorded layout of `tensor`, or the unpacked layout of its shape.
    fn get_or_create_layout(&self, tensor: &Tensor) -> Result<TextureLayout, LayoutError> {
        match self.lookup_texture(tensor.data_id()) {
            Some(data) => Ok(data.layout.clone()),
            None => self.create_layout_from_shape(tensor.shape()),
        }
    }

    /// Texture backing `tensor` with `layout`, uploading host data when needed.
    fn get_or_create_resource(
        &mut self,
        tensor: &Tensor,
        layout: &TextureLayout,
    ) -> OpResult<TextureData>;

    /// Allocates a texture for a new tensor described by `layout`.
    fn create_resource_from_layout(
        &mut self,
        layout: &TextureLayout,
        dtype: DType,
    ) -> OpResult<TextureData>;

    fn texels(&self, texture: TextureId) -> Option<&[f32]>;

    fn texels_mut(&mut self, texture: TextureId) -> Option<&mut [f32]>;
}
