use std::collections::HashMap;

use texel_rs::packing::{inner_pair, select_channel};
use texel_rs::{
    DType, DataId, OpError, OpResult, Shape, Tensor, TexelConfig, TextureData, TextureId,
    TextureLayout, TextureStore,
};
use tracing::trace;

/// Writes row-major `values` into texel storage for `layout`.
pub fn encode_texels(layout: &TextureLayout, values: &[f32]) -> OpResult<Vec<f32>> {
    let shape = &layout.shape;
    if values.len() != shape.num_elements() {
        return Err(OpError::invalid_argument(format!(
            "shape {shape} needs {} values, got {}",
            shape.num_elements(),
            values.len()
        )));
    }
    let channels = layout.channels.count();
    let mut storage = vec![0.0; layout.storage_len()];
    for (flat, value) in values.iter().enumerate() {
        let coords = shape.unravel(flat);
        let slot = if layout.is_packed() {
            let texel = layout
                .packed_texel_index(&coords)
                .ok_or_else(|| OpError::dispatch(format!("no packed texel for {coords:?}")))?;
            let (row, col) = inner_pair(&coords);
            texel * channels + select_channel(row, col).index()
        } else {
            let texel = layout
                .logical_texel_index(&coords)
                .ok_or_else(|| OpError::dispatch(format!("no texel for {coords:?}")))?;
            texel * channels
        };
        storage[slot] = *value;
    }
    Ok(storage)
}

/// Reads texel storage for `layout` back into row-major values.
pub fn decode_texels(layout: &TextureLayout, storage: &[f32]) -> OpResult<Vec<f32>> {
    if storage.len() != layout.storage_len() {
        return Err(OpError::dispatch(format!(
            "texture holds {} slots, layout needs {}",
            storage.len(),
            layout.storage_len()
        )));
    }
    let shape = &layout.shape;
    let channels = layout.channels.count();
    (0..shape.num_elements())
        .map(|flat| {
            let coords = shape.unravel(flat);
            let slot = if layout.is_packed() {
                let (row, col) = inner_pair(&coords);
                layout
                    .packed_texel_index(&coords)
                    .map(|texel| texel * channels + select_channel(row, col).index())
            } else {
                layout
                    .logical_texel_index(&coords)
                    .map(|texel| texel * channels)
            };
            slot.map(|slot| storage[slot])
                .ok_or_else(|| OpError::dispatch(format!("no texel for {coords:?}")))
        })
        .collect()
}

/// Texture store backed by host vectors.
pub struct HostTextureStore {
    config: TexelConfig,
    records: HashMap<DataId, TextureData>,
    textures: HashMap<TextureId, Vec<f32>>,
    host_data: HashMap<DataId, Vec<f32>>,
    next_texture: u64,
}

impl HostTextureStore {
    pub fn new(config: TexelConfig) -> Self {
        Self {
            config,
            records: HashMap::new(),
            textures: HashMap::new(),
            host_data: HashMap::new(),
            next_texture: 0,
        }
    }

    /// Registers host values for a new tensor; no texture is created until an
    /// operator asks for one.
    pub fn upload(&mut self, shape: Shape, dtype: DType, values: Vec<f32>) -> OpResult<Tensor> {
        if shape.checked_num_elements() != Some(values.len()) {
            return Err(OpError::invalid_argument(format!(
                "shape {shape} does not hold {} values",
                values.len()
            )));
        }
        let tensor = Tensor::new(shape, dtype);
        self.host_data.insert(tensor.data_id(), values);
        Ok(tensor)
    }

    /// Creates a tensor whose only storage is a packed texture holding `values`.
    pub fn upload_packed(
        &mut self,
        shape: Shape,
        dtype: DType,
        values: &[f32],
    ) -> OpResult<Tensor> {
        let layout = TextureLayout::packed(&shape, &self.config)?;
        let storage = encode_texels(&layout, values)?;
        let data = self.allocate(Tensor::new(shape, dtype), layout);
        self.textures.insert(data.texture, storage);
        Ok(data.tensor)
    }

    /// Row-major values of `tensor`, decoded from its texture when it has one.
    pub fn read_tensor(&self, tensor: &Tensor) -> OpResult<Vec<f32>> {
        if let Some(data) = self.records.get(&tensor.data_id()) {
            let storage = self.textures.get(&data.texture).ok_or(OpError::ResourceMissing {
                data_id: tensor.data_id(),
                what: "texture storage",
            })?;
            return decode_texels(&data.layout, storage);
        }
        self.host_data
            .get(&tensor.data_id())
            .cloned()
            .ok_or(OpError::ResourceMissing {
                data_id: tensor.data_id(),
                what: "host data",
            })
    }

    /// Value of the texel covering `coords` in the unpacked texture of `tensor`.
    pub fn sample(&self, tensor: &Tensor, coords: &[usize]) -> Option<f32> {
        let data = self.records.get(&tensor.data_id())?;
        let storage = self.textures.get(&data.texture)?;
        if data.layout.is_packed() {
            let texel = data.layout.packed_texel_index(coords)?;
            let (row, col) = inner_pair(coords);
            return storage.get(texel * 4 + select_channel(row, col).index()).copied();
        }
        let texel = data.layout.logical_texel_index(coords)?;
        storage.get(texel).copied()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn allocate(&mut self, tensor: Tensor, layout: TextureLayout) -> TextureData {
        let texture = TextureId(self.next_texture);
        self.next_texture += 1;
        self.textures.insert(texture, vec![0.0; layout.storage_len()]);
        trace!(
            %texture,
            data_id = %tensor.data_id(),
            width = layout.width,
            height = layout.height,
            channels = layout.channels.count(),
            "allocated texture"
        );
        let data = TextureData {
            tensor,
            layout,
            texture,
        };
        self.records.insert(data.tensor.data_id(), data.clone());
        data
    }
}

impl Default for HostTextureStore {
    fn default() -> Self {
        Self::new(TexelConfig::from_env())
    }
}

impl TextureStore for HostTextureStore {
    fn config(&self) -> &TexelConfig {
        &self.config
    }

    fn lookup_texture(&self, data_id: DataId) -> Option<&TextureData> {
        self.records.get(&data_id)
    }

    fn get_or_create_resource(
        &mut self,
        tensor: &Tensor,
        layout: &TextureLayout,
    ) -> OpResult<TextureData> {
        if let Some(existing) = self.records.get(&tensor.data_id()) {
            if existing.layout != *layout {
                return Err(OpError::invalid_argument(format!(
                    "{} is recorded with a different texture layout",
                    tensor.data_id()
                )));
            }
            return Ok(existing.clone());
        }
        let values = self
            .host_data
            .get(&tensor.data_id())
            .ok_or(OpError::ResourceMissing {
                data_id: tensor.data_id(),
                what: "host data",
            })?;
        let storage = encode_texels(layout, values)?;
        let data = self.allocate(tensor.clone(), layout.clone());
        self.textures.insert(data.texture, storage);
        Ok(data)
    }

    fn create_resource_from_layout(
        &mut self,
        layout: &TextureLayout,
        dtype: DType,
    ) -> OpResult<TextureData> {
        let tensor = Tensor::new(layout.shape.clone(), dtype);
        Ok(self.allocate(tensor, layout.clone()))
    }

    fn texels(&self, texture: TextureId) -> Option<&[f32]> {
        self.textures.get(&texture).map(Vec::as_slice)
    }

    fn texels_mut(&mut self, texture: TextureId) -> Option<&mut [f32]> {
        self.textures.get_mut(&texture).map(Vec::as_mut_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_encoding_places_block_in_four_channels() {
        let layout = TextureLayout::packed(&Shape::new([2, 3]), &TexelConfig::default()).unwrap();
        let storage = encode_texels(&layout, &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(storage, vec![0.0, 1.0, 3.0, 4.0, 2.0, 0.0, 5.0, 0.0]);
        assert_eq!(
            decode_texels(&layout, &storage).unwrap(),
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]
        );
    }

    #[test]
    fn upload_rejects_wrong_value_count() {
        let mut store = HostTextureStore::new(TexelConfig::default());
        let err = store
            .upload(Shape::new([2, 2]), DType::F32, vec![1.0; 3])
            .unwrap_err();
        assert!(matches!(err, OpError::InvalidArgument(_)));
        let err = store
            .upload(Shape::new([usize::MAX, 2]), DType::F32, Vec::new())
            .unwrap_err();
        assert!(matches!(err, OpError::InvalidArgument(_)));
    }

    #[test]
    fn layout_falls_back_to_unpacked_shape() {
        let mut store = HostTextureStore::new(TexelConfig::default());
        let tensor = store
            .upload(Shape::new([3, 2]), DType::F32, vec![0.0; 6])
            .unwrap();
        let layout = store.get_or_create_layout(&tensor).unwrap();
        assert!(!layout.is_packed());
        assert_eq!((layout.width, layout.height), (2, 3));
        assert!(store.lookup_texture(tensor.data_id()).is_none());
    }
}
