//! Physical texture layouts for logical tensors.
//!
//! A layout maps a tensor's logical shape onto a 2-D grid of texels. Unpacked
//! layouts hold one scalar per texel; packed layouts hold the 2x2 block of the
//! two innermost axes in the four channels of one texel. Texels are laid out
//! row-major over the grid, so a texel's linear index alone decides its
//! `(x, y)` position.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::config::TexelConfig;
use crate::error::LayoutError;
use crate::packing::coords::MAX_RANK;
use crate::tensor::{Coords, Shape};

/// Number of meaningful channels per texel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channels {
    One,
    Four,
}

impl Channels {
    pub fn count(self) -> usize {
        match self {
            Channels::One => 1,
            Channels::Four => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureLayout {
    pub width: usize,
    pub height: usize,
    pub channels: Channels,
    /// Logical shape the texture is addressed with.
    pub shape: Shape,
    /// Unpacked logical shape this texture represents. Recorded when the layout
    /// is created and never derived back from `width`/`height`.
    pub unpacked_shape: Shape,
    pub strides: Vec<usize>,
}

/// `(batch, rows, cols)` of the two innermost axes; rank 1 is a single column.
fn inner_extents(shape: &Shape) -> (usize, usize, usize) {
    let dims = shape.dims();
    match dims.len() {
        0 => (1, 1, 1),
        1 => (1, dims[0], 1),
        rank => {
            let batch = dims[..rank - 2].iter().product();
            (batch, dims[rank - 2], dims[rank - 1])
        }
    }
}

fn check_rank(shape: &Shape) -> Result<(), LayoutError> {
    let rank = shape.rank();
    if rank == 0 || rank > MAX_RANK {
        return Err(LayoutError::UnsupportedRank {
            rank,
            max: MAX_RANK,
        });
    }
    Ok(())
}

fn too_large(shape: &Shape, texels: usize, max: usize) -> LayoutError {
    LayoutError::TooLarge {
        shape: shape.clone(),
        texels,
        max,
    }
}

/// Element count of `shape`, failing before any per-axis arithmetic can wrap.
fn checked_elements(shape: &Shape, config: &TexelConfig) -> Result<usize, LayoutError> {
    shape
        .checked_num_elements()
        .ok_or_else(|| too_large(shape, usize::MAX, config.max_texture_size))
}

/// Fits a `rows x cols` grid into the configured texture bounds.
fn fit_grid(
    shape: &Shape,
    rows: usize,
    cols: usize,
    config: &TexelConfig,
) -> Result<(usize, usize), LayoutError> {
    let max = config.max_texture_size;
    if rows <= max && cols <= max {
        return Ok((cols, rows));
    }
    let texels = rows
        .checked_mul(cols)
        .ok_or_else(|| too_large(shape, usize::MAX, max))?;
    let width = ((texels as f64).sqrt().ceil() as usize).clamp(1, max);
    let height = texels.div_ceil(width);
    if height > max {
        return Err(too_large(shape, texels, max));
    }
    Ok((width, height))
}

impl TextureLayout {
    /// One scalar per texel; the grid is `product(outer axes) x innermost axis`.
    pub fn unpacked(shape: &Shape, config: &TexelConfig) -> Result<Self, LayoutError> {
        check_rank(shape)?;
        let cols = *shape.dims().last().unwrap_or(&1);
        let rows = checked_elements(shape, config)? / cols;
        let (width, height) = fit_grid(shape, rows, cols, config)?;
        Ok(TextureLayout {
            width,
            height,
            channels: Channels::One,
            shape: shape.clone(),
            unpacked_shape: shape.clone(),
            strides: shape.strides(),
        })
    }

    /// Four scalars per texel, one 2x2 block of the innermost axes each.
    pub fn packed(shape: &Shape, config: &TexelConfig) -> Result<Self, LayoutError> {
        check_rank(shape)?;
        checked_elements(shape, config)?;
        let (batch, rows, cols) = inner_extents(shape);
        let block_rows = batch
            .checked_mul(rows.div_ceil(2))
            .ok_or_else(|| too_large(shape, usize::MAX, config.max_texture_size))?;
        let (width, height) = fit_grid(shape, block_rows, cols.div_ceil(2), config)?;
        Ok(TextureLayout {
            width,
            height,
            channels: Channels::Four,
            shape: shape.clone(),
            unpacked_shape: shape.clone(),
            strides: shape.strides(),
        })
    }

    pub fn is_packed(&self) -> bool {
        self.channels == Channels::Four
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Texels carrying data; the grid may have trailing padding beyond this.
    pub fn texel_count(&self) -> usize {
        if self.is_packed() {
            let (batch, rows, cols) = inner_extents(&self.shape);
            batch * rows.div_ceil(2) * cols.div_ceil(2)
        } else {
            self.shape.num_elements()
        }
    }

    /// Scalar slots in the backing storage, padding included.
    pub fn storage_len(&self) -> usize {
        self.width * self.height * self.channels.count()
    }

    pub fn texel_xy(&self, texel: usize) -> (usize, usize) {
        (texel % self.width, texel / self.width)
    }

    pub fn texel_at(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Texel holding logical element `coords` in an unpacked layout.
    pub fn logical_texel_index(&self, coords: &[usize]) -> Option<usize> {
        self.shape.ravel(coords)
    }

    /// Texel holding logical element `coords` in a packed layout.
    pub fn packed_texel_index(&self, coords: &[usize]) -> Option<usize> {
        self.shape.ravel(coords)?;
        let (_, rows, cols) = inner_extents(&self.shape);
        let (block_rows, block_cols) = (rows.div_ceil(2), cols.div_ceil(2));
        let rank = coords.len();
        let (batch_flat, row, col) = if rank == 1 {
            (0, coords[0], 0)
        } else {
            let batch_dims = &self.shape.dims()[..rank - 2];
            let batch_flat = batch_dims
                .iter()
                .zip(&coords[..rank - 2])
                .fold(0, |acc, (dim, coord)| acc * dim + coord);
            (batch_flat, coords[rank - 2], coords[rank - 1])
        };
        Some(batch_flat * block_rows * block_cols + (row / 2) * block_cols + col / 2)
    }

    /// Logical coordinates of the top-left element of a packed texel's block.
    pub fn block_origin(&self, texel: usize) -> Coords {
        let (_, rows, cols) = inner_extents(&self.shape);
        let (block_rows, block_cols) = (rows.div_ceil(2), cols.div_ceil(2));
        let per_batch = block_rows * block_cols;
        let rank = self.shape.rank();
        let rem = texel % per_batch;
        let (row, col) = (2 * (rem / block_cols), 2 * (rem % block_cols));
        if rank == 1 {
            return SmallVec::from_slice(&[row]);
        }
        let mut batch_flat = texel / per_batch;
        let batch_dims = &self.shape.dims()[..rank - 2];
        let mut coords: Coords = SmallVec::from_elem(0, rank);
        for axis in (0..rank - 2).rev() {
            coords[axis] = batch_flat % batch_dims[axis];
            batch_flat /= batch_dims[axis];
        }
        coords[rank - 2] = row;
        coords[rank - 1] = col;
        coords
    }
}
