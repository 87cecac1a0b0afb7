//! Logical tensor shapes and row-major index bookkeeping.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::ShapeError;

/// Logical coordinates of one element, outermost axis first.
pub type Coords = SmallVec<[usize; 6]>;

/// Positive extents of a tensor's axes, outermost first.
///
/// Serialized as a bare array; deserialization applies the same positivity
/// check as [`Shape::try_new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Panics on a zero extent; see [`Shape::try_new`] for the fallible form.
    pub fn new<D: Into<Vec<usize>>>(dims: D) -> Self {
        match Self::try_new(dims) {
            Ok(shape) => shape,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn try_new<D: Into<Vec<usize>>>(dims: D) -> Result<Self, ShapeError> {
        let dims = dims.into();
        if dims.contains(&0) {
            return Err(ShapeError { dims });
        }
        Ok(Shape { dims })
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Element count. Only valid for shapes already known to fit in `usize`,
    /// such as those a [`crate::TextureLayout`] was built for.
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// Element count, or `None` when it does not fit in `usize`.
    pub fn checked_num_elements(&self) -> Option<usize> {
        self.dims
            .iter()
            .try_fold(1usize, |count, &dim| count.checked_mul(dim))
    }

    /// Row-major strides, innermost axis has stride 1.
    pub fn strides(&self) -> Vec<usize> {
        let mut strides = vec![1; self.dims.len()];
        for axis in (0..self.dims.len().saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * self.dims[axis + 1];
        }
        strides
    }

    /// Splits a flat row-major offset into per-axis coordinates.
    pub fn unravel(&self, mut flat: usize) -> Coords {
        let mut coords: Coords = SmallVec::from_elem(0, self.dims.len());
        for axis in (0..self.dims.len()).rev() {
            coords[axis] = flat % self.dims[axis];
            flat /= self.dims[axis];
        }
        coords
    }

    /// Flat row-major offset of `coords`, or `None` when any coordinate is out of range.
    pub fn ravel(&self, coords: &[usize]) -> Option<usize> {
        if coords.len() != self.dims.len() {
            return None;
        }
        let mut flat = 0;
        for (coord, dim) in coords.iter().zip(&self.dims) {
            if coord >= dim {
                return None;
            }
            flat = flat * dim + coord;
        }
        Some(flat)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (idx, dim) in self.dims.iter().enumerate() {
            if idx > 0 {
                write!(f, ",")?;
            }
            write!(f, "{dim}")?;
        }
        write!(f, "]")
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape::new(dims.to_vec())
    }
}

impl TryFrom<Vec<usize>> for Shape {
    type Error = ShapeError;

    fn try_from(dims: Vec<usize>) -> Result<Self, Self::Error> {
        Shape::try_new(dims)
    }
}

impl From<Shape> for Vec<usize> {
    fn from(shape: Shape) -> Self {
        shape.dims
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides_are_row_major() {
        let shape = Shape::new([2, 3, 4]);
        assert_eq!(shape.strides(), vec![12, 4, 1]);
        assert_eq!(shape.num_elements(), 24);
    }

    #[test]
    fn unravel_inverts_ravel() {
        let shape = Shape::new([2, 3, 5]);
        for flat in 0..shape.num_elements() {
            let coords = shape.unravel(flat);
            assert_eq!(shape.ravel(&coords), Some(flat));
        }
        assert_eq!(shape.ravel(&[2, 0, 0]), None);
        assert_eq!(shape.ravel(&[0, 0]), None);
    }

    #[test]
    fn display_matches_dims() {
        assert_eq!(Shape::new([2, 3]).to_string(), "[2,3]");
    }

    #[test]
    #[should_panic(expected = "shape dimensions must be positive")]
    fn zero_dimension_is_rejected() {
        let _ = Shape::new([2, 0]);
    }

    #[test]
    fn deserialization_checks_dimensions() {
        let shape: Shape = serde_json::from_str("[2,3]").unwrap();
        assert_eq!(shape, Shape::new([2, 3]));
        assert_eq!(serde_json::to_string(&shape).unwrap(), "[2,3]");

        let err = serde_json::from_str::<Shape>("[2,0]").unwrap_err();
        assert!(err.to_string().contains("must be positive"), "{err}");
    }

    #[test]
    fn checked_count_detects_overflow() {
        assert_eq!(Shape::new([2, 3, 4]).checked_num_elements(), Some(24));
        assert_eq!(Shape::new([usize::MAX, 2]).checked_num_elements(), None);
    }
}
