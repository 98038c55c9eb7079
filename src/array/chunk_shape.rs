use std::num::NonZeroU64;

use derive_more::{Deref, From};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ArrayShape;

/// The shape of a chunk. All dimensions must be non-zero.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Deref, From)]
pub struct ChunkShape(Vec<NonZeroU64>);

/// An error for a chunk shape with a zero-sized dimension.
#[derive(Debug, Error)]
#[error("chunk shape {_0:?} has a zero-sized dimension")]
pub struct ZeroChunkShapeError(ArrayShape);

impl ChunkShape {
    /// Return the number of elements.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.0.iter().map(|i| i.get()).product()
    }

    /// Return the chunk shape as an [`ArrayShape`].
    #[must_use]
    pub fn to_array_shape(&self) -> ArrayShape {
        chunk_shape_to_array_shape(&self.0)
    }
}

impl TryFrom<ArrayShape> for ChunkShape {
    type Error = ZeroChunkShapeError;

    fn try_from(shape: ArrayShape) -> Result<Self, Self::Error> {
        Self::try_from(shape.as_slice())
    }
}

impl TryFrom<&[u64]> for ChunkShape {
    type Error = ZeroChunkShapeError;

    fn try_from(shape: &[u64]) -> Result<Self, Self::Error> {
        shape
            .iter()
            .map(|&i| NonZeroU64::new(i))
            .collect::<Option<Vec<_>>>()
            .map(Self)
            .ok_or_else(|| ZeroChunkShapeError(shape.to_vec()))
    }
}

/// Convert a chunk shape to an [`ArrayShape`].
#[must_use]
pub fn chunk_shape_to_array_shape(chunk_shape: &[NonZeroU64]) -> ArrayShape {
    chunk_shape.iter().map(|i| i.get()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_shape() {
        let chunk_shape: ChunkShape = vec![2, 3].try_into().unwrap();
        assert_eq!(chunk_shape.num_elements(), 6);
        assert_eq!(chunk_shape.to_array_shape(), vec![2, 3]);
        assert_eq!(chunk_shape.len(), 2);
        assert!(ChunkShape::try_from(vec![2, 0]).is_err());
        assert_eq!(
            serde_json::to_string(&chunk_shape).unwrap(),
            "[2,3]"
        );
    }
}
