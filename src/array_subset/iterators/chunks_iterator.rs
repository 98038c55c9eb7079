use std::{iter::FusedIterator, num::NonZeroU64};

use crate::{
    array::{chunk_shape_to_array_shape, ArrayIndices},
    array_subset::{ArraySubset, IncompatibleDimensionalityError},
};

use super::IndicesIterator;

/// Iterates over the regular sized chunks overlapping an array subset.
/// All chunks have the same size, and may extend over the bounds of the array subset.
///
/// The iterator item is a ([`ArrayIndices`], [`ArraySubset`]) tuple corresponding to the chunk indices and chunk subset.
pub struct ChunksIterator {
    inner: IndicesIterator,
    chunk_shape: Vec<u64>,
}

impl ChunksIterator {
    /// Create a new chunks iterator.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if `chunk_shape` does not match the dimensionality of `subset`.
    pub fn new(
        subset: &ArraySubset,
        chunk_shape: &[NonZeroU64],
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if subset.dimensionality() != chunk_shape.len() {
            return Err(IncompatibleDimensionalityError::new(
                chunk_shape.len(),
                subset.dimensionality(),
            ));
        }
        let chunk_shape = chunk_shape_to_array_shape(chunk_shape);
        let subset_chunks = if subset.is_empty() {
            ArraySubset::new_with_shape(vec![0; chunk_shape.len()])
        } else {
            let chunk_start = std::iter::zip(subset.start(), &chunk_shape).map(|(s, c)| s / c);
            let chunk_end_exc = std::iter::zip(subset.end_exc(), &chunk_shape)
                .map(|(e, c)| (e - 1) / c + 1);
            let ranges: Vec<_> = std::iter::zip(chunk_start, chunk_end_exc)
                .map(|(start, end)| start..end)
                .collect();
            ArraySubset::new_with_ranges(&ranges)
        };
        Ok(Self {
            inner: subset_chunks.indices(),
            chunk_shape,
        })
    }
}

impl Iterator for ChunksIterator {
    type Item = (ArrayIndices, ArraySubset);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|chunk_indices| {
            let ranges: Vec<_> = std::iter::zip(&chunk_indices, &self.chunk_shape)
                .map(|(i, c)| i * c..(i + 1) * c)
                .collect();
            (chunk_indices, ArraySubset::new_with_ranges(&ranges))
        })
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        if n > 0 {
            self.inner.nth(n - 1);
        }
        self.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for ChunksIterator {}

impl FusedIterator for ChunksIterator {}
