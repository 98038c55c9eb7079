use log::trace;
use rayon::prelude::*;
use rayon_iter_concurrent_limit::iter_concurrent_limit;

use crate::{
    array_subset::ArraySubset,
    config::global_config,
    storage::ReadableWritableStorageTraits,
};

use super::{codec::ArrayToBytesCodecTraits, Array, ArrayError, ArrayIndices};

impl<TStorage: ?Sized + ReadableWritableStorageTraits + 'static> Array<TStorage> {
    /// Encode `chunk_subset_bytes` and store in `chunk_subset` of the chunk at `chunk_indices`.
    ///
    /// The existing chunk is read, updated, and written back (read-modify-write).
    /// The update is delegated to the codecs, so a sharded array re-encodes only the inner chunks overlapping `chunk_subset`.
    /// If the updated chunk is entirely the fill value, it is erased unless [`store_empty_chunks`](crate::config::Config::store_empty_chunks) is enabled.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - `chunk_subset` is out of bounds of the chunk,
    ///  - the length of `chunk_subset_bytes` does not match `chunk_subset`,
    ///  - there is a codec encoding or decoding error, or
    ///  - an underlying store error.
    pub fn store_chunk_subset(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
        chunk_subset_bytes: &[u8],
    ) -> Result<(), ArrayError> {
        let chunk_representation = self.chunk_array_representation(chunk_indices)?;
        let chunk_shape = chunk_representation.shape_u64();
        if !chunk_subset.inbounds(&chunk_shape) {
            return Err(ArrayError::InvalidArraySubset(
                chunk_subset.clone(),
                chunk_shape,
            ));
        }
        let expected_size = chunk_subset.num_elements() * self.data_type().size() as u64;
        if chunk_subset_bytes.len() as u64 != expected_size {
            return Err(ArrayError::InvalidBytesInputSize(
                chunk_subset_bytes.len(),
                expected_size,
            ));
        }

        if chunk_subset.shape() == chunk_shape.as_slice() {
            // The chunk is entirely replaced
            return self.store_chunk(chunk_indices, chunk_subset_bytes);
        }

        let chunk_encoded = crate::storage::retrieve_chunk(
            &*self.storage,
            self.path(),
            chunk_indices,
            self.chunk_key_encoding(),
        )?
        .map(|chunk_encoded| chunk_encoded.to_vec());
        let chunk_encoded = self.codecs().partial_encode(
            chunk_encoded,
            &chunk_representation,
            chunk_subset,
            chunk_subset_bytes,
        )?;
        match chunk_encoded {
            Some(chunk_encoded) => {
                trace!(
                    "update chunk {chunk_indices:?} of {} in {chunk_subset}: {} bytes",
                    self.path(),
                    chunk_encoded.len()
                );
                crate::storage::store_chunk(
                    &*self.storage,
                    self.path(),
                    chunk_indices,
                    self.chunk_key_encoding(),
                    chunk_encoded.into(),
                )?;
                Ok(())
            }
            None if global_config().store_empty_chunks() => {
                self.store_chunk(chunk_indices, &chunk_representation.fill_value_bytes())
            }
            None => self.erase_chunk(chunk_indices),
        }
    }

    /// Encode `chunk_subset_elements` and store in `chunk_subset` of the chunk at `chunk_indices`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data type size or a [`store_chunk_subset`](Array::store_chunk_subset) error condition is met.
    pub fn store_chunk_subset_elements<T: bytemuck::NoUninit>(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
        chunk_subset_elements: &[T],
    ) -> Result<(), ArrayError> {
        self.validate_element_size::<T>()?;
        self.store_chunk_subset(
            chunk_indices,
            chunk_subset,
            bytemuck::cast_slice(chunk_subset_elements),
        )
    }

    /// Encode `subset_bytes` and store in `array_subset`.
    ///
    /// The chunks overlapping `array_subset` are updated in parallel.
    /// A chunk whose logical extent (bounded by the array shape) is covered by `array_subset` is encoded afresh, and the padding of a ragged chunk is the fill value.
    /// Other chunks are updated with [`store_chunk_subset`](Array::store_chunk_subset).
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the dimensionality of `array_subset` does not match the chunk grid dimensionality,
    ///  - `array_subset` is out of bounds of the array,
    ///  - the length of `subset_bytes` does not match the expected length governed by the shape of the array subset and the data type size,
    ///  - there is a codec encoding or decoding error, or
    ///  - an underlying store error.
    pub fn store_array_subset(
        &self,
        array_subset: &ArraySubset,
        subset_bytes: &[u8],
    ) -> Result<(), ArrayError> {
        self.validate_array_subset(array_subset)?;
        let element_size = self.data_type().size();
        let expected_size = array_subset.num_elements() * element_size as u64;
        if subset_bytes.len() as u64 != expected_size {
            return Err(ArrayError::InvalidBytesInputSize(
                subset_bytes.len(),
                expected_size,
            ));
        }

        let chunks = self.chunks_in_array_subset(array_subset)?;
        let chunk_concurrent_limit = global_config().chunk_concurrent_limit().max(1);
        let store_chunk_overlap = |chunk_indices: ArrayIndices| -> Result<(), ArrayError> {
            let chunk_subset = self.chunk_subset(&chunk_indices)?;
            let overlap = array_subset.overlap(&chunk_subset)?;
            let overlap_in_chunk = overlap.relative_to(chunk_subset.start())?;
            let overlap_bytes = overlap.relative_to(array_subset.start())?.extract_bytes(
                subset_bytes,
                array_subset.shape(),
                element_size,
            )?;

            if overlap == chunk_subset {
                self.store_chunk(&chunk_indices, &overlap_bytes)
            } else if overlap == chunk_subset.bound(self.shape())? {
                // A ragged chunk
                let mut chunk_bytes = self
                    .fill_value()
                    .repeat(chunk_subset.num_elements_usize());
                overlap_in_chunk.store_bytes(
                    &overlap_bytes,
                    &mut chunk_bytes,
                    chunk_subset.shape(),
                    element_size,
                )?;
                self.store_chunk(&chunk_indices, &chunk_bytes)
            } else {
                self.store_chunk_subset(&chunk_indices, &overlap_in_chunk, &overlap_bytes)
            }
        };
        iter_concurrent_limit!(
            chunk_concurrent_limit,
            chunks.indices().collect::<Vec<_>>(),
            try_for_each,
            store_chunk_overlap
        )
    }

    /// Encode `subset_elements` and store in `array_subset`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data type size or a [`store_array_subset`](Array::store_array_subset) error condition is met.
    pub fn store_array_subset_elements<T: bytemuck::NoUninit>(
        &self,
        array_subset: &ArraySubset,
        subset_elements: &[T],
    ) -> Result<(), ArrayError> {
        self.validate_element_size::<T>()?;
        self.store_array_subset(array_subset, bytemuck::cast_slice(subset_elements))
    }
}
