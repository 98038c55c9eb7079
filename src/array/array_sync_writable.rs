use log::trace;

use crate::{
    config::global_config,
    storage::{StorageError, WritableStorageTraits},
};

use super::{codec::ArrayCodecTraits, Array, ArrayError};

impl<TStorage: ?Sized + WritableStorageTraits + 'static> Array<TStorage> {
    /// Store metadata.
    ///
    /// # Errors
    /// Returns [`StorageError`] if there is an underlying store error.
    pub fn store_metadata(&self) -> Result<(), StorageError> {
        crate::storage::create_array(&*self.storage, self.path(), self.metadata())
    }

    /// Encode `chunk_bytes` and store at `chunk_indices`.
    ///
    /// If `chunk_bytes` is entirely the fill value, the chunk is erased instead unless [`store_empty_chunks`](crate::config::Config::store_empty_chunks) is enabled.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - the length of `chunk_bytes` is not equal to the expected length (the product of the number of elements in the chunk and the data type size in bytes),
    ///  - there is a codec encoding error, or
    ///  - an underlying store error.
    pub fn store_chunk(&self, chunk_indices: &[u64], chunk_bytes: &[u8]) -> Result<(), ArrayError> {
        let chunk_representation = self.chunk_array_representation(chunk_indices)?;
        if chunk_bytes.len() as u64 != chunk_representation.size() {
            return Err(ArrayError::InvalidBytesInputSize(
                chunk_bytes.len(),
                chunk_representation.size(),
            ));
        }

        if !global_config().store_empty_chunks() && self.fill_value().equals_all(chunk_bytes) {
            self.erase_chunk(chunk_indices)
        } else {
            let chunk_encoded = self
                .codecs()
                .encode(chunk_bytes.to_vec(), &chunk_representation)?;
            trace!(
                "store chunk {chunk_indices:?} of {}: {} bytes",
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
    }

    /// Encode `chunk_elements` and store at `chunk_indices`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data type size or a [`store_chunk`](Array::store_chunk) error condition is met.
    pub fn store_chunk_elements<T: bytemuck::NoUninit>(
        &self,
        chunk_indices: &[u64],
        chunk_elements: &[T],
    ) -> Result<(), ArrayError> {
        self.validate_element_size::<T>()?;
        self.store_chunk(chunk_indices, bytemuck::cast_slice(chunk_elements))
    }

    /// Erase the chunk at `chunk_indices`.
    ///
    /// Succeeds if the chunk does not exist.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `chunk_indices` are invalid or there is an underlying store error.
    pub fn erase_chunk(&self, chunk_indices: &[u64]) -> Result<(), ArrayError> {
        self.chunk_array_representation(chunk_indices)?;
        trace!("erase chunk {chunk_indices:?} of {}", self.path());
        crate::storage::erase_chunk(
            &*self.storage,
            self.path(),
            chunk_indices,
            self.chunk_key_encoding(),
        )?;
        Ok(())
    }
}
