//! A deterministic generator of [Zarr V3](https://zarr.dev) test fixtures.
//!
//! `zarrs_fixtures` writes a covering battery of small chunked arrays spanning the cross-product of
//! rank, chunking, sharding, codec pipeline, data type and byte order.
//! The battery is intended as a reference corpus for Zarr readers.
//!
//! To do so it carries a compact implementation of the Zarr V3 array model:
//!  - [`storage`]: a key/value blob store interface with [memory](storage::store::MemoryStore) and [filesystem](storage::store::FilesystemStore) stores,
//!  - [`array::codec`]: the codec pipeline (`transpose`, `bytes`, `sharding_indexed`, `gzip`, `blosc`, `zstd`, `crc32c`),
//!  - [`array::chunk_grid`]: the regular chunk grid, including ragged edge chunks,
//!  - [`array::codec::array_to_bytes::sharding`]: shards and the shard index,
//!  - [`array::Array`]: the array store, which reads and writes regions of an array and its `zarr.json` metadata,
//!  - [`fixtures`]: the fixture catalogue, generator and verifier.
//!
//! ## Example
//! ```rust
//! # use std::sync::Arc;
//! use zarrs_fixtures::array::{ArrayBuilder, DataType, FillValue};
//! use zarrs_fixtures::array_subset::ArraySubset;
//! use zarrs_fixtures::storage::store::MemoryStore;
//!
//! let store = Arc::new(MemoryStore::new());
//! let array = ArrayBuilder::new(vec![4, 4], DataType::Int16, vec![1, 1].try_into()?, FillValue::from(0i16))
//!     .shard_shape(vec![2, 2].try_into()?)
//!     .build(store, "/2d.chunked.compressed.sharded.i2")?;
//! array.store_metadata()?;
//!
//! let values: Vec<i16> = (1..=16).collect();
//! array.store_array_subset_elements(&ArraySubset::new_with_shape(vec![4, 4]), &values)?;
//! let element = array.retrieve_array_subset_elements::<i16>(&ArraySubset::new_with_ranges(&[3..4, 3..4]))?;
//! assert_eq!(element, vec![16]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Crate Features
//! #### Default
//!  - Codecs: `blosc`, `crc32c`, `gzip`, `sharding`, `transpose`, `zstd`.
//!  - `fixtures`: the [`fixtures`] module.
//!  - `cli`: the `zarrs_fixtures` binary.
//!
//! ## Concurrency
//! Chunk and shard writes are read-modify-write and are not atomic against the store.
//! Concurrent writers targeting the same chunk or shard must be serialised externally.
//! Reads may proceed concurrently, but the result of a read overlapping a concurrent write is unordered.

#![warn(unused_variables)]
#![warn(dead_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![deny(clippy::missing_panics_doc)]

pub mod array;
pub mod array_subset;
pub mod byte_range;
pub mod config;
#[cfg(feature = "fixtures")]
pub mod fixtures;
pub mod group;
pub mod metadata;
pub mod node;
pub mod plugin;
pub mod storage;

/// Re-export [`bytemuck`].
pub use bytemuck;
