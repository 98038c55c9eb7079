//! The fixture battery.
//!
//! A fixture is a small named array written with a particular combination of rank, chunking, sharding, codecs, data type, and byte order.
//! [`catalogue`] returns the battery in a fixed order, [`generate`] writes it beneath a root group, and [`verify`] reads it back.
//!
//! ```rust
//! # use std::sync::Arc;
//! use zarrs_fixtures::fixtures::{catalogue, generate, verify};
//! use zarrs_fixtures::node::NodePath;
//! use zarrs_fixtures::storage::store::MemoryStore;
//!
//! let store = Arc::new(MemoryStore::new());
//! let fixtures = catalogue();
//! let reports = generate(&store, &NodePath::root(), &fixtures)?;
//! assert_eq!(reports.len(), fixtures.len());
//! verify(&store, &NodePath::root(), &fixtures)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{collections::HashSet, sync::Arc};

use half::f16;
use log::{debug, warn};
use thiserror::Error;

use crate::{
    array::{
        codec::{
            BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode, BytesCodec,
            BytesToBytesCodecTraits, GzipCodec, TransposeCodec, TransposeOrder,
        },
        Array, ArrayBuilder, ArrayCreateError, ArrayError, ArrayShape, DataType, Endianness,
        ZeroChunkShapeError,
    },
    array_subset::ArraySubset,
    group::{Group, GroupCreateError, GroupMetadataV3},
    node::{NodePath, NodePathError},
    plugin::PluginCreateError,
    storage::{meta_key, ReadableWritableListableStorageTraits, StorageError, StoreKey},
};

const BLOSC_CLEVEL: u8 = 5;
const GZIP_LEVEL: u32 = 5;

/// The compressor applied after the `bytes` serialiser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compressor {
    /// No compression.
    None,
    /// `gzip` at level 5.
    Gzip,
    /// `blosc` with the `zstd` compressor at level 5.
    Blosc {
        /// The recorded type size.
        typesize: usize,
        /// The shuffle mode.
        shuffle: BloscShuffleMode,
    },
}

impl Compressor {
    fn codec(self) -> Result<Option<Box<dyn BytesToBytesCodecTraits>>, FixtureError> {
        Ok(match self {
            Self::None => None,
            Self::Gzip => Some(Box::new(
                GzipCodec::new(GZIP_LEVEL).map_err(|err| FixtureError::Invalid(err.to_string()))?,
            )),
            Self::Blosc { typesize, shuffle } => {
                let clevel = BloscCompressionLevel::try_from(BLOSC_CLEVEL)
                    .map_err(|level| FixtureError::Invalid(format!("blosc clevel {level}")))?;
                Some(Box::new(BloscCodec::new(
                    BloscCompressor::Zstd,
                    clevel,
                    None,
                    shuffle,
                    Some(typesize),
                )?))
            }
        })
    }
}

/// The values of a fixture, in C order.
#[derive(Clone, Debug, PartialEq)]
pub enum FixtureValues {
    /// `bool`
    Bool(Vec<bool>),
    /// `uint8`
    UInt8(Vec<u8>),
    /// `int16`
    Int16(Vec<i16>),
    /// `int32`
    Int32(Vec<i32>),
    /// `float16`
    Float16(Vec<f16>),
    /// `float32`
    Float32(Vec<f32>),
    /// `float64`
    Float64(Vec<f64>),
}

impl FixtureValues {
    /// The data type of the values.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Bool(_) => DataType::Bool,
            Self::UInt8(_) => DataType::UInt8,
            Self::Int16(_) => DataType::Int16,
            Self::Int32(_) => DataType::Int32,
            Self::Float16(_) => DataType::Float16,
            Self::Float32(_) => DataType::Float32,
            Self::Float64(_) => DataType::Float64,
        }
    }

    /// The number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Bool(values) => values.len(),
            Self::UInt8(values) => values.len(),
            Self::Int16(values) => values.len(),
            Self::Int32(values) => values.len(),
            Self::Float16(values) => values.len(),
            Self::Float32(values) => values.len(),
            Self::Float64(values) => values.len(),
        }
    }

    /// Returns true if there are no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The values as native endian bytes.
    #[must_use]
    pub fn to_ne_bytes(&self) -> Vec<u8> {
        match self {
            Self::Bool(values) => values.iter().map(|value| u8::from(*value)).collect(),
            Self::UInt8(values) => values.clone(),
            Self::Int16(values) => bytemuck::cast_slice(values).to_vec(),
            Self::Int32(values) => bytemuck::cast_slice(values).to_vec(),
            Self::Float16(values) => bytemuck::cast_slice(values).to_vec(),
            Self::Float32(values) => bytemuck::cast_slice(values).to_vec(),
            Self::Float64(values) => bytemuck::cast_slice(values).to_vec(),
        }
    }
}

/// A named fixture.
///
/// With a shard shape, `chunk_shape` is the inner chunk shape of each shard and the compressor applies to the inner chunks.
#[derive(Clone, Debug)]
pub struct FixtureSpec {
    /// The array name, a child of the root group.
    pub name: &'static str,
    /// The array shape.
    pub shape: ArrayShape,
    /// The chunk shape.
    pub chunk_shape: ArrayShape,
    /// The shard shape.
    pub shard_shape: Option<ArrayShape>,
    /// The endianness of the `bytes` serialiser.
    ///
    /// Single byte data types have no endianness.
    pub endianness: Option<Endianness>,
    /// The order of a `transpose` codec.
    pub transpose_order: Option<Vec<usize>>,
    /// The compressor.
    pub compressor: Compressor,
    /// The values.
    pub values: FixtureValues,
    /// Write `"dimension_names": null` into the array metadata.
    pub null_dimension_names: bool,
}

impl FixtureSpec {
    /// Create an unsharded fixture compressed with `blosc` (typesize 4, no shuffle).
    ///
    /// Multi-byte data types are serialised little endian.
    #[must_use]
    pub fn new(
        name: &'static str,
        shape: ArrayShape,
        chunk_shape: ArrayShape,
        values: FixtureValues,
    ) -> Self {
        Self {
            name,
            shape,
            chunk_shape,
            shard_shape: None,
            endianness: (values.data_type().size() > 1).then_some(Endianness::Little),
            transpose_order: None,
            compressor: Compressor::Blosc {
                typesize: 4,
                shuffle: BloscShuffleMode::NoShuffle,
            },
            values,
            null_dimension_names: false,
        }
    }

    /// Create a fixture with shards of `shard_shape` holding `gzip` compressed chunks of `chunk_shape`.
    #[must_use]
    pub fn new_sharded(
        name: &'static str,
        shape: ArrayShape,
        shard_shape: ArrayShape,
        chunk_shape: ArrayShape,
        values: FixtureValues,
    ) -> Self {
        Self {
            shard_shape: Some(shard_shape),
            compressor: Compressor::Gzip,
            ..Self::new(name, shape, chunk_shape, values)
        }
    }

    #[must_use]
    fn with_compressor(mut self, compressor: Compressor) -> Self {
        self.compressor = compressor;
        self
    }

    #[must_use]
    fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = Some(endianness);
        self
    }

    #[must_use]
    fn with_transpose_order(mut self, order: Vec<usize>) -> Self {
        self.transpose_order = Some(order);
        self
    }

    #[must_use]
    fn with_null_dimension_names(mut self) -> Self {
        self.null_dimension_names = true;
        self
    }

    /// The data type of the fixture.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.values.data_type()
    }

    /// Create the array builder of the fixture.
    ///
    /// # Errors
    /// Returns [`FixtureError`] if the chunk shape, transpose order, or compressor is invalid.
    pub fn array_builder(&self) -> Result<ArrayBuilder, FixtureError> {
        let data_type = self.data_type();
        let mut builder = ArrayBuilder::new(
            self.shape.clone(),
            data_type,
            self.chunk_shape.clone().try_into()?,
            data_type.default_fill_value(),
        );
        builder.array_to_bytes_codec(Box::new(BytesCodec::new(self.endianness)));
        if let Some(shard_shape) = &self.shard_shape {
            builder.shard_shape(shard_shape.clone().try_into()?);
        }
        if let Some(order) = &self.transpose_order {
            let order =
                TransposeOrder::new(order).map_err(|err| FixtureError::Invalid(err.to_string()))?;
            builder.array_to_array_codecs(vec![Box::new(TransposeCodec::new(order))]);
        }
        builder.bytes_to_bytes_codecs(self.compressor.codec()?.into_iter().collect());
        Ok(builder)
    }
}

/// The outcome of writing one fixture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixtureReport {
    /// The fixture name.
    pub name: &'static str,
    /// The keys of the chunks (or shards) written.
    pub chunk_keys: Vec<StoreKey>,
    /// The total size of the chunks (or shards) written.
    pub bytes_stored: u64,
}

/// A fixture error.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// An invalid fixture name or root path.
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// The root group could not be created.
    #[error(transparent)]
    GroupCreateError(#[from] GroupCreateError),
    /// The array could not be created or opened.
    #[error(transparent)]
    ArrayCreateError(#[from] ArrayCreateError),
    /// The array could not be written or read.
    #[error(transparent)]
    ArrayError(#[from] ArrayError),
    /// A codec could not be created.
    #[error(transparent)]
    PluginCreateError(#[from] PluginCreateError),
    /// The array metadata could not be rewritten.
    #[error(transparent)]
    MetadataError(#[from] serde_json::Error),
    /// A chunk or shard shape with a zero dimension.
    #[error(transparent)]
    ZeroChunkShapeError(#[from] ZeroChunkShapeError),
    /// An invalid fixture description.
    #[error("invalid fixture: {0}")]
    Invalid(String),
    /// A fixture read back differently from what was written.
    #[error("fixture {name} does not match: {reason}")]
    Mismatch {
        /// The fixture name.
        name: &'static str,
        /// What differed.
        reason: String,
    },
}

fn arange_i16(range: std::ops::Range<i16>) -> FixtureValues {
    FixtureValues::Int16(range.collect())
}

/// The fixture battery, in generation order.
#[must_use]
#[rustfmt::skip]
pub fn catalogue() -> Vec<FixtureSpec> {
    use FixtureValues as V;
    let blosc = Compressor::Blosc { typesize: 4, shuffle: BloscShuffleMode::NoShuffle };
    let floats = [-1000.5, 0.0, 1000.5, 0.0];
    vec![
        FixtureSpec::new("1d.contiguous.gzip.i2", vec![4], vec![4], arange_i16(1..5)).with_compressor(Compressor::Gzip),
        FixtureSpec::new("1d.contiguous.blosc.i2", vec![4], vec![4], arange_i16(1..5)).with_compressor(blosc),
        FixtureSpec::new("1d.contiguous.raw.i2", vec![4], vec![4], arange_i16(1..5)).with_compressor(Compressor::None),
        FixtureSpec::new("1d.contiguous.i4", vec![4], vec![4], V::Int32(vec![1, 2, 3, 4])),
        FixtureSpec::new("1d.contiguous.u1", vec![4], vec![4], V::UInt8(vec![255, 0, 255, 0])),
        FixtureSpec::new("1d.contiguous.f2.le", vec![4], vec![4], V::Float16(floats.iter().map(|v| f16::from_f32(*v)).collect())),
        FixtureSpec::new("1d.contiguous.f4.le", vec![4], vec![4], V::Float32(floats.to_vec())),
        FixtureSpec::new("1d.contiguous.f4.be", vec![4], vec![4], V::Float32(floats.to_vec())).with_endianness(Endianness::Big),
        FixtureSpec::new("1d.contiguous.f8", vec![4], vec![4], V::Float64(vec![1.5, 2.5, 3.5, 4.5])),
        FixtureSpec::new("1d.contiguous.b1", vec![4], vec![4], V::Bool(vec![true, false, true, false])),
        FixtureSpec::new("1d.chunked.i2", vec![4], vec![2], arange_i16(1..5)).with_null_dimension_names(),
        FixtureSpec::new("1d.chunked.ragged.i2", vec![5], vec![2], arange_i16(1..6)),
        FixtureSpec::new("2d.contiguous.i2", vec![2, 2], vec![2, 2], arange_i16(1..5)),
        FixtureSpec::new("2d.chunked.i2", vec![2, 2], vec![1, 1], arange_i16(1..5)),
        FixtureSpec::new("2d.chunked.ragged.i2", vec![3, 3], vec![2, 2], arange_i16(1..10)),
        FixtureSpec::new("3d.contiguous.i2", vec![3, 3, 3], vec![3, 3, 3], arange_i16(0..27)),
        FixtureSpec::new("3d.chunked.i2", vec![3, 3, 3], vec![1, 1, 1], arange_i16(0..27)),
        FixtureSpec::new("3d.chunked.mixed.i2.C", vec![3, 3, 3], vec![3, 3, 1], arange_i16(0..27)),
        FixtureSpec::new("3d.chunked.mixed.i2.F", vec![3, 3, 3], vec![3, 3, 1], arange_i16(0..27)).with_transpose_order(vec![2, 1, 0]),
        FixtureSpec::new_sharded("1d.contiguous.compressed.sharded.i2", vec![4], vec![4], vec![4], arange_i16(1..5)),
        FixtureSpec::new_sharded("1d.contiguous.compressed.sharded.i4", vec![4], vec![4], vec![4], V::Int32(vec![1, 2, 3, 4])),
        FixtureSpec::new_sharded("1d.contiguous.compressed.sharded.u1", vec![4], vec![4], vec![4], V::UInt8(vec![255, 0, 255, 0])),
        FixtureSpec::new_sharded("1d.contiguous.compressed.sharded.f4", vec![4], vec![4], vec![4], V::Float32(floats.to_vec())),
        FixtureSpec::new_sharded("1d.contiguous.compressed.sharded.f8", vec![4], vec![4], vec![4], V::Float64(vec![1.5, 2.5, 3.5, 4.5])),
        FixtureSpec::new_sharded("1d.contiguous.compressed.sharded.b1", vec![4], vec![4], vec![4], V::Bool(vec![true, false, true, false])),
        FixtureSpec::new_sharded("1d.chunked.compressed.sharded.i2", vec![4], vec![2], vec![1], arange_i16(1..5)),
        FixtureSpec::new_sharded("1d.chunked.filled.compressed.sharded.i2", vec![4], vec![2], vec![1], V::Int16(vec![1, 2, 0, 0])),
        FixtureSpec::new_sharded("1d.chunked.ragged.compressed.sharded.i2", vec![5], vec![2], vec![1], arange_i16(1..6)),
        FixtureSpec::new_sharded("2d.contiguous.compressed.sharded.i2", vec![2, 2], vec![2, 2], vec![2, 2], arange_i16(1..5)),
        FixtureSpec::new_sharded("2d.chunked.compressed.sharded.filled.i2", vec![4, 4], vec![2, 2], vec![1, 1], arange_i16(0..16)),
        FixtureSpec::new_sharded("2d.chunked.compressed.sharded.i2", vec![4, 4], vec![2, 2], vec![1, 1], arange_i16(1..17)),
        FixtureSpec::new_sharded("2d.chunked.ragged.compressed.sharded.i2", vec![3, 3], vec![2, 2], vec![1, 1], arange_i16(1..10)),
        FixtureSpec::new_sharded("3d.contiguous.compressed.sharded.i2", vec![3, 3, 3], vec![3, 3, 3], vec![3, 3, 3], arange_i16(0..27)),
        FixtureSpec::new_sharded("3d.chunked.compressed.sharded.i2", vec![4, 4, 4], vec![2, 2, 2], vec![1, 1, 1], arange_i16(0..64)),
        FixtureSpec::new_sharded("3d.chunked.mixed.compressed.sharded.i2", vec![3, 3, 3], vec![3, 3, 3], vec![3, 3, 1], arange_i16(0..27)),
    ]
}

/// Select the fixtures of `fixtures` whose name contains `filter`.
///
/// Logs a warning if nothing matches.
#[must_use]
pub fn select(fixtures: Vec<FixtureSpec>, filter: &str) -> Vec<FixtureSpec> {
    let selected: Vec<_> = fixtures
        .into_iter()
        .filter(|fixture| fixture.name.contains(filter))
        .collect();
    if selected.is_empty() {
        warn!("no fixture matches {filter:?}");
    }
    selected
}

/// Write `fixtures` beneath a group at `root`.
///
/// Any existing content under `root` is erased first.
/// A fixture with the same name as an earlier fixture is skipped.
///
/// # Errors
/// Returns [`FixtureError`] if a fixture is invalid or on an underlying storage error.
pub fn generate<TStorage: ?Sized + ReadableWritableListableStorageTraits + 'static>(
    storage: &Arc<TStorage>,
    root: &NodePath,
    fixtures: &[FixtureSpec],
) -> Result<Vec<FixtureReport>, FixtureError> {
    storage.erase_prefix(&root.to_prefix())?;
    Group::new_with_metadata(storage.clone(), root.as_str(), GroupMetadataV3::default())?
        .store_metadata()?;

    let mut names = HashSet::new();
    let mut reports = Vec::with_capacity(fixtures.len());
    for fixture in fixtures {
        if !names.insert(fixture.name) {
            warn!("skipping fixture {}: the name is already in use", fixture.name);
            continue;
        }
        reports.push(generate_fixture(storage, root, fixture)?);
    }
    Ok(reports)
}

fn generate_fixture<TStorage: ?Sized + ReadableWritableListableStorageTraits + 'static>(
    storage: &Arc<TStorage>,
    root: &NodePath,
    fixture: &FixtureSpec,
) -> Result<FixtureReport, FixtureError> {
    let path = root.child(fixture.name)?;
    let array = fixture
        .array_builder()?
        .build(storage.clone(), path.as_str())?;
    array.store_metadata()?;
    array.store_array_subset(
        &ArraySubset::new_with_shape(fixture.shape.clone()),
        &fixture.values.to_ne_bytes(),
    )?;

    let key = meta_key(&path);
    if fixture.null_dimension_names {
        let metadata = storage
            .get(&key)?
            .ok_or_else(|| FixtureError::Invalid(format!("{key} was not written")))?;
        let mut metadata: serde_json::Value = serde_json::from_slice(&metadata)?;
        if let Some(metadata) = metadata.as_object_mut() {
            metadata.insert("dimension_names".to_string(), serde_json::Value::Null);
        }
        storage.set(&key, serde_json::to_vec_pretty(&metadata)?.into())?;
    }

    let mut chunk_keys = storage.list_prefix(&path.to_prefix())?;
    chunk_keys.retain(|chunk_key| chunk_key != &key);
    chunk_keys.sort();
    let mut bytes_stored = 0;
    for chunk_key in &chunk_keys {
        bytes_stored += storage.size_key(chunk_key)?.unwrap_or_default();
    }
    debug!(
        "generated fixture {}: {} chunks, {bytes_stored} bytes",
        fixture.name,
        chunk_keys.len()
    );
    Ok(FixtureReport {
        name: fixture.name,
        chunk_keys,
        bytes_stored,
    })
}

/// Re-open every fixture beneath `root` and compare it with its expected values.
///
/// # Errors
/// Returns [`FixtureError::Mismatch`] for the first fixture that differs, or another [`FixtureError`] if a fixture cannot be read.
pub fn verify<TStorage: ?Sized + ReadableWritableListableStorageTraits + 'static>(
    storage: &Arc<TStorage>,
    root: &NodePath,
    fixtures: &[FixtureSpec],
) -> Result<(), FixtureError> {
    Group::new(storage.clone(), root.as_str())?;
    for fixture in fixtures {
        let mismatch = |reason: String| FixtureError::Mismatch {
            name: fixture.name,
            reason,
        };
        let path = root.child(fixture.name)?;
        let array = Array::new(storage.clone(), path.as_str())?;
        if array.shape() != fixture.shape.as_slice() {
            return Err(mismatch(format!(
                "shape {:?} != {:?}",
                array.shape(),
                fixture.shape
            )));
        }
        if *array.data_type() != fixture.data_type() {
            return Err(mismatch(format!(
                "data type {} != {}",
                array.data_type(),
                fixture.data_type()
            )));
        }
        let values = array.retrieve_array_subset(&ArraySubset::new_with_shape(
            fixture.shape.clone(),
        ))?;
        if values != fixture.values.to_ne_bytes() {
            return Err(mismatch("values differ".to_string()));
        }
        if fixture.null_dimension_names {
            let metadata = storage.get(&meta_key(&path))?.unwrap_or_default();
            let metadata: serde_json::Value = serde_json::from_slice(&metadata)?;
            if metadata.get("dimension_names") != Some(&serde_json::Value::Null) {
                return Err(mismatch("dimension_names is not null".to_string()));
            }
        }
        debug!("verified fixture {}", fixture.name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::storage::{store::MemoryStore, Bytes, ReadableStorageTraits, WritableStorageTraits};

    use super::*;

    fn fixture(name: &str) -> FixtureSpec {
        catalogue()
            .into_iter()
            .find(|fixture| fixture.name == name)
            .unwrap()
    }

    #[test]
    fn catalogue_names() {
        let fixtures = catalogue();
        assert_eq!(fixtures.len(), 35);
        assert_eq!(fixtures[0].name, "1d.contiguous.gzip.i2");
        assert_eq!(
            fixtures.last().unwrap().name,
            "3d.chunked.mixed.compressed.sharded.i2"
        );
        let names: HashSet<_> = fixtures.iter().map(|fixture| fixture.name).collect();
        assert_eq!(names.len(), fixtures.len());
        for fixture in &fixtures {
            let num_elements: u64 = fixture.shape.iter().product();
            assert_eq!(fixture.values.len() as u64, num_elements, "{}", fixture.name);
        }
    }

    #[test]
    fn catalogue_metadata() {
        let metadata = fixture("3d.chunked.mixed.i2.F")
            .array_builder()
            .unwrap()
            .build_metadata()
            .unwrap();
        let codecs: Vec<_> = metadata.codecs.iter().map(|codec| codec.name()).collect();
        assert_eq!(codecs, vec!["transpose", "bytes", "blosc"]);
        let blosc = serde_json::to_value(&metadata.codecs[2]).unwrap();
        assert_eq!(blosc["configuration"]["typesize"], 4);
        assert_eq!(blosc["configuration"]["cname"], "zstd");

        let metadata = fixture("2d.chunked.compressed.sharded.i2")
            .array_builder()
            .unwrap()
            .build_metadata()
            .unwrap();
        let sharding = serde_json::to_value(&metadata.codecs[0]).unwrap();
        assert_eq!(sharding["name"], "sharding_indexed");
        assert_eq!(
            sharding["configuration"]["chunk_shape"],
            serde_json::json!([1, 1])
        );
        assert_eq!(
            sharding["configuration"]["codecs"][1]["name"],
            "gzip"
        );

        // Single byte data types have no serialiser endianness
        for name in ["1d.contiguous.u1", "1d.contiguous.b1"] {
            let metadata = fixture(name).array_builder().unwrap().build_metadata().unwrap();
            let bytes = serde_json::to_value(&metadata.codecs[0]).unwrap();
            assert_eq!(bytes, serde_json::json!({"name": "bytes"}));
        }
        for name in [
            "1d.contiguous.compressed.sharded.u1",
            "1d.contiguous.compressed.sharded.b1",
        ] {
            let metadata = fixture(name).array_builder().unwrap().build_metadata().unwrap();
            let sharding = serde_json::to_value(&metadata.codecs[0]).unwrap();
            assert_eq!(
                sharding["configuration"]["codecs"][0],
                serde_json::json!({"name": "bytes"})
            );
        }
        let metadata = fixture("1d.contiguous.i4")
            .array_builder()
            .unwrap()
            .build_metadata()
            .unwrap();
        let bytes = serde_json::to_value(&metadata.codecs[0]).unwrap();
        assert_eq!(bytes["configuration"]["endian"], "little");
    }

    #[test]
    fn generate_verify() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(&"stale/zarr.json".try_into().unwrap(), Bytes::new())
            .unwrap();
        let fixtures = catalogue();
        let reports = generate(&store, &NodePath::root(), &fixtures).unwrap();
        assert!(store.get(&"stale/zarr.json".try_into().unwrap()).unwrap().is_none());
        verify(&store, &NodePath::root(), &fixtures).unwrap();

        let report = |name: &str| reports.iter().find(|report| report.name == name).unwrap();
        assert_eq!(report("1d.chunked.ragged.i2").chunk_keys.len(), 3);
        assert_eq!(report("3d.chunked.i2").chunk_keys.len(), 26);
        assert_eq!(report("2d.chunked.compressed.sharded.filled.i2").chunk_keys.len(), 4);
        assert_eq!(
            report("1d.chunked.filled.compressed.sharded.i2").chunk_keys,
            vec![StoreKey::new("1d.chunked.filled.compressed.sharded.i2/c/0").unwrap()]
        );
        assert_eq!(report("1d.contiguous.raw.i2").bytes_stored, 8);

        let metadata = store
            .get(&"1d.chunked.i2/zarr.json".try_into().unwrap())
            .unwrap()
            .unwrap();
        let metadata: serde_json::Value = serde_json::from_slice(&metadata).unwrap();
        assert_eq!(metadata["dimension_names"], serde_json::Value::Null);
        assert!(metadata.as_object().unwrap().contains_key("dimension_names"));
    }

    #[test]
    fn generate_big_endian() {
        let store = Arc::new(MemoryStore::new());
        let fixtures = select(catalogue(), "1d.contiguous.f4");
        assert_eq!(fixtures.len(), 2);
        generate(&store, &NodePath::root(), &fixtures).unwrap();
        let array = Array::new(store, "/1d.contiguous.f4.be").unwrap();
        let values = array
            .retrieve_array_subset_elements::<f32>(&ArraySubset::new_with_shape(vec![4]))
            .unwrap();
        assert_eq!(values, vec![-1000.5, 0.0, 1000.5, 0.0]);
    }

    #[test]
    fn generate_skips_duplicates() {
        let store = Arc::new(MemoryStore::new());
        let fixtures = vec![fixture("1d.chunked.i2"), fixture("1d.chunked.i2")];
        let reports = generate(&store, &NodePath::new("/data").unwrap(), &fixtures).unwrap();
        assert_eq!(reports.len(), 1);
        assert!(Group::new(store, "/data").is_ok());
    }

    #[test]
    fn verify_mismatch() {
        let store = Arc::new(MemoryStore::new());
        let fixtures = vec![fixture("1d.contiguous.raw.i2")];
        generate(&store, &NodePath::root(), &fixtures).unwrap();
        store
            .set(
                &"1d.contiguous.raw.i2/c/0".try_into().unwrap(),
                Bytes::from_static(&[1, 0, 2, 0, 3, 0, 5, 0]),
            )
            .unwrap();
        assert!(matches!(
            verify(&store, &NodePath::root(), &fixtures),
            Err(FixtureError::Mismatch { name: "1d.contiguous.raw.i2", .. })
        ));
        assert!(select(catalogue(), "no such fixture").is_empty());
    }
}
