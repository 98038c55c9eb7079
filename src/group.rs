//! Zarr groups.
//!
//! A group is a node in a Zarr hierarchy that holds user attributes and may have child nodes (groups or [`arrays`](crate::array)).
//! Its metadata is stored in the `zarr.json` blob at [`meta_key`], for example:
//! ```json
//! {
//!     "zarr_format": 3,
//!     "node_type": "group",
//!     "attributes": {
//!         "generator": "zarrs_fixtures"
//!     }
//! }
//! ```

use std::sync::Arc;

use derive_more::Display;
use log::debug;
use thiserror::Error;

pub use crate::metadata::GroupMetadataV3;

use crate::{
    node::{NodePath, NodePathError},
    storage::{
        discover_children, meta_key, ListableStorageTraits, ReadableStorageTraits, StorageError,
        WritableStorageTraits,
    },
};

/// A group.
#[derive(Clone, Debug, Display)]
#[display("group {path} {metadata}")]
pub struct Group<TStorage: ?Sized> {
    storage: Arc<TStorage>,
    path: NodePath,
    metadata: GroupMetadataV3,
}

/// A group creation error.
#[derive(Debug, Error)]
pub enum GroupCreateError {
    /// An invalid node path.
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// The group metadata could not be deserialized.
    #[error(transparent)]
    MetadataDeserializationError(#[from] serde_json::Error),
    /// There is no metadata at the group path.
    #[error("group metadata is missing")]
    MissingMetadata,
}

impl<TStorage: ?Sized> Group<TStorage> {
    /// Create a group in `storage` at `path` with `metadata`.
    ///
    /// Nothing is written until [`store_metadata`](Group::store_metadata) is called.
    ///
    /// # Errors
    /// Returns [`GroupCreateError::NodePathError`] if `path` is not a valid node path.
    pub fn new_with_metadata(
        storage: Arc<TStorage>,
        path: &str,
        metadata: GroupMetadataV3,
    ) -> Result<Self, GroupCreateError> {
        Ok(Self {
            storage,
            path: NodePath::new(path)?,
            metadata,
        })
    }

    /// Get the node path.
    #[must_use]
    pub fn path(&self) -> &NodePath {
        &self.path
    }

    /// Get the attributes.
    #[must_use]
    pub fn attributes(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.metadata.attributes
    }

    /// Mutably borrow the attributes.
    pub fn attributes_mut(&mut self) -> &mut serde_json::Map<String, serde_json::Value> {
        &mut self.metadata.attributes
    }

    /// Get the metadata.
    #[must_use]
    pub fn metadata(&self) -> &GroupMetadataV3 {
        &self.metadata
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> Group<TStorage> {
    /// Open an existing group in `storage` at `path`.
    ///
    /// # Errors
    /// Returns [`GroupCreateError::MissingMetadata`] if there is no metadata at `path`.
    /// Returns [`GroupCreateError::MetadataDeserializationError`] if the metadata is not group metadata.
    pub fn new(storage: Arc<TStorage>, path: &str) -> Result<Self, GroupCreateError> {
        let node_path = NodePath::new(path)?;
        let metadata: GroupMetadataV3 = match storage.get(&meta_key(&node_path))? {
            Some(metadata) => serde_json::from_slice(&metadata)?,
            None => return Err(GroupCreateError::MissingMetadata),
        };
        debug!("opened group {node_path}");
        Ok(Self {
            storage,
            path: node_path,
            metadata,
        })
    }
}

impl<TStorage: ?Sized + WritableStorageTraits> Group<TStorage> {
    /// Store metadata.
    ///
    /// # Errors
    /// Returns [`StorageError`] if there is an underlying store error.
    pub fn store_metadata(&self) -> Result<(), StorageError> {
        crate::storage::create_group(&*self.storage, self.path(), self.metadata())?;
        debug!("created group {}", self.path());
        Ok(())
    }
}

impl<TStorage: ?Sized + ListableStorageTraits> Group<TStorage> {
    /// Return the paths of the direct children of this group.
    ///
    /// # Errors
    /// Returns [`StorageError`] if there is an underlying store error.
    pub fn child_paths(&self) -> Result<Vec<NodePath>, StorageError> {
        discover_children(&*self.storage, self.path())
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{store::MemoryStore, Bytes, WritableStorageTraits};

    use super::*;

    #[test]
    fn group_write_read() {
        let store = Arc::new(MemoryStore::new());
        let mut attributes = serde_json::Map::new();
        attributes.insert("spam".to_string(), "ham".into());
        let group =
            Group::new_with_metadata(store.clone(), "/group", GroupMetadataV3::new(attributes))
                .unwrap();
        group.store_metadata().unwrap();

        let opened = Group::new(store, "/group").unwrap();
        assert_eq!(opened.metadata(), group.metadata());
        assert_eq!(opened.attributes()["spam"], "ham");
        assert_eq!(opened.path().as_str(), "/group");
    }

    #[test]
    fn group_open_errors() {
        let store = Arc::new(MemoryStore::new());
        assert!(matches!(
            Group::new(store.clone(), "/missing"),
            Err(GroupCreateError::MissingMetadata)
        ));
        assert!(matches!(
            Group::new(store.clone(), "invalid"),
            Err(GroupCreateError::NodePathError(_))
        ));
        store
            .set(
                &"array/zarr.json".try_into().unwrap(),
                Bytes::from_static(br#"{"zarr_format": 3, "node_type": "array"}"#),
            )
            .unwrap();
        assert!(matches!(
            Group::new(store, "/array"),
            Err(GroupCreateError::MetadataDeserializationError(_))
        ));
    }

    #[test]
    fn group_child_paths() {
        let store = Arc::new(MemoryStore::new());
        let root = Group::new_with_metadata(store.clone(), "/", GroupMetadataV3::default()).unwrap();
        root.store_metadata().unwrap();
        Group::new_with_metadata(store.clone(), "/a", GroupMetadataV3::default())
            .unwrap()
            .store_metadata()
            .unwrap();
        Group::new_with_metadata(store.clone(), "/b", GroupMetadataV3::default())
            .unwrap()
            .store_metadata()
            .unwrap();
        let mut children = root
            .child_paths()
            .unwrap()
            .into_iter()
            .map(|path| path.as_str().to_string())
            .collect::<Vec<_>>();
        children.sort();
        assert_eq!(children, vec!["/a", "/b"]);
    }
}
