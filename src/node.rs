//! Zarr hierarchy nodes.
//!
//! A node in a Zarr hierarchy is either an [`Array`](crate::array::Array) or a [`Group`](crate::group::Group).
//! Every node is identified by a [`NodePath`], and its metadata is stored at [`meta_key`](crate::storage::meta_key).

mod node_path;

pub use node_path::{NodePath, NodePathError};
