//! Plugins for the named parts of array metadata.
//!
//! Chunk grids, chunk key encodings and codecs are each registered with [`inventory`] under their metadata name.
//! [`create_from_metadata`] looks up the plugin registered under the name in some [`Metadata`] and creates it from the configuration.

use thiserror::Error;

use crate::metadata::Metadata;

/// A named constructor of `TPlugin` from metadata.
pub struct Plugin<TPlugin> {
    name: &'static str,
    create_fn: fn(metadata: &Metadata) -> Result<TPlugin, PluginCreateError>,
}

impl<TPlugin> Plugin<TPlugin> {
    /// Create a plugin for registration under `name`.
    pub const fn new(
        name: &'static str,
        create_fn: fn(metadata: &Metadata) -> Result<TPlugin, PluginCreateError>,
    ) -> Self {
        Self { name, create_fn }
    }

    /// The metadata name of the plugin.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Create a `TPlugin` from `metadata`.
    ///
    /// # Errors
    /// Returns a [`PluginCreateError`] if the configuration is invalid.
    pub fn create(&self, metadata: &Metadata) -> Result<TPlugin, PluginCreateError> {
        (self.create_fn)(metadata)
    }
}

/// Create a `TPlugin` with the registered plugin matching the name of `metadata`.
///
/// `plugin_type` names the kind of plugin in errors, e.g. `"codec"`.
///
/// # Errors
/// Returns [`PluginCreateError::Unsupported`] if no plugin is registered under the name,
/// or the error of the plugin if its configuration is invalid.
pub fn create_from_metadata<TPlugin: 'static>(
    plugin_type: &'static str,
    metadata: &Metadata,
) -> Result<TPlugin, PluginCreateError>
where
    Plugin<TPlugin>: inventory::Collect,
{
    inventory::iter::<Plugin<TPlugin>>
        .into_iter()
        .find(|plugin| plugin.name() == metadata.name())
        .ok_or_else(|| PluginCreateError::Unsupported {
            name: metadata.name().to_string(),
            plugin_type: plugin_type.to_string(),
        })?
        .create(metadata)
}

/// The configuration in some metadata does not fit its plugin.
#[derive(Debug, Error)]
#[error("invalid {plugin_type} configuration for {name}: {metadata}")]
pub struct PluginMetadataInvalidError {
    name: &'static str,
    plugin_type: &'static str,
    metadata: Box<Metadata>,
}

impl PluginMetadataInvalidError {
    /// Create a new [`PluginMetadataInvalidError`].
    #[must_use]
    pub fn new(name: &'static str, plugin_type: &'static str, metadata: Metadata) -> Self {
        Self {
            name,
            plugin_type,
            metadata: Box::new(metadata),
        }
    }
}

/// A plugin creation error.
#[derive(Debug, Error)]
pub enum PluginCreateError {
    /// No plugin is registered under the name.
    #[error("{plugin_type} {name} is not supported")]
    Unsupported {
        /// The metadata name.
        name: String,
        /// The kind of plugin.
        plugin_type: String,
    },
    /// The configuration is invalid.
    #[error(transparent)]
    MetadataInvalid(#[from] PluginMetadataInvalidError),
    /// The configuration is valid but cannot be used.
    #[error("{_0}")]
    Other(String),
}

impl From<&str> for PluginCreateError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for PluginCreateError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}
