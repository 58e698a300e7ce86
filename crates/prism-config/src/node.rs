//! The [`ConfigNode`] contract: snapshot, overlay, load and save.

use std::path::Path;

use serde_json::Value;

use crate::document::{DocumentFormat, Mapping};
use crate::error::{ConfigError, FormatError};
use crate::param::{Field, FieldKind, Param};

/// A configuration record with a fixed, declared set of named fields.
///
/// Implementors only enumerate their fields; use [`config_node!`](crate::config_node)
/// rather than writing the two methods by hand. Everything else is provided.
pub trait ConfigNode {
    /// Declared fields in declaration order.
    fn fields(&self) -> Vec<(&'static str, &dyn Field)>;

    /// Declared fields in declaration order, mutably.
    fn fields_mut(&mut self) -> Vec<(&'static str, &mut dyn Field)>;

    /// Declared field names in declaration order.
    fn field_names(&self) -> Vec<&'static str> {
        self.fields().into_iter().map(|(name, _)| name).collect()
    }

    /// Snapshot every declared field as a plain nested mapping.
    fn to_mapping(&self) -> Mapping {
        self.fields()
            .into_iter()
            .map(|(name, field)| (name.to_owned(), field.to_value()))
            .collect()
    }

    /// Overlay `patch` onto this node in place.
    ///
    /// Keys that name no declared field are skipped. Nested nodes and
    /// sequences merge when the patch has the same shape; everything else is
    /// replaced verbatim. The set of fields never changes.
    fn overlay(&mut self, patch: &Mapping) {
        let mut fields = self.fields_mut();
        for (key, value) in patch {
            match fields.iter_mut().find(|(name, _)| *name == key.as_str()) {
                Some((_, field)) => {
                    let kind = field.kind();
                    if kind != FieldKind::Scalar && !kind.merges(value) {
                        log::debug!("Replacing {kind:?} config key `{key}` verbatim");
                    }
                    field.overlay(value);
                }
                None => log::debug!("Ignoring unknown config key `{key}`"),
            }
        }
    }

    /// Default-construct this shape and overlay the document at `path`.
    ///
    /// RON is used for `.ron` files, JSON for everything else.
    fn load(path: &Path) -> Result<Self, ConfigError>
    where
        Self: Default + Sized,
    {
        let bytes = std::fs::read(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
            _ => ConfigError::ReadError(err),
        })?;
        let config = Self::load_bytes(&bytes, DocumentFormat::from_path(path)).map_err(
            |source| ConfigError::ParseError {
                path: path.to_path_buf(),
                source,
            },
        )?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Default-construct this shape and overlay an in-memory document.
    fn load_bytes(bytes: &[u8], format: DocumentFormat) -> Result<Self, FormatError>
    where
        Self: Default + Sized,
    {
        let patch = format.parse(bytes)?;
        let mut config = Self::default();
        config.overlay(&patch);
        Ok(config)
    }

    /// Write a snapshot of this node to `path`, creating parent directories.
    fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(ConfigError::WriteError)?;
        }

        let serialized = DocumentFormat::from_path(path)
            .render(&self.to_mapping())
            .map_err(ConfigError::SerializeError)?;

        std::fs::write(path, serialized).map_err(ConfigError::WriteError)?;
        log::info!("Saved config snapshot to {}", path.display());
        Ok(())
    }
}

/// Snapshot of a nested node field.
pub fn node_to_value<N: ConfigNode>(node: &N) -> Value {
    Value::Object(node.to_mapping())
}

/// A nested node replaced wholesale keeps the patch verbatim, whatever its
/// shape. Only a node still held typed merges a later mapping.
pub fn node_from_patch<N: ConfigNode>(patch: &Value) -> Param<N> {
    Param::Raw(patch.clone())
}

/// Merge a mapping patch into a nested node in place.
pub fn node_merge<N: ConfigNode>(node: &mut N, patch: &Value) {
    if let Value::Object(mapping) = patch {
        node.overlay(mapping);
    }
}

/// Implement [`ConfigNode`] and [`FieldValue`](crate::FieldValue) for a struct
/// whose listed fields are all [`Param`]s.
///
/// Sections named under `flatten` must themselves be config nodes; their
/// fields are spliced in at this level, so documents address them without a
/// section key.
///
/// ```
/// use prism_config::{config_node, ConfigNode, Param};
///
/// #[derive(Debug, Default)]
/// struct Camera {
///     fov: Param<f64>,
/// }
///
/// #[derive(Debug, Default)]
/// struct Shot {
///     name: Param<String>,
///     camera: Camera,
/// }
///
/// config_node!(Camera { fov });
/// config_node!(Shot { name } flatten { camera });
///
/// assert_eq!(Shot::default().field_names(), ["name", "fov"]);
/// ```
#[macro_export]
macro_rules! config_node {
    ($ty:ident { $($field:ident),* $(,)? } $(flatten { $($section:ident),* $(,)? })?) => {
        impl $crate::ConfigNode for $ty {
            fn fields(&self) -> ::std::vec::Vec<(&'static str, &dyn $crate::Field)> {
                #[allow(unused_mut)]
                let mut fields: ::std::vec::Vec<(&'static str, &dyn $crate::Field)> =
                    ::std::vec![$((::std::stringify!($field), &self.$field as &dyn $crate::Field)),*];
                $($(fields.extend($crate::ConfigNode::fields(&self.$section));)*)?
                fields
            }

            fn fields_mut(&mut self) -> ::std::vec::Vec<(&'static str, &mut dyn $crate::Field)> {
                #[allow(unused_mut)]
                let mut fields: ::std::vec::Vec<(&'static str, &mut dyn $crate::Field)> =
                    ::std::vec![$((::std::stringify!($field), &mut self.$field as &mut dyn $crate::Field)),*];
                $($(fields.extend($crate::ConfigNode::fields_mut(&mut self.$section));)*)?
                fields
            }
        }

        impl $crate::FieldValue for $ty {
            const KIND: $crate::FieldKind = $crate::FieldKind::Node;

            fn to_value(&self) -> $crate::Value {
                $crate::node_to_value(self)
            }

            fn from_patch(patch: &$crate::Value) -> $crate::Param<Self> {
                $crate::node_from_patch(patch)
            }

            fn merge(&mut self, patch: &$crate::Value) {
                $crate::node_merge(self, patch)
            }
        }
    };
}
