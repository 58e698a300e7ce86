//! Field storage: [`Param`], [`FieldKind`], and the [`Field`] / [`FieldValue`] traits.
//!
//! Overlays are permissive. A patch value that fits a field's declared type is
//! stored typed; anything else is kept verbatim as [`Param::Raw`] and handed to
//! whoever reads the field.

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde_json::Value;

// ---------------------------------------------------------------------------
// FieldKind
// ---------------------------------------------------------------------------

/// Structural kind of a declared field, fixed by the field's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A single value. Overlays replace it wholesale.
    Scalar,
    /// An ordered sequence. Overlays zip over it element by element.
    Sequence,
    /// A nested configuration node. Overlays recurse into it key by key.
    Node,
}

impl FieldKind {
    /// Returns `true` if a field of this kind merges `patch` in place instead
    /// of being replaced by it.
    pub fn merges(self, patch: &Value) -> bool {
        match self {
            Self::Scalar => false,
            Self::Sequence => patch.is_array(),
            Self::Node => patch.is_object(),
        }
    }
}

// ---------------------------------------------------------------------------
// Param
// ---------------------------------------------------------------------------

/// A configuration field value.
///
/// Holds `Value(T)` while the field carries its declared type. An overlay that
/// assigns something `T` cannot represent leaves the field as `Raw`, holding
/// the patch value exactly as it was given.
#[derive(Debug, Clone, PartialEq)]
pub enum Param<T> {
    /// The declared type.
    Value(T),
    /// A patch value that does not fit the declared type.
    Raw(Value),
}

impl<T> Param<T> {
    /// The typed value, or `None` if the field holds a raw value.
    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Raw(_) => None,
        }
    }

    /// The raw value, if an overlay replaced the typed one.
    pub fn raw(&self) -> Option<&Value> {
        match self {
            Self::Value(_) => None,
            Self::Raw(value) => Some(value),
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

impl<T> Param<Vec<Param<T>>> {
    /// Build a typed sequence field from its default items.
    pub fn sequence<const N: usize>(items: [T; N]) -> Self {
        Self::Value(items.into_iter().map(Param::Value).collect())
    }

    /// All items as typed values, or `None` if the sequence or any of its
    /// items holds a raw value.
    pub fn items(&self) -> Option<Vec<&T>> {
        self.get()?.iter().map(Param::get).collect()
    }
}

impl<T: Default> Default for Param<T> {
    fn default() -> Self {
        Self::Value(T::default())
    }
}

impl<T> From<T> for Param<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

// ---------------------------------------------------------------------------
// Field / FieldValue
// ---------------------------------------------------------------------------

/// A type that can be declared as a configuration field.
pub trait FieldValue: Sized {
    /// Structural kind of fields of this type.
    const KIND: FieldKind;

    /// Convert to a plain document value.
    fn to_value(&self) -> Value;

    /// Build a field from a patch value that replaces it wholesale.
    fn from_patch(patch: &Value) -> Param<Self>;

    /// Merge `patch` in place. Only called when [`Self::KIND`] merges `patch`,
    /// so scalars never see it.
    fn merge(&mut self, _patch: &Value) {}
}

/// Object-safe view of a declared field, used by [`ConfigNode`](crate::ConfigNode)
/// to walk a node's fields by name.
pub trait Field {
    /// Structural kind declared for this field.
    fn kind(&self) -> FieldKind;

    /// Current value as a plain document value.
    fn to_value(&self) -> Value;

    /// Overlay a patch value onto this field.
    fn overlay(&mut self, patch: &Value);
}

impl<T: FieldValue> Field for Param<T> {
    fn kind(&self) -> FieldKind {
        T::KIND
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Value(value) => value.to_value(),
            Self::Raw(value) => value.clone(),
        }
    }

    fn overlay(&mut self, patch: &Value) {
        match self {
            Self::Value(current) if T::KIND.merges(patch) => current.merge(patch),
            _ => *self = T::from_patch(patch),
        }
    }
}

/// Store `patch` typed if it deserializes into `T`, raw otherwise.
pub(crate) fn typed_or_raw<T: DeserializeOwned>(patch: &Value) -> Param<T> {
    match serde_json::from_value(patch.clone()) {
        Ok(value) => Param::Value(value),
        Err(_) => Param::Raw(patch.clone()),
    }
}

// ---------------------------------------------------------------------------
// Scalar and sequence implementations
// ---------------------------------------------------------------------------

macro_rules! copy_scalar_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                const KIND: FieldKind = FieldKind::Scalar;

                fn to_value(&self) -> Value {
                    Value::from(*self)
                }

                fn from_patch(patch: &Value) -> Param<Self> {
                    typed_or_raw(patch)
                }
            }
        )*
    };
}

copy_scalar_field!(bool, u32, u64, i32, i64);

// An integer patch stays raw so snapshots keep `3` rather than `3.0`.
impl FieldValue for f64 {
    const KIND: FieldKind = FieldKind::Scalar;

    fn to_value(&self) -> Value {
        Value::from(*self)
    }

    fn from_patch(patch: &Value) -> Param<Self> {
        match patch.as_f64() {
            Some(value) if patch.is_f64() => Param::Value(value),
            _ => Param::Raw(patch.clone()),
        }
    }
}

impl FieldValue for String {
    const KIND: FieldKind = FieldKind::Scalar;

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_patch(patch: &Value) -> Param<Self> {
        typed_or_raw(patch)
    }
}

impl FieldValue for PathBuf {
    const KIND: FieldKind = FieldKind::Scalar;

    fn to_value(&self) -> Value {
        Value::String(self.to_string_lossy().into_owned())
    }

    fn from_patch(patch: &Value) -> Param<Self> {
        typed_or_raw(patch)
    }
}

/// Optional paths are `null` when unset.
impl FieldValue for Option<PathBuf> {
    const KIND: FieldKind = FieldKind::Scalar;

    fn to_value(&self) -> Value {
        self.as_ref()
            .map_or(Value::Null, |path| Value::String(path.to_string_lossy().into_owned()))
    }

    fn from_patch(patch: &Value) -> Param<Self> {
        typed_or_raw(patch)
    }
}

/// Free-form values (e.g. display selectors) accept anything.
impl FieldValue for Value {
    const KIND: FieldKind = FieldKind::Scalar;

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_patch(patch: &Value) -> Param<Self> {
        Param::Value(patch.clone())
    }
}

impl<T: FieldValue> FieldValue for Vec<Param<T>> {
    const KIND: FieldKind = FieldKind::Sequence;

    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(Field::to_value).collect())
    }

    fn from_patch(patch: &Value) -> Param<Self> {
        match patch {
            Value::Array(items) => Param::Value(items.iter().map(T::from_patch).collect()),
            other => Param::Raw(other.clone()),
        }
    }

    /// Pairs items up to the shorter length. Extra patch items are dropped
    /// and extra current items are left alone; the sequence never changes length.
    fn merge(&mut self, patch: &Value) {
        if let Value::Array(items) = patch {
            for (current, item) in self.iter_mut().zip(items) {
                current.overlay(item);
            }
        }
    }
}
