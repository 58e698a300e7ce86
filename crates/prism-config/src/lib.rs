//! Run configuration for the Prism asset optimization pipeline.
//!
//! Typed defaults for every pipeline concern, overlaid from JSON or RON
//! documents and snapshotted back to them. Overlays are permissive: unknown
//! keys are skipped and values that do not fit a field's type are kept as
//! given. Supports CLI overrides via clap.

mod cli;
mod config;
mod document;
mod error;
mod node;
mod param;


pub use cli::CliArgs;
pub use config::{
    Background, CameraConfig, DataConfig, GeometryConfig, GpuConfig, Isosurface, LaplaceMode,
    LightConfig, LoggingConfig, LossConfig, LossKind, MaterialConfig, OptimizationPassConfig,
    RenderConfig, RunConfig,
};
pub use document::{DocumentFormat, Mapping};
pub use error::{ConfigError, FormatError};
#[doc(hidden)]
pub use node::{node_from_patch, node_merge, node_to_value};
pub use node::ConfigNode;
pub use param::{Field, FieldKind, FieldValue, Param};
pub use serde_json::Value;
