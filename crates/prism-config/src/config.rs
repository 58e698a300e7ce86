//! Concrete config shapes and their defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config_node;
use crate::param::{FieldKind, FieldValue, Param, typed_or_raw};

// ---------------------------------------------------------------------------
// Tag enums
// ---------------------------------------------------------------------------

macro_rules! tag_field {
    ($ty:ident { $($variant:ident => $tag:literal),* $(,)? }) => {
        impl $ty {
            /// Tag as written in config documents.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $tag,)*
                }
            }
        }

        impl FieldValue for $ty {
            const KIND: FieldKind = FieldKind::Scalar;

            fn to_value(&self) -> Value {
                Value::from(self.as_str())
            }

            fn from_patch(patch: &Value) -> Param<Self> {
                typed_or_raw(patch)
            }
        }
    };
}

/// Background composited behind rendered views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    /// Checkerboard, makes alpha visible.
    #[default]
    Checker,
    White,
    Black,
    /// Use the reference image's own background.
    Reference,
}

tag_field!(Background {
    Checker => "checker",
    White => "white",
    Black => "black",
    Reference => "reference",
});

/// Isosurface extraction method for the optimized geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Isosurface {
    /// Deep marching tetrahedra.
    #[default]
    Dmtet,
    Flexicubes,
}

tag_field!(Isosurface {
    Dmtet => "dmtet",
    Flexicubes => "flexicubes",
});

/// Image-space loss used against reference renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LossKind {
    /// L1 on log-tonemapped color.
    #[default]
    Logl1,
    /// L2 on log-tonemapped color.
    Logl2,
    Mse,
    Smape,
    Relmse,
}

tag_field!(LossKind {
    Logl1 => "logl1",
    Logl2 => "logl2",
    Mse => "mse",
    Smape => "smape",
    Relmse => "relmse",
});

/// How the Laplacian smoothness term is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaplaceMode {
    /// Relative to the initial mesh.
    #[default]
    Relative,
    Absolute,
}

tag_field!(LaplaceMode {
    Relative => "relative",
    Absolute => "absolute",
});

// ---------------------------------------------------------------------------
// Per-concern shapes
// ---------------------------------------------------------------------------

/// GPU placement settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GpuConfig {
    /// Rank of this worker on its host.
    pub local_rank: Param<u32>,
    /// Run one worker per device.
    pub multi_gpu: Param<bool>,
}

/// Rendering settings for display and validation views.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub background: Param<Background>,
    /// Samples per pixel.
    pub spp: Param<u32>,
    /// Display resolution as `[height, width]`.
    pub display_res: Param<Vec<Param<u32>>>,
}

/// Logging and snapshot output settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Iterations between log lines.
    pub log_interval: Param<u32>,
    /// Directory for log files.
    pub log_dir: Param<PathBuf>,
    /// Iterations between saved images.
    pub save_interval: Param<u32>,
    /// Iterations between display refreshes; 0 disables the display.
    pub display_interval: Param<u32>,
    /// Debug views to show, e.g. `{"bsdf": "kd"}`.
    pub display: Param<Vec<Param<Value>>>,
    /// Output directory for images, meshes and the config snapshot.
    pub out_dir: Param<Option<PathBuf>>,
}

/// Reference data settings.
#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    /// Reference mesh to fit.
    pub ref_mesh: Param<Option<PathBuf>>,
    /// Material file that replaces the reference mesh's own.
    pub mtl_override: Param<Option<PathBuf>>,
    /// Load all reference views up front.
    pub pre_load: Param<bool>,
    /// Training resolution as `[height, width]`.
    pub train_res: Param<Vec<Param<u32>>>,
}

/// Geometry representation settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryConfig {
    pub isosurface: Param<Isosurface>,
    /// Tetrahedral grid resolution.
    pub dmtet_grid: Param<u32>,
    /// Scale of the grid around the origin.
    pub mesh_scale: Param<f64>,
    /// Fixed base mesh, skipping isosurface extraction.
    pub base_mesh: Param<Option<PathBuf>>,
}

/// One optimization pass of the training loop.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationPassConfig {
    pub num_iter: Param<u32>,
    /// Views per iteration.
    pub batch: Param<u32>,
    /// Iterations of learning-rate warmup.
    pub warmup_iter: Param<u32>,
    pub learning_rate: Param<f64>,
    pub save_interval: Param<u32>,
    pub display_interval: Param<u32>,
    pub optimize_geometry: Param<bool>,
    pub optimize_material: Param<bool>,
    pub optimize_light: Param<bool>,
}

/// Material texture settings.
///
/// Min/max bounds clamp the optimized textures per channel: `kd` is RGBA
/// diffuse, `ks` is occlusion/roughness/metalness, `nrm` is the
/// tangent-space normal.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialConfig {
    /// Number of material layers.
    pub layers: Param<u32>,
    /// Initialize textures with noise instead of constants.
    pub random_textures: Param<bool>,
    /// Use a custom mip pyramid instead of hardware mips.
    pub custom_mip: Param<bool>,
    pub texture_res: Param<Vec<Param<u32>>>,
    pub kd_min: Param<Vec<Param<f64>>>,
    pub kd_max: Param<Vec<Param<f64>>>,
    pub ks_min: Param<Vec<Param<f64>>>,
    pub ks_max: Param<Vec<Param<f64>>>,
    pub nrm_min: Param<Vec<Param<f64>>>,
    pub nrm_max: Param<Vec<Param<f64>>>,
}

/// Camera settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    /// Near and far clip planes.
    pub cam_near_far: Param<Vec<Param<f64>>>,
}

/// Environment lighting settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LightConfig {
    /// Multiplier applied to the environment map.
    pub env_scale: Param<f64>,
    /// HDR environment map to light with.
    pub envmap: Param<Option<PathBuf>>,
    /// Keep the light fixed relative to the camera.
    pub camera_space_light: Param<bool>,
    /// How the optimized light is initialized.
    pub initial_light: Param<String>,
}

/// Loss and regularizer settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LossConfig {
    pub loss: Param<LossKind>,
    pub sdf_regularizer: Param<f64>,
    pub sdf_consistency: Param<f64>,
    pub laplace: Param<LaplaceMode>,
    pub laplace_weight: Param<f64>,
}

// ---------------------------------------------------------------------------
// RunConfig
// ---------------------------------------------------------------------------

/// Complete configuration of one optimization run.
///
/// Every section's fields sit at the top level of a run document; the
/// sections only group them in code.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Render validation views after training.
    pub validate: Param<bool>,
    /// Passes that optimize geometry, material and light.
    pub optimization_passes: Param<Vec<Param<OptimizationPassConfig>>>,
    /// Passes that refine textures on the extracted mesh.
    pub texture_optimization_passes: Param<Vec<Param<OptimizationPassConfig>>>,
    pub data: DataConfig,
    pub geometry: GeometryConfig,
    pub material: MaterialConfig,
    pub render: RenderConfig,
    pub logging: LoggingConfig,
    pub camera: CameraConfig,
    pub light: LightConfig,
    pub loss: LossConfig,
    pub gpu: GpuConfig,
}

config_node!(GpuConfig { local_rank, multi_gpu });
config_node!(RenderConfig { background, spp, display_res });
config_node!(LoggingConfig {
    log_interval,
    log_dir,
    save_interval,
    display_interval,
    display,
    out_dir,
});
config_node!(DataConfig { ref_mesh, mtl_override, pre_load, train_res });
config_node!(GeometryConfig { isosurface, dmtet_grid, mesh_scale, base_mesh });
config_node!(OptimizationPassConfig {
    num_iter,
    batch,
    warmup_iter,
    learning_rate,
    save_interval,
    display_interval,
    optimize_geometry,
    optimize_material,
    optimize_light,
});
config_node!(MaterialConfig {
    layers,
    random_textures,
    custom_mip,
    texture_res,
    kd_min,
    kd_max,
    ks_min,
    ks_max,
    nrm_min,
    nrm_max,
});
config_node!(CameraConfig { cam_near_far });
config_node!(LightConfig { env_scale, envmap, camera_space_light, initial_light });
config_node!(LossConfig { loss, sdf_regularizer, sdf_consistency, laplace, laplace_weight });
config_node!(RunConfig { validate, optimization_passes, texture_optimization_passes } flatten {
    data,
    geometry,
    material,
    render,
    logging,
    camera,
    light,
    loss,
    gpu,
});

impl RunConfig {
    /// Number of geometry optimization passes, 0 if the field holds a raw value.
    pub fn pass_count(&self) -> usize {
        self.optimization_passes.get().map_or(0, Vec::len)
    }

    /// Number of texture optimization passes, 0 if the field holds a raw value.
    pub fn texture_pass_count(&self) -> usize {
        self.texture_optimization_passes.get().map_or(0, Vec::len)
    }
}

// --- Default implementations ---

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            local_rank: Param::Value(0),
            multi_gpu: Param::Value(false),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background: Param::Value(Background::Checker),
            spp: Param::Value(1),
            display_res: Param::sequence([512, 512]),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_interval: Param::Value(100),
            log_dir: Param::Value(PathBuf::from("logs")),
            save_interval: Param::Value(100),
            display_interval: Param::Value(0),
            display: Param::sequence([
                json!({"latlong": true}),
                json!({"bsdf": "kd"}),
                json!({"bsdf": "ks"}),
                json!({"bsdf": "normal"}),
            ]),
            out_dir: Param::Value(None),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            ref_mesh: Param::Value(None),
            mtl_override: Param::Value(None),
            pre_load: Param::Value(true),
            train_res: Param::sequence([512, 512]),
        }
    }
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            isosurface: Param::Value(Isosurface::Dmtet),
            dmtet_grid: Param::Value(64),
            mesh_scale: Param::Value(2.1),
            base_mesh: Param::Value(None),
        }
    }
}

impl Default for OptimizationPassConfig {
    fn default() -> Self {
        Self {
            num_iter: Param::Value(5000),
            batch: Param::Value(8),
            warmup_iter: Param::Value(100),
            learning_rate: Param::Value(0.01),
            save_interval: Param::Value(100),
            display_interval: Param::Value(0),
            optimize_geometry: Param::Value(true),
            optimize_material: Param::Value(true),
            optimize_light: Param::Value(true),
        }
    }
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            layers: Param::Value(1),
            random_textures: Param::Value(true),
            custom_mip: Param::Value(false),
            texture_res: Param::sequence([1024, 1024]),
            kd_min: Param::sequence([0.0, 0.0, 0.0, 0.0]),
            kd_max: Param::sequence([1.0, 1.0, 1.0, 1.0]),
            ks_min: Param::sequence([0.0, 0.08, 0.0]),
            ks_max: Param::sequence([1.0, 1.0, 1.0]),
            nrm_min: Param::sequence([-1.0, -1.0, 0.0]),
            nrm_max: Param::sequence([1.0, 1.0, 1.0]),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            cam_near_far: Param::sequence([0.1, 1000.0]),
        }
    }
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            env_scale: Param::Value(1.0),
            envmap: Param::Value(None),
            camera_space_light: Param::Value(false),
            initial_light: Param::Value("random".to_string()),
        }
    }
}

impl Default for LossConfig {
    fn default() -> Self {
        Self {
            loss: Param::Value(LossKind::Logl1),
            sdf_regularizer: Param::Value(0.2),
            sdf_consistency: Param::Value(0.03),
            laplace: Param::Value(LaplaceMode::Relative),
            laplace_weight: Param::Value(0.1),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            validate: Param::Value(true),
            optimization_passes: Param::sequence([OptimizationPassConfig::default()]),
            texture_optimization_passes: Param::sequence([OptimizationPassConfig::default()]),
            data: DataConfig::default(),
            geometry: GeometryConfig::default(),
            material: MaterialConfig::default(),
            render: RenderConfig::default(),
            logging: LoggingConfig::default(),
            camera: CameraConfig::default(),
            light: LightConfig::default(),
            loss: LossConfig::default(),
            gpu: GpuConfig::default(),
        }
    }
}
