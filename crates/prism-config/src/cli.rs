//! Command-line overrides for run configs.

use std::path::PathBuf;

use clap::Parser;
use serde_json::Value;

use crate::config::RunConfig;
use crate::document::Mapping;
use crate::error::ConfigError;
use crate::node::ConfigNode;

/// Run configuration arguments.
///
/// CLI values override settings loaded from the `--config` document. They are
/// applied as an overlay patch, so they follow the same rules as a document.
#[derive(Parser, Debug, Default)]
#[command(name = "prism", about = "Prism run configuration")]
pub struct CliArgs {
    /// Run config document (JSON, or RON with a `.ron` extension).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Iterations for every optimization pass.
    #[arg(short = 'i', long)]
    pub iter: Option<u32>,

    /// Batch size for every optimization pass.
    #[arg(short = 'b', long)]
    pub batch: Option<u32>,

    /// Learning rate for every optimization pass.
    #[arg(long)]
    pub learning_rate: Option<f64>,

    /// Samples per pixel.
    #[arg(short = 's', long)]
    pub spp: Option<u32>,

    /// Number of material layers.
    #[arg(short = 'l', long)]
    pub layers: Option<u32>,

    /// Training resolution.
    #[arg(long, num_args = 2, value_names = ["HEIGHT", "WIDTH"])]
    pub train_res: Option<Vec<u32>>,

    /// Display resolution.
    #[arg(long, num_args = 2, value_names = ["HEIGHT", "WIDTH"])]
    pub display_res: Option<Vec<u32>>,

    /// Texture resolution.
    #[arg(long, num_args = 2, value_names = ["HEIGHT", "WIDTH"])]
    pub texture_res: Option<Vec<u32>>,

    /// Background (checker, white, black, reference).
    #[arg(long)]
    pub background: Option<String>,

    /// Image loss (logl1, logl2, mse, smape, relmse).
    #[arg(long)]
    pub loss: Option<String>,

    /// Isosurface method (dmtet, flexicubes).
    #[arg(long)]
    pub isosurface: Option<String>,

    /// Output directory.
    #[arg(short = 'o', long)]
    pub out_dir: Option<PathBuf>,

    /// Render validation views after training.
    #[arg(long)]
    pub validate: Option<bool>,

    /// Log level (error, warn, info, debug, trace).
    ///
    /// Not a run field: hand it to `prism_log::init_logging` as its `level`.
    #[arg(long)]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// The overrides as an overlay patch for a run with `passes` optimization
    /// passes. Pass-level overrides address every pass.
    pub fn to_patch(&self, passes: usize) -> Mapping {
        let mut patch = Mapping::new();
        insert(&mut patch, "spp", self.spp);
        insert(&mut patch, "layers", self.layers);
        insert(&mut patch, "train_res", self.train_res.clone());
        insert(&mut patch, "display_res", self.display_res.clone());
        insert(&mut patch, "texture_res", self.texture_res.clone());
        insert(&mut patch, "background", self.background.clone());
        insert(&mut patch, "loss", self.loss.clone());
        insert(&mut patch, "isosurface", self.isosurface.clone());
        insert(
            &mut patch,
            "out_dir",
            self.out_dir
                .as_ref()
                .map(|dir| dir.to_string_lossy().into_owned()),
        );
        insert(&mut patch, "validate", self.validate);

        let mut pass = Mapping::new();
        insert(&mut pass, "num_iter", self.iter);
        insert(&mut pass, "batch", self.batch);
        insert(&mut pass, "learning_rate", self.learning_rate);
        if !pass.is_empty() && passes > 0 {
            patch.insert(
                "optimization_passes".to_string(),
                Value::Array(vec![Value::Object(pass); passes]),
            );
        }

        patch
    }

    /// Load the `--config` document, or defaults without one, and apply the
    /// overrides on top.
    pub fn load_run_config(&self) -> Result<RunConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };
        config.apply_cli_overrides(self);
        Ok(config)
    }
}

impl RunConfig {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        let patch = args.to_patch(self.pass_count());
        if !patch.is_empty() {
            log::debug!("Applying {} CLI overrides", patch.len());
            self.overlay(&patch);
        }
    }
}

fn insert(patch: &mut Mapping, key: &str, value: Option<impl Into<Value>>) {
    if let Some(value) = value {
        patch.insert(key.to_string(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Background, LossKind};

    #[test]
    fn test_cli_override() {
        let mut config = RunConfig::default();
        let args = CliArgs {
            spp: Some(4),
            train_res: Some(vec![1024, 768]),
            background: Some("white".to_string()),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.render.spp.get(), Some(&4));
        assert_eq!(config.data.train_res.items(), Some(vec![&1024, &768]));
        assert_eq!(config.render.background.get(), Some(&Background::White));
        // Non-overridden fields retain defaults
        assert_eq!(config.loss.loss.get(), Some(&LossKind::Logl1));
        assert_eq!(config.render.display_res.items(), Some(vec![&512, &512]));
    }

    #[test]
    fn test_cli_no_override() {
        let original = RunConfig::default();
        let mut config = RunConfig::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_pass_overrides_reach_every_pass() {
        let mut config = RunConfig::default();
        let patch = serde_json::json!({"optimization_passes": [{}, {"num_iter": 2000}]});
        if let Value::Object(patch) = patch {
            config.overlay(&patch);
        }
        // The default run has a single pass, so the second entry is dropped.
        assert_eq!(config.pass_count(), 1);

        let args = CliArgs {
            iter: Some(300),
            learning_rate: Some(0.03),
            ..Default::default()
        };
        config.apply_cli_overrides(&args);

        let pass = config.optimization_passes.get().unwrap()[0].get().unwrap();
        assert_eq!(pass.num_iter.get(), Some(&300));
        assert_eq!(pass.learning_rate.get(), Some(&0.03));
        assert_eq!(pass.batch.get(), Some(&8));

        // Texture passes are not addressed by pass overrides.
        let texture_pass = config.texture_optimization_passes.get().unwrap()[0]
            .get()
            .unwrap();
        assert_eq!(texture_pass.num_iter.get(), Some(&5000));
    }

    #[test]
    fn test_parse_args() {
        let args = CliArgs::parse_from([
            "prism",
            "--config",
            "configs/bob.json",
            "-i",
            "500",
            "--train-res",
            "256",
            "256",
            "--validate",
            "false",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("configs/bob.json")));
        assert_eq!(args.iter, Some(500));
        assert_eq!(args.train_res, Some(vec![256, 256]));
        assert_eq!(args.validate, Some(false));
        assert_eq!(args.spp, None);
    }

    #[test]
    fn test_load_run_config_without_document() {
        let args = CliArgs {
            out_dir: Some(PathBuf::from("bob")),
            ..Default::default()
        };
        let config = args.load_run_config().unwrap();
        assert_eq!(config.logging.out_dir.get(), Some(&Some(PathBuf::from("bob"))));
    }

    #[test]
    fn test_load_run_config_missing_document() {
        let args = CliArgs {
            config: Some(PathBuf::from("does/not/exist.json")),
            ..Default::default()
        };
        assert!(matches!(args.load_run_config(), Err(ConfigError::NotFound(_))));
    }
}
