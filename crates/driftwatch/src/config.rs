//! Pipeline configuration.
//!
//! One explicit value object, loaded from TOML at startup and passed by
//! reference into every component. Relative paths are resolved against the
//! config file's parent directory at load time, so nothing downstream ever
//! resolves a path against its own location or the working directory.

use crate::stage::{Stage, StageParams};
use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file name looked up in the working directory when `--config` is
/// not given.
pub const DEFAULT_CONFIG_FILE: &str = "driftwatch.toml";

fn default_extension() -> String {
    "csv".to_string()
}

fn default_model_file() -> String {
    "trainedmodel.pkl".to_string()
}

fn default_dataset_file() -> String {
    "finaldata.csv".to_string()
}

fn default_record_file() -> String {
    "ingestedfiles.txt".to_string()
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    pub source: SourceConfig,
    pub paths: PathsConfig,
    pub stages: StagesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where new data arrives and what counts as data.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Directory watched for newly arrived tabular files (non-recursive).
    pub input_dir: PathBuf,
    /// Extension filter for arrival detection. A leading dot is accepted
    /// and stripped.
    #[serde(default = "default_extension")]
    pub extension: String,
}

/// Filesystem locations the stages read and write.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Where ingestion writes the merged dataset and record file.
    pub ingest_dir: PathBuf,
    /// Where training writes the candidate model.
    pub model_dir: PathBuf,
    /// Production deployment directory holding the live model.
    pub deploy_dir: PathBuf,
    /// SQLite file holding both ledger tables.
    pub ledger_db: PathBuf,
    /// Model artifact file name within model_dir / deploy_dir.
    #[serde(default = "default_model_file")]
    pub model_file: String,
    /// Merged dataset file name within ingest_dir.
    #[serde(default = "default_dataset_file")]
    pub dataset_file: String,
    /// Ingestion record file name within ingest_dir.
    #[serde(default = "default_record_file")]
    pub record_file: String,
}

/// Optional file logging.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Directory for daily-rolling log files. Stderr logging is always on.
    pub dir: Option<PathBuf>,
}

/// External command for one pipeline stage.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// The five stage commands. A closed set: a new stage is a code change
/// here and in [`Stage`], not a free-form configuration key.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StagesConfig {
    pub ingestion: StageCommand,
    pub training: StageCommand,
    pub scoring: StageCommand,
    pub deployment: StageCommand,
    pub reporting: StageCommand,
}

impl StagesConfig {
    pub fn command(&self, stage: Stage) -> &StageCommand {
        match stage {
            Stage::Ingestion => &self.ingestion,
            Stage::Training => &self.training,
            Stage::Scoring => &self.scoring,
            Stage::Deployment => &self.deployment,
            Stage::Reporting => &self.reporting,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file, resolving relative paths
    /// against the file's parent directory.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: PipelineConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base);
        config.source.extension = config
            .source
            .extension
            .trim_start_matches('.')
            .to_string();

        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.source.input_dir,
            &mut self.paths.ingest_dir,
            &mut self.paths.model_dir,
            &mut self.paths.deploy_dir,
            &mut self.paths.ledger_db,
        ] {
            if path.is_relative() {
                *path = base.join(path.as_path());
            }
        }
        if let Some(dir) = &mut self.logging.dir {
            if dir.is_relative() {
                *dir = base.join(dir.as_path());
            }
        }
    }

    // ========================================================================
    // Derived artifact locations
    // ========================================================================

    /// Live model artifact under the production deployment directory.
    pub fn deployed_model_path(&self) -> PathBuf {
        self.paths.deploy_dir.join(&self.paths.model_file)
    }

    /// Candidate model artifact written by the training stage.
    pub fn trained_model_path(&self) -> PathBuf {
        self.paths.model_dir.join(&self.paths.model_file)
    }

    /// Merged dataset written by the ingestion stage.
    pub fn dataset_path(&self) -> PathBuf {
        self.paths.ingest_dir.join(&self.paths.dataset_file)
    }

    /// Ingestion record file written by the ingestion stage.
    pub fn record_path(&self) -> PathBuf {
        self.paths.ingest_dir.join(&self.paths.record_file)
    }

    // ========================================================================
    // Stage parameter mappings
    // ========================================================================

    pub fn ingestion_params(&self) -> StageParams {
        StageParams::from([
            param("input_path", &self.source.input_dir),
            param("out_file", &self.dataset_path()),
            param("record_file", &self.record_path()),
            param("db_file", &self.paths.ledger_db),
        ])
    }

    pub fn training_params(&self) -> StageParams {
        StageParams::from([
            param("model_path", &self.paths.model_dir),
            param("db_file", &self.paths.ledger_db),
        ])
    }

    /// Scoring runs twice per drift cycle with a different model file: the
    /// deployed model before the comparison, the freshly trained one after.
    pub fn scoring_params(&self, model_file: &Path) -> StageParams {
        StageParams::from([
            param("model_file", model_file),
            param("data_file", &self.dataset_path()),
            param("db_file", &self.paths.ledger_db),
        ])
    }

    pub fn deployment_params(&self) -> StageParams {
        StageParams::from([
            param("model_path", &self.paths.model_dir),
            param("record_file", &self.record_path()),
            param("deploy_path", &self.paths.deploy_dir),
        ])
    }

    pub fn reporting_params(&self) -> StageParams {
        StageParams::from([
            param("model_file", &self.deployed_model_path()),
            param("data_file", &self.dataset_path()),
            param("db_file", &self.paths.ledger_db),
        ])
    }
}

fn param(key: &str, value: &Path) -> (String, String) {
    (key.to_string(), value.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[source]
input_dir = "practicedata"

[paths]
ingest_dir = "ingesteddata"
model_dir = "models"
deploy_dir = "production"
ledger_db = "db/pipeline.sqlite3"

[stages.ingestion]
program = "python3"
args = ["components/ingestion.py"]

[stages.training]
program = "python3"
args = ["components/training.py"]

[stages.scoring]
program = "python3"
args = ["components/scoring.py"]

[stages.deployment]
program = "python3"
args = ["components/deployment.py"]

[stages.reporting]
program = "python3"
args = ["components/reporting.py"]
"#;

    fn load_sample() -> PipelineConfig {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("driftwatch.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        PipelineConfig::load(&path).unwrap()
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("driftwatch.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.source.input_dir, dir.path().join("practicedata"));
        assert_eq!(
            config.paths.ledger_db,
            dir.path().join("db/pipeline.sqlite3")
        );
    }

    #[test]
    fn defaults_apply() {
        let config = load_sample();
        assert_eq!(config.source.extension, "csv");
        assert_eq!(config.paths.model_file, "trainedmodel.pkl");
        assert_eq!(config.paths.dataset_file, "finaldata.csv");
        assert_eq!(config.paths.record_file, "ingestedfiles.txt");
        assert!(config.logging.dir.is_none());
    }

    #[test]
    fn extension_dot_is_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("driftwatch.toml");
        let with_dot = SAMPLE.replace(
            "input_dir = \"practicedata\"",
            "input_dir = \"practicedata\"\nextension = \".CSV\"",
        );
        std::fs::write(&path, with_dot).unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.source.extension, "CSV");
    }

    #[test]
    fn scoring_params_carry_the_chosen_model() {
        let config = load_sample();

        let compare = config.scoring_params(&config.deployed_model_path());
        assert_eq!(
            compare["model_file"],
            config.deployed_model_path().display().to_string()
        );

        let provenance = config.scoring_params(&config.trained_model_path());
        assert_eq!(
            provenance["model_file"],
            config.trained_model_path().display().to_string()
        );
        assert_eq!(
            provenance["data_file"],
            config.dataset_path().display().to_string()
        );
    }

    #[test]
    fn ingestion_params_cover_the_contract() {
        let config = load_sample();
        let params = config.ingestion_params();
        let keys: Vec<_> = params.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["db_file", "input_path", "out_file", "record_file"]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("driftwatch.toml");
        std::fs::write(&path, format!("{SAMPLE}\n[typo]\nx = 1\n")).unwrap();
        assert!(PipelineConfig::load(&path).is_err());
    }
}
