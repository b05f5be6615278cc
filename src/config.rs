// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    path::{Path, PathBuf},
};

use crate::sources::{default_registry, SourceDescriptor, SourceSpec};

/// Env var consulted for a config path when none is passed on the command line.
pub const CONFIG_ENV: &str = "EMISTAGE_CONFIG";

/// Where a run reads from and writes to. Passed explicitly into the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    pub raw_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub output_file: String,
    pub reports_dir: PathBuf,
    /// Replaces the built-in registry when present.
    pub sources: Option<Vec<SourceSpec>>,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data/raw"),
            staging_dir: PathBuf::from("data/staging"),
            output_file: "emisiones_staging.parquet".to_string(),
            reports_dir: PathBuf::from("reports"),
            sources: None,
        }
    }
}

impl StagingConfig {
    /// Defaults anchored at `root` instead of the working directory.
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let base = Self::default();
        Self {
            raw_dir: root.join(base.raw_dir),
            staging_dir: root.join(base.staging_dir),
            reports_dir: root.join(base.reports_dir),
            ..base
        }
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        serde_yaml::from_str(s).context("parsing staging config YAML")
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path)
            .with_context(|| format!("opening config file {}", path.display()))?;
        serde_yaml::from_reader(f)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Config from an explicit path, else `$EMISTAGE_CONFIG`, else defaults.
    pub fn load(cli_path: Option<&str>) -> Result<Self> {
        Self::load_with_env(cli_path, std::env::var(CONFIG_ENV).ok())
    }

    fn load_with_env(cli_path: Option<&str>, env_path: Option<String>) -> Result<Self> {
        match cli_path.map(str::to_string).or(env_path) {
            Some(p) => Self::from_yaml_file(p),
            None => Ok(Self::default()),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.staging_dir.join(&self.output_file)
    }

    pub fn tables_dir(&self) -> PathBuf {
        self.reports_dir.join("tables")
    }

    pub fn registry(&self) -> Result<Vec<SourceDescriptor>> {
        match &self.sources {
            Some(specs) => specs.iter().map(|s| s.resolve(&self.raw_dir)).collect(),
            None => Ok(default_registry(&self.raw_dir)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{Era, SourceEncoding};

    #[test]
    fn defaults() {
        let cfg = StagingConfig::default();
        assert_eq!(
            cfg.output_path(),
            PathBuf::from("data/staging/emisiones_staging.parquet")
        );
        assert_eq!(cfg.tables_dir(), PathBuf::from("reports/tables"));
        assert_eq!(cfg.registry().unwrap().len(), 8);
    }

    #[test]
    fn yaml_overrides_paths_and_registry() -> Result<()> {
        let yaml = r#"
raw_dir: /srv/retc/raw
output_file: staging.parquet
sources:
  - file: 2005-2017.csv
    delimiter: ";"
    encoding: utf-8
    era: "2005-2017"
  - file: 2019.csv
    delimiter: ";"
    encoding: iso-8859-1
    era: "2018-2023"
"#;
        let cfg = StagingConfig::from_yaml_str(yaml)?;
        assert_eq!(cfg.staging_dir, PathBuf::from("data/staging"));
        assert_eq!(
            cfg.output_path(),
            PathBuf::from("data/staging/staging.parquet")
        );

        let reg = cfg.registry()?;
        assert_eq!(reg.len(), 2);
        assert_eq!(reg[1].path, PathBuf::from("/srv/retc/raw/2019.csv"));
        assert_eq!(reg[1].encoding, SourceEncoding::Latin1);
        assert_eq!(reg[1].era, Era::Era2018To2023);
        assert_eq!(reg[1].delimiter, b';');
        Ok(())
    }

    #[test]
    fn load_prefers_cli_path_then_env() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let cli = dir.path().join("cli.yaml");
        let env = dir.path().join("env.yaml");
        std::fs::write(&cli, "output_file: from_cli.parquet\n")?;
        std::fs::write(&env, "output_file: from_env.parquet\n")?;
        let env_path = Some(env.display().to_string());

        let cfg = StagingConfig::load_with_env(cli.to_str(), env_path.clone())?;
        assert_eq!(cfg.output_file, "from_cli.parquet");

        let cfg = StagingConfig::load_with_env(None, env_path)?;
        assert_eq!(cfg.output_file, "from_env.parquet");
        assert_eq!(cfg.raw_dir, PathBuf::from("data/raw"));

        assert_eq!(StagingConfig::load_with_env(None, None)?, StagingConfig::default());
        Ok(())
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = StagingConfig::load_with_env(Some("/nonexistent/emistage.yaml"), None)
            .unwrap_err();
        assert!(err.to_string().contains("opening config file /nonexistent/emistage.yaml"));

        let err = StagingConfig::load_with_env(None, Some("/nonexistent/env.yaml".into()))
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/env.yaml"));
    }

    #[test]
    fn rooted_config() {
        let cfg = StagingConfig::rooted_at("/tmp/project");
        assert_eq!(cfg.raw_dir, PathBuf::from("/tmp/project/data/raw"));
        assert_eq!(cfg.reports_dir, PathBuf::from("/tmp/project/reports"));
    }
}
