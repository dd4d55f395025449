// src/config.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Environment variable naming an optional YAML config file.
pub const CONFIG_ENV: &str = "FUEL_ECONOMY_CONFIG";

/// Where the two raw files live, where snapshots go, and which
/// certification region survives the row filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input_2008: PathBuf,
    pub input_2018: PathBuf,
    pub output_dir: PathBuf,
    pub cert_region: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_2008: PathBuf::from("all_alpha_08.csv"),
            input_2018: PathBuf::from("all_alpha_18.csv"),
            output_dir: PathBuf::from("output"),
            cert_region: "CA".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Config file from `FUEL_ECONOMY_CONFIG` if set, then positional
    /// `<input_2008> <input_2018> [output_dir]` on top.
    pub fn resolve<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut cfg = match std::env::var_os(CONFIG_ENV) {
            Some(p) => {
                debug!(path = ?p, "loading config file");
                Self::from_yaml_file(PathBuf::from(p))?
            }
            None => Self::default(),
        };

        let args: Vec<String> = args.into_iter().collect();
        match args.as_slice() {
            [] => {}
            [a, b] => {
                cfg.input_2008 = a.into();
                cfg.input_2018 = b.into();
            }
            [a, b, out] => {
                cfg.input_2008 = a.into();
                cfg.input_2018 = b.into();
                cfg.output_dir = out.into();
            }
            _ => anyhow::bail!("usage: fuel-economy [<input_2008> <input_2018> [output_dir]]"),
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_yaml_keeps_defaults() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "output_dir: snapshots\ncert_region: FA")?;
        let cfg = PipelineConfig::from_yaml_file(tmp.path())?;
        assert_eq!(cfg.output_dir, PathBuf::from("snapshots"));
        assert_eq!(cfg.cert_region, "FA");
        assert_eq!(cfg.input_2008, PathBuf::from("all_alpha_08.csv"));
        Ok(())
    }

    #[test]
    fn positional_args_override_inputs() -> Result<()> {
        let cfg = PipelineConfig::resolve(vec!["a.csv".to_string(), "b.csv".to_string()])?;
        assert_eq!(cfg.input_2008, PathBuf::from("a.csv"));
        assert_eq!(cfg.input_2018, PathBuf::from("b.csv"));

        assert!(PipelineConfig::resolve(vec!["only-one".to_string()]).is_err());
        Ok(())
    }
}
