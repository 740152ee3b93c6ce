use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Predictions at or below this confidence go to review instead of being
    /// auto-accepted
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Directory holding the persisted model pair (default: ~/.finbuddy/model)
    #[serde(default)]
    pub model_dir: Option<PathBuf>,
    /// Training corpus file (default: ~/.finbuddy/training-categories.json)
    #[serde(default)]
    pub corpus: Option<PathBuf>,
    /// Year assumed for statement text whose rows carry no year
    #[serde(default)]
    pub statement_year: Option<i32>,
}

fn default_threshold() -> f64 {
    0.3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            model_dir: None,
            corpus: None,
            statement_year: None,
        }
    }
}

impl Config {
    pub fn model_dir(&self) -> Result<PathBuf> {
        match &self.model_dir {
            Some(p) => Ok(p.clone()),
            None => Ok(ensure_finbuddy_home()?.join("model")),
        }
    }

    pub fn corpus_path(&self) -> Result<PathBuf> {
        match &self.corpus {
            Some(p) => Ok(p.clone()),
            None => Ok(ensure_finbuddy_home()?.join("training-categories.json")),
        }
    }

    pub fn queue_path(&self) -> Result<PathBuf> {
        Ok(ensure_finbuddy_home()?.join("review-queue.json"))
    }
}

pub fn finbuddy_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".finbuddy"))
}

pub fn ensure_finbuddy_home() -> Result<PathBuf> {
    let dir = finbuddy_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(finbuddy_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    Ok(toml::from_str(&s).context("parse config.toml")?)
}
