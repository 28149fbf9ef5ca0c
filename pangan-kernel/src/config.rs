use crate::synth::Thresholds;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use time::UtcOffset;
use tokio::fs;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid thresholds: {0}")]
    InvalidThresholds(String),
    #[error("invalid address '{0}'")]
    InvalidAddress(String),
    #[error("display offset out of range: {0} minutes")]
    InvalidOffset(i32),
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct KernelConfig {
    pub http: HttpConf,
    pub thresholds: Thresholds,
    pub synth: SynthConf,
    pub contracts_dir: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConf {
    pub bind: String, // ex: "0.0.0.0:8080"
}

impl Default for HttpConf {
    fn default() -> Self {
        Self { bind: "0.0.0.0:8080".into() }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SynthConf {
    /// Graine fixe => flux déterministe ; absent => aléatoire à chaque requête
    pub seed: Option<u64>,
    /// Décalage d'affichage des heures "03:07 PM" (minutes par rapport à UTC)
    pub display_offset_minutes: i32,
}

impl KernelConfig {
    pub fn contracts_dir(&self) -> &str {
        self.contracts_dir.as_deref().unwrap_or("contracts/http")
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    /// Adresse d'écoute ; PANGAN_BIND surcharge le fichier
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        resolve_bind(&self.http.bind, std::env::var("PANGAN_BIND").ok())
    }

    pub fn display_offset(&self) -> Result<UtcOffset, ConfigError> {
        let minutes = self.synth.display_offset_minutes;
        UtcOffset::from_whole_seconds(minutes.saturating_mul(60))
            .map_err(|_| ConfigError::InvalidOffset(minutes))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.validate().map_err(ConfigError::InvalidThresholds)?;
        self.display_offset()?;
        Ok(())
    }
}

/// La surcharge (variable d'env) l'emporte sur la valeur du fichier
pub fn resolve_bind(file_value: &str, env_override: Option<String>) -> Result<SocketAddr, ConfigError> {
    let raw = env_override.unwrap_or_else(|| file_value.to_string());
    raw.parse().map_err(|_| ConfigError::InvalidAddress(raw))
}

pub fn resolve_config_path(env_override: Option<String>) -> PathBuf {
    env_override.unwrap_or_else(|| "kernel.yaml".into()).into()
}

/// Chemin du fichier de config (PANGAN_KERNEL_CONFIG ou kernel.yaml)
pub fn config_path() -> PathBuf {
    resolve_config_path(std::env::var("PANGAN_KERNEL_CONFIG").ok())
}

/// Fichier absent ou vide => défauts ; fichier invalide => erreur
pub async fn load_config(path: &Path) -> Result<KernelConfig, ConfigError> {
    if !path.exists() {
        return Ok(KernelConfig::default());
    }

    let txt = fs::read_to_string(path).await.map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if txt.trim().is_empty() {
        return Ok(KernelConfig::default());
    }

    let cfg: KernelConfig = serde_yaml::from_str(&txt)?;
    cfg.validate()?;
    Ok(cfg)
}
