use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid contract JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Contrat HTTP : route + schéma JSON du corps de réponse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub route: String,
    #[serde(default)]
    pub description: Option<String>,
    pub schema: serde_json::Value,
}

fn default_version() -> String {
    "v1".into()
}

impl Contract {
    /// Clé de registre, ex: "sensor-data@v1"
    pub fn key(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContractRegistry {
    contracts: HashMap<String, Contract>, // "sensor-data@v1" -> Contract
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Charge tous les *.json du dossier ; un fichier invalide est ignoré avec un warning
    pub async fn load_contracts_from_dir<P: AsRef<Path>>(contracts_dir: P) -> Result<Self, ContractError> {
        let mut registry = Self::new();
        let mut entries = fs::read_dir(contracts_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            match read_contract(&path).await {
                Ok(contract) => {
                    tracing::debug!("[registry] loaded contract: {}", contract.key());
                    registry.insert(contract);
                }
                Err(e) => tracing::warn!("[registry] skipping {:?}: {}", path, e),
            }
        }

        Ok(registry)
    }

    pub fn insert(&mut self, contract: Contract) {
        self.contracts.insert(contract.key(), contract);
    }

    /// Noms triés des contrats enregistrés
    pub fn list_contracts(&self) -> Vec<String> {
        let mut names: Vec<String> = self.contracts.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn get_contract(&self, key: &str) -> Option<&Contract> {
        self.contracts.get(key)
    }
}

async fn read_contract(path: &Path) -> Result<Contract, ContractError> {
    let content = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}
