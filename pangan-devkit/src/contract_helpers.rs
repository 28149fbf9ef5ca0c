/*!
Helpers pour charger et valider les contrats HTTP

Facilite les tests en fournissant des utilitaires pour:
- Charger les contrats depuis les fichiers JSON
- Valider un payload contre le schéma (sous-ensemble JSON Schema)
*/

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Contract {
    pub name: String,
    pub version: String,
    pub route: String,
    pub schema: Value,
    pub description: Option<String>,
}

impl Contract {
    /// Clé "name@version", identique à celle du kernel
    pub fn key(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }

    /// Champs requis à la racine du schéma
    pub fn required_fields(&self) -> Vec<&str> {
        required_of(&self.schema)
    }

    /// Vérifie qu'un payload respecte le schéma ; retourne toutes les violations
    pub fn validate(&self, payload: &Value) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();
        check(payload, &self.schema, "$", &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Charge et gère les contrats depuis les fichiers JSON
pub struct ContractLoader {
    contracts: HashMap<String, Contract>,
    contracts_dir: PathBuf,
}

impl ContractLoader {
    pub fn new<P: AsRef<Path>>(contracts_dir: P) -> Self {
        Self {
            contracts: HashMap::new(),
            contracts_dir: contracts_dir.as_ref().to_path_buf(),
        }
    }

    /// Charge tous les contrats HTTP depuis <dir>/http
    pub fn load_http_contracts(&mut self) -> Result<usize> {
        let http_dir = self.contracts_dir.join("http");
        self.load_contracts_from_dir(&http_dir)
    }

    fn load_contracts_from_dir(&mut self, dir: &Path) -> Result<usize> {
        if !dir.exists() {
            tracing::warn!("Contracts directory not found: {}", dir.display());
            return Ok(0);
        }

        let mut count = 0;
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            match load_contract(&path) {
                Ok(contract) => {
                    tracing::info!("Loaded contract: {}", contract.key());
                    self.contracts.insert(contract.key(), contract);
                    count += 1;
                }
                Err(e) => tracing::warn!("Failed to load contract {}: {:#}", path.display(), e),
            }
        }

        Ok(count)
    }

    /// Récupère un contrat par clé ("sensor-data@v1")
    pub fn get_contract(&self, key: &str) -> Option<&Contract> {
        self.contracts.get(key)
    }

    pub fn list_contracts(&self) -> Vec<&Contract> {
        self.contracts.values().collect()
    }

    /// Trouve le contrat d'une route ("GET /api/sensor-data")
    pub fn contract_for_route(&self, route: &str) -> Option<&Contract> {
        self.contracts.values().find(|c| c.route == route)
    }
}

fn load_contract(path: &Path) -> Result<Contract> {
    let content = std::fs::read_to_string(path)?;
    let json: Value = serde_json::from_str(&content)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;

    let fallback_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.split('.').next())
        .unwrap_or("unnamed");

    Ok(Contract {
        name: json.get("name").and_then(|v| v.as_str()).unwrap_or(fallback_name).to_string(),
        version: json.get("version").and_then(|v| v.as_str()).unwrap_or("v1").to_string(),
        route: json.get("route").and_then(|v| v.as_str()).unwrap_or("").to_string(),
        schema: json.get("schema").cloned().unwrap_or_else(|| Value::Object(Map::new())),
        description: json.get("description").and_then(|v| v.as_str()).map(|s| s.to_string()),
    })
}

fn required_of(schema: &Value) -> Vec<&str> {
    schema
        .get("required")
        .and_then(|r| r.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default()
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "number" => value.is_number(),
        "integer" => value.is_u64() || value.is_i64(),
        "null" => value.is_null(),
        _ => true,
    }
}

// Sous-ensemble supporté : type, required, properties, additionalProperties=false,
// items, minItems/maxItems, minimum, enum
fn check(value: &Value, schema: &Value, at: &str, errors: &mut Vec<String>) {
    if let Some(expected) = schema.get("type").and_then(|t| t.as_str()) {
        if !type_matches(expected, value) {
            errors.push(format!("{at}: expected {expected}, got {value}"));
            return;
        }
    }

    if let Some(allowed) = schema.get("enum").and_then(|e| e.as_array()) {
        if !allowed.contains(value) {
            errors.push(format!("{at}: {value} not in enum"));
        }
    }

    if let (Some(min), Some(n)) = (schema.get("minimum").and_then(|m| m.as_f64()), value.as_f64()) {
        if n < min {
            errors.push(format!("{at}: {n} below minimum {min}"));
        }
    }

    if let Some(obj) = value.as_object() {
        for field in required_of(schema) {
            if !obj.contains_key(field) {
                errors.push(format!("{at}: missing field '{field}'"));
            }
        }

        let props = schema.get("properties").and_then(|p| p.as_object());
        let closed = schema.get("additionalProperties") == Some(&Value::Bool(false));
        for (key, child) in obj {
            match props.and_then(|p| p.get(key)) {
                Some(child_schema) => check(child, child_schema, &format!("{at}.{key}"), errors),
                None if closed => errors.push(format!("{at}: unexpected field '{key}'")),
                None => {}
            }
        }
    }

    if let Some(items) = value.as_array() {
        let len = items.len() as u64;
        if let Some(min) = schema.get("minItems").and_then(|m| m.as_u64()) {
            if len < min {
                errors.push(format!("{at}: {len} items, expected at least {min}"));
            }
        }
        if let Some(max) = schema.get("maxItems").and_then(|m| m.as_u64()) {
            if len > max {
                errors.push(format!("{at}: {len} items, expected at most {max}"));
            }
        }
        if let Some(item_schema) = schema.get("items") {
            for (i, item) in items.iter().enumerate() {
                check(item, item_schema, &format!("{at}[{i}]"), errors);
            }
        }
    }
}
