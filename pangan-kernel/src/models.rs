use serde::{Deserialize, Serialize};

/// Classification de fraîcheur dérivée des seuils de gaz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FreshnessStatus {
    Fresh,
    Warning,
    Spoiled,
}

/// Une lecture horaire simulée du conteneur surveillé.
/// Valeurs déjà arrondies, telles qu'envoyées au dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SensorReading {
    pub timestamp: String,   // "03:07 PM"
    pub co2: u32,            // ppm
    pub nh3: f64,            // ppm, 1 décimale
    pub ethylene: f64,       // ppm, 2 décimales
    pub temperature: f64,    // °C, 1 décimale
    pub humidity: u32,       // %
    pub status: FreshnessStatus,
    pub shelf_life: f64,     // jours restants
}

/// Historique ordonné (plus ancien en premier).
/// Invariant : jamais vide, `new` refuse une séquence vide.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingHistory {
    readings: Vec<SensorReading>,
}

impl ReadingHistory {
    /// Retourne None si la séquence est vide
    pub fn new(readings: Vec<SensorReading>) -> Option<Self> {
        if readings.is_empty() {
            return None;
        }
        Some(Self { readings })
    }

    /// Lecture "courante" = dernier point de l'historique (h = 0)
    pub fn current(&self) -> Option<&SensorReading> {
        self.readings.last()
    }

    pub fn readings(&self) -> &[SensorReading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// Corps de réponse de GET /api/sensor-data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorDataResponse {
    pub success: bool,
    pub current: SensorReading,
    pub history: Vec<SensorReading>,
    pub timestamp: String, // RFC3339 de la génération
}

impl SensorDataResponse {
    /// None si l'historique n'a pas de lecture courante
    pub fn from_history(history: &ReadingHistory, timestamp: String) -> Option<Self> {
        let current = history.current()?.clone();
        Some(Self {
            success: true,
            current,
            history: history.readings().to_vec(),
            timestamp,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
