/**
 * SYNTHÉTISEUR DE LECTURES - Générateur de données capteurs simulées
 *
 * RÔLE :
 * Fabrique 24 lectures horaires (CO₂, NH₃, éthylène, température, humidité)
 * avec des tendances arithmétiques simples et une classification par seuils.
 *
 * FONCTIONNEMENT :
 * - Pour chaque offset h de 23 à 0 (heures passées), tirage de 5 valeurs uniformes
 * - Valeurs brutes = base + pente * h + bruit, arrondies seulement à la fin
 * - Statut calculé sur les valeurs brutes : warning puis spoiled (escalade)
 * - Durée de conservation dérivée du statut
 *
 * ALÉATOIRE :
 * - Entropy : générateur thread-local neuf à chaque appel (défaut)
 * - Seeded : StdRng partagé, flux déterministe pour les tests et démos
 */

use crate::models::{FreshnessStatus, ReadingHistory, SensorReading};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, UtcOffset};

/// Nombre de points horaires par historique
pub const HISTORY_HOURS: u32 = 24;

#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    #[error("generated history is empty")]
    EmptyHistory,
    #[error("timestamp formatting failed: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error("clock out of range")]
    ClockOutOfRange,
}

/// Seuils de classification (ppm), comparés aux valeurs brutes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub co2_warning_ppm: f64,
    pub nh3_warning_ppm: f64,
    pub co2_spoiled_ppm: f64,
    pub nh3_spoiled_ppm: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            co2_warning_ppm: 4000.0,
            nh3_warning_ppm: 5.0,
            co2_spoiled_ppm: 4751.0,
            nh3_spoiled_ppm: 6.0,
        }
    }
}

impl Thresholds {
    /// Vérifie que chaque seuil "spoiled" est au-dessus du seuil "warning"
    pub fn validate(&self) -> Result<(), String> {
        let all = [
            self.co2_warning_ppm,
            self.nh3_warning_ppm,
            self.co2_spoiled_ppm,
            self.nh3_spoiled_ppm,
        ];
        if all.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err("thresholds must be finite and >= 0".into());
        }
        if self.co2_spoiled_ppm < self.co2_warning_ppm {
            return Err(format!(
                "co2_spoiled_ppm ({}) below co2_warning_ppm ({})",
                self.co2_spoiled_ppm, self.co2_warning_ppm
            ));
        }
        if self.nh3_spoiled_ppm < self.nh3_warning_ppm {
            return Err(format!(
                "nh3_spoiled_ppm ({}) below nh3_warning_ppm ({})",
                self.nh3_spoiled_ppm, self.nh3_warning_ppm
            ));
        }
        Ok(())
    }
}

/// Tirages uniformes dans [0, 1) pour un point, dans l'ordre co2, nh3, éthylène, température, humidité
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Draws {
    pub co2: f64,
    pub nh3: f64,
    pub ethylene: f64,
    pub temperature: f64,
    pub humidity: f64,
}

impl Draws {
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            co2: rng.random(),
            nh3: rng.random(),
            ethylene: rng.random(),
            temperature: rng.random(),
            humidity: rng.random(),
        }
    }
}

/// Valeurs avant arrondi
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawReading {
    pub co2: f64,
    pub nh3: f64,
    pub ethylene: f64,
    pub temperature: f64,
    pub humidity: f64,
}

pub fn raw_reading(hours_ago: u32, draws: &Draws) -> RawReading {
    let h = f64::from(hours_ago);
    RawReading {
        co2: 1500.0 + 50.0 * h + draws.co2 * 200.0,
        nh3: 2.0 + 0.3 * h + draws.nh3 * 1.0,
        ethylene: 0.5 + 0.15 * h + draws.ethylene * 0.3,
        temperature: 4.0 + (h / 6.0).sin() + draws.temperature * 0.5,
        humidity: 75.0 + draws.humidity * 10.0,
    }
}

impl RawReading {
    /// Classe, arrondit et étiquette le point
    pub fn finish(&self, hours_ago: u32, thresholds: &Thresholds, timestamp: String) -> SensorReading {
        let status = classify(self.co2, self.nh3, thresholds);
        SensorReading {
            timestamp,
            co2: self.co2.round().max(0.0) as u32,
            nh3: round_to(self.nh3, 1),
            ethylene: round_to(self.ethylene, 2),
            temperature: round_to(self.temperature, 1),
            humidity: self.humidity.round().max(0.0) as u32,
            status,
            shelf_life: round_to(shelf_life_days(status, hours_ago), 1),
        }
    }
}

/// Escalade fresh -> warning -> spoiled ; le test spoiled passe en dernier et l'emporte.
pub fn classify(co2_raw: f64, nh3_raw: f64, thresholds: &Thresholds) -> FreshnessStatus {
    let mut status = FreshnessStatus::Fresh;
    if co2_raw > thresholds.co2_warning_ppm || nh3_raw > thresholds.nh3_warning_ppm {
        status = FreshnessStatus::Warning;
    }
    if co2_raw > thresholds.co2_spoiled_ppm || nh3_raw > thresholds.nh3_spoiled_ppm {
        status = FreshnessStatus::Spoiled;
    }
    status
}

pub fn shelf_life_days(status: FreshnessStatus, hours_ago: u32) -> f64 {
    match status {
        FreshnessStatus::Warning => 2.0,
        FreshnessStatus::Spoiled => 0.0,
        FreshnessStatus::Fresh => (7.0 - f64::from(hours_ago) / 24.0).max(3.0),
    }
}

/// Arrondi au plus proche avec `decimals` décimales
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Heure locale façon "03:07 PM"
pub fn clock_label(at: OffsetDateTime, offset: UtcOffset) -> Result<String, SynthError> {
    let label = at
        .to_offset(offset)
        .format(format_description!("[hour repr:12]:[minute] [period]"))?;
    Ok(label)
}

/// Une lecture complète : valeurs brutes, classification, arrondi et étiquette horaire
pub fn synthesize_point(
    hours_ago: u32,
    draws: &Draws,
    thresholds: &Thresholds,
    at: OffsetDateTime,
    offset: UtcOffset,
) -> Result<SensorReading, SynthError> {
    let label = clock_label(at, offset)?;
    Ok(raw_reading(hours_ago, draws).finish(hours_ago, thresholds, label))
}

/// Source d'aléatoire injectée dans le synthétiseur
#[derive(Debug, Clone)]
pub enum RngSource {
    Entropy,
    Seeded(Arc<Mutex<StdRng>>),
}

impl RngSource {
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::Seeded(Arc::new(Mutex::new(StdRng::seed_from_u64(seed)))),
            None => Self::Entropy,
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Self::Entropy => "entropy",
            Self::Seeded(_) => "seeded",
        }
    }

    fn draw_points(&self, count: usize) -> Vec<Draws> {
        match self {
            Self::Entropy => {
                let mut rng = rand::rng();
                (0..count).map(|_| Draws::sample(&mut rng)).collect()
            }
            Self::Seeded(shared) => {
                let mut rng = shared.lock();
                (0..count).map(|_| Draws::sample(&mut *rng)).collect()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Synthesizer {
    thresholds: Thresholds,
    display_offset: UtcOffset,
    rng: RngSource,
}

impl Synthesizer {
    pub fn new(thresholds: Thresholds, display_offset: UtcOffset, rng: RngSource) -> Self {
        Self { thresholds, display_offset, rng }
    }

    pub fn rng_mode(&self) -> &'static str {
        self.rng.mode()
    }

    /// Génère l'historique [-23h .. 0h] relatif à `now`, plus ancien en premier
    pub fn generate(&self, now: OffsetDateTime) -> Result<ReadingHistory, SynthError> {
        let draws = self.rng.draw_points(HISTORY_HOURS as usize);
        let mut readings = Vec::with_capacity(draws.len());

        for (hours_ago, point) in (0..HISTORY_HOURS).rev().zip(draws.iter()) {
            let at = now
                .checked_sub(Duration::hours(i64::from(hours_ago)))
                .ok_or(SynthError::ClockOutOfRange)?;
            readings.push(synthesize_point(hours_ago, point, &self.thresholds, at, self.display_offset)?);
        }

        ReadingHistory::new(readings).ok_or(SynthError::EmptyHistory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const ALMOST_ONE: f64 = 0.999_999_999;

    fn uniform(v: f64) -> Draws {
        Draws { co2: v, nh3: v, ethylene: v, temperature: v, humidity: v }
    }

    fn seeded(seed: u64) -> Synthesizer {
        Synthesizer::new(Thresholds::default(), UtcOffset::UTC, RngSource::from_seed(Some(seed)))
    }

    #[test]
    fn test_history_length_and_clock_order() {
        let now = datetime!(2026-10-17 14:05 UTC);
        let history = seeded(7).generate(now).unwrap();

        assert_eq!(history.len(), HISTORY_HOURS as usize);
        assert_eq!(history.readings()[0].timestamp, "03:05 PM"); // veille, 15:05
        assert_eq!(history.current().unwrap().timestamp, "02:05 PM");

        // chaque étiquette correspond à now - h, h décroissant => ordre chronologique
        for (i, reading) in history.readings().iter().enumerate() {
            let hours_ago = HISTORY_HOURS as i64 - 1 - i as i64;
            let expected = clock_label(now - Duration::hours(hours_ago), UtcOffset::UTC).unwrap();
            assert_eq!(reading.timestamp, expected);
        }
    }

    #[test]
    fn test_display_offset_applied() {
        let now = datetime!(2026-10-17 14:05 UTC);
        let offset = UtcOffset::from_hms(7, 0, 0).unwrap();
        let synth = Synthesizer::new(Thresholds::default(), offset, RngSource::from_seed(Some(1)));
        let history = synth.generate(now).unwrap();
        assert_eq!(history.current().unwrap().timestamp, "09:05 PM");
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let now = datetime!(2026-10-17 08:00 UTC);
        let a = seeded(42).generate(now).unwrap();
        let b = seeded(42).generate(now).unwrap();
        assert_eq!(a, b);

        // le flux partagé continue : deux appels successifs diffèrent
        let synth = seeded(42);
        let first = synth.generate(now).unwrap();
        let second = synth.generate(now).unwrap();
        assert_eq!(first, a);
        assert_ne!(first, second);
    }

    #[test]
    fn test_co2_raw_bounds_at_extremes() {
        let low = raw_reading(23, &uniform(0.0));
        let high = raw_reading(23, &uniform(ALMOST_ONE));
        assert_eq!(low.co2, 2650.0);
        assert!(high.co2 < 2850.0 && high.co2 > 2849.0);

        let low = raw_reading(0, &uniform(0.0));
        let high = raw_reading(0, &uniform(ALMOST_ONE));
        assert_eq!(low.co2, 1500.0);
        assert!(high.co2 < 1700.0);
    }

    #[test]
    fn test_classify_escalation() {
        let t = Thresholds::default();
        assert_eq!(classify(1500.0, 2.0, &t), FreshnessStatus::Fresh);
        // égalité stricte : pas d'escalade
        assert_eq!(classify(4000.0, 5.0, &t), FreshnessStatus::Fresh);
        assert_eq!(classify(4000.5, 2.0, &t), FreshnessStatus::Warning);
        assert_eq!(classify(1500.0, 5.1, &t), FreshnessStatus::Warning);
        assert_eq!(classify(4751.5, 2.0, &t), FreshnessStatus::Spoiled);
        assert_eq!(classify(1500.0, 6.01, &t), FreshnessStatus::Spoiled);
        // spoiled par NH3 même si CO2 seul ne serait que warning
        assert_eq!(classify(4100.0, 9.0, &t), FreshnessStatus::Spoiled);
    }

    #[test]
    fn test_classify_uses_configured_thresholds() {
        let t = Thresholds { co2_warning_ppm: 1000.0, nh3_warning_ppm: 50.0, co2_spoiled_ppm: 2000.0, nh3_spoiled_ppm: 60.0 };
        assert_eq!(classify(1500.0, 2.0, &t), FreshnessStatus::Warning);
        assert_eq!(classify(2500.0, 2.0, &t), FreshnessStatus::Spoiled);
    }

    #[test]
    fn test_shelf_life_by_status() {
        assert_eq!(shelf_life_days(FreshnessStatus::Warning, 5), 2.0);
        assert_eq!(shelf_life_days(FreshnessStatus::Spoiled, 0), 0.0);
        assert_eq!(shelf_life_days(FreshnessStatus::Fresh, 0), 7.0);
        assert_eq!(round_to(shelf_life_days(FreshnessStatus::Fresh, 12), 1), 6.5);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(2.34, 1), 2.3);
        assert_eq!(round_to(2.36, 1), 2.4);
        assert_eq!(round_to(0.456, 2), 0.46);
        assert_eq!(round_to(79.5, 0), 80.0);
    }

    #[test]
    fn test_known_points() {
        let t = Thresholds::default();
        // h = 10, bruit nul : nh3 = 5.0 exactement, pas > 5
        let r = raw_reading(10, &uniform(0.0)).finish(10, &t, "x".into());
        assert_eq!(r.co2, 2000);
        assert_eq!(r.status, FreshnessStatus::Fresh);
        assert_eq!(r.shelf_life, 6.6);

        // h = 23 : nh3 >= 8.9 => toujours spoiled
        let r = raw_reading(23, &uniform(0.0)).finish(23, &t, "x".into());
        assert_eq!(r.nh3, 8.9);
        assert_eq!(r.status, FreshnessStatus::Spoiled);
        assert_eq!(r.shelf_life, 0.0);
    }

    #[test]
    fn test_synthesize_single_point() {
        let at = datetime!(2026-10-17 06:30 UTC);
        let draws = Draws { co2: 0.5, nh3: 0.0, ethylene: 0.5, temperature: 0.0, humidity: 0.5 };

        let r = synthesize_point(0, &draws, &Thresholds::default(), at, UtcOffset::UTC).unwrap();
        assert_eq!(r.timestamp, "06:30 AM");
        assert_eq!(r.co2, 1600);
        assert_eq!(r.nh3, 2.0);
        assert_eq!(r.ethylene, 0.65);
        assert_eq!(r.temperature, 4.0);
        assert_eq!(r.humidity, 80);
        assert_eq!(r.status, FreshnessStatus::Fresh);
        assert_eq!(r.shelf_life, 7.0);

        // h = 12, NH3 brut 5.6 : warning
        let r = synthesize_point(12, &draws, &Thresholds::default(), at, UtcOffset::UTC).unwrap();
        assert_eq!(r.status, FreshnessStatus::Warning);
        assert_eq!(r.shelf_life, 2.0);
    }

    #[test]
    fn test_generated_invariants_hold() {
        let t = Thresholds::default();
        let mut rng = StdRng::seed_from_u64(2024);

        for _ in 0..500 {
            for hours_ago in 0..HISTORY_HOURS {
                let raw = raw_reading(hours_ago, &Draws::sample(&mut rng));
                let r = raw.finish(hours_ago, &t, String::new());

                assert!(r.nh3 >= 0.0 && r.ethylene >= 0.0);
                assert!((75..=85).contains(&r.humidity));
                assert_eq!(r.shelf_life == 0.0, r.status == FreshnessStatus::Spoiled);
                assert_eq!(r.shelf_life == 2.0, r.status == FreshnessStatus::Warning);

                let crosses_spoiled = raw.co2 > t.co2_spoiled_ppm || raw.nh3 > t.nh3_spoiled_ppm;
                if crosses_spoiled {
                    assert_eq!(r.status, FreshnessStatus::Spoiled);
                }
            }
        }
    }

    #[test]
    fn test_entropy_source_generates_full_history() {
        let synth = Synthesizer::new(Thresholds::default(), UtcOffset::UTC, RngSource::Entropy);
        assert_eq!(synth.rng_mode(), "entropy");
        let history = synth.generate(OffsetDateTime::now_utc()).unwrap();
        assert_eq!(history.len(), 24);
    }

    #[test]
    fn test_thresholds_validation() {
        assert!(Thresholds::default().validate().is_ok());
        let inverted = Thresholds { co2_spoiled_ppm: 3000.0, ..Thresholds::default() };
        assert!(inverted.validate().is_err());
        let negative = Thresholds { nh3_warning_ppm: -1.0, ..Thresholds::default() };
        assert!(negative.validate().is_err());
    }
}
