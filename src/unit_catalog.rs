//! # Unit Catalog Module
//!
//! The measurement unit directory is read in full once per process and then
//! shared read-only. [`UnitDirectory`] is the injected handle: the first
//! caller triggers the load, concurrent callers await that same load, and a
//! failed load leaves the cache empty so a later caller can try again.
//!
//! # Recovery
//!
//! Each load attempt is bounded by `RecoveryConfig::operation_timeout_secs`
//! and retried up to `max_retries` times with exponential backoff plus
//! random jitter.

use crate::config::RecoveryConfig;
use crate::errors::{EngineError, EngineResult};
use crate::ingredient_model::{MeasureSystem, MeasurementUnit, UnitType};
use async_trait::async_trait;
use rand::Rng;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Source of measurement unit rows
#[async_trait]
pub trait UnitSource: Send + Sync {
    async fn load_units(&self) -> EngineResult<Vec<MeasurementUnit>>;
}

/// Unit rows known up front (built-in table or JSON fixture)
#[derive(Debug, Clone)]
pub struct StaticUnitSource {
    units: Vec<MeasurementUnit>,
}

impl StaticUnitSource {
    pub fn new(units: Vec<MeasurementUnit>) -> Self {
        Self { units }
    }

    /// The built-in table of common cooking units
    pub fn standard() -> Self {
        Self::new(standard_units())
    }

    /// Load unit rows from a JSON array
    pub fn from_json_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let units: Vec<MeasurementUnit> = serde_json::from_str(&json)?;
        Ok(Self::new(units))
    }
}

#[async_trait]
impl UnitSource for StaticUnitSource {
    async fn load_units(&self) -> EngineResult<Vec<MeasurementUnit>> {
        Ok(self.units.clone())
    }
}

/// Loaded, immutable unit directory with a case-insensitive spelling index
#[derive(Debug, Clone)]
pub struct UnitCatalog {
    units: Vec<MeasurementUnit>,
    index: HashMap<String, usize>,
}

impl UnitCatalog {
    pub fn new(units: Vec<MeasurementUnit>) -> Self {
        let mut index = HashMap::new();
        for (position, unit) in units.iter().enumerate() {
            let spellings = [&unit.unit_code, &unit.display_singular, &unit.display_plural]
                .into_iter()
                .chain(unit.aliases.iter());
            for spelling in spellings {
                let key = spelling_key(spelling);
                if !key.is_empty() {
                    // First registration wins on collisions
                    index.entry(key).or_insert(position);
                }
            }
        }
        Self { units, index }
    }

    /// Catalog over the built-in unit table
    pub fn standard() -> Self {
        Self::new(standard_units())
    }

    /// Resolve a unit token as written ("Cups", "tbsp.", "fl oz")
    pub fn resolve(&self, token: &str) -> Option<&MeasurementUnit> {
        let key = spelling_key(token);
        if key.is_empty() {
            return None;
        }
        if let Some(&position) = self.index.get(&key) {
            return Some(&self.units[position]);
        }
        let singular = key.strip_suffix('s')?;
        self.index.get(singular).map(|&position| &self.units[position])
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units(&self) -> &[MeasurementUnit] {
        &self.units
    }
}

fn spelling_key(spelling: &str) -> String {
    spelling
        .split_whitespace()
        .map(|word| word.trim_end_matches('.'))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Shared handle over the lazily loaded unit catalog
pub struct UnitDirectory {
    source: Arc<dyn UnitSource>,
    catalog: OnceCell<Arc<UnitCatalog>>,
    recovery: RecoveryConfig,
}

impl UnitDirectory {
    pub fn new(source: Arc<dyn UnitSource>, recovery: RecoveryConfig) -> Self {
        Self {
            source,
            catalog: OnceCell::new(),
            recovery,
        }
    }

    /// A directory whose catalog is already loaded
    pub fn preloaded(catalog: UnitCatalog) -> Self {
        Self {
            source: Arc::new(StaticUnitSource::new(catalog.units().to_vec())),
            catalog: OnceCell::new_with(Some(Arc::new(catalog))),
            recovery: RecoveryConfig::default(),
        }
    }

    /// The catalog, loading it on first use
    pub async fn catalog(&self) -> EngineResult<Arc<UnitCatalog>> {
        self.catalog
            .get_or_try_init(|| self.load_with_retry())
            .await
            .cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.catalog.initialized()
    }

    async fn load_with_retry(&self) -> EngineResult<Arc<UnitCatalog>> {
        let timeout = Duration::from_secs(self.recovery.operation_timeout_secs);
        let attempts = self.recovery.max_retries + 1;
        let mut last_error = String::new();

        for attempt in 0..attempts {
            match tokio::time::timeout(timeout, self.source.load_units()).await {
                Ok(Ok(units)) => {
                    let catalog = UnitCatalog::new(units);
                    info!("Loaded unit directory with {} units", catalog.len());
                    return Ok(Arc::new(catalog));
                }
                Ok(Err(e)) => {
                    warn!("Unit directory load attempt {} failed: {}", attempt + 1, e);
                    last_error = e.to_string();
                }
                Err(_) => {
                    let e = EngineError::Timeout(format!(
                        "unit directory load exceeded {}s",
                        self.recovery.operation_timeout_secs
                    ));
                    warn!("Unit directory load attempt {} failed: {}", attempt + 1, e);
                    last_error = e.to_string();
                }
            }

            if attempt + 1 < attempts {
                let delay = self.retry_delay(attempt);
                debug!("Retrying unit directory load in {:?}", delay);
                tokio::time::sleep(delay).await;
            }
        }

        Err(EngineError::UnitDirectoryUnavailable(format!(
            "gave up after {} attempts: {}",
            attempts, last_error
        )))
    }

    fn retry_delay(&self, attempt: u32) -> Duration {
        let base = self
            .recovery
            .base_retry_delay_ms
            .saturating_mul(1u64 << attempt.min(16))
            .min(self.recovery.max_retry_delay_ms);
        let jitter = if base >= 4 {
            rand::thread_rng().gen_range(0..=base / 4)
        } else {
            0
        };
        Duration::from_millis(base + jitter)
    }
}

fn volume(code: &str, singular: &str, plural: &str, system: MeasureSystem, ml: f64, aliases: &[&str]) -> MeasurementUnit {
    MeasurementUnit {
        unit_code: code.to_string(),
        display_singular: singular.to_string(),
        display_plural: plural.to_string(),
        unit_type: UnitType::Volume,
        system: Some(system),
        metric_g: None,
        metric_ml: Some(ml),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
    }
}

fn weight(code: &str, singular: &str, plural: &str, system: MeasureSystem, g: f64, aliases: &[&str]) -> MeasurementUnit {
    MeasurementUnit {
        unit_code: code.to_string(),
        display_singular: singular.to_string(),
        display_plural: plural.to_string(),
        unit_type: UnitType::Weight,
        system: Some(system),
        metric_g: Some(g),
        metric_ml: None,
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
    }
}

fn unitless(code: &str, singular: &str, plural: &str, unit_type: UnitType, aliases: &[&str]) -> MeasurementUnit {
    MeasurementUnit {
        unit_code: code.to_string(),
        display_singular: singular.to_string(),
        display_plural: plural.to_string(),
        unit_type,
        system: None,
        metric_g: None,
        metric_ml: None,
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
    }
}

/// Built-in table of common cooking units
pub fn standard_units() -> Vec<MeasurementUnit> {
    use MeasureSystem::{Imperial, Metric};

    vec![
        // Volume units
        volume("tsp", "tsp", "tsp", Imperial, 4.929, &["teaspoon", "teaspoons", "tsps"]),
        volume("tbsp", "tbsp", "tbsp", Imperial, 14.787, &["tablespoon", "tablespoons", "tbs", "tbl", "tbls", "tbsps"]),
        volume("fl oz", "fl oz", "fl oz", Imperial, 29.574, &["fluid ounce", "fluid ounces", "floz"]),
        volume("cup", "cup", "cups", Imperial, 236.588, &["c"]),
        volume("pint", "pint", "pints", Imperial, 473.176, &["pt"]),
        volume("quart", "quart", "quarts", Imperial, 946.353, &["qt"]),
        volume("gallon", "gallon", "gallons", Imperial, 3785.41, &["gal"]),
        volume("ml", "ml", "ml", Metric, 1.0, &["milliliter", "milliliters", "millilitre", "millilitres"]),
        volume("cl", "cl", "cl", Metric, 10.0, &["centiliter", "centiliters"]),
        volume("dl", "dl", "dl", Metric, 100.0, &["deciliter", "deciliters"]),
        volume("l", "l", "l", Metric, 1000.0, &["liter", "liters", "litre", "litres"]),
        // Weight units
        weight("mg", "mg", "mg", Metric, 0.001, &["milligram", "milligrams"]),
        weight("g", "g", "g", Metric, 1.0, &["gram", "grams", "gramme", "grammes", "gr"]),
        weight("kg", "kg", "kg", Metric, 1000.0, &["kilogram", "kilograms", "kilo", "kilos"]),
        weight("oz", "oz", "oz", Imperial, 28.35, &["ounce", "ounces"]),
        weight("lb", "lb", "lb", Imperial, 453.592, &["lbs", "pound", "pounds"]),
        // Count units
        unitless("piece", "piece", "pieces", UnitType::Count, &["pc", "pcs"]),
        unitless("clove", "clove", "cloves", UnitType::Count, &[]),
        unitless("can", "can", "cans", UnitType::Count, &["tin", "tins"]),
        unitless("package", "package", "packages", UnitType::Count, &["pkg", "packet", "packets"]),
        unitless("slice", "slice", "slices", UnitType::Count, &[]),
        unitless("stick", "stick", "sticks", UnitType::Count, &[]),
        unitless("head", "head", "heads", UnitType::Count, &[]),
        unitless("bunch", "bunch", "bunches", UnitType::Count, &[]),
        unitless("dozen", "dozen", "dozen", UnitType::Count, &["doz"]),
        unitless("bottle", "bottle", "bottles", UnitType::Count, &[]),
        unitless("jar", "jar", "jars", UnitType::Count, &[]),
        unitless("stalk", "stalk", "stalks", UnitType::Count, &[]),
        // Other units
        unitless("pinch", "pinch", "pinches", UnitType::Other, &[]),
        unitless("dash", "dash", "dashes", UnitType::Other, &[]),
        unitless("drop", "drop", "drops", UnitType::Other, &[]),
        unitless("handful", "handful", "handfuls", UnitType::Other, &[]),
        unitless("sprig", "sprig", "sprigs", UnitType::Other, &[]),
    ]
}
