//! # Unit Conversion Module
//!
//! Scales a quantity and re-expresses it in the metric or imperial system
//! for display. Conversion never fails: a unit the catalog cannot resolve,
//! or a count unit, is passed through with only the scale applied.
//!
//! Same-type conversions pivot through grams (weight) or milliliters
//! (volume) using the catalog's factors, then pick a display unit by
//! magnitude.

use crate::ingredient_model::{ConversionResult, MeasurementUnit, UnitSystem, UnitType};
use crate::unit_catalog::{UnitCatalog, UnitDirectory};
use std::sync::Arc;
use tracing::{debug, trace, warn};

pub const GRAMS_PER_OUNCE: f64 = 28.35;
pub const OUNCES_PER_POUND: f64 = 16.0;
pub const ML_PER_CUP: f64 = 236.588;
pub const ML_PER_TBSP: f64 = 14.787;
pub const ML_PER_TSP: f64 = 4.929;

/// Amounts within this distance of a table fraction render as a glyph
pub const FRACTION_TOLERANCE: f64 = 0.01;

/// Largest whole part combined with a fraction glyph ("5¾")
const MAX_FRACTION_WHOLE: u32 = 5;

/// Common cooking fractions rendered with a glyph
const DISPLAY_FRACTIONS: &[(f64, &str)] = &[
    (0.25, "¼"),
    (1.0 / 3.0, "⅓"),
    (0.5, "½"),
    (2.0 / 3.0, "⅔"),
    (0.75, "¾"),
];

/// Scale `amount` and express it in `target`
///
/// # Arguments
///
/// * `amount` - Quantity as parsed
/// * `unit` - Unit spelling as parsed; resolved through `catalog`
/// * `target` - Unit system to display in
/// * `scale` - Recipe scale factor, applied before any conversion
/// * `catalog` - Loaded unit catalog
///
/// # Returns
///
/// The converted amount and unit with display text. Native targets and
/// unknown units pass through with `converted == false`.
///
/// # Examples
///
/// ```rust
/// use ingredients::conversion::convert;
/// use ingredients::ingredient_model::UnitSystem;
/// use ingredients::unit_catalog::UnitCatalog;
///
/// let catalog = UnitCatalog::standard();
/// let metric = convert(2.0, "cup", UnitSystem::Metric, 1.0, &catalog);
/// assert_eq!(metric.amount, 473.0);
/// assert_eq!(metric.unit, "ml");
///
/// let unknown = convert(3.0, "smidgen", UnitSystem::Metric, 2.0, &catalog);
/// assert_eq!(unknown.amount, 6.0);
/// assert!(!unknown.converted);
/// ```
pub fn convert(
    amount: f64,
    unit: &str,
    target: UnitSystem,
    scale: f64,
    catalog: &UnitCatalog,
) -> ConversionResult {
    let scaled = amount * scale;
    trace!("Converting {} {} x{} to {:?}", amount, unit, scale, target);

    if target == UnitSystem::Native {
        return unchanged(scaled, unit, catalog.resolve(unit));
    }

    let Some(resolved) = catalog.resolve(unit) else {
        debug!("Unit '{}' not in catalog, passing through", unit);
        return unchanged(scaled, unit, None);
    };

    let converted = match (target, resolved.unit_type) {
        (UnitSystem::Metric, UnitType::Weight) if !resolved.is_metric() => {
            resolved.metric_g.map(|g| metric_weight(scaled * g))
        }
        (UnitSystem::Metric, UnitType::Volume) if !resolved.is_metric() => {
            resolved.metric_ml.map(|ml| metric_volume(scaled * ml))
        }
        (UnitSystem::Imperial, UnitType::Weight) if !resolved.is_imperial() => {
            resolved.metric_g.map(|g| imperial_weight(scaled * g))
        }
        (UnitSystem::Imperial, UnitType::Volume) if !resolved.is_imperial() => {
            resolved.metric_ml.map(|ml| imperial_volume(scaled * ml))
        }
        _ => None,
    };

    match converted {
        Some((amount, code)) => {
            let display_unit = catalog
                .resolve(code)
                .map(|u| u.display_for(amount).to_string())
                .unwrap_or_else(|| code.to_string());
            debug!("Converted {} {} to {} {}", scaled, unit, amount, code);
            ConversionResult {
                amount,
                unit: code.to_string(),
                display_text: display_text(amount, &display_unit),
                converted: true,
            }
        }
        None => unchanged(scaled, unit, Some(resolved)),
    }
}

fn unchanged(amount: f64, unit: &str, resolved: Option<&MeasurementUnit>) -> ConversionResult {
    let display_unit = match resolved {
        Some(resolved) => resolved.display_for(amount),
        None => unit,
    };
    ConversionResult {
        amount,
        unit: unit.to_string(),
        display_text: display_text(amount, display_unit),
        converted: false,
    }
}

fn metric_weight(grams: f64) -> (f64, &'static str) {
    if grams >= 1000.0 {
        (round_to(grams / 1000.0, 2), "kg")
    } else {
        (round_to(grams, 0), "g")
    }
}

fn metric_volume(ml: f64) -> (f64, &'static str) {
    if ml >= 1000.0 {
        (round_to(ml / 1000.0, 2), "l")
    } else {
        (round_to(ml, 0), "ml")
    }
}

fn imperial_weight(grams: f64) -> (f64, &'static str) {
    let ounces = grams / GRAMS_PER_OUNCE;
    if ounces >= OUNCES_PER_POUND {
        (round_to(ounces / OUNCES_PER_POUND, 2), "lb")
    } else {
        (round_to(ounces, 1), "oz")
    }
}

fn imperial_volume(ml: f64) -> (f64, &'static str) {
    let cups = ml / ML_PER_CUP;
    if cups >= 1.0 {
        return (round_to(cups, 2), "cup");
    }
    let tablespoons = ml / ML_PER_TBSP;
    if tablespoons >= 1.0 {
        return (round_to(tablespoons, 1), "tbsp");
    }
    (round_to(ml / ML_PER_TSP, 1), "tsp")
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn display_text(amount: f64, unit: &str) -> String {
    let amount = format_amount(amount);
    if unit.is_empty() {
        amount
    } else {
        format!("{} {}", amount, unit)
    }
}

/// Render an amount for display
///
/// Whole numbers print without decimals, common cooking fractions (alone or
/// after a whole part up to 5) print with a Unicode glyph, anything else
/// prints with two decimals.
pub fn format_amount(amount: f64) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }

    let fixed = format!("{:.2}", amount);
    if let Some(whole) = fixed.strip_suffix(".00") {
        return if whole == "-0" { "0".to_string() } else { whole.to_string() };
    }

    if amount > 0.0 {
        for whole in 0..=MAX_FRACTION_WHOLE {
            for &(fraction, glyph) in DISPLAY_FRACTIONS {
                if (amount - (whole as f64 + fraction)).abs() <= FRACTION_TOLERANCE {
                    return if whole == 0 {
                        glyph.to_string()
                    } else {
                        format!("{}{}", whole, glyph)
                    };
                }
            }
        }
    }

    fixed
}

/// Converter bound to the shared unit directory handle
#[derive(Clone)]
pub struct UnitConverter {
    units: Arc<UnitDirectory>,
}

impl UnitConverter {
    pub fn new(units: Arc<UnitDirectory>) -> Self {
        Self { units }
    }

    /// Convert against the shared catalog, loading it on first use
    ///
    /// If the catalog cannot be loaded every unit is treated as unresolved
    /// and the scaled amount is passed through.
    pub async fn convert(&self, amount: f64, unit: &str, target: UnitSystem, scale: f64) -> ConversionResult {
        match self.units.catalog().await {
            Ok(catalog) => convert(amount, unit, target, scale, &catalog),
            Err(e) => {
                warn!("Unit catalog unavailable, passing '{}' through: {}", unit, e);
                convert(amount, unit, target, scale, &UnitCatalog::new(Vec::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingredient_parser::consume_quantity;

    fn catalog() -> UnitCatalog {
        UnitCatalog::standard()
    }

    #[test]
    fn test_native_is_identity() {
        let catalog = catalog();
        for (amount, unit) in [(2.0, "cups"), (0.5, "tsp"), (3.0, ""), (7.25, "smidgen")] {
            let result = convert(amount, unit, UnitSystem::Native, 1.0, &catalog);
            assert_eq!(result.amount, amount);
            assert_eq!(result.unit, unit);
            assert!(!result.converted);
        }
    }

    #[test]
    fn test_cups_to_metric() {
        let result = convert(2.0, "cup", UnitSystem::Metric, 1.0, &catalog());
        assert_eq!(result.amount, 473.0);
        assert_eq!(result.unit, "ml");
        assert_eq!(result.display_text, "473 ml");
        assert!(result.converted);
    }

    #[test]
    fn test_imperial_unit_stays_imperial() {
        let result = convert(1.0, "cup", UnitSystem::Imperial, 1.0, &catalog());
        assert_eq!(result.amount, 1.0);
        assert_eq!(result.unit, "cup");
        assert_eq!(result.display_text, "1 cup");
        assert!(!result.converted);
    }

    #[test]
    fn test_metric_weight_picks_kilograms() {
        let result = convert(3.0, "lb", UnitSystem::Metric, 1.0, &catalog());
        assert_eq!(result.unit, "kg");
        assert!((result.amount - 1.36).abs() < 1e-9);

        let result = convert(4.0, "oz", UnitSystem::Metric, 1.0, &catalog());
        assert_eq!(result.unit, "g");
        assert_eq!(result.amount, 113.0);
    }

    #[test]
    fn test_metric_volume_picks_liters() {
        let result = convert(5.0, "cups", UnitSystem::Metric, 1.0, &catalog());
        assert_eq!(result.unit, "l");
        assert!((result.amount - 1.18).abs() < 1e-9);
    }

    #[test]
    fn test_imperial_weight() {
        let result = convert(500.0, "g", UnitSystem::Imperial, 1.0, &catalog());
        assert_eq!(result.unit, "lb");
        assert!((result.amount - 1.10).abs() < 1e-9);

        let result = convert(100.0, "grams", UnitSystem::Imperial, 1.0, &catalog());
        assert_eq!(result.unit, "oz");
        assert!((result.amount - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_imperial_volume_steps_down() {
        let result = convert(250.0, "ml", UnitSystem::Imperial, 1.0, &catalog());
        assert_eq!(result.unit, "cup");
        assert!((result.amount - 1.06).abs() < 1e-9);

        let result = convert(30.0, "ml", UnitSystem::Imperial, 1.0, &catalog());
        assert_eq!(result.unit, "tbsp");
        assert!((result.amount - 2.0).abs() < 1e-9);

        let result = convert(5.0, "ml", UnitSystem::Imperial, 1.0, &catalog());
        assert_eq!(result.unit, "tsp");
        assert!((result.amount - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_and_count_units_pass_through_scaled() {
        let result = convert(2.0, "smidgen", UnitSystem::Metric, 3.0, &catalog());
        assert_eq!(result.amount, 6.0);
        assert_eq!(result.unit, "smidgen");
        assert!(!result.converted);

        let result = convert(2.0, "cloves", UnitSystem::Imperial, 2.0, &catalog());
        assert_eq!(result.amount, 4.0);
        assert_eq!(result.display_text, "4 cloves");
    }

    #[test]
    fn test_scaling_commutes_with_conversion() {
        let catalog = catalog();
        for system in [UnitSystem::Native, UnitSystem::Metric, UnitSystem::Imperial] {
            for (amount, unit) in [(1.5, "cup"), (8.0, "oz"), (250.0, "g"), (2.0, "tbsp")] {
                let scaled_first = convert(amount * 3.0, unit, system, 1.0, &catalog);
                let scaled_in = convert(amount, unit, system, 3.0, &catalog);
                assert_eq!(scaled_first, scaled_in);
            }
        }

        // Converting then scaling lands on the same quantity up to rounding
        let one = convert(100.0, "g", UnitSystem::Imperial, 1.0, &catalog);
        let two = convert(100.0, "g", UnitSystem::Imperial, 2.0, &catalog);
        assert_eq!(one.unit, two.unit);
        assert!((one.amount * 2.0 - two.amount).abs() <= 0.15);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(2.0), "2");
        assert_eq!(format_amount(0.5), "½");
        assert_eq!(format_amount(1.5), "1½");
        assert_eq!(format_amount(0.33), "⅓");
        assert_eq!(format_amount(2.67), "2⅔");
        assert_eq!(format_amount(0.75), "¾");
        assert_eq!(format_amount(1.1), "1.10");
        assert_eq!(format_amount(473.0), "473");
        assert_eq!(format_amount(7.5), "7.50");
        assert_eq!(format_amount(0.0), "0");
    }

    #[test]
    fn test_fraction_display_round_trips_through_parser() {
        for value in [0.5, 0.25, 0.75, 1.5, 2.0 / 3.0] {
            let shown = format_amount(value);
            let parsed = consume_quantity(&shown).expect("glyph should parse");
            assert!((parsed.amount - value).abs() <= FRACTION_TOLERANCE);
        }
    }

    #[test]
    fn test_plural_display_units() {
        let result = convert(0.5, "cup", UnitSystem::Native, 4.0, &catalog());
        assert_eq!(result.display_text, "2 cups");

        let result = convert(0.5, "cup", UnitSystem::Native, 1.0, &catalog());
        assert_eq!(result.display_text, "½ cup");
    }

    #[tokio::test]
    async fn test_unit_converter_uses_shared_catalog() {
        let converter = UnitConverter::new(Arc::new(UnitDirectory::preloaded(UnitCatalog::standard())));
        let result = converter.convert(2.0, "cups", UnitSystem::Metric, 1.0).await;
        assert_eq!(result.unit, "ml");
        assert_eq!(result.amount, 473.0);
    }
}
