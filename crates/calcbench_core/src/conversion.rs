//! Unit conversion: a static catalog of categories plus a request whose
//! result is recomputed from scratch after every change.

use crate::error::{CalcError, CalcResult};
use crate::format::format_fixed;
use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{trace, warn};

pub const INVALID_INPUT: &str = "Invalid input";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionUnit {
    pub name: String,
    /// Multiplicative ratio to the category's base unit. Unused for temperature.
    pub factor: f64,
    pub symbol: String,
}

/// How values move between units of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionKind {
    /// `value * from.factor / to.factor`
    Linear,
    /// Affine transforms through Celsius, keyed by unit name.
    Temperature,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionCategory {
    pub name: String,
    pub base_unit: String,
    pub kind: ConversionKind,
    pub units: Vec<ConversionUnit>,
}

impl ConversionCategory {
    pub fn unit(&self, name: &str) -> Option<&ConversionUnit> {
        self.units.iter().find(|u| u.name == name)
    }

    fn unit_index(&self, name: &str) -> Option<usize> {
        self.units.iter().position(|u| u.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureScale {
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureScale {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Celsius" => Some(Self::Celsius),
            "Fahrenheit" => Some(Self::Fahrenheit),
            "Kelvin" => Some(Self::Kelvin),
            _ => None,
        }
    }

    pub fn to_celsius(self, value: f64) -> f64 {
        match self {
            Self::Celsius => value,
            Self::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
            Self::Kelvin => value - 273.15,
        }
    }

    pub fn from_celsius(self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
            Self::Kelvin => celsius + 273.15,
        }
    }
}

pub fn convert_temperature(value: f64, from: &str, to: &str) -> CalcResult<f64> {
    let scale = |name: &str| {
        TemperatureScale::from_name(name)
            .ok_or_else(|| CalcError::InputFormat(format!("unknown temperature unit: {name}")))
    };
    let (from, to) = (scale(from)?, scale(to)?);
    if from == to {
        return Ok(value);
    }
    Ok(to.from_celsius(from.to_celsius(value)))
}

pub fn convert_linear(value: f64, from: &ConversionUnit, to: &ConversionUnit) -> f64 {
    value * from.factor / to.factor
}

/// Reads the leading number of `text`, ignoring any trailing characters.
///
/// `"12.5kg"` reads as 12.5; text with no leading number is an input error.
pub fn parse_input(text: &str) -> CalcResult<f64> {
    let trimmed = text.trim_start();
    let mut ends: Vec<usize> = trimmed.char_indices().map(|(i, c)| i + c.len_utf8()).collect();
    ends.reverse();
    ends.into_iter()
        .filter_map(|end| trimmed[..end].parse::<f64>().ok())
        .find(|v| v.is_finite())
        .ok_or_else(|| CalcError::InputFormat(format!("not a number: {text:?}")))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionSettings {
    pub linear_decimals: usize,
    pub temperature_decimals: usize,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            linear_decimals: 6,
            temperature_decimals: 4,
        }
    }
}

/// Converts `input` between two units of `category` and formats the result.
///
/// A pure function of its arguments; the converter calls it after every change.
pub fn compute_conversion(
    category: &ConversionCategory,
    from: &ConversionUnit,
    to: &ConversionUnit,
    input: &str,
    settings: &ConversionSettings,
) -> String {
    let value = match parse_input(input) {
        Ok(value) => value,
        Err(_) => return INVALID_INPUT.to_string(),
    };
    match category.kind {
        ConversionKind::Temperature => match convert_temperature(value, &from.name, &to.name) {
            Ok(converted) => format_fixed(converted, settings.temperature_decimals),
            Err(_) => INVALID_INPUT.to_string(),
        },
        ConversionKind::Linear => {
            format_fixed(convert_linear(value, from, to), settings.linear_decimals)
        }
    }
}

/// Checks the assumptions the conversion math relies on.
///
/// Linear categories need unique unit names, finite positive factors and at
/// least one unit with factor 1 (the base). Temperature categories may only
/// use the scales `TemperatureScale` knows.
pub fn validate_catalog(catalog: &[ConversionCategory]) -> anyhow::Result<()> {
    if catalog.is_empty() {
        bail!("Conversion catalog is empty.");
    }
    for category in catalog {
        if category.units.is_empty() {
            bail!("Category '{}' has no units.", category.name);
        }
        let mut seen = HashSet::new();
        for unit in &category.units {
            if !seen.insert(unit.name.as_str()) {
                bail!(
                    "Category '{}' lists unit '{}' twice.",
                    category.name,
                    unit.name
                );
            }
        }
        match category.kind {
            ConversionKind::Linear => {
                if let Some(unit) = category
                    .units
                    .iter()
                    .find(|u| !u.factor.is_finite() || u.factor <= 0.0)
                {
                    bail!(
                        "Unit '{}' in '{}' has invalid factor {}.",
                        unit.name,
                        category.name,
                        unit.factor
                    );
                }
                if !category.units.iter().any(|u| u.factor == 1.0) {
                    bail!("Category '{}' has no base unit (factor 1).", category.name);
                }
            }
            ConversionKind::Temperature => {
                if let Some(unit) = category
                    .units
                    .iter()
                    .find(|u| TemperatureScale::from_name(&u.name).is_none())
                {
                    bail!(
                        "Temperature category '{}' has unknown scale '{}'.",
                        category.name,
                        unit.name
                    );
                }
            }
        }
    }
    Ok(())
}

fn unit(name: &str, factor: f64, symbol: &str) -> ConversionUnit {
    ConversionUnit {
        name: name.to_string(),
        factor,
        symbol: symbol.to_string(),
    }
}

fn category(
    name: &str,
    base_unit: &str,
    kind: ConversionKind,
    units: Vec<ConversionUnit>,
) -> ConversionCategory {
    ConversionCategory {
        name: name.to_string(),
        base_unit: base_unit.to_string(),
        kind,
        units,
    }
}

/// The built-in catalog.
pub fn default_catalog() -> Vec<ConversionCategory> {
    use ConversionKind::{Linear, Temperature};
    vec![
        category(
            "Length",
            "meter",
            Linear,
            vec![
                unit("Meter", 1.0, "m"),
                unit("Kilometer", 1000.0, "km"),
                unit("Centimeter", 0.01, "cm"),
                unit("Millimeter", 0.001, "mm"),
                unit("Inch", 0.0254, "in"),
                unit("Foot", 0.3048, "ft"),
                unit("Yard", 0.9144, "yd"),
                unit("Mile", 1609.344, "mi"),
            ],
        ),
        category(
            "Mass",
            "kilogram",
            Linear,
            vec![
                unit("Kilogram", 1.0, "kg"),
                unit("Gram", 0.001, "g"),
                unit("Pound", 0.453592, "lb"),
                unit("Ounce", 0.0283495, "oz"),
                unit("Ton", 1000.0, "t"),
            ],
        ),
        // Factors are placeholders; conversion goes through TemperatureScale.
        category(
            "Temperature",
            "celsius",
            Temperature,
            vec![
                unit("Celsius", 1.0, "°C"),
                unit("Fahrenheit", 1.0, "°F"),
                unit("Kelvin", 1.0, "K"),
            ],
        ),
        category(
            "Area",
            "square meter",
            Linear,
            vec![
                unit("Square Meter", 1.0, "m²"),
                unit("Square Kilometer", 1_000_000.0, "km²"),
                unit("Square Centimeter", 0.0001, "cm²"),
                unit("Square Inch", 0.00064516, "in²"),
                unit("Square Foot", 0.092903, "ft²"),
            ],
        ),
        category(
            "Volume",
            "liter",
            Linear,
            vec![
                unit("Liter", 1.0, "L"),
                unit("Milliliter", 0.001, "mL"),
                unit("Gallon (US)", 3.78541, "gal"),
                unit("Cubic Meter", 1000.0, "m³"),
                unit("Cubic Inch", 0.0163871, "in³"),
            ],
        ),
        category(
            "Energy",
            "joule",
            Linear,
            vec![
                unit("Joule", 1.0, "J"),
                unit("Kilojoule", 1000.0, "kJ"),
                unit("Calorie", 4.184, "cal"),
                unit("BTU", 1055.06, "BTU"),
                unit("Kilowatt-hour", 3_600_000.0, "kWh"),
            ],
        ),
        category(
            "Pressure",
            "pascal",
            Linear,
            vec![
                unit("Pascal", 1.0, "Pa"),
                unit("Kilopascal", 1000.0, "kPa"),
                unit("Bar", 100_000.0, "bar"),
                unit("PSI", 6894.76, "psi"),
                unit("Atmosphere", 101_325.0, "atm"),
            ],
        ),
        // Distinct quantities sharing placeholder factors of 1.
        category(
            "Electrical",
            "base",
            Linear,
            vec![
                unit("Voltage (V)", 1.0, "V"),
                unit("Current (A)", 1.0, "A"),
                unit("Resistance (Ω)", 1.0, "Ω"),
                unit("Power (W)", 1.0, "W"),
                unit("Capacitance (F)", 1.0, "F"),
            ],
        ),
    ]
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversionSnapshot {
    pub category: String,
    pub from_unit: ConversionUnit,
    pub to_unit: ConversionUnit,
    pub input: String,
    pub result: String,
}

/// The live conversion request.
#[derive(Debug, Clone)]
pub struct UnitConverter {
    catalog: Vec<ConversionCategory>,
    category: usize,
    from: usize,
    to: usize,
    input: String,
    result: String,
    settings: ConversionSettings,
}

impl Default for UnitConverter {
    fn default() -> Self {
        Self::from_parts(default_catalog(), ConversionSettings::default())
    }
}

impl UnitConverter {
    pub fn new(settings: ConversionSettings) -> Self {
        Self::from_parts(default_catalog(), settings)
    }

    /// Builds a converter over a custom catalog after validating it.
    pub fn with_catalog(
        catalog: Vec<ConversionCategory>,
        settings: ConversionSettings,
    ) -> anyhow::Result<Self> {
        validate_catalog(&catalog)?;
        Ok(Self::from_parts(catalog, settings))
    }

    fn from_parts(catalog: Vec<ConversionCategory>, settings: ConversionSettings) -> Self {
        let mut converter = Self {
            catalog,
            category: 0,
            from: 0,
            to: 0,
            input: "1".to_string(),
            result: String::new(),
            settings,
        };
        converter.reset_units();
        converter.convert();
        converter
    }

    pub fn catalog(&self) -> &[ConversionCategory] {
        &self.catalog
    }

    pub fn category(&self) -> &ConversionCategory {
        &self.catalog[self.category]
    }

    pub fn from_unit(&self) -> &ConversionUnit {
        &self.category().units[self.from]
    }

    pub fn to_unit(&self) -> &ConversionUnit {
        &self.category().units[self.to]
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn result(&self) -> &str {
        &self.result
    }

    /// Switches category; units reset to its first and second entries.
    pub fn select_category(&mut self, name: &str) -> CalcResult<()> {
        let index = self
            .catalog
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| {
                warn!(category = name, "unknown conversion category");
                CalcError::InputFormat(format!("unknown category: {name}"))
            })?;
        self.category = index;
        self.reset_units();
        self.result.clear();
        self.convert();
        Ok(())
    }

    pub fn set_from_unit(&mut self, name: &str) -> CalcResult<()> {
        self.from = self.lookup_unit(name)?;
        self.convert();
        Ok(())
    }

    pub fn set_to_unit(&mut self, name: &str) -> CalcResult<()> {
        self.to = self.lookup_unit(name)?;
        self.convert();
        Ok(())
    }

    pub fn set_input(&mut self, input: &str) {
        self.input = input.to_string();
        self.convert();
    }

    pub fn swap_units(&mut self) {
        std::mem::swap(&mut self.from, &mut self.to);
        self.convert();
    }

    /// Recomputes the result from the current request.
    pub fn convert(&mut self) -> &str {
        let category = &self.catalog[self.category];
        self.result = compute_conversion(
            category,
            &category.units[self.from],
            &category.units[self.to],
            &self.input,
            &self.settings,
        );
        trace!(category = %category.name, input = %self.input, result = %self.result, "converted");
        &self.result
    }

    pub fn snapshot(&self) -> ConversionSnapshot {
        ConversionSnapshot {
            category: self.category().name.clone(),
            from_unit: self.from_unit().clone(),
            to_unit: self.to_unit().clone(),
            input: self.input.clone(),
            result: self.result.clone(),
        }
    }

    fn reset_units(&mut self) {
        let count = self.catalog[self.category].units.len();
        self.from = 0;
        self.to = if count > 1 { 1 } else { 0 };
    }

    fn lookup_unit(&self, name: &str) -> CalcResult<usize> {
        self.category().unit_index(name).ok_or_else(|| {
            warn!(unit = name, category = %self.category().name, "unknown unit");
            CalcError::InputFormat(format!("unknown unit: {name}"))
        })
    }
}
