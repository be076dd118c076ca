//! Numeric sampling of `y = f(x)` and `z = f(x, y)` for plotting.
//!
//! The expression is compiled once and run on the VM at each grid point.
//! Points where the function has no finite value are skipped.

use crate::equation_engine::{compile_expression, VM};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Most intervals accepted across a curve's x range.
pub const MAX_CURVE_SAMPLES: usize = 100_000;
/// Most intervals accepted along each axis of a surface grid.
pub const MAX_SURFACE_INTERVALS: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingSettings {
    /// Number of intervals across the x range for curves.
    pub samples: usize,
    pub surface_min: f64,
    pub surface_max: f64,
    pub surface_step: f64,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            samples: 500,
            surface_min: -5.0,
            surface_max: 5.0,
            surface_step: 0.2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurveSamples {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSamples {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

pub fn sample_curve(expression: &str, x_min: f64, x_max: f64, samples: usize) -> Result<CurveSamples> {
    if !x_min.is_finite() || !x_max.is_finite() || x_max <= x_min {
        bail!("Range must be finite with max > min.");
    }
    if samples == 0 {
        bail!("At least one sample interval is required.");
    }
    if samples > MAX_CURVE_SAMPLES {
        bail!("At most {MAX_CURVE_SAMPLES} sample intervals are allowed, got {samples}.");
    }

    let code = compile_expression(expression, &["x".to_string()])?;
    let step = (x_max - x_min) / samples as f64;
    let mut stack = Vec::with_capacity(16);
    let mut out = CurveSamples::default();

    for i in 0..=samples {
        let x = x_min + step * i as f64;
        match VM::execute(&code, &[x], &mut stack) {
            Ok(y) if y.is_finite() => {
                out.x.push(x);
                out.y.push(y);
            }
            _ => {}
        }
    }
    debug!(expression, points = out.x.len(), "sampled curve");
    Ok(out)
}

pub fn sample_surface(expression: &str, min: f64, max: f64, step: f64) -> Result<SurfaceSamples> {
    if !min.is_finite() || !max.is_finite() || max <= min {
        bail!("Range must be finite with max > min.");
    }
    if !step.is_finite() || step <= 0.0 {
        bail!("Step must be positive.");
    }

    // Index-based grid so accumulated float error cannot drop the last row.
    let intervals = ((max - min) / step + 1e-9).floor();
    if intervals > MAX_SURFACE_INTERVALS as f64 {
        bail!("Step {step} gives more than {MAX_SURFACE_INTERVALS} grid intervals per axis.");
    }
    let count = intervals as usize;

    let code = compile_expression(expression, &["x".to_string(), "y".to_string()])?;
    let mut stack = Vec::with_capacity(16);
    let mut out = SurfaceSamples::default();

    for i in 0..=count {
        let x = min + step * i as f64;
        for j in 0..=count {
            let y = min + step * j as f64;
            match VM::execute(&code, &[x, y], &mut stack) {
                Ok(z) if z.is_finite() => {
                    out.x.push(x);
                    out.y.push(y);
                    out.z.push(z);
                }
                _ => {}
            }
        }
    }
    debug!(expression, points = out.z.len(), "sampled surface");
    Ok(out)
}

/// Samples with the ranges from `settings`.
pub fn sample_default_surface(expression: &str, settings: &SamplingSettings) -> Result<SurfaceSamples> {
    sample_surface(
        expression,
        settings.surface_min,
        settings.surface_max,
        settings.surface_step,
    )
}
