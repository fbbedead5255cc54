// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Chart geometry for the dashboard: bar rectangles for monthly totals and
//! pie slices for one month's categories. Nothing here draws; a renderer
//! takes these structures and paints them.
//!
//! Coordinates follow the usual scene conventions: bars grow upward from a
//! baseline at y = 0, so `height` is measured above it, while pie label
//! anchors are in the pie's bounding box with y growing downward.
//!
//! Pie angles are in angle-units, sixteenths of a degree; a full circle is
//! [`FULL_CIRCLE`].

use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::errors::{LedgerError, LedgerResult};
use crate::models::{CategoryMonthlyTotal, MonthlyTotal};

pub const ANGLE_UNITS_PER_DEGREE: i32 = 16;
pub const FULL_CIRCLE: i32 = 360 * ANGLE_UNITS_PER_DEGREE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Slice colors, reused cyclically.
pub const PALETTE: [Rgb; 10] = [
    Rgb(255, 0, 0),
    Rgb(0, 255, 0),
    Rgb(0, 0, 255),
    Rgb(255, 255, 0),
    Rgb(0, 255, 255),
    Rgb(255, 0, 255),
    Rgb(120, 0, 0),
    Rgb(0, 120, 0),
    Rgb(0, 0, 120),
    Rgb(120, 120, 0),
];

pub fn palette_color(index: usize) -> Rgb {
    PALETTE[index % PALETTE.len()]
}

// --- bars -----------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarLayout {
    pub bar_width: f64,
    pub bar_height: f64,
    pub bar_distance: f64,
    /// Magnitude between two horizontal gridlines.
    pub grid_step: f64,
    /// Magnitude of the fixed red reference line.
    pub reference_magnitude: f64,
    /// Scale maximum used until a larger value shows up.
    pub default_max: f64,
    /// How far the reference line overhangs the bars on each side.
    pub margin: f64,
    /// Upper limit on gridlines; the step widens by a whole factor to stay
    /// under it.
    pub max_gridlines: usize,
}

impl Default for BarLayout {
    fn default() -> Self {
        Self {
            bar_width: 30.0,
            bar_height: 200.0,
            bar_distance: 60.0,
            grid_step: 200.0,
            reference_magnitude: 800.0,
            default_max: 10.0,
            margin: 30.0,
            max_gridlines: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub magnitude: f64,
    pub x: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gridline {
    pub magnitude: f64,
    pub height: f64,
    pub x_start: f64,
    pub x_end: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub magnitude: f64,
    pub height: f64,
    pub x_start: f64,
    pub x_end: f64,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub max_magnitude: f64,
    pub width: f64,
    pub bars: Vec<Bar>,
    pub gridlines: Vec<Gridline>,
    pub reference: ReferenceLine,
}

impl BarLayout {
    /// Lays out one bar per value, left to right in input order.
    ///
    /// The scale maximum is `default_max`, raised to the next whole number at
    /// or above the largest magnitude.
    pub fn layout<L: AsRef<str>>(&self, values: &[(L, f64)]) -> LedgerResult<BarChart> {
        if self.grid_step <= 0.0 || !self.grid_step.is_finite() {
            return Err(LedgerError::precondition("grid step must be positive"));
        }
        if self.max_gridlines == 0 {
            return Err(LedgerError::precondition("at least one gridline is required"));
        }
        let mut max = self.default_max;
        for (label, v) in values {
            if !v.is_finite() || *v < 0.0 {
                return Err(LedgerError::precondition(format!(
                    "bar '{}' has invalid magnitude {}",
                    label.as_ref(),
                    v
                )));
            }
            max = max.max(v.ceil());
        }
        if max <= 0.0 || !max.is_finite() {
            return Err(LedgerError::precondition(format!(
                "bar chart maximum must be positive (got {})",
                max
            )));
        }

        let bars: Vec<Bar> = values
            .iter()
            .enumerate()
            .map(|(i, (label, v))| Bar {
                label: label.as_ref().to_string(),
                magnitude: *v,
                x: i as f64 * self.bar_distance,
                width: self.bar_width,
                height: self.bar_height * (v / max),
            })
            .collect();
        let width = values.len() as f64 * self.bar_distance;

        let (step, count) = self.grid_spacing(max);
        let gridlines = (0..count)
            .map(|k| {
                let magnitude = k as f64 * step;
                Gridline {
                    magnitude,
                    height: self.bar_height * (magnitude / max),
                    x_start: 0.0,
                    x_end: width,
                    label: format!("{}", magnitude),
                }
            })
            .collect();

        let reference = ReferenceLine {
            magnitude: self.reference_magnitude,
            height: self.bar_height * (self.reference_magnitude / max),
            x_start: -self.margin,
            x_end: width + self.margin,
            color: Rgb(240, 0, 0),
        };

        Ok(BarChart {
            max_magnitude: max,
            width,
            bars,
            gridlines,
            reference,
        })
    }

    /// Gridline step and count for magnitudes `0, step, 2*step, ...` below
    /// `max` (always at least the baseline).
    fn grid_spacing(&self, max: f64) -> (f64, usize) {
        let limit = self.max_gridlines as f64;
        let mut step = self.grid_step;
        let mut count = (max / step).ceil();
        if count > limit {
            step *= (count / limit).ceil();
            count = (max / step).ceil();
        }
        (step, count.clamp(1.0, limit) as usize)
    }
}

/// Monthly totals as they come from the store (newest first) turned into
/// bar values, oldest month on the left.
pub fn monthly_series(totals: &[MonthlyTotal]) -> Vec<(String, f64)> {
    totals
        .iter()
        .rev()
        .map(|t| (t.month.label(), t.total.to_f64().unwrap_or(0.0)))
        .collect()
}

// --- pie ------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieLayout {
    pub diameter: f64,
    /// Distance from the center to a slice's label anchor.
    pub label_distance: f64,
    /// Slices spanning this many angle-units or fewer get no label.
    pub label_threshold: i32,
}

impl Default for PieLayout {
    fn default() -> Self {
        Self {
            diameter: 300.0,
            label_distance: 155.0,
            label_threshold: 10 * ANGLE_UNITS_PER_DEGREE,
        }
    }
}

/// Which edge of the label box sits on the anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAnchor {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAnchor {
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabelAnchor {
    pub x: f64,
    pub y: f64,
    pub horizontal: HorizontalAnchor,
    pub vertical: VerticalAnchor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub label: String,
    pub value: f64,
    pub start_angle: i32,
    pub span_angle: i32,
    pub color: Rgb,
    pub label_anchor: Option<LabelAnchor>,
}

impl Slice {
    pub fn end_angle(&self) -> i32 {
        self.start_angle + self.span_angle
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    pub diameter: f64,
    pub total: f64,
    pub slices: Vec<Slice>,
}

impl PieLayout {
    /// Lays out consecutive slices starting at angle 0.
    ///
    /// Each span is rounded to whole angle-units before it is accumulated and
    /// clamped so the slices never run past a full circle. The values must
    /// add up to something positive.
    pub fn layout<L: AsRef<str>>(&self, elements: &[(f64, L)]) -> LedgerResult<PieChart> {
        let mut total = 0.0;
        for (v, label) in elements {
            if !v.is_finite() || *v < 0.0 {
                return Err(LedgerError::precondition(format!(
                    "slice '{}' has invalid value {}",
                    label.as_ref(),
                    v
                )));
            }
            total += v;
        }
        if total <= 0.0 {
            return Err(LedgerError::precondition(
                "pie chart needs a positive total",
            ));
        }

        let mut slices = Vec::with_capacity(elements.len());
        let mut start = 0;
        for (i, (v, label)) in elements.iter().enumerate() {
            let span = ((v / total * FULL_CIRCLE as f64).round() as i32).min(FULL_CIRCLE - start);
            let label_anchor = (span > self.label_threshold).then(|| self.label_anchor(start, span));
            slices.push(Slice {
                label: label.as_ref().to_string(),
                value: *v,
                start_angle: start,
                span_angle: span,
                color: palette_color(i),
                label_anchor,
            });
            start += span;
        }

        Ok(PieChart {
            diameter: self.diameter,
            total,
            slices,
        })
    }

    fn label_anchor(&self, start: i32, span: i32) -> LabelAnchor {
        let mid = start as f64 + span as f64 / 2.0;
        let radians = (mid / ANGLE_UNITS_PER_DEGREE as f64).to_radians();
        let center = self.diameter / 2.0;
        let quarter = (90 * ANGLE_UNITS_PER_DEGREE) as f64;

        // left half of the circle: keep the label inside by hanging it to the left
        let horizontal = if mid > quarter && mid < 3.0 * quarter {
            HorizontalAnchor::Right
        } else {
            HorizontalAnchor::Left
        };
        // top half: hang the label above the anchor
        let vertical = if mid > 0.0 && mid < 2.0 * quarter {
            VerticalAnchor::Bottom
        } else {
            VerticalAnchor::Top
        };

        LabelAnchor {
            x: center + radians.cos() * self.label_distance,
            y: center - radians.sin() * self.label_distance,
            horizontal,
            vertical,
        }
    }
}

/// Category totals for one month as pie elements, in store order.
pub fn category_series(totals: &[CategoryMonthlyTotal]) -> Vec<(f64, String)> {
    totals
        .iter()
        .map(|t| (t.total.to_f64().unwrap_or(0.0), t.category_name.clone()))
        .collect()
}
