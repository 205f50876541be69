//! Compiled ramp lookup and the color-relief table handed to raster backends.
use std::fmt::Write as _;

use crate::core::config::RampDefinition;
use crate::types::{RampKind, Rgb};

/// Breakpoints of a ramp with precomputed per-segment spans and channel deltas.
///
/// Values at or below the first breakpoint take its color, values at or
/// above the last take the last color, and anything in between is linearly
/// interpolated per channel within its bracketing segment. Gradient and
/// diverging ramps go through the same path.
#[derive(Debug, Clone, PartialEq)]
pub struct RampTable {
    name: String,
    kind: RampKind,
    values: Vec<f64>,
    colors: Vec<Rgb>,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    span: f64,
    // per-channel change across the whole segment
    delta: [f64; 3],
}

impl RampTable {
    pub fn compile(def: &RampDefinition) -> Self {
        let values: Vec<f64> = def.breakpoints().iter().map(|b| b.value).collect();
        let colors: Vec<Rgb> = def.breakpoints().iter().map(|b| b.color).collect();
        let segments = values
            .windows(2)
            .zip(colors.windows(2))
            .map(|(v, c)| {
                let (lo, hi) = (c[0].channels(), c[1].channels());
                Segment {
                    span: v[1] - v[0],
                    delta: [0, 1, 2].map(|ch| hi[ch] as f64 - lo[ch] as f64),
                }
            })
            .collect();

        Self {
            name: def.name().to_string(),
            kind: def.kind(),
            values,
            colors,
            segments,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RampKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Color for `value`. NaN takes the lower clamp; callers that treat NaN
    /// as missing data must check before calling.
    pub fn color_at(&self, value: f64) -> Rgb {
        let last = self.values.len() - 1;
        if value.is_nan() || value <= self.values[0] {
            return self.colors[0];
        }
        if value >= self.values[last] {
            return self.colors[last];
        }

        // values[i] <= value < values[i + 1]
        let i = self.values.partition_point(|&v| v <= value) - 1;
        let seg = self.segments[i];
        let t = (value - self.values[i]) / seg.span;
        let base = self.colors[i].channels();
        let [r, g, b] = [0, 1, 2]
            .map(|ch| (base[ch] as f64 + seg.delta[ch] * t).round().clamp(0.0, 255.0) as u8);
        Rgb::new(r, g, b)
    }

    /// Rows for an external color-relief primitive, ending with the no-data row.
    pub fn to_external_table(&self) -> ReliefTable {
        let mut rows: Vec<ReliefRow> = self
            .values
            .iter()
            .zip(&self.colors)
            .map(|(&value, color)| ReliefRow {
                key: ReliefKey::Value(value),
                color: *color,
                alpha: 255,
            })
            .collect();
        rows.push(ReliefRow {
            key: ReliefKey::NoData,
            color: Rgb::BLACK,
            alpha: 0,
        });

        ReliefTable {
            ramp: self.clone(),
            rows,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReliefKey {
    Value(f64),
    /// Whatever no-data value the input raster declares.
    NoData,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReliefRow {
    pub key: ReliefKey,
    pub color: Rgb,
    pub alpha: u8,
}

/// Ordered value -> RGBA table, as consumed by `gdaldem color-relief`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReliefTable {
    ramp: RampTable,
    rows: Vec<ReliefRow>,
}

impl ReliefTable {
    pub fn rows(&self) -> &[ReliefRow] {
        &self.rows
    }

    pub fn ramp(&self) -> &RampTable {
        &self.ramp
    }

    /// RGBA for one sample. Samples equal to `no_data`, and NaN samples,
    /// are fully transparent.
    pub fn rgba_for(&self, value: f64, no_data: Option<f64>) -> [u8; 4] {
        if is_no_data(value, no_data) {
            let nd = self.no_data_row();
            return [nd.color.r, nd.color.g, nd.color.b, nd.alpha];
        }
        let c = self.ramp.color_at(value);
        [c.r, c.g, c.b, 255]
    }

    fn no_data_row(&self) -> ReliefRow {
        self.rows
            .iter()
            .copied()
            .find(|r| r.key == ReliefKey::NoData)
            .unwrap_or(ReliefRow {
                key: ReliefKey::NoData,
                color: Rgb::BLACK,
                alpha: 0,
            })
    }

    /// Text form understood by `gdaldem color-relief`: `value r g b a` per
    /// line, `nv` standing for the raster's no-data value.
    pub fn to_color_relief_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# color-relief table for ramp '{}'", self.ramp.name());
        let _ = writeln!(out, "# value red green blue alpha");
        for row in &self.rows {
            let c = row.color;
            let _ = match row.key {
                ReliefKey::Value(v) => writeln!(out, "{} {} {} {} {}", v, c.r, c.g, c.b, row.alpha),
                ReliefKey::NoData => writeln!(out, "nv {} {} {} {}", c.r, c.g, c.b, row.alpha),
            };
        }
        out
    }
}

/// True for NaN and for samples equal to the declared no-data value.
///
/// Float32 rasters store the sentinel rounded to single precision while GDAL
/// reports the declared value as a double (GRIB's 9.999e20 reads back as
/// 9.999000260554009e20), so a sample also matches when both round to the
/// same finite `f32`, as `gdaldem` compares them.
pub fn is_no_data(value: f64, no_data: Option<f64>) -> bool {
    if value.is_nan() {
        return true;
    }
    match no_data {
        Some(nd) if value == nd => true,
        Some(nd) => {
            let single = nd as f32;
            single.is_finite() && value as f32 == single
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Breakpoint;

    fn hex(s: &str) -> Rgb {
        Rgb::from_hex(s).unwrap()
    }

    fn temperature() -> RampTable {
        let def = RampDefinition::new(
            "temperature",
            RampKind::Gradient,
            vec![
                Breakpoint::new(-40.0, hex("#1a0066")),
                Breakpoint::new(0.0, hex("#00ff00")),
                Breakpoint::new(50.0, hex("#ff0000")),
            ],
        )
        .unwrap();
        RampTable::compile(&def)
    }

    #[test]
    fn clamps_below_and_above_domain() {
        let table = temperature();
        for v in [-40.0, -40.0001, -100.0, f64::NEG_INFINITY, -1e300] {
            assert_eq!(table.color_at(v), hex("#1a0066"), "value {v}");
        }
        for v in [50.0, 50.0001, 100.0, f64::INFINITY] {
            assert_eq!(table.color_at(v), hex("#ff0000"), "value {v}");
        }
    }

    #[test]
    fn knots_are_exact() {
        let table = temperature();
        assert_eq!(table.color_at(-40.0), hex("#1a0066"));
        assert_eq!(table.color_at(0.0), hex("#00ff00"));
        assert_eq!(table.color_at(50.0), hex("#ff0000"));
    }

    #[test]
    fn interpolates_midpoint() {
        let table = temperature();
        // halfway between (26, 0, 102) and (0, 255, 0)
        assert_eq!(table.color_at(-20.0), Rgb::new(13, 128, 51));
        // halfway between (0, 255, 0) and (255, 0, 0)
        assert_eq!(table.color_at(25.0), Rgb::new(128, 128, 0));
    }

    #[test]
    fn channels_are_monotonic_within_segments() {
        let table = temperature();
        let mut prev = table.color_at(0.0);
        let mut v = 0.0;
        while v <= 50.0 {
            let c = table.color_at(v);
            assert!(c.r >= prev.r, "red decreased at {v}");
            assert!(c.g <= prev.g, "green increased at {v}");
            assert_eq!(c.b, 0);
            prev = c;
            v += 0.25;
        }
    }

    #[test]
    fn diverging_uses_same_interpolation() {
        let points = vec![
            Breakpoint::new(-10.0, hex("#0000ff")),
            Breakpoint::new(0.0, hex("#ffffff")),
            Breakpoint::new(10.0, hex("#ff0000")),
        ];
        let div = RampTable::compile(
            &RampDefinition::new("d", RampKind::Diverging, points.clone()).unwrap(),
        );
        let grad =
            RampTable::compile(&RampDefinition::new("g", RampKind::Gradient, points).unwrap());
        for v in [-12.0, -10.0, -5.0, -0.1, 0.0, 3.3, 10.0, 11.0] {
            assert_eq!(div.color_at(v), grad.color_at(v));
        }
        assert_eq!(div.kind(), RampKind::Diverging);
    }

    #[test]
    fn nan_takes_lower_clamp() {
        assert_eq!(temperature().color_at(f64::NAN), hex("#1a0066"));
    }

    #[test]
    fn external_table_ends_with_no_data_row() {
        let table = temperature().to_external_table();
        let rows = table.rows();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].key, ReliefKey::Value(-40.0));
        assert_eq!(rows[0].alpha, 255);
        assert_eq!(rows[2].color, hex("#ff0000"));
        assert_eq!(
            rows[3],
            ReliefRow {
                key: ReliefKey::NoData,
                color: Rgb::BLACK,
                alpha: 0
            }
        );
    }

    #[test]
    fn color_relief_text_format() {
        let text = temperature().to_external_table().to_color_relief_text();
        let lines: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(
            lines,
            vec!["-40 26 0 102 255", "0 0 255 0 255", "50 255 0 0 255", "nv 0 0 0 0"]
        );
    }

    #[test]
    fn no_data_is_transparent_even_inside_domain() {
        let table = temperature().to_external_table();
        assert_eq!(table.rgba_for(0.0, Some(0.0)), [0, 0, 0, 0]);
        assert_eq!(table.rgba_for(-9999.0, Some(-9999.0)), [0, 0, 0, 0]);
        assert_eq!(table.rgba_for(f64::NAN, None), [0, 0, 0, 0]);
        assert_eq!(table.rgba_for(0.0, None), [0, 255, 0, 255]);
        assert_eq!(table.rgba_for(-9999.0, Some(0.0)), [26, 0, 102, 255]);
    }

    #[test]
    fn single_precision_sentinel_matches_declared_double() {
        let table = temperature().to_external_table();
        let stored = 9.999e20_f32 as f64;
        assert_ne!(stored, 9.999e20);
        assert_eq!(table.rgba_for(stored, Some(9.999e20)), [0, 0, 0, 0]);
        assert_eq!(table.rgba_for(-9999.0_f32 as f64, Some(-9999.0)), [0, 0, 0, 0]);
        // neighbours of the sentinel stay opaque
        assert_eq!(table.rgba_for(9.998e20, Some(9.999e20))[3], 255);
        assert_eq!(table.rgba_for(-9998.0, Some(-9999.0))[3], 255);
    }

    #[test]
    fn out_of_range_sentinel_does_not_swallow_large_values() {
        // 1e300 overflows f32; only exact matches count
        let table = temperature().to_external_table();
        assert_eq!(table.rgba_for(1e299, Some(1e300))[3], 255);
        assert_eq!(table.rgba_for(1e300, Some(1e300))[3], 0);
    }
}
