//! Adjustment filters: a closed table keyed by stable identifiers.
//!
//! Each adjustment maps a slider value (what the user drags) to the
//! parameter stored on the image (what the renderer applies), and back.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustKind {
    Brightness,
    Contrast,
    Saturation,
    Vibrance,
    Blur,
    Hue,
}

/// One adjustment as stored on an image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppliedFilter {
    pub filter: AdjustKind,
    /// Renderer parameter (not the slider value).
    pub value: f64,
}

/// Static description of an adjustment control.
#[derive(Debug)]
pub struct AdjustSpec {
    pub kind: AdjustKind,
    pub key: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
    pub suffix: &'static str,
    to_param: fn(f64) -> f64,
    from_param: fn(f64) -> f64,
}

fn percent(v: f64) -> f64 {
    v / 100.0
}

fn from_percent(p: f64) -> f64 {
    (p * 100.0).round()
}

fn degrees(v: f64) -> f64 {
    v.to_radians()
}

fn from_radians(p: f64) -> f64 {
    p.to_degrees().round()
}

const fn signed(kind: AdjustKind, key: &'static str, label: &'static str) -> AdjustSpec {
    AdjustSpec {
        kind,
        key,
        label,
        min: -100.0,
        max: 100.0,
        step: 1.0,
        default: 0.0,
        suffix: "",
        to_param: percent,
        from_param: from_percent,
    }
}

pub static ADJUST_FILTERS: [AdjustSpec; 6] = [
    signed(AdjustKind::Brightness, "brightness", "Brightness"),
    signed(AdjustKind::Contrast, "contrast", "Contrast"),
    signed(AdjustKind::Saturation, "saturation", "Saturation"),
    signed(AdjustKind::Vibrance, "vibrance", "Vibrance"),
    AdjustSpec {
        kind: AdjustKind::Blur,
        key: "blur",
        label: "Blur",
        min: 0.0,
        max: 100.0,
        step: 1.0,
        default: 0.0,
        suffix: "",
        to_param: percent,
        from_param: from_percent,
    },
    AdjustSpec {
        kind: AdjustKind::Hue,
        key: "hue",
        label: "Hue",
        min: -180.0,
        max: 180.0,
        step: 1.0,
        default: 0.0,
        suffix: "°",
        to_param: degrees,
        from_param: from_radians,
    },
];

impl AdjustKind {
    pub const ALL: [AdjustKind; 6] = [
        AdjustKind::Brightness,
        AdjustKind::Contrast,
        AdjustKind::Saturation,
        AdjustKind::Vibrance,
        AdjustKind::Blur,
        AdjustKind::Hue,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn spec(self) -> &'static AdjustSpec {
        &ADJUST_FILTERS[self.index()]
    }

    pub fn from_key(key: &str) -> Option<Self> {
        ADJUST_FILTERS.iter().find(|s| s.key == key).map(|s| s.kind)
    }
}

impl AdjustSpec {
    /// Clamp a slider value into range and snap it to the step.
    pub fn clamp(&self, value: f64) -> f64 {
        let snapped = (value / self.step).round() * self.step;
        snapped.clamp(self.min, self.max)
    }

    pub fn to_param(&self, value: f64) -> f64 {
        (self.to_param)(value)
    }

    pub fn from_param(&self, param: f64) -> f64 {
        (self.from_param)(param)
    }

    /// Slider label, e.g. `-20` or `45°`.
    pub fn format(&self, value: f64) -> String {
        format!("{}{}", value, self.suffix)
    }
}

/// Slider values for every adjustment of one image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustValues([f64; 6]);

impl Default for AdjustValues {
    fn default() -> Self {
        AdjustValues(ADJUST_FILTERS.each_ref().map(|s| s.default))
    }
}

impl AdjustValues {
    pub fn get(&self, kind: AdjustKind) -> f64 {
        self.0[kind.index()]
    }

    /// Set a slider value, clamped to its range. Returns the stored value.
    pub fn set(&mut self, kind: AdjustKind, value: f64) -> f64 {
        let v = kind.spec().clamp(value);
        self.0[kind.index()] = v;
        v
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Filters to store on the image. Neutral adjustments are omitted.
    pub fn to_filters(&self) -> SmallVec<[AppliedFilter; 4]> {
        ADJUST_FILTERS
            .iter()
            .filter(|s| self.get(s.kind) != s.default)
            .map(|s| AppliedFilter {
                filter: s.kind,
                value: s.to_param(self.get(s.kind)),
            })
            .collect()
    }

    /// Recover slider values from filters already applied to an image.
    pub fn from_filters(filters: &[AppliedFilter]) -> Self {
        let mut values = Self::default();
        for f in filters {
            let spec = f.filter.spec();
            values.0[f.filter.index()] = spec.clamp(spec.from_param(f.value));
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_indexed_by_kind() {
        for kind in AdjustKind::ALL {
            assert_eq!(kind.spec().kind, kind);
            assert_eq!(AdjustKind::from_key(kind.spec().key), Some(kind));
        }
        assert_eq!(AdjustKind::from_key("sepia"), None);
    }

    #[test]
    fn values_clamp_to_range() {
        let mut v = AdjustValues::default();
        assert_eq!(v.set(AdjustKind::Brightness, 150.0), 100.0);
        assert_eq!(v.set(AdjustKind::Blur, -3.0), 0.0);
        assert_eq!(v.set(AdjustKind::Hue, 45.4), 45.0);
    }

    #[test]
    fn neutral_values_emit_no_filters() {
        assert!(AdjustValues::default().to_filters().is_empty());
    }

    #[test]
    fn filters_recover_slider_values() {
        let mut v = AdjustValues::default();
        v.set(AdjustKind::Contrast, -20.0);
        v.set(AdjustKind::Hue, 90.0);
        let filters = v.to_filters();
        assert_eq!(filters.len(), 2);
        assert!((filters[0].value + 0.2).abs() < 1e-12);
        assert!((filters[1].value - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert_eq!(AdjustValues::from_filters(&filters), v);
    }

    #[test]
    fn hue_label_has_degree_suffix() {
        assert_eq!(AdjustKind::Hue.spec().format(30.0), "30°");
        assert_eq!(AdjustKind::Blur.spec().format(5.0), "5");
    }
}
