//! Color ramps for magnitude bins and the timelapse scale.

use serde::Serialize;

/// An 8-bit RGB color. Serializes as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    /// Build from fractional channels in `[0, 1]`; each channel becomes
    /// `round(fraction * 255)`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_fractional(rgb: [f64; 3]) -> Self {
        Self(rgb.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
    }

    #[must_use]
    pub fn r(self) -> u8 {
        self.0[0]
    }

    #[must_use]
    pub fn g(self) -> u8 {
        self.0[1]
    }

    #[must_use]
    pub fn b(self) -> u8 {
        self.0[2]
    }

    /// CSS hex notation, e.g. `#ffffcc`.
    #[must_use]
    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r(), self.g(), self.b())
    }
}

/// ColorBrewer YlOrRd (9 classes), light yellow to dark red.
const YL_OR_RD: [[f64; 3]; 9] = [
    [1.000, 1.000, 0.800],
    [1.000, 0.929_411_764_705_882_4, 0.627_450_980_392_156_9],
    [0.996_078_431_372_549, 0.850_980_392_156_862_8, 0.462_745_098_039_215_7],
    [0.996_078_431_372_549, 0.698_039_215_686_274_5, 0.298_039_215_686_274_5],
    [0.992_156_862_745_098, 0.552_941_176_470_588_2, 0.235_294_117_647_058_8],
    [0.988_235_294_117_647, 0.305_882_352_941_176_5, 0.164_705_882_352_941_2],
    [0.890_196_078_431_372_5, 0.101_960_784_313_725_5, 0.109_803_921_568_627_4],
    [0.741_176_470_588_235_3, 0.0, 0.149_019_607_843_137_25],
    [0.501_960_784_313_725_5, 0.0, 0.149_019_607_843_137_25],
];

/// Plasma-like continuous scale used for the timelapse.
const PLASMA: [[f64; 3]; 6] = [
    [0.050_980_392_156_862_75, 0.031_372_549_019_607_84, 0.529_411_764_705_882_4],
    [0.415_686_274_509_803_9, 0.0, 0.658_823_529_411_764_7],
    [0.694_117_647_058_823_5, 0.164_705_882_352_941_2, 0.564_705_882_352_941_2],
    [0.882_352_941_176_470_6, 0.392_156_862_745_098_04, 0.384_313_725_490_196_1],
    [0.988_235_294_117_647, 0.650_980_392_156_862_8, 0.211_764_705_882_352_94],
    [0.941_176_470_588_235_3, 0.976_470_588_235_294_1, 0.129_411_764_705_882_35],
];

/// Linearly interpolate a stop table at `t` in `[0, 1]`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn sample(stops: &[[f64; 3]], t: f64) -> [f64; 3] {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let last = stops.len() - 1;
    let pos = t * last as f64;
    let lower = (pos.floor() as usize).min(last);
    let upper = (lower + 1).min(last);
    let frac = pos - lower as f64;

    let (a, b) = (stops[lower], stops[upper]);
    [
        a[0] + (b[0] - a[0]) * frac,
        a[1] + (b[1] - a[1]) * frac,
        a[2] + (b[2] - a[2]) * frac,
    ]
}

/// `n` colors evenly spaced along the warm ramp, lightest first.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn warm_ramp(n: usize) -> Vec<Rgb> {
    match n {
        0 => Vec::new(),
        1 => vec![Rgb::from_fractional(YL_OR_RD[0])],
        _ => (0..n)
            .map(|i| Rgb::from_fractional(sample(&YL_OR_RD, i as f64 / (n - 1) as f64)))
            .collect(),
    }
}

/// Color for `value` on a continuous scale spanning `[lo, hi]`.
///
/// Values outside the span take the end colors.
#[must_use]
pub fn continuous(value: f64, lo: f64, hi: f64) -> Rgb {
    let t = if hi > lo { (value - lo) / (hi - lo) } else { 0.0 };
    Rgb::from_fractional(sample(&PLASMA, t))
}
