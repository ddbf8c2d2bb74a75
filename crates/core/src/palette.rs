use std::collections::BTreeMap;

use loupe_protocol::{Color, ColorSample};

/// Hue rotations (degrees) of the harmony palette, applied to the base
/// color in order: analogous pair, triadic pair, complement.
const HARMONY_ROTATIONS: [f64; 5] = [30.0, -30.0, 120.0, -120.0, 180.0];

/// Tone stops of the material ramp. 500 is the base color; lower stops mix
/// toward white, higher ones toward black.
const MATERIAL_STOPS: [u16; 10] = [50, 100, 200, 300, 400, 500, 600, 700, 800, 900];

/// Derive the full color sample for one sampled pixel.
///
/// Pure and deterministic: identical inputs yield bit-identical palettes,
/// which is what lets the session key recomputation off RGB string equality.
pub fn derive(color: Color) -> ColorSample {
    let base = Hsl::from_color(color);

    let mut harmony = Vec::with_capacity(1 + HARMONY_ROTATIONS.len());
    harmony.push(color.to_hex());
    for rotation in HARMONY_ROTATIONS {
        harmony.push(base.rotate(rotation).to_color().to_hex());
    }

    let mut material = BTreeMap::new();
    for stop in MATERIAL_STOPS {
        material.insert(stop, base.tone(stop).to_color().to_hex());
    }

    ColorSample {
        rgb: color.to_css(),
        contrast: color.contrast_color().to_hex(),
        harmony,
        material,
    }
}

/// Hue/saturation/lightness working space for the palette math.
/// `h` in degrees `[0, 360)`, `s` and `l` in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Hsl {
    h: f64,
    s: f64,
    l: f64,
}

impl Hsl {
    fn from_color(color: Color) -> Self {
        let r = f64::from(color.r) / 255.0;
        let g = f64::from(color.g) / 255.0;
        let b = f64::from(color.b) / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        let delta = max - min;

        if delta == 0.0 {
            return Self { h: 0.0, s: 0.0, l };
        }

        let s = if l > 0.5 {
            delta / (2.0 - max - min)
        } else {
            delta / (max + min)
        };
        let h = if max == r {
            60.0 * (((g - b) / delta).rem_euclid(6.0))
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };
        Self { h, s, l }
    }

    fn to_color(self) -> Color {
        let c = (1.0 - (2.0 * self.l - 1.0).abs()) * self.s;
        let hp = self.h.rem_euclid(360.0) / 60.0;
        let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
        let (r1, g1, b1) = match hp as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = self.l - c / 2.0;
        let to_u8 = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Color::rgb(to_u8(r1), to_u8(g1), to_u8(b1))
    }

    fn rotate(self, degrees: f64) -> Self {
        Self {
            h: (self.h + degrees).rem_euclid(360.0),
            ..self
        }
    }

    /// Material tone: mix the lightness toward white below the 500 stop and
    /// toward black above it, with a perceptual (non-linear) weight so the
    /// light end doesn't wash out and the dark end doesn't crush.
    fn tone(self, stop: u16) -> Self {
        match stop.cmp(&500) {
            std::cmp::Ordering::Equal => self,
            std::cmp::Ordering::Less => {
                let f = f64::from(500 - stop) / 450.0;
                Self {
                    l: self.l + (1.0 - self.l) * f.powf(0.75) * 0.92,
                    ..self
                }
            }
            std::cmp::Ordering::Greater => {
                let f = f64::from(stop - 500) / 400.0;
                Self {
                    l: self.l * (1.0 - f.powf(1.25) * 0.85),
                    ..self
                }
            }
        }
    }
}
