//! Hex/HSL color conversion and bounded color variation.
//!
//! Scatter-field shapes get a fill derived from the decoration color by
//! jittering lightness and saturation while keeping the hue, so a field reads
//! as one tonal family.

use rand::Rng;

/// Maximum absolute lightness change applied by [`vary_color`].
pub const LIGHTNESS_JITTER: f64 = 0.2;

/// Maximum absolute saturation change applied by [`vary_color`].
pub const SATURATION_JITTER: f64 = 0.1;

/// Lightness is kept inside this band after jitter.
pub const LIGHTNESS_BOUNDS: (f64, f64) = (0.1, 0.9);

/// A color in HSL space. `h` is in degrees `[0, 360)`, `s` and `l` in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    /// Hue in degrees.
    pub h: f64,
    /// Saturation.
    pub s: f64,
    /// Lightness.
    pub l: f64,
}

/// Offsets applied to a color's saturation and lightness.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorJitter {
    /// Added to lightness before clamping.
    pub lightness: f64,
    /// Added to saturation before clamping.
    pub saturation: f64,
}

impl ColorJitter {
    /// Draw a jitter within the configured bands.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            lightness: rng.random_range(-LIGHTNESS_JITTER..=LIGHTNESS_JITTER),
            saturation: rng.random_range(-SATURATION_JITTER..=SATURATION_JITTER),
        }
    }
}

/// Parse a six digit hex color into RGB channels.
#[must_use]
pub fn hex_to_rgb(hex: &str) -> Option<[u8; 3]> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// Whether `hex` is a six digit hex color (with or without `#`).
#[must_use]
pub fn is_valid_hex(hex: &str) -> bool {
    hex_to_rgb(hex).is_some()
}

/// Convert a six digit hex color to HSL.
///
/// Returns `None` for malformed input; callers keep the original color.
#[must_use]
#[allow(clippy::float_cmp, clippy::many_single_char_names)]
pub fn hex_to_hsl(hex: &str) -> Option<Hsl> {
    let [r, g, b] = hex_to_rgb(hex)?.map(|c| f64::from(c) / 255.0);

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        return Some(Hsl { h: 0.0, s: 0.0, l });
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    Some(Hsl { h: h * 60.0, s, l })
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

/// Convert HSL to a lowercase `#rrggbb` string.
#[must_use]
#[allow(clippy::float_cmp, clippy::many_single_char_names)]
pub fn hsl_to_hex(hsl: Hsl) -> String {
    let h = hsl.h / 360.0;
    let (r, g, b) = if hsl.s == 0.0 {
        (hsl.l, hsl.l, hsl.l)
    } else {
        let q = if hsl.l < 0.5 {
            hsl.l * (1.0 + hsl.s)
        } else {
            hsl.l + hsl.s - hsl.l * hsl.s
        };
        let p = 2.0 * hsl.l - q;
        (
            hue_to_rgb(p, q, h + 1.0 / 3.0),
            hue_to_rgb(p, q, h),
            hue_to_rgb(p, q, h - 1.0 / 3.0),
        )
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let to_byte = |x: f64| (x.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("#{:02x}{:02x}{:02x}", to_byte(r), to_byte(g), to_byte(b))
}

/// Apply a fixed jitter to a color.
///
/// Lightness is clamped to [`LIGHTNESS_BOUNDS`] and saturation to `[0, 1]`.
/// Malformed input is returned unchanged.
#[must_use]
pub fn jitter_color(hex: &str, jitter: ColorJitter) -> String {
    let Some(mut hsl) = hex_to_hsl(hex) else {
        return hex.to_string();
    };
    hsl.l = (hsl.l + jitter.lightness).clamp(LIGHTNESS_BOUNDS.0, LIGHTNESS_BOUNDS.1);
    hsl.s = (hsl.s + jitter.saturation).clamp(0.0, 1.0);
    hsl_to_hex(hsl)
}

/// Produce a random variation of `hex` using the supplied random source.
pub fn vary_color<R: Rng + ?Sized>(hex: &str, rng: &mut R) -> String {
    jitter_color(hex, ColorJitter::sample(rng))
}

/// Case-insensitive comparison of two hex colors, ignoring a leading `#`.
#[must_use]
pub fn same_color(a: &str, b: &str) -> bool {
    let a = a.trim().trim_start_matches('#');
    let b = b.trim().trim_start_matches('#');
    a.eq_ignore_ascii_case(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_hex_to_hsl_primaries() {
        let red = hex_to_hsl("#ff0000").expect("valid");
        assert!((red.h - 0.0).abs() < 1e-9);
        assert!((red.s - 1.0).abs() < 1e-9);
        assert!((red.l - 0.5).abs() < 1e-9);

        let blue = hex_to_hsl("0000FF").expect("valid without hash");
        assert!((blue.h - 240.0).abs() < 1e-9);
    }

    #[test]
    fn test_hex_to_hsl_rejects_malformed() {
        assert!(hex_to_hsl("#fff").is_none());
        assert!(hex_to_hsl("#gg0000").is_none());
        assert!(hex_to_hsl("").is_none());
        assert!(hex_to_hsl("#1234567").is_none());
        assert!(hex_to_hsl("rgb(0,0,0)").is_none());
    }

    #[test]
    fn test_hex_round_trip_is_exact() {
        for r in (0..=255u16).step_by(17) {
            for g in (0..=255u16).step_by(51) {
                for b in (0..=255u16).step_by(15) {
                    let hex = format!("#{r:02x}{g:02x}{b:02x}");
                    let hsl = hex_to_hsl(&hex).expect("valid");
                    assert_eq!(hsl_to_hex(hsl), hex);
                }
            }
        }
    }

    #[test]
    fn test_hsl_round_trip_within_tolerance() {
        let samples = [
            Hsl { h: 210.0, s: 0.5, l: 0.4 },
            Hsl { h: 12.5, s: 0.8, l: 0.6 },
            Hsl { h: 300.0, s: 0.3, l: 0.5 },
        ];
        for hsl in samples {
            let back = hex_to_hsl(&hsl_to_hex(hsl)).expect("valid");
            assert!((back.h - hsl.h).abs() < 2.0, "hue {back:?} vs {hsl:?}");
            assert!((back.s - hsl.s).abs() < 0.02, "sat {back:?} vs {hsl:?}");
            assert!((back.l - hsl.l).abs() < 0.01, "light {back:?} vs {hsl:?}");
        }
    }

    #[test]
    fn test_jitter_clamps_lightness() {
        let out = jitter_color(
            "#ffffff",
            ColorJitter {
                lightness: 0.2,
                saturation: 0.0,
            },
        );
        let hsl = hex_to_hsl(&out).expect("valid");
        assert!(hsl.l <= LIGHTNESS_BOUNDS.1 + 0.005);
    }

    #[test]
    fn test_jitter_malformed_returns_input() {
        let jitter = ColorJitter {
            lightness: 0.1,
            saturation: 0.1,
        };
        assert_eq!(jitter_color("not-a-color", jitter), "not-a-color");
    }

    #[test]
    fn test_vary_color_is_deterministic_for_seed() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        assert_eq!(vary_color("#64B5F6", &mut a), vary_color("#64B5F6", &mut b));
    }

    #[test]
    fn test_vary_color_stays_within_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let base = hex_to_hsl("#64B5F6").expect("valid");
        for _ in 0..500 {
            let out = vary_color("#64B5F6", &mut rng);
            assert!(is_valid_hex(&out), "{out}");
            let hsl = hex_to_hsl(&out).expect("valid");
            assert!((hsl.l - base.l).abs() <= LIGHTNESS_JITTER + 0.01);
            assert!(hsl.l >= LIGHTNESS_BOUNDS.0 - 0.005);
            assert!(hsl.l <= LIGHTNESS_BOUNDS.1 + 0.005);
            assert!((hsl.s - base.s).abs() <= SATURATION_JITTER + 0.05);
            assert!((hsl.h - base.h).abs() < 5.0);
        }
    }

    #[test]
    fn test_same_color_ignores_case_and_hash() {
        assert!(same_color("#FFFFFF", "#ffffff"));
        assert!(same_color("ffffff", "#FFFFFF"));
        assert!(!same_color("#FFFFFF", "#FFFFFE"));
    }
}
