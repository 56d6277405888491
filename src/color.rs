//! Linear RGBA colors.
//!
//! All colors handed to the GPU are in linear space. Hex literals are treated
//! as sRGB and converted on construction; HSL values are taken as already
//! linear, which is how the box palette has always been produced.

/// RGBA color in linear space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

    /// Creates a color from a `0xRRGGBB` sRGB literal.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
        Self::rgb(channel(16), channel(8), channel(0))
    }

    /// Creates a color from hue, saturation and lightness.
    ///
    /// Hue wraps into `[0, 1)` (so `-0.2` is the same hue as `0.8`);
    /// saturation and lightness are clamped to `[0, 1]`.
    pub fn from_hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        let h = wrap_hue(hue);
        let s = saturation.clamp(0.0, 1.0);
        let l = lightness.clamp(0.0, 1.0);

        if s == 0.0 {
            return Self::rgb(l, l, l);
        }

        let high = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let low = 2.0 * l - high;

        Self::rgb(
            hue_to_channel(low, high, h + 1.0 / 3.0),
            hue_to_channel(low, high, h),
            hue_to_channel(low, high, h - 1.0 / 3.0),
        )
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Wraps a hue into `[0, 1)`.
pub fn wrap_hue(hue: f32) -> f32 {
    let wrapped = hue.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

fn hue_to_channel(low: f32, high: f32, t: f32) -> f32 {
    let t = if t < 0.0 {
        t + 1.0
    } else if t > 1.0 {
        t - 1.0
    } else {
        t
    };

    if t < 1.0 / 6.0 {
        low + (high - low) * 6.0 * t
    } else if t < 0.5 {
        high
    } else if t < 2.0 / 3.0 {
        low + (high - low) * 6.0 * (2.0 / 3.0 - t)
    } else {
        low
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.0773993808
    } else {
        (c * 0.9478672986 + 0.0521327014).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Color, b: Color) -> bool {
        (a.r - b.r).abs() < 1e-5 && (a.g - b.g).abs() < 1e-5 && (a.b - b.b).abs() < 1e-5
    }

    #[test]
    fn hsl_primaries() {
        assert!(approx(Color::from_hsl(0.0, 1.0, 0.5), Color::rgb(1.0, 0.0, 0.0)));
        assert!(approx(Color::from_hsl(1.0 / 3.0, 1.0, 0.5), Color::rgb(0.0, 1.0, 0.0)));
        assert!(approx(Color::from_hsl(2.0 / 3.0, 1.0, 0.5), Color::rgb(0.0, 0.0, 1.0)));
    }

    #[test]
    fn hsl_hue_wraps() {
        assert!(approx(Color::from_hsl(-0.2, 1.0, 0.5), Color::from_hsl(0.8, 1.0, 0.5)));
        assert!(approx(Color::from_hsl(1.25, 1.0, 0.5), Color::from_hsl(0.25, 1.0, 0.5)));
    }

    #[test]
    fn hsl_zero_saturation_is_grey() {
        assert_eq!(Color::from_hsl(0.4, 0.0, 0.3), Color::rgb(0.3, 0.3, 0.3));
    }

    #[test]
    fn hsl_violet() {
        // 0.7 is the hue of the first box on the path
        let c = Color::from_hsl(0.7, 1.0, 0.5);
        assert!(approx(c, Color::rgb(0.2, 0.0, 1.0)));
    }

    #[test]
    fn wrap_hue_stays_in_range() {
        assert_eq!(wrap_hue(0.0), 0.0);
        assert!((wrap_hue(-0.29) - 0.71).abs() < 1e-6);
        assert!(wrap_hue(-1e-9) < 1.0);
    }

    #[test]
    fn hex_is_linearized() {
        let white = Color::from_hex(0xffffff);
        assert!(approx(white, Color::WHITE));
        let black = Color::from_hex(0x000000);
        assert!(approx(black, Color::BLACK));
        // mid grey in sRGB is darker in linear space
        let grey = Color::from_hex(0x808080);
        assert!(grey.r > 0.2 && grey.r < 0.23);
    }
}
