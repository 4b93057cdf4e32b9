//! Color representation and component math for the color built-ins.
//! Colors travel through expressions as `"r,g,b"` / `"r,g,b,a"` strings.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

fn channel(value: f64) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

impl Color {
    #[must_use]
    pub fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Parse the `"r,g,b"` / `"r,g,b,a"` wire form.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let parts: Vec<&str> = text.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return None;
        }
        let mut components = [0_u8; 4];
        components[3] = 255;
        for (slot, part) in components.iter_mut().zip(&parts) {
            *slot = part.parse::<u8>().ok()?;
        }
        Some(Self::new(
            components[0],
            components[1],
            components[2],
            components[3],
        ))
    }

    #[must_use]
    pub fn encode_rgb(&self) -> String {
        format!("{},{},{}", self.red, self.green, self.blue)
    }

    #[must_use]
    pub fn encode_rgba(&self) -> String {
        format!("{},{},{},{}", self.red, self.green, self.blue, self.alpha)
    }

    /// Hue 0..360, saturation and lightness 0..1.
    #[must_use]
    pub fn from_hsl(hue: f64, saturation: f64, lightness: f64, alpha: u8) -> Self {
        let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
        let (red, green, blue) = hue_to_rgb(hue, c, lightness - c / 2.0);
        Self::new(red, green, blue, alpha)
    }

    /// Hue 0..360, saturation and value 0..1.
    #[must_use]
    pub fn from_hsv(hue: f64, saturation: f64, value: f64, alpha: u8) -> Self {
        let c = value * saturation;
        let (red, green, blue) = hue_to_rgb(hue, c, value - c);
        Self::new(red, green, blue, alpha)
    }

    /// All components 0..1.
    #[must_use]
    pub fn from_cmyk(cyan: f64, magenta: f64, yellow: f64, black: f64, alpha: u8) -> Self {
        Self::new(
            channel((1.0 - cyan) * (1.0 - black)),
            channel((1.0 - magenta) * (1.0 - black)),
            channel((1.0 - yellow) * (1.0 - black)),
            alpha,
        )
    }

    /// (hue 0..360, saturation 0..1, value 0..1)
    #[must_use]
    pub fn to_hsv(&self) -> (f64, f64, f64) {
        let (max, min, hue) = self.hue_extents();
        let saturation = if max == 0.0 { 0.0 } else { (max - min) / max };
        (hue, saturation, max)
    }

    /// (hue 0..360, saturation 0..1, lightness 0..1)
    #[must_use]
    pub fn to_hsl(&self) -> (f64, f64, f64) {
        let (max, min, hue) = self.hue_extents();
        let lightness = (max + min) / 2.0;
        let delta = max - min;
        let saturation = if delta == 0.0 {
            0.0
        } else {
            delta / (1.0 - (2.0 * lightness - 1.0).abs())
        };
        (hue, saturation, lightness)
    }

    fn hue_extents(&self) -> (f64, f64, f64) {
        let red = f64::from(self.red) / 255.0;
        let green = f64::from(self.green) / 255.0;
        let blue = f64::from(self.blue) / 255.0;
        let max = red.max(green).max(blue);
        let min = red.min(green).min(blue);
        let delta = max - min;

        let hue = if delta == 0.0 {
            0.0
        } else if max == red {
            60.0 * (((green - blue) / delta).rem_euclid(6.0))
        } else if max == green {
            60.0 * ((blue - red) / delta + 2.0)
        } else {
            60.0 * ((red - green) / delta + 4.0)
        };
        (max, min, hue)
    }
}

fn hue_to_rgb(hue: f64, c: f64, m: f64) -> (u8, u8, u8) {
    let sector = (hue.rem_euclid(360.0)) / 60.0;
    let x = c * (1.0 - (sector.rem_euclid(2.0) - 1.0).abs());
    let (red, green, blue) = match sector as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    (channel(red + m), channel(green + m), channel(blue + m))
}
