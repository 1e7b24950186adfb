//! Color formats of the draw buffers
//!
//! This module defines the [`ColorFormat`] enum describing how the graphics
//! library lays out pixels in a draw buffer.
//!
//! ## Supported Formats
//!
//! Only four formats can be pushed to a panel by this port:
//!
//! | Format     | Bytes/pixel | Byte order in memory |
//! |------------|-------------|----------------------|
//! | `Rgb565`   | 2           | little-endian `u16`  |
//! | `Rgb888`   | 3           | B, G, R              |
//! | `Xrgb8888` | 4           | B, G, R, X           |
//! | `Argb8888` | 4           | B, G, R, A           |
//!
//! The remaining variants exist because the graphics library knows them;
//! requesting one of them fails when the display is added.
//!
//! ## Example
//!
//! ```
//! use lcd_port::ColorFormat;
//!
//! assert_eq!(ColorFormat::default(), ColorFormat::Rgb565);
//! assert_eq!(ColorFormat::Rgb888.bytes_per_pixel(), 3);
//! assert!(!ColorFormat::L8.is_supported());
//! ```

/// Pixel layout of a draw buffer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorFormat {
    /// 16-bit RGB (5-6-5)
    #[default]
    Rgb565,
    /// 24-bit RGB
    Rgb888,
    /// 32-bit RGB with an unused byte
    Xrgb8888,
    /// 32-bit RGB with alpha
    Argb8888,
    /// 8-bit luminance
    L8,
    /// 8-bit alpha only
    A8,
    /// 1-bit indexed
    I1,
}

impl ColorFormat {
    /// Whether pixels in this format can be transmitted by the port
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            Self::Rgb565 | Self::Rgb888 | Self::Xrgb8888 | Self::Argb8888
        )
    }

    /// Bits per pixel
    pub fn bits_per_pixel(self) -> usize {
        match self {
            Self::Rgb565 => 16,
            Self::Rgb888 => 24,
            Self::Xrgb8888 | Self::Argb8888 => 32,
            Self::L8 | Self::A8 => 8,
            Self::I1 => 1,
        }
    }

    /// Bytes per pixel, rounded up
    pub fn bytes_per_pixel(self) -> usize {
        self.bits_per_pixel().div_ceil(8)
    }

    /// Extract the blue channel of one pixel, scaled to 8 bits
    ///
    /// `swapped` tells whether an RGB565 pixel has already had its two bytes
    /// exchanged for the panel. Returns 0 if `pixel` is shorter than one pixel.
    pub fn blue(self, pixel: &[u8], swapped: bool) -> u8 {
        match self {
            Self::Rgb565 => {
                let [a, b] = match pixel {
                    [a, b, ..] => [*a, *b],
                    _ => return 0,
                };
                let raw = if swapped {
                    u16::from_be_bytes([a, b])
                } else {
                    u16::from_le_bytes([a, b])
                };
                ((raw & 0x1F) << 3) as u8
            }
            Self::Rgb888 | Self::Xrgb8888 | Self::Argb8888 | Self::L8 => {
                pixel.first().copied().unwrap_or(0)
            }
            Self::A8 | Self::I1 => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_true_color_formats_supported() {
        assert!(ColorFormat::Rgb565.is_supported());
        assert!(ColorFormat::Rgb888.is_supported());
        assert!(ColorFormat::Xrgb8888.is_supported());
        assert!(ColorFormat::Argb8888.is_supported());
        assert!(!ColorFormat::L8.is_supported());
        assert!(!ColorFormat::A8.is_supported());
        assert!(!ColorFormat::I1.is_supported());
    }

    #[test]
    fn test_bytes_per_pixel() {
        assert_eq!(ColorFormat::Rgb565.bytes_per_pixel(), 2);
        assert_eq!(ColorFormat::Rgb888.bytes_per_pixel(), 3);
        assert_eq!(ColorFormat::Argb8888.bytes_per_pixel(), 4);
        assert_eq!(ColorFormat::I1.bytes_per_pixel(), 1);
    }

    #[test]
    fn test_rgb565_blue_channel() {
        // 0x001F is pure blue
        assert_eq!(ColorFormat::Rgb565.blue(&[0x1F, 0x00], false), 0xF8);
        assert_eq!(ColorFormat::Rgb565.blue(&[0x00, 0x1F], true), 0xF8);
        // 0xF800 is pure red
        assert_eq!(ColorFormat::Rgb565.blue(&[0x00, 0xF8], false), 0);
    }

    #[test]
    fn test_rgb888_blue_is_first_byte() {
        assert_eq!(ColorFormat::Rgb888.blue(&[0x40, 0x00, 0xFF], false), 0x40);
        assert_eq!(ColorFormat::Argb8888.blue(&[0x80, 1, 2, 3], false), 0x80);
    }

    #[test]
    fn test_blue_short_pixel_is_zero() {
        assert_eq!(ColorFormat::Rgb565.blue(&[0x1F], false), 0);
        assert_eq!(ColorFormat::Rgb888.blue(&[], false), 0);
    }
}
