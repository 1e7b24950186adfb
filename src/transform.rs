//! Software pixel transforms applied before transmission
//!
//! ## Monochrome Packing
//!
//! Monochrome panels take 1 bit per pixel, 8 pixels per byte, packed
//! vertically: bit `y % 8` of byte `stride * (y / 8) + x`. When the display is
//! rotated by 90 or 270 degrees the axes are exchanged before packing, so the
//! packed rows follow the axis that is vertical on the device.
//!
//! A pixel is light when its blue channel exceeds [`MONO_THRESHOLD`]. Light
//! pixels clear their bit, dark pixels set it.
//!
//! ## Example
//!
//! ```
//! use lcd_port::transform::swap_rgb565_bytes;
//!
//! let mut pixels = [0x12, 0x34, 0x56, 0x78];
//! swap_rgb565_bytes(&mut pixels);
//! assert_eq!(pixels, [0x34, 0x12, 0x78, 0x56]);
//! ```

use crate::color::ColorFormat;
use crate::config::Resolution;
use crate::display::Area;

/// Blue channel level above which a pixel is light
pub const MONO_THRESHOLD: u8 = 16;

/// Exchange the two bytes of every RGB565 pixel in place
///
/// A trailing odd byte is left untouched.
pub fn swap_rgb565_bytes(pixels: &mut [u8]) {
    for pixel in pixels.chunks_exact_mut(2) {
        pixel.swap(0, 1);
    }
}

/// Bytes needed to hold a packed monochrome screen in either orientation
pub fn mono_buffer_len(resolution: Resolution) -> usize {
    let w = resolution.width as usize;
    let h = resolution.height as usize;
    (w * h.div_ceil(8)).max(h * w.div_ceil(8))
}

/// Source pixels for [`pack_monochrome`]
#[derive(Clone, Copy, Debug)]
pub struct MonoSource<'a> {
    /// Rendered pixels, one full screen row of `resolution.width` per line
    pub pixels: &'a [u8],
    /// Layout of `pixels`
    pub format: ColorFormat,
    /// Whether RGB565 bytes were already swapped
    pub swapped: bool,
    /// Physical resolution
    pub resolution: Resolution,
}

/// Pack `area` of `src` into `out`, 1 bit per pixel, vertically
///
/// `swap_xy` exchanges the axes before packing. Returns the number of bytes
/// of `out` that make up the packed screen. Pixels or bytes outside the given
/// slices are skipped.
pub fn pack_monochrome(src: MonoSource<'_>, area: Area, swap_xy: bool, out: &mut [u8]) -> usize {
    let hor_res = src.resolution.width as usize;
    let ver_res = src.resolution.height as usize;
    let bpp = src.format.bytes_per_pixel();
    let stride = if swap_xy { ver_res } else { hor_res };

    for y in area.y as usize..area.y_end() as usize {
        for x in area.x as usize..area.x_end() as usize {
            let offset = (hor_res * y + x) * bpp;
            let Some(pixel) = src.pixels.get(offset..offset + bpp) else {
                continue;
            };
            let light = src.format.blue(pixel, src.swapped) > MONO_THRESHOLD;

            let (out_x, out_y) = if swap_xy { (y, x) } else { (x, y) };
            let Some(byte) = out.get_mut(stride * (out_y >> 3) + out_x) else {
                continue;
            };
            let bit = 1u8 << (out_y % 8);
            if light {
                *byte &= !bit;
            } else {
                *byte |= bit;
            }
        }
    }

    let (packed_w, packed_h) = if swap_xy {
        (ver_res, hor_res)
    } else {
        (hor_res, ver_res)
    };
    (packed_w * packed_h.div_ceil(8)).min(out.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    /// Whether the packed pixel at (`x`, `y`) is dark
    fn mono_pixel(packed: &[u8], stride: usize, x: usize, y: usize) -> bool {
        packed
            .get(stride * (y >> 3) + x)
            .is_some_and(|byte| byte & (1 << (y % 8)) != 0)
    }

    const WHITE: [u8; 2] = 0xFFFFu16.to_le_bytes();
    const BLACK: [u8; 2] = 0x0000u16.to_le_bytes();

    fn checkerboard(res: Resolution) -> alloc::vec::Vec<u8> {
        let mut pixels = vec![0u8; res.pixel_count() * 2];
        for y in 0..res.height as usize {
            for x in 0..res.width as usize {
                let color = if (x / 3 + y) % 2 == 0 { WHITE } else { BLACK };
                let offset = (y * res.width as usize + x) * 2;
                pixels[offset..offset + 2].copy_from_slice(&color);
            }
        }
        pixels
    }

    #[test]
    fn test_swap_leaves_odd_byte() {
        let mut pixels = [1, 2, 3];
        swap_rgb565_bytes(&mut pixels);
        assert_eq!(pixels, [2, 1, 3]);
    }

    #[test]
    fn test_mono_buffer_len_covers_both_orientations() {
        // 20 x 12: 20 * 2 = 40 upright, 12 * 3 = 36 swapped
        assert_eq!(mono_buffer_len(Resolution::new(20, 12)), 40);
        assert_eq!(mono_buffer_len(Resolution::new(12, 20)), 40);
    }

    #[test]
    fn test_pack_single_column() {
        let res = Resolution::new(1, 8);
        let mut pixels = vec![0u8; 16];
        // rows 0 and 3 white, the rest black
        pixels[0..2].copy_from_slice(&WHITE);
        pixels[6..8].copy_from_slice(&WHITE);
        let src = MonoSource {
            pixels: &pixels,
            format: ColorFormat::Rgb565,
            swapped: false,
            resolution: res,
        };
        let mut out = [0u8; 1];
        let len = pack_monochrome(src, Area::new(0, 0, 1, 8), false, &mut out);
        assert_eq!(len, 1);
        assert_eq!(out[0], 0b1111_0110);
    }

    #[test]
    fn test_pack_unpack_round_trip() {
        let res = Resolution::new(24, 16);
        let pixels = checkerboard(res);
        let src = MonoSource {
            pixels: &pixels,
            format: ColorFormat::Rgb565,
            swapped: false,
            resolution: res,
        };
        let mut out = vec![0u8; mono_buffer_len(res)];
        let len = pack_monochrome(src, Area::new(0, 0, 24, 16), false, &mut out);
        assert_eq!(len, 24 * 2);

        for y in 0..16 {
            for x in 0..24 {
                let dark = (x / 3 + y) % 2 != 0;
                assert_eq!(mono_pixel(&out, 24, x, y), dark, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_pack_swapped_axes_round_trip() {
        let res = Resolution::new(16, 8);
        let pixels = checkerboard(res);
        let src = MonoSource {
            pixels: &pixels,
            format: ColorFormat::Rgb565,
            swapped: false,
            resolution: res,
        };
        let mut out = vec![0xAAu8; mono_buffer_len(res)];
        let len = pack_monochrome(src, Area::new(0, 0, 16, 8), true, &mut out);
        assert_eq!(len, 8 * 2);

        for y in 0..8 {
            for x in 0..16 {
                let dark = (x / 3 + y) % 2 != 0;
                // packed with axes exchanged
                assert_eq!(mono_pixel(&out, 8, y, x), dark, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_pack_rgb888_threshold() {
        let res = Resolution::new(2, 1);
        // blue 16 is not above the threshold, blue 17 is
        let pixels = [16, 0, 0, 17, 0, 0];
        let src = MonoSource {
            pixels: &pixels,
            format: ColorFormat::Rgb888,
            swapped: false,
            resolution: res,
        };
        let mut out = [0u8; 2];
        pack_monochrome(src, Area::new(0, 0, 2, 1), false, &mut out);
        assert_eq!(out, [0x01, 0x00]);
    }
}
