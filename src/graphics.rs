//! Graphics support via embedded-graphics
//!
//! This module provides [`Rgb565Canvas`], which implements the
//! [`DrawTarget`](embedded_graphics_core::draw_target::DrawTarget) trait over
//! one flush region of a draw buffer, and conversions between [`Area`] and
//! [`Rectangle`].
//!
//! ## Example
//!
//! ```
//! use embedded_graphics::{
//!     pixelcolor::Rgb565,
//!     prelude::*,
//!     primitives::{PrimitiveStyle, Rectangle},
//! };
//! use lcd_port::{Area, graphics::Rgb565Canvas};
//!
//! let area = Area::new(0, 0, 32, 8);
//! let mut buffer = [0u8; 32 * 8 * 2];
//! let mut canvas = match Rgb565Canvas::new(&mut buffer, area) {
//!     Some(canvas) => canvas,
//!     None => return,
//! };
//!
//! let _ = Rectangle::new(Point::new(4, 2), Size::new(8, 4))
//!     .into_styled(PrimitiveStyle::with_fill(Rgb565::RED))
//!     .draw(&mut canvas);
//! ```

use core::convert::Infallible;
use core::num::TryFromIntError;
use embedded_graphics_core::{
    draw_target::DrawTarget,
    geometry::{Dimensions, Point, Size},
    pixelcolor::{IntoStorage, Rgb565},
    prelude::Pixel,
    primitives::Rectangle,
};

use crate::display::Area;

impl From<Area> for Rectangle {
    fn from(area: Area) -> Self {
        Rectangle::new(
            Point::new(area.x as i32, area.y as i32),
            Size::new(area.w as u32, area.h as u32),
        )
    }
}

impl TryFrom<Rectangle> for Area {
    type Error = TryFromIntError;

    /// Fails when the rectangle starts at a negative coordinate or does not
    /// fit in 16 bits
    fn try_from(rect: Rectangle) -> Result<Self, Self::Error> {
        Ok(Area {
            x: u16::try_from(rect.top_left.x)?,
            y: u16::try_from(rect.top_left.y)?,
            w: u16::try_from(rect.size.width)?,
            h: u16::try_from(rect.size.height)?,
        })
    }
}

/// RGB565 draw target over one flush region
///
/// Coordinates are screen coordinates. Pixels outside `area` are dropped.
/// Pixels are stored little-endian, row by row, the layout
/// [`Display::flush`](crate::Display::flush) expects.
#[derive(Debug)]
pub struct Rgb565Canvas<'a> {
    buffer: &'a mut [u8],
    area: Area,
}

impl<'a> Rgb565Canvas<'a> {
    /// Bytes per pixel
    const BPP: usize = 2;

    /// Canvas for `area` backed by `buffer`
    ///
    /// Returns `None` if `buffer` cannot hold the whole area.
    pub fn new(buffer: &'a mut [u8], area: Area) -> Option<Self> {
        if buffer.len() < area.pixel_count() * Self::BPP {
            return None;
        }
        Some(Self { buffer, area })
    }

    /// Region this canvas covers
    pub fn area(&self) -> Area {
        self.area
    }

    fn offset(&self, point: Point) -> Option<usize> {
        let x = u16::try_from(point.x).ok()?;
        let y = u16::try_from(point.y).ok()?;
        if x < self.area.x || x >= self.area.x_end() || y < self.area.y || y >= self.area.y_end() {
            return None;
        }
        let col = (x - self.area.x) as usize;
        let row = (y - self.area.y) as usize;
        Some((row * self.area.w as usize + col) * Self::BPP)
    }
}

impl Dimensions for Rgb565Canvas<'_> {
    fn bounding_box(&self) -> Rectangle {
        self.area.into()
    }
}

impl DrawTarget for Rgb565Canvas<'_> {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some(offset) = self.offset(point) {
                let raw: u16 = color.into_storage();
                self.buffer[offset..offset + Self::BPP].copy_from_slice(&raw.to_le_bytes());
            }
        }
        Ok(())
    }
}
