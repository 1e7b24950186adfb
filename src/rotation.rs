//! Rotation state and coordinate remapping
//!
//! A display can follow a logical [`Rotation`] in two ways:
//!
//! - **Panel commands**: the baseline [`RotationConfig`] and the requested
//!   rotation are combined into a [`PanelOrientation`] which is sent to the
//!   controller as swap-xy and mirror commands. Pixel data is untouched.
//! - **Accelerator**: the panel never rotates. Every flushed area is rotated
//!   by the accelerator and the rectangle is moved with [`remap_area`].
//!
//! ## Orientation Table
//!
//! | Rotation | swap_xy  | mirror_x (swap_xy off / on) | mirror_y (swap_xy off / on) |
//! |----------|----------|-----------------------------|-----------------------------|
//! | 0        | `s`      | `x` / `x`                   | `y` / `y`                   |
//! | 90       | `!s`     | `x` / `!x`                  | `!y` / `y`                  |
//! | 180      | `s`      | `!x` / `!x`                 | `!y` / `!y`                 |
//! | 270      | `!s`     | `!x` / `x`                  | `y` / `!y`                  |
//!
//! ## Example
//!
//! ```
//! use lcd_port::{rotation::remap_area, Area, Resolution, Rotation};
//!
//! let res = Resolution::new(320, 240);
//! let mapped = remap_area(Area::new(0, 0, 10, 10), Rotation::Rotate90, res);
//! assert_eq!((mapped.x, mapped.y), (0, 310));
//! ```

use crate::config::{Resolution, Rotation, RotationConfig};
use crate::display::Area;

/// Physical swap/mirror state sent to a panel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PanelOrientation {
    /// Exchange X and Y
    pub swap_xy: bool,
    /// Mirror along X
    pub mirror_x: bool,
    /// Mirror along Y
    pub mirror_y: bool,
}

impl RotationConfig {
    /// Combine the baseline mounting with a logical rotation
    ///
    /// For 90 and 270 degrees the mirror flag that toggles depends on whether
    /// the baseline already swaps the axes.
    pub fn orientation(&self, rotation: Rotation) -> PanelOrientation {
        let Self {
            swap_xy,
            mirror_x,
            mirror_y,
        } = *self;
        match rotation {
            Rotation::Rotate0 => PanelOrientation {
                swap_xy,
                mirror_x,
                mirror_y,
            },
            Rotation::Rotate90 => PanelOrientation {
                swap_xy: !swap_xy,
                mirror_x: if swap_xy { !mirror_x } else { mirror_x },
                mirror_y: if swap_xy { mirror_y } else { !mirror_y },
            },
            Rotation::Rotate180 => PanelOrientation {
                swap_xy,
                mirror_x: !mirror_x,
                mirror_y: !mirror_y,
            },
            Rotation::Rotate270 => PanelOrientation {
                swap_xy: !swap_xy,
                mirror_x: if swap_xy { mirror_x } else { !mirror_x },
                mirror_y: if swap_xy { !mirror_y } else { mirror_y },
            },
        }
    }
}

/// Move a flushed area to device coordinates
///
/// `resolution` is the resolution current at flush time. Coordinates that
/// would fall outside the screen saturate at zero.
///
/// - 0: identity
/// - 90: width and height swap, `x' = y`, `y' = hres - x`
/// - 180: both axes mirrored
/// - 270: width and height swap, `x' = vres - y`, `y' = x`
pub fn remap_area(area: Area, rotation: Rotation, resolution: Resolution) -> Area {
    let hres = resolution.width;
    let vres = resolution.height;
    match rotation {
        Rotation::Rotate0 => area,
        Rotation::Rotate90 => Area {
            x: area.y,
            y: hres.saturating_sub(area.x_end()),
            w: area.h,
            h: area.w,
        },
        Rotation::Rotate180 => Area {
            x: hres.saturating_sub(area.x_end()),
            y: vres.saturating_sub(area.y_end()),
            w: area.w,
            h: area.h,
        },
        Rotation::Rotate270 => Area {
            x: vres.saturating_sub(area.y_end()),
            y: area.x,
            w: area.h,
            h: area.w,
        },
    }
}
