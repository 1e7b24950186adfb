//! LCD Port for Retained-Mode GUI Displays
//!
//! Moves rendered regions from a GUI library's draw buffers to LCD panels,
//! keeping rotation state and buffer ownership in step with the hardware.
//!
//! ## Features
//!
//! - `no_std` compatible (requires `alloc`)
//! - `embedded-hal` v1.0 delays for blocking waits
//! - `embedded-graphics` draw target over draw buffers (with `graphics` feature)
//! - Generic serial, parallel RGB and MIPI-DSI transports
//! - Partial, full, direct and monochrome render modes
//! - Rotation by panel commands or by a scale/rotate/mirror accelerator
//! - Interrupt-safe completion signalling on `embassy-sync` (needs a
//!   `critical-section` implementation on the target)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lcd_port::sync::Notifier;
//! use lcd_port::{
//!     Area, Builder, FlushRegion, Panel, PanelHandles, PanelIo, Port, Resolution, Rotation,
//!     RotationConfig,
//! };
//! # use core::convert::Infallible;
//! # use embedded_hal::delay::DelayNs;
//! # struct SpiPanel;
//! # impl Panel for SpiPanel {
//! #     type Error = Infallible;
//! #     fn draw_bitmap(&mut self, _a: Area, _p: &[u8]) -> Result<(), Infallible> { Ok(()) }
//! #     fn swap_xy(&mut self, _s: bool) -> Result<(), Infallible> { Ok(()) }
//! #     fn mirror(&mut self, _x: bool, _y: bool) -> Result<(), Infallible> { Ok(()) }
//! # }
//! # struct SpiIo;
//! # impl PanelIo for SpiIo { fn register_color_done(&mut self, _h: Notifier) {} }
//! # struct MockDelay;
//! # impl DelayNs for MockDelay { fn delay_ns(&mut self, _ns: u32) {} }
//! # let mut delay = MockDelay;
//! # let mut io = SpiIo;
//! let port = Port::new();
//! let config = match Builder::new()
//!     .resolution(Resolution::new(320, 240))
//!     .buffer_size(320 * 24)
//!     .double_buffer(true)
//!     .swap_bytes(true)
//!     .rotation(RotationConfig {
//!         swap_xy: false,
//!         mirror_x: true,
//!         mirror_y: false,
//!     })
//!     .build()
//! {
//!     Ok(config) => config,
//!     Err(_) => return,
//! };
//!
//! let mut display = match port.add_display(&config, PanelHandles::new(SpiPanel), &mut io) {
//!     Ok(display) => display,
//!     Err(_) => return,
//! };
//! let _ = display.set_rotation(Rotation::Rotate90);
//!
//! // Render task
//! loop {
//!     if port.take_wake() {
//!         // run the GUI library timer, which renders into the draw buffers
//!     }
//!     let region = FlushRegion::last(Area::new(0, 0, 320, 24));
//!     let _ = display.flush_draw_buffer(0, region, &mut delay);
//!     display.wait_flush_ready(&mut delay);
//! }
//! ```

#![no_std]

extern crate alloc;

/// Scale/rotate/mirror accelerator stage
pub mod accel;
/// Draw buffer allocation and validation
pub mod buffer;
/// Color formats of the draw buffers
pub mod color;
/// Display configuration types and builder
pub mod config;
/// Display context and flush pipeline
pub mod display;
/// Error types for the port
pub mod error;
/// Hardware interface abstraction
pub mod interface;
/// Adding and removing displays
pub mod port;
/// Rotation state and coordinate remapping
pub mod rotation;
/// Completion signalling between interrupts and the render task
pub mod sync;
/// Software pixel transforms
pub mod transform;

/// Graphics support via embedded-graphics (requires `graphics` feature)
#[cfg(feature = "graphics")]
pub mod graphics;

pub use accel::{Accelerator, AcceleratorError, NoAccelerator, SrmJob};
pub use buffer::{DrawBuffer, DrawBuffers, MemoryPool, SystemPool};
pub use color::ColorFormat;
pub use config::{
    Builder, Config, DisplayFlags, DisplayMode, DsiConfig, MemoryCaps, PanelHandles, RenderMode,
    Resolution, RgbConfig, Rotation, RotationConfig,
};
pub use display::{Area, Display, FlushRegion, TransportKind};
pub use error::{ConfigError, Error, ErrorKind};
pub use interface::{DpiPanel, Panel, PanelIo, RgbPanel};
pub use port::{Port, Released};
pub use rotation::PanelOrientation;

#[cfg(feature = "graphics")]
pub use graphics::Rgb565Canvas;
