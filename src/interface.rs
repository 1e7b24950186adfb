//! Hardware interface abstraction
//!
//! This module provides the traits a display is driven through. The port never
//! touches registers; every transport is reached through one of these seams.
//!
//! ## Transport Families
//!
//! - **Generic serial** (SPI, I2C, I80): a [`Panel`] receiving bitmaps plus a
//!   [`PanelIo`] raising an interrupt once a transfer has left the buffer.
//! - **Parallel RGB**: an [`RgbPanel`] with its own frame buffers, raising
//!   vsync or bounce-buffer frame-finish interrupts.
//! - **MIPI-DSI**: a [`DpiPanel`] raising a color-transfer-done interrupt.
//!
//! Every completion source is handed a [`Notifier`]. Implementations call
//! [`Notifier::notify`] from their interrupt handler and do nothing else there.
//!
//! ## Example
//!
//! ```rust,no_run
//! use lcd_port::{Area, Panel, PanelIo};
//! use lcd_port::sync::Notifier;
//! # use core::convert::Infallible;
//!
//! struct SpiPanel;
//!
//! impl Panel for SpiPanel {
//!     type Error = Infallible;
//!
//!     fn draw_bitmap(&mut self, area: Area, pixels: &[u8]) -> Result<(), Self::Error> {
//!         // Set the column/row window from `area`, start DMA from `pixels`
//!         let _ = (area, pixels);
//!         Ok(())
//!     }
//!
//!     fn swap_xy(&mut self, _swap: bool) -> Result<(), Self::Error> {
//!         Ok(())
//!     }
//!
//!     fn mirror(&mut self, _mirror_x: bool, _mirror_y: bool) -> Result<(), Self::Error> {
//!         Ok(())
//!     }
//! }
//!
//! struct SpiIo {
//!     on_done: Option<Notifier>,
//! }
//!
//! impl PanelIo for SpiIo {
//!     fn register_color_done(&mut self, handler: Notifier) {
//!         // The DMA-done interrupt calls `handler.notify()`
//!         self.on_done = Some(handler);
//!     }
//! }
//! ```

use core::fmt::Debug;

use crate::display::Area;
use crate::sync::Notifier;

type PanelResult<T, E> = core::result::Result<T, E>;

/// Panel controller receiving pixel data and orientation commands
///
/// ## Implementing
///
/// `draw_bitmap` may start an asynchronous transfer and return before the
/// hardware has read `pixels`. The caller does not reuse the buffer until the
/// transport's completion [`Notifier`] has fired.
pub trait Panel {
    /// Error type for panel operations
    ///
    /// Must implement [`Debug`] for error reporting.
    type Error: Debug;

    /// Transmit `pixels` into the half-open rectangle `area`
    ///
    /// `pixels` holds `area.w * area.h` pixels row by row, or a packed
    /// monochrome screen on 1 bit per pixel panels.
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer cannot be started.
    fn draw_bitmap(&mut self, area: Area, pixels: &[u8]) -> PanelResult<(), Self::Error>;

    /// Exchange the X and Y axes
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    fn swap_xy(&mut self, swap: bool) -> PanelResult<(), Self::Error>;

    /// Mirror along either axis
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    fn mirror(&mut self, mirror_x: bool, mirror_y: bool) -> PanelResult<(), Self::Error>;
}

/// Panel IO of a generic serial transport
pub trait PanelIo {
    /// Call `handler` when a color transfer has finished reading its buffer
    fn register_color_done(&mut self, handler: Notifier);
}

/// Parallel RGB panel scanning out of its own frame buffers
pub trait RgbPanel: Panel {
    /// The panel's two frame buffers
    ///
    /// Used as draw buffers when tearing avoidance is on. The panel keeps
    /// ownership; the slices must each cover the whole screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the panel was not created with two frame buffers.
    fn frame_buffers(
        &mut self,
    ) -> PanelResult<(&'static mut [u8], &'static mut [u8]), Self::Error>;

    /// Call `handler` on every vertical sync
    ///
    /// # Errors
    ///
    /// Returns an error if the callback cannot be registered.
    fn register_vsync(&mut self, handler: Notifier) -> PanelResult<(), Self::Error>;

    /// Call `handler` when a bounce-buffer frame has finished
    ///
    /// # Errors
    ///
    /// Returns an error if the callback cannot be registered.
    fn register_bounce_frame_finish(&mut self, handler: Notifier) -> PanelResult<(), Self::Error>;
}

/// MIPI-DSI panel on the DPI interface
pub trait DpiPanel: Panel {
    /// Call `handler` when a color transfer has finished reading its buffer
    ///
    /// # Errors
    ///
    /// Returns an error if the callback cannot be registered.
    fn register_color_done(&mut self, handler: Notifier) -> PanelResult<(), Self::Error>;
}

impl<T: Panel + ?Sized> Panel for &mut T {
    type Error = T::Error;

    fn draw_bitmap(&mut self, area: Area, pixels: &[u8]) -> PanelResult<(), Self::Error> {
        T::draw_bitmap(self, area, pixels)
    }

    fn swap_xy(&mut self, swap: bool) -> PanelResult<(), Self::Error> {
        T::swap_xy(self, swap)
    }

    fn mirror(&mut self, mirror_x: bool, mirror_y: bool) -> PanelResult<(), Self::Error> {
        T::mirror(self, mirror_x, mirror_y)
    }
}

impl<T: PanelIo + ?Sized> PanelIo for &mut T {
    fn register_color_done(&mut self, handler: Notifier) {
        T::register_color_done(self, handler);
    }
}

impl<T: RgbPanel + ?Sized> RgbPanel for &mut T {
    fn frame_buffers(
        &mut self,
    ) -> PanelResult<(&'static mut [u8], &'static mut [u8]), Self::Error> {
        T::frame_buffers(self)
    }

    fn register_vsync(&mut self, handler: Notifier) -> PanelResult<(), Self::Error> {
        T::register_vsync(self, handler)
    }

    fn register_bounce_frame_finish(&mut self, handler: Notifier) -> PanelResult<(), Self::Error> {
        T::register_bounce_frame_finish(self, handler)
    }
}

impl<T: DpiPanel + ?Sized> DpiPanel for &mut T {
    fn register_color_done(&mut self, handler: Notifier) -> PanelResult<(), Self::Error> {
        T::register_color_done(self, handler)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    //! Mock transports shared by the display and port tests

    use super::*;
    use alloc::boxed::Box;
    use alloc::sync::Arc;
    use alloc::vec::Vec;
    use spin::Mutex;

    /// Something a mock panel was asked to do
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub(crate) enum Event {
        Draw { area: Area, len: usize, first: u8 },
        SwapXy(bool),
        Mirror(bool, bool),
        /// The test thread observed a completion
        Completed,
    }

    /// Shared, ordered record of panel events
    pub(crate) type Log = Arc<Mutex<Vec<(u8, Event)>>>;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub(crate) struct MockError;

    /// Panel recording every call, tagged with its id
    #[derive(Debug)]
    pub(crate) struct MockPanel {
        pub(crate) id: u8,
        pub(crate) log: Log,
        pub(crate) fail_draw: bool,
        pub(crate) frames: Option<(&'static mut [u8], &'static mut [u8])>,
        pub(crate) vsync: Option<Notifier>,
        pub(crate) bounce: Option<Notifier>,
        pub(crate) color_done: Option<Notifier>,
        /// Notify the completion handler as soon as a draw is issued
        pub(crate) complete_on_draw: bool,
    }

    impl MockPanel {
        pub(crate) fn new(id: u8, log: &Log) -> Self {
            Self {
                id,
                log: Arc::clone(log),
                fail_draw: false,
                frames: None,
                vsync: None,
                bounce: None,
                color_done: None,
                complete_on_draw: false,
            }
        }

        /// Give the panel two leaked frame buffers of `bytes` each
        pub(crate) fn with_frames(mut self, bytes: usize) -> Self {
            let first = Box::leak(alloc::vec![0u8; bytes].into_boxed_slice());
            let second = Box::leak(alloc::vec![0u8; bytes].into_boxed_slice());
            self.frames = Some((first, second));
            self
        }

        pub(crate) fn events(log: &Log, id: u8) -> Vec<Event> {
            log.lock()
                .iter()
                .filter(|(panel, _)| *panel == id)
                .map(|(_, event)| event.clone())
                .collect()
        }

        fn record(&self, event: Event) {
            self.log.lock().push((self.id, event));
        }
    }

    impl Panel for MockPanel {
        type Error = MockError;

        fn draw_bitmap(&mut self, area: Area, pixels: &[u8]) -> PanelResult<(), Self::Error> {
            if self.fail_draw {
                return Err(MockError);
            }
            self.record(Event::Draw {
                area,
                len: pixels.len(),
                first: pixels.first().copied().unwrap_or_default(),
            });
            if self.complete_on_draw {
                if let Some(done) = &self.color_done {
                    done.notify();
                }
            }
            Ok(())
        }

        fn swap_xy(&mut self, swap: bool) -> PanelResult<(), Self::Error> {
            self.record(Event::SwapXy(swap));
            Ok(())
        }

        fn mirror(&mut self, mirror_x: bool, mirror_y: bool) -> PanelResult<(), Self::Error> {
            self.record(Event::Mirror(mirror_x, mirror_y));
            Ok(())
        }
    }

    impl RgbPanel for MockPanel {
        fn frame_buffers(
            &mut self,
        ) -> PanelResult<(&'static mut [u8], &'static mut [u8]), Self::Error> {
            self.frames.take().ok_or(MockError)
        }

        fn register_vsync(&mut self, handler: Notifier) -> PanelResult<(), Self::Error> {
            self.vsync = Some(handler);
            Ok(())
        }

        fn register_bounce_frame_finish(
            &mut self,
            handler: Notifier,
        ) -> PanelResult<(), Self::Error> {
            self.bounce = Some(handler);
            Ok(())
        }
    }

    impl DpiPanel for MockPanel {
        fn register_color_done(&mut self, handler: Notifier) -> PanelResult<(), Self::Error> {
            self.color_done = Some(handler);
            Ok(())
        }
    }

    /// Panel IO keeping the registered handler for the test to fire
    #[derive(Debug, Default)]
    pub(crate) struct MockIo {
        pub(crate) handler: Option<Notifier>,
    }

    impl MockIo {
        /// Simulate the transfer-done interrupt
        pub(crate) fn fire(&self) -> bool {
            self.handler.as_ref().is_some_and(Notifier::notify)
        }
    }

    impl PanelIo for MockIo {
        fn register_color_done(&mut self, handler: Notifier) {
            self.handler = Some(handler);
        }
    }
}
