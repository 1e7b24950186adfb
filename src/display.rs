//! Display context and flush pipeline

use alloc::sync::Arc;
use embedded_hal::delay::DelayNs;
use spin::Mutex;

use crate::accel::{AccelStage, Accelerator, NoAccelerator};
use crate::buffer::{DrawBuffer, DrawBuffers, PoolBuffer};
use crate::color::ColorFormat;
use crate::config::{DisplayFlags, DisplayMode, RenderMode, Resolution, Rotation, RotationConfig};
use crate::error::Error;
use crate::interface::Panel;
use crate::rotation::remap_area;
use crate::sync::{Notifier, Signal};
use crate::transform::{MonoSource, pack_monochrome, swap_rgb565_bytes};

type DisplayResult<E> = core::result::Result<(), Error<E>>;

/// Half-open rectangle in pixels
///
/// Covers columns `x..x + w` and rows `y..y + h`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Area {
    /// Left column
    pub x: u16,
    /// Top row
    pub y: u16,
    /// Width in pixels
    pub w: u16,
    /// Height in pixels
    pub h: u16,
}

impl Area {
    /// Create a new area
    #[allow(clippy::many_single_char_names)]
    pub fn new(x: u16, y: u16, w: u16, h: u16) -> Self {
        Self { x, y, w, h }
    }

    /// First column past the area
    pub fn x_end(&self) -> u16 {
        self.x.saturating_add(self.w)
    }

    /// First row past the area
    pub fn y_end(&self) -> u16 {
        self.y.saturating_add(self.h)
    }

    /// Number of pixels covered
    pub fn pixel_count(&self) -> usize {
        self.w as usize * self.h as usize
    }

    /// Whether the area covers no pixel
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

/// One dirty region handed over by the graphics library
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlushRegion {
    /// Region in logical coordinates
    pub area: Area,
    /// Whether this is the last region of the frame
    pub last: bool,
}

impl FlushRegion {
    /// Region that also ends the frame
    pub fn last(area: Area) -> Self {
        Self { area, last: true }
    }
}

/// Transport family a display was added with
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportKind {
    /// SPI, I2C or I80 panel IO
    Serial,
    /// Parallel RGB with frame buffers
    FrameBuffered,
    /// MIPI-DSI
    HighSpeed,
}

/// Completion strategy of a transport
#[derive(Debug)]
pub(crate) enum Transport {
    /// Completion comes from the registered transfer-done handler
    Serial,
    /// Vsync or bounce-frame interrupts give `frame_done`
    FrameBuffered { frame_done: Arc<Signal> },
    /// Completion comes from the DPI transfer-done handler
    HighSpeed,
}

impl Transport {
    fn kind(&self) -> TransportKind {
        match self {
            Self::Serial => TransportKind::Serial,
            Self::FrameBuffered { .. } => TransportKind::FrameBuffered,
            Self::HighSpeed => TransportKind::HighSpeed,
        }
    }
}

/// State shared by the port and all its displays
#[derive(Debug, Default)]
pub(crate) struct Shared {
    /// Coarse lock around structural changes and panel submission
    pub(crate) lock: Mutex<()>,
    /// Wakes the render task
    pub(crate) wake: Arc<Signal>,
}

/// Everything but the draw buffers
///
/// Kept apart so a draw buffer can be flushed while the rest of the display
/// is borrowed mutably.
#[derive(Debug)]
pub(crate) struct Context<P: Panel, A: Accelerator> {
    pub(crate) panel: P,
    pub(crate) control: Option<P>,
    pub(crate) transport: Transport,
    pub(crate) rotation_config: RotationConfig,
    pub(crate) rotation: Rotation,
    pub(crate) resolution: Resolution,
    pub(crate) color_format: ColorFormat,
    pub(crate) flags: DisplayFlags,
    pub(crate) mode: DisplayMode,
    pub(crate) mono: Option<PoolBuffer>,
    pub(crate) accel: Option<AccelStage<A>>,
    pub(crate) flush_done: Arc<Signal>,
    pub(crate) shared: Arc<Shared>,
}

/// One display attached to a [`Port`](crate::Port)
///
/// Created by the `Port::add_display*` functions and handed back to
/// [`Port::remove_display`](crate::Port::remove_display) when done. The render
/// task calls [`flush`](Self::flush) once per dirty region and must not start
/// the next flush before [`is_flush_ready`](Self::is_flush_ready) reports the
/// previous one complete.
#[derive(Debug)]
pub struct Display<P: Panel, A: Accelerator = NoAccelerator> {
    pub(crate) buffers: DrawBuffers,
    pub(crate) ctx: Context<P, A>,
}

impl<P, A> Display<P, A>
where
    P: Panel,
    A: Accelerator,
{
    /// Transmit `pixels` for one dirty region
    ///
    /// `pixels` holds the region row by row; in direct and monochrome modes it
    /// is the whole screen buffer. It may be modified in place (byte swap).
    ///
    /// Blocks on the accelerator when one is used, and on the frame-done
    /// interrupt for the last region of a full or direct frame on parallel RGB
    /// transports. Neither wait has a timeout.
    pub fn flush<D: DelayNs>(
        &mut self,
        region: FlushRegion,
        pixels: &mut [u8],
        delay: &mut D,
    ) -> DisplayResult<P::Error> {
        self.ctx.flush(region, pixels, delay)
    }

    /// Transmit draw buffer `index` for one dirty region
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingBuffer`] if the display has no such buffer.
    pub fn flush_draw_buffer<D: DelayNs>(
        &mut self,
        index: usize,
        region: FlushRegion,
        delay: &mut D,
    ) -> DisplayResult<P::Error> {
        let buffer = self
            .buffers
            .get_mut(index)
            .ok_or(Error::MissingBuffer { index })?;
        self.ctx.flush(region, buffer, delay)
    }

    /// Change the logical rotation
    ///
    /// With an accelerator the new angle only takes effect on the next flush.
    /// Otherwise swap and mirror commands go out immediately. Wakes the render
    /// task either way.
    pub fn set_rotation(&mut self, rotation: Rotation) -> DisplayResult<P::Error> {
        log::debug!("Display rotation: {} degrees", rotation.degrees());
        self.ctx.rotation = rotation;
        self.ctx.apply_rotation()
    }

    /// Resolution-changed event from the graphics library
    ///
    /// Stores the new resolution for the following flushes and re-applies the
    /// rotation state.
    pub fn set_resolution(&mut self, resolution: Resolution) -> DisplayResult<P::Error> {
        log::debug!(
            "Display resolution: {}x{}",
            resolution.width,
            resolution.height
        );
        self.ctx.resolution = resolution;
        self.ctx.apply_rotation()
    }

    /// Invalidate-area or refresh-request event: wake the render task
    pub fn invalidate(&self) {
        self.ctx.shared.wake.give();
    }

    /// Report that the transport has finished with the current buffer
    ///
    /// Safe to call from interrupt context. Call it once per outstanding flush.
    pub fn notify_flush_complete(&self) {
        self.ctx.flush_done.give();
    }

    /// Handle that reports flush completion, for a transport's interrupt
    pub fn flush_notifier(&self) -> Notifier {
        Notifier::new(Arc::clone(&self.ctx.flush_done))
    }

    /// Whether the last flush has completed
    pub fn is_flush_ready(&self) -> bool {
        self.ctx.flush_done.is_set()
    }

    /// Block until the last flush has completed
    pub fn wait_flush_ready<D: DelayNs>(&self, delay: &mut D) {
        self.ctx.flush_done.wait(delay);
    }

    /// Render mode the graphics library must use
    pub fn render_mode(&self) -> RenderMode {
        self.ctx.mode.render_mode()
    }

    /// Display mode selected at creation
    pub fn display_mode(&self) -> DisplayMode {
        self.ctx.mode
    }

    /// Transport family
    pub fn transport_kind(&self) -> TransportKind {
        self.ctx.transport.kind()
    }

    /// Current logical rotation
    pub fn rotation(&self) -> Rotation {
        self.ctx.rotation
    }

    /// Current resolution
    pub fn resolution(&self) -> Resolution {
        self.ctx.resolution
    }

    /// Pixel layout of the draw buffers
    pub fn color_format(&self) -> ColorFormat {
        self.ctx.color_format
    }

    /// Whether flushes go through the accelerator
    pub fn uses_accelerator(&self) -> bool {
        self.ctx.accel.is_some()
    }

    /// Draw buffers
    pub fn buffers(&self) -> &DrawBuffers {
        &self.buffers
    }

    /// Mutable draw buffer `index`, for rendering into
    pub fn buffer_mut(&mut self, index: usize) -> Option<&mut DrawBuffer> {
        self.buffers.get_mut(index)
    }
}

impl<P, A> Context<P, A>
where
    P: Panel,
    A: Accelerator,
{
    pub(crate) fn apply_rotation(&mut self) -> DisplayResult<P::Error> {
        if self.accel.is_none() {
            let orientation = self.rotation_config.orientation(self.rotation);
            let target = self.control.as_mut().unwrap_or(&mut self.panel);
            target.swap_xy(orientation.swap_xy).map_err(Error::Panel)?;
            target
                .mirror(orientation.mirror_x, orientation.mirror_y)
                .map_err(Error::Panel)?;
        }
        self.shared.wake.give();
        Ok(())
    }

    fn flush<D: DelayNs>(
        &mut self,
        region: FlushRegion,
        pixels: &mut [u8],
        delay: &mut D,
    ) -> DisplayResult<P::Error> {
        let area = region.area;
        let required = area.pixel_count() * self.color_format.bytes_per_pixel();
        if pixels.len() < required {
            return Err(Error::BufferTooSmall {
                required,
                provided: pixels.len(),
            });
        }

        // Without an accelerator the panel rotates itself
        let device_rotation = if self.accel.is_some() {
            self.rotation
        } else {
            Rotation::Rotate0
        };
        let target = remap_area(area, device_rotation, self.resolution);

        let mut data: &[u8] = if let Some(stage) = self.accel.as_mut() {
            let shared = &self.shared;
            stage.run(
                &pixels[..required],
                (area.w, area.h),
                self.rotation,
                delay,
                |accelerator, job| {
                    let _guard = shared.lock.lock();
                    accelerator.scale_rotate_mirror(job)
                },
            )?
        } else {
            if self.flags.swap_bytes {
                swap_rgb565_bytes(&mut pixels[..required]);
            }
            match self.mode {
                DisplayMode::Direct | DisplayMode::Monochrome => &*pixels,
                DisplayMode::Partial | DisplayMode::Full => &pixels[..required],
            }
        };

        if self.mode == DisplayMode::Monochrome {
            if let Some(scratch) = self.mono.as_mut() {
                let source = MonoSource {
                    pixels: data,
                    format: self.color_format,
                    swapped: self.flags.swap_bytes,
                    resolution: self.resolution,
                };
                let len = pack_monochrome(source, area, self.rotation.swaps_axes(), scratch);
                data = &scratch[..len];
            }
        }

        self.flush_done.clear();
        match &self.transport {
            Transport::FrameBuffered { frame_done } if self.mode.waits_for_frame() => {
                if region.last {
                    {
                        let _guard = self.shared.lock.lock();
                        frame_done.clear();
                        self.panel.draw_bitmap(target, data).map_err(Error::Panel)?;
                    }
                    frame_done.wait(delay);
                }
            }
            _ => {
                let _guard = self.shared.lock.lock();
                self.panel.draw_bitmap(target, data).map_err(Error::Panel)?;
            }
        }

        if matches!(self.transport, Transport::FrameBuffered { .. }) {
            self.flush_done.give();
        }
        Ok(())
    }
}
