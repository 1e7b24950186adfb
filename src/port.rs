//! Adding and removing displays
//!
//! A [`Port`] owns the coarse lock and the render-task wake signal shared by
//! all of its displays, plus the [`MemoryPool`] their buffers come from.
//! Adding a display validates the configuration, allocates its buffers,
//! registers its completion handlers and applies the initial rotation, all
//! under the lock. If any step fails, everything done so far is released and
//! the error is returned.
//!
//! ## Example
//!
//! ```rust,no_run
//! use lcd_port::sync::Notifier;
//! use lcd_port::{Area, Builder, FlushRegion, Panel, PanelHandles, PanelIo, Port, Resolution};
//! # use core::convert::Infallible;
//! # use embedded_hal::delay::DelayNs;
//! # struct MockPanel;
//! # impl Panel for MockPanel {
//! #     type Error = Infallible;
//! #     fn draw_bitmap(&mut self, _a: Area, _p: &[u8]) -> Result<(), Infallible> { Ok(()) }
//! #     fn swap_xy(&mut self, _s: bool) -> Result<(), Infallible> { Ok(()) }
//! #     fn mirror(&mut self, _x: bool, _y: bool) -> Result<(), Infallible> { Ok(()) }
//! # }
//! # struct MockIo;
//! # impl PanelIo for MockIo { fn register_color_done(&mut self, _h: Notifier) {} }
//! # struct MockDelay;
//! # impl DelayNs for MockDelay { fn delay_ns(&mut self, _ns: u32) {} }
//! # let mut delay = MockDelay;
//! let port = Port::new();
//! let config = match Builder::new()
//!     .resolution(Resolution::new(320, 240))
//!     .buffer_size(320 * 24)
//!     .build()
//! {
//!     Ok(config) => config,
//!     Err(_) => return,
//! };
//!
//! let mut io = MockIo;
//! let mut display = match port.add_display(&config, PanelHandles::new(MockPanel), &mut io) {
//!     Ok(display) => display,
//!     Err(_) => return,
//! };
//!
//! let region = FlushRegion::last(Area::new(0, 0, 320, 24));
//! let _ = display.flush_draw_buffer(0, region, &mut delay);
//! display.wait_flush_ready(&mut delay);
//!
//! let _released = port.remove_display(display);
//! ```

use alloc::sync::Arc;

use crate::accel::{AccelStage, Accelerator, NoAccelerator};
use crate::buffer::{self, DrawBuffers, MemoryPool, PoolBuffer, SystemPool};
use crate::config::{Config, DsiConfig, MemoryCaps, PanelHandles, RgbConfig, Rotation};
use crate::display::{Context, Display, Shared, Transport};
use crate::error::{ConfigError, Error};
use crate::interface::{DpiPanel, Panel, PanelIo, RgbPanel};
use crate::sync::{Notifier, Signal};
use crate::transform::mono_buffer_len;

type PortResult<P, A, E> = core::result::Result<Display<P, A>, Error<E>>;

/// Panel handles and accelerator handed back by [`Port::remove_display`]
#[derive(Debug)]
pub struct Released<P, A = NoAccelerator> {
    /// Panel that received pixel data
    pub panel: P,
    /// Panel that received rotation commands, if distinct
    pub control: Option<P>,
    /// Unregistered accelerator client
    pub accelerator: Option<A>,
}

/// Owner of the shared lock, the render-task wake signal and the memory pool
#[derive(Clone)]
pub struct Port {
    shared: Arc<Shared>,
    pool: Arc<dyn MemoryPool>,
}

impl Default for Port {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Port {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Port")
            .field("shared", &self.shared)
            .finish_non_exhaustive()
    }
}

impl Port {
    /// Port allocating from the global allocator
    pub fn new() -> Self {
        Self::with_pool(Arc::new(SystemPool))
    }

    /// Port allocating from `pool`
    pub fn with_pool(pool: Arc<dyn MemoryPool>) -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            pool,
        }
    }

    /// Signal given whenever the render task should run
    pub fn wake_signal(&self) -> Arc<Signal> {
        Arc::clone(&self.shared.wake)
    }

    /// Consume a pending wake-up
    ///
    /// The render loop calls this to decide whether to run the graphics
    /// library timer now instead of after its normal period.
    pub fn take_wake(&self) -> bool {
        self.shared.wake.try_take()
    }

    /// Wake the render task
    pub fn wake(&self) {
        self.shared.wake.give();
    }

    /// Add a display on a generic serial transport (SPI, I2C, I80)
    ///
    /// Flush completion is reported from `io`'s transfer-done interrupt.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is rejected or memory
    /// runs out, and [`Error::Panel`] if the initial rotation cannot be set.
    pub fn add_display<P, IO>(
        &self,
        config: &Config,
        handles: PanelHandles<P>,
        io: &mut IO,
    ) -> PortResult<P, NoAccelerator, P::Error>
    where
        P: Panel,
        IO: PanelIo + ?Sized,
    {
        let _guard = self.shared.lock.lock();
        let buffer_size = buffer::validate(config, false)?;
        let buffers = self.allocate_buffers(config, buffer_size)?;
        let mut display = self.assemble(config, handles, buffers, Transport::Serial, None)?;

        io.register_color_done(display.flush_notifier());
        display.ctx.apply_rotation()?;
        log::info!("Display added on serial transport");
        Ok(display)
    }

    /// Add a display on a parallel RGB transport
    ///
    /// With `avoid_tearing` the panel's two frame buffers become the draw
    /// buffers. Vsync (or bounce-frame finish) interrupts release blocked
    /// full and direct flushes and wake the render task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is rejected or memory
    /// runs out, [`Error::BufferTooSmall`] if a frame buffer does not cover
    /// the screen, and [`Error::Panel`] if the panel refuses a request.
    pub fn add_display_rgb<P>(
        &self,
        config: &Config,
        mut handles: PanelHandles<P>,
        rgb: &RgbConfig,
    ) -> PortResult<P, NoAccelerator, P::Error>
    where
        P: RgbPanel,
    {
        let _guard = self.shared.lock.lock();
        let buffer_size = buffer::validate(config, rgb.avoid_tearing)?;

        let buffers = if rgb.avoid_tearing {
            let (first, second) = handles.panel.frame_buffers().map_err(|e| {
                log::error!("Get RGB buffers failed");
                Error::Panel(e)
            })?;
            let required = buffer::byte_len(buffer_size, config.color_format)?;
            let provided = first.len().min(second.len());
            if provided < required {
                log::error!("RGB frame buffers do not cover the screen");
                return Err(Error::BufferTooSmall { required, provided });
            }
            log::debug!("Using RGB frame buffers as draw buffers");
            DrawBuffers::borrowed(first, second)
        } else {
            self.allocate_buffers(config, buffer_size)?
        };

        let frame_done = Arc::new(Signal::new());
        let on_frame =
            Notifier::new(Arc::clone(&frame_done)).with_wake(Arc::clone(&self.shared.wake));
        if rgb.bounce_buffer_mode {
            handles
                .panel
                .register_bounce_frame_finish(on_frame)
                .map_err(Error::Panel)?;
        } else {
            handles.panel.register_vsync(on_frame).map_err(Error::Panel)?;
        }

        let transport = Transport::FrameBuffered { frame_done };
        let mut display = self.assemble(config, handles, buffers, transport, None)?;
        display.ctx.apply_rotation()?;
        log::info!("Display added on RGB transport");
        Ok(display)
    }

    /// Add a display on a MIPI-DSI transport
    ///
    /// Flush completion is reported from the panel's transfer-done interrupt.
    /// When `dsi.use_accelerator` is set every flush is rotated by the given
    /// accelerator and the panel never receives rotation commands.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is rejected, memory runs
    /// out or the accelerator is missing or cannot be registered, and
    /// [`Error::Panel`] if the panel refuses a request.
    pub fn add_display_dsi<P, A>(
        &self,
        config: &Config,
        handles: PanelHandles<P>,
        dsi: DsiConfig<A>,
    ) -> PortResult<P, A, P::Error>
    where
        P: DpiPanel,
        A: Accelerator,
    {
        let _guard = self.shared.lock.lock();
        let buffer_size = buffer::validate(config, false)?;
        let buffers = self.allocate_buffers(config, buffer_size)?;

        let accel = if dsi.use_accelerator {
            let Some(accelerator) = dsi.accelerator else {
                let e = ConfigError::AcceleratorUnavailable;
                log::error!("{e}");
                return Err(e.into());
            };
            Some(AccelStage::new(
                accelerator,
                &self.pool,
                buffer_size,
                config.color_format,
                config.flags.swap_bytes,
            )?)
        } else {
            None
        };

        let mut display = self.assemble(config, handles, buffers, Transport::HighSpeed, accel)?;
        let notifier = display.flush_notifier();
        display
            .ctx
            .panel
            .register_color_done(notifier)
            .map_err(Error::Panel)?;
        display.ctx.apply_rotation()?;
        log::info!("Display added on MIPI-DSI transport");
        Ok(display)
    }

    /// Remove a display and release its resources
    ///
    /// Buffers go back to the pool first, then the accelerator is
    /// unregistered. The panel handles and the accelerator are handed back.
    pub fn remove_display<P, A>(&self, display: Display<P, A>) -> Released<P, A>
    where
        P: Panel,
        A: Accelerator,
    {
        let _guard = self.shared.lock.lock();
        let Display { buffers, ctx } = display;
        drop(buffers);

        let Context {
            panel,
            control,
            accel,
            mono,
            ..
        } = ctx;
        drop(mono);
        let accelerator = accel.and_then(AccelStage::release);
        log::info!("Display removed");

        Released {
            panel,
            control,
            accelerator,
        }
    }

    fn allocate_buffers(
        &self,
        config: &Config,
        buffer_size: usize,
    ) -> Result<DrawBuffers, ConfigError> {
        let bytes = buffer::byte_len(buffer_size, config.color_format).inspect_err(|_| {
            log::error!("Draw buffer of {buffer_size} pixels does not fit in memory!");
        })?;
        log::debug!(
            "Allocating {} draw buffer(s) of {bytes} bytes",
            if config.double_buffer { 2 } else { 1 }
        );
        DrawBuffers::allocate(&self.pool, bytes, config.memory, config.double_buffer)
    }

    fn assemble<P, A>(
        &self,
        config: &Config,
        handles: PanelHandles<P>,
        buffers: DrawBuffers,
        transport: Transport,
        accel: Option<AccelStage<A>>,
    ) -> PortResult<P, A, P::Error>
    where
        P: Panel,
        A: Accelerator,
    {
        let mode = config.display_mode();
        let mono = if config.flags.monochrome {
            let bytes = mono_buffer_len(config.resolution);
            Some(
                PoolBuffer::allocate(&self.pool, bytes, MemoryCaps::default()).inspect_err(|_| {
                    log::error!("Not enough memory for monochrome buffer allocation!");
                })?,
            )
        } else {
            None
        };

        Ok(Display {
            buffers,
            ctx: Context {
                panel: handles.panel,
                control: handles.control,
                transport,
                rotation_config: config.rotation,
                rotation: Rotation::Rotate0,
                resolution: config.resolution,
                color_format: config.color_format,
                flags: config.flags,
                mode,
                mono,
                accel,
                flush_done: Arc::new(Signal::new()),
                shared: Arc::clone(&self.shared),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::tests::SoftAccelerator;
    use crate::buffer::tests::CountingPool;
    use crate::color::ColorFormat;
    use crate::config::{Builder, RenderMode, Resolution, RotationConfig};
    use crate::display::{Area, FlushRegion};
    use crate::error::ErrorKind;
    use crate::interface::tests::{Event, Log, MockIo, MockPanel};
    use alloc::vec;
    use alloc::vec::Vec;
    use spin::Mutex;

    fn log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn partial() -> Builder {
        Builder::new()
            .resolution(Resolution::new(320, 240))
            .buffer_size(320 * 24)
    }

    #[test]
    fn test_partial_display() {
        let log = log();
        let port = Port::new();
        let config = partial().build().unwrap();
        let display = port
            .add_display(
                &config,
                PanelHandles::new(MockPanel::new(0, &log)),
                &mut MockIo::default(),
            )
            .unwrap();
        assert_eq!(display.render_mode(), RenderMode::Partial);
        assert_eq!(display.buffers().len(), 1);
        assert_eq!(display.buffers().get(0).unwrap().len(), 320 * 24 * 2);
        assert_eq!(display.color_format(), ColorFormat::Rgb565);
    }

    #[test]
    fn test_monochrome_needs_full_buffer() {
        let log = log();
        let port = Port::new();
        let config = partial().monochrome(true).build().unwrap();
        let err = port
            .add_display(
                &config,
                PanelHandles::new(MockPanel::new(0, &log)),
                &mut MockIo::default(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        // Nothing was sent to the panel
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_oversized_buffer_is_out_of_memory() {
        let log = log();
        let counting = Arc::new(CountingPool::default());
        let port = Port::with_pool(counting.clone());
        let config = partial().buffer_size(usize::MAX / 2 + 1).build().unwrap();
        let err = port
            .add_display(
                &config,
                PanelHandles::new(MockPanel::new(0, &log)),
                &mut MockIo::default(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfMemory);
        assert!(matches!(
            err,
            Error::Config(ConfigError::OutOfMemory { bytes: usize::MAX })
        ));
        assert_eq!(counting.live(), 0);
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_failed_second_buffer_rolls_back() {
        let log = log();
        let counting = Arc::new(CountingPool::failing_after(1));
        let port = Port::with_pool(counting.clone());
        let config = partial().double_buffer(true).build().unwrap();
        let err = port
            .add_display(
                &config,
                PanelHandles::new(MockPanel::new(0, &log)),
                &mut MockIo::default(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfMemory);
        assert_eq!(counting.live(), 0);
    }

    #[test]
    fn test_remove_returns_buffers_and_handles() {
        let log = log();
        let counting = Arc::new(CountingPool::default());
        let port = Port::with_pool(counting.clone());
        let config = partial().double_buffer(true).build().unwrap();
        let handles =
            PanelHandles::new(MockPanel::new(0, &log)).with_control(MockPanel::new(1, &log));
        let display = port
            .add_display(&config, handles, &mut MockIo::default())
            .unwrap();
        assert_eq!(counting.live(), 2);

        let released = port.remove_display(display);
        assert_eq!(counting.live(), 0);
        assert_eq!(released.panel.id, 0);
        assert_eq!(released.control.map(|c| c.id), Some(1));
        assert!(released.accelerator.is_none());
    }

    #[test]
    fn test_panel_by_reference() {
        let log = log();
        let port = Port::new();
        let config = partial().build().unwrap();
        let mut panel = MockPanel::new(0, &log);
        let mut io = MockIo::default();
        let display = port
            .add_display(&config, PanelHandles::new(&mut panel), &mut io)
            .unwrap();
        display.notify_flush_complete();
        assert!(display.is_flush_ready());
        port.remove_display(display);

        assert_eq!(
            MockPanel::events(&log, 0),
            vec![Event::SwapXy(false), Event::Mirror(false, false)]
        );
    }

    #[test]
    fn test_initial_rotation_uses_baseline() {
        let log = log();
        let port = Port::new();
        let config = partial()
            .rotation(RotationConfig {
                swap_xy: true,
                mirror_x: true,
                mirror_y: false,
            })
            .build()
            .unwrap();
        port.add_display(
            &config,
            PanelHandles::new(MockPanel::new(0, &log)),
            &mut MockIo::default(),
        )
        .unwrap();
        assert_eq!(
            MockPanel::events(&log, 0),
            vec![Event::SwapXy(true), Event::Mirror(true, false)]
        );
    }

    #[test]
    fn test_rgb_avoid_tearing_checks_frame_buffers() {
        let log = log();
        let port = Port::new();
        let res = Resolution::new(16, 16);
        let config = Builder::new()
            .resolution(res)
            .buffer_size(16)
            .direct_mode(true)
            .build()
            .unwrap();
        let rgb = RgbConfig {
            avoid_tearing: true,
            bounce_buffer_mode: true,
        };

        let small = MockPanel::new(0, &log).with_frames(100);
        let err = port
            .add_display_rgb(&config, PanelHandles::new(small), &rgb)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::BufferTooSmall {
                required: 512,
                provided: 100
            }
        ));

        let panel = MockPanel::new(0, &log).with_frames(512);
        let display = port
            .add_display_rgb(&config, PanelHandles::new(panel), &rgb)
            .unwrap();
        assert_eq!(display.render_mode(), RenderMode::Direct);
        assert!(display.ctx.panel.bounce.is_some());
        assert!(display.ctx.panel.vsync.is_none());
    }

    #[test]
    fn test_rgb_without_frame_buffers_fails() {
        let log = log();
        let port = Port::new();
        let config = partial().build().unwrap();
        let rgb = RgbConfig {
            avoid_tearing: true,
            bounce_buffer_mode: false,
        };
        let err = port
            .add_display_rgb(&config, PanelHandles::new(MockPanel::new(0, &log)), &rgb)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Hardware);
    }

    #[test]
    fn test_dsi_accelerator_required() {
        let log = log();
        let port = Port::new();
        let config = partial().build().unwrap();
        let dsi = DsiConfig::<SoftAccelerator> {
            use_accelerator: true,
            accelerator: None,
        };
        let err = port
            .add_display_dsi(&config, PanelHandles::new(MockPanel::new(0, &log)), dsi)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn test_dsi_registration_failure_rolls_back() {
        let log = log();
        let counting = Arc::new(CountingPool::default());
        let port = Port::with_pool(counting.clone());
        let config = partial().build().unwrap();
        let accel = SoftAccelerator {
            fail_register: true,
            ..SoftAccelerator::default()
        };
        let err = port
            .add_display_dsi(
                &config,
                PanelHandles::new(MockPanel::new(0, &log)),
                DsiConfig::with_accelerator(accel),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::AcceleratorUnavailable)
        ));
        assert_eq!(counting.live(), 0);
    }

    #[test]
    fn test_remove_unregisters_accelerator() {
        let log = log();
        let counting = Arc::new(CountingPool::default());
        let port = Port::with_pool(counting.clone());
        let config = partial().build().unwrap();
        let accel = SoftAccelerator::default();
        let unregistered = Arc::clone(&accel.unregistered);
        let display = port
            .add_display_dsi(
                &config,
                PanelHandles::new(MockPanel::new(0, &log)),
                DsiConfig::with_accelerator(accel),
            )
            .unwrap();
        // draw buffer and accelerator output
        assert_eq!(counting.live(), 2);

        let released = port.remove_display(display);
        assert!(released.accelerator.is_some());
        assert!(*unregistered.lock());
        assert_eq!(counting.live(), 0);
    }

    #[test]
    fn test_flush_ready_on_external_notification() {
        let log = log();
        let port = Port::new();
        let config = partial().build().unwrap();
        let mut display = port
            .add_display(
                &config,
                PanelHandles::new(MockPanel::new(0, &log)),
                &mut MockIo::default(),
            )
            .unwrap();

        struct NoDelay;
        impl embedded_hal::delay::DelayNs for NoDelay {
            fn delay_ns(&mut self, _ns: u32) {}
        }
        display
            .flush_draw_buffer(0, FlushRegion::last(Area::new(0, 0, 8, 8)), &mut NoDelay)
            .unwrap();
        assert!(!display.is_flush_ready());
        display.notify_flush_complete();
        assert!(display.is_flush_ready());
    }
}
