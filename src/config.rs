//! Display configuration types and builder

use crate::color::ColorFormat;
use crate::error::ConfigError;

/// Display resolution in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Horizontal resolution
    pub width: u16,
    /// Vertical resolution
    pub height: u16,
}

impl Resolution {
    /// Create a new resolution
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Number of pixels on the whole screen
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether either side is zero
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Logical display rotation requested by the application
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rotation {
    /// No rotation
    #[default]
    Rotate0,
    /// Rotate 90 degrees
    Rotate90,
    /// Rotate 180 degrees
    Rotate180,
    /// Rotate 270 degrees
    Rotate270,
}

impl Rotation {
    /// Whether this rotation exchanges the X and Y axes
    pub fn swaps_axes(self) -> bool {
        matches!(self, Self::Rotate90 | Self::Rotate270)
    }

    /// Rotation angle in degrees
    pub fn degrees(self) -> u16 {
        match self {
            Self::Rotate0 => 0,
            Self::Rotate90 => 90,
            Self::Rotate180 => 180,
            Self::Rotate270 => 270,
        }
    }
}

/// Baseline mounting of the panel
///
/// Compensates for how the glass is wired. It is combined with the logical
/// [`Rotation`] every time the rotation changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RotationConfig {
    /// Exchange X and Y
    pub swap_xy: bool,
    /// Mirror along the X axis
    pub mirror_x: bool,
    /// Mirror along the Y axis
    pub mirror_y: bool,
}

/// Memory the draw buffers must be allocated from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoryCaps {
    /// DMA-capable internal memory
    pub dma: bool,
    /// External memory (PSRAM)
    pub external: bool,
}

/// Behaviour flags of a display
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisplayFlags {
    /// 1 bit per pixel panel, packed vertically
    pub monochrome: bool,
    /// Swap the bytes of RGB565 pixels before transmission
    pub swap_bytes: bool,
    /// Always redraw the whole screen
    pub full_refresh: bool,
    /// Draw into screen-sized buffers at absolute coordinates
    pub direct_mode: bool,
}

/// How the graphics library renders into the draw buffers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    /// Only dirty regions are rendered, buffers may be smaller than the screen
    Partial,
    /// The whole screen is rendered every frame
    Full,
    /// Dirty regions are rendered at their absolute position
    Direct,
}

/// Mutually exclusive display mode derived from [`DisplayFlags`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisplayMode {
    /// Partial rendering
    #[default]
    Partial,
    /// Full refresh
    Full,
    /// Direct mode
    Direct,
    /// Monochrome panel, full refresh with vertical bit packing
    Monochrome,
}

impl DisplayMode {
    /// Select the mode from flags, monochrome first, then direct, then full
    pub fn from_flags(flags: DisplayFlags) -> Self {
        if flags.monochrome {
            Self::Monochrome
        } else if flags.direct_mode {
            Self::Direct
        } else if flags.full_refresh {
            Self::Full
        } else {
            Self::Partial
        }
    }

    /// Render mode handed to the graphics library
    pub fn render_mode(self) -> RenderMode {
        match self {
            Self::Partial => RenderMode::Partial,
            Self::Full | Self::Monochrome => RenderMode::Full,
            Self::Direct => RenderMode::Direct,
        }
    }

    /// Whether the draw buffer must cover the whole screen
    pub fn requires_full_buffer(self) -> bool {
        !matches!(self, Self::Partial)
    }

    /// Whether every frame ends with a blocking wait on frame-buffered transports
    pub fn waits_for_frame(self) -> bool {
        matches!(self, Self::Full | Self::Direct)
    }
}

/// Display configuration
///
/// Use [`Builder`] to create a Config. Nothing here is validated until the
/// display is added to a [`Port`](crate::Port).
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Physical resolution
    pub resolution: Resolution,
    /// Size of one draw buffer in pixels
    pub buffer_size: usize,
    /// Pixel layout of the draw buffers
    pub color_format: ColorFormat,
    /// Allocate a second draw buffer
    pub double_buffer: bool,
    /// Memory the draw buffers come from
    pub memory: MemoryCaps,
    /// Behaviour flags
    pub flags: DisplayFlags,
    /// Baseline mounting of the panel
    pub rotation: RotationConfig,
}

impl Config {
    /// Display mode selected by the flags
    pub fn display_mode(&self) -> DisplayMode {
        DisplayMode::from_flags(self.flags)
    }
}

/// Builder for constructing display configuration
///
/// # Example
///
/// ```
/// use lcd_port::{Builder, Resolution};
///
/// let config = match Builder::new()
///     .resolution(Resolution::new(320, 240))
///     .buffer_size(320 * 24)
///     .build()
/// {
///     Ok(config) => config,
///     Err(_) => return,
/// };
/// assert_eq!(config.buffer_size, 7680);
/// ```
#[must_use]
#[derive(Default)]
pub struct Builder {
    resolution: Option<Resolution>,
    buffer_size: usize,
    color_format: ColorFormat,
    double_buffer: bool,
    memory: MemoryCaps,
    flags: DisplayFlags,
    rotation: RotationConfig,
}

impl Builder {
    /// Create a new Builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the physical resolution (required)
    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = Some(resolution);
        self
    }

    /// Set the draw buffer size in pixels
    ///
    /// At least a tenth of the screen is a reasonable starting point.
    pub fn buffer_size(mut self, pixels: usize) -> Self {
        self.buffer_size = pixels;
        self
    }

    /// Set the color format
    pub fn color_format(mut self, format: ColorFormat) -> Self {
        self.color_format = format;
        self
    }

    /// Allocate two draw buffers instead of one
    pub fn double_buffer(mut self, enabled: bool) -> Self {
        self.double_buffer = enabled;
        self
    }

    /// Request DMA-capable buffers
    pub fn dma_buffers(mut self, enabled: bool) -> Self {
        self.memory.dma = enabled;
        self
    }

    /// Request buffers in external memory
    pub fn external_buffers(mut self, enabled: bool) -> Self {
        self.memory.external = enabled;
        self
    }

    /// Mark the panel as 1 bit per pixel
    pub fn monochrome(mut self, enabled: bool) -> Self {
        self.flags.monochrome = enabled;
        self
    }

    /// Swap RGB565 bytes before transmission
    pub fn swap_bytes(mut self, enabled: bool) -> Self {
        self.flags.swap_bytes = enabled;
        self
    }

    /// Always redraw the whole screen
    pub fn full_refresh(mut self, enabled: bool) -> Self {
        self.flags.full_refresh = enabled;
        self
    }

    /// Render at absolute coordinates into screen-sized buffers
    pub fn direct_mode(mut self, enabled: bool) -> Self {
        self.flags.direct_mode = enabled;
        self
    }

    /// Set the baseline mounting of the panel
    pub fn rotation(mut self, rotation: RotationConfig) -> Self {
        self.rotation = rotation;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingResolution` if no resolution was set
    pub fn build(self) -> Result<Config, ConfigError> {
        Ok(Config {
            resolution: self.resolution.ok_or(ConfigError::MissingResolution)?,
            buffer_size: self.buffer_size,
            color_format: self.color_format,
            double_buffer: self.double_buffer,
            memory: self.memory,
            flags: self.flags,
            rotation: self.rotation,
        })
    }
}

/// Settings specific to parallel RGB panels with hardware frame buffers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RgbConfig {
    /// Render straight into the panel's own frame buffers
    pub avoid_tearing: bool,
    /// Signal completion on bounce-buffer frame end instead of vsync
    pub bounce_buffer_mode: bool,
}

/// Settings specific to MIPI-DSI panels
#[derive(Debug)]
pub struct DsiConfig<A> {
    /// Route every flush through the scale/rotate/mirror accelerator
    pub use_accelerator: bool,
    /// Accelerator client, required when `use_accelerator` is set
    pub accelerator: Option<A>,
}

impl<A> Default for DsiConfig<A> {
    fn default() -> Self {
        Self {
            use_accelerator: false,
            accelerator: None,
        }
    }
}

impl<A> DsiConfig<A> {
    /// Configuration that routes flushes through `accelerator`
    pub fn with_accelerator(accelerator: A) -> Self {
        Self {
            use_accelerator: true,
            accelerator: Some(accelerator),
        }
    }
}

/// Panel handles used by one display
///
/// The pixel panel receives bitmaps. Rotation commands go to the control
/// panel when one is given (for example a bridge chip), otherwise to the pixel
/// panel.
#[derive(Debug)]
pub struct PanelHandles<P> {
    /// Panel receiving pixel data
    pub panel: P,
    /// Optional panel receiving swap/mirror commands
    pub control: Option<P>,
}

impl<P> PanelHandles<P> {
    /// Handles with rotation commands going to the pixel panel
    pub fn new(panel: P) -> Self {
        Self {
            panel,
            control: None,
        }
    }

    /// Send rotation commands to `control` instead
    pub fn with_control(mut self, control: P) -> Self {
        self.control = Some(control);
        self
    }
}
