//! Error types for the port
//!
//! This module defines error types for adding a display ([`ConfigError`]) and
//! for runtime operations on it ([`Error`]).
//!
//! ## Error Types
//!
//! - [`ConfigError`] - Rejected configuration or failed allocation, always
//!   detected before the display exists
//! - [`Error`] - Runtime errors, generic over the panel's own error type
//! - [`ErrorKind`] - Coarse classification shared by both
//!
//! ## Example
//!
//! ```
//! use lcd_port::{Builder, ConfigError, ErrorKind};
//!
//! let result = Builder::new().build();
//! assert!(matches!(result, Err(ConfigError::MissingResolution)));
//! assert_eq!(ConfigError::DmaExternalMemory.kind(), ErrorKind::Unsupported);
//! ```

use crate::accel::AcceleratorError;
use crate::color::ColorFormat;
use crate::config::DisplayMode;

/// Coarse classification of an error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad configuration
    InvalidArgument,
    /// An allocation failed
    OutOfMemory,
    /// The hardware or transport cannot do what was asked
    Unsupported,
    /// A panel or accelerator reported a failure
    Hardware,
}

/// Errors detected while adding a display
///
/// Any partial allocation made before the error was detected has already been
/// released when one of these is returned.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfigError {
    /// [`Builder::resolution()`](crate::config::Builder::resolution) was never called
    MissingResolution,
    /// Width or height is zero
    ZeroResolution,
    /// Draw buffer size is zero
    ZeroBufferSize,
    /// The color format cannot be transmitted
    UnsupportedColorFormat(ColorFormat),
    /// Byte swapping only applies to RGB565
    SwapBytesRequiresRgb565(ColorFormat),
    /// DMA buffers are only allowed for RGB565
    DmaRequiresRgb565(ColorFormat),
    /// The mode needs a buffer covering the whole screen
    BufferNotFullScreen {
        /// Mode that requires the full buffer
        mode: DisplayMode,
        /// Screen size in pixels
        required: usize,
        /// Configured buffer size in pixels
        provided: usize,
    },
    /// DMA-capable external memory does not exist
    DmaExternalMemory,
    /// The accelerator was requested but none was provided
    AcceleratorUnavailable,
    /// Allocation failed
    OutOfMemory {
        /// Bytes requested
        bytes: usize,
    },
}

impl ConfigError {
    /// Classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingResolution
            | Self::ZeroResolution
            | Self::ZeroBufferSize
            | Self::UnsupportedColorFormat(_)
            | Self::SwapBytesRequiresRgb565(_)
            | Self::DmaRequiresRgb565(_)
            | Self::BufferNotFullScreen { .. } => ErrorKind::InvalidArgument,
            Self::DmaExternalMemory | Self::AcceleratorUnavailable => ErrorKind::Unsupported,
            Self::OutOfMemory { .. } => ErrorKind::OutOfMemory,
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingResolution => write!(f, "Resolution must be specified"),
            Self::ZeroResolution => write!(f, "Resolution must not be zero"),
            Self::ZeroBufferSize => write!(f, "Buffer size must not be zero"),
            Self::UnsupportedColorFormat(format) => {
                write!(f, "Not supported display color format: {format:?}")
            }
            Self::SwapBytesRequiresRgb565(format) => {
                write!(f, "Swap bytes can be used only with RGB565, not {format:?}")
            }
            Self::DmaRequiresRgb565(format) => {
                write!(f, "DMA buffers can be used only with RGB565, not {format:?}")
            }
            Self::BufferNotFullScreen {
                mode,
                required,
                provided,
            } => write!(
                f,
                "{mode:?} mode needs a full screen buffer: required {required} pixels, provided {provided}"
            ),
            Self::DmaExternalMemory => {
                write!(f, "DMA capable buffers in external memory are not supported")
            }
            Self::AcceleratorUnavailable => write!(f, "Accelerator requested but not available"),
            Self::OutOfMemory { bytes } => write!(f, "Out of memory allocating {bytes} bytes"),
        }
    }
}

impl core::error::Error for ConfigError {}

/// Errors that can occur when adding or driving a display
///
/// Generic over the panel error type so callers can match on the underlying
/// hardware error.
#[derive(Debug)]
pub enum Error<E> {
    /// The configuration was rejected
    Config(ConfigError),
    /// Panel error
    Panel(E),
    /// Accelerator error
    Accelerator(AcceleratorError),
    /// The pixel data is smaller than the flushed area
    BufferTooSmall {
        /// Required size in bytes
        required: usize,
        /// Provided size in bytes
        provided: usize,
    },
    /// No draw buffer with this index
    MissingBuffer {
        /// Requested index
        index: usize,
    },
}

impl<E> Error<E> {
    /// Classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(e) => e.kind(),
            Self::Panel(_) | Self::Accelerator(_) => ErrorKind::Hardware,
            Self::BufferTooSmall { .. } | Self::MissingBuffer { .. } => ErrorKind::InvalidArgument,
        }
    }
}

impl<E> From<ConfigError> for Error<E> {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl<E> From<AcceleratorError> for Error<E> {
    fn from(e: AcceleratorError) -> Self {
        Self::Accelerator(e)
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{e}"),
            Self::Panel(e) => write!(f, "Panel error: {e:?}"),
            Self::Accelerator(e) => write!(f, "Accelerator error: {e}"),
            Self::BufferTooSmall { required, provided } => write!(
                f,
                "Buffer too small: required {required} bytes, provided {provided}"
            ),
            Self::MissingBuffer { index } => write!(f, "No draw buffer {index}"),
        }
    }
}

impl<E: core::fmt::Debug> core::error::Error for Error<E> {}
