//! Scale/rotate/mirror accelerator stage
//!
//! On MIPI-DSI displays an optional 2D engine can rotate every flushed area
//! before it is transmitted. The panel then never receives rotation commands;
//! the flush pipeline moves the rectangle with
//! [`remap_area`](crate::rotation::remap_area) and sends the engine's output
//! instead of the draw buffer.
//!
//! Jobs are asynchronous. The engine reports completion through the
//! [`Notifier`] given at registration and the flush blocks on it.

use alloc::sync::Arc;

use crate::buffer::{MemoryPool, PoolBuffer};
use crate::color::ColorFormat;
use crate::config::{MemoryCaps, Rotation};
use crate::error::ConfigError;
use crate::sync::{Notifier, Signal};

/// Output buffer alignment in bytes
pub const OUTPUT_ALIGN: usize = 64;

/// Errors reported by an accelerator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcceleratorError {
    /// The client could not be registered
    Registration,
    /// The job was rejected
    InvalidJob,
    /// The engine failed while running a job
    Hardware,
}

impl core::fmt::Display for AcceleratorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Registration => write!(f, "Error when registering accelerator client"),
            Self::InvalidJob => write!(f, "Accelerator rejected the job"),
            Self::Hardware => write!(f, "Accelerator hardware failure"),
        }
    }
}

impl core::error::Error for AcceleratorError {}

/// One scale/rotate/mirror job
///
/// Input and output are tightly packed pictures of `format`. The job always
/// processes the whole input picture.
#[derive(Debug)]
pub struct SrmJob<'a> {
    /// Source pixels
    pub input: &'a [u8],
    /// Source width in pixels
    pub in_width: u16,
    /// Source height in pixels
    pub in_height: u16,
    /// Destination buffer
    pub output: &'a mut [u8],
    /// Destination width in pixels
    pub out_width: u16,
    /// Destination height in pixels
    pub out_height: u16,
    /// Clockwise rotation
    pub angle: Rotation,
    /// Horizontal scale factor
    pub scale_x: f32,
    /// Vertical scale factor
    pub scale_y: f32,
    /// Swap the bytes of every RGB565 pixel
    pub byte_swap: bool,
    /// Pixel layout of input and output
    pub format: ColorFormat,
}

/// Client of a 2D scale/rotate/mirror engine
///
/// ## Implementing
///
/// `scale_rotate_mirror` starts the job and returns. The engine calls
/// [`Notifier::notify`] on the handler given to `register` once the output is
/// written.
pub trait Accelerator {
    /// Register the client and its completion handler
    ///
    /// # Errors
    ///
    /// Returns [`AcceleratorError::Registration`] if no client is available.
    fn register(&mut self, on_done: Notifier) -> Result<(), AcceleratorError>;

    /// Release the client
    fn unregister(&mut self);

    /// Start a job without waiting for it
    ///
    /// # Errors
    ///
    /// Returns an error if the job cannot be started.
    fn scale_rotate_mirror(&mut self, job: SrmJob<'_>) -> Result<(), AcceleratorError>;
}

/// Placeholder for displays without an accelerator
///
/// Has no values, so a display using it can never hold an accelerator stage.
#[derive(Debug)]
pub enum NoAccelerator {}

impl Accelerator for NoAccelerator {
    fn register(&mut self, _on_done: Notifier) -> Result<(), AcceleratorError> {
        match *self {}
    }

    fn unregister(&mut self) {
        match *self {}
    }

    fn scale_rotate_mirror(&mut self, _job: SrmJob<'_>) -> Result<(), AcceleratorError> {
        match *self {}
    }
}

/// Round `value` up to a multiple of `align`
///
/// Returns `None` on overflow.
pub const fn align_up(value: usize, align: usize) -> Option<usize> {
    value.div_ceil(align).checked_mul(align)
}

/// Output buffer size for a draw buffer of `buffer_size` pixels
///
/// # Errors
///
/// Returns `ConfigError::OutOfMemory` if the size does not fit in `usize`
pub fn output_len(buffer_size: usize, format: ColorFormat) -> Result<usize, ConfigError> {
    buffer_size
        .checked_mul(2)
        .and_then(|pixels| pixels.checked_mul(format.bytes_per_pixel()))
        .and_then(|bytes| align_up(bytes, OUTPUT_ALIGN))
        .ok_or(ConfigError::OutOfMemory { bytes: usize::MAX })
}

/// Accelerator resources owned by one display
///
/// The registered client, its output buffer and its completion signal are
/// created together and released together. Dropping the stage unregisters the
/// client and returns the buffer to its pool.
#[derive(Debug)]
pub struct AccelStage<A: Accelerator> {
    accelerator: Option<A>,
    output: PoolBuffer,
    done: Arc<Signal>,
    format: ColorFormat,
    byte_swap: bool,
}

impl<A: Accelerator> AccelStage<A> {
    /// Allocate the output buffer and register `accelerator`
    ///
    /// `byte_swap` makes every job swap RGB565 bytes on the way. On failure
    /// everything allocated so far is released.
    pub fn new(
        mut accelerator: A,
        pool: &Arc<dyn MemoryPool>,
        buffer_size: usize,
        format: ColorFormat,
        byte_swap: bool,
    ) -> Result<Self, ConfigError> {
        let bytes = output_len(buffer_size, format)?;
        let caps = MemoryCaps {
            dma: true,
            external: true,
        };
        let output = PoolBuffer::allocate(pool, bytes, caps).inspect_err(|_| {
            log::error!("Not enough memory for accelerator output buffer ({bytes} bytes)!");
        })?;
        log::debug!("Accelerator output buffer: {bytes} bytes");

        let done = Arc::new(Signal::new());
        if let Err(e) = accelerator.register(Notifier::new(Arc::clone(&done))) {
            log::error!("{e}");
            return Err(ConfigError::AcceleratorUnavailable);
        }

        Ok(Self {
            accelerator: Some(accelerator),
            output,
            done,
            format,
            byte_swap,
        })
    }

    /// Rotate `input`, a `size.0` x `size.1` picture, by `angle` and wait for
    /// the result
    ///
    /// `submit` wraps the job submission, so the caller can hold a lock around
    /// it without holding it across the wait.
    pub fn run<D, F>(
        &mut self,
        input: &[u8],
        size: (u16, u16),
        angle: Rotation,
        delay: &mut D,
        submit: F,
    ) -> Result<&[u8], AcceleratorError>
    where
        D: embedded_hal::delay::DelayNs,
        F: FnOnce(&mut A, SrmJob<'_>) -> Result<(), AcceleratorError>,
    {
        let Some(accelerator) = self.accelerator.as_mut() else {
            return Err(AcceleratorError::Registration);
        };
        let format = self.format;
        let (in_width, in_height) = size;
        let (out_width, out_height) = if angle.swaps_axes() {
            (in_height, in_width)
        } else {
            (in_width, in_height)
        };

        self.done.clear();
        let job = SrmJob {
            input,
            in_width,
            in_height,
            output: &mut self.output,
            out_width,
            out_height,
            angle,
            scale_x: 1.0,
            scale_y: 1.0,
            byte_swap: self.byte_swap,
            format,
        };
        submit(accelerator, job)?;
        self.done.wait(delay);

        let len = (in_width as usize * in_height as usize * format.bytes_per_pixel())
            .min(self.output.len());
        Ok(&self.output[..len])
    }

    /// Size of the output buffer in bytes
    pub fn output_len(&self) -> usize {
        self.output.len()
    }

    /// Unregister and hand back the accelerator
    pub fn release(mut self) -> Option<A> {
        let mut accelerator = self.accelerator.take()?;
        accelerator.unregister();
        Some(accelerator)
    }
}

impl<A: Accelerator> Drop for AccelStage<A> {
    fn drop(&mut self) {
        if let Some(accelerator) = self.accelerator.as_mut() {
            accelerator.unregister();
        }
    }
}
