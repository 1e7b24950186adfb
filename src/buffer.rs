//! Draw buffer allocation
//!
//! Draw buffers are either allocated from a [`MemoryPool`] and owned by the
//! display, or borrowed from the frame store of a parallel RGB panel. Owned
//! buffers go back to their pool when dropped, so a display that fails half
//! way through creation never leaks and never frees twice.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::ops::{Deref, DerefMut};

use crate::color::ColorFormat;
use crate::config::{Config, MemoryCaps};
use crate::error::ConfigError;

/// Source of buffer memory with capability selection
///
/// Implement this to route allocations to DMA-capable or external RAM.
pub trait MemoryPool: Send + Sync {
    /// Allocate `bytes` zeroed bytes matching `caps`, or `None` when exhausted
    fn allocate(&self, bytes: usize, caps: MemoryCaps) -> Option<Box<[u8]>>;

    /// Return a buffer previously handed out by [`allocate`](Self::allocate)
    fn free(&self, buffer: Box<[u8]>) {
        drop(buffer);
    }
}

/// Pool backed by the global allocator, ignoring capability requests
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemPool;

impl MemoryPool for SystemPool {
    fn allocate(&self, bytes: usize, _caps: MemoryCaps) -> Option<Box<[u8]>> {
        let mut data = Vec::new();
        data.try_reserve_exact(bytes).ok()?;
        data.resize(bytes, 0);
        Some(data.into_boxed_slice())
    }
}

/// Buffer owned by the port, returned to its pool on drop
pub struct PoolBuffer {
    data: Box<[u8]>,
    pool: Arc<dyn MemoryPool>,
}

impl PoolBuffer {
    /// Allocate from `pool`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::OutOfMemory` if the pool is exhausted
    pub fn allocate(
        pool: &Arc<dyn MemoryPool>,
        bytes: usize,
        caps: MemoryCaps,
    ) -> Result<Self, ConfigError> {
        let data = pool
            .allocate(bytes, caps)
            .ok_or(ConfigError::OutOfMemory { bytes })?;
        Ok(Self {
            data,
            pool: Arc::clone(pool),
        })
    }
}

impl Deref for PoolBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl DerefMut for PoolBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Drop for PoolBuffer {
    fn drop(&mut self) {
        let data = core::mem::take(&mut self.data);
        self.pool.free(data);
    }
}

impl core::fmt::Debug for PoolBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PoolBuffer")
            .field("len", &self.data.len())
            .finish_non_exhaustive()
    }
}

/// One draw buffer handed to the graphics library
#[derive(Debug)]
pub enum DrawBuffer {
    /// Allocated by the port
    Owned(PoolBuffer),
    /// Frame buffer owned by the transport
    Borrowed(&'static mut [u8]),
}

impl DrawBuffer {
    /// Whether the memory belongs to the transport
    pub fn is_borrowed(&self) -> bool {
        matches!(self, Self::Borrowed(_))
    }
}

impl Deref for DrawBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Owned(buffer) => &**buffer,
            Self::Borrowed(buffer) => &**buffer,
        }
    }
}

impl DerefMut for DrawBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        match self {
            Self::Owned(buffer) => &mut **buffer,
            Self::Borrowed(buffer) => &mut **buffer,
        }
    }
}

/// Zero, one or two draw buffers
#[derive(Debug, Default)]
pub struct DrawBuffers {
    slots: [Option<DrawBuffer>; 2],
}

impl DrawBuffers {
    /// Buffers from two borrowed frame buffers
    pub fn borrowed(first: &'static mut [u8], second: &'static mut [u8]) -> Self {
        Self {
            slots: [
                Some(DrawBuffer::Borrowed(first)),
                Some(DrawBuffer::Borrowed(second)),
            ],
        }
    }

    /// Allocate one buffer, or two when `double` is set
    ///
    /// On failure the first buffer is released before returning.
    pub fn allocate(
        pool: &Arc<dyn MemoryPool>,
        bytes: usize,
        caps: MemoryCaps,
        double: bool,
    ) -> Result<Self, ConfigError> {
        let first = PoolBuffer::allocate(pool, bytes, caps).inspect_err(|_| {
            log::error!("Not enough memory for draw buffer (buf1) allocation!");
        })?;
        let second = if double {
            let second = PoolBuffer::allocate(pool, bytes, caps).inspect_err(|_| {
                log::error!("Not enough memory for draw buffer (buf2) allocation!");
            })?;
            Some(DrawBuffer::Owned(second))
        } else {
            None
        };
        Ok(Self {
            slots: [Some(DrawBuffer::Owned(first)), second],
        })
    }

    /// Number of buffers
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Whether there are no buffers
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buffer at `index`
    pub fn get(&self, index: usize) -> Option<&DrawBuffer> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Mutable buffer at `index`
    pub fn get_mut(&mut self, index: usize) -> Option<&mut DrawBuffer> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }
}

/// Size in bytes of a buffer holding `pixels` pixels of `format`
///
/// # Errors
///
/// Returns `ConfigError::OutOfMemory` if the size does not fit in `usize`
pub fn byte_len(pixels: usize, format: ColorFormat) -> Result<usize, ConfigError> {
    pixels
        .checked_mul(format.bytes_per_pixel())
        .ok_or(ConfigError::OutOfMemory { bytes: usize::MAX })
}

/// Check a configuration against the buffer rules
///
/// Returns the effective buffer size in pixels. When `avoid_tearing` is set
/// the buffers are the panel's frame buffers and cover the whole screen.
pub fn validate(config: &Config, avoid_tearing: bool) -> Result<usize, ConfigError> {
    let checked = check(config, avoid_tearing);
    if let Err(e) = &checked {
        log::error!("{e}");
    }
    checked
}

fn check(config: &Config, avoid_tearing: bool) -> Result<usize, ConfigError> {
    let format = config.color_format;
    if config.resolution.is_empty() {
        return Err(ConfigError::ZeroResolution);
    }
    if config.buffer_size == 0 {
        return Err(ConfigError::ZeroBufferSize);
    }
    if !format.is_supported() {
        return Err(ConfigError::UnsupportedColorFormat(format));
    }
    if config.flags.swap_bytes && format != ColorFormat::Rgb565 {
        return Err(ConfigError::SwapBytesRequiresRgb565(format));
    }
    if config.memory.dma && format != ColorFormat::Rgb565 {
        return Err(ConfigError::DmaRequiresRgb565(format));
    }

    let screen = config.resolution.pixel_count();
    let buffer_size = if avoid_tearing {
        screen
    } else {
        config.buffer_size
    };

    let mode = config.display_mode();
    if mode.requires_full_buffer() && buffer_size != screen {
        return Err(ConfigError::BufferNotFullScreen {
            mode,
            required: screen,
            provided: buffer_size,
        });
    }

    if !avoid_tearing && config.memory.dma && config.memory.external {
        return Err(ConfigError::DmaExternalMemory);
    }

    Ok(buffer_size)
}
