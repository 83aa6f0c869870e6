//! Reusable I/O buffers and the size heuristic that picks them.
//!
//! File encryption churns through read buffers; the pool hands out
//! fixed-size `Vec<u8>`s and takes them back on drop instead of allocating
//! per read. Buffers are recycled, never shrunk, and their previous contents
//! are overwritten by the next read before use.

use std::sync::Mutex;

/// Smallest buffer the pool will hand out.
pub const MIN_BUFFER_SIZE: usize = 4 * 1024;
/// Default when no file size is known.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;
/// Largest buffer the pool will hand out.
pub const MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// Pick a read-buffer size for a file of `file_size` bytes. Larger files get
/// larger buffers, clamped to `[MIN_BUFFER_SIZE, MAX_BUFFER_SIZE]`.
pub fn optimal_buffer_size(file_size: u64) -> usize {
    const MIB: u64 = 1024 * 1024;
    let size = if file_size < 10 * MIB {
        64 * 1024
    } else if file_size < 100 * MIB {
        256 * 1024
    } else if file_size < 1024 * MIB {
        512 * 1024
    } else {
        1024 * 1024
    };
    size.clamp(MIN_BUFFER_SIZE, MAX_BUFFER_SIZE)
}

/// Pool of same-sized byte buffers. Checked-out buffers return on drop.
pub struct BufferPool {
    buffers: Mutex<Vec<Vec<u8>>>,
    buffer_size: usize,
}

impl BufferPool {
    /// Create a pool of `buffer_size`-byte buffers. Sizes outside
    /// `[MIN_BUFFER_SIZE, MAX_BUFFER_SIZE]` are clamped, never rejected.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffers: Mutex::new(Vec::new()),
            buffer_size: buffer_size.clamp(MIN_BUFFER_SIZE, MAX_BUFFER_SIZE),
        }
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Take a buffer from the pool, allocating if the pool is empty. The
    /// buffer is always exactly `buffer_size` bytes long.
    pub fn checkout(&self) -> PooledBuffer<'_> {
        let buf = self
            .buffers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop()
            .unwrap_or_else(|| vec![0u8; self.buffer_size]);
        PooledBuffer {
            buf: Some(buf),
            pool: self,
        }
    }

    fn put_back(&self, mut buf: Vec<u8>) {
        buf.resize(self.buffer_size, 0);
        self.buffers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(buf);
    }

    #[cfg(test)]
    fn idle_count(&self) -> usize {
        self.buffers.lock().unwrap().len()
    }
}

/// A buffer on loan from a [`BufferPool`]; derefs to its byte slice and
/// returns itself to the pool when dropped.
pub struct PooledBuffer<'a> {
    buf: Option<Vec<u8>>,
    pool: &'a BufferPool,
}

impl std::ops::Deref for PooledBuffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.buf.as_deref().unwrap_or(&[])
    }
}

impl std::ops::DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.buf.as_deref_mut().unwrap_or(&mut [])
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.put_back(buf);
        }
    }
}
