//! Aligned buffers backing storage tensors.

use std::alloc::Layout;
use std::ptr::NonNull;

use smet_base::num::Element;

use crate::errors::AllocError;

/// Default alignment of tensor buffers, in bytes.
///
/// This is a cache line on common CPUs.
pub const DEFAULT_ALIGN: usize = 64;

/// Allocator for tensor buffers.
pub trait Alloc {
    /// Allocate a buffer of `len` elements, each set to zero, whose start is
    /// aligned to at least `align` bytes.
    ///
    /// The effective alignment is the larger of `align` and the alignment of
    /// `T`.
    fn alloc_aligned<T: Element>(
        &self,
        len: usize,
        align: usize,
    ) -> Result<AlignedBuf<T>, AllocError>;
}

/// Allocator which uses the global allocator.
#[derive(Copy, Clone, Debug, Default)]
pub struct GlobalAlloc {}

impl GlobalAlloc {
    pub const fn new() -> GlobalAlloc {
        GlobalAlloc {}
    }
}

impl Alloc for GlobalAlloc {
    fn alloc_aligned<T: Element>(
        &self,
        len: usize,
        align: usize,
    ) -> Result<AlignedBuf<T>, AllocError> {
        AlignedBuf::new_filled(len, align, T::zero())
    }
}

/// Fixed-length, heap-allocated buffer with a caller-chosen alignment.
///
/// The buffer is freed when dropped. Cloning allocates a new buffer with the
/// same alignment and copies the elements.
pub struct AlignedBuf<T> {
    ptr: NonNull<T>,
    len: usize,
    layout: Layout,
}

// Safety: `AlignedBuf` uniquely owns its elements, like `Vec<T>`.
unsafe impl<T: Send> Send for AlignedBuf<T> {}
unsafe impl<T: Sync> Sync for AlignedBuf<T> {}

impl<T: Copy> AlignedBuf<T> {
    /// Allocate a buffer of `len` copies of `value`.
    pub fn new_filled(len: usize, align: usize, value: T) -> Result<AlignedBuf<T>, AllocError> {
        let align = align.max(align_of::<T>());
        let error = AllocError {
            bytes: len.saturating_mul(size_of::<T>()),
            align,
        };
        let bytes = len.checked_mul(size_of::<T>()).ok_or(error.clone())?;
        let layout = Layout::from_size_align(bytes, align).map_err(|_| error.clone())?;

        let ptr = if bytes == 0 {
            dangling(align)
        } else {
            // Safety: `layout` has a non-zero size.
            let raw = unsafe { std::alloc::alloc(layout) } as *mut T;
            let ptr = NonNull::new(raw).ok_or(error)?;
            for i in 0..len {
                // Safety: `i` is within the allocation, which is aligned for `T`.
                unsafe { ptr.as_ptr().add(i).write(value) };
            }
            tracing::trace!(bytes, align, "allocated tensor buffer");
            ptr
        };

        Ok(AlignedBuf { ptr, len, layout })
    }

    /// Allocate a buffer containing a copy of `data`.
    pub fn from_slice(data: &[T], align: usize) -> Result<AlignedBuf<T>, AllocError> {
        let Some(&first) = data.first() else {
            return Self::empty(align);
        };
        let mut buf = Self::new_filled(data.len(), align, first)?;
        buf.as_mut_slice().copy_from_slice(data);
        Ok(buf)
    }

    fn empty(align: usize) -> Result<AlignedBuf<T>, AllocError> {
        let align = align.max(align_of::<T>());
        let layout =
            Layout::from_size_align(0, align).map_err(|_| AllocError { bytes: 0, align })?;
        Ok(AlignedBuf {
            ptr: dangling(align),
            len: 0,
            layout,
        })
    }
}

/// Return a non-null pointer with address `align`, for empty buffers.
fn dangling<T>(align: usize) -> NonNull<T> {
    NonNull::new(std::ptr::without_provenance_mut(align)).unwrap_or(NonNull::dangling())
}

impl<T> AlignedBuf<T> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Return the alignment of the buffer in bytes.
    pub fn align(&self) -> usize {
        self.layout.align()
    }

    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    pub fn as_non_null(&self) -> NonNull<T> {
        self.ptr
    }

    pub fn as_slice(&self) -> &[T] {
        // Safety: `ptr` is valid for `len` initialized elements.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // Safety: `ptr` is valid for `len` initialized elements, which `self`
        // owns uniquely.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Copy> Clone for AlignedBuf<T> {
    fn clone(&self) -> AlignedBuf<T> {
        match AlignedBuf::from_slice(self.as_slice(), self.align()) {
            Ok(buf) => buf,
            Err(err) => panic!("{}", err),
        }
    }
}

impl<T> Drop for AlignedBuf<T> {
    fn drop(&mut self) {
        if self.layout.size() != 0 {
            // Safety: The buffer was allocated with `self.layout` by the
            // global allocator.
            unsafe { std::alloc::dealloc(self.ptr.as_ptr() as *mut u8, self.layout) };
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for AlignedBuf<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}
