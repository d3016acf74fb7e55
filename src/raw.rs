//! Inline-first growable storage.
//!
//! [`RawBuffer`] is the allocation engine under [`Vector`](crate::Vector) and
//! [`SmallString`](crate::SmallString). It owns up to `N` elements inline and
//! moves them to the heap only when more room is requested.
//!
//! The storage mode is encoded in the capacity stored in the metadata:
//! a capacity smaller or equal to `N` means the data is inline (the reported
//! capacity is then exactly `N`), a larger capacity means the data lives in a
//! heap allocation of that many elements. Once spilled, the heap capacity is
//! never less than `2 * N`, so growing slightly past the inline threshold does
//! not reallocate right away.
use core::{
	cmp,
	fmt,
	mem::{
		self,
		ManuallyDrop,
		MaybeUninit
	},
	ptr::{
		self,
		NonNull
	}
};
use std::alloc::{
	self,
	Layout
};
use crate::error::{
	Error,
	Result
};

/// Metadata representing the length and capacity of a buffer.
///
/// This crate provides two implementation of this trait:
/// [`wide::Meta`](crate::wide::Meta) stores the length and capacity with two `usize`.
/// Then the maximum size/capacity depends on the bit-depth of the plateform.
/// For 64-bit plateforms, this crate also provides [`lean::Meta`](crate::lean::Meta) that stores both the length
/// and capacity on a single `usize`. As a result, the maximum size/capacity is [`u32::MAX`].
pub trait Meta: Copy + fmt::Debug {
	/// Maximum size/capacity of the buffer using this metadata format.
	const MAX_LENGTH: usize;

	/// Create a new metadata from a buffer's length and capacity.
	fn new(len: usize, capacity: usize) -> Self;

	/// Get the length of the buffer.
	fn len(&self) -> usize;

	/// Get the capacity of the buffer.
	fn capacity(&self) -> usize;

	/// Set the new length of the buffer.
	fn set_len(&mut self, len: usize);

	/// Set the new capacity of the buffer.
	fn set_capacity(&mut self, capacity: usize);
}

/// Inner data storage.
///
/// We use an union here since the actual type depends on the where the data is stored.
/// If the data is inline, then the relevent field is `stack`.
/// If the data is spilled, the the relevent field is `ptr`.
#[repr(C)]
pub union Data<T, const N: usize> {
	/// Data stored inline.
	stack: ManuallyDrop<[MaybeUninit<T>; N]>,

	/// Pointer to the heap allocation.
	ptr: NonNull<T>
}

impl<T, const N: usize> Data<T, N> {
	#[inline]
	fn uninit() -> Data<T, N> {
		Data {
			stack: ManuallyDrop::new(
				// SAFETY: An uninitialized `[MaybeUninit<_>; N]` is valid.
				unsafe { MaybeUninit::<[MaybeUninit<T>; N]>::uninit().assume_init() }
			)
		}
	}
}

/// Number of elements a spilled capacity is rounded to.
///
/// Heap allocators hand out blocks in 16 bytes steps anyway.
#[inline]
const fn rounding<T>() -> usize {
	let size = mem::size_of::<T>();
	if size == 0 || size >= 16 {
		1
	} else {
		16 / size
	}
}

/// A low-level utility managing an inline-first buffer.
///
/// This type does not in anyway inspect the memory that it manages. When dropped it *will*
/// free its memory, but it *won't* try to drop its contents. It is up to the user of `RawBuffer`
/// to handle the actual things *stored* inside of a `RawBuffer`.
#[repr(C)]
pub struct RawBuffer<T, const N: usize, M: Meta> {
	/// Metadata storing the length and capacity of the buffer.
	meta: M,

	/// The actual data (or a pointer to the actual data).
	data: Data<T, N>
}

impl<T, const N: usize, M: Meta> Drop for RawBuffer<T, N, M> {
	fn drop(&mut self) {
		if let Some((ptr, layout)) = self.current_memory() {
			// SAFETY: the memory was allocated by the global allocator with this layout.
			unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
		}
	}
}

impl<T, const N: usize, M: Meta> Default for RawBuffer<T, N, M> {
	#[inline]
	fn default() -> Self {
		Self::new()
	}
}

impl<T, const N: usize, M: Meta> RawBuffer<T, N, M> {
	/// Creates a new empty inline buffer.
	///
	/// The buffer will not allocate until more than `N` elements are reserved.
	#[inline]
	pub fn new() -> Self {
		RawBuffer {
			meta: M::new(0, N),
			data: Data::uninit()
		}
	}

	/// Creates a new empty buffer able to hold at least `capacity` elements.
	///
	/// The buffer is inline if `capacity <= N`.
	pub fn try_with_capacity(capacity: usize) -> Result<Self> {
		if capacity <= N || mem::size_of::<T>() == 0 {
			check_length::<M>(capacity)?;
			Ok(Self::new())
		} else {
			let capacity = Self::spill_capacity(capacity)?;
			let ptr = allocate::<T, M>(capacity)?;
			Ok(RawBuffer {
				meta: M::new(0, capacity),
				data: Data { ptr }
			})
		}
	}

	/// Creates a new empty buffer able to hold at least `capacity` elements.
	///
	/// # Panics
	///
	/// Panics if the capacity exceeds `M::MAX_LENGTH`.
	#[inline]
	pub fn with_capacity(capacity: usize) -> Self {
		handle_reserve(Self::try_with_capacity(capacity))
	}

	/// Heap capacity used when leaving the inline storage for `required` elements.
	fn spill_capacity(required: usize) -> Result<usize> {
		let step = rounding::<T>();
		let rounded = required.checked_add(step - 1).map(|r| r / step * step).ok_or(Error::LengthExceeded {
			requested: required,
			max: M::MAX_LENGTH
		})?;
		Ok(cmp::max(N.saturating_mul(2), rounded))
	}

	/// Returns the number of initialized elements.
	#[inline]
	pub fn len(&self) -> usize {
		self.meta.len()
	}

	/// Sets the number of initialized elements.
	///
	/// # Safety
	///
	/// `len` must not exceed the capacity and the first `len` elements must be initialized.
	#[inline]
	pub unsafe fn set_len(&mut self, len: usize) {
		crate::debug_contract!(len <= self.capacity(), "length {} exceeds capacity {}", len, self.capacity());
		self.meta.set_len(len)
	}

	/// Returns the capacity of the buffer.
	///
	/// This is `N` as long as the data is inline.
	#[inline]
	pub fn capacity(&self) -> usize {
		if mem::size_of::<T>() == 0 {
			M::MAX_LENGTH
		} else {
			cmp::max(self.meta.capacity(), N)
		}
	}

	/// Returns `true` if the data is stored on the heap.
	#[inline]
	pub fn is_spilled(&self) -> bool {
		self.meta.capacity() > N
	}

	/// Returns the current allocated memory and layout.
	///
	/// Returns `None` if the data is inline.
	fn current_memory(&self) -> Option<(NonNull<u8>, Layout)> {
		if self.is_spilled() {
			// We have an allocated chunk of memory, so we can bypass runtime
			// checks to get our current layout.
			unsafe {
				let align = mem::align_of::<T>();
				let size = mem::size_of::<T>() * self.meta.capacity();
				let layout = Layout::from_size_align_unchecked(size, align);
				Some((self.data.ptr.cast(), layout))
			}
		} else {
			None
		}
	}

	/// Returns a raw pointer to the buffer.
	///
	/// The pointer is invalidated by any operation moving the buffer or changing its capacity.
	#[inline]
	pub fn as_ptr(&self) -> *const T {
		unsafe {
			if self.is_spilled() {
				self.data.ptr.as_ptr()
			} else {
				(*self.data.stack).as_ptr() as *const T
			}
		}
	}

	/// Returns an unsafe mutable pointer to the buffer.
	#[inline]
	pub fn as_mut_ptr(&mut self) -> *mut T {
		unsafe {
			if self.is_spilled() {
				self.data.ptr.as_ptr()
			} else {
				(*self.data.stack).as_mut_ptr() as *mut T
			}
		}
	}

	/// Returns if the buffer needs to grow to fulfill the needed extra capacity.
	#[inline]
	fn needs_to_grow(&self, additional: usize) -> bool {
		additional > self.capacity().wrapping_sub(self.len())
	}

	fn required_capacity(&self, additional: usize) -> Result<usize> {
		let required = self.len().checked_add(additional).ok_or(Error::LengthExceeded {
			requested: usize::MAX,
			max: M::MAX_LENGTH
		})?;
		check_length::<M>(required)?;
		Ok(required)
	}

	/// Reserves capacity for at least `additional` more elements.
	///
	/// The buffer may reserve more space to avoid frequent reallocations.
	/// Does nothing if the capacity is already sufficient.
	pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
		if self.needs_to_grow(additional) {
			let required = self.required_capacity(additional)?;
			if self.is_spilled() {
				let capacity = cmp::max(self.meta.capacity().saturating_mul(2), required);
				// SAFETY: we just checked that the data is spilled.
				unsafe { self.grow(capacity) }
			} else {
				// SAFETY: we just checked that the data is inline.
				unsafe { self.spill(required) }
			}
		} else {
			Ok(())
		}
	}

	/// Reserves the minimum capacity for exactly `additional` more elements.
	///
	/// Leaving the inline storage still allocates at least `2 * N` elements.
	pub fn try_reserve_exact(&mut self, additional: usize) -> Result<()> {
		if self.needs_to_grow(additional) {
			let required = self.required_capacity(additional)?;
			if self.is_spilled() {
				// SAFETY: we just checked that the data is spilled.
				unsafe { self.grow(required) }
			} else {
				// SAFETY: we just checked that the data is inline.
				unsafe { self.spill(required) }
			}
		} else {
			Ok(())
		}
	}

	/// Reserves capacity for at least `additional` more elements.
	///
	/// # Panics
	///
	/// Panics if the new capacity exceeds `M::MAX_LENGTH`.
	#[inline]
	pub fn reserve(&mut self, additional: usize) {
		handle_reserve(self.try_reserve(additional))
	}

	/// Reserves the minimum capacity for exactly `additional` more elements.
	///
	/// # Panics
	///
	/// Panics if the new capacity exceeds `M::MAX_LENGTH`.
	#[inline]
	pub fn reserve_exact(&mut self, additional: usize) {
		handle_reserve(self.try_reserve_exact(additional))
	}

	/// Moves the inline data into a fresh heap allocation.
	///
	/// ## Safety
	///
	/// The caller must ensure that the data is indeed stored inline.
	unsafe fn spill(&mut self, required: usize) -> Result<()> {
		debug_assert!(!self.is_spilled());

		let capacity = Self::spill_capacity(required)?;
		let dst = allocate::<T, M>(capacity)?;

		let len = self.len();
		ptr::copy_nonoverlapping((*self.data.stack).as_ptr() as *const T, dst.as_ptr(), len);

		tracing::trace!(from = N, to = capacity, len, "spilling inline buffer to the heap");
		self.data.ptr = dst;
		self.meta.set_capacity(capacity);
		Ok(())
	}

	/// Grows the heap allocation to `capacity` elements.
	///
	/// ## Safety
	///
	/// The caller must ensure that the data is spilled and `capacity` is larger than the current one.
	unsafe fn grow(&mut self, capacity: usize) -> Result<()> {
		debug_assert!(self.is_spilled());

		let new_layout = array_layout::<T, M>(capacity)?;
		let (ptr, old_layout) = match self.current_memory() {
			Some(memory) => memory,
			None => return Ok(())
		};

		let new_ptr = alloc::realloc(ptr.as_ptr(), old_layout, new_layout.size());
		match NonNull::new(new_ptr as *mut T) {
			Some(new_ptr) => {
				tracing::trace!(from = self.meta.capacity(), to = capacity, "growing heap buffer");
				self.data.ptr = new_ptr;
				self.meta.set_capacity(capacity);
				Ok(())
			},
			None => {
				tracing::debug!(size = new_layout.size(), "heap buffer reallocation failed");
				Err(Error::out_of_memory(new_layout))
			}
		}
	}

	/// Moves the data back inline if it fits, releasing the heap allocation.
	///
	/// Does nothing if the data is already inline or if it does not fit in `N` elements.
	pub fn shrink_to_fit(&mut self) {
		let len = self.len();
		if len <= N {
			if let Some((ptr, layout)) = self.current_memory() {
				unsafe {
					// move to stack.
					let src = ptr.as_ptr() as *const T;
					let dst = (*self.data.stack).as_mut_ptr() as *mut T;
					ptr::copy_nonoverlapping(src, dst, len);
					self.meta.set_capacity(N);

					// free allocated memory.
					alloc::dealloc(ptr.as_ptr(), layout);
				}

				tracing::trace!(from = layout.size() / mem::size_of::<T>(), to = N, len, "moving heap buffer back inline");
			}
		}
	}
}

/// Checks that `len` is representable by the metadata format `M`.
#[inline]
pub(crate) fn check_length<M: Meta>(len: usize) -> Result<()> {
	if len > M::MAX_LENGTH {
		tracing::debug!(requested = len, max = M::MAX_LENGTH, "length limit exceeded");
		Err(Error::LengthExceeded {
			requested: len,
			max: M::MAX_LENGTH
		})
	} else {
		Ok(())
	}
}

fn array_layout<T, M: Meta>(capacity: usize) -> Result<Layout> {
	check_length::<M>(capacity)?;
	match Layout::array::<T>(capacity) {
		Ok(layout) if layout.size() <= isize::MAX as usize => Ok(layout),
		_ => Err(Error::LengthExceeded {
			requested: capacity,
			max: cmp::min(M::MAX_LENGTH, isize::MAX as usize / cmp::max(mem::size_of::<T>(), 1))
		})
	}
}

/// Allocates room for `capacity` elements on the heap.
///
/// `T` must not be zero-sized and `capacity` must not be zero.
fn allocate<T, M: Meta>(capacity: usize) -> Result<NonNull<T>> {
	let layout = array_layout::<T, M>(capacity)?;
	debug_assert_ne!(layout.size(), 0);

	// SAFETY: the layout has a non-zero size.
	let ptr = unsafe { alloc::alloc(layout) };
	match NonNull::new(ptr as *mut T) {
		Some(ptr) => Ok(ptr),
		None => {
			tracing::debug!(size = layout.size(), "heap buffer allocation failed");
			Err(Error::out_of_memory(layout))
		}
	}
}

// Central function for reserve error handling.
#[inline]
pub(crate) fn handle_reserve<T>(result: Result<T>) -> T {
	match result {
		Ok(t) => t,
		Err(e) => match e.layout() {
			Some(layout) => alloc::handle_alloc_error(layout),
			None => capacity_overflow(e)
		}
	}
}

// One central function responsible for reporting capacity overflows. This'll
// ensure that the code generation related to these panics is minimal as there's
// only one location which panics rather than a bunch throughout the module.
#[cold]
#[inline(never)]
fn capacity_overflow(e: Error) -> ! {
	panic!("capacity overflow: {}", e);
}
