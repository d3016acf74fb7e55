//! Metadata format storing the length and capacity on two `usize`.
//!
//! This is the default format. The maximum size depends on the bit-depth of the platform.

/// Length and capacity, one `usize` each.
#[derive(Clone, Copy, Debug)]
#[repr(C)]
pub struct Meta {
	len: usize,
	capacity: usize
}

impl crate::raw::Meta for Meta {
	const MAX_LENGTH: usize = isize::MAX as usize;

	#[inline]
	fn new(len: usize, capacity: usize) -> Self {
		Meta {
			len,
			capacity
		}
	}

	#[inline]
	fn len(&self) -> usize {
		self.len
	}

	#[inline]
	fn capacity(&self) -> usize {
		self.capacity
	}

	#[inline]
	fn set_len(&mut self, len: usize) {
		self.len = len
	}

	#[inline]
	fn set_capacity(&mut self, capacity: usize) {
		self.capacity = capacity
	}
}

pub type Vector<T, const N: usize> = crate::vector::Vector<T, N, Meta>;
pub type SmallString<const N: usize = { crate::string::INLINE_BYTES }> = crate::string::SmallString<N, Meta>;
