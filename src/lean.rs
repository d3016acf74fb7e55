//! Metadata format packing the length and capacity in a single `usize`.
//!
//! Only available on 64-bit targets. The maximum size is [`u32::MAX`].

/// Length in the high 32 bits, capacity in the low 32 bits.
#[derive(Clone, Copy, Debug)]
#[repr(transparent)]
pub struct Meta {
	data: usize
}

const CAP_MASK: usize = u32::MAX as usize;
const LEN_MASK: usize = (u32::MAX as usize) << 32;

impl crate::raw::Meta for Meta {
	const MAX_LENGTH: usize = u32::MAX as usize;

	#[inline]
	fn new(len: usize, capacity: usize) -> Self {
		crate::debug_contract!(len <= Self::MAX_LENGTH && capacity <= Self::MAX_LENGTH, "lean metadata overflow");

		Meta {
			data: len << 32 | capacity
		}
	}

	#[inline]
	fn len(&self) -> usize {
		self.data >> 32
	}

	#[inline]
	fn capacity(&self) -> usize {
		self.data & CAP_MASK
	}

	#[inline]
	fn set_len(&mut self, len: usize) {
		crate::debug_contract!(len <= Self::MAX_LENGTH, "lean metadata length overflow");
		self.data = (len << 32) | (self.data & CAP_MASK)
	}

	#[inline]
	fn set_capacity(&mut self, capacity: usize) {
		crate::debug_contract!(capacity <= Self::MAX_LENGTH, "lean metadata capacity overflow");
		self.data = (self.data & LEN_MASK) | capacity
	}
}

pub type Vector<T, const N: usize> = crate::vector::Vector<T, N, Meta>;
pub type SmallString<const N: usize = { crate::string::INLINE_BYTES }> = crate::string::SmallString<N, Meta>;
