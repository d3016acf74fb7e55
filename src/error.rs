//! Checked failures.
//!
//! Every fallible operation of this crate reports one of the [`Error`] kinds.
//! Caller bugs (out of range positions given to `insert`, calling an empty
//! [`Function`](crate::Function), ...) are not errors but contract violations,
//! see [`contract`](crate::contract).
use std::alloc::Layout;

/// Result type of the fallible operations of this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors reported by the checked operations of the containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// A bounds-checked access (`at`) was given an index past the end.
	#[error("index {index} is out of range for length {len}")]
	IndexOutOfRange {
		index: usize,
		len: usize
	},

	/// The requested length or capacity exceeds what the metadata format can represent.
	#[error("requested length {requested} exceeds the maximum size {max}")]
	LengthExceeded {
		requested: usize,
		max: usize
	},

	/// A variant was accessed as an alternative it does not currently hold.
	#[error("bad variant access: expected alternative {expected}, active alternative is {active}")]
	BadVariantAccess {
		expected: usize,
		active: usize
	},

	/// The global allocator could not satisfy the request.
	#[error("out of memory: failed to allocate {size} bytes (align {align})")]
	OutOfMemory {
		size: usize,
		align: usize
	}
}

impl Error {
	/// Allocation failure for the given layout.
	#[inline]
	pub(crate) fn out_of_memory(layout: Layout) -> Error {
		Error::OutOfMemory {
			size: layout.size(),
			align: layout.align()
		}
	}

	/// Returns the layout of a failed allocation, if this is an [`Error::OutOfMemory`].
	#[inline]
	pub fn layout(&self) -> Option<Layout> {
		match *self {
			Error::OutOfMemory { size, align } => Layout::from_size_align(size, align).ok(),
			_ => None
		}
	}
}

#[cfg(test)]
mod tests {
	use super::Error;

	fn takes_error(e: &dyn std::error::Error) -> String {
		e.to_string()
	}

	#[test]
	fn error_is_std_error() {
		let s = takes_error(&Error::IndexOutOfRange { index: 4, len: 2 });
		assert_eq!(s, "index 4 is out of range for length 2");
	}

	#[test]
	fn out_of_memory_keeps_layout() {
		let layout = std::alloc::Layout::from_size_align(64, 8).unwrap();
		let e = Error::out_of_memory(layout);
		assert_eq!(e.layout(), Some(layout));
		assert_eq!(Error::LengthExceeded { requested: 1, max: 0 }.layout(), None);
	}
}
