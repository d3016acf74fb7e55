use core::{
	borrow::{
		Borrow,
		BorrowMut
	},
	cmp::Ordering,
	hash::{
		Hash,
		Hasher
	},
	iter::FusedIterator,
	mem::{
		self,
		ManuallyDrop,
		MaybeUninit
	},
	ops::{
		Bound,
		Deref,
		DerefMut,
		Range,
		RangeBounds
	},
	fmt,
	ptr
};
use crate::{
	error::{
		Error,
		Result
	},
	raw::{
		Meta,
		RawBuffer
	},
	wide
};

/// Contiguous growable array type, stored inline up to `N` elements.
///
/// This type behaves just like a `Vec<T>` but keeps its first `N` elements
/// inside the value itself, just like [`SmallVec`](https://crates.io/crates/smallvec).
/// The data is moved on the heap only when the length exceeds `N`,
/// and moved back inline by [`shrink_to_fit`](Vector::shrink_to_fit) when it fits again.
///
/// The maximum capacity of a `Vector` depends on the metadata format used
/// which is given as type parameter `M`, implementing the [`Meta`] trait.
/// By default the [`wide::Meta`] is used, which behaves just like `Vec`.
///
/// The layout is `#[repr(C)]`: the metadata followed by the inline array
/// (or the heap pointer).
///
/// # Examples
///
/// ```
/// # use calf_stable::Vector;
/// let mut v: Vector<u8, 4> = Vector::new();
/// v.extend_from_slice(&[1, 2, 3, 4]);
/// assert!(!v.is_spilled());
/// v.push(5); // <- here the length now exceeds the inline capacity (4).
///            //    the data is hence moved on the heap, transparently.
/// assert!(v.is_spilled());
/// assert_eq!(v, [1, 2, 3, 4, 5]);
/// ```
#[repr(C)]
pub struct Vector<T, const N: usize, M: Meta = wide::Meta> {
	buf: RawBuffer<T, N, M>
}

impl<T, const N: usize, M: Meta> Drop for Vector<T, N, M> {
	fn drop(&mut self) {
		unsafe {
			// drop every element, the memory is freed by the raw buffer.
			ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.buf.as_mut_ptr(), self.len()))
		}
	}
}

impl<T, const N: usize, M: Meta> Vector<T, N, M> {
	/// Creates a new empty `Vector`.
	///
	/// The vector will not allocate until more than `N` elements are pushed onto it.
	#[inline]
	pub fn new() -> Self {
		Vector {
			buf: RawBuffer::new()
		}
	}

	/// Creates a new empty `Vector` with a particular capacity.
	///
	/// The actual capacity of the created `Vector` will be at least `N`.
	///
	/// # Panics
	///
	/// Panics if the capacity exceeds [`max_size`](Vector::max_size).
	#[inline]
	pub fn with_capacity(capacity: usize) -> Self {
		Vector {
			buf: RawBuffer::with_capacity(capacity)
		}
	}

	/// The same as `with_capacity`, but returns on errors instead of panicking or aborting.
	#[inline]
	pub fn try_with_capacity(capacity: usize) -> Result<Self> {
		Ok(Vector {
			buf: RawBuffer::try_with_capacity(capacity)?
		})
	}

	/// Maximum length of a vector using the metadata format `M`.
	#[inline]
	pub const fn max_size() -> usize {
		M::MAX_LENGTH
	}

	/// Returns the number of elements in the vector.
	#[inline]
	pub fn len(&self) -> usize {
		self.buf.len()
	}

	/// Returns `true` if the vector contains no elements.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Forces the length of the vector to `len`.
	///
	/// # Safety
	///
	/// `len` must be less than or equal to [`capacity`](Vector::capacity),
	/// and the elements at `old_len..len` must be initialized.
	#[inline]
	pub unsafe fn set_len(&mut self, len: usize) {
		self.buf.set_len(len)
	}

	/// Returns the number of elements the vector can hold without reallocating.
	///
	/// This is `N` as long as the data is inline.
	#[inline]
	pub fn capacity(&self) -> usize {
		self.buf.capacity()
	}

	/// Returns `true` if the data is stored on the heap,
	/// `false` if it is stored inline.
	#[inline]
	pub fn is_spilled(&self) -> bool {
		self.buf.is_spilled()
	}

	/// Returns a raw pointer to the vector's buffer.
	///
	/// The caller must ensure that the vector outlives the pointer this
	/// function returns, or else it will end up pointing to garbage.
	/// Modifying or moving the vector may invalidate the pointer:
	/// as long as the data is inline, it lives inside the vector itself.
	#[inline]
	pub fn as_ptr(&self) -> *const T {
		self.buf.as_ptr()
	}

	/// Returns an unsafe mutable pointer to the vector's buffer.
	#[inline]
	pub fn as_mut_ptr(&mut self) -> *mut T {
		self.buf.as_mut_ptr()
	}

	/// Extracts a slice containing the entire vector.
	#[inline]
	pub fn as_slice(&self) -> &[T] {
		unsafe {
			std::slice::from_raw_parts(self.as_ptr(), self.len())
		}
	}

	/// Extracts a mutable slice of the entire vector.
	#[inline]
	pub fn as_mut_slice(&mut self) -> &mut [T] {
		unsafe {
			std::slice::from_raw_parts_mut(self.as_mut_ptr(), self.len())
		}
	}

	/// Returns the remaining spare capacity of the vector as a slice of
	/// `MaybeUninit<T>`.
	///
	/// The returned slice can be used to fill the vector with data before
	/// marking the data as initialized using the [`set_len`] method.
	///
	/// [`set_len`]: Vector::set_len
	#[inline]
	pub fn spare_capacity_mut(&mut self) -> &mut [MaybeUninit<T>] {
		let len = self.len();
		let capacity = self.capacity();
		unsafe {
			std::slice::from_raw_parts_mut(self.as_mut_ptr().add(len) as *mut MaybeUninit<T>, capacity - len)
		}
	}

	/// Returns a reference to the element at `index`.
	///
	/// Fails with [`Error::IndexOutOfRange`] if `index >= len`.
	#[inline]
	pub fn at(&self, index: usize) -> Result<&T> {
		let len = self.len();
		self.as_slice().get(index).ok_or(Error::IndexOutOfRange { index, len })
	}

	/// Returns a mutable reference to the element at `index`.
	///
	/// Fails with [`Error::IndexOutOfRange`] if `index >= len`.
	#[inline]
	pub fn at_mut(&mut self, index: usize) -> Result<&mut T> {
		let len = self.len();
		self.as_mut_slice().get_mut(index).ok_or(Error::IndexOutOfRange { index, len })
	}

	/// The same as `reserve`, but returns on errors instead of panicking or aborting.
	#[inline]
	pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
		self.buf.try_reserve(additional)
	}

	/// Reserves capacity for at least `additional` more elements to be inserted
	/// in the given `Vector<T>`. The collection may reserve more space to avoid
	/// frequent reallocations. After calling `reserve`, capacity will be
	/// greater than or equal to `self.len() + additional`. Does nothing if
	/// capacity is already sufficient.
	///
	/// # Panics
	///
	/// Panics if the new capacity exceeds `M::MAX_LENGTH`.
	#[inline]
	pub fn reserve(&mut self, additional: usize) {
		self.buf.reserve(additional)
	}

	/// The same as `reserve_exact`, but returns on errors instead of panicking or aborting.
	#[inline]
	pub fn try_reserve_exact(&mut self, additional: usize) -> Result<()> {
		self.buf.try_reserve_exact(additional)
	}

	/// Reserves the minimum capacity for exactly `additional` more elements to
	/// be inserted in the given `Vector<T>`.
	///
	/// Leaving the inline storage still allocates room for at least `2 * N` elements.
	///
	/// # Panics
	///
	/// Panics if the new capacity exceeds `M::MAX_LENGTH`.
	#[inline]
	pub fn reserve_exact(&mut self, additional: usize) {
		self.buf.reserve_exact(additional)
	}

	/// Moves the data back inline if the length fits in `N`, releasing the heap memory.
	///
	/// Has no effect otherwise.
	#[inline]
	pub fn shrink_to_fit(&mut self) {
		self.buf.shrink_to_fit()
	}

	/// Swaps the contents of two vectors.
	///
	/// Heap buffers are exchanged by pointer, inline buffers byte by byte.
	#[inline]
	pub fn swap(&mut self, other: &mut Self) {
		mem::swap(self, other)
	}

	/// Shortens the vector, keeping the first `len` elements and dropping
	/// the rest.
	///
	/// If `len` is greater than the vector's current length, this has no
	/// effect.
	///
	/// Note that this method has no effect on the allocated capacity
	/// of the vector.
	#[inline]
	pub fn truncate(&mut self, len: usize) {
		unsafe {
			if len > self.len() {
				return;
			}

			let remaining_len = self.len() - len;
			let s = ptr::slice_from_raw_parts_mut(self.as_mut_ptr().add(len), remaining_len);
			self.set_len(len);
			ptr::drop_in_place(s);
		}
	}

	/// Clears the vector, removing all values.
	///
	/// Note that this method has no effect on the allocated capacity
	/// of the vector.
	#[inline]
	pub fn clear(&mut self) {
		self.truncate(0)
	}

	/// Appends an element to the back of a collection.
	///
	/// # Panics
	///
	/// Panics if the new capacity exceeds `M::MAX_LENGTH`.
	#[inline]
	pub fn push(&mut self, value: T) {
		let len = self.len();
		if len == self.capacity() {
			self.reserve(1);
		}

		unsafe {
			ptr::write(self.as_mut_ptr().add(len), value);
			self.set_len(len + 1);
		}
	}

	/// The same as `push`, but gives the value back on errors instead of panicking or aborting.
	pub fn try_push(&mut self, value: T) -> Result<(), (T, Error)> {
		let len = self.len();
		if len == self.capacity() {
			if let Err(e) = self.try_reserve(1) {
				return Err((value, e))
			}
		}

		unsafe {
			ptr::write(self.as_mut_ptr().add(len), value);
			self.set_len(len + 1);
		}

		Ok(())
	}

	/// Removes the last element from a vector and returns it, or [`None`] if it
	/// is empty.
	#[inline]
	pub fn pop(&mut self) -> Option<T> {
		if self.len() == 0 {
			None
		} else {
			unsafe {
				self.set_len(self.len() - 1);
				Some(ptr::read(self.as_ptr().add(self.len())))
			}
		}
	}

	/// Inserts an element at position `index` within the vector, shifting all
	/// elements after it to the right.
	///
	/// # Panics
	///
	/// Panics if `index > len`.
	pub fn insert(&mut self, index: usize, element: T) {
		let len = self.len();
		crate::contract!(index <= len, "insertion index (is {}) should be <= len (which is {})", index, len);

		// space for the new element
		if len == self.capacity() {
			self.reserve(1);
		}

		unsafe {
			// infallible
			// The spot to put the new value
			{
				let p = self.as_mut_ptr().add(index);
				// Shift everything over to make space. (Duplicating the
				// `index`th element into two consecutive places.)
				ptr::copy(p, p.add(1), len - index);
				// Write it in, overwriting the first copy of the `index`th
				// element.
				ptr::write(p, element);
			}
			self.set_len(len + 1);
		}
	}

	/// Inserts every element produced by `iter` at position `index`.
	///
	/// The iterator can only be walked once and its length is unknown,
	/// so the elements are first collected in a temporary vector before being
	/// moved in place.
	///
	/// # Panics
	///
	/// Panics if `index > len`.
	pub fn insert_iter<I: IntoIterator<Item = T>>(&mut self, index: usize, iter: I) {
		let len = self.len();
		crate::contract!(index <= len, "insertion index (is {}) should be <= len (which is {})", index, len);

		if index == len {
			self.extend(iter);
			return
		}

		let mut tmp: Vector<T, N, M> = iter.into_iter().collect();
		let count = tmp.len();
		self.reserve(count);

		unsafe {
			let p = self.as_mut_ptr().add(index);
			ptr::copy(p, p.add(count), len - index);
			ptr::copy_nonoverlapping(tmp.as_ptr(), p, count);
			tmp.set_len(0);
			self.set_len(len + count);
		}
	}

	/// Moves all the elements of `other` into `self`, leaving `other` empty.
	///
	/// # Panics
	///
	/// Panics if the number of elements in the vector overflows.
	pub fn append<const K: usize, O: Meta>(&mut self, other: &mut Vector<T, K, O>) {
		let count = other.len();
		self.reserve(count);
		unsafe {
			let len = self.len();
			ptr::copy_nonoverlapping(other.as_ptr(), self.as_mut_ptr().add(len), count);
			other.set_len(0);
			self.set_len(len + count);
		}
	}

	/// Removes and returns the element at position `index` within the vector,
	/// shifting all elements after it to the left.
	///
	/// # Panics
	///
	/// Panics if `index` is out of bounds.
	pub fn remove(&mut self, index: usize) -> T {
		let len = self.len();
		crate::contract!(index < len, "removal index (is {}) should be < len (is {})", index, len);

		unsafe {
			// infallible
			let ret;
			{
				// the place we are taking from.
				let ptr = self.as_mut_ptr().add(index);
				// copy it out, unsafely having a copy of the value on
				// the stack and in the vector at the same time.
				ret = ptr::read(ptr);

				// Shift everything down to fill in that spot.
				ptr::copy(ptr.add(1), ptr, len - index - 1);
			}
			self.set_len(len - 1);
			ret
		}
	}

	/// Removes an element from the vector and returns it.
	///
	/// The removed element is replaced by the last element of the vector.
	///
	/// # Panics
	///
	/// Panics if `index` is out of bounds.
	pub fn swap_remove(&mut self, index: usize) -> T {
		let len = self.len();
		crate::contract!(index < len, "swap_remove index (is {}) should be < len (is {})", index, len);

		unsafe {
			let base = self.as_mut_ptr();
			let value = ptr::read(base.add(index));
			ptr::copy(base.add(len - 1), base.add(index), 1);
			self.set_len(len - 1);
			value
		}
	}

	/// Removes the elements in `range`, shifting the following elements to the left.
	///
	/// # Panics
	///
	/// Panics if the range is decreasing or ends past the length.
	pub fn erase<R: RangeBounds<usize>>(&mut self, range: R) {
		let len = self.len();
		let Range { start, end } = resolve_range(range, len);
		let count = end - start;

		unsafe {
			// if an element panics while dropped, the tail is leaked rather than dropped twice.
			self.set_len(start);
			let base = self.as_mut_ptr();
			ptr::drop_in_place(ptr::slice_from_raw_parts_mut(base.add(start), count));
			ptr::copy(base.add(end), base.add(start), len - end);
			self.set_len(len - count);
		}
	}

	/// Retains only the elements specified by the predicate.
	///
	/// The elements are visited exactly once, in order, and the order of the
	/// retained elements is preserved.
	pub fn retain<F>(&mut self, mut f: F) where F: FnMut(&T) -> bool {
		let len = self.len();
		let mut deleted = 0;

		unsafe {
			// elements are leaked if `f` panics.
			self.set_len(0);
			let base = self.as_mut_ptr();
			for i in 0..len {
				let current = base.add(i);
				if !f(&*current) {
					ptr::drop_in_place(current);
					deleted += 1;
				} else if deleted > 0 {
					ptr::copy_nonoverlapping(current, base.add(i - deleted), 1);
				}
			}
			self.set_len(len - deleted);
		}
	}

	/// Removes all but the first of consecutive elements in the vector satisfying a given equality
	/// relation.
	///
	/// The `same_bucket` function is passed references to two elements from the vector and
	/// must determine if the elements compare equal. The elements are passed in opposite order
	/// from their order in the slice, so if `same_bucket(a, b)` returns `true`, `a` is removed.
	///
	/// If the vector is sorted, this removes all duplicates.
	pub fn dedup_by<F>(&mut self, mut same_bucket: F) where F: FnMut(&mut T, &mut T) -> bool {
		let len = self.len();
		if len <= 1 {
			return
		}

		unsafe {
			// elements are leaked if `same_bucket` panics.
			self.set_len(0);
			let base = self.as_mut_ptr();
			let mut write = 1;
			for read in 1..len {
				let current = base.add(read);
				let previous = base.add(write - 1);
				if same_bucket(&mut *current, &mut *previous) {
					ptr::drop_in_place(current);
				} else {
					if read != write {
						ptr::copy_nonoverlapping(current, base.add(write), 1);
					}
					write += 1;
				}
			}
			self.set_len(write);
		}
	}

	/// Removes all but the first of consecutive elements in the vector that resolve to the same
	/// key.
	///
	/// If the vector is sorted, this removes all duplicates.
	#[inline]
	pub fn dedup_by_key<F, K>(&mut self, mut key: F) where F: FnMut(&mut T) -> K, K: PartialEq {
		self.dedup_by(|a, b| key(a) == key(b))
	}

	/// Removes consecutive repeated elements in the vector according to the
	/// [`PartialEq`] trait implementation.
	///
	/// If the vector is sorted, this removes all duplicates.
	#[inline]
	pub fn dedup(&mut self) where T: PartialEq {
		self.dedup_by(|a, b| a == b)
	}

	/// Resizes the `Vector` in-place so that `len` is equal to `new_len`,
	/// filling the new slots with the values returned by `f`.
	pub fn resize_with<F>(&mut self, new_len: usize, f: F) where F: FnMut() -> T {
		let len = self.len();
		if new_len > len {
			self.extend_with(new_len - len, ExtendFunc(f))
		} else {
			self.truncate(new_len);
		}
	}

	/// Replaces the content of the vector with the elements of `iter`.
	#[inline]
	pub fn assign<I: IntoIterator<Item = T>>(&mut self, iter: I) {
		self.clear();
		self.extend(iter)
	}

	/// Extend the vector by `n` values, using the given generator.
	fn extend_with<E: ExtendWith<T>>(&mut self, n: usize, mut value: E) {
		self.reserve(n);

		unsafe {
			let mut ptr = self.as_mut_ptr().add(self.len());
			// Use SetLenOnDrop to work around bug where compiler
			// may not realize the store through `ptr` through self.set_len()
			// don't alias.
			let mut local_len = SetLenOnDrop::new(&mut self.buf);

			// Write all elements except the last one
			for _ in 1..n {
				ptr::write(ptr, value.next());
				ptr = ptr.add(1);
				// Increment the length in every step in case next() panics
				local_len.increment_len(1);
			}

			if n > 0 {
				// We can write the last element directly without cloning needlessly
				ptr::write(ptr, value.last());
				local_len.increment_len(1);
			}

			// len set by scope guard
		}
	}
}

impl<T, const N: usize, M: Meta> Vector<T, N, M> where T: Clone {
	/// Creates a vector holding `count` clones of `value`.
	#[inline]
	pub fn from_elem(value: T, count: usize) -> Self {
		let mut vec = Vector::with_capacity(count);
		vec.extend_with(count, ExtendElement(value));
		vec
	}

	/// Resizes the `Vector` in-place so that `len` is equal to `new_len`.
	///
	/// If `new_len` is greater than `len`, the `Vector` is extended by the
	/// difference, with each additional slot filled with `value`.
	/// If `new_len` is less than `len`, the `Vector` is simply truncated.
	pub fn resize(&mut self, new_len: usize, value: T) {
		let len = self.len();

		if new_len > len {
			self.extend_with(new_len - len, ExtendElement(value))
		} else {
			self.truncate(new_len);
		}
	}

	/// Clones and appends all elements in a slice to the `Vector`.
	#[inline]
	pub fn extend_from_slice(&mut self, other: &[T]) {
		let len = self.len();
		self.insert_slice(len, other)
	}

	/// Inserts `count` clones of `value` at position `index`.
	///
	/// # Panics
	///
	/// Panics if `index > len`.
	pub fn insert_n(&mut self, index: usize, count: usize, value: T) {
		let len = self.len();
		crate::contract!(index <= len, "insertion index (is {}) should be <= len (which is {})", index, len);
		self.reserve(count);

		unsafe {
			let mut gap = Gap::open(self, index, count);
			for _ in 1..count {
				gap.write(value.clone());
			}

			if count > 0 {
				gap.write(value);
			}
		}
	}

	/// Inserts clones of the elements of `slice` at position `index`.
	///
	/// # Panics
	///
	/// Panics if `index > len`.
	pub fn insert_slice(&mut self, index: usize, slice: &[T]) {
		let len = self.len();
		crate::contract!(index <= len, "insertion index (is {}) should be <= len (which is {})", index, len);
		self.reserve(slice.len());

		unsafe {
			let mut gap = Gap::open(self, index, slice.len());
			for value in slice {
				gap.write(value.clone());
			}
		}
	}

	/// Inserts clones of the elements at `range` of this very vector at position `index`.
	///
	/// The source range may overlap the insertion point.
	/// Its position is resolved before the buffer is reallocated, and the source
	/// elements shifted to the right of the gap are read from their new place.
	///
	/// # Panics
	///
	/// Panics if `index > len` or if the range is out of bounds.
	pub fn insert_within<R: RangeBounds<usize>>(&mut self, index: usize, range: R) {
		let len = self.len();
		crate::contract!(index <= len, "insertion index (is {}) should be <= len (which is {})", index, len);
		let Range { start, end } = resolve_range(range, len);
		let count = end - start;
		self.reserve(count);

		unsafe {
			let mut gap = Gap::open(self, index, count);
			for p in start..end {
				let source = if p < index { p } else { p + count };
				let value = (*gap.as_ptr().add(source)).clone();
				gap.write(value);
			}
		}
	}

	/// Clones the elements at `range` and appends them to the vector.
	///
	/// # Panics
	///
	/// Panics if the range is out of bounds.
	#[inline]
	pub fn extend_from_within<R: RangeBounds<usize>>(&mut self, range: R) {
		let len = self.len();
		self.insert_within(len, range)
	}
}

/// Resolves a range against a length.
///
/// Decreasing or out of bounds ranges are contract violations.
pub(crate) fn resolve_range<R: RangeBounds<usize>>(range: R, len: usize) -> Range<usize> {
	let start = match range.start_bound() {
		Bound::Included(&n) => n,
		Bound::Excluded(&n) => n.checked_add(1).unwrap_or(usize::MAX),
		Bound::Unbounded => 0
	};

	let end = match range.end_bound() {
		Bound::Included(&n) => n.checked_add(1).unwrap_or(usize::MAX),
		Bound::Excluded(&n) => n,
		Bound::Unbounded => len
	};

	crate::contract!(start <= end, "range starts at {} but ends at {}", start, end);
	crate::contract!(end <= len, "range end (is {}) should be <= len (is {})", end, len);
	start..end
}

/// A hole opened in the middle of a vector.
///
/// The elements after `index` are moved `count` slots to the right, and the
/// hole is then filled one element at a time. If filling stops early (a clone
/// panicked), the tail is moved back against the filled elements so the
/// vector stays contiguous.
struct Gap<'v, T, const N: usize, M: Meta> {
	vec: &'v mut Vector<T, N, M>,
	index: usize,
	count: usize,
	filled: usize,
	tail: usize
}

impl<'v, T, const N: usize, M: Meta> Gap<'v, T, N, M> {
	/// ## Safety
	///
	/// The vector must have room for `count` more elements and `index <= len`.
	unsafe fn open(vec: &'v mut Vector<T, N, M>, index: usize, count: usize) -> Self {
		let len = vec.len();
		let tail = len - index;
		let p = vec.as_mut_ptr().add(index);
		ptr::copy(p, p.add(count), tail);
		vec.set_len(index);

		Gap {
			vec,
			index,
			count,
			filled: 0,
			tail
		}
	}

	#[inline]
	fn as_ptr(&self) -> *const T {
		self.vec.as_ptr()
	}

	/// ## Safety
	///
	/// Must be called at most `count` times.
	#[inline]
	unsafe fn write(&mut self, value: T) {
		debug_assert!(self.filled < self.count);
		ptr::write(self.vec.as_mut_ptr().add(self.index + self.filled), value);
		self.filled += 1;
	}
}

impl<'v, T, const N: usize, M: Meta> Drop for Gap<'v, T, N, M> {
	fn drop(&mut self) {
		unsafe {
			if self.filled < self.count {
				let base = self.vec.as_mut_ptr().add(self.index);
				ptr::copy(base.add(self.count), base.add(self.filled), self.tail);
			}

			self.vec.set_len(self.index + self.filled + self.tail);
		}
	}
}

// Set the length of the vec when the `SetLenOnDrop` value goes out of scope.
//
// The idea is: The length field in SetLenOnDrop is a local variable
// that the optimizer will see does not alias with any stores through the Vec's data
// pointer. This is a workaround for alias analysis issue #32155
struct SetLenOnDrop<'a, T, const N: usize, M: Meta> {
	buf: &'a mut RawBuffer<T, N, M>,
	local_len: usize
}

impl<'a, T, const N: usize, M: Meta> SetLenOnDrop<'a, T, N, M> {
	#[inline]
	fn new(buf: &'a mut RawBuffer<T, N, M>) -> Self {
		SetLenOnDrop { local_len: buf.len(), buf }
	}

	#[inline]
	fn increment_len(&mut self, increment: usize) {
		self.local_len += increment;
	}
}

impl<T, const N: usize, M: Meta> Drop for SetLenOnDrop<'_, T, N, M> {
	#[inline]
	fn drop(&mut self) {
		unsafe {
			self.buf.set_len(self.local_len)
		}
	}
}

// This code generalizes `extend_with_{element,default}`.
trait ExtendWith<T> {
	fn next(&mut self) -> T;
	fn last(self) -> T;
}

struct ExtendElement<T>(T);
impl<T: Clone> ExtendWith<T> for ExtendElement<T> {
	fn next(&mut self) -> T {
		self.0.clone()
	}
	fn last(self) -> T {
		self.0
	}
}

struct ExtendFunc<F>(F);
impl<T, F: FnMut() -> T> ExtendWith<T> for ExtendFunc<F> {
	fn next(&mut self) -> T {
		(self.0)()
	}
	fn last(mut self) -> T {
		(self.0)()
	}
}

impl<T, const N: usize, M: Meta> Default for Vector<T, N, M> {
	#[inline]
	fn default() -> Self {
		Vector::new()
	}
}

impl<T: Clone, const N: usize, M: Meta> Clone for Vector<T, N, M> {
	fn clone(&self) -> Vector<T, N, M> {
		let mut vec = Vector::with_capacity(self.len());
		vec.extend_from_slice(self);
		vec
	}
}

unsafe impl<T: Send, const N: usize, M: Meta + Send> Send for Vector<T, N, M> {}
unsafe impl<T: Sync, const N: usize, M: Meta + Sync> Sync for Vector<T, N, M> {}

impl<T, const N: usize, M: Meta> Deref for Vector<T, N, M> {
	type Target = [T];

	#[inline]
	fn deref(&self) -> &[T] {
		self.as_slice()
	}
}

impl<T, const N: usize, M: Meta> DerefMut for Vector<T, N, M> {
	#[inline]
	fn deref_mut(&mut self) -> &mut [T] {
		self.as_mut_slice()
	}
}

impl<'v, T, const N: usize, M: Meta> IntoIterator for &'v Vector<T, N, M> {
	type Item = &'v T;
	type IntoIter = std::slice::Iter<'v, T>;

	fn into_iter(self) -> Self::IntoIter {
		self.as_slice().iter()
	}
}

impl<'v, T, const N: usize, M: Meta> IntoIterator for &'v mut Vector<T, N, M> {
	type Item = &'v mut T;
	type IntoIter = std::slice::IterMut<'v, T>;

	fn into_iter(self) -> Self::IntoIter {
		self.as_mut_slice().iter_mut()
	}
}

/// An iterator that moves out of a vector.
pub struct IntoIter<T, const N: usize, M: Meta> {
	buf: RawBuffer<T, N, M>,
	start: usize,
	end: usize
}

impl<T, const N: usize, M: Meta> IntoIter<T, N, M> {
	/// Returns the remaining items of this iterator as a slice.
	#[inline]
	pub fn as_slice(&self) -> &[T] {
		unsafe {
			std::slice::from_raw_parts(self.buf.as_ptr().add(self.start), self.end - self.start)
		}
	}
}

impl<T, const N: usize, M: Meta> Iterator for IntoIter<T, N, M> {
	type Item = T;

	#[inline]
	fn next(&mut self) -> Option<T> {
		if self.start < self.end {
			let i = self.start;
			self.start += 1;
			unsafe { Some(ptr::read(self.buf.as_ptr().add(i))) }
		} else {
			None
		}
	}

	#[inline]
	fn size_hint(&self) -> (usize, Option<usize>) {
		let len = self.end - self.start;
		(len, Some(len))
	}
}

impl<T, const N: usize, M: Meta> DoubleEndedIterator for IntoIter<T, N, M> {
	#[inline]
	fn next_back(&mut self) -> Option<T> {
		if self.start < self.end {
			self.end -= 1;
			unsafe { Some(ptr::read(self.buf.as_ptr().add(self.end))) }
		} else {
			None
		}
	}
}

impl<T, const N: usize, M: Meta> ExactSizeIterator for IntoIter<T, N, M> {}
impl<T, const N: usize, M: Meta> FusedIterator for IntoIter<T, N, M> {}

impl<T: fmt::Debug, const N: usize, M: Meta> fmt::Debug for IntoIter<T, N, M> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
	}
}

impl<T, const N: usize, M: Meta> Drop for IntoIter<T, N, M> {
	fn drop(&mut self) {
		unsafe {
			// only drop remaining elements, the memory is freed by the raw buffer.
			let remaining = ptr::slice_from_raw_parts_mut(self.buf.as_mut_ptr().add(self.start), self.end - self.start);
			ptr::drop_in_place(remaining)
		}
	}
}

impl<T, const N: usize, M: Meta> IntoIterator for Vector<T, N, M> {
	type Item = T;
	type IntoIter = IntoIter<T, N, M>;

	fn into_iter(self) -> Self::IntoIter {
		let this = ManuallyDrop::new(self);
		let end = this.len();
		// this is safe because `this` is never used nor dropped ever after.
		let mut buf = unsafe { ptr::read(&this.buf) };
		unsafe { buf.set_len(0) }

		IntoIter {
			buf,
			start: 0,
			end
		}
	}
}

impl<T, const N: usize, M: Meta> Extend<T> for Vector<T, N, M> {
	#[inline]
	fn extend<I: IntoIterator<Item = T>>(&mut self, iterator: I) {
		let mut iterator = iterator.into_iter();
		while let Some(element) = iterator.next() {
			let len = self.len();
			if len == self.capacity() {
				let (lower, _) = iterator.size_hint();
				self.reserve(lower.saturating_add(1));
			}
			unsafe {
				ptr::write(self.as_mut_ptr().add(len), element);
				// NB can't overflow since we would have had to alloc the address space
				self.set_len(len + 1);
			}
		}
	}
}

impl<'a, T: Copy + 'a, const N: usize, M: Meta> Extend<&'a T> for Vector<T, N, M> {
	#[inline]
	fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iterator: I) {
		Extend::<T>::extend(self, iterator.into_iter().copied())
	}
}

impl<T, const N: usize, M: Meta> FromIterator<T> for Vector<T, N, M> {
	#[inline]
	fn from_iter<I: IntoIterator<Item = T>>(iterator: I) -> Self {
		let mut vec = Vector::new();
		vec.extend(iterator);
		vec
	}
}

impl<T: fmt::Debug, const N: usize, M: Meta> fmt::Debug for Vector<T, N, M> {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&**self, f)
	}
}

impl<T, const N: usize, M: Meta> AsRef<[T]> for Vector<T, N, M> {
	#[inline]
	fn as_ref(&self) -> &[T] {
		self
	}
}

impl<T, const N: usize, M: Meta> AsMut<[T]> for Vector<T, N, M> {
	#[inline]
	fn as_mut(&mut self) -> &mut [T] {
		self
	}
}

impl<T, const N: usize, M: Meta> Borrow<[T]> for Vector<T, N, M> {
	#[inline]
	fn borrow(&self) -> &[T] {
		self
	}
}

impl<T, const N: usize, M: Meta> BorrowMut<[T]> for Vector<T, N, M> {
	#[inline]
	fn borrow_mut(&mut self) -> &mut [T] {
		self
	}
}

impl<'a, T: Clone, const N: usize, M: Meta> From<&'a [T]> for Vector<T, N, M> {
	#[inline]
	fn from(s: &'a [T]) -> Vector<T, N, M> {
		let mut vec = Vector::with_capacity(s.len());
		vec.extend_from_slice(s);
		vec
	}
}

impl<T, const N: usize, M: Meta, const K: usize> From<[T; K]> for Vector<T, N, M> {
	#[inline]
	fn from(array: [T; K]) -> Vector<T, N, M> {
		let mut vec = Vector::with_capacity(K);
		vec.extend(array);
		vec
	}
}

impl<T, const N: usize, M: Meta> From<Vec<T>> for Vector<T, N, M> {
	fn from(mut v: Vec<T>) -> Vector<T, N, M> {
		let count = v.len();
		let mut vec = Vector::with_capacity(count);
		unsafe {
			ptr::copy_nonoverlapping(v.as_ptr(), vec.as_mut_ptr(), count);
			v.set_len(0);
			vec.set_len(count);
		}
		vec
	}
}

impl<T, const N: usize, M: Meta> From<Vector<T, N, M>> for Vec<T> {
	#[inline]
	fn from(vec: Vector<T, N, M>) -> Vec<T> {
		vec.into_iter().collect()
	}
}

macro_rules! impl_slice_eq1 {
	([$($vars:tt)*] $lhs:ty, $rhs:ty) => {
		impl<$($vars)*> PartialEq<$rhs> for $lhs where T: PartialEq<U> {
			#[inline]
			fn eq(&self, other: &$rhs) -> bool { self[..] == other[..] }
		}
	}
}

impl_slice_eq1! { [T, U, O: Meta, P: Meta, const N: usize, const K: usize] Vector<T, N, O>, Vector<U, K, P> }
impl_slice_eq1! { [T, U, M: Meta, const N: usize] Vector<T, N, M>, Vec<U> }
impl_slice_eq1! { [T, U, M: Meta, const N: usize] Vec<T>, Vector<U, N, M> }
impl_slice_eq1! { [T, U, M: Meta, const N: usize] Vector<T, N, M>, [U] }
impl_slice_eq1! { [T, U, M: Meta, const N: usize] Vector<T, N, M>, &[U] }
impl_slice_eq1! { [T, U, M: Meta, const N: usize] Vector<T, N, M>, &mut [U] }
impl_slice_eq1! { [T, U, M: Meta, const N: usize] &[T], Vector<U, N, M> }
impl_slice_eq1! { [T, U, M: Meta, const N: usize, const K: usize] Vector<T, N, M>, [U; K] }
impl_slice_eq1! { [T, U, M: Meta, const N: usize, const K: usize] Vector<T, N, M>, &[U; K] }

impl<T: Eq, const N: usize, M: Meta> Eq for Vector<T, N, M> {}

impl<T: PartialOrd, const N: usize, M: Meta> PartialOrd for Vector<T, N, M> {
	#[inline]
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		self.as_slice().partial_cmp(other.as_slice())
	}
}

impl<T: Ord, const N: usize, M: Meta> Ord for Vector<T, N, M> {
	#[inline]
	fn cmp(&self, other: &Self) -> Ordering {
		self.as_slice().cmp(other.as_slice())
	}
}

impl<T: Hash, const N: usize, M: Meta> Hash for Vector<T, N, M> {
	#[inline]
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.as_slice().hash(state)
	}
}

/// Creates a [`Vector`](crate::Vector) containing the arguments.
///
/// ```
/// # use calf_stable::{vector, Vector};
/// let v: Vector<u32, 4> = vector![1, 2, 3];
/// assert_eq!(v, [1, 2, 3]);
///
/// let w: Vector<u32, 4> = vector![7; 6];
/// assert_eq!(w, [7; 6]);
/// assert!(w.is_spilled());
/// ```
#[macro_export]
macro_rules! vector {
	() => {
		$crate::Vector::new()
	};
	($elem:expr; $n:expr) => {
		$crate::Vector::from_elem($elem, $n)
	};
	($($x:expr),+ $(,)?) => {
		$crate::Vector::from([$($x),+])
	};
}
