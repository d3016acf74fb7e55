use std::{
	borrow::{
		Borrow,
		Cow
	},
	cmp::Ordering,
	convert::Infallible,
	ffi::CStr,
	fmt,
	hash::{
		Hash,
		Hasher
	},
	io,
	ops::{
		Add,
		AddAssign,
		Deref,
		DerefMut,
		Range,
		RangeBounds
	},
	str
};
use crate::{
	error::{
		Error,
		Result
	},
	raw::Meta,
	vector::{
		resolve_range,
		Vector
	},
	wide
};

/// Default inline capacity of a [`SmallString`], in bytes (NUL terminator included).
///
/// This is three pointer widths: 24 bytes on 64-bit targets, hence 23 bytes of content.
pub const INLINE_BYTES: usize = 3 * std::mem::size_of::<usize>();

/// A possible error value when converting a `SmallString` from a UTF-8 byte vector.
///
/// This type is the error type for the [`from_utf8`] method on [`SmallString`]. It
/// is designed in such a way to carefully avoid reallocations: the
/// [`into_bytes`] method will give back the byte vector that was used in the
/// conversion attempt.
///
/// [`from_utf8`]: SmallString::from_utf8
/// [`into_bytes`]: FromUtf8Error::into_bytes
#[derive(Debug, Clone, thiserror::Error)]
#[error("{error}")]
pub struct FromUtf8Error<const N: usize, M: Meta> {
	bytes: Vector<u8, N, M>,
	error: str::Utf8Error
}

impl<const N: usize, M: Meta> PartialEq for FromUtf8Error<N, M> {
	#[inline]
	fn eq(&self, other: &Self) -> bool {
		self.error == other.error && self.bytes == other.bytes
	}
}

impl<const N: usize, M: Meta> Eq for FromUtf8Error<N, M> {}

impl<const N: usize, M: Meta> FromUtf8Error<N, M> {
	/// Returns a slice of [`u8`]s bytes that were attempted to convert to a `SmallString`.
	pub fn as_bytes(&self) -> &[u8] {
		&self.bytes
	}

	/// Returns the bytes that were attempted to convert to a `SmallString`.
	///
	/// This method is carefully constructed to avoid allocation. It will
	/// consume the error, moving out the bytes, so that a copy of the bytes
	/// does not need to be made.
	pub fn into_bytes(self) -> Vector<u8, N, M> {
		self.bytes
	}

	/// Fetch a `Utf8Error` to get more details about the conversion failure.
	pub fn utf8_error(&self) -> str::Utf8Error {
		self.error
	}
}

/// A UTF-8 encoded, growable string, stored inline up to `N - 1` bytes.
///
/// The bytes are kept in a [`Vector<u8, N, M>`](Vector) followed by a NUL
/// terminator, so the content is always readable as a C string
/// (see [`as_c_str`](SmallString::as_c_str)). The terminator uses one byte
/// of the inline capacity: with the default `N` ([`INLINE_BYTES`]), strings of
/// up to 23 bytes never allocate on 64-bit targets.
///
/// `N` must be at least 1, otherwise the terminator alone spills.
///
/// ```
/// # use calf_stable::SmallString;
/// let mut s = SmallString::<24>::from("Hello World");
/// assert!(!s.is_spilled());
/// s.push_str(&"x".repeat(24));
/// assert!(s.is_spilled());
/// assert_eq!(s.len(), 35);
/// assert_eq!(s.as_bytes_with_nul().last(), Some(&0));
/// ```
#[derive(Clone)]
#[repr(C)]
pub struct SmallString<const N: usize = INLINE_BYTES, M: Meta = wide::Meta> {
	/// Content bytes followed by the NUL terminator.
	vec: Vector<u8, N, M>
}

impl<const N: usize, M: Meta> SmallString<N, M> {
	/// Creates a new empty `SmallString`.
	#[inline]
	pub fn new() -> Self {
		let mut vec = Vector::new();
		vec.push(0);
		SmallString { vec }
	}

	/// Creates a new empty `SmallString` able to hold `capacity` bytes without reallocating.
	#[inline]
	pub fn with_capacity(capacity: usize) -> Self {
		let mut vec = Vector::with_capacity(capacity.saturating_add(1));
		vec.push(0);
		SmallString { vec }
	}

	/// Wraps a vector whose last byte is the terminator.
	#[inline]
	fn terminated(mut vec: Vector<u8, N, M>) -> Self {
		vec.push(0);
		SmallString { vec }
	}

	/// Converts a vector of bytes to a `SmallString`.
	///
	/// # Errors
	///
	/// Returns [`Err`] if the slice is not UTF-8 with a description as to why the
	/// provided bytes are not UTF-8. The vector you moved in is also included.
	#[inline]
	pub fn from_utf8<B: Into<Vector<u8, N, M>>>(bytes: B) -> std::result::Result<Self, FromUtf8Error<N, M>> {
		let vec = bytes.into();
		match str::from_utf8(&vec) {
			Ok(..) => Ok(Self::terminated(vec)),
			Err(error) => Err(FromUtf8Error { bytes: vec, error })
		}
	}

	/// Converts a vector of bytes to a `SmallString` without checking that the
	/// string contains valid UTF-8.
	///
	/// # Safety
	///
	/// The bytes must be valid UTF-8.
	#[inline]
	pub unsafe fn from_utf8_unchecked<B: Into<Vector<u8, N, M>>>(bytes: B) -> Self {
		Self::terminated(bytes.into())
	}

	/// Converts a slice of bytes to a string, replacing any invalid UTF-8
	/// sequence with `U+FFFD REPLACEMENT CHARACTER`.
	#[inline]
	pub fn from_utf8_lossy(v: &[u8]) -> Self {
		String::from_utf8_lossy(v).into()
	}

	/// Creates a string made of `count` times the character `ch`.
	pub fn repeat(ch: char, count: usize) -> Self {
		let mut s = Self::with_capacity(ch.len_utf8().saturating_mul(count));
		for _ in 0..count {
			s.push(ch)
		}
		s
	}

	/// Maximum length of a string using the metadata format `M`, terminator excluded.
	#[inline]
	pub const fn max_size() -> usize {
		M::MAX_LENGTH - 1
	}

	/// Returns this `SmallString`'s size, in bytes.
	#[inline]
	pub fn len(&self) -> usize {
		self.vec.len() - 1
	}

	/// Returns `true` if this `SmallString` has a length of zero.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns the number of content bytes this `SmallString` can hold without reallocating.
	#[inline]
	pub fn capacity(&self) -> usize {
		self.vec.capacity() - 1
	}

	/// Returns `true` if the bytes are stored on the heap.
	#[inline]
	pub fn is_spilled(&self) -> bool {
		self.vec.is_spilled()
	}

	/// Returns a byte slice of this `SmallString`'s contents.
	#[inline]
	pub fn as_bytes(&self) -> &[u8] {
		&self.vec[..self.len()]
	}

	/// Returns the contents followed by the NUL terminator.
	#[inline]
	pub fn as_bytes_with_nul(&self) -> &[u8] {
		&self.vec
	}

	/// Returns the contents as a C string.
	///
	/// The C string stops at the first NUL byte, which is the terminator unless
	/// the content itself contains a `'\0'` character.
	#[inline]
	pub fn as_c_str(&self) -> &CStr {
		CStr::from_bytes_until_nul(&self.vec).unwrap_or_default()
	}

	/// Extracts a string slice containing the entire `SmallString`.
	#[inline]
	pub fn as_str(&self) -> &str {
		self
	}

	/// Converts a `SmallString` into a mutable string slice.
	#[inline]
	pub fn as_mut_str(&mut self) -> &mut str {
		self
	}

	/// Returns the byte at `index`.
	///
	/// Fails with [`Error::IndexOutOfRange`] if `index >= len`.
	#[inline]
	pub fn at(&self, index: usize) -> Result<u8> {
		let len = self.len();
		self.as_bytes().get(index).copied().ok_or(Error::IndexOutOfRange { index, len })
	}

	/// Converts a `SmallString` into its byte vector, terminator excluded.
	#[inline]
	pub fn into_bytes(mut self) -> Vector<u8, N, M> {
		self.vec.pop();
		self.vec
	}

	/// Ensures that this `SmallString`'s capacity is at least `additional` bytes
	/// larger than its length.
	///
	/// # Panics
	///
	/// Panics if the new capacity exceeds the maximum size.
	#[inline]
	pub fn reserve(&mut self, additional: usize) {
		self.vec.reserve(additional)
	}

	/// The same as `reserve`, but returns on errors instead of panicking or aborting.
	#[inline]
	pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
		self.vec.try_reserve(additional)
	}

	/// Ensures that this `SmallString`'s capacity is `additional` bytes
	/// larger than its length.
	#[inline]
	pub fn reserve_exact(&mut self, additional: usize) {
		self.vec.reserve_exact(additional)
	}

	/// Moves the bytes back inline if they fit, releasing the heap memory.
	#[inline]
	pub fn shrink_to_fit(&mut self) {
		self.vec.shrink_to_fit()
	}

	/// Swaps the contents of two strings.
	#[inline]
	pub fn swap(&mut self, other: &mut Self) {
		self.vec.swap(&mut other.vec)
	}

	/// Truncates this `SmallString`, removing all contents.
	#[inline]
	pub fn clear(&mut self) {
		self.truncate(0)
	}

	/// Shortens this `SmallString` to the specified length.
	///
	/// If `new_len` is greater than the string's current length, this has no
	/// effect.
	///
	/// # Panics
	///
	/// Panics if `new_len` does not lie on a [`char`] boundary.
	#[inline]
	pub fn truncate(&mut self, new_len: usize) {
		if new_len <= self.len() {
			crate::contract!(self.is_char_boundary(new_len), "truncation at {} is not on a char boundary", new_len);
			self.vec[new_len] = 0;
			self.vec.truncate(new_len + 1)
		}
	}

	/// Appends the given [`char`] to the end of this `SmallString`.
	#[inline]
	pub fn push(&mut self, ch: char) {
		let len = self.len();
		match ch.len_utf8() {
			1 => self.vec.insert(len, ch as u8),
			_ => self.vec.insert_slice(len, ch.encode_utf8(&mut [0; 4]).as_bytes())
		}
	}

	/// Appends a given string slice onto the end of this `SmallString`.
	#[inline]
	pub fn push_str(&mut self, string: &str) {
		let len = self.len();
		self.vec.insert_slice(len, string.as_bytes())
	}

	/// Removes the last character from the string buffer and returns it.
	///
	/// Returns [`None`] if this `SmallString` is empty.
	#[inline]
	pub fn pop(&mut self) -> Option<char> {
		let ch = self.chars().next_back()?;
		let new_len = self.len() - ch.len_utf8();
		self.truncate(new_len);
		Some(ch)
	}

	/// Inserts a character into this `SmallString` at a byte position.
	///
	/// # Panics
	///
	/// Panics if `idx` is larger than the `SmallString`'s length, or if it does not
	/// lie on a [`char`] boundary.
	#[inline]
	pub fn insert(&mut self, idx: usize, ch: char) {
		self.insert_str(idx, ch.encode_utf8(&mut [0; 4]))
	}

	/// Inserts a string slice into this `SmallString` at a byte position.
	///
	/// # Panics
	///
	/// Panics if `idx` is larger than the `SmallString`'s length, or if it does not
	/// lie on a [`char`] boundary.
	#[inline]
	pub fn insert_str(&mut self, idx: usize, string: &str) {
		crate::contract!(self.is_char_boundary(idx), "insertion index {} is not on a char boundary", idx);
		self.vec.insert_slice(idx, string.as_bytes())
	}

	/// Removes a [`char`] from this `SmallString` at a byte position and returns it.
	///
	/// # Panics
	///
	/// Panics if `idx` is larger than or equal to the `SmallString`'s length,
	/// or if it does not lie on a [`char`] boundary.
	#[inline]
	pub fn remove(&mut self, idx: usize) -> char {
		crate::contract!(self.is_char_boundary(idx), "removal index {} is not on a char boundary", idx);
		let ch = match self[idx..].chars().next() {
			Some(ch) => ch,
			None => crate::contract::violated(format_args!("cannot remove a char from the end of a string"))
		};

		self.vec.erase(idx..(idx + ch.len_utf8()));
		ch
	}

	/// Checks that `range` is within bounds and on char boundaries.
	fn char_range<R: RangeBounds<usize>>(&self, range: R) -> Range<usize> {
		let range = resolve_range(range, self.len());
		crate::contract!(
			self.is_char_boundary(range.start) && self.is_char_boundary(range.end),
			"range {:?} is not on char boundaries",
			range
		);
		range
	}

	/// Removes the specified range from the string.
	///
	/// # Panics
	///
	/// Panics if the starting point or end point do not lie on a [`char`]
	/// boundary, or if they're out of bounds.
	#[inline]
	pub fn erase<R: RangeBounds<usize>>(&mut self, range: R) {
		let range = self.char_range(range);
		self.vec.erase(range)
	}

	/// Removes the specified range in the string,
	/// and replaces it with the given string.
	/// The given string doesn't need to be the same length as the range.
	///
	/// # Panics
	///
	/// Panics if the starting point or end point do not lie on a [`char`]
	/// boundary, or if they're out of bounds.
	pub fn replace_range<R: RangeBounds<usize>>(&mut self, range: R, replace_with: &str) {
		let Range { start, end } = self.char_range(range);
		let replaced = end - start;
		let bytes = replace_with.as_bytes();
		let common = replaced.min(bytes.len());

		self.vec[start..(start + common)].copy_from_slice(&bytes[..common]);
		if replaced > common {
			self.vec.erase((start + common)..end)
		} else {
			self.vec.insert_slice(end, &bytes[common..])
		}
	}

	/// Appends a copy of the given range of this very string.
	///
	/// # Panics
	///
	/// Panics if the starting point or end point do not lie on a [`char`]
	/// boundary, or if they're out of bounds.
	#[inline]
	pub fn extend_from_within<R: RangeBounds<usize>>(&mut self, range: R) {
		let range = self.char_range(range);
		let len = self.len();
		self.vec.insert_within(len, range)
	}

	/// Resizes the string to `new_len` bytes, appending copies of the ASCII
	/// character `fill` or truncating.
	///
	/// # Panics
	///
	/// Panics if `fill` is not ASCII, or if `new_len` does not lie on a [`char`] boundary.
	pub fn resize(&mut self, new_len: usize, fill: char) {
		crate::contract!(fill.is_ascii(), "fill character {:?} is not ASCII", fill);
		let len = self.len();
		if new_len > len {
			self.vec.insert_n(len, new_len - len, fill as u8)
		} else {
			self.truncate(new_len)
		}
	}

	/// Retains only the characters specified by the predicate.
	///
	/// In other words, remove all characters `c` such that `f(c)` returns `false`.
	/// This method operates in place, visiting each character exactly once in the
	/// original order, and preserves the order of the retained characters.
	pub fn retain<F>(&mut self, mut f: F) where F: FnMut(char) -> bool {
		struct SetLenOnDrop<'a, const N: usize, M: Meta> {
			vec: &'a mut Vector<u8, N, M>,
			len: usize,
			idx: usize,
			del_bytes: usize
		}

		impl<const N: usize, M: Meta> Drop for SetLenOnDrop<'_, N, M> {
			fn drop(&mut self) {
				if self.del_bytes > 0 {
					// Closes the gap with the unvisited tail and the terminator,
					// also when `f` panics.
					let new_idx = self.idx - self.del_bytes;
					self.vec.copy_within(self.idx..=self.len, new_idx);
					self.vec.truncate(new_idx + (self.len - self.idx) + 1)
				}
			}
		}

		let len = self.len();
		let mut guard = SetLenOnDrop { vec: &mut self.vec, len, idx: 0, del_bytes: 0 };

		while guard.idx < len {
			// SAFETY: `idx..len` is untouched by the compaction and starts on a
			// char boundary.
			let ch = match unsafe { str::from_utf8_unchecked(&guard.vec[guard.idx..len]) }.chars().next() {
				Some(ch) => ch,
				None => break
			};
			let ch_len = ch.len_utf8();

			if !f(ch) {
				guard.del_bytes += ch_len;
			} else if guard.del_bytes > 0 {
				let idx = guard.idx;
				guard.vec.copy_within(idx..(idx + ch_len), idx - guard.del_bytes);
			}

			// Point idx to the next char
			guard.idx += ch_len;
		}

		drop(guard);
	}

	/// Reads one whitespace-delimited word.
	///
	/// Leading ASCII whitespace is skipped, then bytes are read up to the next
	/// ASCII whitespace (left in the reader) or the end of the input.
	/// Returns `Ok(None)` if the input ends before any word.
	///
	/// # Errors
	///
	/// I/O errors of the reader are forwarded. A word that is not valid UTF-8
	/// gives an [`io::ErrorKind::InvalidData`] error.
	pub fn read_word<R: io::BufRead>(reader: &mut R) -> io::Result<Option<Self>> {
		// skip whitespace.
		loop {
			let buf = reader.fill_buf()?;
			if buf.is_empty() {
				return Ok(None)
			}

			let skipped = buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
			let found = skipped < buf.len();
			reader.consume(skipped);
			if found {
				break
			}
		}

		let mut bytes: Vector<u8, N, M> = Vector::new();
		loop {
			let buf = reader.fill_buf()?;
			if buf.is_empty() {
				break
			}

			let taken = buf.iter().take_while(|b| !b.is_ascii_whitespace()).count();
			bytes.extend_from_slice(&buf[..taken]);
			let ended = taken < buf.len();
			reader.consume(taken);
			if ended {
				break
			}
		}

		Self::from_utf8(bytes).map(Some).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.utf8_error()))
	}
}

impl<const N: usize, M: Meta> Default for SmallString<N, M> {
	#[inline]
	fn default() -> Self {
		SmallString::new()
	}
}

impl<const N: usize, M: Meta> Deref for SmallString<N, M> {
	type Target = str;

	#[inline]
	fn deref(&self) -> &str {
		unsafe {
			str::from_utf8_unchecked(self.as_bytes())
		}
	}
}

impl<const N: usize, M: Meta> DerefMut for SmallString<N, M> {
	#[inline]
	fn deref_mut(&mut self) -> &mut str {
		let len = self.len();
		unsafe {
			str::from_utf8_unchecked_mut(&mut self.vec[..len])
		}
	}
}

impl<'a, const N: usize, M: Meta> From<&'a str> for SmallString<N, M> {
	#[inline]
	fn from(s: &'a str) -> Self {
		let mut string = SmallString::with_capacity(s.len());
		string.push_str(s);
		string
	}
}

impl<const N: usize, M: Meta> From<String> for SmallString<N, M> {
	#[inline]
	fn from(s: String) -> Self {
		s.as_str().into()
	}
}

impl<'a, const N: usize, M: Meta> From<Cow<'a, str>> for SmallString<N, M> {
	#[inline]
	fn from(c: Cow<'a, str>) -> Self {
		c.as_ref().into()
	}
}

impl<const N: usize, M: Meta> From<char> for SmallString<N, M> {
	#[inline]
	fn from(c: char) -> Self {
		let mut string = SmallString::new();
		string.push(c);
		string
	}
}

impl<const N: usize, M: Meta> From<SmallString<N, M>> for String {
	#[inline]
	fn from(s: SmallString<N, M>) -> String {
		s.as_str().to_owned()
	}
}

impl<const N: usize, M: Meta> str::FromStr for SmallString<N, M> {
	type Err = Infallible;

	#[inline]
	fn from_str(s: &str) -> std::result::Result<Self, Infallible> {
		Ok(s.into())
	}
}

impl<const N: usize, M: Meta> Extend<char> for SmallString<N, M> {
	fn extend<I: IntoIterator<Item = char>>(&mut self, iter: I) {
		let iterator = iter.into_iter();
		let (lower_bound, _) = iterator.size_hint();
		self.reserve(lower_bound);
		iterator.for_each(move |c| self.push(c));
	}
}

impl<'a, const N: usize, M: Meta> Extend<&'a str> for SmallString<N, M> {
	fn extend<I: IntoIterator<Item = &'a str>>(&mut self, iter: I) {
		iter.into_iter().for_each(move |s| self.push_str(s));
	}
}

impl<const N: usize, M: Meta> FromIterator<char> for SmallString<N, M> {
	fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
		let mut string = SmallString::new();
		string.extend(iter);
		string
	}
}

impl<'a, const N: usize, M: Meta> FromIterator<&'a str> for SmallString<N, M> {
	fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
		let mut string = SmallString::new();
		string.extend(iter);
		string
	}
}

impl<const N: usize, M: Meta> fmt::Write for SmallString<N, M> {
	#[inline]
	fn write_str(&mut self, s: &str) -> fmt::Result {
		self.push_str(s);
		Ok(())
	}

	#[inline]
	fn write_char(&mut self, c: char) -> fmt::Result {
		self.push(c);
		Ok(())
	}
}

impl<const N: usize, M: Meta> Add<&str> for SmallString<N, M> {
	type Output = Self;

	#[inline]
	fn add(mut self, other: &str) -> Self {
		self.push_str(other);
		self
	}
}

impl<const N: usize, M: Meta> AddAssign<&str> for SmallString<N, M> {
	#[inline]
	fn add_assign(&mut self, other: &str) {
		self.push_str(other);
	}
}

impl<const N: usize, M: Meta> AsRef<str> for SmallString<N, M> {
	#[inline]
	fn as_ref(&self) -> &str {
		self
	}
}

impl<const N: usize, M: Meta> AsRef<[u8]> for SmallString<N, M> {
	#[inline]
	fn as_ref(&self) -> &[u8] {
		self.as_bytes()
	}
}

impl<const N: usize, M: Meta> Borrow<str> for SmallString<N, M> {
	#[inline]
	fn borrow(&self) -> &str {
		self
	}
}

impl<const N: usize, const K: usize, M: Meta, P: Meta> PartialEq<SmallString<K, P>> for SmallString<N, M> {
	#[inline]
	fn eq(&self, other: &SmallString<K, P>) -> bool {
		self.as_str() == other.as_str()
	}
}

impl<const N: usize, M: Meta> Eq for SmallString<N, M> {}

impl<const N: usize, M: Meta> PartialEq<str> for SmallString<N, M> {
	#[inline]
	fn eq(&self, other: &str) -> bool {
		self.as_str() == other
	}
}

impl<'b, const N: usize, M: Meta> PartialEq<&'b str> for SmallString<N, M> {
	#[inline]
	fn eq(&self, other: &&'b str) -> bool {
		self.as_str() == *other
	}
}

impl<const N: usize, M: Meta> PartialEq<String> for SmallString<N, M> {
	#[inline]
	fn eq(&self, other: &String) -> bool {
		self.as_str() == other
	}
}

impl<const N: usize, M: Meta> PartialEq<SmallString<N, M>> for str {
	#[inline]
	fn eq(&self, other: &SmallString<N, M>) -> bool {
		self == other.as_str()
	}
}

impl<'b, const N: usize, M: Meta> PartialEq<SmallString<N, M>> for &'b str {
	#[inline]
	fn eq(&self, other: &SmallString<N, M>) -> bool {
		*self == other.as_str()
	}
}

impl<const N: usize, M: Meta> PartialEq<SmallString<N, M>> for String {
	#[inline]
	fn eq(&self, other: &SmallString<N, M>) -> bool {
		self.as_str() == other.as_str()
	}
}

impl<const N: usize, M: Meta> PartialOrd for SmallString<N, M> {
	#[inline]
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl<const N: usize, M: Meta> Ord for SmallString<N, M> {
	#[inline]
	fn cmp(&self, other: &Self) -> Ordering {
		self.as_str().cmp(other.as_str())
	}
}

impl<const N: usize, M: Meta> PartialOrd<str> for SmallString<N, M> {
	#[inline]
	fn partial_cmp(&self, other: &str) -> Option<Ordering> {
		self.as_str().partial_cmp(other)
	}
}

impl<'b, const N: usize, M: Meta> PartialOrd<&'b str> for SmallString<N, M> {
	#[inline]
	fn partial_cmp(&self, other: &&'b str) -> Option<Ordering> {
		self.as_str().partial_cmp(*other)
	}
}

impl<const N: usize, M: Meta> PartialOrd<String> for SmallString<N, M> {
	#[inline]
	fn partial_cmp(&self, other: &String) -> Option<Ordering> {
		self.as_str().partial_cmp(other.as_str())
	}
}

impl<const N: usize, M: Meta> Hash for SmallString<N, M> {
	#[inline]
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.as_str().hash(state)
	}
}

impl<const N: usize, M: Meta> fmt::Display for SmallString<N, M> {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&**self, f)
	}
}

impl<const N: usize, M: Meta> fmt::Debug for SmallString<N, M> {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&**self, f)
	}
}

#[cfg(test)]
mod tests {
	use std::{
		fmt::Write,
		io::Cursor,
		panic::{
			self,
			AssertUnwindSafe
		}
	};
	use super::*;

	type Str = SmallString;

	#[test]
	fn hello_world_stays_inline() {
		let mut s = Str::from("Hello World");
		assert!(!s.is_spilled());
		assert_eq!(s.capacity(), INLINE_BYTES - 1);
		s.push_str(&"x".repeat(24));
		assert!(s.is_spilled());
		assert_eq!(s.len(), 35);
		assert_eq!(s.as_bytes_with_nul().len(), 36);
		assert_eq!(s.as_bytes_with_nul()[35], 0);
		assert!(s.starts_with("Hello World"));
	}

	#[test]
	fn inline_threshold() {
		let s = Str::from("a".repeat(INLINE_BYTES - 1));
		assert!(!s.is_spilled());
		let s = Str::from("a".repeat(INLINE_BYTES));
		assert!(s.is_spilled());
	}

	#[test]
	fn c_str_view() {
		let s = Str::from("abc");
		assert_eq!(s.as_c_str().to_bytes(), b"abc");
		let mut e = Str::new();
		assert_eq!(e.as_c_str().to_bytes(), b"");
		e.push('x');
		e.clear();
		assert_eq!(e.as_bytes_with_nul(), b"\0");
	}

	#[test]
	fn edit_operations() {
		let mut s: SmallString<8> = "héllo".into();
		s.insert(0, '¡');
		assert_eq!(s, "¡héllo");
		s.insert_str(s.len(), " wörld");
		assert_eq!(s, "¡héllo wörld");
		assert_eq!(s.remove(0), '¡');
		assert_eq!(s.pop(), Some('d'));
		s.erase(5..8);
		assert_eq!(s, "héllörl");
		s.replace_range(1..3, "e");
		assert_eq!(s, "hellörl");
		s.replace_range(..1, "HH");
		assert_eq!(s, "HHellörl");
		s.truncate(4);
		assert_eq!(s, "HHel");
		s.extend_from_within(2..);
		assert_eq!(s, "HHelel");
		s.retain(|c| c != 'e');
		assert_eq!(s, "HHll");
		assert_eq!(s.as_bytes_with_nul(), b"HHll\0");
	}

	#[test]
	fn retain_stays_utf8_when_the_predicate_panics() {
		let mut s = Str::from("aéb€c");
		let result = panic::catch_unwind(AssertUnwindSafe(|| {
			s.retain(|c| {
				if c == '€' {
					panic!("predicate failure")
				}
				c != 'a'
			})
		}));
		assert!(result.is_err());
		assert!(str::from_utf8(s.as_bytes()).is_ok());
		assert_eq!(s, "éb€c");
		assert_eq!(s.as_bytes_with_nul(), "éb€c\0".as_bytes());
	}

	#[test]
	#[should_panic(expected = "contract violation")]
	fn insert_inside_a_char_is_a_contract_violation() {
		let mut s = Str::from("é");
		s.insert(1, 'a');
	}

	#[test]
	fn resize_and_at() {
		let mut s = Str::from("ab");
		s.resize(5, '-');
		assert_eq!(s, "ab---");
		s.resize(1, '-');
		assert_eq!(s, "a");
		assert_eq!(s.at(0), Ok(b'a'));
		assert_eq!(s.at(1), Err(Error::IndexOutOfRange { index: 1, len: 1 }));
	}

	#[test]
	fn shrink_to_fit_moves_back_inline() {
		let mut s = Str::repeat('z', 100);
		assert!(s.is_spilled());
		s.truncate(3);
		s.shrink_to_fit();
		assert!(!s.is_spilled());
		assert_eq!(s, "zzz");
		assert_eq!(s.as_bytes_with_nul(), b"zzz\0");
	}

	#[test]
	fn take_leaves_an_empty_string() {
		let mut s = Str::from("some text that does not fit inline");
		let t = std::mem::take(&mut s);
		assert!(s.is_empty());
		assert_eq!(s.as_bytes_with_nul(), b"\0");
		assert_eq!(t, "some text that does not fit inline");
	}

	#[test]
	fn utf8_errors_compare() {
		let a = Str::from_utf8(vec![0xff, b'a']).unwrap_err();
		let b = a.clone();
		assert_eq!(a, b);
		assert_ne!(a, Str::from_utf8(vec![b'a', 0xff]).unwrap_err());

		let lean = crate::lean::SmallString::<16>::from_utf8(vec![0xc3]).unwrap_err();
		assert_eq!(lean, lean.clone());
	}

	#[test]
	fn conversions() {
		let s = Str::from_utf8(vec![b'o', b'k']).unwrap();
		assert_eq!(s, "ok");
		let e = Str::from_utf8(vec![0xff, b'a']).unwrap_err();
		assert_eq!(e.as_bytes(), &[0xff, b'a']);
		assert_eq!(Str::from_utf8_lossy(&[b'a', 0xff]), "a\u{FFFD}");
		assert_eq!(String::from(Str::from('∂')), "∂");
		let bytes = Str::from("xy").into_bytes();
		assert_eq!(bytes, [b'x', b'y']);
		let collected: Str = vec!["a", "b", "c"].into_iter().collect();
		assert_eq!(collected, "abc");
		let parsed: Str = "parsed".parse().unwrap();
		assert_eq!(parsed, String::from("parsed"));
	}

	#[test]
	fn formatting_and_operators() {
		let mut s = Str::new();
		write!(s, "{}-{}", 1, 2).unwrap();
		s += "!";
		let s = s + "?";
		assert_eq!(format!("{}", s), "1-2!?");
		assert_eq!(format!("{:?}", s), "\"1-2!?\"");
		assert!(s < "2");
	}

	#[test]
	fn read_words() {
		let mut input = Cursor::new("  first\tsecond\n\n third  ");
		let words: Vec<String> = std::iter::from_fn(|| Str::read_word(&mut input).unwrap())
			.map(String::from)
			.collect();
		assert_eq!(words, ["first", "second", "third"]);
	}

	#[test]
	fn read_word_rejects_invalid_utf8() {
		let mut input = Cursor::new(vec![b' ', 0xff, 0xfe, b' ']);
		let err = Str::read_word(&mut input).unwrap_err();
		assert_eq!(err.kind(), io::ErrorKind::InvalidData);
	}
}
