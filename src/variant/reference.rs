use std::{
	cmp::Ordering,
	fmt,
	marker::PhantomData,
	mem::MaybeUninit,
	ptr
};
use crate::{
	Error,
	Result
};
use super::{
	Active,
	AllClone,
	AllDebug,
	AllPartialEq,
	AllPartialOrd,
	AllVisit,
	Alternatives,
	Member,
	Overload,
	Variant,
	Visitor
};

/// Non-owning view of a value among the alternatives `L`.
///
/// Holds the index of the alternative and a pointer to the value, in a
/// pointer-sized union. It never allocates nor drops the value.
///
/// ```rust
/// use calf_stable::VariantRef;
///
/// let (a, b) = (1u8, String::from("two"));
/// let mut r: VariantRef<(u8, String)> = VariantRef::new(&a);
/// assert_eq!(r.get::<u8, _>(), Ok(&1));
/// r.set(&b);
/// assert_eq!(r.index(), 1);
/// ```
///
/// # Safety Invariant
///
/// `pointers` holds, at offset 0, a pointer to a live value of the alternative
/// `index`, borrowed for `'a`.
pub struct VariantRef<'a, L: Alternatives> {
	pointers: MaybeUninit<L::Pointers>,
	index: u8,
	marker: PhantomData<&'a L>
}

// SAFETY: the view behaves like a `&'a T` for some alternative `T`.
unsafe impl<'a, L: Alternatives + Sync> Send for VariantRef<'a, L> {}
unsafe impl<'a, L: Alternatives + Sync> Sync for VariantRef<'a, L> {}

impl<'a, L: Alternatives> VariantRef<'a, L> {
	#[inline]
	fn from_raw(index: u8, p: *const u8) -> Self {
		let mut pointers = MaybeUninit::<L::Pointers>::uninit();
		// SAFETY: every pointer of the union is at offset 0.
		unsafe { ptr::write(pointers.as_mut_ptr().cast::<*const u8>(), p) };

		VariantRef {
			pointers,
			index,
			marker: PhantomData
		}
	}

	/// Creates a view of `value`.
	#[inline]
	pub fn new<T, I>(value: &'a T) -> Self where L: Member<T, I> {
		Self::from_raw(L::INDEX, (value as *const T).cast())
	}

	/// Points the view to `value`.
	#[inline]
	pub fn set<T, I>(&mut self, value: &'a T) where L: Member<T, I> {
		*self = Self::new(value)
	}

	/// Index of the referenced alternative.
	#[inline]
	pub fn index(&self) -> usize {
		self.index as usize
	}

	/// Checks if the referenced alternative is `T`.
	#[inline]
	pub fn holds<T, I>(&self) -> bool where L: Member<T, I> {
		self.index == L::INDEX
	}

	#[inline]
	fn as_ptr(&self) -> *const u8 {
		// SAFETY: the pointer is initialized at offset 0.
		unsafe { *self.pointers.as_ptr().cast::<*const u8>() }
	}

	/// Returns the referenced value if its alternative is `T`.
	///
	/// Fails with [`Error::BadVariantAccess`] otherwise.
	#[inline]
	pub fn get<T, I>(&self) -> Result<&'a T> where L: Member<T, I> {
		self.get_if::<T, I>().ok_or(Error::BadVariantAccess {
			expected: L::INDEX as usize,
			active: self.index as usize
		})
	}

	/// Returns the referenced value if its alternative is `T`.
	#[inline]
	pub fn get_if<T, I>(&self) -> Option<&'a T> where L: Member<T, I> {
		if self.holds::<T, I>() {
			// SAFETY: the pointer refers to a `T` borrowed for `'a`.
			Some(unsafe { &*self.as_ptr().cast::<T>() })
		} else {
			None
		}
	}

	/// Calls the visitor on the referenced value.
	#[inline]
	pub fn visit<V: Visitor>(&self, visitor: &mut V) -> V::Output where L: AllVisit<V> {
		// SAFETY: the pointer refers to the referenced alternative `index`.
		unsafe { L::visit(visitor, self.index, self.as_ptr()) }
	}

	/// Calls the closure matching the referenced alternative.
	#[inline]
	pub fn visit_with<R, Fs: Overload<L, R>>(&self, fs: Fs) -> R {
		// SAFETY: the pointer refers to the referenced alternative `index`.
		unsafe { fs.call(self.index, self.as_ptr()) }
	}

	/// Clones the referenced value into a new variant.
	#[inline]
	pub fn to_owned_variant(&self) -> Variant<L> where L: AllClone {
		// SAFETY: the pointer refers to the alternative `index`.
		unsafe { Variant::clone_from_raw(self.index, self.as_ptr()) }
	}
}

impl<'a, L: Alternatives> From<&'a Variant<L>> for VariantRef<'a, L> {
	#[inline]
	fn from(variant: &'a Variant<L>) -> Self {
		Self::from_raw(variant.index() as u8, variant.as_ptr())
	}
}

impl<'a, L: Alternatives> Clone for VariantRef<'a, L> {
	#[inline]
	fn clone(&self) -> Self {
		*self
	}
}

impl<'a, L: Alternatives> Copy for VariantRef<'a, L> {}

impl<'a, L: AllDebug> fmt::Debug for VariantRef<'a, L> {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("VariantRef")
			.field("index", &self.index)
			.field("value", &Active::<L> {
				index: self.index,
				ptr: self.as_ptr(),
				marker: PhantomData
			})
			.finish()
	}
}

impl<'a, 'b, L: AllPartialEq> PartialEq<VariantRef<'b, L>> for VariantRef<'a, L> {
	#[inline]
	fn eq(&self, other: &VariantRef<'b, L>) -> bool {
		// SAFETY: both views refer to the alternative `index`.
		self.index == other.index && unsafe { L::EQ[self.index as usize](self.as_ptr(), other.as_ptr()) }
	}
}

impl<'a, 'b, L: AllPartialOrd> PartialOrd<VariantRef<'b, L>> for VariantRef<'a, L> {
	#[inline]
	fn partial_cmp(&self, other: &VariantRef<'b, L>) -> Option<Ordering> {
		match self.index.cmp(&other.index) {
			// SAFETY: both views refer to the alternative `index`.
			Ordering::Equal => unsafe { L::PARTIAL_CMP[self.index as usize](self.as_ptr(), other.as_ptr()) },
			ordering => Some(ordering)
		}
	}
}
