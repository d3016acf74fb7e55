//! Closed-set tagged union.
//!
//! A [`Variant<L>`] holds exactly one value among the alternatives of the
//! tuple `L = (T0, .., Tk)`, along with the index of that alternative. All the
//! operations that depend on the active alternative (drop, clone, comparison,
//! hashing, formatting, visiting) dispatch on this index, through a jump table
//! or a `match` built at compile time for `L`.
//!
//! ```rust
//! use calf_stable::{Error, Variant};
//!
//! let mut v: Variant<(i32, f64)> = Variant::default();
//! assert_eq!(v.get::<i32, _>(), Ok(&0));
//!
//! v.set(10.0f64);
//! assert_eq!(v.index(), 1);
//! assert_eq!(v.get::<i32, _>(), Err(Error::BadVariantAccess { expected: 0, active: 1 }));
//! ```
//!
//! The second type parameter of the accessors is the position of the
//! alternative in the list, and is always inferred (`_`).
use std::{
	cmp::Ordering,
	fmt,
	hash::{
		Hash,
		Hasher
	},
	mem::{
		ManuallyDrop,
		MaybeUninit
	},
	ptr
};
use crate::{
	Error,
	Result
};

mod list;
mod visit;
mod reference;

pub use list::{
	Alternatives,
	Member,
	Idx,
	Union,
	AllClone,
	AllPartialEq,
	AllEq,
	AllPartialOrd,
	AllOrd,
	AllHash,
	AllDebug,
	AllVisit,
	AllVisitMut,
	Overload,
	MAX_ALTERNATIVES
};
pub use visit::{
	Visitor,
	Visit,
	VisitMut
};
pub use reference::VariantRef;

/// Tagged union of the alternatives `L`.
///
/// # Safety Invariant
///
/// The alternative of index `index` is initialized at offset 0 of `storage`.
#[repr(C)]
pub struct Variant<L: Alternatives> {
	storage: MaybeUninit<L::Storage>,
	index: u8
}

impl<L: Alternatives> Variant<L> {
	/// Creates a variant holding `value`.
	#[inline]
	pub fn new<T, I>(value: T) -> Self where L: Member<T, I> {
		let mut storage = MaybeUninit::<L::Storage>::uninit();
		// SAFETY: every alternative fits at offset 0 of the storage.
		unsafe { ptr::write(storage.as_mut_ptr().cast::<T>(), value) };

		Variant {
			storage,
			index: L::INDEX
		}
	}

	/// Position of `T` in the list of alternatives.
	#[inline]
	pub fn index_of<T, I>() -> usize where L: Member<T, I> {
		L::INDEX as usize
	}

	/// Index of the active alternative.
	#[inline]
	pub fn index(&self) -> usize {
		self.index as usize
	}

	/// Checks if the active alternative is `T`.
	#[inline]
	pub fn holds<T, I>(&self) -> bool where L: Member<T, I> {
		self.index == L::INDEX
	}

	#[inline]
	pub(crate) fn as_ptr(&self) -> *const u8 {
		self.storage.as_ptr().cast()
	}

	#[inline]
	fn as_mut_ptr(&mut self) -> *mut u8 {
		self.storage.as_mut_ptr().cast()
	}

	#[inline]
	fn bad_access<T, I>(&self) -> Error where L: Member<T, I> {
		Error::BadVariantAccess {
			expected: L::INDEX as usize,
			active: self.index as usize
		}
	}

	/// Returns a reference to the value if the active alternative is `T`.
	///
	/// Fails with [`Error::BadVariantAccess`] otherwise.
	#[inline]
	pub fn get<T, I>(&self) -> Result<&T> where L: Member<T, I> {
		self.get_if::<T, I>().ok_or_else(|| self.bad_access::<T, I>())
	}

	/// Returns a mutable reference to the value if the active alternative is `T`.
	///
	/// Fails with [`Error::BadVariantAccess`] otherwise.
	#[inline]
	pub fn get_mut<T, I>(&mut self) -> Result<&mut T> where L: Member<T, I> {
		if self.holds::<T, I>() {
			// SAFETY: the active alternative is `T`.
			Ok(unsafe { &mut *self.as_mut_ptr().cast::<T>() })
		} else {
			Err(self.bad_access::<T, I>())
		}
	}

	/// Returns a reference to the value if the active alternative is `T`.
	#[inline]
	pub fn get_if<T, I>(&self) -> Option<&T> where L: Member<T, I> {
		if self.holds::<T, I>() {
			// SAFETY: the active alternative is `T`.
			Some(unsafe { &*self.as_ptr().cast::<T>() })
		} else {
			None
		}
	}

	/// Returns a mutable reference to the value if the active alternative is `T`.
	#[inline]
	pub fn get_if_mut<T, I>(&mut self) -> Option<&mut T> where L: Member<T, I> {
		if self.holds::<T, I>() {
			// SAFETY: the active alternative is `T`.
			Some(unsafe { &mut *self.as_mut_ptr().cast::<T>() })
		} else {
			None
		}
	}

	/// Moves the value out if the active alternative is `T`.
	///
	/// Gives the variant back otherwise.
	#[inline]
	pub fn into_inner<T, I>(self) -> std::result::Result<T, Self> where L: Member<T, I> {
		if self.holds::<T, I>() {
			let this = ManuallyDrop::new(self);
			// SAFETY: the active alternative is `T`, and it is never dropped in place.
			Ok(unsafe { ptr::read(this.as_ptr().cast::<T>()) })
		} else {
			Err(self)
		}
	}

	/// Replaces the active alternative with `value`, and returns a reference to it.
	#[inline]
	pub fn emplace<T, I>(&mut self, value: T) -> &mut T where L: Member<T, I> {
		unsafe {
			// SAFETY: the active alternative is `index`.
			L::DROP[self.index as usize](self.as_mut_ptr());
			let p = self.as_mut_ptr().cast::<T>();
			ptr::write(p, value);
			self.index = L::INDEX;
			&mut *p
		}
	}

	/// Replaces the active alternative with the value returned by `f`.
	///
	/// The new value is built before the current one is destroyed: if `f`
	/// panics, the variant is left untouched.
	#[inline]
	pub fn emplace_with<T, I, F>(&mut self, f: F) -> &mut T where L: Member<T, I>, F: FnOnce() -> T {
		let value = f();
		self.emplace(value)
	}

	/// Assigns `value`.
	///
	/// If the active alternative is already `T`, it is assigned in place.
	/// Otherwise the active alternative is replaced.
	#[inline]
	pub fn set<T, I>(&mut self, value: T) where L: Member<T, I> {
		match self.get_if_mut::<T, I>() {
			Some(current) => *current = value,
			None => {
				self.emplace(value);
			}
		}
	}

	/// Calls the visitor on the active alternative.
	#[inline]
	pub fn visit<V: Visitor>(&self, visitor: &mut V) -> V::Output where L: AllVisit<V> {
		// SAFETY: the pointer refers to the active alternative `index`.
		unsafe { L::visit(visitor, self.index, self.as_ptr()) }
	}

	/// Calls the visitor on the active alternative, by mutable reference.
	#[inline]
	pub fn visit_mut<V: Visitor>(&mut self, visitor: &mut V) -> V::Output where L: AllVisitMut<V> {
		// SAFETY: the pointer refers to the active alternative `index`, borrowed mutably.
		unsafe { L::visit_mut(visitor, self.index, self.as_mut_ptr()) }
	}

	/// Calls the closure matching the active alternative.
	///
	/// `fs` is a tuple with one closure per alternative, in order.
	///
	/// ```rust
	/// # use calf_stable::Variant;
	/// let v: Variant<(u8, &str)> = Variant::new("abc");
	/// let len = v.visit_with((|n: &u8| *n as usize, |s: &&str| s.len()));
	/// assert_eq!(len, 3);
	/// ```
	#[inline]
	pub fn visit_with<R, Fs: Overload<L, R>>(&self, fs: Fs) -> R {
		// SAFETY: the pointer refers to the active alternative `index`.
		unsafe { fs.call(self.index, self.as_ptr()) }
	}

	/// Non-owning view of the active alternative.
	#[inline]
	pub fn as_view(&self) -> VariantRef<'_, L> {
		VariantRef::from(self)
	}
}

impl<L: Alternatives> Drop for Variant<L> {
	#[inline]
	fn drop(&mut self) {
		// SAFETY: the active alternative is `index`.
		unsafe { L::DROP[self.index as usize](self.as_mut_ptr()) }
	}
}

impl<L: Alternatives> Default for Variant<L> where L::First: Default {
	#[inline]
	fn default() -> Self {
		let mut storage = MaybeUninit::<L::Storage>::uninit();
		// SAFETY: `First` is the alternative at index 0.
		unsafe { ptr::write(storage.as_mut_ptr().cast::<L::First>(), L::First::default()) };

		Variant {
			storage,
			index: 0
		}
	}
}

impl<L: AllClone> Variant<L> {
	/// Clones the alternative `index` found at `src`.
	///
	/// ## Safety
	///
	/// `src` must point to a valid value of the alternative `index`.
	#[inline]
	pub(crate) unsafe fn clone_from_raw(index: u8, src: *const u8) -> Self {
		let mut storage = MaybeUninit::<L::Storage>::uninit();
		L::CLONE[index as usize](src, storage.as_mut_ptr().cast());

		Variant {
			storage,
			index
		}
	}
}

impl<L: AllClone> Clone for Variant<L> {
	#[inline]
	fn clone(&self) -> Self {
		// SAFETY: the storage holds the alternative `index`.
		unsafe { Self::clone_from_raw(self.index, self.as_ptr()) }
	}
}

/// Formats the active alternative of a variant.
pub(crate) struct Active<L: AllDebug> {
	pub(crate) index: u8,
	pub(crate) ptr: *const u8,
	pub(crate) marker: std::marker::PhantomData<L>
}

impl<L: AllDebug> fmt::Debug for Active<L> {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		// SAFETY: `ptr` points to the alternative `index`.
		unsafe { L::DEBUG[self.index as usize](self.ptr, f) }
	}
}

impl<L: AllDebug> fmt::Debug for Variant<L> {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("Variant")
			.field("index", &self.index)
			.field("value", &Active::<L> {
				index: self.index,
				ptr: self.as_ptr(),
				marker: std::marker::PhantomData
			})
			.finish()
	}
}

impl<L: AllPartialEq> PartialEq for Variant<L> {
	#[inline]
	fn eq(&self, other: &Self) -> bool {
		// SAFETY: both variants hold the alternative `index`.
		self.index == other.index && unsafe { L::EQ[self.index as usize](self.as_ptr(), other.as_ptr()) }
	}
}

impl<L: AllEq> Eq for Variant<L> {}

impl<L: AllPartialOrd> PartialOrd for Variant<L> {
	#[inline]
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		match self.index.cmp(&other.index) {
			// SAFETY: both variants hold the alternative `index`.
			Ordering::Equal => unsafe { L::PARTIAL_CMP[self.index as usize](self.as_ptr(), other.as_ptr()) },
			ordering => Some(ordering)
		}
	}
}

impl<L: AllOrd> Ord for Variant<L> {
	#[inline]
	fn cmp(&self, other: &Self) -> Ordering {
		match self.index.cmp(&other.index) {
			// SAFETY: both variants hold the alternative `index`.
			Ordering::Equal => unsafe { L::CMP[self.index as usize](self.as_ptr(), other.as_ptr()) },
			ordering => ordering
		}
	}
}

impl<L: AllHash> Hash for Variant<L> {
	#[inline]
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.index.hash(state);
		// SAFETY: the table entry at `index` expects the active alternative.
		unsafe { L::HASH[self.index as usize](self.as_ptr(), state) }
	}
}

#[cfg(test)]
mod tests {
	use std::{
		collections::hash_map::DefaultHasher,
		panic::{
			self,
			AssertUnwindSafe
		},
		rc::Rc
	};
	use super::*;

	type Number = Variant<(i32, f64)>;

	#[test]
	fn default_then_assign() {
		let mut v = Number::default();
		assert_eq!(v.index(), 0);
		assert_eq!(v.get::<i32, _>(), Ok(&0));

		v.set(10.0f64);
		assert_eq!(v.index(), 1);
		assert_eq!(v.get::<f64, _>(), Ok(&10.0));
		assert_eq!(v.get::<i32, _>(), Err(Error::BadVariantAccess { expected: 0, active: 1 }));
		assert!(v.get_if::<i32, _>().is_none());
	}

	#[test]
	fn set_same_alternative_assigns() {
		let mut v: Variant<(String, u8)> = Variant::new(String::from("a"));
		v.get_mut::<String, _>().unwrap().push('b');
		v.set(String::from("c"));
		assert_eq!(v.get::<String, _>().unwrap(), "c");
		v.set(3u8);
		assert_eq!(v.get::<u8, _>(), Ok(&3));
	}

	#[test]
	fn drops_the_active_alternative() {
		let rc = Rc::new(());
		let mut v: Variant<(u8, Rc<()>)> = Variant::new(rc.clone());
		assert_eq!(Rc::strong_count(&rc), 2);
		v.emplace(1u8);
		assert_eq!(Rc::strong_count(&rc), 1);
		v.emplace(rc.clone());
		let w = v.clone();
		assert_eq!(Rc::strong_count(&rc), 3);
		drop(v);
		drop(w);
		assert_eq!(Rc::strong_count(&rc), 1);
	}

	#[test]
	fn into_inner() {
		let v: Variant<(u8, String)> = Variant::new(String::from("owned"));
		let v = v.into_inner::<u8, _>().unwrap_err();
		assert_eq!(v.into_inner::<String, _>().unwrap(), "owned");
	}

	#[test]
	fn emplace_with_panic_keeps_previous_value() {
		let mut v: Variant<(String, u64)> = Variant::new(String::from("kept"));
		let result = panic::catch_unwind(AssertUnwindSafe(|| {
			v.emplace_with::<u64, _, _>(|| panic!("builder failed"));
		}));
		assert!(result.is_err());
		assert_eq!(v.index(), 0);
		assert_eq!(v.get::<String, _>().unwrap(), "kept");
	}

	#[test]
	fn ordering_is_index_first() {
		let a: Variant<(i32, f64)> = Variant::new(100i32);
		let b: Variant<(i32, f64)> = Variant::new(-1.0f64);
		assert!(a < b);
		let c: Variant<(i32, f64)> = Variant::new(7i32);
		assert!(c < a);
		assert_ne!(a, c);
		assert_eq!(a, a.clone());

		let x: Variant<(u8, char)> = Variant::new('x');
		let y: Variant<(u8, char)> = Variant::new(200u8);
		assert_eq!(x.cmp(&y), Ordering::Greater);
	}

	#[test]
	fn hash_depends_on_index() {
		fn hash<T: Hash>(value: &T) -> u64 {
			let mut state = DefaultHasher::new();
			value.hash(&mut state);
			state.finish()
		}

		let a: Variant<(u32, i32)> = Variant::new(1u32);
		let b: Variant<(u32, i32)> = Variant::new(1i32);
		assert_eq!(hash(&a), hash(&a.clone()));
		assert_ne!(hash(&a), hash(&b));
	}

	struct Sum;

	impl Visitor for Sum {
		type Output = f64;
	}

	impl Visit<i32> for Sum {
		fn visit(&mut self, value: &i32) -> f64 {
			*value as f64
		}
	}

	impl Visit<f64> for Sum {
		fn visit(&mut self, value: &f64) -> f64 {
			*value
		}
	}

	struct Double;

	impl Visitor for Double {
		type Output = ();
	}

	impl VisitMut<i32> for Double {
		fn visit_mut(&mut self, value: &mut i32) {
			*value *= 2
		}
	}

	impl VisitMut<f64> for Double {
		fn visit_mut(&mut self, value: &mut f64) {
			*value *= 2.0
		}
	}

	#[test]
	fn visitors() {
		let mut v: Number = Variant::new(3i32);
		v.visit_mut(&mut Double);
		assert_eq!(v.visit(&mut Sum), 6.0);
		v.set(1.25f64);
		v.visit_mut(&mut Double);
		assert_eq!(v.visit(&mut Sum), 2.5);

		let name = v.visit_with((|_: &i32| "int", |_: &f64| "double"));
		assert_eq!(name, "double");
	}

	/// Records every visited value in a borrowed log.
	struct Record<'a>(&'a mut Vec<f64>);

	impl Visitor for Record<'_> {
		type Output = usize;
	}

	impl Visit<i32> for Record<'_> {
		fn visit(&mut self, value: &i32) -> usize {
			self.0.push(*value as f64);
			self.0.len()
		}
	}

	impl Visit<f64> for Record<'_> {
		fn visit(&mut self, value: &f64) -> usize {
			self.0.push(*value);
			self.0.len()
		}
	}

	impl VisitMut<i32> for Record<'_> {
		fn visit_mut(&mut self, value: &mut i32) -> usize {
			self.0.push(*value as f64);
			*value = 0;
			self.0.len()
		}
	}

	impl VisitMut<f64> for Record<'_> {
		fn visit_mut(&mut self, value: &mut f64) -> usize {
			self.0.push(*value);
			*value = 0.0;
			self.0.len()
		}
	}

	#[test]
	fn visitors_may_borrow_local_state() {
		let mut log = Vec::new();
		let mut v: Number = Variant::new(7i32);
		assert_eq!(v.visit(&mut Record(&mut log)), 1);
		v.set(0.5f64);
		assert_eq!(v.visit_mut(&mut Record(&mut log)), 2);
		assert_eq!(v.get::<f64, _>(), Ok(&0.0));
		assert_eq!(log, [7.0, 0.5]);

		let (mut ints, mut floats) = (Vec::new(), Vec::new());
		let offset = 0.25;
		v.visit_with((|n: &i32| ints.push(*n), |x: &f64| floats.push(*x + offset)));
		assert!(ints.is_empty());
		assert_eq!(floats, [0.25]);
	}

	#[test]
	fn debug_shows_the_active_value() {
		let v: Variant<(u8, &str)> = Variant::new("hi");
		assert_eq!(format!("{:?}", v), "Variant { index: 1, value: \"hi\" }");
	}
}
