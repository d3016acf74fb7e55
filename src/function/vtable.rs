//! Manual vtable of the type-erased [`Function`](super::Function).
//!
//! A vtable is created once per erased type as a `&'static` constant and
//! pairs the `manage` and `dispatch` function pointers with the concrete type
//! they were instantiated with. The fields are private to this module tree,
//! which guarantees the safety invariant: **a vtable is only ever used with the
//! storage it was created for**.
use std::{
	mem::{
		self,
		MaybeUninit
	},
	ptr
};

/// Number of pointer words available for inline storage.
pub(super) const INLINE_WORDS: usize = 3;

/// Storage of the erased value.
///
/// Either the value itself, when it fits in three words and does not need a
/// larger alignment than `usize`, or a pointer to a boxed value.
#[derive(Clone, Copy)]
#[repr(C)]
pub union Storage {
	inline: [MaybeUninit<usize>; INLINE_WORDS],
	boxed: *mut ()
}

impl Storage {
	#[inline]
	pub(super) const fn uninit() -> Self {
		Storage {
			inline: [MaybeUninit::uninit(); INLINE_WORDS]
		}
	}

	/// Moves `value` into the storage, boxing it if it does not fit inline.
	///
	/// # Safety
	///
	/// The storage must not hold a value, or that value is leaked.
	#[inline]
	pub(super) unsafe fn write<F>(&mut self, value: F) {
		if fits::<F>() {
			ptr::write((self as *mut Storage).cast::<F>(), value)
		} else {
			self.boxed = Box::into_raw(Box::new(value)).cast()
		}
	}
}

/// Returns `true` if values of type `F` are stored inline.
#[inline]
pub(super) const fn fits<F>() -> bool {
	mem::size_of::<F>() <= mem::size_of::<Storage>() && mem::align_of::<F>() <= mem::align_of::<Storage>()
}

/// ## Safety
///
/// The storage must hold a value of type `F`.
#[inline]
unsafe fn object<F>(storage: *mut Storage) -> *mut F {
	if fits::<F>() {
		storage.cast()
	} else {
		(*storage).boxed.cast()
	}
}

/// ## Safety
///
/// The storage must hold a value of type `F`.
#[inline]
pub(super) unsafe fn object_ref<F>(storage: *const Storage) -> *const F {
	object::<F>(storage as *mut Storage)
}

/// ## Safety
///
/// The storage must hold a value of type `F`.
#[inline]
pub(super) unsafe fn object_mut<F>(storage: *mut Storage) -> *mut F {
	object::<F>(storage)
}

/// Operation performed by a `manage` function.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(super) enum Op {
	/// Drops the value in `src`. `dst` is unused.
	Destroy,

	/// Moves the value from `src` to `dst`. `src` is left uninitialized.
	DestructiveMove,

	/// Clones the value of `src` into the uninitialized `dst`.
	Clone
}

type Manage = unsafe fn(Op, *mut Storage, *mut Storage);

/// Vtable of an erased callable with signature `S`.
///
/// # Safety Invariant
///
/// `manage` and `dispatch` point to functions instantiated with the erased type
/// stored along this vtable. The empty vtable has no `dispatch` and a `manage`
/// function that does nothing.
#[repr(C)]
pub struct Vtable<S: ?Sized + Signature> {
	pub(super) manage: Manage,
	pub(super) dispatch: Option<S::Dispatch>,
	pub(super) inline: bool,
	pub(super) infallible_clone: bool
}

impl<S: ?Sized + Signature> Vtable<S> {
	/// Performs `op` on the storage.
	///
	/// # Safety
	///
	/// The storages must match what `op` expects, and `src` must hold a value
	/// of the erased type of this vtable (or nothing if it is the empty vtable).
	#[inline]
	pub(super) unsafe fn manage(&self, op: Op, src: *mut Storage, dst: *mut Storage) {
		(self.manage)(op, src, dst)
	}
}

/// Manage function of the empty vtable.
pub(super) unsafe fn manage_empty(_op: Op, _src: *mut Storage, _dst: *mut Storage) {}

/// Manage function of clonable erased types.
pub(super) unsafe fn manage_copyable<F: Clone>(op: Op, src: *mut Storage, dst: *mut Storage) {
	match op {
		Op::Destroy => destroy::<F>(src),
		Op::DestructiveMove => ptr::copy_nonoverlapping(src, dst, 1),
		Op::Clone => {
			let value = (*object_ref::<F>(src)).clone();
			(*dst).write(value)
		}
	}
}

/// Manage function of move-only erased types.
pub(super) unsafe fn manage_move_only<F>(op: Op, src: *mut Storage, dst: *mut Storage) {
	match op {
		Op::Destroy => destroy::<F>(src),
		Op::DestructiveMove => ptr::copy_nonoverlapping(src, dst, 1),
		Op::Clone => unreachable!("move-only function cloned")
	}
}

unsafe fn destroy<F>(storage: *mut Storage) {
	if fits::<F>() {
		ptr::drop_in_place(object_mut::<F>(storage))
	} else {
		drop(Box::from_raw(object_mut::<F>(storage)))
	}
}

/// Call signature of a [`Function`](super::Function).
///
/// Implemented for `dyn Fn(A..) -> R` (called through `&self`) and
/// `dyn FnMut(A..) -> R` (called through `&mut self`) with up to six arguments.
///
/// # Safety
///
/// `Dispatch` must be the type of the invoke functions of the signature and
/// `EMPTY` must be the empty vtable.
pub unsafe trait Signature: 'static {
	/// Type of the function invoking the erased value.
	type Dispatch: Copy;

	/// Vtable of the empty function.
	const EMPTY: &'static Vtable<Self>;
}

/// Erasure of values of type `F` under the signature `Self`.
///
/// # Safety
///
/// Every returned vtable must manage and dispatch values of type `F`.
pub unsafe trait Erase<F>: Signature {
	/// Vtable used by move-only functions.
	fn move_only() -> &'static Vtable<Self>;

	/// Vtable used by copyable functions.
	fn copyable() -> &'static Vtable<Self> where F: Clone;

	/// Vtable used by copyable functions whose value cannot fail to clone.
	fn copy() -> &'static Vtable<Self> where F: Copy;
}

#[cfg(test)]
mod tests {
	use super::*;

	static_assertions::assert_eq_size!(Storage, [usize; INLINE_WORDS]);

	#[repr(align(16))]
	struct OverAligned(#[allow(dead_code)] u8);

	#[test]
	fn inline_rule() {
		assert!(fits::<()>());
		assert!(fits::<[usize; 3]>());
		assert!(!fits::<[usize; 4]>());
		assert!(!fits::<OverAligned>());
	}

	#[test]
	fn copyable_manage_clones_and_destroys() {
		unsafe {
			let mut a = Storage::uninit();
			a.write(String::from("boxed or not"));
			let mut b = Storage::uninit();
			manage_copyable::<String>(Op::Clone, &mut a, &mut b);
			assert_eq!(*object_ref::<String>(&b), "boxed or not");

			let mut c = Storage::uninit();
			manage_copyable::<String>(Op::DestructiveMove, &mut b, &mut c);
			assert_eq!(*object_ref::<String>(&c), "boxed or not");

			manage_copyable::<String>(Op::Destroy, &mut a, ptr::null_mut());
			manage_copyable::<String>(Op::Destroy, &mut c, ptr::null_mut());
		}
	}
}
