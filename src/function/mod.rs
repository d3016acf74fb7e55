//! Type-erased function wrapper.
//!
//! [`Function<S, P>`](Function) stores any callable matching the signature `S`
//! behind a manually written, `#[repr(C)]` vtable. Values fitting in three
//! pointer words (with an alignment no larger than `usize`) are stored inline,
//! larger ones are boxed. The wrapper itself is always four words.
//!
//! ```
//! # use calf_stable::Function;
//! let offset = 10;
//! let f: Function<dyn Fn(i32) -> i32> = Function::new(move |x: i32| x + offset);
//! assert!(f.is_inline());
//! assert_eq!(f.call(5), 15);
//! ```
//!
//! Signatures are written as `dyn Fn(A..) -> R` (called through `&self`) or
//! `dyn FnMut(A..) -> R` (called through `&mut self`), with up to six
//! arguments. Argument and return types must be `'static`, and so must the
//! erased callable. Methods are erased through their path: `Type::method` is a
//! function taking the receiver as first argument.
use std::{
	any::TypeId,
	fmt,
	marker::PhantomData,
	mem::{
		self,
		ManuallyDrop
	},
	ptr
};

mod signature;
mod vtable;

use vtable::{
	Op,
	Storage
};
pub use vtable::{
	Erase,
	Signature,
	Vtable
};

mod sealed {
	pub trait Sealed {}
}

/// Copy policy of a [`Function`].
pub trait Policy: sealed::Sealed + 'static {}

/// The function is clonable, and so must be the erased value.
#[derive(Debug)]
pub enum Copyable {}

/// The function cannot be cloned, and the erased value only needs to be movable.
#[derive(Debug)]
pub enum MoveOnly {}

impl sealed::Sealed for Copyable {}
impl sealed::Sealed for MoveOnly {}
impl Policy for Copyable {}
impl Policy for MoveOnly {}

/// Callables of type `F` can be wrapped by functions with this policy.
///
/// # Safety
///
/// The returned vtable must support every operation of the policy.
pub unsafe trait Accepts<F>: Policy {
	/// Vtable of `F` for this policy.
	fn vtable<S: ?Sized + Erase<F>>() -> &'static Vtable<S>;
}

unsafe impl<F: Clone> Accepts<F> for Copyable {
	#[inline]
	fn vtable<S: ?Sized + Erase<F>>() -> &'static Vtable<S> {
		S::copyable()
	}
}

unsafe impl<F> Accepts<F> for MoveOnly {
	#[inline]
	fn vtable<S: ?Sized + Erase<F>>() -> &'static Vtable<S> {
		S::move_only()
	}
}

/// Type-erased callable with signature `S` and copy policy `P`.
#[repr(C)]
pub struct Function<S: ?Sized + Signature, P: Policy = Copyable> {
	vtable: &'static Vtable<S>,
	storage: Storage,
	policy: PhantomData<P>
}

#[cold]
#[inline(never)]
#[track_caller]
fn empty_call() -> ! {
	crate::contract::violated(format_args!("called an empty function"))
}

impl<S: ?Sized + Signature, P: Policy> Function<S, P> {
	/// Creates an empty function.
	///
	/// Calling an empty function is a contract violation.
	#[inline]
	pub fn empty() -> Self {
		Function {
			vtable: S::EMPTY,
			storage: Storage::uninit(),
			policy: PhantomData
		}
	}

	/// ## Safety
	///
	/// `vtable` must have been created for the type `F`.
	#[inline]
	unsafe fn from_parts<F>(vtable: &'static Vtable<S>, value: F) -> Self {
		let mut storage = Storage::uninit();
		storage.write(value);
		Function {
			vtable,
			storage,
			policy: PhantomData
		}
	}

	/// Takes `value` as is if it already is a compatible function.
	fn unwrap<F: 'static>(value: F) -> Result<Self, F> {
		let id = TypeId::of::<F>();
		if id == TypeId::of::<Self>() {
			let value = ManuallyDrop::new(value);
			// SAFETY: `F` is `Self`.
			Ok(unsafe { ptr::read(&*value as *const F as *const Self) })
		} else if id == TypeId::of::<Function<S, Copyable>>() {
			let value = ManuallyDrop::new(value);
			// SAFETY: `F` is `Function<S, Copyable>`.
			let f = unsafe { ptr::read(&*value as *const F as *const Function<S, Copyable>) };
			Ok(f.into_policy())
		} else {
			Err(value)
		}
	}

	/// Changes the policy.
	///
	/// Only sound from `Copyable`, or to the same policy.
	#[inline]
	fn into_policy<Q: Policy>(self) -> Function<S, Q> {
		let this = ManuallyDrop::new(self);
		Function {
			vtable: this.vtable,
			storage: this.storage,
			policy: PhantomData
		}
	}

	/// Returns `true` if the function is empty.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.vtable.dispatch.is_none()
	}

	/// Returns `true` if the erased value is stored inline.
	///
	/// An empty function is not inline.
	#[inline]
	pub fn is_inline(&self) -> bool {
		self.vtable.inline
	}

	/// Moves the erased value out, leaving `self` empty.
	#[inline]
	pub fn take(&mut self) -> Self {
		let mut storage = Storage::uninit();
		unsafe {
			self.vtable.manage(Op::DestructiveMove, &mut self.storage, &mut storage);
		}

		Function {
			vtable: mem::replace(&mut self.vtable, S::EMPTY),
			storage,
			policy: PhantomData
		}
	}

	/// Swaps the erased values of two functions.
	///
	/// The values are moved through a temporary storage, whatever their type
	/// and storage mode.
	pub fn swap(&mut self, other: &mut Self) {
		let mut tmp = Storage::uninit();
		unsafe {
			self.vtable.manage(Op::DestructiveMove, &mut self.storage, &mut tmp);
			other.vtable.manage(Op::DestructiveMove, &mut other.storage, &mut self.storage);
			self.vtable.manage(Op::DestructiveMove, &mut tmp, &mut other.storage);
		}

		mem::swap(&mut self.vtable, &mut other.vtable)
	}

	/// Destroys the erased value, leaving `self` empty.
	#[inline]
	fn reset(&mut self) {
		let vtable = mem::replace(&mut self.vtable, S::EMPTY);
		unsafe {
			vtable.manage(Op::Destroy, &mut self.storage, ptr::null_mut())
		}
	}
}

impl<S: ?Sized + Signature, P: Policy> Function<S, P> {
	/// Wraps a callable.
	///
	/// A copyable function requires the callable to be `Clone`.
	/// If `f` already is a function with the same signature (and the same
	/// policy, or a copyable one), it is taken as is instead of being wrapped a
	/// second time. A `dyn Fn` function given to a `dyn FnMut` one is boxed.
	pub fn new<F: 'static>(f: F) -> Self where S: Erase<F>, P: Accepts<F> {
		match Self::unwrap(f) {
			Ok(this) => this,
			// SAFETY: the vtable is created for `F`.
			Err(f) => unsafe { Self::from_parts(P::vtable::<S>(), f) }
		}
	}

	/// Wraps the callable returned by `build`, without checking whether it
	/// already is a function.
	pub fn new_in_place<F: 'static>(build: impl FnOnce() -> F) -> Self where S: Erase<F>, P: Accepts<F> {
		// SAFETY: the vtable is created for `F`.
		unsafe { Self::from_parts(P::vtable::<S>(), build()) }
	}

	/// Wraps the callable if any, or creates an empty function.
	///
	/// This is how nullable function pointers are wrapped.
	#[inline]
	pub fn from_option<F: 'static>(f: Option<F>) -> Self where S: Erase<F>, P: Accepts<F> {
		match f {
			Some(f) => Self::new(f),
			None => Self::empty()
		}
	}
}

impl<S: ?Sized + Signature> Function<S, Copyable> {
	/// Wraps a copyable callable, such as a function pointer or a closure
	/// capturing only `Copy` values.
	///
	/// Cloning such a value cannot fail, which lets
	/// [`clone_from`](Clone::clone_from) skip the temporary copy.
	pub fn from_copy<F: Copy + 'static>(f: F) -> Self where S: Erase<F> {
		// SAFETY: the vtable is created for `F`.
		unsafe { Self::from_parts(S::copy(), f) }
	}
}

impl<S: ?Sized + Signature> From<Function<S, Copyable>> for Function<S, MoveOnly> {
	#[inline]
	fn from(f: Function<S, Copyable>) -> Self {
		f.into_policy()
	}
}

impl<S: ?Sized + Signature, P: Policy> Drop for Function<S, P> {
	fn drop(&mut self) {
		unsafe {
			self.vtable.manage(Op::Destroy, &mut self.storage, ptr::null_mut())
		}
	}
}

impl<S: ?Sized + Signature, P: Policy> Default for Function<S, P> {
	#[inline]
	fn default() -> Self {
		Function::empty()
	}
}

impl<S: ?Sized + Signature> Clone for Function<S, Copyable> {
	fn clone(&self) -> Self {
		let mut storage = Storage::uninit();
		unsafe {
			// `Clone` only reads from the source.
			let src = &self.storage as *const Storage as *mut Storage;
			self.vtable.manage(Op::Clone, src, &mut storage);
		}

		Function {
			vtable: self.vtable,
			storage,
			policy: PhantomData
		}
	}

	fn clone_from(&mut self, source: &Self) {
		if source.vtable.infallible_clone {
			self.reset();
			unsafe {
				let src = &source.storage as *const Storage as *mut Storage;
				source.vtable.manage(Op::Clone, src, &mut self.storage);
			}
			self.vtable = source.vtable;
		} else {
			// if the clone panics, `self` is untouched.
			let mut tmp = source.clone();
			self.reset();
			unsafe {
				tmp.vtable.manage(Op::DestructiveMove, &mut tmp.storage, &mut self.storage);
			}
			self.vtable = mem::replace(&mut tmp.vtable, S::EMPTY);
		}
	}
}

impl<S: ?Sized + Signature, P: Policy> fmt::Debug for Function<S, P> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Function")
			.field("empty", &self.is_empty())
			.field("inline", &self.is_inline())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::{
		panic::{
			self,
			AssertUnwindSafe
		},
		rc::Rc,
		sync::atomic::{
			AtomicBool,
			Ordering
		}
	};
	use super::*;

	static_assertions::assert_eq_size!(Function<dyn Fn(i32) -> i32>, [usize; 4]);
	static_assertions::assert_eq_size!(Function<dyn FnMut(String, u8) -> bool, MoveOnly>, [usize; 4]);
	static_assertions::assert_not_impl_any!(Function<dyn Fn()>: Send, Sync);
	static_assertions::assert_not_impl_any!(Function<dyn Fn(), MoveOnly>: Clone);

	type Unary = Function<dyn Fn(i32) -> i32>;
	type Thunk = Function<dyn Fn() -> usize>;

	fn double(x: i32) -> i32 {
		x * 2
	}

	#[test]
	fn small_closures_are_inline() {
		let (a, b) = (1u64, 2u64);
		let f: Function<dyn Fn(u64) -> u64> = Function::new(move |x: u64| a + b + x);
		assert!(f.is_inline());
		assert!(!f.is_empty());
		assert_eq!(f.call(3), 6);
	}

	#[test]
	fn large_closures_are_boxed() {
		let table = [1u64; 8];
		let f: Function<dyn Fn(usize) -> u64> = Function::new(move |i: usize| table[..i].iter().sum::<u64>());
		assert!(!f.is_inline());
		assert_eq!(f.call(5), 5);
	}

	#[test]
	fn over_aligned_values_are_boxed() {
		#[derive(Clone, Copy)]
		#[repr(align(16))]
		struct Aligned(u8);

		let value = Aligned(7);
		let f: Function<dyn Fn() -> u8> = Function::new(move || {
			let v = value;
			v.0
		});
		assert!(!f.is_inline());
		assert_eq!(f.call(), 7);
	}

	#[test]
	fn function_pointers_and_method_paths() {
		let f = Unary::new(double as fn(i32) -> i32);
		assert_eq!(f.call(21), 42);
		let abs = Unary::new(i32::abs);
		assert_eq!(abs.call(-3), 3);
		let len: Function<dyn Fn(String) -> usize> = Function::new(|s: String| s.len());
		assert_eq!(len.call("four".to_string()), 4);
	}

	#[test]
	fn from_option() {
		let none = Unary::from_option(None::<fn(i32) -> i32>);
		assert!(none.is_empty());
		assert!(!none.is_inline());
		let some = Unary::from_option(Some(double as fn(i32) -> i32));
		assert_eq!(some.call(1), 2);
	}

	#[test]
	#[should_panic(expected = "contract violation: called an empty function")]
	fn calling_an_empty_function_is_a_contract_violation() {
		let f = Unary::default();
		f.call(0);
	}

	#[test]
	fn wrapping_a_function_unwraps_it() {
		let f = Unary::new(|x: i32| x + 1);
		let g = Unary::new(f.clone());
		// a nested function would not fit inline.
		assert!(g.is_inline());
		assert_eq!(g.call(1), 2);

		let h: Function<dyn Fn(i32) -> i32, MoveOnly> = Function::new(f);
		assert!(h.is_inline());
		assert_eq!(h.call(2), 3);
	}

	#[test]
	fn shared_functions_wrap_into_mutable_ones() {
		let f = Unary::new(|x: i32| x + 1);
		let mut g: Function<dyn FnMut(i32) -> i32> = Function::new(f.clone());
		assert!(!g.is_inline());
		assert_eq!(g.call(1), 2);

		let mut h: Function<dyn FnMut(i32) -> i32, MoveOnly> = Function::new(f);
		assert_eq!(h.call(2), 3);
		let mut k = g.clone();
		assert_eq!(k.call(3), 4);
	}

	#[test]
	fn new_in_place_nests() {
		let f = Unary::new(|x: i32| x + 1);
		let g = Unary::new_in_place(|| f);
		assert!(!g.is_inline());
		assert_eq!(g.call(1), 2);
	}

	#[test]
	fn mutable_state_is_cloned() {
		let mut counter = 0;
		let mut f: Function<dyn FnMut() -> i32> = Function::new(move || {
			counter += 1;
			counter
		});
		assert_eq!(f.call(), 1);
		let mut g = f.clone();
		assert_eq!(f.call(), 2);
		assert_eq!(g.call(), 2);
		assert_eq!(g.call(), 3);
	}

	#[test]
	fn move_only_accepts_non_clonable_values() {
		let owned = Box::new(5);
		let mut f: Function<dyn FnMut(i32, i32, i32, i32, i32, i32) -> i32, MoveOnly> = Function::new(
			move |a: i32, b: i32, c: i32, d: i32, e: i32, g: i32| *owned + a + b + c + d + e + g
		);
		assert_eq!(f.call(1, 1, 1, 1, 1, 1), 11);

		let copyable = Unary::new(double as fn(i32) -> i32);
		let converted: Function<dyn Fn(i32) -> i32, MoveOnly> = copyable.into();
		assert_eq!(converted.call(4), 8);
	}

	#[test]
	fn take_leaves_the_source_empty() {
		let mut f: Function<dyn Fn() -> &'static str> = Function::new(|| "moved");
		let g = f.take();
		assert!(f.is_empty());
		assert_eq!(g.call(), "moved");
		let h = mem::take(&mut f);
		assert!(h.is_empty());
	}

	#[test]
	fn swap_inline_and_boxed() {
		let big = [3u8; 64];
		let mut inline = Thunk::new(|| 1);
		let mut boxed = Thunk::new(move || big.len());
		assert!(inline.is_inline());
		assert!(!boxed.is_inline());

		inline.swap(&mut boxed);
		assert!(!inline.is_inline());
		assert!(boxed.is_inline());
		assert_eq!(inline.call(), 64);
		assert_eq!(boxed.call(), 1);

		let mut empty = Thunk::empty();
		empty.swap(&mut inline);
		assert!(inline.is_empty());
		assert_eq!(empty.call(), 64);
	}

	#[test]
	fn values_are_dropped_once() {
		let counter = Rc::new(());
		{
			let c = counter.clone();
			let f = Thunk::new(move || Rc::strong_count(&c));
			let g = f.clone();
			assert_eq!(Rc::strong_count(&counter), 3);
			let mut h = Thunk::empty();
			h.clone_from(&g);
			assert_eq!(Rc::strong_count(&counter), 4);
			drop(f);
			assert_eq!(h.call(), 3);
		}
		assert_eq!(Rc::strong_count(&counter), 1);
	}

	#[test]
	fn clone_from_copy_values() {
		let mut f = Unary::new(|x: i32| x - 1);
		let g = Unary::from_copy(double as fn(i32) -> i32);
		f.clone_from(&g);
		assert_eq!(f.call(4), 8);
	}

	static FAIL: AtomicBool = AtomicBool::new(false);

	struct Fragile;

	impl Clone for Fragile {
		fn clone(&self) -> Self {
			if FAIL.load(Ordering::SeqCst) {
				panic!("clone failed")
			}
			Fragile
		}
	}

	#[test]
	fn failed_clone_from_keeps_the_target() {
		let fragile = Fragile;
		let source: Function<dyn Fn() -> i32> = Function::new(move || {
			let _ = &fragile;
			1
		});
		let mut target: Function<dyn Fn() -> i32> = Function::new(|| 2);

		FAIL.store(true, Ordering::SeqCst);
		let result = panic::catch_unwind(AssertUnwindSafe(|| target.clone_from(&source)));
		FAIL.store(false, Ordering::SeqCst);
		assert!(result.is_err());
		assert_eq!(target.call(), 2);
		assert_eq!(source.call(), 1);
	}
}
