//! Lists of alternatives.
//!
//! A [`Variant`](super::Variant) is parameterized by a tuple `(T0, .., Tk)` of
//! up to eight alternatives. The traits of this module are implemented for
//! such tuples and provide everything the variant needs at compile time: the
//! storage union, the index of each alternative, and one jump table (array of
//! function pointers, one per alternative) per operation. Visitors are
//! dispatched by a `match` on the index instead, so that they may borrow.
//!
//! Every alternative is stored at offset 0 of the `#[repr(C)]` storage union,
//! so the entries of the jump tables only take the address of the storage.
use std::{
	cmp::Ordering,
	fmt,
	hash::{
		Hash,
		Hasher
	},
	mem::ManuallyDrop,
	ptr
};
use super::visit::{
	Visit,
	VisitMut,
	Visitor
};

/// Maximum number of alternatives of a list.
///
/// The index type could go up to 254 (255 being reserved to mean "not a member"),
/// lists are only implemented up to this size.
pub const MAX_ALTERNATIVES: usize = 8;

/// Recursive `#[repr(C)]` union, sized and aligned for the largest of its members.
///
/// Members are only ever accessed through pointer casts.
#[allow(dead_code)]
#[repr(C)]
pub union Union<A, B> {
	head: ManuallyDrop<A>,
	tail: ManuallyDrop<B>
}

impl<A: Copy, B: Copy> Clone for Union<A, B> {
	#[inline]
	fn clone(&self) -> Self {
		*self
	}
}

impl<A: Copy, B: Copy> Copy for Union<A, B> {}

/// Position marker, used to tell apart the [`Member`] implementations.
pub struct Idx<const K: usize>;

/// List of alternatives.
///
/// # Safety
///
/// `Storage` must be able to hold any alternative at offset 0, `Pointers` any
/// `*const Ti` at offset 0, and the `DROP` table must hold the drop function of
/// each alternative, in order.
pub unsafe trait Alternatives: Sized + 'static {
	/// First alternative.
	type First;

	/// Storage union.
	type Storage;

	/// Union of pointers to each alternative.
	type Pointers: Copy;

	/// Number of alternatives.
	const COUNT: usize;

	/// Drops the alternative stored at the given address.
	const DROP: &'static [unsafe fn(*mut u8)];
}

/// `T` is the alternative at position `I` in the list.
///
/// A type appearing twice in a list has two `Member` implementations, which
/// makes the position of the type ambiguous.
///
/// # Safety
///
/// `INDEX` must be the position of `T` in the list.
pub unsafe trait Member<T, I>: Alternatives {
	/// Position of `T`.
	const INDEX: u8;
}

/// Every alternative is `Clone`.
///
/// # Safety
///
/// `CLONE` must hold the clone function of each alternative, in order.
pub unsafe trait AllClone: Alternatives {
	/// Clones the alternative at the first address into the second.
	const CLONE: &'static [unsafe fn(*const u8, *mut u8)];
}

/// Every alternative is `PartialEq`.
///
/// # Safety
///
/// `EQ` must hold the comparison function of each alternative, in order.
pub unsafe trait AllPartialEq: Alternatives {
	const EQ: &'static [unsafe fn(*const u8, *const u8) -> bool];
}

/// Every alternative is `Eq`.
pub trait AllEq: AllPartialEq {}

/// Every alternative is `PartialOrd`.
///
/// # Safety
///
/// `PARTIAL_CMP` must hold the comparison function of each alternative, in order.
pub unsafe trait AllPartialOrd: AllPartialEq {
	const PARTIAL_CMP: &'static [unsafe fn(*const u8, *const u8) -> Option<Ordering>];
}

/// Every alternative is `Ord`.
///
/// # Safety
///
/// `CMP` must hold the comparison function of each alternative, in order.
pub unsafe trait AllOrd: AllEq + AllPartialOrd {
	const CMP: &'static [unsafe fn(*const u8, *const u8) -> Ordering];
}

/// Every alternative is `Hash`.
///
/// # Safety
///
/// `HASH` must hold the hash function of each alternative, in order.
pub unsafe trait AllHash: Alternatives {
	const HASH: &'static [unsafe fn(*const u8, &mut dyn Hasher)];
}

/// Every alternative is `Debug`.
///
/// # Safety
///
/// `DEBUG` must hold the formatting function of each alternative, in order.
pub unsafe trait AllDebug: Alternatives {
	const DEBUG: &'static [unsafe fn(*const u8, &mut fmt::Formatter) -> fmt::Result];
}

/// The visitor `V` can visit every alternative.
///
/// # Safety
///
/// `visit` must call the visit function of the alternative at `index`.
pub unsafe trait AllVisit<V: Visitor>: Alternatives {
	/// Visits the alternative `index` stored at `p`.
	///
	/// # Safety
	///
	/// `p` must point to a valid value of the alternative `index`.
	unsafe fn visit(visitor: &mut V, index: u8, p: *const u8) -> V::Output;
}

/// The visitor `V` can mutably visit every alternative.
///
/// # Safety
///
/// `visit_mut` must call the visit function of the alternative at `index`.
pub unsafe trait AllVisitMut<V: Visitor>: Alternatives {
	/// Visits the alternative `index` stored at `p`.
	///
	/// # Safety
	///
	/// `p` must point to a valid value of the alternative `index`, not aliased
	/// for the duration of the call.
	unsafe fn visit_mut(visitor: &mut V, index: u8, p: *mut u8) -> V::Output;
}

/// Tuple of closures, one per alternative of `L`, in order, all returning `R`.
///
/// # Safety
///
/// `call` must call the closure matching the alternative at `index`.
pub unsafe trait Overload<L: Alternatives, R>: Sized {
	/// Calls the closure of the alternative `index` on the value stored at `p`.
	///
	/// # Safety
	///
	/// `p` must point to a valid value of the alternative `index`.
	unsafe fn call(self, index: u8, p: *const u8) -> R;
}

unsafe fn drop_as<T>(p: *mut u8) {
	ptr::drop_in_place(p.cast::<T>())
}

unsafe fn clone_as<T: Clone>(src: *const u8, dst: *mut u8) {
	ptr::write(dst.cast::<T>(), (*src.cast::<T>()).clone())
}

unsafe fn eq_as<T: PartialEq>(a: *const u8, b: *const u8) -> bool {
	*a.cast::<T>() == *b.cast::<T>()
}

unsafe fn partial_cmp_as<T: PartialOrd>(a: *const u8, b: *const u8) -> Option<Ordering> {
	(*a.cast::<T>()).partial_cmp(&*b.cast::<T>())
}

unsafe fn cmp_as<T: Ord>(a: *const u8, b: *const u8) -> Ordering {
	(*a.cast::<T>()).cmp(&*b.cast::<T>())
}

unsafe fn hash_as<T: Hash>(p: *const u8, mut state: &mut dyn Hasher) {
	(*p.cast::<T>()).hash(&mut state)
}

unsafe fn debug_as<T: fmt::Debug>(p: *const u8, f: &mut fmt::Formatter) -> fmt::Result {
	(*p.cast::<T>()).fmt(f)
}

#[cold]
#[inline(never)]
fn invalid_index(index: u8) -> ! {
	unreachable!("invalid alternative index {}", index)
}

macro_rules! storage {
	() => { () };
	($T:ident $(, $rest:ident)*) => { Union<$T, storage!($($rest),*)> };
}

macro_rules! pointers {
	() => { () };
	($T:ident $(, $rest:ident)*) => { Union<*const $T, pointers!($($rest),*)> };
}

macro_rules! member {
	([$($T:ident $F:ident $j:tt),*] $Ti:ident $i:tt) => {
		unsafe impl<$($T: 'static),*> Member<$Ti, Idx<$i>> for ($($T,)*) {
			const INDEX: u8 = $i;
		}
	};
}

macro_rules! list {
	($First:ident, $all:tt) => {
		list!(@impl $First, $all, $all);
	};
	(@impl $First:ident, [$($T:ident $F:ident $i:tt),*], $all:tt) => {
		unsafe impl<$($T: 'static),*> Alternatives for ($($T,)*) {
			type First = $First;
			type Storage = storage!($($T),*);
			type Pointers = pointers!($($T),*);

			const COUNT: usize = [$($i),*].len();

			const DROP: &'static [unsafe fn(*mut u8)] = &[$(drop_as::<$T>),*];
		}

		$(member!($all $T $i);)*

		unsafe impl<$($T: 'static + Clone),*> AllClone for ($($T,)*) {
			const CLONE: &'static [unsafe fn(*const u8, *mut u8)] = &[$(clone_as::<$T>),*];
		}

		unsafe impl<$($T: 'static + PartialEq),*> AllPartialEq for ($($T,)*) {
			const EQ: &'static [unsafe fn(*const u8, *const u8) -> bool] = &[$(eq_as::<$T>),*];
		}

		impl<$($T: 'static + Eq),*> AllEq for ($($T,)*) {}

		unsafe impl<$($T: 'static + PartialOrd),*> AllPartialOrd for ($($T,)*) {
			const PARTIAL_CMP: &'static [unsafe fn(*const u8, *const u8) -> Option<Ordering>] = &[$(partial_cmp_as::<$T>),*];
		}

		unsafe impl<$($T: 'static + Ord),*> AllOrd for ($($T,)*) {
			const CMP: &'static [unsafe fn(*const u8, *const u8) -> Ordering] = &[$(cmp_as::<$T>),*];
		}

		unsafe impl<$($T: 'static + Hash),*> AllHash for ($($T,)*) {
			const HASH: &'static [unsafe fn(*const u8, &mut dyn Hasher)] = &[$(hash_as::<$T>),*];
		}

		unsafe impl<$($T: 'static + fmt::Debug),*> AllDebug for ($($T,)*) {
			const DEBUG: &'static [unsafe fn(*const u8, &mut fmt::Formatter) -> fmt::Result] = &[$(debug_as::<$T>),*];
		}

		unsafe impl<V: Visitor $(+ Visit<$T>)*, $($T: 'static),*> AllVisit<V> for ($($T,)*) {
			#[inline]
			unsafe fn visit(visitor: &mut V, index: u8, p: *const u8) -> V::Output {
				match index {
					$($i => Visit::<$T>::visit(visitor, &*p.cast::<$T>()),)*
					_ => invalid_index(index)
				}
			}
		}

		unsafe impl<V: Visitor $(+ VisitMut<$T>)*, $($T: 'static),*> AllVisitMut<V> for ($($T,)*) {
			#[inline]
			unsafe fn visit_mut(visitor: &mut V, index: u8, p: *mut u8) -> V::Output {
				match index {
					$($i => VisitMut::<$T>::visit_mut(visitor, &mut *p.cast::<$T>()),)*
					_ => invalid_index(index)
				}
			}
		}

		unsafe impl<R, $($T: 'static,)* $($F: FnOnce(&$T) -> R),*> Overload<($($T,)*), R> for ($($F,)*) {
			#[inline]
			unsafe fn call(self, index: u8, p: *const u8) -> R {
				match index {
					$($i => (self.$i)(&*p.cast::<$T>()),)*
					_ => invalid_index(index)
				}
			}
		}
	};
}

list!(T0, [T0 F0 0]);
list!(T0, [T0 F0 0, T1 F1 1]);
list!(T0, [T0 F0 0, T1 F1 1, T2 F2 2]);
list!(T0, [T0 F0 0, T1 F1 1, T2 F2 2, T3 F3 3]);
list!(T0, [T0 F0 0, T1 F1 1, T2 F2 2, T3 F3 3, T4 F4 4]);
list!(T0, [T0 F0 0, T1 F1 1, T2 F2 2, T3 F3 3, T4 F4 4, T5 F5 5]);
list!(T0, [T0 F0 0, T1 F1 1, T2 F2 2, T3 F3 3, T4 F4 4, T5 F5 5, T6 F6 6]);
list!(T0, [T0 F0 0, T1 F1 1, T2 F2 2, T3 F3 3, T4 F4 4, T5 F5 5, T6 F6 6, T7 F7 7]);
