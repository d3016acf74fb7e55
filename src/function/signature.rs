//! Call signatures supported by [`Function`], up to six arguments.
use super::{
	vtable::{
		fits,
		manage_copyable,
		manage_empty,
		manage_move_only,
		object_mut,
		object_ref,
		Erase,
		Signature,
		Storage,
		Vtable
	},
	empty_call,
	Function,
	Policy
};

macro_rules! erase {
	($f:ty, $invoke:expr) => {
		fn move_only() -> &'static Vtable<Self> {
			const {
				&Vtable {
					manage: manage_move_only::<$f>,
					dispatch: Some($invoke),
					inline: fits::<$f>(),
					infallible_clone: false
				}
			}
		}

		fn copyable() -> &'static Vtable<Self> where $f: Clone {
			const {
				&Vtable {
					manage: manage_copyable::<$f>,
					dispatch: Some($invoke),
					inline: fits::<$f>(),
					infallible_clone: false
				}
			}
		}

		fn copy() -> &'static Vtable<Self> where $f: Copy {
			const {
				&Vtable {
					manage: manage_copyable::<$f>,
					dispatch: Some($invoke),
					inline: fits::<$f>(),
					infallible_clone: true
				}
			}
		}
	};
}

macro_rules! signatures {
	($($invoke:ident, $invoke_mut:ident, $nested:ident, $nested_mut:ident, $shared_mut:ident ($($a:ident: $A:ident),*);)*) => {
		$(
			unsafe fn $invoke<F: Fn($($A),*) -> R, $($A,)* R>(storage: *const Storage, $($a: $A),*) -> R {
				(*object_ref::<F>(storage))($($a),*)
			}

			unsafe fn $invoke_mut<F: FnMut($($A),*) -> R, $($A,)* R>(storage: *mut Storage, $($a: $A),*) -> R {
				(*object_mut::<F>(storage))($($a),*)
			}

			unsafe fn $nested<P: Policy, $($A: 'static,)* R: 'static>(storage: *const Storage, $($a: $A),*) -> R {
				(*object_ref::<Function<dyn Fn($($A),*) -> R, P>>(storage)).call($($a),*)
			}

			unsafe fn $nested_mut<P: Policy, $($A: 'static,)* R: 'static>(storage: *mut Storage, $($a: $A),*) -> R {
				(*object_mut::<Function<dyn FnMut($($A),*) -> R, P>>(storage)).call($($a),*)
			}

			unsafe fn $shared_mut<P: Policy, $($A: 'static,)* R: 'static>(storage: *mut Storage, $($a: $A),*) -> R {
				(*object_ref::<Function<dyn Fn($($A),*) -> R, P>>(storage)).call($($a),*)
			}

			unsafe impl<$($A: 'static,)* R: 'static> Signature for dyn Fn($($A),*) -> R {
				type Dispatch = unsafe fn(*const Storage, $($A),*) -> R;

				const EMPTY: &'static Vtable<Self> = &Vtable {
					manage: manage_empty,
					dispatch: None,
					inline: false,
					infallible_clone: true
				};
			}

			unsafe impl<$($A: 'static,)* R: 'static> Signature for dyn FnMut($($A),*) -> R {
				type Dispatch = unsafe fn(*mut Storage, $($A),*) -> R;

				const EMPTY: &'static Vtable<Self> = &Vtable {
					manage: manage_empty,
					dispatch: None,
					inline: false,
					infallible_clone: true
				};
			}

			unsafe impl<F, $($A: 'static,)* R: 'static> Erase<F> for dyn Fn($($A),*) -> R where F: Fn($($A),*) -> R + 'static {
				erase!(F, $invoke::<F, $($A,)* R>);
			}

			unsafe impl<F, $($A: 'static,)* R: 'static> Erase<F> for dyn FnMut($($A),*) -> R where F: FnMut($($A),*) -> R + 'static {
				erase!(F, $invoke_mut::<F, $($A,)* R>);
			}

			// A function given to `Function::new` is unwrapped before reaching
			// these vtables, they are only used by `new_in_place`.
			unsafe impl<P: Policy, $($A: 'static,)* R: 'static> Erase<Function<dyn Fn($($A),*) -> R, P>> for dyn Fn($($A),*) -> R {
				erase!(Function<dyn Fn($($A),*) -> R, P>, $nested::<P, $($A,)* R>);
			}

			unsafe impl<P: Policy, $($A: 'static,)* R: 'static> Erase<Function<dyn FnMut($($A),*) -> R, P>> for dyn FnMut($($A),*) -> R {
				erase!(Function<dyn FnMut($($A),*) -> R, P>, $nested_mut::<P, $($A,)* R>);
			}

			// A shared function is a valid mutable one, it is boxed as is.
			unsafe impl<P: Policy, $($A: 'static,)* R: 'static> Erase<Function<dyn Fn($($A),*) -> R, P>> for dyn FnMut($($A),*) -> R {
				erase!(Function<dyn Fn($($A),*) -> R, P>, $shared_mut::<P, $($A,)* R>);
			}

			impl<$($A: 'static,)* R: 'static, P: Policy> Function<dyn Fn($($A),*) -> R, P> {
				/// Calls the wrapped function.
				///
				/// # Panics
				///
				/// Calling an empty function is a contract violation.
				#[inline]
				pub fn call(&self, $($a: $A),*) -> R {
					match self.vtable.dispatch {
						// SAFETY: the vtable was created for the stored value.
						Some(dispatch) => unsafe { dispatch(&self.storage, $($a),*) },
						None => empty_call()
					}
				}
			}

			impl<$($A: 'static,)* R: 'static, P: Policy> Function<dyn FnMut($($A),*) -> R, P> {
				/// Calls the wrapped function.
				///
				/// # Panics
				///
				/// Calling an empty function is a contract violation.
				#[inline]
				pub fn call(&mut self, $($a: $A),*) -> R {
					match self.vtable.dispatch {
						// SAFETY: the vtable was created for the stored value.
						Some(dispatch) => unsafe { dispatch(&mut self.storage, $($a),*) },
						None => empty_call()
					}
				}
			}
		)*
	};
}

signatures! {
	invoke0, invoke_mut0, nested0, nested_mut0, shared_mut0 ();
	invoke1, invoke_mut1, nested1, nested_mut1, shared_mut1 (a0: A0);
	invoke2, invoke_mut2, nested2, nested_mut2, shared_mut2 (a0: A0, a1: A1);
	invoke3, invoke_mut3, nested3, nested_mut3, shared_mut3 (a0: A0, a1: A1, a2: A2);
	invoke4, invoke_mut4, nested4, nested_mut4, shared_mut4 (a0: A0, a1: A1, a2: A2, a3: A3);
	invoke5, invoke_mut5, nested5, nested_mut5, shared_mut5 (a0: A0, a1: A1, a2: A2, a3: A3, a4: A4);
	invoke6, invoke_mut6, nested6, nested_mut6, shared_mut6 (a0: A0, a1: A1, a2: A2, a3: A3, a4: A4, a5: A5);
}
