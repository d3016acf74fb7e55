//! Allocation counting.
//!
//! The global allocator counts the allocations made by the current thread, so
//! that the tests of this file can run in parallel.

use std::{
	alloc::{GlobalAlloc, Layout, System},
	cell::Cell
};

use calf_stable::{Function, SmallString, Variant, Vector};

struct Counting;

thread_local! {
	static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
	static DEALLOCATIONS: Cell<usize> = const { Cell::new(0) };
}

fn bump(counter: &'static std::thread::LocalKey<Cell<usize>>) {
	let _ = counter.try_with(|c| c.set(c.get() + 1));
}

unsafe impl GlobalAlloc for Counting {
	unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
		bump(&ALLOCATIONS);
		System.alloc(layout)
	}

	unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
		bump(&DEALLOCATIONS);
		System.dealloc(ptr, layout)
	}

	unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
		bump(&ALLOCATIONS);
		System.realloc(ptr, layout, new_size)
	}
}

#[global_allocator]
static GLOBAL: Counting = Counting;

/// Returns the number of (allocations, deallocations) performed by `f`.
fn count<R>(f: impl FnOnce() -> R) -> (R, usize, usize) {
	let allocations = ALLOCATIONS.with(Cell::get);
	let deallocations = DEALLOCATIONS.with(Cell::get);
	let result = f();
	(
		result,
		ALLOCATIONS.with(Cell::get) - allocations,
		DEALLOCATIONS.with(Cell::get) - deallocations
	)
}

#[test]
fn hello_world() {
	let (mut s, allocations, _) = count(|| SmallString::<24>::from("Hello World"));
	assert_eq!(allocations, 0);
	assert!(!s.is_spilled());

	let ((), allocations, _) = count(|| s.push_str("xxxxxxxxxxxxxxxxxxxxxxxx"));
	assert_eq!(allocations, 1);
	assert_eq!(s.len(), 35);
	assert_eq!(s.as_c_str().to_bytes().len(), 35);
	assert_eq!(s.as_bytes_with_nul()[35], 0);
}

#[test]
fn growing_past_the_threshold_allocates_once() {
	let ((), allocations, _) = count(|| {
		let mut v: Vector<u64, 8> = Vector::new();
		for i in 0..16 {
			v.push(i);
		}
		assert_eq!(v.capacity(), 16);
	});
	assert_eq!(allocations, 1);
}

#[test]
fn shrink_to_fit_releases_the_heap() {
	let mut v: Vector<u8, 16> = Vector::from([0u8; 20]);
	v.truncate(10);
	let ((), allocations, deallocations) = count(|| v.shrink_to_fit());
	assert_eq!((allocations, deallocations), (0, 1));
	assert_eq!(v.capacity(), 16);
	assert!(!v.is_spilled());
}

#[test]
fn small_functions_are_not_boxed() {
	let (a, b) = (1u64, 2u64);
	let (f, allocations, _) = count(|| {
		let f: Function<dyn Fn(u64) -> u64> = Function::new(move |x: u64| x * a + b);
		f
	});
	assert_eq!(allocations, 0);
	assert!(f.is_inline());

	let (g, allocations, _) = count(|| f.clone());
	assert_eq!(allocations, 0);
	assert_eq!(g.call(3), 5);
}

#[test]
fn large_functions_are_boxed_once() {
	let table = [7u64; 8];
	let (f, allocations, _) = count(|| {
		let f: Function<dyn Fn(usize) -> u64> = Function::new(move |i: usize| table[i]);
		f
	});
	assert_eq!(allocations, 1);
	assert!(!f.is_inline());

	let ((), _, deallocations) = count(|| drop(f));
	assert_eq!(deallocations, 1);
}

#[test]
fn variants_never_allocate() {
	let ((), allocations, _) = count(|| {
		let mut v: Variant<(i32, f64, [u8; 32])> = Variant::default();
		v.set(10.0f64);
		v.set([1u8; 32]);
		let w = v.clone();
		assert_eq!(v, w);
	});
	assert_eq!(allocations, 0);
}
