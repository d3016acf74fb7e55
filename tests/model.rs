//! Model-based tests.
//!
//! Random operation sequences are applied to a `Vector` and a `Vec` (resp. a
//! `SmallString` and a `String`), which must stay equal after every step.

use proptest::prelude::*;

use calf_stable::{lean, SmallString, Vector};

const INLINE: usize = 4;

#[derive(Debug, Clone)]
enum VecOp {
	Push(u32),
	Pop,
	Insert(usize, u32),
	Remove(usize),
	SwapRemove(usize),
	Truncate(usize),
	Erase(usize, usize),
	ExtendFromSlice(Vec<u32>),
	InsertSlice(usize, Vec<u32>),
	InsertN(usize, usize, u32),
	InsertWithin(usize, usize, usize),
	Resize(usize, u32),
	RetainEven,
	Dedup,
	Reserve(usize),
	ShrinkToFit,
	Clear
}

fn vec_op() -> impl Strategy<Value = VecOp> {
	prop_oneof![
		4 => any::<u32>().prop_map(VecOp::Push),
		2 => Just(VecOp::Pop),
		2 => (any::<usize>(), any::<u32>()).prop_map(|(i, v)| VecOp::Insert(i, v)),
		1 => any::<usize>().prop_map(VecOp::Remove),
		1 => any::<usize>().prop_map(VecOp::SwapRemove),
		1 => (0usize..16).prop_map(VecOp::Truncate),
		1 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| VecOp::Erase(a, b)),
		2 => prop::collection::vec(0u32..8, 0..10).prop_map(VecOp::ExtendFromSlice),
		1 => (any::<usize>(), prop::collection::vec(0u32..8, 0..6)).prop_map(|(i, s)| VecOp::InsertSlice(i, s)),
		1 => (any::<usize>(), 0usize..6, any::<u32>()).prop_map(|(i, n, v)| VecOp::InsertN(i, n, v)),
		1 => (any::<usize>(), any::<usize>(), any::<usize>()).prop_map(|(i, a, b)| VecOp::InsertWithin(i, a, b)),
		1 => (0usize..24, any::<u32>()).prop_map(|(n, v)| VecOp::Resize(n, v)),
		1 => Just(VecOp::RetainEven),
		1 => Just(VecOp::Dedup),
		1 => (0usize..32).prop_map(VecOp::Reserve),
		1 => Just(VecOp::ShrinkToFit),
		1 => Just(VecOp::Clear)
	]
}

/// Maps two arbitrary numbers to a valid range of `0..=len`.
fn range(len: usize, a: usize, b: usize) -> std::ops::Range<usize> {
	let (a, b) = (a % (len + 1), b % (len + 1));
	a.min(b)..a.max(b)
}

fn apply(v: &mut Vector<u32, INLINE>, model: &mut Vec<u32>, op: &VecOp) {
	let len = model.len();
	match *op {
		VecOp::Push(x) => {
			v.push(x);
			model.push(x);
		},
		VecOp::Pop => assert_eq!(v.pop(), model.pop()),
		VecOp::Insert(i, x) => {
			let i = i % (len + 1);
			v.insert(i, x);
			model.insert(i, x);
		},
		VecOp::Remove(i) => {
			if len > 0 {
				assert_eq!(v.remove(i % len), model.remove(i % len));
			}
		},
		VecOp::SwapRemove(i) => {
			if len > 0 {
				assert_eq!(v.swap_remove(i % len), model.swap_remove(i % len));
			}
		},
		VecOp::Truncate(n) => {
			v.truncate(n);
			model.truncate(n);
		},
		VecOp::Erase(a, b) => {
			let r = range(len, a, b);
			v.erase(r.clone());
			model.drain(r);
		},
		VecOp::ExtendFromSlice(ref s) => {
			v.extend_from_slice(s);
			model.extend_from_slice(s);
		},
		VecOp::InsertSlice(i, ref s) => {
			let i = i % (len + 1);
			v.insert_slice(i, s);
			model.splice(i..i, s.iter().copied());
		},
		VecOp::InsertN(i, n, x) => {
			let i = i % (len + 1);
			v.insert_n(i, n, x);
			model.splice(i..i, std::iter::repeat(x).take(n));
		},
		VecOp::InsertWithin(i, a, b) => {
			let i = i % (len + 1);
			let r = range(len, a, b);
			v.insert_within(i, r.clone());
			let copied: Vec<u32> = model[r].to_vec();
			model.splice(i..i, copied);
		},
		VecOp::Resize(n, x) => {
			v.resize(n, x);
			model.resize(n, x);
		},
		VecOp::RetainEven => {
			v.retain(|x| x % 2 == 0);
			model.retain(|x| x % 2 == 0);
		},
		VecOp::Dedup => {
			v.dedup();
			model.dedup();
		},
		VecOp::Reserve(n) => {
			v.reserve(n);
			assert!(v.capacity() >= len + n);
		},
		VecOp::ShrinkToFit => {
			v.shrink_to_fit();
			if len <= INLINE {
				assert!(!v.is_spilled());
			}
		},
		VecOp::Clear => {
			v.clear();
			model.clear();
		}
	}
}

fn check_storage<T, const N: usize>(v: &Vector<T, N>) {
	assert!(v.len() <= v.capacity());
	if v.is_spilled() {
		assert!(v.capacity() >= 2 * N);
	} else {
		assert_eq!(v.capacity(), N);
	}
}

#[derive(Debug, Clone)]
enum StrOp {
	Push(char),
	PushStr(String),
	Pop,
	Insert(usize, char),
	InsertStr(usize, String),
	Remove(usize),
	Truncate(usize),
	Erase(usize, usize),
	ReplaceRange(usize, usize, String),
	RetainAscii,
	ShrinkToFit,
	Clear
}

fn text() -> impl Strategy<Value = String> {
	"[a-zé€😀 ]{0,12}"
}

fn str_op() -> impl Strategy<Value = StrOp> {
	prop_oneof![
		4 => any::<char>().prop_map(StrOp::Push),
		3 => text().prop_map(StrOp::PushStr),
		2 => Just(StrOp::Pop),
		1 => (any::<usize>(), any::<char>()).prop_map(|(i, c)| StrOp::Insert(i, c)),
		1 => (any::<usize>(), text()).prop_map(|(i, s)| StrOp::InsertStr(i, s)),
		1 => any::<usize>().prop_map(StrOp::Remove),
		1 => any::<usize>().prop_map(StrOp::Truncate),
		1 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| StrOp::Erase(a, b)),
		1 => (any::<usize>(), any::<usize>(), text()).prop_map(|(a, b, s)| StrOp::ReplaceRange(a, b, s)),
		1 => Just(StrOp::RetainAscii),
		1 => Just(StrOp::ShrinkToFit),
		1 => Just(StrOp::Clear)
	]
}

/// Rounds an arbitrary number down to a char boundary of `s`.
fn boundary(s: &str, i: usize) -> usize {
	let mut i = i % (s.len() + 1);
	while !s.is_char_boundary(i) {
		i -= 1
	}
	i
}

fn apply_str(s: &mut SmallString, model: &mut String, op: &StrOp) {
	match *op {
		StrOp::Push(c) => {
			s.push(c);
			model.push(c);
		},
		StrOp::PushStr(ref t) => {
			s.push_str(t);
			model.push_str(t);
		},
		StrOp::Pop => assert_eq!(s.pop(), model.pop()),
		StrOp::Insert(i, c) => {
			let i = boundary(model, i);
			s.insert(i, c);
			model.insert(i, c);
		},
		StrOp::InsertStr(i, ref t) => {
			let i = boundary(model, i);
			s.insert_str(i, t);
			model.insert_str(i, t);
		},
		StrOp::Remove(i) => {
			if !model.is_empty() {
				let i = boundary(model, i);
				if i < model.len() {
					assert_eq!(s.remove(i), model.remove(i));
				}
			}
		},
		StrOp::Truncate(n) => {
			let n = boundary(model, n);
			s.truncate(n);
			model.truncate(n);
		},
		StrOp::Erase(a, b) => {
			let (a, b) = (boundary(model, a), boundary(model, b));
			let r = a.min(b)..a.max(b);
			s.erase(r.clone());
			model.replace_range(r, "");
		},
		StrOp::ReplaceRange(a, b, ref t) => {
			let (a, b) = (boundary(model, a), boundary(model, b));
			let r = a.min(b)..a.max(b);
			s.replace_range(r.clone(), t);
			model.replace_range(r, t);
		},
		StrOp::RetainAscii => {
			s.retain(|c| c.is_ascii());
			model.retain(|c| c.is_ascii());
		},
		StrOp::ShrinkToFit => {
			s.shrink_to_fit();
			if model.len() < calf_stable::INLINE_BYTES {
				assert!(!s.is_spilled());
			}
		},
		StrOp::Clear => {
			s.clear();
			model.clear();
		}
	}
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(512))]

	#[test]
	fn vector_behaves_like_vec(ops in prop::collection::vec(vec_op(), 0..64)) {
		let mut v: Vector<u32, INLINE> = Vector::new();
		let mut model = Vec::new();

		for op in &ops {
			apply(&mut v, &mut model, op);
			prop_assert_eq!(v.as_slice(), model.as_slice());
			check_storage(&v);
		}

		let cloned = v.clone();
		prop_assert_eq!(&cloned, &model);
		let collected: Vec<u32> = v.into_iter().collect();
		prop_assert_eq!(collected, model);
	}

	#[test]
	fn string_behaves_like_string(ops in prop::collection::vec(str_op(), 0..64)) {
		let mut s: SmallString = SmallString::new();
		let mut model = String::new();

		for op in &ops {
			apply_str(&mut s, &mut model, op);
			prop_assert_eq!(s.as_str(), model.as_str());
			prop_assert_eq!(s.as_bytes_with_nul().last(), Some(&0));
			prop_assert!(s.capacity() >= s.len());
		}

		prop_assert_eq!(String::from(s), model);
	}

	#[test]
	fn construct_then_iterate(items in prop::collection::vec(any::<i64>(), 0..40)) {
		let v: lean::Vector<i64, 8> = items.iter().copied().collect();
		prop_assert_eq!(v.len(), items.len());
		prop_assert_eq!(v.is_spilled(), items.len() > 8);
		let back: Vec<i64> = v.iter().copied().collect();
		prop_assert_eq!(back, items);
	}

	#[test]
	fn inline_threshold_of_strings(len in 0usize..64) {
		let s: SmallString = "x".repeat(len).as_str().into();
		prop_assert_eq!(s.is_spilled(), len >= calf_stable::INLINE_BYTES);
	}
}
