//! This crate provides containers with a stable, `#[repr(C)]` memory layout
//! that keep small values inline and only move to the heap as a last resort:
//!
//! - [`Vector`], a growable array storing up to `N` elements inline;
//! - [`SmallString`], a NUL-terminated UTF-8 string built on `Vector<u8, N>`;
//! - [`Function`], a type-erased callable with a manual vtable, storing
//!   functions of up to three pointer words inline;
//! - [`Variant`], a closed-set tagged union, and its non-owning view
//!   [`VariantRef`].
//!
//! ## Basic usage
//!
//! A `Vector` starts inline and is moved on the heap only when it outgrows its
//! inline capacity.
//! ```rust
//! use calf_stable::Vector;
//!
//! let mut v: Vector<u8, 4> = Vector::new();
//! v.extend_from_slice(&[1, 2, 3, 4]);
//! assert!(!v.is_spilled());
//! v.push(5); // <- here the length exceeds the inline capacity (4).
//!            //    the data is moved on the heap, transparently.
//! assert!(v.is_spilled());
//! assert!(v.capacity() >= 8);
//! ```
//!
//! A `SmallString` holds up to 23 bytes inline on 64-bit targets.
//! ```rust
//! use calf_stable::SmallString;
//!
//! let mut s = SmallString::<24>::from("Hello");
//! s.push_str(" World");
//! assert!(!s.is_spilled());
//! assert_eq!(s, "Hello World");
//! ```
//!
//! ## Metadata format
//!
//! The length and capacity of the buffers are stored using the [`wide::Meta`]
//! format by default (two `usize`). On 64-bit targets, the [`lean`] module
//! provides aliases using [`lean::Meta`], packing both in a single `usize` at
//! the cost of a maximum size of [`u32::MAX`].
//!
//! ## Features
//!
//! - `serde`: serializes `Vector` as a sequence and `SmallString` as a string.
//! - `contracts`: keeps the precondition checks of the `unsafe` fast paths in
//!   release builds (see [`contract`]).
pub mod contract;
pub mod error;
pub mod raw;
pub mod wide;
#[cfg(target_pointer_width = "64")]
pub mod lean;
#[cfg(not(target_pointer_width = "64"))]
pub mod lean {
	//! Re-exports `wide` for non-64-bit targets
	pub use super::wide::*;
}
pub mod vector;
pub mod string;
pub mod function;
pub mod variant;
#[cfg(feature = "serde")]
mod serde;

pub use error::{
	Error,
	Result
};
pub use vector::Vector;
pub use string::{
	SmallString,
	INLINE_BYTES
};
pub use function::{
	Function,
	Copyable,
	MoveOnly
};
pub use variant::{
	Variant,
	VariantRef
};
