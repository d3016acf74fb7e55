//! Visitors.
//!
//! A visitor handles every alternative of a variant and produces a single
//! `Output` type. It implements [`Visit<T>`] (or [`VisitMut<T>`]) once per
//! alternative `T`:
//!
//! ```rust
//! use calf_stable::{Variant, variant::{Visitor, Visit}};
//!
//! struct Describe;
//!
//! impl Visitor for Describe {
//! 	type Output = String;
//! }
//!
//! impl Visit<i32> for Describe {
//! 	fn visit(&mut self, value: &i32) -> String {
//! 		format!("integer {}", value)
//! 	}
//! }
//!
//! impl Visit<String> for Describe {
//! 	fn visit(&mut self, value: &String) -> String {
//! 		format!("text {:?}", value)
//! 	}
//! }
//!
//! let v: Variant<(i32, String)> = Variant::new(String::from("hi"));
//! assert_eq!(v.visit(&mut Describe), "text \"hi\"");
//! ```
//!
//! For one-off dispatch, [`Variant::visit_with`](super::Variant::visit_with)
//! takes a tuple of closures instead.

/// Common output of a visitor.
pub trait Visitor {
	type Output;
}

/// Visits an alternative of type `T` by reference.
pub trait Visit<T>: Visitor {
	fn visit(&mut self, value: &T) -> Self::Output;
}

/// Visits an alternative of type `T` by mutable reference.
pub trait VisitMut<T>: Visitor {
	fn visit_mut(&mut self, value: &mut T) -> Self::Output;
}
