//! Precondition checks.
//!
//! A contract violation is a caller bug, not a recoverable condition.
//! [`contract!`](crate::contract!) is always evaluated and guards preconditions
//! that memory safety depends on. [`debug_contract!`](crate::debug_contract!)
//! is only evaluated with `debug_assertions` or the `contracts` feature and
//! guards the `unsafe` fast paths, whose callers already promise the
//! precondition holds.
//!
//! Both report through [`violated`], which logs the violation and panics.
use std::fmt;

/// Reports a contract violation.
#[cold]
#[inline(never)]
#[track_caller]
pub fn violated(args: fmt::Arguments<'_>) -> ! {
	tracing::error!(location = %std::panic::Location::caller(), "contract violation: {}", args);
	panic!("contract violation: {}", args)
}

/// Checks a precondition in every build.
#[macro_export]
macro_rules! contract {
	($cond:expr, $($arg:tt)+) => {
		if !$cond {
			$crate::contract::violated(format_args!($($arg)+))
		}
	};
}

/// Whether [`debug_contract!`](crate::debug_contract!) checks are evaluated.
///
/// Resolved when this crate is built, so that the `contracts` feature also
/// applies to the macro expanded in other crates.
#[doc(hidden)]
pub const DEBUG_CONTRACTS: bool = cfg!(any(debug_assertions, feature = "contracts"));

/// Checks a precondition in debug builds, or when the `contracts` feature is enabled.
#[macro_export]
macro_rules! debug_contract {
	($cond:expr, $($arg:tt)+) => {
		if $crate::contract::DEBUG_CONTRACTS && !$cond {
			$crate::contract::violated(format_args!($($arg)+))
		}
	};
}

#[cfg(test)]
mod tests {
	#[test]
	#[should_panic(expected = "contract violation: index 3 past 2")]
	fn contract_panics() {
		let (index, len) = (3, 2);
		crate::contract!(index <= len, "index {} past {}", index, len);
	}

	#[test]
	fn debug_contracts_follow_the_build() {
		assert_eq!(super::DEBUG_CONTRACTS, cfg!(any(debug_assertions, feature = "contracts")));
		if super::DEBUG_CONTRACTS {
			let result = std::panic::catch_unwind(|| crate::debug_contract!(false, "checked"));
			assert!(result.is_err());
		}
	}

	#[test]
	fn contract_holds() {
		crate::contract!(1 + 1 == 2, "arithmetic");
		crate::debug_contract!(true, "never reported");
	}
}
