//! Testing utilities for Doorlist reducers.
//!
//! Reducers are pure functions, so most behavior is testable at memory speed
//! without a store. [`ReducerTest`] provides a Given/When/Then harness for
//! exactly that.

#![forbid(unsafe_code)]
#![warn(missing_docs)]


pub use reducer_test::{assertions, ReducerTest};
