#![forbid(unsafe_code)]
//! qflow-operators: callback normalization and per-operator cursors.
//!
//! Design intent:
//! - Operators are written once against `Callback`, whatever shape the caller
//!   supplied the selector in.
//! - `execute` is lazy: it wires streams together and returns; no selector
//!   runs and no input is pulled until the output stream is polled.
//! - Within one enumeration selectors are invoked strictly sequentially.

pub mod callback;
pub mod lookup;
pub mod traits;

pub mod aggregate;
pub mod filter;
pub mod group;
pub mod map;

pub mod join;

pub use callback::{Callback, CallbackShape, Selector};
pub use group::Grouping;
pub use lookup::Lookup;
pub use traits::{BinaryOperator, ExecContext, UnaryOperator};
