#![forbid(unsafe_code)]
//! qflow: a lazy query-execution adapter.
//!
//! Fluent sequence operators (join, group join, filter, projection,
//! grouping, aggregation) whose selectors may be synchronous, asynchronous or
//! asynchronous with a cancellation signal; all three shapes evaluate to the
//! same results.
//!
//! ```no_run
//! # async fn demo() -> qflow::core::error::Result<()> {
//! use qflow::prelude::*;
//!
//! let outer = Query::from_vec("outer", vec![1, 2, 3]);
//! let inner = Query::from_vec("inner", vec![1, 2, 3]);
//! let joined = outer.join(
//!     inner,
//!     Selector::sync(|x: i32| x + 3),
//!     Selector::from_async(|x: i32| async move { x + 3 }),
//!     Selector::cancellable(|(x, y): (i32, i32), _cancel| async move { x + 3 - y }),
//! )?;
//! let rows = Engine::default().collect(&joined, &CancellationSignal::none()).await?;
//! assert_eq!(rows, vec![3, 3, 3]);
//! # Ok(())
//! # }
//! ```

pub use qflow_core as core;
pub use qflow_exec as exec;
pub use qflow_operators as operators;
pub use qflow_planner as planner;

pub mod prelude {
    pub use qflow_core::prelude::*;
    pub use qflow_exec::{Engine, ResultStream};
    pub use qflow_operators::{CallbackShape, Grouping, Selector};
    pub use qflow_planner::{ops, Query};
}
