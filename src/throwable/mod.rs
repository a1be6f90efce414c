//! Error snapshots and the filters that reshape them before rendering

pub mod chain;
pub mod data;
pub mod filters;

pub use chain::{standard_filters, FilterBuilder, ThrowableFilterChain};
pub use data::{StackFrame, ThrowableData};
pub use filters::{DropCauseFilter, KeepFilter, StripFilter, ThrowableFilter, UnpackFilter};
