//! Query compilation and execution.

mod compiler;
mod definition;
mod executor;

pub use compiler::{OperatorData, Query};
pub use definition::Definition;
pub use executor::{ExecContext, Operation};
