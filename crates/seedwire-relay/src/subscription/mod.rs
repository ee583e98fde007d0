//! Per-(connection, worker) subscription: transition table and driver task.

pub mod driver;
pub mod machine;

pub use driver::Subscription;
pub use machine::{Action, Input, Notice, Phase, Transition, dispatch};
