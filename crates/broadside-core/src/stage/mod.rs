//! Invocation descriptors for external tools and the runners executing them.

pub mod commands;
mod invocation;
mod runner;

pub use invocation::{ArgValue, StageInvocation};
pub use runner::{runner_for, ProcessRunner, StageRunner, StubRunner};
