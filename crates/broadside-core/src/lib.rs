pub mod artifacts;
pub mod catalog;
pub mod consts;
pub mod error;
pub mod ledger;
pub mod order;
pub mod pipeline;
pub mod sampler;
pub mod stage;
pub mod sync;
