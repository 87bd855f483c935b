//! Joins, groupings and cycle reordering over completed artifact collections.
//!
//! Producers of keyed artifacts finish in arbitrary order. Everything here is
//! a pure function over collections the caller has already gathered, so the
//! result depends only on the collected values, never on completion order.

mod cycle;
mod keyed;

pub use cycle::{
    apply_permutation, assemble_cycle_sequences, round_sort_permutation, CycleEntry,
    CycleSequence,
};
pub use keyed::{broadcast_to_members, group_by_key, join};
