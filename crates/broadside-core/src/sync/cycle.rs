use std::path::PathBuf;

use crate::artifacts::StackArtifact;
use crate::error::{BroadsideError, Result};
use crate::order::compare_round_names;

use super::keyed::group_by_key;

/// One round of a scene's cycle sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleEntry {
    pub round: String,
    pub tile_list: PathBuf,
    pub stack: PathBuf,
}

/// A scene's stacks in ascending round order, ready for registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleSequence {
    scene: String,
    entries: Vec<CycleEntry>,
}

impl CycleSequence {
    /// Build a sequence from three correlated lists.
    ///
    /// Index `i` of each list describes the same round. The lists are
    /// reordered together by one permutation derived from sorting `rounds`
    /// (stable, so equal rounds keep arrival order).
    pub fn from_parallel(
        scene: impl Into<String>,
        rounds: Vec<String>,
        tile_lists: Vec<PathBuf>,
        stacks: Vec<PathBuf>,
    ) -> Result<Self> {
        let scene = scene.into();
        if rounds.len() != tile_lists.len() || rounds.len() != stacks.len() {
            return Err(BroadsideError::Sync(format!(
                "scene {scene}: {} rounds, {} tile lists, {} stacks",
                rounds.len(),
                tile_lists.len(),
                stacks.len()
            )));
        }

        let permutation = round_sort_permutation(&rounds);
        let rounds = apply_permutation(rounds, &permutation);
        let tile_lists = apply_permutation(tile_lists, &permutation);
        let stacks = apply_permutation(stacks, &permutation);

        let entries = rounds
            .into_iter()
            .zip(tile_lists)
            .zip(stacks)
            .map(|((round, tile_list), stack)| CycleEntry {
                round,
                tile_list,
                stack,
            })
            .collect();
        Ok(Self { scene, entries })
    }

    pub fn scene(&self) -> &str {
        &self.scene
    }

    pub fn entries(&self) -> &[CycleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rounds(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.round.as_str()).collect()
    }

    pub fn tile_lists(&self) -> Vec<PathBuf> {
        self.entries.iter().map(|e| e.tile_list.clone()).collect()
    }

    pub fn stacks(&self) -> Vec<PathBuf> {
        self.entries.iter().map(|e| e.stack.clone()).collect()
    }
}

/// Indices that stably sort `rounds` by round-name ordering.
pub fn round_sort_permutation(rounds: &[String]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..rounds.len()).collect();
    indices.sort_by(|&a, &b| compare_round_names(&rounds[a], &rounds[b]));
    indices
}

/// Reorder `items` so that position `i` holds `items[permutation[i]]`.
///
/// `permutation` must be a permutation of `0..items.len()`.
pub fn apply_permutation<T>(items: Vec<T>, permutation: &[usize]) -> Vec<T> {
    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    permutation
        .iter()
        .filter_map(|&i| slots.get_mut(i).and_then(Option::take))
        .collect()
}

/// Group per-scene stacks and order each scene's rounds.
///
/// Sequences are returned sorted by scene name.
pub fn assemble_cycle_sequences(stacks: Vec<(String, StackArtifact)>) -> Result<Vec<CycleSequence>> {
    let mut sequences = group_by_key(stacks)
        .into_iter()
        .map(|(scene, artifacts)| {
            let mut rounds = Vec::with_capacity(artifacts.len());
            let mut tile_lists = Vec::with_capacity(artifacts.len());
            let mut stack_paths = Vec::with_capacity(artifacts.len());
            for artifact in artifacts {
                rounds.push(artifact.round);
                tile_lists.push(artifact.tile_list);
                stack_paths.push(artifact.stack);
            }
            CycleSequence::from_parallel(scene, rounds, tile_lists, stack_paths)
        })
        .collect::<Result<Vec<_>>>()?;
    sequences.sort_by(|a, b| a.scene.cmp(&b.scene));
    Ok(sequences)
}
