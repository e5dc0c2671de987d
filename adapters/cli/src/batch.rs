use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use bar_salience_core::{CuePolarities, GenerationError, StimulusPair};
use bar_salience_system_composer::Composer;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::sweep::SweepDefinition;

/// Composes every stimulus of `sweep`, each from its own seeded stream.
pub(crate) fn generate(
    sweep: &SweepDefinition,
    global_seed: u64,
) -> Result<Vec<StimulusPair>, GenerationError> {
    let composer = Composer::new();
    sweep
        .configs()
        .iter()
        .enumerate()
        .map(|(ordinal, config)| {
            let seed = derive_stimulus_seed(global_seed, &sweep.name, ordinal);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            composer.compose(config, &mut rng)
        })
        .collect()
}

/// Seed of the `ordinal`-th stimulus of the sweep labelled `label`.
pub(crate) fn derive_stimulus_seed(global_seed: u64, label: &str, ordinal: usize) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(global_seed.to_le_bytes());
    hasher.update(label.as_bytes());
    hasher.update((ordinal as u64).to_le_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// Number of stimuli generated for each polarity combination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct BalanceReport {
    counts: BTreeMap<CuePolarities, usize>,
}

impl BalanceReport {
    /// Tallies `stimuli`, listing combinations that never occur with a zero count.
    pub(crate) fn tally(stimuli: &[StimulusPair]) -> Self {
        let mut counts: BTreeMap<CuePolarities, usize> = CuePolarities::all()
            .into_iter()
            .map(|cues| (cues, 0))
            .collect();
        for pair in stimuli {
            *counts.entry(pair.cues()).or_insert(0) += 1;
        }
        Self { counts }
    }

    /// Counts per combination, ordered by polarity flags.
    pub(crate) fn counts(&self) -> impl Iterator<Item = (&CuePolarities, &usize)> {
        self.counts.iter()
    }

    /// Reports whether every combination occurs equally often.
    pub(crate) fn is_balanced(&self) -> bool {
        let mut counts = self.counts.values();
        match counts.next() {
            Some(first) => counts.all(|count| count == first),
            None => true,
        }
    }
}

#[derive(Serialize)]
struct BatchFile<'a> {
    sweep: &'a str,
    seed: u64,
    stimuli: &'a [StimulusPair],
}

/// Writes a generated batch as pretty-printed JSON.
pub(crate) fn write(
    path: &Path,
    sweep: &SweepDefinition,
    seed: u64,
    stimuli: &[StimulusPair],
) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create batch file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    to_writer(&mut writer, sweep, seed, stimuli)?;
    writer
        .flush()
        .with_context(|| format!("failed to flush batch file {}", path.display()))
}

fn to_writer<W: Write>(
    writer: W,
    sweep: &SweepDefinition,
    seed: u64,
    stimuli: &[StimulusPair],
) -> Result<()> {
    let batch = BatchFile {
        sweep: &sweep.name,
        seed,
        stimuli,
    };
    serde_json::to_writer_pretty(writer, &batch).context("failed to serialize batch")
}
