#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Paired stimulus composition.
//!
//! Turns a [`StimulusConfig`] into a [`StimulusPair`]: two bar arrays with
//! equal volume whose target bars differ by the configured height, position,
//! length and darkness deltas, every bar kept inside the canvas clearance.
//!
//! Internally the composer always lays out "array 1" as the array holding the
//! longer target. When the caller asks for the longer target in array B, the
//! remaining polarities are flipped into that frame up front and the arrays
//! are swapped back once composition finishes. The caller's config is never
//! touched.

mod darkness;
mod placement;

use bar_salience_core::{
    ArraySlot, BarMagnitudeSet, CuePolarities, DrawableBar, GenerationError, PlacementFault,
    StimulusConfig, StimulusPair,
};
use bar_salience_system_volume_sampler::{uniform_between, VolumeSampler};
use rand::Rng;
use tracing::debug;

/// Pure system that composes stimulus pairs from configs and a random stream.
#[derive(Clone, Copy, Debug, Default)]
pub struct Composer;

impl Composer {
    /// Creates a new composer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Composes one stimulus pair.
    ///
    /// Deterministic infeasibility is reported before anything is drawn from
    /// `rng`. Every other failure aborts the call; no partial pair is returned.
    pub fn compose<R>(
        &self,
        config: &StimulusConfig,
        rng: &mut R,
    ) -> Result<StimulusPair, GenerationError>
    where
        R: Rng + ?Sized,
    {
        config.validate()?;
        let layout = config.layout;
        let difficulty = config.difficulty;

        let higher_value = uniform_between(
            rng,
            f64::from(layout.min_bar_height) + difficulty.delta_height,
            f64::from(layout.max_bar_height),
        );
        let lower_value = higher_value * (1.0 - difficulty.delta_length);

        let earlier = rng.gen_range(config.target_index_range());
        let mut indices = [earlier, earlier + difficulty.delta_index];

        let frame = Frame::new(config.cues);
        if frame.cues.later == ArraySlot::A {
            indices.swap(0, 1);
        }

        let sampler = VolumeSampler::new(layout);
        let first = sampler.sample_free(rng, higher_value, indices[0])?;
        let second = sampler.sample_constrained(rng, lower_value, indices[1], first.volume())?;

        let [first_floors, second_floors] = placement::place_floors(
            rng,
            &layout,
            difficulty.delta_height,
            [&first, &second],
            frame.cues.higher,
        )
        .map_err(|fault| frame.relabel(fault))?;

        let [first_levels, second_levels] = darkness::assign_levels(
            rng,
            &config.darkness,
            layout.num_of_bars,
            indices,
            frame.cues.darker,
        );

        let first_bars = assemble(&first, &first_floors, &first_levels);
        let second_bars = assemble(&second, &second_floors, &second_levels);
        let pair = frame.restore(config.cues, first_bars, second_bars, indices);

        debug!(
            cues = ?pair.cues().flags(),
            target_indices = ?pair.target_indices(),
            volume = pair.volume(ArraySlot::A),
            higher_value,
            lower_value,
            "composed stimulus pair"
        );
        Ok(pair)
    }
}

/// Polarities seen from the array that holds the longer target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Frame {
    cues: CuePolarities,
    swapped: bool,
}

impl Frame {
    fn new(requested: CuePolarities) -> Self {
        if requested.longer == ArraySlot::A {
            return Self {
                cues: requested,
                swapped: false,
            };
        }

        Self {
            cues: CuePolarities::new(
                requested.higher.other(),
                requested.later.other(),
                ArraySlot::A,
                requested.darker.other(),
            ),
            swapped: true,
        }
    }

    /// Maps an array of the internal frame back to the caller's labelling.
    fn caller_slot(&self, internal: ArraySlot) -> ArraySlot {
        if self.swapped {
            internal.other()
        } else {
            internal
        }
    }

    fn relabel(&self, fault: PlacementFault) -> GenerationError {
        fault.with_array(self.caller_slot(fault.array())).into()
    }

    fn restore(
        &self,
        requested: CuePolarities,
        first: Vec<DrawableBar>,
        second: Vec<DrawableBar>,
        indices: [usize; 2],
    ) -> StimulusPair {
        if self.swapped {
            StimulusPair::new(second, first, requested, [indices[1], indices[0]])
        } else {
            StimulusPair::new(first, second, requested, indices)
        }
    }
}

fn assemble(magnitudes: &BarMagnitudeSet, floors: &[f64], levels: &[u8]) -> Vec<DrawableBar> {
    magnitudes
        .values()
        .iter()
        .zip(floors)
        .zip(levels)
        .map(|((&length, &floor), &level)| DrawableBar::new(floor, length, level))
        .collect()
}
