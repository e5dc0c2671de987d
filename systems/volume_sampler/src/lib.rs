#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Volume-constrained sampling of bar lengths.
//!
//! Produces one array's worth of bar lengths around a fixed target bar. In free
//! mode the non-target bars are distinct integers and their sum becomes the
//! array's volume. In constrained mode the non-target bars are drawn one at a
//! time from a range narrowed so the remaining bars can still close the gap to
//! the requested volume, and the final bar absorbs whatever is left.

use bar_salience_core::{
    BarMagnitudeSet, ConfigIssue, GenerationError, LayoutBounds, CANVAS_TOLERANCE,
};
use rand::{seq::SliceRandom, Rng};
use tracing::{debug, trace};

/// Draws bar length sets that respect the layout's height bounds.
#[derive(Clone, Copy, Debug)]
pub struct VolumeSampler {
    layout: LayoutBounds,
}

impl VolumeSampler {
    /// Creates a sampler for arrays described by `layout`.
    #[must_use]
    pub const fn new(layout: LayoutBounds) -> Self {
        Self { layout }
    }

    /// Samples a full set with `fixed_value` at `fixed_index`.
    ///
    /// Without a `target_volume` the set's volume is whatever the draws sum to;
    /// with one the set sums to it exactly.
    pub fn sample<R>(
        &self,
        rng: &mut R,
        fixed_value: f64,
        fixed_index: usize,
        target_volume: Option<f64>,
    ) -> Result<BarMagnitudeSet, GenerationError>
    where
        R: Rng + ?Sized,
    {
        match target_volume {
            None => self.sample_free(rng, fixed_value, fixed_index),
            Some(volume) => self.sample_constrained(rng, fixed_value, fixed_index, volume),
        }
    }

    /// Samples distinct integer lengths around the fixed bar.
    pub fn sample_free<R>(
        &self,
        rng: &mut R,
        fixed_value: f64,
        fixed_index: usize,
    ) -> Result<BarMagnitudeSet, GenerationError>
    where
        R: Rng + ?Sized,
    {
        self.check_index(fixed_index)?;
        let fill = self.layout.num_of_bars - 1;
        let min = self.layout.min_bar_height;
        let max = self.layout.max_bar_height;
        if min > max {
            return Err(ConfigIssue::BarHeightBounds {
                min_bar_height: min,
                max_bar_height: max,
            }
            .into());
        }

        let available = (max - min) as usize + 1;
        if fill > available {
            return Err(ConfigIssue::TooFewDistinctHeights {
                required: fill,
                available,
            }
            .into());
        }

        let bars: Vec<f64> = rand::seq::index::sample(rng, available, fill)
            .into_iter()
            .map(|offset| f64::from(min) + offset as f64)
            .collect();

        let set = finish(rng, bars, fixed_value, fixed_index)?;
        debug!(volume = set.volume(), fixed_index, "sampled free bar set");
        Ok(set)
    }

    /// Samples lengths around the fixed bar so the whole set sums to `target_volume`.
    ///
    /// The draw order matters: each range is derived from what earlier draws
    /// left over, which is what keeps every later range non-empty.
    pub fn sample_constrained<R>(
        &self,
        rng: &mut R,
        fixed_value: f64,
        fixed_index: usize,
        target_volume: f64,
    ) -> Result<BarMagnitudeSet, GenerationError>
    where
        R: Rng + ?Sized,
    {
        self.check_index(fixed_index)?;
        if !target_volume.is_finite() {
            return Err(ConfigIssue::TargetVolume { target_volume }.into());
        }

        let fill = self.layout.num_of_bars - 1;
        let min = f64::from(self.layout.min_bar_height);
        let max = f64::from(self.layout.max_bar_height);
        let mut remaining = target_volume - fixed_value;
        let mut bars = Vec::with_capacity(self.layout.num_of_bars);

        for position in 0..fill.saturating_sub(1) {
            let bars_left = (fill - 1 - position) as f64;
            let min_possible = min.max(remaining - bars_left * max);
            let max_possible = max.min(remaining - bars_left * min);
            if min_possible > max_possible {
                return Err(GenerationError::VolumeInfeasible {
                    position,
                    remaining,
                    min_possible,
                    max_possible,
                });
            }

            let bar = uniform_between(rng, min_possible, max_possible);
            trace!(position, min_possible, max_possible, bar, "drew constrained bar");
            bars.push(bar);
            remaining -= bar;
        }

        if fill == 0 {
            if remaining.abs() > CANVAS_TOLERANCE {
                return Err(GenerationError::VolumeInfeasible {
                    position: 0,
                    remaining,
                    min_possible: 0.0,
                    max_possible: 0.0,
                });
            }
        } else {
            if remaining < min - CANVAS_TOLERANCE || remaining > max + CANVAS_TOLERANCE {
                return Err(GenerationError::VolumeInfeasible {
                    position: fill - 1,
                    remaining,
                    min_possible: min,
                    max_possible: max,
                });
            }
            bars.push(remaining);
        }

        let set = finish(rng, bars, fixed_value, fixed_index)?;
        debug!(
            volume = set.volume(),
            target_volume, fixed_index, "sampled constrained bar set"
        );
        Ok(set)
    }

    fn check_index(&self, fixed_index: usize) -> Result<(), GenerationError> {
        if fixed_index >= self.layout.num_of_bars {
            return Err(ConfigIssue::TargetIndexOutOfRange {
                index: fixed_index,
                len: self.layout.num_of_bars,
            }
            .into());
        }
        Ok(())
    }
}

/// Draws uniformly from the closed interval `[low, high]`.
///
/// Callers must ensure `low <= high`; a degenerate interval returns `low`.
pub fn uniform_between<R>(rng: &mut R, low: f64, high: f64) -> f64
where
    R: Rng + ?Sized,
{
    debug_assert!(low <= high, "uniform_between requires low <= high");
    if low >= high {
        return low;
    }
    rng.gen_range(low..=high)
}

fn finish<R>(
    rng: &mut R,
    mut bars: Vec<f64>,
    fixed_value: f64,
    fixed_index: usize,
) -> Result<BarMagnitudeSet, GenerationError>
where
    R: Rng + ?Sized,
{
    bars.shuffle(rng);
    bars.insert(fixed_index, fixed_value);
    BarMagnitudeSet::new(bars, fixed_index).map_err(GenerationError::from)
}
