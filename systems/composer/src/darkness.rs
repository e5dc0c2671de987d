//! Darkness levels for both arrays.

use bar_salience_core::{ArraySlot, DarknessTuning, MAX_DARKNESS, MIN_DARKNESS};
use rand::Rng;

/// Draws darkness levels for both arrays.
///
/// The array named by `darker` gets the darker target; the other target is
/// `delta_darkness` lighter. Non-target bars stay at least `darkest_salience`
/// below their own array's target. Assumes a validated tuning.
pub(crate) fn assign_levels<R>(
    rng: &mut R,
    tuning: &DarknessTuning,
    num_of_bars: usize,
    target_indices: [usize; 2],
    darker: ArraySlot,
) -> [Vec<u8>; 2]
where
    R: Rng + ?Sized,
{
    let darker_level = rng.gen_range(MAX_DARKNESS - tuning.darkest_variance..=MAX_DARKNESS);
    let dimmer_level = darker_level - tuning.delta_darkness;
    let (first_level, second_level) = match darker {
        ArraySlot::A => (darker_level, dimmer_level),
        ArraySlot::B => (dimmer_level, darker_level),
    };

    let salience = tuning.darkest_salience;
    [
        shade(rng, num_of_bars, target_indices[0], first_level, salience),
        shade(rng, num_of_bars, target_indices[1], second_level, salience),
    ]
}

fn shade<R>(
    rng: &mut R,
    num_of_bars: usize,
    target_index: usize,
    target_level: u8,
    salience: u8,
) -> Vec<u8>
where
    R: Rng + ?Sized,
{
    let ceiling = target_level - salience;
    (0..num_of_bars)
        .map(|index| {
            if index == target_index {
                target_level
            } else {
                rng.gen_range(MIN_DARKNESS..=ceiling)
            }
        })
        .collect()
}
