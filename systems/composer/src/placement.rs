//! Vertical placement of bars on the canvas.
//!
//! The array named by the `higher` cue is dominant: its target floor is drawn
//! from a range narrowed so that the other target, whose top edge sits exactly
//! `delta_height` below, still fits on the canvas. The subordinate target floor
//! is derived from the dominant one and never drawn.

use bar_salience_core::{
    ArraySlot, BarMagnitudeSet, LayoutBounds, PlacementFault, CANVAS_TOLERANCE,
};
use bar_salience_system_volume_sampler::uniform_between;
use rand::Rng;

/// Returns floors for both arrays, in the same order as `arrays`.
///
/// The dominant floor range is compared exactly. Only the derived subordinate
/// floor is allowed [`CANVAS_TOLERANCE`] of rounding slack.
pub(crate) fn place_floors<R>(
    rng: &mut R,
    layout: &LayoutBounds,
    delta_height: f64,
    arrays: [&BarMagnitudeSet; 2],
    higher: ArraySlot,
) -> Result<[Vec<f64>; 2], PlacementFault>
where
    R: Rng + ?Sized,
{
    let [first, second] = arrays;
    let (dominant, subordinate) = match higher {
        ArraySlot::A => (first, second),
        ArraySlot::B => (second, first),
    };
    let dominant_slot = higher;
    let subordinate_slot = higher.other();

    let dominant_value = dominant.target_value();
    let subordinate_value = subordinate.target_value();

    let min_floor = layout
        .lowest_floor()
        .max(layout.lowest_floor() + subordinate_value - dominant_value + delta_height);
    let max_floor = layout.highest_top() - dominant_value;
    if min_floor > max_floor {
        return Err(PlacementFault::EmptyFloorRange {
            array: dominant_slot,
            index: dominant.target_index(),
            length: dominant_value,
            min_floor,
            max_floor,
        });
    }
    let dominant_floor = uniform_between(rng, min_floor, max_floor);

    let subordinate_floor = dominant_floor + dominant_value - delta_height - subordinate_value;
    let (lowest, highest) = layout.floor_range(subordinate_value);
    if subordinate_floor < lowest - CANVAS_TOLERANCE
        || subordinate_floor > highest + CANVAS_TOLERANCE
    {
        return Err(PlacementFault::DerivedFloorOutOfBounds {
            array: subordinate_slot,
            index: subordinate.target_index(),
            length: subordinate_value,
            floor: subordinate_floor,
            min_floor: lowest,
            max_floor: highest,
        });
    }

    let dominant_floors = place_array(rng, layout, dominant, dominant_slot, dominant_floor)?;
    let subordinate_floors =
        place_array(rng, layout, subordinate, subordinate_slot, subordinate_floor)?;

    Ok(match higher {
        ArraySlot::A => [dominant_floors, subordinate_floors],
        ArraySlot::B => [subordinate_floors, dominant_floors],
    })
}

fn place_array<R>(
    rng: &mut R,
    layout: &LayoutBounds,
    bars: &BarMagnitudeSet,
    slot: ArraySlot,
    target_floor: f64,
) -> Result<Vec<f64>, PlacementFault>
where
    R: Rng + ?Sized,
{
    let mut floors = Vec::with_capacity(bars.len());
    for (index, &length) in bars.values().iter().enumerate() {
        if index == bars.target_index() {
            floors.push(target_floor);
            continue;
        }

        let (min_floor, max_floor) = layout.floor_range(length);
        if min_floor > max_floor {
            return Err(PlacementFault::EmptyFloorRange {
                array: slot,
                index,
                length,
                min_floor,
                max_floor,
            });
        }
        floors.push(uniform_between(rng, min_floor, max_floor));
    }
    Ok(floors)
}
