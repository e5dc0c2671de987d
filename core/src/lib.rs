#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the bar salience stimulus generator.
//!
//! This crate defines the vocabulary connecting the generation systems and the
//! batch adapters. Adapters build a [`StimulusConfig`] per condition, the
//! composer system turns it into a [`StimulusPair`] by way of the volume
//! sampler's [`BarMagnitudeSet`] values, and every failure along the way is
//! surfaced as a [`GenerationError`]. Nothing in here draws random numbers.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Height of the drawing canvas. Every bar is drawn inside `[0, CANVAS_HEIGHT]`.
pub const CANVAS_HEIGHT: f64 = 100.0;

/// Lightest darkness level a bar may be drawn with.
pub const MIN_DARKNESS: u8 = 1;

/// Darkest darkness level a bar may be drawn with.
pub const MAX_DARKNESS: u8 = 7;

/// Lowest position a target bar may occupy within its array.
pub const MIN_TARGET_INDEX: usize = 2;

/// Positions at the tail of an array that the later target bar never reaches.
pub const TARGET_TAIL_MARGIN: usize = 3;

/// Slack tolerated when comparing derived floating-point positions against the canvas bounds.
pub const CANVAS_TOLERANCE: f64 = 1e-9;

/// Identifies one of the two arrays shown in a stimulus pair.
///
/// Doubles as the cue polarity flag: a cue "points at" the array that carries
/// the stronger value. Serialized as the experiment's `1`/`2` flag values.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum ArraySlot {
    /// The array presented first, flag value `1`.
    A,
    /// The array presented second, flag value `2`.
    B,
}

impl ArraySlot {
    /// Both slots in presentation order.
    pub const ALL: [ArraySlot; 2] = [ArraySlot::A, ArraySlot::B];

    /// Numeric flag used by the experiment runner.
    #[must_use]
    pub const fn flag(self) -> u8 {
        match self {
            Self::A => 1,
            Self::B => 2,
        }
    }

    /// Returns the opposite slot.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl From<ArraySlot> for u8 {
    fn from(slot: ArraySlot) -> Self {
        slot.flag()
    }
}

impl TryFrom<u8> for ArraySlot {
    type Error = InvalidFlag;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::A),
            2 => Ok(Self::B),
            other => Err(InvalidFlag(other)),
        }
    }
}

/// Raised when a polarity flag outside `{1, 2}` is decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("polarity flag must be 1 or 2, got {0}")]
pub struct InvalidFlag(pub u8);

/// Which array carries the stronger value for each of the four cues.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CuePolarities {
    /// Array whose target bar reaches higher on the canvas.
    pub higher: ArraySlot,
    /// Array whose target bar sits at the larger position index.
    pub later: ArraySlot,
    /// Array whose target bar is longer.
    pub longer: ArraySlot,
    /// Array whose target bar is drawn darker.
    pub darker: ArraySlot,
}

impl CuePolarities {
    /// Creates a polarity set from explicit slots.
    #[must_use]
    pub const fn new(
        higher: ArraySlot,
        later: ArraySlot,
        longer: ArraySlot,
        darker: ArraySlot,
    ) -> Self {
        Self {
            higher,
            later,
            longer,
            darker,
        }
    }

    /// Every polarity combination, ordered with `higher` varying slowest and `darker` fastest.
    #[must_use]
    pub fn all() -> Vec<Self> {
        let mut combinations = Vec::with_capacity(16);
        for higher in ArraySlot::ALL {
            for later in ArraySlot::ALL {
                for longer in ArraySlot::ALL {
                    for darker in ArraySlot::ALL {
                        combinations.push(Self::new(higher, later, longer, darker));
                    }
                }
            }
        }
        combinations
    }

    /// Flag values in `higher, later, longer, darker` order.
    #[must_use]
    pub const fn flags(&self) -> [u8; 4] {
        [
            self.higher.flag(),
            self.later.flag(),
            self.longer.flag(),
            self.darker.flag(),
        ]
    }
}

impl Default for CuePolarities {
    fn default() -> Self {
        Self::new(ArraySlot::A, ArraySlot::A, ArraySlot::A, ArraySlot::A)
    }
}

/// Controlled differences between the two target bars.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    /// Vertical distance between the two target bars' top edges.
    pub delta_height: f64,
    /// Distance between the two target bars' positions within their arrays.
    pub delta_index: usize,
    /// Relative shortening of the shorter target bar; `0.1` makes it 90% as long.
    pub delta_length: f64,
}

impl Difficulty {
    /// Creates a difficulty level from its three deltas.
    #[must_use]
    pub const fn new(delta_height: f64, delta_index: usize, delta_length: f64) -> Self {
        Self {
            delta_height,
            delta_index,
            delta_length,
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::new(10.0, 2, 0.1)
    }
}

/// Bar count and canvas geometry shared by both arrays of a pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutBounds {
    /// Number of bars in each array.
    pub num_of_bars: usize,
    /// Shortest length a non-target bar may take.
    pub min_bar_height: u32,
    /// Longest length any bar may take.
    pub max_bar_height: u32,
    /// Minimum clearance between every bar and the canvas edges.
    pub min_edge_gap: f64,
}

impl LayoutBounds {
    /// Lowest floor any bar may be placed at.
    #[must_use]
    pub fn lowest_floor(&self) -> f64 {
        self.min_edge_gap
    }

    /// Highest point any bar may reach.
    #[must_use]
    pub fn highest_top(&self) -> f64 {
        CANVAS_HEIGHT - self.min_edge_gap
    }

    /// Floor range that keeps a bar of `length` inside the canvas clearance.
    ///
    /// The range is empty (start above end) when the bar cannot fit.
    #[must_use]
    pub fn floor_range(&self, length: f64) -> (f64, f64) {
        (self.lowest_floor(), self.highest_top() - length)
    }
}

impl Default for LayoutBounds {
    fn default() -> Self {
        Self {
            num_of_bars: 10,
            min_bar_height: 20,
            max_bar_height: 70,
            min_edge_gap: 5.0,
        }
    }
}

/// Parameters of the darkness levels assigned to bars.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DarknessTuning {
    /// How much lighter the dimmer target is than the darker one.
    pub delta_darkness: u8,
    /// Minimum margin between a target and the darkest non-target bar in its array.
    pub darkest_salience: u8,
    /// Spread of the darker target's level below [`MAX_DARKNESS`].
    pub darkest_variance: u8,
}

impl Default for DarknessTuning {
    fn default() -> Self {
        Self {
            delta_darkness: 1,
            darkest_salience: 2,
            darkest_variance: 1,
        }
    }
}

/// Everything needed to compose one stimulus pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StimulusConfig {
    /// Requested cue polarities.
    pub cues: CuePolarities,
    /// Deltas between the two target bars.
    pub difficulty: Difficulty,
    /// Bar count and canvas geometry.
    pub layout: LayoutBounds,
    /// Darkness level parameters.
    #[serde(default)]
    pub darkness: DarknessTuning,
}

impl StimulusConfig {
    /// Checks every feasibility condition that does not depend on random draws.
    ///
    /// The outcome is a pure function of the configuration: a config that fails
    /// here fails on every call and must be fixed rather than retried.
    pub fn validate(&self) -> Result<(), GenerationError> {
        let layout = &self.layout;
        let difficulty = &self.difficulty;

        let index_ceiling = layout
            .num_of_bars
            .checked_sub(TARGET_TAIL_MARGIN + difficulty.delta_index);
        if index_ceiling.map_or(true, |ceiling| ceiling < MIN_TARGET_INDEX) {
            return Err(ConfigIssue::TargetIndexSpan {
                num_of_bars: layout.num_of_bars,
                delta_index: difficulty.delta_index,
            }
            .into());
        }

        if layout.min_bar_height == 0 || layout.min_bar_height > layout.max_bar_height {
            return Err(ConfigIssue::BarHeightBounds {
                min_bar_height: layout.min_bar_height,
                max_bar_height: layout.max_bar_height,
            }
            .into());
        }

        let available = (layout.max_bar_height - layout.min_bar_height) as usize + 1;
        let required = layout.num_of_bars - 1;
        if required > available {
            return Err(ConfigIssue::TooFewDistinctHeights {
                required,
                available,
            }
            .into());
        }

        let span = f64::from(layout.max_bar_height - layout.min_bar_height);
        if !(0.0..=span).contains(&difficulty.delta_height) {
            return Err(ConfigIssue::HeightDelta {
                delta_height: difficulty.delta_height,
                span,
            }
            .into());
        }

        if !(0.0..1.0).contains(&difficulty.delta_length) {
            return Err(ConfigIssue::LengthDelta {
                delta_length: difficulty.delta_length,
            }
            .into());
        }

        let fill = (layout.num_of_bars - 1) as f64;
        let min = f64::from(layout.min_bar_height);
        let max = f64::from(layout.max_bar_height);
        // `fill` distinct integer heights sum to at least `fill * min + spread`
        // and at most `fill * max - spread`.
        let spread = fill * (fill - 1.0) / 2.0;
        let least_needed =
            fill * min + spread + (min + difficulty.delta_height) * difficulty.delta_length;
        let most_needed = fill * max - spread + max * difficulty.delta_length;
        if least_needed < fill * min || most_needed > fill * max {
            return Err(ConfigIssue::VolumeSpan {
                least_needed,
                most_needed,
                least_capacity: fill * min,
                most_capacity: fill * max,
            }
            .into());
        }

        if !(0.0..CANVAS_HEIGHT / 2.0).contains(&layout.min_edge_gap) {
            return Err(ConfigIssue::EdgeGap {
                min_edge_gap: layout.min_edge_gap,
            }
            .into());
        }

        let darkness = &self.darkness;
        let dimmest_target = i32::from(MAX_DARKNESS)
            - i32::from(darkness.darkest_variance)
            - i32::from(darkness.delta_darkness);
        if dimmest_target - i32::from(darkness.darkest_salience) < i32::from(MIN_DARKNESS) {
            return Err(ConfigIssue::DarknessRange {
                delta_darkness: darkness.delta_darkness,
                darkest_salience: darkness.darkest_salience,
                darkest_variance: darkness.darkest_variance,
            }
            .into());
        }

        Ok(())
    }

    /// Positions the earlier target bar may be drawn from.
    ///
    /// Only meaningful for configs that pass [`StimulusConfig::validate`].
    #[must_use]
    pub fn target_index_range(&self) -> RangeInclusive<usize> {
        let ceiling = self
            .layout
            .num_of_bars
            .saturating_sub(TARGET_TAIL_MARGIN + self.difficulty.delta_index);
        MIN_TARGET_INDEX..=ceiling
    }
}

/// Ordered bar lengths for one array with a designated target position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarMagnitudeSet {
    values: Vec<f64>,
    target_index: usize,
}

impl BarMagnitudeSet {
    /// Wraps sampled lengths, rejecting a `target_index` outside `values`.
    pub fn new(values: Vec<f64>, target_index: usize) -> Result<Self, ConfigIssue> {
        if target_index >= values.len() {
            return Err(ConfigIssue::TargetIndexOutOfRange {
                index: target_index,
                len: values.len(),
            });
        }
        Ok(Self {
            values,
            target_index,
        })
    }

    /// Lengths in presentation order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Position of the target bar.
    #[must_use]
    pub const fn target_index(&self) -> usize {
        self.target_index
    }

    /// Length of the target bar.
    #[must_use]
    pub fn target_value(&self) -> f64 {
        self.values[self.target_index]
    }

    /// Number of bars in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Reports whether the set holds no bars.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Total length of every bar, the quantity matched between paired arrays.
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.values.iter().sum()
    }
}

/// A single bar ready to be drawn.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrawableBar {
    floor: f64,
    length: f64,
    darkness: u8,
}

impl DrawableBar {
    /// Creates a bar from its floor, length and darkness level.
    #[must_use]
    pub const fn new(floor: f64, length: f64, darkness: u8) -> Self {
        Self {
            floor,
            length,
            darkness,
        }
    }

    /// Vertical position of the bar's lower edge.
    #[must_use]
    pub const fn floor(&self) -> f64 {
        self.floor
    }

    /// Length of the bar.
    #[must_use]
    pub const fn length(&self) -> f64 {
        self.length
    }

    /// Darkness level in `MIN_DARKNESS..=MAX_DARKNESS`.
    #[must_use]
    pub const fn darkness(&self) -> u8 {
        self.darkness
    }

    /// Vertical position of the bar's upper edge.
    #[must_use]
    pub fn top(&self) -> f64 {
        self.floor + self.length
    }
}

/// Two bar arrays and the cue outcomes they encode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StimulusPair {
    array_a: Vec<DrawableBar>,
    array_b: Vec<DrawableBar>,
    cues: CuePolarities,
    target_indices: [usize; 2],
}

impl StimulusPair {
    /// Assembles a pair; `target_indices` lists the target position in array A then array B.
    #[must_use]
    pub fn new(
        array_a: Vec<DrawableBar>,
        array_b: Vec<DrawableBar>,
        cues: CuePolarities,
        target_indices: [usize; 2],
    ) -> Self {
        Self {
            array_a,
            array_b,
            cues,
            target_indices,
        }
    }

    /// Bars of the requested array.
    #[must_use]
    pub fn array(&self, slot: ArraySlot) -> &[DrawableBar] {
        match slot {
            ArraySlot::A => &self.array_a,
            ArraySlot::B => &self.array_b,
        }
    }

    /// Cue polarities the pair was generated for.
    #[must_use]
    pub const fn cues(&self) -> CuePolarities {
        self.cues
    }

    /// Target positions in array A and array B.
    #[must_use]
    pub const fn target_indices(&self) -> [usize; 2] {
        self.target_indices
    }

    /// Position of the target bar in the requested array.
    #[must_use]
    pub const fn target_index(&self, slot: ArraySlot) -> usize {
        match slot {
            ArraySlot::A => self.target_indices[0],
            ArraySlot::B => self.target_indices[1],
        }
    }

    /// Target bar of the requested array.
    #[must_use]
    pub fn target(&self, slot: ArraySlot) -> &DrawableBar {
        &self.array(slot)[self.target_index(slot)]
    }

    /// Summed bar length of the requested array.
    #[must_use]
    pub fn volume(&self, slot: ArraySlot) -> f64 {
        self.array(slot).iter().map(DrawableBar::length).sum()
    }
}

/// Failures raised while generating a stimulus pair.
///
/// Generation is all-or-nothing: no partial pair accompanies an error and
/// nothing is retried internally.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GenerationError {
    /// The configuration can never produce a pair, independent of randomness.
    #[error("configuration is infeasible: {0}")]
    ConfigInfeasible(#[from] ConfigIssue),
    /// The constrained sampler could not split the remaining volume within the bar bounds.
    #[error(
        "volume cannot be distributed: bar {position} needs a length in \
         [{min_possible:.3}, {max_possible:.3}] with {remaining:.3} remaining"
    )]
    VolumeInfeasible {
        /// Draw step at which the feasible range collapsed.
        position: usize,
        /// Volume still to be distributed at that step.
        remaining: f64,
        /// Lower end of the feasible range.
        min_possible: f64,
        /// Upper end of the feasible range.
        max_possible: f64,
    },
    /// A bar could not be kept inside the canvas clearance.
    #[error("placement is infeasible: {0}")]
    PlacementInfeasible(#[from] PlacementFault),
}

/// Deterministic reasons a [`StimulusConfig`] cannot be generated.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ConfigIssue {
    /// The index delta leaves no legal position for the earlier target.
    #[error("{num_of_bars} bars leave no room for a target index delta of {delta_index}")]
    TargetIndexSpan {
        /// Requested bars per array.
        num_of_bars: usize,
        /// Requested index delta.
        delta_index: usize,
    },
    /// Bar height bounds are empty or allow zero-length bars.
    #[error("bar heights [{min_bar_height}, {max_bar_height}] are not a usable range")]
    BarHeightBounds {
        /// Requested minimum bar height.
        min_bar_height: u32,
        /// Requested maximum bar height.
        max_bar_height: u32,
    },
    /// Free sampling needs more distinct integer heights than the bounds provide.
    #[error("{required} distinct bar heights are needed but only {available} exist")]
    TooFewDistinctHeights {
        /// Distinct heights needed for the non-target bars.
        required: usize,
        /// Distinct integer heights inside the bounds.
        available: usize,
    },
    /// The height delta is negative or exceeds the bar height span.
    #[error("height delta {delta_height} must lie within [0, {span}]")]
    HeightDelta {
        /// Requested height delta.
        delta_height: f64,
        /// Span between the bar height bounds.
        span: f64,
    },
    /// The length delta is outside `[0, 1)`.
    #[error("length delta {delta_length} must lie within [0, 1)")]
    LengthDelta {
        /// Requested length delta.
        delta_length: f64,
    },
    /// Some admissible target length and free array leave a volume the
    /// constrained array cannot reach within the bar bounds.
    #[error(
        "constrained bars must cover volumes in [{least_needed:.3}, {most_needed:.3}] \
         but can only hold [{least_capacity:.3}, {most_capacity:.3}]"
    )]
    VolumeSpan {
        /// Smallest volume the constrained non-target bars may have to hold.
        least_needed: f64,
        /// Largest volume the constrained non-target bars may have to hold.
        most_needed: f64,
        /// Volume of every constrained non-target bar at the minimum height.
        least_capacity: f64,
        /// Volume of every constrained non-target bar at the maximum height.
        most_capacity: f64,
    },
    /// The edge gap is negative or leaves no drawable canvas.
    #[error("edge gap {min_edge_gap} must lie within [0, half the canvas)")]
    EdgeGap {
        /// Requested edge gap.
        min_edge_gap: f64,
    },
    /// Darkness parameters leave no legal level for some non-target bar.
    #[error(
        "darkness delta {delta_darkness}, salience {darkest_salience} and variance \
         {darkest_variance} leave no level for non-target bars"
    )]
    DarknessRange {
        /// Requested darkness delta.
        delta_darkness: u8,
        /// Requested salience margin.
        darkest_salience: u8,
        /// Requested variance of the darker target.
        darkest_variance: u8,
    },
    /// A sampler was asked to place the target outside its array.
    #[error("target index {index} is outside an array of {len} bars")]
    TargetIndexOutOfRange {
        /// Requested target position.
        index: usize,
        /// Array length.
        len: usize,
    },
    /// A sampler was asked to match a volume that is not a finite number.
    #[error("target volume {target_volume} is not finite")]
    TargetVolume {
        /// Requested volume.
        target_volume: f64,
    },
}

/// Canvas violations detected during floor placement.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum PlacementFault {
    /// No floor keeps the bar inside the canvas clearance.
    #[error(
        "bar {index} of array {array:?} (length {length:.3}) needs a floor in \
         [{min_floor:.3}, {max_floor:.3}], which is empty"
    )]
    EmptyFloorRange {
        /// Array holding the bar.
        array: ArraySlot,
        /// Position of the bar.
        index: usize,
        /// Length of the bar.
        length: f64,
        /// Lowest admissible floor.
        min_floor: f64,
        /// Highest admissible floor.
        max_floor: f64,
    },
    /// A target floor derived from its counterpart left the canvas clearance.
    #[error(
        "derived floor {floor:.3} for target bar {index} of array {array:?} \
         (length {length:.3}) falls outside [{min_floor:.3}, {max_floor:.3}]"
    )]
    DerivedFloorOutOfBounds {
        /// Array holding the bar.
        array: ArraySlot,
        /// Position of the bar.
        index: usize,
        /// Length of the bar.
        length: f64,
        /// Derived floor.
        floor: f64,
        /// Lowest admissible floor.
        min_floor: f64,
        /// Highest admissible floor.
        max_floor: f64,
    },
}

impl PlacementFault {
    /// Array that holds the offending bar.
    #[must_use]
    pub const fn array(&self) -> ArraySlot {
        match self {
            Self::EmptyFloorRange { array, .. } | Self::DerivedFloorOutOfBounds { array, .. } => {
                *array
            }
        }
    }

    /// Returns the fault re-labelled for the given array.
    #[must_use]
    pub const fn with_array(self, slot: ArraySlot) -> Self {
        match self {
            Self::EmptyFloorRange {
                index,
                length,
                min_floor,
                max_floor,
                ..
            } => Self::EmptyFloorRange {
                array: slot,
                index,
                length,
                min_floor,
                max_floor,
            },
            Self::DerivedFloorOutOfBounds {
                index,
                length,
                floor,
                min_floor,
                max_floor,
                ..
            } => Self::DerivedFloorOutOfBounds {
                array: slot,
                index,
                length,
                floor,
                min_floor,
                max_floor,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(layout: LayoutBounds, difficulty: Difficulty) -> StimulusConfig {
        StimulusConfig {
            layout,
            difficulty,
            ..StimulusConfig::default()
        }
    }

    #[test]
    fn default_config_is_feasible() {
        assert_eq!(StimulusConfig::default().validate(), Ok(()));
    }

    #[test]
    fn index_delta_at_boundary_leaves_single_position() {
        let config = config_with(LayoutBounds::default(), Difficulty::new(10.0, 5, 0.1));
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.target_index_range(), 2..=2);
    }

    #[test]
    fn index_delta_one_past_single_position_is_rejected() {
        for delta_index in [6, 7] {
            let config =
                config_with(LayoutBounds::default(), Difficulty::new(10.0, delta_index, 0.1));
            assert_eq!(
                config.validate(),
                Err(GenerationError::ConfigInfeasible(
                    ConfigIssue::TargetIndexSpan {
                        num_of_bars: 10,
                        delta_index,
                    }
                ))
            );
        }
    }

    #[test]
    fn index_delta_past_boundary_is_rejected() {
        let config = config_with(LayoutBounds::default(), Difficulty::new(10.0, 7, 0.1));
        assert_eq!(
            config.validate(),
            Err(GenerationError::ConfigInfeasible(
                ConfigIssue::TargetIndexSpan {
                    num_of_bars: 10,
                    delta_index: 7,
                }
            ))
        );
    }

    #[test]
    fn index_delta_larger_than_bar_count_does_not_underflow() {
        let config = config_with(LayoutBounds::default(), Difficulty::new(10.0, 40, 0.1));
        assert!(matches!(
            config.validate(),
            Err(GenerationError::ConfigInfeasible(
                ConfigIssue::TargetIndexSpan { .. }
            ))
        ));
    }

    #[test]
    fn height_delta_beyond_span_is_rejected() {
        let config = config_with(LayoutBounds::default(), Difficulty::new(51.0, 2, 0.1));
        assert!(matches!(
            config.validate(),
            Err(GenerationError::ConfigInfeasible(ConfigIssue::HeightDelta { .. }))
        ));
    }

    #[test]
    fn narrow_height_bounds_cannot_supply_distinct_bars() {
        let layout = LayoutBounds {
            min_bar_height: 20,
            max_bar_height: 25,
            ..LayoutBounds::default()
        };
        let config = config_with(layout, Difficulty::new(2.0, 2, 0.1));
        assert_eq!(
            config.validate(),
            Err(GenerationError::ConfigInfeasible(
                ConfigIssue::TooFewDistinctHeights {
                    required: 9,
                    available: 6,
                }
            ))
        );
    }

    #[test]
    fn darkness_without_room_for_distractors_is_rejected() {
        let config = StimulusConfig {
            darkness: DarknessTuning {
                delta_darkness: 2,
                darkest_salience: 4,
                darkest_variance: 1,
            },
            ..StimulusConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GenerationError::ConfigInfeasible(
                ConfigIssue::DarknessRange { .. }
            ))
        ));
    }

    #[test]
    fn darkness_leaving_only_the_lightest_level_is_accepted() {
        let config = StimulusConfig {
            darkness: DarknessTuning {
                delta_darkness: 2,
                darkest_salience: 3,
                darkest_variance: 1,
            },
            ..StimulusConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn crowded_height_bounds_cannot_absorb_length_delta() {
        let layout = LayoutBounds {
            min_bar_height: 62,
            max_bar_height: 70,
            ..LayoutBounds::default()
        };
        let config = config_with(layout, Difficulty::new(0.0, 2, 0.9));
        assert!(matches!(
            config.validate(),
            Err(GenerationError::ConfigInfeasible(ConfigIssue::VolumeSpan {
                most_capacity,
                ..
            })) if most_capacity == 630.0
        ));
    }

    #[test]
    fn reference_bounds_absorb_every_preset_length_delta() {
        for delta_length in [0.1, 0.2, 0.4] {
            let config =
                config_with(LayoutBounds::default(), Difficulty::new(10.0, 2, delta_length));
            assert_eq!(config.validate(), Ok(()), "delta_length {delta_length}");
        }
    }

    #[test]
    fn magnitude_set_rejects_target_outside_values() {
        assert_eq!(
            BarMagnitudeSet::new(vec![20.0, 30.0], 2),
            Err(ConfigIssue::TargetIndexOutOfRange { index: 2, len: 2 })
        );
        let set = BarMagnitudeSet::new(vec![20.0, 30.0], 1).expect("index 1 is in range");
        assert_eq!(set.target_value(), 30.0);
    }

    #[test]
    fn all_polarity_combinations_are_distinct_and_ordered() {
        let all = CuePolarities::all();
        assert_eq!(all.len(), 16);
        assert_eq!(all[0].flags(), [1, 1, 1, 1]);
        assert_eq!(all[1].flags(), [1, 1, 1, 2]);
        assert_eq!(all[15].flags(), [2, 2, 2, 2]);
        let distinct: std::collections::BTreeSet<_> = all.iter().collect();
        assert_eq!(distinct.len(), 16);
    }

    #[test]
    fn slots_serialize_as_experiment_flags() {
        let cues = CuePolarities::new(ArraySlot::A, ArraySlot::B, ArraySlot::B, ArraySlot::A);
        let json = serde_json::to_string(&cues).expect("serialize cues");
        assert_eq!(json, r#"{"higher":1,"later":2,"longer":2,"darker":1}"#);

        let error = serde_json::from_str::<ArraySlot>("3").expect_err("flag 3 is invalid");
        assert!(error.to_string().contains("polarity flag"));
    }

    #[test]
    fn floor_range_tracks_edge_gap() {
        let layout = LayoutBounds::default();
        assert_eq!(layout.floor_range(30.0), (5.0, 65.0));
    }
}
