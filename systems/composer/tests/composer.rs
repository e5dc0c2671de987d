use bar_salience_core::{
    ArraySlot, ConfigIssue, CuePolarities, DarknessTuning, Difficulty, GenerationError,
    LayoutBounds, StimulusConfig, StimulusPair, MAX_DARKNESS, MIN_DARKNESS,
};
use bar_salience_system_composer::Composer;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const TOLERANCE: f64 = 1e-9;

fn compose(config: &StimulusConfig, seed: u64) -> Result<StimulusPair, GenerationError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Composer::new().compose(config, &mut rng)
}

fn sweep_configs() -> Vec<StimulusConfig> {
    let mut configs = Vec::new();
    let task = [Difficulty::new(10.0, 2, 0.1), Difficulty::new(20.0, 3, 0.2)];
    for cues in CuePolarities::all() {
        for difficulty in task {
            configs.push(StimulusConfig {
                cues,
                difficulty,
                ..StimulusConfig::default()
            });
        }
        configs.push(StimulusConfig {
            cues,
            difficulty: Difficulty::new(30.0, 5, 0.4),
            layout: LayoutBounds {
                min_edge_gap: 0.0,
                ..LayoutBounds::default()
            },
            darkness: DarknessTuning {
                delta_darkness: 0,
                darkest_salience: 3,
                darkest_variance: 0,
            },
        });
        configs.push(StimulusConfig {
            cues,
            difficulty: Difficulty::new(25.0, 4, 0.25),
            layout: LayoutBounds {
                max_bar_height: 60,
                min_edge_gap: 2.5,
                ..LayoutBounds::default()
            },
            darkness: DarknessTuning::default(),
        });
    }
    configs
}

fn assert_pair_properties(config: &StimulusConfig, pair: &StimulusPair, context: &str) {
    let cues = config.cues;
    let layout = config.layout;
    let difficulty = config.difficulty;

    assert_eq!(pair.cues(), cues, "{context}: cue outcomes");
    for slot in ArraySlot::ALL {
        assert_eq!(pair.array(slot).len(), layout.num_of_bars, "{context}: bar count");
    }

    assert!(
        (pair.volume(ArraySlot::A) - pair.volume(ArraySlot::B)).abs() < 1e-6,
        "{context}: volumes {} and {}",
        pair.volume(ArraySlot::A),
        pair.volume(ArraySlot::B)
    );

    for slot in ArraySlot::ALL {
        for (index, bar) in pair.array(slot).iter().enumerate() {
            assert!(
                bar.floor() >= layout.min_edge_gap - TOLERANCE,
                "{context}: {slot:?}[{index}] floor {} below gap",
                bar.floor()
            );
            assert!(
                bar.top() <= 100.0 - layout.min_edge_gap + TOLERANCE,
                "{context}: {slot:?}[{index}] top {} above gap",
                bar.top()
            );
            assert!(bar.length() > 0.0, "{context}: empty bar");
            assert!((MIN_DARKNESS..=MAX_DARKNESS).contains(&bar.darkness()));
        }
    }

    let higher = pair.target(cues.higher);
    let lower = pair.target(cues.higher.other());
    assert!(
        (higher.top() - lower.top() - difficulty.delta_height).abs() < TOLERANCE,
        "{context}: height delta {}",
        higher.top() - lower.top()
    );

    let longer = pair.target(cues.longer);
    let shorter = pair.target(cues.longer.other());
    assert!(
        (shorter.length() / longer.length() - (1.0 - difficulty.delta_length)).abs() < TOLERANCE,
        "{context}: length ratio"
    );

    let later = pair.target_index(cues.later);
    let earlier = pair.target_index(cues.later.other());
    assert_eq!(later, earlier + difficulty.delta_index, "{context}: index delta");
    assert!(earlier >= 2, "{context}: earlier target too close to the start");

    let darker = pair.target(cues.darker);
    let dimmer = pair.target(cues.darker.other());
    assert_eq!(
        darker.darkness() - dimmer.darkness(),
        config.darkness.delta_darkness,
        "{context}: darkness delta"
    );
    for slot in ArraySlot::ALL {
        let target_index = pair.target_index(slot);
        let ceiling = pair.target(slot).darkness() - config.darkness.darkest_salience;
        for (index, bar) in pair.array(slot).iter().enumerate() {
            if index != target_index {
                assert!(bar.darkness() <= ceiling, "{context}: distractor too dark");
            }
        }
    }
}

#[test]
fn reference_scenario_produces_expected_shape() {
    let config = StimulusConfig {
        cues: CuePolarities::new(ArraySlot::A, ArraySlot::A, ArraySlot::A, ArraySlot::A),
        difficulty: Difficulty::new(10.0, 2, 0.1),
        layout: LayoutBounds {
            num_of_bars: 10,
            min_bar_height: 20,
            max_bar_height: 70,
            min_edge_gap: 5.0,
        },
        darkness: DarknessTuning::default(),
    };

    let pair = compose(&config, 2024).expect("reference scenario is feasible");
    assert_eq!(pair.array(ArraySlot::A).len(), 10);
    assert_eq!(pair.array(ArraySlot::B).len(), 10);

    let [index_a, index_b] = pair.target_indices();
    assert_eq!(index_a, index_b + 2, "array A carries the later target");
    assert!(pair.target(ArraySlot::A).length() > pair.target(ArraySlot::B).length());
    assert!(pair.target(ArraySlot::A).top() > pair.target(ArraySlot::B).top());
    assert!(pair.target(ArraySlot::A).darkness() > pair.target(ArraySlot::B).darkness());
    assert_pair_properties(&config, &pair, "reference");
}

#[test]
fn every_polarity_and_difficulty_satisfies_invariants() {
    for (ordinal, config) in sweep_configs().iter().enumerate() {
        for seed in 0..25 {
            let context = format!("config {ordinal} seed {seed}");
            let pair = compose(config, seed).unwrap_or_else(|error| panic!("{context}: {error}"));
            assert_pair_properties(config, &pair, &context);
        }
    }
}

#[test]
fn boundary_index_delta_has_single_position() {
    let config = StimulusConfig {
        difficulty: Difficulty::new(10.0, 5, 0.1),
        ..StimulusConfig::default()
    };
    for seed in 0..20 {
        let pair = compose(&config, seed).expect("boundary index delta is feasible");
        assert_eq!(pair.target_indices(), [7, 2]);
        assert_pair_properties(&config, &pair, "boundary");
    }
}

#[test]
fn index_delta_past_boundary_always_fails_before_sampling() {
    for delta_index in [6, 7] {
        let config = StimulusConfig {
            difficulty: Difficulty::new(10.0, delta_index, 0.1),
            ..StimulusConfig::default()
        };
        for seed in 0..20 {
            assert_eq!(
                compose(&config, seed),
                Err(GenerationError::ConfigInfeasible(
                    ConfigIssue::TargetIndexSpan {
                        num_of_bars: 10,
                        delta_index,
                    }
                ))
            );
        }
    }
}

#[test]
fn unreachable_volume_fails_before_sampling() {
    let config = StimulusConfig {
        difficulty: Difficulty::new(0.0, 2, 0.9),
        layout: LayoutBounds {
            min_bar_height: 62,
            max_bar_height: 70,
            ..LayoutBounds::default()
        },
        ..StimulusConfig::default()
    };
    for seed in 0..50 {
        match compose(&config, seed) {
            Err(GenerationError::ConfigInfeasible(ConfigIssue::VolumeSpan { .. })) => {}
            other => panic!("seed {seed}: unexpected {other:?}"),
        }
    }
}

#[test]
fn extreme_height_delta_with_wide_gap_reports_placement() {
    for cues in CuePolarities::all() {
        let config = StimulusConfig {
            cues,
            difficulty: Difficulty::new(48.0, 2, 0.1),
            layout: LayoutBounds {
                min_edge_gap: 20.0,
                ..LayoutBounds::default()
            },
            darkness: DarknessTuning::default(),
        };
        for seed in 0..10 {
            match compose(&config, seed) {
                Err(GenerationError::PlacementInfeasible(_)) => {}
                other => panic!("{:?} seed {seed}: unexpected {other:?}", cues.flags()),
            }
        }
    }
}

#[test]
fn reused_config_keeps_requested_polarity() {
    let config = StimulusConfig {
        cues: CuePolarities::new(ArraySlot::B, ArraySlot::A, ArraySlot::B, ArraySlot::B),
        ..StimulusConfig::default()
    };
    let snapshot = config;
    for seed in 0..10 {
        let pair = compose(&config, seed).expect("feasible");
        assert_eq!(pair.cues(), snapshot.cues);
        assert_pair_properties(&config, &pair, "reused");
    }
    assert_eq!(config, snapshot);
}

#[test]
fn same_seed_replays_identically() {
    let config = StimulusConfig {
        cues: CuePolarities::new(ArraySlot::A, ArraySlot::B, ArraySlot::B, ArraySlot::A),
        difficulty: Difficulty::new(20.0, 3, 0.2),
        ..StimulusConfig::default()
    };
    let first = compose(&config, 0xdead_beef).expect("feasible");
    let second = compose(&config, 0xdead_beef).expect("feasible");
    assert_eq!(first, second, "replay diverged between runs");
}
