use std::{collections::HashSet, fs, path::Path};

use anyhow::{bail, Context, Result};
use bar_salience_core::{CuePolarities, DarknessTuning, Difficulty, LayoutBounds, StimulusConfig};
use serde::Deserialize;

/// A family of stimuli generated together and written to a single batch file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub(crate) struct SweepDefinition {
    /// Identifier of the sweep; also feeds per-stimulus seed derivation.
    pub(crate) name: String,
    /// File name of the batch inside the output directory.
    pub(crate) output: String,
    /// How many times the full condition grid is repeated.
    #[serde(default = "default_repeats")]
    pub(crate) repeats: usize,
    /// Bar count and canvas geometry shared by every stimulus of the sweep.
    #[serde(default)]
    pub(crate) layout: LayoutBounds,
    /// Darkness parameters shared by every stimulus of the sweep.
    #[serde(default)]
    pub(crate) darkness: DarknessTuning,
    /// Difficulty levels crossed with every polarity combination.
    pub(crate) difficulties: Vec<Difficulty>,
}

fn default_repeats() -> usize {
    1
}

impl SweepDefinition {
    /// Expands the sweep into one config per stimulus, repeats outermost and
    /// difficulty levels innermost.
    pub(crate) fn configs(&self) -> Vec<StimulusConfig> {
        let combinations = CuePolarities::all();
        let mut configs =
            Vec::with_capacity(self.repeats * combinations.len() * self.difficulties.len());
        for _ in 0..self.repeats {
            for cues in &combinations {
                for difficulty in &self.difficulties {
                    configs.push(StimulusConfig {
                        cues: *cues,
                        difficulty: *difficulty,
                        layout: self.layout,
                        darkness: self.darkness,
                    });
                }
            }
        }
        configs
    }
}

#[derive(Debug, Deserialize)]
struct SweepFile {
    #[serde(rename = "sweep")]
    sweeps: Vec<SweepDefinition>,
}

/// Sweeps of the reference experiment: main task, engagement checks, hard
/// practice and easy practice.
pub(crate) fn presets() -> Vec<SweepDefinition> {
    let task_levels = vec![Difficulty::new(10.0, 2, 0.1), Difficulty::new(20.0, 3, 0.2)];
    vec![
        SweepDefinition {
            name: "task".to_owned(),
            output: "stimuli.json".to_owned(),
            repeats: 4,
            layout: LayoutBounds::default(),
            darkness: DarknessTuning::default(),
            difficulties: task_levels.clone(),
        },
        SweepDefinition {
            name: "validation".to_owned(),
            output: "validation_stimuli.json".to_owned(),
            repeats: 1,
            layout: LayoutBounds {
                min_edge_gap: 0.0,
                ..LayoutBounds::default()
            },
            darkness: DarknessTuning {
                delta_darkness: 0,
                darkest_salience: 3,
                darkest_variance: 0,
            },
            difficulties: vec![Difficulty::new(30.0, 5, 0.4)],
        },
        SweepDefinition {
            name: "practice".to_owned(),
            output: "practice.json".to_owned(),
            repeats: 4,
            layout: LayoutBounds::default(),
            darkness: DarknessTuning::default(),
            difficulties: task_levels,
        },
        SweepDefinition {
            name: "easy".to_owned(),
            output: "stimuli_easy.json".to_owned(),
            repeats: 4,
            layout: LayoutBounds {
                max_bar_height: 60,
                min_edge_gap: 2.5,
                ..LayoutBounds::default()
            },
            darkness: DarknessTuning::default(),
            difficulties: vec![Difficulty::new(25.0, 4, 0.25)],
        },
    ]
}

/// Loads sweeps from `path`, or the presets when no path is given.
pub(crate) fn load(path: Option<&Path>) -> Result<Vec<SweepDefinition>> {
    let Some(path) = path else {
        return Ok(presets());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read sweep file {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid sweep file {}", path.display()))
}

fn parse(contents: &str) -> Result<Vec<SweepDefinition>> {
    let file: SweepFile = toml::from_str(contents).context("failed to parse sweep toml")?;
    if file.sweeps.is_empty() {
        bail!("sweep file declares no sweeps");
    }

    let mut names = HashSet::new();
    let mut outputs = HashSet::new();
    for sweep in &file.sweeps {
        if sweep.difficulties.is_empty() {
            bail!("sweep `{}` declares no difficulty levels", sweep.name);
        }
        if !names.insert(sweep.name.as_str()) {
            bail!("sweep `{}` is declared more than once", sweep.name);
        }
        if !outputs.insert(sweep.output.as_str()) {
            bail!("output `{}` is shared by several sweeps", sweep.output);
        }
    }
    Ok(file.sweeps)
}

/// Keeps only the sweeps named in `only`; an empty filter keeps everything.
pub(crate) fn select(
    sweeps: Vec<SweepDefinition>,
    only: &[String],
) -> Result<Vec<SweepDefinition>> {
    if only.is_empty() {
        return Ok(sweeps);
    }
    for name in only {
        if !sweeps.iter().any(|sweep| &sweep.name == name) {
            bail!("unknown sweep `{name}`");
        }
    }
    Ok(sweeps
        .into_iter()
        .filter(|sweep| only.contains(&sweep.name))
        .collect())
}
