use crate::config::SubjectConfig;
use crate::io::{read_feature_events, read_roi_bounds, write_f64_series, write_trial_tensor};
use crate::predictor::{build_predictor_detailed, segment, PlacementStats};
use crate::signal::{TimeSeries, TrialTensor};
use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use std::path::PathBuf;

/// One stimulus after placement and cropping.
#[derive(Debug, Clone)]
pub struct StimulusPredictor {
    pub name: String,
    pub predictor: TimeSeries,
    pub stats: PlacementStats,
    pub output: Option<PathBuf>,
}

/// All stimuli of a subject plus the assembled trial tensor.
#[derive(Debug, Clone)]
pub struct SubjectRun {
    pub stimuli: Vec<StimulusPredictor>,
    pub tensor: TrialTensor,
}

/// Per-stimulus line of the run summary.
#[derive(Debug, Clone, Serialize)]
pub struct StimulusSummary {
    pub name: String,
    pub samples: usize,
    pub placed: usize,
    pub dropped: usize,
    pub collisions: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectSummary {
    pub fs: f64,
    pub n_trials: usize,
    pub trial_len: usize,
    pub stimuli: Vec<StimulusSummary>,
    pub tensor_output: Option<PathBuf>,
}

/// Build every stimulus predictor in listed order and segment them into trials.
pub fn run_subject(cfg: &SubjectConfig) -> Result<SubjectRun> {
    cfg.validate()?;
    let layout = cfg.layout()?;
    let roi_table = cfg.resolve(&cfg.roi.table);
    let mut stimuli = Vec::with_capacity(cfg.stimuli.len());
    for stim in &cfg.stimuli {
        let features = cfg.resolve(&stim.features);
        let events = read_feature_events(&features, &cfg.features)
            .with_context(|| format!("stimulus {}", stim.name))?;
        let bounds = read_roi_bounds(&roi_table, &cfg.roi_spec(stim))
            .with_context(|| format!("stimulus {}", stim.name))?;
        let build = build_predictor_detailed(&events, &bounds, &cfg.predictor_config(Some(stim)))
            .with_context(|| format!("stimulus {}", stim.name))?;
        info!(
            "{}: {} events → {} samples",
            stim.name,
            events.len(),
            build.cropped.len()
        );
        stimuli.push(StimulusPredictor {
            name: stim.name.clone(),
            predictor: build.cropped,
            stats: build.stats,
            output: stim.output.as_deref().map(|p| cfg.resolve(p)),
        });
    }
    let series: Vec<TimeSeries> = stimuli.iter().map(|s| s.predictor.clone()).collect();
    let tensor = segment(&series, &layout, cfg.rates.target);
    Ok(SubjectRun { stimuli, tensor })
}

impl SubjectRun {
    /// Write requested predictor files and the trial tensor.
    pub fn write(&self, cfg: &SubjectConfig) -> Result<SubjectSummary> {
        for stim in &self.stimuli {
            if let Some(path) = &stim.output {
                write_f64_series(path, &stim.predictor.data)?;
                info!("saved predictor {}", path.display());
            }
        }
        let tensor_output = cfg.trials.output.as_deref().map(|p| cfg.resolve(p));
        if let Some(path) = &tensor_output {
            let sources = self.stimuli.iter().map(|s| s.name.clone()).collect();
            write_trial_tensor(path, &self.tensor, sources)?;
            info!("saved trial tensor {}", path.display());
        }
        Ok(self.summary(tensor_output))
    }

    pub fn summary(&self, tensor_output: Option<PathBuf>) -> SubjectSummary {
        SubjectSummary {
            fs: self.tensor.fs,
            n_trials: self.tensor.n_trials,
            trial_len: self.tensor.trial_len,
            stimuli: self
                .stimuli
                .iter()
                .map(|s| StimulusSummary {
                    name: s.name.clone(),
                    samples: s.predictor.len(),
                    placed: s.stats.placed,
                    dropped: s.stats.dropped,
                    collisions: s.stats.collisions,
                })
                .collect(),
            tensor_output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::read_trial_tensor;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn test_data() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .and_then(|p| p.parent())
            .expect("workspace root")
            .join("test_data")
    }

    #[test]
    fn runs_subject_config_from_disk() {
        let mut cfg = SubjectConfig::from_path(&test_data().join("subject_surprisal.toml")).unwrap();
        let run = run_subject(&cfg).unwrap();
        assert_eq!(run.stimuli.len(), 2);
        // story A: ROI 4410..34000 at 44.1 kHz → bins 10..78
        assert_eq!(run.stimuli[0].predictor.len(), 68);
        assert_eq!(run.stimuli[0].predictor.data[0], 2.5);
        assert_eq!(run.tensor.shape(), (3, 40));
        // story A truncated to one 40-sample trial, then story B
        assert_eq!(run.tensor.row(0)[10], 6.5);
        let b = &run.stimuli[1].predictor;
        assert_eq!(&run.tensor.row(1)[..b.len().min(40)], &b.data[..b.len().min(40)]);

        let dir = tempdir().unwrap();
        cfg.trials.output = Some(dir.path().join("trials.json"));
        let summary = run.write(&cfg).unwrap();
        assert_eq!(summary.stimuli[0].samples, 68);
        let record = read_trial_tensor(&dir.path().join("trials.json")).unwrap();
        assert_eq!(record.sources, vec!["story_a".to_string(), "story_b".to_string()]);
        assert_eq!(record.into_tensor().unwrap(), run.tensor);
    }
}
