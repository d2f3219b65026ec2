use crate::signal::TrialTensor;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

/// On-disk trial tensor: the `[n_trials][trial_len]` array plus its rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialTensorRecord {
    pub fs: f64,
    pub n_trials: usize,
    pub trial_len: usize,
    /// Predictor files or stimulus names, in concatenation order.
    #[serde(default)]
    pub sources: Vec<String>,
    pub trials: Vec<Vec<f64>>,
}

impl TrialTensorRecord {
    pub fn new(tensor: &TrialTensor, sources: Vec<String>) -> Self {
        Self {
            fs: tensor.fs,
            n_trials: tensor.n_trials,
            trial_len: tensor.trial_len,
            sources,
            trials: tensor.to_nested(),
        }
    }

    pub fn into_tensor(self) -> Result<TrialTensor> {
        if self.trials.len() != self.n_trials {
            bail!(
                "tensor declares {} trials but holds {}",
                self.n_trials,
                self.trials.len()
            );
        }
        let mut data = Vec::with_capacity(self.n_trials * self.trial_len);
        for (i, row) in self.trials.into_iter().enumerate() {
            if row.len() != self.trial_len {
                bail!(
                    "trial {} has {} samples, expected {}",
                    i,
                    row.len(),
                    self.trial_len
                );
            }
            data.extend(row);
        }
        Ok(TrialTensor {
            fs: self.fs,
            n_trials: self.n_trials,
            trial_len: self.trial_len,
            data,
        })
    }
}

pub fn write_trial_tensor(path: &Path, tensor: &TrialTensor, sources: Vec<String>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &TrialTensorRecord::new(tensor, sources))
        .with_context(|| format!("writing {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn read_trial_tensor(path: &Path) -> Result<TrialTensorRecord> {
    let file = fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let record = serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(record)
}
