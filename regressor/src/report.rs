use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use log::debug;
use serde::Serialize;

use crate::{
    Result,
    experiment::{Extrapolation, Outcome, TestReport},
};

pub const LOSSES: &str = "losses.csv";
pub const HISTORY: &str = "history.json";
pub const PREDICTIONS: &str = "predictions.csv";
pub const EXTRAPOLATION: &str = "extrapolation.csv";
pub const SUMMARY: &str = "summary.json";

/// Writes every report of `outcome` into `dir`, creating it if needed.
///
/// # Errors
/// Returns a `RegressorErr` on the first file that can't be written.
pub fn write<P: AsRef<Path>>(dir: P, outcome: &Outcome) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut losses = create(dir, LOSSES)?;
    writeln!(losses, "epoch,train,validation")?;
    for (epoch, train, validation) in outcome.history.iter() {
        writeln!(losses, "{epoch},{train},{validation}")?;
    }
    losses.flush()?;

    write_json(dir, HISTORY, &outcome.history)?;
    write_predictions(dir, &outcome.test)?;

    if let Some(extrapolation) = &outcome.extrapolation {
        write_extrapolation(dir, extrapolation)?;
    }

    write_json(dir, SUMMARY, &outcome.summary)?;
    debug!("reports written to {}", dir.display());
    Ok(())
}

fn write_predictions(dir: &Path, test: &TestReport) -> Result<()> {
    let mut w = create(dir, PREDICTIONS)?;

    let header: Vec<_> = match test.truth.ncols() {
        1 => vec!["truth".to_string(), "prediction".to_string()],
        n => (0..n)
            .flat_map(|i| [format!("truth_{i}"), format!("prediction_{i}")])
            .collect(),
    };
    writeln!(w, "{}", header.join(","))?;

    for (truth, prediction) in test.truth.rows().into_iter().zip(test.prediction.rows()) {
        let row: Vec<_> = truth
            .iter()
            .zip(prediction)
            .flat_map(|(t, p)| [t.to_string(), p.to_string()])
            .collect();
        writeln!(w, "{}", row.join(","))?;
    }

    w.flush()?;
    Ok(())
}

fn write_extrapolation(dir: &Path, extrapolation: &Extrapolation) -> Result<()> {
    let mut w = create(dir, EXTRAPOLATION)?;
    writeln!(w, "x,truth,prediction")?;

    let Extrapolation {
        x,
        truth,
        prediction,
    } = extrapolation;

    for ((x, truth), prediction) in x.iter().zip(truth).zip(prediction) {
        writeln!(w, "{x},{truth},{prediction}")?;
    }

    w.flush()?;
    Ok(())
}

fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<()> {
    let mut w = create(dir, name)?;
    serde_json::to_writer_pretty(&mut w, value)?;
    writeln!(w)?;
    w.flush()?;
    Ok(())
}

fn create(dir: &Path, name: &str) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(dir.join(name))?))
}
