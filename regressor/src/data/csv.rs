use std::{fs, path::Path};

use log::debug;
use machine_learning::dataset::Dataset;

use crate::{RegressorErr, Result};

/// Reads a CSV dataset from `path`, see [`parse`].
pub fn load<P: AsRef<Path>>(
    path: P,
    target: &str,
    features: Option<&[String]>,
) -> Result<(Dataset, Vec<String>)> {
    let content = fs::read_to_string(path)?;
    parse(&content, target, features)
}

/// Parses a comma separated table whose first line is the header.
///
/// Cells are split on every comma and there's no quoting, so a quoted cell holding a comma
/// shows up as a row with too many values.
///
/// # Arguments
/// * `content` - The whole file.
/// * `target` - The name of the column to predict.
/// * `features` - The feature columns, `None` takes every other column whose cells are all
///   numbers.
///
/// # Returns
/// The dataset and the names of its feature columns, in order, or an error pointing at the
/// offending line.
pub fn parse(
    content: &str,
    target: &str,
    features: Option<&[String]>,
) -> Result<(Dataset, Vec<String>)> {
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let (_, header) = lines
        .next()
        .ok_or_else(|| RegressorErr::dataset(1, "missing header"))?;
    let header: Vec<_> = header.split(',').map(str::trim).collect();

    let rows = lines
        .map(|(i, line)| {
            let cells: Vec<_> = line.split(',').map(str::trim).collect();

            if cells.len() != header.len() {
                let hint = if line.contains('"') {
                    " (quoted cells are not supported)"
                } else {
                    ""
                };

                return Err(RegressorErr::dataset(
                    i,
                    format!("expected {} values, got {}{hint}", header.len(), cells.len()),
                ));
            }

            Ok((i, cells))
        })
        .collect::<Result<Vec<_>>>()?;

    if rows.is_empty() {
        return Err(RegressorErr::dataset(1, "no samples after the header"));
    }

    let column = |name: &str| {
        header
            .iter()
            .position(|&h| h == name)
            .ok_or_else(|| RegressorErr::dataset(1, format!("no column named '{name}'")))
    };

    let target_col = column(target)?;
    let feature_cols = match features {
        Some(names) => names
            .iter()
            .map(|name| column(name))
            .collect::<Result<Vec<_>>>()?,
        None => numeric_columns(&rows, header.len(), target_col),
    };

    if feature_cols.is_empty() {
        return Err(RegressorErr::dataset(1, "no numeric feature columns"));
    }

    let mut data = Vec::with_capacity(rows.len() * (feature_cols.len() + 1));

    for (i, cells) in &rows {
        for &col in feature_cols.iter().chain([&target_col]) {
            let value = cells[col].parse::<f32>().map_err(|_| {
                RegressorErr::dataset(
                    *i,
                    format!("cannot parse '{}' in column '{}'", cells[col], header[col]),
                )
            })?;

            data.push(value);
        }
    }

    let names: Vec<_> = feature_cols.iter().map(|&c| header[c].to_string()).collect();
    debug!("read {} samples with features {names:?}", rows.len());

    let dataset = Dataset::new(data, feature_cols.len(), 1)?;
    Ok((dataset, names))
}

/// Every column other than `skip` whose cells all parse as numbers.
fn numeric_columns(rows: &[(usize, Vec<&str>)], width: usize, skip: usize) -> Vec<usize> {
    (0..width)
        .filter(|&col| col != skip)
        .filter(|&col| {
            rows.iter()
                .all(|(_, cells)| cells[col].parse::<f32>().is_ok())
        })
        .collect()
}
