//! CSV input for the command line tool.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use csv::ReaderBuilder;

/// A CSV file as raw string cells.
#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Option<Vec<String>>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Read a CSV file.
    pub fn from_csv<P: AsRef<Path>>(path: P, has_headers: bool) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Self::from_reader(file, has_headers)
            .with_context(|| format!("reading {}", path.display()))
    }

    pub fn from_reader<R: Read>(reader: R, has_headers: bool) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(has_headers)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = if has_headers {
            Some(rdr.headers()?.iter().map(str::to_string).collect())
        } else {
            None
        };

        let mut rows = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| anyhow!("error reading record {i}: {e}"))?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        if rows.is_empty() {
            bail!("no data rows");
        }
        Ok(Self { headers, rows })
    }

    /// Parse every cell as a number.
    pub fn numeric(&self) -> Result<Vec<Vec<f64>>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(r, row)| parse_row(r, row, 0))
            .collect()
    }

    /// Split off the first column as a record identifier.
    pub fn with_identifiers(&self) -> Result<(Vec<String>, Vec<Vec<f64>>)> {
        let mut ids = Vec::with_capacity(self.rows.len());
        let mut data = Vec::with_capacity(self.rows.len());
        for (r, row) in self.rows.iter().enumerate() {
            let (id, rest) = row
                .split_first()
                .ok_or_else(|| anyhow!("row {r} is empty"))?;
            ids.push(id.clone());
            data.push(parse_row(r, rest, 1)?);
        }
        Ok((ids, data))
    }

    /// Split off the last column as a class label.
    pub fn with_labels(&self) -> Result<(Vec<Vec<f64>>, Vec<String>)> {
        let mut data = Vec::with_capacity(self.rows.len());
        let mut labels = Vec::with_capacity(self.rows.len());
        for (r, row) in self.rows.iter().enumerate() {
            let (label, rest) = row.split_last().ok_or_else(|| anyhow!("row {r} is empty"))?;
            data.push(parse_row(r, rest, 0)?);
            labels.push(normalize_label(label));
        }
        Ok((data, labels))
    }
}

fn parse_row(r: usize, cells: &[String], offset: usize) -> Result<Vec<f64>> {
    cells
        .iter()
        .enumerate()
        .map(|(c, cell)| {
            cell.parse::<f64>().with_context(|| {
                format!("row {r} column {}: {cell:?} is not a number", c + offset)
            })
        })
        .collect()
}

/// Numeric labels compare by value, so `1`, `1.0` and `1.00` are one class.
pub fn normalize_label(label: &str) -> String {
    match label.parse::<f64>() {
        Ok(v) if v.is_finite() => v.to_string(),
        _ => label.to_string(),
    }
}

/// Drop records with any negative value.
pub fn drop_negative_rows(data: Vec<Vec<f64>>) -> Vec<Vec<f64>> {
    data.into_iter()
        .filter(|row| row.iter().all(|v| *v >= 0.0))
        .collect()
}
