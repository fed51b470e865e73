//! CSV input: period-labelled rows to a clean quarterly series.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::{debug, warn};

use crate::core::{Period, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::pipeline::PipelineConfig;

/// What the loader dropped and why.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    /// Data rows read, excluding the header.
    pub rows: usize,
    /// Zero-based data rows whose period label did not parse.
    pub unparsable_periods: Vec<usize>,
    /// Zero-based data rows with an empty, non-numeric or non-finite target.
    pub missing_targets: Vec<usize>,
    /// A period for every extra row sharing it. The first row of the
    /// period with a valid target is the one kept.
    pub duplicate_periods: Vec<Period>,
    /// Observations in the resulting series.
    pub kept: usize,
}

impl LoadReport {
    pub fn dropped(&self) -> usize {
        self.rows - self.kept
    }
}

/// A loaded series with its load report.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub series: TimeSeries,
    pub report: LoadReport,
}

/// Reads a period column and a target column into a [`TimeSeries`].
#[derive(Debug, Clone)]
pub struct SeriesLoader {
    period_column: String,
    target_column: String,
    min_observations: usize,
}

impl SeriesLoader {
    pub fn new(period_column: impl Into<String>, target_column: impl Into<String>) -> Self {
        Self {
            period_column: period_column.into(),
            target_column: target_column.into(),
            min_observations: 8,
        }
    }

    /// Columns and warning threshold taken from `config`.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(&config.period_column, &config.target_column)
            .with_min_observations(config.min_recommended_observations)
    }

    /// Below this many observations a warning is logged.
    pub fn with_min_observations(mut self, n: usize) -> Self {
        self.min_observations = n;
        self
    }

    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<LoadedSeries> {
        let file = File::open(path.as_ref())?;
        self.load_reader(BufReader::new(file))
    }

    /// Load CSV text with a header row. Other columns are ignored.
    ///
    /// Only the two used columns are decoded; a cell that is not valid UTF-8
    /// makes its row unparsable or its target missing.
    pub fn load_reader<R: Read>(&self, reader: R) -> Result<LoadedSeries> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = reader.byte_headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| std::str::from_utf8(h).map_or(false, |h| h.trim() == name))
                .ok_or_else(|| ForecastError::ColumnNotFound(name.to_string()))
        };
        let period_idx = column(&self.period_column)?;
        let target_idx = column(&self.target_column)?;

        let mut rows = Vec::new();
        for record in reader.byte_records() {
            let record = record?;
            rows.push((cell(&record, period_idx), cell(&record, target_idx)));
        }
        self.load_rows(rows)
    }

    /// Build the series from `(period label, target cell)` pairs.
    ///
    /// Rows with unparsable labels or missing targets are dropped, the rest
    /// are sorted chronologically and the first row of each period with a
    /// valid target is kept.
    pub fn load_rows<I, L, T>(&self, rows: I) -> Result<LoadedSeries>
    where
        I: IntoIterator<Item = (L, T)>,
        L: AsRef<str>,
        T: AsRef<str>,
    {
        let mut report = LoadReport::default();
        let mut parsed: Vec<(Period, usize, Option<f64>)> = Vec::new();

        for (i, (label, target)) in rows.into_iter().enumerate() {
            report.rows += 1;
            match Period::parse_label(label.as_ref()) {
                Ok(period) => parsed.push((period, i, parse_target(target.as_ref()))),
                Err(e) => {
                    debug!(row = i, error = %e, "dropping row");
                    report.unparsable_periods.push(i);
                }
            }
        }

        // Stable, so equal periods keep file order.
        parsed.sort_by_key(|(period, _, _)| *period);

        let mut periods: Vec<Period> = Vec::with_capacity(parsed.len());
        let mut values = Vec::with_capacity(parsed.len());
        let mut previous = None;
        for (period, row, value) in parsed {
            if previous == Some(period) {
                report.duplicate_periods.push(period);
            }
            previous = Some(period);
            let Some(value) = value else {
                report.missing_targets.push(row);
                continue;
            };
            if periods.last() == Some(&period) {
                continue;
            }
            periods.push(period);
            values.push(value);
        }
        report.missing_targets.sort_unstable();
        report.kept = values.len();

        if !report.unparsable_periods.is_empty() {
            warn!(
                count = report.unparsable_periods.len(),
                "dropped rows with unparsable period labels"
            );
        }
        if !report.missing_targets.is_empty() {
            warn!(
                count = report.missing_targets.len(),
                column = %self.target_column,
                "dropped rows with missing target values"
            );
        }
        if !report.duplicate_periods.is_empty() {
            warn!(count = report.duplicate_periods.len(), "dropped duplicate periods");
        }
        if report.kept < self.min_observations {
            warn!(
                observations = report.kept,
                recommended = self.min_observations,
                "few valid observations; continuing anyway"
            );
        }

        let series = TimeSeries::new(periods, values)?.with_name(self.target_column.clone());
        Ok(LoadedSeries { series, report })
    }
}

fn cell(record: &csv::ByteRecord, idx: usize) -> String {
    record
        .get(idx)
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_default()
}

/// Numeric target value; anything else is missing.
fn parse_target(cell: &str) -> Option<f64> {
    let value: f64 = cell.trim().parse().ok()?;
    value.is_finite().then_some(value)
}
