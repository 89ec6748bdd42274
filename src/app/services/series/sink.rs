//! Destinations for the daily indicator rows
//!
//! Every sink writes the same columns:
//! `annee,mois,jour,d<code>...,FR,source,dh_maj`. A region excluded on a
//! given day leaves its column empty.

use crate::app::models::DailyIndicator;
use crate::constants::{
    DATE_COLUMNS, GENERATED_AT_COLUMN, NATIONAL_COLUMN, REGION_COLUMN_PREFIX, SOURCE_COLUMN,
};
use crate::error::{IndicatorError, Result};
use chrono::Datelike;
use polars::prelude::{Column, DataFrame, ParquetCompression, ParquetWriter};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Receiver of a run's rows, in date order
pub trait IndicatorSink {
    /// Called once before any row, with the region codes in column order
    fn write_header(&mut self, codes: &[String]) -> Result<()>;

    fn write_row(&mut self, indicator: &DailyIndicator) -> Result<()>;

    /// Flush buffered rows; no row may follow
    fn finish(&mut self) -> Result<()>;
}

/// Column names for the given region codes
pub fn header_fields(codes: &[String]) -> Vec<String> {
    DATE_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(
            codes
                .iter()
                .map(|code| format!("{}{}", REGION_COLUMN_PREFIX, code)),
        )
        .chain([
            NATIONAL_COLUMN.to_string(),
            SOURCE_COLUMN.to_string(),
            GENERATED_AT_COLUMN.to_string(),
        ])
        .collect()
}

/// Text fields of one row, aligned with [`header_fields`]
pub fn row_fields(indicator: &DailyIndicator, codes: &[String], generated_at: &str) -> Vec<String> {
    let date = indicator.date;
    [
        date.year().to_string(),
        date.month().to_string(),
        date.day().to_string(),
    ]
    .into_iter()
    .chain(codes.iter().map(|code| {
        indicator
            .get(code)
            .map(|v| v.to_string())
            .unwrap_or_default()
    }))
    .chain([
        indicator.national_mean.to_string(),
        indicator.source.tag().to_string(),
        generated_at.to_string(),
    ])
    .collect()
}

// =============================================================================
// CSV
// =============================================================================

/// Comma-separated output, one line per day
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    codes: Vec<String>,
    generated_at: String,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W, generated_at: impl Into<String>) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
            codes: Vec::new(),
            generated_at: generated_at.into(),
        }
    }

    /// Recover the underlying writer, flushing pending output
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| IndicatorError::output(format!("Failed to flush CSV output: {}", e)))
    }
}

impl CsvSink<io::Stdout> {
    pub fn stdout(generated_at: impl Into<String>) -> Self {
        Self::new(io::stdout(), generated_at)
    }
}

impl CsvSink<File> {
    pub fn create(path: &Path, generated_at: impl Into<String>) -> Result<Self> {
        let file = File::create(path)
            .map_err(|e| IndicatorError::io(format!("Failed to create {}", path.display()), e))?;
        info!("Writing CSV to {}", path.display());
        Ok(Self::new(file, generated_at))
    }
}

impl<W: Write> IndicatorSink for CsvSink<W> {
    fn write_header(&mut self, codes: &[String]) -> Result<()> {
        self.codes = codes.to_vec();
        self.writer.write_record(header_fields(codes))?;
        Ok(())
    }

    fn write_row(&mut self, indicator: &DailyIndicator) -> Result<()> {
        self.writer
            .write_record(row_fields(indicator, &self.codes, &self.generated_at))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

// =============================================================================
// Parquet
// =============================================================================

/// Buffers every row and writes a single Parquet file on [`IndicatorSink::finish`]
pub struct ParquetSink {
    path: PathBuf,
    codes: Vec<String>,
    rows: Vec<DailyIndicator>,
    generated_at: String,
}

impl ParquetSink {
    pub fn new(path: impl Into<PathBuf>, generated_at: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            codes: Vec::new(),
            rows: Vec::new(),
            generated_at: generated_at.into(),
        }
    }

    /// Rows buffered so far as a data frame
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = vec![
            Column::new(
                DATE_COLUMNS[0].into(),
                self.rows.iter().map(|r| r.date.year()).collect::<Vec<i32>>(),
            ),
            Column::new(
                DATE_COLUMNS[1].into(),
                self.rows.iter().map(|r| r.date.month()).collect::<Vec<u32>>(),
            ),
            Column::new(
                DATE_COLUMNS[2].into(),
                self.rows.iter().map(|r| r.date.day()).collect::<Vec<u32>>(),
            ),
        ];

        for code in &self.codes {
            let values: Vec<Option<i64>> = self.rows.iter().map(|r| r.get(code)).collect();
            columns.push(Column::new(
                format!("{}{}", REGION_COLUMN_PREFIX, code).into(),
                values,
            ));
        }

        columns.push(Column::new(
            NATIONAL_COLUMN.into(),
            self.rows.iter().map(|r| r.national_mean).collect::<Vec<f64>>(),
        ));
        columns.push(Column::new(
            SOURCE_COLUMN.into(),
            self.rows
                .iter()
                .map(|r| r.source.tag())
                .collect::<Vec<&str>>(),
        ));
        columns.push(Column::new(
            GENERATED_AT_COLUMN.into(),
            vec![self.generated_at.as_str(); self.rows.len()],
        ));

        Ok(DataFrame::new(columns)?)
    }
}

impl IndicatorSink for ParquetSink {
    fn write_header(&mut self, codes: &[String]) -> Result<()> {
        self.codes = codes.to_vec();
        Ok(())
    }

    fn write_row(&mut self, indicator: &DailyIndicator) -> Result<()> {
        self.rows.push(indicator.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let mut df = self.to_dataframe()?;
        let file = File::create(&self.path).map_err(|e| {
            IndicatorError::io(format!("Failed to create {}", self.path.display()), e)
        })?;

        ParquetWriter::new(file)
            .with_compression(ParquetCompression::Snappy)
            .finish(&mut df)?;

        info!(
            "Wrote {} rows to {}",
            self.rows.len(),
            self.path.display()
        );
        Ok(())
    }
}

// =============================================================================
// Memory
// =============================================================================

/// Keeps rows in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub codes: Vec<String>,
    pub rows: Vec<DailyIndicator>,
    pub finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dates(&self) -> Vec<chrono::NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }
}

impl IndicatorSink for MemorySink {
    fn write_header(&mut self, codes: &[String]) -> Result<()> {
        self.codes = codes.to_vec();
        Ok(())
    }

    fn write_row(&mut self, indicator: &DailyIndicator) -> Result<()> {
        if self.finished {
            return Err(IndicatorError::output("row written after finish"));
        }
        debug!("Buffered row for {}", indicator.date);
        self.rows.push(indicator.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
