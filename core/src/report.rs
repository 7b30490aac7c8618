//! Serializes sweep series for an external renderer.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::SweepSeries;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub generated_at: String,
    pub series: Vec<SweepSeries>,
}

impl SweepReport {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            generated_at: timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            series: Vec::new(),
        }
    }

    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    pub fn push(&mut self, series: SweepSeries) {
        self.series.push(series);
    }

    /// Plain-text table, one row per label and level.
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<12} {:>11} {:>20} {:>14}",
            "label", "concurrency", "throughput (ops/s)", "latency (s)"
        );
        for series in &self.series {
            for (throughput, latency) in series.throughput.iter().zip(&series.latency) {
                let _ = writeln!(
                    out,
                    "{:<12} {:>11} {:>20.2} {:>14.6}",
                    series.label, throughput.concurrency, throughput.value, latency.value
                );
            }
        }
        out
    }

    /// Writes `latest.json` and `latest.csv` into `output_dir`, creating it if needed.
    pub fn write_to_dir(&self, output_dir: &Path) -> Result<(PathBuf, PathBuf)> {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir)
                .with_context(|| format!("create output directory {}", output_dir.display()))?;
        }
        let json_path = output_dir.join("latest.json");
        let csv_path = output_dir.join("latest.csv");
        write_json(&json_path, self)?;
        write_csv(&csv_path, &self.series)?;
        Ok((json_path, csv_path))
    }
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path).with_context(|| format!("create {}", path.display()))?);
    serde_json::to_writer_pretty(&mut writer, value).with_context(|| format!("write {}", path.display()))?;
    writer.flush().with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

/// Quotes a free-text CSV field when it holds a separator, a quote or a line break.
fn csv_field(raw: &str) -> Cow<'_, str> {
    if raw.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", raw.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(raw)
    }
}

pub fn write_csv(path: &Path, series: &[SweepSeries]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path).with_context(|| format!("create {}", path.display()))?);
    writeln!(writer, "label,concurrency,throughput,latency")?;
    for entry in series {
        for (throughput, latency) in entry.throughput.iter().zip(&entry.latency) {
            writeln!(
                writer,
                "{},{},{:.6},{:.9}",
                csv_field(&entry.label),
                throughput.concurrency, throughput.value, latency.value
            )?;
        }
    }
    writer.flush()?;
    Ok(())
}
