use anyhow::{Context, Result};
use std::io::{BufWriter, Write};
use std::path::Path;

use nextday::core::io::{create_file, write_file};

use crate::alignment::PredictionRow;
use crate::pipeline::PipelineReport;

/// Write the pipeline report as pretty-printed JSON. The fitted model is not included.
pub fn write_json_report<P: AsRef<Path>>(path: P, report: &PipelineReport) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(report).context("serializing pipeline report")?;
    write_file(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Write aligned predictions as `date,close,target,prediction`.
pub fn write_predictions_csv<P: AsRef<Path>>(path: P, rows: &[PredictionRow]) -> Result<()> {
    let path = path.as_ref();
    let file = create_file(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "date,close,target,prediction")?;
    for row in rows {
        writeln!(out, "{},{},{},{}", row.date, row.close, row.target, row.prediction)?;
    }
    out.flush()?;
    Ok(())
}
