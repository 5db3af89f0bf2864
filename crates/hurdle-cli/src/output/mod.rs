pub mod analysis;
pub mod json;
pub mod table;

pub use analysis::AnalysisCollector;
pub use json::*;
pub use table::{metric_rows, write_metrics_csv, MetricRow};

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::errors::Result;

/// Files written for one session
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub json: PathBuf,
    pub csv: PathBuf,
}

/// Write `<session>_analysis.json` and `<session>_analysis.csv` into `dir`
pub fn write_outputs<P: AsRef<Path>>(output: &ProcessingOutput, dir: P) -> Result<OutputPaths> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let stem = format!("{}_analysis", output.metadata.session_name);
    let paths = OutputPaths {
        json: dir.join(format!("{stem}.json")),
        csv: dir.join(format!("{stem}.csv")),
    };

    serde_json::to_writer_pretty(BufWriter::new(File::create(&paths.json)?), output)?;
    write_metrics_csv(BufWriter::new(File::create(&paths.csv)?), output)?;

    log::info!(
        "Wrote {} and {}",
        paths.json.display(),
        paths.csv.display()
    );
    Ok(paths)
}
