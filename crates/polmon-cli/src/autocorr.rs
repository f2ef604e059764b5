//! `polmon autocorr`: offline SOP autocorrelation of coarse or transient logs.
//!
//! Each file is analyzed on its own. A file that cannot be read or is too
//! short is reported and skipped; the command fails only when no file
//! produced a curve.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use polmon_session::logs::{read_vectors, LogKind};
use polmon_signal::{autocorrelate, AutocorrelationCurve};

/// Arguments for the autocorr command
#[derive(Args, Debug)]
pub struct AutocorrArgs {
    /// Log files to analyze
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Kind of log the files are
    #[arg(short, long, value_enum, default_value = "transient")]
    pub kind: LogKindArg,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Also write one `<stem>_autocorr.csv` per curve into this directory
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

/// Log kind argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogKindArg {
    Coarse,
    Transient,
}

impl From<LogKindArg> for LogKind {
    fn from(val: LogKindArg) -> Self {
        match val {
            LogKindArg::Coarse => LogKind::Coarse,
            LogKindArg::Transient => LogKind::Transient,
        }
    }
}

/// Output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty table output
    #[default]
    Table,
    /// JSON output
    Json,
    /// Comma-separated `file,lag,mean_inner_product`
    Csv,
}

/// Result of analyzing one file.
#[derive(Debug, Serialize)]
pub struct FileResult {
    pub file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vectors: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curve: Option<AutocorrelationCurve>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One `--format csv` row.
#[derive(Serialize)]
struct CurveRow<'a> {
    file: &'a Path,
    lag: usize,
    mean_inner_product: f64,
}

#[derive(Tabled)]
struct LagRow {
    #[tabled(rename = "Lag")]
    lag: usize,
    #[tabled(rename = "Mean inner product")]
    value: String,
}

/// Analyze one file.
pub fn analyze_file(path: &Path, kind: LogKind) -> FileResult {
    let mut result = FileResult {
        file: path.to_path_buf(),
        vectors: None,
        curve: None,
        error: None,
    };
    match read_vectors(path, kind) {
        Ok(vectors) => {
            result.vectors = Some(vectors.len());
            match autocorrelate(&vectors) {
                Ok(curve) => result.curve = Some(curve),
                Err(e) => result.error = Some(e.to_string()),
            }
        }
        Err(e) => result.error = Some(e.to_string()),
    }
    result
}

/// Write `lag,mean_inner_product` followed by one row per lag to `path`.
pub fn write_curve_csv(path: &Path, curve: &AutocorrelationCurve) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for point in &curve.points {
        wtr.serialize(point)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write every curve as `file,lag,mean_inner_product` rows.
fn write_results_csv<W: io::Write>(out: W, results: &[FileResult]) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    for r in results {
        for p in r.curve.iter().flat_map(|c| &c.points) {
            wtr.serialize(CurveRow {
                file: &r.file,
                lag: p.lag,
                mean_inner_product: p.mean_inner_product,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

/// `<dir>/<stem>_autocorr.csv`
#[must_use]
pub fn curve_csv_path(dir: &Path, source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "log".to_owned());
    dir.join(format!("{stem}_autocorr.csv"))
}

/// Execute the autocorr command
pub fn execute(args: AutocorrArgs) -> Result<()> {
    let kind = LogKind::from(args.kind);
    let results: Vec<FileResult> = args
        .files
        .iter()
        .map(|path| analyze_file(path, kind))
        .collect();

    for r in &results {
        if let Some(err) = &r.error {
            tracing::warn!(file = %r.file.display(), "skipped: {err}");
        }
    }

    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        for r in &results {
            if let Some(curve) = &r.curve {
                let path = curve_csv_path(dir, &r.file);
                write_curve_csv(&path, curve)
                    .with_context(|| format!("writing {}", path.display()))?;
                tracing::info!(path = %path.display(), "curve written");
            }
        }
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Csv => write_results_csv(io::stdout().lock(), &results)?,
        OutputFormat::Table => print_tables(&results),
    }

    let produced = results.iter().filter(|r| r.curve.is_some()).count();
    if produced == 0 {
        bail!("no autocorrelation curve could be computed from {} file(s)", results.len());
    }
    Ok(())
}

fn print_tables(results: &[FileResult]) {
    for r in results {
        println!();
        match (&r.curve, &r.error) {
            (Some(curve), _) => {
                println!(
                    "{} {} ({} vectors, {} lags)",
                    "[OK]".green().bold(),
                    r.file.display(),
                    r.vectors.unwrap_or_default(),
                    curve.len()
                );
                let rows: Vec<LagRow> = curve
                    .points
                    .iter()
                    .map(|p| LagRow {
                        lag: p.lag,
                        value: format!("{:.6}", p.mean_inner_product),
                    })
                    .collect();
                println!("{}", Table::new(rows).with(Style::rounded()));
            }
            (None, Some(err)) => {
                println!("{} {}: {}", "[SKIP]".yellow().bold(), r.file.display(), err);
            }
            (None, None) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use tempfile::tempdir;

    fn transient_file(dir: &Path, name: &str, vectors: &[[f64; 3]]) -> PathBuf {
        let mut body = String::from("Power (W), Angle (deg), S1, S2, S3 \n");
        for v in vectors {
            body.push_str(&format!("0.001,0.0,{},{},{}\n", v[0], v[1], v[2]));
        }
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_analyzes_constant_transient() {
        let dir = tempdir().unwrap();
        let path = transient_file(dir.path(), "t.txt", &[[0.0, 0.0, 2.0]; 10]);
        let result = analyze_file(&path, LogKind::Transient);
        assert_eq!(result.vectors, Some(10));
        let curve = result.curve.unwrap();
        assert_eq!(curve.len(), 2);
        for v in curve.values() {
            assert_abs_diff_eq!(v, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_short_file_is_reported_not_fatal() {
        let dir = tempdir().unwrap();
        let short = transient_file(dir.path(), "short.txt", &[[1.0, 0.0, 0.0]; 4]);
        let good = transient_file(dir.path(), "good.txt", &[[1.0, 0.0, 0.0]; 5]);
        let out = dir.path().join("curves");

        execute(AutocorrArgs {
            files: vec![short.clone(), good],
            kind: LogKindArg::Transient,
            format: OutputFormat::Json,
            output_dir: Some(out.clone()),
        })
        .unwrap();

        assert!(analyze_file(&short, LogKind::Transient).error.is_some());
        let csv = std::fs::read_to_string(out.join("good_autocorr.csv")).unwrap();
        assert_eq!(csv, "lag,mean_inner_product\n1,1.0\n");
        assert!(!out.join("short_autocorr.csv").exists());
    }

    #[test]
    fn test_csv_output_reads_back_by_header() {
        let dir = tempdir().unwrap();
        let path = transient_file(dir.path(), "a, b.txt", &[[0.0, 1.0, 0.0]; 10]);
        let results = vec![analyze_file(&path, LogKind::Transient)];

        let mut out = Vec::new();
        write_results_csv(&mut out, &results).unwrap();

        let mut rdr = csv::Reader::from_reader(out.as_slice());
        assert_eq!(
            rdr.headers().unwrap(),
            vec!["file", "lag", "mean_inner_product"]
        );
        let rows: Vec<csv::StringRecord> = rdr.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], path.to_str().unwrap());
        assert_eq!(&rows[1][1], "2");
        assert_abs_diff_eq!(rows[1][2].parse::<f64>().unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fails_when_no_file_yields_a_curve() {
        let dir = tempdir().unwrap();
        let err = execute(AutocorrArgs {
            files: vec![dir.path().join("missing.txt")],
            kind: LogKindArg::Coarse,
            format: OutputFormat::Table,
            output_dir: None,
        });
        assert!(err.is_err());
    }
}
