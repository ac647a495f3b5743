// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments and their merge with the JSON configuration file.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use lesewerk_core::config::PipelineConfig;
use lesewerk_core::error::Result;
use lesewerk_pipeline::OutputSink;

/// Recognition backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Engine {
    /// The `tesseract` executable on PATH
    Tesseract,
    /// Built-in neural OCR (Latin script only)
    Ocrs,
}

/// Extract the text of a scanned PDF, one page per worker.
#[derive(Parser, Debug)]
#[command(name = "lesewerk", author, version, about)]
pub struct Cli {
    /// Scanned PDF to read
    pub document: PathBuf,

    /// Output file, or `-` for standard output [default: <document stem>.txt]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<String>,

    /// Rendering resolution in dots per inch [default: 300]
    #[arg(short = 'd', long = "dpi", value_parser = positive_dpi)]
    pub dpi: Option<f32>,

    /// Recognition language, e.g. `eng` or `deu+eng` [default: eng]
    #[arg(short = 'l', long = "lang")]
    pub language: Option<String>,

    /// Number of pages processed in parallel [default: cores - 1]
    #[arg(short = 'b', long = "workers", alias = "batch-size", value_parser = positive_count)]
    pub workers: Option<usize>,

    /// Give up on a page after this many seconds
    #[arg(long = "timeout", value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Recognition backend
    #[arg(long, value_enum, default_value_t = Engine::Tesseract)]
    pub engine: Engine,

    /// Directory holding the ocrs detection and recognition models
    #[arg(long, value_name = "DIR")]
    pub model_dir: Option<PathBuf>,

    /// JSON configuration file; flags given on the command line take precedence
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only print warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print debug output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// The configuration file (or defaults) with command-line overrides applied.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(dpi) = self.dpi {
            config.resolution_dpi = dpi;
        }
        if let Some(language) = &self.language {
            config.language = language.clone();
        }
        if let Some(workers) = self.workers {
            config.worker_count = Some(workers);
        }
        if let Some(timeout) = self.timeout {
            config.page_timeout_secs = Some(timeout);
        }
        config.validate()?;
        Ok(config)
    }

    /// Where the extracted text goes.
    pub fn sink(&self) -> OutputSink {
        match &self.output {
            Some(arg) => OutputSink::from_arg(arg),
            None => OutputSink::beside_cwd(&self.document),
        }
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

fn positive_dpi(raw: &str) -> std::result::Result<f32, String> {
    let dpi: f32 = raw.parse().map_err(|_| format!("`{raw}` is not a number"))?;
    if dpi.is_finite() && dpi > 0.0 {
        Ok(dpi)
    } else {
        Err(format!("resolution must be positive, got {raw}"))
    }
}

fn positive_count(raw: &str) -> std::result::Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("at least one worker is required".to_string()),
        Ok(count) => Ok(count),
        Err(_) => Err(format!("`{raw}` is not a whole number")),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use clap::error::ErrorKind;
    use lesewerk_core::error::LesewerkError;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("lesewerk").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_pipeline_defaults() {
        let cli = parse(&["scan.pdf"]);
        let config = cli.pipeline_config().unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(cli.engine, Engine::Tesseract);
        assert_eq!(cli.log_level(), "info");
        assert_eq!(cli.sink(), OutputSink::File(PathBuf::from("scan.txt")));
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&[
            "in/book.pdf", "-d", "150", "-l", "deu+eng", "-b", "3", "--timeout", "30", "-o", "-",
        ]);
        let config = cli.pipeline_config().unwrap();
        assert_eq!(config.resolution_dpi, 150.0);
        assert_eq!(config.language, "deu+eng");
        assert_eq!(config.worker_count, Some(3));
        assert_eq!(config.page_timeout_secs, Some(30));
        assert_eq!(cli.sink(), OutputSink::Stdout);
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lesewerk.json");
        std::fs::write(&path, r#"{"resolution_dpi": 200.0, "language": "fra", "worker_count": 6}"#)
            .unwrap();

        let cli = parse(&["scan.pdf", "--config", path.to_str().unwrap(), "-l", "eng"]);
        let config = cli.pipeline_config().unwrap();
        assert_eq!(config.resolution_dpi, 200.0);
        assert_eq!(config.language, "eng");
        assert_eq!(config.worker_count, Some(6));
    }

    #[test]
    fn invalid_config_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"worker_count": 0}"#).unwrap();

        let cli = parse(&["scan.pdf", "--config", path.to_str().unwrap()]);
        assert!(matches!(
            cli.pipeline_config(),
            Err(LesewerkError::InvalidConfig(_))
        ));
    }

    #[test]
    fn absurd_resolution_is_invalid_config() {
        let cli = parse(&["scan.pdf", "-d", "100000"]);
        assert!(matches!(
            cli.pipeline_config(),
            Err(LesewerkError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_bad_numbers_at_parse_time() {
        for args in [
            vec!["lesewerk", "scan.pdf", "-d", "0"],
            vec!["lesewerk", "scan.pdf", "-d", "lots"],
            vec!["lesewerk", "scan.pdf", "-b", "0"],
            vec!["lesewerk", "scan.pdf", "--timeout", "0"],
        ] {
            let err = Cli::try_parse_from(args.iter().copied()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValueValidation, "{args:?}");
        }
    }

    #[test]
    fn batch_size_alias_and_engine_choice() {
        let cli = parse(&["scan.pdf", "--batch-size", "2", "--engine", "ocrs", "-q"]);
        assert_eq!(cli.workers, Some(2));
        assert_eq!(cli.engine, Engine::Ocrs);
        assert_eq!(cli.log_level(), "warn");
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        let err = Cli::try_parse_from(["lesewerk", "scan.pdf", "-q", "-v"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn document_is_required() {
        let err = Cli::try_parse_from(["lesewerk"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn default_output_drops_directories() {
        let cli = parse(&["/archive/2024/minutes.pdf"]);
        assert_eq!(
            cli.sink(),
            OutputSink::beside_cwd(Path::new("minutes.pdf"))
        );
    }
}
