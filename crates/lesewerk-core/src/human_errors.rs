// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the command line.
//
// Every fatal error is mapped to plain English with a clear suggestion.
// Severity drives the exit message the CLI prints.

use crate::error::LesewerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The user must fix something (path, flag, missing tool) and rerun.
    ActionRequired,
    /// The input itself cannot be processed.
    Permanent,
    /// A bug in Lesewerk: worth reporting.
    Internal,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    /// Severity level.
    pub severity: Severity,
}

/// Convert a `LesewerkError` into a `HumanError`.
pub fn humanize_error(err: &LesewerkError) -> HumanError {
    match err {
        LesewerkError::DocumentOpen { path, reason } => HumanError {
            message: format!("We couldn't open {path}."),
            suggestion: format!(
                "Check that the file exists and is a readable PDF. ({reason})"
            ),
            severity: Severity::Permanent,
        },

        LesewerkError::DuplicateResult { page_index } => HumanError {
            message: format!("Page {} was read twice.", page_index + 1),
            suggestion: "This is a bug in Lesewerk. Please report it with the command you ran."
                .into(),
            severity: Severity::Internal,
        },

        LesewerkError::IncompleteResults { missing, total } => HumanError {
            message: format!("{} of {total} pages never finished.", missing.len()),
            suggestion: "This is a bug in Lesewerk. Please report it with the command you ran."
                .into(),
            severity: Severity::Internal,
        },

        LesewerkError::UnsupportedLanguage { language, engine } => HumanError {
            message: format!("The {engine} engine can't read language `{language}`."),
            suggestion: match engine.as_str() {
                "tesseract" => format!(
                    "Install the `{language}` traineddata (e.g. `tesseract-ocr-{language}`), \
                     or list installed languages with `tesseract --list-langs`."
                ),
                _ => "Pick a language the engine supports, or switch engines with --engine."
                    .into(),
            },
            severity: Severity::ActionRequired,
        },

        LesewerkError::RecognizerUnavailable(detail) => HumanError {
            message: "The text recognizer isn't available.".into(),
            suggestion: format!("Install it or choose another engine with --engine. ({detail})"),
            severity: Severity::ActionRequired,
        },

        LesewerkError::InvalidConfig(detail) => HumanError {
            message: "Some settings are invalid.".into(),
            suggestion: format!("Fix the flag or config file value and try again. ({detail})"),
            severity: Severity::ActionRequired,
        },

        LesewerkError::Cancelled => HumanError {
            message: "Extraction was cancelled.".into(),
            suggestion: "No output was written. Run the command again to restart.".into(),
            severity: Severity::ActionRequired,
        },

        LesewerkError::WorkerPool(detail) => HumanError {
            message: "The worker pool stopped unexpectedly.".into(),
            suggestion: format!("Try again with fewer workers (--workers). ({detail})"),
            severity: Severity::Internal,
        },

        LesewerkError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "A file or folder could not be found.".into(),
                suggestion: format!("Check the paths you passed. ({io_err})"),
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Lesewerk isn't allowed to write there.".into(),
                suggestion: format!("Choose another output location with -o. ({io_err})"),
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "Reading or writing a file failed.".into(),
                suggestion: format!("Check free disk space and try again. ({io_err})"),
                severity: Severity::ActionRequired,
            },
        },

        LesewerkError::Serialization(detail) => HumanError {
            message: "The config file couldn't be read.".into(),
            suggestion: format!("Make sure it is valid JSON. ({detail})"),
            severity: Severity::ActionRequired,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_document_is_permanent() {
        let err = LesewerkError::DocumentOpen {
            path: "scan.pdf".into(),
            reason: "invalid file header".into(),
        };
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Permanent);
        assert!(human.message.contains("scan.pdf"));
    }

    #[test]
    fn assembly_violations_are_internal() {
        let dup = humanize_error(&LesewerkError::DuplicateResult { page_index: 0 });
        assert_eq!(dup.severity, Severity::Internal);
        assert!(dup.message.contains("Page 1"));

        let incomplete = humanize_error(&LesewerkError::IncompleteResults {
            missing: vec![1],
            total: 3,
        });
        assert_eq!(incomplete.severity, Severity::Internal);
    }

    #[test]
    fn missing_tesseract_language_suggests_package() {
        let err = LesewerkError::UnsupportedLanguage {
            language: "deu".into(),
            engine: "tesseract".into(),
        };
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(human.suggestion.contains("tesseract-ocr-deu"));
    }

    #[test]
    fn permission_denied_points_at_output_flag() {
        let err = LesewerkError::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        let human = humanize_error(&err);
        assert!(human.suggestion.contains("-o"));
    }
}
