use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

use crate::model::keywords::render_list;
use crate::model::mode::Mode;
use crate::plugin::consistency::{ConsistencyResult, ProblemCounts};

/// Everything a run reports to the operator, in the order it happens.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    // -- Preflight
    PreflightPassed,
    PreflightFailed(ProblemCounts),
    CheckerUnavailable(String),

    // -- Scan
    UnknownWrapper(String),
    ManifestSkipped {
        path: PathBuf,
        reason: String,
    },
    KeywordsStripped {
        path: PathBuf,
        removed: Vec<Value>,
        kept: Vec<Value>,
    },
    Finished {
        mode: Mode,
        modified: usize,
        catalog_dir: String,
    },

    // -- `check` command
    Verdict(ConsistencyResult),
    CheckSummary(ProblemCounts),
}

impl fmt::Display for Msg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Msg::PreflightPassed => write!(
                f,
                "✅ Pre-flight check passed: no inconsistencies or missing marketplace catalog entity files found."
            ),
            Msg::PreflightFailed(counts) => {
                writeln!(f, "\n========== ABORTING: Pre-flight check failed ==========")?;
                writeln!(f, "❌ Inconsistent packages: {}", counts.mismatch)?;
                writeln!(
                    f,
                    "⚠️ Missing marketplace catalog entity files: {}",
                    counts.no_yaml
                )?;
                writeln!(f, "Fix the above issues before removing keywords.")?;
                writeln!(f, "\nTo fix these issues:")?;
                writeln!(
                    f,
                    "1. Run the consistency checker to see details: keyword-sweep check"
                )?;
                writeln!(f, "2. Create missing YAML files or fix mismatches")?;
                write!(f, "3. Re-run this command")
            }
            Msg::CheckerUnavailable(err) => {
                write!(f, "Error: unable to run the consistency checker: {err}")
            }
            Msg::UnknownWrapper(name) => write!(f, "Skipping {name}: no such wrapper"),
            Msg::ManifestSkipped { path, reason } => write!(
                f,
                "Skipping {}: failed to parse JSON ({reason})",
                path.display()
            ),
            Msg::KeywordsStripped {
                path,
                removed,
                kept,
            } => {
                writeln!(f, "\n{}", path.display())?;
                writeln!(f, "  Removed: {}", render_list(removed))?;
                if kept.is_empty() {
                    write!(f, "  Kept:    [] (keywords will be removed entirely)")
                } else {
                    write!(f, "  Kept:    {}", render_list(kept))
                }
            }
            Msg::Finished {
                mode: Mode::Apply,
                modified,
                catalog_dir,
            } => {
                writeln!(f, "\n✅ Done. Files modified: {modified}")?;
                writeln!(f, "\n💡 Note: YAML files in {catalog_dir}/ are now")?;
                write!(
                    f,
                    "   the single source of truth for support and lifecycle metadata."
                )
            }
            Msg::Finished {
                mode: Mode::Preview,
                modified,
                ..
            } => write!(
                f,
                "\nℹ️ Dry run complete. Files that would be modified: {modified}"
            ),
            Msg::Verdict(result) => {
                write!(f, "[{}] {}", result.status, result.package)?;
                if let Some(detail) = &result.detail {
                    write!(f, " ({detail})")?;
                }
                Ok(())
            }
            Msg::CheckSummary(counts) => {
                writeln!(f, "\nConsistent packages: {}", counts.consistent)?;
                writeln!(f, "Inconsistent packages: {}", counts.mismatch)?;
                write!(
                    f,
                    "Missing marketplace catalog entity files: {}",
                    counts.no_yaml
                )
            }
        }
    }
}
