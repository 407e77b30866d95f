use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::model::config::SweepConfig;
use crate::model::mode::Mode;
use crate::model::wrappers;
use crate::msg::Msg;
use crate::plugin::consistency::{ConsistencyChecker, ProblemCounts};
use crate::plugin::manifest::PackageManifest;

/// Run-level state. Strictly linear: `Start → Preflight → Aborted | Scanning → Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Start,
    Preflight,
    Aborted,
    Scanning,
    Done,
}

#[derive(Debug, Clone, Default)]
pub struct RemoveOptions {
    pub mode: Mode,
    /// Restrict the scan to these wrapper directory names. Empty means all.
    pub only: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Aborted { problems: usize },
    Done { modified: usize },
}

pub struct App<W: Write> {
    repo_root: PathBuf,
    config: SweepConfig,
    checker: Box<dyn ConsistencyChecker>,
    out: W,
    phase: Phase,
}

impl<W: Write> App<W> {
    pub fn new(
        repo_root: PathBuf,
        config: SweepConfig,
        checker: Box<dyn ConsistencyChecker>,
        out: W,
    ) -> Self {
        Self {
            repo_root,
            config,
            checker,
            out,
            phase: Phase::Start,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }

    /// Gate keyword removal on the consistency checker, then strip reserved keywords.
    pub fn run(&mut self, options: &RemoveOptions) -> Result<Outcome> {
        tracing::info!(
            "keyword sweep starting in {} mode at {}",
            options.mode.label(),
            self.repo_root.display()
        );

        let problems = self.preflight()?;
        if problems > 0 {
            self.phase = Phase::Aborted;
            tracing::warn!("aborting: {problems} package(s) failed the pre-flight check");
            return Ok(Outcome::Aborted { problems });
        }

        self.phase = Phase::Scanning;
        let modified = self.remove_keywords(options)?;
        self.emit(Msg::Finished {
            mode: options.mode,
            modified,
            catalog_dir: self.config.layout.catalog_dir.clone(),
        })?;

        self.phase = Phase::Done;
        tracing::info!("keyword sweep finished, {modified} manifest(s) affected");
        Ok(Outcome::Done { modified })
    }

    /// Returns the number of blocking problems. A checker that cannot run counts as one.
    pub fn preflight(&mut self) -> Result<usize> {
        self.phase = Phase::Preflight;

        match self.checker.check(&self.repo_root) {
            Ok(results) => {
                let counts = ProblemCounts::tally(&results);
                if counts.problems() > 0 {
                    self.emit(Msg::PreflightFailed(counts))?;
                } else {
                    self.emit(Msg::PreflightPassed)?;
                }
                Ok(counts.problems())
            }
            Err(err) => {
                tracing::error!("consistency checker failed: {err:#}");
                self.emit(Msg::CheckerUnavailable(format!("{err:#}")))?;
                Ok(1)
            }
        }
    }

    /// Strip reserved keywords from every wrapper manifest; returns the files
    /// modified (or, in preview, that would be).
    pub fn remove_keywords(&mut self, options: &RemoveOptions) -> Result<usize> {
        let mut wrappers = wrappers::discover(
            &self.config.wrappers_path(&self.repo_root),
            &self.config.layout.manifest_file,
        )
        .context("failed to list wrapper packages")?;

        for name in wrappers::retain_named(&mut wrappers, &options.only) {
            self.emit(Msg::UnknownWrapper(name))?;
        }

        let prefixes = self.config.reserved_prefixes();
        let mut modified = 0;

        for wrapper in wrappers {
            let shown = self.display_path(&wrapper.manifest_path);

            let mut manifest = match PackageManifest::load(&wrapper.manifest_path) {
                Ok(manifest) => manifest,
                Err(err) => {
                    tracing::warn!("skipping {}: {err}", shown.display());
                    self.emit(Msg::ManifestSkipped {
                        path: shown,
                        reason: err.to_string(),
                    })?;
                    continue;
                }
            };

            let split = prefixes.partition(manifest.keywords());
            if !split.has_removals() {
                tracing::debug!("{}: nothing to remove", wrapper.name);
                continue;
            }

            self.emit(Msg::KeywordsStripped {
                path: shown,
                removed: split.removed.clone(),
                kept: split.kept.clone(),
            })?;

            if options.mode.writes() {
                manifest.set_keywords(split.kept);
                manifest.save()?;
                tracing::info!("rewrote {}", wrapper.manifest_path.display());
            }
            modified += 1;
        }

        Ok(modified)
    }

    /// Print every verdict and the totals; never writes to the repository.
    ///
    /// Returns the number of blocking problems, one when the checker cannot run.
    pub fn check(&mut self) -> Result<usize> {
        let results = match self.checker.check(&self.repo_root) {
            Ok(results) => results,
            Err(err) => {
                tracing::error!("consistency checker failed: {err:#}");
                self.emit(Msg::CheckerUnavailable(format!("{err:#}")))?;
                return Ok(1);
            }
        };

        for result in &results {
            self.emit(Msg::Verdict(result.clone()))?;
        }

        let counts = ProblemCounts::tally(&results);
        self.emit(Msg::CheckSummary(counts))?;
        Ok(counts.problems())
    }

    fn emit(&mut self, msg: Msg) -> Result<()> {
        writeln!(self.out, "{msg}")?;
        Ok(())
    }

    fn display_path(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.repo_root)
            .unwrap_or(path)
            .to_path_buf()
    }
}
