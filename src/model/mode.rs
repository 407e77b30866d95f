/// Whether a run writes manifests back or only reports what it would change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Report only. Nothing is written.
    #[default]
    Preview,
    /// Rewrite manifests in place.
    Apply,
}

impl Mode {
    /// `--yes` opts into writing; `--dry-run` always wins.
    pub fn from_flags(yes: bool, dry_run: bool) -> Self {
        if yes && !dry_run {
            Mode::Apply
        } else {
            Mode::Preview
        }
    }

    pub fn writes(self) -> bool {
        matches!(self, Mode::Apply)
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Preview => "PREVIEW",
            Mode::Apply => "APPLY",
        }
    }
}
