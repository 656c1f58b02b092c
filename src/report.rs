//! Per-line outcomes of a patch pass.

use std::fmt;

use serde::Serialize;

use crate::error::Rejection;

/// Result of one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Stored at this canonical path.
    Applied { path: String },
    /// Not stored. `resolved` is the canonical prefix walked before the
    /// failure (the full path for coercion failures).
    Rejected { resolved: String, reason: Rejection },
}

/// One entry of the report, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    /// 1-based line number in the patch source.
    pub line: usize,
    /// The path as written on the line.
    pub path: String,
    pub status: Status,
}

impl PatchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self.status, Status::Applied { .. })
    }

    pub fn reason(&self) -> Option<&Rejection> {
        match &self.status {
            Status::Applied { .. } => None,
            Status::Rejected { reason, .. } => Some(reason),
        }
    }

    fn row(&self) -> ReportRow<'_> {
        match &self.status {
            Status::Applied { path } => ReportRow {
                line: self.line,
                path: &self.path,
                status: "applied",
                detail: format!("set {path}"),
                kind: None,
            },
            Status::Rejected { resolved, reason } => ReportRow {
                line: self.line,
                path: &self.path,
                status: "rejected",
                detail: if resolved.is_empty() {
                    reason.to_string()
                } else {
                    format!("{reason} (resolved '{resolved}')")
                },
                kind: Some(reason.kind()),
            },
        }
    }
}

impl fmt::Display for PatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let row = self.row();
        write!(
            f,
            "line {}: {} {}: {}",
            row.line, row.path, row.status, row.detail
        )
    }
}

/// The `(path, status, detail)` triple, as rendered to JSON.
#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    line: usize,
    path: &'a str,
    status: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

/// Every outcome of one pass, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchReport {
    outcomes: Vec<PatchOutcome>,
}

impl PatchReport {
    pub fn push(&mut self, outcome: PatchOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[PatchOutcome] {
        &self.outcomes
    }

    pub fn applied(&self) -> impl Iterator<Item = &PatchOutcome> {
        self.outcomes.iter().filter(|o| o.is_applied())
    }

    pub fn rejected(&self) -> impl Iterator<Item = &PatchOutcome> {
        self.outcomes.iter().filter(|o| !o.is_applied())
    }

    /// Canonical paths of applied lines, first occurrence order, no repeats.
    pub fn applied_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = Vec::new();
        for outcome in &self.outcomes {
            if let Status::Applied { path } = &outcome.status
                && !paths.contains(&path.as_str())
            {
                paths.push(path);
            }
        }
        paths
    }

    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(PatchOutcome::is_applied)
    }

    /// Render as text, one outcome per line, with a summary line at the end.
    pub fn render_text(&self, only_rejected: bool) -> String {
        let mut out = String::new();
        for outcome in &self.outcomes {
            if only_rejected && outcome.is_applied() {
                continue;
            }
            out.push_str(&outcome.to_string());
            out.push('\n');
        }
        out.push_str(&format!(
            "{} applied, {} rejected",
            self.applied().count(),
            self.rejected().count()
        ));
        out
    }

    /// Render as a JSON array of `{line, path, status, detail}` objects.
    pub fn render_json(&self, only_rejected: bool) -> Result<String, serde_json::Error> {
        let rows: Vec<ReportRow<'_>> = self
            .outcomes
            .iter()
            .filter(|o| !only_rejected || !o.is_applied())
            .map(PatchOutcome::row)
            .collect();
        serde_json::to_string_pretty(&rows)
    }
}

impl fmt::Display for PatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render_text(false))
    }
}
