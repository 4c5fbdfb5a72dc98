//! Boot issue report
//!
//! Every problem found while booting is recorded as an [`Issue`]. The boot
//! itself never fails because of an issue; callers decide what to surface.

use std::collections::BTreeMap;
use std::fmt;

use flow_catalog::SessionId;
use serde::Serialize;

/// How serious an issue is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    InvalidId,
    DuplicateExtension,
    PreActivation,
    ErroneousExtension,
    AbandonedTask,
    ErroneousNode,
    ErroneousDataType,
    ErroneousParameterType,
    UnsatisfiedDependency,
    MissingSite,
    ErroneousPostprocess,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InvalidId => "invalid id",
            Self::DuplicateExtension => "duplicate extension",
            Self::PreActivation => "pre-activation",
            Self::ErroneousExtension => "erroneous extension",
            Self::AbandonedTask => "abandoned task",
            Self::ErroneousNode => "erroneous node type",
            Self::ErroneousDataType => "erroneous data type",
            Self::ErroneousParameterType => "erroneous parameter type",
            Self::UnsatisfiedDependency => "unsatisfied dependency",
            Self::MissingSite => "missing site",
            Self::ErroneousPostprocess => "erroneous postprocess",
        };
        f.write_str(label)
    }
}

/// A single reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub kind: IssueKind,
    /// Id of the extension, catalog entry or site concerned.
    pub subject: String,
    pub title: String,
    pub explanation: String,
    pub fix: String,
}

impl Issue {
    pub fn new(
        kind: IssueKind,
        severity: Severity,
        subject: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind,
            subject: subject.into(),
            title: title.into(),
            explanation: String::new(),
            fix: String::new(),
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.fix = fix.into();
        self
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} '{}': {}", self.severity, self.kind, self.subject, self.title)?;
        if !self.explanation.is_empty() {
            write!(f, " ({})", self.explanation)?;
        }
        Ok(())
    }
}

/// All issues of one boot, in the order they were found.
#[derive(Debug, Clone, Serialize)]
pub struct BootReport {
    session: SessionId,
    issues: Vec<Issue>,
}

impl BootReport {
    pub fn new(session: SessionId) -> Self {
        Self {
            session,
            issues: Vec::new(),
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn push(&mut self, issue: Issue) {
        match issue.severity {
            Severity::Error => tracing::error!(subject = %issue.subject, "{}", issue),
            Severity::Warning => tracing::warn!(subject = %issue.subject, "{}", issue),
            Severity::Info => tracing::info!(subject = %issue.subject, "{}", issue),
        }
        self.issues.push(issue);
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn of_kind(&self, kind: IssueKind) -> Vec<&Issue> {
        self.issues.iter().filter(|issue| issue.kind == kind).collect()
    }

    pub fn for_subject(&self, subject: &str) -> Vec<&Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.subject == subject)
            .collect()
    }

    pub fn by_kind(&self) -> BTreeMap<IssueKind, Vec<&Issue>> {
        let mut grouped: BTreeMap<IssueKind, Vec<&Issue>> = BTreeMap::new();
        for issue in &self.issues {
            grouped.entry(issue.kind).or_default().push(issue);
        }
        grouped
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }
}
