//! Admission policy: turns a [`Verdict`] plus the configured permissions into
//! an allow or deny decision.

use crate::tools::classifier::{CompatibilityWarning, LeadingCommand, Verdict};
use clap::ValueEnum;
use std::fmt;

/// How compatibility warnings affect admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CompatibilityPolicy {
    /// Annotate the result and run the query anyway
    #[default]
    Warn,
    /// Refuse queries that use unsupported constructs
    Deny,
}

/// Per-category write permissions and the compatibility policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessPolicy {
    pub allow_insert: bool,
    pub allow_update: bool,
    pub allow_delete: bool,
    pub compatibility: CompatibilityPolicy,
}

impl AccessPolicy {
    /// Reads only, warnings never block.
    pub fn read_only() -> Self {
        Self::default()
    }

    /// Everything the write flags can enable.
    pub fn all_writes() -> Self {
        Self {
            allow_insert: true,
            allow_update: true,
            allow_delete: true,
            compatibility: CompatibilityPolicy::Warn,
        }
    }

    /// Flag and setting name governing a conditionally-writable command.
    fn write_flag(&self, command: &LeadingCommand) -> Option<(bool, &'static str)> {
        match command {
            LeadingCommand::Insert => Some((self.allow_insert, "MYSQL_ALLOW_INSERT")),
            LeadingCommand::Update => Some((self.allow_update, "MYSQL_ALLOW_UPDATE")),
            LeadingCommand::Delete => Some((self.allow_delete, "MYSQL_ALLOW_DELETE")),
            _ => None,
        }
    }

    /// Write categories currently enabled, for server instructions.
    pub fn enabled_writes(&self) -> Vec<&'static str> {
        [
            (self.allow_insert, "INSERT"),
            (self.allow_update, "UPDATE"),
            (self.allow_delete, "DELETE"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect()
    }
}

/// Why a query was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    EmptyQuery,
    MultipleStatements,
    DisallowedKeyword { keyword: String },
    UnapprovedCommand { command: String },
    WriteNotPermitted {
        command: String,
        setting: &'static str,
    },
    IncompatibleFeature { feature: String },
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyQuery => write!(f, "query is empty"),
            Self::MultipleStatements => write!(
                f,
                "multiple statements are not allowed; submit one statement per call"
            ),
            Self::DisallowedKeyword { keyword } => {
                write!(f, "query contains disallowed keyword {keyword}")
            }
            Self::UnapprovedCommand { command } => write!(
                f,
                "command {command} is not approved; only SELECT, SHOW, DESCRIBE, EXPLAIN and enabled writes may run"
            ),
            Self::WriteNotPermitted { command, setting } => {
                write!(f, "{command} is disabled; set {setting}=true to enable it")
            }
            Self::IncompatibleFeature { feature } => write!(
                f,
                "{feature} is not supported by the target server and the compatibility policy is deny"
            ),
        }
    }
}

/// Outcome of admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Run the query. Warnings are informational.
    Allow { warnings: Vec<CompatibilityWarning> },
    Deny(DenialReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow { .. })
    }

    pub fn reason(&self) -> Option<&DenialReason> {
        match self {
            Self::Deny(reason) => Some(reason),
            Self::Allow { .. } => None,
        }
    }
}

/// Decide whether a classified query may run.
///
/// Checks run in a fixed order and the first failure is reported: empty text,
/// multiple statements, disallowed keywords, then the leading command. Write
/// flags only ever open their own command, so enabling one can never admit a
/// query that fails any other check.
pub fn decide(verdict: &Verdict, policy: &AccessPolicy) -> Decision {
    if verdict.command == LeadingCommand::Empty {
        return Decision::Deny(DenialReason::EmptyQuery);
    }
    if verdict.multiple_statements {
        return Decision::Deny(DenialReason::MultipleStatements);
    }
    if let Some(keyword) = verdict.disallowed_keywords.first() {
        return Decision::Deny(DenialReason::DisallowedKeyword {
            keyword: keyword.clone(),
        });
    }

    if !verdict.command.is_read() {
        match policy.write_flag(&verdict.command) {
            Some((true, _)) => {}
            Some((false, setting)) => {
                return Decision::Deny(DenialReason::WriteNotPermitted {
                    command: verdict.command.to_string(),
                    setting,
                });
            }
            None => {
                return Decision::Deny(DenialReason::UnapprovedCommand {
                    command: verdict.command.to_string(),
                });
            }
        }
    }

    if policy.compatibility == CompatibilityPolicy::Deny {
        if let Some(warning) = verdict.compatibility_warnings.first() {
            return Decision::Deny(DenialReason::IncompatibleFeature {
                feature: warning.feature.as_str().to_string(),
            });
        }
    }

    Decision::Allow {
        warnings: verdict.compatibility_warnings.clone(),
    }
}
