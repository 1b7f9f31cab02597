//! Identifier derivation.
//!
//! Turns a short command name and a naming convention into full
//! identifiers. Pure string computation; absent settings fall back to
//! the defaults below.

use serde::Deserialize;
use std::fmt;

/// Separator inserted when slash insertion is enabled.
pub const SEPARATOR: &str = "/";

/// Stage of a fetch chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Request,
    Success,
    Clear,
    Failure,
}

impl Stage {
    /// All stages, in finalization order.
    pub const ALL: [Stage; 4] = [Stage::Request, Stage::Success, Stage::Clear, Stage::Failure];

    /// Tag implicitly attached to descriptors of this stage.
    pub fn tag(&self) -> &'static str {
        match self {
            Stage::Request => "Request",
            Stage::Success => "Success",
            Stage::Clear => "Clear",
            Stage::Failure => "Failure",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Postfix labels appended to stage identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Postfixes {
    /// Appended to plain command identifiers when set.
    #[serde(default)]
    pub normal: Option<String>,

    #[serde(default = "default_request")]
    pub request: String,

    #[serde(default = "default_success")]
    pub success: String,

    #[serde(default = "default_clear")]
    pub clear: String,

    #[serde(default = "default_failure")]
    pub failure: String,
}

fn default_request() -> String {
    "Request".to_string()
}

fn default_success() -> String {
    "Success".to_string()
}

fn default_clear() -> String {
    "Clear".to_string()
}

fn default_failure() -> String {
    "Failure".to_string()
}

impl Default for Postfixes {
    fn default() -> Self {
        Self {
            normal: None,
            request: default_request(),
            success: default_success(),
            clear: default_clear(),
            failure: default_failure(),
        }
    }
}

impl Postfixes {
    /// Returns the postfix for a fetch stage.
    pub fn for_stage(&self, stage: Stage) -> &str {
        match stage {
            Stage::Request => &self.request,
            Stage::Success => &self.success,
            Stage::Clear => &self.clear,
            Stage::Failure => &self.failure,
        }
    }
}

/// Naming convention shared by every Area of one Base.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NamingConvention {
    #[serde(default)]
    pub prefix: Option<String>,

    /// Insert `/` between prefix, name and stage postfix.
    #[serde(default)]
    pub slash: bool,

    #[serde(default)]
    pub postfixes: Postfixes,
}

impl NamingConvention {
    /// Builder: set the identifier prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Builder: toggle slash insertion.
    pub fn with_slash(mut self, slash: bool) -> Self {
        self.slash = slash;
        self
    }

    /// Builder: replace the postfix labels.
    pub fn with_postfixes(mut self, postfixes: Postfixes) -> Self {
        self.postfixes = postfixes;
        self
    }

    fn separator(&self) -> &'static str {
        if self.slash {
            SEPARATOR
        } else {
            ""
        }
    }

    fn join(&self, head: &str, tail: &str) -> String {
        if head.is_empty() {
            return tail.to_string();
        }
        if tail.is_empty() {
            return head.to_string();
        }
        let sep = self.separator();
        if sep.is_empty() {
            return format!("{}{}", head, tail);
        }
        // Exactly one separator between segments.
        format!("{}{}{}", head.trim_end_matches(sep), sep, tail.trim_start_matches(sep))
    }

    /// Effective prefix once an Area segment is appended.
    pub fn scoped_prefix(&self, area_prefix: Option<&str>) -> Option<String> {
        match (self.prefix.as_deref(), area_prefix) {
            (None, None) => None,
            (Some(p), None) => Some(p.to_string()),
            (None, Some(a)) => Some(a.to_string()),
            (Some(p), Some(a)) => Some(self.join(p, a)),
        }
    }

    /// `prefix + separator? + name`, or `name` without a prefix.
    pub fn base_name(&self, prefix: Option<&str>, name: &str) -> String {
        match prefix {
            Some(p) if !p.is_empty() => self.join(p, name),
            _ => name.to_string(),
        }
    }

    /// Full identifier of a plain command.
    pub fn plain_identifier(&self, prefix: Option<&str>, name: &str) -> String {
        let base = self.base_name(prefix, name);
        match self.postfixes.normal.as_deref() {
            Some(normal) if !normal.is_empty() => self.join(&base, normal),
            _ => base,
        }
    }

    /// Full identifier of one fetch stage.
    pub fn stage_identifier(&self, prefix: Option<&str>, name: &str, stage: Stage) -> String {
        let base = self.base_name(prefix, name);
        self.join(&base, self.postfixes.for_stage(stage))
    }
}
