//! Unresolved results and batch diagnostics.

use std::fmt;

use serde::Serialize;

use super::attributes::MalformedAttribute;

/// Identifies an element in diagnostics: tag, `name`/`id` when present, and
/// 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ElementIdentity {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub line: u32,
    pub column: u32,
}

impl ElementIdentity {
    pub fn of(node: roxmltree::Node<'_, '_>) -> Self {
        let pos = node.document().text_pos_at(node.range().start);
        Self {
            tag: node.tag_name().name().to_string(),
            name: node.attribute("name").map(str::to_string),
            id: node.attribute("id").map(str::to_string),
            line: pos.row,
            column: pos.col,
        }
    }
}

impl fmt::Display for ElementIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        if let Some(id) = &self.id {
            write!(f, " id=\"{}\"", id)?;
        }
        if let Some(name) = &self.name {
            write!(f, " name=\"{}\"", name)?;
        }
        write!(f, "> at {}:{}", self.line, self.column)
    }
}

/// Why a value could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnresolvedReason {
    MissingAttribute { attribute: &'static str },
    MalformedAttribute { attribute: &'static str, value: String },
    UnresolvedReference { attribute: &'static str, id: String },
    NoFrameRate,
    OutOfRange { detail: String },
}

impl From<MalformedAttribute> for UnresolvedReason {
    fn from(value: MalformedAttribute) -> Self {
        Self::MalformedAttribute {
            attribute: value.attribute,
            value: value.value,
        }
    }
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAttribute { attribute } => write!(f, "missing {}", attribute),
            Self::MalformedAttribute { attribute, value } => {
                write!(f, "malformed {}=\"{}\"", attribute, value)
            }
            Self::UnresolvedReference { attribute, id } => {
                write!(f, "{}=\"{}\" does not resolve", attribute, id)
            }
            Self::NoFrameRate => write!(f, "no frame rate could be determined"),
            Self::OutOfRange { detail } => write!(f, "out of range: {}", detail),
        }
    }
}

/// A value that could not be resolved, naming the element responsible.
///
/// `element` is the element whose attribute was missing or malformed, which
/// may be an ancestor of the queried element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, thiserror::Error)]
#[error("{element}: {reason}")]
pub struct Unresolved {
    pub element: ElementIdentity,
    pub reason: UnresolvedReason,
}

impl Unresolved {
    pub fn new(node: roxmltree::Node<'_, '_>, reason: UnresolvedReason) -> Self {
        Self {
            element: ElementIdentity::of(node),
            reason,
        }
    }
}

/// Non-fatal problems found while reading a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticReason {
    /// A queried element's time could not be resolved.
    Unresolved {
        /// Element responsible for the failure.
        source: ElementIdentity,
        reason: UnresolvedReason,
    },
    UnknownResource,
    MissingResourceId,
    DuplicateResourceId { id: String },
    MalformedRole { attribute: &'static str, value: String },
}

impl fmt::Display for DiagnosticReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolved { source, reason } => write!(f, "unresolved ({}: {})", source, reason),
            Self::UnknownResource => write!(f, "unknown resource kind skipped"),
            Self::MissingResourceId => write!(f, "resource without id skipped"),
            Self::DuplicateResourceId { id } => write!(f, "duplicate resource id '{}'", id),
            Self::MalformedRole { attribute, value } => {
                write!(f, "malformed {}=\"{}\"", attribute, value)
            }
        }
    }
}

/// One (element, reason) entry of a batch pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    pub element: ElementIdentity,
    pub reason: DiagnosticReason,
}

impl Diagnostic {
    pub fn new(node: roxmltree::Node<'_, '_>, reason: DiagnosticReason) -> Self {
        Self {
            element: ElementIdentity::of(node),
            reason,
        }
    }

    /// Diagnostic for a queried element whose resolution failed.
    pub fn unresolved(target: roxmltree::Node<'_, '_>, unresolved: Unresolved) -> Self {
        Self::new(
            target,
            DiagnosticReason::Unresolved {
                source: unresolved.element,
                reason: unresolved.reason,
            },
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.element, self.reason)
    }
}
