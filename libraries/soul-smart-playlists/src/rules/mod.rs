//! Rule model
//!
//! A stored rule document is parsed once into a [`RuleSet`]: an ordered list
//! of groups, each combining closed [`Clause`] variants with AND or OR. Groups
//! are ANDed together. Every field/operator/value combination is checked at
//! parse time, so evaluation itself cannot hit an unknown field.

mod parse;
mod predicate;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use thiserror::Error;

/// Errors in a rule document
///
/// Indices are zero-based positions of the group and clause in the document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    #[error("Rule definition must be a list of groups, got {0}")]
    Malformed(String),

    #[error("Group {group}: {reason}")]
    MalformedGroup { group: usize, reason: String },

    #[error("Group {group}: unknown logic {logic:?}")]
    UnknownLogic { group: usize, logic: String },

    #[error("Group {group}, clause {clause}: {reason}")]
    MalformedClause {
        group: usize,
        clause: usize,
        reason: String,
    },

    #[error("Group {group}, clause {clause}: unknown field {field:?}")]
    UnknownField {
        group: usize,
        clause: usize,
        field: String,
    },

    #[error("Group {group}, clause {clause}: operator {operator:?} is not supported for {field}")]
    UnsupportedOperator {
        group: usize,
        clause: usize,
        field: String,
        operator: String,
    },

    #[error("Group {group}, clause {clause}: invalid value for {field}: {reason}")]
    InvalidValue {
        group: usize,
        clause: usize,
        field: String,
        reason: String,
    },
}

/// How a group combines its clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logic {
    And,
    Or,
}

/// Song attributes compared as text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Title,
    ArtistName,
    AlbumName,
    Genre,
    AudioFormat,
}

/// Text comparison; `contains`, `begins_with` and `ends_with` ignore case
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOp {
    Is,
    IsNot,
    Contains,
    NotContains,
    BeginsWith,
    EndsWith,
}

/// Numeric attributes; `PlayCount` is scoped to the playlist owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberField {
    Year,
    Length,
    PlayCount,
}

/// Numeric comparison; `InRange` is inclusive at both ends
///
/// `Contains` and `NotContains` test the decimal text of the value.
#[derive(Debug, Clone, PartialEq)]
pub enum NumberOp {
    Is(f64),
    IsNot(f64),
    GreaterThan(f64),
    LessThan(f64),
    InRange(f64, f64),
    Contains(String),
    NotContains(String),
}

/// Date attributes; `LastPlayed` is scoped to the playlist owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    CreatedAt,
    LastPlayed,
}

/// Date comparison
///
/// Bounds are half-open: `After(t)` means at or after `t`, `Before(t)` means
/// strictly before `t`, `Between(a, b)` means `a <= ts < b`. A date-only value
/// covers its whole UTC day. `Contains` and `NotContains` test the UTC
/// `YYYY-MM-DD` rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateOp {
    SameDay(NaiveDate),
    NotSameDay(NaiveDate),
    After(DateTime<Utc>),
    Before(DateTime<Utc>),
    Between(DateTime<Utc>, DateTime<Utc>),
    InLast(Duration),
    NotInLast(Duration),
    Contains(String),
    NotContains(String),
}

/// Tag membership; `is` parses to `Has`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOp {
    Has,
    HasNot,
}

/// A single validated test
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Text {
        field: TextField,
        op: TextOp,
        value: String,
    },
    Number {
        field: NumberField,
        op: NumberOp,
    },
    Date {
        field: DateField,
        op: DateOp,
    },
    Tag {
        op: TagOp,
        value: String,
    },
    Favorite {
        expected: bool,
    },
}

impl Clause {
    /// Whether the clause reads the owner's favorites
    pub fn reads_favorites(&self) -> bool {
        matches!(self, Self::Favorite { .. })
    }

    /// Whether the clause reads the owner's play statistics
    pub fn reads_interactions(&self) -> bool {
        matches!(
            self,
            Self::Number {
                field: NumberField::PlayCount,
                ..
            } | Self::Date {
                field: DateField::LastPlayed,
                ..
            }
        )
    }
}

/// Clauses combined with one logic
#[derive(Debug, Clone, PartialEq)]
pub struct RuleGroup {
    pub logic: Logic,
    pub clauses: Vec<Clause>,
}

/// A parsed rule document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    groups: Vec<RuleGroup>,
}

impl RuleSet {
    /// Build a rule set from already validated groups
    pub fn new(groups: Vec<RuleGroup>) -> Self {
        Self { groups }
    }

    /// Parse a rule document
    pub fn parse(document: &serde_json::Value) -> Result<Self, RuleError> {
        parse::rule_set(document)
    }

    /// Parse a playlist's stored rules; a missing document is an empty rule set
    pub fn from_stored(document: Option<&serde_json::Value>) -> Result<Self, RuleError> {
        match document {
            None | Some(serde_json::Value::Null) => Ok(Self::default()),
            Some(document) => Self::parse(document),
        }
    }

    pub fn groups(&self) -> &[RuleGroup] {
        &self.groups
    }

    /// No groups; such a rule set matches nothing
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.groups.iter().flat_map(|g| g.clauses.iter())
    }

    /// Whether a favorite toggle can change the outcome
    pub fn references_favorites(&self) -> bool {
        self.clauses().any(Clause::reads_favorites)
    }

    /// Whether a recorded play can change the outcome
    pub fn references_interactions(&self) -> bool {
        self.clauses().any(Clause::reads_interactions)
    }
}
