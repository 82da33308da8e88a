//! Wire format parsing
//!
//! ```json
//! [{ "logic": "and", "rules": [{ "field": "year", "operator": "greater_than", "value": 1990 }] }]
//! ```

use super::{
    Clause, DateField, DateOp, Logic, NumberField, NumberOp, RuleError, RuleGroup, RuleSet,
    TagOp, TextField, TextOp,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::Value;

const MAX_DAYS: i64 = 365 * 1000;

pub(super) fn rule_set(document: &Value) -> Result<RuleSet, RuleError> {
    let Value::Array(groups) = document else {
        return Err(RuleError::Malformed(kind(document).to_string()));
    };

    groups
        .iter()
        .enumerate()
        .map(|(index, group)| rule_group(index, group))
        .collect::<Result<Vec<_>, _>>()
        .map(RuleSet::new)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

fn rule_group(index: usize, group: &Value) -> Result<RuleGroup, RuleError> {
    let malformed = |reason: String| RuleError::MalformedGroup {
        group: index,
        reason,
    };

    let Value::Object(group) = group else {
        return Err(malformed(format!("expected an object, got {}", kind(group))));
    };

    let logic = match group.get("logic") {
        None => Logic::And,
        Some(Value::String(logic)) => match logic.to_ascii_lowercase().as_str() {
            "and" => Logic::And,
            "or" => Logic::Or,
            _ => {
                return Err(RuleError::UnknownLogic {
                    group: index,
                    logic: logic.clone(),
                })
            }
        },
        Some(other) => {
            return Err(malformed(format!("logic must be a string, got {}", kind(other))));
        }
    };

    let clauses = match group.get("rules") {
        Some(Value::Array(rules)) => rules,
        Some(other) => {
            return Err(malformed(format!("rules must be a list, got {}", kind(other))));
        }
        None => return Err(malformed("missing rules".to_string())),
    };

    let clauses = clauses
        .iter()
        .enumerate()
        .map(|(clause, raw)| ClauseParser::new(index, clause, raw)?.parse())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RuleGroup { logic, clauses })
}

struct ClauseParser<'a> {
    group: usize,
    clause: usize,
    field: &'a str,
    operator: &'a str,
    value: &'a Value,
}

impl<'a> ClauseParser<'a> {
    fn new(group: usize, clause: usize, raw: &'a Value) -> Result<Self, RuleError> {
        let malformed = |reason: &str| RuleError::MalformedClause {
            group,
            clause,
            reason: reason.to_string(),
        };

        let Value::Object(raw) = raw else {
            return Err(malformed("expected an object"));
        };
        let field = raw
            .get("field")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("missing field"))?;
        let operator = raw
            .get("operator")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("missing operator"))?;

        Ok(Self {
            group,
            clause,
            field,
            operator,
            value: raw.get("value").unwrap_or(&Value::Null),
        })
    }

    fn parse(&self) -> Result<Clause, RuleError> {
        let text = |field| self.text(field);
        match self.field {
            "title" => text(TextField::Title),
            "artist_name" | "artist" => text(TextField::ArtistName),
            "album_name" | "album" => text(TextField::AlbumName),
            "genre" => text(TextField::Genre),
            "audio_format" => text(TextField::AudioFormat),
            "year" => self.number(NumberField::Year),
            "length" => self.number(NumberField::Length),
            "play_count" => self.number(NumberField::PlayCount),
            "created_at" | "date_added" => self.date(DateField::CreatedAt),
            "last_played" => self.date(DateField::LastPlayed),
            "tag" => self.tag(),
            "is_favorite" => self.favorite(),
            other => Err(RuleError::UnknownField {
                group: self.group,
                clause: self.clause,
                field: other.to_string(),
            }),
        }
    }

    fn unsupported(&self) -> RuleError {
        RuleError::UnsupportedOperator {
            group: self.group,
            clause: self.clause,
            field: self.field.to_string(),
            operator: self.operator.to_string(),
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> RuleError {
        RuleError::InvalidValue {
            group: self.group,
            clause: self.clause,
            field: self.field.to_string(),
            reason: reason.into(),
        }
    }

    fn text(&self, field: TextField) -> Result<Clause, RuleError> {
        let op = match self.operator {
            "is" => TextOp::Is,
            "is_not" => TextOp::IsNot,
            "contains" => TextOp::Contains,
            "not_contains" => TextOp::NotContains,
            "begins_with" => TextOp::BeginsWith,
            "ends_with" => TextOp::EndsWith,
            _ => return Err(self.unsupported()),
        };
        Ok(Clause::Text {
            field,
            op,
            value: self.literal()?,
        })
    }

    fn literal(&self) -> Result<String, RuleError> {
        match self.value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(self.invalid(format!("expected text, got {}", kind(other)))),
        }
    }

    fn scalar(&self, value: &Value) -> Result<f64, RuleError> {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed
            .filter(|n| n.is_finite())
            .ok_or_else(|| self.invalid(format!("expected a number, got {value}")))
    }

    fn pair(&self) -> Result<(&'a Value, &'a Value), RuleError> {
        match self.value {
            Value::Array(items) if items.len() == 2 => Ok((&items[0], &items[1])),
            _ => Err(self.invalid("expected a list of two bounds")),
        }
    }

    fn number(&self, field: NumberField) -> Result<Clause, RuleError> {
        let op = match self.operator {
            "is" => NumberOp::Is(self.scalar(self.value)?),
            "is_not" => NumberOp::IsNot(self.scalar(self.value)?),
            "greater_than" | "is_greater_than" => NumberOp::GreaterThan(self.scalar(self.value)?),
            "less_than" | "is_less_than" => NumberOp::LessThan(self.scalar(self.value)?),
            "in_range" | "is_between" => {
                let (lo, hi) = self.pair()?;
                let (lo, hi) = (self.scalar(lo)?, self.scalar(hi)?);
                if lo > hi {
                    return Err(self.invalid(format!("lower bound {lo} exceeds upper bound {hi}")));
                }
                NumberOp::InRange(lo, hi)
            }
            "contains" => NumberOp::Contains(self.literal()?),
            "not_contains" => NumberOp::NotContains(self.literal()?),
            _ => return Err(self.unsupported()),
        };
        Ok(Clause::Number { field, op })
    }

    /// Start and exclusive end of the instant or day a date value names
    fn bounds(&self, value: &Value) -> Result<(DateTime<Utc>, DateTime<Utc>), RuleError> {
        let Value::String(raw) = value else {
            return Err(self.invalid(format!("expected a date, got {}", kind(value))));
        };
        let raw = raw.trim();

        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            let ts = ts.with_timezone(&Utc);
            return Ok((ts, ts + Duration::microseconds(1)));
        }

        let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| self.invalid(format!("unrecognized date {raw:?}")))?;
        let start = day
            .and_hms_opt(0, 0, 0)
            .map(|t| t.and_utc())
            .ok_or_else(|| self.invalid(format!("unrecognized date {raw:?}")))?;
        Ok((start, start + Duration::days(1)))
    }

    fn days(&self) -> Result<Duration, RuleError> {
        let days = self.scalar(self.value)?;
        if days < 0.0 || days.fract() != 0.0 || days > MAX_DAYS as f64 {
            return Err(self.invalid(format!("expected a whole number of days, got {days}")));
        }
        Ok(Duration::days(days as i64))
    }

    fn date(&self, field: DateField) -> Result<Clause, RuleError> {
        let op = match self.operator {
            "is" => DateOp::SameDay(self.bounds(self.value)?.0.date_naive()),
            "is_not" => DateOp::NotSameDay(self.bounds(self.value)?.0.date_naive()),
            "greater_than" | "is_greater_than" => DateOp::After(self.bounds(self.value)?.1),
            "less_than" | "is_less_than" => DateOp::Before(self.bounds(self.value)?.0),
            "in_range" | "is_between" => {
                let (lo, hi) = self.pair()?;
                let (start, _) = self.bounds(lo)?;
                let (_, end) = self.bounds(hi)?;
                if start >= end {
                    return Err(self.invalid("lower bound is after upper bound"));
                }
                DateOp::Between(start, end)
            }
            "in_last" => DateOp::InLast(self.days()?),
            "not_in_last" => DateOp::NotInLast(self.days()?),
            "contains" => DateOp::Contains(self.literal()?),
            "not_contains" => DateOp::NotContains(self.literal()?),
            _ => return Err(self.unsupported()),
        };
        Ok(Clause::Date { field, op })
    }

    fn tag(&self) -> Result<Clause, RuleError> {
        let op = match self.operator {
            "has" | "is" => TagOp::Has,
            "has_not" => TagOp::HasNot,
            _ => return Err(self.unsupported()),
        };
        match self.value {
            Value::String(value) if !value.trim().is_empty() => Ok(Clause::Tag {
                op,
                value: value.clone(),
            }),
            _ => Err(self.invalid("expected a tag name")),
        }
    }

    fn favorite(&self) -> Result<Clause, RuleError> {
        let value = match self.value {
            Value::Bool(b) => *b,
            Value::String(s) if s.eq_ignore_ascii_case("true") => true,
            Value::String(s) if s.eq_ignore_ascii_case("false") => false,
            Value::Number(n) if n.as_i64() == Some(1) => true,
            Value::Number(n) if n.as_i64() == Some(0) => false,
            _ => return Err(self.invalid("expected true or false")),
        };
        let expected = match self.operator {
            "is" => value,
            "is_not" => !value,
            _ => return Err(self.unsupported()),
        };
        Ok(Clause::Favorite { expected })
    }
}
