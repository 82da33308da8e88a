//! Rule predicate over one user-scoped song snapshot
//!
//! This is the only place rule semantics live. Full scans and single-song
//! checks both call [`RuleSet::matches`].

use super::{
    Clause, DateField, DateOp, Logic, NumberField, NumberOp, RuleGroup, RuleSet, TagOp,
    TextField, TextOp,
};
use chrono::{DateTime, Utc};
use soul_core::types::SongFacts;

impl RuleSet {
    /// Whether the song satisfies every group
    ///
    /// An empty rule set matches nothing. `now` anchors relative date clauses.
    pub fn matches(&self, facts: &SongFacts, now: DateTime<Utc>) -> bool {
        !self.groups.is_empty() && self.groups.iter().all(|g| g.matches(facts, now))
    }
}

impl RuleGroup {
    /// An empty group is vacuously true
    pub fn matches(&self, facts: &SongFacts, now: DateTime<Utc>) -> bool {
        if self.clauses.is_empty() {
            return true;
        }
        match self.logic {
            Logic::And => self.clauses.iter().all(|c| c.matches(facts, now)),
            Logic::Or => self.clauses.iter().any(|c| c.matches(facts, now)),
        }
    }
}

impl Clause {
    pub fn matches(&self, facts: &SongFacts, now: DateTime<Utc>) -> bool {
        match self {
            Self::Text { field, op, value } => {
                text_value(facts, *field).is_some_and(|actual| text_matches(*op, actual, value))
            }
            Self::Number { field, op } => {
                number_value(facts, *field).is_some_and(|actual| number_matches(op, actual))
            }
            Self::Date { field, op } => {
                date_value(facts, *field).is_some_and(|actual| date_matches(op, actual, now))
            }
            Self::Tag { op, value } => {
                let has = facts.song.tags.iter().any(|tag| tag.is_named(value));
                match op {
                    TagOp::Has => has,
                    TagOp::HasNot => !has,
                }
            }
            Self::Favorite { expected } => facts.is_favorite == *expected,
        }
    }
}

fn text_value(facts: &SongFacts, field: TextField) -> Option<&str> {
    let song = &facts.song;
    match field {
        TextField::Title => Some(song.title.as_str()),
        TextField::ArtistName => song.artist_name.as_deref(),
        TextField::AlbumName => song.album_name.as_deref(),
        TextField::Genre => song.genre.as_deref(),
        TextField::AudioFormat => song.audio_format.as_deref(),
    }
}

fn text_matches(op: TextOp, actual: &str, expected: &str) -> bool {
    let folded = || (actual.to_lowercase(), expected.to_lowercase());
    match op {
        TextOp::Is => actual == expected,
        TextOp::IsNot => actual != expected,
        TextOp::Contains => {
            let (a, e) = folded();
            a.contains(&e)
        }
        TextOp::NotContains => {
            let (a, e) = folded();
            !a.contains(&e)
        }
        TextOp::BeginsWith => {
            let (a, e) = folded();
            a.starts_with(&e)
        }
        TextOp::EndsWith => {
            let (a, e) = folded();
            a.ends_with(&e)
        }
    }
}

fn number_value(facts: &SongFacts, field: NumberField) -> Option<f64> {
    match field {
        NumberField::Year => facts.song.year.map(f64::from),
        NumberField::Length => facts.song.length_seconds,
        // Never played counts as zero plays
        NumberField::PlayCount => Some(facts.play_count() as f64),
    }
}

fn number_matches(op: &NumberOp, actual: f64) -> bool {
    match *op {
        NumberOp::Is(v) => actual == v,
        NumberOp::IsNot(v) => actual != v,
        NumberOp::GreaterThan(v) => actual > v,
        NumberOp::LessThan(v) => actual < v,
        NumberOp::InRange(lo, hi) => lo <= actual && actual <= hi,
        NumberOp::Contains(ref part) => actual.to_string().contains(part.as_str()),
        NumberOp::NotContains(ref part) => !actual.to_string().contains(part.as_str()),
    }
}

fn date_value(facts: &SongFacts, field: DateField) -> Option<DateTime<Utc>> {
    match field {
        DateField::CreatedAt => Some(facts.song.created_at),
        DateField::LastPlayed => facts.last_played_at(),
    }
}

fn date_matches(op: &DateOp, actual: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let day = || actual.format("%Y-%m-%d").to_string();
    match *op {
        DateOp::SameDay(day) => actual.date_naive() == day,
        DateOp::NotSameDay(day) => actual.date_naive() != day,
        DateOp::After(bound) => actual >= bound,
        DateOp::Before(bound) => actual < bound,
        DateOp::Between(start, end) => start <= actual && actual < end,
        DateOp::InLast(window) => actual >= now - window,
        DateOp::NotInLast(window) => actual < now - window,
        DateOp::Contains(ref part) => day().contains(part.as_str()),
        DateOp::NotContains(ref part) => !day().contains(part.as_str()),
    }
}
