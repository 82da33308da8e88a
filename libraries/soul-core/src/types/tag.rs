//! Hierarchical tags
//!
//! Tags form a tree. Rules match a tag by exact name or slug only; a song
//! tagged with a child tag does not carry its ancestors.

use super::TagId;
use serde::{Deserialize, Serialize};

/// Tag attached to songs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<TagId>,
    /// Distance from the root (roots have depth 0)
    pub depth: i32,
}

impl Tag {
    /// Whether `value` names this tag, by name or slug
    pub fn is_named(&self, value: &str) -> bool {
        self.name == value || self.slug == value
    }
}

/// Data for creating a tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTag {
    pub name: String,
    pub parent_id: Option<TagId>,
}

impl CreateTag {
    /// Root tag
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_id: None,
        }
    }

    /// Tag nested under `parent`
    pub fn child(name: impl Into<String>, parent: TagId) -> Self {
        Self {
            name: name.into(),
            parent_id: Some(parent),
        }
    }

    /// URL-safe slug derived from the name
    pub fn slug(&self) -> String {
        let mut slug = String::with_capacity(self.name.len());
        let mut pending_dash = false;
        for ch in self.name.trim().chars() {
            if ch.is_alphanumeric() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.extend(ch.to_lowercase());
            } else {
                pending_dash = true;
            }
        }
        slug
    }
}
