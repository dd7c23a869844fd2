//! Field search across loaded explores
//!
//! Case-insensitive substring match on field name, label and description.
//! Hidden explores and hidden fields are never returned.

use crate::models::{ExploreField, ExploreId, FieldCategory, LookmlExplore};
use serde::Serialize;
use std::sync::Arc;

/// How a field matched; lower ranks sort first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Full or view-less name equals the query
    ExactName,
    /// View-less name starts with the query
    NamePrefix,
    NameContains,
    Label,
    Description,
}

/// One matching field
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub explore: ExploreId,
    pub category: FieldCategory,
    pub field: ExploreField,
    pub kind: MatchKind,
}

/// `orders.created_date` -> `created_date`
fn short_name(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(_, short)| short)
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

fn match_field(field: &ExploreField, needle: &str) -> Option<MatchKind> {
    let name = field.name.to_lowercase();
    let short = short_name(&name);

    if name == needle || short == needle {
        Some(MatchKind::ExactName)
    } else if short.starts_with(needle) {
        Some(MatchKind::NamePrefix)
    } else if name.contains(needle) {
        Some(MatchKind::NameContains)
    } else if contains_ci(field.label.as_deref(), needle)
        || contains_ci(field.label_short.as_deref(), needle)
    {
        Some(MatchKind::Label)
    } else if contains_ci(field.description.as_deref(), needle) {
        Some(MatchKind::Description)
    } else {
        None
    }
}

/// Search fields of `explores`, best matches first
///
/// Ties keep explore order then field order. An empty query matches nothing.
pub fn search_fields(explores: &[Arc<LookmlExplore>], query: &str, limit: usize) -> Vec<SearchHit> {
    let lowered = query.trim().to_lowercase();
    if lowered.is_empty() {
        return Vec::new();
    }
    let needle = lowered.as_str();

    let mut hits: Vec<SearchHit> = explores
        .iter()
        .filter(|explore| !explore.hidden)
        .flat_map(move |explore| {
            explore
                .fields
                .iter()
                .filter(|(_, field)| !field.hidden)
                .filter_map(move |(category, field)| {
                    match_field(field, needle).map(|kind| SearchHit {
                        explore: explore.id(),
                        category,
                        field: field.clone(),
                        kind,
                    })
                })
        })
        .collect();

    // Stable sort keeps explore/field order within a kind
    hits.sort_by_key(|hit| hit.kind);
    hits.truncate(limit);

    tracing::debug!(query, hits = hits.len(), "Field search");
    hits
}
