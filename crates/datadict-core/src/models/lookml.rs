//! LookML metadata as returned by the Looker API
//!
//! Only the fields the dictionary displays are modeled; everything else in
//! the API payload is ignored during deserialization.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Looker sends `null` for many empty arrays and flags; treat it like absent
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Identifies one explore within one model
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExploreId {
    pub model: String,
    pub explore: String,
}

impl ExploreId {
    pub fn new(model: impl Into<String>, explore: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            explore: explore.into(),
        }
    }
}

impl fmt::Display for ExploreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.model, self.explore)
    }
}

/// A LookML model with the explores it owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookmlModel {
    pub name: String,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub project_name: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub allowed_db_connection_names: Vec<String>,

    /// Explore references in declaration order
    #[serde(default, deserialize_with = "null_as_default")]
    pub explores: Vec<ExploreRef>,
}

impl LookmlModel {
    /// Display label, falling back to the model name
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Explores not flagged hidden, in declaration order
    pub fn visible_explores(&self) -> impl Iterator<Item = &ExploreRef> {
        self.explores.iter().filter(|e| !e.hidden)
    }

    /// Ids of every explore in this model (hidden ones included)
    pub fn explore_ids(&self) -> impl Iterator<Item = ExploreId> + '_ {
        self.explores
            .iter()
            .map(move |e| ExploreId::new(&self.name, &e.name))
    }
}

/// Lightweight explore entry embedded in a model listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExploreRef {
    pub name: String,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub group_label: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub hidden: bool,
}

/// Full explore metadata, fetched on demand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookmlExplore {
    pub name: String,

    #[serde(default)]
    pub model_name: String,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub group_label: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub hidden: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: ExploreFields,

    #[serde(default, deserialize_with = "null_as_default")]
    pub joins: Vec<ExploreJoin>,
}

impl LookmlExplore {
    pub fn id(&self) -> ExploreId {
        ExploreId::new(&self.model_name, &self.name)
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// Field groups of an explore
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExploreFields {
    #[serde(default, deserialize_with = "null_as_default")]
    pub dimensions: Vec<ExploreField>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub measures: Vec<ExploreField>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub filters: Vec<ExploreField>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: Vec<ExploreField>,
}

impl ExploreFields {
    /// All fields tagged with their category, dimensions first
    pub fn iter(&self) -> impl Iterator<Item = (FieldCategory, &ExploreField)> {
        tagged(FieldCategory::Dimension, &self.dimensions)
            .chain(tagged(FieldCategory::Measure, &self.measures))
            .chain(tagged(FieldCategory::Filter, &self.filters))
            .chain(tagged(FieldCategory::Parameter, &self.parameters))
    }

    pub fn len(&self) -> usize {
        self.dimensions.len() + self.measures.len() + self.filters.len() + self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn tagged(
    category: FieldCategory,
    fields: &[ExploreField],
) -> impl Iterator<Item = (FieldCategory, &ExploreField)> {
    fields.iter().map(move |f| (category, f))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldCategory {
    Dimension,
    Measure,
    Filter,
    Parameter,
}

impl fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dimension => write!(f, "dimension"),
            Self::Measure => write!(f, "measure"),
            Self::Filter => write!(f, "filter"),
            Self::Parameter => write!(f, "parameter"),
        }
    }
}

/// A single dimension, measure, filter or parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExploreField {
    /// Fully qualified name, e.g. `orders.created_date`
    pub name: String,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub label_short: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, rename = "type")]
    pub field_type: Option<String>,

    #[serde(default)]
    pub view: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub hidden: bool,

    #[serde(default)]
    pub sql: Option<String>,
}

/// A join declared on an explore
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExploreJoin {
    pub name: String,

    /// `many_to_one`, `one_to_many`, ...
    #[serde(default)]
    pub relationship: Option<String>,

    /// `left_outer`, `inner`, ...
    #[serde(default, rename = "type")]
    pub join_type: Option<String>,

    #[serde(default)]
    pub sql_on: Option<String>,

    /// Underlying view when the join is aliased
    #[serde(default)]
    pub from: Option<String>,
}
