//! Data models for datadict

pub mod detail;
pub mod lookml;
pub mod progress;

pub use detail::{ModelDetail, Relationship};
pub use lookml::{
    ExploreField, ExploreFields, ExploreId, ExploreJoin, ExploreRef, FieldCategory, LookmlExplore,
    LookmlModel,
};
pub use progress::Progress;
