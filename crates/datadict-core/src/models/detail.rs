//! Model detail: a model together with all of its loaded explores

use super::lookml::{LookmlExplore, LookmlModel};
use serde::Serialize;
use std::sync::Arc;

/// A model and every one of its explores, in model declaration order
#[derive(Debug, Clone, Serialize)]
pub struct ModelDetail {
    pub model: Arc<LookmlModel>,
    pub explores: Vec<Arc<LookmlExplore>>,
}

/// One join edge between an explore and a joined view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    pub explore: String,
    /// Join name as referenced in the explore
    pub view: String,
    pub relationship: Option<String>,
    pub join_type: Option<String>,
    pub sql_on: Option<String>,
}

impl ModelDetail {
    /// Join edges across all explores, explore order then join order
    pub fn relationships(&self) -> Vec<Relationship> {
        self.explores
            .iter()
            .flat_map(|explore| {
                explore.joins.iter().map(move |join| Relationship {
                    explore: explore.name.clone(),
                    view: join.name.clone(),
                    relationship: join.relationship.clone(),
                    join_type: join.join_type.clone(),
                    sql_on: join.sql_on.clone(),
                })
            })
            .collect()
    }

    /// Total field count across all explores
    pub fn field_count(&self) -> usize {
        self.explores.iter().map(|e| e.fields.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn explore(json: &str) -> Arc<LookmlExplore> {
        Arc::new(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_relationships_flatten_in_order() {
        let model: LookmlModel =
            serde_json::from_str(r#"{"name": "thelook", "explores": [{"name": "orders"}, {"name": "users"}]}"#)
                .unwrap();
        let detail = ModelDetail {
            model: Arc::new(model),
            explores: vec![
                explore(
                    r#"{"name": "orders", "model_name": "thelook", "joins": [
                        {"name": "users", "relationship": "many_to_one"},
                        {"name": "products", "relationship": "many_to_one", "type": "inner"}
                    ]}"#,
                ),
                explore(r#"{"name": "users", "model_name": "thelook"}"#),
            ],
        };

        let edges = detail.relationships();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].explore, "orders");
        assert_eq!(edges[0].view, "users");
        assert_eq!(edges[1].view, "products");
        assert_eq!(edges[1].join_type.as_deref(), Some("inner"));
        assert_eq!(detail.field_count(), 0);
    }
}
