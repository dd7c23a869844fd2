//! Output formatting for datadict commands
//!
//! Every formatter renders either a comfy-table for humans or pretty JSON.

use comfy_table::{Cell, Color, ContentArrangement, Row, Table};
use datadict_core::error::ErrorSeverity;
use datadict_core::loader::BatchState;
use datadict_core::models::{LookmlExplore, LookmlModel, ModelDetail};
use datadict_core::{LoadReport, SearchHit};
use serde::Serialize;

// ============================================================================
// Formatters
// ============================================================================

/// Models with their explore counts
///
/// Hidden explores are left out of counts and JSON unless `show_hidden`.
pub fn format_models_table(
    models: &[LookmlModel],
    show_hidden: bool,
    json: bool,
    no_color: bool,
) -> String {
    let models: Vec<LookmlModel> = if show_hidden {
        models.to_vec()
    } else {
        models
            .iter()
            .map(|m| LookmlModel {
                explores: m.visible_explores().cloned().collect(),
                ..m.clone()
            })
            .collect()
    };

    if json {
        return to_json(&models, "[]");
    }

    if models.is_empty() {
        return "No models found.".to_string();
    }

    let mut table = new_table(&["Model", "Label", "Project", "Explores"], no_color);
    for model in &models {
        table.add_row(Row::from(vec![
            model.name.clone(),
            truncate(model.display_label(), 30),
            or_dash(model.project_name.as_deref()),
            model.explores.len().to_string(),
        ]));
    }

    table.to_string()
}

/// One explore: summary lines, then a field table (hidden fields skipped)
pub fn format_explore(explore: &LookmlExplore, json: bool, no_color: bool) -> String {
    if json {
        return to_json(explore, "{}");
    }

    let mut lines = vec![
        format!("Explore:      {}", explore.id()),
        format!("Label:        {}", explore.display_label()),
        format!("Group:        {}", or_dash(explore.group_label.as_deref())),
        format!("Description:  {}", or_dash(explore.description.as_deref())),
        format!("Fields:       {}", explore.fields.len()),
        format!("Joins:        {}", explore.joins.len()),
        String::new(),
    ];

    let mut table = new_table(&["Category", "Field", "Label", "Type", "Description"], no_color);
    for (category, field) in explore.fields.iter().filter(|(_, f)| !f.hidden) {
        table.add_row(Row::from(vec![
            category.to_string(),
            field.name.clone(),
            or_dash(field.label.as_deref()),
            or_dash(field.field_type.as_deref()),
            truncate(field.description.as_deref().unwrap_or(""), 50),
        ]));
    }
    lines.push(table.to_string());

    lines.join("\n")
}

/// Model detail: explores, then join relationships
pub fn format_model_detail(detail: &ModelDetail, json: bool, no_color: bool) -> String {
    let relationships = detail.relationships();

    if json {
        #[derive(Serialize)]
        struct Output<'a> {
            #[serde(flatten)]
            detail: &'a ModelDetail,
            relationships: &'a [datadict_core::models::Relationship],
        }
        return to_json(
            &Output {
                detail,
                relationships: &relationships,
            },
            "{}",
        );
    }

    let model = &detail.model;
    let mut lines = vec![
        format!("Model:        {}", model.name),
        format!("Label:        {}", model.display_label()),
        format!("Project:      {}", or_dash(model.project_name.as_deref())),
        format!(
            "Connections:  {}",
            if model.allowed_db_connection_names.is_empty() {
                "-".to_string()
            } else {
                model.allowed_db_connection_names.join(", ")
            }
        ),
        format!("Explores:     {}", detail.explores.len()),
        format!("Fields:       {}", detail.field_count()),
        String::new(),
    ];

    let mut explores = new_table(&["Explore", "Label", "Fields", "Joins", "Hidden"], no_color);
    for explore in &detail.explores {
        explores.add_row(Row::from(vec![
            explore.name.clone(),
            truncate(explore.display_label(), 30),
            explore.fields.len().to_string(),
            explore.joins.len().to_string(),
            if explore.hidden { "yes" } else { "" }.to_string(),
        ]));
    }
    lines.push(explores.to_string());

    if !relationships.is_empty() {
        lines.push(String::new());
        let mut joins = new_table(
            &["Explore", "View", "Relationship", "Type", "SQL On"],
            no_color,
        );
        for rel in &relationships {
            joins.add_row(Row::from(vec![
                rel.explore.clone(),
                rel.view.clone(),
                or_dash(rel.relationship.as_deref()),
                or_dash(rel.join_type.as_deref()),
                truncate(rel.sql_on.as_deref().unwrap_or(""), 50),
            ]));
        }
        lines.push(joins.to_string());
    }

    lines.join("\n")
}

/// Result of a batch index run
pub fn format_index_summary(state: &BatchState, report: &LoadReport, json: bool) -> String {
    if json {
        let explores: Vec<String> = state.explores.iter().map(|e| e.id().to_string()).collect();
        return to_json(
            &serde_json::json!({
                "progress": state.progress,
                "explores": explores,
                "report": report,
            }),
            "{}",
        );
    }

    let (warnings, errors, fatal) = report.error_count();
    let mut lines = if fatal > 0 {
        vec!["Index aborted before any explore was fetched".to_string()]
    } else {
        vec![format!(
            "Indexed {} explores ({} failed: {} missing, {} errors)",
            state.loading_percent(),
            report.explores_failed,
            warnings,
            errors
        )]
    };
    for error in &report.errors {
        let tag = match error.severity {
            ErrorSeverity::Warning => "warn",
            ErrorSeverity::Error => "error",
            ErrorSeverity::Fatal => "fatal",
        };
        lines.push(format!("  [{}] {}: {}", tag, error.source, error.message));
    }

    lines.join("\n")
}

/// Field search hits, best first
pub fn format_search_hits(hits: &[SearchHit], json: bool, no_color: bool) -> String {
    if json {
        return to_json(hits, "[]");
    }

    if hits.is_empty() {
        return "No fields found.".to_string();
    }

    let mut table = new_table(&["Explore", "Category", "Field", "Label", "Match"], no_color);
    for hit in hits {
        table.add_row(Row::from(vec![
            hit.explore.to_string(),
            hit.category.to_string(),
            hit.field.name.clone(),
            or_dash(hit.field.label.as_deref()),
            format!("{:?}", hit.kind),
        ]));
    }

    table.to_string()
}

// ============================================================================
// Utilities
// ============================================================================

fn new_table(headers: &[&str], no_color: bool) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    if no_color {
        table.set_header(headers.to_vec());
    } else {
        table.set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    }

    table
}

fn to_json<T: Serialize + ?Sized>(value: &T, fallback: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| fallback.to_string())
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max.saturating_sub(1)).collect::<String>() + "…"
    }
}

// ============================================================================
// Tests
// ============================================================================
