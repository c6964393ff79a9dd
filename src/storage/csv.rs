// src/storage/csv.rs

//! CSV flattening for goal snapshots.
//!
//! The column set and serialization quirks are the downstream contract:
//! missing scalars and empty collections are the literal string `null`,
//! collections are semicolon-joined, embedded commas become semicolons,
//! quotes are doubled, and newlines flatten to spaces.

use crate::models::GoalNode;

/// Snapshot header row.
pub const CSV_HEADER: &str = "created_at,Owner,Goal Key,Target Date,Name,Parent Goal,\
Sub-goals,Tags,Progress Type,Teams,Start Date,Creation Date,Lineage,EntityId";

/// Render a complete snapshot: header plus one row per non-archived goal.
///
/// Archived goals stay out of the CSV; they are still part of the crawl
/// outcome and its statistics.
pub fn render_snapshot(goals: &[GoalNode], created_at: &str) -> String {
    let mut out = String::with_capacity(64 * (goals.len() + 1));
    out.push_str(CSV_HEADER);
    out.push('\n');
    for goal in goals.iter().filter(|g| !g.archived) {
        out.push_str(&render_row(goal, created_at));
        out.push('\n');
    }
    out
}

/// Number of data rows a snapshot of these goals will contain.
pub fn row_count(goals: &[GoalNode]) -> usize {
    goals.iter().filter(|g| !g.archived).count()
}

/// Render one data row. Every field except `created_at` is double-quoted.
pub fn render_row(goal: &GoalNode, created_at: &str) -> String {
    let columns = [
        scalar(goal.owner.as_deref()),
        scalar(Some(&goal.key)),
        scalar(goal.target_date.as_deref()),
        scalar(Some(&goal.name)),
        scalar(goal.parent_key.as_deref()),
        list(goal.subgoals.iter().map(|s| s.key.as_str())),
        list(goal.tags.iter().map(String::as_str)),
        scalar(goal.progress_type.as_deref()),
        list(goal.teams.iter().map(String::as_str)),
        scalar(goal.start_date.as_deref()),
        scalar(goal.creation_date.as_deref()),
        scalar(goal.lineage.as_deref()),
        scalar(goal.entity_id.as_deref()),
    ];

    let mut row = String::from(created_at);
    for column in columns {
        row.push_str(",\"");
        row.push_str(&column);
        row.push('"');
    }
    row
}

/// A missing or empty scalar serializes as the literal `null`.
fn scalar(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => clean(v),
        _ => "null".to_string(),
    }
}

/// Semicolon-joined collection, or the literal `null` when empty.
fn list<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let joined = values.collect::<Vec<_>>().join(";");
    if joined.is_empty() {
        "null".to_string()
    } else {
        clean(&joined)
    }
}

fn clean(value: &str) -> String {
    value
        .replace(',', ";")
        .replace('"', "\"\"")
        .replace(['\n', '\r'], " ")
}
