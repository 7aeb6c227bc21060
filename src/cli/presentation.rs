//! CLI presentation: text and json formatters.

use crate::engine::{TrackedFile, VerifyEntry};
use crate::error::ApiError;
use crate::record::{format_version, VersionRecord};
use crate::store::BlobStatus;
use crate::tree::VersionForest;

/// `path \t timestamp \t version \t based_on \t "description"`
pub fn format_record_line(record: &VersionRecord) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}",
        record.path,
        record.timestamp_rfc3339(),
        format_version(record.version),
        format_version(record.based_on),
        record.quoted_description()
    )
}

pub fn format_commits_text(records: &[&VersionRecord]) -> String {
    records
        .iter()
        .map(|r| format_record_line(r))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_commits_json(records: &[&VersionRecord]) -> Result<String, ApiError> {
    let items: Vec<serde_json::Value> = records
        .iter()
        .map(|r| {
            serde_json::json!({
                "path": r.path,
                "timestamp": r.timestamp_rfc3339(),
                "version": r.version,
                "based_on": r.based_on,
                "signature": r.path_signature,
                "checksum": r.content_checksum,
                "description": r.change_description,
            })
        })
        .collect();
    to_json(&serde_json::Value::Array(items))
}

/// One line per version, indented with one tab per tree level.
pub fn format_tree(forest: &VersionForest<'_>) -> String {
    forest
        .walk()
        .into_iter()
        .map(|(depth, record)| format!("{}{}", "\t".repeat(depth), format_record_line(record)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_list_text(files: &[TrackedFile]) -> String {
    files
        .iter()
        .map(|f| format!("{}\t{}", f.path, f.signature))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_list_json(files: &[TrackedFile]) -> Result<String, ApiError> {
    let items: Vec<serde_json::Value> = files
        .iter()
        .map(|f| serde_json::json!({ "path": f.path, "signature": f.signature }))
        .collect();
    to_json(&serde_json::Value::Array(items))
}

/// Summary line plus one line per problem; `bool` is true when all intact.
pub fn format_verify_result(entries: &[VerifyEntry]) -> (String, bool) {
    let problems: Vec<String> = entries
        .iter()
        .filter_map(|e| {
            let id = format!("{} @{}", e.record.path, format_version(e.record.version));
            match e.status {
                BlobStatus::Intact => None,
                BlobStatus::Missing => Some(format!("  missing: {}", id)),
                BlobStatus::Corrupted { actual } => Some(format!(
                    "  corrupted: {} (expected crc {}, got {})",
                    id, e.record.content_checksum, actual
                )),
            }
        })
        .collect();

    if problems.is_empty() {
        (format!("Verified {} version(s): all intact", entries.len()), true)
    } else {
        let mut out = format!(
            "Verified {} version(s): {} problem(s)",
            entries.len(),
            problems.len()
        );
        for p in problems {
            out.push('\n');
            out.push_str(&p);
        }
        (out, false)
    }
}

fn to_json(value: &serde_json::Value) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::OutputError(format!("Failed to render json: {}", e)))
}
