//! Discovery and selection of sync profiles.
//!
//! Profile files are plain JSON and may share a directory with unrelated JSON
//! (package manifests and the like), so discovery keeps only files whose top
//! level carries both a `tables` and an `excel_config` key. Selection parsing
//! is a pure function; the process-exit side effect lives in the binary.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SyncError};

/// A discovered sync profile, with its derived operator-facing name and the
/// environment variable holding its API token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub path: PathBuf,
    pub file_name: String,
    pub display_name: String,
    pub token_var: String,
}

/// Result of parsing the operator's menu input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Leave without running anything.
    Exit,
    /// Zero-based index into the discovered profile list.
    Profile(usize),
}

/// Scans a directory for sync profile files, sorted by filename for a stable
/// menu. Files that are unreadable, not JSON, or structurally not a sync
/// profile are skipped. An empty result is an error: there is nothing to run.
pub fn discover(dir: &Path) -> Result<Vec<Profile>> {
    let mut profiles = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        if !is_profile_file(&path) {
            debug!(path = %path.display(), "skipping non-profile JSON file");
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let file_name = file_name.to_string();
        let stem = file_name.strip_suffix(".json").unwrap_or(&file_name);
        profiles.push(Profile {
            display_name: display_name(stem),
            token_var: token_var(stem),
            file_name,
            path,
        });
    }

    profiles.sort_by(|lhs, rhs| lhs.file_name.cmp(&rhs.file_name));
    if profiles.is_empty() {
        return Err(SyncError::NoProfiles(dir.to_path_buf()));
    }
    Ok(profiles)
}

fn is_profile_file(path: &Path) -> bool {
    let Ok(raw) = fs::read_to_string(path) else {
        return false;
    };
    let Ok(value) = serde_json::from_str::<Value>(&raw) else {
        return false;
    };
    let Some(object) = value.as_object() else {
        return false;
    };
    object.contains_key("tables") && object.contains_key("excel_config")
}

/// Friendly name for a profile file stem: a curated name for the known
/// datasets, otherwise a title-cased transform of the stem.
pub fn display_name(stem: &str) -> String {
    if let Some(name) = curated_name(stem) {
        return name.to_string();
    }
    stem.split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn curated_name(stem: &str) -> Option<&'static str> {
    match stem {
        "memo-bh-gov" => Some("BH government & enterprise sync"),
        "memo-bh-star" => Some("BH satellite sync"),
        "memo-bh-ywl" => Some("BH cloud future sync"),
        "memo-bh-yxd" => Some("BH cloud modern sync"),
        _ => None,
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Environment variable holding the API token for a profile file stem: the
/// optional `memo-` prefix is dropped, non-alphanumerics become underscores,
/// and the result is wrapped as `SEATABLE_<NAME>_TOKEN`.
pub fn token_var(stem: &str) -> String {
    let trimmed = stem
        .strip_prefix("memo-")
        .or_else(|| stem.strip_prefix("memo_"))
        .unwrap_or(stem);
    let name: String = trimmed
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("SEATABLE_{name}_TOKEN")
}

/// Parses one line of menu input against a list of `profile_count` profiles.
///
/// Empty input defaults to the first profile, `0` selects the exit option,
/// and anything else out of range is rejected so the caller can re-prompt.
pub fn parse_selection(input: &str, profile_count: usize) -> Option<Selection> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return (profile_count > 0).then_some(Selection::Profile(0));
    }
    match trimmed.parse::<usize>() {
        Ok(0) => Some(Selection::Exit),
        Ok(choice) if choice <= profile_count => Some(Selection::Profile(choice - 1)),
        _ => None,
    }
}

/// Resolves the API token for a selected profile from the process
/// environment. Unset or blank is fatal: there is no way to authenticate.
pub fn resolve_token(profile: &Profile) -> Result<String> {
    resolve_token_with(profile, |name| std::env::var(name).ok())
}

/// Token resolution with an injectable environment lookup.
pub fn resolve_token_with(
    profile: &Profile,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String> {
    match lookup(&profile.token_var) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(SyncError::MissingCredential(profile.token_var.clone())),
    }
}
