use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{Result, SyncError};
use crate::model::story::{LINEAR_ISSUE_LABEL, METADATA_MARKER};
use crate::util::fs::{atomic_write, FileLease, LEASE_TIMEOUT};

static STATUS_RE: OnceLock<Regex> = OnceLock::new();

fn status_re() -> &'static Regex {
    STATUS_RE.get_or_init(|| Regex::new(r"(\*\*Status:\*\*)[^\r\n]*").unwrap())
}

pub fn issue_url(workspace: &str, issue_id: &str) -> String {
    format!(
        "https://linear.app/{}/issue/{}",
        urlencoding::encode(workspace),
        urlencoding::encode(issue_id)
    )
}

pub fn issue_link_line(issue_id: &str, url: &str) -> String {
    format!("{LINEAR_ISSUE_LABEL} [{issue_id}]({url})")
}

/// Put a link to `issue_id` at the top of the story's metadata section.
///
/// The section runs from the metadata marker to the next `## ` heading. An
/// existing link line inside it is replaced; otherwise one line is inserted
/// right after the marker. Without a marker the content comes back as is.
pub fn inject_issue_link(content: &str, issue_id: &str, url: &str) -> String {
    let Some(marker_pos) = content.find(METADATA_MARKER) else {
        return content.to_string();
    };
    let line = issue_link_line(issue_id, url);

    let Some(nl) = content[marker_pos..].find('\n') else {
        return format!("{content}\n{line}\n");
    };
    let insert_at = marker_pos + nl + 1;
    let newline = if content[..insert_at].ends_with("\r\n") {
        "\r\n"
    } else {
        "\n"
    };

    let rest = &content[insert_at..];
    let section_len = if rest.starts_with("## ") {
        0
    } else {
        rest.find("\n## ").map(|i| i + 1).unwrap_or(rest.len())
    };
    let section = &rest[..section_len];

    let mut offset = 0;
    for existing in section.split_inclusive('\n') {
        if existing.contains(LINEAR_ISSUE_LABEL) {
            let body = existing.trim_end_matches(['\r', '\n']);
            let start = insert_at + offset;
            let end = start + body.len();
            let mut out = String::with_capacity(content.len() + line.len());
            out.push_str(&content[..start]);
            out.push_str(&line);
            out.push_str(&content[end..]);
            return out;
        }
        offset += existing.len();
    }

    let mut out = String::with_capacity(content.len() + line.len() + newline.len());
    out.push_str(&content[..insert_at]);
    out.push_str(&line);
    out.push_str(newline);
    out.push_str(rest);
    out
}

/// Set the status field to `done` and append a completion stamp.
pub fn stamp_completion(content: &str, timestamp: &str) -> String {
    let mut updated = status_re().replacen(content, 1, "${1} done").into_owned();
    updated.push_str(&format!("\n\n**Completed:** {timestamp}\n"));
    updated
}

/// Inject the issue link into the story file. Returns whether the file changed.
pub fn link_story_file(path: &Path, issue_id: &str, url: &str) -> Result<bool> {
    rewrite_story_file(path, |content| inject_issue_link(content, issue_id, url))
}

/// Stamp the story file as complete.
pub fn complete_story_file(path: &Path, timestamp: &str) -> Result<bool> {
    rewrite_story_file(path, |content| stamp_completion(content, timestamp))
}

fn rewrite_story_file(path: &Path, edit: impl FnOnce(&str) -> String) -> Result<bool> {
    let lease = FileLease::acquire(path, LEASE_TIMEOUT)?;
    tracing::trace!("holding {}", lease.lock_path().display());
    let content = std::fs::read_to_string(path).map_err(|source| SyncError::StoryUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let updated = edit(&content);
    if updated == content {
        return Ok(false);
    }
    atomic_write(path, updated.as_bytes())?;
    Ok(true)
}
