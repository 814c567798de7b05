use regex::Regex;
use std::sync::OnceLock;

pub const DEV_RECORD_SECTION: &str = "Dev Agent Record";

static CHECKBOX_RE: OnceLock<Regex> = OnceLock::new();
static CHECKED_RE: OnceLock<Regex> = OnceLock::new();

fn checkbox_re() -> &'static Regex {
    CHECKBOX_RE.get_or_init(|| Regex::new(r"- \[[ x]\]").unwrap())
}

fn checked_re() -> &'static Regex {
    CHECKED_RE.get_or_init(|| Regex::new(r"- \[x\]").unwrap())
}

/// Body of the `## <heading>` section: everything after the heading up to the
/// next `##` or the end of the text.
pub fn section_body<'a>(content: &'a str, heading: &str) -> Option<&'a str> {
    let marker = format!("## {heading}");
    let start = content.find(&marker)? + marker.len();
    let rest = &content[start..];
    let end = rest.find("##").unwrap_or(rest.len());
    Some(&rest[..end])
}

/// `(checked, total)` checkbox counts.
pub fn count_checkboxes(body: &str) -> (usize, usize) {
    let total = checkbox_re().find_iter(body).count();
    let checked = checked_re().find_iter(body).count();
    (checked, total)
}

/// A story is complete when its Dev Agent Record has at least one checkbox
/// and every checkbox is ticked.
pub fn evaluate_completion(content: &str) -> bool {
    let Some(body) = section_body(content, DEV_RECORD_SECTION) else {
        return false;
    };
    let (checked, total) = count_checkboxes(body);
    total > 0 && checked == total
}
