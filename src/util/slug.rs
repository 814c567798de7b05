/// Lowercase `name` and drop every character outside `a-z`.
///
/// `"BMAD Development Stories"` becomes `"bmaddevelopmentstories"`,
/// `"In Progress"` becomes `"inprogress"`.
pub fn compact_slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase())
        .collect()
}

/// Make an agent id safe to embed in a file name.
pub fn file_safe(id: &str) -> String {
    let safe: String = id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = safe.trim_matches(|c| c == '-' || c == '.').to_string();
    if trimmed.is_empty() {
        "unknown".into()
    } else {
        trimmed
    }
}
