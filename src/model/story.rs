pub const METADATA_MARKER: &str = "## Story Metadata";
pub const TITLE_PREFIX: &str = "# ";
/// How many lines after the metadata marker are searched for labeled fields.
pub const METADATA_WINDOW: usize = 9;

pub const PRIORITY_LABEL: &str = "**Priority:**";
pub const AGENT_LABEL: &str = "**Agent:**";
pub const STATUS_LABEL: &str = "**Status:**";
pub const LINEAR_ISSUE_LABEL: &str = "**Linear Issue:**";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Story {
    pub title: String,
    pub priority: Option<String>,
    pub agent: Option<String>,
    pub status: Option<String>,
    /// Issue identifier injected by an earlier sync.
    pub linear_id: Option<String>,
}

impl Story {
    pub fn is_done(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case("done"))
    }
}

/// Extract the title and labeled metadata from a story file.
///
/// Returns `None` when the file has no `# ` title line. The metadata marker
/// is optional; without it only the title is filled in.
pub fn parse_story_metadata(content: &str) -> Option<Story> {
    let lines: Vec<&str> = content.split('\n').collect();

    let title = lines
        .iter()
        .find(|line| line.starts_with(TITLE_PREFIX))
        .map(|line| line[TITLE_PREFIX.len()..].trim().to_string())?;

    let mut story = Story {
        title,
        ..Story::default()
    };

    if let Some(start) = lines.iter().position(|line| line.contains(METADATA_MARKER)) {
        let window = lines.iter().skip(start + 1).take(METADATA_WINDOW);
        for line in window {
            if let Some(v) = label_value(line, PRIORITY_LABEL) {
                story.priority = Some(v);
            }
            if let Some(v) = label_value(line, AGENT_LABEL) {
                story.agent = Some(v);
            }
            if let Some(v) = label_value(line, STATUS_LABEL) {
                story.status = Some(v);
            }
            if let Some(v) = label_value(line, LINEAR_ISSUE_LABEL) {
                story.linear_id = Some(link_text(&v).to_string());
            }
        }
    }

    Some(story)
}

fn label_value(line: &str, label: &str) -> Option<String> {
    line.split_once(label).map(|(_, rest)| rest.trim().to_string())
}

/// `[ENG-12](https://...)` -> `ENG-12`; anything else is returned as is.
fn link_text(value: &str) -> &str {
    value
        .strip_prefix('[')
        .and_then(|rest| rest.split_once(']'))
        .map(|(text, _)| text.trim())
        .unwrap_or(value)
}
