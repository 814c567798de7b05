use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const STORY_EXTENSION: &str = "md";

/// Story files directly inside `dir` with the given extension, sorted.
/// A missing directory means there is nothing to scan.
pub fn scan_story_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list stories in {}", dir.display()))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| path.extension().is_some_and(|ext| ext == extension))
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_markdown_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2.story.md"), "# B").unwrap();
        std::fs::write(dir.path().join("1.story.md"), "# A").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        std::fs::write(dir.path().join("README"), "x").unwrap();
        std::fs::create_dir(dir.path().join("archive.md")).unwrap();

        let files = scan_story_files(dir.path(), STORY_EXTENSION).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["1.story.md", "2.story.md"]);
    }

    #[test]
    fn missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files = scan_story_files(&dir.path().join("nope"), STORY_EXTENSION).unwrap();
        assert!(files.is_empty());
    }
}
