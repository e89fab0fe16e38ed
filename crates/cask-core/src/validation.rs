//! Folder and file name validation
//!
//! Components are normalized (whitespace becomes hyphens) and then checked
//! strictly: every character must match, not just one. The upstream
//! behavior this replaces accepted any name containing at least one legal
//! character; that presence test is rejected here on purpose.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

// Folder segments: alphanumerics, hyphens, underscores.
static FOLDER_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex"));

// File names additionally allow dots for extensions, but never ".." and
// never a leading dot.
static FILE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-][A-Za-z0-9._-]*$").expect("valid regex"));

/// Replace every run of whitespace with a single hyphen.
pub fn normalize_component(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    let mut in_whitespace = false;
    for c in component.trim().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('-');
            }
            in_whitespace = true;
        } else {
            out.push(c);
            in_whitespace = false;
        }
    }
    out
}

/// Validate a normalized folder. Slash-separated segments are each checked
/// independently; empty segments (leading/trailing/double slashes) reject.
pub fn validate_folder(folder: &str) -> Result<()> {
    if folder.is_empty() {
        return Err(Error::Validation("Folder must not be empty".to_string()));
    }
    for segment in folder.split('/') {
        if segment.is_empty() || !FOLDER_SEGMENT.is_match(segment) {
            return Err(Error::Validation(format!(
                "Invalid folder '{}': segments may contain only letters, digits, hyphens and underscores",
                folder
            )));
        }
    }
    Ok(())
}

/// Validate a normalized file name.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Validation("File name must not be empty".to_string()));
    }
    if name.contains("..") {
        return Err(Error::Validation(format!(
            "Invalid file name '{}': path traversal is not allowed",
            name
        )));
    }
    if !FILE_NAME.is_match(name) {
        return Err(Error::Validation(format!(
            "Invalid file name '{}': only letters, digits, hyphens, underscores and dots are allowed",
            name
        )));
    }
    Ok(())
}

/// Build the object path for a validated folder/name pair.
pub fn object_path(folder: &str, name: &str) -> String {
    format!("{}/{}", folder, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_whitespace_to_hyphens() {
        assert_eq!(normalize_component("my file"), "my-file");
        assert_eq!(normalize_component("  padded  name "), "padded-name");
        assert_eq!(normalize_component("tab\tseparated"), "tab-separated");
        assert_eq!(normalize_component("already-clean"), "already-clean");
    }

    #[test]
    fn accepts_valid_components() {
        assert!(validate_folder("avatars").is_ok());
        assert!(validate_folder("users/42/avatars").is_ok());
        assert!(validate_name("photo.png").is_ok());
        assert!(validate_name("my-file_1.jpg").is_ok());
        assert!(validate_name("noextension").is_ok());
    }

    // The implementation this replaces used a presence test: a name was
    // accepted when it contained at least one legal character. These names
    // would have slipped through; the strict check rejects them.
    #[test]
    fn rejects_names_with_any_illegal_character() {
        assert!(validate_name("file*.png").is_err());
        assert!(validate_name("file?.png").is_err());
        assert!(validate_name("ok-part/bad").is_err());
        assert!(validate_folder("folder with space").is_err());
        assert!(validate_folder("folder*").is_err());
    }

    #[test]
    fn rejects_traversal_and_empty_segments() {
        assert!(validate_name("..").is_err());
        assert!(validate_name("a..b.png").is_err());
        assert!(validate_name(".hidden").is_err());
        assert!(validate_folder("").is_err());
        assert!(validate_folder("/leading").is_err());
        assert!(validate_folder("double//slash").is_err());
    }

    #[test]
    fn path_joins_folder_and_name() {
        assert_eq!(object_path("avatars", "photo.png"), "avatars/photo.png");
    }
}
