use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use connect_menu::Answer;
use regex::Regex;

use crate::connect::OutboundFile;
use crate::observability::DialogueEvent;

fn compile_regex(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(_compile_err) => match Regex::new(r"$^") {
            Ok(fallback) => fallback,
            Err(fallback_err) => panic!("hardcoded fallback regex must compile: {fallback_err}"),
        },
    }
}

static IMAGE_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"(?i)\.(png|jpg|jpeg|bmp)$"));

/// Whether a file is sent as an inline image rather than a document.
#[must_use]
pub fn is_image_file(file_name: &str) -> bool {
    IMAGE_EXTENSION.is_match(file_name)
}

/// Maps configured attachment names onto the files directory.
pub(super) struct FileResolver {
    root: PathBuf,
}

impl FileResolver {
    pub(super) fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Attachment of `answer`; `None` when it has none or the file is missing.
    pub(super) fn resolve(&self, answer: &Answer) -> Option<OutboundFile> {
        let name = answer.file.trim();
        if name.is_empty() {
            return None;
        }
        let path = self.root.join(name);
        if !path.is_file() {
            tracing::warn!(
                event = DialogueEvent::FileMissing.as_str(),
                path = %path.display(),
                "configured attachment not found; skipping"
            );
            return None;
        }
        let file_name = Path::new(name)
            .file_name()
            .map_or_else(|| name.to_string(), |n| n.to_string_lossy().into_owned());
        Some(OutboundFile {
            is_image: is_image_file(&file_name),
            file_name,
            path,
            caption: answer.file_text.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_detection_is_case_insensitive() {
        assert!(is_image_file("scheme.PNG"));
        assert!(is_image_file("photo.jpeg"));
        assert!(!is_image_file("price.pdf"));
        assert!(!is_image_file("png"));
    }

    #[test]
    fn missing_files_are_skipped() {
        let resolver = FileResolver::new(PathBuf::from("/nonexistent-connect-bot-files"));
        let answer = Answer {
            chat: String::new(),
            file: "manual.pdf".to_string(),
            file_text: "Manual".to_string(),
        };
        assert!(resolver.resolve(&answer).is_none());
        assert!(resolver.resolve(&Answer::default()).is_none());
    }
}
