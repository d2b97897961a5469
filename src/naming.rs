//! Output naming.
//!
//! Captured slides are named `{label}_{sequence}.{ext}`, where the label is
//! a lecture number pulled from the source file name, so that slides from
//! different videos can share one output directory. Documents take the
//! source file's stem with a `.pdf` extension.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use regex::Regex;

/// Label used when no lecture number can be found.
pub const UNKNOWN_LABEL: &str = "unknown";

static NUMBERED_LECTURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"第(\d+)讲").expect("valid lecture pattern"));

static LATIN_LECTURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z])lec(?:ture)?[\s_.\-]*(\d+)").expect("valid lecture pattern")
});

/// Derive the slide label from a video's file name.
///
/// ```
/// use slidegrab::lecture_label;
///
/// assert_eq!(lecture_label("分子生物学第12讲.mp4"), "12");
/// assert_eq!(lecture_label("Lecture_03 - Kinetics.mkv"), "03");
/// assert_eq!(lecture_label("recording.mp4"), "unknown");
/// ```
pub fn lecture_label(file_name: &str) -> String {
    [&NUMBERED_LECTURE, &LATIN_LECTURE]
        .iter()
        .find_map(|pattern| pattern.captures(file_name))
        .and_then(|captures| captures.get(1))
        .map(|number| number.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
}

/// Label for the video at `path`, from its file name.
pub fn label_for_path(path: &Path) -> String {
    path.file_name()
        .map(|name| lecture_label(&name.to_string_lossy()))
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string())
}

/// File name of a captured slide.
pub fn slide_file_name(label: &str, sequence: u32, extension: &str) -> String {
    format!("{label}_{sequence}.{extension}")
}

/// Document path for `video` inside `output_directory`.
pub fn document_path(output_directory: &Path, video: &Path) -> PathBuf {
    let stem = video
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
    output_directory.join(format!("{stem}.pdf"))
}

/// Slides of `label` already present in `directory`, sorted by path.
///
/// Only names of the exact `{label}_{sequence}.{extension}` form count. A
/// missing or unreadable directory has no slides.
pub fn existing_slides(directory: &Path, label: &str, extension: &str) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(directory) else {
        return Vec::new();
    };
    let prefix = format!("{label}_");
    let suffix = format!(".{extension}");

    let mut slides: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(&suffix))
                .is_some_and(|sequence| {
                    !sequence.is_empty() && sequence.bytes().all(|byte| byte.is_ascii_digit())
                })
        })
        .map(|entry| entry.path())
        .collect();
    slides.sort();
    slides
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chinese_lecture_number() {
        assert_eq!(lecture_label("第3讲 细胞结构.mp4"), "3");
        assert_eq!(lecture_label("课程-第105讲-复习.flv"), "105");
    }

    #[test]
    fn chinese_pattern_wins_over_latin() {
        assert_eq!(lecture_label("lecture 9 第4讲.mp4"), "4");
    }

    #[test]
    fn latin_lecture_number() {
        assert_eq!(lecture_label("lec7.mp4"), "7");
        assert_eq!(lecture_label("CS101-LECTURE-12.mp4"), "12");
        assert_eq!(lecture_label("lecture.mp4"), UNKNOWN_LABEL);
        assert_eq!(lecture_label("electrode_5.mp4"), UNKNOWN_LABEL);
    }

    #[test]
    fn slide_names() {
        assert_eq!(slide_file_name("12", 3, "jpg"), "12_3.jpg");
        assert_eq!(slide_file_name(UNKNOWN_LABEL, 1, "png"), "unknown_1.png");
    }

    #[test]
    fn document_replaces_extension() {
        let path = document_path(Path::new("/out"), Path::new("/videos/第2讲.mp4"));
        assert_eq!(path, Path::new("/out/第2讲.pdf"));

        let path = document_path(Path::new("out"), Path::new("notes.v2.mkv"));
        assert_eq!(path, Path::new("out/notes.v2.pdf"));
    }

    #[test]
    fn label_from_path() {
        assert_eq!(label_for_path(Path::new("/a/b/第8讲.mp4")), "8");
        assert_eq!(label_for_path(Path::new("/")), UNKNOWN_LABEL);
    }

    #[test]
    fn existing_slides_match_label_and_extension() {
        let directory = tempfile::tempdir().unwrap();
        for name in ["3_1.jpg", "3_12.jpg", "3_x.jpg", "33_1.jpg", "3_2.png", "3_.jpg"] {
            fs::write(directory.path().join(name), b"").unwrap();
        }

        let found = existing_slides(directory.path(), "3", "jpg");

        assert_eq!(
            found,
            vec![directory.path().join("3_1.jpg"), directory.path().join("3_12.jpg")]
        );
        assert!(existing_slides(&directory.path().join("absent"), "3", "jpg").is_empty());
    }
}
