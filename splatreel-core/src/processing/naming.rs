//! Output layout: session directories and per-frame file names.
//!
//! ```text
//! {output_dir}/{video_name}/{YYYYmmdd_HHMMSS}[_N]/
//!     frame_000002_{attribution}_{format_tag}.ply
//!     frame_000003_{attribution}_{format_tag}.ply
//! ```

use crate::error::{CoreError, CoreResult};

use chrono::{DateTime, Local};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Timestamp format of session directory names.
pub const SESSION_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Upper bound on `_N` suffixes tried for one timestamp.
const MAX_SESSION_SUFFIX: u32 = 1000;

pub fn session_timestamp(now: DateTime<Local>) -> String {
    now.format(SESSION_TIMESTAMP_FORMAT).to_string()
}

/// Creates a fresh session directory for one run.
///
/// Never reuses an existing directory: if `{video_name}/{timestamp}` already
/// exists (two runs within one second), `_1`, `_2`, ... is appended.
pub fn create_session_dir(output_dir: &Path, video_name: &str, timestamp: &str) -> CoreResult<PathBuf> {
    let video_dir = output_dir.join(sanitize_component(video_name));
    fs::create_dir_all(&video_dir)?;

    for suffix in 0..=MAX_SESSION_SUFFIX {
        let name = match suffix {
            0 => timestamp.to_string(),
            n => format!("{timestamp}_{n}"),
        };
        let candidate = video_dir.join(name);
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(CoreError::PathError(format!(
        "no free session directory for {} under {}",
        timestamp,
        video_dir.display()
    )))
}

/// Replaces characters that cannot appear in a single path component.
fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':' | '\0') { '_' } else { c })
        .collect();
    match cleaned.trim() {
        "" | "." | ".." => "video".to_string(),
        _ => cleaned,
    }
}

/// File names of one run's per-frame outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameNaming {
    pub attribution: String,
    pub format_tag: String,
}

impl FrameNaming {
    pub fn new(attribution: impl Into<String>, format_tag: impl Into<String>) -> Self {
        Self {
            attribution: attribution.into(),
            format_tag: format_tag.into(),
        }
    }

    /// `frame_{index:06}_{attribution}.ply`, written by the predictor.
    pub fn native_file_name(&self, index: u64) -> String {
        format!("frame_{index:06}_{}.ply", self.attribution)
    }

    /// `frame_{index:06}_{attribution}_{format_tag}.ply`, the converted output.
    pub fn standard_file_name(&self, index: u64) -> String {
        format!("frame_{index:06}_{}_{}.ply", self.attribution, self.format_tag)
    }
}

/// Extracts the frame index embedded in an output file name.
pub fn parse_frame_index(file_name: &str) -> Option<u64> {
    let rest = file_name.strip_prefix("frame_")?;
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    if digits.len() < 6 {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_session_timestamp_format() {
        let when = Local.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(session_timestamp(when), "20250309_140507");
    }

    #[test]
    fn test_session_dir_never_reused() {
        let out = tempfile::tempdir().unwrap();
        let first = create_session_dir(out.path(), "walk", "20250309_140507").unwrap();
        let second = create_session_dir(out.path(), "walk", "20250309_140507").unwrap();
        let third = create_session_dir(out.path(), "walk", "20250309_140507").unwrap();

        assert_eq!(first, out.path().join("walk").join("20250309_140507"));
        assert_eq!(second, out.path().join("walk").join("20250309_140507_1"));
        assert_eq!(third, out.path().join("walk").join("20250309_140507_2"));
    }

    #[test]
    fn test_video_name_is_sanitized() {
        assert_eq!(sanitize_component("a/b"), "a_b");
        assert_eq!(sanitize_component(".."), "video");
        assert_eq!(sanitize_component("clip 01"), "clip 01");
    }

    #[test]
    fn test_frame_file_names() {
        let naming = FrameNaming::new("Shramko_4DGS_apple-Sharp_Generator", "standard");
        assert_eq!(naming.native_file_name(3), "frame_000003_Shramko_4DGS_apple-Sharp_Generator.ply");
        assert_eq!(
            naming.standard_file_name(1234567),
            "frame_1234567_Shramko_4DGS_apple-Sharp_Generator_standard.ply"
        );
    }

    #[test]
    fn test_parse_frame_index() {
        let naming = FrameNaming::new("attr", "standard");
        assert_eq!(parse_frame_index(&naming.standard_file_name(42)), Some(42));
        assert_eq!(parse_frame_index(&naming.native_file_name(0)), Some(0));
        assert_eq!(parse_frame_index("frame_12_x.ply"), None);
        assert_eq!(parse_frame_index("settings.json"), None);
    }
}
