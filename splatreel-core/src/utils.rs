//! Utility functions for formatting and file operations.
//!
//! General-purpose helpers used throughout the splatreel-core library:
//! duration and byte formatting, video file recognition and path handling.

use crate::error::{CoreError, CoreResult};

use std::path::Path;

/// Container extensions accepted as video input (case-insensitive).
pub const SUPPORTED_VIDEO_EXTENSIONS: [&str; 8] =
    ["mp4", "avi", "mov", "mkv", "webm", "m4v", "flv", "wmv"];

/// Checks if the given path has a supported video container extension.
/// Existence is not checked.
#[must_use]
pub fn has_video_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_VIDEO_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Formats seconds compactly: "12.3s", "1m 2.0s", "1h 2m 3.0s".
/// Returns "?" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "?".to_string();
    }

    if seconds < 60.0 {
        return format!("{seconds:.1}s");
    }

    let whole_minutes = (seconds / 60.0).floor() as u64;
    let secs = seconds - (whole_minutes * 60) as f64;
    if whole_minutes < 60 {
        return format!("{whole_minutes}m {secs:.1}s");
    }

    let hours = whole_minutes / 60;
    let minutes = whole_minutes % 60;
    format!("{hours}h {minutes}m {secs:.1}s")
}

/// Formats bytes with appropriate binary units (B, KiB, MiB, GiB).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;

    let bytes_f64 = bytes as f64;
    if bytes_f64 >= GIB {
        format!("{:.2} GiB", bytes_f64 / GIB)
    } else if bytes_f64 >= MIB {
        format!("{:.2} MiB", bytes_f64 / MIB)
    } else if bytes_f64 >= KIB {
        format!("{:.2} KiB", bytes_f64 / KIB)
    } else {
        format!("{bytes} B")
    }
}

/// Parses an ffprobe rational such as "30000/1001" or a plain number.
/// Returns None for zero denominators and non-positive results.
#[must_use]
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let num = num.trim().parse::<f64>().ok()?;
            let den = den.trim().parse::<f64>().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse::<f64>().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Safely extracts the file stem from a path.
pub fn get_file_stem_safe(path: &Path) -> CoreResult<String> {
    Ok(path
        .file_stem()
        .ok_or_else(|| CoreError::PathError(format!("Failed to get file stem for {}", path.display())))?
        .to_string_lossy()
        .to_string())
}

/// Returns the size of a file in bytes.
pub fn get_file_size(path: &Path) -> CoreResult<u64> {
    Ok(std::fs::metadata(path)?.len())
}
