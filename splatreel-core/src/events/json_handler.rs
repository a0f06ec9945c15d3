//! Machine-readable event stream.
//!
//! Each event becomes one JSON object on its own line, tagged with `type` and
//! a Unix `timestamp`, for scripts that drive a run and follow its progress.

use super::{Event, EventHandler};
use serde_json::{Value, json};
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Writes events as JSON lines, stdout by default.
pub struct JsonProgressHandler {
    output: Mutex<Box<dyn Write + Send>>,
}

impl Default for JsonProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonProgressHandler {
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            output: Mutex::new(writer),
        }
    }

    fn emit_line(&self, mut value: Value) {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
        if let Value::Object(fields) = &mut value {
            fields.insert("timestamp".to_string(), json!(now));
        }

        let Ok(mut output) = self.output.lock() else {
            return;
        };
        // A closed stdout must not stop the run.
        let written = serde_json::to_writer(&mut *output, &value)
            .map_err(io::Error::from)
            .and_then(|()| output.write_all(b"\n"))
            .and_then(|()| output.flush());
        if let Err(e) = written {
            log::debug!("Could not write JSON progress line: {}", e);
        }
    }
}

impl EventHandler for JsonProgressHandler {
    fn handle(&self, event: &Event) {
        let value = match event {
            Event::RunStarted {
                video_path,
                video,
                first_frame,
                last_frame,
            } => json!({
                "type": "run_started",
                "video_path": video_path,
                "video": video,
                "first_frame": first_frame,
                "last_frame": last_frame
            }),

            Event::CameraResolved { camera } => json!({
                "type": "camera_resolved",
                "focal_length_px": camera.focal_length_px,
                "width": camera.width,
                "height": camera.height,
                "source": camera.source
            }),

            Event::ModelReady => json!({
                "type": "model_ready"
            }),

            Event::SessionCreated { session_dir } => json!({
                "type": "session_created",
                "session_dir": session_dir
            }),

            Event::FrameStatus {
                index,
                level,
                message,
                output_path,
            } => json!({
                "type": "frame_status",
                "index": index,
                "level": level,
                "message": message,
                "output_path": output_path
            }),

            Event::Progress { completed, total } => {
                let percent = if *total == 0 {
                    100.0
                } else {
                    *completed as f64 * 100.0 / *total as f64
                };
                json!({
                    "type": "progress",
                    "completed": completed,
                    "total": total,
                    "percent": percent
                })
            }

            Event::RunFinished {
                succeeded,
                warnings,
                errors,
                cancelled,
                elapsed,
            } => json!({
                "type": "run_finished",
                "succeeded": succeeded,
                "warnings": warnings,
                "errors": errors,
                "cancelled": cancelled,
                "elapsed_seconds": elapsed.as_secs_f64()
            }),

            Event::RunAborted { kind, message } => json!({
                "type": "run_aborted",
                "error_kind": kind,
                "message": message
            }),
        };

        self.emit_line(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::StatusLevel;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_one_json_object_per_line() {
        let buffer = SharedBuffer::default();
        let handler = JsonProgressHandler::with_writer(Box::new(buffer.clone()));

        handler.handle(&Event::FrameStatus {
            index: 3,
            level: StatusLevel::Error,
            message: "decode failed".to_string(),
            output_path: None,
        });
        handler.handle(&Event::Progress { completed: 1, total: 4 });

        let text = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<serde_json::Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "frame_status");
        assert_eq!(lines[0]["level"], "error");
        assert_eq!(lines[0]["index"], 3);
        assert_eq!(lines[1]["percent"], 25.0);
    }
}
