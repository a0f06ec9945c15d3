// ============================================================================
// splatreel-core/src/inference/command.rs
// ============================================================================
//
// COMMAND PREDICTOR: Per-Frame Inference via an External Command
//
// Runs a user-configured inference command once per frame. The frame is
// written to a temporary PNG, the command template is expanded and executed,
// and the command is expected to write a native Gaussian PLY to `{output}`.
//
// PLACEHOLDERS:
//   {input}       temporary PNG of the frame
//   {output}      native PLY path to write
//   {checkpoint}  local checkpoint path
//   {focal_px}    focal length in pixels (identical for every frame of a run)
//   {width}       frame width
//   {height}      frame height
//   {device}      default | cuda | cpu | mps
//   {resolution}  processing resolution
//   {eps}         low-pass filter epsilon
//
// The template is split into arguments like a shell would split it (single
// and double quotes group words); it is never passed to a shell.
//
// AI-ASSISTANT-INFO: External-command GaussianPredictor implementation

// ---- Internal crate imports ----
use super::checkpoint::{CheckpointCache, CheckpointFetcher};
use super::{Device, GaussianPredictor};
use crate::camera::CameraParams;
use crate::error::{CoreError, CoreResult};
use crate::ply::PlyHeader;
use crate::temp_files::{scratch_file, staging_path};
use crate::video::Frame;

// ---- External crate imports ----
use log::{debug, info, warn};

// ---- Standard library imports ----
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Placeholders every template must contain.
const REQUIRED_PLACEHOLDERS: [&str; 2] = ["{input}", "{output}"];

/// Number of trailing stderr lines kept in a failure message.
const STDERR_TAIL_LINES: usize = 8;

/// Predictor that shells out to an inference command per frame.
pub struct CommandPredictor {
    template: Vec<String>,
    checkpoint: CheckpointCache,
    fetcher: Box<dyn CheckpointFetcher>,
    checkpoint_path: Option<PathBuf>,
    device: Device,
    processing_resolution: u32,
    low_pass_filter_eps: f64,
}

impl CommandPredictor {
    /// Creates a predictor from a command template.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the template is empty, has unbalanced quotes, or
    /// lacks `{input}` or `{output}`.
    pub fn new(
        template: &str,
        checkpoint: CheckpointCache,
        fetcher: Box<dyn CheckpointFetcher>,
    ) -> CoreResult<Self> {
        let template = split_command_line(template)?;
        if template.is_empty() {
            return Err(CoreError::InvalidInput("predictor command is empty".to_string()));
        }
        for placeholder in REQUIRED_PLACEHOLDERS {
            if !template.iter().any(|arg| arg.contains(placeholder)) {
                return Err(CoreError::InvalidInput(format!(
                    "predictor command must contain {placeholder}"
                )));
            }
        }

        Ok(Self {
            template,
            checkpoint,
            fetcher,
            checkpoint_path: None,
            device: Device::default(),
            processing_resolution: crate::config::DEFAULT_PROCESSING_RESOLUTION,
            low_pass_filter_eps: crate::config::DEFAULT_LOW_PASS_FILTER_EPS,
        })
    }

    pub fn with_device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    pub fn with_processing_resolution(mut self, resolution: u32) -> Self {
        self.processing_resolution = resolution;
        self
    }

    pub fn with_low_pass_filter_eps(mut self, eps: f64) -> Self {
        self.low_pass_filter_eps = eps;
        self
    }

    /// Expands the template for one invocation.
    fn expand(&self, input: &Path, output: &Path, camera: &CameraParams, checkpoint: &Path) -> Vec<String> {
        let values = [
            ("{input}", input.to_string_lossy().into_owned()),
            ("{output}", output.to_string_lossy().into_owned()),
            ("{checkpoint}", checkpoint.to_string_lossy().into_owned()),
            ("{focal_px}", format!("{:.6}", camera.focal_length_px)),
            ("{width}", camera.width.to_string()),
            ("{height}", camera.height.to_string()),
            ("{device}", self.device.to_string()),
            ("{resolution}", self.processing_resolution.to_string()),
            ("{eps}", self.low_pass_filter_eps.to_string()),
        ];

        self.template
            .iter()
            .map(|arg| {
                values
                    .iter()
                    .fold(arg.clone(), |acc, (placeholder, value)| acc.replace(placeholder, value))
            })
            .collect()
    }
}

impl GaussianPredictor for CommandPredictor {
    fn prepare(&mut self) -> CoreResult<()> {
        let path = self.checkpoint.ensure(self.fetcher.as_ref())?;
        info!("Model checkpoint: {}", path.display());
        self.checkpoint_path = Some(path);
        Ok(())
    }

    fn infer(&mut self, frame: &Frame, camera: &CameraParams, native_path: &Path) -> CoreResult<usize> {
        let checkpoint = self
            .checkpoint_path
            .clone()
            .ok_or_else(|| CoreError::ModelUnavailable("predictor used before prepare()".to_string()))?;

        let scratch_dir = native_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let input = scratch_file(scratch_dir, &format!(".frame_{:06}", frame.index), "png")?;
        frame.save_png(input.path())?;

        // The command writes to a staging path; only a complete file is moved
        // to `native_path`.
        let staging = staging_path(scratch_dir, &format!(".native_{:06}", frame.index), "ply");
        let args = self.expand(input.path(), &staging, camera, &checkpoint);
        debug!("Running predictor for frame {}: {:?}", frame.index, args);

        let result = run_predictor(&args, frame.index).and_then(|()| native_gaussian_count(&staging));
        match result {
            Ok(count) => {
                fs::rename(&staging, native_path)?;
                Ok(count)
            }
            Err(e) => {
                if staging.exists() {
                    if let Err(remove_err) = fs::remove_file(&staging) {
                        warn!("Could not remove staging file {}: {}", staging.display(), remove_err);
                    }
                }
                Err(e)
            }
        }
    }
}

fn run_predictor(args: &[String], index: u64) -> CoreResult<()> {
    let output = Command::new(&args[0])
        .args(&args[1..])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| CoreError::InferenceFailure(format!("cannot start '{}': {}", args[0], e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let lines: Vec<&str> = stderr.lines().collect();
        let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
        return Err(CoreError::InferenceFailure(format!(
            "predictor exited with {} for frame {}: {}",
            output.status, index, tail
        )));
    }
    Ok(())
}

/// Reads the vertex count from the header of a native PLY written by a predictor.
pub fn native_gaussian_count(native_path: &Path) -> CoreResult<usize> {
    let file = File::open(native_path).map_err(|e| {
        CoreError::InferenceFailure(format!("predictor produced no output at {}: {}", native_path.display(), e))
    })?;
    let header = PlyHeader::read(&mut BufReader::new(file))?;
    header
        .element("vertex")
        .map(|vertex| vertex.count)
        .ok_or_else(|| CoreError::ConversionError(format!("vertex element not found in {}", native_path.display())))
}

/// Splits a command line into arguments. Whitespace separates words; single
/// quotes keep text literally; double quotes group words and allow `\"`.
pub fn split_command_line(line: &str) -> CoreResult<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => current.push(ch),
                        None => return Err(unbalanced(line)),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(ch @ ('"' | '\\')) => current.push(ch),
                            Some(ch) => {
                                current.push('\\');
                                current.push(ch);
                            }
                            None => return Err(unbalanced(line)),
                        },
                        Some(ch) => current.push(ch),
                        None => return Err(unbalanced(line)),
                    }
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    args.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }
    if in_word {
        args.push(current);
    }
    Ok(args)
}

fn unbalanced(line: &str) -> CoreError {
    CoreError::InvalidInput(format!("unbalanced quotes in command: {line}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::FocalSource;
    use crate::mocks::FailingFetcher;

    fn predictor_in(dir: &Path, template: &str) -> CoreResult<CommandPredictor> {
        let cache = CheckpointCache::new(dir.join("cache"), "https://example.com/sharp.pt")?;
        CommandPredictor::new(template, cache, Box::new(FailingFetcher::default()))
    }

    fn predictor(template: &str) -> CoreResult<CommandPredictor> {
        predictor_in(Path::new("unused"), template)
    }

    #[test]
    fn test_split_command_line() {
        assert_eq!(
            split_command_line(r#"sharp predict -i {input} --out "my dir/{output}" 'a b'"#).unwrap(),
            vec!["sharp", "predict", "-i", "{input}", "--out", "my dir/{output}", "a b"]
        );
        assert_eq!(split_command_line(r#"echo "say \"hi\"" '' x"#).unwrap(), vec!["echo", "say \"hi\"", "", "x"]);
        assert!(split_command_line("echo 'open").is_err());
        assert!(split_command_line("   ").unwrap().is_empty());
    }

    #[test]
    fn test_template_requires_input_and_output() {
        assert!(predictor("sharp {input}").is_err());
        assert!(predictor("").is_err());
        assert!(predictor("sharp {input} {output}").is_ok());
    }

    #[test]
    fn test_expand_substitutes_every_placeholder() {
        let predictor = predictor(
            "run {input} {output} --ckpt={checkpoint} -f {focal_px} {width}x{height} {device} {resolution} {eps}",
        )
        .unwrap()
        .with_device(Device::Cpu)
        .with_processing_resolution(1920);
        let camera = CameraParams {
            focal_length_px: 1000.5,
            width: 640,
            height: 480,
            source: FocalSource::Manual,
        };

        let args = predictor.expand(Path::new("in.png"), Path::new("out.ply"), &camera, Path::new("w.pt"));
        assert_eq!(
            args,
            vec![
                "run", "in.png", "out.ply", "--ckpt=w.pt", "-f", "1000.500000", "640x480", "cpu", "1920", "0.001"
            ]
        );
    }

    #[test]
    fn test_prepare_fails_without_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let mut predictor = predictor_in(dir.path(), "sharp {input} {output}").unwrap();
        assert!(matches!(predictor.prepare(), Err(CoreError::ModelUnavailable(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_infer_runs_command_and_counts_gaussians() {
        use crate::ply::{Gaussian, GaussianSet, PlyFormat};

        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("cache")).unwrap();
        // The "checkpoint" doubles as the PLY the command copies to {output}.
        let gaussian = Gaussian {
            position: [0.0, 0.0, 1.0],
            color_dc: [0.5, 0.5, 0.5],
            opacity: 0.0,
            scale: [-3.0, -3.0, -3.0],
            rotation: [1.0, 0.0, 0.0, 0.0],
        };
        GaussianSet::new(vec![gaussian; 5])
            .to_standard_ply(PlyFormat::BinaryLittleEndian)
            .write_to(&dir.path().join("cache").join("sharp.pt"))
            .unwrap();

        let mut predictor = predictor_in(dir.path(), "sh -c 'test -s \"$0\" && cp {checkpoint} \"$1\"' {input} {output}").unwrap();
        predictor.prepare().unwrap();

        let frame = Frame::new(4, 2, 1, vec![10, 20, 30, 40, 50, 60]).unwrap();
        let camera = CameraParams::resolve(2, 1, None, 50.0).unwrap();
        let native = dir.path().join("frame_000004.ply");
        assert_eq!(predictor.infer(&frame, &camera, &native).unwrap(), 5);
        assert!(native.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_infer_reports_command_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("cache")).unwrap();
        std::fs::write(dir.path().join("cache").join("sharp.pt"), b"w").unwrap();

        let mut predictor = predictor_in(dir.path(), "sh -c 'echo boom >&2; exit 3' {input} {output}").unwrap();
        predictor.prepare().unwrap();

        let frame = Frame::new(0, 1, 1, vec![0, 0, 0]).unwrap();
        let camera = CameraParams::resolve(1, 1, None, 50.0).unwrap();
        let err = predictor.infer(&frame, &camera, &dir.path().join("n.ply")).unwrap_err();
        assert!(matches!(err, CoreError::InferenceFailure(ref msg) if msg.contains("boom")));
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_command_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("cache")).unwrap();
        std::fs::write(dir.path().join("cache").join("sharp.pt"), b"w").unwrap();

        let mut predictor =
            predictor_in(dir.path(), "sh -c 'echo partial > \"$2\"; exit 2' sh {input} {output}").unwrap();
        predictor.prepare().unwrap();

        let frame = Frame::new(0, 1, 1, vec![0, 0, 0]).unwrap();
        let camera = CameraParams::resolve(1, 1, None, 50.0).unwrap();
        let native = dir.path().join("n.ply");
        assert!(predictor.infer(&frame, &camera, &native).is_err());

        assert!(!native.exists());
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .filter(|name| name != "cache")
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
    }

    #[test]
    fn test_infer_before_prepare_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut predictor = predictor("sharp {input} {output}").unwrap();
        let frame = Frame::new(0, 1, 1, vec![0, 0, 0]).unwrap();
        let camera = CameraParams::resolve(1, 1, Some(1.0), 50.0).unwrap();
        assert!(predictor.infer(&frame, &camera, &dir.path().join("n.ply")).is_err());
    }
}
