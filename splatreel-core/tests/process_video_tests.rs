// splatreel-core/tests/process_video_tests.rs

use splatreel_core::config::{CoreConfig, CoreConfigBuilder};
use splatreel_core::events::{Event, EventDispatcher, EventHandler, StatusLevel};
use splatreel_core::inference::{CheckpointCache, CheckpointFetcher, CommandPredictor, FetchedBody};
use splatreel_core::mocks::{FakeFrameSource, FakePredictor};
use splatreel_core::ply::{GaussianSet, PlyData, PlyFormat};
use splatreel_core::processing::{CancellationToken, FrameNaming, process_video};
use splatreel_core::settings::{RunSettings, SettingsStore};
use splatreel_core::{CoreError, CoreResult, FocalSource};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

// Records every event for later inspection
#[derive(Default)]
struct Recorder(Mutex<Vec<Event>>);

impl EventHandler for Recorder {
    fn handle(&self, event: &Event) {
        self.0.lock().unwrap().push(event.clone());
    }
}

impl Recorder {
    fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }
}

fn dispatcher() -> (EventDispatcher, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let mut dispatcher = EventDispatcher::new();
    dispatcher.add_handler(recorder.clone());
    (dispatcher, recorder)
}

fn config(output_dir: &Path, start: u64, end: Option<u64>) -> CoreConfig {
    CoreConfigBuilder::new()
        .video_path(PathBuf::from("/videos/walk.mp4"))
        .output_dir(output_dir.to_path_buf())
        .frame_range(start, end)
        .build()
        .unwrap()
}

fn sorted_file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_range_produces_one_standard_file_per_frame() {
    let out = tempdir().unwrap();
    let source = FakeFrameSource::new(10, 8, 6);
    let mut predictor = FakePredictor::new(4);
    let (events, recorder) = dispatcher();

    let summary = process_video(
        &source,
        &mut predictor,
        &config(out.path(), 2, Some(4)),
        &events,
        &CancellationToken::new(),
    )
    .unwrap();

    assert!(summary.is_success());
    assert_eq!(summary.status_line(), "3 succeeded");
    assert_eq!(source.decoded(), vec![2, 3, 4]);
    assert!(summary.session_dir.starts_with(out.path().join("walk")));

    let naming = FrameNaming::new(
        splatreel_core::config::DEFAULT_ATTRIBUTION,
        splatreel_core::config::DEFAULT_FORMAT_TAG,
    );
    let expected: Vec<String> = (2..=4).map(|i| naming.standard_file_name(i)).collect();
    assert_eq!(sorted_file_names(&summary.session_dir), expected);
    assert_eq!(
        summary.output_files(),
        expected.iter().map(|n| summary.session_dir.join(n)).collect::<Vec<_>>()
    );

    // Output holds only the vertex element, with the predictor's Gaussians.
    let data = PlyData::read_from(&summary.output_files()[1]).unwrap();
    assert_eq!(data.header.format, PlyFormat::BinaryLittleEndian);
    assert_eq!(data.header.elements.len(), 1);
    assert_eq!(GaussianSet::from_ply(&data).unwrap(), predictor.frame_gaussians(3));

    let progress: Vec<(u64, u64)> = recorder
        .events()
        .iter()
        .filter_map(|e| match e {
            Event::Progress { completed, total } => Some((*completed, *total)),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3)]);
    assert!(matches!(
        recorder.events().last(),
        Some(Event::RunFinished { succeeded: 3, warnings: 0, errors: 0, cancelled: false, .. })
    ));
}

#[test]
fn test_decode_failure_is_isolated_to_its_frame() {
    let out = tempdir().unwrap();
    let source = FakeFrameSource::new(10, 8, 6).fail_decode_at(3);
    let mut predictor = FakePredictor::default();
    let (events, recorder) = dispatcher();

    let summary = process_video(
        &source,
        &mut predictor,
        &config(out.path(), 2, Some(4)),
        &events,
        &CancellationToken::new(),
    )
    .unwrap();

    assert_eq!(summary.status_line(), "2 succeeded, 1 error");
    assert!(summary.is_success());
    assert_eq!(summary.frames[1].index, 3);
    assert_eq!(summary.frames[1].level, StatusLevel::Error);
    assert_eq!(sorted_file_names(&summary.session_dir).len(), 2);

    let error_statuses = recorder
        .events()
        .iter()
        .filter(|e| matches!(e, Event::FrameStatus { index: 3, level: StatusLevel::Error, .. }))
        .count();
    assert_eq!(error_statuses, 1);
}

#[test]
fn test_inference_failure_leaves_no_partial_file() {
    let out = tempdir().unwrap();
    let source = FakeFrameSource::new(5, 8, 6);
    let mut predictor = FakePredictor::default().fail_infer_at(1);
    let (events, _recorder) = dispatcher();

    let summary = process_video(
        &source,
        &mut predictor,
        &config(out.path(), 0, Some(2)),
        &events,
        &CancellationToken::new(),
    )
    .unwrap();

    assert_eq!(summary.status_line(), "2 succeeded, 1 error");
    let names = sorted_file_names(&summary.session_dir);
    assert_eq!(names.len(), 2);
    assert!(names.iter().all(|n| n.ends_with("_standard.ply")));
}

#[test]
fn test_model_unavailable_aborts_before_any_output() {
    let out = tempdir().unwrap();
    let source = FakeFrameSource::new(10, 8, 6);
    let mut predictor = FakePredictor::default().failing_prepare();
    let (events, recorder) = dispatcher();

    let result = process_video(
        &source,
        &mut predictor,
        &config(out.path(), 0, None),
        &events,
        &CancellationToken::new(),
    );

    assert!(matches!(result, Err(CoreError::ModelUnavailable(_))));
    assert!(source.decoded().is_empty());
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);

    let recorded = recorder.events();
    let aborts: Vec<&Event> = recorded.iter().filter(|e| matches!(e, Event::RunAborted { .. })).collect();
    assert_eq!(aborts.len(), 1);
    assert!(matches!(aborts[0], Event::RunAborted { kind: "model_unavailable", .. }));
    assert!(!recorded.iter().any(|e| matches!(e, Event::RunFinished { .. } | Event::FrameStatus { .. })));
}

#[test]
fn test_missing_input_aborts() {
    let out = tempdir().unwrap();
    let source = FakeFrameSource::new(10, 8, 6).missing();
    let mut predictor = FakePredictor::default();
    let (events, recorder) = dispatcher();

    let result = process_video(
        &source,
        &mut predictor,
        &config(out.path(), 0, None),
        &events,
        &CancellationToken::new(),
    );

    assert!(matches!(result, Err(CoreError::InputNotFound(_))));
    assert!(predictor.calls().is_empty());
    assert_eq!(recorder.events().len(), 1);
}

#[test]
fn test_start_past_open_end_is_invalid() {
    let out = tempdir().unwrap();
    let source = FakeFrameSource::new(10, 8, 6);
    let mut predictor = FakePredictor::default();
    let (events, _recorder) = dispatcher();

    let result = process_video(
        &source,
        &mut predictor,
        &config(out.path(), 12, None),
        &events,
        &CancellationToken::new(),
    );

    assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

fn assert_range_aborts(start: u64, end: Option<u64>) {
    let out = tempdir().unwrap();
    let source = FakeFrameSource::new(10, 8, 6);
    let mut predictor = FakePredictor::default();
    let (events, recorder) = dispatcher();

    let result = process_video(
        &source,
        &mut predictor,
        &config(out.path(), start, end),
        &events,
        &CancellationToken::new(),
    );

    assert!(matches!(result, Err(CoreError::InvalidInput(_))), "{start}..={end:?}: {result:?}");
    assert!(source.decoded().is_empty());
    assert!(predictor.calls().is_empty());
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    assert!(matches!(
        recorder.events().as_slice(),
        [Event::RunAborted { kind: "invalid_input", .. }]
    ));
}

#[test]
fn test_end_past_last_frame_aborts() {
    assert_range_aborts(8, Some(10));
}

#[test]
fn test_unbounded_end_aborts() {
    assert_range_aborts(0, Some(u64::MAX));
}

#[test]
fn test_start_past_end_with_explicit_end_aborts() {
    assert_range_aborts(20, Some(25));
}

#[test]
fn test_last_frame_is_inclusive() {
    let out = tempdir().unwrap();
    let source = FakeFrameSource::new(10, 8, 6);
    let mut predictor = FakePredictor::default();
    let (events, _recorder) = dispatcher();

    let summary = process_video(
        &source,
        &mut predictor,
        &config(out.path(), 8, Some(9)),
        &events,
        &CancellationToken::new(),
    )
    .unwrap();

    assert_eq!(summary.status_line(), "2 succeeded");
    assert_eq!(source.decoded(), vec![8, 9]);
}

// Writes a truncated body while advertising a longer one
struct TruncatedFetcher;

impl CheckpointFetcher for TruncatedFetcher {
    fn fetch(&self, _url: &str, dest: &mut dyn Write) -> CoreResult<FetchedBody> {
        dest.write_all(b"partial weights")?;
        Ok(FetchedBody {
            bytes_written: 15,
            expected_len: Some(4096),
        })
    }
}

#[test]
fn test_unverified_checkpoint_download_aborts_before_first_frame() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");
    let cache_dir = dir.path().join("checkpoints");
    let cache = CheckpointCache::new(&cache_dir, "https://models.example.com/sharp/sharp.pt").unwrap();
    let mut predictor =
        CommandPredictor::new("predict {input} {output} --ckpt {checkpoint}", cache, Box::new(TruncatedFetcher))
            .unwrap();
    let source = FakeFrameSource::new(10, 8, 6);
    let (events, recorder) = dispatcher();

    let result = process_video(&source, &mut predictor, &config(&out, 0, None), &events, &CancellationToken::new());

    assert!(matches!(result, Err(CoreError::ModelUnavailable(_))), "{result:?}");
    assert!(source.decoded().is_empty());
    assert!(!out.exists());
    assert_eq!(fs::read_dir(&cache_dir).unwrap().count(), 0);

    let recorded = recorder.events();
    let aborts = recorded.iter().filter(|e| matches!(e, Event::RunAborted { .. })).count();
    assert_eq!(aborts, 1);
    assert!(matches!(recorded.last(), Some(Event::RunAborted { kind: "model_unavailable", .. })));
    assert!(!recorded.iter().any(|e| matches!(e, Event::FrameStatus { .. } | Event::SessionCreated { .. })));
}

#[test]
fn test_focal_length_is_constant_across_frames() {
    let out = tempdir().unwrap();
    let source = FakeFrameSource::new(6, 1920, 1080);
    let mut predictor = FakePredictor::new(1);
    let (events, recorder) = dispatcher();

    let summary = process_video(
        &source,
        &mut predictor,
        &config(out.path(), 0, None),
        &events,
        &CancellationToken::new(),
    )
    .unwrap();

    assert_eq!(predictor.calls().len(), 6);
    let focal = summary.camera.focal_length_px;
    assert!(predictor.calls().iter().all(|(_, f)| *f == focal));
    assert!(matches!(summary.camera.source, FocalSource::Estimated { .. }));
    let expected = 960.0 / (25.0f64).to_radians().tan();
    assert!((focal - expected).abs() < 1e-6);

    let resolved = recorder
        .events()
        .iter()
        .filter(|e| matches!(e, Event::CameraResolved { .. }))
        .count();
    assert_eq!(resolved, 1);
}

#[test]
fn test_manual_focal_length_wins() {
    let out = tempdir().unwrap();
    let source = FakeFrameSource::new(3, 640, 480);
    let mut predictor = FakePredictor::new(1);
    let (events, _recorder) = dispatcher();
    let config = CoreConfigBuilder::new()
        .video_path(PathBuf::from("clip.mov"))
        .output_dir(out.path().to_path_buf())
        .focal_length_override(Some(1234.5))
        .fov_degrees(90.0)
        .build()
        .unwrap();

    let summary = process_video(&source, &mut predictor, &config, &events, &CancellationToken::new()).unwrap();

    assert_eq!(summary.camera.source, FocalSource::Manual);
    assert!(predictor.calls().iter().all(|(_, f)| *f == 1234.5));
}

#[test]
fn test_runs_never_share_a_session_directory() {
    let out = tempdir().unwrap();
    let source = FakeFrameSource::new(3, 8, 6);
    let config = config(out.path(), 0, Some(1));
    let (events, _recorder) = dispatcher();

    let first = process_video(&source, &mut FakePredictor::default(), &config, &events, &CancellationToken::new())
        .unwrap();
    let second = process_video(&source, &mut FakePredictor::default(), &config, &events, &CancellationToken::new())
        .unwrap();

    assert_ne!(first.session_dir, second.session_dir);
    assert_eq!(sorted_file_names(&first.session_dir).len(), 2);
    assert_eq!(sorted_file_names(&second.session_dir).len(), 2);
}

#[test]
fn test_cancellation_stops_between_frames() {
    let out = tempdir().unwrap();
    let source = FakeFrameSource::new(10, 8, 6);
    let cancel = CancellationToken::new();
    let mut predictor = FakePredictor::default().cancel_after(2, cancel.clone());
    let (events, recorder) = dispatcher();

    let summary = process_video(&source, &mut predictor, &config(out.path(), 0, None), &events, &cancel).unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.frames.len(), 2);
    assert_eq!(summary.status_line(), "2 succeeded (cancelled)");
    assert_eq!(sorted_file_names(&summary.session_dir).len(), 2);
    assert!(matches!(
        recorder.events().last(),
        Some(Event::RunFinished { cancelled: true, .. })
    ));
}

#[test]
fn test_native_output_kept_when_conversion_disabled() {
    let out = tempdir().unwrap();
    let source = FakeFrameSource::new(2, 8, 6);
    let mut predictor = FakePredictor::default();
    let (events, _recorder) = dispatcher();
    let config = CoreConfigBuilder::new()
        .video_path(PathBuf::from("walk.mp4"))
        .output_dir(out.path().to_path_buf())
        .convert_to_standard(false)
        .build()
        .unwrap();

    let summary = process_video(&source, &mut predictor, &config, &events, &CancellationToken::new()).unwrap();

    let naming = FrameNaming::new(config.attribution.clone(), config.format_tag.clone());
    assert_eq!(
        sorted_file_names(&summary.session_dir),
        vec![naming.native_file_name(0), naming.native_file_name(1)]
    );
    let data = PlyData::read_from(&summary.output_files()[0]).unwrap();
    assert!(data.header.elements.len() > 1);
}

#[test]
fn test_settings_seed_the_run() {
    let dir = tempdir().unwrap();
    let store = SettingsStore::new(dir.path().join("settings").join("settings.json"));

    // Missing document: defaults.
    let mut settings = store.load();
    assert_eq!(settings, RunSettings::default());

    settings.set("start_frame", "1").unwrap();
    settings.set("end_frame", "2").unwrap();
    settings.set("focal_length_override", "800").unwrap();
    store.save(&settings).unwrap();

    let config = CoreConfigBuilder::from_settings(&store.load())
        .video_path(PathBuf::from("walk.mp4"))
        .output_dir(dir.path().join("out"))
        .build()
        .unwrap();

    let source = FakeFrameSource::new(5, 8, 6);
    let mut predictor = FakePredictor::default();
    let (events, _recorder) = dispatcher();
    let summary = process_video(&source, &mut predictor, &config, &events, &CancellationToken::new()).unwrap();

    assert_eq!((summary.first_frame, summary.last_frame), (1, 2));
    assert_eq!(predictor.calls(), &[(1, 800.0), (2, 800.0)]);
}
