mod common;

use common::{FakeDownloader, FakeRunner, FakeSeparator, scratch_dir, test_config};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use voxprep::config::AppConfig;
use voxprep::domain::entities::{AudioBuffer, Subject};
use voxprep::domain::errors::AppError;
use voxprep::infrastructure::audio::read_wav;
use voxprep::pipeline::{Pipeline, Upload};

struct Harness {
    root: PathBuf,
    config: AppConfig,
    runner: Arc<FakeRunner>,
    separations: Arc<AtomicUsize>,
}

impl Harness {
    fn new(name: &str, runner: FakeRunner) -> Self {
        let root = scratch_dir(name);
        let config = test_config(&root);
        Harness {
            root,
            config,
            runner: Arc::new(runner),
            separations: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn pipeline(&self, audio: Option<AudioBuffer>, fail_separation_at: Option<usize>) -> Pipeline {
        let separator = FakeSeparator {
            calls: self.separations.clone(),
            fail_at: fail_separation_at,
        };
        Pipeline::with_runner(&self.config, self.runner.clone())
            .unwrap()
            .with_downloader(Box::new(FakeDownloader { audio }))
            .with_separator(Box::new(separator))
            .with_progress(false)
    }

    fn subject_dir(&self, slug: &str) -> PathBuf {
        self.root.join("data").join(slug)
    }
}

fn stereo_clip(seconds_tenths: usize) -> AudioBuffer {
    let frames = seconds_tenths * 800;
    AudioBuffer::new(vec![0.25; frames * 2], 8000, 2, 16)
}

#[test]
fn training_builds_vocal_dataset_and_runs_toolchain() {
    let harness = Harness::new("train-ok", FakeRunner::default());
    let subject = Subject::new("Nina Simone").unwrap();

    let report = harness
        .pipeline(Some(stereo_clip(25)), None)
        .train(&subject, "https://youtu.be/abc")
        .unwrap();

    assert_eq!(report.segments, 3);
    assert_eq!(report.vocals, 3);
    assert_eq!(report.substitutions, 2);

    let dir = harness.subject_dir("Nina_Simone");
    assert!(dir.join("origin.mp3").is_file());
    assert!(!dir.join("split").exists());
    assert!(!dir.join("tmp").exists());

    for (i, frames) in [(1, 8000), (2, 8000), (3, 4000)] {
        let vocal = read_wav(&dir.join("vocal").join(format!("Nina_Simone{}.wav", i))).unwrap();
        assert_eq!(vocal.channels, 1);
        assert_eq!(vocal.bits_per_sample, 16);
        assert_eq!(vocal.frames(), frames);
    }

    let config = fs::read_to_string(dir.join("config.yaml")).unwrap();
    assert!(config.contains("raw_data_dir: data/Nina_Simone/vocal"));
    assert!(!config.contains("${artist_name}"));

    let calls = harness.runner.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].args[0].ends_with("preprocessing/binarize.py"));
    assert!(calls[1].args[0].ends_with("run.py"));
    assert!(calls[1].args.windows(2).any(|w| w == ["--exp_name", "Nina_Simone"]));
    for call in calls.iter() {
        assert!(call.envs.iter().any(|(k, v)| k == "CUDA_VISIBLE_DEVICES" && v == "0"));
        assert!(call.envs.iter().any(|(k, _)| k == "PYTHONPATH"));
    }
}

#[test]
fn failed_download_stops_before_segmentation() {
    let harness = Harness::new("train-no-video", FakeRunner::default());
    let subject = Subject::new("nina").unwrap();

    let err = harness.pipeline(None, None).train(&subject, "https://youtu.be/gone").unwrap_err();

    assert!(matches!(err, AppError::VideoNotFound(_)));
    assert!(!harness.subject_dir("nina").join("split").exists());
    assert!(harness.runner.calls.lock().unwrap().is_empty());
}

#[test]
fn separation_failure_aborts_remaining_clips() {
    let harness = Harness::new("train-separation", FakeRunner::default());
    let subject = Subject::new("nina").unwrap();

    let err = harness
        .pipeline(Some(stereo_clip(40)), Some(2))
        .train(&subject, "https://youtu.be/abc")
        .unwrap_err();

    assert!(matches!(err, AppError::ProcessFailed { .. }));
    assert_eq!(harness.separations.load(Ordering::SeqCst), 2);
    assert!(!harness.subject_dir("nina").join("vocal").exists());
    assert!(harness.subject_dir("nina").join("split").join("nina4.wav").is_file());
}

#[test]
fn non_zero_binarize_exit_is_reported_and_skips_training() {
    let harness = Harness::new("train-binarize", FakeRunner::failing_on("binarize.py"));
    let subject = Subject::new("nina").unwrap();

    let err = harness
        .pipeline(Some(stereo_clip(10)), None)
        .train(&subject, "https://youtu.be/abc")
        .unwrap_err();

    match err {
        AppError::ProcessFailed { code, stderr, .. } => {
            assert_eq!(code, Some(1));
            assert_eq!(stderr, "python failed");
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(harness.runner.calls.lock().unwrap().len(), 1);
    assert!(harness.subject_dir("nina").join("config.yaml").is_file());
}

fn trained_subject(harness: &Harness, slug: &str) -> Subject {
    let dir = harness.subject_dir(slug);
    fs::create_dir_all(dir.join("checkpoints")).unwrap();
    fs::write(dir.join("checkpoints/model_ckpt_steps_1000.ckpt"), b"").unwrap();
    fs::write(dir.join("checkpoints/model_ckpt_steps_2000.ckpt"), b"").unwrap();
    fs::write(dir.join("config.yaml"), "speaker: nina\n").unwrap();
    Subject::new(slug).unwrap()
}

#[test]
fn inference_stages_inputs_and_archives_results() {
    let harness = Harness::new("infer-ok", FakeRunner::default());
    let subject = trained_subject(&harness, "nina");
    let stale = harness.root.join("diff-svc/raw/old.wav");
    fs::create_dir_all(stale.parent().unwrap()).unwrap();
    fs::write(&stale, b"").unwrap();

    let pipeline = harness.pipeline(None, None);
    let files = pipeline
        .store_uploads(
            &subject,
            vec![
                Upload { file_name: "song.wav".to_string(), bytes: b"RIFF".to_vec() },
                Upload { file_name: String::new(), bytes: Vec::new() },
            ],
        )
        .unwrap();
    assert_eq!(files.len(), 1);

    let report = pipeline.infer(&subject, &files).unwrap();

    assert_eq!(report.inputs, 1);
    assert!(report.checkpoint.ends_with("model_ckpt_steps_2000.ckpt"));
    assert!(harness.subject_dir("nina").join("results.zip").is_file());
    assert!(harness.root.join("diff-svc/raw/audio/song.wav").is_file());
    assert!(!stale.exists());

    let lines = harness.runner.command_lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("infer.py"));
    assert!(lines[0].contains("--model_path"));
    assert!(lines[0].ends_with("--artist_name nina"));
    assert!(lines[1].starts_with("zip -r"));
}

#[test]
fn inference_without_checkpoint_is_model_not_found() {
    let harness = Harness::new("infer-no-model", FakeRunner::default());
    fs::create_dir_all(harness.subject_dir("nina")).unwrap();
    let subject = Subject::new("nina").unwrap();

    let err = harness
        .pipeline(None, None)
        .infer(&subject, &[PathBuf::from("song.wav")])
        .unwrap_err();

    assert!(matches!(err, AppError::ModelNotFound(_)));
    assert!(harness.runner.calls.lock().unwrap().is_empty());
}

#[test]
fn inference_with_no_files_is_empty_upload() {
    let harness = Harness::new("infer-empty", FakeRunner::default());
    let subject = trained_subject(&harness, "nina");

    let err = harness.pipeline(None, None).infer(&subject, &[]).unwrap_err();

    assert!(matches!(err, AppError::EmptyUpload));
}

#[test]
fn failed_inference_is_not_archived() {
    let harness = Harness::new("infer-fail", FakeRunner::failing_on("infer.py"));
    let subject = trained_subject(&harness, "nina");
    let input = harness.root.join("song.wav");
    fs::write(&input, b"RIFF").unwrap();

    let err = harness.pipeline(None, None).infer(&subject, &[input]).unwrap_err();

    assert!(matches!(err, AppError::ProcessFailed { .. }));
    assert!(!harness.subject_dir("nina").join("results.zip").exists());
}

#[test]
fn uploads_for_unknown_subject_are_refused() {
    let harness = Harness::new("infer-unknown", FakeRunner::default());
    let subject = Subject::new("ghost").unwrap();

    let err = harness
        .pipeline(None, None)
        .store_uploads(&subject, vec![Upload { file_name: "a.wav".to_string(), bytes: vec![1] }])
        .unwrap_err();

    assert!(matches!(err, AppError::ModelNotFound(_)));
    assert!(!harness.subject_dir("ghost").exists());
}

#[test]
fn subjects_lists_data_directories() {
    let harness = Harness::new("subjects", FakeRunner::default());
    fs::create_dir_all(harness.subject_dir("zed")).unwrap();
    fs::create_dir_all(harness.subject_dir("amy")).unwrap();
    assert_eq!(harness.pipeline(None, None).subjects().unwrap(), vec!["amy", "zed"]);
}

#[test]
fn silent_download_is_video_not_found() {
    let harness = Harness::new("train-empty-audio", FakeRunner::default());
    let subject = Subject::new("nina").unwrap();

    let err = harness
        .pipeline(Some(AudioBuffer::mono(Vec::new(), 8000)), None)
        .train(&subject, "https://youtu.be/silent")
        .unwrap_err();

    assert!(matches!(err, AppError::VideoNotFound(_)));
    assert_eq!(harness.separations.load(Ordering::SeqCst), 0);
    assert!(harness.runner.calls.lock().unwrap().is_empty());
    assert!(!harness.subject_dir("nina").join("config.yaml").exists());
}

#[test]
fn retraining_drops_clips_from_an_earlier_run() {
    let harness = Harness::new("train-retrain", FakeRunner::default());
    let subject = Subject::new("nina").unwrap();
    let vocal_dir = harness.subject_dir("nina").join("vocal");
    fs::create_dir_all(&vocal_dir).unwrap();
    fs::write(vocal_dir.join("nina9.wav"), b"stale").unwrap();

    harness
        .pipeline(Some(stereo_clip(15)), None)
        .train(&subject, "https://youtu.be/abc")
        .unwrap();

    let mut names: Vec<String> = fs::read_dir(&vocal_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["nina1.wav", "nina2.wav"]);
}
