mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{files_with_prefix, options, Behavior, ConcatMode, StubConcatenator, StubEngine};
use parley::pipeline::{Pipeline, SegmentState};
use parley::{PipelineError, PipelineWarning};

fn pipeline(
    engine: StubEngine,
    concat: StubConcatenator,
    dir: &std::path::Path,
) -> (Pipeline, Arc<StubConcatenator>) {
    let (handle, _calls) = engine.into_handle();
    let concat = Arc::new(concat);
    let pipeline = Pipeline::new(handle, concat.clone(), options(dir));
    (pipeline, concat)
}

fn assert_no_scratch(dir: &std::path::Path) {
    assert!(
        files_with_prefix(dir, ".lines_").is_empty(),
        "Scratch directory should be removed"
    );
}

#[tokio::test]
async fn test_two_lines_agent_first() {
    let dir = tempfile::tempdir().unwrap();
    let (pipeline, _) = pipeline(StubEngine::writing(), StubConcatenator::joining(), dir.path());

    let report = pipeline
        .run("Agent: Hello.\nMember: Hi there.\n")
        .await
        .unwrap();

    let combined = std::fs::read_to_string(&report.output).unwrap();
    assert_eq!(combined, "Hello.|Hi there.|");
    assert_eq!(report.ready_count(), 2);
    assert_eq!(report.stats.assembled_segments, 2);
    assert_eq!(report.stats.cleanup_failures, 0);
    assert!(report.warnings.is_empty());

    let name = report.output.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("combined_conversation_") && name.ends_with(".mp3"));
    assert_no_scratch(dir.path());
}

#[tokio::test]
async fn test_voices_follow_speaker() {
    let dir = tempfile::tempdir().unwrap();
    let (handle, calls) = StubEngine::writing().into_handle();
    let pipeline = Pipeline::new(handle, Arc::new(StubConcatenator::joining()), options(dir.path()));

    pipeline
        .run("Agent: a\nMember: b\nAgent: c\n")
        .await
        .unwrap();

    let calls = calls.lock().unwrap();
    let voices: Vec<&str> = calls.iter().map(|(v, _)| v.as_str()).collect();
    assert_eq!(voices, vec!["en-f", "en-m", "en-f"]);

    let names: Vec<String> = calls
        .iter()
        .map(|(_, p)| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["line_001.wav", "line_002.wav", "line_003.wav"]);
}

#[tokio::test]
async fn test_narrator_line_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let (pipeline, concat) =
        pipeline(StubEngine::writing(), StubConcatenator::joining(), dir.path());

    let report = pipeline
        .run("Agent: Welcome.\nNarrator: A pause.\nMember: Thanks.\n")
        .await
        .unwrap();

    assert_eq!(report.segments.len(), 2);
    assert_eq!(report.skipped_lines, vec![2]);
    assert_eq!(report.stats.skipped_lines, 1);
    assert_eq!(concat.manifests.lock().unwrap()[0].len(), 2);
    assert_eq!(
        std::fs::read_to_string(&report.output).unwrap(),
        "Welcome.|Thanks.|"
    );
}

#[tokio::test]
async fn test_empty_segment_is_excluded_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let engine = StubEngine::new(|text| {
        if text == "silent" {
            Behavior::Empty
        } else {
            Behavior::Write
        }
    });
    let (pipeline, _) = pipeline(engine, StubConcatenator::joining(), dir.path());

    let report = pipeline
        .run("Agent: one\nMember: silent\nAgent: three\n")
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(&report.output).unwrap(), "one|three|");
    assert_eq!(report.segments[1].state, SegmentState::Empty);
    assert_eq!(report.ready_count(), 2);
    assert_eq!(report.stats.empty, 1);
    assert!(matches!(
        report.warnings.as_slice(),
        [PipelineWarning::EmptySegment { line_index: 2, .. }]
    ));
    assert_no_scratch(dir.path());
}

#[tokio::test]
async fn test_fire_and_forget_backend_is_awaited() {
    let dir = tempfile::tempdir().unwrap();
    let engine = StubEngine::new(|_| Behavior::WriteLater(Duration::from_millis(50)));
    let (pipeline, _) = pipeline(engine, StubConcatenator::joining(), dir.path());

    let report = pipeline.run("Agent: later\nMember: still\n").await.unwrap();

    assert_eq!(std::fs::read_to_string(&report.output).unwrap(), "later|still|");
    assert!(report.stats.max_wait_ms >= 50);
}

#[tokio::test]
async fn test_wav_segments_report_duration() {
    let dir = tempfile::tempdir().unwrap();
    let engine = StubEngine::new(|_| Behavior::OneSecondWav);
    let (pipeline, _) = pipeline(engine, StubConcatenator::joining(), dir.path());

    let report = pipeline.run("Agent: Hello.\nMember: Hi there.\n").await.unwrap();

    assert!(report.segments.iter().all(|s| s.audio_ms == Some(1000)));
    assert_eq!(report.stats.audio_ms, 2000);
    assert!(std::fs::metadata(&report.output).unwrap().len() > 0);
}

#[tokio::test]
async fn test_repeat_runs_keep_order_and_distinct_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let (pipeline, _) = pipeline(StubEngine::writing(), StubConcatenator::joining(), dir.path());
    let raw = "Agent: first\nMember: second\nAgent: third\n";

    let a = pipeline.run(raw).await.unwrap();
    let b = pipeline.run(raw).await.unwrap();

    assert_ne!(a.output, b.output, "Each run gets its own artifact");
    assert_eq!(
        std::fs::read(&a.output).unwrap(),
        std::fs::read(&b.output).unwrap()
    );
    assert_eq!(files_with_prefix(dir.path(), "combined_conversation_").len(), 2);
    assert_no_scratch(dir.path());
}

#[tokio::test]
async fn test_timeout_aborts_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let engine = StubEngine::new(|text| {
        if text == "stuck" {
            Behavior::Never
        } else {
            Behavior::Write
        }
    });
    let (pipeline, concat) = pipeline(engine, StubConcatenator::joining(), dir.path());

    let err = pipeline
        .run("Agent: fine\nMember: stuck\nAgent: never reached\n")
        .await
        .unwrap_err();

    match err {
        PipelineError::Timeout { line_index, path, .. } => {
            assert_eq!(line_index, 2);
            assert!(path.ends_with("line_002.wav"));
        }
        other => panic!("Expected Timeout, got {:?}", other),
    }
    assert!(concat.manifests.lock().unwrap().is_empty(), "Nothing should be assembled");
    assert!(files_with_prefix(dir.path(), "combined_conversation_").is_empty());
    assert_no_scratch(dir.path());
}

#[tokio::test]
async fn test_hung_request_times_out() {
    let dir = tempfile::tempdir().unwrap();
    let (pipeline, concat) = pipeline(
        StubEngine::new(|_| Behavior::Hang),
        StubConcatenator::joining(),
        dir.path(),
    );

    let started = std::time::Instant::now();
    let err = pipeline.run("Agent: a\nMember: b\n").await.unwrap_err();

    assert!(matches!(err, PipelineError::Timeout { line_index: 1, .. }));
    assert!(started.elapsed() >= Duration::from_millis(400));
    assert!(concat.manifests.lock().unwrap().is_empty());
    assert!(files_with_prefix(dir.path(), "combined_conversation_").is_empty());
    assert_no_scratch(dir.path());
}

#[tokio::test]
async fn test_synthesis_error_names_line() {
    let dir = tempfile::tempdir().unwrap();
    let engine = StubEngine::new(|text| {
        if text == "boom" {
            Behavior::Fail
        } else {
            Behavior::Write
        }
    });
    let (pipeline, _) = pipeline(engine, StubConcatenator::joining(), dir.path());

    let err = pipeline.run("Agent: ok\nMember: boom\n").await.unwrap_err();

    assert!(matches!(err, PipelineError::Synthesis { line_index: 2, .. }));
    assert!(err.to_string().contains("line 2"));
    assert!(err.to_string().contains("voice exploded"));
    assert_no_scratch(dir.path());
}

#[tokio::test]
async fn test_all_empty_segments_fail_with_no_segments() {
    let dir = tempfile::tempdir().unwrap();
    let (pipeline, _) = pipeline(
        StubEngine::new(|_| Behavior::Empty),
        StubConcatenator::joining(),
        dir.path(),
    );

    let err = pipeline.run("Agent: a\nMember: b\n").await.unwrap_err();

    assert!(matches!(err, PipelineError::NoSegments));
    assert_no_scratch(dir.path());
}

#[tokio::test]
async fn test_transcript_without_speakers_fails_with_no_segments() {
    let dir = tempfile::tempdir().unwrap();
    let (pipeline, _) = pipeline(StubEngine::writing(), StubConcatenator::joining(), dir.path());

    let err = pipeline.run("Narrator: silence\n").await.unwrap_err();
    assert!(matches!(err, PipelineError::NoSegments));
}

#[tokio::test]
async fn test_assembly_failure_leaves_no_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let (pipeline, _) = pipeline(
        StubEngine::writing(),
        StubConcatenator::new(ConcatMode::FailAfterPartialWrite),
        dir.path(),
    );

    let err = pipeline.run("Agent: a\nMember: b\n").await.unwrap_err();

    assert!(matches!(err, PipelineError::Assembly(_)));
    assert!(err.to_string().contains("Invalid data"));
    assert!(files_with_prefix(dir.path(), "combined_conversation_").is_empty());
    assert!(files_with_prefix(dir.path(), ".combined_conversation_").is_empty());
    assert_no_scratch(dir.path());
}

#[tokio::test]
async fn test_empty_transcript_touches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let (handle, calls) = StubEngine::writing().into_handle();
    let pipeline = Pipeline::new(handle, Arc::new(StubConcatenator::joining()), options(&out));

    let err = pipeline.run("   \n").await.unwrap_err();

    assert!(matches!(err, PipelineError::EmptyTranscript));
    assert!(calls.lock().unwrap().is_empty());
    assert!(!out.exists(), "Output directory is only created once synthesis starts");
}

#[tokio::test]
async fn test_empty_catalog_aborts_before_synthesis() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let (handle, calls) = StubEngine::writing().with_voices(vec![]).into_handle();
    let pipeline = Pipeline::new(handle, Arc::new(StubConcatenator::joining()), options(&out));

    let err = pipeline.run("Agent: hi\n").await.unwrap_err();

    assert!(matches!(err, PipelineError::NoVoicesAvailable));
    assert!(calls.lock().unwrap().is_empty());
    assert!(!out.exists());
}
