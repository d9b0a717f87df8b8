//! Integration tests for the pipeline orchestrator against a scripted backend.

use async_trait::async_trait;
use breach_core::{
    BackendClient, BreachError, ExtractResult, ImageUpload, ManualInput, PipelineOrchestrator,
    Position, ResultStore, SolveResult, SubmitRequest, Token,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Backend double that records what it was asked and answers from a script
#[derive(Default)]
struct ScriptedBackend {
    extract_calls: AtomicUsize,
    solve_calls: AtomicUsize,
    fail_extract: bool,
    fail_solve: bool,
    solved_inputs: Mutex<Vec<ExtractResult>>,
}

impl ScriptedBackend {
    fn extract_calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }

    fn solve_calls(&self) -> usize {
        self.solve_calls.load(Ordering::SeqCst)
    }
}

fn extracted_from_image() -> ExtractResult {
    ExtractResult {
        buffer_size: 6,
        grid: vec![vec!["1C".into(), "55".into()], vec!["BD".into(), "E9".into()]],
        targets: vec![vec!["55".into(), "BD".into()]],
        matrix_image: Some("ZnJvbS1pbWFnZQ==".into()),
        grid_boxes: vec![vec![[0, 0, 8, 8], [8, 0, 8, 8]], vec![[0, 8, 8, 8], [8, 8, 8, 8]]],
        elapsed: Duration::from_millis(900),
        errors: None,
    }
}

#[async_trait]
impl BackendClient for ScriptedBackend {
    async fn extract(&self, _image: &ImageUpload) -> Result<ExtractResult, BreachError> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_extract {
            return Err(BreachError::transport("/extract", "HTTP 500"));
        }
        Ok(extracted_from_image())
    }

    async fn solve(&self, extract: &ExtractResult) -> Result<SolveResult, BreachError> {
        self.solve_calls.fetch_add(1, Ordering::SeqCst);
        self.solved_inputs.lock().unwrap().push(extract.clone());
        if self.fail_solve {
            return Err(BreachError::decode("/breach", "missing field `score`"));
        }
        Ok(SolveResult {
            score: 1.0,
            sequence: vec![Position(0, 1), Position(1, 1)],
            sequence_text: vec!["55".into(), "E9".into()],
            solution_image: None,
            elapsed: Duration::from_millis(30),
            errors: None,
        })
    }
}

fn orchestrator(backend: ScriptedBackend) -> (PipelineOrchestrator, Arc<ScriptedBackend>, Arc<ResultStore>) {
    let backend = Arc::new(backend);
    let store = Arc::new(ResultStore::new());
    let orchestrator = PipelineOrchestrator::new(backend.clone(), store.clone());
    (orchestrator, backend, store)
}

fn upload() -> ImageUpload {
    ImageUpload::new("screen.png", vec![0x89, b'P', b'N', b'G'])
}

fn manual_fields() -> ManualInput {
    ManualInput {
        targets: Some("1C 1C\n55 7A".into()),
        grid: Some("1C 55 7A\n\nBD 1C E9\n7A 55 1C".into()),
        buffer_size: Some(5),
        ..Default::default()
    }
}

// =============================================================================
// Decision policy
// =============================================================================

#[tokio::test]
async fn test_chained_success_from_upload() {
    let (orchestrator, backend, store) = orchestrator(ScriptedBackend::default());

    let tokens = orchestrator
        .run(&SubmitRequest::new().with_image(upload()))
        .await
        .unwrap();

    let data_token = tokens.data_token.expect("data token");
    let solve_token = tokens.solve_token.expect("solve token");
    assert_eq!(backend.extract_calls(), 1);
    assert_eq!(backend.solve_calls(), 1);
    assert_eq!(store.len(), 2);

    assert_eq!(
        store.fetch::<ExtractResult>(data_token.as_str(), true),
        Some(extracted_from_image())
    );
    let solved = store.fetch::<SolveResult>(solve_token.as_str(), true).unwrap();
    assert_eq!(solved.sequence_text, vec!["55", "E9"]);

    assert!(store.fetch::<ExtractResult>(data_token.as_str(), true).is_none());
    assert!(store.fetch::<SolveResult>(solve_token.as_str(), true).is_none());
}

#[tokio::test]
async fn test_upload_takes_precedence_over_manual_fields() {
    let (orchestrator, backend, _store) = orchestrator(ScriptedBackend::default());

    let request = SubmitRequest::new()
        .with_image(upload())
        .with_manual(manual_fields());
    orchestrator.run(&request).await.unwrap();

    assert_eq!(backend.extract_calls(), 1);
    let solved = backend.solved_inputs.lock().unwrap();
    assert_eq!(solved.len(), 1);
    assert_eq!(solved[0], extracted_from_image());
}

#[tokio::test]
async fn test_manual_path_skips_extract() {
    let (orchestrator, backend, store) = orchestrator(ScriptedBackend::default());

    let tokens = orchestrator
        .run(&SubmitRequest::new().with_manual(manual_fields()))
        .await
        .unwrap();

    assert_eq!(backend.extract_calls(), 0);
    assert_eq!(backend.solve_calls(), 1);

    let data = store
        .fetch::<ExtractResult>(tokens.data_token.unwrap().as_str(), true)
        .unwrap();
    assert_eq!(data.buffer_size, 5);
    assert_eq!(data.targets, vec![vec!["1C", "1C"], vec!["55", "7A"]]);
    assert_eq!(data.grid.len(), 3);
}

#[tokio::test]
async fn test_empty_upload_falls_through_to_manual() {
    let (orchestrator, backend, _store) = orchestrator(ScriptedBackend::default());

    let request = SubmitRequest::new()
        .with_image(ImageUpload::new("empty.png", Vec::new()))
        .with_manual(manual_fields());
    let tokens = orchestrator.run(&request).await.unwrap();

    assert_eq!(backend.extract_calls(), 0);
    assert!(tokens.data_token.is_some());
}

#[tokio::test]
async fn test_no_op_without_upload_or_targets() {
    let (orchestrator, backend, store) = orchestrator(ScriptedBackend::default());

    let mut manual = manual_fields();
    manual.targets = Some(String::new());
    let tokens = orchestrator
        .run(&SubmitRequest::new().with_manual(manual))
        .await
        .unwrap();

    assert!(tokens.is_empty());
    assert_eq!(backend.extract_calls(), 0);
    assert_eq!(backend.solve_calls(), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_prior_extraction_supplies_image_and_geometry() {
    let (orchestrator, backend, store) = orchestrator(ScriptedBackend::default());
    let prior = store.store(extracted_from_image());

    let request = SubmitRequest::new()
        .with_manual(manual_fields())
        .with_prior_data_token(prior.clone());
    orchestrator.run(&request).await.unwrap();

    let solved = backend.solved_inputs.lock().unwrap();
    assert_eq!(solved[0].matrix_image.as_deref(), Some("ZnJvbS1pbWFnZQ=="));
    assert_eq!(solved[0].grid_boxes, extracted_from_image().grid_boxes);
    assert_eq!(solved[0].buffer_size, 5);

    // Carrying forward is a peek, the prior entry is still there
    assert!(store.fetch::<ExtractResult>(prior.as_str(), false).is_some());
}

#[tokio::test]
async fn test_unknown_prior_token_is_ignored() {
    let (orchestrator, backend, _store) = orchestrator(ScriptedBackend::default());

    let request = SubmitRequest::new()
        .with_manual(manual_fields())
        .with_prior_data_token(Token::from("stale"));
    let tokens = orchestrator.run(&request).await.unwrap();

    assert!(tokens.solve_token.is_some());
    assert!(backend.solved_inputs.lock().unwrap()[0].matrix_image.is_none());
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_extract_failure_aborts_pipeline() {
    let (orchestrator, backend, store) = orchestrator(ScriptedBackend {
        fail_extract: true,
        ..Default::default()
    });

    let err = orchestrator
        .run(&SubmitRequest::new().with_image(upload()))
        .await
        .unwrap_err();

    assert!(matches!(err, BreachError::Transport { .. }));
    assert_eq!(backend.solve_calls(), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_solve_failure_stores_nothing() {
    let (orchestrator, _backend, store) = orchestrator(ScriptedBackend {
        fail_solve: true,
        ..Default::default()
    });

    let err = orchestrator
        .run(&SubmitRequest::new().with_image(upload()))
        .await
        .unwrap_err();

    assert!(matches!(err, BreachError::Decode { .. }));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_failure_does_not_poison_next_request() {
    let (failing, _, store) = orchestrator(ScriptedBackend {
        fail_extract: true,
        ..Default::default()
    });
    assert!(failing.run(&SubmitRequest::new().with_image(upload())).await.is_err());

    let healthy = PipelineOrchestrator::new(Arc::new(ScriptedBackend::default()), store.clone());
    let tokens = healthy.run(&SubmitRequest::new().with_image(upload())).await.unwrap();
    assert!(tokens.data_token.is_some() && tokens.solve_token.is_some());
}
