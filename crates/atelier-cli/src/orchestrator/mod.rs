//! Runs one generation attempt against the service and turns every ending
//! into a [`GenerationOutcome`].

mod image;
mod video;

use atelier_core::config::ModelConfig;
use atelier_core::media::MediaStore;
use atelier_core::{GenerationOutcome, GenerationTicket, OutputKind, StatusPublisher, StudioError};
use genai_rs::{GenAiError, GenerativeService};
use std::sync::Arc;
use std::time::Duration;

use crate::credential::CredentialGate;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Internal failure before it is classified for the user.
#[derive(Debug)]
enum Failure {
    Studio(StudioError),
    Service(GenAiError),
}

impl From<StudioError> for Failure {
    fn from(err: StudioError) -> Self {
        Failure::Studio(err)
    }
}

impl From<GenAiError> for Failure {
    fn from(err: GenAiError) -> Self {
        Failure::Service(err)
    }
}

pub struct Orchestrator {
    service: Arc<dyn GenerativeService>,
    gate: CredentialGate,
    store: MediaStore,
    models: ModelConfig,
    poll_interval: Duration,
    status: StatusPublisher,
}

impl Orchestrator {
    pub fn new(
        service: Arc<dyn GenerativeService>,
        gate: CredentialGate,
        store: MediaStore,
        models: ModelConfig,
    ) -> Self {
        Self {
            service,
            gate,
            store,
            models,
            poll_interval: DEFAULT_POLL_INTERVAL,
            status: StatusPublisher::detached(),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_status(mut self, status: StatusPublisher) -> Self {
        self.status = status;
        self
    }

    pub fn store(&self) -> &MediaStore {
        &self.store
    }

    /// Run the attempt described by `ticket`. Never fails: errors come back as
    /// [`GenerationOutcome::Failed`].
    pub async fn run(&self, ticket: &GenerationTicket) -> GenerationOutcome {
        let result = match ticket.kind {
            OutputKind::Video => video::generate(self, ticket).await,
            OutputKind::Create | OutputKind::Edit => image::generate(self, ticket).await,
        };
        match result {
            Ok(outcome) => outcome,
            Err(Failure::Studio(err)) => {
                tracing::warn!(error = %err, "generation aborted");
                GenerationOutcome::Failed(err)
            }
            Err(Failure::Service(err)) if err.is_not_found() => {
                tracing::warn!(error = %err, "credential rejected by service");
                if let Err(select_err) = self.gate.reselect().await {
                    tracing::warn!(error = %select_err, "credential reselection failed");
                }
                GenerationOutcome::Failed(StudioError::CredentialRejected(err.to_string()))
            }
            Err(Failure::Service(err)) => {
                tracing::warn!(error = %err, "generation failed");
                GenerationOutcome::Failed(StudioError::Service(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::CredentialFlow;
    use async_trait::async_trait;
    use atelier_core::media::{MediaType, ReferenceFile};
    use atelier_core::{
        AspectRatio, ImageTier, QualityMode, Snapshot, SnapshotChanges, Studio, VideoTier,
    };
    use genai_rs::{
        ContentRequest, ContentResponse, Download, InlineData, Operation, Part, VideoRequest,
    };
    use serde_json::json;
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;
    use tokio::time::Instant;

    type EventLog = Arc<Mutex<Vec<&'static str>>>;

    #[derive(Default)]
    struct FakeService {
        events: EventLog,
        content: Mutex<VecDeque<genai_rs::Result<ContentResponse>>>,
        operations: Mutex<VecDeque<Operation>>,
        download: Mutex<Option<Download>>,
        content_requests: Mutex<Vec<ContentRequest>>,
        video_requests: Mutex<Vec<VideoRequest>>,
        polls: Mutex<Vec<Instant>>,
        downloads: Mutex<Vec<String>>,
    }

    impl FakeService {
        fn with_content(resp: genai_rs::Result<ContentResponse>) -> Arc<Self> {
            let service = Self::default();
            service.content.lock().unwrap().push_back(resp);
            Arc::new(service)
        }

        fn with_operations(ops: Vec<Operation>, download: Option<Download>) -> Arc<Self> {
            let service = Self::default();
            *service.operations.lock().unwrap() = ops.into();
            *service.download.lock().unwrap() = download;
            Arc::new(service)
        }

        fn calls(&self) -> usize {
            self.content_requests.lock().unwrap().len() + self.video_requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl GenerativeService for FakeService {
        async fn generate_content(&self, req: ContentRequest) -> genai_rs::Result<ContentResponse> {
            self.events.lock().unwrap().push("generate_content");
            self.content_requests.lock().unwrap().push(req);
            self.content
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ContentResponse::default()))
        }

        async fn submit_video(&self, req: VideoRequest) -> genai_rs::Result<Operation> {
            self.events.lock().unwrap().push("submit_video");
            self.video_requests.lock().unwrap().push(req);
            self.operations
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| GenAiError::status(500, "no scripted operation"))
        }

        async fn get_operation(&self, _operation: &Operation) -> genai_rs::Result<Operation> {
            self.polls.lock().unwrap().push(Instant::now());
            self.operations
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| GenAiError::status(500, "no scripted operation"))
        }

        async fn download(&self, uri: &str) -> genai_rs::Result<Download> {
            self.downloads.lock().unwrap().push(uri.to_string());
            self.download
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| GenAiError::status(404, "gone"))
        }
    }

    struct FakeFlow {
        present: AtomicBool,
        accept: bool,
        requests: AtomicUsize,
        events: EventLog,
    }

    impl FakeFlow {
        fn new(present: bool, accept: bool) -> Arc<Self> {
            Self::logging_to(EventLog::default(), present, accept)
        }

        fn logging_to(events: EventLog, present: bool, accept: bool) -> Arc<Self> {
            Arc::new(Self {
                present: AtomicBool::new(present),
                accept,
                requests: AtomicUsize::new(0),
                events,
            })
        }

        fn requests(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CredentialFlow for FakeFlow {
        fn has_credential(&self) -> bool {
            self.present.load(Ordering::SeqCst)
        }

        async fn request_selection(&self) -> atelier_core::Result<()> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            self.events.lock().unwrap().push("selection");
            if self.accept {
                self.present.store(true, Ordering::SeqCst);
                Ok(())
            } else {
                Err(StudioError::Credential("declined".into()))
            }
        }
    }

    fn orchestrator(service: Arc<FakeService>, flow: Arc<FakeFlow>, dir: &Path) -> Orchestrator {
        Orchestrator::new(
            service,
            CredentialGate::new(flow),
            MediaStore::new(dir, "atelier"),
            ModelConfig::default(),
        )
    }

    fn image_response() -> ContentResponse {
        ContentResponse {
            parts: vec![
                Part::Text("done".into()),
                Part::Inline(InlineData::new("image/png", vec![137u8, 80, 78, 71])),
            ],
        }
    }

    fn studio_with(changes: SnapshotChanges) -> Studio {
        Studio::new(Snapshot::default().merged(&changes.prompt("a lighthouse at dusk")))
    }

    fn assert_waited(from: Instant, to: Instant) {
        let waited = to - from;
        assert!(
            waited >= Duration::from_secs(5) && waited < Duration::from_secs(6),
            "waited {waited:?}"
        );
    }

    fn op(done: bool, response: Option<serde_json::Value>) -> Operation {
        Operation {
            name: "operations/v1".into(),
            done,
            error: None,
            response,
        }
    }

    fn video_done() -> Operation {
        op(
            true,
            Some(json!({ "generatedVideos": [{ "video": { "uri": "https://files/v1" } }] })),
        )
    }

    fn mp4() -> Download {
        Download {
            bytes: b"\x00\x00\x00\x18ftypmp42".to_vec().into(),
            content_type: Some("application/octet-stream".into()),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fast_image_skips_gate_and_commits_artifact() {
        let dir = TempDir::new().unwrap();
        let service = FakeService::with_content(Ok(image_response()));
        let flow = FakeFlow::new(false, true);
        let orch = orchestrator(service.clone(), flow.clone(), dir.path());

        let mut studio = studio_with(SnapshotChanges::new());
        let before = studio.history().len();
        let ticket = studio.begin_generation().unwrap();
        let outcome = orch.run(&ticket).await;
        studio.finish_generation(ticket, &outcome);

        assert_eq!(flow.requests(), 0);
        assert!(matches!(outcome, GenerationOutcome::Artifact(_)));
        assert!(!studio.is_loading());
        assert_eq!(studio.history().len(), before + 1);
        let result = studio.current().result().unwrap();
        assert_eq!(result.media_type, MediaType::Image);
        assert!(result.path.starts_with(dir.path()));
        assert!(result.file_name.starts_with("atelier-"));
        assert!(result.file_name.ends_with(".png"));

        let requests = service.content_requests.lock().unwrap();
        assert_eq!(requests[0].model, "gemini-2.5-flash-image");
        assert!(requests[0].image_size.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn standard_image_runs_gate_once_before_request() {
        let dir = TempDir::new().unwrap();
        let service = FakeService::with_content(Ok(image_response()));
        let flow = FakeFlow::logging_to(service.events.clone(), false, true);
        let orch = orchestrator(service.clone(), flow.clone(), dir.path());

        let mut studio = studio_with(
            SnapshotChanges::new().quality(QualityMode::Create(ImageTier::Standard)),
        );
        let ticket = studio.begin_generation().unwrap();
        let outcome = orch.run(&ticket).await;

        assert_eq!(flow.requests(), 1);
        assert_eq!(
            service.events.lock().unwrap().as_slice(),
            ["selection", "generate_content"]
        );
        assert!(matches!(outcome, GenerationOutcome::Artifact(_)));
        let requests = service.content_requests.lock().unwrap();
        assert_eq!(requests[0].model, "gemini-3-pro-image-preview");
        assert_eq!(requests[0].image_size.as_deref(), Some("1K"));
    }

    #[tokio::test(start_paused = true)]
    async fn declined_gate_sends_nothing() {
        let dir = TempDir::new().unwrap();
        let service = FakeService::with_content(Ok(image_response()));
        let orch = orchestrator(service.clone(), FakeFlow::new(false, false), dir.path());

        let mut studio =
            studio_with(SnapshotChanges::new().quality(QualityMode::Create(ImageTier::Uhd)));
        studio.set_draft("a lighthouse in fog");
        let before = (studio.history().len(), studio.history().cursor());
        let ticket = studio.begin_generation().unwrap();
        let outcome = orch.run(&ticket).await;
        studio.finish_generation(ticket, &outcome);

        assert!(matches!(
            outcome,
            GenerationOutcome::Failed(StudioError::Credential(_))
        ));
        assert_eq!(service.calls(), 0);
        assert!(!studio.is_loading());
        assert_eq!((studio.history().len(), studio.history().cursor()), before);
        assert_eq!(studio.current().prompt(), "a lighthouse at dusk");
    }

    #[tokio::test(start_paused = true)]
    async fn service_failure_leaves_history_untouched() {
        let dir = TempDir::new().unwrap();
        let service = FakeService::with_content(Err(GenAiError::status(500, "internal")));
        let flow = FakeFlow::new(true, true);
        let orch = orchestrator(service, flow.clone(), dir.path());

        let mut studio = studio_with(SnapshotChanges::new());
        studio.set_draft("a lighthouse at dawn");
        let before = (studio.history().len(), studio.history().cursor());
        let ticket = studio.begin_generation().unwrap();
        assert_eq!(ticket.snapshot.prompt(), "a lighthouse at dawn");
        let outcome = orch.run(&ticket).await;
        studio.finish_generation(ticket, &outcome);

        assert!(matches!(
            outcome,
            GenerationOutcome::Failed(StudioError::Service(_))
        ));
        assert_eq!(flow.requests(), 0);
        assert_eq!((studio.history().len(), studio.history().cursor()), before);
        assert_eq!(studio.current().prompt(), "a lighthouse at dusk");
        assert!(studio.current().result().is_none());
        assert!(!studio.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_reselects_once_without_retrying() {
        let dir = TempDir::new().unwrap();
        let service = FakeService::with_content(Err(GenAiError::status(
            404,
            "Requested entity was not found.",
        )));
        let flow = FakeFlow::new(true, true);
        let orch = orchestrator(service.clone(), flow.clone(), dir.path());

        let mut studio =
            studio_with(SnapshotChanges::new().quality(QualityMode::Create(ImageTier::Hd)));
        let ticket = studio.begin_generation().unwrap();
        let outcome = orch.run(&ticket).await;
        studio.finish_generation(ticket, &outcome);

        assert!(matches!(
            outcome,
            GenerationOutcome::Failed(StudioError::CredentialRejected(_))
        ));
        assert_eq!(flow.requests(), 1);
        assert_eq!(service.calls(), 1);
        assert!(studio.status().contains("Pick another key"));
    }

    #[tokio::test(start_paused = true)]
    async fn text_only_response_is_no_artifact() {
        let dir = TempDir::new().unwrap();
        let service = FakeService::with_content(Ok(ContentResponse {
            parts: vec![Part::Text("I can only describe it.".into())],
        }));
        let orch = orchestrator(service, FakeFlow::new(false, true), dir.path());

        let mut studio = studio_with(SnapshotChanges::new());
        let before = studio.history().len();
        let ticket = studio.begin_generation().unwrap();
        let outcome = orch.run(&ticket).await;
        studio.finish_generation(ticket, &outcome);

        match &outcome {
            GenerationOutcome::NoArtifact { message } => {
                assert_eq!(message.as_deref(), Some("I can only describe it."));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(studio.history().len(), before);
        assert_eq!(studio.status(), "I can only describe it.");
    }

    #[tokio::test(start_paused = true)]
    async fn edit_sends_reference_first() {
        let dir = TempDir::new().unwrap();
        let reference_path = dir.path().join("ref.png");
        std::fs::write(&reference_path, [1u8, 2, 3]).unwrap();
        let reference = ReferenceFile::from_path(&reference_path).unwrap();

        let service = FakeService::with_content(Ok(image_response()));
        let orch = orchestrator(service.clone(), FakeFlow::new(false, true), dir.path());

        let mut studio = studio_with(
            SnapshotChanges::new()
                .quality(QualityMode::Edit(ImageTier::Fast))
                .reference(Some(reference)),
        );
        let ticket = studio.begin_generation().unwrap();
        orch.run(&ticket).await;

        let requests = service.content_requests.lock().unwrap();
        assert_eq!(
            requests[0].parts,
            vec![
                Part::Inline(InlineData::new("image/png", vec![1u8, 2, 3])),
                Part::Text("a lighthouse at dusk".into()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn create_ignores_reference() {
        let dir = TempDir::new().unwrap();
        let service = FakeService::with_content(Ok(image_response()));
        let orch = orchestrator(service.clone(), FakeFlow::new(false, true), dir.path());

        let reference = ReferenceFile::from_path(&dir.path().join("missing.png")).unwrap();
        let mut studio = studio_with(SnapshotChanges::new().reference(Some(reference)));
        let ticket = studio.begin_generation().unwrap();
        let outcome = orch.run(&ticket).await;

        assert!(matches!(outcome, GenerationOutcome::Artifact(_)));
        let requests = service.content_requests.lock().unwrap();
        assert_eq!(requests[0].parts.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_reference_aborts_before_network() {
        let dir = TempDir::new().unwrap();
        let service = FakeService::with_content(Ok(image_response()));
        let orch = orchestrator(service.clone(), FakeFlow::new(true, true), dir.path());

        let reference = ReferenceFile::from_path(&dir.path().join("missing.png")).unwrap();
        let mut studio = studio_with(
            SnapshotChanges::new()
                .quality(QualityMode::Edit(ImageTier::Fast))
                .reference(Some(reference)),
        );
        studio.set_draft("a lighthouse, redrawn");
        let before = (studio.history().len(), studio.history().cursor());
        let ticket = studio.begin_generation().unwrap();
        let outcome = orch.run(&ticket).await;
        studio.finish_generation(ticket, &outcome);

        assert!(matches!(
            outcome,
            GenerationOutcome::Failed(StudioError::Io { .. })
        ));
        assert_eq!(service.calls(), 0);
        assert_eq!((studio.history().len(), studio.history().cursor()), before);
        assert!(!studio.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn video_polls_until_done_and_waits_between_polls() {
        let dir = TempDir::new().unwrap();
        let service = FakeService::with_operations(
            vec![op(false, None), op(false, None), op(false, None), video_done()],
            Some(mp4()),
        );
        let flow = FakeFlow::new(true, true);
        let orch = orchestrator(service.clone(), flow.clone(), dir.path());

        let mut studio =
            studio_with(SnapshotChanges::new().quality(QualityMode::Video(VideoTier::Standard)));
        let before = studio.history().len();
        let started = Instant::now();
        let ticket = studio.begin_generation().unwrap();
        let outcome = orch.run(&ticket).await;
        studio.finish_generation(ticket, &outcome);

        let polls = service.polls.lock().unwrap().clone();
        assert_eq!(polls.len(), 3);
        assert_waited(started, polls[0]);
        assert_waited(polls[0], polls[1]);
        assert_waited(polls[1], polls[2]);

        let handle = match outcome {
            GenerationOutcome::Artifact(handle) => handle,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(handle.media_type, MediaType::Video);
        assert!(handle.file_name.ends_with(".mp4"));
        assert_eq!(
            service.downloads.lock().unwrap().as_slice(),
            ["https://files/v1".to_string()]
        );
        assert_eq!(studio.history().len(), before + 1);
        assert_eq!(studio.current().result(), Some(&handle));
    }

    #[tokio::test(start_paused = true)]
    async fn video_always_passes_gate_and_widens_square() {
        let dir = TempDir::new().unwrap();
        let service = FakeService::with_operations(vec![video_done()], Some(mp4()));
        let flow = FakeFlow::logging_to(service.events.clone(), false, true);
        let orch = orchestrator(service.clone(), flow.clone(), dir.path());

        let mut studio = studio_with(
            SnapshotChanges::new()
                .quality(QualityMode::Video(VideoTier::Quality))
                .aspect_ratio(AspectRatio::Square),
        );
        let ticket = studio.begin_generation().unwrap();
        let outcome = orch.run(&ticket).await;

        assert!(matches!(outcome, GenerationOutcome::Artifact(_)));
        assert_eq!(flow.requests(), 1);
        assert_eq!(
            service.events.lock().unwrap().as_slice(),
            ["selection", "submit_video"]
        );
        let requests = service.video_requests.lock().unwrap();
        assert_eq!(requests[0].model, "veo-3.1-generate-preview");
        assert_eq!(requests[0].resolution, "720p");
        assert_eq!(requests[0].aspect_ratio, "16:9");
        assert_eq!(requests[0].number_of_videos, 1);
        assert_eq!(requests[0].prompt, "a lighthouse at dusk");
        assert!(service.polls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn finished_video_without_locator_is_no_artifact() {
        let dir = TempDir::new().unwrap();
        let service = FakeService::with_operations(
            vec![op(false, None), op(true, Some(json!({})))],
            Some(mp4()),
        );
        let orch = orchestrator(service.clone(), FakeFlow::new(true, true), dir.path());

        let mut studio =
            studio_with(SnapshotChanges::new().quality(QualityMode::Video(VideoTier::Fast)));
        let before = studio.history().len();
        let ticket = studio.begin_generation().unwrap();
        let outcome = orch.run(&ticket).await;
        studio.finish_generation(ticket, &outcome);

        assert!(matches!(outcome, GenerationOutcome::NoArtifact { .. }));
        assert!(service.downloads.lock().unwrap().is_empty());
        assert_eq!(studio.history().len(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_operation_is_service_error() {
        let dir = TempDir::new().unwrap();
        let mut failed = op(true, None);
        failed.error = Some(json!({ "code": 3, "message": "prompt blocked" }));
        let service = FakeService::with_operations(vec![op(false, None), failed], None);
        let orch = orchestrator(service, FakeFlow::new(true, true), dir.path());

        let mut studio =
            studio_with(SnapshotChanges::new().quality(QualityMode::Video(VideoTier::Pro)));
        let ticket = studio.begin_generation().unwrap();
        let outcome = orch.run(&ticket).await;

        match outcome {
            GenerationOutcome::Failed(StudioError::Service(message)) => {
                assert!(message.contains("prompt blocked"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn video_seed_image_is_attached() {
        let dir = TempDir::new().unwrap();
        let reference_path = dir.path().join("seed.jpg");
        std::fs::write(&reference_path, [9u8, 9]).unwrap();
        let reference = ReferenceFile::from_path(&reference_path).unwrap();

        let service = FakeService::with_operations(vec![video_done()], Some(mp4()));
        let orch = orchestrator(service.clone(), FakeFlow::new(true, true), dir.path());

        let mut studio = studio_with(
            SnapshotChanges::new()
                .quality(QualityMode::Video(VideoTier::Standard))
                .aspect_ratio(AspectRatio::Tall)
                .reference(Some(reference)),
        );
        let ticket = studio.begin_generation().unwrap();
        orch.run(&ticket).await;

        let requests = service.video_requests.lock().unwrap();
        assert_eq!(requests[0].aspect_ratio, "9:16");
        assert_eq!(
            requests[0].image,
            Some(InlineData::new("image/jpeg", vec![9u8, 9]))
        );
    }
}
