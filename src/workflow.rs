//! Edit workflow: the state machine and the session that drives it.
//!
//! A session walks `Idle → ReadyToEdit → Processing → Complete | Error`.
//! All transitions go through [`WorkflowState::on`]; the session owns the
//! selected image, prompt, result and error message that go with the state.

use crate::error::EditError;
use crate::image::{encode, EncodedImage, ImageEditor, SourceImage};
use crate::presets::PresetPrompt;
use serde::Serialize;
use tokio::sync::watch;

/// Which view the front end should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    /// Nothing selected yet.
    #[default]
    Idle,
    /// Image selected, waiting for an instruction.
    ReadyToEdit,
    /// Edit request in flight.
    Processing,
    /// Edited image available.
    Complete,
    /// Last attempt failed; the message is kept on the session.
    Error,
}

/// Inputs that move the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowEvent {
    /// User picked an image.
    ImageSelected,
    /// User submitted an edit.
    GenerateRequested,
    /// The outstanding request returned an image.
    Succeeded,
    /// The outstanding request failed.
    Failed,
    /// User started over.
    Reset,
}

impl WorkflowState {
    /// Returns the next state, or `None` if `event` is not accepted here.
    pub fn on(self, event: WorkflowEvent) -> Option<Self> {
        use WorkflowEvent as E;
        use WorkflowState as S;

        match (self, event) {
            (S::Processing, E::Succeeded) => Some(S::Complete),
            (S::Processing, E::Failed) => Some(S::Error),
            (S::Processing, _) => None,
            (_, E::Reset) => Some(S::Idle),
            (_, E::ImageSelected) => Some(S::ReadyToEdit),
            (S::ReadyToEdit | S::Error, E::GenerateRequested) => Some(S::Processing),
            _ => None,
        }
    }

    /// Returns the state name used in logs and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::ReadyToEdit => "ready_to_edit",
            Self::Processing => "processing",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user's editing session.
///
/// `generate` holds `&mut self` until the request settles, so a session
/// never has more than one edit in flight.
pub struct EditSession<E> {
    editor: E,
    state: watch::Sender<WorkflowState>,
    source: Option<SourceImage>,
    prompt: String,
    result: Option<EncodedImage>,
    error: Option<String>,
}

impl<E: ImageEditor> EditSession<E> {
    /// Creates an idle session using `editor` for edits.
    pub fn new(editor: E) -> Self {
        let (state, _) = watch::channel(WorkflowState::Idle);
        Self {
            editor,
            state,
            source: None,
            prompt: String::new(),
            result: None,
            error: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> WorkflowState {
        *self.state.borrow()
    }

    /// Receives every state change, including the transient `Processing`.
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.state.subscribe()
    }

    /// The editor behind this session.
    pub fn editor(&self) -> &E {
        &self.editor
    }

    /// Selected image, if any.
    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    /// Current instruction text.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Edited image from the last successful attempt.
    pub fn result(&self) -> Option<&EncodedImage> {
        self.result.as_ref()
    }

    /// Message from the last failed attempt.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Replaces the selected image and clears any previous outcome.
    ///
    /// Returns false while a request is in flight.
    pub fn select_image(&mut self, source: SourceImage) -> bool {
        if !self.transition(WorkflowEvent::ImageSelected) {
            return false;
        }
        self.source = Some(source);
        self.result = None;
        self.error = None;
        true
    }

    /// Sets the instruction text.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Copies a preset's instruction into the prompt.
    pub fn apply_preset(&mut self, preset: &PresetPrompt) {
        self.set_prompt(preset.text);
    }

    /// True when an image is selected, the prompt is not blank and the
    /// current state accepts a new request.
    pub fn can_generate(&self) -> bool {
        self.source.is_some()
            && !self.prompt.trim().is_empty()
            && self.state().on(WorkflowEvent::GenerateRequested).is_some()
    }

    /// Encodes the image, requests the edit and records the outcome.
    ///
    /// Returns false, without touching the editor, when
    /// [`can_generate`](Self::can_generate) is false. Otherwise the session
    /// ends in `Complete` or `Error`.
    pub async fn generate(&mut self) -> bool {
        if !self.can_generate() || !self.transition(WorkflowEvent::GenerateRequested) {
            return false;
        }
        self.result = None;
        self.error = None;

        let outcome = match self.source.as_ref() {
            Some(source) => match encode(source).await {
                Ok(encoded) => self.editor.request_edit(&encoded, &self.prompt).await,
                Err(e) => Err(e),
            },
            None => Err(EditError::InvalidRequest("no image selected".into())),
        };

        match outcome {
            Ok(image) => {
                self.result = Some(image);
                self.transition(WorkflowEvent::Succeeded);
            }
            Err(e) => {
                tracing::warn!(editor = self.editor.name(), "edit failed: {e}");
                self.error = Some(e.to_string());
                self.transition(WorkflowEvent::Failed);
            }
        }
        true
    }

    /// Drops the image, prompt and outcome and returns to `Idle`.
    pub fn reset(&mut self) {
        if self.transition(WorkflowEvent::Reset) {
            self.source = None;
            self.prompt.clear();
            self.result = None;
            self.error = None;
        }
    }

    fn transition(&mut self, event: WorkflowEvent) -> bool {
        let current = self.state();
        match current.on(event) {
            Some(next) => {
                tracing::debug!(from = %current, to = %next, ?event, "workflow transition");
                self.state.send_replace(next);
                true
            }
            None => {
                tracing::debug!(state = %current, ?event, "ignored workflow event");
                false
            }
        }
    }
}

impl<E> std::fmt::Debug for EditSession<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditSession")
            .field("state", &*self.state.borrow())
            .field("has_source", &self.source.is_some())
            .field("prompt", &self.prompt)
            .field("has_result", &self.result.is_some())
            .field("error", &self.error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::presets::find_preset;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    /// Records instructions and answers with a fixed outcome.
    #[derive(Default)]
    struct RecordingEditor {
        calls: AtomicUsize,
        instructions: Mutex<Vec<String>>,
        fail_with: Option<String>,
    }

    #[async_trait]
    impl ImageEditor for RecordingEditor {
        async fn request_edit(
            &self,
            image: &EncodedImage,
            instruction: &str,
        ) -> Result<EncodedImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.instructions
                .lock()
                .unwrap()
                .push(instruction.to_string());
            match &self.fail_with {
                Some(text) => Err(EditError::Refusal(text.clone())),
                None => Ok(EncodedImage::new(image.data.clone(), "image/jpeg")),
            }
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn png() -> SourceImage {
        SourceImage::from_bytes(vec![0x89, b'P', b'N', b'G'], "image/png").unwrap()
    }

    #[test]
    fn test_transition_table() {
        use WorkflowEvent as E;
        use WorkflowState as S;

        assert_eq!(S::Idle.on(E::ImageSelected), Some(S::ReadyToEdit));
        assert_eq!(S::Idle.on(E::GenerateRequested), None);
        assert_eq!(S::ReadyToEdit.on(E::GenerateRequested), Some(S::Processing));
        assert_eq!(S::Processing.on(E::Succeeded), Some(S::Complete));
        assert_eq!(S::Processing.on(E::Failed), Some(S::Error));
        assert_eq!(S::Processing.on(E::GenerateRequested), None);
        assert_eq!(S::Processing.on(E::ImageSelected), None);
        assert_eq!(S::Processing.on(E::Reset), None);
        assert_eq!(S::Error.on(E::GenerateRequested), Some(S::Processing));
        assert_eq!(S::Complete.on(E::GenerateRequested), None);
        assert_eq!(S::Complete.on(E::ImageSelected), Some(S::ReadyToEdit));
        assert_eq!(S::Complete.on(E::Reset), Some(S::Idle));
        assert_eq!(S::ReadyToEdit.on(E::Succeeded), None);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(WorkflowState::ReadyToEdit.to_string(), "ready_to_edit");
        assert_eq!(
            serde_json::to_value(WorkflowState::Complete).unwrap(),
            "complete"
        );
    }

    #[tokio::test]
    async fn test_blank_prompt_never_reaches_editor() {
        let mut session = EditSession::new(RecordingEditor::default());
        assert!(session.select_image(png()));

        for prompt in ["", "   ", "\n\t"] {
            session.set_prompt(prompt);
            assert!(!session.can_generate());
            assert!(!session.generate().await);
        }

        assert_eq!(session.editor().calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.state(), WorkflowState::ReadyToEdit);
    }

    #[tokio::test]
    async fn test_generate_without_image_is_noop() {
        let mut session = EditSession::new(RecordingEditor::default());
        session.set_prompt("Add a hat");

        assert!(!session.generate().await);
        assert_eq!(session.state(), WorkflowState::Idle);
        assert_eq!(session.editor().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_successful_edit_completes() {
        let mut session = EditSession::new(RecordingEditor::default());
        session.select_image(png());
        session.apply_preset(find_preset("sketch-style").unwrap());

        assert!(session.generate().await);
        assert_eq!(session.state(), WorkflowState::Complete);
        assert!(session.error().is_none());

        let result = session.result().unwrap();
        assert_eq!(result.mime_type, "image/jpeg");
        assert_eq!(result.decode().unwrap(), vec![0x89, b'P', b'N', b'G']);

        let sent = session.editor().instructions.lock().unwrap().clone();
        assert_eq!(
            sent,
            vec!["Convert this image into a high detail pencil sketch drawing.".to_string()]
        );

        // A finished session takes no new request until an image is picked.
        assert!(!session.can_generate());
    }

    #[tokio::test]
    async fn test_failed_edit_keeps_message_and_allows_retry() {
        let editor = RecordingEditor {
            fail_with: Some("I can't do that".into()),
            ..Default::default()
        };
        let mut session = EditSession::new(editor);
        session.select_image(png());
        session.set_prompt("Remove the person");

        assert!(session.generate().await);
        assert_eq!(session.state(), WorkflowState::Error);
        assert!(session.error().unwrap().contains("I can't do that"));
        assert!(session.result().is_none());

        assert!(session.can_generate());
        assert!(session.generate().await);
        assert_eq!(session.editor().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unreadable_image_fails_without_request() {
        let dir = tempfile::tempdir().unwrap();
        let missing = SourceImage::from_file(dir.path().join("gone.png"), "image/png").unwrap();

        let mut session = EditSession::new(RecordingEditor::default());
        session.select_image(missing);
        session.set_prompt("Brighten");

        assert!(session.generate().await);
        assert_eq!(session.state(), WorkflowState::Error);
        assert!(session.error().unwrap().starts_with("could not read image"));
        assert_eq!(session.editor().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_selecting_new_image_clears_error() {
        let editor = RecordingEditor {
            fail_with: Some("nope".into()),
            ..Default::default()
        };
        let mut session = EditSession::new(editor);
        session.select_image(png());
        session.set_prompt("x");
        session.generate().await;
        assert!(session.error().is_some());

        assert!(session.select_image(png()));
        assert_eq!(session.state(), WorkflowState::ReadyToEdit);
        assert!(session.error().is_none());
        assert_eq!(session.prompt(), "x");
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let mut session = EditSession::new(RecordingEditor::default());
        session.select_image(png());
        session.set_prompt("Add sunglasses");
        session.generate().await;

        session.reset();
        assert_eq!(session.state(), WorkflowState::Idle);
        assert!(session.source().is_none());
        assert!(session.result().is_none());
        assert!(session.error().is_none());
        assert_eq!(session.prompt(), "");
    }

    /// Blocks until released so the test can observe `Processing`.
    struct GatedEditor {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl ImageEditor for GatedEditor {
        async fn request_edit(&self, image: &EncodedImage, _: &str) -> Result<EncodedImage> {
            self.gate.notified().await;
            Ok(image.clone())
        }

        fn name(&self) -> &str {
            "gated"
        }
    }

    #[tokio::test]
    async fn test_subscribers_see_processing() {
        let gate = Arc::new(Notify::new());
        let mut session = EditSession::new(GatedEditor {
            gate: Arc::clone(&gate),
        });
        session.select_image(png());
        session.set_prompt("Make it noir");

        let mut states = session.subscribe();
        let handle = tokio::spawn(async move {
            session.generate().await;
            session
        });

        states
            .wait_for(|s| *s == WorkflowState::Processing)
            .await
            .unwrap();
        gate.notify_one();

        let session = handle.await.unwrap();
        assert_eq!(session.state(), WorkflowState::Complete);
        assert_eq!(*states.borrow_and_update(), WorkflowState::Complete);
    }
}
