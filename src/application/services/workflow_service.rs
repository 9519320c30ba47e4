//! Workflow Session Service - Runs one workflow state machine per console session
//!
//! Each session is an actor: a single task owns the current snapshot and
//! applies actions one at a time through the reducer. Effects never block the
//! actor; every remote call runs in its own task and reports back by sending
//! a [`WorkflowEvent`] into the same inbox. Stream tasks are tracked per
//! stream kind so a `CloseStream` effect can abort them.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::application::ports::outbound::{
    EventStream, GenerationServicePort, RemoteError, RemoteSettingsPort,
};
use crate::domain::value_objects::SessionId;
use crate::domain::workflow::{
    reduce, Action, Effect, Failure, NavigationTarget, StreamKind, StreamToken, Transition,
    UserAction, WorkflowEvent, WorkflowState,
};

const NAVIGATION_CAPACITY: usize = 8;

/// Remote collaborators a session drives
#[derive(Clone)]
pub struct WorkflowPorts {
    pub generation: Arc<dyn GenerationServicePort>,
    pub settings: Arc<dyn RemoteSettingsPort>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),
    #[error("Session {0} is closed")]
    Closed(SessionId),
}

enum SessionMessage {
    Dispatch {
        action: Action,
        reply: Option<oneshot::Sender<Arc<WorkflowState>>>,
    },
    Shutdown,
}

impl SessionMessage {
    fn event(event: WorkflowEvent) -> Self {
        Self::Dispatch {
            action: Action::Event(event),
            reply: None,
        }
    }
}

/// Last user action and attached shells, shared by every handle
struct Activity {
    last_action: Mutex<Instant>,
    shells: AtomicUsize,
}

impl Activity {
    fn touch(&self) {
        *self.last_action.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }
}

/// Keeps a session marked as in use by a connected shell until dropped
pub struct ShellAttachment {
    activity: Arc<Activity>,
}

impl Drop for ShellAttachment {
    fn drop(&mut self) {
        self.activity.shells.fetch_sub(1, Ordering::SeqCst);
        self.activity.touch();
    }
}

/// Handle to a running workflow session
#[derive(Clone)]
pub struct WorkflowSession {
    id: SessionId,
    inbox: mpsc::UnboundedSender<SessionMessage>,
    snapshots: watch::Receiver<Arc<WorkflowState>>,
    navigation: broadcast::Sender<NavigationTarget>,
    activity: Arc<Activity>,
}

impl WorkflowSession {
    /// Start the session task; must be called within a tokio runtime
    pub fn spawn(id: SessionId, ports: WorkflowPorts) -> Self {
        let (inbox, receiver) = mpsc::unbounded_channel();
        let initial = Arc::new(WorkflowState::new());
        let (snapshot_sender, snapshots) = watch::channel(initial.clone());
        let (navigation, _) = broadcast::channel(NAVIGATION_CAPACITY);

        let actor = SessionActor {
            id,
            state: initial,
            ports,
            inbox: inbox.downgrade(),
            streams: HashMap::new(),
            snapshots: snapshot_sender,
            navigation: navigation.clone(),
        };
        tokio::spawn(actor.run(receiver));

        Self {
            id,
            inbox,
            snapshots,
            navigation,
            activity: Arc::new(Activity {
                last_action: Mutex::new(Instant::now()),
                shells: AtomicUsize::new(0),
            }),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<WorkflowState> {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<WorkflowState>> {
        self.snapshots.clone()
    }

    pub fn navigation(&self) -> broadcast::Receiver<NavigationTarget> {
        self.navigation.subscribe()
    }

    /// Apply a user action and return the snapshot right after it
    pub async fn dispatch(&self, action: UserAction) -> Result<Arc<WorkflowState>, SessionError> {
        self.activity.touch();
        let (reply, response) = oneshot::channel();
        self.inbox
            .send(SessionMessage::Dispatch {
                action: action.into(),
                reply: Some(reply),
            })
            .map_err(|_| SessionError::Closed(self.id))?;
        response.await.map_err(|_| SessionError::Closed(self.id))
    }

    /// Stop the session and abort its streams
    pub fn close(&self) {
        let _ = self.inbox.send(SessionMessage::Shutdown);
    }

    pub fn is_closed(&self) -> bool {
        self.inbox.is_closed()
    }

    /// Mark a shell as connected for the lifetime of the returned guard
    pub fn attach_shell(&self) -> ShellAttachment {
        self.activity.shells.fetch_add(1, Ordering::SeqCst);
        ShellAttachment {
            activity: self.activity.clone(),
        }
    }

    /// Time since the last action or shell disconnect; `None` while a shell is attached
    pub fn idle_for(&self) -> Option<Duration> {
        if self.activity.shells.load(Ordering::SeqCst) > 0 {
            return None;
        }
        let last_action = *self.activity.last_action.lock().unwrap_or_else(PoisonError::into_inner);
        Some(last_action.elapsed())
    }
}

impl fmt::Debug for WorkflowSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowSession")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .field("shells", &self.activity.shells.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

struct SessionActor {
    id: SessionId,
    state: Arc<WorkflowState>,
    ports: WorkflowPorts,
    /// Weak so that dropping every handle ends the session
    inbox: mpsc::WeakUnboundedSender<SessionMessage>,
    streams: HashMap<StreamKind, AbortHandle>,
    snapshots: watch::Sender<Arc<WorkflowState>>,
    navigation: broadcast::Sender<NavigationTarget>,
}

impl SessionActor {
    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<SessionMessage>) {
        info!(session_id = %self.id, "Workflow session started");
        self.sync_reference_setting();

        while let Some(message) = receiver.recv().await {
            match message {
                SessionMessage::Dispatch { action, reply } => {
                    let snapshot = self.apply(action);
                    if let Some(reply) = reply {
                        let _ = reply.send(snapshot);
                    }
                }
                SessionMessage::Shutdown => break,
            }
        }

        for (_, handle) in self.streams.drain() {
            handle.abort();
        }
        info!(session_id = %self.id, "Workflow session stopped");
    }

    fn apply(&mut self, action: Action) -> Arc<WorkflowState> {
        let name = action.name();
        let Transition { state, effects } = reduce(&self.state, action);
        if let Some(result) = state.result.as_ref().filter(|r| Some(*r) != self.state.result.as_ref()) {
            info!(
                session_id = %self.id,
                folder = %result.folder_name,
                generated = result.generated_count(),
                planned = result.cuts,
                "Generation result received"
            );
        }
        if state != *self.state {
            self.state = Arc::new(state);
            self.snapshots.send_replace(self.state.clone());
        }
        debug!(
            session_id = %self.id,
            action = name,
            stage = self.state.stage.index(),
            effects = effects.len(),
            "Action applied"
        );

        for effect in effects {
            self.run_effect(effect);
        }
        self.state.clone()
    }

    /// Read the "use reference image" setting once at startup
    fn sync_reference_setting(&self) {
        let Some(inbox) = self.inbox.upgrade() else {
            return;
        };
        let settings = self.ports.settings.clone();
        let session_id = self.id;
        tokio::spawn(async move {
            match settings.get_settings().await {
                Ok(settings) => {
                    let _ = inbox.send(SessionMessage::event(WorkflowEvent::ReferenceSettingLoaded {
                        use_reference_image: settings.use_reference_image,
                    }));
                }
                Err(e) => warn!(session_id = %session_id, error = %e, "Initial settings sync failed"),
            }
        });
    }

    fn run_effect(&mut self, effect: Effect) {
        debug!(session_id = %self.id, effect = effect.name(), "Running effect");
        let generation = self.ports.generation.clone();

        match effect {
            Effect::CloseStream(kind) => {
                if let Some(handle) = self.streams.remove(&kind) {
                    handle.abort();
                    debug!(session_id = %self.id, stream = %kind, "Stream closed");
                }
            }
            Effect::OpenDraftStream { token, query } => {
                self.spawn_stream(
                    token,
                    async move { generation.stream_drafts(&query).await },
                    |token, event| WorkflowEvent::DraftStream { token, event },
                );
            }
            Effect::RegenerateDraft { draft_id, query } => self.spawn_call(async move {
                let result = generation
                    .regenerate_draft(draft_id, &query)
                    .await
                    .map_err(Failure::from);
                WorkflowEvent::DraftRegenerated { draft_id, result }
            }),
            Effect::PrepareStory { token, request } => self.spawn_call(async move {
                let result = generation.prepare_story(&request).await.map_err(Failure::from);
                WorkflowEvent::StoryPrepared { token, result }
            }),
            Effect::OpenStoryStream { token, request_id } => {
                self.spawn_stream(
                    token,
                    async move { generation.stream_story(&request_id).await },
                    |token, event| WorkflowEvent::StoryStream { token, event },
                );
            }
            Effect::ParseScript { token, script, format } => self.spawn_call(async move {
                let result = generation
                    .parse_script(&script, format)
                    .await
                    .map_err(Failure::from);
                WorkflowEvent::ScriptParsed { token, result }
            }),
            Effect::ResolveGenerationSettings { token } => {
                let settings = self.ports.settings.clone();
                self.spawn_call(async move {
                    let use_reference_image = match settings.get_settings().await {
                        Ok(settings) => Some(settings.use_reference_image),
                        Err(e) => {
                            warn!(error = %e, "Settings sync failed, using cached value");
                            None
                        }
                    };
                    WorkflowEvent::GenerationSettingsResolved {
                        token,
                        use_reference_image,
                    }
                })
            }
            Effect::GenerateReference { token, request } => self.spawn_call(async move {
                let result = generation
                    .generate_reference(&request)
                    .await
                    .map_err(Failure::from);
                WorkflowEvent::ReferenceGenerated { token, result }
            }),
            Effect::QueueGeneration { token, job } => self.spawn_call(async move {
                let result = generation.queue_generation(&job).await.map_err(Failure::from);
                WorkflowEvent::GenerationQueued { token, result }
            }),
            Effect::OpenGenerationStream { token, job_id } => {
                info!(session_id = %self.id, job_id = %job_id, "Following generation job");
                self.spawn_stream(
                    token,
                    async move { generation.stream_generation(&job_id).await },
                    |token, event| WorkflowEvent::GenerationStream { token, event },
                );
            }
            Effect::SendControl(action) => {
                let session_id = self.id;
                tokio::spawn(async move {
                    match generation.control(action).await {
                        Ok(()) => info!(session_id = %session_id, action = action.as_str(), "Control sent"),
                        Err(e) => warn!(session_id = %session_id, action = action.as_str(), error = %e, "Control failed"),
                    }
                });
            }
            Effect::FetchTitles { token, story_preview } => self.spawn_call(async move {
                let result = generation
                    .suggest_titles(&story_preview)
                    .await
                    .map_err(Failure::from);
                WorkflowEvent::TitlesFetched { token, result }
            }),
            Effect::Navigate(target) => {
                // No receivers just means no shell is listening
                let _ = self.navigation.send(target);
            }
        }
    }

    fn spawn_call<F>(&self, call: F)
    where
        F: Future<Output = WorkflowEvent> + Send + 'static,
    {
        let Some(inbox) = self.inbox.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            let event = call.await;
            let _ = inbox.send(SessionMessage::event(event));
        });
    }

    fn spawn_stream<T, F>(&mut self, token: StreamToken, open: F, wrap: fn(StreamToken, T) -> WorkflowEvent)
    where
        T: Send + 'static,
        F: Future<Output = Result<EventStream<T>, RemoteError>> + Send + 'static,
    {
        let Some(inbox) = self.inbox.upgrade() else {
            return;
        };
        if let Some(previous) = self.streams.remove(&token.kind) {
            previous.abort();
        }

        let session_id = self.id;
        let task = tokio::spawn(async move {
            let ended = |error: Option<String>| {
                SessionMessage::event(WorkflowEvent::StreamEnded { token, error })
            };

            let mut stream = match open.await {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(session_id = %session_id, stream = %token, error = %e, "Failed to open stream");
                    let _ = inbox.send(ended(Some(e.to_string())));
                    return;
                }
            };

            while let Some(item) = stream.next().await {
                match item {
                    Ok(event) => {
                        if inbox.send(SessionMessage::event(wrap(token, event))).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        warn!(session_id = %session_id, stream = %token, error = %e, "Stream failed");
                        let _ = inbox.send(ended(Some(e.to_string())));
                        return;
                    }
                }
            }

            debug!(session_id = %session_id, stream = %token, "Stream finished");
            let _ = inbox.send(ended(None));
        });
        self.streams.insert(token.kind, task.abort_handle());
    }
}
