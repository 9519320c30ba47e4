//! Workflow reducer
//!
//! `reduce` is a pure function of the current snapshot and one action. It
//! never performs I/O: anything that has to reach the remote service is
//! returned as an [`Effect`], and the outcome comes back later as a
//! [`WorkflowEvent`]. Stream events are only applied while their token is the
//! current epoch of its kind.

use super::{
    Action, DraftQuery, DraftStreamEvent, Effect, Failure, GenerationJob, GenerationStreamEvent,
    LoadingStatus, NavigationTarget, Notice, ReferenceRequest, Stage, StoryOutline, StoryRequest,
    StoryStreamEvent, StreamKind, StreamToken, UserAction, WorkflowEvent, WorkflowState,
};
use crate::domain::entities::{story_text, upsert_sorted, Draft};
use crate::domain::value_objects::RenderStyle;

const DRAFTS_LOADING: &str = "AI 초안 생성 중 (병렬 스트리밍)";
const DRAFTS_DETAIL: &str = "GET /api/workflow/drafts/parallel";
const PARSE_LOADING: &str = "대본 분석 및 컷 나눈 중...";
const PARSE_DETAIL: &str = "AI가 대본을 분석하여 컷 리스트를 생성합니다.";
const TITLES_LOADING: &str = "제목 생성 중...";
const TITLES_DETAIL: &str = "POST /api/workflow/titles";

const NO_CUTS_ANIMATION: &str =
    "이미지를 생성하기 전에 먼저 'AI 컷 나누기' 버튼을 눌러 스토리를 컷별로 나누어야 합니다.";
const NO_CUTS_PHOTOREAL: &str = "생성할 스토리 정보가 없습니다. 이전 단계로 돌아가 스토리를 생성해 주세요.";
const EMPTY_SCRIPT: &str = "스크립트를 입력해주세요.";
const STORY_DISCONNECTED: &str = "스트리밍 연결이 끊어졌습니다.";

const LOG_DIRECT_START: &str = "🎬 이미지 생성 시작 (참조 기능 비활성화)...";
const LOG_UPLOADED_REFERENCE: &str = "🖼️ 사용자 업로드 이미지 사용...";
const LOG_REFERENCE_START: &str = "🎬 첫 번째 이미지 생성 시작...";
const LOG_REFERENCE_READY: &str = "✅ 첫 번째 이미지 생성 완료! 확인해주세요.";
const LOG_REFERENCE_RETRY: &str = "🔄 이미지 재생성 중...";
const LOG_REFERENCE_CONFIRMED: &str = "✅ 참조 이미지 확정! 나머지 이미지 생성 시작...";
const LOG_QUEUE_REJECTED: &str = "❌ 작업 큐 실패";

const DEFAULT_TOPIC: &str = "Story";

/// New snapshot plus the effects the session has to run
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: WorkflowState,
    pub effects: Vec<Effect>,
}

pub fn reduce(state: &WorkflowState, action: Action) -> Transition {
    let mut step = Step {
        state: state.clone(),
        effects: Vec::new(),
    };
    match action {
        Action::User(action) => step.on_user_action(action),
        Action::Event(event) => step.on_event(event),
    }
    Transition {
        state: step.state,
        effects: step.effects,
    }
}

struct Step {
    state: WorkflowState,
    effects: Vec<Effect>,
}

impl Step {
    /// Abort whatever stream of `kind` is live and mint the token of a new one
    fn open_stream(&mut self, kind: StreamKind) -> StreamToken {
        self.effects.push(Effect::CloseStream(kind));
        self.state.epochs.bump(kind)
    }

    fn close_stream(&mut self, kind: StreamKind) {
        self.state.epochs.bump(kind);
        self.effects.push(Effect::CloseStream(kind));
    }

    fn emit(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    fn notify(&mut self, notice: Notice) {
        self.state.notice = Some(notice);
    }

    fn on_user_action(&mut self, action: UserAction) {
        let s = &mut self.state;
        match action {
            UserAction::SetFormat { format } => {
                if s.stage == Stage::ModeSelect {
                    s.format = format;
                }
            }
            UserAction::SetStyle { style } => {
                if s.stage == Stage::ModeSelect {
                    s.style = style;
                }
            }
            UserAction::ConfirmMode => {
                if s.stage == Stage::ModeSelect {
                    s.stage = if s.style.skips_topic_selection() {
                        Stage::StoryConfirm
                    } else {
                        Stage::TopicSelect
                    };
                }
            }
            UserAction::GoBack => {
                if s.busy || s.story_stream.active {
                    return;
                }
                if let Some(previous) = s.stage.previous(s.style) {
                    s.stage = previous;
                    s.editing_draft = None;
                }
            }
            UserAction::SetInputMode { mode } => {
                if s.stage == Stage::TopicSelect && !s.busy {
                    s.input_mode = mode;
                }
            }
            UserAction::SetCategory { category } => {
                if s.stage == Stage::TopicSelect && !s.busy {
                    s.category = category;
                }
            }
            UserAction::SetCustomInput { text } => {
                if s.stage == Stage::TopicSelect && !s.busy {
                    s.custom_input = text;
                }
            }
            UserAction::FetchDrafts => self.fetch_drafts(),
            UserAction::RegenerateDraft { draft_id } => self.regenerate_draft(draft_id),
            UserAction::SelectDraft { draft_id } => {
                if s.stage != Stage::TopicSelect || s.story_stream.active {
                    return;
                }
                if let Some(draft) = s.find_draft(draft_id) {
                    s.editing_draft = Some(draft.clone());
                }
            }
            UserAction::EditDraft { title, summary } => {
                if s.story_stream.active {
                    return;
                }
                if let Some(draft) = s.editing_draft.as_mut() {
                    draft.title = title;
                    draft.summary = summary;
                }
            }
            UserAction::CloseDraftDetail => {
                if !s.story_stream.active {
                    s.editing_draft = None;
                }
            }
            UserAction::StartStoryStream => self.start_story_stream(),
            UserAction::StopStoryStream => {
                if s.story_stream.active {
                    s.story_stream.active = false;
                    self.close_stream(StreamKind::Story);
                }
            }
            UserAction::EditStory { text } => {
                if s.stage == Stage::StoryConfirm && !s.busy {
                    s.edited_story = text;
                }
            }
            UserAction::EditCharacterPrompt { text } => {
                if s.stage == Stage::StoryConfirm && !s.busy {
                    s.character_prompt = text;
                }
            }
            UserAction::ParseScript => self.parse_script(),
            UserAction::StartGeneration => self.start_generation(),
            UserAction::AttachReferenceImage { url } => {
                if url.trim().is_empty() || s.busy {
                    return;
                }
                let attachable = match s.stage {
                    Stage::StoryConfirm => true,
                    Stage::Generating => !s.reference_confirmed,
                    _ => false,
                };
                if attachable {
                    s.reference_image = Some(url);
                }
            }
            UserAction::ConfirmReference => self.confirm_reference(),
            UserAction::RegenerateReference => self.regenerate_reference(),
            UserAction::ControlGeneration { action } => {
                if s.stage == Stage::Generating {
                    self.emit(Effect::SendControl(action));
                }
            }
            UserAction::RetryTitles => {
                if s.stage == Stage::Generating && !s.busy && s.result.is_some() {
                    self.fetch_titles();
                }
            }
            UserAction::SelectTitle { title } => {
                if s.stage == Stage::TitleSelect {
                    s.selected_title = Some(title);
                }
            }
            UserAction::CompleteWorkflow => {
                if s.stage == Stage::TitleSelect && s.selected_title.is_some() {
                    self.emit(Effect::Navigate(NavigationTarget::History));
                }
            }
            UserAction::ResetWorkflow => self.reset(),
            UserAction::DismissNotice => s.notice = None,
            UserAction::LoadDraftSet { set } => {
                if s.busy || s.story_stream.active {
                    return;
                }
                s.stage = Stage::TopicSelect;
                s.category = set.category;
                s.input_mode = set.input_mode;
                s.custom_input = set.custom_input;
                s.drafts.clear();
                for draft in set.drafts.into_iter().filter(|d| Draft::is_valid_id(d.id)) {
                    upsert_sorted(&mut s.drafts, draft);
                }
                s.streaming_texts.clear();
                s.editing_draft = None;
            }
            UserAction::LoadStorySet { story } => {
                if s.busy || s.story_stream.active {
                    return;
                }
                s.stage = Stage::StoryConfirm;
                s.format = story.format;
                s.selected_draft = story.selected_draft;
                s.cuts = story.cuts;
                s.character_prompt = story.character_prompt;
                s.edited_story = story.edited_story;
                s.editing_draft = None;
            }
        }
    }

    fn fetch_drafts(&mut self) {
        let s = &self.state;
        if s.stage != Stage::TopicSelect || s.busy || s.story_stream.active || !s.has_topic() {
            return;
        }
        let query = draft_query(s);
        let token = self.open_stream(StreamKind::Drafts);

        let s = &mut self.state;
        s.drafts.clear();
        s.streaming_texts.clear();
        s.editing_draft = None;
        s.set_busy(Some(LoadingStatus::new(DRAFTS_LOADING, DRAFTS_DETAIL)));
        self.emit(Effect::OpenDraftStream { token, query });
    }

    fn regenerate_draft(&mut self, draft_id: u32) {
        if self.state.stage != Stage::TopicSelect {
            return;
        }
        let query = draft_query(&self.state);
        let Some(draft) = self
            .state
            .drafts
            .iter_mut()
            .find(|d| d.id == draft_id && !d.is_regenerating())
        else {
            return;
        };
        *draft = draft.regenerating();
        self.emit(Effect::RegenerateDraft { draft_id, query });
    }

    fn start_story_stream(&mut self) {
        let s = &self.state;
        if s.stage != Stage::TopicSelect {
            return;
        }
        let Some(draft) = s.editing_draft.clone() else {
            return;
        };
        let request = StoryRequest { draft, format: s.format };
        let token = self.open_stream(StreamKind::Story);

        self.state.story_stream.active = true;
        self.state.story_stream.staged_text.clear();
        self.emit(Effect::PrepareStory { token, request });
    }

    fn parse_script(&mut self) {
        let s = &self.state;
        if s.stage != Stage::StoryConfirm || s.style != RenderStyle::Animation || s.busy {
            return;
        }
        if s.edited_story.trim().is_empty() {
            self.notify(Notice::warning(EMPTY_SCRIPT));
            return;
        }
        let script = s.edited_story.clone();
        let format = s.format;
        // Parsed cuts replace the story's cut list and run under the story epoch
        let token = self.state.epochs.bump(StreamKind::Story);
        self.state.set_busy(Some(LoadingStatus::new(PARSE_LOADING, PARSE_DETAIL)));
        self.emit(Effect::ParseScript { token, script, format });
    }

    fn start_generation(&mut self) {
        let s = &self.state;
        if s.stage != Stage::StoryConfirm || s.busy {
            return;
        }
        if s.cuts.is_empty() {
            let message = match s.style {
                RenderStyle::Animation => NO_CUTS_ANIMATION,
                RenderStyle::Photoreal => NO_CUTS_PHOTOREAL,
            };
            self.notify(Notice::warning(message));
            return;
        }
        if !s.cut_count_matches() {
            let message = format!(
                "컷 수가 형식과 맞지 않습니다 ({}/{}). 스토리를 다시 생성해 주세요.",
                s.cuts.len(),
                s.format.cut_count()
            );
            self.notify(Notice::warning(message));
            return;
        }

        let token = self.state.epochs.bump(StreamKind::Generation);
        self.state.set_busy(None);
        self.emit(Effect::ResolveGenerationSettings { token });
    }

    fn confirm_reference(&mut self) {
        let s = &mut self.state;
        if s.stage != Stage::Generating || s.reference_image.is_none() || s.reference_confirmed || s.busy {
            return;
        }
        s.reference_confirmed = true;
        s.set_busy(None);
        s.logs.push(LOG_REFERENCE_CONFIRMED.to_string());
        let job = generation_job(s);
        let token = s.epochs.bump(StreamKind::Generation);
        self.emit(Effect::QueueGeneration { token, job });
    }

    fn regenerate_reference(&mut self) {
        let s = &mut self.state;
        if s.stage != Stage::Generating || s.reference_confirmed || s.busy {
            return;
        }
        let Some(request) = reference_request(s) else {
            return;
        };
        s.reference_image = None;
        s.set_busy(None);
        s.logs.push(LOG_REFERENCE_RETRY.to_string());
        let token = s.epochs.bump(StreamKind::Generation);
        self.emit(Effect::GenerateReference { token, request });
    }

    fn fetch_titles(&mut self) {
        let story_preview = self.state.story_preview();
        let token = self.state.epochs.bump(StreamKind::Generation);
        self.state
            .set_busy(Some(LoadingStatus::new(TITLES_LOADING, TITLES_DETAIL)));
        self.emit(Effect::FetchTitles { token, story_preview });
    }

    fn reset(&mut self) {
        let previous = std::mem::take(&mut self.state);
        self.state.epochs = previous.epochs;
        self.state.use_reference_image = previous.use_reference_image;
        for kind in StreamKind::ALL {
            self.close_stream(kind);
        }
    }

    fn on_event(&mut self, event: WorkflowEvent) {
        match event {
            WorkflowEvent::DraftStream { token, event } => {
                if self.state.epochs.is_current(token) {
                    self.on_draft_stream(event);
                }
            }
            WorkflowEvent::DraftRegenerated { draft_id, result } => {
                let s = &mut self.state;
                let Some(slot) = s
                    .drafts
                    .iter_mut()
                    .find(|d| d.id == draft_id && d.is_regenerating())
                else {
                    return;
                };
                *slot = match result {
                    Ok(mut draft) => {
                        draft.id = draft_id;
                        draft
                    }
                    Err(failure) => Draft::failed(draft_id, failure.message()),
                };
            }
            WorkflowEvent::StoryPrepared { token, result } => {
                if !self.state.epochs.is_current(token) {
                    return;
                }
                match result {
                    Ok(request_id) => self.emit(Effect::OpenStoryStream { token, request_id }),
                    Err(failure) => {
                        self.state.story_stream.active = false;
                        self.state.epochs.bump(StreamKind::Story);
                        self.notify(Notice::error(format!("스토리 생성 요청 실패: {}", failure)));
                    }
                }
            }
            WorkflowEvent::StoryStream { token, event } => {
                if self.state.epochs.is_current(token) {
                    self.on_story_stream(event);
                }
            }
            WorkflowEvent::ScriptParsed { token, result } => {
                let s = &mut self.state;
                if !s.epochs.is_current(token) || s.stage != Stage::StoryConfirm || !s.busy {
                    return;
                }
                s.set_idle();
                match result {
                    Ok(parsed) => {
                        let total = if parsed.total_cuts > 0 {
                            parsed.total_cuts as usize
                        } else {
                            parsed.cuts.len()
                        };
                        s.cuts = parsed.cuts;
                        s.character_prompt = parsed.character_prompt;
                        self.notify(Notice::info(format!("분석 완료: 총 {}컷이 생성되었습니다.", total)));
                    }
                    Err(failure) => self.notify(Notice::error(format!("파싱 실패: {}", failure))),
                }
            }
            WorkflowEvent::GenerationSettingsResolved { token, use_reference_image } => {
                if self.state.epochs.is_current(token) && self.state.stage == Stage::StoryConfirm {
                    self.begin_generation(token, use_reference_image);
                }
            }
            WorkflowEvent::ReferenceGenerated { token, result } => {
                let s = &mut self.state;
                if !s.epochs.is_current(token) {
                    return;
                }
                s.set_idle();
                match result {
                    Ok(url) => {
                        s.reference_image = Some(url);
                        s.logs.push(LOG_REFERENCE_READY.to_string());
                    }
                    Err(Failure::Rejected(message)) => s.logs.push(format!("❌ 오류: {}", message)),
                    Err(Failure::Transport(message)) => {
                        s.logs.push(format!("❌ 서버 연결 오류: {}", message))
                    }
                }
            }
            WorkflowEvent::GenerationQueued { token, result } => {
                if !self.state.epochs.is_current(token) {
                    return;
                }
                match result {
                    Ok(job_id) => self.emit(Effect::OpenGenerationStream { token, job_id }),
                    Err(failure) => {
                        let s = &mut self.state;
                        s.set_idle();
                        match failure {
                            Failure::Rejected(_) => s.logs.push(LOG_QUEUE_REJECTED.to_string()),
                            Failure::Transport(message) => {
                                s.logs.push(format!("❌ 큐 요청 오류: {}", message))
                            }
                        }
                    }
                }
            }
            WorkflowEvent::GenerationStream { token, event } => {
                if self.state.epochs.is_current(token) {
                    self.on_generation_stream(event);
                }
            }
            WorkflowEvent::StreamEnded { token, error } => {
                if self.state.epochs.is_current(token) {
                    self.on_stream_ended(token.kind, error);
                }
            }
            WorkflowEvent::TitlesFetched { token, result } => {
                let s = &mut self.state;
                if !s.epochs.is_current(token) || s.stage != Stage::Generating || !s.busy {
                    return;
                }
                s.set_idle();
                match result {
                    Ok(titles) => {
                        s.titles = titles;
                        s.stage = Stage::TitleSelect;
                    }
                    Err(failure) => self.notify(Notice::error(format!("제목 생성 실패: {}", failure))),
                }
            }
            WorkflowEvent::ReferenceSettingLoaded { use_reference_image } => {
                self.state.use_reference_image = use_reference_image;
            }
        }
    }

    fn on_draft_stream(&mut self, event: DraftStreamEvent) {
        let s = &mut self.state;
        match event {
            DraftStreamEvent::Delta { draft_id, text } => {
                if Draft::is_valid_id(draft_id) {
                    s.streaming_texts.entry(draft_id).or_default().push_str(&text);
                }
            }
            DraftStreamEvent::Draft(draft) => {
                if Draft::is_valid_id(draft.id) {
                    upsert_sorted(&mut s.drafts, draft);
                }
            }
            DraftStreamEvent::Complete { .. } => {
                s.set_idle();
                s.streaming_texts.clear();
                self.close_stream(StreamKind::Drafts);
            }
            DraftStreamEvent::Error { error } => {
                s.set_idle();
                self.close_stream(StreamKind::Drafts);
                self.notify(Notice::error(format!("초안 생성 오류: {}", error)));
            }
        }
    }

    fn on_story_stream(&mut self, event: StoryStreamEvent) {
        let s = &mut self.state;
        match event {
            StoryStreamEvent::Delta { text } => s.story_stream.staged_text.push_str(&text),
            StoryStreamEvent::Complete(StoryOutline {
                cuts,
                character_prompt,
                full_text,
            }) => {
                if let Some(draft) = s.editing_draft.take() {
                    s.selected_draft = Some(draft);
                }
                s.edited_story = if full_text.trim().is_empty() {
                    story_text(&cuts)
                } else {
                    full_text
                };
                s.cuts = cuts;
                s.character_prompt = character_prompt;
                s.stage = Stage::StoryConfirm;
                s.story_stream.active = false;
                self.close_stream(StreamKind::Story);
            }
            StoryStreamEvent::Error { error } => {
                s.story_stream.active = false;
                self.close_stream(StreamKind::Story);
                self.notify(Notice::error(format!("오류 발생: {}", error)));
            }
        }
    }

    fn begin_generation(&mut self, token: StreamToken, use_reference_image: Option<bool>) {
        let s = &mut self.state;
        let use_reference = use_reference_image.unwrap_or(s.use_reference_image);
        s.use_reference_image = use_reference;
        s.stage = Stage::Generating;
        s.current_cut_index = 1;
        s.current_image = None;
        s.result = None;
        s.titles.clear();

        if !use_reference {
            s.logs = vec![LOG_DIRECT_START.to_string()];
            s.reference_image = None;
            s.reference_confirmed = true;
            let job = generation_job(s);
            self.emit(Effect::QueueGeneration { token, job });
        } else if s.reference_image.is_some() {
            s.logs = vec![LOG_UPLOADED_REFERENCE.to_string()];
            s.reference_confirmed = false;
            s.set_idle();
        } else {
            s.logs = vec![LOG_REFERENCE_START.to_string()];
            s.reference_confirmed = false;
            match reference_request(s) {
                Some(request) => self.emit(Effect::GenerateReference { token, request }),
                None => s.set_idle(),
            }
        }
    }

    fn on_generation_stream(&mut self, event: GenerationStreamEvent) {
        let s = &mut self.state;
        match event {
            GenerationStreamEvent::Log { message, cut_index } => {
                s.logs.push(message);
                if let Some(index) = cut_index.filter(|i| *i > 0) {
                    s.current_cut_index = index;
                }
            }
            GenerationStreamEvent::Preview { image, cut_index } => {
                s.current_image = Some(image);
                if let Some(index) = cut_index.filter(|i| *i > 0) {
                    s.current_cut_index = index;
                }
            }
            GenerationStreamEvent::Result(result) => s.result = Some(result),
            GenerationStreamEvent::Done(result) => {
                if let Some(result) = result {
                    s.result = Some(result);
                }
                self.close_stream(StreamKind::Generation);
                self.fetch_titles();
            }
            GenerationStreamEvent::Error { message } => {
                s.logs.push(format!("❌ {}", message));
                s.set_idle();
                self.close_stream(StreamKind::Generation);
            }
        }
    }

    fn on_stream_ended(&mut self, kind: StreamKind, error: Option<String>) {
        self.state.epochs.bump(kind);
        let s = &mut self.state;
        match kind {
            StreamKind::Drafts => {
                s.set_idle();
                if let Some(error) = error {
                    self.notify(Notice::error(format!("초안 스트리밍 연결 오류: {}", error)));
                }
            }
            StreamKind::Story => {
                s.story_stream.active = false;
                let message = match error {
                    Some(error) => format!("{} ({})", STORY_DISCONNECTED, error),
                    None => STORY_DISCONNECTED.to_string(),
                };
                self.notify(Notice::error(message));
            }
            StreamKind::Generation => {
                s.set_idle();
                if let Some(error) = error {
                    s.logs.push(format!("❌ 서버 연결 오류: {}", error));
                }
            }
        }
    }
}

fn draft_query(s: &WorkflowState) -> DraftQuery {
    DraftQuery::new(s.format, s.input_mode, &s.category, &s.custom_input)
}

fn reference_request(s: &WorkflowState) -> Option<ReferenceRequest> {
    s.cuts.first().map(|cut| ReferenceRequest {
        format: s.format,
        style: s.style,
        cut: cut.clone(),
        character_prompt: s.character_prompt.clone(),
    })
}

fn generation_job(s: &WorkflowState) -> GenerationJob {
    let topic = s
        .selected_draft
        .as_ref()
        .map(|d| d.title.clone())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TOPIC.to_string());
    GenerationJob {
        format: s.format,
        style: s.style,
        topic,
        cuts: s.cuts.clone(),
        title: s.job_title(),
        character_prompt: s.character_prompt.clone(),
        reference_image: s.reference_image.clone(),
    }
}
