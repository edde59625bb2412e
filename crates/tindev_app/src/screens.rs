//! Headless Login and List screens with plain view models.
//!
//! The List screen advances its queue locally before the like/dislike call
//! completes; outcomes and match pushes arrive later as [`ScreenEvent`]s and
//! are applied on the screen's own task.

use serde::Serialize;
use tindev_client::{
    Action, ApiClient, Candidate, CandidateQueue, Config, ConnectionState, InteractionOutcome,
    Interactions, MatchEvent, MatchMailbox, MatchSubscription, RealtimeSettings, Session,
    SessionStore,
};

use crate::error::AppError;

/// Shown instead of the cards and action controls once the queue is empty.
pub const EMPTY_MESSAGE: &str = "That's it for now";

// ── Login ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct LoginScreen {
    handle: String,
}

impl LoginScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_handle(&mut self, handle: impl Into<String>) {
        self.handle = handle.into();
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Registers the entered handle and persists the returned id.
    pub async fn submit(&self, api: &ApiClient, store: &SessionStore) -> Result<Session, AppError> {
        let session = api.register(&self.handle).await?;
        store.save(session.user_id())?;
        Ok(session)
    }
}

// ── List ────────────────────────────────────────────────────────────────

/// How the List screen is mounted.
#[derive(Debug, Clone)]
pub struct ListOptions {
    /// `None` mounts without a realtime subscription.
    pub realtime: Option<RealtimeSettings>,
    pub match_capacity: usize,
}

impl ListOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            realtime: config
                .realtime_enabled()
                .then(|| RealtimeSettings::from_config(config)),
            match_capacity: config.match_capacity(),
        }
    }

    pub fn offline(config: &Config) -> Self {
        Self {
            realtime: None,
            match_capacity: config.match_capacity(),
        }
    }
}

/// Something that happened after the last user action.
#[derive(Debug)]
pub enum ScreenEvent {
    Match(MatchEvent),
    Interaction(InteractionOutcome),
}

/// One card of the stack; higher `z_index` is drawn on top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    pub id: String,
    pub name: String,
    pub bio: String,
    pub avatar: String,
    pub z_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListView {
    pub cards: Vec<CardView>,
    pub show_actions: bool,
    pub empty_message: Option<&'static str>,
    pub match_overlay: Option<MatchEvent>,
    /// Last failed like/dislike or realtime connect, until dismissed.
    pub notice: Option<String>,
}

pub struct ListScreen {
    session: Session,
    queue: CandidateQueue,
    mailbox: MatchMailbox,
    interactions: Interactions,
    matches: Option<MatchSubscription>,
    notice: Option<String>,
}

impl ListScreen {
    /// Fetches the candidate queue and, if configured, subscribes to matches.
    /// A failed subscription leaves the queue usable and shows a notice.
    pub async fn mount(
        session: Session,
        api: ApiClient,
        options: &ListOptions,
    ) -> Result<Self, AppError> {
        let candidates = api.candidates(&session).await?;
        let mut notice = None;
        let matches = match &options.realtime {
            Some(settings) => match MatchSubscription::subscribe(settings, &session).await {
                Ok(subscription) => Some(subscription),
                Err(e) => {
                    tracing::warn!(error = %e, "match notifications unavailable");
                    notice = Some(format!("match notifications unavailable: {}", e));
                    None
                }
            },
            None => None,
        };
        tracing::info!(
            user_id = session.user_id(),
            candidates = candidates.len(),
            realtime = matches.is_some(),
            "list mounted"
        );
        Ok(Self {
            session,
            queue: CandidateQueue::from(candidates),
            mailbox: MatchMailbox::new(options.match_capacity),
            interactions: Interactions::new(api),
            matches,
            notice,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn queue(&self) -> &CandidateQueue {
        &self.queue
    }

    pub fn like(&mut self) -> Option<Candidate> {
        self.judge(Action::Like)
    }

    pub fn dislike(&mut self) -> Option<Candidate> {
        self.judge(Action::Dislike)
    }

    /// Removes the head and dispatches the call for it. No-op on an empty queue.
    fn judge(&mut self, action: Action) -> Option<Candidate> {
        let head = self.queue.remove_head()?;
        self.interactions.dispatch(&self.session, action, &head.id);
        Some(head)
    }

    pub fn current_match(&self) -> Option<&MatchEvent> {
        self.mailbox.current()
    }

    pub fn dismiss_match(&mut self) -> Option<MatchEvent> {
        self.mailbox.dismiss()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.matches
            .as_ref()
            .map(MatchSubscription::state)
            .unwrap_or(ConnectionState::Disconnected)
    }

    /// Waits for the next match push or interaction outcome and applies it.
    /// Returns `None` when neither can arrive anymore.
    pub async fn next_event(&mut self) -> Option<ScreenEvent> {
        let event = tokio::select! {
            Some(event) = recv_match(&mut self.matches) => ScreenEvent::Match(event),
            Some(outcome) = self.interactions.next_outcome() => ScreenEvent::Interaction(outcome),
            else => return None,
        };
        self.apply(&event);
        Some(event)
    }

    /// Applies every event that is already available without waiting.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.matches.as_mut().and_then(MatchSubscription::try_recv) {
            self.apply(&ScreenEvent::Match(event));
            applied += 1;
        }
        while let Some(outcome) = self.interactions.try_next_outcome() {
            self.record_outcome(&outcome);
            applied += 1;
        }
        applied
    }

    /// Waits for every dispatched like/dislike to report back.
    pub async fn settle(&mut self) -> Vec<InteractionOutcome> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.interactions.next_outcome().await {
            self.record_outcome(&outcome);
            outcomes.push(outcome);
        }
        outcomes
    }

    fn apply(&mut self, event: &ScreenEvent) {
        match event {
            ScreenEvent::Match(event) => self.mailbox.push(event.clone()),
            ScreenEvent::Interaction(outcome) => self.record_outcome(outcome),
        }
    }

    fn record_outcome(&mut self, outcome: &InteractionOutcome) {
        if let Err(e) = &outcome.result {
            self.notice = Some(format!(
                "{} of {} failed: {}",
                outcome.action, outcome.candidate_id, e
            ));
        }
    }

    pub fn view(&self) -> ListView {
        let len = self.queue.len();
        let cards = self
            .queue
            .iter()
            .enumerate()
            .map(|(index, c)| CardView {
                id: c.id.clone(),
                name: c.name.clone(),
                bio: c.bio.clone(),
                avatar: c.avatar.clone(),
                z_index: len - index,
            })
            .collect();
        ListView {
            cards,
            show_actions: len > 0,
            empty_message: (len == 0).then_some(EMPTY_MESSAGE),
            match_overlay: self.mailbox.current().cloned(),
            notice: self.notice.clone(),
        }
    }

    /// Tears down the realtime subscription.
    pub async fn close(mut self) {
        if let Some(matches) = self.matches.take() {
            matches.close().await;
        }
    }
}

async fn recv_match(matches: &mut Option<MatchSubscription>) -> Option<MatchEvent> {
    match matches {
        Some(sub) => sub.recv().await,
        None => None,
    }
}

impl std::fmt::Debug for ListScreen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListScreen")
            .field("session", &self.session)
            .field("queue", &self.queue.len())
            .field("pending_matches", &self.mailbox.len())
            .finish_non_exhaustive()
    }
}
