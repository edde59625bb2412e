//! CLI commands. The `tindev` binary parses arguments and delegates to these
//! plain functions so they can be driven from tests.

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use tindev_client::config;
use tindev_client::{
    Action, ApiClient, Candidate, Config, FileStore, MatchEvent, MatchSubscription,
    RealtimeSettings, Session, SessionStore,
};

use crate::error::AppError;
use crate::screens::{ListOptions, ListScreen, ListView, LoginScreen, ScreenEvent};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "TINDEV_CONFIG";

// ── Setup ───────────────────────────────────────────────────────────────

/// Resolve config path from `--config`, then `TINDEV_CONFIG`, then the
/// default `~/.tindev/config.yaml`. The flag says whether it was explicit.
pub fn resolve_config_path(override_path: Option<&Path>) -> Result<(PathBuf, bool), AppError> {
    if let Some(p) = override_path {
        return Ok((p.to_path_buf(), true));
    }
    if let Some(val) = std::env::var_os(CONFIG_ENV) {
        return Ok((PathBuf::from(val), true));
    }
    config::default_config_path()
        .map(|p| (p, false))
        .ok_or_else(|| AppError::Setup(format!("cannot determine config path (set --config or {})", CONFIG_ENV)))
}

/// Explicit config paths must exist; the default one may be absent.
pub fn load_config(override_path: Option<&Path>) -> Result<Config, AppError> {
    let (path, explicit) = resolve_config_path(override_path)?;
    let cfg = if explicit {
        config::load(&path)?
    } else {
        config::load_or_default(&path)?
    };
    tracing::debug!(path = %path.display(), "config loaded");
    Ok(cfg)
}

pub fn open_store(cfg: &Config) -> Result<SessionStore, AppError> {
    let path = cfg
        .effective_storage_path()
        .ok_or_else(|| AppError::Setup("cannot determine storage path (set storage.path)".into()))?;
    Ok(SessionStore::new(FileStore::new(path)))
}

fn api_client(cfg: &Config) -> Result<ApiClient, AppError> {
    Ok(ApiClient::new(&cfg.effective_base_url(), cfg.request_timeout())?)
}

fn require_session(store: &SessionStore) -> Result<Session, AppError> {
    store.load()?.ok_or(AppError::NotLoggedIn)
}

// ── Session commands ────────────────────────────────────────────────────

pub async fn do_login(cfg: &Config, store: &SessionStore, handle: &str) -> Result<Session, AppError> {
    let mut login = LoginScreen::new();
    login.set_handle(handle);
    login.submit(&api_client(cfg)?, store).await
}

pub fn do_logout(store: &SessionStore) -> Result<(), AppError> {
    store.clear()?;
    Ok(())
}

pub fn do_whoami(store: &SessionStore) -> Result<Session, AppError> {
    require_session(store)
}

// ── Queue commands ──────────────────────────────────────────────────────

/// Fetches the queue for the stored session.
pub async fn do_queue(cfg: &Config, store: &SessionStore) -> Result<ListView, AppError> {
    let session = require_session(store)?;
    let screen = ListScreen::mount(session, api_client(cfg)?, &ListOptions::offline(cfg)).await?;
    Ok(screen.view())
}

/// Likes or dislikes `candidate_id`, or the current queue head when `None`.
/// Unlike the swipe screen this waits for the call and reports its failure.
pub async fn do_judge(
    cfg: &Config,
    store: &SessionStore,
    action: Action,
    candidate_id: Option<&str>,
) -> Result<String, AppError> {
    let session = require_session(store)?;
    let api = api_client(cfg)?;
    if let Some(id) = candidate_id {
        api.judge(&session, action, id).await.map_err(|source| AppError::Interaction {
            action,
            candidate_id: id.to_string(),
            source,
        })?;
        return Ok(id.to_string());
    }

    let mut screen = ListScreen::mount(session, api, &ListOptions::offline(cfg)).await?;
    let head = match action {
        Action::Like => screen.like(),
        Action::Dislike => screen.dislike(),
    }
    .ok_or(AppError::EmptyQueue)?;
    for outcome in screen.settle().await {
        if let Err(source) = outcome.result {
            return Err(AppError::Interaction {
                action: outcome.action,
                candidate_id: outcome.candidate_id,
                source,
            });
        }
    }
    Ok(display_name(&head))
}

fn display_name(c: &Candidate) -> String {
    if c.name.is_empty() {
        c.id.clone()
    } else {
        c.name.clone()
    }
}

// ── Realtime commands ───────────────────────────────────────────────────

/// Prints match events until the subscription ends, `limit` were seen or
/// `stop` resolves. The connection is always closed before returning.
pub async fn run_listen<W, S>(
    cfg: &Config,
    store: &SessionStore,
    out: &mut W,
    limit: Option<usize>,
    stop: S,
) -> Result<usize, AppError>
where
    W: Write,
    S: Future<Output = ()>,
{
    let session = require_session(store)?;
    let mut matches =
        MatchSubscription::subscribe(&RealtimeSettings::from_config(cfg), &session).await?;
    writeln!(out, "Listening for matches as {}", session.user_id())?;
    out.flush()?;

    tokio::pin!(stop);
    let mut seen = 0;
    let mut result = Ok(());
    while limit.map_or(true, |max| seen < max) {
        let event = tokio::select! {
            event = matches.recv() => event,
            _ = &mut stop => {
                tracing::info!("listen interrupted");
                break;
            }
        };
        let Some(event) = event else {
            break;
        };
        result = write_match(out, &event).and_then(|_| out.flush());
        if result.is_err() {
            break;
        }
        seen += 1;
    }
    matches.close().await;
    result?;
    Ok(seen)
}

/// Interactive swipe loop: `l` like, `d` dislike, `x` close match, `q` quit.
/// `stop` resolving ends the loop like `q` does.
pub async fn run_swipe<R, W, S>(
    cfg: &Config,
    store: &SessionStore,
    input: R,
    out: &mut W,
    stop: S,
) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    S: Future<Output = ()>,
{
    let session = require_session(store)?;
    let mut screen = ListScreen::mount(session, api_client(cfg)?, &ListOptions::from_config(cfg)).await?;
    let mut lines = input.lines();
    render(out, &screen.view())?;
    tokio::pin!(stop);

    loop {
        tokio::select! {
            _ = &mut stop => break,
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match line.trim() {
                    "l" | "like" => {
                        screen.like();
                    }
                    "d" | "dislike" => {
                        screen.dislike();
                    }
                    "x" | "close" => {
                        screen.dismiss_match();
                        screen.dismiss_notice();
                    }
                    "q" | "quit" => break,
                    "" => {}
                    other => writeln!(out, "unknown command: {} (l, d, x, q)", other)?,
                }
                screen.pump();
                render(out, &screen.view())?;
            }
            Some(event) = screen.next_event() => {
                match event {
                    ScreenEvent::Match(_) => render(out, &screen.view())?,
                    ScreenEvent::Interaction(outcome) if !outcome.is_success() => {
                        render(out, &screen.view())?
                    }
                    ScreenEvent::Interaction(_) => {}
                }
            }
        }
    }

    screen.settle().await;
    if let Some(notice) = screen.view().notice {
        writeln!(out, "! {}", notice)?;
    }
    screen.close().await;
    Ok(())
}

fn write_match<W: Write>(out: &mut W, event: &MatchEvent) -> std::io::Result<()> {
    writeln!(out, "*** It's a match! {} ***", event.name)?;
    if !event.bio.is_empty() {
        writeln!(out, "    {}", event.bio)?;
    }
    if !event.avatar.is_empty() {
        writeln!(out, "    {}", event.avatar)?;
    }
    Ok(())
}

/// Text rendering of the List screen.
pub fn render<W: Write>(out: &mut W, view: &ListView) -> std::io::Result<()> {
    if let Some(message) = view.empty_message {
        writeln!(out, "{}", message)?;
    }
    if let Some(top) = view.cards.first() {
        writeln!(out, "[{} left] {}", view.cards.len(), top.name)?;
        if !top.bio.is_empty() {
            writeln!(out, "    {}", top.bio)?;
        }
        if !top.avatar.is_empty() {
            writeln!(out, "    {}", top.avatar)?;
        }
    }
    if view.show_actions {
        writeln!(out, "(d)islike  (l)ike  (q)uit")?;
    }
    if let Some(event) = &view.match_overlay {
        write_match(out, event)?;
        writeln!(out, "(x) close")?;
    }
    if let Some(notice) = &view.notice {
        writeln!(out, "! {}", notice)?;
    }
    out.flush()
}

/// One line per candidate, head first.
pub fn render_queue<W: Write>(out: &mut W, view: &ListView) -> std::io::Result<()> {
    if let Some(message) = view.empty_message {
        return writeln!(out, "{}", message);
    }
    for card in &view.cards {
        writeln!(out, "{}\t{}\t{}", card.id, card.name, card.bio)?;
    }
    Ok(())
}
