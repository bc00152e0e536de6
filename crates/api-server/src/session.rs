//! Per-visitor page state.
//!
//! A session is created and torn down explicitly. Event handlers check the
//! context out once, work on their own copy and commit it back once.
//! Sessions nobody has touched for the idle window are swept.

use analysis_core::TimeRange;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use market_gateway::DirectoryEntry;
use report_export::CompanyReport;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::view::{AiPortfolioView, PortfolioView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// Message shown to the user after an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

/// Outcome of the last watchlist action, shown next to the add button
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "ticker", rename_all = "snake_case")]
pub enum WatchlistFeedback {
    Added(String),
    Exists(String),
    Removed(String),
}

impl WatchlistFeedback {
    pub fn notice(&self) -> Notice {
        match self {
            WatchlistFeedback::Added(t) => Notice::success(format!("{} added to your watchlist.", t)),
            WatchlistFeedback::Exists(_) => Notice::info("This ticker is already in your watchlist."),
            WatchlistFeedback::Removed(t) => Notice::success(format!("{} removed.", t)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub selected_ticker: Option<String>,
    pub run_analysis: bool,
    pub watchlist: Vec<String>,
    pub watchlist_feedback: Option<WatchlistFeedback>,
    pub time_range: TimeRange,
    /// "Did you mean" entries for the last search
    pub suggestions: Vec<DirectoryEntry>,
    pub last_report: Option<CompanyReport>,
    pub last_portfolio: Option<PortfolioView>,
    pub last_ai_portfolio: Option<AiPortfolioView>,
}

impl SessionContext {
    /// Add a ticker unless it is already present; returns the resulting feedback
    pub fn add_to_watchlist(&mut self, ticker: &str) -> WatchlistFeedback {
        let feedback = if self.watchlist.iter().any(|t| t == ticker) {
            WatchlistFeedback::Exists(ticker.to_string())
        } else {
            self.watchlist.push(ticker.to_string());
            WatchlistFeedback::Added(ticker.to_string())
        };
        self.watchlist_feedback = Some(feedback.clone());
        feedback
    }

    /// Remove a ticker; `None` when it was not on the list
    pub fn remove_from_watchlist(&mut self, ticker: &str) -> Option<WatchlistFeedback> {
        let index = self.watchlist.iter().position(|t| t == ticker)?;
        self.watchlist.remove(index);
        let feedback = WatchlistFeedback::Removed(ticker.to_string());
        self.watchlist_feedback = Some(feedback.clone());
        Some(feedback)
    }

    pub fn select(&mut self, ticker: String) {
        self.selected_ticker = Some(ticker);
        self.run_analysis = true;
        self.suggestions.clear();
    }

    pub fn close_analysis(&mut self) {
        self.selected_ticker = None;
        self.run_analysis = false;
        self.last_report = None;
    }
}

/// In-memory session table; nothing is persisted
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<Uuid, SessionSlot>>,
}

struct SessionSlot {
    context: SessionContext,
    touched_at: DateTime<Utc>,
}

impl SessionSlot {
    fn new(context: SessionContext) -> Self {
        Self {
            context,
            touched_at: Utc::now(),
        }
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.insert(id, SessionSlot::new(SessionContext::default()));
        tracing::info!("Session {} created ({} active)", id, self.sessions.len());
        id
    }

    /// Copy of the session state, or `None` for an unknown id
    pub fn checkout(&self, id: &Uuid) -> Option<SessionContext> {
        self.sessions.get_mut(id).map(|mut slot| {
            slot.touched_at = Utc::now();
            slot.context.clone()
        })
    }

    /// Write the state back. Returns false when the session was torn down meanwhile.
    pub fn commit(&self, id: &Uuid, ctx: SessionContext) -> bool {
        match self.sessions.get_mut(id) {
            Some(mut slot) => {
                *slot = SessionSlot::new(ctx);
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            tracing::info!("Session {} closed", id);
        }
        removed
    }

    /// Drop sessions idle for at least `idle_ttl_secs`. Returns how many went.
    pub fn evict_idle(&self, idle_ttl_secs: i64) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions
            .retain(|_, slot| (now - slot.touched_at).num_seconds() < idle_ttl_secs);
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            tracing::info!("Evicted {} idle sessions ({} active)", evicted, self.sessions.len());
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    #[cfg(test)]
    fn backdate(&self, id: &Uuid, secs: i64) {
        if let Some(mut slot) = self.sessions.get_mut(id) {
            slot.touched_at = slot.touched_at - chrono::Duration::seconds(secs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watchlist_add_twice() {
        let mut ctx = SessionContext::default();

        let first = ctx.add_to_watchlist("AAPL");
        assert_eq!(first.notice().message, "AAPL added to your watchlist.");

        let second = ctx.add_to_watchlist("AAPL");
        assert_eq!(second.notice(), Notice::info("This ticker is already in your watchlist."));
        assert_eq!(ctx.watchlist, vec!["AAPL".to_string()]);
    }

    #[test]
    fn test_watchlist_remove() {
        let mut ctx = SessionContext::default();
        ctx.add_to_watchlist("MSFT");

        assert!(ctx.remove_from_watchlist("AAPL").is_none());
        let removed = ctx.remove_from_watchlist("MSFT").unwrap();
        assert_eq!(removed.notice().message, "MSFT removed.");
        assert!(ctx.watchlist.is_empty());
    }

    #[test]
    fn test_checkout_is_a_copy_until_commit() {
        let store = SessionStore::new();
        let id = store.create();

        let mut ctx = store.checkout(&id).unwrap();
        ctx.select("NVDA".to_string());
        assert_eq!(store.checkout(&id).unwrap().selected_ticker, None);

        assert!(store.commit(&id, ctx));
        assert_eq!(store.checkout(&id).unwrap().selected_ticker.as_deref(), Some("NVDA"));
    }

    #[test]
    fn test_commit_after_teardown() {
        let store = SessionStore::new();
        let id = store.create();
        let ctx = store.checkout(&id).unwrap();

        assert!(store.remove(&id));
        assert!(!store.commit(&id, ctx));
        assert!(store.is_empty());
    }

    #[test]
    fn test_close_analysis_clears_selection() {
        let mut ctx = SessionContext::default();
        ctx.select("AAPL".to_string());
        ctx.last_report = Some(CompanyReport::default());

        ctx.close_analysis();
        assert!(!ctx.run_analysis);
        assert!(ctx.selected_ticker.is_none());
        assert!(ctx.last_report.is_none());
    }

    #[test]
    fn test_idle_sessions_are_evicted() {
        let store = SessionStore::new();
        let stale = store.create();
        let active = store.create();
        store.backdate(&stale, 7200);

        assert_eq!(store.evict_idle(3600), 1);
        assert!(store.checkout(&stale).is_none());
        assert!(store.checkout(&active).is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_checkout_keeps_session_alive() {
        let store = SessionStore::new();
        let id = store.create();
        store.backdate(&id, 7200);

        assert!(store.checkout(&id).is_some());
        assert_eq!(store.evict_idle(3600), 0);
        assert!(!store.is_empty());
    }

    #[test]
    fn test_zero_idle_window_clears_everything() {
        let store = SessionStore::new();
        store.create();
        store.create();

        assert_eq!(store.evict_idle(0), 2);
        assert!(store.is_empty());
    }
}
