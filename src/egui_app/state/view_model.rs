//! Bookmarks View Model
//!
//! Owns the in-memory bookmark list and the form draft for the signed-in
//! user. Remote work runs on worker threads; `poll` applies whatever has
//! settled, once per frame.
//!
//! The list is only ever replaced wholesale by a fetch. Every mutation,
//! successful or not, is followed by a fetch, and so is every change
//! notification from the live channel.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use uuid::Uuid;

use crate::egui_app::auth::SessionListener;
use crate::egui_app::realtime::{ChangeFeed, Subscription, SubscriptionStatus};
use crate::egui_app::state::draft::{Draft, Submission, MISSING_FIELDS_WARNING};
use crate::egui_app::store_client::BookmarkStore;
use crate::shared::bookmark::Bookmark;
use crate::shared::error::StoreError;
use crate::shared::event::ChangeEvent;
use crate::shared::identity::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mutation {
    Create,
    Update,
    Delete,
}

enum Outcome {
    Listed {
        owner_id: Uuid,
        result: Result<Vec<Bookmark>, StoreError>,
    },
    Mutated {
        action: Mutation,
        result: Result<(), StoreError>,
    },
}

/// Live change channel plus the receiver its events land in
struct LiveChannel {
    subscription: Subscription,
    events: Receiver<ChangeEvent>,
    status: Option<SubscriptionStatus>,
}

pub struct BookmarksViewModel {
    store: Arc<dyn BookmarkStore>,
    feed: Arc<dyn ChangeFeed>,
    table: String,
    session: Option<SessionListener>,
    identity: Option<Identity>,
    bookmarks: Vec<Bookmark>,
    /// Form draft; the views edit `title` and `url` in place
    pub draft: Draft,
    warning: Option<String>,
    channel: Option<LiveChannel>,
    outcome_tx: Sender<Outcome>,
    outcomes: Receiver<Outcome>,
    in_flight: usize,
}

impl BookmarksViewModel {
    pub fn new(
        store: Arc<dyn BookmarkStore>,
        feed: Arc<dyn ChangeFeed>,
        table: impl Into<String>,
    ) -> Self {
        let (outcome_tx, outcomes) = mpsc::channel();
        Self {
            store,
            feed,
            table: table.into(),
            session: None,
            identity: None,
            bookmarks: Vec::new(),
            draft: Draft::default(),
            warning: None,
            channel: None,
            outcome_tx,
            outcomes,
            in_flight: 0,
        }
    }

    /// Follow identity changes from `listener`; they are applied in `poll`.
    pub fn with_session(mut self, listener: SessionListener) -> Self {
        self.session = Some(listener);
        self
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    /// Blocking warning to show, if any
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn dismiss_warning(&mut self) {
        self.warning = None;
    }

    /// True while any fetch or mutation has not settled yet
    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    pub fn submit_label(&self) -> &'static str {
        self.draft.submit_label()
    }

    /// Status of the live channel; `None` when no channel is open
    pub fn channel_status(&self) -> Option<&SubscriptionStatus> {
        self.channel.as_ref().and_then(|c| c.status.as_ref())
    }

    pub fn is_subscribed(&self) -> bool {
        self.channel.is_some()
    }

    /// Re-scope the model to `identity`: the old channel is torn down, then a
    /// fetch and a new channel follow if someone is signed in.
    pub fn set_identity(&mut self, identity: Option<Identity>) {
        self.channel = None;

        let previous = self.identity.as_ref().map(|i| i.id);
        let next = identity.as_ref().map(|i| i.id);
        if previous != next {
            self.bookmarks.clear();
            self.draft.clear();
        }
        self.identity = identity;

        if self.identity.is_some() {
            self.refresh();
            self.subscribe();
        }
    }

    fn subscribe(&mut self) {
        let (tx, rx) = mpsc::channel();
        let subscription = self.feed.subscribe(&self.table, tx);
        self.channel = Some(LiveChannel {
            subscription,
            events: rx,
            status: None,
        });
    }

    /// Fetch the owner's rows; the result replaces the list when it settles.
    pub fn refresh(&mut self) {
        let Some(identity) = &self.identity else {
            tracing::trace!("Refresh skipped: no identity");
            return;
        };
        let owner_id = identity.id;
        let store = Arc::clone(&self.store);
        let tx = self.outcome_tx.clone();

        self.in_flight += 1;
        std::thread::spawn(move || {
            let result = store.list(owner_id);
            let _ = tx.send(Outcome::Listed { owner_id, result });
        });
    }

    /// Create or update from the draft. Empty fields raise the blocking
    /// warning and nothing is sent.
    pub fn submit(&mut self) {
        let submission = match self.draft.submission() {
            Ok(submission) => submission,
            Err(e) => {
                tracing::debug!("Submit blocked: {}", e);
                self.warning = Some(MISSING_FIELDS_WARNING.to_string());
                return;
            }
        };

        match submission {
            Submission::Create { title, url } => {
                let Some(identity) = &self.identity else {
                    tracing::warn!("Cannot add a bookmark without a signed-in user");
                    return;
                };
                let owner_id = identity.id;
                self.run_mutation(Mutation::Create, move |store| {
                    store.create(owner_id, &title, &url)
                });
            }
            Submission::Update { id, title, url } => {
                self.run_mutation(Mutation::Update, move |store| {
                    store.update(id, &title, &url)
                });
            }
        }
    }

    pub fn begin_edit(&mut self, bookmark: &Bookmark) {
        self.draft.begin_edit(bookmark);
    }

    pub fn cancel_edit(&mut self) {
        self.draft.clear();
    }

    /// Delete the row with `id`. The list is re-fetched however the delete
    /// turns out.
    pub fn remove(&mut self, id: Uuid) {
        self.run_mutation(Mutation::Delete, move |store| store.delete(id));
    }

    fn run_mutation<F>(&mut self, action: Mutation, op: F)
    where
        F: FnOnce(&dyn BookmarkStore) -> Result<(), StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let tx = self.outcome_tx.clone();

        self.in_flight += 1;
        std::thread::spawn(move || {
            let result = op(store.as_ref());
            let _ = tx.send(Outcome::Mutated { action, result });
        });
    }

    /// Apply identity changes, settled remote work and change notifications.
    pub fn poll(&mut self) {
        let changes: Vec<_> = match &self.session {
            Some(listener) => std::iter::from_fn(|| listener.try_next()).collect(),
            None => Vec::new(),
        };
        for change in changes {
            tracing::debug!("Identity change: {:?}", change.event);
            self.set_identity(change.identity);
        }

        while let Ok(outcome) = self.outcomes.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            self.apply(outcome);
        }

        let mut notified = false;
        if let Some(channel) = &mut self.channel {
            while channel.events.try_recv().is_ok() {
                notified = true;
            }
            if let Some(status) = channel.subscription.poll_status() {
                channel.status = Some(status);
            }
        }
        if notified {
            self.refresh();
        }
    }

    fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Listed {
                owner_id,
                result: Ok(rows),
            } => {
                // Rows fetched for an identity that is no longer current.
                if self.identity.as_ref().map(|i| i.id) != Some(owner_id) {
                    tracing::debug!("Dropping list fetched for a previous identity");
                    return;
                }
                self.bookmarks = rows;
            }
            Outcome::Listed { result: Err(e), .. } => {
                tracing::warn!("Fetch error: {}", e);
            }
            Outcome::Mutated { action, result } => {
                if let Err(e) = result {
                    tracing::warn!("{:?} failed: {}", action, e);
                }
                self.draft.clear();
                self.refresh();
            }
        }
    }
}
