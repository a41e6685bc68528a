//! In-memory store and change feed
//!
//! `MemoryBackend` stands in for the hosted table: it keeps rows in a vector,
//! records every call, and pushes a change event to every live subscriber
//! after each mutation, the way the real feed does.

use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

use smartmarks::egui_app::realtime::{ChangeFeed, Subscription, SubscriptionStatus};
use smartmarks::egui_app::store_client::BookmarkStore;
use smartmarks::shared::bookmark::Bookmark;
use smartmarks::shared::error::StoreError;
use smartmarks::shared::event::{ChangeEvent, ChangeOperation};
use uuid::Uuid;

/// One call made against the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List { owner_id: Uuid },
    Create { owner_id: Uuid, title: String, url: String },
    Update { id: Uuid, title: String, url: String },
    Delete { id: Uuid },
}

#[derive(Default)]
struct Inner {
    rows: Vec<Bookmark>,
    calls: Vec<Call>,
    subscribers: Vec<(u64, Sender<ChangeEvent>)>,
    next_subscriber: u64,
    fail_deletes: bool,
    fail_writes: bool,
}

/// Order rows the way the store returns them: identifier descending.
pub fn sort_newest_first(rows: &mut [Bookmark]) {
    rows.sort_by(|a, b| b.id.cmp(&a.id));
}

#[derive(Clone)]
pub struct MemoryBackend {
    table: String,
    inner: Arc<Mutex<Inner>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new("bookmarks")
    }
}

impl MemoryBackend {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Deletes still remove the row but report a server error.
    pub fn fail_deletes(&self) {
        self.lock().fail_deletes = true;
    }

    /// Creates and updates are rejected with a server error and change nothing.
    pub fn fail_writes(&self) {
        self.lock().fail_writes = true;
    }

    /// Insert a row directly, without a change event.
    pub fn seed(&self, owner_id: Uuid, title: &str, url: &str) -> Bookmark {
        let bookmark = Bookmark {
            id: Uuid::new_v4(),
            owner_id,
            title: title.to_string(),
            url: url.to_string(),
        };
        self.lock().rows.push(bookmark.clone());
        bookmark
    }

    /// Rows owned by `owner_id`, identifier descending
    pub fn rows_for(&self, owner_id: Uuid) -> Vec<Bookmark> {
        let mut rows: Vec<_> = self
            .lock()
            .rows
            .iter()
            .filter(|row| row.is_owned_by(owner_id))
            .cloned()
            .collect();
        sort_newest_first(&mut rows);
        rows
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Calls other than fetches
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, Call::List { .. }))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Push a change event as if another client had written to the table.
    pub fn notify(&self, operation: ChangeOperation) {
        let event = ChangeEvent::new(operation, self.table.clone());
        self.lock()
            .subscribers
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }

    fn record(&self, call: Call) {
        self.lock().calls.push(call);
    }
}

impl BookmarkStore for MemoryBackend {
    fn list(&self, owner_id: Uuid) -> Result<Vec<Bookmark>, StoreError> {
        self.record(Call::List { owner_id });
        Ok(self.rows_for(owner_id))
    }

    fn create(&self, owner_id: Uuid, title: &str, url: &str) -> Result<(), StoreError> {
        self.record(Call::Create {
            owner_id,
            title: title.to_string(),
            url: url.to_string(),
        });
        if self.lock().fail_writes {
            return Err(StoreError::http(500, "insert failed"));
        }
        self.seed(owner_id, title, url);
        self.notify(ChangeOperation::Insert);
        Ok(())
    }

    fn update(&self, id: Uuid, title: &str, url: &str) -> Result<(), StoreError> {
        self.record(Call::Update {
            id,
            title: title.to_string(),
            url: url.to_string(),
        });
        {
            let mut inner = self.lock();
            if inner.fail_writes {
                return Err(StoreError::http(500, "update failed"));
            }
            if let Some(row) = inner.rows.iter_mut().find(|row| row.id == id) {
                row.title = title.to_string();
                row.url = url.to_string();
            }
        }
        self.notify(ChangeOperation::Update);
        Ok(())
    }

    fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.record(Call::Delete { id });
        let fail = {
            let mut inner = self.lock();
            inner.rows.retain(|row| row.id != id);
            inner.fail_deletes
        };
        self.notify(ChangeOperation::Delete);
        if fail {
            return Err(StoreError::http(500, "delete failed"));
        }
        Ok(())
    }
}

impl ChangeFeed for MemoryBackend {
    fn subscribe(&self, table: &str, notify: Sender<ChangeEvent>) -> Subscription {
        assert_eq!(table, self.table, "subscribed to an unexpected table");
        let (status_tx, status_rx) = mpsc::channel();
        let _ = status_tx.send(SubscriptionStatus::Connected);

        let id = {
            let mut inner = self.lock();
            let id = inner.next_subscriber;
            inner.next_subscriber += 1;
            inner.subscribers.push((id, notify));
            id
        };

        let inner = Arc::clone(&self.inner);
        Subscription::new(move || {
            if let Ok(mut inner) = inner.lock() {
                inner.subscribers.retain(|(sub, _)| *sub != id);
            }
        })
        .with_status(status_rx)
    }
}
