use std::sync::Arc;

use crate::egui_app::auth::SessionStore;
use crate::egui_app::context::StoreContext;
use crate::egui_app::realtime::SseChangeFeed;
use crate::egui_app::store_client::RestStore;
use crate::egui_app::AppView;

pub mod draft;
pub mod view_model;

pub use draft::{Draft, DraftMode, Submission, MISSING_FIELDS_WARNING};
pub use view_model::BookmarksViewModel;

/// Central application state shared across egui views.
pub struct AppState {
    pub context: StoreContext,
    pub session: SessionStore,
    pub bookmarks: BookmarksViewModel,
    pub current_view: AppView,
    /// Last sign-in failure, shown on the login screen
    pub login_error: Option<String>,
}

impl AppState {
    pub fn new(context: StoreContext) -> Self {
        let mut session = SessionStore::new(context.clone());
        let listener = session.listen();
        let table = context.config().table().to_string();

        let bookmarks = BookmarksViewModel::new(
            Arc::new(RestStore::new(context.clone())),
            Arc::new(SseChangeFeed::new(context.clone())),
            table,
        )
        .with_session(listener);

        session.restore();
        let current_view = if session.is_restoring() {
            AppView::Restoring
        } else {
            AppView::Login
        };

        Self {
            context,
            session,
            bookmarks,
            current_view,
            login_error: None,
        }
    }

    /// Apply settled background work and pick the view. Called once per frame.
    pub fn tick(&mut self) {
        self.session.poll();
        self.bookmarks.poll();

        let next = if self.session.is_restoring() {
            AppView::Restoring
        } else if self.session.identity().is_some() {
            AppView::Bookmarks
        } else {
            AppView::Login
        };
        if next != self.current_view {
            tracing::debug!("View {:?} -> {:?}", self.current_view, next);
            self.current_view = next;
        }
    }

    /// Start the browser sign-in. Returns the URL to open.
    pub fn handle_login(&mut self) -> Option<String> {
        match self.session.login() {
            Ok(url) => {
                self.login_error = None;
                Some(url)
            }
            Err(e) => {
                tracing::error!("Cannot start sign-in: {}", e);
                self.login_error = Some(e.to_string());
                None
            }
        }
    }

    pub fn logout(&mut self) {
        self.session.logout();
    }

    /// Email of the signed-in user, for the top bar
    pub fn user_email(&self) -> Option<&str> {
        self.session.identity().map(|identity| identity.email.as_str())
    }
}
