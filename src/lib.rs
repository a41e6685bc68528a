//! Smartmarks - Main Library
//!
//! Smartmarks is a desktop bookmark manager. Users sign in through an OAuth
//! identity provider, then add, edit and delete personal bookmarks stored in a
//! hosted Postgres table. Every open window stays in sync through a
//! server-sent change feed.
//!
//! # Module Structure
//!
//! - **`shared`** - Platform-agnostic types
//!   - `Bookmark` and `Identity` records validated at the wire boundary
//!   - Change notification events
//!   - Configuration and error types
//!
//! - **`egui_app`** - Native desktop app (egui/eframe)
//!   - Store context (HTTP client, runtime, access token)
//!   - Session store and OAuth handshake
//!   - Remote table client and change subscription
//!   - View model and views
//!
//! # Usage
//!
//! ```rust,no_run
//! use smartmarks::egui_app::{AppState, Config, StoreContext};
//! use smartmarks::shared::AppConfig;
//!
//! let config = Config::from_app(AppConfig::load().expect("config"));
//! let context = StoreContext::new(config).expect("runtime");
//! let state = AppState::new(context);
//! ```
//!
//! # Thread Safety
//!
//! - egui is single-threaded immediate mode; `AppState` lives on the UI thread.
//! - Remote calls run on worker threads and report back over `std::sync::mpsc`
//!   channels that the UI drains once per frame.

/// Shared types and data structures
pub mod shared;

/// egui native desktop app
pub mod egui_app;
