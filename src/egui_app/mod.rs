//! egui Native Desktop App Module
//!
//! This module provides the native bookmark manager built on egui/eframe.
//! It signs the user in against the hosted store, keeps their bookmark list
//! current and renders it.
//!
//! # Architecture
//!
//! - **`config`** - Runtime configuration (store endpoints, session file)
//! - **`context`** - `StoreContext`: HTTP client, tokio runtime, access token
//! - **`auth`** - OAuth PKCE sign-in, session persistence and refresh
//! - **`store_client`** - `BookmarkStore` trait and its REST implementation
//! - **`realtime`** - `ChangeFeed` trait and the SSE change subscription
//! - **`state`** - `AppState` and the bookmarks view model
//! - **`views`** / **`theme`** - egui rendering
//! - **`main`** - Application entry point (binary)
//!
//! # Module Structure
//!
//! ```text
//! egui_app/
//! ├── mod.rs           - Module exports and documentation
//! ├── main.rs          - Application entry point
//! ├── config.rs        - Endpoint configuration
//! ├── context.rs       - Store context
//! ├── auth.rs          - Session store and sign-in
//! ├── store_client.rs  - Remote table client
//! ├── realtime.rs      - Change subscription
//! ├── types.rs         - Shared types
//! ├── state/           - App state, view model, form draft
//! ├── views/           - Screens
//! └── theme/           - Colors and frames
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! // Run the app:
//! // cargo run --bin smartmarks
//! ```

pub mod auth;
pub mod config;
pub mod context;
pub mod realtime;
pub mod state;
pub mod store_client;
pub mod theme;
pub mod types;
pub mod views;

// Re-export commonly used types
pub use auth::{AuthEvent, IdentityChange, SessionEvents, SessionListener, SessionStore};
pub use config::Config;
pub use context::StoreContext;
pub use realtime::{ChangeFeed, SseChangeFeed, Subscription, SubscriptionStatus};
pub use state::{AppState, BookmarksViewModel};
pub use store_client::{BookmarkStore, RestStore};
pub use types::AppView;
