//! Theme Module
//!
//! Color scheme and frame builders for the bookmark manager.
//!
//! # Usage
//!
//! ```rust,ignore
//! use smartmarks::egui_app::theme::{colors, styles};
//!
//! // Apply global theme
//! styles::apply_global_theme(ctx);
//!
//! // Use frame builders
//! styles::form_frame().show(ui, |ui| {
//!     // Form content
//! });
//! ```

pub mod colors;
pub mod styles;

pub use colors::*;
pub use styles::*;
