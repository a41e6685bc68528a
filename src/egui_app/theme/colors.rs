//! Color Constants
//!
//! Slate palette used by every screen. Dark backgrounds, light text, one
//! blue accent for actions and links.

use eframe::egui::Color32;

/// Window background
pub const BG_DARK: Color32 = Color32::from_rgb(0x1B, 0x1F, 0x27);

/// Top bar background
pub const TOP_BAR_BG: Color32 = Color32::from_rgb(0x23, 0x29, 0x33);

/// Bookmark row background
pub const ROW_BG: Color32 = Color32::from_rgb(0x26, 0x2C, 0x37);

/// Secondary button background
pub const BUTTON_SECONDARY: Color32 = Color32::from_rgb(0x2F, 0x36, 0x43);

/// Form card background
pub const FORM_BG: Color32 = Color32::from_rgb(0x23, 0x29, 0x33);

/// Text input background
pub const INPUT_BG: Color32 = Color32::from_rgb(0x15, 0x19, 0x20);

/// Borders and separators
pub const BORDER: Color32 = Color32::from_rgb(0x3A, 0x42, 0x50);

/// Text on dark backgrounds
pub const TEXT_LIGHT: Color32 = Color32::from_rgb(0xE6, 0xE9, 0xEF);

/// Secondary text color (muted)
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(0x93, 0x9C, 0xAB);

/// Accent color for primary buttons
pub const ACCENT: Color32 = Color32::from_rgb(0x3B, 0x82, 0xF6);

/// Accent under the pointer
pub const ACCENT_HOVER: Color32 = Color32::from_rgb(0x60, 0x9A, 0xF8);

/// Link text
pub const LINK: Color32 = Color32::from_rgb(0x7D, 0xB4, 0xFF);

/// Live channel connected
pub const STATUS_ONLINE: Color32 = Color32::from_rgb(0x4C, 0xAF, 0x50);

/// Live channel connecting or closed
pub const STATUS_OFFLINE: Color32 = Color32::from_rgb(0x9E, 0x9E, 0x9E);

/// Error color - Red
pub const ERROR: Color32 = Color32::from_rgb(0xE5, 0x73, 0x73);

/// Warning color - Orange
pub const WARNING: Color32 = Color32::from_rgb(0xFF, 0xA7, 0x26);

/// Modal window background
pub const MODAL_BG: Color32 = Color32::from_rgb(0x2A, 0x31, 0x3D);
