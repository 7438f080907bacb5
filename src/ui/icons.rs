//! Shared UI icons and emojis.
//!
//! Common emoji constants used across the UI components for consistent
//! visual styling, with plain-text fallbacks for dumb terminals.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[WARN]");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[INFO]");

// Progress indicators
pub static PROGRESS: Emoji<'_, '_> = Emoji("📊 ", "[PROG]");
pub static LINK: Emoji<'_, '_> = Emoji("🔗 ", "->");
