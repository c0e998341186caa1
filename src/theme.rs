use crate::sink::UpdateSink;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::{debug, warn};

pub const DEFAULT_THEME: &str = "light";

/// Style payload pushed to the UI layer when a theme is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeStyle {
    pub name: &'static str,
    pub window_bg: &'static str,
    pub card_bg: &'static str,
    pub border: &'static str,
    pub text_primary: &'static str,
    pub text_secondary: &'static str,
    pub accent: &'static str,
    /// Grade tier colors: >= 90, >= 80, >= 70, below.
    pub grade_high: &'static str,
    pub grade_mid: &'static str,
    pub grade_low: &'static str,
    pub grade_fail: &'static str,
}

pub const LIGHT: ThemeStyle = ThemeStyle {
    name: "light",
    window_bg: "#f5f5f5",
    card_bg: "#ffffff",
    border: "#dddddd",
    text_primary: "#000000",
    text_secondary: "#666666",
    accent: "#1976D2",
    grade_high: "#2E7D32",
    grade_mid: "#F57C00",
    grade_low: "#D32F2F",
    grade_fail: "#B71C1C",
};

pub const DARK: ThemeStyle = ThemeStyle {
    name: "dark",
    window_bg: "#1e1e1e",
    card_bg: "#2b2b2b",
    border: "#3c3c3c",
    text_primary: "#e0e0e0",
    text_secondary: "#9e9e9e",
    accent: "#64B5F6",
    grade_high: "#81C784",
    grade_mid: "#FFB74D",
    grade_low: "#E57373",
    grade_fail: "#EF5350",
};

pub const NORD: ThemeStyle = ThemeStyle {
    name: "nord",
    window_bg: "#2e3440",
    card_bg: "#3b4252",
    border: "#4c566a",
    text_primary: "#eceff4",
    text_secondary: "#d8dee9",
    accent: "#88c0d0",
    grade_high: "#a3be8c",
    grade_mid: "#ebcb8b",
    grade_low: "#d08770",
    grade_fail: "#bf616a",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAppearance {
    Light,
    Dark,
}

/// Host appearance probe for the "auto" theme. The GUI shell substitutes a
/// real palette query; headless runs honor CANVAS_WIDGET_APPEARANCE.
pub fn detect_host_appearance() -> HostAppearance {
    match std::env::var("CANVAS_WIDGET_APPEARANCE").as_deref() {
        Ok("dark") => HostAppearance::Dark,
        _ => HostAppearance::Light,
    }
}

/// Resolve a configured identifier to a concrete style. Fallback chain:
/// explicit theme, then host appearance for "auto", then the default.
pub fn resolve(identifier: &str) -> ThemeStyle {
    match identifier {
        "light" => LIGHT,
        "dark" => DARK,
        "nord" => NORD,
        "auto" => match detect_host_appearance() {
            HostAppearance::Dark => DARK,
            HostAppearance::Light => LIGHT,
        },
        other => {
            warn!("unknown theme '{}', falling back to {}", other, DEFAULT_THEME);
            LIGHT
        }
    }
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Configured and applied identifiers already match.
    Unchanged,
    /// Drift detected; the style payload was pushed exactly once.
    Applied,
    /// Another application was in flight; this call was dropped.
    Busy,
}

/// Clean/Applying reconciliation machine for the theme.
///
/// The configured identifier lives in the config store; the applied one
/// lives here. Equal identifiers are a no-op so ticks never restyle a
/// clean widget. A second caller racing into `check_and_apply` (settings
/// save vs. scheduled tick) loses cleanly: application is short and
/// synchronous, so the guard is a re-entrancy flag, not a cancellation
/// token.
#[derive(Debug, Default)]
pub struct ThemeSync {
    applied: Mutex<Option<String>>,
    applying: AtomicBool,
}

impl ThemeSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Machine that believes `identifier` is already on screen.
    pub fn with_applied(identifier: &str) -> Self {
        Self {
            applied: Mutex::new(Some(identifier.to_string())),
            applying: AtomicBool::new(false),
        }
    }

    pub fn applied(&self) -> Option<String> {
        self.applied.lock().expect("theme lock poisoned").clone()
    }

    /// Compare the configured identifier against the last-applied one and
    /// push a style payload if they differ.
    pub fn check_and_apply(&self, configured: &str, sink: &dyn UpdateSink) -> SyncOutcome {
        {
            let applied = self.applied.lock().expect("theme lock poisoned");
            if applied.as_deref() == Some(configured) {
                return SyncOutcome::Unchanged;
            }
        }

        if self.applying.swap(true, Ordering::SeqCst) {
            debug!("theme application already in flight, dropping '{}'", configured);
            return SyncOutcome::Busy;
        }

        let style = resolve(configured);
        debug!("applying theme '{}' (style {})", configured, style.name);
        sink.apply_theme(&style);

        *self.applied.lock().expect("theme lock poisoned") = Some(configured.to_string());
        self.applying.store(false, Ordering::SeqCst);
        SyncOutcome::Applied
    }
}
