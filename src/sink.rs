use crate::models::{CourseSnapshot, ProfileSnapshot};
use crate::theme::ThemeStyle;
use std::sync::Mutex;
use tracing::info;

/// Rendering-layer boundary. The engine pushes immutable snapshots, status
/// text, and theme payloads through this; it never reads back. All methods
/// are synchronous and must not block on I/O; implementations hand the data
/// to the widget toolkit's main loop.
pub trait UpdateSink: Send + Sync {
    /// Full replacement of the course list.
    fn courses_updated(&self, courses: Vec<CourseSnapshot>);

    /// A newer profile replaces an earlier one atomically.
    fn profile_updated(&self, profile: ProfileSnapshot);

    /// Transient status line: loading, refreshed-at, or an error message.
    fn status(&self, text: &str);

    /// Restyle the widget with a freshly resolved theme.
    fn apply_theme(&self, style: &ThemeStyle);
}

/// Sink for running the engine headless: everything goes to the log.
#[derive(Debug, Default)]
pub struct LogSink;

impl UpdateSink for LogSink {
    fn courses_updated(&self, courses: Vec<CourseSnapshot>) {
        info!("courses updated ({} total)", courses.len());
        for course in &courses {
            info!("  {}: {}", course.name, course.grade_display());
        }
    }

    fn profile_updated(&self, profile: ProfileSnapshot) {
        info!("profile updated: {}", profile.name);
    }

    fn status(&self, text: &str) {
        info!("status: {}", text);
    }

    fn apply_theme(&self, style: &ThemeStyle) {
        info!("theme applied: {}", style.name);
    }
}

/// One recorded sink push, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkMessage {
    Courses(Vec<CourseSnapshot>),
    Profile(ProfileSnapshot),
    Status(String),
    Theme(String),
}

/// In-memory sink that records every push, for tests and embedders that
/// want to inspect what the engine emitted.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<SinkMessage>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<SinkMessage> {
        self.messages.lock().expect("sink lock poisoned").clone()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                SinkMessage::Status(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn course_updates(&self) -> Vec<Vec<CourseSnapshot>> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                SinkMessage::Courses(courses) => Some(courses),
                _ => None,
            })
            .collect()
    }

    pub fn profile_updates(&self) -> Vec<ProfileSnapshot> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                SinkMessage::Profile(profile) => Some(profile),
                _ => None,
            })
            .collect()
    }

    pub fn themes_applied(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                SinkMessage::Theme(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    fn push(&self, message: SinkMessage) {
        self.messages.lock().expect("sink lock poisoned").push(message);
    }
}

impl UpdateSink for RecordingSink {
    fn courses_updated(&self, courses: Vec<CourseSnapshot>) {
        self.push(SinkMessage::Courses(courses));
    }

    fn profile_updated(&self, profile: ProfileSnapshot) {
        self.push(SinkMessage::Profile(profile));
    }

    fn status(&self, text: &str) {
        self.push(SinkMessage::Status(text.to_string()));
    }

    fn apply_theme(&self, style: &ThemeStyle) {
        self.push(SinkMessage::Theme(style.name.to_string()));
    }
}
