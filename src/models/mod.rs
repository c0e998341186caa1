use serde::{Deserialize, Serialize};

// ============================================================================
// Canvas API Models
// ============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Course {
    pub id: u64,
    // Date-restricted courses come back without a name
    pub name: Option<String>,
    pub course_code: Option<String>,
    pub term: Option<Term>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Term {
    pub id: u64,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Enrollment {
    #[serde(rename = "type")]
    pub enrollment_type: Option<String>,
    pub grades: Option<Grades>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Grades {
    pub current_score: Option<f64>,
    pub current_grade: Option<String>,
    pub final_score: Option<f64>,
    pub final_grade: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    pub id: Option<u64>,
    pub name: String,
    pub short_name: Option<String>,
    pub avatar_url: Option<String>,
}

// ============================================================================
// Internal Snapshot Models
// ============================================================================

/// Grade fields for one course. Both scores `None` means the course has no
/// disclosed grade yet; that is distinct from the grade sub-call failing,
/// which leaves `CourseSnapshot::grade` as `None` entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeInfo {
    pub current_score: Option<f64>,
    pub current_grade: Option<String>,
    pub final_score: Option<f64>,
    pub final_grade: Option<String>,
}

impl GradeInfo {
    pub fn has_disclosed_grade(&self) -> bool {
        self.current_score.is_some() || self.final_score.is_some()
    }

    /// Human-readable grade line. Current score takes precedence over final.
    pub fn display(&self) -> Option<String> {
        let (label, score, letter) = if self.current_score.is_some() {
            ("Current", self.current_score, self.current_grade.as_deref())
        } else if self.final_score.is_some() {
            ("Final", self.final_score, self.final_grade.as_deref())
        } else {
            return None;
        };

        let score = score?;
        let mut text = format!("{}: {:.1}%", label, score);
        if let Some(letter) = letter {
            text.push_str(&format!(" ({})", letter));
        }
        Some(text)
    }
}

impl From<Grades> for GradeInfo {
    fn from(g: Grades) -> Self {
        Self {
            current_score: g.current_score,
            current_grade: g.current_grade,
            final_score: g.final_score,
            final_grade: g.final_grade,
        }
    }
}

/// Immutable per-course record handed to the UI layer. Replaced wholesale on
/// each successful refresh cycle, never mutated field by field.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseSnapshot {
    pub id: u64,
    pub name: String,
    pub course_code: Option<String>,
    pub term: Option<String>,
    /// `None` when the grade sub-call failed or no student enrollment exists.
    pub grade: Option<GradeInfo>,
}

impl CourseSnapshot {
    pub fn from_course(course: Course, grade: Option<GradeInfo>) -> Self {
        Self {
            id: course.id,
            name: course.name.unwrap_or_else(|| "Unknown Course".to_string()),
            course_code: course.course_code,
            term: course.term.and_then(|t| t.name),
            grade,
        }
    }

    /// Grade line for display, covering the unavailable and undisclosed cases.
    pub fn grade_display(&self) -> String {
        match &self.grade {
            None => "Grade: Not available".to_string(),
            Some(info) => match info.display() {
                Some(text) => text,
                None => "Grade: No grade yet".to_string(),
            },
        }
    }
}

/// Immutable profile record. Fetched once per cycle, independent of course
/// data; a later snapshot replaces an earlier one atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSnapshot {
    pub name: String,
    pub short_name: Option<String>,
    pub avatar_url: Option<String>,
    pub id: Option<u64>,
}

impl From<Profile> for ProfileSnapshot {
    fn from(p: Profile) -> Self {
        Self {
            name: p.name,
            short_name: p.short_name,
            avatar_url: p.avatar_url,
            id: p.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grade(current: Option<f64>, final_score: Option<f64>) -> GradeInfo {
        GradeInfo {
            current_score: current,
            current_grade: current.map(|_| "A".to_string()),
            final_score,
            final_grade: final_score.map(|_| "B".to_string()),
        }
    }

    #[test]
    fn current_score_takes_precedence_over_final() {
        let info = grade(Some(93.21), Some(88.0));
        assert_eq!(info.display().unwrap(), "Current: 93.2% (A)");
    }

    #[test]
    fn final_score_used_when_current_missing() {
        let info = grade(None, Some(88.04));
        assert_eq!(info.display().unwrap(), "Final: 88.0% (B)");
    }

    #[test]
    fn no_scores_means_no_disclosed_grade() {
        let info = grade(None, None);
        assert!(!info.has_disclosed_grade());
        assert_eq!(info.display(), None);
    }

    #[test]
    fn snapshot_distinguishes_unavailable_from_undisclosed() {
        let course = Course {
            id: 1,
            name: Some("Systems Programming".to_string()),
            course_code: Some("CS-450".to_string()),
            term: None,
        };
        let unavailable = CourseSnapshot::from_course(course.clone(), None);
        assert_eq!(unavailable.grade_display(), "Grade: Not available");

        let undisclosed = CourseSnapshot::from_course(course, Some(grade(None, None)));
        assert_eq!(undisclosed.grade_display(), "Grade: No grade yet");
    }

    #[test]
    fn missing_course_name_falls_back() {
        let course = Course {
            id: 7,
            name: None,
            course_code: None,
            term: Some(Term {
                id: 2,
                name: Some("Fall 2025".to_string()),
            }),
        };
        let snap = CourseSnapshot::from_course(course, None);
        assert_eq!(snap.name, "Unknown Course");
        assert_eq!(snap.term.as_deref(), Some("Fall 2025"));
    }
}
