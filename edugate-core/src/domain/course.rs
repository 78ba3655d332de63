//! Course domain model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Image shown when a course has no image of its own
pub const DEFAULT_COURSE_IMAGE: &str = "/logo.png";

/// Page size used by the course list
pub const DEFAULT_COURSES_PER_PAGE: u32 = 20;

/// Category filter vocabulary offered by the course list. `all` matches everything.
pub const COURSE_CATEGORIES: &[&str] = &[
    "all",
    "web development",
    "mobile development",
    "data science",
    "machine learning",
    "artificial intelligence",
    "cloud computing",
    "cybersecurity",
    "game development",
    "ui/ux design",
];

/// A course listing as served by the gateway
///
/// Read-only to everyone except its owner, who changes it through
/// `CourseAdminService`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Free-form label such as "6 weeks"
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub added_by_email: Option<String>,
    #[serde(default)]
    pub added_by_name: Option<String>,
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
    /// Number of enrolled students
    #[serde(default)]
    pub enrollments: u32,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub price: Option<f64>,
}

impl Course {
    /// Create a course with the required fields
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            image_url: None,
            duration: None,
            category: None,
            added_by_email: None,
            added_by_name: None,
            added_at: None,
            enrollments: 0,
            rating: 0.0,
            price: None,
        }
    }

    /// Image to display, falling back to the default
    pub fn display_image(&self) -> &str {
        self.image_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(DEFAULT_COURSE_IMAGE)
    }

    /// Instructor name to display
    pub fn instructor(&self) -> &str {
        self.added_by_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("Unknown Instructor")
    }

    /// True if `email` owns this course
    pub fn is_owned_by(&self, email: &str) -> bool {
        self.added_by_email
            .as_deref()
            .is_some_and(|owner| owner.eq_ignore_ascii_case(email))
    }

    /// Case-insensitive substring match on title or description
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
    }

    /// Case-insensitive category match; `all` matches every course
    pub fn matches_category(&self, category: &str) -> bool {
        if category.eq_ignore_ascii_case("all") {
            return true;
        }
        self.category
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(category))
    }
}

/// Course fields embedded in dashboard enrollment rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Create/edit form for a course
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDraft {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub duration: String,
}

impl CourseDraft {
    /// Every field is required
    pub fn validate(&self) -> Result<()> {
        let fields = [&self.title, &self.description, &self.image_url, &self.duration];
        if fields.iter().any(|f| f.trim().is_empty()) {
            return Err(Error::validation("All fields are required."));
        }
        Ok(())
    }

    /// Prefill an edit form from an existing course
    pub fn from_course(course: &Course) -> Self {
        Self {
            title: course.title.clone(),
            description: course.description.clone(),
            image_url: course.image_url.clone().unwrap_or_default(),
            duration: course.duration.clone().unwrap_or_default(),
        }
    }
}

/// Sort order understood by the course listing endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourseSort {
    #[default]
    #[serde(rename = "addedAt_desc")]
    Newest,
    #[serde(rename = "enrollments_desc")]
    MostPopular,
    #[serde(rename = "rating_desc")]
    HighestRated,
}

impl CourseSort {
    /// Wire token sent as the `sort` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseSort::Newest => "addedAt_desc",
            CourseSort::MostPopular => "enrollments_desc",
            CourseSort::HighestRated => "rating_desc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CourseSort::Newest => "Newest First",
            CourseSort::MostPopular => "Most Popular",
            CourseSort::HighestRated => "Highest Rated",
        }
    }
}

impl fmt::Display for CourseSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CourseSort {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "addedat_desc" | "newest" => Ok(CourseSort::Newest),
            "enrollments_desc" | "popular" => Ok(CourseSort::MostPopular),
            "rating_desc" | "rating" => Ok(CourseSort::HighestRated),
            other => Err(Error::validation(format!("unknown sort order '{}'", other))),
        }
    }
}

/// Parameters for one page of the course list
#[derive(Debug, Clone, PartialEq)]
pub struct CourseQuery {
    pub sort: CourseSort,
    /// 1-based page number
    pub page: u32,
    pub per_page: u32,
    pub search: Option<String>,
    pub category: Option<String>,
}

impl Default for CourseQuery {
    fn default() -> Self {
        Self {
            sort: CourseSort::default(),
            page: 1,
            per_page: DEFAULT_COURSES_PER_PAGE,
            search: None,
            category: None,
        }
    }
}

impl CourseQuery {
    /// Reject categories outside the known vocabulary and a zero page/size
    pub fn validate(&self) -> Result<()> {
        if self.page == 0 {
            return Err(Error::validation("page numbers start at 1"));
        }
        if self.per_page == 0 {
            return Err(Error::validation("page size must be positive"));
        }
        if let Some(category) = &self.category {
            if !COURSE_CATEGORIES
                .iter()
                .any(|c| c.eq_ignore_ascii_case(category.trim()))
            {
                return Err(Error::validation(format!("unknown category '{}'", category)));
            }
        }
        Ok(())
    }

    /// True if `course` passes the local search and category filters
    pub fn accepts(&self, course: &Course) -> bool {
        let search_ok = self
            .search
            .as_deref()
            .map_or(true, |term| course.matches_search(term));
        let category_ok = self
            .category
            .as_deref()
            .map_or(true, |c| course.matches_category(c.trim()));
        search_ok && category_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_course() -> Course {
        let mut course = Course::new("c1", "Rust for Web Developers");
        course.description = "Ownership, borrowing and async".to_string();
        course.category = Some("Web Development".to_string());
        course.added_by_email = Some("owner@example.com".to_string());
        course
    }

    #[test]
    fn test_course_deserializes_gateway_shape() {
        let json = serde_json::json!({
            "_id": "65a1",
            "title": "Data Science 101",
            "description": "Intro",
            "imageUrl": "https://img.example/ds.png",
            "duration": "8 weeks",
            "addedByEmail": "teach@example.com",
            "addedByName": "Teach",
            "addedAt": "2024-05-01T10:00:00Z",
            "enrollments": 12,
            "rating": 4.5
        });
        let course: Course = serde_json::from_value(json).unwrap();
        assert_eq!(course.id, "65a1");
        assert_eq!(course.enrollments, 12);
        assert_eq!(course.duration.as_deref(), Some("8 weeks"));
        assert!(course.added_at.is_some());
    }

    #[test]
    fn test_display_fallbacks() {
        let mut course = Course::new("c1", "T");
        assert_eq!(course.display_image(), DEFAULT_COURSE_IMAGE);
        assert_eq!(course.instructor(), "Unknown Instructor");
        course.image_url = Some("  ".to_string());
        assert_eq!(course.display_image(), DEFAULT_COURSE_IMAGE);
    }

    #[test]
    fn test_search_and_category_filters() {
        let course = sample_course();
        assert!(course.matches_search("rust"));
        assert!(course.matches_search("BORROWING"));
        assert!(!course.matches_search("python"));
        assert!(course.matches_category("web development"));
        assert!(course.matches_category("all"));
        assert!(!course.matches_category("data science"));
    }

    #[test]
    fn test_ownership_is_case_insensitive() {
        let course = sample_course();
        assert!(course.is_owned_by("Owner@Example.com"));
        assert!(!course.is_owned_by("someone@example.com"));
    }

    #[test]
    fn test_draft_requires_all_fields() {
        let mut draft = CourseDraft {
            title: "T".to_string(),
            description: "D".to_string(),
            image_url: "https://img".to_string(),
            duration: "4 weeks".to_string(),
        };
        assert!(draft.validate().is_ok());

        draft.duration = "   ".to_string();
        let err = draft.validate().unwrap_err();
        assert_eq!(err.to_string(), "Validation error: All fields are required.");
    }

    #[test]
    fn test_sort_parsing() {
        assert_eq!("addedAt_desc".parse::<CourseSort>().unwrap(), CourseSort::Newest);
        assert_eq!("popular".parse::<CourseSort>().unwrap(), CourseSort::MostPopular);
        assert_eq!(CourseSort::HighestRated.to_string(), "rating_desc");
        assert!("price_asc".parse::<CourseSort>().is_err());
    }

    #[test]
    fn test_query_validation() {
        let mut query = CourseQuery::default();
        assert!(query.validate().is_ok());

        query.category = Some("Cybersecurity".to_string());
        assert!(query.validate().is_ok());

        query.category = Some("cooking".to_string());
        assert!(query.validate().is_err());

        query.category = None;
        query.page = 0;
        assert!(query.validate().is_err());
    }
}
