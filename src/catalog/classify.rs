//! Resource type inference from title and URL keywords.

use serde::{Deserialize, Serialize};

/// Closed set of resource categories shown to students.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Notes,
    Book,
    #[serde(rename = "Previous Papers")]
    PreviousPapers,
    Slides,
    #[serde(rename = "Lab Manual")]
    LabManual,
    Other,
}

impl ResourceType {
    /// All categories in display order.
    pub const ALL: [ResourceType; 6] = [
        ResourceType::Notes,
        ResourceType::Book,
        ResourceType::PreviousPapers,
        ResourceType::Slides,
        ResourceType::LabManual,
        ResourceType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Notes => "Notes",
            ResourceType::Book => "Book",
            ResourceType::PreviousPapers => "Previous Papers",
            ResourceType::Slides => "Slides",
            ResourceType::LabManual => "Lab Manual",
            ResourceType::Other => "Other",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == label)
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Title keyword groups. Order is significant: the first matching group wins.
const TITLE_RULES: &[(&[&str], ResourceType)] = &[
    (&["note", "lecture", "summary"], ResourceType::Notes),
    (&["book", "textbook", "ebook"], ResourceType::Book),
    (
        &["previous", "paper", "exam", "question"],
        ResourceType::PreviousPapers,
    ),
    (&["slide", "presentation", "ppt"], ResourceType::Slides),
    (&["lab", "manual", "practical"], ResourceType::LabManual),
];

/// URL patterns consulted only when no title group matched.
const URL_RULES: &[(&[&str], ResourceType)] = &[
    (&["slide", ".ppt"], ResourceType::Slides),
    (&["book", ".epub", "textbook"], ResourceType::Book),
];

/// Derive the category of a resource from its title and, when resolvable, its URL.
///
/// Matching is case-insensitive. Title rules always take precedence over URL rules.
pub fn derive_resource_type(title: &str, url: Option<&str>) -> ResourceType {
    let title = title.to_lowercase();
    if let Some(kind) = first_match(&title, TITLE_RULES) {
        return kind;
    }

    let url = url.unwrap_or_default().to_lowercase();
    first_match(&url, URL_RULES).unwrap_or(ResourceType::Other)
}

fn first_match(haystack: &str, rules: &[(&[&str], ResourceType)]) -> Option<ResourceType> {
    rules
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| haystack.contains(k)))
        .map(|(_, kind)| *kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_titles_are_notes_whatever_the_url() {
        for url in [None, Some("https://x.com/slides.ppt"), Some("https://x.com/book.epub")] {
            assert_eq!(derive_resource_type("Unit 2 Notes", url), ResourceType::Notes);
            assert_eq!(derive_resource_type("FOOTNOTE scans", url), ResourceType::Notes);
        }
    }

    #[test]
    fn test_title_groups_in_priority_order() {
        assert_eq!(derive_resource_type("Lecture 4", None), ResourceType::Notes);
        assert_eq!(derive_resource_type("Chapter summary", None), ResourceType::Notes);
        assert_eq!(derive_resource_type("Reference eBook", None), ResourceType::Book);
        assert_eq!(derive_resource_type("2022 Exam", None), ResourceType::PreviousPapers);
        assert_eq!(derive_resource_type("Question bank", None), ResourceType::PreviousPapers);
        assert_eq!(derive_resource_type("Week 1 PPT", None), ResourceType::Slides);
        assert_eq!(derive_resource_type("Practical file", None), ResourceType::LabManual);
    }

    #[test]
    fn test_note_beats_book_in_ambiguous_titles() {
        assert_eq!(derive_resource_type("Notebook of formulas", None), ResourceType::Notes);
        assert_eq!(derive_resource_type("Book of lab experiments", None), ResourceType::Book);
    }

    #[test]
    fn test_url_fallback_only_without_title_match() {
        assert_eq!(
            derive_resource_type("Week 3", Some("https://drive.example.com/Week3.PPTX")),
            ResourceType::Slides
        );
        assert_eq!(
            derive_resource_type("Week 3", Some("https://cdn.example.com/slides/w3")),
            ResourceType::Slides
        );
        assert_eq!(
            derive_resource_type("Calculus", Some("https://cdn.example.com/calculus.epub")),
            ResourceType::Book
        );
        assert_eq!(
            derive_resource_type("Lab 2", Some("https://cdn.example.com/book.epub")),
            ResourceType::LabManual
        );
    }

    #[test]
    fn test_unmatched_input_is_other() {
        assert_eq!(
            derive_resource_type("Course outline", Some("https://example.com/doc.pdf")),
            ResourceType::Other
        );
        assert_eq!(derive_resource_type("", None), ResourceType::Other);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let first = derive_resource_type("Signals", Some("https://x.com/textbook"));
        for _ in 0..10 {
            assert_eq!(derive_resource_type("Signals", Some("https://x.com/textbook")), first);
        }
    }

    #[test]
    fn test_labels_round_trip_through_serde() {
        let json = serde_json::to_string(&ResourceType::PreviousPapers).unwrap();
        assert_eq!(json, "\"Previous Papers\"");
        assert_eq!(ResourceType::from_label("Lab Manual"), Some(ResourceType::LabManual));
        assert_eq!(ResourceType::from_label("lab manual"), None);
    }
}
