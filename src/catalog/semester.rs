//! Numeric ordering of semesters ("Semester 2" before "Semester 10").

use std::cmp::Ordering;

use crate::models::Semester;

/// Anything with an id and a display name that can be ordered like a semester.
pub trait SemesterLike {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
}

impl SemesterLike for Semester {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Ordering key derived from a semester name.
///
/// Names containing digits order by the value of their first digit run and come before
/// names without digits, which order case-insensitively and then by exact text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortKey {
    /// (significant digit count, significant digits) compares by value without overflow.
    Numeric(usize, String),
    Text(String, String),
}

fn sort_key(name: &str) -> SortKey {
    match first_digit_run(name) {
        Some(digits) => {
            let significant = digits.trim_start_matches('0');
            SortKey::Numeric(significant.len(), significant.to_string())
        }
        None => SortKey::Text(name.to_lowercase(), name.to_string()),
    }
}

fn first_digit_run(name: &str) -> Option<&str> {
    let start = name.find(|c: char| c.is_ascii_digit())?;
    let rest = &name[start..];
    let len = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    Some(&rest[..len])
}

/// Compare two semester names.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    sort_key(a).cmp(&sort_key(b))
}

/// Return the semesters in ascending order without touching the input.
///
/// The sort is stable: semesters with the same number keep their relative order.
pub fn sort_semesters<T: SemesterLike>(semesters: &[T]) -> Vec<&T> {
    let mut sorted: Vec<&T> = semesters.iter().collect();
    sorted.sort_by(|a, b| compare_names(a.name(), b.name()));
    sorted
}
