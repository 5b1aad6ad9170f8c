//! Client-side resource search over a flattened catalog.

use serde::Deserialize;

use super::classify::{derive_resource_type, ResourceType};
use crate::models::{Department, Resource};

/// A resource annotated with its owning department, semester and subject.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub department_id: String,
    pub department_name: String,
    pub semester_id: String,
    pub semester_name: String,
    pub subject_id: String,
    pub subject_name: String,
    pub resource: Resource,
}

impl CatalogEntry {
    pub fn url(&self) -> Option<String> {
        self.resource.resolved_url()
    }

    pub fn resource_type(&self) -> ResourceType {
        derive_resource_type(&self.resource.title, self.url().as_deref())
    }
}

/// Flatten the hierarchy into one entry per resource, in catalog order.
pub fn flatten(departments: &[Department]) -> Vec<CatalogEntry> {
    let mut entries = Vec::new();
    for dept in departments {
        for sem in &dept.semesters {
            for subj in &sem.subjects {
                for res in &subj.resources {
                    entries.push(CatalogEntry {
                        department_id: dept.id.clone(),
                        department_name: dept.name.clone(),
                        semester_id: sem.id.clone(),
                        semester_name: sem.name.clone(),
                        subject_id: subj.id.clone(),
                        subject_name: subj.name.clone(),
                        resource: res.clone(),
                    });
                }
            }
        }
    }
    entries
}

/// Search criteria. Missing or blank fields impose no constraint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFilter {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub department_id: Option<String>,
    #[serde(default)]
    pub semester_id: Option<String>,
    #[serde(default)]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
}

fn criterion(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl CatalogFilter {
    pub fn keyword(&self) -> Option<&str> {
        criterion(&self.keyword)
    }

    pub fn department_id(&self) -> Option<&str> {
        criterion(&self.department_id)
    }

    pub fn semester_id(&self) -> Option<&str> {
        criterion(&self.semester_id)
    }

    pub fn subject_id(&self) -> Option<&str> {
        criterion(&self.subject_id)
    }

    pub fn resource_type(&self) -> Option<&str> {
        criterion(&self.resource_type)
    }

    /// True when no criterion is supplied.
    pub fn is_blank(&self) -> bool {
        self.keyword().is_none()
            && self.department_id().is_none()
            && self.semester_id().is_none()
            && self.subject_id().is_none()
            && self.resource_type().is_none()
    }

    /// Check an entry against every supplied criterion.
    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        if let Some(keyword) = self.keyword() {
            let keyword = keyword.to_lowercase();
            if !entry.resource.title.to_lowercase().contains(&keyword) {
                return false;
            }
        }

        let id_checks = [
            (self.department_id(), &entry.department_id),
            (self.semester_id(), &entry.semester_id),
            (self.subject_id(), &entry.subject_id),
        ];
        for (wanted, actual) in id_checks {
            if let Some(wanted) = wanted {
                if actual.trim() != wanted {
                    return false;
                }
            }
        }

        if let Some(label) = self.resource_type() {
            if ResourceType::from_label(label) != Some(entry.resource_type()) {
                return false;
            }
        }

        true
    }
}

/// Keep the entries matching all supplied criteria, preserving order.
pub fn filter_entries<'a>(
    entries: &'a [CatalogEntry],
    filter: &CatalogFilter,
) -> Vec<&'a CatalogEntry> {
    entries.iter().filter(|e| filter.matches(e)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExternalBlob, ResourceContent};

    fn entry(dept: &str, sem: &str, subj: &str, id: u64, title: &str, url: &str) -> CatalogEntry {
        CatalogEntry {
            department_id: dept.to_string(),
            department_name: dept.to_uppercase(),
            semester_id: sem.to_string(),
            semester_name: format!("Semester {}", sem),
            subject_id: subj.to_string(),
            subject_name: subj.to_uppercase(),
            resource: Resource {
                id,
                title: title.to_string(),
                content: ResourceContent::url(url),
            },
        }
    }

    fn sample() -> Vec<CatalogEntry> {
        vec![
            entry("cse", "1", "ds", 1, "Chapter 3 Notes", "https://x.com/a.pdf"),
            entry("cse", "1", "ds", 2, "Lab Manual 1", "https://x.com/b.pdf"),
            entry("ece", "2", "sig", 3, "Notesless Book", "https://x.com/c.pdf"),
            entry("cse", "2", "os", 4, "Operating Systems", "https://x.com/os-book"),
            entry("ece", "1", "ckt", 5, "Circuits Textbook", "https://x.com/d.pdf"),
        ]
    }

    fn ids(found: &[&CatalogEntry]) -> Vec<u64> {
        found.iter().map(|e| e.resource.id).collect()
    }

    #[test]
    fn test_blank_filter_returns_everything_in_order() {
        let entries = sample();
        let blank = CatalogFilter {
            keyword: Some("   ".into()),
            department_id: Some(String::new()),
            ..CatalogFilter::default()
        };
        assert!(blank.is_blank());
        assert_eq!(ids(&filter_entries(&entries, &blank)), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_keyword_matches_title_substring_case_insensitively() {
        let entries = vec![
            entry("cse", "1", "ds", 1, "Chapter 3 Notes", "https://x.com/a"),
            entry("cse", "1", "ds", 2, "Lab Manual 1", "https://x.com/notes"),
            entry("cse", "1", "ds", 3, "Notesless Book", "https://x.com/c"),
        ];
        let filter = CatalogFilter {
            keyword: Some("notes".into()),
            ..CatalogFilter::default()
        };
        assert_eq!(ids(&filter_entries(&entries, &filter)), vec![1, 3]);
    }

    #[test]
    fn test_department_and_type_combine() {
        let entries = sample();
        let filter = CatalogFilter {
            department_id: Some("cse".into()),
            resource_type: Some("Book".into()),
            ..CatalogFilter::default()
        };
        // id 4 is a Book by URL; id 5 is a Book in another department
        assert_eq!(ids(&filter_entries(&entries, &filter)), vec![4]);
    }

    #[test]
    fn test_ids_are_trimmed_and_exact() {
        let entries = sample();
        let filter = CatalogFilter {
            department_id: Some(" ece ".into()),
            semester_id: Some("1".into()),
            ..CatalogFilter::default()
        };
        assert_eq!(ids(&filter_entries(&entries, &filter)), vec![5]);

        let partial = CatalogFilter {
            department_id: Some("cs".into()),
            ..CatalogFilter::default()
        };
        assert!(filter_entries(&entries, &partial).is_empty());
    }

    #[test]
    fn test_unknown_type_label_matches_nothing() {
        let entries = sample();
        let filter = CatalogFilter {
            resource_type: Some("notes".into()),
            ..CatalogFilter::default()
        };
        assert!(filter_entries(&entries, &filter).is_empty());
    }

    #[test]
    fn test_unresolvable_blob_url_degrades_to_title_rules() {
        let mut e = entry("cse", "1", "ds", 9, "Week 5", "");
        e.resource.content = ResourceContent::blob(ExternalBlob::from_bytes(b"slides".to_vec()));
        assert_eq!(e.url(), None);
        assert_eq!(e.resource_type(), ResourceType::Other);

        e.resource.content =
            ResourceContent::blob(ExternalBlob::from_url("https://cdn.x.com/w5-slides"));
        assert_eq!(e.resource_type(), ResourceType::Slides);
    }

    #[test]
    fn test_flatten_annotates_context() {
        let departments: Vec<Department> = serde_json::from_value(serde_json::json!([
            {"id": "cse", "name": "CSE", "semesters": [
                {"id": "s1", "name": "Semester 1", "subjects": [
                    {"id": "ds", "name": "Data Structures", "resources": [
                        {"id": 1, "title": "Trees", "content": {"kind": "url", "url": "https://x.com/t"}}
                    ]},
                    {"id": "math", "name": "Maths", "resources": []}
                ]}
            ]},
            {"id": "me", "name": "Mechanical"}
        ]))
        .unwrap();

        let entries = flatten(&departments);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].department_name, "CSE");
        assert_eq!(entries[0].semester_id, "s1");
        assert_eq!(entries[0].subject_name, "Data Structures");
        assert_eq!(entries[0].url().as_deref(), Some("https://x.com/t"));
    }
}
