//! Page-shaped projections of a catalog snapshot.
//!
//! Navigation to an id that does not exist yields [`Lookup::NotFound`], which is a normal
//! page state rather than an error.

use serde::Serialize;

use super::classify::{derive_resource_type, ResourceType};
use super::search::{filter_entries, flatten, CatalogEntry, CatalogFilter};
use super::semester::{sort_semesters, SemesterLike};
use crate::models::{Department, Resource, Semester, Subject};

/// Result of navigating to a catalog node.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Lookup<T> {
    Found(T),
    NotFound { message: String },
}

impl<T> Lookup<T> {
    fn not_found(what: &str) -> Self {
        Lookup::NotFound {
            message: format!("The requested {} could not be found.", what),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSummary {
    pub id: String,
    pub name: String,
    pub semester_count: usize,
}

impl From<&Department> for DepartmentSummary {
    fn from(dept: &Department) -> Self {
        Self {
            id: dept.id.clone(),
            name: dept.name.clone(),
            semester_count: dept.semesters.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterSummary {
    pub id: String,
    pub name: String,
    pub subject_count: usize,
}

impl From<&Semester> for SemesterSummary {
    fn from(sem: &Semester) -> Self {
        Self {
            id: sem.id.clone(),
            name: sem.name.clone(),
            subject_count: sem.subjects.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSummary {
    pub id: String,
    pub name: String,
    pub resource_count: usize,
}

impl From<&Subject> for SubjectSummary {
    fn from(subj: &Subject) -> Self {
        Self {
            id: subj.id.clone(),
            name: subj.name.clone(),
            resource_count: subj.resources.len(),
        }
    }
}

/// A resource as shown to readers: resolved link plus derived category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceView {
    pub id: u64,
    pub title: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub resource_type: ResourceType,
}

impl From<&Resource> for ResourceView {
    fn from(res: &Resource) -> Self {
        let url = res.resolved_url();
        Self {
            id: res.id,
            title: res.title.clone(),
            kind: res.content.kind(),
            resource_type: derive_resource_type(&res.title, url.as_deref()),
            url,
        }
    }
}

/// A resource together with the names of the nodes that own it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceWithContext {
    #[serde(flatten)]
    pub resource: ResourceView,
    pub department_id: String,
    pub department_name: String,
    pub semester_id: String,
    pub semester_name: String,
    pub subject_id: String,
    pub subject_name: String,
}

impl From<&CatalogEntry> for ResourceWithContext {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            resource: ResourceView::from(&entry.resource),
            department_id: entry.department_id.clone(),
            department_name: entry.department_name.clone(),
            semester_id: entry.semester_id.clone(),
            semester_name: entry.semester_name.clone(),
            subject_id: entry.subject_id.clone(),
            subject_name: entry.subject_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterListPage {
    pub department: DepartmentSummary,
    pub semesters: Vec<SemesterSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectListPage {
    pub department: DepartmentSummary,
    pub semester: SemesterSummary,
    pub subjects: Vec<SubjectSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectPage {
    pub department: DepartmentSummary,
    pub semester: SemesterSummary,
    pub subject: SubjectSummary,
    pub resources: Vec<ResourceView>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterOption {
    pub id: String,
    pub name: String,
}

/// Choices offered by the search form.
///
/// Semesters are listed only once a department is chosen, subjects only once a semester is.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub departments: Vec<FilterOption>,
    pub semesters: Vec<FilterOption>,
    pub subjects: Vec<FilterOption>,
    pub resource_types: Vec<ResourceType>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SearchOutcome {
    /// No criterion supplied yet.
    StartSearching,
    NoResults,
    Results {
        total: usize,
        results: Vec<ResourceWithContext>,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub options: FilterOptions,
    pub outcome: SearchOutcome,
}

fn find_department<'a>(departments: &'a [Department], id: &str) -> Option<&'a Department> {
    departments.iter().find(|d| d.id == id)
}

fn find_semester<'a>(dept: &'a Department, id: &str) -> Option<&'a Semester> {
    dept.semesters.iter().find(|s| s.id == id)
}

fn find_subject<'a>(sem: &'a Semester, id: &str) -> Option<&'a Subject> {
    sem.subjects.iter().find(|s| s.id == id)
}

/// Top-level department list, in catalog order.
pub fn department_list(departments: &[Department]) -> Vec<DepartmentSummary> {
    departments.iter().map(DepartmentSummary::from).collect()
}

/// Semesters of a department, numerically ordered.
pub fn semester_list(departments: &[Department], department_id: &str) -> Lookup<SemesterListPage> {
    let Some(dept) = find_department(departments, department_id) else {
        return Lookup::not_found("department");
    };

    Lookup::Found(SemesterListPage {
        department: dept.into(),
        semesters: sort_semesters(&dept.semesters)
            .into_iter()
            .map(SemesterSummary::from)
            .collect(),
    })
}

/// Subjects of a semester.
pub fn subject_list(
    departments: &[Department],
    department_id: &str,
    semester_id: &str,
) -> Lookup<SubjectListPage> {
    let Some(dept) = find_department(departments, department_id) else {
        return Lookup::not_found("department");
    };
    let Some(sem) = find_semester(dept, semester_id) else {
        return Lookup::not_found("semester");
    };

    Lookup::Found(SubjectListPage {
        department: dept.into(),
        semester: sem.into(),
        subjects: sem.subjects.iter().map(SubjectSummary::from).collect(),
    })
}

/// Resources of a subject.
pub fn subject_page(
    departments: &[Department],
    department_id: &str,
    semester_id: &str,
    subject_id: &str,
) -> Lookup<SubjectPage> {
    let found = find_department(departments, department_id).and_then(|dept| {
        let sem = find_semester(dept, semester_id)?;
        let subj = find_subject(sem, subject_id)?;
        Some((dept, sem, subj))
    });
    let Some((dept, sem, subj)) = found else {
        return Lookup::not_found("subject");
    };

    Lookup::Found(SubjectPage {
        department: dept.into(),
        semester: sem.into(),
        subject: subj.into(),
        resources: subj.resources.iter().map(ResourceView::from).collect(),
    })
}

fn filter_options(departments: &[Department], filter: &CatalogFilter) -> FilterOptions {
    let dept = filter
        .department_id()
        .and_then(|id| find_department(departments, id));
    let semesters = dept
        .map(|d| sort_semesters(&d.semesters))
        .unwrap_or_default();
    let subjects = filter
        .semester_id()
        .and_then(|id| semesters.iter().find(|s| s.id() == id))
        .map(|s| s.subjects.as_slice())
        .unwrap_or_default();

    FilterOptions {
        departments: departments
            .iter()
            .map(|d| FilterOption {
                id: d.id.clone(),
                name: d.name.clone(),
            })
            .collect(),
        semesters: semesters
            .iter()
            .map(|s| FilterOption {
                id: s.id().to_string(),
                name: s.name().to_string(),
            })
            .collect(),
        subjects: subjects
            .iter()
            .map(|s| FilterOption {
                id: s.id.clone(),
                name: s.name.clone(),
            })
            .collect(),
        resource_types: ResourceType::ALL.to_vec(),
    }
}

/// Search form state and results for a filter.
pub fn search_page(departments: &[Department], filter: &CatalogFilter) -> SearchPage {
    let options = filter_options(departments, filter);
    if filter.is_blank() {
        return SearchPage {
            options,
            outcome: SearchOutcome::StartSearching,
        };
    }

    let entries = flatten(departments);
    let results: Vec<ResourceWithContext> = filter_entries(&entries, filter)
        .into_iter()
        .map(ResourceWithContext::from)
        .collect();

    let outcome = if results.is_empty() {
        SearchOutcome::NoResults
    } else {
        SearchOutcome::Results {
            total: results.len(),
            results,
        }
    };

    SearchPage { options, outcome }
}

/// Every resource in the catalog with its context, for the admin resource manager.
pub fn managed_resources(departments: &[Department]) -> Vec<ResourceWithContext> {
    flatten(departments)
        .iter()
        .map(ResourceWithContext::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Department> {
        serde_json::from_value(serde_json::json!([
            {"id": "cse", "name": "Computer Science", "semesters": [
                {"id": "s10", "name": "Semester 10", "subjects": []},
                {"id": "s2", "name": "Semester 2", "subjects": [
                    {"id": "os", "name": "Operating Systems", "resources": [
                        {"id": 1, "title": "OS Lecture Notes", "content": {"kind": "url", "url": "https://x.com/os"}},
                        {"id": 2, "title": "Scheduling", "content": {"kind": "externalBlob", "externalBlob": {"directUrl": "https://cdn.x.com/sched.ppt"}}}
                    ]}
                ]},
                {"id": "s1", "name": "Semester 1", "subjects": []}
            ]},
            {"id": "ece", "name": "Electronics", "semesters": []}
        ]))
        .unwrap()
    }

    #[test]
    fn test_department_list_counts_semesters() {
        let list = department_list(&catalog());
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].semester_count, 3);
        assert_eq!(list[1].semester_count, 0);
    }

    #[test]
    fn test_semester_list_is_sorted() {
        let Lookup::Found(page) = semester_list(&catalog(), "cse") else {
            panic!("department should exist");
        };
        let ids: Vec<&str> = page.semesters.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2", "s10"]);
    }

    #[test]
    fn test_missing_nodes_are_not_found_placeholders() {
        let departments = catalog();
        assert!(matches!(semester_list(&departments, "mech"), Lookup::NotFound { .. }));
        assert!(matches!(
            subject_list(&departments, "cse", "s9"),
            Lookup::NotFound { .. }
        ));
        assert!(matches!(
            subject_page(&departments, "cse", "s2", "dbms"),
            Lookup::NotFound { .. }
        ));

        let json = serde_json::to_value(subject_page(&departments, "x", "y", "z")).unwrap();
        assert_eq!(json["status"], "notFound");
    }

    #[test]
    fn test_subject_page_resolves_links_and_types() {
        let Lookup::Found(page) = subject_page(&catalog(), "cse", "s2", "os") else {
            panic!("subject should exist");
        };
        assert_eq!(page.subject.resource_count, 2);
        assert_eq!(page.resources[0].resource_type, ResourceType::Notes);
        assert_eq!(page.resources[1].kind, "externalBlob");
        assert_eq!(page.resources[1].resource_type, ResourceType::Slides);

        let json = serde_json::to_value(Lookup::Found(page)).unwrap();
        assert_eq!(json["status"], "found");
        assert_eq!(json["department"]["name"], "Computer Science");
    }

    #[test]
    fn test_search_without_criteria_asks_to_start() {
        let page = search_page(&catalog(), &CatalogFilter::default());
        assert!(matches!(page.outcome, SearchOutcome::StartSearching));
        assert!(page.options.semesters.is_empty());
        assert_eq!(page.options.resource_types.len(), 6);
    }

    #[test]
    fn test_search_options_cascade() {
        let filter = CatalogFilter {
            department_id: Some("cse".into()),
            semester_id: Some("s2".into()),
            ..CatalogFilter::default()
        };
        let page = search_page(&catalog(), &filter);
        let sems: Vec<&str> = page.options.semesters.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(sems, vec!["s1", "s2", "s10"]);
        assert_eq!(page.options.subjects.len(), 1);

        let SearchOutcome::Results { total, results } = page.outcome else {
            panic!("expected results");
        };
        assert_eq!(total, 2);
        assert_eq!(results[0].subject_name, "Operating Systems");
    }

    #[test]
    fn test_search_with_no_match() {
        let filter = CatalogFilter {
            keyword: Some("quantum".into()),
            ..CatalogFilter::default()
        };
        let page = search_page(&catalog(), &filter);
        assert!(matches!(page.outcome, SearchOutcome::NoResults));
    }

    #[test]
    fn test_managed_resources_flatten_with_context() {
        let all = managed_resources(&catalog());
        assert_eq!(all.len(), 2);
        let json = serde_json::to_value(&all[1]).unwrap();
        assert_eq!(json["title"], "Scheduling");
        assert_eq!(json["resourceType"], "Slides");
        assert_eq!(json["semesterName"], "Semester 2");
    }
}
