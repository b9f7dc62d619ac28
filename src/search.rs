//! Search and ordering over component lists.

use std::cmp::Ordering;

use crate::domain::Component;

/// Whether a component matches a free-text query.
///
/// The query is split on whitespace. Every token must be found, case
/// insensitively, in at least one searchable field. An empty query
/// matches everything.
pub fn matches(component: &Component, query: &str) -> bool {
    let tokens: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    if tokens.is_empty() {
        return true;
    }

    let fields = searchable_fields(component);
    tokens
        .iter()
        .all(|token| fields.iter().any(|field| field.contains(token.as_str())))
}

/// Filter a list down to the components matching `query`
pub fn search<'a>(components: impl IntoIterator<Item = &'a Component>, query: &str) -> Vec<Component> {
    components
        .into_iter()
        .filter(|c| matches(c, query))
        .cloned()
        .collect()
}

fn searchable_fields(component: &Component) -> Vec<String> {
    let details = &component.details;
    let mut fields = vec![component.id.to_lowercase(), component.title.to_lowercase()];

    let optional = [
        details.description.as_ref(),
        details.category.as_ref(),
        details.subcategory.as_ref(),
        component.course_id.as_ref(),
    ];
    fields.extend(optional.into_iter().flatten().map(|s| s.to_lowercase()));
    fields.extend(component.tags().iter().map(|t| t.to_lowercase()));

    if let Some(context) = &details.educational_context {
        let lists = [
            &context.learning_objectives,
            &context.educational_level,
            &context.subject_areas,
        ];
        fields.extend(
            lists
                .into_iter()
                .flat_map(|list| list.iter())
                .map(|s| s.to_lowercase()),
        );
    }

    fields
}

/// Display ordering for component lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    TitleAsc,
    TitleDesc,
    DateAsc,
    DateDesc,
    VersionAsc,
    VersionDesc,
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SortOrder::TitleAsc => "title-asc",
            SortOrder::TitleDesc => "title-desc",
            SortOrder::DateAsc => "date-asc",
            SortOrder::DateDesc => "date-desc",
            SortOrder::VersionAsc => "version-asc",
            SortOrder::VersionDesc => "version-desc",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for SortOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "title-asc" | "title" => Ok(SortOrder::TitleAsc),
            "title-desc" => Ok(SortOrder::TitleDesc),
            "date-asc" => Ok(SortOrder::DateAsc),
            "date-desc" | "date" => Ok(SortOrder::DateDesc),
            "version-asc" => Ok(SortOrder::VersionAsc),
            "version-desc" | "version" => Ok(SortOrder::VersionDesc),
            _ => anyhow::bail!("Unknown sort order: {}", s),
        }
    }
}

/// Sort components in place
pub fn sort_components(components: &mut [Component], order: SortOrder) {
    match order {
        SortOrder::TitleAsc => components.sort_by(|a, b| compare_titles(a, b)),
        SortOrder::TitleDesc => components.sort_by(|a, b| compare_titles(b, a)),
        SortOrder::DateAsc => components.sort_by(|a, b| date_key(a).cmp(&date_key(b))),
        SortOrder::DateDesc => components.sort_by(|a, b| date_key(b).cmp(&date_key(a))),
        SortOrder::VersionAsc => components.sort_by(|a, b| compare_versions(version_of(a), version_of(b))),
        SortOrder::VersionDesc => components.sort_by(|a, b| compare_versions(version_of(b), version_of(a))),
    }
}

fn compare_titles(a: &Component, b: &Component) -> Ordering {
    a.title.to_lowercase().cmp(&b.title.to_lowercase())
}

// Release dates are YYYY-MM-DD, so they order lexically like the RFC 3339 mtime
fn date_key(component: &Component) -> String {
    component
        .last_modified
        .map(|t| t.to_rfc3339())
        .or_else(|| component.details.release_date.clone())
        .unwrap_or_default()
}

fn version_of(component: &Component) -> &str {
    component.details.version.as_deref().unwrap_or("0.0.0")
}

/// Compare dotted version strings numerically.
///
/// Missing or non-numeric parts count as zero, so `"1.2"` equals `"1.2.0"`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |v: &str| -> Vec<u64> { v.split('.').map(|p| p.trim().parse().unwrap_or(0)).collect() };
    let (a, b) = (parse(a), parse(b));

    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}
