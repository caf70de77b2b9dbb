//! Department index built from the site map.
//!
//! The site map lists each department as a plain list whose first item names
//! the department. Some departments nest one level deeper (Furniture →
//! Bedroom Furniture → Mattresses); those are expanded from the `Department`
//! refinement list on the intermediate category page.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use url::Url;

use crate::client::HttpPageFetcher;
use crate::error::{FetchError, ResolutionError};
use crate::identity::IdentitySupplier;

/// Site-map lists past this index are footer and service links.
const MAX_DEPARTMENT_LISTS: usize = 29;

/// Categories whose page is itself a department listing.
pub const NESTED_CATEGORIES: &[(&str, &str)] = &[("Furniture", "Bedroom Furniture")];

static DEPARTMENT_LIST: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("ul.list.list--type-plain.u__text-align--left")
        .expect("valid department list selector")
});
static DEPARTMENT_ITEM: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("li.list__item.list__item--padding-none").expect("valid department item selector")
});
static REFINEMENT_LIST: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"ul[data-refinement="Department"]"#).expect("valid refinement selector")
});
static LIST_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li").expect("valid li selector"));
static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("valid anchor selector"));

/// A category page link, or a group of named sub-categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CategoryNode {
    Link(String),
    Group(BTreeMap<String, CategoryNode>),
}

/// Department → sub-department → category URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryIndex {
    departments: BTreeMap<String, CategoryNode>,
}

impl CategoryIndex {
    #[must_use]
    pub fn new(departments: BTreeMap<String, CategoryNode>) -> Self {
        Self { departments }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.departments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }

    pub fn departments(&self) -> impl Iterator<Item = &str> {
        self.departments.keys().map(String::as_str)
    }

    /// The category URL for `sub_department` within `department`.
    ///
    /// A department not found at the top level is looked up among the nested
    /// groups, so `("Bedroom Furniture", "Mattresses")` resolves through
    /// `Furniture`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::UnknownDepartment`] or
    /// [`ResolutionError::UnknownSubDepartment`] when either name is absent.
    pub fn lookup(&self, department: &str, sub_department: &str) -> Result<&str, ResolutionError> {
        let group = self
            .department_group(department)
            .ok_or_else(|| ResolutionError::UnknownDepartment {
                department: department.to_string(),
            })?;

        match group.get(sub_department) {
            Some(CategoryNode::Link(url)) => Ok(url),
            _ => Err(ResolutionError::UnknownSubDepartment {
                department: department.to_string(),
                sub_department: sub_department.to_string(),
            }),
        }
    }

    fn department_group(&self, department: &str) -> Option<&BTreeMap<String, CategoryNode>> {
        if let Some(CategoryNode::Group(group)) = self.departments.get(department) {
            return Some(group);
        }
        self.departments.values().find_map(|node| match node {
            CategoryNode::Group(group) => match group.get(department) {
                Some(CategoryNode::Group(nested)) => Some(nested),
                _ => None,
            },
            CategoryNode::Link(_) => None,
        })
    }

    fn link(&self, department: &str, category: &str) -> Option<&str> {
        match self.departments.get(department) {
            Some(CategoryNode::Group(group)) => match group.get(category) {
                Some(CategoryNode::Link(url)) => Some(url),
                _ => None,
            },
            _ => None,
        }
    }

    fn replace(&mut self, department: &str, category: &str, node: CategoryNode) {
        if let Some(CategoryNode::Group(group)) = self.departments.get_mut(department) {
            group.insert(category.to_string(), node);
        }
    }
}

/// Parses the site map into a department index.
///
/// Each of the first department lists becomes one department keyed by its
/// first item's name. Items without a link are left out.
#[must_use]
pub fn parse_site_map(html: &str, base: &Url) -> CategoryIndex {
    let document = Html::parse_document(html);
    let mut departments = BTreeMap::new();

    for list in document.select(&DEPARTMENT_LIST).take(MAX_DEPARTMENT_LISTS) {
        let mut department: Option<String> = None;
        let mut entries = BTreeMap::new();

        for item in list.select(&DEPARTMENT_ITEM) {
            let name = text(item);
            if name.is_empty() {
                continue;
            }
            if department.is_none() {
                department = Some(name.clone());
            }
            if let Some(url) = first_link(item, base) {
                entries.insert(name, CategoryNode::Link(url));
            }
        }

        if let Some(department) = department {
            departments.insert(department, CategoryNode::Group(entries));
        }
    }

    CategoryIndex::new(departments)
}

/// Parses the `Department` refinement list of a category page into
/// `(name, url)` pairs. The first entry (the page's own category) is dropped
/// and trailing `(count)` suffixes are stripped.
#[must_use]
pub fn parse_department_refinements(html: &str, base: &Url) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let Some(list) = document.select(&REFINEMENT_LIST).next() else {
        return Vec::new();
    };

    list.select(&LIST_ITEM)
        .skip(1)
        .filter_map(|item| {
            let anchor = item.select(&ANCHOR).next()?;
            let name = strip_count(&text(anchor));
            let url = first_link(item, base)?;
            (!name.is_empty()).then_some((name, url))
        })
        .collect()
}

/// Fetches the site map and expands [`NESTED_CATEGORIES`].
///
/// A nested category whose page cannot be fetched or has no refinement list
/// stays a plain link.
///
/// # Errors
///
/// Returns [`FetchError`] if the site map itself cannot be fetched.
pub async fn build_category_index<I: IdentitySupplier>(
    fetcher: &HttpPageFetcher<I>,
    site_map_url: &str,
    base: &Url,
) -> Result<CategoryIndex, FetchError> {
    let page = fetcher.fetch_unscoped(site_map_url).await?;
    let mut index = parse_site_map(&page.html, base);
    tracing::info!(departments = index.len(), url = site_map_url, "parsed site map");

    for &(department, category) in NESTED_CATEGORIES {
        let Some(url) = index.link(department, category).map(str::to_string) else {
            tracing::warn!(department, category, "nested category missing from site map");
            continue;
        };

        let refinements = match fetcher.fetch_unscoped(&url).await {
            Ok(page) => parse_department_refinements(&page.html, base),
            Err(e) => {
                tracing::warn!(department, category, url, error = %e, "nested category page unavailable");
                continue;
            }
        };
        if refinements.is_empty() {
            tracing::warn!(department, category, url, "no department refinements on nested category page");
            continue;
        }

        tracing::debug!(department, category, count = refinements.len(), "expanded nested category");
        let group = refinements
            .into_iter()
            .map(|(name, url)| (name, CategoryNode::Link(url)))
            .collect();
        index.replace(department, category, CategoryNode::Group(group));
    }

    Ok(index)
}

fn text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn first_link(element: ElementRef<'_>, base: &Url) -> Option<String> {
    let href = element.select(&ANCHOR).next()?.value().attr("href")?.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(String::from)
}

/// `"Mattresses (412)"` → `"Mattresses"`.
pub(crate) fn strip_count(name: &str) -> String {
    name.split('(').next().unwrap_or_default().trim().to_string()
}
