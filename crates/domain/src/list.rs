use std::collections::BTreeMap;

use frontdesk_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::{EntityKind, Record, SortParamStyle};

/// Field every list is ordered by unless the user picks another column.
pub const DEFAULT_SORT_FIELD: &str = "createdAt";

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending order.
    Ascending,
    /// Descending order.
    Descending,
}

/// Sort column and direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    field: String,
    direction: SortDirection,
}

impl SortSpec {
    /// Creates a validated sort definition.
    pub fn new(field: impl Into<String>, direction: SortDirection) -> AppResult<Self> {
        Ok(Self {
            field: NonEmptyString::new(field)?.into(),
            direction,
        })
    }

    /// Returns the default list ordering: newest first.
    #[must_use]
    pub fn newest_first() -> Self {
        Self {
            field: DEFAULT_SORT_FIELD.to_owned(),
            direction: SortDirection::Descending,
        }
    }

    /// Returns the sorted field name.
    #[must_use]
    pub fn field(&self) -> &str {
        self.field.as_str()
    }

    /// Returns the sort direction.
    #[must_use]
    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

/// Paging, search, sort and filter inputs of one list request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    page: u32,
    page_size: u32,
    search_text: String,
    sort: Option<SortSpec>,
    extra_filters: BTreeMap<String, String>,
}

impl ListQuery {
    /// Creates a query for the first page, newest records first.
    pub fn first_page(page_size: u32) -> AppResult<Self> {
        Ok(Self {
            page: 1,
            page_size: validate_page_size(page_size)?,
            search_text: String::new(),
            sort: Some(SortSpec::newest_first()),
            extra_filters: BTreeMap::new(),
        })
    }

    /// Returns the default query a list screen for `entity` starts with.
    #[must_use]
    pub fn default_for(entity: EntityKind) -> Self {
        Self {
            page: 1,
            page_size: entity.default_page_size().max(1),
            search_text: String::new(),
            sort: Some(SortSpec::newest_first()),
            extra_filters: BTreeMap::new(),
        }
    }

    /// Returns a copy targeting another page.
    pub fn with_page(mut self, page: u32) -> AppResult<Self> {
        self.page = validate_page(page)?;
        Ok(self)
    }

    /// Returns a copy with another page size, back on the first page.
    pub fn with_page_size(mut self, page_size: u32) -> AppResult<Self> {
        self.page_size = validate_page_size(page_size)?;
        self.page = 1;
        Ok(self)
    }

    /// Returns a copy with new search text, back on the first page.
    #[must_use]
    pub fn with_search_text(mut self, search_text: impl Into<String>) -> Self {
        self.search_text = search_text.into();
        self.page = 1;
        self
    }

    /// Returns a copy with a new sort, back on the first page.
    ///
    /// `None` restores the newest-first default instead of leaving the list unsorted.
    #[must_use]
    pub fn with_sort(mut self, sort: Option<SortSpec>) -> Self {
        self.sort = Some(sort.unwrap_or_else(SortSpec::newest_first));
        self.page = 1;
        self
    }

    /// Returns a copy with a filter set or removed, back on the first page.
    #[must_use]
    pub fn with_filter(mut self, name: impl Into<String>, value: Option<String>) -> Self {
        let name = name.into();
        match value.filter(|value| !value.trim().is_empty()) {
            Some(value) => {
                self.extra_filters.insert(name, value);
            }
            None => {
                self.extra_filters.remove(&name);
            }
        }
        self.page = 1;
        self
    }

    /// Returns a copy without search text and filters, newest first, on page one.
    #[must_use]
    pub fn cleared(mut self) -> Self {
        self.search_text.clear();
        self.extra_filters.clear();
        self.sort = Some(SortSpec::newest_first());
        self.page = 1;
        self
    }

    /// Returns the one-based page number.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Returns the page size.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Returns the free-text search.
    #[must_use]
    pub fn search_text(&self) -> &str {
        self.search_text.as_str()
    }

    /// Returns the active sort.
    #[must_use]
    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    /// Returns the entity-specific exact-match filters.
    #[must_use]
    pub fn extra_filters(&self) -> &BTreeMap<String, String> {
        &self.extra_filters
    }

    /// Renders the query string pairs for an entity's list endpoint.
    #[must_use]
    pub fn query_params(&self, style: SortParamStyle) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_owned(), self.page.to_string()),
            ("limit".to_owned(), self.page_size.to_string()),
        ];

        let search_text = self.search_text.trim();
        if !search_text.is_empty() {
            params.push(("search".to_owned(), search_text.to_owned()));
        }

        if let Some(sort) = &self.sort {
            match style {
                SortParamStyle::OrderBy => {
                    params.push(("orderBy".to_owned(), sort.field().to_owned()));
                    params.push((
                        "order".to_owned(),
                        match sort.direction() {
                            SortDirection::Ascending => "ASC",
                            SortDirection::Descending => "DESC",
                        }
                        .to_owned(),
                    ));
                }
                SortParamStyle::SortBy => {
                    params.push(("sortBy".to_owned(), sort.field().to_owned()));
                    params.push((
                        "sortOrder".to_owned(),
                        match sort.direction() {
                            SortDirection::Ascending => "asc",
                            SortDirection::Descending => "desc",
                        }
                        .to_owned(),
                    ));
                }
                SortParamStyle::Ordering => {
                    let ordering = match sort.direction() {
                        SortDirection::Ascending => sort.field().to_owned(),
                        SortDirection::Descending => format!("-{}", sort.field()),
                    };
                    params.push(("ordering".to_owned(), ordering));
                }
            }
        }

        for (name, value) in &self.extra_filters {
            params.push((name.clone(), value.clone()));
        }

        params
    }
}

/// One settled page of records.
#[derive(Debug, Clone, PartialEq)]
pub struct ListResult {
    items: Vec<Record>,
    total_count: u64,
    page: u32,
    page_size: u32,
}

impl ListResult {
    /// Creates a validated page of results.
    pub fn new(items: Vec<Record>, total_count: u64, page: u32, page_size: u32) -> AppResult<Self> {
        let page = validate_page(page)?;
        let page_size = validate_page_size(page_size)?;
        if items.len() > page_size as usize {
            return Err(AppError::Validation(format!(
                "page holds {} records but page size is {page_size}",
                items.len()
            )));
        }

        let total_count = total_count.max(items.len() as u64);
        Ok(Self {
            items,
            total_count,
            page,
            page_size,
        })
    }

    /// Returns the records of this page in display order.
    #[must_use]
    pub fn items(&self) -> &[Record] {
        &self.items
    }

    /// Returns the number of records matching the query across all pages.
    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Returns the one-based page number this result belongs to.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Returns the page size the result was fetched with.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Returns the number of pages, at least one.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.total_count.div_ceil(u64::from(self.page_size)).max(1)
    }
}

fn validate_page(page: u32) -> AppResult<u32> {
    if page == 0 {
        return Err(AppError::Validation(
            "page must be greater than or equal to 1".to_owned(),
        ));
    }

    Ok(page)
}

fn validate_page_size(page_size: u32) -> AppResult<u32> {
    if page_size == 0 {
        return Err(AppError::Validation(
            "page size must be greater than or equal to 1".to_owned(),
        ));
    }

    Ok(page_size)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{ListQuery, ListResult, SortDirection, SortSpec};
    use crate::{EntityKind, SortParamStyle};

    fn param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    #[test]
    fn default_query_is_newest_first_on_page_one() {
        let query = ListQuery::default_for(EntityKind::Doctor);
        assert_eq!(query.page(), 1);
        assert_eq!(query.page_size(), 12);
        assert_eq!(query.sort(), Some(&SortSpec::newest_first()));
    }

    #[test]
    fn zero_page_and_page_size_are_rejected() {
        let query = ListQuery::default_for(EntityKind::Floor);
        assert!(query.clone().with_page(0).is_err());
        assert!(query.with_page_size(0).is_err());
        assert!(ListQuery::first_page(0).is_err());
    }

    #[test]
    fn clearing_sort_restores_default_ordering() {
        let sorted = ListQuery::default_for(EntityKind::Ward).with_sort(
            SortSpec::new("name", SortDirection::Ascending).ok(),
        );
        assert_eq!(sorted.sort().map(SortSpec::field), Some("name"));

        let unsorted = sorted.with_sort(None);
        assert_eq!(unsorted.sort(), Some(&SortSpec::newest_first()));
    }

    #[test]
    fn order_by_style_renders_uppercase_direction() {
        let query = ListQuery::default_for(EntityKind::Doctor).with_search_text("ravi");
        let params = query.query_params(SortParamStyle::OrderBy);
        assert_eq!(param(&params, "orderBy"), Some("createdAt"));
        assert_eq!(param(&params, "order"), Some("DESC"));
        assert_eq!(param(&params, "search"), Some("ravi"));
        assert_eq!(param(&params, "limit"), Some("12"));
    }

    #[test]
    fn sort_by_and_ordering_styles_render_their_conventions() {
        let query = ListQuery::default_for(EntityKind::Bed)
            .with_filter("bedLocationType", Some("WARD".to_owned()));
        let params = query.query_params(SortParamStyle::SortBy);
        assert_eq!(param(&params, "sortBy"), Some("createdAt"));
        assert_eq!(param(&params, "sortOrder"), Some("desc"));
        assert_eq!(param(&params, "bedLocationType"), Some("WARD"));
        assert_eq!(param(&params, "search"), None);

        let ascending = ListQuery::default_for(EntityKind::LabTest)
            .with_sort(SortSpec::new("code", SortDirection::Ascending).ok());
        let params = ascending.query_params(SortParamStyle::Ordering);
        assert_eq!(param(&params, "ordering"), Some("code"));
        let params = ListQuery::default_for(EntityKind::LabTest).query_params(SortParamStyle::Ordering);
        assert_eq!(param(&params, "ordering"), Some("-createdAt"));
    }

    #[test]
    fn blank_filter_value_removes_the_filter() {
        let query = ListQuery::default_for(EntityKind::Bed)
            .with_filter("floor", Some("f1".to_owned()))
            .with_filter("floor", Some("   ".to_owned()));
        assert!(query.extra_filters().is_empty());
    }

    #[test]
    fn result_rejects_more_items_than_page_size() {
        let result = ListResult::new(Vec::new(), 0, 1, 0);
        assert!(result.is_err());
    }

    proptest! {
        #[test]
        fn narrowing_the_query_always_returns_to_page_one(
            page in 1_u32..500,
            search in "[a-z ]{0,12}",
        ) {
            let query = ListQuery::default_for(EntityKind::Patient)
                .with_page(page)
                .unwrap_or_else(|_| unreachable!());
            prop_assert_eq!(query.page(), page);
            prop_assert_eq!(query.clone().with_search_text(search).page(), 1);
            prop_assert_eq!(query.clone().with_sort(None).page(), 1);
            prop_assert_eq!(query.with_filter("floor", Some("f1".to_owned())).page(), 1);
        }

        #[test]
        fn total_pages_covers_every_record(total in 0_u64..10_000, page_size in 1_u32..200) {
            let result = ListResult::new(Vec::new(), total, 1, page_size)
                .unwrap_or_else(|_| unreachable!());
            let pages = result.total_pages();
            prop_assert!(pages >= 1);
            prop_assert!(pages * u64::from(page_size) >= total);
        }
    }
}
