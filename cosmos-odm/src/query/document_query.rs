use crate::query::{CosmosPageRequest, Criteria, Sort};

/// A filter tree plus ordering, limit and paging.
///
/// When the query itself is unsorted, the sort of its page request is used.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentQuery {
    criteria: Criteria,
    sort: Sort,
    limit: Option<usize>,
    page_request: Option<CosmosPageRequest>,
}

impl DocumentQuery {
    pub fn new(criteria: Criteria) -> Self {
        DocumentQuery {
            criteria,
            sort: Sort::unsorted(),
            limit: None,
            page_request: None,
        }
    }

    /// Query matching every document.
    pub fn all() -> Self {
        DocumentQuery::new(Criteria::all())
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_page_request(mut self, page_request: CosmosPageRequest) -> Self {
        self.page_request = Some(page_request);
        self
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    /// Effective sort of the query.
    pub fn sort(&self) -> &Sort {
        match &self.page_request {
            Some(page) if !self.sort.is_sorted() => page.sort(),
            _ => &self.sort,
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn page_request(&self) -> Option<&CosmosPageRequest> {
        self.page_request.as_ref()
    }
}

impl From<Criteria> for DocumentQuery {
    fn from(criteria: Criteria) -> Self {
        DocumentQuery::new(criteria)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_sort_is_fallback() {
        let page = CosmosPageRequest::first(5).unwrap().with_sort(Sort::by("a"));
        let query = DocumentQuery::all().with_page_request(page.clone());
        assert_eq!(query.sort(), &Sort::by("a"));

        let query = DocumentQuery::all()
            .with_sort(Sort::by_desc("b"))
            .with_page_request(page);
        assert_eq!(query.sort(), &Sort::by_desc("b"));
    }

    #[test]
    fn test_from_criteria() {
        let query: DocumentQuery = Criteria::field("a").is(1).into();
        assert_eq!(query.criteria().subject(), Some("a"));
        assert_eq!(query.limit(), None);
        assert!(query.page_request().is_none());
    }
}
