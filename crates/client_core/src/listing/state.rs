use shared::{
    domain::{SortOrder, UserRole},
    protocol::{ListTemplatesQuery, TemplatePage, PAGE_SIZE},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    /// One-based page number.
    pub page: u32,
    pub sort_order: SortOrder,
    /// Kept locally and refetches on change; the server does not filter on it yet.
    pub search_text: String,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            page: 1,
            sort_order: SortOrder::default(),
            search_text: String::new(),
        }
    }
}

impl QueryState {
    pub fn page_size(&self) -> u32 {
        PAGE_SIZE
    }

    pub fn to_request(&self) -> ListTemplatesQuery {
        let (sort, direction) = self.sort_order.sort_key();
        ListTemplatesQuery {
            page: self.page.saturating_sub(1),
            size: PAGE_SIZE,
            sort: sort.to_string(),
            direction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Error(String),
    Success(TemplatePage),
}

impl FetchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Error(_) | Self::Success(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn page(&self) -> Option<&TemplatePage> {
        match self {
            Self::Success(page) => Some(page),
            _ => None,
        }
    }
}

/// A fetch the driver must perform. Its result only counts while `generation`
/// is still the latest one issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub query: ListTemplatesQuery,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListingState {
    query: QueryState,
    fetch: FetchState,
    generation: u64,
    role: Option<UserRole>,
}

impl ListingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(query: QueryState) -> Self {
        Self {
            query: QueryState {
                page: query.page.max(1),
                ..query
            },
            ..Self::default()
        }
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn fetch(&self) -> &FetchState {
        &self.fetch
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn role(&self) -> Option<&UserRole> {
        self.role.as_ref()
    }

    pub fn set_role(&mut self, role: Option<UserRole>) {
        self.role = role;
    }

    /// Submitting a search always lands on the first page.
    pub fn set_search(&mut self, text: impl Into<String>) -> Option<FetchTicket> {
        let text = text.into();
        if text == self.query.search_text && self.query.page == 1 {
            return None;
        }
        self.query.search_text = text;
        self.query.page = 1;
        Some(self.begin_fetch())
    }

    pub fn set_sort(&mut self, sort_order: SortOrder) -> Option<FetchTicket> {
        if sort_order == self.query.sort_order {
            return None;
        }
        self.query.sort_order = sort_order;
        self.query.page = 1;
        Some(self.begin_fetch())
    }

    pub fn set_page(&mut self, page: u32) -> Option<FetchTicket> {
        let page = page.max(1);
        if page == self.query.page {
            return None;
        }
        self.query.page = page;
        Some(self.begin_fetch())
    }

    /// Refetches the current query unconditionally (mount, reload).
    pub fn refresh(&mut self) -> FetchTicket {
        self.begin_fetch()
    }

    fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.fetch = FetchState::Loading;
        FetchTicket {
            generation: self.generation,
            query: self.query.to_request(),
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Applies a fetch outcome. Returns `false`, leaving the state untouched,
    /// when a newer fetch has been issued since.
    pub fn resolve(&mut self, generation: u64, outcome: Result<TemplatePage, String>) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.fetch = match outcome {
            Ok(page) => FetchState::Success(page),
            Err(message) => FetchState::Error(message),
        };
        true
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
