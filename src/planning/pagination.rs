use crate::planning::QueryState;
use serde::Serialize;

pub const PAGE_PARAM: &str = "page";

/// One page of a list view.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub page_size: usize,
    /// Set when the requested page was past the end and the last page was
    /// served instead. Clients should replace their query with this one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_query: Option<String>,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Requested page number; missing, unparseable, zero or negative values
/// all mean page 1.
pub fn requested_page(query: &QueryState) -> usize {
    query
        .get(PAGE_PARAM)
        .and_then(|p| p.trim().parse::<usize>().ok())
        .filter(|&p| p > 0)
        .unwrap_or(1)
}

pub fn paginate<T: Clone>(items: &[T], query: &QueryState, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = (total_items + page_size - 1) / page_size;

    let requested = requested_page(query);
    let (page, corrected_query) = if total_pages > 0 && requested > total_pages {
        let mut corrected = query.clone();
        corrected.set(PAGE_PARAM, total_pages.to_string());
        (total_pages, Some(corrected.encode()))
    } else {
        (requested, None)
    };

    let items = items
        .chunks(page_size)
        .nth(page - 1)
        .map(<[T]>::to_vec)
        .unwrap_or_default();

    Page {
        items,
        page,
        total_pages,
        total_items,
        page_size,
        corrected_query,
    }
}
