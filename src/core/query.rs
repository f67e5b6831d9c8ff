//! Query parameters and pagination utilities

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pages shown on each side of the current one in [`Page::links`]
const ON_EACH_SIDE: u64 = 3;

/// Query-string parameters of a search request
///
/// # Example
/// ```rust,ignore
/// // In handler:
/// pub async fn search(Query(params): Query<SearchParams>) -> ... {
///     let page = params.page();                 // defaults to 1
///     let per_page = params.per_page(10, 100);  // default, maximum
/// }
///
/// // Usage:
/// POST /users/search?page=2&perPage=25
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    /// Page number (starts at 1)
    #[serde(default)]
    pub page: Option<u64>,

    /// Number of items per page
    #[serde(default, rename = "perPage")]
    pub per_page: Option<u64>,
}

impl SearchParams {
    /// Get page number, ensuring minimum of 1
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Get items per page, falling back to `default` and capped at `max`
    pub fn per_page(&self, default: u64, max: u64) -> u64 {
        self.per_page.unwrap_or(default).clamp(1, max.max(1))
    }
}

/// Which page to produce and where it lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-indexed page number
    pub page: u64,
    pub per_page: u64,
    /// URL (without query string) used to build navigation links
    pub path: String,
}

impl PageRequest {
    pub fn new(page: u64, per_page: u64, path: impl Into<String>) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
            path: path.into(),
        }
    }

    /// Number of rows to skip
    pub fn offset(&self) -> u64 {
        (self.page.max(1) - 1).saturating_mul(self.per_page.max(1))
    }
}

/// One entry of [`Page::links`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub url: Option<String>,
    pub label: String,
    pub active: bool,
}

/// A length-aware page of rows
///
/// Built once by the executor and read-only afterwards; it serializes
/// directly to the response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    data: Vec<Value>,
    current_page: u64,
    first_page_url: String,
    from: Option<u64>,
    last_page: u64,
    last_page_url: String,
    links: Vec<PageLink>,
    next_page_url: Option<String>,
    path: String,
    per_page: u64,
    prev_page_url: Option<String>,
    to: Option<u64>,
    total: u64,
}

impl Page {
    /// Assemble a page from the rows of `request` and the total match count
    pub fn new(data: Vec<Value>, total: u64, request: &PageRequest) -> Self {
        let per_page = request.per_page.max(1);
        let current_page = request.page.max(1);
        let last_page = total.div_ceil(per_page).max(1);
        let offset = request.offset();
        let path = request.path.clone();

        let (from, to) = if data.is_empty() {
            (None, None)
        } else {
            (Some(offset + 1), Some(offset + data.len() as u64))
        };

        let prev_page_url = (current_page > 1).then(|| page_url(&path, current_page - 1));
        let next_page_url =
            (current_page < last_page).then(|| page_url(&path, current_page + 1));

        let mut links = Vec::new();
        links.push(PageLink {
            url: prev_page_url.clone(),
            label: "&laquo; Previous".to_string(),
            active: false,
        });
        for slot in link_window(current_page, last_page) {
            links.push(match slot {
                Some(n) => PageLink {
                    url: Some(page_url(&path, n)),
                    label: n.to_string(),
                    active: n == current_page,
                },
                None => PageLink {
                    url: None,
                    label: "...".to_string(),
                    active: false,
                },
            });
        }
        links.push(PageLink {
            url: next_page_url.clone(),
            label: "Next &raquo;".to_string(),
            active: false,
        });

        Self {
            data,
            current_page,
            first_page_url: page_url(&path, 1),
            from,
            last_page,
            last_page_url: page_url(&path, last_page),
            links,
            next_page_url,
            path,
            per_page,
            prev_page_url,
            to,
            total,
        }
    }

    pub fn data(&self) -> &[Value] {
        &self.data
    }

    pub fn into_data(self) -> Vec<Value> {
        self.data
    }

    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn last_page(&self) -> u64 {
        self.last_page
    }

    pub fn from(&self) -> Option<u64> {
        self.from
    }

    pub fn to(&self) -> Option<u64> {
        self.to
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn first_page_url(&self) -> &str {
        &self.first_page_url
    }

    pub fn last_page_url(&self) -> &str {
        &self.last_page_url
    }

    pub fn next_page_url(&self) -> Option<&str> {
        self.next_page_url.as_deref()
    }

    pub fn prev_page_url(&self) -> Option<&str> {
        self.prev_page_url.as_deref()
    }

    pub fn links(&self) -> &[PageLink] {
        &self.links
    }
}

fn page_url(path: &str, page: u64) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{}{}page={}", path, separator, page)
}

/// Page numbers to link, with `None` marking an elided gap
fn link_window(current: u64, last: u64) -> Vec<Option<u64>> {
    let range = |from: u64, to: u64| (from..=to).map(Some).collect::<Vec<_>>();

    if last < ON_EACH_SIDE * 2 + 8 {
        return range(1, last);
    }

    let window = ON_EACH_SIDE + 4;
    let start = range(1, 2);
    let finish = range(last - 1, last);

    let (first, slider, tail) = if current <= window {
        (range(1, window + ON_EACH_SIDE), Vec::new(), finish)
    } else if current > last - window {
        (start, Vec::new(), range(last - (window + ON_EACH_SIDE - 1), last))
    } else {
        (
            start,
            range(current - ON_EACH_SIDE, current + ON_EACH_SIDE),
            finish,
        )
    };

    let mut slots = first;
    slots.push(None);
    if !slider.is_empty() {
        slots.extend(slider);
        slots.push(None);
    }
    slots.extend(tail);
    slots
}
