use serde::Serialize;

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Offset pagination. The cursor handed to clients is the next offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(cursor: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            offset: cursor.unwrap_or(0).max(0),
            limit: limit
                .unwrap_or(DEFAULT_PAGE_LIMIT)
                .clamp(1, MAX_PAGE_LIMIT),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub cursor: i64,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// A page is assumed to have a successor whenever it came back full.
    pub fn new(items: Vec<T>, request: &PageRequest) -> Self {
        let len = items.len() as i64;
        Self {
            cursor: request.offset + len,
            has_more: len == request.limit,
            items,
        }
    }
}
