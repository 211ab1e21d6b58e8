use serde::Deserialize;

/// One page of a `(offset, limit)`-paginated list endpoint response.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    pub total_count: u64,
    pub items: Vec<T>,
}
