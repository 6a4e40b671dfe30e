//! The `Page<T>` envelope every list endpoint returns (spec.md §6.1's
//! "paginated" note — internals are unspecified, so this is the minimal
//! shape that satisfies it without inventing filter semantics).

use serde::{Deserialize, Serialize};

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 500;

#[derive(Deserialize, Default)]
pub struct PageParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

pub fn paginate<T>(mut items: Vec<T>, params: &PageParams) -> Page<T> {
    let total = items.len();
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let offset = params.offset.unwrap_or(0);

    if offset >= items.len() {
        items.clear();
    } else {
        items.drain(..offset);
    }
    items.truncate(limit);

    Page { items, total, limit, offset }
}
