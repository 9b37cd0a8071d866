//! Client-side pagination over an already-fetched collection.

use std::sync::Arc;

/// Page metadata derived from a total count, a requested page and a page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    /// 1-based page actually shown after clamping.
    pub page_index: usize,
    pub page_size: usize,
    pub start_offset: usize,
    pub end_offset: usize,
    /// Never zero: an empty collection is one page of zero items.
    pub page_count: usize,
    pub total_count: usize,
}

impl PageMeta {
    /// Clamp `page_index` into `1..=page_count` and derive the slice bounds.
    ///
    /// A zero `page_size` is treated as 1.
    pub fn compute(total_count: usize, page_index: i64, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let page_count = total_count.div_ceil(page_size).max(1);

        let page_index = if page_index < 1 {
            1
        } else {
            usize::try_from(page_index).unwrap_or(usize::MAX).min(page_count)
        };

        let start_offset = (page_index - 1) * page_size;
        let end_offset = (start_offset + page_size).min(total_count);

        Self {
            page_index,
            page_size,
            start_offset,
            end_offset,
            page_count,
            total_count,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page_index > 1
    }

    pub fn has_next(&self) -> bool {
        self.page_index < self.page_count
    }
}

/// A borrowed page slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window<'a, T> {
    pub items: &'a [T],
    pub meta: PageMeta,
}

/// Slice `collection` to the requested 1-based page, clamping out-of-range indices.
pub fn window_of<T>(collection: &[T], page_index: i64, page_size: usize) -> Window<'_, T> {
    let meta = PageMeta::compute(collection.len(), page_index, page_size);
    Window {
        items: &collection[meta.start_offset..meta.end_offset],
        meta,
    }
}

/// An owned page over a shared cached snapshot.
#[derive(Debug, Clone)]
pub struct Page<T> {
    collection: Arc<Vec<T>>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(collection: Arc<Vec<T>>, page_index: i64, page_size: usize) -> Self {
        let meta = PageMeta::compute(collection.len(), page_index, page_size);
        Self { collection, meta }
    }

    pub fn items(&self) -> &[T] {
        &self.collection[self.meta.start_offset..self.meta.end_offset]
    }
}
