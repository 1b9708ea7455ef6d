/// Pager: slices an ordered sequence into pages of bounded size.
///
/// The pager never clamps. Asking for a page outside `[0, page_count)` is a
/// caller error and is reported as `PageError::OutOfRange`; the view
/// controller clamps before it calls in.

use thiserror::Error;

/// Pager contract violations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("page {page} out of range [0, {page_count})")]
    OutOfRange { page: usize, page_count: usize },

    #[error("page size must be at least 1")]
    ZeroPageSize,
}

/// One page of an ordered sequence
#[derive(Debug, Clone, PartialEq)]
pub struct PageSlice<T> {
    pub rows: Vec<T>,
    pub page_index: usize,
    pub total_count: usize,
    pub page_count: usize,
}

/// `ceil(total / page_size)`; zero items means zero pages.
pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 || total == 0 {
        0
    } else {
        total.div_ceil(page_size)
    }
}

/// Last valid page for `page`, or 0 when there are no pages.
pub fn clamp_page(page: usize, page_count: usize) -> usize {
    if page_count == 0 {
        0
    } else {
        page.min(page_count - 1)
    }
}

/// Returns page `page_index` of `items`.
///
/// ```
/// use datagrid::pager::{paginate, PageError};
///
/// let items: Vec<u32> = (0..25).collect();
/// let page = paginate(&items, 2, 10).unwrap();
/// assert_eq!(page.page_count, 3);
/// assert_eq!(page.rows, vec![20, 21, 22, 23, 24]);
///
/// assert_eq!(
///     paginate(&items, 3, 10).unwrap_err(),
///     PageError::OutOfRange { page: 3, page_count: 3 }
/// );
/// ```
pub fn paginate<T: Clone>(
    items: &[T],
    page_index: usize,
    page_size: usize,
) -> Result<PageSlice<T>, PageError> {
    if page_size == 0 {
        return Err(PageError::ZeroPageSize);
    }

    let total_count = items.len();
    let page_count = page_count(total_count, page_size);
    if page_index >= page_count {
        return Err(PageError::OutOfRange { page: page_index, page_count });
    }

    let start = page_index * page_size;
    let end = (start + page_size).min(total_count);

    Ok(PageSlice {
        rows: items[start..end].to_vec(),
        page_index,
        total_count,
        page_count,
    })
}
