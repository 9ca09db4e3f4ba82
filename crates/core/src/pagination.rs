//! Page-number arithmetic for listing responses.

use serde::{Deserialize, Serialize};

/// Default number of page links shown at once.
pub const DEFAULT_MAX_VISIBLE: u32 = 5;

/// Pagination metadata plus derived flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub is_first_page: bool,
    pub is_last_page: bool,
}

/// 1-indexed, inclusive item positions shown on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsRange {
    pub start: u32,
    pub end: u32,
}

/// Page numbers to display around `current`.
///
/// The window holds `min(max_visible, total)` pages. It is centered on
/// `current` and, when it would cross 1 or `total`, shifted to use its full
/// width from the other side.
pub fn page_window(current: u32, total: u32, max_visible: u32) -> Vec<u32> {
    let width = max_visible.min(total);
    if width == 0 {
        return Vec::new();
    }

    let half = width / 2;
    let start = current
        .saturating_sub(half)
        .max(1)
        .min(total - width + 1);

    // start <= total - width + 1, so the last page cannot overflow.
    (start..=start + width - 1).collect()
}

/// Item positions saturate at `u32::MAX`; past the last item `start > end`.
pub fn items_range(current: u32, per_page: u32, total_items: u32) -> ItemsRange {
    let current = current.max(1);
    ItemsRange {
        start: (current - 1).saturating_mul(per_page).saturating_add(1),
        end: current.saturating_mul(per_page).min(total_items),
    }
}

/// Derive the pagination flags. `current` is not clamped to `total`.
pub fn pagination_info(current: u32, total: u32, total_results: u32) -> PaginationState {
    PaginationState {
        page: current,
        total_pages: total,
        total_results,
        has_next_page: current < total,
        has_prev_page: current > 1,
        is_first_page: current == 1,
        is_last_page: current == total,
    }
}

/// Shareable URL for a listing page.
///
/// Parameters are percent-encoded in the given order. `page` is appended only
/// when greater than 1; empty parameter values are skipped.
pub fn page_url(path: &str, params: &[(&str, &str)], page: u32) -> String {
    let mut pairs: Vec<String> = params
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect();

    if page > 1 {
        pairs.push(format!("page={}", page));
    }

    if pairs.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, pairs.join("&"))
    }
}
