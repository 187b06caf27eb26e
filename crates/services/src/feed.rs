//! # Feed View
//!
//! Pure, synchronous derivation of the display list from the aggregated
//! posts: category filter plus sort-order selection. No side effects and no
//! hidden state; the same inputs always yield the same output.

use domains::models::{AggregatedPost, Category, CategoryFilter, SortOrder};

/// Derives the final display sequence.
///
/// `Newest` is a no-op: the aggregator preserves the store's createdAt
/// descending order. `MostViewed` sorts descending by views with a stable
/// sort, so ties keep their upstream (newest-first) order.
pub fn arrange(
    posts: &[AggregatedPost],
    filter: CategoryFilter,
    sort: SortOrder,
) -> Vec<AggregatedPost> {
    let mut shown: Vec<AggregatedPost> = posts
        .iter()
        .filter(|p| matches(filter, p.post.category))
        .cloned()
        .collect();

    match sort {
        SortOrder::MostViewed => shown.sort_by(|a, b| b.views().cmp(&a.views())),
        SortOrder::Newest => {}
    }
    shown
}

fn matches(filter: CategoryFilter, category: Category) -> bool {
    match filter {
        CategoryFilter::All => true,
        CategoryFilter::Only(wanted) => category == wanted,
    }
}

/// Immutable per-screen view state for the home feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedState {
    pub filter: CategoryFilter,
    pub sort: SortOrder,
    pub sort_picker_open: bool,
}

impl Default for FeedState {
    fn default() -> Self {
        FeedState {
            filter: CategoryFilter::All,
            sort: SortOrder::Newest,
            sort_picker_open: false,
        }
    }
}

/// Enumerated state transitions for the home feed screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedAction {
    SelectCategory(CategoryFilter),
    SelectSort(SortOrder),
    ToggleSortPicker,
}

/// Pure transition function. Picking a sort order also closes the picker.
pub fn reduce(state: FeedState, action: FeedAction) -> FeedState {
    match action {
        FeedAction::SelectCategory(filter) => FeedState { filter, ..state },
        FeedAction::SelectSort(sort) => FeedState {
            sort,
            sort_picker_open: false,
            ..state
        },
        FeedAction::ToggleSortPicker => FeedState {
            sort_picker_open: !state.sort_picker_open,
            ..state
        },
    }
}
