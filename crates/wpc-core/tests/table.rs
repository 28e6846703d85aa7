//! Tests for table navigation, block caching and prefetch.

mod support;

use std::sync::Arc;

use serde_json::json;
use support::{CountingSource, Part, ids, init_tracing, numbers, parts};
use wpc_core::{PageItem, TableController, TableStatus};
use wpc_model::{ConfigError, Filters, PagerConfig, QueryCriteria, SortState};
use wpc_source::MemorySource;

type NumberTable = TableController<CountingSource<MemorySource<u32>>>;
type PartTable = TableController<CountingSource<MemorySource<Part>>>;

fn number_table(count: u32, config: PagerConfig) -> NumberTable {
    init_tracing();
    let source = CountingSource::new(MemorySource::new(numbers(count)).unwrap());
    TableController::new(source, config).unwrap()
}

fn part_table(count: u32, config: PagerConfig) -> PartTable {
    init_tracing();
    let source = CountingSource::new(MemorySource::new(parts(count)).unwrap());
    TableController::new(source, config).unwrap()
}

fn no_prefetch(page_size: usize, fetch_size: usize) -> PagerConfig {
    PagerConfig::new(page_size, fetch_size).with_prefetch(false)
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn rejects_invalid_geometry() {
    let source = MemorySource::new(numbers(10)).unwrap();
    let result = TableController::new(source, PagerConfig::new(10, 25));
    assert!(matches!(
        result,
        Err(ConfigError::FetchNotMultiple {
            page_size: 10,
            fetch_size: 25
        })
    ));
}

#[test]
fn starts_idle_without_fetching() {
    let table = number_table(12, PagerConfig::new(5, 15));
    let state = table.state();
    assert_eq!(state.status(), TableStatus::Idle);
    assert_eq!(state.page(), 1);
    assert_eq!(table.source().calls(), 0);
}

#[tokio::test]
async fn loads_initial_page_from_config() {
    let table = number_table(40, no_prefetch(5, 15).with_initial_page(4));
    table.load().await;

    let state = table.state();
    assert_eq!(state.page(), 4);
    assert_eq!(state.data, vec![15, 16, 17, 18, 19]);
    assert_eq!(table.source().requests()[0].offset, 15);
}

#[tokio::test]
async fn with_criteria_applies_to_first_load() {
    init_tracing();
    let source = CountingSource::new(MemorySource::new(parts(40)).unwrap());
    let criteria = QueryCriteria::new()
        .with_sort(SortState::descending("id"))
        .with_search("part 03");
    let table = TableController::with_criteria(source, no_prefetch(5, 15), criteria).unwrap();

    table.load().await;

    let state = table.state();
    assert_eq!(ids(&state.data), vec![39, 38, 37, 36, 35]);
    assert_eq!(state.pagination.total_items, 10);
    assert_eq!(state.search, "part 03");
    let request = &table.source().requests()[0];
    assert_eq!(request.sort, Some(SortState::descending("id")));
    assert_eq!(request.search.as_deref(), Some("part 03"));
}

// ============================================================================
// End-to-end scenario
// ============================================================================

#[tokio::test]
async fn end_to_end_twelve_rows_in_three_page_blocks() {
    let table = number_table(12, PagerConfig::new(5, 15));

    table.set_page(1).await;
    table.settle().await;

    let state = table.state();
    assert_eq!(table.source().calls(), 1);
    let request = &table.source().requests()[0];
    assert_eq!(request.page, 1);
    assert_eq!(request.page_size, 15);
    assert_eq!(state.data, vec![0, 1, 2, 3, 4]);
    assert_eq!(state.pagination.total_items, 12);
    assert_eq!(state.pagination.total_pages(), 3);
    assert_eq!(state.status(), TableStatus::Ready);
    assert_eq!(table.cached_pages(), vec![1, 2, 3]);

    table.set_page(3).await;
    table.settle().await;

    let state = table.state();
    assert_eq!(state.data, vec![10, 11]);
    assert!(!state.pagination.has_next_page());
    assert!(state.pagination.has_prev_page());
    assert_eq!(state.pagination.summary(), "11-12 of 12");
    assert_eq!(table.source().calls(), 1);

    table.set_page(2).await;
    assert_eq!(table.state().data.len(), 5);
    assert_eq!(table.source().calls(), 1);
}

// ============================================================================
// Page range
// ============================================================================

#[tokio::test]
async fn out_of_range_pages_are_ignored() {
    let table = number_table(12, PagerConfig::new(5, 15));
    table.load().await;

    let mut updates = table.subscribe();
    updates.borrow_and_update();

    table.set_page(0).await;
    table.set_page(4).await;
    table.set_page(1).await;
    table.prev_page().await;

    assert!(!updates.has_changed().unwrap());
    assert_eq!(table.state().page(), 1);
    assert_eq!(table.source().calls(), 1);

    table.last_page().await;
    table.next_page().await;
    assert_eq!(table.state().page(), 3);
}

#[tokio::test]
async fn total_pages_is_ceiling_of_total_items() {
    for count in [0u32, 1, 4, 5, 6, 12, 15, 16] {
        let table = number_table(count, no_prefetch(5, 15));
        table.load().await;

        let state = table.state();
        let expected = (count as usize).div_ceil(5);
        assert_eq!(state.pagination.total_pages(), expected, "count {}", count);
        assert!(state.page() >= 1);
        assert!(expected == 0 || state.page() <= expected);
    }
}

#[tokio::test]
async fn empty_result_shows_page_one() {
    let table = number_table(40, no_prefetch(5, 15));
    table.load().await;
    table.set_page(3).await;

    table.set_search("no such value").await;

    let state = table.state();
    assert_eq!(state.page(), 1);
    assert!(state.data.is_empty());
    assert_eq!(state.pagination.total_pages(), 0);
    assert_eq!(state.pagination.summary(), "0 of 0");
    assert_eq!(state.status(), TableStatus::Ready);

    table.next_page().await;
    table.last_page().await;
    assert_eq!(table.state().page(), 1);
    assert_eq!(table.source().calls(), 2);
}

#[tokio::test]
async fn shrunk_dataset_moves_to_last_page() {
    init_tracing();
    let source = Arc::new(MemorySource::new(numbers(40)).unwrap());
    let table = TableController::new(Arc::clone(&source), no_prefetch(5, 10)).unwrap();
    table.load().await;
    table.last_page().await;
    assert_eq!(table.state().page(), 8);

    source.set_rows(numbers(12)).unwrap();
    table.refresh().await;

    let state = table.state();
    assert_eq!(state.page(), 3);
    assert_eq!(state.data, vec![10, 11]);
    assert_eq!(state.pagination.total_items, 12);
    assert_eq!(state.status(), TableStatus::Ready);
}

#[tokio::test]
async fn page_window_follows_current_page() {
    let table = number_table(100, no_prefetch(10, 30));
    table.load().await;
    table.set_page(5).await;

    let window = table.pagination().page_window(3);
    assert_eq!(
        window,
        vec![
            PageItem::Page(1),
            PageItem::Gap,
            PageItem::Page(4),
            PageItem::Page(5),
            PageItem::Page(6),
            PageItem::Gap,
            PageItem::Page(10),
        ]
    );
}

// ============================================================================
// Block caching
// ============================================================================

#[tokio::test]
async fn pages_within_a_fetched_block_need_no_calls() {
    let table = number_table(100, no_prefetch(10, 30));
    table.load().await;

    table.set_page(2).await;
    table.set_page(3).await;
    table.set_page(1).await;

    assert_eq!(table.source().calls(), 1);
    assert_eq!(table.cached_pages(), vec![1, 2, 3]);
}

#[tokio::test]
async fn blocks_are_requested_in_display_page_units() {
    let table = number_table(100, no_prefetch(10, 30));
    table.load().await;
    table.set_page(4).await;
    table.set_page(6).await;

    let requests = table.source().requests();
    assert_eq!(requests.len(), 2);

    assert_eq!(requests[0].page, 1);
    assert_eq!(requests[0].page_size, 30);
    assert_eq!(requests[0].offset, 0);

    assert_eq!(requests[1].page, 4);
    assert_eq!(requests[1].page_size, 30);
    assert_eq!(requests[1].offset, 30);
    assert_eq!(requests[1].block_number(), 2);

    assert_eq!(table.state().data, (50..60).collect::<Vec<_>>());
}

// ============================================================================
// Criteria changes
// ============================================================================

#[tokio::test]
async fn set_sort_invalidates_cache() {
    let table = part_table(40, no_prefetch(5, 15));
    table.load().await;
    table.set_page(4).await;
    assert_eq!(table.source().calls(), 2);
    assert_eq!(table.cached_pages(), vec![1, 2, 3, 4, 5, 6]);

    table.set_sort(SortState::descending("qty")).await;

    let state = table.state();
    assert_eq!(state.page(), 1);
    assert_eq!(state.sort, SortState::descending("qty"));
    assert_eq!(state.data[0].id, 7);
    assert_eq!(table.source().calls(), 3);
    assert_eq!(table.cached_pages(), vec![1, 2, 3]);

    table.set_page(4).await;
    assert_eq!(table.source().calls(), 4);
    let last = table.source().requests().pop().unwrap();
    assert_eq!(last.sort, Some(SortState::descending("qty")));
}

#[tokio::test]
async fn toggle_sort_cycles_direction() {
    let table = part_table(20, no_prefetch(5, 15));
    table.load().await;

    table.toggle_sort("qty").await;
    assert_eq!(table.state().sort, SortState::ascending("qty"));

    table.toggle_sort("qty").await;
    assert_eq!(table.state().sort, SortState::descending("qty"));

    table.toggle_sort("name").await;
    let state = table.state();
    assert_eq!(state.sort, SortState::ascending("name"));
    assert_eq!(ids(&state.data), vec![1, 2, 3, 4, 5]);

    assert_eq!(table.source().calls(), 4);
}

#[tokio::test]
async fn set_search_resets_to_first_page() {
    let table = part_table(40, no_prefetch(5, 15));
    table.load().await;
    table.set_page(2).await;

    table.set_search("part 00").await;

    let state = table.state();
    assert_eq!(state.page(), 1);
    assert_eq!(state.search, "part 00");
    assert_eq!(state.pagination.total_items, 9);
    assert_eq!(ids(&state.data), vec![1, 2, 3, 4, 5]);

    let request = table.source().requests().pop().unwrap();
    assert_eq!(request.search.as_deref(), Some("part 00"));
    assert_eq!(request.offset, 0);
}

#[tokio::test]
async fn set_filters_narrows_results() {
    let table = part_table(40, no_prefetch(5, 15));
    table.load().await;

    let filters = Filters::from([("status".to_string(), json!("active"))]);
    table.set_filters(filters.clone()).await;

    let state = table.state();
    assert_eq!(state.filters, filters);
    assert_eq!(state.pagination.total_items, 13);
    assert_eq!(ids(&state.data), vec![3, 6, 9, 12, 15]);

    table.set_filters(Filters::new()).await;
    assert_eq!(table.state().pagination.total_items, 40);
    let request = table.source().requests().pop().unwrap();
    assert_eq!(request.filters, None);
}

// ============================================================================
// Prefetch
// ============================================================================

#[tokio::test]
async fn last_page_of_block_prefetches_next_block() {
    let table = number_table(40, PagerConfig::new(5, 10));
    table.load().await;
    table.settle().await;
    assert_eq!(table.source().calls(), 1);

    table.set_page(2).await;
    table.settle().await;

    let requests = table.source().requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].page, 3);
    assert_eq!(requests[1].offset, 10);
    assert_eq!(table.cached_pages(), vec![1, 2, 3, 4]);

    table.set_page(3).await;
    table.settle().await;

    assert_eq!(table.state().data, vec![10, 11, 12, 13, 14]);
    assert_eq!(table.source().calls(), 2);
}

#[tokio::test]
async fn prefetch_is_not_repeated_while_in_flight() {
    let table = number_table(40, PagerConfig::new(5, 10));
    table.load().await;

    table.set_page(2).await;
    table.set_page(1).await;
    table.set_page(2).await;
    table.settle().await;

    assert_eq!(table.source().calls(), 2);
}

#[tokio::test]
async fn no_prefetch_on_final_page_or_when_disabled() {
    let table = number_table(20, PagerConfig::new(5, 10));
    table.load().await;
    table.set_page(4).await;
    table.settle().await;
    assert_eq!(table.source().calls(), 2);

    let table = number_table(40, no_prefetch(5, 10));
    table.load().await;
    table.set_page(2).await;
    table.settle().await;
    assert_eq!(table.source().calls(), 1);
}

#[tokio::test]
async fn prefetch_publishes_changed_total() {
    init_tracing();
    let source = Arc::new(MemorySource::new(numbers(40)).unwrap());
    let table = TableController::new(Arc::clone(&source), PagerConfig::new(5, 10)).unwrap();
    table.load().await;

    source.set_rows(numbers(30)).unwrap();
    let mut updates = table.subscribe();
    updates.borrow_and_update();

    table.set_page(2).await;
    table.settle().await;

    assert!(updates.has_changed().unwrap());
    let state = table.state();
    assert_eq!(state.data, vec![5, 6, 7, 8, 9]);
    assert_eq!(state.page(), 2);
    assert_eq!(state.pagination.total_items, 30);
    assert_eq!(state.pagination, table.pagination());
}

// ============================================================================
// Subscription
// ============================================================================

#[tokio::test]
async fn subscribers_see_published_state() {
    let table = number_table(12, PagerConfig::new(5, 15));
    let mut updates = table.subscribe();
    assert_eq!(updates.borrow_and_update().status(), TableStatus::Idle);

    table.load().await;

    assert!(updates.has_changed().unwrap());
    let state = updates.borrow_and_update().clone();
    assert_eq!(state.status(), TableStatus::Ready);
    assert_eq!(state.data, vec![0, 1, 2, 3, 4]);
    assert_eq!(state, table.state());
}
