//! CarouselController: filter, sort, paginate and expand over a collection
//!
//! The controller is plain synchronous state. Timers and keyboard listeners
//! live in [`super::mounted::MountedCarousel`], which keys its autoplay task
//! off [`CarouselController::timer_epoch`] so a task armed for an older
//! collection can never advance a newer one.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use cryptoadvisor_model::MarketCard;

use super::messages::{CarouselMessage, NavKey};
use super::types::{
    CarouselConfig, CarouselError, CarouselItem, Comparator, Filter,
};
use crate::infra::constants::carousel::TOP_MARKETS_LEN;

pub struct CarouselController<T: CarouselItem> {
    // Content
    source: Vec<T>,
    filter: Option<Filter<T>>,
    comparator: Option<Comparator<T>>,
    /// Cap on the number of items shown, applied after sorting.
    limit: Option<usize>,
    /// Indices into `source` after filter + sort + limit.
    view: Vec<usize>,

    // Paging
    page_size: usize,
    page_index: usize,
    expanded: Option<T::Key>,

    // Autoplay
    autoplay: bool,
    timer_epoch: u64,
}

impl<T: CarouselItem> fmt::Debug for CarouselController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CarouselController")
            .field("items", &self.view.len())
            .field("limit", &self.limit)
            .field("page_size", &self.page_size)
            .field("page_index", &self.page_index)
            .field("expanded", &self.expanded)
            .field("autoplay", &self.autoplay)
            .field("timer_epoch", &self.timer_epoch)
            .finish()
    }
}

impl<T: CarouselItem> CarouselController<T> {
    pub fn new(
        items: Vec<T>,
        page_size: usize,
    ) -> Result<Self, CarouselError> {
        if page_size == 0 {
            return Err(CarouselError::InvalidPageSize);
        }
        let mut controller = Self {
            source: items,
            filter: None,
            comparator: None,
            limit: None,
            view: Vec::new(),
            page_size,
            page_index: 0,
            expanded: None,
            autoplay: false,
            timer_epoch: 0,
        };
        controller.rebuild_view();
        Ok(controller)
    }

    pub fn from_config(
        items: Vec<T>,
        config: &CarouselConfig,
    ) -> Result<Self, CarouselError> {
        let mut controller = Self::new(items, config.page_size)?;
        controller.autoplay = config.autoplay_on_mount;
        Ok(controller)
    }

    // Queries

    /// Number of items after filtering.
    pub fn len(&self) -> usize {
        self.view.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    /// Filtered, sorted items in display order.
    pub fn items(&self) -> impl Iterator<Item = &T> + '_ {
        self.view.iter().map(|&i| &self.source[i])
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn total_pages(&self) -> usize {
        self.view.len().div_ceil(self.page_size)
    }

    /// Items on the current page.
    pub fn page(&self) -> Vec<&T> {
        let start = self.page_index * self.page_size;
        self.view
            .iter()
            .skip(start)
            .take(self.page_size)
            .map(|&i| &self.source[i])
            .collect()
    }

    pub fn expanded_key(&self) -> Option<&T::Key> {
        self.expanded.as_ref()
    }

    pub fn expanded_item(&self) -> Option<&T> {
        let key = self.expanded.as_ref()?;
        self.items().find(|item| &item.key() == key)
    }

    pub fn autoplay_enabled(&self) -> bool {
        self.autoplay
    }

    /// Changes whenever items, page size or autoplay change; an autoplay
    /// timer armed under an older epoch is stale.
    pub fn timer_epoch(&self) -> u64 {
        self.timer_epoch
    }

    /// Whether an autoplay timer should currently be running.
    pub fn wants_timer(&self) -> bool {
        self.autoplay && self.total_pages() > 1
    }

    // Collection changes

    /// Replace the collection wholesale, keeping filter and sort. The page is
    /// clamped into the new range; the expanded item stays expanded only if
    /// it is still present.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.source = items;
        self.rebuild_view();
        self.page_index = self.page_index.min(self.last_page());
        if let Some(key) = &self.expanded
            && !self.items().any(|item| &item.key() == key)
        {
            self.expanded = None;
        }
        self.bump_epoch();
    }

    pub fn set_filter<F>(&mut self, predicate: F)
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(predicate));
        self.reset_view();
    }

    pub fn clear_filter(&mut self) {
        self.filter = None;
        self.reset_view();
    }

    pub fn set_sort<F>(&mut self, comparator: F)
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.comparator = Some(Arc::new(comparator));
        self.reset_view();
    }

    pub fn clear_sort(&mut self) {
        self.comparator = None;
        self.reset_view();
    }

    /// Show at most `limit` items of the filtered, sorted collection. The
    /// limit survives `set_items`.
    pub fn set_limit(&mut self, limit: Option<usize>) {
        self.limit = limit;
        self.reset_view();
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn set_page_size(
        &mut self,
        page_size: usize,
    ) -> Result<(), CarouselError> {
        if page_size == 0 {
            return Err(CarouselError::InvalidPageSize);
        }
        self.page_size = page_size;
        self.page_index = 0;
        self.expanded = None;
        self.bump_epoch();
        Ok(())
    }

    // Navigation

    /// Advance one page, wrapping. No-op with one page or fewer.
    pub fn next(&mut self) -> usize {
        let total = self.total_pages();
        if total > 1 {
            self.page_index = (self.page_index + 1) % total;
        }
        self.page_index
    }

    pub fn prev(&mut self) -> usize {
        let total = self.total_pages();
        if total > 0 {
            self.page_index = (self.page_index + total - 1) % total;
        }
        self.page_index
    }

    /// Jump to `page` modulo the page count; any integer is accepted.
    pub fn go_to(&mut self, page: i64) -> usize {
        let total = self.total_pages();
        self.page_index = if total == 0 {
            0
        } else {
            page.rem_euclid(total as i64) as usize
        };
        self.page_index
    }

    /// Keyboard input. Returns whether the key was consumed; keys are
    /// ignored while everything fits on one page.
    pub fn handle_key(&mut self, key: NavKey) -> bool {
        if self.total_pages() <= 1 {
            return false;
        }
        match key {
            NavKey::ArrowLeft => {
                self.prev();
                true
            }
            NavKey::ArrowRight => {
                self.next();
                true
            }
            NavKey::Other => false,
        }
    }

    // Presentation

    /// Expand the item at `local` on the current page, or collapse it if it
    /// is the expanded one. Returns whether anything is expanded afterwards.
    pub fn toggle_expand(&mut self, local: usize) -> bool {
        if local >= self.page_size {
            return self.expanded.is_some();
        }
        let global = self.page_index * self.page_size + local;
        let Some(key) = self.view.get(global).map(|&i| self.source[i].key())
        else {
            return self.expanded.is_some();
        };

        if self.expanded.as_ref() == Some(&key) {
            self.expanded = None;
        } else {
            self.expanded = Some(key);
        }
        self.expanded.is_some()
    }

    pub fn toggle_autoplay(&mut self) -> bool {
        self.set_autoplay(!self.autoplay);
        self.autoplay
    }

    pub fn set_autoplay(&mut self, enabled: bool) {
        if self.autoplay != enabled {
            self.autoplay = enabled;
            self.bump_epoch();
        }
    }

    /// One autoplay step from a timer armed at `epoch`. Returns false when
    /// that timer is stale or autoplay has nothing to do, in which case the
    /// timer should stop.
    pub fn autoplay_tick(&mut self, epoch: u64) -> bool {
        if epoch != self.timer_epoch || !self.wants_timer() {
            return false;
        }
        self.next();
        true
    }

    pub fn apply(
        &mut self,
        message: CarouselMessage,
    ) -> Result<(), CarouselError> {
        match message {
            CarouselMessage::NextPage => {
                self.next();
            }
            CarouselMessage::PrevPage => {
                self.prev();
            }
            CarouselMessage::GoTo(page) => {
                self.go_to(page);
            }
            CarouselMessage::Key(key) => {
                self.handle_key(key);
            }
            CarouselMessage::ToggleExpand(local) => {
                self.toggle_expand(local);
            }
            CarouselMessage::ToggleAutoplay => {
                self.toggle_autoplay();
            }
            CarouselMessage::SetPageSize(size) => self.set_page_size(size)?,
        }
        Ok(())
    }

    /// Retire any armed timer without changing visible state.
    pub(crate) fn invalidate_timer(&mut self) {
        self.bump_epoch();
    }

    fn last_page(&self) -> usize {
        self.total_pages().saturating_sub(1)
    }

    fn reset_view(&mut self) {
        self.rebuild_view();
        self.page_index = 0;
        self.expanded = None;
        self.bump_epoch();
    }

    fn rebuild_view(&mut self) {
        let source = &self.source;
        let mut view: Vec<usize> = match &self.filter {
            Some(filter) => (0..source.len())
                .filter(|&i| filter(&source[i]))
                .collect(),
            None => (0..source.len()).collect(),
        };
        if let Some(comparator) = &self.comparator {
            view.sort_by(|&a, &b| comparator(&source[a], &source[b]));
        }
        if let Some(limit) = self.limit {
            view.truncate(limit);
        }
        self.view = view;
    }

    fn bump_epoch(&mut self) {
        self.timer_epoch = self.timer_epoch.wrapping_add(1);
    }
}

impl CarouselController<MarketCard> {
    /// The home page carousel: the largest markets by capitalization, one
    /// card per page. Later `set_items` calls keep the same ranking and cap.
    pub fn top_markets(cards: impl IntoIterator<Item = MarketCard>) -> Self {
        let config = CarouselConfig::top_markets();
        let mut controller = Self {
            source: cards.into_iter().collect(),
            filter: None,
            comparator: Some(Arc::new(MarketCard::by_market_cap_desc)),
            limit: Some(TOP_MARKETS_LEN),
            view: Vec::new(),
            page_size: config.page_size,
            page_index: 0,
            expanded: None,
            autoplay: config.autoplay_on_mount,
            timer_epoch: 0,
        };
        controller.rebuild_view();
        controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(u32);

    impl CarouselItem for Item {
        type Key = u32;

        fn key(&self) -> u32 {
            self.0
        }
    }

    fn items(n: u32) -> Vec<Item> {
        (0..n).map(Item).collect()
    }

    fn keys(page: Vec<&Item>) -> Vec<u32> {
        page.into_iter().map(|item| item.0).collect()
    }

    #[test]
    fn rejects_zero_page_size() {
        assert_eq!(
            CarouselController::new(items(3), 0).unwrap_err(),
            CarouselError::InvalidPageSize
        );
        let mut c = CarouselController::new(items(3), 1).unwrap();
        assert_eq!(c.set_page_size(0), Err(CarouselError::InvalidPageSize));
        assert_eq!(c.page_size(), 1);
    }

    #[test]
    fn pages_cover_all_items() {
        let mut c = CarouselController::new(items(20), 3).unwrap();
        assert_eq!(c.total_pages(), 7);
        assert_eq!(keys(c.page()), vec![0, 1, 2]);
        c.go_to(6);
        assert_eq!(keys(c.page()), vec![18, 19]);
    }

    #[test]
    fn empty_collection_stays_on_page_zero() {
        let mut c = CarouselController::<Item>::new(Vec::new(), 4).unwrap();
        assert_eq!(c.total_pages(), 0);
        assert_eq!(c.next(), 0);
        assert_eq!(c.prev(), 0);
        assert_eq!(c.go_to(-3), 0);
        assert!(c.page().is_empty());
        assert!(!c.toggle_expand(0));
    }

    #[test]
    fn go_to_wraps_any_integer() {
        let mut c = CarouselController::new(items(20), 3).unwrap();
        assert_eq!(c.go_to(7), 0);
        assert_eq!(c.go_to(-1), 6);
        assert_eq!(c.go_to(-15), 6);
        assert_eq!(c.go_to(i64::MAX), (i64::MAX % 7) as usize);
        for p in -50..50 {
            assert_eq!(c.go_to(p) as i64, p.rem_euclid(7));
        }
    }

    #[test]
    fn next_and_prev_wrap() {
        let mut c = CarouselController::new(items(5), 2).unwrap();
        assert_eq!(c.prev(), 2);
        assert_eq!(c.next(), 0);
        assert_eq!(c.next(), 1);
    }

    #[test]
    fn single_page_ignores_next() {
        let mut c = CarouselController::new(items(2), 5).unwrap();
        assert_eq!(c.next(), 0);
        assert!(!c.handle_key(NavKey::ArrowRight));
    }

    #[test]
    fn expansion_is_global_and_exclusive() {
        let mut c = CarouselController::new(items(9), 3).unwrap();
        c.go_to(1);
        assert!(c.toggle_expand(2));
        assert_eq!(c.expanded_key(), Some(&5));

        c.go_to(2);
        assert!(c.toggle_expand(0));
        assert_eq!(c.expanded_item(), Some(&Item(6)));

        assert!(!c.toggle_expand(0));
        assert_eq!(c.expanded_key(), None);
        // Out of range on this page.
        assert!(!c.toggle_expand(3));
    }

    #[test]
    fn filter_sort_and_page_size_reset_position() {
        let mut c = CarouselController::new(items(20), 3).unwrap();

        c.go_to(4);
        c.toggle_expand(1);
        c.set_sort(|a: &Item, b: &Item| b.0.cmp(&a.0));
        assert_eq!((c.page_index(), c.expanded_key()), (0, None));
        assert_eq!(keys(c.page()), vec![19, 18, 17]);

        c.go_to(2);
        c.toggle_expand(0);
        c.set_filter(|item: &Item| item.0 % 2 == 0);
        assert_eq!((c.page_index(), c.expanded_key()), (0, None));
        assert_eq!(c.len(), 10);
        assert_eq!(keys(c.page()), vec![18, 16, 14]);

        c.go_to(3);
        c.toggle_expand(0);
        c.set_page_size(4).unwrap();
        assert_eq!((c.page_index(), c.expanded_key()), (0, None));
        assert_eq!(c.total_pages(), 3);

        c.clear_filter();
        c.clear_sort();
        assert_eq!(keys(c.page()), vec![0, 1, 2, 3]);
    }

    #[test]
    fn set_items_clamps_page_and_keeps_surviving_expansion() {
        let mut c = CarouselController::new(items(20), 3).unwrap();
        c.go_to(6);
        c.toggle_expand(0);
        assert_eq!(c.expanded_key(), Some(&18));

        c.set_items(items(19));
        assert_eq!(c.page_index(), 6);
        assert_eq!(c.expanded_key(), Some(&18));

        c.set_items(items(7));
        assert_eq!(c.page_index(), 2);
        assert_eq!(c.expanded_key(), None);
    }

    #[test]
    fn epoch_tracks_timer_relevant_changes() {
        let mut c = CarouselController::new(items(6), 2).unwrap();
        let start = c.timer_epoch();

        c.next();
        c.toggle_expand(0);
        assert_eq!(c.timer_epoch(), start);

        c.toggle_autoplay();
        let armed = c.timer_epoch();
        assert_ne!(armed, start);

        assert!(c.autoplay_tick(armed));
        assert!(!c.autoplay_tick(start));

        c.set_items(items(8));
        assert!(!c.autoplay_tick(armed));
    }

    #[test]
    fn autoplay_with_one_page_never_advances() {
        let mut c = CarouselController::new(items(3), 3).unwrap();
        c.toggle_autoplay();
        assert!(!c.wants_timer());
        assert!(!c.autoplay_tick(c.timer_epoch()));
        assert_eq!(c.page_index(), 0);
    }

    #[test]
    fn messages_drive_transitions() {
        let mut c = CarouselController::new(items(10), 2).unwrap();
        c.apply(CarouselMessage::NextPage).unwrap();
        c.apply(CarouselMessage::Key(NavKey::ArrowRight)).unwrap();
        assert_eq!(c.page_index(), 2);
        c.apply(CarouselMessage::GoTo(-1)).unwrap();
        assert_eq!(c.page_index(), 4);
        c.apply(CarouselMessage::ToggleAutoplay).unwrap();
        assert!(c.autoplay_enabled());
        assert_eq!(
            c.apply(CarouselMessage::SetPageSize(0)),
            Err(CarouselError::InvalidPageSize)
        );
    }

    fn markets(symbols: &[&str]) -> Vec<MarketCard> {
        symbols
            .iter()
            .enumerate()
            .map(|(i, symbol)| {
                MarketCard::new(*symbol, *symbol, 1.0, (i as f64 + 1.0) * 1e9)
                    .unwrap()
            })
            .collect()
    }

    fn symbols(c: &CarouselController<MarketCard>) -> Vec<&str> {
        c.items().map(|card| card.symbol.as_str()).collect()
    }

    #[test]
    fn top_markets_keeps_five_largest() {
        let c = CarouselController::top_markets(markets(&[
            "btc", "eth", "sol", "ada", "xrp", "doge", "dot",
        ]));
        assert_eq!(symbols(&c), vec!["DOT", "DOGE", "XRP", "ADA", "SOL"]);
        assert_eq!(c.total_pages(), 5);
        assert!(c.autoplay_enabled());
    }

    #[test]
    fn top_markets_stay_capped_across_set_items() {
        let mut c = CarouselController::top_markets(markets(&["btc", "eth"]));
        assert_eq!(c.total_pages(), 2);

        c.set_items(markets(&[
            "btc", "eth", "sol", "ada", "xrp", "doge", "dot", "link",
        ]));
        assert_eq!(c.len(), TOP_MARKETS_LEN);
        assert_eq!(symbols(&c), vec!["LINK", "DOT", "DOGE", "XRP", "ADA"]);
    }

    #[test]
    fn limit_applies_after_filter_and_sort() {
        let mut c = CarouselController::new(items(10), 2).unwrap();
        c.go_to(3);
        c.set_filter(|item| item.0 % 2 == 1);
        c.set_sort(|a, b| b.0.cmp(&a.0));
        c.set_limit(Some(3));

        assert_eq!(c.limit(), Some(3));
        assert_eq!(c.items().map(|i| i.0).collect::<Vec<_>>(), vec![9, 7, 5]);
        assert_eq!(c.total_pages(), 2);
        assert_eq!(c.page_index(), 0);

        c.set_limit(None);
        assert_eq!(c.len(), 5);
    }
}
