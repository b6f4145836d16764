//! Carousel pagination, reset rules, autoplay timers and keyboard lifecycle

use std::time::Duration;

use cryptoadvisor_client::domains::ui::carousel::{
    CarouselController, CarouselItem, CarouselKey, CarouselMessage,
    KeyboardHub, MountedCarousel, NavKey,
};
use cryptoadvisor_client::infra::testing::Recorder;
use cryptoadvisor_model::{MarketCard, RiskLevel};
use rand::Rng;

const FIVE_SECONDS: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
struct Card {
    id: u32,
    score: i32,
}

impl CarouselItem for Card {
    type Key = u32;

    fn key(&self) -> u32 {
        self.id
    }
}

fn cards(n: u32) -> Vec<Card> {
    (0..n)
        .map(|id| Card {
            id,
            score: (id as i32 * 7) % 11,
        })
        .collect()
}

#[test]
fn twenty_items_in_pages_of_three() {
    let mut carousel = CarouselController::new(cards(20), 3).unwrap();

    assert_eq!(carousel.total_pages(), 7);
    assert_eq!(carousel.go_to(7), 0);
    assert_eq!(carousel.go_to(-1), 6);
    assert_eq!(carousel.page().len(), 2);
}

#[test]
fn go_to_lands_in_range_for_any_integer() {
    let mut rng = rand::rng();
    for _ in 0..500 {
        let len = rng.random_range(1..60u32);
        let page_size = rng.random_range(1..10usize);
        let mut carousel =
            CarouselController::new(cards(len), page_size).unwrap();
        let total = carousel.total_pages() as i64;

        let target = rng.random_range(-1_000i64..1_000);
        let landed = carousel.go_to(target) as i64;
        assert!((0..total).contains(&landed));
        assert_eq!(landed, target.rem_euclid(total));
    }
}

#[test]
fn sort_and_page_size_always_reset_position() {
    let mut rng = rand::rng();
    for _ in 0..200 {
        let mut carousel = CarouselController::new(cards(30), 4).unwrap();
        carousel.go_to(rng.random_range(0..8));
        carousel.toggle_expand(rng.random_range(0..4));

        if rng.random_bool(0.5) {
            carousel.set_sort(|a: &Card, b: &Card| b.score.cmp(&a.score));
        } else {
            carousel.set_page_size(rng.random_range(1..10)).unwrap();
        }

        assert_eq!(carousel.page_index(), 0);
        assert_eq!(carousel.expanded_key(), None);
    }
}

#[test]
fn filter_changes_shrink_the_page_count() {
    let mut carousel = CarouselController::new(cards(20), 3).unwrap();
    carousel.go_to(5);
    carousel.set_filter(|card: &Card| card.score > 5);

    assert_eq!(carousel.page_index(), 0);
    assert!(carousel.items().all(|card| card.score > 5));
    assert_eq!(carousel.total_pages(), carousel.len().div_ceil(3));
}

#[test]
fn expansion_spans_the_whole_collection() {
    let mut carousel = CarouselController::new(cards(10), 4).unwrap();
    carousel.toggle_expand(1);
    carousel.next();
    carousel.toggle_expand(3);

    assert_eq!(carousel.expanded_key(), Some(&7));
    carousel.prev();
    // The page-0 item is no longer the expanded one.
    assert!(carousel.toggle_expand(1));
    assert_eq!(carousel.expanded_key(), Some(&1));
}

#[tokio::test(start_paused = true)]
async fn autoplay_with_a_single_page_never_fires() {
    let hub = KeyboardHub::new();
    let mut controller = CarouselController::new(cards(3), 3).unwrap();
    controller.toggle_autoplay();
    let mounted = MountedCarousel::mount(
        CarouselKey::Custom("single"),
        controller,
        &hub,
        FIVE_SECONDS,
    );
    let pages = Recorder::new();
    let _sub = mounted.on_page_change(pages.callback());

    assert!(!mounted.is_autoplay_armed());
    tokio::time::sleep(Duration::from_secs(60)).await;

    assert!(pages.is_empty());
    assert_eq!(mounted.with(|c| c.page_index()), 0);
}

#[tokio::test(start_paused = true)]
async fn new_items_rearm_the_timer() {
    let hub = KeyboardHub::new();
    let mut controller = CarouselController::new(cards(9), 3).unwrap();
    controller.toggle_autoplay();
    let mounted = MountedCarousel::mount(
        CarouselKey::Portfolio,
        controller,
        &hub,
        FIVE_SECONDS,
    );
    let pages = Recorder::new();
    let _sub = mounted.on_page_change(pages.callback());

    tokio::time::sleep(Duration::from_secs(7)).await;
    assert_eq!(pages.snapshot(), vec![1]);

    // Re-armed at t=7s: the old 10s deadline no longer applies.
    mounted.update(|c| c.set_items(cards(9)));
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(pages.snapshot(), vec![1]);

    tokio::time::sleep(Duration::from_millis(1_100)).await;
    assert_eq!(pages.snapshot(), vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn shrinking_to_one_page_disarms_autoplay() {
    let hub = KeyboardHub::new();
    let mut controller = CarouselController::new(cards(9), 3).unwrap();
    controller.toggle_autoplay();
    let mounted = MountedCarousel::mount(
        CarouselKey::Portfolio,
        controller,
        &hub,
        FIVE_SECONDS,
    );
    assert!(mounted.is_autoplay_armed());

    mounted.apply(CarouselMessage::SetPageSize(9)).unwrap();
    assert!(!mounted.is_autoplay_armed());

    mounted.apply(CarouselMessage::SetPageSize(3)).unwrap();
    assert!(mounted.is_autoplay_armed());

    mounted.apply(CarouselMessage::ToggleAutoplay).unwrap();
    assert!(!mounted.is_autoplay_armed());
}

#[tokio::test]
async fn remounting_does_not_duplicate_keyboard_listeners() {
    let hub = KeyboardHub::new();
    let first = MountedCarousel::mount(
        CarouselKey::TopMarkets,
        CarouselController::new(cards(6), 2).unwrap(),
        &hub,
        FIVE_SECONDS,
    );
    let second = MountedCarousel::mount(
        CarouselKey::TopMarkets,
        CarouselController::new(cards(6), 2).unwrap(),
        &hub,
        FIVE_SECONDS,
    );
    assert_eq!(hub.listener_count(), 1);

    assert_eq!(hub.dispatch(NavKey::ArrowRight), 1);
    assert_eq!(first.with(|c| c.page_index()), 0);
    assert_eq!(second.with(|c| c.page_index()), 1);

    // Tearing down the stale mount leaves the live one registered.
    drop(first);
    assert!(hub.is_registered(&CarouselKey::TopMarkets));
    assert_eq!(hub.dispatch(NavKey::ArrowLeft), 1);
    assert_eq!(second.with(|c| c.page_index()), 0);

    drop(second);
    assert_eq!(hub.listener_count(), 0);
}

#[tokio::test]
async fn keyboard_is_inert_with_a_single_page() {
    let hub = KeyboardHub::new();
    let mounted = MountedCarousel::mount(
        CarouselKey::Custom("short"),
        CarouselController::new(cards(2), 4).unwrap(),
        &hub,
        FIVE_SECONDS,
    );

    assert_eq!(hub.dispatch(NavKey::ArrowRight), 0);
    assert_eq!(hub.dispatch(NavKey::ArrowLeft), 0);
    assert_eq!(mounted.with(|c| c.page_index()), 0);
}

#[tokio::test(start_paused = true)]
async fn top_markets_cycle_through_five_cards() {
    let symbols = ["BTC", "ETH", "BNB", "SOL", "XRP", "ADA"];
    let market = symbols.iter().enumerate().map(|(rank, symbol)| {
        MarketCard::new(*symbol, *symbol, 100.0, 1e12 / (rank as f64 + 1.0))
            .unwrap()
            .with_risk(RiskLevel::Low)
    });

    let hub = KeyboardHub::new();
    let mounted = MountedCarousel::mount(
        CarouselKey::TopMarkets,
        CarouselController::top_markets(market),
        &hub,
        FIVE_SECONDS,
    );
    let pages = Recorder::new();
    let _sub = mounted.on_page_change(pages.callback());

    tokio::time::sleep(Duration::from_millis(25_100)).await;
    assert_eq!(pages.snapshot(), vec![1, 2, 3, 4, 0]);
    mounted.with(|c| {
        assert_eq!(c.len(), 5);
        assert_eq!(c.page()[0].symbol, "BTC");
    });
}
