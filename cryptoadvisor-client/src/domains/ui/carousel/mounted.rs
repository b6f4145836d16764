//! Mount-scoped carousel: controller + autoplay timer + keyboard listener
//!
//! Everything acquired on mount is released by [`MountedCarousel::unmount`],
//! which also runs on drop.

use std::cell::Cell;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use parking_lot::{Mutex, ReentrantMutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::keyboard::KeyboardHub;
use super::messages::{CarouselMessage, NavKey};
use super::state::CarouselController;
use super::types::{CarouselError, CarouselItem, CarouselKey};
use crate::common::{Listeners, Subscription};

struct ArmedTimer {
    epoch: u64,
    handle: JoinHandle<()>,
}

/// Page-change listeners behind a gate that `unmount` closes. The gate is
/// held for the whole delivery, so once it is closed no notification is
/// running or can start. Reentrant so a listener may drive the carousel.
#[derive(Clone)]
struct PageChanges {
    listeners: Listeners<usize>,
    open: Arc<ReentrantMutex<Cell<bool>>>,
}

impl PageChanges {
    fn new() -> Self {
        Self {
            listeners: Listeners::new(),
            open: Arc::new(ReentrantMutex::new(Cell::new(true))),
        }
    }

    fn notify(&self, page: usize) {
        let open = self.open.lock();
        if open.get() {
            self.listeners.notify(&page);
        }
    }

    fn close(&self) {
        self.open.lock().set(false);
    }
}

pub struct MountedCarousel<T: CarouselItem> {
    key: CarouselKey,
    controller: Arc<Mutex<CarouselController<T>>>,
    interval: Duration,
    timer: Mutex<Option<ArmedTimer>>,
    keyboard: Option<Subscription>,
    page_changes: PageChanges,
}

impl<T: CarouselItem> std::fmt::Debug for MountedCarousel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MountedCarousel")
            .field("key", &self.key)
            .field("controller", &*self.controller.lock())
            .field("autoplay_armed", &self.is_autoplay_armed())
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

impl<T: CarouselItem> MountedCarousel<T> {
    /// Attach `controller` to the view identified by `key`: registers its
    /// keyboard listener on `hub` and arms autoplay if enabled.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(
        key: CarouselKey,
        controller: CarouselController<T>,
        hub: &KeyboardHub,
        interval: Duration,
    ) -> Self {
        let controller = Arc::new(Mutex::new(controller));
        let page_changes = PageChanges::new();

        let keyboard = {
            let controller = Arc::clone(&controller);
            let page_changes = page_changes.clone();
            hub.register(key.clone(), move |nav: NavKey| {
                let page = {
                    let mut controller = controller.lock();
                    if !controller.handle_key(nav) {
                        return false;
                    }
                    controller.page_index()
                };
                page_changes.notify(page);
                true
            })
        };

        debug!("[Carousel] Mounted {:?}", key);
        let mounted = Self {
            key,
            controller,
            interval,
            timer: Mutex::new(None),
            keyboard: Some(keyboard),
            page_changes,
        };
        mounted.sync_timer();
        mounted
    }

    pub fn key(&self) -> &CarouselKey {
        &self.key
    }

    pub fn is_mounted(&self) -> bool {
        self.keyboard.is_some()
    }

    /// Called with the new page index after every page change, whichever
    /// input caused it.
    pub fn on_page_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&usize) + Send + Sync + 'static,
    {
        self.page_changes.listeners.add(callback)
    }

    /// Read the controller.
    pub fn with<R>(&self, f: impl FnOnce(&CarouselController<T>) -> R) -> R {
        f(&self.controller.lock())
    }

    /// Mutate the controller, then re-arm the timer if the change calls for
    /// it and report any page change.
    pub fn update<R>(
        &self,
        f: impl FnOnce(&mut CarouselController<T>) -> R,
    ) -> R {
        let (result, before, after) = {
            let mut controller = self.controller.lock();
            let before = controller.page_index();
            let result = f(&mut controller);
            (result, before, controller.page_index())
        };
        self.sync_timer();
        if before != after {
            self.page_changes.notify(after);
        }
        result
    }

    pub fn apply(
        &self,
        message: CarouselMessage,
    ) -> Result<(), CarouselError> {
        self.update(|controller| controller.apply(message))
    }

    pub fn is_autoplay_armed(&self) -> bool {
        self.timer
            .lock()
            .as_ref()
            .is_some_and(|timer| !timer.handle.is_finished())
    }

    /// Release the timer and keyboard listener. Safe to call repeatedly.
    ///
    /// Blocks until an in-progress page-change delivery finishes; no
    /// listener runs after this returns.
    pub fn unmount(&mut self) {
        self.page_changes.close();
        if let Some(keyboard) = self.keyboard.take() {
            keyboard.unsubscribe();
            debug!("[Carousel] Unmounted {:?}", self.key);
        }
        if let Some(timer) = self.timer.get_mut().take() {
            timer.handle.abort();
        }
        self.controller.lock().invalidate_timer();
    }

    /// Tear down a timer armed for an older epoch and arm one for the
    /// current epoch when autoplay has work to do.
    fn sync_timer(&self) {
        if !self.is_mounted() {
            return;
        }
        let (wants, epoch) = {
            let controller = self.controller.lock();
            (controller.wants_timer(), controller.timer_epoch())
        };

        let mut timer = self.timer.lock();
        if wants && timer.as_ref().is_some_and(|t| t.epoch == epoch) {
            return;
        }
        if let Some(stale) = timer.take() {
            stale.handle.abort();
        }
        if wants {
            debug!(
                "[Carousel] Arming autoplay for {:?} every {:?}",
                self.key, self.interval
            );
            let handle = tokio::spawn(autoplay(
                Arc::clone(&self.controller),
                epoch,
                self.interval,
                self.page_changes.clone(),
            ));
            *timer = Some(ArmedTimer { epoch, handle });
        }
    }
}

impl<T: CarouselItem> Drop for MountedCarousel<T> {
    fn drop(&mut self) {
        self.unmount();
    }
}

async fn autoplay<T: CarouselItem>(
    controller: Arc<Mutex<CarouselController<T>>>,
    epoch: u64,
    interval: Duration,
    page_changes: PageChanges,
) {
    let mut ticker =
        tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let page = {
            let mut controller = controller.lock();
            if !controller.autoplay_tick(epoch) {
                break;
            }
            controller.page_index()
        };
        page_changes.notify(page);
    }
}
