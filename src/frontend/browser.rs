use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use js_sys::Array;
use serde_json::json;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{window, Document, IntersectionObserver, IntersectionObserverInit, Window};

use portfolio_sections::error::AttachError;
use portfolio_sections::logging::{log_event, LogLevel};
use portfolio_sections::measurement::SectionRect;
use portfolio_sections::timer::{FrameGate, TimerSlots};
use portfolio_sections::tracker::{ScrollSubscriber, Viewport};

const INTERSECTION_THRESHOLDS: [f64; 11] = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];
const FRAME_SLOT: &str = "frame";
const RETRY_SLOT: &str = "sample-retry";
const DEADLINE_SLOT: &str = "deadline";

fn js_message(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn rejected(what: &'static str) -> impl FnOnce(JsValue) -> AttachError {
    move |err| AttachError::Rejected {
        what,
        message: js_message(&err),
    }
}

pub fn now_ms() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|performance| performance.now())
        .unwrap_or_else(js_sys::Date::now)
}

pub fn viewport() -> Viewport {
    let Some(win) = window() else {
        return Viewport::new(1280.0, 720.0);
    };

    let width = win
        .inner_width()
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(1280.0);
    let height = win
        .inner_height()
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(720.0);

    Viewport::new(width, height)
}

pub fn scroll_y() -> f64 {
    window().and_then(|w| w.scroll_y().ok()).unwrap_or(0.0)
}

pub fn locate_section(section_id: &str) -> Option<SectionRect> {
    let element = window()?.document()?.get_element_by_id(section_id)?;
    let rect = element.get_bounding_client_rect();
    Some(SectionRect::new(rect.top(), rect.bottom()))
}

#[derive(Clone, Copy)]
enum ScheduledKind {
    Timeout,
    Frame,
}

/// A pending `setTimeout` or `requestAnimationFrame` callback, cancelled on drop.
pub struct Scheduled {
    kind: ScheduledKind,
    handle: i32,
    _callback: Closure<dyn FnMut()>,
}

impl Scheduled {
    pub fn timeout(delay_ms: f64, callback: impl FnOnce() + 'static) -> Result<Self, AttachError> {
        let win = window().ok_or(AttachError::NoWindow)?;
        let callback: Closure<dyn FnMut()> = Closure::once(callback);
        let delay = delay_ms.max(0.0).ceil().min(f64::from(i32::MAX)) as i32;
        let handle = win
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                delay,
            )
            .map_err(rejected("setTimeout"))?;

        Ok(Self {
            kind: ScheduledKind::Timeout,
            handle,
            _callback: callback,
        })
    }

    pub fn frame(callback: impl FnOnce() + 'static) -> Result<Self, AttachError> {
        let win = window().ok_or(AttachError::NoWindow)?;
        let callback: Closure<dyn FnMut()> = Closure::once(callback);
        let handle = win
            .request_animation_frame(callback.as_ref().unchecked_ref())
            .map_err(rejected("requestAnimationFrame"))?;

        Ok(Self {
            kind: ScheduledKind::Frame,
            handle,
            _callback: callback,
        })
    }
}

impl Drop for Scheduled {
    fn drop(&mut self) {
        let Some(win) = window() else {
            return;
        };
        match self.kind {
            ScheduledKind::Timeout => win.clear_timeout_with_handle(self.handle),
            ScheduledKind::Frame => {
                let _ = win.cancel_animation_frame(self.handle);
            }
        }
    }
}

struct WindowListener {
    target: Window,
    event: &'static str,
    callback: Closure<dyn FnMut()>,
}

impl WindowListener {
    fn add(target: &Window, event: &'static str, handler: impl FnMut() + 'static) -> Result<Self, AttachError> {
        let callback = Closure::<dyn FnMut()>::new(handler);
        target
            .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            .map_err(rejected("addEventListener"))?;

        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for WindowListener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

struct SectionObserver {
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(JsValue, JsValue)>,
}

impl SectionObserver {
    fn observe(
        document: &Document,
        section_ids: &[String],
        handler: impl FnMut() + 'static,
    ) -> Result<Self, AttachError> {
        let mut handler = handler;
        let callback = Closure::<dyn FnMut(JsValue, JsValue)>::new(move |_entries: JsValue, _observer: JsValue| {
            handler();
        });

        let thresholds: Array = INTERSECTION_THRESHOLDS
            .iter()
            .map(|value| JsValue::from_f64(*value))
            .collect();
        let options = IntersectionObserverInit::new();
        options.set_threshold(&thresholds);

        let observer = IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options)
            .map_err(rejected("IntersectionObserver"))?;

        for section_id in section_ids {
            if let Some(element) = document.get_element_by_id(section_id) {
                observer.observe(&element);
            }
        }

        Ok(Self {
            observer,
            _callback: callback,
        })
    }
}

impl Drop for SectionObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

struct Shared<T> {
    name: &'static str,
    tracker: RefCell<T>,
    on_change: Box<dyn Fn(&T)>,
    timers: RefCell<TimerSlots<&'static str, Scheduled>>,
    frame: RefCell<FrameGate>,
    deadline: Cell<Option<f64>>,
}

fn log_schedule_failure(name: &'static str, slot: &'static str, err: &AttachError) {
    log_event(
        LogLevel::Info,
        "tracker_schedule_failed",
        json!({ "tracker": name, "slot": slot, "error": err.to_string() }),
    );
}

fn publish<T: ScrollSubscriber + 'static>(shared: &Rc<Shared<T>>) {
    let tracker = shared.tracker.borrow();
    (shared.on_change)(&tracker);
}

fn sample<T: ScrollSubscriber + 'static>(shared: &Rc<Shared<T>>) {
    let refresh = shared
        .tracker
        .borrow_mut()
        .on_sample(now_ms(), viewport(), &locate_section);

    if refresh.changed {
        publish(shared);
    }
    if let Some(retry_in_ms) = refresh.retry_in_ms {
        schedule_retry(shared, retry_in_ms);
    }
    sync_deadline(shared);
}

fn handle_scroll<T: ScrollSubscriber + 'static>(shared: &Rc<Shared<T>>) {
    let changed = shared.tracker.borrow_mut().on_scroll(now_ms(), scroll_y());
    if changed {
        publish(shared);
        sync_deadline(shared);
    }
    request_frame(shared);
}

fn request_frame<T: ScrollSubscriber + 'static>(shared: &Rc<Shared<T>>) {
    if !shared.frame.borrow_mut().request() {
        return;
    }

    let weak = Rc::downgrade(shared);
    let token = Rc::new(Cell::new(0));
    let issued = Rc::clone(&token);
    match Scheduled::frame(move || with_shared(&weak, |shared| {
        if !shared.timers.borrow_mut().complete(&FRAME_SLOT, issued.get()) {
            return;
        }
        shared.frame.borrow_mut().begin_frame();
        sample(shared);
    })) {
        Ok(frame) => {
            token.set(shared.timers.borrow_mut().replace(FRAME_SLOT, frame));
        }
        Err(err) => {
            shared.frame.borrow_mut().begin_frame();
            log_schedule_failure(shared.name, FRAME_SLOT, &err);
        }
    }
}

fn schedule_retry<T: ScrollSubscriber + 'static>(shared: &Rc<Shared<T>>, delay_ms: f64) {
    if shared.timers.borrow().is_scheduled(&RETRY_SLOT) {
        return;
    }

    let weak = Rc::downgrade(shared);
    let token = Rc::new(Cell::new(0));
    let issued = Rc::clone(&token);
    match Scheduled::timeout(delay_ms, move || with_shared(&weak, |shared| {
        if shared.timers.borrow_mut().complete(&RETRY_SLOT, issued.get()) {
            sample(shared);
        }
    })) {
        Ok(timeout) => {
            token.set(shared.timers.borrow_mut().replace(RETRY_SLOT, timeout));
        }
        Err(err) => log_schedule_failure(shared.name, RETRY_SLOT, &err),
    }
}

/// Keeps exactly one timer armed for the tracker's next deadline.
fn sync_deadline<T: ScrollSubscriber + 'static>(shared: &Rc<Shared<T>>) {
    let next = shared.tracker.borrow().next_deadline();
    if next == shared.deadline.get() {
        return;
    }
    shared.deadline.set(next);

    let Some(due_at_ms) = next else {
        shared.timers.borrow_mut().clear(&DEADLINE_SLOT);
        return;
    };

    let weak = Rc::downgrade(shared);
    let token = Rc::new(Cell::new(0));
    let issued = Rc::clone(&token);
    let scheduled = Scheduled::timeout(due_at_ms - now_ms(), move || with_shared(&weak, |shared| {
        if !shared.timers.borrow_mut().complete(&DEADLINE_SLOT, issued.get()) {
            return;
        }
        shared.deadline.set(None);
        let changed = shared.tracker.borrow_mut().on_deadline(now_ms());
        if changed {
            publish(shared);
        }
        sync_deadline(shared);
    }));

    match scheduled {
        Ok(timeout) => {
            token.set(shared.timers.borrow_mut().replace(DEADLINE_SLOT, timeout));
        }
        Err(err) => {
            shared.deadline.set(None);
            log_schedule_failure(shared.name, DEADLINE_SLOT, &err);
        }
    }
}

fn with_shared<T>(weak: &Weak<Shared<T>>, f: impl FnOnce(&Rc<Shared<T>>)) {
    if let Some(shared) = weak.upgrade() {
        f(&shared);
    }
}

/// Connects a tracker to scroll, resize and intersection events.
///
/// Dropping the binding cancels every pending frame and timer, removes the
/// listeners and disconnects the observer before returning. Callbacks only
/// hold weak references, so nothing can reach the tracker afterwards.
pub struct ScrollBinding<T: ScrollSubscriber + 'static> {
    shared: Rc<Shared<T>>,
    _listeners: Vec<WindowListener>,
    _observer: SectionObserver,
}

impl<T: ScrollSubscriber + 'static> ScrollBinding<T> {
    pub fn attach(
        name: &'static str,
        tracker: T,
        on_change: impl Fn(&T) + 'static,
    ) -> Result<Self, AttachError> {
        let win = window().ok_or(AttachError::NoWindow)?;
        let document = win.document().ok_or(AttachError::NoDocument)?;

        let shared = Rc::new(Shared {
            name,
            tracker: RefCell::new(tracker),
            on_change: Box::new(on_change),
            timers: RefCell::new(TimerSlots::new()),
            frame: RefCell::new(FrameGate::default()),
            deadline: Cell::new(None),
        });

        let scroll = {
            let weak = Rc::downgrade(&shared);
            WindowListener::add(&win, "scroll", move || with_shared(&weak, handle_scroll))?
        };
        let resize = {
            let weak = Rc::downgrade(&shared);
            WindowListener::add(&win, "resize", move || with_shared(&weak, request_frame))?
        };
        let observer = {
            let weak = Rc::downgrade(&shared);
            let section_ids = shared.tracker.borrow().section_ids().to_vec();
            SectionObserver::observe(&document, &section_ids, move || {
                with_shared(&weak, request_frame)
            })?
        };

        shared.tracker.borrow_mut().on_scroll(now_ms(), scroll_y());
        request_frame(&shared);

        Ok(Self {
            shared,
            _listeners: vec![scroll, resize],
            _observer: observer,
        })
    }

    /// Applies an out-of-band change (e.g. a prop) and publishes if it reports one.
    pub fn update(&self, f: impl FnOnce(&mut T) -> bool) {
        let changed = f(&mut self.shared.tracker.borrow_mut());
        if changed {
            publish(&self.shared);
        }
        sync_deadline(&self.shared);
    }
}

impl<T: ScrollSubscriber + 'static> Drop for ScrollBinding<T> {
    fn drop(&mut self) {
        self.shared.timers.borrow_mut().clear_all();
        self.shared.deadline.set(None);
    }
}
