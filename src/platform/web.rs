//! Browser implementations of the platform traits
//!
//! Frames come from `requestAnimationFrame`, countdown ticks from
//! `setInterval`, prompts from the page's modal dialog. Callbacks are routed
//! through a sink installed after the game exists, since the game owns the
//! schedulers.

use glam::Vec2;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Document, Element, EventTarget, HtmlCanvasElement, HtmlElement, MouseEvent, Window,
};

use super::{
    FrameId, FrameScheduler, IntervalScheduler, PromptFuture, PromptService, Route, TimerId,
};

/// Late-bound callback slot shared between a scheduler and its owner
pub type Sink<T> = Rc<RefCell<Option<Rc<dyn Fn(T)>>>>;

fn fire<T>(sink: &Sink<T>, value: T) {
    // Clone out first; the callback may re-enter the scheduler
    let callback = sink.borrow().clone();
    if let Some(callback) = callback {
        callback(value);
    }
}

pub fn window() -> Option<Window> {
    web_sys::window()
}

pub fn document() -> Option<Document> {
    window()?.document()
}

pub fn element_by_id(id: &str) -> Option<Element> {
    document()?.get_element_by_id(id)
}

pub fn html_element_by_id(id: &str) -> Option<HtmlElement> {
    element_by_id(id)?.dyn_into::<HtmlElement>().ok()
}

/// Go to another page, relative to the current one
pub fn navigate(route: Route) {
    let Some(window) = window() else {
        return;
    };
    let location = window.location();
    let path = location.pathname().unwrap_or_default();
    let target = route.resolve(&path);
    log::info!("Navigating to {}", target);
    if let Err(err) = location.set_href(&target) {
        log::error!("Navigation failed: {:?}", err);
    }
}

/// Attach a permanent DOM listener
pub fn listen<E, F>(target: &EventTarget, event: &str, mut handler: F)
where
    E: JsCast + 'static,
    F: FnMut(E) + 'static,
{
    let closure = Closure::<dyn FnMut(_)>::new(move |ev: web_sys::Event| {
        if let Ok(ev) = ev.dyn_into::<E>() {
            handler(ev);
        }
    });
    if let Err(err) =
        target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
    {
        log::error!("Failed to listen for {}: {:?}", event, err);
    }
    closure.forget();
}

/// Pointer position in canvas pixels, accounting for CSS scaling
pub fn canvas_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> Vec2 {
    let rect = canvas.get_bounding_client_rect();
    let scale_x = if rect.width() > 0.0 {
        canvas.width() as f64 / rect.width()
    } else {
        1.0
    };
    let scale_y = if rect.height() > 0.0 {
        canvas.height() as f64 / rect.height()
    } else {
        1.0
    };
    Vec2::new(
        ((ev.client_x() as f64 - rect.left()) * scale_x) as f32,
        ((ev.client_y() as f64 - rect.top()) * scale_y) as f32,
    )
}

/// Frame scheduler backed by `requestAnimationFrame`
#[derive(Default)]
pub struct RafScheduler {
    next_id: u32,
    handles: Rc<RefCell<HashMap<FrameId, i32>>>,
    sink: Sink<(FrameId, f64)>,
}

impl RafScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot receiving `(frame, timestamp_ms)` for every fired frame
    pub fn sink(&self) -> Sink<(FrameId, f64)> {
        self.sink.clone()
    }
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self) -> FrameId {
        let id = FrameId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        let Some(window) = window() else {
            log::error!("No window; frame {:?} will never fire", id);
            return id;
        };
        let handles = self.handles.clone();
        let sink = self.sink.clone();
        let callback = Closure::once_into_js(move |timestamp: f64| {
            handles.borrow_mut().remove(&id);
            fire(&sink, (id, timestamp));
        });
        match window.request_animation_frame(callback.unchecked_ref()) {
            Ok(handle) => {
                self.handles.borrow_mut().insert(id, handle);
            }
            Err(err) => log::error!("requestAnimationFrame failed: {:?}", err),
        }
        id
    }

    fn cancel_frame(&mut self, id: FrameId) {
        let handle = self.handles.borrow_mut().remove(&id);
        if let (Some(handle), Some(window)) = (handle, window()) {
            let _ = window.cancel_animation_frame(handle);
        }
    }
}

/// Interval scheduler backed by `setInterval`
#[derive(Default)]
pub struct IntervalTimers {
    next_id: u32,
    active: HashMap<TimerId, (i32, Closure<dyn FnMut()>)>,
    /// Cancelled closures, kept until no tick is on the stack
    retired: Vec<Closure<dyn FnMut()>>,
    ticking: Rc<Cell<bool>>,
    sink: Sink<TimerId>,
}

impl IntervalTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(&self) -> Sink<TimerId> {
        self.sink.clone()
    }
}

impl IntervalScheduler for IntervalTimers {
    fn start_interval(&mut self, period_ms: u32) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        if !self.ticking.get() {
            self.retired.clear();
        }

        let Some(window) = window() else {
            log::error!("No window; timer {:?} will never fire", id);
            return id;
        };
        let sink = self.sink.clone();
        let ticking = self.ticking.clone();
        let closure = Closure::<dyn FnMut()>::new(move || {
            ticking.set(true);
            fire(&sink, id);
            ticking.set(false);
        });
        match window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            period_ms as i32,
        ) {
            Ok(handle) => {
                self.active.insert(id, (handle, closure));
            }
            Err(err) => log::error!("setInterval failed: {:?}", err),
        }
        id
    }

    fn cancel_interval(&mut self, id: TimerId) {
        if let Some((handle, closure)) = self.active.remove(&id) {
            if let Some(window) = window() {
                window.clear_interval_with_handle(handle);
            }
            self.retired.push(closure);
        }
    }
}

/// Prompts shown in the page's `#modal` dialog
///
/// Falls back to the blocking `alert`/`confirm` when the page has no modal.
#[derive(Debug, Default)]
pub struct ModalPrompts;

struct ModalParts {
    root: Element,
    title: Element,
    message: Element,
    ok: HtmlElement,
    cancel: HtmlElement,
}

impl ModalParts {
    fn find() -> Option<Self> {
        Some(Self {
            root: element_by_id("modal")?,
            title: element_by_id("modal-title")?,
            message: element_by_id("modal-message")?,
            ok: html_element_by_id("modal-ok")?,
            cancel: html_element_by_id("modal-cancel")?,
        })
    }

    fn close(&self) {
        let _ = self.root.class_list().add_1("hidden");
        self.ok.set_onclick(None);
        self.cancel.set_onclick(None);
    }
}

impl ModalPrompts {
    pub fn new() -> Self {
        Self
    }

    /// Show the modal and resolve with the clicked button
    fn ask(
        &self,
        title: &str,
        message: &str,
        ok_label: &str,
        cancel_label: Option<&str>,
    ) -> PromptFuture<bool> {
        let Some(parts) = ModalParts::find() else {
            return Box::pin(std::future::ready(fallback(message, cancel_label.is_some())));
        };
        parts.title.set_text_content(Some(title));
        parts.message.set_text_content(Some(message));
        parts.ok.set_text_content(Some(ok_label));
        match cancel_label {
            Some(label) => {
                parts.cancel.set_text_content(Some(label));
                let _ = parts.cancel.class_list().remove_1("hidden");
            }
            None => {
                let _ = parts.cancel.class_list().add_1("hidden");
            }
        }

        let parts = Rc::new(parts);
        let handlers = RefCell::new(Vec::with_capacity(2));
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            for (button, answer) in [(&parts.ok, true), (&parts.cancel, false)] {
                let resolve = resolve.clone();
                let parts = parts.clone();
                let closure = Closure::<dyn FnMut()>::new(move || {
                    parts.close();
                    let _ = resolve.call1(&JsValue::NULL, &JsValue::from_bool(answer));
                });
                button.set_onclick(Some(closure.as_ref().unchecked_ref()));
                handlers.borrow_mut().push(closure);
            }
        });
        let handlers = handlers.into_inner();
        let _ = parts.root.class_list().remove_1("hidden");
        let _ = parts.ok.focus();

        Box::pin(async move {
            let answer = match JsFuture::from(promise).await {
                Ok(value) => value.as_bool().unwrap_or(false),
                Err(err) => {
                    log::error!("Prompt failed: {:?}", err);
                    false
                }
            };
            // Both buttons are unhooked by now
            drop(handlers);
            answer
        })
    }
}

fn fallback(message: &str, confirm: bool) -> bool {
    let Some(window) = window() else {
        return false;
    };
    if confirm {
        window.confirm_with_message(message).unwrap_or(false)
    } else {
        let _ = window.alert_with_message(message);
        true
    }
}

impl PromptService for ModalPrompts {
    fn alert(&self, message: &str, title: &str) -> PromptFuture<()> {
        let answer = self.ask(title, message, "OK", None);
        Box::pin(async move {
            answer.await;
        })
    }

    fn confirm(
        &self,
        message: &str,
        title: &str,
        ok_label: &str,
        cancel_label: &str,
    ) -> PromptFuture<bool> {
        self.ask(title, message, ok_label, Some(cancel_label))
    }
}
