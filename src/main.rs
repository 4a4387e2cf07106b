//! Rally Reflex entry point
//!
//! On the web, wires the current page (landing, game or rating) to the game
//! library. Natively, plays a short scripted game headlessly.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use wasm_bindgen::JsCast;
    use web_sys::{Element, Event, HtmlElement, HtmlInputElement, KeyboardEvent, MouseEvent};

    use rally_reflex::Preferences;
    use rally_reflex::persistence::{self, KeyValueStore};
    use rally_reflex::platform::web::{
        self, IntervalTimers, ModalPrompts, RafScheduler, element_by_id,
    };
    use rally_reflex::platform::{FrameId, Route, TimerId, navigation};
    use rally_reflex::rating::{self, RatingTable};
    use rally_reflex::renderer::dom::DomView;
    use rally_reflex::renderer::markup::TRACK_CANVAS_ID;
    use rally_reflex::sim::{
        Game, GameConfig, GameEvent, InputEvent, Key, Target, settle_next_prompt,
    };

    /// Game page state shared by every callback
    struct App {
        game: RefCell<Game>,
        view: RefCell<DomView>,
        prompts: ModalPrompts,
        settling: Cell<bool>,
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        let page = web::document()
            .and_then(|doc| doc.body())
            .and_then(|body| body.get_attribute("data-page"))
            .and_then(|name| Route::from_page_name(&name));
        log::info!("Rally Reflex starting on {:?}", page);

        set_footer_year();
        match page {
            Some(Route::Home) => run_home_page(),
            Some(Route::Game) => run_game_page(),
            Some(Route::Rating) => run_rating_page(),
            None => log::warn!("Page has no known data-page attribute"),
        }
    }

    fn set_footer_year() {
        if let Some(el) = element_by_id("year") {
            let year = js_sys::Date::new_0().get_full_year();
            el.set_text_content(Some(&year.to_string()));
        }
    }

    // === Landing page ===

    fn run_home_page() {
        show_section();
        if let Some(window) = web::window() {
            web::listen::<Event, _>(&window, "hashchange", |_| show_section());
        }

        let store = persistence::open_default();
        let prefs = Preferences::load(&store);
        if let Some(input) = input_by_id("player-name") {
            input.set_value(&prefs.player_name);
        }
        if let Some(input) = input_by_id("start-level") {
            input.set_value(&prefs.start_level.to_string());
        }

        let Some(form) = element_by_id("player-form") else {
            return;
        };
        let store = RefCell::new(store);
        web::listen::<Event, _>(&form, "submit", move |ev| {
            ev.prevent_default();
            let mut prefs = Preferences::load(&*store.borrow());
            let name = input_by_id("player-name")
                .map(|i| i.value())
                .unwrap_or_default();
            if !prefs.set_player_name(&name) {
                set_text("player-error", "Please enter your name.");
                return;
            }
            if let Some(level) = input_by_id("start-level").and_then(|i| i.value().parse().ok()) {
                prefs.set_start_level(level);
            }
            if let Err(err) = prefs.save(&mut *store.borrow_mut()) {
                log::warn!("Failed to save preferences: {}", err);
            }
            web::navigate(Route::Game);
        });
    }

    /// Show the landing section named by the location hash
    fn show_section() {
        let Some(doc) = web::document() else {
            return;
        };
        let hash = doc.location().and_then(|l| l.hash().ok()).unwrap_or_default();
        let section = navigation::section_for_hash(&hash);

        if let Ok(routes) = doc.query_selector_all(".route") {
            for i in 0..routes.length() {
                let Some(el) = routes.get(i).and_then(|n| n.dyn_into::<HtmlElement>().ok()) else {
                    continue;
                };
                let route = el.get_attribute("data-route").unwrap_or_default();
                el.set_hidden(navigation::section_for_hash(&route) != section);
            }
        }
        if let Ok(links) = doc.query_selector_all(".site-nav a[data-link]") {
            for i in 0..links.length() {
                let Some(el) = links.get(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                    continue;
                };
                let href = el.get_attribute("href").unwrap_or_default();
                let active = navigation::section_for_hash(&href) == section;
                let _ = el.class_list().toggle_with_force("is-active", active);
            }
        }
    }

    // === Game page ===

    fn run_game_page() {
        let store = persistence::open_default();
        let prefs = Preferences::load(&store);
        if !prefs.has_player() {
            log::info!("No player name stored, back to the landing page");
            web::navigate(Route::Home);
            return;
        }

        let frames = RafScheduler::new();
        let frame_sink = frames.sink();
        let timers = IntervalTimers::new();
        let tick_sink = timers.sink();

        let (width, height) = viewport();
        let config = GameConfig {
            viewport_width: width,
            viewport_height: height,
            ..GameConfig::from_preferences(&prefs, js_sys::Date::now() as u64)
        };
        let game = Game::new(config, Box::new(frames), Box::new(timers), Box::new(store));

        let app = Rc::new(App {
            game: RefCell::new(game),
            view: RefCell::new(DomView::new()),
            prompts: ModalPrompts::new(),
            settling: Cell::new(false),
        });
        app.view.borrow().set_player(&prefs.player_name);

        {
            let app = app.clone();
            *frame_sink.borrow_mut() = Some(Rc::new(move |(id, timestamp): (FrameId, f64)| {
                app.game.borrow_mut().on_frame(id, timestamp);
                sync(&app);
            }));
        }
        {
            let app = app.clone();
            *tick_sink.borrow_mut() = Some(Rc::new(move |id: TimerId| {
                app.game.borrow_mut().on_countdown_tick(id);
                sync(&app);
            }));
        }

        setup_keyboard(app.clone());
        setup_pointer(app.clone());
        setup_buttons(app.clone());

        if let Some(window) = web::window() {
            let app = app.clone();
            web::listen::<Event, _>(&window, "resize", move |_| {
                let (w, h) = viewport();
                app.game.borrow_mut().set_viewport(w, h);
            });
        }

        app.game.borrow_mut().start_level();
        sync(&app);
        log::info!("Rally Reflex running!");
    }

    /// Space available to the level 3 canvas
    fn viewport() -> (f32, f32) {
        let Some(window) = web::window() else {
            return (0.0, 0.0);
        };
        let px = |v: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
            v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as f32
        };
        // Round area width once laid out, else the window
        let width = element_by_id("game-area")
            .map(|el| el.client_width() as f32)
            .filter(|w| *w > 0.0)
            .unwrap_or_else(|| px(window.inner_width()));
        (width, px(window.inner_height()))
    }

    /// Push game notifications to the page and show any pending prompt
    fn sync(app: &Rc<App>) {
        let events = app.game.borrow_mut().drain_events();
        {
            let game = app.game.borrow();
            let mut view = app.view.borrow_mut();
            for event in &events {
                view.apply(&game, event);
            }
            view.refresh(&game);
            view.sync_buttons(&game);
        }
        for event in events {
            if let GameEvent::Navigate(route) = event {
                web::navigate(route);
            }
        }

        if app.settling.get() || app.game.borrow().pending_prompt().is_none() {
            return;
        }
        app.settling.set(true);
        let app = app.clone();
        wasm_bindgen_futures::spawn_local(async move {
            settle_next_prompt(&app.game, &app.prompts).await;
            app.settling.set(false);
            sync(&app);
        });
    }

    fn send(app: &Rc<App>, event: InputEvent) {
        app.game.borrow_mut().handle_input(event);
        sync(app);
    }

    fn setup_keyboard(app: Rc<App>) {
        let Some(window) = web::window() else {
            return;
        };
        {
            let app = app.clone();
            web::listen::<KeyboardEvent, _>(&window, "keydown", move |ev| {
                let key = Key::from_dom(&ev.key());
                let prompt_open = app.game.borrow().pending_prompt().is_some();
                // Keep the page from scrolling while driving
                if !prompt_open && (key.is_direction() || key == Key::Space) {
                    ev.prevent_default();
                }
                send(&app, InputEvent::KeyDown(key));
            });
        }
        web::listen::<KeyboardEvent, _>(&window, "keyup", move |ev| {
            send(&app, InputEvent::KeyUp(Key::from_dom(&ev.key())));
        });
    }

    /// What a click on the round area hit
    fn click_target(ev: &MouseEvent) -> Option<Target> {
        let el = ev.target()?.dyn_into::<Element>().ok()?;
        let data = |selector: &str, attr: &str| -> Option<usize> {
            el.closest(selector)
                .ok()
                .flatten()?
                .get_attribute(attr)?
                .parse()
                .ok()
        };
        if let Some(i) = data("[data-option]", "data-option") {
            return Some(Target::TimeOption(i));
        }
        if let Some(i) = data("[data-car]", "data-car") {
            return Some(Target::Car(i));
        }
        (el.id() == TRACK_CANVAS_ID).then_some(Target::Canvas)
    }

    fn on_canvas(ev: &MouseEvent) -> bool {
        ev.target()
            .and_then(|t| t.dyn_into::<Element>().ok())
            .is_some_and(|el| el.id() == TRACK_CANVAS_ID)
    }

    fn canvas_point(app: &App, ev: &MouseEvent) -> Option<glam::Vec2> {
        let view = app.view.borrow();
        view.track_canvas().map(|canvas| web::canvas_point(canvas, ev))
    }

    /// Round-area input, delegated so it survives markup rebuilds
    fn setup_pointer(app: Rc<App>) {
        let Some(area) = element_by_id("game-area") else {
            return;
        };
        {
            let app = app.clone();
            web::listen::<MouseEvent, _>(&area, "click", move |ev| {
                if let Some(target) = click_target(&ev) {
                    send(&app, InputEvent::Click(target));
                }
            });
        }
        {
            let app = app.clone();
            web::listen::<MouseEvent, _>(&area, "dblclick", move |ev| {
                if let Some(target) = click_target(&ev) {
                    send(&app, InputEvent::DoubleClick(target));
                }
            });
        }
        {
            let app = app.clone();
            web::listen::<MouseEvent, _>(&area, "mousedown", move |ev| {
                if on_canvas(&ev) {
                    if let Some(p) = canvas_point(&app, &ev) {
                        send(&app, InputEvent::PointerDown(p));
                    }
                }
            });
        }
        {
            let app = app.clone();
            web::listen::<MouseEvent, _>(&area, "mousemove", move |ev| {
                if on_canvas(&ev) {
                    if let Some(p) = canvas_point(&app, &ev) {
                        send(&app, InputEvent::PointerMove(p));
                    }
                }
            });
        }
        {
            let app = app.clone();
            web::listen::<MouseEvent, _>(&area, "mouseout", move |ev| {
                if on_canvas(&ev) {
                    send(&app, InputEvent::PointerLeave);
                }
            });
        }
        if let Some(doc) = web::document() {
            web::listen::<MouseEvent, _>(&doc, "mouseup", move |_| {
                send(&app, InputEvent::PointerUp);
            });
        }
    }

    fn on_click(id: &'static str, app: &Rc<App>, action: fn(&mut Game) -> bool) {
        let Some(btn) = element_by_id(id) else {
            log::warn!("Missing button #{}", id);
            return;
        };
        let app = app.clone();
        web::listen::<MouseEvent, _>(&btn, "click", move |_| {
            if !action(&mut app.game.borrow_mut()) {
                log::debug!("#{} ignored in the current state", id);
            }
            sync(&app);
        });
    }

    fn setup_buttons(app: Rc<App>) {
        on_click("btn-exit", &app, Game::request_exit);
        on_click("btn-end-level", &app, Game::request_end_level);
        on_click("btn-next-level", &app, Game::next_level);
        on_click("btn-restart-level", &app, Game::restart_level);
    }

    // === Rating page ===

    fn run_rating_page() {
        let store = persistence::open_default();
        render_last_game(&store);
        render_rating(&RatingTable::load(&store));
    }

    fn render_last_game(store: &dyn KeyValueStore) {
        let Some(block) = element_by_id("last-game-content") else {
            return;
        };
        block.set_inner_html("");
        let lines = match rating::last_game_result(store) {
            Some(result) => vec![
                format!("Player: {}", result.name),
                format!("Final score: {} points", result.total_score),
                format!("Date: {}", rating::format_date(result.date, js_sys::Date::now())),
            ],
            None => vec!["No games yet. Play one to get into the rating.".to_string()],
        };
        for line in lines {
            append_text(&block, "p", &line);
        }
    }

    fn render_rating(table: &RatingTable) {
        let Some(tbody) = web::document()
            .and_then(|doc| doc.query_selector("#rating-table tbody").ok().flatten())
        else {
            return;
        };
        tbody.set_inner_html("");

        if table.is_empty() {
            if let Some(row) = append_text(&tbody, "tr", "") {
                if let Some(cell) = append_text(&row, "td", "The rating is empty.") {
                    let _ = cell.set_attribute("colspan", "5");
                }
            }
            return;
        }

        let now = js_sys::Date::now();
        for (i, entry) in table.entries.iter().enumerate() {
            let Some(row) = append_text(&tbody, "tr", "") else {
                continue;
            };
            let cells = [
                (i + 1).to_string(),
                entry.name.clone(),
                entry.best_score.to_string(),
                entry.last_score.to_string(),
                rating::format_date(entry.last_date, now),
            ];
            for cell in cells {
                append_text(&row, "td", &cell);
            }
        }
    }

    // === DOM helpers ===

    /// Append a child element holding plain text (never parsed as HTML)
    fn append_text(parent: &Element, tag: &str, text: &str) -> Option<Element> {
        let el = web::document()?.create_element(tag).ok()?;
        if !text.is_empty() {
            el.set_text_content(Some(text));
        }
        parent.append_child(&el).ok()?;
        Some(el)
    }

    fn input_by_id(id: &str) -> Option<HtmlInputElement> {
        element_by_id(id)?.dyn_into::<HtmlInputElement>().ok()
    }

    fn set_text(id: &str, text: &str) {
        if let Some(el) = element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_app::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Rally Reflex (native) starting...");
    log::info!("The game itself runs in the browser; playing a scripted game headlessly");

    let score = demo::play();
    println!("Scripted game finished with {} points", score);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main
}

/// Headless game with scripted input, frames and prompts
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::cell::RefCell;
    use std::future::Future;
    use std::pin::pin;
    use std::task::{Context, Poll, Waker};

    use rally_reflex::persistence::MemoryStore;
    use rally_reflex::platform::prompt::ScriptedPrompts;
    use rally_reflex::platform::{ManualFrames, ManualIntervals};
    use rally_reflex::sim::{
        Game, GameConfig, GamePhase, InputEvent, Key, Level1Phase, LevelState, settle_prompts,
    };

    const FRAME_MS: f64 = 16.0;
    const MAX_FRAMES_PER_LEVEL: usize = 20_000;

    /// Drive a future whose prompts all answer immediately
    fn block_on<F: Future>(fut: F) -> F::Output {
        let mut fut = pin!(fut);
        let mut cx = Context::from_waker(Waker::noop());
        loop {
            if let Poll::Ready(value) = fut.as_mut().poll(&mut cx) {
                return value;
            }
        }
    }

    fn needs_choice(game: &Game) -> bool {
        matches!(
            game.level_state(),
            Some(LevelState::Level1(round)) if round.phase == Level1Phase::Choice
        )
    }

    pub fn play() -> u32 {
        let frames = ManualFrames::default();
        let config = GameConfig {
            player_name: "Demo".to_string(),
            seed: 2024,
            ..GameConfig::default()
        };
        let game = RefCell::new(Game::new(
            config,
            Box::new(frames.clone()),
            Box::new(ManualIntervals::default()),
            Box::new(MemoryStore::new()),
        ));
        // Confirms are accepted, so level 3 is ended early
        let prompts = ScriptedPrompts::new(true);
        game.borrow_mut().start_level();

        let mut timestamp = 0.0;
        loop {
            for _ in 0..MAX_FRAMES_PER_LEVEL {
                if needs_choice(&game.borrow()) {
                    let mut g = game.borrow_mut();
                    g.handle_input(InputEvent::KeyDown(Key::Digit(3)));
                    g.handle_input(InputEvent::KeyDown(Key::Enter));
                    g.handle_input(InputEvent::KeyDown(Key::ArrowRight));
                }
                if matches!(game.borrow().level_state(), Some(LevelState::Level3(_))) {
                    game.borrow_mut().request_end_level();
                }
                block_on(settle_prompts(&game, &prompts));
                if game.borrow().phase() != GamePhase::Playing {
                    break;
                }
                let Some(id) = frames.next_frame() else {
                    break;
                };
                timestamp += FRAME_MS;
                game.borrow_mut().on_frame(id, timestamp);
            }
            block_on(settle_prompts(&game, &prompts));

            let mut g = game.borrow_mut();
            log::info!("Level {} over, score {}", g.session().level, g.session().score);
            if !g.next_level() {
                break;
            }
        }

        for message in prompts.shown() {
            log::info!("Prompt: {}", message);
        }
        game.borrow().session().score
    }
}
