//! GridLuck entry point
//!
//! Native: a headless demo that lets the autopilot play a seeded run.
//! Web: keyboard input, Web Audio and a DOM HUD driven by requestAnimationFrame.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    use gridluck::audio::AudioManager;
    use gridluck::consts::MAX_FRAME_MS;
    use gridluck::input::{Action, ActionState};
    use gridluck::persistence::LocalStore;
    use gridluck::session::Renderer;
    use gridluck::sim::GameState;
    use gridluck::Session;

    /// Writes the HUD line into `#hud`
    struct DomHud {
        last: String,
    }

    impl Renderer for DomHud {
        fn render(&mut self, state: &GameState, _timestamp: f64) {
            if state.hud == self.last {
                return;
            }
            self.last.clone_from(&state.hud);
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            if let Some(el) = document.get_element_by_id("hud") {
                el.set_text_content(Some(&state.hud));
            }
            if let Some(el) = document.get_element_by_id("game-over") {
                let class = if state.is_game_over() { "" } else { "hidden" };
                let _ = el.set_attribute("class", class);
            }
        }
    }

    /// Game instance holding all state
    struct Game {
        session: Session,
        input: ActionState,
        hud: DomHud,
        last_time: f64,
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            return;
        }
        log::info!("GridLuck starting...");

        let seed = js_sys::Date::now() as u64;
        let audio = AudioManager::new();
        let session = Session::new(seed, Box::new(LocalStore), Box::new(audio));
        log::info!("Game initialized with seed: {}", seed);

        let game = Rc::new(RefCell::new(Game {
            session,
            input: ActionState::default(),
            hud: DomHud { last: String::new() },
            last_time: 0.0,
        }));

        fit_viewport(&game);
        setup_input_handlers(game.clone());
        request_animation_frame(game);
        log::info!("GridLuck running!");
    }

    /// Size the camera to the browser window
    fn fit_viewport(game: &Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let width = window.inner_width().ok().and_then(|v| v.as_f64());
        let height = window.inner_height().ok().and_then(|v| v.as_f64());
        if let (Some(w), Some(h)) = (width, height) {
            game.borrow_mut().session.resize(w as f32, h as f32);
        }
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "i" | "I" => {
                        let idle = !g.session.idle_mode();
                        g.session.set_idle_mode(idle);
                    }
                    "r" | "R" if !g.session.is_running() => {
                        g.session.restart(js_sys::Date::now() as u64);
                    }
                    key => {
                        if let Some(action) = Action::for_key(key) {
                            event.prevent_default();
                            g.input.press(action);
                        }
                    }
                }
            });
            let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                if let Some(action) = Action::for_key(&event.key()) {
                    game.borrow_mut().input.release(action);
                }
            });
            let _ = window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                fit_viewport(&game);
            });
            let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window blur: forget held keys
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().input.clear();
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) as f32).min(MAX_FRAME_MS)
            } else {
                0.0
            };
            g.last_time = time;

            let Game { session, input, hud, .. } = &mut *g;
            session.update(dt, input);
            session.draw(hud, time);
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use gridluck::audio::LogSink;
    use gridluck::input::ActionState;
    use gridluck::persistence::FileStore;
    use gridluck::session::TextRenderer;
    use gridluck::Session;

    /// Simulated frame length and run length for the demo
    const FRAME_MS: f32 = 1000.0 / 60.0;
    const DEMO_MS: f32 = 120_000.0;

    env_logger::init();
    log::info!("GridLuck (native) starting...");

    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<u64>().ok())
        .unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0)
        });
    let store_path = std::env::var("GRIDLUCK_STORE").unwrap_or_else(|_| "gridluck_save.json".to_string());

    let mut session = Session::new(seed, Box::new(FileStore::open(store_path)), Box::new(LogSink::default()));
    session.set_idle_mode(true);

    let mut input = ActionState::default();
    let mut renderer = TextRenderer::default();
    let mut elapsed = 0.0;
    while session.is_running() && elapsed < DEMO_MS {
        session.update(FRAME_MS, &mut input);
        elapsed += FRAME_MS;
        session.draw(&mut renderer, elapsed as f64);
    }

    let state = session.state();
    println!("Seed {}: {}", seed, renderer.last_line());
    println!(
        "Dots {}, ghosts {}, items {}, doors {}, zones {}",
        state.stats.dots_eaten,
        state.stats.ghosts_eaten,
        state.stats.items_collected,
        state.stats.doors_unlocked,
        state.stats.zones_explored.len()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
