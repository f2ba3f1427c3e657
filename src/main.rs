//! Pokedex TUI - paginated PokeAPI browser

use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tui_dispatch::{
    EffectContext, EffectStoreLike, EffectStoreWithMiddleware, EventBus, EventKind,
    HandlerResponse, Keybindings, TaskKey,
};
use tui_dispatch_debug::debug::DebugLayer;
use tui_dispatch_debug::{
    DebugCliArgs, DebugRunOutput, DebugSession, DebugSessionError, ReplayItem,
};

use pokedex::action::Action;
use pokedex::api::{self, CatalogConfig, DEFAULT_CATALOG_URL};
use pokedex::effect::Effect;
use pokedex::logging;
use pokedex::reducer::reducer;
use pokedex::state::{
    AppState, BrowseSettings, DEFAULT_PAGE_SIZE, DEFAULT_SEARCH_LIMIT, LOADING_TICK_MS,
};
use pokedex::ui::{PokedexComponentId, PokedexContext, PokedexUi};

/// Pokedex TUI - browse the PokeAPI catalog page by page
#[derive(Parser, Debug)]
#[command(name = "pokedex")]
#[command(about = "Paginated Pokedex browser for the terminal")]
struct Args {
    /// Catalog listing endpoint
    #[arg(long, default_value = DEFAULT_CATALOG_URL)]
    catalog_url: String,

    /// Records fetched and revealed per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, value_parser = clap::value_parser!(u64).range(1..=200).map(|n| n as usize))]
    page_size: usize,

    /// Maximum number of search results
    #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT, value_parser = clap::value_parser!(u64).range(1..).map(|n| n as usize))]
    search_limit: usize,

    /// Concurrent detail requests per page (defaults to the page size)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..).map(|n| n as usize))]
    max_in_flight: Option<usize>,

    /// Directory for pokedex.log
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(flatten)]
    debug: DebugCliArgs,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let Args {
        catalog_url,
        page_size,
        search_limit,
        max_in_flight,
        log_dir,
        debug: debug_args,
    } = Args::parse();

    // ===== Logging =====
    let log_dir = log_dir.unwrap_or_else(logging::default_log_dir);
    let _log_guard = logging::init_or_warn(&log_dir);

    let client = api::configure(CatalogConfig {
        catalog_url,
        max_in_flight,
    });
    tracing::info!(
        catalog_url = %client.config().catalog_url,
        page_size,
        search_limit,
        max_in_flight = ?client.config().max_in_flight,
        "starting pokedex"
    );

    // ===== Store =====
    let debug = DebugSession::new(debug_args);
    let settings = BrowseSettings {
        page_size,
        search_limit,
    };

    let state = debug
        .load_state_or_else_async(move || async move {
            Ok::<AppState, io::Error>(AppState::new(settings))
        })
        .await
        .map_err(debug_error)?;
    let replay_actions = debug.load_replay_items().map_err(debug_error)?;
    let (middleware, recorder) = debug.middleware_with_recorder();
    let store = EffectStoreWithMiddleware::new(state, reducer, middleware);

    // ===== Terminal setup =====
    let use_alt_screen = debug.use_alt_screen();
    let mut stdout = io::stdout();
    if use_alt_screen {
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &debug, store, replay_actions).await;

    // ===== Cleanup =====
    if use_alt_screen {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
    }

    let run_output = result?;
    run_output.write_render_output()?;
    debug.save_actions(recorder.as_ref()).map_err(debug_error)?;
    tracing::info!("pokedex exited");
    Ok(())
}

fn debug_error(error: DebugSessionError) -> io::Error {
    io::Error::other(format!("debug session error: {error}"))
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    debug: &DebugSession,
    store: impl EffectStoreLike<AppState, Action, Effect>,
    replay_actions: Vec<ReplayItem<Action>>,
) -> io::Result<DebugRunOutput<AppState>> {
    let ui = Rc::new(RefCell::new(PokedexUi::new()));
    let mut bus: EventBus<AppState, Action, PokedexComponentId, PokedexContext> =
        EventBus::new();
    let keybindings: Keybindings<PokedexContext> = Keybindings::new();

    let ui_cards = Rc::clone(&ui);
    bus.register(PokedexComponentId::Cards, move |event, state| {
        ui_cards
            .borrow_mut()
            .handle_cards_event(&event.kind, state)
    });

    let ui_detail = Rc::clone(&ui);
    bus.register(PokedexComponentId::Detail, move |event, state| {
        ui_detail
            .borrow_mut()
            .handle_detail_event(&event.kind, state)
    });

    let ui_notice = Rc::clone(&ui);
    bus.register(PokedexComponentId::Notice, move |event, state| {
        ui_notice
            .borrow_mut()
            .handle_notice_event(&event.kind, state)
    });

    let ui_search = Rc::clone(&ui);
    bus.register(PokedexComponentId::Search, move |event, state| {
        ui_search
            .borrow_mut()
            .handle_search_event(&event.kind, state)
    });

    // Resize redraws; q and / work from any non-text context
    bus.register_global(|event, state| match event.kind {
        EventKind::Resize(width, height) => {
            HandlerResponse::action(Action::UiTerminalResize(width, height)).with_render()
        }
        EventKind::Key(key) => match key.code {
            crossterm::event::KeyCode::Char('q')
                if !state.search.active && state.notice.is_none() =>
            {
                HandlerResponse::action(Action::Quit)
            }
            crossterm::event::KeyCode::Char('/') if !state.search.active && state.can_search() => {
                HandlerResponse::action(Action::SearchStart)
            }
            _ => HandlerResponse::ignored(),
        },
        _ => HandlerResponse::ignored(),
    });

    debug
        .run_effect_app_with_bus(
            terminal,
            store,
            DebugLayer::simple(),
            replay_actions,
            Some(Action::Init),
            Some(Action::Quit),
            |runtime| {
                if debug.render_once() {
                    return;
                }
                runtime.subscriptions().interval(
                    "tick",
                    Duration::from_millis(LOADING_TICK_MS),
                    || Action::Tick,
                );
            },
            &mut bus,
            &keybindings,
            |frame, area, state, render_ctx, event_ctx| {
                ui.borrow_mut()
                    .render(frame, area, state, render_ctx, event_ctx);
            },
            |action| matches!(action, Action::Quit),
            handle_effect,
        )
        .await
}

/// Handle effects by spawning tasks
fn handle_effect(effect: Effect, ctx: &mut EffectContext<Action>) {
    match effect {
        Effect::FetchPage { offset, limit } => {
            ctx.tasks().spawn(TaskKey::new("catalog_page"), async move {
                match api::catalog().load_page(offset, limit).await {
                    Ok(page) => Action::PageDidLoad(page),
                    Err(error) => {
                        tracing::warn!(offset, limit, url = error.url(), %error, "page load failed");
                        Action::PageDidError(error.to_string())
                    }
                }
            });
        }
    }
}
