use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tui_dispatch::{
    Component, EventContext, EventKind, EventRoutingState, HandlerResponse, RenderContext,
};
use tui_dispatch_components::style::BorderStyle;
use tui_dispatch_components::{
    BaseStyle, Padding, StatusBar, StatusBarHint, StatusBarItem, StatusBarProps,
    StatusBarSection, StatusBarStyle,
};

use crate::action::Action;
use crate::components::detail_view::detail_area;
use crate::components::notice_overlay::notice_area;
use crate::components::{
    CardGrid, CardGridProps, DetailView, DetailViewProps, NoticeOverlay, NoticeOverlayProps,
};
use crate::state::{AppState, Screen};

const BG_PANEL: Color = Color::Rgb(20, 32, 46);
const TEXT_MAIN: Color = Color::Rgb(232, 242, 244);
const TEXT_DIM: Color = Color::Rgb(176, 195, 207);
const ACCENT_TEAL: Color = Color::Rgb(72, 204, 184);
const ACCENT_GOLD: Color = Color::Rgb(228, 176, 88);

#[derive(tui_dispatch::ComponentId, Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PokedexComponentId {
    Search,
    Cards,
    Detail,
    Notice,
}

#[derive(tui_dispatch::BindingContext, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PokedexContext {
    Search,
    Cards,
    Detail,
    Notice,
}

impl EventRoutingState<PokedexComponentId, PokedexContext> for AppState {
    fn focused(&self) -> Option<PokedexComponentId> {
        if self.notice.is_some() {
            return Some(PokedexComponentId::Notice);
        }
        if self.search.active {
            return Some(PokedexComponentId::Search);
        }
        match self.screen {
            Screen::Detail => Some(PokedexComponentId::Detail),
            Screen::Loading | Screen::Grid | Screen::SearchResults | Screen::Empty => {
                Some(PokedexComponentId::Cards)
            }
        }
    }

    fn modal(&self) -> Option<PokedexComponentId> {
        if self.notice.is_some() {
            Some(PokedexComponentId::Notice)
        } else if self.search.active {
            Some(PokedexComponentId::Search)
        } else if self.screen == Screen::Detail {
            Some(PokedexComponentId::Detail)
        } else {
            None
        }
    }

    fn binding_context(&self, id: PokedexComponentId) -> PokedexContext {
        match id {
            PokedexComponentId::Search => PokedexContext::Search,
            PokedexComponentId::Cards => PokedexContext::Cards,
            PokedexComponentId::Detail => PokedexContext::Detail,
            PokedexComponentId::Notice => PokedexContext::Notice,
        }
    }

    fn default_context(&self) -> PokedexContext {
        PokedexContext::Cards
    }
}

pub struct PokedexUi {
    cards: CardGrid,
    detail: DetailView,
    notice: NoticeOverlay,
    status_bar: StatusBar,
}

impl Default for PokedexUi {
    fn default() -> Self {
        Self::new()
    }
}

impl PokedexUi {
    pub fn new() -> Self {
        Self {
            cards: CardGrid::new(),
            detail: DetailView,
            notice: NoticeOverlay::new(),
            status_bar: StatusBar::new(),
        }
    }

    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        state: &AppState,
        _render_ctx: RenderContext,
        event_ctx: &mut EventContext<PokedexComponentId>,
    ) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .split(area);

        if state.search.active {
            event_ctx.set_component_area(PokedexComponentId::Search, layout[0]);
        } else {
            event_ctx
                .component_areas
                .remove(&PokedexComponentId::Search);
        }
        render_header(frame, layout[0], state);
        self.render_cards(frame, layout[1], state, event_ctx);
        render_footer(frame, layout[2], state, &mut self.status_bar);

        if let Some(record) = state.detail_record() {
            event_ctx.set_component_area(PokedexComponentId::Detail, detail_area(area));
            let props = DetailViewProps {
                record,
                tab: state.detail_tab,
                position: state.detail_position(),
                is_loading_next: state.fetch_in_flight,
                spinner: state.spinner_frame(),
                is_focused: state.notice.is_none(),
            };
            self.detail.render(frame, area, props);
        } else {
            event_ctx
                .component_areas
                .remove(&PokedexComponentId::Detail);
        }

        if let Some(notice) = state.notice.as_ref() {
            event_ctx.set_component_area(PokedexComponentId::Notice, notice_area(area));
            let props = NoticeOverlayProps {
                notice,
                is_focused: true,
            };
            self.notice.render(frame, area, props);
        } else {
            event_ctx
                .component_areas
                .remove(&PokedexComponentId::Notice);
        }
    }

    fn render_cards(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        state: &AppState,
        event_ctx: &mut EventContext<PokedexComponentId>,
    ) {
        event_ctx.set_component_area(PokedexComponentId::Cards, area);
        let records = state.visible_records();
        let title = cards_title(state);
        let empty_text = empty_text(state);
        let props = CardGridProps {
            records: &records,
            selected: state.selected_card,
            is_focused: cards_focused(state),
            title: &title,
            empty_text: &empty_text,
            on_select: Action::CardSelect,
        };
        self.cards.render(frame, area, props);
    }

    pub fn handle_cards_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        let records = state.visible_records();
        let props = CardGridProps {
            records: &records,
            selected: state.selected_card,
            is_focused: cards_focused(state),
            title: "",
            empty_text: "",
            on_select: Action::CardSelect,
        };
        let actions: Vec<_> = self.cards.handle_event(event, props).into_iter().collect();
        handler_response(actions)
    }

    pub fn handle_detail_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        let Some(record) = state.detail_record() else {
            return HandlerResponse::ignored();
        };
        let props = DetailViewProps {
            record,
            tab: state.detail_tab,
            position: state.detail_position(),
            is_loading_next: state.fetch_in_flight,
            spinner: state.spinner_frame(),
            is_focused: state.notice.is_none(),
        };
        let actions: Vec<_> = self.detail.handle_event(event, props).into_iter().collect();
        handler_response(actions)
    }

    pub fn handle_notice_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        let Some(notice) = state.notice.as_ref() else {
            return HandlerResponse::ignored();
        };
        let props = NoticeOverlayProps {
            notice,
            is_focused: true,
        };
        let actions: Vec<_> = self.notice.handle_event(event, props).into_iter().collect();
        handler_response(actions)
    }

    pub fn handle_search_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        handle_search_event(event, state)
    }
}

fn cards_focused(state: &AppState) -> bool {
    state.notice.is_none()
        && !state.search.active
        && matches!(
            state.screen,
            Screen::Grid | Screen::SearchResults | Screen::Empty
        )
}

pub fn handle_search_event(event: &EventKind, _state: &AppState) -> HandlerResponse<Action> {
    let actions = match event {
        EventKind::Key(key) => match key.code {
            KeyCode::Esc => vec![Action::SearchCancel],
            KeyCode::Enter => vec![Action::SearchSubmit],
            KeyCode::Backspace => vec![Action::SearchBackspace],
            KeyCode::Char(ch) => vec![Action::SearchInput(ch)],
            _ => vec![],
        },
        _ => vec![],
    };
    handler_response(actions)
}

fn handler_response(actions: Vec<Action>) -> HandlerResponse<Action> {
    if actions.is_empty() {
        HandlerResponse::ignored()
    } else {
        HandlerResponse {
            actions,
            consumed: true,
            needs_render: false,
        }
    }
}

fn cards_title(state: &AppState) -> String {
    match state.browse_screen() {
        Screen::SearchResults => format!(
            " RESULTS \"{}\" {} ",
            state.view.search_query().unwrap_or_default(),
            state.search_matches.len()
        ),
        Screen::Empty => " RESULTS ".to_string(),
        Screen::Loading | Screen::Grid | Screen::Detail => format!(
            " CARDS {}/{} ",
            state.view.visible_count(),
            state.view.len()
        ),
    }
}

fn empty_text(state: &AppState) -> String {
    match state.browse_screen() {
        Screen::Loading => format!("{} Loading Pokémon...", state.spinner_frame()),
        Screen::Empty => format!(
            "No Pokémon found for \"{}\". Press r to show all.",
            state.view.search_query().unwrap_or_default()
        ),
        Screen::Grid | Screen::SearchResults | Screen::Detail => {
            "No Pokémon loaded.".to_string()
        }
    }
}

fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
    let title_style = Style::default()
        .fg(ACCENT_TEAL)
        .add_modifier(Modifier::BOLD);
    let total = state
        .view
        .remote_total()
        .map(|total| total.to_string())
        .unwrap_or_else(|| "?".to_string());
    let search = if state.search.active {
        format!("/{}_", state.search.query)
    } else {
        match state.view.search_query() {
            Some(query) => format!("/{query}"),
            None => "/".to_string(),
        }
    };
    let activity = if state.fetch_in_flight {
        format!("{} fetching", state.spinner_frame())
    } else {
        String::new()
    };

    let header_text = Text::from(vec![
        Line::from(vec![
            Span::styled("POKEDEX", title_style),
            Span::raw("  |  Loaded: "),
            Span::styled(
                format!("{}/{total}", state.view.len()),
                Style::default().fg(ACCENT_GOLD),
            ),
            Span::raw("  "),
            Span::styled(activity, Style::default().fg(ACCENT_TEAL)),
        ]),
        Line::from(vec![
            Span::raw("Search: "),
            Span::styled(search, Style::default().fg(ACCENT_TEAL)),
        ]),
    ]);

    let border = if state.search.active {
        ACCENT_TEAL
    } else {
        TEXT_DIM
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN))
        .border_style(Style::default().fg(border));
    frame.render_widget(Paragraph::new(header_text).block(block), area);
}

fn render_footer(frame: &mut Frame, area: Rect, state: &AppState, status_bar: &mut StatusBar) {
    let status = state.message.clone().unwrap_or_else(|| {
        if state.fetch_in_flight {
            "Loading Pokémon...".to_string()
        } else {
            String::new()
        }
    });
    let (left_hints, center_hints) = status_hints(state);
    let status_span = Span::styled(status.as_str(), Style::default().fg(ACCENT_GOLD));
    let status_items = [StatusBarItem::span(status_span)];

    let style = StatusBarStyle {
        base: BaseStyle {
            border: Some(BorderStyle {
                borders: Borders::ALL,
                style: Style::default().fg(TEXT_DIM),
                focused_style: Some(Style::default().fg(ACCENT_TEAL)),
            }),
            padding: Padding::xy(1, 0),
            bg: Some(BG_PANEL),
            fg: Some(TEXT_MAIN),
        },
        text: Style::default().fg(TEXT_DIM),
        hint_key: Style::default()
            .fg(ACCENT_TEAL)
            .add_modifier(Modifier::BOLD),
        hint_label: Style::default().fg(TEXT_DIM),
        separator: Style::default().fg(TEXT_DIM),
    };

    let props = StatusBarProps {
        left: StatusBarSection::hints(&left_hints).with_separator("  "),
        center: StatusBarSection::hints(&center_hints).with_separator("  "),
        right: StatusBarSection::items(&status_items).with_separator("  "),
        style,
        is_focused: false,
    };
    Component::<Action>::render(status_bar, frame, area, props);
}

fn status_hints(state: &AppState) -> (Vec<StatusBarHint<'static>>, Vec<StatusBarHint<'static>>) {
    if state.search.active {
        let left = vec![
            StatusBarHint::new("Enter", "Search"),
            StatusBarHint::new("Esc", "Cancel"),
            StatusBarHint::new("Bksp", "Delete"),
        ];
        return (left, Vec::new());
    }

    let mut left = Vec::new();
    match state.screen {
        Screen::Detail => {
            left.extend([
                StatusBarHint::new("h/l", "Prev/Next"),
                StatusBarHint::new("Tab", "View"),
                StatusBarHint::new("Esc", "Close"),
            ]);
        }
        Screen::Grid => {
            left.extend([
                StatusBarHint::new("j/k", "Move"),
                StatusBarHint::new("Enter", "More info"),
            ]);
            if state.can_load_more() {
                left.push(StatusBarHint::new("m", "Load more"));
            }
        }
        Screen::SearchResults => {
            left.extend([
                StatusBarHint::new("j/k", "Move"),
                StatusBarHint::new("Enter", "More info"),
                StatusBarHint::new("r", "Show all"),
            ]);
        }
        Screen::Empty => {
            left.push(StatusBarHint::new("r", "Show all"));
        }
        Screen::Loading => {}
    }

    let mut center = Vec::new();
    if state.can_search() {
        center.push(StatusBarHint::new("/", "Search"));
    }
    center.push(StatusBarHint::new("q", "Quit"));
    (left, center)
}
