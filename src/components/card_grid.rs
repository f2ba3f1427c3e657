use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use tui_dispatch::EventKind;
use tui_dispatch_components::{
    BaseStyle, Padding, SelectList, SelectListBehavior, SelectListProps, SelectListStyle,
    SelectionStyle,
};

use super::{type_color, Component};
use crate::action::Action;
use crate::state::Record;

const BG_PANEL: Color = Color::Rgb(20, 32, 46);
const BG_HIGHLIGHT: Color = Color::Rgb(28, 92, 110);
const TEXT_MAIN: Color = Color::Rgb(232, 242, 244);
const TEXT_DIM: Color = Color::Rgb(176, 195, 207);
const ACCENT_GOLD: Color = Color::Rgb(228, 176, 88);

/// Summary cards for the visible subset, one row per record.
pub struct CardGrid {
    list: SelectList,
}

impl Default for CardGrid {
    fn default() -> Self {
        Self {
            list: SelectList::new(),
        }
    }
}

pub struct CardGridProps<'a> {
    pub records: &'a [&'a Record],
    pub selected: usize,
    pub is_focused: bool,
    pub title: &'a str,
    /// Shown instead of the list when there is nothing to show.
    pub empty_text: &'a str,
    pub on_select: fn(usize) -> Action,
}

impl CardGrid {
    pub fn new() -> Self {
        Self::default()
    }

    fn card_items(records: &[&Record]) -> Vec<Line<'static>> {
        records.iter().map(|record| card_line(record)).collect()
    }

    fn list_style() -> SelectListStyle {
        SelectListStyle {
            base: BaseStyle {
                border: None,
                padding: Padding::xy(1, 0),
                bg: Some(BG_PANEL),
                fg: Some(TEXT_MAIN),
            },
            selection: SelectionStyle {
                style: Some(
                    Style::default()
                        .bg(BG_HIGHLIGHT)
                        .fg(TEXT_MAIN)
                        .add_modifier(Modifier::BOLD),
                ),
                marker: None,
                disabled: false,
            },
            ..SelectListStyle::default()
        }
    }
}

fn card_line(record: &Record) -> Line<'static> {
    let mut spans = vec![
        Span::styled(
            format!("#{:03} ", record.id),
            Style::default().fg(TEXT_DIM),
        ),
        Span::styled(
            format!("{:<14}", record.display_name()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ];
    for type_name in &record.types {
        spans.push(Span::styled(
            format!(" {type_name} "),
            Style::default().fg(type_color(type_name)),
        ));
    }
    spans.push(Span::styled(
        format!("  {}", record.stat_total()),
        Style::default().fg(ACCENT_GOLD),
    ));
    Line::from(spans)
}

impl Component<Action> for CardGrid {
    type Props<'a> = CardGridProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = Action> {
        if !props.is_focused {
            return Vec::new();
        }
        let EventKind::Key(key) = event else {
            return Vec::new();
        };

        match key.code {
            KeyCode::Enter => props
                .records
                .get(props.selected)
                .map(|record| vec![Action::DetailOpen(record.id)])
                .unwrap_or_default(),
            KeyCode::Char('m') => vec![Action::LoadMore],
            KeyCode::Char('r') => vec![Action::ResetToStart],
            _ => {
                if props.records.is_empty() {
                    return Vec::new();
                }
                let items = Self::card_items(props.records);
                let list_props = SelectListProps {
                    items: &items,
                    count: items.len(),
                    selected: props.selected.min(items.len().saturating_sub(1)),
                    is_focused: true,
                    style: Self::list_style(),
                    behavior: SelectListBehavior {
                        show_scrollbar: true,
                        wrap_navigation: false,
                    },
                    on_select: props.on_select,
                    render_item: &|item| item.clone(),
                };
                self.list
                    .handle_event(event, list_props)
                    .into_iter()
                    .collect()
            }
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(props.title)
            .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if props.records.is_empty() {
            frame.render_widget(
                Paragraph::new(props.empty_text)
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(TEXT_DIM))
                    .wrap(Wrap { trim: true }),
                inner,
            );
            return;
        }

        let items = Self::card_items(props.records);
        let list_props = SelectListProps {
            items: &items,
            count: items.len(),
            selected: props.selected.min(items.len().saturating_sub(1)),
            is_focused: props.is_focused,
            style: Self::list_style(),
            behavior: SelectListBehavior {
                show_scrollbar: true,
                wrap_navigation: false,
            },
            on_select: props.on_select,
            render_item: &|item| item.clone(),
        };
        self.list.render(frame, inner, list_props);
    }
}
