use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
    Frame,
};
use tui_dispatch::EventKind;
use tui_dispatch_components::centered_rect;

use super::{type_color, Component};
use crate::action::Action;
use crate::state::{DetailTab, Record};

const BG_PANEL_ALT: Color = Color::Rgb(26, 40, 58);
const TEXT_MAIN: Color = Color::Rgb(232, 242, 244);
const TEXT_DIM: Color = Color::Rgb(176, 195, 207);
const ACCENT_TEAL: Color = Color::Rgb(72, 204, 184);
const ACCENT_GOLD: Color = Color::Rgb(228, 176, 88);

/// Bar width for the highest base stat any creature has.
const STAT_BAR_MAX: u16 = 255;

/// Overlay for one record with paged sub-views and prev/next navigation.
#[derive(Default)]
pub struct DetailView;

pub struct DetailViewProps<'a> {
    pub record: &'a Record,
    pub tab: DetailTab,
    /// `(current, loaded)` for the counter.
    pub position: Option<(usize, usize)>,
    pub is_loading_next: bool,
    pub spinner: char,
    pub is_focused: bool,
}

/// Overlay size inside the terminal area.
pub fn detail_area(area: Rect) -> Rect {
    centered_rect(
        area.width.saturating_sub(8).clamp(20, 72),
        area.height.saturating_sub(4).clamp(8, 20),
        area,
    )
}

impl Component<Action> for DetailView {
    type Props<'a> = DetailViewProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = Action> {
        if !props.is_focused {
            return None;
        }

        match event {
            EventKind::Key(key) => match key.code {
                KeyCode::Esc | KeyCode::Backspace => Some(Action::DetailClose),
                KeyCode::Right | KeyCode::Char('l') => Some(Action::DetailNext),
                KeyCode::Left | KeyCode::Char('h') => Some(Action::DetailPrev),
                KeyCode::Tab => Some(Action::DetailTabNext),
                KeyCode::BackTab => Some(Action::DetailTabPrev),
                KeyCode::Char('1') => Some(Action::DetailTabSet(DetailTab::About)),
                KeyCode::Char('2') => Some(Action::DetailTabSet(DetailTab::BaseStats)),
                KeyCode::Char('3') => Some(Action::DetailTabSet(DetailTab::Shiny)),
                _ => None,
            },
            _ => None,
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        let overlay = detail_area(area);
        frame.render_widget(Clear, overlay);

        let record = props.record;
        let title = Line::from(vec![
            Span::styled(
                format!(" #{:03} ", record.id),
                Style::default().fg(TEXT_DIM),
            ),
            Span::styled(
                format!("{} ", record.display_name()),
                Style::default()
                    .fg(ACCENT_TEAL)
                    .add_modifier(Modifier::BOLD),
            ),
        ]);
        let border_color = record.primary_type().map(type_color).unwrap_or(TEXT_DIM);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(border_color))
            .style(Style::default().bg(BG_PANEL_ALT).fg(TEXT_MAIN));
        let inner = block.inner(overlay);
        frame.render_widget(block, overlay);

        let layout = Layout::vertical([
            Constraint::Length(1), // Types
            Constraint::Length(2), // Tabs
            Constraint::Min(3),    // Sub-view
            Constraint::Length(1), // Counter
        ])
        .split(inner);

        frame.render_widget(Paragraph::new(type_badges(record)), layout[0]);

        let tabs = Tabs::new(DetailTab::ALL.iter().map(|tab| tab.title()))
            .select(props.tab.index())
            .style(Style::default().fg(TEXT_DIM))
            .highlight_style(
                Style::default()
                    .fg(ACCENT_TEAL)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, layout[1]);

        let content = match props.tab {
            DetailTab::About => about_text(record),
            DetailTab::BaseStats => stats_text(record, layout[2].width),
            DetailTab::Shiny => shiny_text(record),
        };
        frame.render_widget(
            Paragraph::new(content)
                .style(Style::default().fg(TEXT_MAIN))
                .wrap(Wrap { trim: true }),
            layout[2],
        );

        let counter = match props.position {
            Some((current, loaded)) if props.is_loading_next => {
                format!("{} loading next  {current} / {loaded}", props.spinner)
            }
            Some((current, loaded)) => format!("{current} / {loaded}"),
            None => String::new(),
        };
        let footer = Line::from(vec![
            Span::styled("h ", Style::default().fg(ACCENT_TEAL)),
            Span::styled("prev  ", Style::default().fg(TEXT_DIM)),
            Span::styled(counter, Style::default().fg(ACCENT_GOLD)),
            Span::styled("  l ", Style::default().fg(ACCENT_TEAL)),
            Span::styled("next", Style::default().fg(TEXT_DIM)),
        ])
        .centered();
        frame.render_widget(Paragraph::new(footer), layout[3]);
    }
}

fn type_badges(record: &Record) -> Line<'static> {
    let spans: Vec<Span<'static>> = record
        .types
        .iter()
        .map(|type_name| {
            Span::styled(
                format!(" {} ", type_name.to_ascii_uppercase()),
                Style::default()
                    .fg(Color::Black)
                    .bg(type_color(type_name))
                    .add_modifier(Modifier::BOLD),
            )
        })
        .flat_map(|badge| [badge, Span::raw(" ")])
        .collect();
    Line::from(spans)
}

fn labeled(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:<10}"), Style::default().fg(TEXT_DIM)),
        Span::raw(value),
    ])
}

fn about_text(record: &Record) -> Text<'static> {
    Text::from(vec![
        labeled("Species", record.species.clone()),
        labeled("Height", format!("{:.1} m", record.height_m)),
        labeled("Weight", format!("{:.1} kg", record.weight_kg)),
        labeled("Abilities", record.abilities_text.clone()),
        labeled(
            "Sprite",
            record
                .sprite_url
                .clone()
                .unwrap_or_else(|| "none".to_string()),
        ),
    ])
}

fn stats_text(record: &Record, width: u16) -> Text<'static> {
    let bar_room = width.saturating_sub(16).max(1);
    let mut lines: Vec<Line<'static>> = record
        .stats()
        .rows()
        .iter()
        .map(|(label, value)| {
            let filled = (u32::from(*value) * u32::from(bar_room) / u32::from(STAT_BAR_MAX))
                .clamp(1, u32::from(bar_room)) as usize;
            Line::from(vec![
                Span::styled(format!("{label:<8}"), Style::default().fg(TEXT_DIM)),
                Span::raw(format!("{value:>4} ")),
                Span::styled("█".repeat(filled), Style::default().fg(stat_color(*value))),
            ])
        })
        .collect();
    lines.push(Line::from(vec![
        Span::styled(format!("{:<8}", "Total"), Style::default().fg(TEXT_DIM)),
        Span::styled(
            format!("{:>4}", record.stat_total()),
            Style::default()
                .fg(ACCENT_GOLD)
                .add_modifier(Modifier::BOLD),
        ),
    ]));
    Text::from(lines)
}

fn stat_color(value: u16) -> Color {
    match value {
        0..=49 => Color::Rgb(240, 128, 48),
        50..=89 => Color::Rgb(248, 208, 48),
        90..=119 => Color::Rgb(120, 200, 80),
        _ => Color::Rgb(72, 204, 184),
    }
}

fn shiny_text(record: &Record) -> Text<'static> {
    match record.shiny_sprite_url.as_deref() {
        Some(url) => Text::from(vec![
            Line::from(Span::styled(
                format!("Shiny {}", record.display_name()),
                Style::default()
                    .fg(ACCENT_GOLD)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(url.to_string()),
        ]),
        None => Text::from(Line::from(Span::styled(
            "No shiny artwork available.",
            Style::default().fg(TEXT_DIM),
        ))),
    }
}
