use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use tui_dispatch::EventKind;
use tui_dispatch_components::{
    centered_rect, BaseStyle, Modal, ModalBehavior, ModalProps, ModalStyle, Padding,
};

use super::Component;
use crate::action::Action;
use crate::state::Notice;

const BG_NOTICE: Color = Color::Rgb(35, 35, 45);
const TEXT_MAIN: Color = Color::Rgb(232, 242, 244);
const TEXT_DIM: Color = Color::Rgb(176, 195, 207);
const ACCENT_RED: Color = Color::Rgb(232, 96, 88);
const ACCENT_GOLD: Color = Color::Rgb(228, 176, 88);

/// Blocking message box. Swallows every key until dismissed.
pub struct NoticeOverlay {
    modal: Modal,
}

pub struct NoticeOverlayProps<'a> {
    pub notice: &'a Notice,
    pub is_focused: bool,
}

pub fn notice_area(area: Rect) -> Rect {
    centered_rect(area.width.saturating_sub(4).min(52), 7, area)
}

impl Default for NoticeOverlay {
    fn default() -> Self {
        Self {
            modal: Modal::new(),
        }
    }
}

impl NoticeOverlay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Component<Action> for NoticeOverlay {
    type Props<'a> = NoticeOverlayProps<'a>;

    fn handle_event(
        &mut self,
        event: &EventKind,
        props: Self::Props<'_>,
    ) -> impl IntoIterator<Item = Action> {
        if !props.is_focused {
            return None;
        }
        let EventKind::Key(key) = event else {
            return None;
        };
        match key.code {
            KeyCode::Char('r') if props.notice.can_retry() => Some(Action::Retry),
            KeyCode::Char('q') => Some(Action::Quit),
            _ => Some(Action::NoticeDismiss),
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, props: Self::Props<'_>) {
        if area.width < 16 || area.height < 7 {
            return;
        }

        let notice = props.notice;
        let accent = if notice.can_retry() {
            ACCENT_RED
        } else {
            ACCENT_GOLD
        };
        let hint = if notice.can_retry() {
            "r retry  any key dismiss"
        } else {
            "any key to continue"
        };

        let mut render_content = |frame: &mut Frame, content_area: Rect| {
            let chunks = Layout::vertical([
                Constraint::Length(1), // Title
                Constraint::Min(1),    // Message
                Constraint::Length(1), // Hint
            ])
            .split(content_area);

            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    notice.title(),
                    Style::default().fg(accent).add_modifier(Modifier::BOLD),
                )))
                .alignment(Alignment::Center),
                chunks[0],
            );
            frame.render_widget(
                Paragraph::new(notice.text())
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(TEXT_MAIN))
                    .wrap(Wrap { trim: true }),
                chunks[1],
            );
            frame.render_widget(
                Paragraph::new(hint)
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(TEXT_DIM)),
                chunks[2],
            );
        };

        self.modal.render(
            frame,
            area,
            ModalProps {
                is_open: true,
                is_focused: props.is_focused,
                area: notice_area(area),
                style: ModalStyle {
                    base: BaseStyle {
                        bg: Some(BG_NOTICE),
                        padding: Padding::xy(1, 1),
                        border: None,
                        fg: None,
                    },
                    ..Default::default()
                },
                behavior: ModalBehavior::default(),
                on_close: || Action::NoticeDismiss,
                render_content: &mut render_content,
            },
        );
    }
}
