// SPDX-License-Identifier: GPL-3.0-only

//! Terminal kiosk
//!
//! Renders the composited booth feed with Unicode half-block characters next
//! to the photo roll, share panel and session log. The terminal loop only
//! reads the engine's published view and sends commands; it never touches
//! engine state directly.

use crate::constants::render::{COLOR_IDLE, COLOR_SMILING};
use crate::engine::{BoothCommand, BoothHandle, BoothView, ErrorView};
use crate::gallery::PhotoStatus;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::RgbaImage;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Gauge, List, ListItem, Paragraph, Widget, Wrap},
};
use std::io::{self, stdout};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Width of the roll/share/log column
const SIDE_PANEL_WIDTH: u16 = 44;

/// What a key press asks for
#[derive(Debug, Clone, PartialEq)]
enum KeyAction {
    Command(BoothCommand),
    ToggleHelp,
    Quit,
    Ignore,
}

/// Run the terminal kiosk until the user quits or the engine stops
pub fn run(handle: BoothHandle) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &handle);
    handle.shutdown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    handle: &BoothHandle,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut frames = handle.subscribe_frames();
    let mut frame_widget = FrameWidget::new();
    let mut show_help = false;

    while handle.context().is_active() {
        if frames.has_changed().unwrap_or(false) {
            frame_widget.update_frame(frames.borrow_and_update().clone());
        }

        let view = handle.view();
        terminal.draw(|f| draw(f, &frame_widget, &view, show_help))?;

        if event::poll(Duration::from_millis(16))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match action_for_key(key) {
                KeyAction::Command(command) => {
                    show_help = false;
                    if !handle.send(command) {
                        break;
                    }
                }
                KeyAction::ToggleHelp => show_help = !show_help,
                KeyAction::Quit => {
                    info!("Quit requested from terminal");
                    break;
                }
                KeyAction::Ignore => {}
            }
        }
    }

    Ok(())
}

fn action_for_key(key: KeyEvent) -> KeyAction {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return KeyAction::Quit;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Left => KeyAction::Command(BoothCommand::SelectPrevious),
        KeyCode::Right => KeyAction::Command(BoothCommand::SelectNext),
        KeyCode::Char('c') => KeyAction::Command(BoothCommand::ClearSelection),
        KeyCode::Char('r') => KeyAction::Command(BoothCommand::RetrySelectedUpload),
        KeyCode::Char('i') => KeyAction::Command(BoothCommand::RetryInitialization),
        KeyCode::Char('h') => KeyAction::ToggleHelp,
        _ => KeyAction::Ignore,
    }
}

fn draw(f: &mut Frame, frame_widget: &FrameWidget, view: &BoothView, show_help: bool) {
    let [main, status_area] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(f.area());
    let [camera_column, side] = Layout::horizontal([
        Constraint::Min(20),
        Constraint::Length(SIDE_PANEL_WIDTH),
    ])
    .areas(main);
    let [camera_area, hold_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(camera_column);

    f.render_widget(frame_widget, camera_area);
    if let Some(error) = &view.error {
        let area = centered(camera_area, 56, 7);
        f.render_widget(Clear, area);
        f.render_widget(ErrorPanel { error }, area);
    }
    render_hold_line(f, hold_area, view);

    let [roll_area, share_area, log_area] = Layout::vertical([
        Constraint::Percentage(35),
        Constraint::Length(9),
        Constraint::Min(4),
    ])
    .areas(side);
    render_roll(f, roll_area, view);
    render_share(f, share_area, view);
    render_log(f, log_area, view);

    let message = if show_help {
        help_message()
    } else {
        status_message(view)
    };
    f.render_widget(StatusBar { message: &message }, status_area);
}

fn render_hold_line(f: &mut Frame, area: Rect, view: &BoothView) {
    if view.locked {
        let text = format!(" COOLDOWN {}s ", view.lockout_remaining);
        f.render_widget(
            Paragraph::new(text).style(Style::default().fg(Color::Black).bg(Color::Yellow)),
            area,
        );
        return;
    }

    let label = match &view.hint {
        Some(hint) => format!("{} {}%", hint, view.hold_progress),
        None => format!("{}%", view.hold_progress),
    };
    let [r, g, b] = COLOR_IDLE;
    f.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(Color::Rgb(r, g, b)).bg(Color::Black))
            .percent(u16::from(view.hold_progress.min(100)))
            .label(label),
        area,
    );
}

fn render_roll(f: &mut Frame, area: Rect, view: &BoothView) {
    let items: Vec<ListItem> = view
        .photos
        .iter()
        .map(|photo| {
            let selected = view.selected == Some(photo.id);
            let marker = if selected { "> " } else { "  " };
            let style = if selected {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{}{} ", marker, photo.label), style),
                Span::styled(photo.status.label(), status_style(photo.status)),
            ]))
        })
        .collect();

    let title = format!(" ROLL ({}) ", view.photos.len());
    f.render_widget(List::new(items).block(Block::bordered().title(title)), area);
}

fn render_share(f: &mut Frame, area: Rect, view: &BoothView) {
    let lines = match view.selected_photo() {
        None => vec![Line::from("No capture yet")],
        Some(photo) => {
            let mut lines = vec![
                Line::from(vec![
                    Span::raw(format!("{} ", photo.label)),
                    Span::styled(photo.status.label(), status_style(photo.status)),
                ]),
                Line::from(format!("{}  {}", photo.resolution, photo.timestamp)),
            ];
            match (&photo.share_url, &photo.qr_url) {
                (Some(url), Some(qr)) => {
                    lines.push(Line::from(format!("URL {}", url)));
                    lines.push(Line::from(format!("QR  {}", qr)));
                }
                _ if photo.status == PhotoStatus::Error => {
                    lines.push(Line::from("Upload failed, press 'r' to retry"));
                }
                _ => lines.push(Line::from("Uploading...")),
            }
            lines
        }
    };

    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::bordered().title(" SHARE ")),
        area,
    );
}

fn render_log(f: &mut Frame, area: Rect, view: &BoothView) {
    let lines: Vec<Line> = view
        .log
        .iter()
        .map(|entry| Line::from(entry.to_string()))
        .collect();
    f.render_widget(
        Paragraph::new(lines).block(Block::bordered().title(" LOG ")),
        area,
    );
}

fn status_style(status: PhotoStatus) -> Style {
    match status {
        PhotoStatus::Uploading => Style::default().fg(Color::Yellow),
        PhotoStatus::Success => Style::default().fg(Color::Green),
        PhotoStatus::Error => Style::default().fg(Color::Red),
    }
}

fn indicator(active: bool) -> &'static str {
    if active { "●" } else { "○" }
}

fn status_message(view: &BoothView) -> String {
    format!(
        "{} | HAND {} | FACE {} {:.0}% | 'h' help | 'q' quit",
        view.status,
        indicator(view.hand_active),
        indicator(view.face_active),
        view.face_score
    )
}

fn help_message() -> String {
    String::from(
        "←/→: Select photo | c: Clear selection | r: Retry upload | i: Retry init | h: Toggle help | q/Ctrl+C: Quit",
    )
}

/// Rect of at most `width` x `height` centered in `area`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Widget that renders a frame using half-block characters
struct FrameWidget {
    frame: Option<Arc<RgbaImage>>,
}

impl FrameWidget {
    fn new() -> Self {
        Self { frame: None }
    }

    fn update_frame(&mut self, frame: Option<Arc<RgbaImage>>) {
        self.frame = frame;
    }
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = self.frame.as_deref().filter(|f| f.width() > 0 && f.height() > 0)
        else {
            let msg = "Waiting for camera...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        };

        // Each terminal cell displays 2 vertical pixels
        let frame_aspect = frame.width() as f64 / frame.height() as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width() as f64 / display_width as f64;
        let y_scale = frame.height() as f64 / (display_height * 2) as f64;

        // Upper half (▀) takes fg, lower half takes bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;

                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(sample_pixel(frame, src_x, src_y_top));
                    cell.set_bg(sample_pixel(frame, src_x, src_y_bottom));
                }
            }
        }
    }
}

fn sample_pixel(frame: &RgbaImage, x: u32, y: u32) -> Color {
    let x = x.min(frame.width() - 1);
    let y = y.min(frame.height() - 1);
    let [r, g, b, _] = frame.get_pixel(x, y).0;
    Color::Rgb(r, g, b)
}

/// Fatal error panel with the retry affordance
struct ErrorPanel<'a> {
    error: &'a ErrorView,
}

impl Widget for ErrorPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [r, g, b] = COLOR_SMILING;
        let lines = vec![
            Line::styled(
                self.error.title.as_str(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Line::from(self.error.details.as_str()),
            Line::from(""),
            Line::styled("Press 'i' to retry", Style::default().fg(Color::Rgb(r, g, b))),
        ];
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::bordered().border_style(Style::default().fg(Color::Red)))
            .render(area, buf);
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(
            action_for_key(key(KeyCode::Left)),
            KeyAction::Command(BoothCommand::SelectPrevious)
        );
        assert_eq!(
            action_for_key(key(KeyCode::Right)),
            KeyAction::Command(BoothCommand::SelectNext)
        );
        assert_eq!(
            action_for_key(key(KeyCode::Char('r'))),
            KeyAction::Command(BoothCommand::RetrySelectedUpload)
        );
        assert_eq!(
            action_for_key(key(KeyCode::Char('c'))),
            KeyAction::Command(BoothCommand::ClearSelection)
        );
        assert_eq!(action_for_key(key(KeyCode::Char('q'))), KeyAction::Quit);
        assert_eq!(
            action_for_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            KeyAction::Quit
        );
        assert_eq!(action_for_key(key(KeyCode::Char('x'))), KeyAction::Ignore);
    }

    #[test]
    fn test_status_message_shows_indicators() {
        let mut view = BoothView::default();
        view.status = "MONITORING".into();
        view.hand_active = true;
        view.face_score = 72.4;
        let message = status_message(&view);
        assert!(message.starts_with("MONITORING | HAND ● | FACE ○ 72%"));
    }

    #[test]
    fn test_frame_widget_fills_area() {
        let mut widget = FrameWidget::new();
        widget.update_frame(Some(Arc::new(RgbaImage::from_pixel(
            8,
            8,
            image::Rgba([200, 10, 20, 255]),
        ))));
        let area = Rect::new(0, 0, 4, 2);
        let mut buf = Buffer::empty(area);
        (&widget).render(area, &mut buf);
        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(200, 10, 20));
    }

    #[test]
    fn test_frame_widget_placeholder() {
        let widget = FrameWidget::new();
        let area = Rect::new(0, 0, 30, 3);
        let mut buf = Buffer::empty(area);
        (&widget).render(area, &mut buf);
        let row: String = (0..30).map(|x| buf[(x, 1)].symbol().to_string()).collect();
        assert!(row.contains("Waiting for camera..."));
    }

    #[test]
    fn test_centered_clamps_to_area() {
        let area = Rect::new(2, 2, 10, 4);
        let rect = centered(area, 56, 7);
        assert_eq!(rect, area);
        let rect = centered(Rect::new(0, 0, 20, 10), 10, 4);
        assert_eq!(rect, Rect::new(5, 3, 10, 4));
    }
}
