use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};
use std::sync::OnceLock;

use crate::app::{App, EditField, Popup, Section};
use crate::theme::Theme;

// Load theme colors from system (Omarchy/Hyprland) once at startup
static THEME: OnceLock<Theme> = OnceLock::new();

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::load)
}

// Helper functions to get theme colors
fn accent() -> Color { theme().accent }
fn inactive() -> Color { theme().inactive }
fn success() -> Color { theme().success }
fn warning() -> Color { theme().warning }
fn danger() -> Color { theme().danger }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn bg_selected() -> Color { theme().bg_selected }
fn header() -> Color { theme().header }

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(1), // Info line
            Constraint::Length(3), // Search box
            Constraint::Min(4),    // Member table
            Constraint::Length(1), // Page strip
            Constraint::Length(1), // Footer
        ])
        .split(area);

    draw_info_line(f, app, chunks[0]);
    draw_search_box(f, app, chunks[1]);
    draw_member_table(f, app, chunks[2]);
    draw_page_strip(f, app, chunks[3]);
    draw_footer(f, app, chunks[4]);

    // Draw popups on top
    match app.popup {
        Popup::None => {}
        Popup::Help => draw_help_popup(f),
        Popup::Confirm => draw_confirm_popup(f, app),
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    // Priority: status message > roster summary
    let line = if let Some(ref status) = app.status_message {
        Line::from(vec![Span::styled(status, Style::default().fg(warning()))])
    } else {
        let filtered = app.filtered().len();
        let mut parts = vec![format!("{} members", app.members.len())];
        if !app.search_term.is_empty() {
            parts.push(format!("{} match", filtered));
        }
        if !app.selected_ids.is_empty() {
            parts.push(format!("{} selected", app.selected_ids.len()));
        }
        Line::from(vec![Span::styled(
            parts.join(" │ "),
            Style::default().fg(text_dim()),
        )])
    };

    let info = Paragraph::new(line).alignment(Alignment::Center);
    f.render_widget(info, area);
}

fn draw_search_box(f: &mut Frame, app: &App, area: Rect) {
    let is_active = app.section == Section::Search;
    let border_color = if is_active { accent() } else { inactive() };
    let title_style = if is_active {
        Style::default().fg(accent()).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(inactive())
    };

    let cursor = if is_active { "_" } else { "" };
    let content = if app.search_term.is_empty() && !is_active {
        Span::styled("Type / to search by name", Style::default().fg(text_dim()))
    } else {
        Span::styled(
            format!("{}{}", app.search_term, cursor),
            Style::default().fg(text()),
        )
    };

    let input = Paragraph::new(Line::from(content)).block(
        Block::default()
            .title(Span::styled(" (/)Search ", title_style))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color)),
    );
    f.render_widget(input, area);
}

fn draw_member_table(f: &mut Frame, app: &App, area: Rect) {
    let is_active = app.section == Section::Table;
    let border_color = if is_active { accent() } else { inactive() };
    let title_style = if is_active {
        Style::default().fg(accent()).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(inactive())
    };

    let block = Block::default()
        .title(Span::styled(" Members ", title_style))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let head = Row::new(vec![
        Span::styled("", Style::default().fg(header())),
        Span::styled("Name", Style::default().fg(header())),
        Span::styled("Email", Style::default().fg(header())),
        Span::styled("Role", Style::default().fg(header())),
    ]);

    let visible = app.visible_rows();
    let rows: Vec<Row> = if visible.is_empty() {
        let hint = if app.members.is_empty() {
            "  No members loaded"
        } else {
            "  No members match the search"
        };
        vec![Row::new(vec![Span::styled(
            hint,
            Style::default().fg(text_dim()),
        )])]
    } else {
        visible
            .iter()
            .enumerate()
            .map(|(i, member)| {
                let selected = app.is_selected(&member.id);
                let checkbox = if selected { "󰄲" } else { "󰄱" };
                let checkbox_color = if selected { success() } else { text_dim() };

                let editing = app.editing_id.as_deref() == Some(member.id.as_str());
                let row_style = if editing {
                    Style::default().bg(bg_selected()).fg(accent())
                } else if i == app.cursor && is_active {
                    Style::default().bg(bg_selected()).fg(text())
                } else {
                    Style::default()
                };

                let (name_cell, email_cell) = if editing {
                    edit_cells(app)
                } else {
                    (
                        Span::styled(member.name.clone(), Style::default().fg(text())),
                        Span::styled(member.email.clone(), Style::default().fg(text())),
                    )
                };

                Row::new(vec![
                    Span::styled(checkbox, Style::default().fg(checkbox_color)),
                    name_cell,
                    email_cell,
                    Span::styled(member.role.clone(), Style::default().fg(text_dim())),
                ])
                .style(row_style)
            })
            .collect()
    };

    let widths = vec![
        Constraint::Length(3),
        Constraint::Percentage(30),
        Constraint::Percentage(45),
        Constraint::Percentage(20),
    ];

    let table = Table::new(rows, widths)
        .header(head.style(Style::default()))
        .block(block);

    f.render_widget(table, area);
}

/// Name and email cells for the row currently in edit mode,
/// with a cursor marker on the active draft field
fn edit_cells(app: &App) -> (Span<'static>, Span<'static>) {
    let Some(draft) = app.draft.as_ref() else {
        return (Span::raw(""), Span::raw(""));
    };

    let field_style = |active: bool| {
        if active {
            Style::default().fg(accent()).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(text())
        }
    };

    let name_active = draft.field == EditField::Name;
    let name = if name_active {
        format!("{}_", draft.name)
    } else {
        draft.name.clone()
    };
    let email = if name_active {
        draft.email.clone()
    } else {
        format!("{}_", draft.email)
    };

    (
        Span::styled(name, field_style(name_active)),
        Span::styled(email, field_style(!name_active)),
    )
}

fn draw_page_strip(f: &mut Frame, app: &App, area: Rect) {
    let total = app.total_pages();

    let mut spans = vec![Span::styled("‹ ", Style::default().fg(text_dim()))];
    for page in 1..=total {
        let style = if page == app.current_page {
            Style::default()
                .fg(accent())
                .bg(bg_selected())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(text_dim())
        };
        spans.push(Span::styled(format!(" {} ", page), style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled("›", Style::default().fg(text_dim())));

    let strip = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);
    f.render_widget(strip, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let hints: Vec<(&str, &str)> = if app.editing_id.is_some() {
        vec![
            ("Tab", "Field"),
            ("Enter", "Save"),
            ("Esc", "Cancel"),
        ]
    } else {
        match app.section {
            Section::Search => vec![("Esc", "Done"), ("Tab", "Table")],
            Section::Table => vec![
                ("↑↓", "Nav"),
                ("Space", "Select"),
                ("a", "Page"),
                ("e", "Edit"),
                ("d", "Del"),
                ("x", "Del sel"),
                ("←→", "Page"),
                ("?", "Help"),
            ],
        }
    };

    // Responsive: show fewer hints on narrow terminals
    let max_hints = if area.width < 60 {
        4
    } else if area.width < 80 {
        6
    } else {
        hints.len()
    };

    let hint_spans: Vec<Span> = hints
        .iter()
        .take(max_hints)
        .flat_map(|(key, action)| {
            vec![
                Span::styled(*key, Style::default().fg(accent())),
                Span::styled(format!(" {} │ ", action), Style::default().fg(text_dim())),
            ]
        })
        .collect();

    let footer = Paragraph::new(Line::from(hint_spans)).alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 60 },
        if area.height < 30 { 90 } else { 70 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(Span::styled(
            "═══ Navigation ═══",
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  Tab /     ", Style::default().fg(accent())),
            Span::raw("Switch between search box and table"),
        ]),
        Line::from(vec![
            Span::styled("  ↑/↓ j/k   ", Style::default().fg(accent())),
            Span::raw("Move up/down in the table"),
        ]),
        Line::from(vec![
            Span::styled("  ←/→ h/l   ", Style::default().fg(accent())),
            Span::raw("Previous / next page"),
        ]),
        Line::from(vec![
            Span::styled("  1-9       ", Style::default().fg(accent())),
            Span::raw("Jump straight to pages 1-9"),
        ]),
        Line::from(vec![
            Span::styled("  g/G       ", Style::default().fg(accent())),
            Span::raw("First / last page (reaches pages beyond 9)"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "═══ Selection ═══",
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  Space     ", Style::default().fg(accent())),
            Span::raw("Toggle selection of the highlighted row"),
        ]),
        Line::from(vec![
            Span::styled("  a         ", Style::default().fg(accent())),
            Span::raw("Select/clear all rows on this page"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "═══ Editing ═══",
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  e/Enter   ", Style::default().fg(accent())),
            Span::raw("Edit the highlighted row's name and email"),
        ]),
        Line::from(vec![
            Span::styled("  Tab       ", Style::default().fg(accent())),
            Span::raw("Switch between name and email while editing"),
        ]),
        Line::from(vec![
            Span::styled("  Enter     ", Style::default().fg(accent())),
            Span::raw("Save changes · Esc discards them"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "═══ Deleting ═══",
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("  d         ", Style::default().fg(accent())),
            Span::raw("Delete the highlighted row"),
        ]),
        Line::from(vec![
            Span::styled("  x         ", Style::default().fg(accent())),
            Span::raw("Delete every selected row"),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::raw("  Edits and deletes live in memory only and are"),
        ]),
        Line::from(vec![Span::raw("  lost when kanri exits.")]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(text_dim())),
            Span::styled("?", Style::default().fg(accent())),
            Span::styled("/", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::styled(" to close", Style::default().fg(text_dim())),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" 󰋖 kanri Help ", Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

fn draw_confirm_popup(f: &mut Frame, app: &App) {
    let popup_area = centered_rect(40, 20, f.area());

    f.render_widget(Clear, popup_area);

    let message = app.status_message.as_deref().unwrap_or("Confirm?");

    let confirm = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(warning()))),
        Line::from(""),
        Line::from(vec![
            Span::styled(
                "  y",
                Style::default().fg(danger()).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" Yes   "),
            Span::styled(
                "n",
                Style::default().fg(success()).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" No"),
        ]),
    ])
    .block(
        Block::default()
            .title(Span::styled(" Confirm ", Style::default().fg(warning())))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(warning())),
    )
    .alignment(Alignment::Center);

    f.render_widget(confirm, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
