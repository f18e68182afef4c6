use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Bar, BarChart, BarGroup, Block, Cell as WidgetCell, Clear, Padding, Paragraph, Row as WidgetRow,
    Sparkline, Table, TableState as WidgetTableState, Wrap,
};
use ratatui::Frame;

use crate::domain::{format_currency, HELP_TEXT};
use crate::inputter::Inputter;
use crate::model::{
    DashPane, ListPane, Model, Overlay, Screen, CATEGORY_SALES, MOCK_PAGE_VISITS, SALES_SERIES,
    WEEK_ORDERS,
};
use crate::record::Row;
use crate::table::{CellKind, TableState};
use crate::theme::Palette;

pub fn draw(model: &Model, frame: &mut Frame) {
    let palette = Palette::for_mode(model.theme);
    let area = frame.area();
    frame.render_widget(Block::new().style(palette.base()), area);

    if model.screen == Screen::Login {
        draw_login(model, frame, area, &palette);
    } else {
        let [main, status] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);
        let [sidebar, content] =
            Layout::horizontal([Constraint::Length(20), Constraint::Fill(1)]).areas(main);
        draw_sidebar(model, frame, sidebar, &palette);
        match model.screen {
            Screen::Dashboard => draw_dashboard(&model.dash, frame, content, &palette),
            Screen::Users => draw_list(
                &model.users,
                frame,
                content,
                &palette,
                "Users",
                "Manage your users and their roles",
            ),
            Screen::Products => draw_list(
                &model.products,
                frame,
                content,
                &palette,
                "Products",
                "Manage your product catalog",
            ),
            Screen::Orders => draw_list(
                &model.orders,
                frame,
                content,
                &palette,
                "Orders",
                "Manage and track customer orders",
            ),
            Screen::UserForm | Screen::ProductForm => draw_form(model, frame, content, &palette),
            Screen::Settings => draw_settings(model, frame, content, &palette),
            Screen::Login => {}
        }
        draw_status_line(model, frame, status, &palette);
    }

    match &model.overlay {
        Overlay::None => {}
        Overlay::Help => draw_help(frame, area, &palette),
        Overlay::ConfirmDelete { label, .. } => draw_confirm(frame, area, &palette, label),
    }
}

// ------------------------------- helpers -------------------------------- //

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}

/// Input text with a visible cursor block when the field has focus.
fn input_line<'a>(input: &Inputter, text: String, focused: bool, palette: &Palette) -> Line<'a> {
    if !focused {
        return Line::from(Span::styled(text, Style::new().fg(palette.text_dim)));
    }
    let cursor = input.cursor();
    let before: String = text.chars().take(cursor).collect();
    let at: String = text.chars().skip(cursor).take(1).collect();
    let after: String = text.chars().skip(cursor + 1).collect();
    let block = if at.is_empty() { " ".to_string() } else { at };
    Line::from(vec![
        Span::styled(before, Style::new().fg(palette.text)),
        Span::styled(block, Style::new().add_modifier(Modifier::REVERSED)),
        Span::styled(after, Style::new().fg(palette.text)),
    ])
}

fn column_width(kind: CellKind) -> Constraint {
    match kind {
        CellKind::Quantity => Constraint::Length(6),
        CellKind::Currency => Constraint::Length(11),
        CellKind::Date => Constraint::Length(13),
        CellKind::Badge => Constraint::Length(14),
        CellKind::Text => Constraint::Fill(1),
    }
}

/// Shared table rendering for the list screens and the dashboard.
fn render_table(
    frame: &mut Frame,
    area: Rect,
    table: &TableState,
    rows: &[&Row],
    selected: Option<usize>,
    palette: &Palette,
) {
    let header = WidgetRow::new(table.columns.iter().enumerate().map(|(i, col)| {
        let mut label = col.label.to_string();
        if table.sort.key == Some(col.key) {
            label.push(' ');
            label.push_str(table.sort.direction.arrow());
        }
        let mut style = palette.heading();
        if i == table.picked && col.sortable {
            style = style.fg(palette.accent);
        }
        if !col.sortable {
            style = Style::new().fg(palette.text_muted);
        }
        WidgetCell::from(label).style(style)
    }))
    .bottom_margin(1);

    if rows.is_empty() {
        // Same empty indicator for "no rows" and "page past the data".
        let empty = Paragraph::new("No data available")
            .style(palette.dim())
            .alignment(Alignment::Center);
        let [head, body] =
            Layout::vertical([Constraint::Length(2), Constraint::Fill(1)]).areas(area);
        let widths: Vec<Constraint> = table.columns.iter().map(|c| column_width(c.cell)).collect();
        frame.render_widget(
            Table::new(std::iter::empty::<WidgetRow>(), widths).header(header),
            head,
        );
        frame.render_widget(empty, body);
        return;
    }

    let body = rows.iter().map(|row| {
        WidgetRow::new(table.columns.iter().map(|col| {
            let cell = col.render(row);
            let style = match cell.tone {
                Some(tone) => Style::new().fg(palette.tone(tone)),
                None => Style::new().fg(palette.text),
            };
            WidgetCell::from(cell.text).style(style)
        }))
    });
    let widths: Vec<Constraint> = table.columns.iter().map(|c| column_width(c.cell)).collect();
    let widget = Table::new(body, widths)
        .header(header)
        .column_spacing(1)
        .row_highlight_style(palette.selected());

    let mut state = WidgetTableState::default();
    state.select(selected);
    frame.render_stateful_widget(widget, area, &mut state);
}

// ------------------------------- screens -------------------------------- //

fn draw_login(model: &Model, frame: &mut Frame, area: Rect, palette: &Palette) {
    let boxed = centered(area, 46, 14);
    let block = Block::bordered()
        .title(Line::from(" opsdash ").centered())
        .border_style(Style::new().fg(palette.border))
        .style(palette.panel_style())
        .padding(Padding::horizontal(2));
    let inner = block.inner(boxed);
    frame.render_widget(block, boxed);

    let rows = Layout::vertical([
        Constraint::Length(2), // subtitle
        Constraint::Length(2), // email
        Constraint::Length(2), // password
        Constraint::Length(2), // error / busy
        Constraint::Length(1), // demo hint
        Constraint::Length(1), // keys
    ])
    .split(inner);

    frame.render_widget(
        Paragraph::new("Sign in to continue").style(palette.dim()),
        rows[0],
    );

    let field = |label: &str, focused: bool| -> Span<'static> {
        let style = if focused {
            palette.accent_style().add_modifier(Modifier::BOLD)
        } else {
            palette.dim()
        };
        Span::styled(format!("{label:<10}"), style)
    };

    let email = model.login.email.value();
    let mut email_line = vec![field("Email", model.login.focus == 0)];
    email_line.extend(input_line(&model.login.email, email, model.login.focus == 0, palette).spans);
    frame.render_widget(Paragraph::new(Line::from(email_line)), rows[1]);

    let masked = model.login.password.masked();
    let mut pw_line = vec![field("Password", model.login.focus == 1)];
    pw_line.extend(input_line(&model.login.password, masked, model.login.focus == 1, palette).spans);
    frame.render_widget(Paragraph::new(Line::from(pw_line)), rows[2]);

    let notice = if model.login.busy {
        Span::styled("Signing in ...", palette.dim())
    } else if let Some(error) = &model.login.error {
        Span::styled(error.clone(), Style::new().fg(palette.danger))
    } else {
        Span::raw("")
    };
    frame.render_widget(Paragraph::new(Line::from(notice)), rows[3]);

    frame.render_widget(
        Paragraph::new("demo: admin@example.com / admin123").style(palette.dim()),
        rows[4],
    );
    frame.render_widget(
        Paragraph::new("Tab switch · Enter sign in · Esc quit").style(palette.dim()),
        rows[5],
    );
}

fn draw_sidebar(model: &Model, frame: &mut Frame, area: Rect, palette: &Palette) {
    let block = Block::bordered()
        .border_style(Style::new().fg(palette.border))
        .style(palette.panel_style());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let items: [(&str, Screen); 5] = [
        ("1 Dashboard", Screen::Dashboard),
        ("2 Users", Screen::Users),
        ("3 Products", Screen::Products),
        ("4 Orders", Screen::Orders),
        ("5 Settings", Screen::Settings),
    ];
    let mut lines = vec![
        Line::from(Span::styled("opsdash", palette.heading().fg(palette.accent))),
        Line::from(""),
    ];
    for (label, screen) in items {
        let active = model.screen == screen
            || (screen == Screen::Users && model.screen == Screen::UserForm)
            || (screen == Screen::Products && model.screen == Screen::ProductForm);
        let style = if active {
            palette.selected().fg(palette.accent)
        } else {
            Style::new().fg(palette.text_dim)
        };
        lines.push(Line::from(Span::styled(format!(" {label:<16}"), style)));
    }
    if let Some(session) = &model.session {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            session.user.name.clone(),
            Style::new().fg(palette.text),
        )));
        lines.push(Line::from(Span::styled(
            session.user.role.as_str(),
            palette.dim(),
        )));
    }
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_list(
    pane: &ListPane,
    frame: &mut Frame,
    area: Rect,
    palette: &Palette,
    title: &str,
    subtitle: &str,
) {
    let rows = Layout::vertical([
        Constraint::Length(2), // heading
        Constraint::Length(3), // search / filter
        Constraint::Fill(1),   // table
        Constraint::Length(1), // pagination line
    ])
    .split(area);

    let heading = vec![
        Line::from(Span::styled(title.to_string(), palette.heading())),
        Line::from(Span::styled(subtitle.to_string(), palette.dim())),
    ];
    frame.render_widget(Paragraph::new(heading), rows[0]);

    // Search box, with the orders status filter on the right.
    let search_title = if pane.editing_query {
        " Search (Enter keep · Esc clear) "
    } else {
        " Search (/) "
    };
    let search_block = Block::bordered()
        .title(search_title)
        .border_style(if pane.editing_query {
            Style::new().fg(palette.accent)
        } else {
            Style::new().fg(palette.border)
        });
    let search_inner = search_block.inner(rows[1]);
    frame.render_widget(search_block, rows[1]);
    let shown = if pane.editing_query {
        pane.input.value()
    } else {
        pane.query.clone()
    };
    let mut search_line = input_line(&pane.input, shown, pane.editing_query, palette);
    if pane.has_status_filter {
        search_line
            .spans
            .push(Span::styled(
                format!("   [f] {}", pane.status_filter.label()),
                palette.accent_style(),
            ));
    }
    frame.render_widget(Paragraph::new(search_line), search_inner);

    if pane.loading {
        frame.render_widget(
            Paragraph::new("Loading ...")
                .style(palette.dim())
                .alignment(Alignment::Center),
            rows[2],
        );
    } else {
        render_table(
            frame,
            rows[2],
            &pane.table,
            &pane.visible_rows(),
            Some(pane.selected),
            palette,
        );
    }

    let len = pane.view.len();
    let nav_style = |disabled: bool| {
        if disabled {
            Style::new().fg(palette.text_muted).add_modifier(Modifier::DIM)
        } else {
            palette.accent_style()
        }
    };
    let footer = Line::from(vec![
        Span::styled(pane.table.showing_label(len), palette.dim()),
        Span::raw("   "),
        Span::styled("⏮ g", nav_style(pane.table.on_first_page())),
        Span::raw("  "),
        Span::styled("◀ h", nav_style(pane.table.on_first_page())),
        Span::raw("  "),
        Span::styled(pane.table.page_label(len), Style::new().fg(palette.text)),
        Span::raw("  "),
        Span::styled("l ▶", nav_style(pane.table.on_last_page(len))),
        Span::raw("  "),
        Span::styled("G ⏭", nav_style(pane.table.on_last_page(len))),
    ]);
    frame.render_widget(Paragraph::new(footer), rows[3]);
}

fn stat_card(
    frame: &mut Frame,
    area: Rect,
    palette: &Palette,
    title: &str,
    value: String,
    pct: f64,
    accent: ratatui::style::Color,
) {
    let block = Block::bordered()
        .title(format!(" {title} "))
        .border_style(Style::new().fg(palette.border))
        .style(palette.panel_style());
    let inner = block.inner(area);
    frame.render_widget(block, area);
    let trend_color = if pct >= 0.0 { palette.success } else { palette.danger };
    let lines = vec![
        Line::from(Span::styled(
            value,
            Style::new().fg(accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(format!("{pct:+.1}% "), Style::new().fg(trend_color)),
            Span::styled("vs last month", palette.dim()),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_dashboard(dash: &DashPane, frame: &mut Frame, area: Rect, palette: &Palette) {
    if dash.loading {
        frame.render_widget(
            Paragraph::new("Loading ...")
                .style(palette.dim())
                .alignment(Alignment::Center),
            area,
        );
        return;
    }

    let rows = Layout::vertical([
        Constraint::Length(4),  // stat cards
        Constraint::Length(9),  // charts
        Constraint::Fill(1),    // category + recent orders
    ])
    .split(area);

    let cards = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(rows[0]);
    stat_card(
        frame,
        cards[0],
        palette,
        "Total Users",
        dash.user_stats.total.to_string(),
        12.5,
        palette.accent,
    );
    stat_card(
        frame,
        cards[1],
        palette,
        "Revenue",
        format_currency(dash.order_stats.revenue),
        8.2,
        palette.success,
    );
    stat_card(
        frame,
        cards[2],
        palette,
        "Orders",
        dash.order_stats.total.to_string(),
        -3.1,
        palette.warning,
    );
    stat_card(
        frame,
        cards[3],
        palette,
        "Page Visits",
        MOCK_PAGE_VISITS.to_string(),
        15.3,
        palette.info,
    );

    let charts = Layout::horizontal([Constraint::Ratio(1, 2); 2]).split(rows[1]);

    let sales: Vec<u64> = SALES_SERIES.iter().map(|(_, sales, _)| *sales).collect();
    let sales_block = Block::bordered()
        .title(" Sales Overview (Jan–Jul) ")
        .border_style(Style::new().fg(palette.border))
        .style(palette.panel_style());
    let sales_inner = sales_block.inner(charts[0]);
    frame.render_widget(sales_block, charts[0]);
    frame.render_widget(
        Sparkline::default()
            .data(&sales)
            .style(Style::new().fg(palette.accent)),
        sales_inner,
    );

    let bars: Vec<Bar> = WEEK_ORDERS
        .iter()
        .map(|(day, n)| {
            Bar::default()
                .value(*n)
                .label(Line::from(*day))
                .style(Style::new().fg(palette.warning))
        })
        .collect();
    let week_chart = BarChart::default()
        .block(
            Block::bordered()
                .title(" Orders This Week ")
                .border_style(Style::new().fg(palette.border))
                .style(palette.panel_style()),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(3)
        .bar_gap(1);
    frame.render_widget(week_chart, charts[1]);

    let bottom = Layout::horizontal([Constraint::Ratio(1, 3), Constraint::Ratio(2, 3)]).split(rows[2]);

    let category_bars: Vec<Bar> = CATEGORY_SALES
        .iter()
        .map(|(name, n)| {
            Bar::default()
                .value(*n)
                .label(Line::from(*name))
                .style(Style::new().fg(palette.info))
        })
        .collect();
    let category_chart = BarChart::default()
        .block(
            Block::bordered()
                .title(" Sales by Category ")
                .border_style(Style::new().fg(palette.border))
                .style(palette.panel_style()),
        )
        .data(BarGroup::default().bars(&category_bars))
        .bar_width(1)
        .bar_gap(0)
        .direction(Direction::Horizontal);
    frame.render_widget(category_chart, bottom[0]);

    let recent_block = Block::bordered()
        .title(" Recent Orders ")
        .border_style(Style::new().fg(palette.border))
        .style(palette.panel_style());
    let recent_inner = recent_block.inner(bottom[1]);
    frame.render_widget(recent_block, bottom[1]);
    let recent_rows: Vec<&Row> = dash.recent.iter().collect();
    render_table(frame, recent_inner, &dash.recent_table, &recent_rows, None, palette);
}

fn draw_form(model: &Model, frame: &mut Frame, area: Rect, palette: &Palette) {
    let Some(form) = &model.form else {
        return;
    };
    let height = (form.fields.len() as u16) * 2 + 6;
    let boxed = centered(area, 56, height);
    let block = Block::bordered()
        .title(format!(" {} ", form.title))
        .border_style(Style::new().fg(palette.accent))
        .style(palette.panel_style())
        .padding(Padding::horizontal(2));
    let inner = block.inner(boxed);
    frame.render_widget(Clear, boxed);
    frame.render_widget(block, boxed);

    let mut lines: Vec<Line> = Vec::new();
    if let Some(banner) = &form.banner {
        lines.push(Line::from(Span::styled(
            banner.clone(),
            Style::new().fg(palette.danger),
        )));
    } else if form.busy {
        lines.push(Line::from(Span::styled("Saving ...", palette.dim())));
    } else {
        lines.push(Line::from(""));
    }
    lines.push(Line::from(""));

    for (i, field) in form.fields.iter().enumerate() {
        let focused = i == form.focus;
        let label_style = if focused {
            palette.accent_style().add_modifier(Modifier::BOLD)
        } else {
            palette.dim()
        };
        let mut spans = vec![Span::styled(format!("{:<13}", field.label), label_style)];
        match field.kind {
            crate::form::FieldKind::Choice(_) => {
                let marker = if focused { "◀ " } else { "  " };
                let marker_end = if focused { " ▶" } else { "  " };
                spans.push(Span::styled(marker, palette.dim()));
                spans.push(Span::styled(
                    field.value(),
                    Style::new().fg(palette.text),
                ));
                spans.push(Span::styled(marker_end, palette.dim()));
            }
            crate::form::FieldKind::Text => {
                spans.extend(input_line(&field.input, field.input.value(), focused, palette).spans);
            }
        }
        lines.push(Line::from(spans));
        match &field.error {
            Some(error) => lines.push(Line::from(Span::styled(
                format!("{:<13}{error}", ""),
                Style::new().fg(palette.danger),
            ))),
            None => lines.push(Line::from("")),
        }
    }
    lines.push(Line::from(Span::styled(
        "Enter save · Esc cancel · Tab next field",
        palette.dim(),
    )));
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn draw_settings(model: &Model, frame: &mut Frame, area: Rect, palette: &Palette) {
    let rows = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(8),
        Constraint::Length(6),
        Constraint::Fill(1),
    ])
    .split(area);

    frame.render_widget(
        Paragraph::new(vec![
            Line::from(Span::styled("Settings", palette.heading())),
            Line::from(Span::styled(
                "Manage your account settings and preferences",
                palette.dim(),
            )),
        ]),
        rows[0],
    );

    let settings = &model.settings;
    let item_style = |idx: usize| {
        if settings.focus == idx {
            palette.selected().fg(palette.accent)
        } else {
            Style::new().fg(palette.text_dim)
        }
    };

    let profile_block = Block::bordered()
        .title(" Profile Information ")
        .border_style(Style::new().fg(palette.border))
        .style(palette.panel_style())
        .padding(Padding::horizontal(1));
    let profile_inner = profile_block.inner(rows[1]);
    frame.render_widget(profile_block, rows[1]);

    let editing_field = |idx: usize| settings.editing && settings.focus == idx;
    let mut profile_lines = vec![Line::from("")];
    let mut name_spans = vec![Span::styled(format!("{:<13}", "Full Name"), item_style(0))];
    name_spans.extend(
        input_line(&settings.name, settings.name.value(), editing_field(0), palette).spans,
    );
    profile_lines.push(Line::from(name_spans));
    let mut email_spans = vec![Span::styled(format!("{:<13}", "Email"), item_style(1))];
    email_spans.extend(
        input_line(&settings.email, settings.email.value(), editing_field(1), palette).spans,
    );
    profile_lines.push(Line::from(email_spans));
    profile_lines.push(Line::from(""));
    let notice = if settings.saving {
        Span::styled("Saving ...", palette.dim())
    } else if let Some(error) = &settings.error {
        Span::styled(error.clone(), Style::new().fg(palette.danger))
    } else if settings.editing {
        Span::styled("Enter save · Esc cancel", palette.dim())
    } else {
        Span::styled("Enter to edit the focused field", palette.dim())
    };
    profile_lines.push(Line::from(notice));
    frame.render_widget(Paragraph::new(profile_lines), profile_inner);

    let prefs_block = Block::bordered()
        .title(" Preferences ")
        .border_style(Style::new().fg(palette.border))
        .style(palette.panel_style())
        .padding(Padding::horizontal(1));
    let prefs_inner = prefs_block.inner(rows[2]);
    frame.render_widget(prefs_block, rows[2]);
    let prefs_lines = vec![
        Line::from(vec![
            Span::styled(format!("{:<13}", "Theme"), item_style(2)),
            Span::styled(model.theme.as_str(), Style::new().fg(palette.text)),
            Span::styled("  (Enter or t to toggle)", palette.dim()),
        ]),
        Line::from(vec![Span::styled(format!("{:<13}", "Log out"), item_style(3))]),
    ];
    frame.render_widget(Paragraph::new(prefs_lines), prefs_inner);
}

fn draw_status_line(model: &Model, frame: &mut Frame, area: Rect, palette: &Palette) {
    let hints = "?: help · q: quit";
    let hint_width = hints.chars().count() as u16;
    let [left, right] =
        Layout::horizontal([Constraint::Fill(1), Constraint::Length(hint_width)]).areas(area);
    frame.render_widget(
        Paragraph::new(Span::styled(model.status_message.clone(), palette.dim())),
        left,
    );
    frame.render_widget(
        Paragraph::new(Span::styled(hints, palette.dim())).alignment(Alignment::Right),
        right,
    );
}

fn draw_help(frame: &mut Frame, area: Rect, palette: &Palette) {
    let boxed = centered(area, 52, 30);
    frame.render_widget(Clear, boxed);
    let block = Block::bordered()
        .title(" Help ")
        .border_style(Style::new().fg(palette.accent))
        .style(palette.panel_style());
    frame.render_widget(
        Paragraph::new(Text::from(HELP_TEXT))
            .block(block)
            .wrap(Wrap { trim: false }),
        boxed,
    );
}

fn draw_confirm(frame: &mut Frame, area: Rect, palette: &Palette, label: &str) {
    let boxed = centered(area, 50, 5);
    frame.render_widget(Clear, boxed);
    let block = Block::bordered()
        .title(" Confirm ")
        .border_style(Style::new().fg(palette.danger))
        .style(palette.panel_style());
    let inner = block.inner(boxed);
    frame.render_widget(block, boxed);
    let lines = vec![
        Line::from(format!("Delete {label}?")),
        Line::from(Span::styled("y: delete · n: keep", palette.dim())),
    ];
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AppConfig, Message, Nav};
    use crate::model::Model;
    use crate::repo::Services;
    use crate::store::KvStore;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::time::Duration;

    fn rendered(model: &Model) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 32)).unwrap();
        terminal.draw(|f| draw(model, f)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer.cell((x, y)).map(|c| c.symbol()).unwrap_or(" "));
            }
            out.push('\n');
        }
        out
    }

    fn model() -> (Model, std::sync::mpsc::Receiver<Message>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::default()
            .with_latency(Duration::ZERO)
            .with_state_file(dir.path().join("state.json"));
        let store = KvStore::open(&config.state_file);
        let (model, rx) = Model::init(&config, Services::seeded(), store);
        (model, rx, dir)
    }

    fn pump(model: &mut Model, rx: &std::sync::mpsc::Receiver<Message>, n: usize) {
        for _ in 0..n {
            model.update(rx.recv_timeout(Duration::from_secs(2)).unwrap());
        }
    }

    fn login(model: &mut Model, rx: &std::sync::mpsc::Receiver<Message>) {
        model.login.email.set("admin@example.com");
        model.login.password.set("admin123");
        model.update(Message::RawKey(
            ratatui::crossterm::event::KeyCode::Enter.into(),
        ));
        pump(model, rx, 2);
    }

    #[test]
    fn login_screen_renders_masked_password() {
        let (mut model, _rx, _dir) = model();
        model.login.email.set("admin@example.com");
        model.login.password.set("secret");
        let screen = rendered(&model);
        assert!(screen.contains("Sign in to continue"));
        assert!(screen.contains("admin@example.com"));
        assert!(!screen.contains("secret"));
        assert!(screen.contains("••••••"));
    }

    #[test]
    fn users_screen_renders_table_and_pagination() {
        let (mut model, rx, _dir) = model();
        login(&mut model, &rx);
        model.update(Message::Goto(Nav::Users));
        pump(&mut model, &rx, 1);
        let screen = rendered(&model);
        assert!(screen.contains("John Doe"));
        assert!(screen.contains("jane.smith@"));
        assert!(screen.contains("Page 1 of 1"));
        assert!(screen.contains("Showing 1 to 5 of 5 results"));
    }

    #[test]
    fn dashboard_renders_stats_and_recent_orders() {
        let (mut model, rx, _dir) = model();
        login(&mut model, &rx);
        let screen = rendered(&model);
        assert!(screen.contains("Total Users"));
        assert!(screen.contains("$509.93"));
        assert!(screen.contains("Recent Orders"));
        assert!(screen.contains("1007"));
    }

    #[test]
    fn empty_filter_result_shows_the_empty_state() {
        let (mut model, rx, _dir) = model();
        login(&mut model, &rx);
        model.update(Message::Goto(Nav::Users));
        pump(&mut model, &rx, 1);
        model.update(Message::EditSearch);
        for c in "zzz".chars() {
            model.update(Message::RawKey(
                ratatui::crossterm::event::KeyCode::Char(c).into(),
            ));
        }
        let screen = rendered(&model);
        assert!(screen.contains("No data available"));
    }
}
