use crate::geofence::{ModalState, NoticeLevel, TreeRow};
use crate::model::{Choice, Coordinate, EntityKey, EntityKind, Shape};
use crate::permissions::{Action, PermissionCheck};
use crate::remote::ActionExecutor;
use crate::ui::app::{App, InputMode, Screen};
use crate::ui::map_view::DrawMode;
use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Context, Line as MapLine, Points},
        Block, Borders, Clear, Paragraph, Row, Scrollbar, ScrollbarOrientation, ScrollbarState,
        Table, Wrap,
    },
    Frame,
};

// Brandbook colors
const BRAND_DARK: Color = Color::Rgb(0x1F, 0x2F, 0x3C);
const BRAND_ACCENT: Color = Color::Rgb(0x58, 0x6B, 0x71);
const BRAND_SELECT_BG: Color = Color::Rgb(0xC3, 0xD3, 0xE0);
const BRAND_GREEN: Color = Color::Rgb(0x82, 0x9A, 0x68);
const BRAND_ORANGE: Color = Color::Rgb(0x9E, 0x68, 0x3C);
const BRAND_MUTED: Color = Color::Rgb(0x71, 0x65, 0x65);
const BRAND_RED: Color = Color::Rgb(0xA8, 0x3C, 0x3C);

// Styles
const HEADER_STYLE: Style = Style::new().fg(BRAND_DARK).add_modifier(Modifier::BOLD);
const SELECTED_STYLE: Style = Style::new()
    .bg(BRAND_SELECT_BG)
    .fg(BRAND_DARK)
    .add_modifier(Modifier::BOLD);
const COUNT_COLOR: Color = BRAND_GREEN;

pub fn draw_dashboard<E: ActionExecutor, P: PermissionCheck>(frame: &mut Frame, app: &App<E, P>) {
    let chunks = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Min(10),   // Tree and map
        Constraint::Length(1), // Last notice
        Constraint::Length(3), // Footer
    ])
    .split(frame.area());

    draw_header(frame, chunks[0], app);
    draw_main_content(frame, chunks[1], app);
    draw_notice(frame, chunks[2], app);
    draw_footer(frame, chunks[3], app);

    match app.screen() {
        Screen::Editor => draw_editor(frame, app),
        Screen::ConfirmRedraw => draw_prompt(frame, " Redraw ", "Save the new location? (y/n)"),
        Screen::ConfirmDelete => {
            if let InputMode::ConfirmDelete(key) = &app.input {
                let message = format!("Delete {} '{}'? (y/n)", key.kind(), key.id());
                draw_prompt(frame, " Delete ", &message);
            }
        }
        Screen::Browse | Screen::Search | Screen::Map => {}
    }
}

fn draw_header<E: ActionExecutor, P: PermissionCheck>(
    frame: &mut Frame,
    area: Rect,
    app: &App<E, P>,
) {
    let store = &app.ctx.store;
    let title = format!(
        " Parking Geofence | {} sites | {} groups | {} spots | new sites: {} ",
        store.sites().len(),
        store.groups().len(),
        store.spots().len(),
        app.ctx.subtype.label(),
    );

    let header = Paragraph::new(title)
        .style(HEADER_STYLE)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(header, area);
}

fn draw_main_content<E: ActionExecutor, P: PermissionCheck>(
    frame: &mut Frame,
    area: Rect,
    app: &App<E, P>,
) {
    let chunks = Layout::horizontal([
        Constraint::Percentage(40), // Tree
        Constraint::Percentage(60), // Map
    ])
    .split(area);

    draw_tree(frame, chunks[0], app);
    draw_map(frame, chunks[1], app);
}

fn row_label(row: &TreeRow) -> String {
    let indent = "  ".repeat(usize::from(row.depth));
    let marker = match (row.has_children, row.expanded) {
        (false, _) => "  ",
        (true, false) => "▸ ",
        (true, true) => "▾ ",
    };
    format!("{indent}{marker}{}", row.name)
}

fn draw_tree<E: ActionExecutor, P: PermissionCheck>(
    frame: &mut Frame,
    area: Rect,
    app: &App<E, P>,
) {
    let is_focused = matches!(app.screen(), Screen::Browse | Screen::Search);
    let rows = app.rows();

    // Borders and header
    let visible_rows = (area.height as usize).saturating_sub(3);
    let scroll_offset = if app.cursor >= visible_rows {
        app.cursor - visible_rows + 1
    } else {
        0
    };

    let header = Row::new(vec!["Name", "Spots"]).style(HEADER_STYLE).height(1);

    let table_rows: Vec<Row> = rows
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(visible_rows)
        .map(|(i, row)| {
            let style = if i == app.cursor && is_focused {
                SELECTED_STYLE
            } else if row.selected {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let name = Line::from(vec![
                Span::raw(row_label(row)),
                Span::styled(
                    if row.selected { " ◄" } else { "" },
                    Style::default().fg(BRAND_ORANGE),
                ),
            ]);
            let detail = Span::styled(row.detail.clone(), Style::default().fg(COUNT_COLOR));
            Row::new(vec![name, Line::from(detail)]).style(style)
        })
        .collect();

    let widths = [Constraint::Percentage(75), Constraint::Percentage(25)];

    let border_style = if is_focused {
        Style::default().fg(BRAND_ORANGE)
    } else {
        Style::default()
    };

    let title = if app.ctx.search.is_empty() && app.input != InputMode::Search {
        format!(" Sites ({}) ", app.ctx.store.sites().len())
    } else {
        format!(" Sites | search: {}_ ", app.ctx.search)
    };
    let table = Table::new(table_rows, widths).header(header).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style),
    );

    frame.render_widget(table, area);

    if rows.len() > visible_rows {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"));
        let mut scrollbar_state = ScrollbarState::new(rows.len()).position(app.cursor);

        let scrollbar_area = Rect {
            x: area.x + area.width.saturating_sub(1),
            y: area.y + 2,
            width: 1,
            height: area.height.saturating_sub(3),
        };
        frame.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);
    }
}

fn draw_ring(ctx: &mut Context, vertices: &[Coordinate], color: Color, closed: bool) {
    for pair in vertices.windows(2) {
        ctx.draw(&MapLine::new(
            pair[0].lon,
            pair[0].lat,
            pair[1].lon,
            pair[1].lat,
            color,
        ));
    }
    if closed && vertices.len() > 2 {
        let (first, last) = (vertices[0], vertices[vertices.len() - 1]);
        ctx.draw(&MapLine::new(last.lon, last.lat, first.lon, first.lat, color));
    }
}

fn highlight(selection: Option<&EntityKey>, kind: EntityKind, id: &str, color: Color) -> Color {
    if selection.is_some_and(|key| key.kind() == kind && key.id() == id) {
        BRAND_ORANGE
    } else {
        color
    }
}

fn draw_map<E: ActionExecutor, P: PermissionCheck>(
    frame: &mut Frame,
    area: Rect,
    app: &App<E, P>,
) {
    let store = &app.ctx.store;
    let selection = store.selection();
    let view = app.map.viewport();
    let cursor = app.map.cursor();
    let is_focused = app.screen() == Screen::Map;

    let title = match app.map.mode() {
        DrawMode::Off => " Map ".to_string(),
        DrawMode::Polygon => format!(
            " Map | drawing polygon ({} vertices) ",
            app.map.vertices().len()
        ),
        DrawMode::Marker => " Map | placing marker ".to_string(),
    };
    let border_style = if is_focused {
        Style::default().fg(BRAND_ORANGE)
    } else {
        Style::default()
    };

    let canvas = Canvas::default()
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(border_style),
        )
        .marker(Marker::Braille)
        .x_bounds([view.min.lon, view.max.lon])
        .y_bounds([view.min.lat, view.max.lat])
        .paint(|ctx| {
            for site in store.sites() {
                let color = highlight(selection, EntityKind::Site, &site.id, BRAND_ACCENT);
                draw_ring(ctx, site.location.vertices(), color, true);
            }
            ctx.layer();

            for group in store.groups() {
                let color = highlight(selection, EntityKind::Group, &group.id, BRAND_GREEN);
                draw_ring(ctx, group.location.vertices(), color, true);
            }
            ctx.layer();

            let coords: Vec<(f64, f64)> = store
                .spots()
                .iter()
                .map(|spot| (spot.location.lon, spot.location.lat))
                .collect();
            ctx.draw(&Points {
                coords: &coords,
                color: BRAND_DARK,
            });
            if let Some(spot) = selection
                .filter(|key| key.kind() == EntityKind::Spot)
                .and_then(|key| store.spot(key.id()))
            {
                let marker = Span::styled("●", Style::default().fg(BRAND_ORANGE));
                ctx.print(spot.location.lon, spot.location.lat, marker);
            }
            ctx.layer();

            match app.map.overlay() {
                Some(Shape::Polygon(polygon)) => {
                    draw_ring(ctx, polygon.vertices(), BRAND_RED, true);
                }
                Some(Shape::Point(point)) => {
                    let marker = Span::styled("◆", Style::default().fg(BRAND_RED));
                    ctx.print(point.lon, point.lat, marker);
                }
                None => {}
            }
            let mut pending = app.map.vertices().to_vec();
            if !pending.is_empty() {
                pending.push(cursor);
                draw_ring(ctx, &pending, BRAND_RED, false);
            }

            if app.map.mode() != DrawMode::Off {
                let marker = Span::styled(
                    "+",
                    Style::default().fg(BRAND_RED).add_modifier(Modifier::BOLD),
                );
                ctx.print(cursor.lon, cursor.lat, marker);
            }
        });

    frame.render_widget(canvas, area);
}

fn draw_notice<E: ActionExecutor, P: PermissionCheck>(
    frame: &mut Frame,
    area: Rect,
    app: &App<E, P>,
) {
    let line = if app.ctx.is_loading() {
        Line::styled(" Working…", Style::default().fg(BRAND_MUTED))
    } else if let Some(notice) = app.ctx.last_notice() {
        let color = match notice.level {
            NoticeLevel::Info => BRAND_MUTED,
            NoticeLevel::Success => BRAND_GREEN,
            NoticeLevel::Error => BRAND_RED,
        };
        Line::styled(format!(" {}", notice.message), Style::default().fg(color))
    } else {
        Line::default()
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// One footer entry; greyed out when the role may not do it.
fn key_hint(key: &'static str, label: &'static str, enabled: bool) -> [Span<'static>; 2] {
    let style = if enabled {
        Style::default().fg(BRAND_MUTED)
    } else {
        Style::default()
            .fg(BRAND_MUTED)
            .add_modifier(Modifier::DIM | Modifier::CROSSED_OUT)
    };
    [
        Span::styled(format!(" {key} {label} "), style),
        Span::styled("|", Style::default().fg(BRAND_MUTED)),
    ]
}

fn footer_hints<E: ActionExecutor, P: PermissionCheck>(app: &App<E, P>) -> Vec<Span<'static>> {
    let row_kind = app.rows().get(app.cursor).map(|row| row.key.kind());
    let selected_kind = app.ctx.store.selection().map(|key| key.kind());
    let allowed =
        |action: Action, kind: Option<EntityKind>| kind.is_some_and(|kind| app.can(action, kind));

    let hints: Vec<(&'static str, &'static str, bool)> = match app.screen() {
        Screen::Browse => vec![
            ("↑↓", "Move", true),
            ("Enter", "Select", true),
            ("Space", "Expand", true),
            ("s", "Site", app.can(Action::Create, EntityKind::Site)),
            ("g", "Group", app.can(Action::Create, EntityKind::Group)),
            ("p", "Spot", app.can(Action::Create, EntityKind::Spot)),
            ("r", "Redraw", allowed(Action::Edit, selected_kind)),
            ("v", "View", allowed(Action::View, row_kind)),
            ("e", "Edit", allowed(Action::Edit, row_kind)),
            ("d", "Delete", allowed(Action::Delete, row_kind)),
            ("Tab", "Subtype", true),
            ("/", "Search", true),
            ("q", "Quit", true),
        ],
        Screen::Search => vec![("Enter", "Done", true), ("Esc", "Clear", true)],
        Screen::Map if app.map.mode() == DrawMode::Marker => vec![
            ("←↑↓→", "Move", true),
            ("Space", "Place", true),
            ("+/-", "Zoom", true),
            ("Esc", "Cancel", true),
        ],
        Screen::Map => vec![
            ("←↑↓→", "Move", true),
            ("Space", "Vertex", true),
            ("Backspace", "Undo", true),
            ("Enter", "Finish", true),
            ("+/-", "Zoom", true),
            ("Esc", "Cancel", true),
        ],
        Screen::Editor if app.form.as_ref().is_some_and(|f| f.is_read_only()) => {
            vec![("Esc", "Close", true)]
        }
        Screen::Editor => vec![
            ("Tab", "Next field", true),
            ("←→", "Change", true),
            ("Enter", "Save", true),
            ("Esc", "Cancel", true),
        ],
        Screen::ConfirmRedraw => vec![("y", "Save location", true), ("n", "Discard", true)],
        Screen::ConfirmDelete => vec![("y", "Delete", true), ("n", "Keep", true)],
    };

    hints
        .into_iter()
        .flat_map(|(key, label, enabled)| key_hint(key, label, enabled))
        .collect()
}

fn draw_footer<E: ActionExecutor, P: PermissionCheck>(
    frame: &mut Frame,
    area: Rect,
    app: &App<E, P>,
) {
    let footer = Paragraph::new(Line::from(footer_hints(app)))
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(footer, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    area
}

fn draw_prompt(frame: &mut Frame, title: &str, message: &str) {
    let area = centered(frame.area(), 48, 5);
    let prompt = Paragraph::new(message)
        .wrap(Wrap { trim: true })
        .style(HEADER_STYLE)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(BRAND_ORANGE)),
        );
    frame.render_widget(Clear, area);
    frame.render_widget(prompt, area);
}

fn draw_editor<E: ActionExecutor, P: PermissionCheck>(frame: &mut Frame, app: &App<E, P>) {
    let Some(form) = &app.form else {
        return;
    };
    let fields = form.fields();
    let height = u16::try_from(fields.len()).unwrap_or(u16::MAX).saturating_add(3);
    let area = centered(frame.area(), 60, height);

    let rows: Vec<Row> = fields
        .iter()
        .map(|&field| {
            let focused = field == form.focused() && !form.is_read_only();
            let value = form.value(field);
            let value = match (focused, field.is_choice()) {
                (true, true) => format!("‹ {value} ›"),
                (true, false) => format!("{value}_"),
                (false, _) => value,
            };
            let style = if focused {
                SELECTED_STYLE
            } else {
                Style::default()
            };
            Row::new(vec![field.label().to_string(), value]).style(style)
        })
        .collect();

    let action = match (form.is_read_only(), app.ctx.session().modal_state()) {
        (true, _) => "View",
        (false, Some(ModalState::Create)) => "New",
        (false, _) => "Edit",
    };
    let title = format!(" {action} {} ", form.kind().label().to_lowercase());

    let widths = [Constraint::Percentage(35), Constraint::Percentage(65)];
    let header = Row::new(vec!["Field", "Value"]).style(HEADER_STYLE);
    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(BRAND_ORANGE)),
    );

    frame.render_widget(Clear, area);
    frame.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::geofence::{EditorContext, HierarchyCoordinator};
    use crate::model::{Polygon, Site, SiteSubtype};
    use crate::permissions::{Role, RolePermissions};
    use crate::remote::LocalBackend;
    use crate::ui::MapView;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn backend() -> LocalBackend {
        let mut dataset = Dataset::default();
        let sites = [
            ("urn:ngsi-ld:OnStreetParking:0001", "Harbour"),
            ("urn:ngsi-ld:OnStreetParking:0002", "Quay"),
        ];
        for (id, name) in sites {
            dataset.sites.push(Site {
                id: id.into(),
                subtype: SiteSubtype::OnStreet,
                name: name.into(),
                location: Polygon::from_pairs(&[
                    [0.0, 0.0],
                    [0.0, 1.0],
                    [1.0, 1.0],
                    [0.0, 0.0],
                ]),
                ref_operator: None,
                total_spot_number: 0,
                available_spot_number: 0,
            });
        }
        LocalBackend::new(dataset)
    }

    #[tokio::test]
    async fn test_tiny_terminal_does_not_panic() {
        let backend = backend();
        let coordinator = HierarchyCoordinator::new(&backend, RolePermissions::new(Role::Admin));
        let mut app = App::new(EditorContext::default(), coordinator, MapView::default());
        app.reload().await;
        assert_eq!(app.rows().len(), 2);

        for (width, height) in [(20, 6), (8, 3), (1, 1)] {
            let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
            terminal
                .draw(|frame| draw_dashboard(frame, &app))
                .unwrap();
        }
    }
}
