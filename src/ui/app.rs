use super::form::EditorForm;
use super::map_view::{DrawMode, MapView};
use crate::geofence::session::EditorMode;
use crate::geofence::{
    Command, EditorContext, EntityDraft, GroupDraft, HierarchyCoordinator, NoticeLevel,
    SessionState, SiteDraft, SpotDraft, TreeRow, Verb,
};
use crate::map::MapSurface;
use crate::model::{Choice, EntityKey, EntityKind, Shape};
use crate::permissions::{Action, PermissionCheck};
use crate::remote::ActionExecutor;
use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{DefaultTerminal, Frame};

/// Keyboard mode while no drawing session is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Browse,
    Search,
    ConfirmDelete(EntityKey),
}

/// What currently owns the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Browse,
    Search,
    ConfirmDelete,
    Map,
    Editor,
    ConfirmRedraw,
}

pub struct App<E, P> {
    pub ctx: EditorContext,
    pub map: MapView,
    pub form: Option<EditorForm>,
    pub input: InputMode,
    /// Highlighted row of the tree table.
    pub cursor: usize,
    pub should_quit: bool,
    coordinator: HierarchyCoordinator<E, P>,
}

impl<E: ActionExecutor, P: PermissionCheck> App<E, P> {
    #[must_use]
    pub fn new(ctx: EditorContext, coordinator: HierarchyCoordinator<E, P>, map: MapView) -> Self {
        Self {
            ctx,
            map,
            form: None,
            input: InputMode::Browse,
            cursor: 0,
            should_quit: false,
            coordinator,
        }
    }

    pub fn can(&self, action: Action, kind: EntityKind) -> bool {
        self.coordinator.can(action, kind)
    }

    pub async fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        self.reload().await;
        while !self.should_quit {
            terminal.draw(|frame| self.draw(frame))?;
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key).await;
                }
            }
        }
        Ok(())
    }

    fn draw(&self, frame: &mut Frame) {
        super::dashboard::draw_dashboard(frame, self);
    }

    /// Reloads the whole inventory and frames it on the map.
    pub async fn reload(&mut self) {
        if self.coordinator.load(&mut self.ctx).await.is_ok() {
            self.map.fit(&self.ctx.store);
        }
        self.clamp_cursor();
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        match self.ctx.session() {
            SessionState::Capturing(_) => Screen::Map,
            SessionState::Editor(_) => Screen::Editor,
            SessionState::ConfirmRedraw { .. } => Screen::ConfirmRedraw,
            SessionState::Idle => match self.input {
                InputMode::Browse => Screen::Browse,
                InputMode::Search => Screen::Search,
                InputMode::ConfirmDelete(_) => Screen::ConfirmDelete,
            },
        }
    }

    #[must_use]
    pub fn rows(&self) -> Vec<TreeRow> {
        self.ctx.rows()
    }

    fn current_row(&self) -> Option<TreeRow> {
        self.rows().into_iter().nth(self.cursor)
    }

    pub async fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen() {
            Screen::Browse => self.handle_browse_keys(key.code).await,
            Screen::Search => self.handle_search_keys(key.code),
            Screen::ConfirmDelete => self.handle_delete_keys(key.code).await,
            Screen::Map => self.handle_map_keys(key.code),
            Screen::Editor => self.handle_editor_keys(key.code).await,
            Screen::ConfirmRedraw => self.handle_redraw_keys(key.code).await,
        }

        // Failures below are already shown as notices.
        if let Some(shape) = self.map.take_completed_shape() {
            let _ = self
                .coordinator
                .shape_captured(&mut self.ctx, shape, &mut self.map);
        }
        if !self.ctx.session().is_idle() {
            self.input = InputMode::Browse;
        }
        self.sync_form();
        self.clamp_cursor();
    }

    async fn handle_browse_keys(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => {
                let _ = self.ctx.select(None);
            }
            KeyCode::Up | KeyCode::Char('k') => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.cursor += 1,
            KeyCode::Right | KeyCode::Left | KeyCode::Char(' ' | 'l' | 'h') => {
                if let Some(row) = self.current_row() {
                    if row.has_children {
                        self.ctx.expansion.toggle(&row.key);
                    }
                }
            }
            KeyCode::Enter => self.row_command(Verb::Select).await,
            KeyCode::Char('v') => self.row_command(Verb::View).await,
            KeyCode::Char('e') => self.row_command(Verb::Edit).await,
            KeyCode::Char('d') => {
                if let Some(row) = self.current_row() {
                    self.input = InputMode::ConfirmDelete(row.key);
                }
            }
            KeyCode::Char('s') => self.start_drawing(EntityKind::Site),
            KeyCode::Char('g') => self.start_drawing(EntityKind::Group),
            KeyCode::Char('p') => self.start_drawing(EntityKind::Spot),
            KeyCode::Char('r') => {
                let _ = self.coordinator.start_redraw(&mut self.ctx, &mut self.map);
            }
            KeyCode::Tab => {
                self.ctx.subtype = self.ctx.subtype.next();
                let message = format!("New sites will be {}", self.ctx.subtype.label());
                self.ctx.notify(NoticeLevel::Info, message);
            }
            KeyCode::Char('/') => self.input = InputMode::Search,
            KeyCode::Char('f') => self.map.fit(&self.ctx.store),
            KeyCode::Char('R') | KeyCode::F(5) => self.reload().await,
            _ => {}
        }
    }

    fn start_drawing(&mut self, kind: EntityKind) {
        let _ = self
            .coordinator
            .start_drawing(&mut self.ctx, kind, &mut self.map);
    }

    async fn row_command(&mut self, verb: Verb) {
        let Some(row) = self.current_row() else {
            return;
        };
        let command = Command::new(verb, row.key.clone());
        let result = self
            .coordinator
            .dispatch(&mut self.ctx, command, &mut self.map)
            .await;
        if verb == Verb::Select && result.is_ok() {
            if let Some(shape) = self.location_of(&row.key) {
                self.map.focus(&shape);
            }
            self.follow_selection();
        }
    }

    fn handle_search_keys(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter => self.input = InputMode::Browse,
            KeyCode::Esc => {
                self.ctx.search.clear();
                self.input = InputMode::Browse;
            }
            KeyCode::Backspace => {
                self.ctx.search.pop();
            }
            KeyCode::Char(c) => self.ctx.search.push(c),
            _ => {}
        }
        self.cursor = 0;
    }

    async fn handle_delete_keys(&mut self, code: KeyCode) {
        let InputMode::ConfirmDelete(key) = std::mem::replace(&mut self.input, InputMode::Browse)
        else {
            return;
        };
        if matches!(code, KeyCode::Char('y' | 'Y')) {
            let _ = self.coordinator.delete(&mut self.ctx, &key).await;
        }
    }

    fn handle_map_keys(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => self.coordinator.cancel(&mut self.ctx, &mut self.map),
            KeyCode::Up | KeyCode::Char('k') => self.map.move_cursor(0, 1),
            KeyCode::Down | KeyCode::Char('j') => self.map.move_cursor(0, -1),
            KeyCode::Left | KeyCode::Char('h') => self.map.move_cursor(-1, 0),
            KeyCode::Right | KeyCode::Char('l') => self.map.move_cursor(1, 0),
            KeyCode::Char(' ') => self.map.place(),
            KeyCode::Enter => match self.map.mode() {
                DrawMode::Polygon => {
                    if !self.map.finish_polygon() {
                        self.ctx
                            .notify(NoticeLevel::Info, "Place at least three vertices first");
                    }
                }
                DrawMode::Marker => self.map.place(),
                DrawMode::Off => {}
            },
            KeyCode::Backspace => self.map.undo_vertex(),
            KeyCode::Char('+' | '=') => self.map.zoom_in(),
            KeyCode::Char('-') => self.map.zoom_out(),
            _ => {}
        }
    }

    async fn handle_editor_keys(&mut self, code: KeyCode) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        if form.is_read_only() {
            if matches!(code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                self.coordinator.cancel(&mut self.ctx, &mut self.map);
            }
            return;
        }
        match code {
            KeyCode::Esc => self.coordinator.cancel(&mut self.ctx, &mut self.map),
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Left => form.cycle(false),
            KeyCode::Right => form.cycle(true),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(' ') if form.focused().is_choice() => form.cycle(true),
            KeyCode::Char(c) => form.insert(c),
            KeyCode::Enter => match form.to_draft() {
                Ok(draft) => {
                    let _ = self
                        .coordinator
                        .submit(&mut self.ctx, draft, &mut self.map)
                        .await;
                }
                Err(error) => self.ctx.notify(NoticeLevel::Error, error.to_string()),
            },
            _ => {}
        }
    }

    async fn handle_redraw_keys(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('y' | 'Y') | KeyCode::Enter => {
                let _ = self
                    .coordinator
                    .confirm_redraw(&mut self.ctx, &mut self.map)
                    .await;
            }
            KeyCode::Char('n' | 'N') | KeyCode::Esc => {
                self.coordinator.cancel(&mut self.ctx, &mut self.map);
            }
            _ => {}
        }
    }

    /// Opens or closes the editor form to match the drawing session.
    /// An open form is kept as is, so input survives a rejected save.
    fn sync_form(&mut self) {
        let mode = match self.ctx.session() {
            SessionState::Editor(mode) => mode.clone(),
            _ => {
                self.form = None;
                return;
            }
        };
        if self.form.is_some() {
            return;
        }
        self.form = match mode {
            EditorMode::Create { parent, .. } => {
                Some(EditorForm::new(EntityDraft::blank(parent.kind()), false))
            }
            EditorMode::Edit(key) => self.draft_of(&key).map(|d| EditorForm::new(d, false)),
            EditorMode::View(key) => self.draft_of(&key).map(|d| EditorForm::new(d, true)),
        };
    }

    fn draft_of(&self, key: &EntityKey) -> Option<EntityDraft> {
        let store = &self.ctx.store;
        match key {
            EntityKey::Site { id, .. } => store
                .site(id)
                .map(|site| EntityDraft::Site(SiteDraft::from(site))),
            EntityKey::Group { id } => store
                .group(id)
                .map(|group| EntityDraft::Group(GroupDraft::from(group))),
            EntityKey::Spot { id } => store
                .spot(id)
                .map(|spot| EntityDraft::Spot(SpotDraft::from(spot))),
        }
    }

    fn location_of(&self, key: &EntityKey) -> Option<Shape> {
        let store = &self.ctx.store;
        match key {
            EntityKey::Site { id, .. } => store
                .site(id)
                .map(|site| Shape::Polygon(site.location.clone())),
            EntityKey::Group { id } => store
                .group(id)
                .map(|group| Shape::Polygon(group.location.clone())),
            EntityKey::Spot { id } => store.spot(id).map(|spot| Shape::Point(spot.location)),
        }
    }

    /// Moves the table cursor onto the selected row.
    fn follow_selection(&mut self) {
        let Some(selected) = self.ctx.store.selection() else {
            return;
        };
        if let Some(index) = self.rows().iter().position(|row| &row.key == selected) {
            self.cursor = index;
        }
    }

    fn clamp_cursor(&mut self) {
        let len = self.rows().len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }
}
