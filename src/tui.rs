use crate::error::AppError;
use crate::note::NoteKind;
use crate::session::Session;
use crate::store::NoteStore;
use crate::workflow::{self, NewNote, NoteEdit, NoteView};
use crate::{args::Args, config::Config, editor};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info, warn};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use std::{io, time::Duration};
use uuid::Uuid;
use zeroize::Zeroizing;

/// Password prompts offered when an unlock expires while the editor is open.
const REUNLOCK_ATTEMPTS: usize = 3;

/// Temporarily leaves raw mode and the alternate screen, executes a block of
/// code (prompts, the external editor) and then restores the TUI.
macro_rules! terminal_mode_guard {
    ($terminal:expr, $action:block) => {
        disable_raw_mode().map_err(AppError::Io)?;
        execute!($terminal.backend_mut(), LeaveAlternateScreen).map_err(AppError::Io)?;
        $terminal.show_cursor().map_err(|e| AppError::Tui(e.to_string()))?;

        // run the action to run in this guard
        $action

        execute!($terminal.backend_mut(), EnterAlternateScreen).map_err(AppError::Io)?;
        enable_raw_mode().map_err(AppError::Io)?;
        $terminal.hide_cursor().map_err(|e| AppError::Tui(e.to_string()))?;
        $terminal.clear().map_err(|e| AppError::Tui(e.to_string()))?;
    };
}

type Term = Terminal<CrosstermBackend<io::Stdout>>;

#[derive(Debug, PartialEq, Eq)]
enum RunningState {
    Running,
    Quit,
}

#[derive(Debug)]
enum Message {
    Tick,
    Quit,
    NewNote,
    EditSelectedNote,
    ToggleLock,
    DeleteSelectedNote,
    LockAll,
    ScrollUp,
    ScrollDown,
}

struct NoteRow {
    id: Uuid,
    title: String,
    is_locked: bool,
    kind: NoteKind,
}

pub struct App {
    user_id: u64,
    store: NoteStore,
    session: Session,
    args: Args,
    notes: Vec<NoteRow>,
    list_state: ListState,
    selected_note_index: usize,
    note_preview_content: String,
    status: String,
    running_state: RunningState,
}

impl App {
    pub fn new(config: &Config, store: NoteStore, args: Args) -> Result<Self, AppError> {
        let mut app = Self {
            user_id: config.user_id,
            store,
            session: Session::with_timeout(config.session_timeout()),
            args,
            notes: Vec::new(),
            list_state: ListState::default(),
            selected_note_index: 0,
            note_preview_content: String::new(),
            status: String::new(),
            running_state: RunningState::Running,
        };
        app.reload_notes()?;
        Ok(app)
    }

    pub fn run(&mut self) -> Result<(), AppError> {
        enable_raw_mode().map_err(AppError::Io)?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(AppError::Io)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).map_err(|e| AppError::Tui(e.to_string()))?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode().map_err(AppError::Io)?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen).map_err(AppError::Io)?;
        terminal
            .show_cursor()
            .map_err(|e| AppError::Tui(e.to_string()))?;
        self.session.clear();
        result?;
        self.store.save()
    }

    fn event_loop(&mut self, terminal: &mut Term) -> Result<(), AppError> {
        while self.running_state == RunningState::Running {
            terminal
                .draw(|f| self.view(f))
                .map_err(|e| AppError::Tui(e.to_string()))?;

            let message = self.handle_event()?;
            self.update(message, terminal)?;
        }
        Ok(())
    }

    fn handle_event(&self) -> Result<Message, AppError> {
        if !event::poll(Duration::from_millis(250)).map_err(AppError::Io)? {
            return Ok(Message::Tick);
        }
        if let Event::Key(key) = event::read().map_err(AppError::Io)? {
            let message = match key.code {
                KeyCode::Char('q') => Message::Quit,
                KeyCode::Char('n') => Message::NewNote,
                KeyCode::Char('l') => Message::ToggleLock,
                KeyCode::Char('d') => Message::DeleteSelectedNote,
                KeyCode::Char('x') => Message::LockAll,
                KeyCode::Down => Message::ScrollDown,
                KeyCode::Up => Message::ScrollUp,
                KeyCode::Enter => Message::EditSelectedNote,
                _ => Message::Tick,
            };
            Ok(message)
        } else {
            Ok(Message::Tick)
        }
    }

    fn update(&mut self, message: Message, terminal: &mut Term) -> Result<(), AppError> {
        match message {
            Message::Quit => {
                self.running_state = RunningState::Quit;
            }
            Message::NewNote => {
                terminal_mode_guard!(terminal, {
                    let result = self.new_note();
                    self.report(result)?;
                });
            }
            Message::EditSelectedNote => {
                if let Some(id) = self.selected_id() {
                    terminal_mode_guard!(terminal, {
                        let result = self.edit_note(&id);
                        self.report(result)?;
                    });
                }
            }
            Message::ToggleLock => {
                if let Some(id) = self.selected_id() {
                    terminal_mode_guard!(terminal, {
                        let result = self.toggle_lock(&id);
                        self.report(result)?;
                    });
                }
            }
            Message::DeleteSelectedNote => {
                if let Some(id) = self.selected_id() {
                    terminal_mode_guard!(terminal, {
                        let result = self.delete_note(&id);
                        self.report(result)?;
                    });
                }
            }
            Message::LockAll => {
                self.session.clear();
                self.status = "All notes locked.".to_string();
            }
            Message::ScrollDown => {
                if self.selected_note_index < self.notes.len().saturating_sub(1) {
                    self.selected_note_index += 1;
                }
            }
            Message::ScrollUp => {
                self.selected_note_index = self.selected_note_index.saturating_sub(1);
            }
            Message::Tick => {}
        }
        self.reload_notes()
    }

    /// Shows recoverable failures in the status line; anything else ends the app.
    fn report(&mut self, result: Result<String, AppError>) -> Result<(), AppError> {
        match result {
            Ok(status) => {
                self.status = status;
                Ok(())
            }
            Err(e) if e.is_recoverable() => {
                self.status = e.to_string();
                Ok(())
            }
            Err(e) => {
                error!("{e}");
                Err(e)
            }
        }
    }

    fn selected_id(&self) -> Option<Uuid> {
        self.notes.get(self.selected_note_index).map(|row| row.id)
    }

    /// Returns the readable content of `id`, asking for the password if the
    /// note is locked and not unlocked in this session.
    fn readable_content(&mut self, id: &Uuid) -> Result<(String, String, bool), AppError> {
        match workflow::open_note(&self.store, &mut self.session, self.user_id, id)? {
            NoteView::Plain { title, content } => Ok((title, content, false)),
            NoteView::Unlocked { title, content } => Ok((title, content, true)),
            NoteView::PasswordRequired { title } => {
                let password = editor::prompt_password(&format!("Password for \"{title}\": "))?;
                workflow::unlock(
                    &self.store,
                    &mut self.session,
                    self.user_id,
                    id,
                    Some(password.as_str()),
                )?;
                match workflow::open_note(&self.store, &mut self.session, self.user_id, id)? {
                    NoteView::Unlocked { title, content } => Ok((title, content, true)),
                    _ => Err(AppError::SessionExpired),
                }
            }
        }
    }

    fn new_note(&mut self) -> Result<String, AppError> {
        let title = editor::prompt_line("Title: ")?;
        let id = workflow::create_note(
            &mut self.store,
            self.user_id,
            NewNote {
                title,
                ..NewNote::default()
            },
        )?;
        self.store.save()?;
        self.select(&id);
        Ok("Note created.".to_string())
    }

    fn edit_note(&mut self, id: &Uuid) -> Result<String, AppError> {
        let (title, content, locked) = self.readable_content(id)?;
        let edited = editor::edit_text(&self.args, &content)?;
        if *edited == content {
            return Ok("No changes.".to_string());
        }

        if locked {
            self.save_locked_edit(id, &edited, || {
                editor::prompt_password("Unlock expired. Password to save your changes: ")
            })?;
        } else {
            let edit = NoteEdit {
                title,
                content: edited.to_string(),
                ..NoteEdit::default()
            };
            workflow::save_note(&mut self.store, &mut self.session, self.user_id, id, edit)?;
        }
        self.store.save()?;
        info!("Note {id} saved from editor");
        Ok("Note saved.".to_string())
    }

    /// Saves an edited locked note. If the unlock expired meanwhile the
    /// password is asked again and the save retried with the same buffer.
    fn save_locked_edit<F>(
        &mut self,
        id: &Uuid,
        edited: &str,
        mut ask_password: F,
    ) -> Result<(), AppError>
    where
        F: FnMut() -> Result<Zeroizing<String>, AppError>,
    {
        let mut attempts = 0;
        loop {
            let saved =
                workflow::save_locked(&mut self.store, &mut self.session, self.user_id, id, edited);
            match saved {
                Err(AppError::SessionExpired) if attempts < REUNLOCK_ATTEMPTS => {
                    attempts += 1;
                    warn!("Unlock of note {id} expired while editing");
                    let password = ask_password()?;
                    match workflow::unlock(
                        &self.store,
                        &mut self.session,
                        self.user_id,
                        id,
                        Some(password.as_str()),
                    ) {
                        Ok(()) | Err(AppError::Authentication) => {}
                        Err(e) => return Err(e),
                    }
                }
                saved => return saved.map(|_| ()),
            }
        }
    }

    fn toggle_lock(&mut self, id: &Uuid) -> Result<String, AppError> {
        let (title, content, locked) = self.readable_content(id)?;
        let edit = if locked {
            NoteEdit {
                title,
                content,
                lock: false,
                password: None,
            }
        } else {
            let password = editor::prompt_password("New password: ")?;
            let confirmation = editor::prompt_password("Repeat password: ")?;
            if *password != *confirmation {
                return Err(AppError::Validation("Passwords do not match.".to_string()));
            }
            NoteEdit {
                title,
                content,
                lock: true,
                password: Some(password.to_string()),
            }
        };

        workflow::save_note(&mut self.store, &mut self.session, self.user_id, id, edit)?;
        self.store.save()?;
        Ok(if locked { "Note unlocked." } else { "Note locked." }.to_string())
    }

    fn delete_note(&mut self, id: &Uuid) -> Result<String, AppError> {
        let title = self
            .notes
            .iter()
            .find(|row| row.id == *id)
            .map(|row| row.title.clone())
            .unwrap_or_default();
        let answer = editor::prompt_line(&format!("Delete \"{title}\"? [y/N] "))?;
        if !answer.eq_ignore_ascii_case("y") {
            return Ok("Delete cancelled.".to_string());
        }
        workflow::delete_note(&mut self.store, &mut self.session, self.user_id, id)?;
        self.store.save()?;
        Ok("Note deleted.".to_string())
    }

    fn select(&mut self, id: &Uuid) {
        self.reload_rows();
        if let Some(index) = self.notes.iter().position(|row| row.id == *id) {
            self.selected_note_index = index;
        }
    }

    fn reload_rows(&mut self) {
        self.notes = self
            .store
            .notes_for_user(self.user_id)
            .into_iter()
            .map(|note| NoteRow {
                id: note.id,
                title: note.title.clone(),
                is_locked: note.is_locked,
                kind: note.kind,
            })
            .collect();
    }

    fn reload_notes(&mut self) -> Result<(), AppError> {
        self.reload_rows();
        self.selected_note_index = self
            .selected_note_index
            .min(self.notes.len().saturating_sub(1));
        self.list_state = ListState::default();
        if !self.notes.is_empty() {
            self.list_state.select(Some(self.selected_note_index));
        }
        self.note_preview_content = self.load_preview_content()?;
        Ok(())
    }

    fn load_preview_content(&mut self) -> Result<String, AppError> {
        let Some(id) = self.selected_id() else {
            return Ok("No note selected.".to_string());
        };
        let view = workflow::preview_note(&self.store, &mut self.session, self.user_id, &id);
        match view {
            Ok(NoteView::Plain { content, .. }) | Ok(NoteView::Unlocked { content, .. }) => {
                Ok(content)
            }
            Ok(NoteView::PasswordRequired { .. }) => {
                Ok("This note is locked. Press Enter to unlock it.".to_string())
            }
            Err(e) if e.is_recoverable() => Ok(format!("Error reading note: {e}")),
            Err(e) => Err(e),
        }
    }

    fn row_label(&self, row: &NoteRow) -> String {
        let marker = match (row.is_locked, row.kind) {
            (true, _) if self.session.is_unlocked(&row.id) => "[unlocked] ",
            (true, _) => "[locked] ",
            (false, NoteKind::Canvas) => "[canvas] ",
            (false, NoteKind::Markdown) => "",
        };
        format!("{marker}{}", row.title)
    }

    fn view(&mut self, f: &mut ratatui::Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints(
                [
                    Constraint::Percentage(60),
                    Constraint::Percentage(30),
                    Constraint::Min(4),
                ]
                .as_ref(),
            )
            .split(f.area());

        let items: Vec<_> = self
            .notes
            .iter()
            .map(|row| ListItem::new(self.row_label(row)))
            .collect();
        let notes_list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Notes"))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(">> ");
        f.render_stateful_widget(notes_list, chunks[0], &mut self.list_state);

        let preview_paragraph = Paragraph::new(self.note_preview_content.clone())
            .block(Block::default().borders(Borders::ALL).title("Preview"));
        f.render_widget(preview_paragraph, chunks[1]);

        let help_text = vec![
            Line::from(vec![
                Span::raw("Up/Down: Navigate  "),
                Span::raw("Enter: Open/Edit  "),
                Span::raw("n: New  "),
                Span::raw("l: Lock/Unlock  "),
                Span::raw("d: Delete  "),
                Span::raw("x: Lock all  "),
                Span::raw("q: Quit"),
            ]),
            Line::from(Span::styled(
                self.status.clone(),
                Style::default().fg(Color::Cyan),
            )),
        ];
        let help = Paragraph::new(help_text).block(Block::default().borders(Borders::ALL));
        f.render_widget(help, chunks[2]);
    }
}
