use std::{io, thread, time::Duration};

use anyhow::{Context, Result};
use armylist_core::{
    catalog::Faction,
    config::AppConfig,
    engine::{Command, CostEngine, RosterStore},
    export::ExportPayload,
    models::{EntryCategory, EntryId, FactionId, LoadoutSlot, Locale, UnitCategory, UnitTemplate},
    save::{SaveEntry, SaveManager},
    CatalogStore,
};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_SAVE_NAME_LEN: usize = 64;
const MAX_BUDGET_DIGITS: usize = 6;
const MENU_ITEMS: [&str; 3] = ["New Roster", "Continue", "Quit"];

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Filter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Menu,
    Setup,
    Factions,
    Builder,
    Saves,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Catalog,
    Roster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetupField {
    Budget,
    Locale,
}

/// Cursor into a list whose length can change between frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Selection {
    index: usize,
}

impl Selection {
    fn move_by(&mut self, delta: isize, total: usize) {
        if total == 0 {
            self.index = 0;
            return;
        }
        let mut idx = self.index as isize + delta;
        if idx < 0 {
            idx = 0;
        } else if idx >= total as isize {
            idx = total as isize - 1;
        }
        self.index = idx as usize;
    }

    fn move_to_end(&mut self, total: usize) {
        self.index = total.saturating_sub(1);
    }

    fn clamp(&mut self, total: usize) {
        self.move_by(0, total);
    }

    fn list_state(&self, total: usize) -> ListState {
        let mut state = ListState::default();
        if total > 0 {
            state.select(Some(self.index.min(total - 1)));
        }
        state
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PromptPurpose {
    SaveName(FactionId),
    Budget,
}

/// Single-line text input shown as a modal.
#[derive(Debug, Clone)]
struct TextPrompt {
    input: String,
    /// Position in characters, not bytes.
    cursor: usize,
    default: String,
    purpose: PromptPurpose,
}

impl TextPrompt {
    fn new(purpose: PromptPurpose, default: String) -> Self {
        Self {
            cursor: default.chars().count(),
            input: default.clone(),
            default,
            purpose,
        }
    }

    fn digits_only(&self) -> bool {
        self.purpose == PromptPurpose::Budget
    }

    fn max_len(&self) -> usize {
        if self.digits_only() {
            MAX_BUDGET_DIGITS
        } else {
            MAX_SAVE_NAME_LEN
        }
    }

    fn len(&self) -> usize {
        self.input.chars().count()
    }

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor)
            .map(|(idx, _)| idx)
            .unwrap_or(self.input.len())
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.len() as isize;
        let next = (self.cursor as isize + delta).clamp(0, len);
        self.cursor = next as usize;
    }

    fn move_home(&mut self) {
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.cursor = self.len();
    }

    fn insert(&mut self, ch: char) {
        if self.len() >= self.max_len() || ch.is_control() {
            return;
        }
        if self.digits_only() && !ch.is_ascii_digit() {
            return;
        }
        let idx = self.byte_index();
        self.input.insert(idx, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let idx = self.byte_index();
            self.input.remove(idx);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.len() {
            let idx = self.byte_index();
            self.input.remove(idx);
        }
    }

    fn value(&self) -> String {
        let trimmed = self.input.trim();
        if trimmed.is_empty() {
            self.default.clone()
        } else {
            trimmed.to_string()
        }
    }
}

/// Modal listing one catalog loadout slot for a roster entry.
#[derive(Debug, Clone)]
struct LoadoutPicker {
    entry: EntryId,
    slot: LoadoutSlot,
    selection: Selection,
}

impl LoadoutPicker {
    fn new(entry: EntryId) -> Self {
        Self {
            entry,
            slot: LoadoutSlot::Spell,
            selection: Selection::default(),
        }
    }

    fn cycle_slot(&mut self, delta: isize) {
        let slots = LoadoutSlot::ALL;
        let current = slots
            .iter()
            .position(|slot| *slot == self.slot)
            .unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(slots.len() as isize) as usize;
        self.slot = slots[next];
        self.selection = Selection::default();
    }
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// Terminal front end for the roster builder. Every rule decision is left
/// to the [`RosterStore`]; this type only forwards commands and renders.
pub struct ArmyApp {
    config: AppConfig,
    catalogs: CatalogStore,
    store: RosterStore,
    save_manager: SaveManager,
    saves: Vec<SaveEntry>,
    active_save: Option<SaveEntry>,
    state: UiState,
    prompt: Option<TextPrompt>,
    picker: Option<LoadoutPicker>,
    theme: Theme,
}

impl ArmyApp {
    pub fn new(config: AppConfig, catalogs: CatalogStore, save_manager: SaveManager) -> Result<Self> {
        let catalog = catalogs.catalog().context("failed to load active catalog")?;
        let store = RosterStore::new(catalog, config.rules.clone(), config.default_budget);
        Ok(Self {
            config,
            catalogs,
            store,
            save_manager,
            saves: Vec::new(),
            active_save: None,
            state: UiState::default(),
            prompt: None,
            picker: None,
            theme: Theme::default(),
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        self.reload_factions()?;
        let mut status = format!(
            "Loaded {} factions ({})",
            self.state.factions.len(),
            self.catalogs.locale()
        );
        if let Some(edition) = self.catalogs.manifest().and_then(|manifest| manifest.edition) {
            status.push_str(&format!(" • edition {edition}"));
        }
        self.state.set_status(status);
        if let Err(err) = self.refresh_saves() {
            self.state.set_status(format!("Failed to load saves: {err}"));
        }

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }
            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if let Err(err) = self.handle_input(event) {
                    error!(?err, "input handling failed");
                    self.state.set_status(format!("Error: {err}"));
                }
                true
            }
            Some(AppEvent::Tick) => {
                self.handle_tick();
                true
            }
            None => false,
        }
    }

    fn handle_tick(&mut self) {
        if self.screen_is(Screen::Factions) && self.state.mode == Mode::Filter {
            self.state
                .set_status(format!("Filter: {}", self.state.filter));
        }
    }

    fn screen_is(&self, screen: Screen) -> bool {
        self.state.screen == screen
    }

    fn reload_factions(&mut self) -> Result<()> {
        self.state.factions = self.catalogs.factions_matching(&self.state.filter)?;
        let total = self.state.factions.len();
        self.state.faction_selection.clamp(total);
        Ok(())
    }

    fn refresh_saves(&mut self) -> Result<()> {
        self.saves = self.save_manager.entries()?;
        let total = self.saves.len();
        self.state.save_selection.clamp(total);
        Ok(())
    }

    /// Forward `command` to the store, auto-saving when it is accepted.
    fn dispatch(&mut self, command: Command, done: String) -> bool {
        let outcome = self.store.apply(command);
        match outcome.result {
            Ok(()) => {
                self.state.set_status(done);
                if let Err(err) = self.persist_active_roster() {
                    error!(?err, "auto-save failed");
                    self.state.set_status(format!("Auto-save failed: {err}"));
                }
                true
            }
            Err(err) => {
                warn!(code = err.code(), %err, "command rejected");
                self.state.set_status(format!("Rejected: {err}"));
                false
            }
        }
    }

    fn persist_active_roster(&mut self) -> Result<()> {
        let Some(active) = self.active_save.clone() else {
            return Ok(());
        };
        let roster = self.store.snapshot();
        let updated = self
            .save_manager
            .update_save(&active, &roster, &self.catalogs.locale())
            .context("failed to update save file")?;
        self.replace_save_entry(updated);
        Ok(())
    }

    fn replace_save_entry(&mut self, updated: SaveEntry) {
        self.active_save = Some(updated.clone());
        if let Some(entry) = self
            .saves
            .iter_mut()
            .find(|entry| entry.path == updated.path)
        {
            *entry = updated;
            self.saves.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        }
    }

    fn apply_history_step(&mut self, delta: isize) -> Result<()> {
        let Some(active) = self.active_save.clone() else {
            self.state
                .set_status("History unavailable: no save loaded".to_string());
            return Ok(());
        };
        let payload = self
            .save_manager
            .load(&active)
            .context("load save payload for history navigation")?;
        let total = payload.history_len();
        if total <= 1 {
            self.state
                .set_status("History unavailable for this save".to_string());
            return Ok(());
        }
        let current = payload.history_index() as isize;
        let target = current + delta;
        if target < 0 || target >= total as isize {
            let message = if delta < 0 {
                "Already at oldest history entry"
            } else {
                "Already at newest history entry"
            };
            self.state.set_status(message.to_string());
            return Ok(());
        }
        let (updated_entry, updated_payload) = self
            .save_manager
            .set_history_index(&active, target as usize)
            .context("update save history index")?;
        self.store
            .restore(updated_payload.roster().clone())
            .context("restore roster from history entry")?;
        let catalog = self.store.catalog().clone();
        self.store.relocalize(catalog);
        self.replace_save_entry(updated_entry);

        let position = updated_payload.history_index() + 1;
        let message = if delta < 0 {
            format!("Undo applied ({position}/{total})")
        } else {
            format!("Redo applied ({position}/{total})")
        };
        self.state.set_status(message);
        Ok(())
    }

    fn load_save_entry(&mut self, entry: SaveEntry) -> Result<()> {
        let payload = self.save_manager.load(&entry)?;
        if payload.locale() != &self.catalogs.locale()
            && self.catalogs.locales().contains(payload.locale())
        {
            let catalog = self.catalogs.set_locale(payload.locale())?;
            self.store.relocalize(catalog);
            self.reload_factions()?;
        }
        let name = payload.name().to_string();
        let roster = self
            .store
            .restore(payload.into_roster())
            .with_context(|| format!("save {name} does not match the catalog"))?;
        let catalog = self.store.catalog().clone();
        self.store.relocalize(catalog);
        info!(save = %name, entries = roster.entries.len(), "save loaded");

        self.active_save = Some(entry);
        self.state.roster_selection = Selection::default();
        self.state.catalog_selection = Selection::default();
        if roster.faction.is_some() {
            self.state.screen = Screen::Builder;
            self.state.focus = Focus::Roster;
        } else {
            self.state.screen = Screen::Factions;
        }
        self.state.set_status(format!("Continuing {name}"));
        Ok(())
    }

    fn switch_locale(&mut self, locale: &Locale) -> Result<()> {
        let catalog = self.catalogs.set_locale(locale)?;
        self.store.relocalize(catalog);
        self.reload_factions()?;
        self.persist_active_roster()?;
        self.state.set_status(format!("Catalog language: {locale}"));
        Ok(())
    }

    fn cycle_locale(&mut self) -> Result<()> {
        let locales = self.catalogs.locales();
        if locales.len() <= 1 {
            self.state
                .set_status("No other catalog languages installed".to_string());
            return Ok(());
        }
        let current = self.catalogs.locale();
        let idx = locales
            .iter()
            .position(|locale| *locale == current)
            .unwrap_or(0);
        let next = locales[(idx + 1) % locales.len()].clone();
        self.switch_locale(&next)
    }

    fn export_roster(&mut self) -> Result<()> {
        let payload = ExportPayload::from_store(&self.store)?;
        let dir = &self.config.export_dir;
        payload.write_json(dir)?;
        let text = payload.write_text(dir)?;
        self.state
            .set_status(format!("Exported {} to {}", payload.faction_name, text.display()));
        Ok(())
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        let Event::Key(key) = event else {
            return Ok(());
        };
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }
        if self.prompt.is_some() {
            return self.handle_prompt_key(key);
        }
        if self.picker.is_some() {
            self.handle_picker_key(key);
            return Ok(());
        }
        if self.screen_is(Screen::Builder) && self.handle_global_shortcut(&key)? {
            return Ok(());
        }
        match self.state.screen {
            Screen::Menu => self.handle_menu_key(key)?,
            Screen::Setup => self.handle_setup_key(key)?,
            Screen::Factions => match self.state.mode {
                Mode::Filter => self.handle_filter_key(key)?,
                Mode::Browse => self.handle_factions_key(key),
            },
            Screen::Builder => self.handle_builder_key(key)?,
            Screen::Saves => self.handle_saves_key(key)?,
        }
        Ok(())
    }

    fn handle_global_shortcut(&mut self, key: &KeyEvent) -> Result<bool> {
        if key.modifiers.is_empty() {
            if let KeyCode::Char('u') = key.code {
                self.apply_history_step(-1)?;
                return Ok(true);
            }
        }
        if key.modifiers == KeyModifiers::CONTROL {
            if let KeyCode::Char('r') = key.code {
                self.apply_history_step(1)?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn handle_menu_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.state.should_quit = true;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.menu_selection.move_by(1, MENU_ITEMS.len());
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.menu_selection.move_by(-1, MENU_ITEMS.len());
            }
            KeyCode::Enter => match self.state.menu_selection.index {
                0 => self.open_setup(),
                1 => match self.refresh_saves() {
                    Ok(()) => {
                        self.state.screen = Screen::Saves;
                        if self.saves.is_empty() {
                            self.state.set_status("No saves available".to_string());
                        } else {
                            self.state
                                .set_status("Select a save to continue".to_string());
                        }
                    }
                    Err(err) => {
                        self.state.set_status(format!("Failed to load saves: {err}"));
                    }
                },
                _ => self.state.should_quit = true,
            },
            _ => {}
        }
        Ok(())
    }

    fn open_setup(&mut self) {
        self.state.screen = Screen::Setup;
        self.state.setup_field = SetupField::Budget;
        self.state.budget_input = self.store.snapshot().budget.to_string();
        let current = self.catalogs.locale();
        self.state.locale_index = self
            .catalogs
            .locales()
            .iter()
            .position(|locale| *locale == current)
            .unwrap_or(0);
        self.state
            .set_status("Choose the point budget and catalog language".to_string());
    }

    fn handle_setup_key(&mut self, key: KeyEvent) -> Result<()> {
        let locales = self.catalogs.locales();
        match key.code {
            KeyCode::Esc => {
                self.state.screen = Screen::Menu;
                self.state.set_status("Returned to main menu".to_string());
            }
            KeyCode::Tab | KeyCode::Up | KeyCode::Down => {
                self.state.setup_field = match self.state.setup_field {
                    SetupField::Budget => SetupField::Locale,
                    SetupField::Locale => SetupField::Budget,
                };
            }
            KeyCode::Left | KeyCode::Right if self.state.setup_field == SetupField::Locale => {
                if !locales.is_empty() {
                    let len = locales.len() as isize;
                    let delta = if key.code == KeyCode::Left { -1 } else { 1 };
                    let next = (self.state.locale_index as isize + delta).rem_euclid(len);
                    self.state.locale_index = next as usize;
                }
            }
            KeyCode::Backspace if self.state.setup_field == SetupField::Budget => {
                self.state.budget_input.pop();
            }
            KeyCode::Char(ch)
                if self.state.setup_field == SetupField::Budget && ch.is_ascii_digit() =>
            {
                if self.state.budget_input.len() < MAX_BUDGET_DIGITS {
                    self.state.budget_input.push(ch);
                }
            }
            KeyCode::Enter => self.confirm_setup(&locales)?,
            _ => {}
        }
        Ok(())
    }

    fn confirm_setup(&mut self, locales: &[Locale]) -> Result<()> {
        let Ok(budget) = self.state.budget_input.trim().parse::<u32>() else {
            self.state
                .set_status("Enter the point budget as a whole number".to_string());
            return Ok(());
        };
        self.store.set_budget(budget);
        if let Some(locale) = locales.get(self.state.locale_index) {
            if *locale != self.catalogs.locale() {
                self.switch_locale(locale)?;
            }
        }
        self.reload_factions()?;
        self.state.screen = Screen::Factions;
        self.state.mode = Mode::Browse;
        self.state
            .set_status(format!("Budget {budget} pts • select a faction"));
        Ok(())
    }

    fn handle_filter_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.state.mode = Mode::Browse;
                self.state.filter.clear();
                self.reload_factions()?;
                self.state.set_status("Filter cancelled".to_string());
            }
            KeyCode::Enter => {
                self.state.mode = Mode::Browse;
                self.state
                    .set_status(format!("Filter applied: {}", self.state.filter));
            }
            KeyCode::Backspace => {
                self.state.filter.pop();
                self.reload_factions()?;
                self.state
                    .set_status(format!("Filter: {}", self.state.filter));
            }
            KeyCode::Char(c) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    self.state.filter.push(c);
                    self.reload_factions()?;
                    self.state
                        .set_status(format!("Filter: {}", self.state.filter));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_factions_key(&mut self, key: KeyEvent) {
        let total = self.state.factions.len();
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.state.should_quit = true,
            KeyCode::Esc => self.open_setup(),
            KeyCode::Char('j') | KeyCode::Down => self.state.faction_selection.move_by(1, total),
            KeyCode::Char('k') | KeyCode::Up => self.state.faction_selection.move_by(-1, total),
            KeyCode::Char('g') | KeyCode::Home => self.state.faction_selection = Selection::default(),
            KeyCode::Char('G') | KeyCode::End => self.state.faction_selection.move_to_end(total),
            KeyCode::Char('/') => {
                self.state.mode = Mode::Filter;
                self.state.set_status("Enter filter text".to_string());
            }
            KeyCode::Enter => self.prompt_new_roster(),
            _ => {}
        }
    }

    fn prompt_new_roster(&mut self) {
        let Some(faction) = self.state.current_faction() else {
            self.state.set_status("No faction selected".to_string());
            return;
        };
        let default_name = format!("{} {}", faction.name, Local::now().format("%Y-%m-%d"));
        let message = format!("Enter save name for {}", faction.name);
        self.prompt = Some(TextPrompt::new(
            PromptPurpose::SaveName(faction.id.clone()),
            default_name,
        ));
        self.state.set_status(message);
    }

    fn start_roster(&mut self, faction: FactionId, name: String) -> Result<()> {
        self.active_save = None;
        if !self.dispatch(Command::SelectFaction(faction.clone()), String::new()) {
            return Ok(());
        }
        self.state.screen = Screen::Builder;
        self.state.focus = Focus::Catalog;
        self.state.catalog_selection = Selection::default();
        self.state.roster_selection = Selection::default();

        let roster = self.store.snapshot();
        let entry = self
            .save_manager
            .create_save(&roster, &self.catalogs.locale(), Some(&name))
            .with_context(|| format!("create save for {faction}"))?;
        info!(%faction, save = %entry.name, "roster started");
        self.active_save = Some(entry.clone());
        self.refresh_saves()
            .context("refresh saves after starting a roster")?;
        let faction_name = self
            .store
            .faction()
            .map(|faction| faction.name.clone())
            .unwrap_or_else(|| faction.to_string());
        self.state
            .set_status(format!("Started {faction_name} as {}", entry.name));
        Ok(())
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> Result<()> {
        let mut finalize: Option<(PromptPurpose, String)> = None;
        let mut cancel = false;
        if let Some(prompt) = self.prompt.as_mut() {
            match key.code {
                KeyCode::Esc => cancel = true,
                KeyCode::Enter => finalize = Some((prompt.purpose.clone(), prompt.value())),
                KeyCode::Left => prompt.move_cursor(-1),
                KeyCode::Right => prompt.move_cursor(1),
                KeyCode::Home => prompt.move_home(),
                KeyCode::End => prompt.move_end(),
                KeyCode::Backspace => prompt.backspace(),
                KeyCode::Delete => prompt.delete(),
                KeyCode::Char(ch) => {
                    if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                        prompt.insert(ch);
                    }
                }
                _ => {}
            }
        }

        if cancel {
            self.prompt = None;
            self.state.set_status("Cancelled".to_string());
            return Ok(());
        }

        if let Some((purpose, value)) = finalize {
            self.prompt = None;
            match purpose {
                PromptPurpose::SaveName(faction) => {
                    if let Err(err) = self.start_roster(faction, value) {
                        error!(?err, "failed to prepare save for new roster");
                        self.state
                            .set_status(format!("Roster started but save failed: {err}"));
                    }
                }
                PromptPurpose::Budget => match value.parse::<u32>() {
                    Ok(points) => {
                        self.dispatch(
                            Command::SetBudget(points),
                            format!("Budget set to {points} pts"),
                        );
                    }
                    Err(_) => self
                        .state
                        .set_status("Enter the point budget as a whole number".to_string()),
                },
            }
        }
        Ok(())
    }

    fn selected_template(&self) -> Option<UnitTemplate> {
        self.store
            .faction()?
            .units
            .get(self.state.catalog_selection.index)
            .cloned()
    }

    fn selected_entry(&self) -> Option<(EntryId, String)> {
        let roster = self.store.snapshot();
        let grouped = roster.grouped();
        let selected = grouped
            .get(self.state.roster_selection.index)
            .map(|entry| (entry.id, entry.template.name.clone()));
        selected
    }

    fn handle_builder_key(&mut self, key: KeyEvent) -> Result<()> {
        let catalog_total = self.store.faction().map(|f| f.units.len()).unwrap_or(0);
        let roster_total = self.store.snapshot().entries.len();
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.state.should_quit = true,
            KeyCode::Esc => {
                self.store.clear_faction();
                self.active_save = None;
                self.state.screen = Screen::Factions;
                self.state.mode = Mode::Browse;
                self.state
                    .set_status("Roster closed • select a faction".to_string());
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.state.focus = match self.state.focus {
                    Focus::Catalog => Focus::Roster,
                    Focus::Roster => Focus::Catalog,
                };
            }
            KeyCode::Char('j') | KeyCode::Down => match self.state.focus {
                Focus::Catalog => self.state.catalog_selection.move_by(1, catalog_total),
                Focus::Roster => self.state.roster_selection.move_by(1, roster_total),
            },
            KeyCode::Char('k') | KeyCode::Up => match self.state.focus {
                Focus::Catalog => self.state.catalog_selection.move_by(-1, catalog_total),
                Focus::Roster => self.state.roster_selection.move_by(-1, roster_total),
            },
            KeyCode::Char('b') => {
                let current = self.store.snapshot().budget.to_string();
                self.prompt = Some(TextPrompt::new(PromptPurpose::Budget, current));
                self.state.set_status("Enter a new point budget".to_string());
            }
            KeyCode::Char('L') => self.cycle_locale()?,
            KeyCode::Char('e') => self.export_roster()?,
            KeyCode::Enter | KeyCode::Char('a') if self.state.focus == Focus::Catalog => {
                if let Some(template) = self.selected_template() {
                    self.dispatch(
                        Command::AddUnit(template.id.clone()),
                        format!("Added {}", template.name),
                    );
                }
            }
            KeyCode::Enter | KeyCode::Char('l') if self.state.focus == Focus::Roster => {
                if let Some((entry, name)) = self.selected_entry() {
                    self.picker = Some(LoadoutPicker::new(entry));
                    self.state.set_status(format!("Equip {name}"));
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') if self.state.focus == Focus::Roster => {
                if let Some((entry, name)) = self.selected_entry() {
                    self.dispatch(Command::IncreaseCount(entry), format!("{name}: +1 model"));
                }
            }
            KeyCode::Char('-') if self.state.focus == Focus::Roster => {
                if let Some((entry, name)) = self.selected_entry() {
                    self.dispatch(Command::DecreaseCount(entry), format!("{name}: -1 model"));
                }
            }
            KeyCode::Char('d') | KeyCode::Delete if self.state.focus == Focus::Roster => {
                if let Some((entry, name)) = self.selected_entry() {
                    self.dispatch(Command::RemoveUnit(entry), format!("Removed {name}"));
                    let remaining = self.store.snapshot().entries.len();
                    self.state.roster_selection.clamp(remaining);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_picker_key(&mut self, key: KeyEvent) {
        let Some(mut picker) = self.picker.take() else {
            return;
        };
        let total = self.store.catalog().loadout(picker.slot).len();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.state.set_status("Loadout closed".to_string());
                return;
            }
            KeyCode::Left | KeyCode::Char('h') => picker.cycle_slot(-1),
            KeyCode::Right | KeyCode::Tab => picker.cycle_slot(1),
            KeyCode::Char('j') | KeyCode::Down => picker.selection.move_by(1, total),
            KeyCode::Char('k') | KeyCode::Up => picker.selection.move_by(-1, total),
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_loadout(&picker),
            _ => {}
        }
        self.picker = Some(picker);
    }

    fn toggle_loadout(&mut self, picker: &LoadoutPicker) {
        let Some(item) = self
            .store
            .catalog()
            .loadout(picker.slot)
            .get(picker.selection.index)
            .cloned()
        else {
            return;
        };
        let roster = self.store.snapshot();
        let Some(entry) = roster.entry(picker.entry) else {
            self.state.set_status("Unit no longer in the roster".to_string());
            return;
        };
        let equipped = entry
            .loadout
            .slot(picker.slot)
            .iter()
            .any(|owned| owned.id == item.id);
        let unit = entry.template.name.clone();
        let command = if equipped {
            Command::RemoveLoadout {
                entry: picker.entry,
                slot: picker.slot,
                name: item.name.clone(),
            }
        } else {
            Command::AddLoadout {
                entry: picker.entry,
                slot: picker.slot,
                name: item.name.clone(),
            }
        };
        let message = if equipped {
            format!("{unit}: removed {}", item.name)
        } else {
            format!("{unit}: added {} ({} pts)", item.name, item.cost)
        };
        self.dispatch(command, message);
    }

    fn handle_saves_key(&mut self, key: KeyEvent) -> Result<()> {
        let total = self.saves.len();
        match key.code {
            KeyCode::Esc => {
                self.state.screen = Screen::Menu;
                self.state.set_status("Returned to main menu".to_string());
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.save_selection.move_by(1, total),
            KeyCode::Char('k') | KeyCode::Up => self.state.save_selection.move_by(-1, total),
            KeyCode::Enter => {
                if let Some(entry) = self.saves.get(self.state.save_selection.index).cloned() {
                    if let Err(err) = self.load_save_entry(entry) {
                        error!(?err, "failed to load save");
                        self.state.set_status(format!("Failed to load save: {err}"));
                    }
                } else {
                    self.state.set_status("No saves available".to_string());
                }
            }
            KeyCode::Char('d') => {
                if let Some(entry) = self.saves.get(self.state.save_selection.index).cloned() {
                    self.save_manager.delete(&entry)?;
                    if self
                        .active_save
                        .as_ref()
                        .is_some_and(|active| active.path == entry.path)
                    {
                        self.active_save = None;
                    }
                    self.refresh_saves()?;
                    self.state.set_status(format!("Deleted {}", entry.name));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn draw(&mut self, frame: &mut Frame) {
        match self.state.screen {
            Screen::Menu => self.draw_menu(frame),
            Screen::Setup => self.draw_setup(frame),
            Screen::Factions => self.draw_factions(frame),
            Screen::Builder => self.draw_builder(frame),
            Screen::Saves => self.draw_saves(frame),
        }
        if let Some(picker) = &self.picker {
            self.render_loadout_picker(frame, picker);
        }
        if let Some(prompt) = &self.prompt {
            self.render_prompt(frame, prompt);
        }
    }

    fn draw_menu(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4.min(area.height)),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .split(area);

        let title = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "ARMYLIST",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "army roster builder",
                Style::default().fg(self.theme.muted),
            )),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(title, layout[0]);

        let menu_height = (MENU_ITEMS.len() as u16)
            .saturating_mul(2)
            .saturating_add(2)
            .min(layout[1].height);
        let menu_width = 28.min(layout[1].width.max(1));
        let menu_area = centered_rect(menu_width, menu_height, layout[1]);

        let menu_lines: Vec<Line> = MENU_ITEMS
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                if idx == self.state.menu_selection.index {
                    Line::from(Span::styled(
                        format!("▶ {item}"),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(
                        format!("  {item}"),
                        Style::default().fg(self.theme.primary_fg),
                    ))
                }
            })
            .collect();

        let menu = Paragraph::new(menu_lines)
            .block(Block::default().borders(Borders::ALL).title("Menu"))
            .alignment(Alignment::Center);
        frame.render_widget(menu, menu_area);
        self.render_status(frame, layout[2]);
    }

    fn draw_setup(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(8), Constraint::Length(3)])
            .split(area);
        let form_area = centered_rect(44, 8, chunks[0]);

        let locales = self.catalogs.locales();
        let locale = locales
            .get(self.state.locale_index)
            .map(|locale| locale.to_string())
            .unwrap_or_else(|| "-".to_string());
        let field_style = |field: SetupField| {
            if self.state.setup_field == field {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.primary_fg)
            }
        };
        let lines = vec![
            Line::from(vec![
                Span::raw("Budget:   "),
                Span::styled(
                    format!("{} pts", self.state.budget_input),
                    field_style(SetupField::Budget),
                ),
            ]),
            Line::from(vec![
                Span::raw("Language: "),
                Span::styled(format!("◀ {locale} ▶"), field_style(SetupField::Locale)),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "Tab switch field • ←/→ language • Enter continue",
                Style::default().fg(self.theme.muted),
            )),
        ];
        let form = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("New Roster"))
            .wrap(Wrap { trim: true });
        frame.render_widget(Clear, form_area);
        frame.render_widget(form, form_area);
        self.render_status(frame, chunks[1]);
    }

    fn draw_factions(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(8), Constraint::Length(3)])
            .split(area);
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(chunks[0]);

        let total = self.state.factions.len();
        self.state.faction_selection.clamp(total);
        let items: Vec<ListItem> = self
            .state
            .factions
            .iter()
            .map(|faction| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        faction.name.clone(),
                        Style::default()
                            .fg(self.theme.primary_fg)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!(" · {} units", faction.units.len()),
                        Style::default().fg(self.theme.muted),
                    ),
                ]))
            })
            .collect();
        let title = if self.state.filter.is_empty() {
            "Factions".to_string()
        } else {
            format!("Factions /{}", self.state.filter)
        };
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(self.theme.selection_bg))
            .highlight_symbol("▶ ");
        let mut list_state = self.state.faction_selection.list_state(total);
        frame.render_stateful_widget(list, body[0], &mut list_state);

        self.render_faction_info(frame, body[1]);
        self.render_status(frame, chunks[1]);
    }

    fn render_faction_info(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Faction Details");
        let Some(faction) = self.state.current_faction() else {
            let paragraph = Paragraph::new("No factions available").block(block);
            frame.render_widget(paragraph, area);
            return;
        };
        let mut lines = vec![Line::from(Span::styled(
            faction.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        for category in UnitCategory::ALL {
            let count = faction.units_in(category).count();
            if count > 0 {
                lines.push(Line::from(format!("{category}: {count}")));
            }
        }
        if !faction.special_rules.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Special rules",
                Style::default().fg(self.theme.accent),
            )));
            lines.extend(
                faction
                    .special_rules
                    .iter()
                    .map(|rule| Line::from(format!("- {rule}"))),
            );
        }
        if !faction.flavor_text.is_empty() {
            lines.push(Line::from(""));
            lines.extend(faction.flavor_text.iter().map(|text| {
                Line::from(Span::styled(text.clone(), Style::default().fg(self.theme.muted)))
            }));
        }
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_builder(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(area);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(35),
                Constraint::Percentage(35),
                Constraint::Percentage(30),
            ])
            .split(rows[1]);

        self.render_builder_header(frame, rows[0]);
        self.render_catalog_column(frame, columns[0]);
        self.render_roster_column(frame, columns[1]);
        self.render_verdict(frame, columns[2]);
        self.render_status(frame, rows[2]);
    }

    fn render_builder_header(&self, frame: &mut Frame, area: Rect) {
        let roster = self.store.snapshot();
        let total = self.store.total_cost();
        let faction = self
            .store
            .faction()
            .map(|faction| faction.name.clone())
            .unwrap_or_else(|| "No faction".to_string());
        let points_style = if total > roster.budget {
            Style::default().fg(self.theme.danger)
        } else {
            Style::default().fg(self.theme.success)
        };
        let save = self
            .active_save
            .as_ref()
            .map(|entry| entry.name.clone())
            .unwrap_or_else(|| "unsaved".to_string());
        let line = Line::from(vec![
            Span::styled(faction, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(format!("{total} / {} pts", roster.budget), points_style),
            Span::styled(
                format!("  [{}]  {save}", self.catalogs.locale()),
                Style::default().fg(self.theme.muted),
            ),
        ]);
        let header = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, area);
    }

    fn column_block(&self, title: &str, focus: Focus) -> Block<'static> {
        let style = if self.state.focus == focus {
            Style::default().fg(self.theme.accent)
        } else {
            Style::default()
        };
        Block::default()
            .borders(Borders::ALL)
            .border_style(style)
            .title(title.to_string())
    }

    fn render_catalog_column(&mut self, frame: &mut Frame, area: Rect) {
        let units: Vec<UnitTemplate> = self
            .store
            .faction()
            .map(|faction| faction.units.clone())
            .unwrap_or_default();
        self.state.catalog_selection.clamp(units.len());
        let items: Vec<ListItem> = units
            .iter()
            .map(|unit| {
                ListItem::new(Line::from(vec![
                    Span::raw(unit.name.clone()),
                    Span::styled(
                        format!("  {} pts [{}]", unit.base_cost, EntryCategory::of(unit)),
                        Style::default().fg(self.theme.muted),
                    ),
                ]))
            })
            .collect();
        let list = List::new(items)
            .block(self.column_block("Catalog", Focus::Catalog))
            .highlight_style(Style::default().bg(self.theme.selection_bg))
            .highlight_symbol("▶ ");
        let mut list_state = self.state.catalog_selection.list_state(units.len());
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_roster_column(&mut self, frame: &mut Frame, area: Rect) {
        let roster = self.store.snapshot();
        let grouped = roster.grouped();
        self.state.roster_selection.clamp(grouped.len());
        let items: Vec<ListItem> = grouped
            .iter()
            .map(|entry| {
                let mut lines = vec![Line::from(vec![
                    Span::raw(format!("{} x{}", entry.template.name, entry.count)),
                    Span::styled(
                        format!("  {} pts [{}]", CostEngine::unit_cost(entry), entry.category),
                        Style::default().fg(self.theme.muted),
                    ),
                ])];
                for (slot, item) in entry.loadout.iter() {
                    lines.push(Line::from(Span::styled(
                        format!("    {slot}: {} ({})", item.name, item.cost),
                        Style::default().fg(self.theme.muted),
                    )));
                }
                ListItem::new(lines)
            })
            .collect();
        let list = List::new(items)
            .block(self.column_block("Roster", Focus::Roster))
            .highlight_style(Style::default().bg(self.theme.selection_bg))
            .highlight_symbol("▶ ");
        let mut list_state = self.state.roster_selection.list_state(grouped.len());
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_verdict(&self, frame: &mut Frame, area: Rect) {
        let verdict = self.store.verdict();
        let limits = self.store.limits();
        let (title, title_style) = if verdict.is_legal() {
            ("Legal", Style::default().fg(self.theme.success))
        } else {
            ("Not legal", Style::default().fg(self.theme.danger))
        };
        let mut lines = vec![Line::from(Span::styled(
            title,
            title_style.add_modifier(Modifier::BOLD),
        ))];
        for check in &verdict.checks {
            let (mark, style) = if check.passed {
                ("✓", Style::default().fg(self.theme.success))
            } else {
                ("✗", Style::default().fg(self.theme.danger))
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{mark} "), style),
                Span::raw(check.to_string()),
            ]));
        }
        lines.push(Line::from(""));
        let banners = if limits.banners_allowed {
            Span::styled("banners allowed", Style::default().fg(self.theme.success))
        } else {
            Span::styled("no banners", Style::default().fg(self.theme.warning))
        };
        lines.push(Line::from(banners));
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Composition"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_saves(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(3)])
            .split(area);

        let total = self.saves.len();
        self.state.save_selection.clamp(total);
        let items: Vec<ListItem> = if total == 0 {
            vec![ListItem::new(Line::from("  No saves found"))]
        } else {
            self.saves
                .iter()
                .map(|entry| {
                    let faction = entry
                        .faction
                        .as_ref()
                        .map(|faction| faction.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    let timestamp = entry.updated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M");
                    ListItem::new(Line::from(vec![
                        Span::raw(entry.name.clone()),
                        Span::styled(
                            format!("  {faction} · {} pts  [{timestamp}]", entry.budget),
                            Style::default().fg(self.theme.muted),
                        ),
                    ]))
                })
                .collect()
        };
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Continue Roster"))
            .highlight_style(Style::default().bg(self.theme.selection_bg))
            .highlight_symbol("▶ ");
        let mut list_state = self.state.save_selection.list_state(total);
        frame.render_stateful_widget(list, chunks[0], &mut list_state);
        self.render_status(frame, chunks[1]);
    }

    fn render_loadout_picker(&self, frame: &mut Frame, picker: &LoadoutPicker) {
        let area = centered_rect(56, 16, frame.size());
        frame.render_widget(Clear, area);

        let roster = self.store.snapshot();
        let Some(entry) = roster.entry(picker.entry) else {
            return;
        };
        let owned = entry.loadout.slot(picker.slot);
        let available = self.store.catalog().loadout(picker.slot);
        let items: Vec<ListItem> = available
            .iter()
            .map(|item| {
                let marker = if owned.iter().any(|owned| owned.id == item.id) {
                    Span::styled("[x] ", Style::default().fg(self.theme.success))
                } else {
                    Span::raw("[ ] ")
                };
                ListItem::new(Line::from(vec![
                    marker,
                    Span::raw(item.name.clone()),
                    Span::styled(
                        format!("  {} pts", item.cost),
                        Style::default().fg(self.theme.muted),
                    ),
                ]))
            })
            .collect();
        let title = format!(
            "{} · {}s ({} pts)  ←/→ slot",
            entry.template.name,
            picker.slot,
            entry.loadout.slot_cost(picker.slot)
        );
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(self.theme.selection_bg))
            .highlight_symbol("▶ ");
        let mut list_state = picker.selection.list_state(available.len());
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_prompt(&self, frame: &mut Frame, prompt: &TextPrompt) {
        let frame_area = frame.size();
        let width = 60_u16.min(frame_area.width.saturating_sub(4)).max(24);
        let height = 7_u16.min(frame_area.height.saturating_sub(2)).max(5);
        let area = centered_rect(width, height, frame_area);

        frame.render_widget(Clear, area);

        let (title, instruction) = match &prompt.purpose {
            PromptPurpose::SaveName(_) => ("New Roster", "Save name"),
            PromptPurpose::Budget => ("Budget", "Point budget"),
        };
        let input_line = Line::from(vec![
            Span::styled("> ", Style::default().fg(self.theme.accent)),
            Span::raw(prompt.input.clone()),
        ]);
        let helper = Line::from(vec![
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" confirm  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ]);
        let default_hint = Line::from(format!("Default: {}", prompt.default));

        let paragraph = Paragraph::new(vec![
            Line::from(instruction),
            input_line,
            Line::from(""),
            helper,
            default_hint,
        ])
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);

        let cursor_x =
            (area.x + 3 + prompt.cursor as u16).min(area.x + area.width.saturating_sub(2));
        let cursor_y = area.y + 2;
        frame.set_cursor(cursor_x, cursor_y);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let primary = if self.screen_is(Screen::Factions) && self.state.mode == Mode::Filter {
            format!("Filter: {}", self.state.filter)
        } else {
            self.state.status.clone()
        };
        let hints = match self.state.screen {
            Screen::Menu | Screen::Setup => "",
            Screen::Factions => "/ filter • Enter start • Esc setup",
            Screen::Builder => {
                "Tab focus • a add • +/- size • d remove • l loadout • b budget • L language • e export • u/^r history"
            }
            Screen::Saves => "Enter continue • d delete • Esc back",
        };
        let secondary = format!("Saves tracked: {}  {hints}", self.saves.len());
        let paragraph = Paragraph::new(vec![
            Line::from(primary),
            Line::from(Span::styled(secondary, Style::default().fg(self.theme.muted))),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

struct UiState {
    screen: Screen,
    mode: Mode,
    focus: Focus,
    status: String,
    filter: String,
    should_quit: bool,
    menu_selection: Selection,
    setup_field: SetupField,
    budget_input: String,
    locale_index: usize,
    factions: Vec<Faction>,
    faction_selection: Selection,
    catalog_selection: Selection,
    roster_selection: Selection,
    save_selection: Selection,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            screen: Screen::Menu,
            mode: Mode::Browse,
            focus: Focus::Catalog,
            status: "Ready".to_string(),
            filter: String::new(),
            should_quit: false,
            menu_selection: Selection::default(),
            setup_field: SetupField::Budget,
            budget_input: String::new(),
            locale_index: 0,
            factions: Vec::new(),
            faction_selection: Selection::default(),
            catalog_selection: Selection::default(),
            roster_selection: Selection::default(),
            save_selection: Selection::default(),
        }
    }
}

impl UiState {
    fn current_faction(&self) -> Option<&Faction> {
        self.factions.get(self.faction_selection.index)
    }

    fn set_status(&mut self, message: String) {
        self.status = message;
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_stays_within_list() {
        let mut selection = Selection::default();
        selection.move_by(-1, 3);
        assert_eq!(selection.index, 0);
        selection.move_by(5, 3);
        assert_eq!(selection.index, 2);
        selection.clamp(1);
        assert_eq!(selection.index, 0);
        selection.move_by(1, 0);
        assert_eq!(selection.index, 0);
        assert_eq!(selection.list_state(0).selected(), None);
    }

    #[test]
    fn prompt_edits_multibyte_names() {
        let mut prompt = TextPrompt::new(
            PromptPurpose::SaveName(FactionId::from("imperium")),
            "Łucznicy".to_string(),
        );
        prompt.move_home();
        prompt.move_cursor(1);
        prompt.backspace();
        assert_eq!(prompt.input, "ucznicy");
        prompt.insert('Ż');
        assert_eq!(prompt.input, "Żucznicy");
        prompt.move_end();
        prompt.delete();
        assert_eq!(prompt.input, "Żucznicy");

        prompt.input.clear();
        prompt.cursor = 0;
        assert_eq!(prompt.value(), "Łucznicy");
    }

    #[test]
    fn budget_prompt_accepts_digits_only() {
        let mut prompt = TextPrompt::new(PromptPurpose::Budget, String::new());
        for ch in "12a3x4567".chars() {
            prompt.insert(ch);
        }
        assert_eq!(prompt.input, "123456");
    }

    #[test]
    fn picker_cycles_through_slots() {
        let mut picker = LoadoutPicker::new(EntryId(1));
        picker.selection.index = 3;
        picker.cycle_slot(-1);
        assert_eq!(picker.slot, LoadoutSlot::Banner);
        assert_eq!(picker.selection.index, 0);
        picker.cycle_slot(1);
        assert_eq!(picker.slot, LoadoutSlot::Spell);
    }
}
