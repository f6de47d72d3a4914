use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use std::time::Instant;

use crate::config::AppConfig;
use crate::members::Member;

/// Fixed number of rows per page
pub const PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Search,
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
    Confirm,
}

/// What a pending confirm popup will delete
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteTarget {
    Row(String),
    Selected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Name,
    Email,
}

/// Unsaved edits to one row. Exists only while that row is in edit mode.
#[derive(Debug, Clone)]
pub struct EditDraft {
    pub name: String,
    pub email: String,
    pub field: EditField,
}

pub struct App {
    pub section: Section,
    pub popup: Popup,

    // Roster state
    pub members: Vec<Member>,
    pub selected_ids: Vec<String>,
    pub search_term: String,
    pub current_page: usize, // 1-based
    pub cursor: usize,       // index into the visible rows of the current page

    // Edit session (at most one row at a time)
    pub editing_id: Option<String>,
    pub draft: Option<EditDraft>,

    // Delete awaiting confirmation
    pub pending_delete: Option<DeleteTarget>,

    // Config
    pub config: AppConfig,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        Self {
            section: Section::Table,
            popup: Popup::None,

            members: Vec::new(),
            selected_ids: Vec::new(),
            search_term: String::new(),
            current_page: 1,
            cursor: 0,

            editing_id: None,
            draft: None,

            pending_delete: None,

            config,

            status_message: None,
            status_message_time: None,
        }
    }

    /// Replace the roster with the fetched member list
    pub fn set_members(&mut self, members: Vec<Member>) {
        self.members = members;
        self.selected_ids.clear();
        self.current_page = 1;
        self.cursor = 0;
    }

    /// Set a status message (auto-clears after 3 seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    // --- Derived views -----------------------------------------------------

    fn name_matches(&self, member: &Member) -> bool {
        member
            .name
            .to_lowercase()
            .contains(&self.search_term.to_lowercase())
    }

    /// Members passing the current search filter, in roster order
    pub fn filtered(&self) -> Vec<&Member> {
        self.members.iter().filter(|m| self.name_matches(m)).collect()
    }

    /// Page count over the filtered set, never below 1 so the page strip
    /// always has a current page to highlight
    pub fn total_pages(&self) -> usize {
        self.filtered().len().div_ceil(PAGE_SIZE).max(1)
    }

    /// Filtered members sliced to the current page
    pub fn visible_rows(&self) -> Vec<&Member> {
        self.filtered()
            .into_iter()
            .skip((self.current_page - 1) * PAGE_SIZE)
            .take(PAGE_SIZE)
            .collect()
    }

    fn cursor_row_id(&self) -> Option<String> {
        self.visible_rows().get(self.cursor).map(|m| m.id.clone())
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_ids.iter().any(|s| s == id)
    }

    /// Whether 'q' should quit rather than be treated as input
    pub fn can_quit(&self) -> bool {
        self.popup == Popup::None && self.section == Section::Table && self.editing_id.is_none()
    }

    /// Keep page and cursor valid after the filtered set changed
    fn clamp_view(&mut self) {
        let total = self.total_pages();
        if self.current_page > total {
            self.current_page = total;
        }
        let visible = self.visible_rows().len();
        if visible == 0 {
            self.cursor = 0;
        } else if self.cursor >= visible {
            self.cursor = visible - 1;
        }
    }

    // --- Search ------------------------------------------------------------

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.current_page = 1;
        self.clamp_view();
    }

    fn push_search_char(&mut self, c: char) {
        let mut term = self.search_term.clone();
        term.push(c);
        self.set_search_term(term);
    }

    fn pop_search_char(&mut self) {
        let mut term = self.search_term.clone();
        term.pop();
        self.set_search_term(term);
    }

    // --- Selection ---------------------------------------------------------

    /// Toggle one row's membership in the selection
    pub fn toggle_row(&mut self, id: &str) {
        if self.is_selected(id) {
            self.selected_ids.retain(|s| s != id);
        } else {
            self.selected_ids.push(id.to_string());
        }
    }

    /// Toggle selection of the current page's visible rows.
    ///
    /// Compares id sets, not counts: only when every visible row is already
    /// selected does the toggle clear, otherwise the selection becomes
    /// exactly the visible rows.
    pub fn toggle_select_all_page(&mut self) {
        let page_ids: Vec<String> = self.visible_rows().iter().map(|m| m.id.clone()).collect();
        if page_ids.is_empty() {
            return;
        }

        if page_ids.iter().all(|id| self.is_selected(id)) {
            self.selected_ids.clear();
        } else {
            self.selected_ids = page_ids;
        }
    }

    // --- Deletion ----------------------------------------------------------

    /// Delete the cursor row, confirming first if configured
    fn request_delete_row(&mut self) {
        let Some(id) = self.cursor_row_id() else {
            return;
        };
        if self.config.confirm_deletes {
            let name = self
                .visible_rows()
                .get(self.cursor)
                .map(|m| m.name.clone())
                .unwrap_or_default();
            self.pending_delete = Some(DeleteTarget::Row(id));
            self.set_status(format!("Delete '{}'? (y/n)", name));
            self.popup = Popup::Confirm;
        } else {
            self.delete_row(&id);
        }
    }

    /// Delete everything in the selection, confirming first if configured
    fn request_delete_selected(&mut self) {
        if self.selected_ids.is_empty() {
            self.set_status("Nothing selected");
            return;
        }
        if self.config.confirm_deletes {
            self.pending_delete = Some(DeleteTarget::Selected);
            self.set_status(format!(
                "Delete {} selected member(s)? (y/n)",
                self.selected_ids.len()
            ));
            self.popup = Popup::Confirm;
        } else {
            self.delete_selected();
        }
    }

    fn confirm_pending_delete(&mut self) {
        match self.pending_delete.take() {
            Some(DeleteTarget::Row(id)) => self.delete_row(&id),
            Some(DeleteTarget::Selected) => self.delete_selected(),
            None => {}
        }
    }

    /// Remove one member and drop its id from the selection
    pub fn delete_row(&mut self, id: &str) {
        let before = self.members.len();
        self.members.retain(|m| m.id != id);
        self.selected_ids.retain(|s| s != id);

        if self.members.len() < before {
            self.set_status("Member deleted");
        }
        self.clamp_view();
    }

    /// Remove every member whose id is selected, then clear the selection
    pub fn delete_selected(&mut self) {
        let before = self.members.len();
        let ids = std::mem::take(&mut self.selected_ids);
        self.members.retain(|m| !ids.iter().any(|id| id == &m.id));

        let removed = before - self.members.len();
        self.set_status(format!("Deleted {} member(s)", removed));
        self.clamp_view();
    }

    // --- Pagination --------------------------------------------------------

    pub fn go_to_page(&mut self, page: usize) {
        if page >= 1 && page <= self.total_pages() {
            self.current_page = page;
            self.cursor = 0;
        }
    }

    fn next_page(&mut self) {
        self.go_to_page(self.current_page + 1);
    }

    fn prev_page(&mut self) {
        if self.current_page > 1 {
            self.go_to_page(self.current_page - 1);
        }
    }

    // --- Inline edit -------------------------------------------------------

    /// Put the cursor row into edit mode, seeding the draft from its
    /// current fields. Refused while another edit is in progress.
    pub fn start_edit(&mut self) {
        if self.editing_id.is_some() {
            self.set_status("Finish the current edit first");
            return;
        }
        let Some(row) = self.visible_rows().get(self.cursor).copied().cloned() else {
            return;
        };
        self.draft = Some(EditDraft {
            name: row.name.clone(),
            email: row.email.clone(),
            field: EditField::Name,
        });
        self.editing_id = Some(row.id);
    }

    /// Merge the draft into the record and leave edit mode.
    /// An empty name or email keeps the edit open.
    pub fn save_edit(&mut self) {
        let (Some(id), Some(draft)) = (self.editing_id.clone(), self.draft.clone()) else {
            return;
        };

        if draft.name.trim().is_empty() || draft.email.trim().is_empty() {
            self.set_status("Name and email cannot be empty");
            return;
        }

        if let Some(member) = self.members.iter_mut().find(|m| m.id == id) {
            member.name = draft.name;
            member.email = draft.email;
        }
        self.editing_id = None;
        self.draft = None;
        self.set_status("Changes saved");
        // A renamed row can fall out of the active filter
        self.clamp_view();
    }

    /// Discard the draft and leave edit mode without touching the record
    pub fn cancel_edit(&mut self) {
        self.editing_id = None;
        self.draft = None;
    }

    fn draft_push(&mut self, c: char) {
        if let Some(draft) = self.draft.as_mut() {
            match draft.field {
                EditField::Name => draft.name.push(c),
                EditField::Email => draft.email.push(c),
            }
        }
    }

    fn draft_pop(&mut self) {
        if let Some(draft) = self.draft.as_mut() {
            match draft.field {
                EditField::Name => {
                    draft.name.pop();
                }
                EditField::Email => {
                    draft.email.pop();
                }
            }
        }
    }

    fn draft_toggle_field(&mut self) {
        if let Some(draft) = self.draft.as_mut() {
            draft.field = match draft.field {
                EditField::Name => EditField::Email,
                EditField::Email => EditField::Name,
            };
        }
    }

    // --- Key handling ------------------------------------------------------

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.popup != Popup::None {
            return self.handle_popup_key(key);
        }

        if self.editing_id.is_some() {
            return self.handle_edit_key(key);
        }

        match self.section {
            Section::Search => self.handle_search_key(key),
            Section::Table => self.handle_table_key(key),
        }
    }

    fn handle_popup_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.popup {
            Popup::Help => {
                if matches!(
                    key.code,
                    KeyCode::Esc | KeyCode::Char('?') | KeyCode::Enter | KeyCode::Char('q')
                ) {
                    self.popup = Popup::None;
                }
            }
            Popup::Confirm => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    self.confirm_pending_delete();
                    self.popup = Popup::None;
                }
                KeyCode::Char('n') | KeyCode::Esc => {
                    self.pending_delete = None;
                    self.popup = Popup::None;
                }
                _ => {}
            },
            Popup::None => {}
        }
        Ok(())
    }

    fn handle_edit_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => self.cancel_edit(),
            KeyCode::Enter => self.save_edit(),
            KeyCode::Tab | KeyCode::BackTab => self.draft_toggle_field(),
            KeyCode::Backspace => self.draft_pop(),
            KeyCode::Char(c) => self.draft_push(c),
            _ => {}
        }
        Ok(())
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Tab | KeyCode::Enter => {
                self.section = Section::Table;
            }
            KeyCode::Backspace => self.pop_search_char(),
            KeyCode::Char(c) => self.push_search_char(c),
            _ => {}
        }
        Ok(())
    }

    fn handle_table_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Tab | KeyCode::Char('/') => {
                self.section = Section::Search;
            }

            // Vertical navigation within the page
            KeyCode::Char('j') | KeyCode::Down => {
                let visible = self.visible_rows().len();
                if visible > 0 {
                    self.cursor = (self.cursor + 1) % visible;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                let visible = self.visible_rows().len();
                if visible > 0 {
                    self.cursor = self.cursor.checked_sub(1).unwrap_or(visible - 1);
                }
            }

            // Selection
            KeyCode::Char(' ') => {
                if let Some(id) = self.cursor_row_id() {
                    self.toggle_row(&id);
                }
            }
            KeyCode::Char('a') => self.toggle_select_all_page(),

            // Edit / delete
            KeyCode::Char('e') | KeyCode::Enter => self.start_edit(),
            KeyCode::Char('d') | KeyCode::Delete => self.request_delete_row(),
            KeyCode::Char('x') => self.request_delete_selected(),

            // Pagination
            KeyCode::Char('h') | KeyCode::Left => self.prev_page(),
            KeyCode::Char('l') | KeyCode::Right => self.next_page(),
            KeyCode::Char('g') => self.go_to_page(1),
            KeyCode::Char('G') => self.go_to_page(self.total_pages()),
            KeyCode::Char(c) if c.is_ascii_digit() && c != '0' => {
                if let Some(page) = c.to_digit(10) {
                    self.go_to_page(page as usize);
                }
            }

            // Help
            KeyCode::Char('?') => self.popup = Popup::Help,

            _ => {}
        }
        Ok(())
    }

    /// Periodic housekeeping from the main loop
    pub fn tick(&mut self) {
        // The confirm popup reuses the status message as its prompt,
        // so it must outlive the normal expiry
        if self.popup == Popup::Confirm {
            return;
        }
        if let Some(time) = self.status_message_time {
            if time.elapsed().as_secs() >= 3 {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str, name: &str, email: &str) -> Member {
        Member {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            role: "member".to_string(),
        }
    }

    fn app_with(members: Vec<Member>) -> App {
        let mut app = App::new(AppConfig {
            source_url: None,
            confirm_deletes: false,
        });
        app.set_members(members);
        app
    }

    fn roster(n: usize) -> Vec<Member> {
        (1..=n)
            .map(|i| {
                member(
                    &i.to_string(),
                    &format!("User {}", i),
                    &format!("user{}@mailinator.com", i),
                )
            })
            .collect()
    }

    #[test]
    fn test_load_replaces_roster() {
        let app = app_with(roster(23));
        assert_eq!(app.members.len(), 23);
        assert_eq!(app.current_page, 1);
        assert!(app.selected_ids.is_empty());
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let mut app = app_with(vec![
            member("1", "Aaron Miles", "aaron@mailinator.com"),
            member("2", "Aishwarya Naik", "aishwarya@mailinator.com"),
            member("3", "Brandon Kilpatrick", "brandon@mailinator.com"),
        ]);

        app.set_search_term("AAR");
        let visible = app.visible_rows();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "1");
    }

    #[test]
    fn test_search_resets_to_first_page() {
        let mut app = app_with(roster(25));
        app.go_to_page(3);
        assert_eq!(app.current_page, 3);

        app.set_search_term("user");
        assert_eq!(app.current_page, 1);
    }

    #[test]
    fn test_toggle_row_round_trip() {
        let mut app = app_with(roster(3));
        app.toggle_row("2");
        assert!(app.is_selected("2"));
        app.toggle_row("2");
        assert!(app.selected_ids.is_empty());
    }

    #[test]
    fn test_select_all_compares_id_sets_not_counts() {
        let mut app = app_with(roster(15));
        // Same count as the second page's visible rows, but different ids
        app.go_to_page(2);
        for id in ["1", "2", "3", "4", "5"] {
            app.toggle_row(id);
        }
        assert_eq!(app.selected_ids.len(), app.visible_rows().len());

        // Must select the page, not clear
        app.toggle_select_all_page();
        let page_ids: Vec<String> = app.visible_rows().iter().map(|m| m.id.clone()).collect();
        assert_eq!(app.selected_ids, page_ids);

        // Now everything visible is selected, so the toggle clears
        app.toggle_select_all_page();
        assert!(app.selected_ids.is_empty());
    }

    #[test]
    fn test_select_all_on_empty_page_is_noop() {
        let mut app = app_with(roster(3));
        app.toggle_row("1");
        app.set_search_term("no such member");
        app.toggle_select_all_page();
        assert_eq!(app.selected_ids, vec!["1".to_string()]);
    }

    #[test]
    fn test_bulk_delete_removes_exactly_selection() {
        let mut app = app_with(roster(5));
        app.toggle_row("2");
        app.toggle_row("4");
        app.delete_selected();

        let remaining: Vec<&str> = app.members.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(remaining, vec!["1", "3", "5"]);
        assert!(app.selected_ids.is_empty());
    }

    #[test]
    fn test_single_delete_drops_id_from_selection() {
        let mut app = app_with(roster(3));
        app.toggle_row("1");
        app.toggle_row("2");
        app.delete_row("1");

        assert_eq!(app.members.len(), 2);
        assert_eq!(app.selected_ids, vec!["2".to_string()]);
    }

    #[test]
    fn test_delete_clamps_page_and_cursor() {
        let mut app = app_with(roster(11));
        app.go_to_page(2);
        assert_eq!(app.visible_rows().len(), 1);

        app.delete_row("11");
        assert_eq!(app.current_page, 1);
        assert!(app.cursor < app.visible_rows().len());
    }

    #[test]
    fn test_page_count_follows_filter() {
        let mut app = app_with(roster(25));
        assert_eq!(app.total_pages(), 3);

        app.set_search_term("User 1");
        // "User 1" plus "User 10".."User 19" plus nothing else
        assert_eq!(app.filtered().len(), 11);
        assert_eq!(app.total_pages(), 2);

        app.set_search_term("no match");
        assert_eq!(app.total_pages(), 1);
        assert_eq!(app.current_page, 1);
    }

    #[test]
    fn test_edit_save_persists_name() {
        let mut app = app_with(roster(2));
        app.start_edit();
        assert_eq!(app.editing_id.as_deref(), Some("1"));

        if let Some(draft) = app.draft.as_mut() {
            draft.name = "Renamed".to_string();
        }
        app.save_edit();

        assert_eq!(app.members[0].name, "Renamed");
        assert!(app.editing_id.is_none());
        assert!(app.draft.is_none());
    }

    #[test]
    fn test_edit_cancel_leaves_record_untouched() {
        let mut app = app_with(roster(2));
        app.start_edit();
        if let Some(draft) = app.draft.as_mut() {
            draft.name = "Renamed".to_string();
        }
        app.cancel_edit();

        assert_eq!(app.members[0].name, "User 1");
        assert!(app.editing_id.is_none());
        assert!(app.draft.is_none());
    }

    #[test]
    fn test_edit_rejects_empty_fields() {
        let mut app = app_with(roster(1));
        app.start_edit();
        if let Some(draft) = app.draft.as_mut() {
            draft.email = "  ".to_string();
        }
        app.save_edit();

        // Edit stays open, record unchanged
        assert!(app.editing_id.is_some());
        assert_eq!(app.members[0].email, "user1@mailinator.com");
    }

    #[test]
    fn test_only_one_edit_at_a_time() {
        let mut app = app_with(roster(3));
        app.start_edit();
        assert_eq!(app.editing_id.as_deref(), Some("1"));

        app.cursor = 1;
        app.start_edit();
        // Second start is refused; the first session stays active
        assert_eq!(app.editing_id.as_deref(), Some("1"));
    }

    #[test]
    fn test_search_keys_feed_the_filter() {
        let mut app = app_with(vec![
            member("1", "Ann", "ann@mailinator.com"),
            member("2", "Bob", "bob@mailinator.com"),
        ]);
        app.section = Section::Search;

        app.handle_key(KeyEvent::from(KeyCode::Char('a'))).unwrap();
        app.handle_key(KeyEvent::from(KeyCode::Char('n'))).unwrap();
        assert_eq!(app.search_term, "an");
        assert_eq!(app.visible_rows().len(), 1);

        app.handle_key(KeyEvent::from(KeyCode::Backspace)).unwrap();
        assert_eq!(app.search_term, "a");
    }

    #[test]
    fn test_search_select_then_bulk_delete_example() {
        let mut app = app_with(vec![
            member("1", "Ann", "ann@mailinator.com"),
            member("2", "Bob", "bob@mailinator.com"),
        ]);

        app.set_search_term("an");
        let visible: Vec<&str> = app.visible_rows().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(visible, vec!["1"]);

        app.toggle_row("1");
        app.delete_selected();

        assert_eq!(app.members.len(), 1);
        assert_eq!(app.members[0].name, "Bob");
        assert!(app.selected_ids.is_empty());
    }

    #[test]
    fn test_save_edit_clamps_page_when_filter_shrinks() {
        let mut app = app_with(roster(11));
        app.set_search_term("User");
        app.go_to_page(2);
        assert_eq!(app.visible_rows().len(), 1);

        // Rename page 2's only row out of the filter
        app.start_edit();
        if let Some(draft) = app.draft.as_mut() {
            draft.name = "Zed".to_string();
        }
        app.save_edit();

        assert!(app.editing_id.is_none());
        assert!(app.current_page <= app.total_pages());
        assert_eq!(app.current_page, 1);
        assert_eq!(app.visible_rows().len(), 10);
    }

    #[test]
    fn test_confirm_prompt_survives_status_expiry() {
        let mut app = App::new(AppConfig::default());
        app.set_members(roster(2));

        app.handle_key(KeyEvent::from(KeyCode::Char('d'))).unwrap();
        assert_eq!(app.popup, Popup::Confirm);

        // Backdate the message past the normal expiry window
        app.status_message_time =
            Some(Instant::now() - std::time::Duration::from_secs(5));
        app.tick();
        assert!(app.status_message.is_some());

        // Once the popup closes, expiry applies again
        app.handle_key(KeyEvent::from(KeyCode::Char('n'))).unwrap();
        app.tick();
        assert!(app.status_message.is_none());
    }

    #[test]
    fn test_first_and_last_page_keys() {
        let mut app = app_with(roster(105));
        assert_eq!(app.total_pages(), 11);

        app.handle_key(KeyEvent::from(KeyCode::Char('G'))).unwrap();
        assert_eq!(app.current_page, 11);

        app.handle_key(KeyEvent::from(KeyCode::Char('g'))).unwrap();
        assert_eq!(app.current_page, 1);
    }

    #[test]
    fn test_confirm_popup_guards_delete() {
        let mut app = App::new(AppConfig::default());
        app.set_members(roster(2));
        assert!(app.config.confirm_deletes);

        app.handle_key(KeyEvent::from(KeyCode::Char('d'))).unwrap();
        assert_eq!(app.popup, Popup::Confirm);
        assert_eq!(app.members.len(), 2);

        // 'n' keeps the row
        app.handle_key(KeyEvent::from(KeyCode::Char('n'))).unwrap();
        assert_eq!(app.popup, Popup::None);
        assert_eq!(app.members.len(), 2);

        // 'y' deletes it
        app.handle_key(KeyEvent::from(KeyCode::Char('d'))).unwrap();
        app.handle_key(KeyEvent::from(KeyCode::Char('y'))).unwrap();
        assert_eq!(app.members.len(), 1);
    }
}
