//! View state
//!
//! One explicitly owned struct holds everything the screens need besides
//! the conversation itself: current screen, modal visibility, admin flag,
//! composer text and the admin dashboard. Input is mapped to [`Action`]s;
//! nothing here does I/O.

use crate::client::{AdminConversationSummary, ConversationDetail};
use crate::config::AdminCredentials;

/// Rows per page in the admin listing
pub const PAGE_SIZE: usize = 10;

/// Filename prefix the backend gives test conversations
pub const TEST_FILENAME_PREFIX: &str = "test_";

/// One-tap replies on the landing screen
pub const LANDING_CHIPS: [&str; 4] = ["피곤해", "불안해", "답답해", "그냥 그래"];

/// Helper replies offered inside the chat
pub const CHAT_CHIPS: [&str; 2] = ["그냥 그래", "말하기 어려워"];

const LOGIN_EMPTY: &str = "아이디와 비밀번호를 입력해주세요.";
const LOGIN_MISMATCH: &str = "아이디 또는 비밀번호가 올바르지 않습니다.";
const LOGIN_DISABLED: &str = "관리자 로그인이 설정되지 않았습니다.";

/// Whether a stored conversation is a test conversation, by filename
pub fn is_test_filename(filename: &str) -> bool {
    filename.starts_with(TEST_FILENAME_PREFIX)
}

/// Split a listing into `(test, real)` conversations
pub fn partition_by_test(
    conversations: &[AdminConversationSummary],
) -> (Vec<&AdminConversationSummary>, Vec<&AdminConversationSummary>) {
    conversations.iter().partition(|c| c.is_test)
}

/// Number of pages for `total` items; at least one
pub fn page_count(total: usize) -> usize {
    total.div_ceil(PAGE_SIZE).max(1)
}

/// Items on 1-based `page`; empty past the end
pub fn paginate<T>(items: &[T], page: usize) -> &[T] {
    let start = page.saturating_sub(1).saturating_mul(PAGE_SIZE);
    if start >= items.len() {
        return &[];
    }
    let end = (start + PAGE_SIZE).min(items.len());
    &items[start..end]
}

// ============================================================================
// Actions
// ============================================================================

/// Everything a key press can trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,

    // Landing / chat
    StartChat,
    QuickReply(String),
    Send,
    Reset,
    /// Back to the landing screen (resets the conversation)
    Back,
    Input(char),
    Backspace,
    ToggleJson,
    DismissEndNotice,

    // Admin login / menu
    ToggleAdminLogin,
    SubmitLogin,
    SwitchLoginField,
    ToggleAdminMenu,
    Logout,

    // Dashboard
    OpenDashboard,
    CloseDashboard,
    SwitchTab(AdminTab),
    NextPage,
    PrevPage,
    CursorUp,
    CursorDown,
    OpenSelected,
    CloseDetail,
    Reload,
}

// ============================================================================
// Screens
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Landing,
    Chat,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Id,
    Password,
}

/// Admin login modal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub id: String,
    pub password: String,
    pub focus: LoginField,
    pub error: Option<String>,
}

impl LoginForm {
    fn clear(&mut self) {
        self.id.clear();
        self.password.clear();
        self.focus = LoginField::Id;
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::Id => &mut self.id,
            LoginField::Password => &mut self.password,
        }
    }
}

// ============================================================================
// Admin dashboard
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminTab {
    /// Real conversations
    #[default]
    Conversations,
    /// Conversations recorded in admin mode
    Test,
}

impl AdminTab {
    /// `include_test` flag the listing is loaded with
    pub fn include_test(self) -> bool {
        self == AdminTab::Test
    }

    pub fn label(self) -> &'static str {
        match self {
            AdminTab::Conversations => "대화 목록",
            AdminTab::Test => "테스트 대화 목록",
        }
    }
}

/// State of the admin dashboard screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminDashboard {
    pub tab: AdminTab,
    conversations_page: usize,
    test_page: usize,
    /// Row under the cursor within the current page
    pub cursor: usize,
    pub conversations: Vec<AdminConversationSummary>,
    pub selected: Option<ConversationDetail>,
    /// Filename of the transcript being fetched
    pending_detail: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
}

impl AdminDashboard {
    /// Listing for the current tab
    pub fn visible(&self) -> Vec<&AdminConversationSummary> {
        let (test, real) = partition_by_test(&self.conversations);
        match self.tab {
            AdminTab::Conversations => real,
            AdminTab::Test => test,
        }
    }

    /// Current 1-based page of the active tab
    pub fn page(&self) -> usize {
        match self.tab {
            AdminTab::Conversations => self.conversations_page.max(1),
            AdminTab::Test => self.test_page.max(1),
        }
    }

    pub fn page_count(&self) -> usize {
        page_count(self.visible().len())
    }

    pub fn page_rows(&self) -> Vec<&AdminConversationSummary> {
        let visible = self.visible();
        paginate(&visible, self.page()).to_vec()
    }

    /// Jump to `page`, clamped to the available pages
    pub fn set_page(&mut self, page: usize) {
        let page = page.clamp(1, self.page_count());
        match self.tab {
            AdminTab::Conversations => self.conversations_page = page,
            AdminTab::Test => self.test_page = page,
        }
        self.cursor = 0;
    }

    /// Switch tab; the new tab starts at page one
    pub fn switch_tab(&mut self, tab: AdminTab) {
        self.tab = tab;
        self.close_detail();
        self.set_page(1);
    }

    /// Drop the open transcript and forget any fetch still in flight
    pub fn close_detail(&mut self) {
        self.selected = None;
        if self.pending_detail.take().is_some() {
            self.loading = false;
        }
    }

    pub fn move_cursor(&mut self, down: bool) {
        let rows = self.page_rows().len();
        if rows == 0 {
            self.cursor = 0;
        } else if down {
            self.cursor = (self.cursor + 1).min(rows - 1);
        } else {
            self.cursor = self.cursor.saturating_sub(1);
        }
    }

    /// Filename under the cursor
    pub fn cursor_filename(&self) -> Option<String> {
        self.page_rows().get(self.cursor).map(|c| c.filename.clone())
    }

    pub fn begin_load(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn finish_list(&mut self, result: Result<Vec<AdminConversationSummary>, String>) {
        self.loading = false;
        match result {
            Ok(conversations) => {
                self.conversations = conversations;
                self.set_page(self.page());
            }
            Err(message) => self.error = Some(message),
        }
    }

    pub fn begin_detail(&mut self, filename: &str) {
        self.pending_detail = Some(filename.to_string());
        self.begin_load();
    }

    /// Apply a transcript fetch; returns false when `filename` is no longer
    /// the one being waited for
    pub fn finish_detail(&mut self, filename: &str, result: Result<ConversationDetail, String>) -> bool {
        if self.pending_detail.as_deref() != Some(filename) {
            return false;
        }
        self.pending_detail = None;
        self.loading = false;
        match result {
            Ok(detail) => self.selected = Some(detail),
            Err(message) => self.error = Some(message),
        }
        true
    }
}

// ============================================================================
// View state
// ============================================================================

/// Process-wide UI state; created at start, reset on logout
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub screen: Screen,
    pub is_admin: bool,
    pub show_admin_login: bool,
    pub show_admin_menu: bool,
    pub show_json: bool,
    pub show_end_notice: bool,
    pub composer: String,
    pub login: LoginForm,
    pub dashboard: AdminDashboard,
    pub should_quit: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Landing,
            is_admin: false,
            show_admin_login: false,
            show_admin_menu: false,
            show_json: false,
            show_end_notice: false,
            composer: String::new(),
            login: LoginForm::default(),
            dashboard: AdminDashboard::default(),
            should_quit: false,
        }
    }

    /// Whether typed characters go to the login form
    pub fn login_has_focus(&self) -> bool {
        self.show_admin_login && !self.is_admin
    }

    pub fn toggle_admin_login(&mut self) {
        if self.is_admin {
            return;
        }
        self.show_admin_login = !self.show_admin_login;
        self.login.error = None;
    }

    pub fn type_char(&mut self, c: char) {
        if self.login_has_focus() {
            self.login.focused_mut().push(c);
        } else {
            self.composer.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.login_has_focus() {
            self.login.focused_mut().pop();
        } else {
            self.composer.pop();
        }
    }

    pub fn switch_login_field(&mut self) {
        self.login.focus = match self.login.focus {
            LoginField::Id => LoginField::Password,
            LoginField::Password => LoginField::Id,
        };
    }

    /// Check the login form against the configured placeholder credentials.
    ///
    /// Success sets the admin flag and closes the modal without navigating.
    pub fn submit_login(&mut self, credentials: Option<&AdminCredentials>) -> bool {
        self.login.error = None;

        if self.login.id.is_empty() || self.login.password.is_empty() {
            self.login.error = Some(LOGIN_EMPTY.to_string());
            return false;
        }

        let Some(credentials) = credentials else {
            self.login.error = Some(LOGIN_DISABLED.to_string());
            return false;
        };

        if self.login.id == credentials.id && self.login.password == credentials.password {
            self.is_admin = true;
            self.show_admin_login = false;
            self.login.clear();
            true
        } else {
            self.login.error = Some(LOGIN_MISMATCH.to_string());
            false
        }
    }

    pub fn toggle_admin_menu(&mut self) {
        if self.is_admin {
            self.show_admin_menu = !self.show_admin_menu;
        }
    }

    /// Clear admin mode; leaves the dashboard for `fallback`
    pub fn logout(&mut self, fallback: Screen) {
        self.is_admin = false;
        self.show_admin_menu = false;
        self.show_json = false;
        if self.screen == Screen::Dashboard {
            self.screen = fallback;
        }
        self.dashboard = AdminDashboard::default();
    }

    /// Enter the dashboard; returns false when not in admin mode
    pub fn open_dashboard(&mut self) -> bool {
        if !self.is_admin {
            return false;
        }
        self.screen = Screen::Dashboard;
        self.show_admin_menu = false;
        self.dashboard.close_detail();
        true
    }

    pub fn close_dashboard(&mut self, fallback: Screen) {
        if self.screen == Screen::Dashboard {
            self.screen = fallback;
        }
    }

    pub fn toggle_json(&mut self) {
        if self.is_admin {
            self.show_json = !self.show_json;
        }
    }

    /// Take the composer text for sending
    pub fn take_composer(&mut self) -> String {
        std::mem::take(&mut self.composer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_summary;

    fn credentials() -> AdminCredentials {
        AdminCredentials {
            id: "counselor".to_string(),
            password: "s3cret".to_string(),
        }
    }

    fn listing(real: usize, test: usize) -> Vec<AdminConversationSummary> {
        let mut conversations: Vec<_> = (0..real)
            .map(|i| sample_summary(&format!("20250301_{i:06}.json"), false))
            .collect();
        conversations.extend((0..test).map(|i| sample_summary(&format!("test_20250301_{i:06}.json"), true)));
        conversations
    }

    #[test]
    fn test_is_test_filename() {
        assert!(is_test_filename("test_20250301_093000.json"));
        assert!(!is_test_filename("20250301_093000.json"));
        assert!(!is_test_filename("latest_test_.json"));
    }

    #[test]
    fn test_partition_by_test() {
        let conversations = listing(3, 2);
        let (test, real) = partition_by_test(&conversations);
        assert_eq!(test.len(), 2);
        assert_eq!(real.len(), 3);
        assert!(test.iter().all(|c| c.is_test));
    }

    #[test]
    fn test_pagination() {
        let items: Vec<u32> = (1..=23).collect();
        assert_eq!(page_count(items.len()), 3);
        assert_eq!(paginate(&items, 1), &items[0..10]);
        assert_eq!(paginate(&items, 3), &[21, 22, 23]);
        assert!(paginate(&items, 4).is_empty());
        // Page zero is treated as the first page
        assert_eq!(paginate(&items, 0), &items[0..10]);
        assert_eq!(page_count(0), 1);
        assert_eq!(page_count(10), 1);
        assert_eq!(page_count(11), 2);
    }

    #[test]
    fn test_dashboard_pages_are_per_tab() {
        let mut dashboard = AdminDashboard::default();
        dashboard.finish_list(Ok(listing(25, 12)));

        assert_eq!(dashboard.visible().len(), 25);
        dashboard.set_page(3);
        assert_eq!(dashboard.page(), 3);
        assert_eq!(dashboard.page_rows().len(), 5);

        dashboard.switch_tab(AdminTab::Test);
        assert_eq!(dashboard.page(), 1);
        assert_eq!(dashboard.visible().len(), 12);
        dashboard.set_page(99);
        assert_eq!(dashboard.page(), 2);
        assert_eq!(dashboard.page_rows().len(), 2);
    }

    #[test]
    fn test_dashboard_cursor() {
        let mut dashboard = AdminDashboard::default();
        dashboard.finish_list(Ok(listing(3, 0)));
        dashboard.move_cursor(true);
        dashboard.move_cursor(true);
        dashboard.move_cursor(true);
        assert_eq!(dashboard.cursor, 2);
        assert_eq!(dashboard.cursor_filename().as_deref(), Some("20250301_000002.json"));
        dashboard.move_cursor(false);
        assert_eq!(dashboard.cursor, 1);
    }

    #[test]
    fn test_dashboard_error_and_retry() {
        let mut dashboard = AdminDashboard::default();
        dashboard.begin_load();
        assert!(dashboard.loading);
        dashboard.finish_list(Err("대화 목록을 불러올 수 없습니다.".to_string()));
        assert!(!dashboard.loading);
        assert_eq!(dashboard.error.as_deref(), Some("대화 목록을 불러올 수 없습니다."));

        dashboard.begin_load();
        assert!(dashboard.error.is_none());
    }

    #[test]
    fn test_detail_result_must_match_pending_fetch() {
        let mut dashboard = AdminDashboard::default();
        dashboard.finish_list(Ok(listing(2, 1)));
        dashboard.begin_detail("20250301_000000.json");

        // Nothing was requested for this file
        assert!(!dashboard.finish_detail("20250301_000001.json", Ok(ConversationDetail::default())));
        assert!(dashboard.selected.is_none());
        assert!(dashboard.loading);

        dashboard.switch_tab(AdminTab::Test);
        assert!(!dashboard.loading);
        assert!(!dashboard.finish_detail("20250301_000000.json", Ok(ConversationDetail::default())));
        assert!(dashboard.selected.is_none());

        dashboard.begin_detail("test_20250301_000000.json");
        assert!(dashboard.finish_detail("test_20250301_000000.json", Ok(ConversationDetail::default())));
        assert!(dashboard.selected.is_some());
        assert!(!dashboard.loading);
    }

    #[test]
    fn test_login_empty_fields() {
        let mut view = ViewState::new();
        view.toggle_admin_login();
        assert!(!view.submit_login(Some(&credentials())));
        assert_eq!(view.login.error.as_deref(), Some(LOGIN_EMPTY));
    }

    #[test]
    fn test_login_mismatch_and_success() {
        let mut view = ViewState::new();
        view.toggle_admin_login();
        for c in "counselor".chars() {
            view.type_char(c);
        }
        view.switch_login_field();
        for c in "wrong".chars() {
            view.type_char(c);
        }
        assert!(!view.submit_login(Some(&credentials())));
        assert_eq!(view.login.error.as_deref(), Some(LOGIN_MISMATCH));
        assert!(!view.is_admin);

        for _ in 0.."wrong".len() {
            view.backspace();
        }
        for c in "s3cret".chars() {
            view.type_char(c);
        }
        assert!(view.submit_login(Some(&credentials())));
        assert!(view.is_admin);
        assert!(!view.show_admin_login);
        assert!(view.login.id.is_empty());
        // Login does not navigate
        assert_eq!(view.screen, Screen::Landing);
        assert!(view.composer.is_empty());
    }

    #[test]
    fn test_login_disabled_without_credentials() {
        let mut view = ViewState::new();
        view.toggle_admin_login();
        view.login.id = "admin".to_string();
        view.login.password = "1234".to_string();
        assert!(!view.submit_login(None));
        assert_eq!(view.login.error.as_deref(), Some(LOGIN_DISABLED));
        assert!(!view.is_admin);
    }

    #[test]
    fn test_dashboard_requires_admin() {
        let mut view = ViewState::new();
        assert!(!view.open_dashboard());
        assert_eq!(view.screen, Screen::Landing);

        view.is_admin = true;
        view.show_admin_menu = true;
        assert!(view.open_dashboard());
        assert_eq!(view.screen, Screen::Dashboard);
        assert!(!view.show_admin_menu);
    }

    #[test]
    fn test_logout_leaves_dashboard() {
        let mut view = ViewState::new();
        view.is_admin = true;
        view.show_json = true;
        view.open_dashboard();
        view.logout(Screen::Chat);

        assert!(!view.is_admin);
        assert!(!view.show_json);
        assert_eq!(view.screen, Screen::Chat);
        assert_eq!(view.dashboard, AdminDashboard::default());
    }

    #[test]
    fn test_typing_goes_to_composer_without_login_modal() {
        let mut view = ViewState::new();
        view.type_char('안');
        view.type_char('녕');
        assert_eq!(view.composer, "안녕");
        view.backspace();
        assert_eq!(view.take_composer(), "안");
        assert!(view.composer.is_empty());
    }
}
