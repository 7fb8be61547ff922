//! Application: view state + conversation session + backend clients
//!
//! [`App::dispatch`] executes an [`Action`] synchronously and spawns any
//! backend call onto the runtime. Results come back as [`AppEvent`]s on an
//! internal channel and are applied by [`App::handle_event`], so every
//! mutation happens on the UI task.

use crate::client::{
    AdminConversationSummary, AdminGateway, AnalysisResult, ChatTransport, ClientError,
    ConversationDetail, HttpChatTransport,
};
use crate::config::AdminCredentials;
use crate::session::{ConversationSession, PendingReply, SessionPhase};
use crate::view::{is_test_filename, Action, AdminTab, Screen, ViewState};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Results of backend work started by an action
#[derive(Debug)]
pub enum AppEvent {
    ChatFinished {
        request_id: u64,
        result: Result<AnalysisResult, ClientError>,
    },
    ConversationsLoaded {
        tab: AdminTab,
        result: Result<Vec<AdminConversationSummary>, ClientError>,
    },
    DetailLoaded {
        filename: String,
        result: Result<ConversationDetail, ClientError>,
    },
    HealthChecked(Result<(), ClientError>),
}

pub struct App {
    pub view: ViewState,
    session: ConversationSession,
    transport: Arc<dyn ChatTransport>,
    admin: Arc<dyn AdminGateway>,
    credentials: Option<AdminCredentials>,
    /// Last chat error kind pointed at an unreachable backend
    backend_hint: bool,
    /// Set when the startup health probe failed
    backend_warning: Option<String>,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        admin: Arc<dyn AdminGateway>,
        credentials: Option<AdminCredentials>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            view: ViewState::new(),
            session: ConversationSession::new(),
            transport,
            admin,
            credentials,
            backend_hint: false,
            backend_warning: None,
            events_tx,
            events_rx,
        }
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    /// Whether the error banner should suggest checking the backend
    pub fn backend_hint(&self) -> bool {
        self.backend_hint && self.session.error().is_some()
    }

    pub fn backend_warning(&self) -> Option<&str> {
        self.backend_warning.as_deref()
    }

    /// Whether the composer takes typing and sending
    pub fn composer_enabled(&self) -> bool {
        self.session.model().accepts_input()
    }

    /// Screen to return to when leaving the dashboard
    fn chat_or_landing(&self) -> Screen {
        if self.session.phase() == SessionPhase::Idle {
            Screen::Landing
        } else {
            Screen::Chat
        }
    }

    // ========================================================================
    // Actions
    // ========================================================================

    pub fn dispatch(&mut self, action: Action) {
        // Typed characters may be a password
        if !matches!(action, Action::Input(_) | Action::Backspace) {
            tracing::trace!(?action, "Dispatch");
        }
        match action {
            Action::Quit => self.view.should_quit = true,

            Action::StartChat => {
                self.session.start();
                self.view.screen = Screen::Chat;
            }
            Action::QuickReply(text) => {
                self.view.screen = Screen::Chat;
                let begun = self.session.begin_quick_reply(&text, self.view.is_admin);
                self.spawn_send(begun);
            }
            Action::Send => {
                if !self.composer_enabled() || !self.session.can_send(&self.view.composer) {
                    return;
                }
                let text = self.view.take_composer();
                let begun = self.session.begin_submit(&text, self.view.is_admin);
                self.spawn_send(begun);
            }
            Action::Reset => {
                self.session.reset();
                self.view.show_end_notice = false;
                self.backend_hint = false;
            }
            Action::Back => {
                self.session.leave();
                self.view.screen = Screen::Landing;
                self.view.show_end_notice = false;
                self.view.composer.clear();
                self.backend_hint = false;
            }
            Action::Input(c) => {
                if self.view.login_has_focus() || self.composer_enabled() {
                    self.view.type_char(c);
                }
            }
            Action::Backspace => self.view.backspace(),
            Action::ToggleJson => self.view.toggle_json(),
            Action::DismissEndNotice => self.view.show_end_notice = false,

            Action::ToggleAdminLogin => self.view.toggle_admin_login(),
            Action::SwitchLoginField => self.view.switch_login_field(),
            Action::SubmitLogin => {
                if self.view.submit_login(self.credentials.as_ref()) {
                    tracing::info!("Admin mode enabled");
                }
            }
            Action::ToggleAdminMenu => self.view.toggle_admin_menu(),
            Action::Logout => {
                let fallback = self.chat_or_landing();
                self.view.logout(fallback);
                tracing::info!("Admin mode disabled");
            }

            Action::OpenDashboard => {
                if self.view.open_dashboard() {
                    self.load_conversations();
                }
            }
            Action::CloseDashboard => {
                let fallback = self.chat_or_landing();
                self.view.close_dashboard(fallback);
            }
            Action::SwitchTab(tab) => {
                self.view.dashboard.switch_tab(tab);
                self.load_conversations();
            }
            Action::NextPage => {
                let page = self.view.dashboard.page() + 1;
                self.view.dashboard.set_page(page);
            }
            Action::PrevPage => {
                let page = self.view.dashboard.page().saturating_sub(1);
                self.view.dashboard.set_page(page);
            }
            Action::CursorUp => self.view.dashboard.move_cursor(false),
            Action::CursorDown => self.view.dashboard.move_cursor(true),
            Action::OpenSelected => self.load_detail(),
            Action::CloseDetail => self.view.dashboard.close_detail(),
            Action::Reload => self.load_conversations(),
        }
    }

    fn spawn_send(
        &mut self,
        begun: Result<PendingReply, crate::session::TransitionError>,
    ) {
        let pending = match begun {
            Ok(pending) => pending,
            Err(e) => {
                tracing::debug!(error = %e, "Send ignored");
                return;
            }
        };

        self.backend_hint = false;
        let transport = Arc::clone(&self.transport);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let PendingReply {
                request_id,
                request,
                cancel,
            } = pending;
            let result = transport.send(&request, cancel).await;
            // Receiver gone means the app is shutting down
            let _ = tx.send(AppEvent::ChatFinished { request_id, result });
        });
    }

    fn load_conversations(&mut self) {
        let tab = self.view.dashboard.tab;
        self.view.dashboard.begin_load();

        let admin = Arc::clone(&self.admin);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = admin.list_conversations(tab.include_test()).await;
            let _ = tx.send(AppEvent::ConversationsLoaded { tab, result });
        });
    }

    fn load_detail(&mut self) {
        let Some(filename) = self.view.dashboard.cursor_filename() else {
            return;
        };
        let is_test = is_test_filename(&filename);
        self.view.dashboard.begin_detail(&filename);

        let admin = Arc::clone(&self.admin);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = admin.conversation_detail(&filename, is_test).await;
            let _ = tx.send(AppEvent::DetailLoaded { filename, result });
        });
    }

    /// Probe the backend once; a failure shows a warning banner
    pub fn probe_backend(&self, http: HttpChatTransport) {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = http.health().await;
            let _ = tx.send(AppEvent::HealthChecked(result));
        });
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ChatFinished { request_id, result } => {
                match self.session.finish(request_id, result) {
                    Ok(outcome) => {
                        if outcome.ended {
                            self.view.show_end_notice = true;
                        }
                        self.backend_hint = outcome
                            .error
                            .is_some_and(|e| e.kind.hints_backend_unreachable());
                    }
                    Err(e) => tracing::debug!(request_id, error = %e, "Chat result discarded"),
                }
            }
            AppEvent::ConversationsLoaded { tab, result } => {
                // The admin switched tabs (or logged out) while this was loading
                if tab != self.view.dashboard.tab || !self.view.is_admin {
                    return;
                }
                if let Err(e) = &result {
                    tracing::warn!(error = %e, kind = e.kind.as_str(), "Conversation list failed");
                }
                self.view.dashboard.finish_list(result.map_err(|e| e.message));
            }
            AppEvent::DetailLoaded { filename, result } => {
                if !self.view.is_admin {
                    return;
                }
                if let Err(e) = &result {
                    tracing::warn!(%filename, error = %e, "Conversation detail failed");
                }
                if !self
                    .view
                    .dashboard
                    .finish_detail(&filename, result.map_err(|e| e.message))
                {
                    tracing::debug!(%filename, "Stale conversation detail dropped");
                }
            }
            AppEvent::HealthChecked(result) => match result {
                Ok(()) => self.backend_warning = None,
                Err(e) => {
                    tracing::warn!(error = %e, "Backend health check failed");
                    self.backend_warning = Some(e.message);
                }
            },
        }
    }

    /// Apply every event already delivered; returns how many were applied
    pub fn drain_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            applied += 1;
        }
        applied
    }

    /// Wait for the next event and apply it
    pub async fn process_next_event(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }
}
