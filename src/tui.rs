//! Terminal front end: key bindings and rendering.

use crate::app::App;
use crate::client::{AnalysisResult, ConversationDetail, EndReport, Role, Turn};
use crate::view::{AdminTab, Action, LoginField, Screen, CHAT_CHIPS, LANDING_CHIPS};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

/// Accent for the assistant
const SORI_COLOR: Color = Color::Rgb(120, 170, 255);
/// User turns
const USER_COLOR: Color = Color::Rgb(250, 200, 120);
/// Error banner
const ERROR_COLOR: Color = Color::Rgb(230, 90, 90);
/// Labels in the admin panels
const LABEL_COLOR: Color = Color::Rgb(100, 180, 180);
/// Secondary text
const DIM_COLOR: Color = Color::Rgb(128, 128, 128);

// ============================================================================
// Key bindings
// ============================================================================

/// Map a key press to an action for the current state.
///
/// Overlays take keys first: end notice, then login modal, then admin menu.
pub fn action_for_key(app: &App, key: KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }

    let view = &app.view;
    if view.show_end_notice {
        return match key.code {
            KeyCode::Enter | KeyCode::Esc => Some(Action::DismissEndNotice),
            _ => None,
        };
    }
    if view.login_has_focus() {
        return match key.code {
            KeyCode::Esc => Some(Action::ToggleAdminLogin),
            KeyCode::Tab | KeyCode::BackTab => Some(Action::SwitchLoginField),
            KeyCode::Enter => Some(Action::SubmitLogin),
            KeyCode::Backspace => Some(Action::Backspace),
            KeyCode::Char(c) => Some(Action::Input(c)),
            _ => None,
        };
    }
    if view.show_admin_menu {
        return match key.code {
            KeyCode::Char('d') | KeyCode::Enter => Some(Action::OpenDashboard),
            KeyCode::Char('l') => Some(Action::Logout),
            KeyCode::Esc | KeyCode::F(2) => Some(Action::ToggleAdminMenu),
            _ => None,
        };
    }
    if key.code == KeyCode::F(2) {
        return Some(if view.is_admin {
            Action::ToggleAdminMenu
        } else {
            Action::ToggleAdminLogin
        });
    }

    match view.screen {
        Screen::Landing => landing_key(key),
        Screen::Chat => chat_key(key),
        Screen::Dashboard => dashboard_key(app, key),
    }
}

fn landing_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Enter => Some(Action::StartChat),
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char(c) => chip(&LANDING_CHIPS, c).map(Action::QuickReply),
        _ => None,
    }
}

fn chat_key(key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('r') => Some(Action::Reset),
            _ => None,
        };
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        return match key.code {
            KeyCode::Char(c) => chip(&CHAT_CHIPS, c).map(Action::QuickReply),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Enter => Some(Action::Send),
        KeyCode::Esc => Some(Action::Back),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::F(3) => Some(Action::ToggleJson),
        KeyCode::Char(c) => Some(Action::Input(c)),
        _ => None,
    }
}

fn dashboard_key(app: &App, key: KeyEvent) -> Option<Action> {
    let dashboard = &app.view.dashboard;
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Some(if dashboard.selected.is_some() {
            Action::CloseDetail
        } else {
            Action::CloseDashboard
        }),
        KeyCode::Tab => Some(Action::SwitchTab(match dashboard.tab {
            AdminTab::Conversations => AdminTab::Test,
            AdminTab::Test => AdminTab::Conversations,
        })),
        KeyCode::Char('r') => Some(Action::Reload),
        _ if dashboard.selected.is_some() => None,
        KeyCode::Left | KeyCode::Char('h') => Some(Action::PrevPage),
        KeyCode::Right | KeyCode::Char('l') => Some(Action::NextPage),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::CursorUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::CursorDown),
        KeyCode::Enter => Some(Action::OpenSelected),
        _ => None,
    }
}

/// Chip for digit key `c` (1-based)
fn chip(chips: &[&str], c: char) -> Option<String> {
    let index = c.to_digit(10)?.checked_sub(1)?;
    let index = usize::try_from(index).ok()?;
    chips.get(index).map(|s| (*s).to_string())
}

// ============================================================================
// Rendering
// ============================================================================

/// Render the whole UI.
pub fn render(frame: &mut Frame, app: &App) {
    match app.view.screen {
        Screen::Landing => render_landing(frame, app),
        Screen::Chat => render_chat(frame, app),
        Screen::Dashboard => render_dashboard(frame, app),
    }

    if app.view.show_admin_menu {
        render_admin_menu(frame);
    }
    if app.view.login_has_focus() {
        render_login(frame, app);
    }
    if app.view.show_end_notice {
        render_end_notice(frame);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled("SORI", Style::default().fg(SORI_COLOR).bold())];
    if app.view.is_admin {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("[관리자 모드]", Style::default().fg(Color::Yellow)));
    }
    if let Some(warning) = app.backend_warning() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(warning.to_string(), Style::default().fg(ERROR_COLOR)));
    }
    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

fn render_footer(frame: &mut Frame, hints: &[(&str, &str)], area: Rect) {
    let mut spans = Vec::new();
    for (i, (key, label)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" · ", Style::default().fg(DIM_COLOR)));
        }
        spans.push(Span::styled((*key).to_string(), Style::default().bold()));
        spans.push(Span::raw(format!(" {label}")));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_landing(frame: &mut Frame, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(6),
        Constraint::Length(1),
    ])
    .split(frame.area());

    render_header(frame, app, chunks[0]);

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("오늘 마음은 어때?", Style::default().bold())),
        Line::from(""),
    ];
    let chips: Vec<Span> = LANDING_CHIPS
        .iter()
        .enumerate()
        .flat_map(|(i, chip)| {
            [
                Span::styled(format!("[{}] ", i + 1), Style::default().fg(DIM_COLOR)),
                Span::styled(format!("{chip}   "), Style::default().fg(USER_COLOR)),
            ]
        })
        .collect();
    lines.push(Line::from(chips));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter 를 눌러 대화를 시작해요",
        Style::default().fg(DIM_COLOR),
    )));

    let body = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(body, chunks[1]);

    render_footer(
        frame,
        &[("Enter", "대화 시작"), ("1-4", "빠른 답장"), ("F2", "관리자"), ("q", "종료")],
        chunks[2],
    );
}

fn render_chat(frame: &mut Frame, app: &App) {
    let session = app.session();
    let banner_height = u16::from(session.error().is_some()) * 2;
    let chunks = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(5),
        Constraint::Length(banner_height),
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .split(frame.area());

    render_header(frame, app, chunks[0]);

    if app.view.is_admin {
        let body = Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);
        render_history(frame, session.history(), session.is_loading(), body[0]);
        render_analysis_panel(frame, session.analysis(), app.view.show_json, body[1]);
    } else {
        render_history(frame, session.history(), session.is_loading(), chunks[1]);
    }

    if let Some(error) = session.error() {
        let mut lines = vec![Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(ERROR_COLOR),
        ))];
        if app.backend_hint() {
            lines.push(Line::from(Span::styled(
                "백엔드 서버가 실행 중인지 확인해주세요.",
                Style::default().fg(DIM_COLOR),
            )));
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), chunks[2]);
    }

    let chips: Vec<Span> = CHAT_CHIPS
        .iter()
        .enumerate()
        .map(|(i, chip)| Span::styled(format!("Alt+{} {chip}  ", i + 1), Style::default().fg(DIM_COLOR)))
        .collect();
    frame.render_widget(Paragraph::new(Line::from(chips)), chunks[3]);

    render_composer(frame, app, chunks[4]);

    let mut hints = vec![("Enter", "보내기"), ("Ctrl+R", "새 대화"), ("Esc", "처음으로"), ("F2", "관리자")];
    if app.view.is_admin {
        hints.push(("F3", "JSON"));
    }
    render_footer(frame, &hints, chunks[5]);
}

fn render_history(frame: &mut Frame, history: &[Turn], loading: bool, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();
    for turn in history {
        let (name, color) = match turn.role {
            Role::Ai => ("SORI", SORI_COLOR),
            Role::User => ("나", USER_COLOR),
        };
        lines.push(Line::from(Span::styled(name, Style::default().fg(color).bold())));
        lines.extend(turn.content.lines().map(|l| Line::from(l.to_string())));
        lines.push(Line::from(""));
    }
    if loading {
        lines.push(Line::from(Span::styled(
            "SORI 가 답을 생각하고 있어요…",
            Style::default().fg(DIM_COLOR).add_modifier(Modifier::ITALIC),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(" 대화 ");
    let inner_width = area.width.saturating_sub(2).max(1);
    let inner_height = area.height.saturating_sub(2);
    let scroll = wrapped_height(&lines, inner_width).saturating_sub(inner_height);

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

/// Rows `lines` take when wrapped to `width`
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    let width = usize::from(width);
    let rows: usize = lines.iter().map(|l| l.width().div_ceil(width).max(1)).sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

fn render_composer(frame: &mut Frame, app: &App, area: Rect) {
    let session = app.session();
    let (text, style) = if session.is_ended() {
        (
            "대화가 종료되었어요. Ctrl+R 로 새 대화를 시작할 수 있어요.".to_string(),
            Style::default().fg(DIM_COLOR),
        )
    } else if app.view.composer.is_empty() {
        ("메시지를 입력해줘".to_string(), Style::default().fg(DIM_COLOR))
    } else {
        (app.view.composer.clone(), Style::default())
    };

    let border = if session.is_loading() || session.is_ended() {
        DIM_COLOR
    } else {
        SORI_COLOR
    };
    let composer = Paragraph::new(text).style(style).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border)),
    );
    frame.render_widget(composer, area);
}

fn render_analysis_panel(frame: &mut Frame, analysis: Option<&AnalysisResult>, show_json: bool, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(if show_json { " 평가 JSON " } else { " 평가 " });

    let lines = match analysis {
        None => vec![Line::from(Span::styled(
            "아직 평가가 없어요",
            Style::default().fg(DIM_COLOR),
        ))],
        Some(analysis) if show_json => serde_json::to_string_pretty(&analysis.report_json())
            .unwrap_or_default()
            .lines()
            .map(|l| Line::from(l.to_string()))
            .collect(),
        Some(analysis) => {
            let mut lines = vec![
                label_line("정서적 고통", &analysis.emotional_distress),
                label_line("자살 신호", &analysis.suicide_signal),
                label_line("위험 점수", &analysis.risk_score.to_string()),
                label_line("다음 조치", &analysis.next_action),
            ];
            if let Some(turns) = analysis.history_analysis.as_deref().filter(|t| !t.is_empty()) {
                let trail: Vec<String> = turns.iter().map(|t| t.risk_score.to_string()).collect();
                lines.push(label_line("턴별 위험", &trail.join(" → ")));
            }
            if let Some(report) = &analysis.end_report {
                lines.push(Line::from(""));
                lines.extend(end_report_lines(report));
            }
            lines
        }
    };

    let panel = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(panel, area);
}

fn label_line(label: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(LABEL_COLOR)),
        Span::raw(value.to_string()),
    ])
}

fn end_report_lines(report: &EndReport) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled("종합 결과", Style::default().bold())),
        label_line("대화 요약", &report.summary),
        label_line("최종 위험 점수", &report.risk_score.to_string()),
        label_line("상태 추이", &report.trend),
        label_line("최종 정서적 고통", &report.distress_level),
        label_line("최종 자살 신호", &report.suicide_signal),
        label_line("대화 턴 수", &report.conversation_turns.to_string()),
        label_line("주요 주제", &report.key_topics.join(", ")),
        label_line("다음 대화 시 가이드", &report.next_guidance),
    ]
}

// ============================================================================
// Dashboard
// ============================================================================

fn render_dashboard(frame: &mut Frame, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(2),
        Constraint::Min(5),
        Constraint::Length(1),
    ])
    .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_tabs(frame, app.view.dashboard.tab, chunks[1]);

    let dashboard = &app.view.dashboard;
    if dashboard.loading {
        let loading = Paragraph::new("불러오는 중...").style(Style::default().fg(DIM_COLOR));
        frame.render_widget(loading, chunks[2]);
    } else if let Some(error) = &dashboard.error {
        let lines = vec![
            Line::from(Span::styled(error.clone(), Style::default().fg(ERROR_COLOR))),
            Line::from(Span::styled("r 키로 다시 시도", Style::default().fg(DIM_COLOR))),
        ];
        frame.render_widget(Paragraph::new(lines), chunks[2]);
    } else if let Some(detail) = &dashboard.selected {
        render_detail(frame, detail, chunks[2]);
    } else {
        render_conversation_table(frame, app, chunks[2]);
    }

    let page = format!("{}/{}", dashboard.page(), dashboard.page_count());
    let hints: Vec<(&str, &str)> = if dashboard.selected.is_some() {
        vec![("Esc", "목록으로"), ("Tab", "탭 전환"), ("r", "새로고침")]
    } else {
        vec![
            ("↑↓", "선택"),
            ("Enter", "열기"),
            ("←→", page.as_str()),
            ("Tab", "탭 전환"),
            ("r", "새로고침"),
            ("Esc", "닫기"),
        ]
    };
    render_footer(frame, &hints, chunks[3]);
}

fn render_tabs(frame: &mut Frame, active: AdminTab, area: Rect) {
    let mut spans = Vec::new();
    for tab in [AdminTab::Conversations, AdminTab::Test] {
        let style = if tab == active {
            Style::default().fg(SORI_COLOR).bold().add_modifier(Modifier::UNDERLINED)
        } else {
            Style::default().fg(DIM_COLOR)
        };
        spans.push(Span::styled(format!(" {} ", tab.label()), style));
        spans.push(Span::raw(" "));
    }
    let tabs = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(tabs, area);
}

fn render_conversation_table(frame: &mut Frame, app: &App, area: Rect) {
    let dashboard = &app.view.dashboard;
    let rows_data = dashboard.page_rows();
    if rows_data.is_empty() {
        let empty = Paragraph::new("저장된 대화가 없습니다.").style(Style::default().fg(DIM_COLOR));
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(["날짜", "시간", "위험", "고통", "요약"])
        .style(Style::default().fg(LABEL_COLOR).bold());
    let rows: Vec<Row> = rows_data
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let style = if i == dashboard.cursor {
                Style::default().bg(Color::Rgb(40, 60, 90)).bold()
            } else {
                Style::default()
            };
            Row::new([
                Cell::from(c.date.clone()),
                Cell::from(c.time.clone()),
                Cell::from(Span::styled(c.risk_score.to_string(), risk_style(c.risk_score))),
                Cell::from(c.distress_level.clone()),
                Cell::from(c.summary.clone()),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(11),
            Constraint::Length(9),
            Constraint::Length(5),
            Constraint::Length(8),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded));
    frame.render_widget(table, area);
}

fn risk_style(score: i64) -> Style {
    match score {
        s if s >= 70 => Style::default().fg(ERROR_COLOR).bold(),
        s if s >= 40 => Style::default().fg(Color::Yellow),
        _ => Style::default(),
    }
}

fn render_detail(frame: &mut Frame, detail: &ConversationDetail, area: Rect) {
    let body = Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).split(area);

    let mut lines = vec![
        Line::from(Span::styled(
            format!("{} {}", detail.date, detail.time),
            Style::default().fg(LABEL_COLOR),
        )),
        Line::from(""),
    ];
    for stored in &detail.history {
        let turn = stored.as_turn();
        let (name, color) = match turn.role {
            Role::Ai => ("SORI", SORI_COLOR),
            Role::User => ("사용자", USER_COLOR),
        };
        let mut heading = vec![Span::styled(name, Style::default().fg(color).bold())];
        if let Some(analysis) = &stored.analysis {
            heading.push(Span::styled(
                format!("  위험 {} · {}", analysis.risk_score, analysis.emotional_distress),
                risk_style(analysis.risk_score),
            ));
        }
        lines.push(Line::from(heading));
        lines.extend(turn.content.lines().map(|l| Line::from(l.to_string())));
        lines.push(Line::from(""));
    }
    let transcript = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded).title(" 대화 내용 "))
        .wrap(Wrap { trim: false });
    frame.render_widget(transcript, body[0]);

    let mut summary = Vec::new();
    if let Some(analysis) = &detail.analysis {
        summary.push(label_line("정서적 고통", &analysis.emotional_distress));
        summary.push(label_line("자살 신호", &analysis.suicide_signal));
        summary.push(label_line("위험 점수", &analysis.risk_score.to_string()));
        summary.push(label_line("다음 조치", &analysis.next_action));
        if let Some(trend) = &analysis.trend {
            summary.push(label_line("상태 추이", trend));
        }
    }
    if let Some(report) = &detail.end_report {
        if !summary.is_empty() {
            summary.push(Line::from(""));
        }
        summary.extend(end_report_lines(report));
    }
    if summary.is_empty() {
        summary.push(Line::from(Span::styled("평가 정보 없음", Style::default().fg(DIM_COLOR))));
    }
    let panel = Paragraph::new(summary)
        .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded).title(" 평가 "))
        .wrap(Wrap { trim: false });
    frame.render_widget(panel, body[1]);
}

// ============================================================================
// Overlays
// ============================================================================

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

fn modal(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(SORI_COLOR))
        .title(title)
}

fn render_end_notice(frame: &mut Frame) {
    let area = centered(frame.area(), 48, 7);
    let lines = vec![
        Line::from(""),
        Line::from("오늘 이야기 나눠줘서 고마워."),
        Line::from("대화가 마무리되었어요."),
        Line::from(""),
        Line::from(Span::styled("Enter 닫기", Style::default().fg(DIM_COLOR))),
    ];
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(modal(" 대화 종료 ")),
        area,
    );
}

fn render_login(frame: &mut Frame, app: &App) {
    let login = &app.view.login;
    let area = centered(frame.area(), 44, 9);

    let field = |label: &str, value: String, focused: bool| {
        let marker = if focused { "▶ " } else { "  " };
        Line::from(vec![
            Span::raw(marker.to_string()),
            Span::styled(format!("{label}: "), Style::default().fg(LABEL_COLOR)),
            Span::raw(value),
        ])
    };

    let mut lines = vec![
        Line::from(""),
        field("아이디", login.id.clone(), login.focus == LoginField::Id),
        field(
            "비밀번호",
            "*".repeat(login.password.chars().count()),
            login.focus == LoginField::Password,
        ),
        Line::from(""),
    ];
    if let Some(error) = &login.error {
        lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(ERROR_COLOR))));
    }
    lines.push(Line::from(Span::styled(
        "Tab 전환 · Enter 로그인 · Esc 닫기",
        Style::default().fg(DIM_COLOR),
    )));

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(modal(" 관리자 로그인 ")), area);
}

fn render_admin_menu(frame: &mut Frame) {
    let full = frame.area();
    let width = 24.min(full.width);
    let area = Rect {
        x: full.x + full.width - width,
        y: full.y + 1,
        width,
        height: 4.min(full.height.saturating_sub(1)),
    };
    let lines = vec![Line::from("d  대시보드"), Line::from("l  로그아웃")];
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(modal(" 관리자 ")), area);
}
