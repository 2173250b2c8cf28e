use anyhow::Result;
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
    },
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{BarChart, Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;

use volt::analytics::{ctc_series, ctc_summary};
use volt::models::{format_ctc, parse_ctc};
use volt::{
    InputError, JobApplication, NewApplication, PersistError, PersistencePort, Status, Tracker,
    ViewQuery,
};

use crate::truncate;

enum Mode {
    Normal,
    Search,
    #[cfg(feature = "notes")]
    Note {
        id: i64,
        buffer: String,
    },
    Add(AddForm),
    ConfirmDelete(i64),
    Analytics,
}

#[derive(Debug, Default)]
struct AddForm {
    title: String,
    company: String,
    ctc: String,
    focus: usize,
    error: Option<String>,
}

impl AddForm {
    const LABELS: [&'static str; 3] = ["Title", "Company", "Annual CTC (Lakhs)"];

    fn field_mut(&mut self) -> &mut String {
        match self.focus {
            0 => &mut self.title,
            1 => &mut self.company,
            _ => &mut self.ctc,
        }
    }

    fn value(&self, idx: usize) -> &str {
        match idx {
            0 => &self.title,
            1 => &self.company,
            _ => &self.ctc,
        }
    }

    fn next_field(&mut self) {
        self.focus = (self.focus + 1) % Self::LABELS.len();
    }

    fn submit(&self) -> Result<NewApplication, InputError> {
        let ctc = parse_ctc(&self.ctc)?;
        Ok(NewApplication::new(self.title.trim(), self.company.trim()).with_ctc(ctc))
    }
}

struct Message {
    text: String,
    warning: bool,
}

struct AppState {
    query: ViewQuery,
    rows: Vec<JobApplication>,
    selected: usize,
    mode: Mode,
    message: Option<Message>,
}

impl AppState {
    fn new() -> Self {
        Self {
            query: ViewQuery::default(),
            rows: Vec::new(),
            selected: 0,
            mode: Mode::Normal,
            message: None,
        }
    }

    fn refresh<P: PersistencePort>(&mut self, tracker: &mut Tracker<P>) {
        self.rows = tracker.view(&self.query).to_vec();
        if self.selected >= self.rows.len() {
            self.selected = self.rows.len().saturating_sub(1);
        }
    }

    fn current_job(&self) -> Option<&JobApplication> {
        self.rows.get(self.selected)
    }

    fn next(&mut self) {
        if !self.rows.is_empty() && self.selected < self.rows.len() - 1 {
            self.selected += 1;
        }
    }

    fn prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn info(&mut self, text: impl Into<String>) {
        self.message = Some(Message {
            text: text.into(),
            warning: false,
        });
    }

    fn warn(&mut self, text: impl Into<String>) {
        self.message = Some(Message {
            text: text.into(),
            warning: true,
        });
    }

    /// Shows `ok` unless the write-through failed.
    fn report(&mut self, warning: Option<PersistError>, ok: impl Into<String>) {
        match warning {
            Some(e) => self.warn(format!("Not saved: {e}")),
            None => self.info(ok),
        }
    }
}

pub fn run_browse<P: PersistencePort>(tracker: &mut Tracker<P>) -> Result<()> {
    let mut state = AppState::new();
    state.refresh(tracker);

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableBracketedPaste)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, tracker);

    stdout().execute(DisableBracketedPaste)?;
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop<P: PersistencePort>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    tracker: &mut Tracker<P>,
) -> Result<()> {
    let mut list_state = ListState::default();

    loop {
        list_state.select(if state.rows.is_empty() {
            None
        } else {
            Some(state.selected)
        });
        terminal.draw(|frame| draw(frame, state, tracker, &mut list_state))?;

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                state.message = None;
                if handle_key(key, state, tracker) {
                    break;
                }
            }
            Event::Paste(text) => handle_paste(&text, state, tracker),
            _ => continue,
        }
        state.refresh(tracker);
    }
    Ok(())
}

/// Returns `true` to quit.
fn handle_key<P: PersistencePort>(
    key: KeyEvent,
    state: &mut AppState,
    tracker: &mut Tracker<P>,
) -> bool {
    let mode = std::mem::replace(&mut state.mode, Mode::Normal);
    state.mode = match mode {
        Mode::Normal => return handle_normal(key, state, tracker),
        Mode::Search => match key.code {
            KeyCode::Enter | KeyCode::Esc => Mode::Normal,
            KeyCode::Backspace => {
                state.query.search.pop();
                Mode::Search
            }
            KeyCode::Char(c) => {
                state.query.search.push(c);
                state.selected = 0;
                Mode::Search
            }
            _ => Mode::Search,
        },
        #[cfg(feature = "notes")]
        Mode::Note { id, mut buffer } => match key.code {
            KeyCode::Esc => Mode::Normal,
            KeyCode::Enter => {
                let note = Some(buffer.trim().to_string()).filter(|n| !n.is_empty());
                let synced = tracker.update_note(id, note);
                state.report(synced.warning, format!("Saved note for #{id}"));
                Mode::Normal
            }
            KeyCode::Backspace => {
                buffer.pop();
                Mode::Note { id, buffer }
            }
            KeyCode::Char(c) => {
                buffer.push(c);
                Mode::Note { id, buffer }
            }
            _ => Mode::Note { id, buffer },
        },
        Mode::Add(mut form) => match key.code {
            KeyCode::Esc => Mode::Normal,
            KeyCode::Tab | KeyCode::Down => {
                form.next_field();
                Mode::Add(form)
            }
            KeyCode::Enter => match form.submit() {
                Ok(new) => match tracker.add(new) {
                    Ok(synced) => {
                        state.report(synced.warning, format!("Added job #{}", synced.value.id));
                        Mode::Normal
                    }
                    Err(e) => {
                        form.error = Some(e.to_string());
                        Mode::Add(form)
                    }
                },
                Err(e) => {
                    form.error = Some(e.to_string());
                    Mode::Add(form)
                }
            },
            KeyCode::Backspace => {
                form.field_mut().pop();
                Mode::Add(form)
            }
            KeyCode::Char(c) => {
                form.field_mut().push(c);
                form.error = None;
                Mode::Add(form)
            }
            _ => Mode::Add(form),
        },
        Mode::ConfirmDelete(id) => {
            if let KeyCode::Char('y') | KeyCode::Char('Y') = key.code {
                let synced = tracker.remove(id);
                state.report(synced.warning, format!("Deleted job #{id}"));
            }
            Mode::Normal
        }
        Mode::Analytics => match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('v') | KeyCode::Esc => Mode::Normal,
            _ => Mode::Analytics,
        },
    };
    false
}

fn handle_normal<P: PersistencePort>(
    key: KeyEvent,
    state: &mut AppState,
    tracker: &mut Tracker<P>,
) -> bool {
    let current_id = state.current_job().map(|j| j.id);
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Down | KeyCode::Char('j') => state.next(),
        KeyCode::Up | KeyCode::Char('k') => state.prev(),
        KeyCode::Char('/') => state.mode = Mode::Search,
        KeyCode::Char('f') => {
            state.query.status = state.query.status.cycle();
            state.selected = 0;
        }
        KeyCode::Char('o') => state.query.sort = state.query.sort.toggle(),
        KeyCode::Char('a') => set_status(state, tracker, current_id, Status::Applied),
        KeyCode::Char('x') => set_status(state, tracker, current_id, Status::Rejected),
        KeyCode::Char('s') => set_status(state, tracker, current_id, Status::Selected),
        #[cfg(feature = "notes")]
        KeyCode::Char('e') => {
            if let Some(job) = state.current_job() {
                state.mode = Mode::Note {
                    id: job.id,
                    buffer: job.note.clone().unwrap_or_default(),
                };
            }
        }
        KeyCode::Char('n') => state.mode = Mode::Add(AddForm::default()),
        KeyCode::Char('d') => {
            if let Some(id) = current_id {
                state.mode = Mode::ConfirmDelete(id);
            }
        }
        KeyCode::Char('v') => state.mode = Mode::Analytics,
        #[cfg(feature = "resume")]
        KeyCode::Char('R') => {
            let synced = tracker.clear_resume();
            if synced.value || synced.warning.is_some() {
                state.report(synced.warning, "Resume removed");
            } else {
                state.info("No resume attached");
            }
        }
        _ => {}
    }
    false
}

fn set_status<P: PersistencePort>(
    state: &mut AppState,
    tracker: &mut Tracker<P>,
    id: Option<i64>,
    status: Status,
) {
    let Some(id) = id else { return };
    let synced = tracker.update_status(id, status);
    state.report(synced.warning, format!("#{id} marked {status}"));
}

/// Pasted text goes into whichever field is being edited. In the job list a
/// paste is a dropped file and becomes the resume.
fn handle_paste<P: PersistencePort>(text: &str, state: &mut AppState, tracker: &mut Tracker<P>) {
    if let Mode::Normal = state.mode {
        drop_resume(text, state, tracker);
        return;
    }
    match &mut state.mode {
        Mode::Search => state.query.search.push_str(text.trim()),
        #[cfg(feature = "notes")]
        Mode::Note { buffer, .. } => buffer.push_str(text),
        Mode::Add(form) => form.field_mut().push_str(text.trim()),
        _ => {}
    }
}

#[cfg(feature = "resume")]
fn drop_resume<P: PersistencePort>(text: &str, state: &mut AppState, tracker: &mut Tracker<P>) {
    let Some(path) = volt::resume::path_from_drop(text) else {
        return;
    };
    match volt::resume::read_document_blocking(path) {
        Ok(doc) => {
            let size = doc.len();
            let synced = tracker.attach_resume(doc);
            state.report(synced.warning, format!("Resume attached ({size} bytes)"));
        }
        Err(e) => state.warn(format!("Could not attach {}: {e}", path.display())),
    }
}

#[cfg(not(feature = "resume"))]
fn drop_resume<P: PersistencePort>(_text: &str, _state: &mut AppState, _tracker: &mut Tracker<P>) {
}

fn draw<P: PersistencePort>(
    frame: &mut Frame,
    state: &AppState,
    tracker: &Tracker<P>,
    list_state: &mut ListState,
) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    frame.render_widget(Paragraph::new(header_line(state, tracker)), outer[0]);

    if let Mode::Analytics = state.mode {
        draw_analytics(frame, outer[1], tracker);
    } else {
        draw_jobs(frame, outer[1], state, list_state);
    }

    let footer = match &state.message {
        Some(msg) if msg.warning => {
            Paragraph::new(format!(" {}", msg.text)).style(Style::default().fg(Color::Red))
        }
        Some(msg) => {
            Paragraph::new(format!(" {}", msg.text)).style(Style::default().fg(Color::Green))
        }
        None => Paragraph::new(help_text(&state.mode)).style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(footer, outer[2]);

    match &state.mode {
        Mode::Add(form) => draw_add_form(frame, form),
        #[cfg(feature = "notes")]
        Mode::Note { id, buffer } => draw_popup(
            frame,
            &format!(" Note for #{id} "),
            Text::from(vec![
                Line::from(format!("{buffer}_")),
                Line::from(""),
                Line::from(Span::styled(
                    "Enter: save (empty clears)  Esc: cancel",
                    Style::default().fg(Color::DarkGray),
                )),
            ]),
        ),
        Mode::ConfirmDelete(id) => draw_popup(
            frame,
            " Delete ",
            Text::from(format!("Delete job #{id}? (y/n)")),
        ),
        _ => {}
    }
}

fn header_line<P: PersistencePort>(state: &AppState, tracker: &Tracker<P>) -> Line<'static> {
    let cursor = if let Mode::Search = state.mode { "_" } else { "" };
    let mut spans = vec![
        Span::styled(" ⚡Volt ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(" Search: {}{}", state.query.search, cursor)),
        Span::raw(format!("  Status: {}", state.query.status)),
        Span::raw(format!("  CTC: {}", state.query.sort)),
    ];
    #[cfg(feature = "resume")]
    spans.push(match tracker.resume() {
        Some(doc) => Span::styled(
            format!("  Resume: {} ({} KiB)", doc.mime, doc.len().div_ceil(1024)),
            Style::default().fg(Color::Green),
        ),
        None => Span::styled("  Resume: none", Style::default().fg(Color::DarkGray)),
    });
    #[cfg(not(feature = "resume"))]
    let _ = tracker;
    Line::from(spans)
}

fn help_text(mode: &Mode) -> &'static str {
    match mode {
        Mode::Search => " type to search  Enter/Esc: done",
        Mode::Analytics => " v/Esc: back  q: quit",
        _ => {
            " j/k:move  /:search  f:filter  o:sort  a/x/s:applied/rejected/selected  e:note  n:add  d:delete  v:analytics  q:quit"
        }
    }
}

fn status_style(status: Status) -> Style {
    match status {
        Status::Applied => Style::default().fg(Color::Cyan),
        Status::Rejected => Style::default().fg(Color::Red),
        Status::Selected => Style::default().fg(Color::Green),
    }
}

fn draw_jobs(frame: &mut Frame, area: Rect, state: &AppState, list_state: &mut ListState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let items: Vec<ListItem> = state
        .rows
        .iter()
        .enumerate()
        .map(|(i, job)| {
            let icon = match job.status {
                Status::Applied => "+",
                Status::Rejected => "x",
                Status::Selected => "*",
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{icon} "), status_style(job.status)),
                Span::raw(format!(
                    "{:<4} {:<28} {:<18} {:>12}",
                    i + 1,
                    truncate(&job.title, 28),
                    truncate(&job.company, 18),
                    format_ctc(job.ctc)
                )),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!(
            " Applications ({}) ",
            state.rows.len()
        )))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    let detail = Paragraph::new(build_detail(state))
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false });
    frame.render_widget(detail, chunks[1]);
}

fn build_detail(state: &AppState) -> Text<'_> {
    let Some(job) = state.current_job() else {
        return Text::raw("No applications. Press n to add one.");
    };

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(
        &job.title,
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(format!("at {}", job.company)));
    lines.push(Line::from(Span::styled(
        format!("Status: {}", job.status),
        status_style(job.status),
    )));
    lines.push(Line::from(format!("Annual CTC: {}", format_ctc(job.ctc))));
    lines.push(Line::from(Span::styled(
        format!("Job #{}", job.id),
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::from(""));

    #[cfg(feature = "notes")]
    push_note(&mut lines, job);

    Text::from(lines)
}

#[cfg(feature = "notes")]
fn push_note<'a>(lines: &mut Vec<Line<'a>>, job: &JobApplication) {
    let Some(note) = job.note.as_deref().filter(|_| job.has_note()) else {
        lines.push(Line::from(Span::styled(
            "(No note. Press e to add one)",
            Style::default().fg(Color::DarkGray),
        )));
        return;
    };
    lines.push(Line::from(Span::styled(
        "NOTE",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for line in textwrap::fill(note, 40).lines() {
        lines.push(Line::from(format!("  {line}")));
    }
}

fn draw_analytics<P: PersistencePort>(frame: &mut Frame, area: Rect, tracker: &Tracker<P>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    let breakdown = tracker.breakdown();
    let status_bars: Vec<(&str, u64)> = breakdown
        .counts
        .iter()
        .map(|(s, n)| (s.as_str(), *n as u64))
        .collect();
    let status_chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Application Status Distribution "),
        )
        .data(status_bars.as_slice())
        .bar_width(10)
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::Cyan));
    frame.render_widget(status_chart, top[0]);

    let mut stats = vec![Line::from(format!(
        "Total Applications: {}",
        breakdown.total
    ))];
    for status in Status::ALL {
        stats.push(Line::from(Span::styled(
            format!(
                "{}: {} ({:.1}%)",
                status,
                breakdown.count(status),
                breakdown.percent(status)
            ),
            status_style(status),
        )));
    }
    if let Some(summary) = ctc_summary(tracker.records()) {
        stats.push(Line::from(""));
        stats.push(Line::from(format!(
            "Average CTC: {} over {} reported",
            format_ctc(Some(summary.mean)),
            summary.reported
        )));
        stats.push(Line::from(format!(
            "Highest CTC: {}",
            format_ctc(Some(summary.max))
        )));
    }
    frame.render_widget(
        Paragraph::new(stats).block(Block::default().borders(Borders::ALL).title(" Statistics ")),
        top[1],
    );

    let series = ctc_series(tracker.records());
    let ctc_bars: Vec<(&str, u64)> = series
        .iter()
        .map(|(label, ctc)| (label.as_str(), ctc.map_or(0, |c| c.round() as u64)))
        .collect();
    let ctc_chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Annual CTC by Job Application (Lakhs) "),
        )
        .data(ctc_bars.as_slice())
        .bar_width(6)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Magenta));
    frame.render_widget(ctc_chart, rows[1]);
}

fn draw_add_form(frame: &mut Frame, form: &AddForm) {
    let mut lines = Vec::new();
    for (idx, label) in AddForm::LABELS.iter().enumerate() {
        let focused = idx == form.focus;
        let marker = if focused { "> " } else { "  " };
        let cursor = if focused { "_" } else { "" };
        let style = if focused {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("{marker}{label:<20} {}{cursor}", form.value(idx)),
            style,
        )));
    }
    lines.push(Line::from(""));
    if let Some(err) = &form.error {
        lines.push(Line::from(Span::styled(
            err.clone(),
            Style::default().fg(Color::Red),
        )));
    }
    lines.push(Line::from(Span::styled(
        "Tab: next field  Enter: add  Esc: cancel",
        Style::default().fg(Color::DarkGray),
    )));
    draw_popup(frame, " Add New Job ", Text::from(lines));
}

fn draw_popup(frame: &mut Frame, title: &str, body: Text) {
    let area = centered(frame.area(), 60, 9);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(body)
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
            .wrap(Wrap { trim: false }),
        area,
    );
}

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
