pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use wodrun::{
    keymap::LEGEND,
    machine::SessionMachine,
    results::ResultsSummary,
    session::Phase,
    timers::TimerKind,
    util::format_clock,
};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match (self.state, self.session.summary()) {
            (AppState::Results, Some(summary)) => render_results(summary, area, buf),
            _ => render_session(
                self.session.machine(),
                self.session.was_resumed(),
                area,
                buf,
            ),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

/// Cuts `text` to at most `width` columns.
fn fit(text: &str, width: u16) -> String {
    let width = width as usize;
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    for c in text.chars() {
        if out.width() + 1 >= width {
            break;
        }
        out.push(c);
    }
    out.push('…');
    out
}

fn render_session(machine: &SessionMachine, resumed: bool, area: Rect, buf: &mut Buffer) {
    let state = machine.state();
    let plan = machine.plan();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2), // title + phase
            Constraint::Min(5),    // exercise
            Constraint::Length(3), // clocks
            Constraint::Length(1), // progress
            Constraint::Length(1), // padding
            Constraint::Length(1), // legend
        ])
        .split(area);

    let mut phase = match state.phase {
        Phase::Rest => "Rest".to_string(),
        Phase::Main => format!(
            "{}  round {}/{}",
            plan_section_label(state.phase),
            state.current_round,
            plan.timeline().rounds()
        ),
        other => plan_section_label(other).to_string(),
    };
    if state.is_paused {
        phase.push_str("  [PAUSED]");
    } else if resumed && state.elapsed_seconds > 0 {
        phase.push_str("  (resumed)");
    }
    Paragraph::new(vec![
        Line::from(Span::styled(
            fit(&plan.title, chunks[0].width),
            bold().fg(Color::Cyan),
        )),
        Line::from(Span::styled(phase, dim())),
    ])
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    exercise_panel(machine).render(chunks[1], buf);
    clocks(machine).render(chunks[2], buf);

    let total = state.completed.len().max(1);
    Gauge::default()
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(state.progress().clamp(0.0, 1.0))
        .label(format!("{}/{}", state.completed_count(), total))
        .render(chunks[3], buf);

    let legend = LEGEND
        .iter()
        .flat_map(|(key, what)| {
            [
                Span::styled(format!(" {key} "), bold()),
                Span::styled(format!("{what} "), dim()),
            ]
        })
        .collect::<Vec<_>>();
    Paragraph::new(Line::from(legend))
        .alignment(Alignment::Center)
        .render(chunks[5], buf);
}

fn plan_section_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Warmup => "Warm-up",
        Phase::SkillWork => "Skill work",
        Phase::Main => "Main workout",
        Phase::Secondary => "Secondary",
        Phase::Cooldown => "Cool-down",
        Phase::Rest => "Rest",
        Phase::Complete => "Done",
    }
}

fn exercise_panel(machine: &SessionMachine) -> Paragraph<'_> {
    let state = machine.state();
    let mut lines = Vec::new();

    if !state.started {
        lines.push(Line::from(Span::styled(
            "Press space to start",
            bold().fg(Color::Yellow),
        )));
        lines.push(Line::from(""));
    }

    if state.phase == Phase::Rest {
        lines.push(Line::from(Span::styled(
            format_clock(state.timers.rest.remaining),
            bold().fg(Color::Yellow),
        )));
        if let Some(next) = machine.next_exercise() {
            lines.push(Line::from(vec![
                Span::styled("next: ", dim()),
                Span::raw(next.name.clone()),
            ]));
        }
        lines.push(Line::from(Span::styled("s to skip", dim())));
    } else if let Some(exercise) = machine.current_exercise() {
        lines.push(Line::from(Span::styled(
            exercise.name.clone(),
            bold().fg(Color::Green),
        )));
        if let Some(prescription) = exercise.prescription() {
            lines.push(Line::from(prescription));
        }
        if let Some(notes) = &exercise.notes {
            lines.push(Line::from(Span::styled(
                notes.clone(),
                Style::default().add_modifier(Modifier::ITALIC),
            )));
        }
        if let Some(scaling) = &exercise.scaling_note {
            lines.push(Line::from(vec![
                Span::styled("scale: ", dim()),
                Span::raw(scaling.clone()),
            ]));
        }
        if state.phase == Phase::Secondary && machine.plan().is_amrap() {
            lines.push(Line::from(Span::styled(
                format!("AMRAP rounds: {}", state.amrap_rounds_completed),
                Style::default().fg(Color::Magenta),
            )));
        }
    }

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
}

fn clocks(machine: &SessionMachine) -> Paragraph<'_> {
    let state = machine.state();
    let shown = |kind: TimerKind, label: &'static str| {
        let timer = state.timers.get(kind);
        let style = if timer.running {
            bold()
        } else {
            dim()
        };
        [
            Span::styled(format!("{label} "), dim()),
            Span::styled(format!("{}   ", format_clock(timer.remaining)), style),
        ]
    };

    let mut spans = Vec::new();
    if machine
        .current_exercise()
        .and_then(|exercise| exercise.countdown_seconds())
        .is_some()
    {
        spans.extend(shown(TimerKind::Exercise, "exercise"));
    }
    if state.main_circuit_round > 0 {
        spans.extend(shown(TimerKind::MainCircuit, "main"));
        spans.push(Span::styled(
            format!("r{}   ", state.main_circuit_round),
            dim(),
        ));
    }
    let amrap_on = state.timers.amrap.running
        || state.paused_flags.is_some_and(|flags| flags.amrap)
        || state.amrap_elapsed.is_some();
    if amrap_on {
        spans.extend(shown(TimerKind::Amrap, "amrap"));
    }
    if machine.config().total_seconds > 0 {
        spans.extend(shown(TimerKind::Total, "total"));
    }
    spans.push(Span::styled("elapsed ", dim()));
    spans.push(Span::raw(format_clock(state.elapsed_seconds)));

    Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::TOP))
        .alignment(Alignment::Center)
}

fn render_results(summary: &ResultsSummary, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(6),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(Line::from(Span::styled(
        format!("{} complete", fit(&summary.title, chunks[0].width)),
        bold().fg(Color::Cyan),
    )))
    .alignment(Alignment::Center)
    .render(chunks[0], buf);

    let mut stats = vec![
        Line::from(format!(
            "{}/{} exercises ({}%)",
            summary.exercises.len(),
            summary.total_exercises,
            summary.completion_rate()
        )),
        Line::from(format!(
            "time {}",
            format_clock(summary.total_elapsed_seconds)
        )),
        Line::from(format!("main rounds {}", summary.main_rounds_completed)),
    ];
    if let Some(elapsed) = summary.main_circuit_elapsed {
        stats.push(Line::from(format!(
            "main clock {} ({} rounds)",
            format_clock(elapsed),
            summary.main_circuit_rounds.unwrap_or(0)
        )));
    }
    if let Some(elapsed) = summary.amrap_elapsed {
        stats.push(Line::from(format!(
            "AMRAP {} rounds in {}",
            summary.amrap_rounds_completed,
            format_clock(elapsed)
        )));
    }
    stats.push(Line::from(Span::styled(
        match &summary.user_id {
            Some(user) => format!("recorded for {user}"),
            None => "not recorded (no user)".to_string(),
        },
        dim(),
    )));
    Paragraph::new(stats)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let done = summary
        .exercises
        .iter()
        .rev()
        .take(chunks[2].height as usize)
        .rev()
        .map(|result| {
            let spent = result
                .spent_seconds
                .map(|s| format!("  {}", format_clock(s)))
                .unwrap_or_default();
            Line::from(vec![
                Span::styled(
                    match result.round {
                        Some(round) => format!("r{round} "),
                        None => String::new(),
                    },
                    dim(),
                ),
                Span::raw(fit(&result.name, chunks[2].width.saturating_sub(12))),
                Span::styled(spent, dim()),
            ])
        })
        .collect::<Vec<_>>();
    Paragraph::new(done)
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    Paragraph::new(Span::styled("(q)uit", bold().add_modifier(Modifier::ITALIC)))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
}
