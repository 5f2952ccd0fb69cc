use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line as UiLine, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::diff::CharClass;
use crate::session::SessionResult;
use crate::{App, AppState};

pub const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

pub fn format_elapsed(ms: u64) -> String {
    let seconds = ms / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn chart_params(result: &SessionResult) -> (f64, f64) {
    let mut highest_wpm: f64 = 0.0;
    for sample in &result.wpm_samples {
        if sample.value > highest_wpm {
            highest_wpm = sample.value;
        }
    }

    let overall_duration = (result.time_elapsed_ms as f64 / 1000.0).max(1.0);
    (overall_duration, highest_wpm.round().max(1.0))
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
        let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
        let dim_bold_style = Style::default()
            .patch(bold_style)
            .add_modifier(Modifier::DIM);
        let underlined_dim_bold_style = Style::default()
            .patch(dim_bold_style)
            .add_modifier(Modifier::UNDERLINED);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);
        let magenta_style = Style::default().fg(Color::Magenta);

        match self.state {
            AppState::Typing => {
                let visible = self.engine.window().max_visible as u16;
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .horizontal_margin(HORIZONTAL_MARGIN)
                    .vertical_margin(VERTICAL_MARGIN)
                    .constraints([
                        Constraint::Length(1), // title
                        Constraint::Length(2), // description
                        Constraint::Length(1), // stats
                        Constraint::Length(1), // padding
                        Constraint::Length(visible.max(1)), // code window
                        Constraint::Min(1),    // padding
                        Constraint::Length(1), // legend
                    ])
                    .split(area);

                let title = Paragraph::new(UiLine::from(vec![
                    Span::styled(self.title.clone(), bold_style),
                    Span::styled(
                        format!("  [{} / {}]", self.meta.language, self.meta.mode),
                        dim_bold_style,
                    ),
                ]));
                title.render(chunks[0], buf);

                let description = Paragraph::new(Span::styled(
                    self.description.clone(),
                    Style::default().fg(Color::Gray).patch(italic_style),
                ))
                .wrap(Wrap { trim: true });
                description.render(chunks[1], buf);

                if let Ok(stats) = self.engine.realtime_stats() {
                    let stats_style = if self.flash_ticks > 0 {
                        red_bold_style
                    } else {
                        dim_bold_style
                    };
                    let stats_line = Paragraph::new(Span::styled(
                        format!(
                            "{:.0} wpm   {:.0}% acc   {:.0}%   {} errors   {}",
                            stats.wpm,
                            stats.accuracy,
                            stats.progress_percent,
                            stats.errors,
                            format_elapsed(stats.elapsed_ms),
                        ),
                        stats_style,
                    ));
                    stats_line.render(chunks[2], buf);
                }

                let classes = self.engine.classes();
                let typed_len = self.engine.typed_len();
                let target_len = self.engine.target_len();
                let lines = self.engine.lines();
                let window = self.engine.window();

                let mut rendered: Vec<UiLine> = Vec::new();
                for line in &lines[window.visible_range(lines.len())] {
                    let mut spans: Vec<Span> = Vec::new();

                    for (col, ch) in line.text.chars().enumerate() {
                        let index = line.start_index + col;
                        let has_cursor = index == typed_len && index < target_len;

                        let span = match classes.get(index) {
                            Some(CharClass::Correct) => {
                                Span::styled(ch.to_string(), green_bold_style)
                            }
                            Some(CharClass::Incorrect) => Span::styled(
                                match ch {
                                    ' ' => "·".to_owned(),
                                    c => c.to_string(),
                                },
                                red_bold_style,
                            ),
                            _ if has_cursor => {
                                Span::styled(ch.to_string(), underlined_dim_bold_style)
                            }
                            _ => Span::styled(ch.to_string(), dim_bold_style),
                        };
                        spans.push(span);
                    }

                    // A newline-terminated line owns the newline's offset;
                    // show a marker when the caret sits on it.
                    let newline_index = line.start_index + line.len();
                    if newline_index == line.end_index && typed_len == newline_index {
                        spans.push(Span::styled("↵", underlined_dim_bold_style));
                    }

                    rendered.push(UiLine::from(spans));
                }

                Paragraph::new(rendered).render(chunks[4], buf);

                let legend = Paragraph::new(Span::styled("(esc)ape", italic_style));
                legend.render(chunks[6], buf);
            }
            AppState::Results => {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .horizontal_margin(HORIZONTAL_MARGIN)
                    .vertical_margin(VERTICAL_MARGIN)
                    .constraints([
                        Constraint::Min(1),    // chart
                        Constraint::Length(1), // stats
                        Constraint::Length(1), // analysis summary
                        Constraint::Length(2), // achievements
                        Constraint::Length(2), // recommendations
                        Constraint::Length(1), // padding
                        Constraint::Length(1), // legend
                    ])
                    .split(area);

                if let Some(result) = &self.last_result {
                    let (overall_duration, highest_wpm) = chart_params(result);
                    let start_ms = result
                        .wpm_samples
                        .first()
                        .map(|s| s.timestamp_ms)
                        .unwrap_or(0);
                    let tuples: Vec<(f64, f64)> = result
                        .wpm_samples
                        .iter()
                        .map(|s| ((s.timestamp_ms - start_ms) as f64 / 1000.0, s.value))
                        .collect();
                    let datasets = vec![Dataset::default()
                        .marker(ratatui::symbols::Marker::Braille)
                        .style(magenta_style)
                        .graph_type(GraphType::Line)
                        .data(&tuples)];

                    let chart = Chart::new(datasets)
                        .x_axis(
                            Axis::default()
                                .title("seconds")
                                .bounds([0.0, overall_duration])
                                .labels(vec![
                                    Span::styled("0", bold_style),
                                    Span::styled(format!("{overall_duration:.0}"), bold_style),
                                ]),
                        )
                        .y_axis(
                            Axis::default()
                                .title("wpm")
                                .bounds([0.0, highest_wpm])
                                .labels(vec![
                                    Span::styled("0", bold_style),
                                    Span::styled(format!("{highest_wpm:.0}"), bold_style),
                                ]),
                        );

                    chart.render(chunks[0], buf);

                    let finish = if result.completed {
                        "exact finish"
                    } else {
                        "loose finish"
                    };
                    let stats = Paragraph::new(Span::styled(
                        format!(
                            "{:.0} wpm   {:.0}% acc   {} errors   {} extra   {}   {}",
                            result.wpm,
                            result.accuracy,
                            result.errors,
                            result.extra_typed,
                            format_elapsed(result.time_elapsed_ms),
                            finish,
                        ),
                        bold_style,
                    ))
                    .alignment(Alignment::Center);
                    stats.render(chunks[1], buf);
                }

                if let Some(outcome) = &self.last_outcome {
                    let analysis = &outcome.analysis;
                    let summary = Paragraph::new(Span::styled(
                        format!(
                            "consistency {:.0}%   improvement {:+.0}%   peak {:.0} wpm",
                            analysis.consistency, analysis.improvement, analysis.peak_wpm,
                        ),
                        Style::default().fg(Color::Cyan).patch(italic_style),
                    ))
                    .alignment(Alignment::Center);
                    summary.render(chunks[2], buf);

                    if !outcome.unlocked.is_empty() {
                        let unlocked = outcome
                            .unlocked
                            .iter()
                            .map(|a| format!("★ {} - {}", a.title, a.description))
                            .collect::<Vec<_>>()
                            .join("   ");
                        Paragraph::new(Span::styled(
                            unlocked,
                            Style::default().fg(Color::Yellow).patch(bold_style),
                        ))
                        .alignment(Alignment::Center)
                        .wrap(Wrap { trim: true })
                        .render(chunks[3], buf);
                    }

                    if !analysis.recommendations.is_empty() {
                        let tips = analysis
                            .recommendations
                            .iter()
                            .map(|r| format!("{}: {}", r.title, r.detail))
                            .collect::<Vec<_>>()
                            .join("   ");
                        Paragraph::new(Span::styled(
                            tips,
                            Style::default().fg(Color::Gray).patch(italic_style),
                        ))
                        .alignment(Alignment::Center)
                        .wrap(Wrap { trim: true })
                        .render(chunks[4], buf);
                    }
                }

                let legend = Paragraph::new(Span::styled(
                    "(r)etry / (n)ew / (esc)ape",
                    italic_style,
                ));
                legend.render(chunks[6], buf);
            }
        }
    }
}

/// Pick a display width for the engine from the terminal width.
pub fn chars_per_line_for(terminal_width: u16) -> usize {
    let usable = terminal_width.saturating_sub(HORIZONTAL_MARGIN * 2);
    (usable as usize).max(20)
}

/// Width-aware truncation for one-line summaries.
pub fn fit_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }

    let mut out = String::new();
    for ch in text.chars() {
        if out.width() + 1 >= max_width {
            out.push('…');
            break;
        }
        out.push(ch);
    }
    out
}
