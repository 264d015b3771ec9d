// Status bar widget: phase indicator, range, and draw progress.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use raffle_core::protocol::{EngineSnapshot, Phase};

use crate::tui::ViewState;

/// Render the status bar into the given area.
///
/// Layout: [phase indicator] [range and quota] [progress]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = Vec::new();

    let (label, color) = phase_indicator(state.snapshot.phase);
    spans.push(Span::styled(
        format!(" ● {} ", label),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    ));

    if let Some(summary) = range_summary(&state.snapshot) {
        spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
        spans.push(Span::styled(summary, Style::default().fg(Color::White)));
        spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
        spans.push(Span::styled(
            progress(&state.snapshot),
            Style::default().fg(Color::White),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Return the phase label and its color.
pub fn phase_indicator(phase: Phase) -> (&'static str, Color) {
    match phase {
        Phase::Unconfigured => ("Setup", Color::Gray),
        Phase::Ready => ("Ready", Color::Green),
        Phase::Drawing => ("Drawing", Color::Yellow),
        Phase::Complete => ("Complete", Color::Cyan),
    }
}

/// E.g. "Range: 1 - 100 | Total draws: 5 | Excluded: 2"
pub fn range_summary(snapshot: &EngineSnapshot) -> Option<String> {
    let config = snapshot.config.as_ref()?;
    let mut summary = format!(
        "Range: {} - {} | Total draws: {}",
        config.start(),
        config.end(),
        config.total_draws()
    );
    if !config.exceptions().is_empty() {
        summary.push_str(&format!(" | Excluded: {}", config.exceptions().len()));
    }
    Some(summary)
}

/// E.g. "Drawn 2/5 | 96 left in pool"
pub fn progress(snapshot: &EngineSnapshot) -> String {
    let total = snapshot.config.as_ref().map_or(0, |c| c.total_draws());
    format!(
        "Drawn {}/{} | {} left in pool",
        snapshot.winners.len(),
        total,
        snapshot.pool_size
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
