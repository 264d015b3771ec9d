// Winners board widget: ranked winner cells, pending slots, and voided numbers.
//
// Only the rows that fit are built. The window follows the latest winner, and
// the completion line (plus the voided line, when there is one) always keeps
// its place under the grid.

use std::ops::Range;

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use raffle_core::protocol::EngineSnapshot;

use super::ticket::pad_number;
use crate::tui::ViewState;

/// Minimum columns for the number part of a cell, gap included.
const NUMBER_COLUMN: usize = 10;

/// One slot on the board: `#rank` and the winning number, or `None` for a
/// draw that has not happened yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub rank: usize,
    pub number: Option<i64>,
}

/// Column widths for one cell, derived from the quota and the number width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellWidths {
    rank: usize,
    number: usize,
}

impl CellWidths {
    fn new(total: usize, number_width: usize) -> Self {
        let rank_digits = total.max(1).to_string().len();
        CellWidths {
            rank: 1 + rank_digits.max(3),
            number: NUMBER_COLUMN.max(number_width + 3),
        }
    }

    fn cell(self) -> usize {
        self.rank + self.number
    }
}

/// Render the winners board into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let snapshot = &state.snapshot;
    let width = state.number_width();
    let total = total_draws(snapshot);
    let widths = CellWidths::new(total, width);

    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;
    let per_row = (inner_width / widths.cell()).max(1);

    let mut footer = vec![Line::from(Span::styled(
        completion_text(snapshot),
        Style::default().fg(Color::Gray),
    ))];
    if !snapshot.voided.is_empty() {
        footer.push(Line::from(Span::styled(
            voided_text(&snapshot.voided, width, inner_width),
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::CROSSED_OUT),
        )));
    }

    // One blank spacer between grid and footer when there is room for it.
    let mut grid_rows = inner_height.saturating_sub(footer.len() + 1);
    let spacer = grid_rows > 0;
    if !spacer {
        grid_rows = inner_height.saturating_sub(footer.len());
    }

    let total_rows = total.div_ceil(per_row);
    let latest_row = snapshot.winners.len().saturating_sub(1) / per_row;
    let rows = row_window(total_rows, latest_row, grid_rows);
    let shown = cells(snapshot, rows.start * per_row..rows.end * per_row);

    let mut lines: Vec<Line> = shown
        .chunks(per_row)
        .map(|row| Line::from(row_spans(row, widths, width, state.fresh_winner)))
        .collect();
    if spacer {
        lines.push(Line::from(""));
    }
    lines.extend(footer);

    let title = match (shown.first(), shown.last()) {
        (Some(first), Some(last)) if shown.len() < total => {
            format!(" Winners #{}-#{} of {} ", first.rank, last.rank, total)
        }
        _ => " Winners ".to_string(),
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Rows of the grid to show: at most `visible` of `total_rows`, always
/// including `anchor`, plus the row after it when there is room.
pub fn row_window(total_rows: usize, anchor: usize, visible: usize) -> Range<usize> {
    if visible == 0 || total_rows == 0 {
        return 0..0;
    }
    if total_rows <= visible {
        return 0..total_rows;
    }
    let anchor = anchor.min(total_rows - 1);
    let last = if visible >= 2 {
        (anchor + 1).min(total_rows - 1)
    } else {
        anchor
    };
    let first = (last + 1).saturating_sub(visible);
    first..first + visible
}

/// The slots whose zero-based index falls in `window`, clamped to the quota.
/// Drawn winners come first in rank order, then pending placeholders.
pub fn cells(snapshot: &EngineSnapshot, window: Range<usize>) -> Vec<Cell> {
    let total = total_draws(snapshot);
    (window.start.min(total)..window.end.min(total))
        .map(|i| Cell {
            rank: i + 1,
            number: snapshot.winners.get(i).copied(),
        })
        .collect()
}

/// E.g. "2 of 5 draws completed"
pub fn completion_text(snapshot: &EngineSnapshot) -> String {
    format!(
        "{} of {} draws completed",
        snapshot.winners.len(),
        total_draws(snapshot)
    )
}

/// "Voided: a, b, c", dropping the oldest entries once it would not fit in
/// `max_chars`.
pub fn voided_text(voided: &[i64], width: usize, max_chars: usize) -> String {
    let full = format!(
        "Voided: {}",
        voided
            .iter()
            .map(|n| pad_number(*n, width))
            .collect::<Vec<_>>()
            .join(", ")
    );
    if full.len() <= max_chars {
        return full;
    }

    let prefix = format!("Voided ({}): ...", voided.len());
    let mut kept: Vec<String> = Vec::new();
    let mut len = prefix.len();
    for n in voided.iter().rev() {
        let item = pad_number(*n, width);
        if len + 2 + item.len() > max_chars {
            break;
        }
        len += 2 + item.len();
        kept.push(item);
    }
    kept.reverse();
    if kept.is_empty() {
        prefix
    } else {
        format!("{}, {}", prefix, kept.join(", "))
    }
}

fn total_draws(snapshot: &EngineSnapshot) -> usize {
    snapshot
        .config
        .as_ref()
        .map_or(0, |c| c.total_draws() as usize)
}

fn row_spans(
    row: &[Cell],
    widths: CellWidths,
    number_width: usize,
    fresh: Option<i64>,
) -> Vec<Span<'static>> {
    let mut spans = Vec::with_capacity(row.len() * 2);
    for cell in row {
        let rank = format!("{:<w$}", format!("#{}", cell.rank), w = widths.rank);
        match cell.number {
            Some(n) => {
                let style = if fresh == Some(n) {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                };
                spans.push(Span::styled(rank, Style::default().fg(Color::Gray)));
                spans.push(Span::styled(
                    format!("{:<w$}", pad_number(n, number_width), w = widths.number),
                    style,
                ));
            }
            None => {
                let dim = Style::default().fg(Color::DarkGray);
                spans.push(Span::styled(rank, dim));
                spans.push(Span::styled(
                    format!("{:<w$}", "???", w = widths.number),
                    dim,
                ));
            }
        }
    }
    spans
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::tests::buffer_text;
    use raffle_core::draw::config::DrawConfig;
    use raffle_core::protocol::Phase;

    fn snapshot(winners: Vec<i64>, voided: Vec<i64>) -> EngineSnapshot {
        EngineSnapshot {
            phase: Phase::Ready,
            config: Some(DrawConfig::new(1, 100, 5, []).unwrap()),
            pool_size: 100 - winners.len() - voided.len(),
            winners,
            voided,
        }
    }

    fn render_text(state: &ViewState, width: u16, height: u16) -> String {
        let backend = ratatui::backend::TestBackend::new(width, height);
        let mut terminal = ratatui::Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| render(frame, frame.area(), state))
            .unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn cells_pad_pending_slots() {
        let cells = cells(&snapshot(vec![4, 9], vec![]), 0..10);
        assert_eq!(cells.len(), 5);
        assert_eq!(cells[0], Cell { rank: 1, number: Some(4) });
        assert_eq!(cells[1], Cell { rank: 2, number: Some(9) });
        assert!(cells[2..].iter().all(|c| c.number.is_none()));
        assert_eq!(cells[4].rank, 5);
    }

    #[test]
    fn cells_window_is_clamped() {
        let cells = cells(&snapshot(vec![4, 9], vec![]), 1..3);
        assert_eq!(
            cells,
            vec![
                Cell { rank: 2, number: Some(9) },
                Cell { rank: 3, number: None },
            ]
        );
        assert!(super::cells(&snapshot(vec![], vec![]), 7..9).is_empty());
    }

    #[test]
    fn cells_empty_when_unconfigured() {
        assert!(cells(&EngineSnapshot::unconfigured(), 0..10).is_empty());
    }

    #[test]
    fn completion_text_counts() {
        assert_eq!(
            completion_text(&snapshot(vec![4, 9], vec![])),
            "2 of 5 draws completed"
        );
    }

    #[test]
    fn row_window_follows_anchor() {
        // Everything fits.
        assert_eq!(row_window(3, 2, 5), 0..3);
        // Anchor near the top: start of the board.
        assert_eq!(row_window(40, 0, 5), 0..5);
        // Anchor in the middle: anchor plus one look-ahead row at the bottom.
        assert_eq!(row_window(40, 20, 5), 17..22);
        // Anchor on the last row.
        assert_eq!(row_window(40, 39, 5), 35..40);
        // A single visible row shows the anchor itself.
        assert_eq!(row_window(40, 20, 1), 20..21);
        assert_eq!(row_window(40, 20, 0), 0..0);
        assert_eq!(row_window(0, 0, 5), 0..0);
    }

    #[test]
    fn voided_text_keeps_latest_when_too_long() {
        assert_eq!(voided_text(&[7, 77], 3, 80), "Voided: 007, 077");
        let voided: Vec<i64> = (1..=50).collect();
        let text = voided_text(&voided, 3, 30);
        assert!(text.len() <= 30, "too long: {text}");
        assert!(text.starts_with("Voided (50): ..."));
        assert!(text.ends_with("050"));
        assert_eq!(voided_text(&voided, 3, 5), "Voided (50): ...");
    }

    #[test]
    fn render_shows_ranks_numbers_and_placeholders() {
        let mut state = ViewState::default();
        state.apply_snapshot(snapshot(vec![4, 9], vec![77]));
        let text = render_text(&state, 90, 10);
        assert!(text.contains("#1  004"));
        assert!(text.contains("#2  009"));
        assert!(text.contains("#3  ???"));
        assert!(text.contains("2 of 5 draws completed"));
        assert!(text.contains("Voided: 077"));
        assert!(text.contains(" Winners "));
    }

    #[test]
    fn render_large_quota_keeps_latest_winner_and_footer_visible() {
        let mut state = ViewState::default();
        state.apply_snapshot(EngineSnapshot {
            phase: Phase::Ready,
            config: Some(DrawConfig::new(1, 1000, 300, []).unwrap()),
            pool_size: 1000 - 200 - 1,
            winners: (1..=200).collect(),
            voided: vec![999],
        });
        let text = render_text(&state, 100, 17);
        assert!(text.contains("#200"));
        assert!(text.contains("200 of 300 draws completed"));
        assert!(text.contains("Voided: 0999"));
        assert!(!text.contains("#1  "));
        assert!(text.contains("of 300 "));
    }

    #[test]
    fn render_million_draw_quota_builds_only_visible_rows() {
        let config = DrawConfig::new(1, 1_000_000, 1_000_000, []).unwrap();
        let snapshot = EngineSnapshot {
            phase: Phase::Ready,
            config: Some(config),
            pool_size: 999_999,
            winners: vec![42],
            voided: Vec::new(),
        };
        let mut state = ViewState::default();
        state.apply_snapshot(snapshot);
        let text = render_text(&state, 120, 20);
        assert!(text.contains("#1 "));
        assert!(text.contains("0000042"));
        assert!(text.contains("1 of 1000000 draws completed"));
        assert!(!text.contains("#1000000 "));
    }

    #[test]
    fn render_narrow_area_does_not_panic() {
        let mut state = ViewState::default();
        state.apply_snapshot(snapshot(vec![1, 2, 3], vec![4]));
        render_text(&state, 10, 4);
        render_text(&state, 2, 2);
    }
}
