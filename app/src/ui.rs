//! Terminal front-end: status line, error banner, scrolling transcript,
//! and the radial playback visualizer.

use std::io::{self, Stdout, Write};

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, ClearType};
use crossterm::{cursor, execute, queue};

use gemini_live::types::{InterviewStatus, Speaker, TranscriptTurn};

/// Angular samples drawn around the center.
const BARS: usize = 60;
/// Character grid for the radial display. Cells are roughly twice as
/// tall as wide, so x coordinates are stretched by two.
pub const GRID_WIDTH: usize = 41;
pub const GRID_HEIGHT: usize = 21;
const BASE_RADIUS: f32 = 4.0;
const MAX_BAR_LENGTH: f32 = 5.5;
/// Emphasizes the quiet/loud contrast of each bin.
const POWER_CURVE: f32 = 2.5;

pub struct Tui {
    stdout: Stdout,
}

impl Tui {
    pub fn new() -> anyhow::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, terminal::EnterAlternateScreen, cursor::Hide)?;
        Ok(Self { stdout })
    }

    pub fn draw(
        &mut self,
        status: InterviewStatus,
        error: Option<&str>,
        turns: &[TranscriptTurn],
        bins: Option<&[u8]>,
    ) -> anyhow::Result<()> {
        let (cols, rows) = terminal::size()?;
        let width = cols as usize;

        queue!(
            self.stdout,
            terminal::Clear(ClearType::All),
            cursor::MoveTo(0, 0)
        )?;

        let mut line = 0u16;
        let mut put = |stdout: &mut Stdout, text: &str| -> anyhow::Result<u16> {
            queue!(
                stdout,
                cursor::MoveTo(0, line),
                Print(truncate(text, width))
            )?;
            line += 1;
            Ok(line)
        };

        put(
            &mut self.stdout,
            &format!(
                "AI interview candidate: {} (you are the interviewer)",
                crate::persona::CANDIDATE_NAME
            ),
        )?;
        let hint = match status {
            InterviewStatus::Listening => "space: stop interview   q: quit",
            InterviewStatus::Connecting => "connecting...",
            _ => "space: start interview   q: quit",
        };
        put(&mut self.stdout, &format!("status: {}   {}", status, hint))?;

        if let Some(message) = error {
            queue!(self.stdout, SetForegroundColor(Color::Red))?;
            put(&mut self.stdout, &format!("error: {}", message))?;
            queue!(self.stdout, ResetColor)?;
        }
        let used_rows = put(&mut self.stdout, "")?;

        // Visualizer occupies the bottom of the screen; the transcript
        // scrolls in whatever is left above it.
        let vis_rows = if bins.is_some() { GRID_HEIGHT + 1 } else { 0 };
        let transcript_rows = (rows as usize)
            .saturating_sub(used_rows as usize)
            .saturating_sub(vis_rows);

        let visible = turns
            .iter()
            .skip(turns.len().saturating_sub(transcript_rows));
        for turn in visible {
            let speaker = match turn.speaker {
                Speaker::User => "You",
                Speaker::Model => crate::persona::CANDIDATE_NAME,
            };
            let marker = if turn.is_final { "" } else { " …" };
            put(
                &mut self.stdout,
                &format!("{}: {}{}", speaker, turn.text, marker),
            )?;
        }

        if let Some(bins) = bins {
            let top = (rows as usize).saturating_sub(GRID_HEIGHT) as u16;
            for (i, row) in render_radial(bins).iter().enumerate() {
                queue!(
                    self.stdout,
                    cursor::MoveTo(0, top + i as u16),
                    SetForegroundColor(Color::Cyan),
                    Print(truncate(row, width)),
                    ResetColor
                )?;
            }
        }

        self.stdout.flush()?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = execute!(self.stdout, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        text.chars().take(width.saturating_sub(1)).collect::<String>() + "…"
    }
}

/// Draws radiating segments around a fixed center. Each of the angular
/// samples maps onto the low 70 % of the frequency bins; segment length
/// follows the bin's normalized energy through a power curve.
pub fn render_radial(bins: &[u8]) -> Vec<String> {
    let mut grid = vec![vec![' '; GRID_WIDTH]; GRID_HEIGHT];
    let center_x = (GRID_WIDTH / 2) as f32;
    let center_y = (GRID_HEIGHT / 2) as f32;

    for i in 0..BARS {
        let angle = i as f32 / BARS as f32 * std::f32::consts::TAU;
        let data_index = ((i as f32 / BARS as f32) * bins.len() as f32 * 0.7) as usize;
        let energy = bins.get(data_index).copied().unwrap_or(0) as f32 / 255.0;
        let length = energy.powf(POWER_CURVE) * MAX_BAR_LENGTH;

        let mut r = BASE_RADIUS;
        while r <= BASE_RADIUS + length {
            let x = center_x + angle.cos() * r * 2.0;
            let y = center_y + angle.sin() * r;
            let (col, row) = (x.round() as isize, y.round() as isize);
            if (0..GRID_WIDTH as isize).contains(&col) && (0..GRID_HEIGHT as isize).contains(&row)
            {
                grid[row as usize][col as usize] = '*';
            }
            r += 0.5;
        }
    }

    grid.into_iter().map(|row| row.into_iter().collect()).collect()
}
