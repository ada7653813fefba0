//! Presentation boundary.
//!
//! A presenter is owned by the `SelectionCoordinator` and only ever called on
//! the thread that polls it.

use std::io::Write;

use tenki_forecast::{BatchResult, ConditionBucket};

use crate::error_mapping;

pub trait Presenter {
    /// Show a settled batch. Replaces whatever was shown before.
    fn render(&mut self, result: &BatchResult);

    /// Show an explicit error state in place of results.
    fn render_error(&mut self, reason: &str);
}

/// Plain-text presenter for terminals.
pub struct TextPresenter<W: Write> {
    out: W,
}

impl<W: Write> TextPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_result(&mut self, result: &BatchResult) -> std::io::Result<()> {
        writeln!(self.out, "== {} ==", result.region)?;
        if result.successes.is_empty() {
            writeln!(self.out, "No forecasts available.")?;
        }
        for area in &result.successes {
            writeln!(self.out, "{}", area.name)?;
            for day in &area.days {
                write!(self.out, "  {}  {}", day.date, day.condition)?;
                if day.bucket != ConditionBucket::Unknown {
                    write!(self.out, " [{}]", day.bucket.description())?;
                }
                writeln!(self.out, "  最高 {} / 最低 {}", day.max_temp, day.min_temp)?;
            }
        }
        for failure in &result.failures {
            writeln!(
                self.out,
                "  ! {}: {}",
                failure.area,
                error_mapping::fetch_error(&failure.cause).user_message()
            )?;
        }
        self.out.flush()
    }
}

impl<W: Write> Presenter for TextPresenter<W> {
    fn render(&mut self, result: &BatchResult) {
        if let Err(e) = self.write_result(result) {
            tracing::warn!("Failed to write forecast: {}", e);
        }
    }

    fn render_error(&mut self, reason: &str) {
        if let Err(e) = writeln!(self.out, "Error: {}", reason).and_then(|_| self.out.flush()) {
            tracing::warn!("Failed to write error: {}", e);
        }
    }
}
