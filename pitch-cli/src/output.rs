//! # Output Module
//!
//! Stands in for the display: prints each pitch update as a readable line
//! or as one JSON object per line.

use std::io::Write;

use anyhow::Result;
use pitch_core::{ListeningStopped, PitchResult};

/// Writes pipeline output to any sink.
pub struct Reporter<W: Write> {
    json: bool,
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, json: bool) -> Self {
        Self { json, out }
    }

    /// Prints one pitch update.
    pub fn emit(&mut self, result: &PitchResult) -> Result<()> {
        if self.json {
            writeln!(self.out, "{}", serde_json::to_string(result)?)?;
        } else {
            writeln!(self.out, "{}", format_result(result))?;
        }
        Ok(())
    }

    /// Prints the terminal "listening stopped" signal.
    pub fn stopped(&mut self, stopped: &ListeningStopped) -> Result<()> {
        if self.json {
            let event = serde_json::json!({
                "event": "listening_stopped",
                "reason": stopped.reason,
            });
            writeln!(self.out, "{}", event)?;
        } else {
            writeln!(self.out, "{}", stopped)?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// One human-readable line per update.
pub fn format_result(result: &PitchResult) -> String {
    let Some(note) = &result.note else {
        return format!("{:8.2} Hz  (outside musical range)", result.frequency);
    };
    let mut line = format!(
        "{:8.2} Hz  {:<2}{:<2} {:+6.1} cents",
        result.frequency, note.name, note.octave, note.deviation_cents
    );
    if result.in_tune {
        line.push_str("  in tune");
    }
    if let Some(indicator) = &result.indicator {
        line.push_str(&format!(
            "  [{:.1} -> {:.1}]",
            indicator.start_cents, indicator.target_cents
        ));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitch_core::tuning::note_from_frequency;
    use pitch_core::IndicatorUpdate;

    fn a4_result() -> PitchResult {
        PitchResult {
            frequency: 440.0,
            note: note_from_frequency(440.0, 440.0),
            in_tune: true,
            indicator: Some(IndicatorUpdate {
                start_cents: 0.0,
                target_cents: 0.0,
            }),
        }
    }

    #[test]
    fn readable_line() {
        assert_eq!(
            format_result(&a4_result()),
            "  440.00 Hz  A 4    +0.0 cents  in tune  [0.0 -> 0.0]"
        );
    }

    #[test]
    fn out_of_range_line() {
        let result = PitchResult {
            frequency: 5000.0,
            note: None,
            in_tune: false,
            indicator: None,
        };
        assert_eq!(format_result(&result), " 5000.00 Hz  (outside musical range)");
    }

    #[test]
    fn json_lines() {
        let mut out = Vec::new();
        let mut reporter = Reporter::new(&mut out, true);
        reporter.emit(&a4_result()).unwrap();
        reporter
            .stopped(&ListeningStopped {
                reason: "gone".into(),
            })
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["note"]["name"], "A");
        assert_eq!(lines[0]["note"]["octave"], 4);
        assert_eq!(lines[0]["in_tune"], true);
        assert_eq!(lines[1]["event"], "listening_stopped");
        assert_eq!(lines[1]["reason"], "gone");
    }
}
