//! Text renderers for the terminal: one line per step, or a single live line redrawn
//! in place.

use std::io::Write;

use quint::{Frame, ProgramInfo, QuintError, Renderer, Report, State, Symbol, TapeWindow};

/// Formats a frame as `{steps} ({state}): >{tape}<`, with `|` before the head cell and
/// blanks shown as spaces.
pub fn format_frame(frame: &Frame<'_>) -> String {
    let machine = frame.machine;
    let mut line = format_line(
        machine.step_count(),
        machine.state(),
        &frame.tape(),
        &machine.program().blank,
        Some(machine.head()),
    );

    if frame.show_rule {
        if let Some(rule) = machine.rule() {
            line.push_str(&format!(" R: {rule}"));
        }
    }

    if frame.verbose {
        line.push_str(&format!(
            " Steps: {} Head moves: {} State path: {}",
            machine.step_count(),
            machine.head_moves(),
            format_path(machine.path())
        ));
    }

    line
}

/// The final tape of a run that drew no frames, without a head marker.
pub fn format_final(report: &Report) -> String {
    let snapshot = &report.snapshot;
    format_line(
        snapshot.step_count,
        &snapshot.state,
        &snapshot.tape,
        &snapshot.blank,
        None,
    )
}

fn format_line(
    step_count: usize,
    state: &State,
    tape: &TapeWindow,
    blank: &Symbol,
    head: Option<i64>,
) -> String {
    let mut cells = String::new();

    for (offset, symbol) in tape.cells.iter().enumerate() {
        if Some(tape.start + offset as i64) == head {
            cells.push('|');
        }

        if symbol == blank {
            cells.push(' ');
        } else {
            cells.push_str(symbol.as_str());
        }
    }

    format!("{step_count} ({state}): >{cells}<")
}

pub fn format_path(path: &[State]) -> String {
    let names: Vec<&str> = path.iter().map(State::as_str).collect();
    format!("[{}]", names.join(", "))
}

/// One `--list` line describing a bundled program.
pub fn format_info(info: &ProgramInfo) -> String {
    format!(
        "{}: start {}, halt {}, {} states, {} rules, sample input \"{}\"",
        info.name,
        info.initial_state,
        info.halt_state,
        info.state_count,
        info.transition_count,
        info.sample_input
    )
}

/// The closing summary printed after every run.
pub fn format_summary(report: &Report) -> Vec<String> {
    vec![
        report.outcome.to_string(),
        format!("Steps: {}", report.snapshot.step_count),
        format!("Head moves: {}", report.snapshot.head_moves),
        format!("State path: {}", format_path(&report.snapshot.path)),
    ]
}

fn io_error(e: std::io::Error) -> QuintError {
    QuintError::Io(e.to_string())
}

/// Prints every frame on its own line.
///
/// A run that drew no frames, such as a silent one, gets its final tape printed above
/// the summary.
pub struct LineRenderer<W: Write> {
    out: W,
    newline: &'static str,
    framed: bool,
}

impl<W: Write> LineRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            newline: "\n",
            framed: false,
        }
    }

    /// Terminates lines with `\r\n`, for terminals in raw mode.
    pub fn raw(out: W) -> Self {
        Self {
            newline: "\r\n",
            ..Self::new(out)
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &str) -> Result<(), QuintError> {
        write!(self.out, "{line}{}", self.newline).map_err(io_error)?;
        self.out.flush().map_err(io_error)
    }
}

impl<W: Write> Renderer for LineRenderer<W> {
    fn begin(&mut self, frame: &Frame<'_>) -> Result<(), QuintError> {
        self.render(frame)
    }

    fn render(&mut self, frame: &Frame<'_>) -> Result<(), QuintError> {
        self.framed = true;
        self.write_line(&format_frame(frame))
    }

    fn finish(&mut self, report: &Report) -> Result<(), QuintError> {
        if !std::mem::take(&mut self.framed) {
            self.write_line(&format_final(report))?;
        }
        for line in format_summary(report) {
            self.write_line(&line)?;
        }
        Ok(())
    }
}

/// Redraws a single line in place, padded to the longest line written so far.
pub struct LiveRenderer<W: Write> {
    out: W,
    newline: &'static str,
    width: usize,
    framed: bool,
}

impl<W: Write> LiveRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            newline: "\n",
            width: 0,
            framed: false,
        }
    }

    /// Terminates summary lines with `\r\n`, for terminals in raw mode.
    pub fn raw(out: W) -> Self {
        Self {
            newline: "\r\n",
            ..Self::new(out)
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn redraw(&mut self, frame: &Frame<'_>) -> Result<(), QuintError> {
        self.framed = true;
        let line = format_frame(frame);
        let len = line.chars().count();
        self.width = self.width.max(len);

        write!(self.out, "{line}{:pad$}\r", "", pad = self.width - len).map_err(io_error)?;
        self.out.flush().map_err(io_error)
    }
}

impl<W: Write> Renderer for LiveRenderer<W> {
    fn begin(&mut self, frame: &Frame<'_>) -> Result<(), QuintError> {
        self.redraw(frame)
    }

    fn render(&mut self, frame: &Frame<'_>) -> Result<(), QuintError> {
        self.redraw(frame)
    }

    fn finish(&mut self, report: &Report) -> Result<(), QuintError> {
        if std::mem::take(&mut self.framed) {
            // Keep the last frame visible above the summary.
            write!(self.out, "{}", self.newline).map_err(io_error)?;
        } else {
            write!(self.out, "{}{}", format_final(report), self.newline).map_err(io_error)?;
        }
        for line in format_summary(report) {
            write!(self.out, "{line}{}", self.newline).map_err(io_error)?;
        }
        self.out.flush().map_err(io_error)
    }
}

/// Prints only the final report, as pretty JSON.
pub struct JsonRenderer<W: Write> {
    out: W,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn begin(&mut self, _frame: &Frame<'_>) -> Result<(), QuintError> {
        Ok(())
    }

    fn render(&mut self, _frame: &Frame<'_>) -> Result<(), QuintError> {
        Ok(())
    }

    fn finish(&mut self, report: &Report) -> Result<(), QuintError> {
        let json = serde_json::to_string_pretty(report)
            .map_err(|e| QuintError::Io(format!("Failed to serialize report: {e}")))?;
        writeln!(self.out, "{json}").map_err(io_error)
    }
}
