//! The execution controller drives one run of a loaded machine, either continuously or one
//! step per input event, and forwards a frame for every step to a `Renderer`.
//!
//! Display and input devices live behind the `Renderer` and `Input` traits; the machine
//! itself knows nothing about either.

use std::thread;
use std::time::Duration;

use crate::machine::TuringMachine;
use crate::types::{MachineError, Outcome, QuintError, Report, Snapshot, TapeWindow};

/// How the controller advances the machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Step automatically, pausing `delay` between steps.
    #[default]
    Continuous,
    /// Step once per `Event::Step` from the input source.
    Stepping,
}

/// Settings for a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    pub mode: Mode,
    /// Pause between steps in continuous mode.
    pub delay: Duration,
    /// Forward per-step tracking details (steps, head moves, path) with each frame.
    pub verbose: bool,
    /// Forward the applied rule with each frame.
    pub show_rule: bool,
    /// Only forward the final state. Continuous mode then executes a single `run`.
    pub silent: bool,
    /// Maximum number of steps for this run. `None` runs without a limit.
    pub step_limit: Option<usize>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            mode: Mode::Continuous,
            delay: Duration::from_millis(250),
            verbose: false,
            show_rule: false,
            silent: false,
            step_limit: None,
        }
    }
}

/// What a renderer receives for every step: a borrowed view of the machine plus the
/// display flags that were in effect when the frame was composed.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub machine: &'a TuringMachine,
    pub verbose: bool,
    pub show_rule: bool,
}

impl Frame<'_> {
    /// The materialized tape, widened to include the head.
    pub fn tape(&self) -> TapeWindow {
        self.machine.tape().window(self.machine.head())
    }
}

/// Presents frames. Implementations choose line-by-line or live output.
pub trait Renderer {
    /// Called once with the initial machine state.
    fn begin(&mut self, frame: &Frame<'_>) -> Result<(), QuintError>;

    /// Called after every executed step.
    fn render(&mut self, frame: &Frame<'_>) -> Result<(), QuintError>;

    /// Called once when the run reaches a terminal outcome.
    fn finish(&mut self, report: &Report) -> Result<(), QuintError>;
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn begin(&mut self, frame: &Frame<'_>) -> Result<(), QuintError> {
        (**self).begin(frame)
    }

    fn render(&mut self, frame: &Frame<'_>) -> Result<(), QuintError> {
        (**self).render(frame)
    }

    fn finish(&mut self, report: &Report) -> Result<(), QuintError> {
        (**self).finish(report)
    }
}

/// External events delivered between steps in stepping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Step,
    ToggleVerbose,
    Quit,
}

/// A source of events, typically the keyboard.
pub trait Input {
    /// Blocks until the next event is available.
    fn next_event(&mut self) -> Result<Event, QuintError>;
}

/// How a controlled run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Conclusion {
    /// The run reached a terminal outcome.
    Finished(Report),
    /// The user quit before a terminal outcome.
    Aborted(Snapshot),
}

pub struct Controller<R> {
    machine: TuringMachine,
    settings: ControllerSettings,
    renderer: R,
}

impl<R: Renderer> Controller<R> {
    pub fn new(machine: TuringMachine, settings: ControllerSettings, renderer: R) -> Self {
        Self {
            machine,
            settings,
            renderer,
        }
    }

    /// Executes the run in the configured mode. `input` is only consulted in stepping mode.
    pub fn execute(&mut self, input: &mut impl Input) -> Result<Conclusion, QuintError> {
        match self.settings.mode {
            Mode::Continuous => self.run_continuous().map(Conclusion::Finished),
            Mode::Stepping if self.settings.silent => {
                self.run_continuous().map(Conclusion::Finished)
            }
            Mode::Stepping => self.run_stepping(input),
        }
    }

    /// Runs to a terminal outcome, forwarding every step unless silent.
    pub fn run_continuous(&mut self) -> Result<Report, QuintError> {
        let limit = self.settings.step_limit;

        let report = if self.settings.silent {
            self.machine.run(limit)
        } else {
            self.renderer
                .begin(&compose(&self.machine, &self.settings))?;

            let Self {
                machine,
                settings,
                renderer,
            } = self;

            machine.run_with(limit, |machine: &TuringMachine| -> Result<(), QuintError> {
                renderer.render(&compose(machine, settings))?;
                if !settings.delay.is_zero() {
                    thread::sleep(settings.delay);
                }
                Ok(())
            })?
        };

        self.renderer.finish(&report)?;
        Ok(report)
    }

    /// Steps once per `Event::Step`. A verbose toggle takes effect with the next frame.
    pub fn run_stepping(&mut self, input: &mut impl Input) -> Result<Conclusion, QuintError> {
        self.renderer
            .begin(&compose(&self.machine, &self.settings))?;

        let mut executed = 0;
        let outcome = loop {
            let limit = self.settings.step_limit;
            if let Some(outcome) = self.machine.terminal_outcome(executed, limit) {
                break outcome;
            }

            match input.next_event()? {
                Event::Quit => {
                    log::debug!("Run aborted after {} steps", self.machine.step_count());
                    return Ok(Conclusion::Aborted(self.machine.snapshot()));
                }
                Event::ToggleVerbose => self.settings.verbose = !self.settings.verbose,
                Event::Step => match self.machine.advance() {
                    Ok(()) => {
                        executed += 1;
                        self.renderer
                            .render(&compose(&self.machine, &self.settings))?;
                    }
                    Err(MachineError::UndefinedTransition { state, symbol, .. }) => {
                        break Outcome::Stuck { state, symbol };
                    }
                    Err(error @ MachineError::AlreadyHalted { .. }) => return Err(error.into()),
                },
            }
        };

        let report = Report {
            outcome,
            snapshot: self.machine.snapshot(),
        };
        self.renderer.finish(&report)?;

        Ok(Conclusion::Finished(report))
    }

    pub fn machine(&self) -> &TuringMachine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut TuringMachine {
        &mut self.machine
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }
}

fn compose<'a>(machine: &'a TuringMachine, settings: &ControllerSettings) -> Frame<'a> {
    Frame {
        machine,
        verbose: settings.verbose,
        show_rule: settings.show_rule,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use std::collections::VecDeque;
    use std::time::Instant;

    /// What a recorded frame looked like.
    #[derive(Debug, Clone, PartialEq)]
    struct Recorded {
        snapshot: Snapshot,
        verbose: bool,
    }

    impl From<&Frame<'_>> for Recorded {
        fn from(frame: &Frame<'_>) -> Self {
            Self {
                snapshot: frame.machine.snapshot(),
                verbose: frame.verbose,
            }
        }
    }

    /// Records every call for inspection.
    #[derive(Default)]
    struct Recorder {
        begun: Vec<Recorded>,
        frames: Vec<Recorded>,
        reports: Vec<Report>,
    }

    impl Renderer for Recorder {
        fn begin(&mut self, frame: &Frame<'_>) -> Result<(), QuintError> {
            self.begun.push(frame.into());
            Ok(())
        }

        fn render(&mut self, frame: &Frame<'_>) -> Result<(), QuintError> {
            self.frames.push(frame.into());
            Ok(())
        }

        fn finish(&mut self, report: &Report) -> Result<(), QuintError> {
            self.reports.push(report.clone());
            Ok(())
        }
    }

    struct Script(VecDeque<Event>);

    impl Script {
        fn new(events: &[Event]) -> Self {
            Self(events.iter().copied().collect())
        }
    }

    impl Input for Script {
        fn next_event(&mut self) -> Result<Event, QuintError> {
            Ok(self.0.pop_front().unwrap_or(Event::Quit))
        }
    }

    struct FailingRenderer;

    impl Renderer for FailingRenderer {
        fn begin(&mut self, _: &Frame<'_>) -> Result<(), QuintError> {
            Ok(())
        }

        fn render(&mut self, _: &Frame<'_>) -> Result<(), QuintError> {
            Err(QuintError::Io("broken pipe".into()))
        }

        fn finish(&mut self, _: &Report) -> Result<(), QuintError> {
            Ok(())
        }
    }

    const WALK: &str = "1, a, 1, b, 1\n1, _, 0, _, 0";

    fn settings(mode: Mode) -> ControllerSettings {
        ControllerSettings {
            mode,
            delay: Duration::ZERO,
            ..ControllerSettings::default()
        }
    }

    fn controller(source: &str, input: &str, settings: ControllerSettings) -> Controller<Recorder> {
        let machine = TuringMachine::with_input(parse(source).unwrap(), input);
        Controller::new(machine, settings, Recorder::default())
    }

    #[test]
    fn test_default_settings() {
        let settings = ControllerSettings::default();
        assert_eq!(settings.mode, Mode::Continuous);
        assert_eq!(settings.delay, Duration::from_millis(250));
        assert_eq!(settings.step_limit, None);
    }

    #[test]
    fn test_continuous_forwards_every_step() {
        let mut controller = controller(WALK, "aa", settings(Mode::Continuous));
        let conclusion = controller.execute(&mut Script::new(&[])).unwrap();

        let Conclusion::Finished(report) = conclusion else {
            panic!("Expected a finished run");
        };
        assert_eq!(report.outcome, Outcome::Halted);
        assert_eq!(report.snapshot.step_count, 3);

        let recorder = controller.into_renderer();
        assert_eq!(recorder.begun.len(), 1);
        assert_eq!(recorder.begun[0].snapshot.step_count, 0);
        let steps: Vec<usize> = recorder.frames.iter().map(|f| f.snapshot.step_count).collect();
        assert_eq!(steps, vec![1, 2, 3]);
        assert_eq!(recorder.reports, vec![report]);
    }

    #[test]
    fn test_silent_forwards_only_final_report() {
        let settings = ControllerSettings {
            silent: true,
            ..settings(Mode::Continuous)
        };
        let mut controller = controller(WALK, "aa", settings);
        let report = controller.run_continuous().unwrap();

        assert_eq!(report.outcome, Outcome::Halted);
        let recorder = controller.into_renderer();
        assert!(recorder.begun.is_empty());
        assert!(recorder.frames.is_empty());
        assert_eq!(recorder.reports.len(), 1);
    }

    #[test]
    fn test_continuous_step_limit() {
        let settings = ControllerSettings {
            step_limit: Some(5),
            ..settings(Mode::Continuous)
        };
        let mut controller = controller("1, a, 1, a, 0", "a", settings);
        let report = controller.run_continuous().unwrap();

        assert_eq!(report.outcome, Outcome::StepLimitExceeded { limit: 5 });
        assert_eq!(controller.renderer().frames.len(), 5);
    }

    #[test]
    fn test_renderer_error_stops_run() {
        let machine = TuringMachine::with_input(parse(WALK).unwrap(), "aa");
        let mut controller = Controller::new(machine, settings(Mode::Continuous), FailingRenderer);

        let error = controller.run_continuous().unwrap_err();
        assert_eq!(error, QuintError::Io("broken pipe".into()));
        assert_eq!(controller.machine().step_count(), 1);
    }

    #[test]
    fn test_stepping_follows_events() {
        let mut controller = controller(WALK, "aa", settings(Mode::Stepping));
        let mut input = Script::new(&[Event::Step, Event::Step, Event::Step]);

        let conclusion = controller.execute(&mut input).unwrap();
        let Conclusion::Finished(report) = conclusion else {
            panic!("Expected a finished run");
        };
        assert_eq!(report.outcome, Outcome::Halted);
        assert_eq!(controller.renderer().frames.len(), 3);
    }

    #[test]
    fn test_stepping_quit_aborts() {
        let mut controller = controller(WALK, "aa", settings(Mode::Stepping));
        let mut input = Script::new(&[Event::Step, Event::Quit, Event::Step]);

        let conclusion = controller.execute(&mut input).unwrap();
        let Conclusion::Aborted(snapshot) = conclusion else {
            panic!("Expected an aborted run");
        };
        assert_eq!(snapshot.step_count, 1);
        assert!(controller.renderer().reports.is_empty());
    }

    #[test]
    fn test_verbose_toggle_applies_at_next_frame() {
        let mut controller = controller(WALK, "aa", settings(Mode::Stepping));
        let mut input = Script::new(&[
            Event::Step,
            Event::ToggleVerbose,
            Event::Step,
            Event::ToggleVerbose,
            Event::Step,
        ]);

        controller.execute(&mut input).unwrap();

        let verbose: Vec<bool> = controller
            .renderer()
            .frames
            .iter()
            .map(|f| f.verbose)
            .collect();
        assert_eq!(verbose, vec![false, true, false]);
    }

    #[test]
    fn test_stepping_stuck() {
        let mut controller = controller("1, a, 1, a, 1", "ab", settings(Mode::Stepping));
        let mut input = Script::new(&[Event::Step, Event::Step]);

        let Conclusion::Finished(report) = controller.execute(&mut input).unwrap() else {
            panic!("Expected a finished run");
        };
        assert_eq!(
            report.outcome,
            Outcome::Stuck {
                state: "1".into(),
                symbol: "b".into()
            }
        );
        assert_eq!(report.snapshot.step_count, 1);
    }

    #[test]
    fn test_stepping_matches_continuous() {
        let mut stepping = controller(WALK, "aaaa", settings(Mode::Stepping));
        let mut input = Script::new(&[Event::Step; 10]);
        let Conclusion::Finished(stepped) = stepping.execute(&mut input).unwrap() else {
            panic!("Expected a finished run");
        };

        let mut continuous = controller(WALK, "aaaa", settings(Mode::Continuous));
        let ran = continuous.run_continuous().unwrap();

        assert_eq!(stepped, ran);
    }

    #[test]
    fn test_boxed_renderer() {
        let machine = TuringMachine::with_input(parse(WALK).unwrap(), "a");
        let renderer: Box<dyn Renderer> = Box::new(Recorder::default());
        let mut controller = Controller::new(machine, settings(Mode::Continuous), renderer);

        let report = controller.run_continuous().unwrap();
        assert_eq!(report.outcome, Outcome::Halted);
        assert_eq!(report.snapshot.step_count, 2);
    }

    /// Counts frames without keeping them.
    #[derive(Default)]
    struct Counter {
        frames: usize,
        widest_tape: usize,
    }

    impl Renderer for Counter {
        fn begin(&mut self, _: &Frame<'_>) -> Result<(), QuintError> {
            Ok(())
        }

        fn render(&mut self, frame: &Frame<'_>) -> Result<(), QuintError> {
            self.frames += 1;
            self.widest_tape = self.widest_tape.max(frame.tape().cells.len());
            Ok(())
        }

        fn finish(&mut self, _: &Report) -> Result<(), QuintError> {
            Ok(())
        }
    }

    #[test]
    fn test_long_framed_run_does_not_copy_the_path() {
        let settings = ControllerSettings {
            step_limit: Some(50_000),
            ..settings(Mode::Continuous)
        };
        let machine = TuringMachine::with_input(parse("1, a, 1, a, 0").unwrap(), "a");
        let mut controller = Controller::new(machine, settings, Counter::default());

        let started = Instant::now();
        let report = controller.run_continuous().unwrap();
        let elapsed = started.elapsed();

        assert_eq!(report.outcome, Outcome::StepLimitExceeded { limit: 50_000 });
        assert_eq!(report.snapshot.path.len(), 50_001);
        assert_eq!(controller.renderer().frames, 50_000);
        assert_eq!(controller.renderer().widest_tape, 1);
        assert!(
            elapsed < Duration::from_secs(5),
            "50 000 framed steps took {elapsed:?}"
        );
    }

    #[test]
    fn test_frame_reads_the_live_machine() {
        let mut controller = controller(WALK, "aa", settings(Mode::Stepping));
        let mut input = Script::new(&[Event::Step]);
        controller.execute(&mut input).unwrap();

        let frame = compose(controller.machine(), controller.settings());
        assert_eq!(frame.machine.path().len(), 2);
        assert_eq!(frame.tape().start, 0);
        assert_eq!(frame.tape().cells.len(), 2);
    }
}
