mod keyboard;
mod render;

use clap::Parser;
use keyboard::{Keyboard, NoInput};
use quint::types::{DEFAULT_BLANK_SYMBOL, DEFAULT_HALT_STATE, DEFAULT_INIT_STATE};
use quint::{
    Conclusion, Controller, ControllerSettings, Mode, ParserOptions, Program, ProgramLoader,
    ProgramManager, QuintError, Renderer, Tape, TuringMachine,
};
use render::{format_info, format_path, JsonRenderer, LineRenderer, LiveRenderer};
use std::error::Error;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

/// Runs quintuple Turing machine programs.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
#[clap(after_help = "EXAMPLES:
  quint programs/palindrome.tm -i 1,0,1
  quint --builtin binary-increment --verbose --fast
  cat programs/busy-beaver-2.tm | quint -s")]
struct Cli {
    /// Path to a quintuple program file (.tm).
    /// Program text can also be piped via stdin.
    program_file: Option<PathBuf>,

    /// Run a bundled program instead of a file
    #[clap(short, long, conflicts_with = "program_file")]
    builtin: Option<String>,

    /// List the bundled programs whose name contains FILTER, and exit
    #[clap(long, value_name = "FILTER", num_args = 0..=1, default_missing_value = "")]
    list: Option<String>,

    /// The initial tape: comma-separated symbols, or one symbol per character
    #[clap(short, long)]
    input: Option<String>,

    /// Show the rule applied by each step
    #[clap(long)]
    rules: bool,

    /// Seconds to pause between steps
    #[clap(long, value_name = "SECS", default_value = "0.25", value_parser = parse_step_time)]
    step_time: Duration,

    /// Don't pause between steps
    #[clap(long)]
    fast: bool,

    /// Only print the final state
    #[clap(long)]
    silent: bool,

    /// Show steps, head moves and the state path with every frame
    #[clap(long)]
    verbose: bool,

    /// Redraw a single line instead of printing one line per step
    #[clap(long)]
    live: bool,

    /// Step on key press (space or enter), toggle verbose with i, quit with q
    #[clap(short = 's', long = "stepping")]
    stepping: bool,

    /// Prompt for another tape after each run
    #[clap(short = 'l', long = "loop")]
    repeat: bool,

    /// Stop after this many steps
    #[clap(long, value_name = "N")]
    step_limit: Option<usize>,

    /// Print the final report as JSON
    #[clap(long)]
    json: bool,

    /// Start state for programs without an `init:` line
    #[clap(long, default_value = DEFAULT_INIT_STATE)]
    init: String,

    /// Halt state for programs without a `halt:` line
    #[clap(long, default_value = DEFAULT_HALT_STATE)]
    halt: String,

    /// Blank symbol
    #[clap(long, default_value = DEFAULT_BLANK_SYMBOL)]
    blank: String,
}

impl Cli {
    fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            init: self.init.as_str().into(),
            halt: self.halt.as_str().into(),
            blank: self.blank.as_str().into(),
        }
    }

    fn settings(&self) -> ControllerSettings {
        let silent = self.silent || self.json;

        ControllerSettings {
            mode: if self.stepping {
                Mode::Stepping
            } else {
                Mode::Continuous
            },
            delay: if self.fast {
                Duration::ZERO
            } else {
                self.step_time
            },
            verbose: self.verbose,
            show_rule: self.rules,
            silent,
            step_limit: self.step_limit,
        }
    }

    /// Stepping mode reads the keyboard, unless silent output turns it into a single run.
    fn reads_keyboard(&self) -> bool {
        self.stepping && !self.silent && !self.json
    }
}

fn parse_step_time(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .parse()
        .map_err(|e| format!("Invalid step time '{}': {}", s, e))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("Invalid step time '{}': {}", s, e))
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Some(filter) = &cli.list {
        for line in list_programs(filter)? {
            println!("{}", line);
        }
        return Ok(());
    }

    // Load the program before touching the terminal, so errors go to a sane stderr.
    let (program, sample_input) = match load_program(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let input = match cli.input.clone().or(sample_input) {
        Some(input) => input,
        None if cli.repeat => match prompt_tape()? {
            Some(input) => input,
            None => return Ok(()),
        },
        None => String::new(),
    };

    let machine = TuringMachine::with_input(program, &input);
    let mut controller = Controller::new(machine, cli.settings(), renderer(&cli));

    loop {
        let conclusion = if cli.reads_keyboard() {
            let mut keyboard = Keyboard::new()?;
            controller.execute(&mut keyboard)?
        } else {
            controller.execute(&mut NoInput)?
        };

        if let Conclusion::Aborted(snapshot) = conclusion {
            println!("Interrupted");
            println!("Steps: {}", snapshot.step_count);
            println!("Head moves: {}", snapshot.head_moves);
            println!("State path: {}", format_path(&snapshot.path));
        }

        if !cli.repeat {
            break;
        }

        match prompt_tape()? {
            Some(input) => {
                let blank = controller.machine().program().blank.clone();
                controller
                    .machine_mut()
                    .load_tape(Tape::from_input(&input, blank));
            }
            None => break,
        }
    }

    Ok(())
}

/// Loads the program from a file, a bundled name, or stdin.
///
/// Bundled programs also provide a sample input.
fn load_program(cli: &Cli) -> Result<(Program, Option<String>), Box<dyn Error>> {
    if let Some(name) = &cli.builtin {
        let bundled = ProgramManager::get_bundled(name)?;
        let program =
            ProgramLoader::load_program_from_string_with(bundled.source, &cli.parser_options())?;
        Ok((program, Some(bundled.input.to_string())))
    } else if let Some(path) = &cli.program_file {
        let program = ProgramLoader::load_program_with(path, &cli.parser_options())?;
        Ok((program, None))
    } else if atty::isnt(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {}", e))?;
        let program = ProgramLoader::load_program_from_string_with(&buffer, &cli.parser_options())?;
        Ok((program, None))
    } else {
        Err("No program given: pass a file, --builtin NAME, or pipe program text on stdin".into())
    }
}

/// One line per bundled program whose name contains `filter`.
fn list_programs(filter: &str) -> Result<Vec<String>, QuintError> {
    ProgramManager::search_programs(filter)
        .into_iter()
        .map(|index| ProgramManager::get_program_info(index).map(|info| format_info(&info)))
        .collect()
}

fn renderer(cli: &Cli) -> Box<dyn Renderer> {
    let stdout = io::stdout();

    if cli.json {
        Box::new(JsonRenderer::new(stdout))
    } else if cli.live && cli.reads_keyboard() {
        Box::new(LiveRenderer::raw(stdout))
    } else if cli.live {
        Box::new(LiveRenderer::new(stdout))
    } else if cli.reads_keyboard() {
        Box::new(LineRenderer::raw(stdout))
    } else {
        Box::new(LineRenderer::new(stdout))
    }
}

/// Asks for another tape. Returns `None` on end of input or an empty line.
fn prompt_tape() -> io::Result<Option<String>> {
    print!("Tape: ");
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }

    let line = line.trim();
    Ok((!line.is_empty()).then(|| line.to_string()))
}
