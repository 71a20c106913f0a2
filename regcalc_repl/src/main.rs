use std::{
    io::{self, Stdout},
    ops::Range,
    path::PathBuf,
    process::ExitCode,
};

use anyhow::Context;
use clap::Parser;
use codesnake::{Block, CodeWidth, Label, LineIndex};
use regcalc::{
    compiler::program::split_statements, Assembler, CompileErrors, Config, Interpreter,
};
use yansi::Paint;

/// Compile and run register calculator programs.
///
/// Without SOURCE or --file, reads statements interactively until EOF.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Program text to run
    source: Option<String>,
    /// Read the program from a file
    #[arg(short, long, conflicts_with = "source")]
    file: Option<PathBuf>,
    /// Character separating statements
    #[arg(long, default_value_t = Config::DEFAULT_SEPARATOR)]
    separator: char,
    /// Size of the interpreter's register file
    #[arg(long, default_value_t = Config::DEFAULT_MAX_REGISTERS)]
    max_registers: usize,
    /// Print the tree of every statement
    #[arg(long)]
    dump_ast: bool,
    /// Print the assembled instructions before running them
    #[arg(long)]
    dump_instructions: bool,
    /// Print the register file after each run
    #[arg(long)]
    dump_registers: bool,
}

/// One assembler and interpreter pair, kept alive across inputs so later
/// inputs can use names bound by earlier ones.
struct Session {
    config: Config,
    assembler: Assembler,
    interpreter: Interpreter<Stdout>,
    dump_ast: bool,
    dump_instructions: bool,
    dump_registers: bool,
}

impl Session {
    fn new(args: &Args) -> Self {
        let config = Config::default()
            .with_separator(args.separator)
            .with_max_registers(args.max_registers);
        Self {
            assembler: Assembler::new(&config),
            interpreter: Interpreter::with_config(&config, io::stdout()),
            config,
            dump_ast: args.dump_ast,
            dump_instructions: args.dump_instructions,
            dump_registers: args.dump_registers,
        }
    }

    fn reset(&mut self) {
        self.assembler = Assembler::new(&self.config);
        self.interpreter = Interpreter::with_config(&self.config, io::stdout());
    }

    /// Returns whether `source` compiled and ran to completion.
    fn eval(&mut self, name: &str, source: &str) -> bool {
        if self.dump_ast {
            for ast in split_statements(source, self.config.separator)
                .filter_map(|statement| statement.parse().ok())
            {
                print!("{ast}");
            }
        }

        let program = match self.assembler.assemble(source) {
            Ok(program) => program,
            Err(errors) => {
                report(name, source, &errors);
                return false;
            }
        };
        if self.dump_instructions {
            print!("{program}");
        }

        let finished = match self.interpreter.run(&program) {
            Ok(()) => true,
            Err(halt) => {
                eprintln!("{} {halt}", "halt:".red().bold());
                false
            }
        };
        if self.dump_registers {
            print!("{}", self.interpreter.registers());
        }
        if !finished {
            self.reset();
        }
        finished
    }
}

/// Widen `span` so it covers at least one character of `source`.
fn visible_span(source: &str, span: &Range<usize>) -> Option<Range<usize>> {
    if !span.is_empty() && span.end <= source.len() {
        return Some(span.clone());
    }
    let width = source.get(span.start..)?.chars().next()?.len_utf8();
    Some(span.start..span.start + width)
}

fn report(name: &str, source: &str, errors: &CompileErrors) {
    let idx = LineIndex::new(source);
    for error in &errors.0 {
        eprintln!("{} {error}", "error:".red().bold());
        let Some(span) = error.span().and_then(|span| visible_span(source, span)) else {
            continue;
        };
        let label = Label::new(span)
            .with_text(error.to_string().red().to_string())
            .with_style(|s| s.red().to_string());
        let Some(block) = Block::new(&idx, [label]) else {
            continue;
        };
        let block = block.map_code(|c| CodeWidth::new(c, c.len()));
        eprintln!("{}[{name}]", block.prologue());
        eprint!("{block}");
        eprintln!("{}", block.epilogue());
    }
}

fn main() -> anyhow::Result<ExitCode> {
    yansi::whenever(yansi::Condition::TTY_AND_COLOR);
    let args = Args::parse();
    let mut session = Session::new(&args);

    let batch = match (&args.source, &args.file) {
        (Some(source), _) => Some(("<source>".to_string(), source.clone())),
        (None, Some(path)) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("could not read {}", path.display()))?;
            Some((path.display().to_string(), source))
        }
        (None, None) => None,
    };

    if let Some((name, source)) = batch {
        return Ok(if session.eval(&name, &source) {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let mut readline = rustyline::DefaultEditor::new()?;
    while let Ok(input) = readline.readline(">> ") {
        readline.add_history_entry(input.as_str())?;
        session.eval("<stdin>", &input);
    }

    Ok(ExitCode::SUCCESS)
}
