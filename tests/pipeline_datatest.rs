use datatest_stable::Utf8Path;
use regcalc::{Assembler, Interpreter};

#[derive(thiserror::Error, Debug)]
#[error("pipeline datatest at {0} did not match")]
pub struct DatatestError(Box<Utf8Path>);

const SECTIONS: [&str; 3] = ["diagnostics", "instructions", "output"];

/// A datatest file is three `---`-terminated sections followed by the source:
///
/// ```text
/// <diagnostics>
/// ---
/// <instruction dump>
/// ---
/// <program output>
/// ---
/// <source>
/// ```
///
/// Lines starting with `#` before the source are comments.
#[derive(Debug, Default)]
struct Datatest<'a> {
    sections: [Vec<&'a str>; 3],
    /// Comment lines with the section they were found in
    comments: Vec<(usize, &'a str)>,
    source: Vec<&'a str>,
}

fn read_datatest(contents: &str) -> Datatest<'_> {
    let mut test = Datatest::default();
    let mut section = 0;

    for line in contents.lines() {
        if section == SECTIONS.len() {
            test.source.push(line);
        } else if line.trim_end() == "---" {
            section += 1;
        } else if line.trim_start().starts_with('#') {
            test.comments.push((section, line));
        } else {
            test.sections[section].push(line);
        }
    }

    test
}

struct Outcome {
    diagnostics: String,
    instructions: String,
    output: String,
}

impl Outcome {
    fn sections(&self) -> [&str; 3] {
        [&self.diagnostics, &self.instructions, &self.output]
    }
}

fn run_pipeline(source: &str) -> Outcome {
    match Assembler::default().assemble(source) {
        Err(errors) => Outcome {
            diagnostics: errors.to_string(),
            instructions: String::new(),
            output: String::new(),
        },
        Ok(program) => {
            let mut interpreter = Interpreter::new(vec![]);
            let diagnostics = match interpreter.run(&program) {
                Ok(()) => String::new(),
                Err(halt) => halt.to_string(),
            };
            Outcome {
                diagnostics,
                instructions: program.to_string(),
                output: String::from_utf8_lossy(&interpreter.into_output()).into_owned(),
            }
        }
    }
}

// from https://matklad.github.io/2021/05/31/how-to-test.html
// DATATEST_EXPECT rewrites the file from what the pipeline produced instead
// of reporting mismatches. Comments move to the top of their section.
fn stitch_to_datatest(outcome: &Outcome, comments: &[(usize, &str)], source: &[&str]) -> String {
    let mut lines = vec![];
    for (index, section) in outcome.sections().into_iter().enumerate() {
        lines.extend(
            comments
                .iter()
                .filter(|(found_in, _)| *found_in == index)
                .map(|(_, line)| *line),
        );
        lines.extend(section.lines());
        lines.push("---");
    }
    lines.extend(source.iter().copied());

    let mut file = lines.join("\n");
    file.push('\n');
    file
}

fn pipeline_test(path: &Utf8Path, contents: String) -> datatest_stable::Result<()> {
    let test = read_datatest(&contents);
    let source = test.source.join("\n");
    let outcome = run_pipeline(&source);

    if std::env::var("DATATEST_EXPECT").is_ok() {
        std::fs::write(
            path,
            stitch_to_datatest(&outcome, &test.comments, &test.source),
        )?;
        return Ok(());
    }

    let mut failed = false;
    for ((name, expected), got) in SECTIONS
        .iter()
        .zip(&test.sections)
        .zip(outcome.sections())
    {
        let expected = expected.join("\n");
        if expected.trim() != got.trim() {
            println!(
                "error in {path}: mismatched {name}\n\nGot:\n{}\n\nExpected:\n{}",
                got.trim(),
                expected.trim()
            );
            failed = true;
        }
    }

    if failed {
        Err(DatatestError(Box::from(path)))?
    } else {
        Ok(())
    }
}

datatest_stable::harness! {
    pipeline_test, "test_data", r"^.*\.rcd$",
}
