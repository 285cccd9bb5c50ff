use std::io::{BufRead, Write};

use anyhow::Result;
use tracing::warn;

use crate::context::Answerer;

pub const PROMPT: &str = "\nAsk something about the document:\n> ";
pub const ANSWER_LABEL: &str = "💬 Answer:";

fn is_exit(line: &str) -> bool {
    let cmd = line.trim();
    cmd.eq_ignore_ascii_case("exit") || cmd.eq_ignore_ascii_case("quit")
}

/// Read questions line by line until `exit`/`quit` or end of input.
///
/// Every other line, empty ones included, goes to the answerer. A failed
/// question is reported on `output` and the loop keeps going. Returns how many
/// questions got an answer.
pub async fn run_console<R, W>(mut input: R, mut output: W, answerer: &dyn Answerer) -> Result<usize>
where
    R: BufRead,
    W: Write,
{
    let mut answered = 0usize;
    let mut line = String::new();
    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            break;
        }
        let question = line.trim_end_matches(['\n', '\r']);
        if is_exit(question) {
            break;
        }

        match answerer.ask(question).await {
            Ok(answer) => {
                writeln!(output, "\n{ANSWER_LABEL}\n {}", answer.text)?;
                answered += 1;
            }
            Err(e) => {
                warn!(error = %e, "question failed");
                writeln!(output, "\n⚠️  Error: {e:#}")?;
            }
        }
    }
    Ok(answered)
}
