//! Child side of process isolation: commands on stdin, responses on stdout

use std::io::{self, BufRead, Write};

use tracing::{debug, warn};

use super::service::{WorkerCore, WorkerStep};
use crate::backends::repl::backend_trait::ReplBackend;
use crate::backends::repl::protocol::{decode, encode, WorkerCommand};

/// Serve JSON-line commands from `input` until `Shutdown` or end of input.
///
/// Malformed lines are logged and skipped.
pub fn run_stdio_worker<B, R, W>(
    backend: B,
    input: R,
    mut output: W,
) -> io::Result<()>
where
    B: ReplBackend,
    R: BufRead,
    W: Write,
{
    let mut core = WorkerCore::new(backend);

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match decode::<WorkerCommand>(&line) {
            Ok(command) => command,
            Err(err) => {
                warn!(error = %err, "dropping malformed command");
                continue;
            }
        };

        match core.handle(command) {
            WorkerStep::Reply(response) => {
                writeln!(output, "{}", encode(&response)?)?;
                output.flush()?;
            }
            WorkerStep::Continue => {}
            WorkerStep::Stop => break,
        }
    }

    debug!("stdio worker done");
    Ok(())
}
