//! Entry point: reads one JSON request per line from standard input,
//! dispatches it against a single long-lived `Dispatcher`, and writes
//! one JSON response per line to standard output.
//!
//! This is the integration shim around the engine, not engine
//! behavior itself -- the engine stays single-threaded and
//! cooperative, processing at most one request at a time, in the
//! order lines arrive.

use log::{error, info};
use marseillais::engine::Dispatcher;
use std::io::{self, BufRead, Write};

fn main() {
    env_logger::init();
    info!("engine starting, reading requests from stdin");

    let mut dispatcher = Dispatcher::new();
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                error!("failed to read a line from stdin: {}", err);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = dispatcher.dispatch_message(&line);

        match serde_json::to_string(&response) {
            Ok(json) => {
                if writeln!(out, "{}", json).is_err() {
                    error!("failed to write response to stdout");
                    break;
                }
                let _ = out.flush();
            }
            Err(err) => error!("failed to serialize response: {}", err),
        }
    }
}
