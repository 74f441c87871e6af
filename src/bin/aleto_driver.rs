//! `aleto-driver`: runs one request from argv, or serves JSON lines.
//!
//! ```text
//! aleto-driver --db=sqlite --path=app.db get users 1
//! aleto-driver serve
//! ```
//!
//! Every request is answered on stdout with a JSON object; logs go to stderr.

use smol::Unblock;
use smol::io::BufReader;
use std::io::Write;
use std::process::ExitCode;
use tracing::error;

use aleto::logging;
use aleto::services::driver::{Answer, DriverServer, Request, SERVE_COMMAND};

fn main() -> ExitCode {
    logging::init_tracing();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let server = DriverServer::new();

    if argv.len() == 1 && argv[0] == SERVE_COMMAND {
        let input = BufReader::new(Unblock::new(std::io::stdin()));
        let output = Unblock::new(std::io::stdout());
        return match smol::block_on(server.serve(input, output)) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                error!(error = %err, "driver serve loop failed");
                ExitCode::FAILURE
            }
        };
    }

    let answer = match Request::from_argv(argv) {
        Ok(request) => smol::block_on(server.handle(&request)),
        Err(err) => Answer::failure(err.to_string()),
    };

    let mut stdout = std::io::stdout().lock();
    match writeln!(stdout, "{}", answer.encode()).and_then(|_| stdout.flush()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "cannot write answer");
            ExitCode::FAILURE
        }
    }
}
