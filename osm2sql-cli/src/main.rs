//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use std::error::Error;

use osm2sql_cli::CliError;

fn main() {
    match osm2sql_cli::run() {
        Ok(()) => {}
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("osm2sql: {}", render(&err));
            std::process::exit(err.exit_code());
        }
    }
}

/// Join an error with its sources, outermost first.
fn render(err: &dyn Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        // Some variants already print their cause.
        if !rendered.ends_with(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}
