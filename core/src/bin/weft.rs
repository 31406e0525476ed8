//! Weft command-line front end
//!
//! Checks workflow files and dumps their tokens or AST. Exits with status 1
//! when the input has errors or the command itself fails.

use weft_core::cli;

fn main() {
    match cli::run_cli() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
