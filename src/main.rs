//! Antforge Binary

use antforge::{EnhancedCli, PipelineError};
use std::process;

fn main() {
    let mut cli = EnhancedCli::new();

    match cli.run() {
        Ok(()) => {}
        Err(PipelineError::Io(e)) => {
            eprintln!("IO Error: {}", e);
            process::exit(1);
        }
        Err(e @ PipelineError::ValidationFailed { .. }) => {
            eprintln!("{}", e);
            process::exit(2);
        }
        Err(e) => {
            eprintln!("Conversion failed: {}", e);
            process::exit(1);
        }
    }
}
