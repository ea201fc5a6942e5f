//! Pixelate - Command-line tool for rendering pixel art from markdown documents

use std::process::ExitCode;

use pixelate::cli;

fn main() -> ExitCode {
    cli::run()
}
