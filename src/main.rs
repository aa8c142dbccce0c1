use std::path::PathBuf;

use clap::Parser as ClapParser;

use rox::lox::Lox;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Lox script to run; omit it to start a REPL
    script: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args: Cli = Cli::parse();

    let mut lox = Lox::new();

    match args.script {
        Some(path) => lox.run_file(&path)?,

        None => lox.run_prompt()?,
    }

    Ok(())
}
