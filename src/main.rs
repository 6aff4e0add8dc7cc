use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    let cli = mdsite::cli::Cli::parse();
    mdsite::logging::init(cli.verbose).context("init logging")?;
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        mdsite::cli::Command::Build(args) => {
            mdsite::build::run(args).context("build")?;
        }
        mdsite::cli::Command::Tree(args) => {
            mdsite::build::tree(args).context("tree")?;
        }
    }

    Ok(())
}
