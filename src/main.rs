use std::fs::OpenOptions;

use anyhow::{anyhow, Context as _};
use clap::Parser;

use paritysync::config::{Args, Config};
use paritysync::logger::Logger;
use paritysync::progress::ConsoleProgress;
use paritysync::state::State;
use paritysync::sync_entry::run_sync;

fn main() -> anyhow::Result<()>
{
    let args = Args::parse();
    let cfg: Config = args.into();

    let log_file = match &cfg.log_file_path {
        Some(path) => {
            let f = OpenOptions::new().create(true).read(false).write(true).open(path);
            match f {
                Ok(f) => Some(f),
                Err(e) => {
                    eprintln!("error: {}: {}", path.display(), e);
                    None
                }
            }
        }
        None => None,
    };

    let mut logger = Logger::new(cfg.verbosity, log_file);

    let mut state = State::load(&cfg.content)
        .with_context(|| format!("loading content file {}", cfg.content.display()))?;
    state.options = cfg.options;

    if !cfg.data.is_empty() && cfg.data.len() != state.ndisks() {
        return Err(anyhow!(
            "--data was given {} times but the content file has {} disk slots",
            cfg.data.len(),
            state.ndisks()
        ));
    }

    if cfg.parity.len() != state.level {
        return Err(anyhow!(
            "--parity was given {} times but the content file needs {} parity level(s)",
            cfg.parity.len(),
            state.level
        ));
    }

    let parity_paths: Vec<&std::path::Path> = cfg.parity.iter().map(|p| p.as_path()).collect();
    let mut progress = ConsoleProgress::new("sync");

    let report = run_sync(
        &mut state,
        &parity_paths,
        0,
        0,
        &mut logger,
        &mut progress,
        Some(cfg.content.as_path()),
    )?;

    if state.need_write {
        state.write(&cfg.content).with_context(|| format!("writing content file {}", cfg.content.display()))?;
    }

    if !report.is_success(state.options.expect_recoverable) {
        std::process::exit(1);
    }

    Ok(())
}
