mod backend;
mod cli;
mod error_fmt;
mod logging;
mod session;

use clap::Parser;
use cli::{Cli, Commands, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};
use eyre::WrapErr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error reporter: {e}");
    }

    if let Err(e) = real_main(cli) {
        let code = exit_code_for_error(&e);
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        tracing::error!(error = %e, code, "command failed");
        std::process::exit(code);
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    let mut cfg = hrc_config::load_file_or_default(&cli.config)?;
    cfg.apply_env_overrides()?;
    cfg.validate().wrap_err("invalid configuration")?;
    logging::init_tracing(&cli, &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "configuration loaded");

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        }
    }

    match cli.cmd {
        Commands::SelfCheck => {
            session::self_check(&cfg, cli.simulate, cli.json);
            Ok(())
        }
        Commands::Health => {
            let (api, name) = backend::build(&cfg, cli.simulate)?;
            session::run_health(&cfg, &*api, name, cli.json)
        }
        Commands::Session { challenge_ms } => {
            let (api, name) = backend::build(&cfg, cli.simulate)?;
            session::run_session(&cfg, api, name, challenge_ms, cli.json, &shutdown)
        }
        Commands::Kiosk => {
            let (api, _) = backend::build(&cfg, cli.simulate)?;
            session::run_kiosk(&cfg, api, cli.json, &shutdown)
        }
    }
}
