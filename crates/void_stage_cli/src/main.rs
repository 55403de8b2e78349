//! stagenav - drive a stage navigator from the command line
//!
//! Loads a stage configuration, then runs each command in order against a
//! simulated scene backend, printing the navigator state after every step.
//!
//! ```text
//! stagenav demos/stages.toml push:Lobby push:Match pop replace:Title
//! ```

mod backend;
mod command;
mod options;

use std::process::ExitCode;
use std::sync::Arc;

use void_stage::{Navigator, NavigatorConfig, RegistryConfig, TransitionEvent};

use crate::backend::SimulatedScenes;
use crate::command::Command;
use crate::options::{usage, Options};

type StageNavigator = Navigator<String, String, Arc<SimulatedScenes>>;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = match Options::from_env() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", usage());
            return ExitCode::from(2);
        }
    };

    match run(options).await {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            log::warn!("{} command(s) failed", failed);
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run every command, returning how many failed
async fn run(options: Options) -> Result<usize, Box<dyn std::error::Error>> {
    let source = RegistryConfig::<String, String>::load(&options.config_path)?;
    log::info!(
        "Loaded {} place(s) from {}",
        source.places.len(),
        options.config_path.display()
    );

    let backend = Arc::new(
        SimulatedScenes::new(options.latency).with_failing(options.failing.iter().cloned()),
    );
    let config = NavigatorConfig::default().with_empty_pop(options.empty_pop);
    let navigator: StageNavigator =
        Navigator::from_config(source, Arc::clone(&backend), config).await?;

    navigator.subscribe(|event| match event {
        TransitionEvent::Transitioning(place) => log::info!("Transitioning to {}", place),
        TransitionEvent::Transitioned(place) => log::info!("Transitioned to {}", place),
    });

    let mut failed = 0;
    for command in &options.commands {
        if let Err(e) = execute(&navigator, command).await {
            log::error!("{} failed: {}", command, e);
            failed += 1;
        }
        print_state(&navigator, &backend, command);
    }

    Ok(failed)
}

async fn execute(navigator: &StageNavigator, command: &Command) -> void_stage::NavigationResult<()> {
    match command {
        Command::Replace(place) => navigator.replace(place.clone()).await,
        Command::Push(place) => navigator.push(place.clone()).await,
        Command::Pop => {
            if navigator.pop().await?.is_none() {
                log::info!("Nothing to pop");
            }
            Ok(())
        }
        Command::Reset => {
            navigator.reset();
            Ok(())
        }
    }
}

fn print_state(navigator: &StageNavigator, backend: &SimulatedScenes, command: &Command) {
    println!(
        "{:<20} current={} history=[{}] scenes=[{}]",
        command.to_string(),
        navigator.current().as_deref().unwrap_or("-"),
        navigator.history().join(", "),
        backend.scenes().join(", "),
    );
}
