/*!
Stage Writer: atomic file writes that never leak their staging files
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Arg, ArgAction, ArgMatches, Command, crate_version, value_parser};
use tokio::io::AsyncReadExt;
use tokio::time::sleep;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::core::{config::StagerConfig, error::StagerError, stager::Stager};

mod core;

/// Exit status after Ctrl-C, as shells report a SIGINT
const INTERRUPTED_EXIT_CODE: i32 = 130;

fn cli() -> Command {
    Command::new("stage-writer")
        .version(crate_version!())
        .about("Writes files atomically through tracked staging files")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to a TOML config file")
                .value_name("PATH")
                .global(true),
        )
        .subcommand(
            Command::new("write")
                .about("Atomically replace TARGET with the given contents")
                .arg(
                    Arg::new("target")
                        .help("File to write")
                        .value_name("TARGET")
                        .required(true),
                )
                .arg(
                    Arg::new("input")
                        .short('i')
                        .long("input")
                        .help("Read contents from this file instead of stdin")
                        .value_name("PATH"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print a JSON report of the write")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("hold")
                .about("Observe PATHs and remove them when this process ends")
                .arg(
                    Arg::new("paths")
                        .help("Files to remove on shutdown")
                        .value_name("PATH")
                        .num_args(1..)
                        .required(true),
                )
                .arg(
                    Arg::new("exit-after-ms")
                        .long("exit-after-ms")
                        .help("Call process exit after this many milliseconds")
                        .value_name("MS")
                        .value_parser(value_parser!(u64)),
                ),
        )
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn read_contents(matches: &ArgMatches) -> std::io::Result<Vec<u8>> {
    match matches.get_one::<String>("input") {
        Some(input) => tokio::fs::read(input).await,
        None => {
            let mut buf = Vec::new();
            tokio::io::stdin().read_to_end(&mut buf).await?;
            Ok(buf)
        }
    }
}

async fn run_write(stager: &Stager, matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let target = matches
        .get_one::<String>("target")
        .map(PathBuf::from)
        .ok_or("missing target")?;

    let contents = tokio::select! {
        contents = read_contents(matches) => contents?,
        _ = tokio::signal::ctrl_c() => return Err(StagerError::Interrupted(target).into()),
    };

    let write = stager.write(&target, contents);
    tokio::pin!(write);
    let finished = tokio::select! {
        result = &mut write => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    let result = match finished {
        Some(result) => result,
        None => {
            // The blocking task cannot be cancelled; stop it before the rename and wait.
            stager.interrupt();
            write.await
        }
    };

    let report = result?;
    if matches.get_flag("json") {
        println!("{}", report.to_json(true)?);
    }
    Ok(())
}

fn is_interrupted(err: &(dyn std::error::Error + 'static)) -> bool {
    matches!(
        err.downcast_ref::<StagerError>(),
        Some(StagerError::Interrupted(_))
    )
}

async fn run_hold(stager: Stager, matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let paths = matches
        .get_many::<String>("paths")
        .into_iter()
        .flatten()
        .map(PathBuf::from);
    let held = stager.hold(paths);
    info!("👀 Holding {} paths until shutdown", held);

    match matches.get_one::<u64>("exit-after-ms") {
        Some(&ms) => {
            tokio::select! {
                _ = sleep(Duration::from_millis(ms)) => {
                    // Leaves the stager alive; the exit hook does the cleanup.
                    info!("🚪 Exiting with {} paths still observed", stager.removal().len());
                    std::process::exit(0);
                }
                _ = tokio::signal::ctrl_c() => {}
            }
        }
        None => tokio::signal::ctrl_c().await?,
    }

    info!("🛑 Shutdown");
    drop(stager);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = cli().get_matches();

    let config_path = matches.get_one::<String>("config").map(Path::new);
    let config = StagerConfig::load(config_path).await?;
    init_logging(&config.logging.level);

    let stager = Stager::new(config.staging);

    match matches.subcommand() {
        Some(("write", sub)) => {
            let written = run_write(&stager, sub).await;
            match written {
                Ok(()) => {}
                Err(e) if is_interrupted(&*e) => {
                    info!("🛑 Interrupted, discarding staged writes");
                    drop(stager);
                    // Skips runtime shutdown, which would wait on a stdin read that never ends.
                    std::process::exit(INTERRUPTED_EXIT_CODE);
                }
                Err(e) => return Err(e),
            }
        }
        Some(("hold", sub)) => run_hold(stager, sub).await?,
        _ => unreachable!("subcommand_required is set"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn only_interruptions_are_treated_as_interrupted() {
        let interrupted: Box<dyn std::error::Error> =
            StagerError::Interrupted(PathBuf::from("out.txt")).into();
        let other: Box<dyn std::error::Error> = StagerError::NoFileName(PathBuf::from("/")).into();

        assert!(is_interrupted(&*interrupted));
        assert!(!is_interrupted(&*other));
    }

    #[test]
    fn hold_parses_exit_delay() {
        let matches = cli()
            .try_get_matches_from(["stage-writer", "hold", "a", "b", "--exit-after-ms", "25"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();

        assert_eq!(name, "hold");
        assert_eq!(sub.get_many::<String>("paths").unwrap().count(), 2);
        assert_eq!(sub.get_one::<u64>("exit-after-ms"), Some(&25));
    }
}
