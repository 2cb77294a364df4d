//! Controller entry point: parse the one CLI flag, load the runtime
//! options, and dispatch to the right engine.
//!
//! SIGINT is ignored while a match or contest is live so a Ctrl-C stops the
//! AI children (which always restore default handling) without tearing the
//! controller away mid-log; default handling is restored around the
//! non-interactive windows.

use std::process::ExitCode;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};

use battleships_controller::contest::run_contest;
use battleships_controller::logger::init_logger;
use battleships_controller::logs::{
    open_contest_log, open_match_log, save_contest_log, save_match_log,
};
use battleships_controller::match_runner::run_match;
use battleships_controller::options::{self, Options, SOCKET_NAME};
use battleships_controller::transport::{self, Endpoint};

/// Battleships AI contest and tester.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Disable every receive deadline so an AI can sit under a debugger.
    #[arg(short, long)]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => {
            println!("\nGoodbye!");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("fatal: {err:#}");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let system_dir = std::env::current_dir()?;
    init_logger(&system_dir);
    transport::ignore_sigtstp();
    info!(debug = cli.debug, "controller starting");

    // randomness (ship lengths, contest pairing) is seeded from the pid
    let mut rng = StdRng::seed_from_u64(std::process::id() as u64);
    let socket_path = system_dir.join(SOCKET_NAME);

    match options::load_options(&system_dir)? {
        Options::RunMatch(match_options) => {
            transport::set_sigint_ignored(true);
            let endpoint = Endpoint::create(&socket_path, cli.debug)?;
            let match_log = run_match(&endpoint, &match_options, &mut rng)?;
            endpoint.close();
            save_match_log(&match_log, &system_dir)?;
            transport::set_sigint_ignored(false);
            info!(games = match_log.games.len(), "match saved");
            println!(
                "\nMatch finished: {} vs {} ({} games, {:.3}s).",
                match_log.player1.ai_name,
                match_log.player2.ai_name,
                match_log.games.len(),
                match_log.elapsed_time,
            );
        }
        Options::RunContest(contest_options) => {
            transport::set_sigint_ignored(true);
            let endpoint = Endpoint::create(&socket_path, cli.debug)?;
            let contest_log = run_contest(&endpoint, &contest_options, &mut rng)?;
            endpoint.close();
            save_contest_log(&contest_log, &system_dir)?;
            transport::set_sigint_ignored(false);
            info!(
                players = contest_log.players.len(),
                rounds = contest_log.rounds.len(),
                "contest saved"
            );
            println!(
                "\nContest finished: {} players over {} rounds.",
                contest_log.players.len(),
                contest_log.rounds.len(),
            );
        }
        // rendering a replay belongs to the display collaborator; loading
        // and revalidating the log is the controller's side of the deal
        Options::ReplayMatch => {
            let match_log = open_match_log(&system_dir)?;
            info!(games = match_log.games.len(), "match log loaded");
            println!(
                "Match log: {} vs {} over {} games.",
                match_log.player1.ai_name,
                match_log.player2.ai_name,
                match_log.games.len(),
            );
        }
        Options::ReplayContest => {
            let contest_log = open_contest_log(&system_dir)?;
            info!(rounds = contest_log.rounds.len(), "contest log loaded");
            println!(
                "Contest log: {} players over {} rounds.",
                contest_log.players.len(),
                contest_log.rounds.len(),
            );
        }
    }
    Ok(())
}
