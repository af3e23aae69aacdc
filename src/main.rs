use anyhow::Result;
use campus_wallet::{Config, Error, OutcomeRecord, replay, setup_logging};
use std::{env, fs::File};

fn main() -> Result<()> {
    setup_logging()?;

    let config = Config::from_env()?;
    let reader = get_reader()?;
    let writer = get_writer();

    let mut wtr = csv::Writer::from_writer(writer);
    for record in replay(reader, config.settings, handle_command_error, handle_outcome)? {
        wtr.serialize(&record)?;
    }
    wtr.flush()?;

    Ok(())
}

fn get_reader() -> Result<impl std::io::Read> {
    let path = env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Usage: campus-wallet <commands.csv>"))?;
    let file = File::open(&path)?;
    Ok(file)
}

fn get_writer() -> impl std::io::Write {
    std::io::stdout()
}

// A rejected command is part of a normal replay, e.g. a payment without funds
fn handle_command_error(error: Error) {
    tracing::warn!("rejected: {error}")
}

fn handle_outcome(outcome: OutcomeRecord) {
    tracing::debug!("{outcome}")
}
