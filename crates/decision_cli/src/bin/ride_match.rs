use clap::Parser;
use decision_cli::handlers::handle_match;
use decision_cli::output::emit_line;

#[derive(Parser)]
#[command(
    name = "ride-match",
    about = "Score a rider/driver match and price the candidate drivers",
    long_about = "Reads one JSON trip request (keys: seats, time_epoch), scores it with\n\
                  match_model.json from the working directory, and prints the ranked\n\
                  candidates as one JSON line."
)]
struct Cli {
    /// JSON-encoded trip request
    request: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = decision_cli::bootstrap()?;
    let line = handle_match(&cli.request, &settings)?;
    emit_line(&line)?;
    Ok(())
}
