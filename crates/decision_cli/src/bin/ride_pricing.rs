use clap::Parser;
use decision_cli::handlers::handle_pricing;
use decision_cli::output::emit_line;

#[derive(Parser)]
#[command(
    name = "ride-pricing",
    about = "Predict a fare for a trip request",
    long_about = "Reads one JSON trip request (keys: distance_km, duration_min, seats),\n\
                  scores it with pricing_model.json from the working directory, and\n\
                  prints {\"price\": ...} as one JSON line."
)]
struct Cli {
    /// JSON-encoded trip request
    request: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = decision_cli::bootstrap()?;
    let line = handle_pricing(&cli.request, &settings)?;
    emit_line(&line)?;
    Ok(())
}
