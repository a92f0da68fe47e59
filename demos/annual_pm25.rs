use anyhow::Result;
use aqsapi::Client;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Example program that calls the library API.
    // Configure credentials via env vars (AQS_EMAIL / AQS_KEY) or a `.aqsrc` file.
    // RUST_LOG=aqsapi=debug shows each request.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let client = Client::from_env()?;

    let states = client.list_state_codes()?;
    let Some(row) = (0..states.len()).find(|&i| states.get_str(i, "state_name") == Some("Illinois"))
    else {
        anyhow::bail!("Illinois not found in state list");
    };
    let state = states.get_str(row, "code").unwrap_or("17").to_string();

    // 88101: PM2.5 - Local Conditions
    match client.annual_summary_by_state(&state, &[88101], "20220101", "20221231") {
        Ok(summary) => {
            println!("{} annual summary rows", summary.len());
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Err(e) if e.is_no_data() => println!("no PM2.5 data for state {}", state),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
