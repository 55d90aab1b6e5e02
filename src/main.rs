use anyhow::{Context, Result};
use bus_dispatch::{cli::CliArgs, config::Config, plot, results::Results, scenario, telemetry};
use clap::Parser;
use tracing::{info, warn};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();
    let cfg = Config::from_args(&args)?;

    if args.print_config {
        print!("{}", cfg.to_toml()?);
        return Ok(());
    }

    telemetry::init_tracing(&cfg.logging);

    let results = scenario::run(&cfg)?;
    info!(run_id = %results.run_id, objective = results.objective, "dispatch complete");

    report(&results, &cfg);

    if let Some(path) = &cfg.output.results_json {
        let json = results.to_json().context("serializing results")?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "results written");
    }

    if cfg.output.plot {
        show_plot(&results, &cfg.scenario.bus_label)?;
    }

    Ok(())
}

/// Log flow totals; a missing result key is reported, not fatal
fn report(results: &Results, cfg: &Config) {
    let sc = &cfg.scenario;
    let expected = [
        (sc.source_label.as_str(), sc.bus_label.as_str()),
        (sc.bus_label.as_str(), sc.sink_label.as_str()),
    ];
    for (source, target) in expected {
        match results.flow(source, target) {
            Some(series) => info!(
                flow = %series.label(),
                total = series.sum(),
                peak = series.max(),
                "flow summary"
            ),
            None => warn!(from = source, to = target, "flow missing from results"),
        }
    }

    if results.node_view(&sc.bus_label).is_none() {
        warn!(bus = %sc.bus_label, "no sequences for bus in results");
    }
}

#[cfg(feature = "gui")]
fn show_plot(results: &Results, bus: &str) -> Result<()> {
    if plot::bus_lines(results, bus).is_empty() {
        warn!(bus, "nothing to plot");
        return Ok(());
    }
    plot::show(results, bus)
}

#[cfg(not(feature = "gui"))]
fn show_plot(results: &Results, bus: &str) -> Result<()> {
    let lines = plot::bus_lines(results, bus);
    warn!(bus, lines = lines.len(), "built without the 'gui' feature, skipping plot window");
    Ok(())
}
