use clap::Parser;
use cli::args::OutputFormatArg;
use optics::{total_loss, LossBudget};
use planner_app::{Planner, Regeneration};
use tracing::debug;

use crate::core::RejectedEvent;
use crate::opts::{ModeCommand, Opts, ScriptArgs};

mod core;
mod opts;

fn main() -> anyhow::Result<()> {
    let args = argfile::expand_args(argfile::parse_fromfile, argfile::PREFIX)?;

    let opts = Opts::parse_from(args);

    cli::tracing::configure_tracing(opts.trace.clone(), opts.verbose.clone())?;

    match opts.command {
        ModeCommand::Report(script_args) => {
            let (planner, rejected_events) = run_script(&script_args)?;
            let regeneration = planner.regenerate();

            match script_args.format {
                OutputFormatArg::Text => print!("{}", core::render_report(&regeneration, &rejected_events)),
                OutputFormatArg::Json => {
                    let report = JsonReport {
                        regeneration: &regeneration,
                        rejected_events: &rejected_events,
                    };
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
            }
        }
        ModeCommand::Layout {
            script: script_args,
            lane,
        } => {
            let (planner, _rejected_events) = run_script(&script_args)?;

            let lanes = planner
                .config()
                .lane_indexes()
                .filter(|lane_index| lane.map_or(true, |lane| lane == *lane_index))
                .map(|lane_index| (lane_index, planner.compute_layout(lane_index)))
                .collect::<Vec<_>>();

            match script_args.format {
                OutputFormatArg::Text => print!("{}", core::render_layout(&planner, &lanes)),
                OutputFormatArg::Json => println!("{}", serde_json::to_string_pretty(&lanes)?),
            }
        }
        ModeCommand::Loss {
            splitter,
            splices,
            connectors,
            format,
        } => {
            let budget = LossBudget {
                splitters: splitter,
                splices,
                connectors,
            };
            let loss = total_loss(&budget);
            debug!("Computed loss. budget: {:?}, loss: {}", budget, loss);

            match format {
                OutputFormatArg::Text => println!("Total loss: {:.2} dB", loss),
                OutputFormatArg::Json => {
                    let value = serde_json::json!({
                        "budget": budget,
                        "total_loss": loss,
                    });
                    println!("{}", serde_json::to_string_pretty(&value)?);
                }
            }
        }
    }

    Ok(())
}

fn run_script(script_args: &ScriptArgs) -> anyhow::Result<(Planner, Vec<RejectedEvent>)> {
    let config = core::build_config(script_args)?;
    let events = core::load_script(&script_args.script)?;

    let mut planner = Planner::new(config)?;
    let rejected_events = core::replay(&mut planner, events);

    Ok((planner, rejected_events))
}

#[derive(serde::Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    regeneration: &'a Regeneration,
    rejected_events: &'a [RejectedEvent],
}
