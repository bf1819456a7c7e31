use std::fmt::Write;
use std::fs::read_to_string;
use std::path::Path;

use anyhow::Context;
use itertools::Itertools;
use planner_app::{Event, Layout, LaneIndex, Planner, PlannerConfig, Regeneration};
use tracing::{info, warn};

use crate::opts::ScriptArgs;

/// An event that the planner refused, the replay carries on with the next one.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub(crate) struct RejectedEvent {
    /// 0-based position in the script
    pub(crate) index: usize,
    pub(crate) error: String,
}

pub(crate) fn build_config(args: &ScriptArgs) -> anyhow::Result<PlannerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let content =
                read_to_string(path).with_context(|| format!("Unable to read config file. path: {:?}", path))?;
            serde_json::from_str::<PlannerConfig>(&content)
                .with_context(|| format!("Unable to parse config file. path: {:?}", path))?
        }
        None => PlannerConfig::default(),
    };

    if let Some(lanes) = args.lanes {
        config.lane_count = lanes;
    }
    if let Some(tx_power) = args.tx_power {
        config.tx_power = tx_power;
    }
    if let Some(nap_capacity) = args.nap_capacity {
        config.nap_capacity = nap_capacity;
    }
    if let Some(ont_limit) = args.ont_limit {
        config.max_onts_per_lane = ont_limit;
    }
    if let Some(max_depth) = args.max_depth {
        config.max_split_depth = max_depth;
    }
    if let Some(split_policy) = args.split_policy {
        config.split_policy = split_policy.into();
    }

    config
        .validate()
        .context("Invalid configuration")?;

    Ok(config)
}

pub(crate) fn load_script(path: &Path) -> anyhow::Result<Vec<Event>> {
    let content = read_to_string(path).with_context(|| format!("Unable to read script. path: {:?}", path))?;
    let events: Vec<Event> =
        serde_json::from_str(&content).with_context(|| format!("Unable to parse script. path: {:?}", path))?;

    info!("Loaded script. path: {:?}, events: {}", path, events.len());

    Ok(events)
}

pub(crate) fn replay(planner: &mut Planner, events: Vec<Event>) -> Vec<RejectedEvent> {
    let mut rejected_events = vec![];

    for (index, event) in events.into_iter().enumerate() {
        if let Err(error) = planner.apply(event) {
            warn!("Skipping rejected event. index: {}", index);
            rejected_events.push(RejectedEvent {
                index,
                error: error.to_string(),
            });
        }
    }

    info!("Replayed script. rejected: {}", rejected_events.len());

    rejected_events
}

pub(crate) fn render_report(regeneration: &Regeneration, rejected_events: &[RejectedEvent]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Power budget");
    for row in regeneration.power_rows() {
        let _ = writeln!(
            output,
            "PON{}  {:<32}  {:>8.2} dBm  {:>3}%  N{}  {}",
            row.lane_number, row.path_label, row.power_dbm, row.percent, row.depth, row.level
        );
    }

    let summary = &regeneration.summary;
    let _ = writeln!(output);
    let _ = writeln!(output, "Summary");
    let _ = writeln!(
        output,
        "ONTs: {}, NAPs: {}, splitters: {}, ports used: {}/{} ({}%), ports free: {}",
        summary.total_onts,
        summary.total_naps,
        summary.total_splitters,
        summary.used_ports,
        summary.total_ports,
        summary.port_utilization(),
        summary.free_ports()
    );
    let _ = writeln!(
        output,
        "ONTs per lane: {}",
        regeneration
            .ont_validation
            .per_lane_counts
            .iter()
            .map(|(lane_index, count)| format!("PON{}={}", *lane_index as u32 + 1, count))
            .join(", ")
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "Issues");
    if regeneration.issues.is_empty() {
        let _ = writeln!(output, "None");
    }
    for issue in regeneration.issues.iter() {
        let _ = writeln!(output, "[{:?}] {}", issue.severity, issue.message);
    }

    if !rejected_events.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "Rejected events");
        for rejected_event in rejected_events {
            let _ = writeln!(output, "#{}: {}", rejected_event.index, rejected_event.error);
        }
    }

    output
}

pub(crate) fn render_layout(planner: &Planner, lanes: &[(LaneIndex, Layout)]) -> String {
    let mut output = String::new();

    for (lane_index, layout) in lanes {
        let _ = writeln!(output, "PON{}", *lane_index as u32 + 1);
        for (node_id, position) in layout.iter() {
            let name = planner
                .network()
                .node(*lane_index, *node_id)
                .map(|node| node.name.as_str())
                .unwrap_or_default();
            let _ = writeln!(
                output,
                "  {} '{}': x: {}, y: {}, depth: {}",
                node_id, name, position.x, position.y, position.depth
            );
        }
    }

    output
}
