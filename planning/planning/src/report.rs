use std::collections::BTreeSet;

use network::{LaneIndex, NodeId};
use optics::PowerLevel;
use tracing::info;

use crate::power::PowerRow;
use crate::rules::{DepthValidation, OntValidation};

#[derive(Clone, serde::Serialize, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PlanningIssue {
    pub severity: IssueSeverity,
    pub kind: IssueKind,
    pub message: String,
}

#[derive(Clone, Copy, serde::Serialize, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum IssueSeverity {
    Severe,
    Warning,
}

#[derive(Clone, serde::Serialize, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum IssueKind {
    OntLimitExceeded {
        lane_index: LaneIndex,
        count: u32,
        limit: u32,
    },
    SplitDepthExceeded {
        lane_index: LaneIndex,
        max_depth: usize,
        limit: usize,
    },
    InsufficientPower {
        lane_index: LaneIndex,
        node: NodeId,
    },
    MarginalPower {
        lane_index: LaneIndex,
        node: NodeId,
    },
}

/// Turns threshold violations and weak power levels into issues, most severe first.
///
/// Issues never block editing, they are advisory.
pub fn build_issues(
    ont_validation: &OntValidation,
    depth_validation: &DepthValidation,
    power_rows: &[PowerRow],
) -> Vec<PlanningIssue> {
    let mut issue_set: BTreeSet<PlanningIssue> = BTreeSet::new();

    for (lane_index, count) in ont_validation
        .per_lane_counts
        .iter()
        .filter(|(_, count)| **count > ont_validation.limit)
    {
        issue_set.insert(PlanningIssue {
            message: format!(
                "PON{} exceeds {} ONTs (actual: {})",
                *lane_index as u32 + 1,
                ont_validation.limit,
                count
            ),
            severity: IssueSeverity::Warning,
            kind: IssueKind::OntLimitExceeded {
                lane_index: *lane_index,
                count: *count,
                limit: ont_validation.limit,
            },
        });
    }

    for violation in depth_validation.violations.iter() {
        issue_set.insert(PlanningIssue {
            message: format!(
                "PON{} exceeds the maximum split depth of {} (actual: {})",
                violation.lane_index as u32 + 1,
                violation.limit,
                violation.max_depth
            ),
            severity: IssueSeverity::Warning,
            kind: IssueKind::SplitDepthExceeded {
                lane_index: violation.lane_index,
                max_depth: violation.max_depth,
                limit: violation.limit,
            },
        });
    }

    issue_set.extend(power_rows.iter().filter_map(power_issue));

    let issues: Vec<PlanningIssue> = issue_set.into_iter().collect();

    for issue in issues.iter() {
        info!(
            "Issue detected. severity: {:?}, message: '{}', kind: {:?}",
            issue.severity, issue.message, issue.kind
        );
    }

    issues
}

fn power_issue(row: &PowerRow) -> Option<PlanningIssue> {
    let lane_index = row.lane_index();
    let (severity, kind, description) = match row.level {
        PowerLevel::Adequate => return None,
        PowerLevel::Marginal => (
            IssueSeverity::Warning,
            IssueKind::MarginalPower {
                lane_index,
                node: row.node_id,
            },
            "Marginal",
        ),
        PowerLevel::Insufficient => (
            IssueSeverity::Severe,
            IssueKind::InsufficientPower {
                lane_index,
                node: row.node_id,
            },
            "Insufficient",
        ),
    };

    Some(PlanningIssue {
        message: format!(
            "{} power on PON{} at '{}': {:.2} dBm",
            description, row.lane_number, row.path_label, row.power_dbm
        ),
        severity,
        kind,
    })
}
