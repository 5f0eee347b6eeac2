use crate::domain::cabinet::metrics::{Utilization, utilization};
use crate::domain::cabinet::{Client, Collaborator, FixedCostCategory, FixedCosts};
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatisticsKind {
    Revenue,
    GrossMargin,
    Payroll,
    TimeConsumed,
    FixedCosts,
    OperatingResult,
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown statistics {0}")]
pub struct UnknownStatisticsKind(pub String);

impl FromStr for StatisticsKind {
    type Err = UnknownStatisticsKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "revenue" => Ok(StatisticsKind::Revenue),
            "gross-margin" => Ok(StatisticsKind::GrossMargin),
            "payroll" => Ok(StatisticsKind::Payroll),
            "time-consumed" => Ok(StatisticsKind::TimeConsumed),
            "fixed-costs" => Ok(StatisticsKind::FixedCosts),
            "operating-result" => Ok(StatisticsKind::OperatingResult),
            other => Err(UnknownStatisticsKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorAmount {
    pub collaborator_id: String,
    pub first_name: String,
    pub last_name: String,
    pub amount: f64,
}

impl CollaboratorAmount {
    fn new(collaborator: &Collaborator, amount: f64) -> Self {
        Self {
            collaborator_id: collaborator.id.clone(),
            first_name: collaborator.first_name.clone(),
            last_name: collaborator.last_name.clone(),
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub total: f64,
    pub by_collaborator: Vec<CollaboratorAmount>,
}

pub fn revenue(clients: &[Client]) -> f64 {
    clients.iter().map(Client::total_fees).sum()
}

fn revenue_per_collaborator(clients: &[Client]) -> HashMap<&str, f64> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for client in clients {
        if let Some(collaborator_id) = client.collaborator_ref.as_deref() {
            *totals.entry(collaborator_id).or_default() += client.total_fees();
        }
    }

    totals
}

pub fn revenue_breakdown(clients: &[Client], collaborators: &[Collaborator]) -> Breakdown {
    let per_collaborator = revenue_per_collaborator(clients);

    Breakdown {
        total: revenue(clients),
        by_collaborator: collaborators
            .iter()
            .map(|collaborator| {
                let amount = per_collaborator
                    .get(collaborator.id.as_str())
                    .copied()
                    .unwrap_or(0.0);
                CollaboratorAmount::new(collaborator, amount)
            })
            .collect(),
    }
}

pub fn payroll(collaborators: &[Collaborator]) -> f64 {
    collaborators.iter().map(Collaborator::cost).sum()
}

/// Collaborators without a recorded cost are left out of the per-collaborator list; a recorded
/// zero cost is listed.
pub fn payroll_breakdown(collaborators: &[Collaborator]) -> Breakdown {
    Breakdown {
        total: payroll(collaborators),
        by_collaborator: collaborators
            .iter()
            .filter_map(|collaborator| {
                let cost = collaborator.annual_cost?;
                Some(CollaboratorAmount::new(collaborator, cost))
            })
            .collect(),
    }
}

/// Revenue minus payroll, in total and per collaborator. Always recomputed from fees and costs;
/// margins stored on client records are not read.
pub fn gross_margin_breakdown(clients: &[Client], collaborators: &[Collaborator]) -> Breakdown {
    let per_collaborator = revenue_per_collaborator(clients);

    Breakdown {
        total: revenue(clients) - payroll(collaborators),
        by_collaborator: collaborators
            .iter()
            .map(|collaborator| {
                let revenue = per_collaborator
                    .get(collaborator.id.as_str())
                    .copied()
                    .unwrap_or(0.0);
                CollaboratorAmount::new(collaborator, revenue - collaborator.cost())
            })
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeConsumed {
    pub collaborator_id: String,
    pub first_name: String,
    pub last_name: String,
    pub clients_count: usize,
    pub consumed_minutes: u64,
    pub utilization: Utilization,
}

/// `consumed_minutes` holds the logged minutes per collaborator id; missing ids count as zero.
pub fn time_consumed(
    collaborators: &[Collaborator],
    clients: &[Client],
    consumed_minutes: &HashMap<String, u64>,
) -> Vec<TimeConsumed> {
    collaborators
        .iter()
        .map(|collaborator| {
            let minutes = consumed_minutes
                .get(&collaborator.id)
                .copied()
                .unwrap_or(0);

            TimeConsumed {
                collaborator_id: collaborator.id.clone(),
                first_name: collaborator.first_name.clone(),
                last_name: collaborator.last_name.clone(),
                clients_count: clients
                    .iter()
                    .filter(|client| client.is_assigned_to(&collaborator.id))
                    .count(),
                consumed_minutes: minutes,
                utilization: utilization(collaborator, minutes),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedCostLine {
    pub category: FixedCostCategory,
    pub amount: f64,
    /// Percent of revenue, 0 without revenue.
    pub revenue_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedCostBreakdown {
    pub total: f64,
    pub lines: Vec<FixedCostLine>,
}

pub fn fixed_cost_breakdown(fixed_costs: &FixedCosts, revenue: f64) -> FixedCostBreakdown {
    FixedCostBreakdown {
        total: fixed_costs.total(),
        lines: fixed_costs
            .iter()
            .map(|(category, amount)| FixedCostLine {
                category,
                amount,
                revenue_share: if revenue > 0.0 {
                    amount / revenue * 100.0
                } else {
                    0.0
                },
            })
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingResult {
    pub revenue: f64,
    pub payroll: f64,
    pub fixed_costs: f64,
    pub result: f64,
}

pub fn operating_result(
    clients: &[Client],
    collaborators: &[Collaborator],
    fixed_costs: &FixedCosts,
) -> OperatingResult {
    let revenue = revenue(clients);
    let payroll = payroll(collaborators);
    let fixed_costs = fixed_costs.total();

    OperatingResult {
        revenue,
        payroll,
        fixed_costs,
        result: revenue - payroll - fixed_costs,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "figures", rename_all = "kebab-case")]
pub enum Statistics {
    Revenue(Breakdown),
    GrossMargin(Breakdown),
    Payroll(Breakdown),
    TimeConsumed(Vec<TimeConsumed>),
    FixedCosts(FixedCostBreakdown),
    OperatingResult(OperatingResult),
}
