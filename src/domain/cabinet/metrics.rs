use crate::domain::cabinet::sorting::{SortValue, Sortable};
use crate::domain::cabinet::{Client, Collaborator};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Weeks used to turn weekly hours into the yearly hours a salary cost is spread over.
pub const WEEKS_PER_YEAR: f64 = 52.0;

/// Weeks actually worked in a year, five being holidays and leave.
pub const WORKING_WEEKS_PER_YEAR: f64 = 47.0;

fn unset(value: f64) -> bool {
    value == 0.0 || !value.is_finite()
}

/// Rounds half up, so `-0.5` goes to `0` and `6666.5` to `6667`.
fn round_currency(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Cost of `theoretical_time` hours of the collaborator's time.
pub fn cost_of(collaborator: Option<&Collaborator>, theoretical_time: f64) -> f64 {
    let Some(collaborator) = collaborator else {
        return 0.0;
    };
    if unset(collaborator.weekly_hours) || unset(collaborator.cost()) {
        return 0.0;
    }

    let annual_hours = collaborator.weekly_hours * WEEKS_PER_YEAR;
    if annual_hours <= 0.0 {
        return 0.0;
    }

    (collaborator.cost() / annual_hours) * theoretical_time
}

/// Fees minus the cost of serving the client, rounded to a whole currency unit.
pub fn margin_of(client: &Client, collaborator: Option<&Collaborator>, theoretical_time: f64) -> i64 {
    let total_fees = client.total_fees();
    if unset(total_fees) || unset(theoretical_time) {
        return 0;
    }

    round_currency(total_fees - cost_of(collaborator, theoretical_time))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Utilization {
    pub consumed_hours: f64,
    pub available_hours: f64,
    /// Unclamped; above 100 when the collaborator logged more than their capacity.
    pub percent: f64,
    /// `percent` capped at 100 for progress bars.
    pub display_percent: f64,
    pub over_capacity: bool,
}

pub fn utilization(collaborator: &Collaborator, consumed_minutes: u64) -> Utilization {
    let consumed_hours = consumed_minutes as f64 / 60.0;
    let available_hours = if collaborator.weekly_hours.is_finite() && collaborator.weekly_hours > 0.0
    {
        collaborator.weekly_hours * WORKING_WEEKS_PER_YEAR
    } else {
        0.0
    };
    let percent = if available_hours > 0.0 {
        consumed_hours / available_hours * 100.0
    } else {
        0.0
    };

    Utilization {
        consumed_hours,
        available_hours,
        percent,
        display_percent: percent.min(100.0),
        over_capacity: percent >= 100.0,
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// Client margins
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientMargin {
    #[serde(flatten)]
    pub client: Client,
    pub collaborator_name: Option<String>,
    pub total_fees: f64,
    pub cost: f64,
    pub margin: i64,
}

pub fn client_margins(clients: &[Client], collaborators: &[Collaborator]) -> Vec<ClientMargin> {
    let by_id: HashMap<&str, &Collaborator> = collaborators
        .iter()
        .map(|collaborator| (collaborator.id.as_str(), collaborator))
        .collect();

    clients
        .iter()
        .map(|client| {
            let collaborator = client
                .collaborator_ref
                .as_deref()
                .and_then(|id| by_id.get(id).copied());
            if collaborator.is_none() {
                tracing::debug!(client = %client.id, "no collaborator found for client");
            }

            ClientMargin {
                client: client.clone(),
                collaborator_name: collaborator.map(Collaborator::full_name),
                total_fees: client.total_fees(),
                cost: cost_of(collaborator, client.theoretical_time),
                margin: margin_of(client, collaborator, client.theoretical_time),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientSortKey {
    #[default]
    Company,
    Activity,
    FeesAccounting,
    FeesSocial,
    FeesLegal,
    Fees,
    Margin,
}

impl Sortable<ClientSortKey> for ClientMargin {
    fn sort_value(&self, key: &ClientSortKey) -> SortValue<'_> {
        match key {
            ClientSortKey::Company => SortValue::Text(&self.client.company),
            ClientSortKey::Activity => SortValue::Text(&self.client.activity),
            ClientSortKey::FeesAccounting => SortValue::Number(self.client.fees_accounting),
            ClientSortKey::FeesSocial => SortValue::Number(self.client.fees_social),
            ClientSortKey::FeesLegal => SortValue::Number(self.client.fees_legal),
            ClientSortKey::Fees => SortValue::Number(self.total_fees),
            ClientSortKey::Margin => SortValue::Number(self.margin as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collaborator(weekly_hours: f64, annual_cost: f64) -> Collaborator {
        Collaborator {
            id: "k1".to_string(),
            first_name: "Claire".to_string(),
            last_name: "Dubois".to_string(),
            weekly_hours,
            annual_cost: Some(annual_cost),
            ..Default::default()
        }
    }

    fn client(fees: (f64, f64, f64), theoretical_time: f64) -> Client {
        Client {
            id: "c1".to_string(),
            company: "Garage Leroy".to_string(),
            fees_accounting: fees.0,
            fees_social: fees.1,
            fees_legal: fees.2,
            theoretical_time,
            collaborator_ref: Some("k1".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_cost_of_zero_weekly_hours() {
        for (annual_cost, theoretical_time) in [(0.0, 0.0), (48000.0, 10.0), (1e9, 1e6)] {
            assert_eq!(
                0.0,
                cost_of(Some(&collaborator(0.0, annual_cost)), theoretical_time)
            );
        }
    }

    #[test]
    fn test_cost_of_missing_collaborator_or_cost() {
        assert_eq!(0.0, cost_of(None, 12.0));
        assert_eq!(0.0, cost_of(Some(&collaborator(35.0, 0.0)), 12.0));
    }

    #[test]
    fn test_cost_of_spreads_annual_cost_over_52_weeks() {
        // 36400 / (35 * 52) = 20 per hour
        let cost = cost_of(Some(&collaborator(35.0, 36400.0)), 10.0);

        assert!((cost - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_margin_of_zero_fees() {
        let k = collaborator(35.0, 36400.0);

        assert_eq!(0, margin_of(&client((0.0, 0.0, 0.0), 10.0), Some(&k), 10.0));
    }

    #[test]
    fn test_margin_of_zero_theoretical_time() {
        let k = collaborator(35.0, 36400.0);

        assert_eq!(0, margin_of(&client((1000.0, 0.0, 0.0), 0.0), Some(&k), 0.0));
    }

    #[test]
    fn test_margin_of_rounds_to_nearest_unit() {
        // one weekly hour -> 52 annual hours, and 52 theoretical hours cost the whole annual cost
        let k = collaborator(1.0, 3333.33);
        let c = client((6000.0, 3000.0, 1000.0), 52.0);

        assert_eq!(6667, margin_of(&c, Some(&k), 52.0));
    }

    #[test]
    fn test_margin_of_without_collaborator_is_total_fees() {
        let c = client((1000.0, 200.4, 0.0), 5.0);

        assert_eq!(1200, margin_of(&c, None, 5.0));
    }

    #[test]
    fn test_utilization_converts_minutes_to_hours() {
        let result = utilization(&collaborator(35.0, 0.0), 1000);

        assert_eq!(1645.0, result.available_hours);
        assert!((result.consumed_hours - 16.6667).abs() < 1e-3);
        assert!((result.percent - 1.0132).abs() < 1e-3);
        assert_eq!(result.percent, result.display_percent);
        assert!(!result.over_capacity);
    }

    #[test]
    fn test_utilization_keeps_raw_percent_above_capacity() {
        // 10h a week -> 470 available hours, 564 logged
        let result = utilization(&collaborator(10.0, 0.0), 564 * 60);

        assert!((result.percent - 120.0).abs() < 1e-9);
        assert_eq!(100.0, result.display_percent);
        assert!(result.over_capacity);
    }

    #[test]
    fn test_utilization_without_weekly_hours() {
        let result = utilization(&collaborator(0.0, 0.0), 600);

        assert_eq!(0.0, result.available_hours);
        assert_eq!(0.0, result.percent);
    }

    #[test]
    fn test_client_margins_resolves_collaborators_by_id() {
        let clients = vec![
            client((10000.0, 0.0, 0.0), 52.0),
            Client {
                id: "c2".to_string(),
                collaborator_ref: Some("unknown".to_string()),
                ..client((500.0, 0.0, 0.0), 4.0)
            },
        ];
        let rows = client_margins(&clients, &[collaborator(1.0, 3333.33)]);

        assert_eq!(Some("Claire Dubois".to_string()), rows[0].collaborator_name);
        assert_eq!(6667, rows[0].margin);
        assert_eq!(None, rows[1].collaborator_name);
        assert_eq!(0.0, rows[1].cost);
        assert_eq!(500, rows[1].margin);
    }
}
