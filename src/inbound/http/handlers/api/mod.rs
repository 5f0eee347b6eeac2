mod clients;
mod dashboard;
mod fixed_costs;
mod org_chart;
mod statistics;
mod timesheets;

pub use clients::{client_margins, collaborator_client_margins};
pub use dashboard::dashboard;
pub use fixed_costs::update_fixed_cost;
pub use org_chart::{org_chart, save_org_chart_position};
pub use statistics::statistics;
pub use timesheets::{record_timesheet_entry, timesheet_day, timesheet_stats};
