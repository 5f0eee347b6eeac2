mod data;
mod metrics;
mod org_chart;
mod ports;
mod services;
mod sorting;
mod statistics;
mod timesheet;

pub use data::*;
pub use metrics::*;
pub use org_chart::*;
pub use ports::*;
pub use services::*;
pub use sorting::*;
pub use statistics::*;
pub use timesheet::*;
