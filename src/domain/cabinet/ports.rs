use crate::domain::auth::CurrentUser;
use crate::domain::cabinet::{
    ClientMargin, ClientSortKey, DaySheet, FixedCostCategory, FixedCosts, NewTimesheetEntry,
    OrgGraph, Position, PositionMap, SortState, Statistics, StatisticsKind, TimesheetEntry,
    TimesheetEntryError, TimesheetFilter, TimesheetSummary,
};
use crate::outbound::api::error::ApiError;
use crate::outbound::db::error::Error as DatabaseError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use time::Date;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait CabinetService: Send + Sync + 'static {
    async fn dashboard(&self, params: DashboardParams) -> Result<DashboardResult, ViewError>;
    async fn client_margins(
        &self,
        params: ClientMarginsParams,
    ) -> Result<ClientMarginsResult, ViewError>;
    async fn org_chart(&self, params: OrgChartParams) -> Result<OrgGraph, ViewError>;
    async fn save_node_position(
        &self,
        params: SaveNodePositionParams,
    ) -> Result<(), SaveNodePositionError>;
    async fn timesheet_stats(
        &self,
        params: TimesheetStatsParams,
    ) -> Result<TimesheetSummary, ViewError>;
    async fn timesheet_day(&self, params: TimesheetDayParams) -> Result<DaySheet, ViewError>;
    async fn record_timesheet_entry(
        &self,
        params: RecordTimesheetEntryParams,
    ) -> Result<TimesheetEntry, RecordTimesheetEntryError>;
    async fn statistics(&self, params: StatisticsParams) -> Result<Statistics, ViewError>;
    async fn update_fixed_cost(
        &self,
        params: UpdateFixedCostParams,
    ) -> Result<FixedCosts, UpdateFixedCostError>;
}

/// Failure of a read-only view built from upstream data.
#[derive(Debug, Error)]
pub enum ViewError {
    #[error(transparent)]
    Upstream(#[from] ApiError),
}

//------------------------------------------------------------------------------
// Dashboard
//------------------------------------------------------------------------------

pub struct DashboardParams {
    pub user: CurrentUser,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResult {
    pub clients_count: usize,
    /// Only given to users allowed to see the team.
    pub collaborators_count: Option<usize>,
}

//------------------------------------------------------------------------------
// Client margins
//------------------------------------------------------------------------------

pub struct ClientMarginsParams {
    pub user: CurrentUser,
    /// Restricts the list to the clients of one collaborator.
    pub collaborator_id: Option<String>,
    pub sort: SortState<ClientSortKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientMarginsResult {
    pub clients: Vec<ClientMargin>,
    pub sort: SortState<ClientSortKey>,
}

//------------------------------------------------------------------------------
// Org chart
//------------------------------------------------------------------------------

pub struct OrgChartParams {
    pub user: CurrentUser,
}

#[derive(Clone)]
pub struct SaveNodePositionParams {
    pub user_id: String,
    pub node_id: String,
    pub position: Position,
}

#[derive(Debug, Error)]
pub enum SaveNodePositionError {
    #[error("failed to save node position because of database error")]
    DatabaseError(#[from] DatabaseError),
}

//------------------------------------------------------------------------------
// Timesheets
//------------------------------------------------------------------------------

pub struct TimesheetStatsParams {
    pub user: CurrentUser,
    pub collaborator_id: String,
    pub filter: TimesheetFilter,
}

pub struct TimesheetDayParams {
    pub user: CurrentUser,
    pub collaborator_id: String,
    pub date: Date,
}

pub struct RecordTimesheetEntryParams {
    pub user: CurrentUser,
    pub entry: NewTimesheetEntry,
}

#[derive(Debug, Error)]
pub enum RecordTimesheetEntryError {
    #[error(transparent)]
    Invalid(#[from] TimesheetEntryError),

    #[error(transparent)]
    Upstream(#[from] ApiError),
}

//------------------------------------------------------------------------------
// Statistics
//------------------------------------------------------------------------------

pub struct StatisticsParams {
    pub user: CurrentUser,
    pub kind: StatisticsKind,
}

//------------------------------------------------------------------------------
// Fixed costs
//------------------------------------------------------------------------------

pub struct UpdateFixedCostParams {
    pub user: CurrentUser,
    pub category: FixedCostCategory,
    pub amount: f64,
}

#[derive(Debug, Error)]
pub enum UpdateFixedCostError {
    #[error("fixed cost amount must be a positive number")]
    InvalidAmount,

    #[error(transparent)]
    Upstream(#[from] ApiError),
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// Back-office API
////////////////////////////////////////////////////////////////////////////////////////////////////

/// The upstream REST API. Collections come back as raw JSON and are read leniently by the
/// domain, so one malformed record never fails a whole view.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait BackOfficeApiPort: Send + Sync + 'static {
    async fn list_clients(&self, params: ApiAuth) -> Result<Value, ApiError>;
    async fn list_collaborators(&self, params: ApiAuth) -> Result<Value, ApiError>;
    async fn list_timesheets(&self, params: ListTimesheetsApiParams) -> Result<Value, ApiError>;
    async fn create_timesheet(&self, params: CreateTimesheetApiParams) -> Result<Value, ApiError>;
    async fn get_fixed_costs(&self, params: ApiAuth) -> Result<Value, ApiError>;
    async fn update_fixed_cost(&self, params: UpdateFixedCostApiParams)
    -> Result<Value, ApiError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiAuth {
    pub token: String,
}

impl From<&CurrentUser> for ApiAuth {
    fn from(user: &CurrentUser) -> Self {
        Self {
            token: user.token.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListTimesheetsApiParams {
    pub auth: ApiAuth,
    pub collaborator_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTimesheetApiParams {
    pub auth: ApiAuth,
    pub entry: TimesheetEntry,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateFixedCostApiParams {
    pub auth: ApiAuth,
    pub category: FixedCostCategory,
    pub amount: f64,
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// Database Repository
////////////////////////////////////////////////////////////////////////////////////////////////////

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait DatabaseRepository: Send + Sync + 'static {
    async fn load_positions(
        &self,
        params: LoadPositionsDBParams,
    ) -> Result<PositionMap, DatabaseError>;
    async fn save_position(&self, params: SavePositionDBParams) -> Result<(), DatabaseError>;
    async fn prune_positions(&self, params: PrunePositionsDBParams) -> Result<(), DatabaseError>;
}

//------------------------------------------------------------------------------
// Load Positions
//------------------------------------------------------------------------------

pub struct LoadPositionsDBParams {
    pub user_id: String,
}

//------------------------------------------------------------------------------
// Save Position
//------------------------------------------------------------------------------

pub struct SavePositionDBParams {
    pub user_id: String,
    pub node_id: String,
    pub position: Position,
}

//------------------------------------------------------------------------------
// Prune Positions
//------------------------------------------------------------------------------

/// Removes every saved position of the user except the listed node ids.
pub struct PrunePositionsDBParams {
    pub user_id: String,
    pub keep: Vec<String>,
}
