use crate::core::application::ApplicationServices;
use crate::domain::auth::{Capability, CurrentUser};
use crate::domain::cabinet::{
    CabinetService, NewTimesheetEntry, RecordTimesheetEntryParams, TimesheetDayParams,
    TimesheetFilter, TimesheetStatsParams, calendar_date,
};
use crate::errors::AppError;
use crate::inbound::http::responses::shared::{DataResponse, ResponseType};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use http::StatusCode;
use serde::Deserialize;
use time::{Date, OffsetDateTime};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StatsQueryParams {
    from: Option<String>,
    to: Option<String>,
    client_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DayQueryParams {
    date: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_date(value: &str) -> Result<Date, AppError> {
    calendar_date::parse(value)
        .ok_or_else(|| AppError::BadRequest(Some(format!("invalid date {value}"))))
}

fn ensure_can_view(user: &CurrentUser, collaborator_id: &str) -> Result<(), AppError> {
    if user.can_view_timesheets_of(collaborator_id) {
        Ok(())
    } else {
        tracing::debug!(collaborator_id, "timesheets of another collaborator refused");
        Err(AppError::Forbidden)
    }
}

impl TryFrom<StatsQueryParams> for TimesheetFilter {
    type Error = AppError;

    fn try_from(params: StatsQueryParams) -> Result<Self, Self::Error> {
        let from = non_empty(params.from).as_deref().map(parse_date).transpose()?;
        let to = non_empty(params.to).as_deref().map(parse_date).transpose()?;
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(AppError::BadRequest(Some(
                    "start date is after end date".to_string(),
                )));
            }
        }

        Ok(TimesheetFilter {
            from,
            to,
            client_id: non_empty(params.client_id),
        })
    }
}

pub async fn timesheet_stats<S: ApplicationServices>(
    State(state): State<S>,
    Extension(user): Extension<CurrentUser>,
    Path(collaborator_id): Path<String>,
    Query(params): Query<StatsQueryParams>,
) -> Result<impl IntoResponse, AppError> {
    ensure_can_view(&user, &collaborator_id)?;
    let filter = TimesheetFilter::try_from(params)?;

    let summary = state
        .cabinet_service()
        .timesheet_stats(TimesheetStatsParams {
            user,
            collaborator_id,
            filter,
        })
        .await?;

    Ok(DataResponse::new(ResponseType::TimesheetStats, summary))
}

/// Entries of one day, today when no date is given.
pub async fn timesheet_day<S: ApplicationServices>(
    State(state): State<S>,
    Extension(user): Extension<CurrentUser>,
    Path(collaborator_id): Path<String>,
    Query(params): Query<DayQueryParams>,
) -> Result<impl IntoResponse, AppError> {
    ensure_can_view(&user, &collaborator_id)?;
    let date = match non_empty(params.date) {
        Some(date) => parse_date(&date)?,
        None => OffsetDateTime::now_utc().date(),
    };

    let sheet = state
        .cabinet_service()
        .timesheet_day(TimesheetDayParams {
            user,
            collaborator_id,
            date,
        })
        .await?;

    Ok(DataResponse::new(ResponseType::TimesheetDay, sheet))
}

pub async fn record_timesheet_entry<S: ApplicationServices>(
    State(state): State<S>,
    Extension(user): Extension<CurrentUser>,
    Json(entry): Json<NewTimesheetEntry>,
) -> Result<impl IntoResponse, AppError> {
    user.require(Capability::RecordTimesheet)?;

    let entry = state
        .cabinet_service()
        .record_timesheet_entry(RecordTimesheetEntryParams { user, entry })
        .await?;

    Ok(DataResponse::new(ResponseType::TimesheetEntry, entry).with_status(StatusCode::CREATED))
}
