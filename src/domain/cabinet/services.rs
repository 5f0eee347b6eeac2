use crate::domain::auth::{Capability, CurrentUser};
use crate::domain::cabinet::{
    ApiAuth, BackOfficeApiPort, CabinetService, Client, ClientMarginsParams, ClientMarginsResult,
    Collaborator, CreateTimesheetApiParams, DashboardParams, DashboardResult, DatabaseRepository,
    DaySheet, FixedCosts, ListTimesheetsApiParams, LoadPositionsDBParams, OrgChartParams,
    OrgGraph, PositionMap, PrunePositionsDBParams, RecordTimesheetEntryError, RecordTimesheetEntryParams,
    SaveNodePositionError, SaveNodePositionParams, SavePositionDBParams, Statistics,
    StatisticsKind, StatisticsParams, TimesheetDayParams, TimesheetEntry, TimesheetStatsParams,
    TimesheetSummary, UpdateFixedCostApiParams, UpdateFixedCostError, UpdateFixedCostParams,
    ViewError, aggregate, build_org_graph, client_margins, collection, day_sheet,
    fixed_cost_breakdown, gross_margin_breakdown, operating_result, payroll_breakdown, revenue,
    revenue_breakdown, sort_by_state, time_consumed,
};
use crate::outbound::api::error::ApiError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Service<API, DB>
where
    API: BackOfficeApiPort,
    DB: DatabaseRepository,
{
    api: Arc<API>,
    db: DB,
}

impl<API, DB> Service<API, DB>
where
    API: BackOfficeApiPort,
    DB: DatabaseRepository,
{
    pub fn new(api: API, db: DB) -> Self {
        Self {
            api: Arc::new(api),
            db,
        }
    }

    async fn clients(&self, auth: &ApiAuth) -> Result<Vec<Client>, ApiError> {
        let payload = self.api.list_clients(auth.clone()).await?;

        Ok(collection(&payload, "clients"))
    }

    async fn collaborators(&self, auth: &ApiAuth) -> Result<Vec<Collaborator>, ApiError> {
        let payload = self.api.list_collaborators(auth.clone()).await?;

        Ok(collection(&payload, "collaborators"))
    }

    async fn timesheets(
        &self,
        auth: &ApiAuth,
        collaborator_id: &str,
    ) -> Result<Vec<TimesheetEntry>, ApiError> {
        timesheets_of(self.api.as_ref(), auth, collaborator_id).await
    }

    async fn fixed_costs(&self, auth: &ApiAuth) -> Result<FixedCosts, ApiError> {
        let payload = self.api.get_fixed_costs(auth.clone()).await?;

        Ok(FixedCosts::from_document(&payload))
    }

    /// Minutes logged by each collaborator, fetched concurrently. A collaborator whose
    /// timesheets cannot be fetched counts as zero so one failure does not hide the whole team.
    async fn consumed_minutes(
        &self,
        auth: &ApiAuth,
        collaborators: &[Collaborator],
    ) -> HashMap<String, u64> {
        let mut set = tokio::task::JoinSet::new();

        for collaborator in collaborators {
            let api = Arc::clone(&self.api);
            let auth = auth.clone();
            let collaborator_id = collaborator.id.clone();
            set.spawn(async move {
                let minutes = match timesheets_of(api.as_ref(), &auth, &collaborator_id).await {
                    Ok(entries) => entries.iter().map(TimesheetEntry::minutes).sum(),
                    Err(e) => {
                        tracing::warn!(
                            collaborator = %collaborator_id,
                            "failed to fetch timesheets, counting zero minutes: {}",
                            e
                        );
                        0
                    }
                };
                (collaborator_id, minutes)
            });
        }

        let mut consumed: HashMap<String, u64> = collaborators
            .iter()
            .map(|collaborator| (collaborator.id.clone(), 0))
            .collect();
        while let Some(res) = set.join_next().await {
            match res {
                Ok((collaborator_id, minutes)) => {
                    consumed.insert(collaborator_id, minutes);
                }
                Err(e) => tracing::warn!(%e, "timesheet fetch task failed"),
            }
        }

        consumed
    }
}

async fn timesheets_of<API: BackOfficeApiPort>(
    api: &API,
    auth: &ApiAuth,
    collaborator_id: &str,
) -> Result<Vec<TimesheetEntry>, ApiError> {
    let payload = api
        .list_timesheets(ListTimesheetsApiParams {
            auth: auth.clone(),
            collaborator_id: collaborator_id.to_string(),
        })
        .await?;

    Ok(collection(&payload, "timesheets"))
}

fn scoped_clients(clients: Vec<Client>, user: &CurrentUser) -> Vec<Client> {
    match user.client_scope() {
        Some(collaborator_id) => clients
            .into_iter()
            .filter(|client| client.is_assigned_to(collaborator_id))
            .collect(),
        None => clients,
    }
}

#[async_trait]
impl<API, DB> CabinetService for Service<API, DB>
where
    API: BackOfficeApiPort,
    DB: DatabaseRepository,
{
    async fn dashboard(&self, params: DashboardParams) -> Result<DashboardResult, ViewError> {
        let auth = ApiAuth::from(&params.user);
        let clients = scoped_clients(self.clients(&auth).await?, &params.user);

        let collaborators_count = if params.user.can(Capability::ViewCollaborators) {
            Some(self.collaborators(&auth).await?.len())
        } else {
            None
        };

        Ok(DashboardResult {
            clients_count: clients.len(),
            collaborators_count,
        })
    }

    async fn client_margins(
        &self,
        params: ClientMarginsParams,
    ) -> Result<ClientMarginsResult, ViewError> {
        let auth = ApiAuth::from(&params.user);
        let mut clients = scoped_clients(self.clients(&auth).await?, &params.user);
        if let Some(collaborator_id) = params.collaborator_id.as_deref() {
            clients.retain(|client| client.is_assigned_to(collaborator_id));
        }

        let collaborators = match self.collaborators(&auth).await {
            Ok(collaborators) => collaborators,
            Err(e) => {
                tracing::warn!("failed to fetch collaborators, margins use zero cost: {}", e);
                vec![]
            }
        };

        let mut margins = client_margins(&clients, &collaborators);
        sort_by_state(&mut margins, &params.sort);

        Ok(ClientMarginsResult {
            clients: margins,
            sort: params.sort,
        })
    }

    async fn org_chart(&self, params: OrgChartParams) -> Result<OrgGraph, ViewError> {
        let auth = ApiAuth::from(&params.user);
        let payload = self.api.list_collaborators(auth).await?;

        let positions = match self
            .db
            .load_positions(LoadPositionsDBParams {
                user_id: params.user.user_id.clone(),
            })
            .await
        {
            Ok(positions) => positions,
            Err(e) => {
                tracing::warn!("failed to load org chart positions, using defaults: {}", e);
                PositionMap::new()
            }
        };

        let graph = build_org_graph(&payload, &positions);

        // positions of nodes that left the chart, such as junctions of a regrouped team
        let stale = positions
            .keys()
            .any(|node_id| graph.node(node_id).is_none());
        if stale && !graph.nodes.is_empty() {
            let keep = graph.nodes.iter().map(|node| node.id().to_string()).collect();
            if let Err(e) = self
                .db
                .prune_positions(PrunePositionsDBParams {
                    user_id: params.user.user_id.clone(),
                    keep,
                })
                .await
            {
                tracing::warn!("failed to prune stale org chart positions: {}", e);
            }
        }

        Ok(graph)
    }

    async fn save_node_position(
        &self,
        params: SaveNodePositionParams,
    ) -> Result<(), SaveNodePositionError> {
        self.db
            .save_position(SavePositionDBParams {
                user_id: params.user_id,
                node_id: params.node_id,
                position: params.position,
            })
            .await?;

        Ok(())
    }

    async fn timesheet_stats(
        &self,
        params: TimesheetStatsParams,
    ) -> Result<TimesheetSummary, ViewError> {
        let auth = ApiAuth::from(&params.user);
        let entries = self.timesheets(&auth, &params.collaborator_id).await?;

        // the collaborator's own clients, plus any client they logged time on
        let referenced: HashSet<&str> = entries
            .iter()
            .filter_map(|entry| entry.client_ref.as_deref())
            .collect();
        let clients: Vec<Client> = self
            .clients(&auth)
            .await?
            .into_iter()
            .filter(|client| {
                client.is_assigned_to(&params.collaborator_id)
                    || referenced.contains(client.id.as_str())
            })
            .collect();

        Ok(aggregate(&entries, &clients, &params.filter))
    }

    async fn timesheet_day(&self, params: TimesheetDayParams) -> Result<DaySheet, ViewError> {
        let auth = ApiAuth::from(&params.user);
        let entries = self.timesheets(&auth, &params.collaborator_id).await?;

        Ok(day_sheet(&entries, params.date))
    }

    async fn record_timesheet_entry(
        &self,
        params: RecordTimesheetEntryParams,
    ) -> Result<TimesheetEntry, RecordTimesheetEntryError> {
        let mut entry = params.entry;
        if !params.user.can(Capability::ViewTeamTimesheets) || entry.collaborator.is_none() {
            entry.collaborator = params.user.collaborator_id.clone();
        }
        let entry = entry.validate()?;

        let created = self
            .api
            .create_timesheet(CreateTimesheetApiParams {
                auth: ApiAuth::from(&params.user),
                entry: entry.clone(),
            })
            .await?;

        match serde_json::from_value::<TimesheetEntry>(created) {
            Ok(created) => Ok(created),
            Err(e) => {
                tracing::debug!("could not read created timesheet entry back: {}", e);
                Ok(entry)
            }
        }
    }

    async fn statistics(&self, params: StatisticsParams) -> Result<Statistics, ViewError> {
        let auth = ApiAuth::from(&params.user);

        let statistics = match params.kind {
            StatisticsKind::Revenue => {
                let clients = self.clients(&auth).await?;
                let collaborators = self.collaborators(&auth).await?;
                Statistics::Revenue(revenue_breakdown(&clients, &collaborators))
            }
            StatisticsKind::GrossMargin => {
                let clients = self.clients(&auth).await?;
                let collaborators = self.collaborators(&auth).await?;
                Statistics::GrossMargin(gross_margin_breakdown(&clients, &collaborators))
            }
            StatisticsKind::Payroll => {
                let collaborators = self.collaborators(&auth).await?;
                Statistics::Payroll(payroll_breakdown(&collaborators))
            }
            StatisticsKind::TimeConsumed => {
                let clients = self.clients(&auth).await?;
                let collaborators = self.collaborators(&auth).await?;
                let consumed = self.consumed_minutes(&auth, &collaborators).await;
                Statistics::TimeConsumed(time_consumed(&collaborators, &clients, &consumed))
            }
            StatisticsKind::FixedCosts => {
                let clients = self.clients(&auth).await?;
                let fixed_costs = self.fixed_costs(&auth).await?;
                Statistics::FixedCosts(fixed_cost_breakdown(&fixed_costs, revenue(&clients)))
            }
            StatisticsKind::OperatingResult => {
                let clients = self.clients(&auth).await?;
                let collaborators = self.collaborators(&auth).await?;
                let fixed_costs = self.fixed_costs(&auth).await?;
                Statistics::OperatingResult(operating_result(
                    &clients,
                    &collaborators,
                    &fixed_costs,
                ))
            }
        };

        Ok(statistics)
    }

    async fn update_fixed_cost(
        &self,
        params: UpdateFixedCostParams,
    ) -> Result<FixedCosts, UpdateFixedCostError> {
        if !params.amount.is_finite() || params.amount < 0.0 {
            return Err(UpdateFixedCostError::InvalidAmount);
        }

        let document = self
            .api
            .update_fixed_cost(UpdateFixedCostApiParams {
                auth: ApiAuth::from(&params.user),
                category: params.category,
                amount: params.amount,
            })
            .await?;

        Ok(FixedCosts::from_document(&document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::auth::Role;
    use crate::domain::cabinet::{
        ClientSortKey, FixedCostCategory, MockBackOfficeApiPort, MockDatabaseRepository,
        NewTimesheetEntry, Position, SortDirection, SortState, Task, TimesheetEntryError,
        TimesheetFilter,
    };
    use crate::outbound::db::error::Error as DatabaseError;
    use serde_json::{Value, json};
    use std::future;
    use time::macros::date;

    fn user(role: Role, collaborator_id: Option<&str>) -> CurrentUser {
        CurrentUser {
            user_id: "u1".to_string(),
            username: "claire".to_string(),
            role,
            collaborator_id: collaborator_id.map(str::to_string),
            token: "jwt".to_string(),
        }
    }

    fn clients_payload() -> Value {
        json!([
            { "_id": "c1", "company": "Boulangerie Martin", "feesAccounting": 6000, "feesSocial": 3000, "feesLegal": 1000, "theoreticalTime": 52, "collaborator": "k1" },
            { "_id": "c2", "company": "Atelier Durand", "feesAccounting": "1200", "theoreticalTime": 10, "collaborator": { "_id": "k2" } },
            { "_id": "c3", "company": "Cave Roux", "feesAccounting": 800 },
        ])
    }

    fn collaborators_payload() -> Value {
        json!([
            { "_id": "k1", "firstName": "Anne", "lastName": "Petit", "weeklyHours": 1, "annualCost": 3333.33, "managers": [] },
            { "_id": "k2", "firstName": "Luc", "lastName": "Moreau", "weeklyHours": 35, "annualCost": 36400, "managers": ["k1"] },
        ])
    }

    fn timesheets_payload() -> Value {
        json!([
            { "_id": "t1", "date": "2025-03-03T00:00:00.000Z", "collaborator": "k1", "client": "c1", "task": "TVA", "start": "09:00", "end": "10:30", "duration": 90, "billable": true, "billableAmount": 120 },
            { "_id": "t2", "date": "2025-03-03", "collaborator": "k1", "client": "c2", "task": "Saisie", "start": "11:00", "end": "11:30" },
            { "_id": "t3", "date": "2025-03-04", "collaborator": "k1", "client": "none", "task": "Formation", "duration": 60 },
        ])
    }

    fn api_returning_clients() -> MockBackOfficeApiPort {
        let mut api = MockBackOfficeApiPort::new();
        api.expect_list_clients()
            .times(1)
            .return_once(|_| Box::pin(future::ready(Ok(clients_payload()))));
        api
    }

    #[tokio::test]
    async fn test_dashboard_counts() {
        let mut api = api_returning_clients();
        api.expect_list_collaborators()
            .times(1)
            .return_once(|_| Box::pin(future::ready(Ok(collaborators_payload()))));

        let service = Service::new(api, MockDatabaseRepository::new());
        let result = service
            .dashboard(DashboardParams {
                user: user(Role::Admin, None),
            })
            .await
            .unwrap();

        assert_eq!(3, result.clients_count);
        assert_eq!(Some(2), result.collaborators_count);
    }

    #[tokio::test]
    async fn test_dashboard_collaborateur_sees_own_clients() {
        let service = Service::new(api_returning_clients(), MockDatabaseRepository::new());
        let result = service
            .dashboard(DashboardParams {
                user: user(Role::Collaborateur, Some("k2")),
            })
            .await
            .unwrap();

        assert_eq!(1, result.clients_count);
        assert_eq!(None, result.collaborators_count);
    }

    #[tokio::test]
    async fn test_dashboard_upstream_error() {
        let mut api = MockBackOfficeApiPort::new();
        api.expect_list_clients()
            .times(1)
            .return_once(|_| Box::pin(future::ready(Err(ApiError::Unauthorized))));

        let service = Service::new(api, MockDatabaseRepository::new());
        let result = service
            .dashboard(DashboardParams {
                user: user(Role::Admin, None),
            })
            .await;

        assert!(matches!(
            result,
            Err(ViewError::Upstream(ApiError::Unauthorized))
        ));
    }

    #[tokio::test]
    async fn test_client_margins_sorted_by_margin_desc() {
        let mut api = api_returning_clients();
        api.expect_list_collaborators()
            .times(1)
            .return_once(|_| Box::pin(future::ready(Ok(collaborators_payload()))));

        let service = Service::new(api, MockDatabaseRepository::new());
        let result = service
            .client_margins(ClientMarginsParams {
                user: user(Role::Expert, None),
                collaborator_id: None,
                sort: SortState {
                    key: ClientSortKey::Margin,
                    direction: SortDirection::Desc,
                },
            })
            .await
            .unwrap();

        let margins: Vec<i64> = result.clients.iter().map(|row| row.margin).collect();
        // c2: 1200 - 20/h * 10h; c3 has no theoretical time
        assert_eq!(vec![6667, 1000, 0], margins);
        assert_eq!(Some("Anne Petit".to_string()), result.clients[0].collaborator_name);
    }

    #[tokio::test]
    async fn test_client_margins_for_one_collaborator() {
        let mut api = api_returning_clients();
        api.expect_list_collaborators()
            .times(1)
            .return_once(|_| Box::pin(future::ready(Ok(collaborators_payload()))));

        let service = Service::new(api, MockDatabaseRepository::new());
        let result = service
            .client_margins(ClientMarginsParams {
                user: user(Role::Admin, None),
                collaborator_id: Some("k2".to_string()),
                sort: SortState::default(),
            })
            .await
            .unwrap();

        assert_eq!(1, result.clients.len());
        assert_eq!("c2", result.clients[0].client.id);
    }

    #[tokio::test]
    async fn test_client_margins_without_collaborators() {
        let mut api = api_returning_clients();
        api.expect_list_collaborators().times(1).return_once(|_| {
            Box::pin(future::ready(Err(ApiError::Status {
                status: 500,
                message: "boom".to_string(),
            })))
        });

        let service = Service::new(api, MockDatabaseRepository::new());
        let result = service
            .client_margins(ClientMarginsParams {
                user: user(Role::Admin, None),
                collaborator_id: None,
                sort: SortState::default(),
            })
            .await
            .unwrap();

        assert_eq!(3, result.clients.len());
        assert!(result.clients.iter().all(|row| row.cost == 0.0));
        // sorted by company, ascending
        assert_eq!("Atelier Durand", result.clients[0].client.company);
    }

    #[tokio::test]
    async fn test_org_chart_uses_saved_positions() {
        let mut api = MockBackOfficeApiPort::new();
        api.expect_list_collaborators()
            .times(1)
            .return_once(|_| Box::pin(future::ready(Ok(collaborators_payload()))));
        let mut db = MockDatabaseRepository::new();
        db.expect_load_positions()
            .withf(|params| params.user_id == "u1")
            .times(1)
            .return_once(|_| {
                Box::pin(future::ready(Ok(PositionMap::from([(
                    "k2".to_string(),
                    Position { x: 1.0, y: 2.0 },
                )]))))
            });

        let service = Service::new(api, db);
        let graph = service
            .org_chart(OrgChartParams {
                user: user(Role::Admin, None),
            })
            .await
            .unwrap();

        assert_eq!(2, graph.nodes.len());
        assert_eq!(1, graph.edges.len());
        assert_eq!(Position { x: 1.0, y: 2.0 }, graph.node("k2").unwrap().position());
    }

    #[tokio::test]
    async fn test_org_chart_positions_error_uses_defaults() {
        let mut api = MockBackOfficeApiPort::new();
        api.expect_list_collaborators()
            .times(1)
            .return_once(|_| Box::pin(future::ready(Ok(collaborators_payload()))));
        let mut db = MockDatabaseRepository::new();
        db.expect_load_positions()
            .times(1)
            .return_once(|_| Box::pin(future::ready(Err(DatabaseError::DatabaseError(
                    sqlx::Error::RowNotFound,
                )))));

        let service = Service::new(api, db);
        let graph = service
            .org_chart(OrgChartParams {
                user: user(Role::Admin, None),
            })
            .await
            .unwrap();

        assert_eq!(2, graph.nodes.len());
    }

    #[tokio::test]
    async fn test_org_chart_prunes_stale_positions() {
        let mut api = MockBackOfficeApiPort::new();
        api.expect_list_collaborators()
            .times(1)
            .return_once(|_| Box::pin(future::ready(Ok(collaborators_payload()))));
        let mut db = MockDatabaseRepository::new();
        db.expect_load_positions().times(1).return_once(|_| {
            Box::pin(future::ready(Ok(PositionMap::from([
                ("k2".to_string(), Position { x: 1.0, y: 2.0 }),
                ("junction:k0,k1".to_string(), Position { x: 3.0, y: 4.0 }),
            ]))))
        });
        db.expect_prune_positions()
            .withf(|params| {
                params.user_id == "u1"
                    && params.keep.len() == 2
                    && params.keep.contains(&"k1".to_string())
                    && params.keep.contains(&"k2".to_string())
            })
            .times(1)
            .return_once(|_| {
                Box::pin(future::ready(Err(DatabaseError::DatabaseError(
                    sqlx::Error::PoolTimedOut,
                ))))
            });

        let service = Service::new(api, db);
        let graph = service
            .org_chart(OrgChartParams {
                user: user(Role::Admin, None),
            })
            .await
            .unwrap();

        assert_eq!(2, graph.nodes.len());
        assert_eq!(None, graph.node("junction:k0,k1"));
    }

    #[tokio::test]
    async fn test_save_node_position() {
        let mut db = MockDatabaseRepository::new();
        db.expect_save_position()
            .withf(|params| params.node_id == "junction:a,b" && params.position.x == 5.0)
            .times(1)
            .return_once(|_| Box::pin(future::ready(Ok(()))));

        let service = Service::new(MockBackOfficeApiPort::new(), db);
        let result = service
            .save_node_position(SaveNodePositionParams {
                user_id: "u1".to_string(),
                node_id: "junction:a,b".to_string(),
                position: Position { x: 5.0, y: 6.0 },
            })
            .await;

        assert_eq!(false, result.is_err());
    }

    #[tokio::test]
    async fn test_timesheet_stats() {
        let mut api = api_returning_clients();
        api.expect_list_timesheets()
            .withf(|params| params.collaborator_id == "k1" && params.auth.token == "jwt")
            .times(1)
            .return_once(|_| Box::pin(future::ready(Ok(timesheets_payload()))));

        let service = Service::new(api, MockDatabaseRepository::new());
        let summary = service
            .timesheet_stats(TimesheetStatsParams {
                user: user(Role::Collaborateur, Some("k1")),
                collaborator_id: "k1".to_string(),
                filter: TimesheetFilter::default(),
            })
            .await
            .unwrap();

        assert_eq!(180, summary.total_minutes);
        assert_eq!("3h 0m", summary.total_label);
        assert_eq!(Some(&90), summary.by_task.get("TVA"));
        assert_eq!(120.0, summary.billable.billable_amount);
        let clients: Vec<&str> = summary
            .clients
            .iter()
            .map(|row| row.client_id.as_str())
            .collect();
        assert_eq!(vec!["c1", "c2"], clients);
        assert_eq!(30, summary.clients[1].minutes);
    }

    #[tokio::test]
    async fn test_timesheet_stats_date_range() {
        let mut api = api_returning_clients();
        api.expect_list_timesheets()
            .times(1)
            .return_once(|_| Box::pin(future::ready(Ok(timesheets_payload()))));

        let service = Service::new(api, MockDatabaseRepository::new());
        let summary = service
            .timesheet_stats(TimesheetStatsParams {
                user: user(Role::Admin, None),
                collaborator_id: "k1".to_string(),
                filter: TimesheetFilter {
                    from: Some(date!(2025 - 03 - 04)),
                    to: Some(date!(2025 - 03 - 04)),
                    client_id: None,
                },
            })
            .await
            .unwrap();

        assert_eq!(60, summary.total_minutes);
        assert_eq!(60, summary.billable.non_billable_minutes);
    }

    #[tokio::test]
    async fn test_timesheet_day() {
        let mut api = MockBackOfficeApiPort::new();
        api.expect_list_timesheets()
            .times(1)
            .return_once(|_| Box::pin(future::ready(Ok(timesheets_payload()))));

        let service = Service::new(api, MockDatabaseRepository::new());
        let sheet = service
            .timesheet_day(TimesheetDayParams {
                user: user(Role::Collaborateur, Some("k1")),
                collaborator_id: "k1".to_string(),
                date: date!(2025 - 03 - 03),
            })
            .await
            .unwrap();

        assert_eq!(2, sheet.entries.len());
        assert_eq!("2h 0m", sheet.total_label);
    }

    fn new_entry(collaborator: Option<&str>, start: &str, end: &str) -> NewTimesheetEntry {
        NewTimesheetEntry {
            date: date!(2025 - 03 - 05),
            collaborator: collaborator.map(str::to_string),
            client: Some("c1".to_string()),
            task: Task::Tva,
            start_time: start.to_string(),
            end_time: end.to_string(),
            comment: None,
            billable: true,
            billable_amount: Some(80.0),
        }
    }

    #[tokio::test]
    async fn test_record_timesheet_entry_for_self() {
        let mut api = MockBackOfficeApiPort::new();
        api.expect_create_timesheet()
            .withf(|params| {
                params.entry.collaborator_ref.as_deref() == Some("k1")
                    && params.entry.duration == 45
            })
            .times(1)
            .return_once(|params| {
                let mut created = serde_json::to_value(&params.entry).unwrap();
                created["_id"] = json!("t9");
                Box::pin(future::ready(Ok(created)))
            });

        let service = Service::new(api, MockDatabaseRepository::new());
        let entry = service
            .record_timesheet_entry(RecordTimesheetEntryParams {
                // a collaborateur always records for themselves
                user: user(Role::Collaborateur, Some("k1")),
                entry: new_entry(Some("k2"), "09:00", "09:45"),
            })
            .await
            .unwrap();

        assert_eq!(Some("t9".to_string()), entry.id);
        assert_eq!(45, entry.minutes());
    }

    #[tokio::test]
    async fn test_record_timesheet_entry_for_team_member() {
        let mut api = MockBackOfficeApiPort::new();
        api.expect_create_timesheet()
            .withf(|params| params.entry.collaborator_ref.as_deref() == Some("k2"))
            .times(1)
            .return_once(|_| Box::pin(future::ready(Ok(json!({ "message": "created" })))));

        let service = Service::new(api, MockDatabaseRepository::new());
        let entry = service
            .record_timesheet_entry(RecordTimesheetEntryParams {
                user: user(Role::Expert, Some("k1")),
                entry: new_entry(Some("k2"), "09:00", "10:00"),
            })
            .await
            .unwrap();

        assert_eq!(None, entry.id);
        assert_eq!(60, entry.minutes());
    }

    #[tokio::test]
    async fn test_record_timesheet_entry_rejects_end_before_start() {
        let service = Service::new(MockBackOfficeApiPort::new(), MockDatabaseRepository::new());
        let result = service
            .record_timesheet_entry(RecordTimesheetEntryParams {
                user: user(Role::Collaborateur, Some("k1")),
                entry: new_entry(None, "10:00", "10:00"),
            })
            .await;

        assert!(matches!(
            result,
            Err(RecordTimesheetEntryError::Invalid(
                TimesheetEntryError::EndNotAfterStart
            ))
        ));
    }

    #[tokio::test]
    async fn test_statistics_gross_margin() {
        let mut api = api_returning_clients();
        api.expect_list_collaborators()
            .times(1)
            .return_once(|_| Box::pin(future::ready(Ok(collaborators_payload()))));

        let service = Service::new(api, MockDatabaseRepository::new());
        let statistics = service
            .statistics(StatisticsParams {
                user: user(Role::Admin, None),
                kind: StatisticsKind::GrossMargin,
            })
            .await
            .unwrap();

        let Statistics::GrossMargin(breakdown) = statistics else {
            panic!("unexpected statistics {statistics:?}");
        };
        assert!((breakdown.total - (12000.0 - 39733.33)).abs() < 1e-6);
        assert!((breakdown.by_collaborator[0].amount - (10000.0 - 3333.33)).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_statistics_time_consumed_survives_failed_fetch() {
        let mut api = api_returning_clients();
        api.expect_list_collaborators()
            .times(1)
            .return_once(|_| Box::pin(future::ready(Ok(collaborators_payload()))));
        api.expect_list_timesheets().times(2).returning(|params| {
            if params.collaborator_id == "k1" {
                Box::pin(future::ready(Ok(timesheets_payload())))
            } else {
                Box::pin(future::ready(Err(ApiError::Status {
                    status: 503,
                    message: "unavailable".to_string(),
                })))
            }
        });

        let service = Service::new(api, MockDatabaseRepository::new());
        let statistics = service
            .statistics(StatisticsParams {
                user: user(Role::Expert, None),
                kind: StatisticsKind::TimeConsumed,
            })
            .await
            .unwrap();

        let Statistics::TimeConsumed(rows) = statistics else {
            panic!("unexpected statistics {statistics:?}");
        };
        assert_eq!(180, rows[0].consumed_minutes);
        assert_eq!(1, rows[0].clients_count);
        assert_eq!(0, rows[1].consumed_minutes);
    }

    #[tokio::test]
    async fn test_statistics_time_consumed_fetches_collaborators_concurrently() {
        let mut api = api_returning_clients();
        let team: Vec<Value> = (0..10)
            .map(|i| json!({ "_id": format!("k{i}"), "firstName": "Anne", "lastName": format!("N{i}"), "weeklyHours": 35 }))
            .collect();
        api.expect_list_collaborators()
            .times(1)
            .return_once(move |_| Box::pin(future::ready(Ok(Value::Array(team)))));
        api.expect_list_timesheets().times(10).returning(|params| {
            Box::pin(async move {
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                if params.collaborator_id == "k9" {
                    Err(ApiError::Status {
                        status: 504,
                        message: "timeout".to_string(),
                    })
                } else {
                    Ok(json!([{ "date": "2025-03-03", "task": "Saisie", "duration": 30 }]))
                }
            })
        });

        let service = Service::new(api, MockDatabaseRepository::new());
        let started = std::time::Instant::now();
        let statistics = service
            .statistics(StatisticsParams {
                user: user(Role::Expert, None),
                kind: StatisticsKind::TimeConsumed,
            })
            .await
            .unwrap();
        let elapsed = started.elapsed();

        assert!(elapsed < std::time::Duration::from_millis(600), "took {elapsed:?}");
        let Statistics::TimeConsumed(rows) = statistics else {
            panic!("unexpected statistics {statistics:?}");
        };
        assert_eq!(10, rows.len());
        assert_eq!(
            270,
            rows.iter().map(|row| row.consumed_minutes).sum::<u64>()
        );
    }

    #[tokio::test]
    async fn test_statistics_operating_result() {
        let mut api = api_returning_clients();
        api.expect_list_collaborators()
            .times(1)
            .return_once(|_| Box::pin(future::ready(Ok(collaborators_payload()))));
        api.expect_get_fixed_costs().times(1).return_once(|_| {
            Box::pin(future::ready(Ok(
                json!({ "_id": "f1", "loyers": 2000, "assurances": "500" }),
            )))
        });

        let service = Service::new(api, MockDatabaseRepository::new());
        let statistics = service
            .statistics(StatisticsParams {
                user: user(Role::Admin, None),
                kind: StatisticsKind::OperatingResult,
            })
            .await
            .unwrap();

        let Statistics::OperatingResult(result) = statistics else {
            panic!("unexpected statistics {statistics:?}");
        };
        assert_eq!(12000.0, result.revenue);
        assert_eq!(2500.0, result.fixed_costs);
        assert!((result.result - (12000.0 - 39733.33 - 2500.0)).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_update_fixed_cost() {
        let mut api = MockBackOfficeApiPort::new();
        api.expect_update_fixed_cost()
            .withf(|params| params.category == FixedCostCategory::Loyers && params.amount == 1500.0)
            .times(1)
            .return_once(|_| Box::pin(future::ready(Ok(json!({ "loyers": 1500 })))));

        let service = Service::new(api, MockDatabaseRepository::new());
        let costs = service
            .update_fixed_cost(UpdateFixedCostParams {
                user: user(Role::Admin, None),
                category: FixedCostCategory::Loyers,
                amount: 1500.0,
            })
            .await
            .unwrap();

        assert_eq!(1500.0, costs.amount(FixedCostCategory::Loyers));
        assert_eq!(1500.0, costs.total());
    }

    #[tokio::test]
    async fn test_update_fixed_cost_rejects_negative_amount() {
        let service = Service::new(MockBackOfficeApiPort::new(), MockDatabaseRepository::new());
        let result = service
            .update_fixed_cost(UpdateFixedCostParams {
                user: user(Role::Admin, None),
                category: FixedCostCategory::Loyers,
                amount: -1.0,
            })
            .await;

        assert!(matches!(result, Err(UpdateFixedCostError::InvalidAmount)));
    }
}
