use crate::domain::cabinet::{
    DatabaseRepository, LoadPositionsDBParams, PositionMap, PrunePositionsDBParams,
    SavePositionDBParams,
};
use crate::outbound::db::error::Error;
use crate::outbound::db::models::{PositionRow, PositionRowList};
use crate::outbound::db::repository::Repository;
use async_trait::async_trait;

#[async_trait]
impl DatabaseRepository for Repository {
    async fn load_positions(&self, params: LoadPositionsDBParams) -> Result<PositionMap, Error> {
        let result = sqlx::query_as::<_, PositionRow>(
            r#"
select
    p.*
from org_chart_positions p
where p.user_id = $1
"#,
        )
        .bind(params.user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(PositionRowList(result).into())
    }

    /// Last write wins: a node has one saved position per user.
    async fn save_position(&self, params: SavePositionDBParams) -> Result<(), Error> {
        sqlx::query(
            r#"
insert into org_chart_positions (user_id, node_id, x, y)
values ($1, $2, $3, $4)
on conflict (user_id, node_id)
do update set x = excluded.x, y = excluded.y, updated_at = now()
"#,
        )
        .bind(params.user_id)
        .bind(params.node_id)
        .bind(params.position.x)
        .bind(params.position.y)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn prune_positions(&self, params: PrunePositionsDBParams) -> Result<(), Error> {
        let result = sqlx::query(
            r#"
delete from org_chart_positions
where user_id = $1
and not (node_id = any($2))
"#,
        )
        .bind(params.user_id)
        .bind(params.keep)
        .execute(&self.pool)
        .await?;

        tracing::debug!("pruned {} stale org chart positions", result.rows_affected());

        Ok(())
    }
}
