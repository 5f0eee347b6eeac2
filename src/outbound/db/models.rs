use crate::domain::cabinet::{Position, PositionMap};
use sqlx::FromRow;
use time::PrimitiveDateTime;

#[derive(FromRow, Clone, Debug)]
pub struct PositionRow {
    pub user_id: String,
    pub node_id: String,
    pub x: f64,
    pub y: f64,
    pub updated_at: PrimitiveDateTime,
}

pub struct PositionRowList(pub Vec<PositionRow>);

impl From<PositionRowList> for PositionMap {
    fn from(value: PositionRowList) -> Self {
        value
            .0
            .into_iter()
            .filter(|row| row.x.is_finite() && row.y.is_finite())
            .map(|row| (row.node_id, Position { x: row.x, y: row.y }))
            .collect()
    }
}
