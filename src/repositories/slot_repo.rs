use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::{AsyncDbPool, get_connection};
use crate::error::{AppResult, DatabaseErrorConverter};
use crate::models::{NewSchedulingSlot, SchedulingSlot};
use crate::schema::scheduling_slots;

/// Rows per INSERT statement, well under the Postgres bind parameter limit.
const INSERT_CHUNK: usize = 1000;

#[derive(Clone)]
pub struct SlotRepository {
    pool: AsyncDbPool,
}

impl SlotRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Inserts slots, skipping (workspace, platform, scheduled_at) collisions.
    pub async fn insert_skip_conflicts(&self, slots: Vec<NewSchedulingSlot>) -> AppResult<usize> {
        let mut conn = get_connection(&self.pool).await?;
        let mut created = 0;

        for chunk in slots.chunks(INSERT_CHUNK) {
            created += diesel::insert_into(scheduling_slots::table)
                .values(chunk)
                .on_conflict((
                    scheduling_slots::workspace_id,
                    scheduling_slots::platform,
                    scheduling_slots::scheduled_at,
                ))
                .do_nothing()
                .execute(&mut conn)
                .await
                .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "insert slots"))?;
        }

        Ok(created)
    }

    pub async fn count(&self, workspace_id: Uuid, platform: Option<&str>) -> AppResult<i64> {
        let mut conn = get_connection(&self.pool).await?;

        let mut query = scheduling_slots::table
            .filter(scheduling_slots::workspace_id.eq(workspace_id))
            .into_boxed();
        if let Some(platform) = platform {
            query = query.filter(scheduling_slots::platform.eq(platform));
        }

        query
            .count()
            .get_result(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "count slots"))
    }

    pub async fn list_open(
        &self,
        workspace_id: Uuid,
        platform: Option<&str>,
        after: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<SchedulingSlot>> {
        let mut conn = get_connection(&self.pool).await?;

        let mut query = scheduling_slots::table
            .filter(scheduling_slots::workspace_id.eq(workspace_id))
            .filter(scheduling_slots::assigned_content_id.is_null())
            .filter(scheduling_slots::scheduled_at.gt(after))
            .select(SchedulingSlot::as_select())
            .into_boxed();
        if let Some(platform) = platform {
            query = query.filter(scheduling_slots::platform.eq(platform));
        }

        query
            .order(scheduling_slots::scheduled_at.asc())
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "list open slots"))
    }
}
