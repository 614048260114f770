use model::{position::Position, session::SessionId};
use sqlx::{Executor, Postgres};

use crate::data_model::session::SessionRow;

use super::convert_error;

/// `Ok(None)` both for a missing row and for a row without coordinates.
pub async fn position<'c, E>(executor: E, id: &SessionId) -> crate::Result<Option<Position>>
where
    E: Executor<'c, Database = Postgres>,
{
    let row: Option<SessionRow> = sqlx::query_as(
        "
        SELECT
            lat,
            lng
        FROM
            sos_sessions
        WHERE
            id = $1;
        ",
    )
    .bind(id.raw_ref::<str>())
    .fetch_optional(executor)
    .await
    .map_err(convert_error)?;

    Ok(row.and_then(SessionRow::position))
}
