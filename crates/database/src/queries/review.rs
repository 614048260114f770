use model::hazard::HazardReport;
use sqlx::{Executor, Postgres};
use utility::id::Id;

use crate::data_model::review::ReviewRow;

use super::convert_error;

pub async fn get_all<'c, E>(executor: E) -> crate::Result<Vec<HazardReport>>
where
    E: Executor<'c, Database = Postgres>,
{
    let rows: Vec<ReviewRow> = sqlx::query_as(
        "
        SELECT
            id,
            user_id,
            title,
            description,
            category,
            rating,
            location,
            coordinates,
            image_url,
            created_at
        FROM
            reviews
        ORDER BY
            created_at DESC;
        ",
    )
    .fetch_all(executor)
    .await
    .map_err(convert_error)?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let id = row.id.clone();
            row.to_model()
                .map_err(|why| log::warn!("skipping review {}: {}", id, why))
                .ok()
        })
        .collect())
}

pub async fn get<'c, E>(executor: E, id: Id<HazardReport>) -> crate::Result<HazardReport>
where
    E: Executor<'c, Database = Postgres>,
{
    let row: ReviewRow = sqlx::query_as(
        "
        SELECT
            id,
            user_id,
            title,
            description,
            category,
            rating,
            location,
            coordinates,
            image_url,
            created_at
        FROM
            reviews
        WHERE
            id = $1;
        ",
    )
    .bind(id.raw())
    .fetch_one(executor)
    .await
    .map_err(convert_error)?;

    row.to_model()
        .map_err(|why| crate::DatabaseError::Other(Box::new(why)))
}
