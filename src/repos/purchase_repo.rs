/*
 * Responsibility
 * - Read-only purchase queries backing the entitlement lookup
 * - purchases / products are owned by the commerce side; nothing here writes
 */
use sqlx::PgPool;

use crate::repos::error::RepoResult;
use crate::services::entitlement::Capability;

// True when `customer_id` has at least one completed purchase of a product
// that grants `capability`.
pub async fn has_completed_purchase_granting(
    pool: &PgPool,
    customer_id: &str,
    capability: Capability,
) -> RepoResult<bool> {
    let granted = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM purchases p
            JOIN products pr ON pr."productId" = p."productId"
            WHERE p."customerId" = $1
              AND p.status = 'completed'
              AND pr.capability = $2
        )
        "#,
    )
    .bind(customer_id)
    .bind(capability.as_str())
    .fetch_one(pool)
    .await?;

    Ok(granted)
}
