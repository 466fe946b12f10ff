use std::collections::BTreeMap;

use sqlx::SqliteConnection;

use crate::{
    db_types::{UserId, VendorId, VendorProfile},
    traits::StorageError,
};

pub async fn fetch_profile(vendor_id: VendorId, conn: &mut SqliteConnection) -> Result<Option<VendorProfile>, StorageError> {
    let user: Option<(VendorId, String, String)> =
        sqlx::query_as("SELECT id, display_name, email FROM users WHERE id = $1")
            .bind(vendor_id)
            .fetch_optional(&mut *conn)
            .await?;
    let Some((id, display_name, email)) = user else {
        return Ok(None);
    };
    let meta: Vec<(String, String)> = sqlx::query_as("SELECT meta_key, meta_value FROM user_meta WHERE user_id = $1")
        .bind(vendor_id)
        .fetch_all(conn)
        .await?;
    let meta = meta.into_iter().collect::<BTreeMap<_, _>>();
    Ok(Some(VendorProfile { id, display_name, email, meta }))
}

pub async fn upsert_user(
    user_id: UserId,
    display_name: &str,
    email: &str,
    conn: &mut SqliteConnection,
) -> Result<(), StorageError> {
    sqlx::query(
        r#"
            INSERT INTO users (id, display_name, email) VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET display_name = excluded.display_name, email = excluded.email
        "#,
    )
    .bind(user_id)
    .bind(display_name)
    .bind(email)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn set_user_meta(user_id: UserId, key: &str, value: &str, conn: &mut SqliteConnection) -> Result<(), StorageError> {
    sqlx::query(
        r#"
            INSERT INTO user_meta (user_id, meta_key, meta_value) VALUES ($1, $2, $3)
            ON CONFLICT (user_id, meta_key) DO UPDATE SET meta_value = excluded.meta_value
        "#,
    )
    .bind(user_id)
    .bind(key)
    .bind(value)
    .execute(conn)
    .await?;
    Ok(())
}
