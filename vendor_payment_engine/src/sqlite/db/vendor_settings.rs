use chrono::{DateTime, Utc};
use log::trace;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{MethodExtra, NewVendorSetting, PaymentMethod, PaymentStat, VendorId, VendorPaymentSetting},
    traits::StorageError,
};

#[derive(Debug, FromRow)]
struct VendorSettingRow {
    id: i64,
    vendor_id: VendorId,
    payment_method: PaymentMethod,
    account_number: String,
    enabled: bool,
    settings: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<VendorSettingRow> for VendorPaymentSetting {
    type Error = StorageError;

    fn try_from(row: VendorSettingRow) -> Result<Self, Self::Error> {
        let extra = match row.settings.as_deref().map(str::trim) {
            None | Some("") => MethodExtra::None,
            Some(json) => serde_json::from_str(json)?,
        };
        Ok(Self {
            id: row.id,
            vendor_id: row.vendor_id,
            method: row.payment_method,
            account_number: row.account_number,
            enabled: row.enabled,
            extra,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn encode_extra(extra: &MethodExtra) -> Result<Option<String>, StorageError> {
    match extra {
        MethodExtra::None => Ok(None),
        e => Ok(Some(serde_json::to_string(e)?)),
    }
}

/// Inserts the setting, or overwrites every column of the existing row for the same vendor and method. The stored
/// extras are replaced wholesale, never merged.
pub async fn upsert(
    setting: NewVendorSetting,
    conn: &mut SqliteConnection,
) -> Result<VendorPaymentSetting, StorageError> {
    let settings = encode_extra(&setting.extra)?;
    let row: VendorSettingRow = sqlx::query_as(
        r#"
            INSERT INTO vendor_settings (vendor_id, payment_method, account_number, enabled, settings)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (vendor_id, payment_method) DO UPDATE SET
                account_number = excluded.account_number,
                enabled = excluded.enabled,
                settings = excluded.settings,
                updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(setting.vendor_id)
    .bind(setting.method)
    .bind(setting.account_number)
    .bind(setting.enabled)
    .bind(settings)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Vendor #{} settings for {} saved (row {})", row.vendor_id, row.payment_method, row.id);
    row.try_into()
}

pub async fn fetch_for_vendor(
    vendor_id: VendorId,
    conn: &mut SqliteConnection,
) -> Result<Vec<VendorPaymentSetting>, StorageError> {
    let rows: Vec<VendorSettingRow> =
        sqlx::query_as("SELECT * FROM vendor_settings WHERE vendor_id = $1 ORDER BY id")
            .bind(vendor_id)
            .fetch_all(conn)
            .await?;
    rows.into_iter().map(VendorPaymentSetting::try_from).collect()
}

pub async fn fetch_one(
    vendor_id: VendorId,
    method: PaymentMethod,
    conn: &mut SqliteConnection,
) -> Result<Option<VendorPaymentSetting>, StorageError> {
    let row: Option<VendorSettingRow> =
        sqlx::query_as("SELECT * FROM vendor_settings WHERE vendor_id = $1 AND payment_method = $2")
            .bind(vendor_id)
            .bind(method)
            .fetch_optional(conn)
            .await?;
    row.map(VendorPaymentSetting::try_from).transpose()
}

pub async fn payment_stats(vendor_id: VendorId, conn: &mut SqliteConnection) -> Result<Vec<PaymentStat>, StorageError> {
    let rows: Vec<(PaymentMethod, i64, i64)> = sqlx::query_as(
        r#"
            SELECT payment_method, COUNT(*) AS count, COALESCE(SUM(amount), 0) AS total
            FROM transactions
            WHERE vendor_id = $1
            GROUP BY payment_method
            ORDER BY payment_method
        "#,
    )
    .bind(vendor_id)
    .fetch_all(conn)
    .await?;
    let stats = rows
        .into_iter()
        .map(|(payment_method, count, total)| PaymentStat { payment_method, count, total: total.into() })
        .collect();
    Ok(stats)
}

pub async fn delete_all(conn: &mut SqliteConnection) -> Result<u64, StorageError> {
    let result = sqlx::query("DELETE FROM vendor_settings").execute(conn).await?;
    Ok(result.rows_affected())
}
