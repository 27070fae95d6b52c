//! SQLite row mapping for the `records` table.

use super::context::{Change, ChangeSet};
use super::{StoreError, StoreResult};
use crate::model::record::{Fields, Record, RecordId};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

const RECORD_SELECT_SQL: &str = "SELECT
    id,
    kind,
    ordinal,
    fields
FROM records";

/// Row counts written by one root save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct WriteSummary {
    pub upserted: usize,
    pub deleted: usize,
}

pub(crate) fn max_ordinal(conn: &Connection) -> StoreResult<i64> {
    let max = conn.query_row("SELECT COALESCE(MAX(ordinal), 0) FROM records;", [], |row| {
        row.get::<_, i64>(0)
    })?;
    Ok(max)
}

/// Loads up to `page_size` rows of `kinds` with ordinal above `after_ordinal`.
pub(crate) fn load_page(
    conn: &Connection,
    kinds: &[String],
    after_ordinal: i64,
    page_size: usize,
) -> StoreResult<Vec<Record>> {
    if kinds.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; kinds.len()].join(", ");
    let sql = format!(
        "{RECORD_SELECT_SQL}
         WHERE kind IN ({placeholders})
           AND ordinal > ?
         ORDER BY ordinal ASC
         LIMIT ?;"
    );

    let mut bind_values: Vec<SqlValue> = kinds
        .iter()
        .map(|kind| SqlValue::Text(kind.clone()))
        .collect();
    bind_values.push(SqlValue::Integer(after_ordinal));
    bind_values.push(SqlValue::Integer(
        i64::try_from(page_size).unwrap_or(i64::MAX),
    ));

    let mut stmt = conn.prepare_cached(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(parse_record_row(row)?);
    }
    Ok(records)
}

pub(crate) fn load_by_id(conn: &Connection, id: RecordId) -> StoreResult<Option<Record>> {
    let mut stmt = conn.prepare_cached(&format!("{RECORD_SELECT_SQL} WHERE id = ?1;"))?;
    let row = stmt
        .query_row(params![id.to_string()], |row| Ok(parse_record_row(row)))
        .optional()?;
    row.transpose()
}

/// Writes every staged change inside one transaction.
///
/// Deletes of ids that were never persisted affect no rows and are not
/// errors.
pub(crate) fn write_changes(conn: &mut Connection, changes: &ChangeSet) -> StoreResult<WriteSummary> {
    let tx = conn.transaction()?;
    let mut summary = WriteSummary::default();
    {
        let mut upsert = tx.prepare_cached(
            "INSERT INTO records (id, kind, ordinal, fields)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                fields = excluded.fields,
                updated_at = (strftime('%s', 'now') * 1000);",
        )?;
        let mut delete = tx.prepare_cached("DELETE FROM records WHERE id = ?1;")?;

        for (id, change) in changes.iter() {
            match change {
                Change::Upsert(record) => {
                    let fields = serde_json::to_string(record.fields()).map_err(|err| {
                        StoreError::InvalidData(format!(
                            "cannot encode fields of record {id}: {err}"
                        ))
                    })?;
                    upsert.execute(params![
                        id.to_string(),
                        record.kind(),
                        record.ordinal(),
                        fields
                    ])?;
                    summary.upserted += 1;
                }
                Change::Delete => {
                    summary.deleted += delete.execute(params![id.to_string()])?;
                }
            }
        }
    }
    tx.commit()?;
    Ok(summary)
}

fn parse_record_row(row: &Row<'_>) -> StoreResult<Record> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        StoreError::InvalidData(format!("invalid uuid value `{id_text}` in records.id"))
    })?;

    let fields_text: String = row.get("fields")?;
    let fields: Fields = serde_json::from_str(&fields_text).map_err(|err| {
        StoreError::InvalidData(format!("invalid fields of record {id}: {err}"))
    })?;

    Ok(Record::from_parts(
        id,
        row.get("kind")?,
        row.get("ordinal")?,
        fields,
    ))
}
