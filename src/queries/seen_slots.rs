use sea_query::{Expr, OnConflict, Order, Query, SqliteQueryBuilder};

use crate::schema::SeenSlots;
use crate::slot::SlotRecord;

/// INSERT INTO seen_slots (identifier, start_time, end_time, instructor, notified, first_seen_at)
/// VALUES (?, ?, ?, ?, 0, ?) ON CONFLICT (identifier) DO NOTHING
pub fn insert_if_absent(record: &SlotRecord, first_seen_at_ms: i64) -> String {
    Query::insert()
        .into_table(SeenSlots::Table)
        .columns([
            SeenSlots::Identifier,
            SeenSlots::StartTime,
            SeenSlots::EndTime,
            SeenSlots::Instructor,
            SeenSlots::Notified,
            SeenSlots::FirstSeenAt,
        ])
        .values_panic([
            record.identifier.as_str().into(),
            record.start_time.to_string().into(),
            record.end_time.to_string().into(),
            record.instructor.as_str().into(),
            0i32.into(),
            first_seen_at_ms.into(),
        ])
        .on_conflict(
            OnConflict::column(SeenSlots::Identifier)
                .do_nothing()
                .to_owned(),
        )
        .to_string(SqliteQueryBuilder)
}

/// SELECT 1 FROM seen_slots WHERE identifier = ? (for existence check)
pub fn exists(identifier: &str) -> String {
    Query::select()
        .expr(Expr::val(1))
        .from(SeenSlots::Table)
        .and_where(Expr::col(SeenSlots::Identifier).eq(identifier))
        .to_string(SqliteQueryBuilder)
}

/// UPDATE seen_slots SET notified = 1 WHERE identifier IN (...)
pub fn mark_notified(identifiers: &[String]) -> String {
    Query::update()
        .table(SeenSlots::Table)
        .value(SeenSlots::Notified, 1i32)
        .and_where(
            Expr::col(SeenSlots::Identifier).is_in(identifiers.iter().map(|id| id.as_str())),
        )
        .to_string(SqliteQueryBuilder)
}

/// SELECT identifier, start_time, end_time, instructor, notified, first_seen_at
/// FROM seen_slots ORDER BY first_seen_at, rowid
pub fn select_all() -> String {
    Query::select()
        .columns([
            SeenSlots::Identifier,
            SeenSlots::StartTime,
            SeenSlots::EndTime,
            SeenSlots::Instructor,
            SeenSlots::Notified,
            SeenSlots::FirstSeenAt,
        ])
        .from(SeenSlots::Table)
        .order_by(SeenSlots::FirstSeenAt, Order::Asc)
        .order_by_expr(Expr::cust("rowid"), Order::Asc)
        .to_string(SqliteQueryBuilder)
}
