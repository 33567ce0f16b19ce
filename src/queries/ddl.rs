use sea_query::{ColumnDef, Index, SqliteQueryBuilder, Table};

use crate::schema::SeenSlots;

/// CREATE TABLE IF NOT EXISTS seen_slots (
///     identifier TEXT PRIMARY KEY,
///     start_time TEXT NOT NULL,
///     end_time TEXT NOT NULL,
///     instructor TEXT NOT NULL,
///     notified INTEGER NOT NULL DEFAULT 0,
///     first_seen_at INTEGER NOT NULL
/// )
pub fn create_seen_slots_table() -> String {
    Table::create()
        .table(SeenSlots::Table)
        .if_not_exists()
        .col(ColumnDef::new(SeenSlots::Identifier).string().primary_key())
        .col(ColumnDef::new(SeenSlots::StartTime).string().not_null())
        .col(ColumnDef::new(SeenSlots::EndTime).string().not_null())
        .col(ColumnDef::new(SeenSlots::Instructor).string().not_null())
        .col(
            ColumnDef::new(SeenSlots::Notified)
                .integer()
                .not_null()
                .default(0),
        )
        .col(
            ColumnDef::new(SeenSlots::FirstSeenAt)
                .big_integer()
                .not_null(),
        )
        .to_string(SqliteQueryBuilder)
}

/// CREATE INDEX IF NOT EXISTS idx_seen_slots_first_seen ON seen_slots(first_seen_at)
pub fn create_seen_slots_first_seen_index() -> String {
    Index::create()
        .if_not_exists()
        .name("idx_seen_slots_first_seen")
        .table(SeenSlots::Table)
        .col(SeenSlots::FirstSeenAt)
        .to_string(SqliteQueryBuilder)
}
