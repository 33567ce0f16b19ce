use sea_query::Iden;

/// Seen-set of appointment slots, keyed by the site's identifier
#[derive(Iden)]
pub enum SeenSlots {
    Table,
    Identifier,
    StartTime,
    EndTime,
    Instructor,
    Notified,
    FirstSeenAt,
}
