pub mod ddl;
pub mod seen_slots;
