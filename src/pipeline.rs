use log::{debug, warn};

use crate::slot::{RawSlot, SlotRecord};
use crate::store::{SlotStore, StoreUnavailableError};
use crate::time_rule::{accepts, ThresholdConfig};

/// Filter a raw batch down to slots that pass the time rule and were never seen
///
/// Accepted records are committed to the store as they are found, so a second call
/// with the same batch returns nothing. Output keeps input order; for duplicate
/// identifiers within the batch the first occurrence wins.
///
/// A record with malformed day or times is logged and skipped. A store failure
/// aborts the batch: rows inserted before the failure stay committed and the
/// error is returned instead of a partial list.
pub fn process<S: SlotStore + ?Sized>(
    raw_records: &[RawSlot],
    thresholds: &ThresholdConfig,
    store: &S,
) -> Result<Vec<SlotRecord>, StoreUnavailableError> {
    let mut accepted = Vec::new();

    for raw in raw_records {
        let record = match raw.parse() {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    "Skipping slot '{}' (day={:?}, start={:?}, end={:?}): {}",
                    raw.identifier, raw.day, raw.start_time, raw.end_time, e
                );
                continue;
            }
        };

        if !accepts(record.day, record.start_time, thresholds) {
            debug!(
                "Rejected '{}': {} start {} is before {}",
                record.identifier,
                record.day,
                record.start_time,
                thresholds.for_day(record.day)
            );
            continue;
        }

        if !store.insert_if_absent(&record)? {
            debug!("Already seen '{}'", record.identifier);
            continue;
        }

        accepted.push(record);
    }

    Ok(accepted)
}
