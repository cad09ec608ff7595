use pricefeed_core::time::format_timestamp;

/// Wall-clock time of a poll, in the layout both tables store.
///
/// Every row written by one poll carries the same stamp.
pub fn poll_timestamp() -> String {
    format_timestamp(&chrono::Local::now().naive_local())
}
