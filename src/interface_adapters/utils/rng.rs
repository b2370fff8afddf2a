use std::sync::{
    OnceLock,
    atomic::{AtomicU64, Ordering},
};
use std::time::{SystemTime, UNIX_EPOCH};

/// Process-unique, monotonically increasing connection id for log
/// correlation. Seeding the counter from the clock keeps ids distinct across
/// process restarts.
pub fn conn_id() -> u64 {
    static COUNTER: OnceLock<AtomicU64> = OnceLock::new();
    let counter = COUNTER.get_or_init(|| {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        AtomicU64::new(seed)
    });
    counter.fetch_add(1, Ordering::Relaxed)
}
