use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures::StreamExt;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::sync::RwLock;

/// Expected capacity and false-positive rate.
/// Tune these based on real directory sizes.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;

static FINGERPRINT_FILTER: Lazy<RwLock<CuckooFilter<String>>> =
    Lazy::new(|| RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)));

#[inline]
fn normalize(tag: &str) -> String {
    tag.trim().to_uppercase()
}

/// Check if a fingerprint tag might be taken (false positives possible)
pub fn might_exist(tag: &str) -> bool {
    let tag = normalize(tag);
    FINGERPRINT_FILTER
        .read()
        .expect("fingerprint filter poisoned")
        .contains(&tag)
}

/// Insert a single tag into the filter
pub fn insert(tag: &str) {
    let tag = normalize(tag);
    FINGERPRINT_FILTER
        .write()
        .expect("fingerprint filter poisoned")
        .add(&tag);
}

/// Remove a tag from the filter (on archive)
pub fn remove(tag: &str) {
    let tag = normalize(tag);
    FINGERPRINT_FILTER
        .write()
        .expect("fingerprint filter poisoned")
        .remove(&tag);
}

/// Warm up the fingerprint filter using streaming + batching
pub async fn warmup_fingerprint_filter(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>(
        "SELECT fingerprint_id FROM employees WHERE fingerprint_id IS NOT NULL",
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        let (tag,) = row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;

        batch.push(normalize(&tag));
        total += 1;

        if batch.len() == batch_size {
            insert_batch(&batch);
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch);
    }

    log::info!("Fingerprint filter warmup complete: {} tags", total);
    Ok(())
}

/// Insert a batch of normalized tags
fn insert_batch(tags: &[String]) {
    let mut filter = FINGERPRINT_FILTER
        .write()
        .expect("fingerprint filter poisoned");

    for tag in tags {
        filter.add(tag);
    }
}
