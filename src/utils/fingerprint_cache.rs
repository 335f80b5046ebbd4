use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

/// true  => tag is TAKEN by an active employee
/// false => tag is AVAILABLE (usually we store only taken)
pub static FINGERPRINT_CACHE: Lazy<Cache<String, bool>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(500_000) // tune based on memory
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

/// Mark a single tag as taken
pub async fn mark_taken(tag: &str) {
    FINGERPRINT_CACHE
        .insert(tag.trim().to_uppercase(), true)
        .await;
}

/// Forget a tag (on archive, so the tag becomes assignable again)
pub async fn invalidate(tag: &str) {
    FINGERPRINT_CACHE.invalidate(&tag.trim().to_uppercase()).await;
}

/// Check if a tag is taken
pub async fn is_taken(tag: &str) -> bool {
    FINGERPRINT_CACHE
        .get(&tag.trim().to_uppercase())
        .await
        .unwrap_or(false)
}

/// Batch mark tags as taken
async fn batch_mark(tags: &[String]) {
    let futures: Vec<_> = tags
        .iter()
        .map(|t| FINGERPRINT_CACHE.insert(t.trim().to_uppercase(), true))
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}

/// Load the active directory's tags into the in-memory cache (batched)
pub async fn warmup_fingerprint_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, (String,)>(
        "SELECT fingerprint_id FROM employees WHERE fingerprint_id IS NOT NULL",
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        let (tag,) = row?;
        batch.push(tag);
        total_count += 1;

        if batch.len() >= batch_size {
            batch_mark(&batch).await;
            batch.clear();
        }
    }

    // Insert any remaining tags
    if !batch.is_empty() {
        batch_mark(&batch).await;
    }

    log::info!(
        "Fingerprint cache warmup complete: {} active tags",
        total_count
    );

    Ok(())
}
