/// Read-through caching for an async computation.
///
/// Looks `$key` up in `$cache`; on a hit the cached value is returned. On a
/// miss the future `$block` is awaited, its value is queued for a background
/// write with `$ttl` seconds to live, and returned. A failing cache read is
/// logged and treated as a miss so Redis outages only cost latency.
///
/// Evaluates to `AppResult<T>`; `$block` must resolve to `AppResult<T>`.
///
/// # Example
/// ```rust,ignore
/// let detail: MovieDetail = cached!(cache, CacheKey::MovieDetail(id), ttl, async {
///     load_movie_detail(&pool, id).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        let hit = match $cache.get_from_cache(&key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Cache read failed, computing value");
                None
            }
        };
        match hit {
            Some(value) => Ok(value),
            None => match $block.await {
                Ok(value) => {
                    $cache.set_in_background(&key, &value, $ttl);
                    Ok(value)
                }
                Err(e) => Err(e),
            },
        }
    }};
}
