/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a Snowflake-style i64 for use as resource ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: random start, then a per-process sequence
///
/// IDs are strictly increasing within a process: when the clock has not
/// advanced past the last issued ID, the next one is `last + 1`.
pub fn snowflake_id() -> i64 {
    use rand::Rng;
    use std::sync::atomic::{AtomicI64, Ordering};

    // Custom epoch: 2024-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_704_067_200_000;
    static LAST_ID: AtomicI64 = AtomicI64::new(0);

    let ts = (now_millis() - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let rand_bits: i64 = rand::thread_rng().gen_range(0..0x1000); // 12 bits
    let candidate = (ts << 12) | rand_bits;

    let next = |last: i64| candidate.max(last + 1);
    match LAST_ID.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(next(last))) {
        Ok(last) | Err(last) => next(last),
    }
}

/// Build a URL slug from a display name.
///
/// Lowercases ASCII letters, keeps digits, collapses every other run of
/// characters into a single `-`, and trims dashes at both ends.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_alphanumeric() {
            // 非 ASCII 字符原样保留
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Human-readable document number: `{prefix}-{yyyymmdd}-{4 random digits}`.
///
/// Used for order numbers (`ORD`), purchase references (`PUR`) and POS
/// invoices (`INV`). Uniqueness is enforced by the database.
pub fn document_number(prefix: &str, now_ms: i64) -> String {
    use rand::Rng;
    let date = chrono::DateTime::from_timestamp_millis(now_ms)
        .unwrap_or_default()
        .format("%Y%m%d");
    let suffix: u32 = rand::thread_rng().gen_range(0..10_000);
    format!("{prefix}-{date}-{suffix:04}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snowflake_is_positive_and_safe_for_js() {
        let id = snowflake_id();
        assert!(id > 0);
        assert!(id < (1_i64 << 53));
    }

    #[test]
    fn test_snowflake_ids_unique_in_tight_loop() {
        let ids: Vec<i64> = (0..10_000).map(|_| snowflake_id()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_snowflake_ids_unique_across_threads() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| (0..1_000).map(|_| snowflake_id()).collect::<Vec<_>>()))
            .collect();
        let mut unique = std::collections::HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(unique.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(unique.len(), 8_000);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Summer T-Shirt"), "summer-t-shirt");
        assert_eq!(slugify("  Men's   Shoes!! "), "men-s-shoes");
        assert_eq!(slugify("4K TV (55\")"), "4k-tv-55");
        assert_eq!(slugify("---"), "");
        assert_eq!(slugify("Café Latte"), "café-latte");
    }

    #[test]
    fn test_document_number_format() {
        // 2024-03-05 12:00:00 UTC
        let n = document_number("ORD", 1_709_640_000_000);
        assert!(n.starts_with("ORD-20240305-"));
        assert_eq!(n.len(), "ORD-20240305-0000".len());
    }
}
