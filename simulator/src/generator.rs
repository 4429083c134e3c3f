//! Synthetic heart-rate reading generation.
//!
//! Emits raw wire text directly rather than going through
//! [`heartpulse_core::event::HeartbeatEvent`] — a deliberately malformed or
//! hard-bounds-violating reading could never be *constructed* as a domain
//! value, but the simulator's job is to put exactly that kind of text on
//! the wire so the ingest consumer's quarantine lanes have something to do.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use uuid::Uuid;

/// The `cust_NNNNN` subject pool a run samples from.
#[must_use]
pub fn customer_id_pool(customer_count: u32) -> Vec<String> {
    (1..=customer_count).map(|n| format!("cust_{n:05}")).collect()
}

/// A mostly-plausible resting-to-moderate heart rate, with occasional
/// tachycardic and bradycardic excursions, clamped to the configured soft
/// domain bounds.
fn sample_heart_rate(rng: &mut impl Rng, min: i32, max: i32) -> i32 {
    let mut baseline = rng.gen_range(58..=95);
    if rng.gen_bool(0.08) {
        baseline += rng.gen_range(15..=70);
    }
    if rng.gen_bool(0.03) {
        baseline -= rng.gen_range(10..=20);
    }
    baseline.clamp(min, max)
}

/// One raw wire record, generated fresh each call.
///
/// With probability `invalid_ratio` the `heart_rate` field is set to a
/// value outside even the hard domain bounds (`-5` or `260`), producing
/// text that `heartpulse_core::wire::decode_heartbeat` will reject at
/// construction — the pipeline's deliberate trickle of VALIDATION-classified
/// traffic. With probability 0.05 the timestamp is backdated by 1-8
/// seconds, simulating network jitter/out-of-order delivery.
pub fn next_raw(
    rng: &mut impl Rng,
    customers: &[String],
    invalid_ratio: f64,
    heart_rate_min: i32,
    heart_rate_max: i32,
) -> (String, String) {
    let customer_id = customers
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| "cust_00001".to_string());

    let mut timestamp: DateTime<Utc> = Utc::now();
    if rng.gen_bool(0.05) {
        timestamp -= ChronoDuration::seconds(rng.gen_range(1..=8));
    }

    let heart_rate = if rng.gen_bool(invalid_ratio) {
        *[-5, 260].choose(rng).unwrap_or(&260)
    } else {
        sample_heart_rate(rng, heart_rate_min, heart_rate_max)
    };

    let payload = serde_json::json!({
        "event_id": Uuid::new_v4(),
        "customer_id": customer_id,
        "timestamp": timestamp.to_rfc3339(),
        "heart_rate": heart_rate,
    });

    (customer_id, payload.to_string())
}

/// Whether the burst multiplier applies for a batch starting at `unix_secs`
/// wall-clock seconds (every tenth second, mirroring the original
/// generator's `int(time.time()) % 10 == 0` check).
#[must_use]
pub const fn is_burst_second(unix_secs: i64) -> bool {
    unix_secs % 10 == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn customer_pool_is_zero_padded_and_one_indexed() {
        let pool = customer_id_pool(3);
        assert_eq!(pool, vec!["cust_00001", "cust_00002", "cust_00003"]);
    }

    #[test]
    fn invalid_ratio_of_one_always_produces_out_of_bounds_rate() {
        let mut rng = StdRng::seed_from_u64(42);
        let customers = customer_id_pool(5);
        for _ in 0..20 {
            let (_, raw) = next_raw(&mut rng, &customers, 1.0, 45, 185);
            let value: serde_json::Value = serde_json::from_str(&raw).expect("valid JSON");
            let rate = value["heart_rate"].as_i64().expect("heart_rate is a number");
            assert!(rate == -5 || rate == 260, "expected a hard-bound violation, got {rate}");
        }
    }

    #[test]
    fn invalid_ratio_of_zero_never_produces_out_of_bounds_rate() {
        let mut rng = StdRng::seed_from_u64(7);
        let customers = customer_id_pool(5);
        for _ in 0..50 {
            let (_, raw) = next_raw(&mut rng, &customers, 0.0, 45, 185);
            let value: serde_json::Value = serde_json::from_str(&raw).expect("valid JSON");
            let rate = value["heart_rate"].as_i64().expect("heart_rate is a number");
            assert!((45..=185).contains(&rate), "rate {rate} should stay within soft bounds");
        }
    }

    #[test]
    fn burst_second_fires_every_tenth_second() {
        assert!(is_burst_second(0));
        assert!(is_burst_second(10));
        assert!(!is_burst_second(5));
        assert!(!is_burst_second(9));
    }

    #[test]
    fn generated_record_has_the_four_wire_fields() {
        let mut rng = StdRng::seed_from_u64(1);
        let customers = customer_id_pool(1);
        let (key, raw) = next_raw(&mut rng, &customers, 0.0, 45, 185);
        let value: serde_json::Value = serde_json::from_str(&raw).expect("valid JSON");
        assert_eq!(key, "cust_00001");
        for field in ["event_id", "customer_id", "timestamp", "heart_rate"] {
            assert!(value.get(field).is_some(), "missing field {field}");
        }
    }
}
