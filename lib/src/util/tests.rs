use crate::util::now_secs;

#[test]
fn now_secs_is_plausibly_recent() {
    let secs = now_secs();
    // Anything after 2023-01-01T00:00:00Z; guards against an obviously
    // broken clock source without pinning an exact value.
    assert!(secs > 1_672_531_200);
}
