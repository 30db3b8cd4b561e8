use chrono::Utc;

/// Current wall-clock time as seconds since the Unix epoch, the unit
/// `Block::timestamp` is specified in. Uses `chrono`, matching the
/// teacher's timestamp handling throughout `Blockchain`/the peer handler,
/// rather than hand-rolling `SystemTime` arithmetic.
pub fn now_secs() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

#[cfg(test)]
mod tests;
