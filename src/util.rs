//! Shared utility functions.

use std::time::Duration;

/// Convert an elapsed duration to a short human-readable string.
///
/// >= 60s -> "Xm Ys", >= 1s -> "X.Ys", otherwise -> "Xms".
pub fn human_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    if millis >= 60_000 {
        format!("{}m {}s", millis / 60_000, (millis % 60_000) / 1000)
    } else if millis >= 1000 {
        format!("{}.{}s", millis / 1000, (millis % 1000) / 100)
    } else {
        format!("{}ms", millis)
    }
}
