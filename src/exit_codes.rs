//! Exit code constants for the trawl CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid state)
//! - 2: Crawl dispatch failure
//! - 4: Lock failure (persistence could not be verified, or OS lock errors)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid state, or unknown category.
pub const USER_ERROR: i32 = 1;

/// Crawl dispatch failure outside of individual task failures.
pub const CRAWL_FAILURE: i32 = 2;

/// Lock failure: OS-level lock error or unverifiable lock record.
pub const LOCK_FAILURE: i32 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [SUCCESS, USER_ERROR, CRAWL_FAILURE, LOCK_FAILURE];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }
}
