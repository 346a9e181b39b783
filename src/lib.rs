//! Two competing strategies for acquiring multiple mutually exclusive
//! resources from concurrent workers: strict global ordering, deadlock-free
//! by construction, and timeout-guarded unordered acquisition with unbounded
//! immediate retry, which avoids deadlock at the price of livelock risk.
//!
//! The interesting part is the retry protocol in [`retry`]: bounded waits on
//! contended locks, reverse-order release of every partial hold, and an
//! infinite-retry driver that runs an attempt to eventual success. The
//! ordered baseline exists to contrast the two failure modes in tests.

pub mod config;
pub mod harness;
pub mod lock;
pub mod manager;
pub mod options;
pub mod report;
pub mod resource;
pub mod retry;
pub mod worker;

/// Fatal programmer errors: misuse of the in-process API that no retry can
/// recover from, as opposed to the recoverable acquisition outcomes in
/// [`manager::AcquireError`].
#[macro_export]
macro_rules! unrecoverable {
    ($($arg:tt)+) => {
        panic!("unrecoverable: {}", format_args!($($arg)+))
    };
}
