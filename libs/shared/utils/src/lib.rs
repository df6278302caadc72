pub mod cancellation;
pub mod test_utils;

pub use cancellation::CancellationToken;
