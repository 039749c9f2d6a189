mod cancellation;
mod core;

pub use cancellation::Context;
pub use core::BackgroundTask;
