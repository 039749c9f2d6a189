mod fetch;
mod offline;

pub use fetch::BlockFetcher;
pub use offline::OfflineExchange;

#[cfg(test)]
mod tests;
