pub mod error;
pub mod page_source;
pub mod paged_fetcher;
pub mod retry;

#[cfg(test)]
pub(crate) mod stub;
