pub mod fetcher;
pub mod notifier;
pub mod repo;
pub mod socket;
