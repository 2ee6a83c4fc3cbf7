/// Match backup and set archive storage operations.
pub mod match_store;
/// Storage-facing entity definitions.
pub mod models;
/// Storage abstraction layer shared by all backends.
pub mod storage;
