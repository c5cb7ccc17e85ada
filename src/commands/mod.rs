pub mod collect;
pub mod evaluate;
pub mod ingest;
pub mod search;
pub mod status;
