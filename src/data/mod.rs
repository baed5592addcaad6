//! Data loading

pub mod loader;

pub use loader::{
    load_candidates, load_historical_records, load_quotes, read_candidates,
    read_historical_records, read_quotes, DataFormat,
};
