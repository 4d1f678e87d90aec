//! Data module - input decoding (CSV, XLSX, JSON)

mod loader;
mod xlsx;

pub use loader::{
    DataFormat, DataLoader, InputSource, LoaderError, SAMPLE_CSV, SAMPLE_SOURCE_NAME,
};
pub use xlsx::XlsxError;
