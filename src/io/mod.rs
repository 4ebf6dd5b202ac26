//! Dataset I/O: subject files, anthropometric table, feature names

pub mod anthropometry;
pub mod dataset;
pub mod names;
