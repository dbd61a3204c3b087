#![forbid(unsafe_code)]

mod error;
pub mod aggregate;
pub mod excel;
pub mod formatting;
pub mod model;
pub mod read;
pub mod report;

pub use error::ChemvizError;
