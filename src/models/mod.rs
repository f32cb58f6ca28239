pub mod document;

pub use document::{Description, Document, Product};
