//! Generic element tree underneath the WordprocessingML model.
//!
//! The document model never stores formatting in Rust structs; it reads and
//! writes elements of this tree through [`PropertyStore`].

pub mod reader;
mod store;
mod tree;
pub mod writer;

pub use store::PropertyStore;
pub use tree::{NodeId, XmlTree};
