//! WordprocessingML document model.
//!
//! [`Document`] owns the element tree. Everything else in this module is a
//! lightweight `Copy` handle that is resolved against the document on every
//! call, so a handle whose element was removed reads as empty instead of
//! pointing at unrelated content.

mod document;
mod frame;
mod outline;
mod paragraph;
mod run;
pub(crate) mod schema;
mod section;
pub mod table;

pub use document::Document;
pub use frame::{FrameAnchor, FrameWrapping, HorizontalPosition, TextFrame, VerticalPosition};
pub use outline::{DocumentOutline, JsonFormat, SectionOutline, TableOutline};
pub use paragraph::{Alignment, Paragraph, ParagraphKind};
pub use run::{FontStyle, Run};
pub use section::{Orientation, PageMargins, PageNumberFormat, Section, SectionProperties};
pub use table::{
    BorderEdge, BorderStyle, CellAlignment, Side, Table, TableAlignment, TableCell, TableWidth,
};
