//! Structural extraction: tree-sitter parse, lowering to a closed sum type,
//! comparison walking, and scanner-kind classification.

pub mod extractor;
pub mod kind;
pub mod tree;

pub use extractor::{StructuralExtractor, DEFAULT_MAPPING_IDENT};
pub use kind::{classify, KindRule, SourceProfile, KIND_RULES};
pub use tree::{lower, parse_module, BoolOp, CompareOp, FilterExpr};
