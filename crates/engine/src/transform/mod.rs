pub mod externalize;

pub use externalize::Externalizer;
