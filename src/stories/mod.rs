pub mod completion;
pub mod rewrite;
pub mod scan;
