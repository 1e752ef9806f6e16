mod output;

pub use output::{OutputTree, TEMP_SUFFIX};
