pub mod cli;
pub mod counter;
pub mod error;
pub mod export;
pub mod git;
pub mod model;
pub mod months;
pub mod pipeline;
pub mod process;
pub mod scan;
pub mod select;
pub mod tree;
pub mod util;
