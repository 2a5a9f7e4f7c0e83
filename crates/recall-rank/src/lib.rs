#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod diversify;
pub mod fuse;
pub mod pipeline;

pub use diversify::{diversify, RankedCandidate};
pub use fuse::HybridRanker;
pub use pipeline::{SearchOptions, SearchPipeline};
