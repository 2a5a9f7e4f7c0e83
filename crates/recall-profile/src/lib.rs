#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod aggregate;
pub mod log;
pub mod recommend;

pub use aggregate::ProfileAggregator;
pub use log::MemoryInteractionLog;
pub use recommend::{RecommendConfig, RecommendRequest, RecommendationEngine};
