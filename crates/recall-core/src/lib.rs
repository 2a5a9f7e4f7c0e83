#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod cancel;
pub mod config;
pub mod error;
pub mod predicate;
pub mod traits;
pub mod types;
pub mod vector;
