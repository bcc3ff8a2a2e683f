pub mod parsers;
pub mod queue;
pub mod slack;
pub mod storage;
