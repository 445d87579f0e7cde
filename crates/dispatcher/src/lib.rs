//! 抓取任务派发
//!
//! 从注册表选出负载最低的健康节点，经健康缓存确认后转发任务，
//! 并把Worker的响应写回任务状态。

pub mod forwarder;
pub mod health_cache;
pub mod orchestrator;
pub mod strategies;

pub use forwarder::*;
pub use health_cache::*;
pub use orchestrator::*;
pub use strategies::*;
