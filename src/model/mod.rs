//! 定义了匹配流程所使用的数据模型。

pub mod stats;
pub mod strategy;
pub mod track;
