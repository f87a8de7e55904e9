//! 业务逻辑服务模块
//!
//! 封装数据获取和处理逻辑

pub mod futures; // 期货数据服务
