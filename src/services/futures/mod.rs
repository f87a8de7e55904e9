//! 期货数据服务
//!
//! 从新浪财经获取国内期货行情，并把各种列结构归一化为统一的行情记录
//!
//! ## 组成
//! - acquisition：按优先级依次尝试多种上游查询方式
//! - sina：新浪期货数据源（列表、实时行情、主力连续）
//! - normalize：字段别名解析、合约代码/交易所推断、数值转换

pub mod acquisition;
mod common;
mod normalize;
mod sina;

pub use acquisition::{acquire, diagnose, Acquired, AcquisitionMethod, MarketDataSource};
pub use common::{get_beijing_date, get_beijing_time, get_exchanges};
pub use normalize::normalize_table;
pub use sina::SinaSource;
