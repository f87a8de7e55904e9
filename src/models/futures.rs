//! 期货数据模型
//!
//! 定义对前端输出的固定结构：
//! - 归一化后的期货行情记录
//! - 交易所信息

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 归一化后的期货行情
///
/// 无论上游返回何种列结构，前端拿到的都是这一形状，
/// 字段名按前端约定使用 camelCase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuturesQuote {
    /// 合约代码（如 RB2501），无法识别时为空
    pub symbol: String,
    /// 合约名称，缺省时回退为合约代码或「未知品种」
    pub name: String,
    /// 交易所代码：SHFE / DCE / CZCE / CFFEX / INE / GFEX，无法推断时为空
    pub exchange: String,
    /// 最新价
    pub latest_price: f64,
    /// 涨跌额
    pub change: f64,
    /// 涨跌幅（百分比）
    pub change_percent: f64,
    /// 成交量（手）
    pub volume: i64,
    /// 持仓量（手）
    pub open_interest: i64,
    /// 开盘价
    pub open: f64,
    /// 最高价
    pub high: f64,
    /// 最低价
    pub low: f64,
    /// 结算价
    pub settlement: f64,
    /// 交易日期（处理当天的北京时间日期）
    pub trading_date: NaiveDate,
}

/// 交易所信息
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FuturesExchange {
    /// 交易所代码
    pub code: String,
    /// 交易所中文名称
    pub name: String,
    /// 交易所官网
    pub url: String,
}
