//! 公共常量和辅助函数

use chrono::{NaiveDate, Utc};
use chrono_tz::Asia::Shanghai;

use crate::models::FuturesExchange;

// ==================== 新浪期货 API 常量 ====================

/// 新浪期货实时行情 API
pub const SINA_FUTURES_REALTIME_API: &str = "https://hq.sinajs.cn";
/// 新浪期货列表 API
pub const SINA_FUTURES_LIST_API: &str = "https://vip.stock.finance.sina.com.cn/quotes_service/api/json_v2.php/Market_Center.getHQFuturesData";
/// 新浪期货品种映射 JS 文件
pub const SINA_FUTURES_SYMBOL_URL: &str =
    "https://vip.stock.finance.sina.com.cn/quotes_service/view/js/qihuohangqing.js";
/// 新浪主力连续合约日K线API
pub const SINA_MAIN_DAILY_API: &str = "https://stock2.finance.sina.com.cn/futures/api/jsonp.php";

/// 浏览器 UA，新浪接口会拒绝缺省 UA
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/97.0.4692.71 Safari/537.36";

// ==================== 交易所 ====================

/// 交易所静态信息：代码、中文名称、官网
const EXCHANGES: [(&str, &str, &str); 6] = [
    ("SHFE", "上海期货交易所", "https://www.shfe.com.cn"),
    ("DCE", "大连商品交易所", "http://www.dce.com.cn"),
    ("CZCE", "郑州商品交易所", "http://www.czce.com.cn"),
    ("CFFEX", "中国金融期货交易所", "http://www.cffex.com.cn"),
    ("INE", "上海国际能源交易中心", "https://www.ine.cn"),
    ("GFEX", "广州期货交易所", "http://www.gfex.com.cn"),
];

/// 获取支持的交易所列表
pub fn get_exchanges() -> Vec<FuturesExchange> {
    EXCHANGES
        .iter()
        .map(|(code, name, url)| FuturesExchange {
            code: code.to_string(),
            name: name.to_string(),
            url: url.to_string(),
        })
        .collect()
}

/// 获取北京时间字符串（ISO 8601 格式，带+08:00时区）
pub fn get_beijing_time() -> String {
    Utc::now().with_timezone(&Shanghai).to_rfc3339()
}

/// 北京时间的当天日期，作为行情记录的交易日期
pub fn get_beijing_date() -> NaiveDate {
    Utc::now().with_timezone(&Shanghai).date_naive()
}

/// 从合约代码中提取开头的字母部分（品种代码），统一大写
///
/// 例如 `rb2501` -> `RB`，`TA501` -> `TA`
pub fn extract_variety(symbol: &str) -> String {
    symbol
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_uppercase()
}
