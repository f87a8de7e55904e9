//! 新浪期货数据源
//!
//! 提供三种查询方式，参考 akshare/futures/futures_zh_sina.py 实现：
//! - futures_zh_spot_sina：按品种节点拉取全市场合约列表
//! - futures_zh_spot：按合约代码拉取实时行情
//! - futures_main_sina：主力连续合约日K线（取最新一根）
//!
//! 返回的表格保留新浪原有列名，由归一化层统一解析

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Asia::Shanghai;
use futures::stream::{self, StreamExt};
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::config::UpstreamConfig;
use crate::models::{RawRow, RawTable};

use super::acquisition::{AcquisitionMethod, MarketDataSource};
use super::common::{
    BROWSER_USER_AGENT, SINA_FUTURES_LIST_API, SINA_FUTURES_REALTIME_API,
    SINA_FUTURES_SYMBOL_URL, SINA_MAIN_DAILY_API,
};
use super::normalize::to_decimal;

/// 同时进行的品种节点请求数
const NODE_CONCURRENCY: usize = 4;

/// JS 映射文件中的交易所键 -> 交易所代码
const NODE_EXCHANGES: [(&str, &str); 5] = [
    ("czce", "CZCE"),
    ("dce", "DCE"),
    ("shfe", "SHFE"),
    ("cffex", "CFFEX"),
    ("gfex", "GFEX"),
];

/// 新浪品种节点
///
/// 对应 akshare 的 futures_symbol_mark() 返回结果，
/// node 即列表 API 的 node 参数（如 pta_qh、tong_qh）
#[derive(Debug, Clone, PartialEq)]
pub struct SinaNode {
    /// 交易所代码
    pub exchange: &'static str,
    /// 品种名称（如 PTA、铜）
    pub variety: String,
    pub node: String,
}

/// 新浪期货数据源
pub struct SinaSource {
    /// HTTP 客户端（带超时）
    client: Client,
    config: UpstreamConfig,
}

impl SinaSource {
    /// 按配置创建数据源，客户端带请求超时和连接超时
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    // ==================== futures_zh_spot_sina ====================

    /// 获取全部品种节点
    async fn fetch_symbol_nodes(&self) -> Result<Vec<SinaNode>> {
        log::debug!("请求品种映射数据 URL: {}", SINA_FUTURES_SYMBOL_URL);

        let response = self
            .client
            .get(SINA_FUTURES_SYMBOL_URL)
            .header("User-Agent", BROWSER_USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("获取品种映射失败: {}", response.status()));
        }

        let bytes = response.bytes().await?;
        let text = encoding_rs::GBK.decode(&bytes).0.to_string();

        parse_symbol_nodes(&text)
    }

    /// 获取单个品种节点下的全部合约
    async fn fetch_node_rows(&self, node: &SinaNode) -> Result<Vec<RawRow>> {
        let response = self
            .client
            .get(SINA_FUTURES_LIST_API)
            .query(&[
                ("page", "1"),
                ("sort", "position"),
                ("asc", "0"),
                ("node", node.node.as_str()),
                ("base", "futures"),
            ])
            .header("User-Agent", BROWSER_USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("获取期货列表失败: {}", response.status()));
        }

        let text = response.text().await?;
        parse_list_rows(&text, node.exchange)
    }

    async fn futures_zh_spot_sina(&self) -> Result<RawTable> {
        let mut nodes = self.fetch_symbol_nodes().await?;
        if self.config.max_nodes > 0 {
            nodes.truncate(self.config.max_nodes);
        }
        log::info!("共 {} 个品种节点", nodes.len());

        let results: Vec<(SinaNode, Result<Vec<RawRow>>)> = stream::iter(nodes)
            .map(|node| async move {
                let rows = self.fetch_node_rows(&node).await;
                (node, rows)
            })
            .buffered(NODE_CONCURRENCY)
            .collect()
            .await;

        let mut table = RawTable::new();
        for (node, result) in results {
            match result {
                Ok(rows) => rows.into_iter().for_each(|row| table.push(row)),
                Err(e) => log::warn!("获取品种 {} 数据失败: {}", node.variety, e),
            }
        }
        Ok(table)
    }

    // ==================== futures_zh_spot ====================

    async fn futures_zh_spot(&self) -> Result<RawTable> {
        if self.config.spot_symbols.is_empty() {
            return Err(anyhow!("未配置实时行情合约列表"));
        }

        let list = self
            .config
            .spot_symbols
            .iter()
            .map(|s| format!("nf_{}", s.to_uppercase()))
            .collect::<Vec<_>>()
            .join(",");
        let url = format!(
            "{}/rn={}&list={}",
            SINA_FUTURES_REALTIME_API,
            generate_random_code(),
            list
        );
        log::debug!("请求实时行情 URL: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "*/*")
            .header("Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8")
            .header("Cache-Control", "no-cache")
            .header("Referer", "https://finance.sina.com.cn/")
            .header("User-Agent", BROWSER_USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("获取实时行情失败: {}", response.status()));
        }

        let bytes = response.bytes().await?;
        let text = encoding_rs::GBK.decode(&bytes).0.to_string();

        Ok(parse_realtime_rows(&text).into_iter().collect())
    }

    // ==================== futures_main_sina ====================

    async fn fetch_main_latest(&self, symbol: &str) -> Result<Option<RawRow>> {
        let date_tag = Utc::now()
            .with_timezone(&Shanghai)
            .format("%Y_%m_%d")
            .to_string();
        let url = format!(
            "{}/var%20_{}{}=/InnerFuturesNewService.getDailyKLine?symbol={}&_={}",
            SINA_MAIN_DAILY_API, symbol, date_tag, symbol, date_tag
        );
        log::debug!("请求主力连续日K线 URL: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Referer", "https://finance.sina.com.cn/")
            .header("User-Agent", BROWSER_USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("获取主力连续数据失败: {}", response.status()));
        }

        let text = response.text().await?;
        parse_main_latest(&text, symbol)
    }

    async fn futures_main_sina(&self) -> Result<RawTable> {
        let mut table = RawTable::new();
        for symbol in &self.config.main_symbols {
            match self.fetch_main_latest(symbol).await {
                Ok(Some(row)) => table.push(row),
                Ok(None) => log::warn!("{} 主力连续无数据", symbol),
                Err(e) => log::warn!("获取 {} 主力连续数据失败: {}", symbol, e),
            }
        }
        Ok(table)
    }
}

#[async_trait]
impl MarketDataSource for SinaSource {
    async fn fetch(&self, method: AcquisitionMethod) -> Result<RawTable> {
        match method {
            AcquisitionMethod::ZhSpotSina => self.futures_zh_spot_sina().await,
            AcquisitionMethod::ZhSpot => self.futures_zh_spot().await,
            AcquisitionMethod::MainSina => self.futures_main_sina().await,
        }
    }

    fn method_timeout(&self) -> Duration {
        Duration::from_secs(self.config.method_timeout_secs)
    }
}

// ==================== 解析函数 ====================

/// 生成随机数（模拟新浪的rn参数）
fn generate_random_code() -> String {
    format!("{:x}", Utc::now().timestamp_millis() % 0x7FFF_FFFF)
}

/// 解析新浪 JS 文件中的品种节点
///
/// 文件形如 `ARRFUTURESNODES = { czce: ['郑州商品交易所', ['PTA', 'pta_qh', '16'], ...], dce: [...] };`，
/// 各交易所的数组按出现位置切分，避免把后一个交易所的品种计入前一个
pub fn parse_symbol_nodes(js_text: &str) -> Result<Vec<SinaNode>> {
    let start = js_text
        .find("ARRFUTURESNODES = {")
        .ok_or_else(|| anyhow!("无法解析品种映射JS数据"))?;
    let end = js_text[start..]
        .find("};")
        .map(|offset| start + offset + 2)
        .ok_or_else(|| anyhow!("无法解析品种映射JS数据"))?;
    let content = &js_text[start..end];

    let mut sections = Vec::new();
    for (key, exchange) in NODE_EXCHANGES {
        let re = Regex::new(&format!(r"\b{}\s*:\s*\[", key))?;
        if let Some(m) = re.find(content) {
            sections.push((m.start(), m.end(), exchange));
        }
    }
    sections.sort_by_key(|(begin, _, _)| *begin);

    let item_re = Regex::new(r"\['([^']+)',\s*'([^']+)',\s*'[^']*'")?;
    let mut nodes = Vec::new();

    for (i, (_, body_start, exchange)) in sections.iter().enumerate() {
        let body_end = sections
            .get(i + 1)
            .map(|(next_begin, _, _)| *next_begin)
            .unwrap_or(content.len());
        let body = &content[*body_start..body_end];

        for cap in item_re.captures_iter(body) {
            let variety = cap.get(1).map(|m| m.as_str()).unwrap_or("");
            let node = cap.get(2).map(|m| m.as_str()).unwrap_or("");

            if !variety.is_empty() && node.ends_with("_qh") {
                nodes.push(SinaNode {
                    exchange: *exchange,
                    variety: variety.to_string(),
                    node: node.to_string(),
                });
            }
        }
    }

    log::debug!("解析到 {} 个品种节点", nodes.len());
    Ok(nodes)
}

/// 按现价与昨结算价补上涨跌额、涨跌幅列（已有的列不覆盖）
///
/// 新浪列表和实时行情都不带涨跌额，任一价格缺失时不补
fn append_change(row: &mut RawRow, price_column: &str, settle_column: &str) {
    let price = to_decimal(row.get(price_column), 0.0);
    let prev_settlement = to_decimal(row.get(settle_column), 0.0);
    if price <= 0.0 || prev_settlement <= 0.0 {
        return;
    }

    let change = price - prev_settlement;
    if row.get("change").is_none() {
        row.insert("change", change);
    }
    if row.get("changepercent").is_none() {
        row.insert("changepercent", change / prev_settlement * 100.0);
    }
}

/// 解析期货列表 API 返回的 JSON 数组，每个对象成为一行
///
/// 行内没有交易所列时补上节点所属交易所，并由 trade 与 presettlement 算出涨跌额
pub fn parse_list_rows(text: &str, exchange: &str) -> Result<Vec<RawRow>> {
    let json_data: Value =
        serde_json::from_str(text.trim()).map_err(|e| anyhow!("解析JSON失败: {}", e))?;

    let items = match json_data {
        Value::Array(items) => items,
        Value::Null => return Ok(Vec::new()),
        other => return Err(anyhow!("期货列表格式异常: {}", other)),
    };

    let mut rows = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(map) => {
                let mut row = RawRow::from(map);
                if row.get("exchange").is_none() {
                    row.insert("exchange", exchange);
                }
                append_change(&mut row, "trade", "presettlement");
                rows.push(row);
            }
            other => log::warn!("跳过第 {} 项: 不是对象 ({})", index, other),
        }
    }
    Ok(rows)
}

/// 实时行情字段顺序（nf_ 商品期货格式，第 0 项为名称）
const REALTIME_COLUMNS: [&str; 15] = [
    "name",
    "time",
    "open",
    "high",
    "low",
    "last_close",
    "bid_price",
    "ask_price",
    "current_price",
    "avg_price",
    "last_settle_price",
    "buy_vol",
    "sell_vol",
    "hold",
    "volume",
];

/// 解析新浪实时行情文本
///
/// 每条形如 `var hq_str_nf_RB2510="螺纹钢2510,145958,3100,...";`，
/// 空数据和字段不足的条目记录日志后跳过
pub fn parse_realtime_rows(data: &str) -> Vec<RawRow> {
    let mut rows = Vec::new();

    for item in data.split(';') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }

        let Some((head, body)) = item.split_once('=') else {
            continue;
        };
        let code = head
            .rsplit("hq_str_")
            .next()
            .unwrap_or("")
            .trim()
            .trim_start_matches("nf_");
        let body = body.trim().trim_matches('"').trim_matches('\'');
        if body.is_empty() {
            log::warn!("{} 无行情数据", code);
            continue;
        }

        let fields: Vec<&str> = body.split(',').collect();
        if fields.len() < REALTIME_COLUMNS.len() {
            log::warn!(
                "{} 数据字段不足: 期望至少{}个，实际{}个",
                code,
                REALTIME_COLUMNS.len(),
                fields.len()
            );
            continue;
        }

        let mut row = RawRow::new().with("symbol", code);
        for (column, field) in REALTIME_COLUMNS.iter().zip(fields.iter()) {
            row.insert(*column, field.trim());
        }
        append_change(&mut row, "current_price", "last_settle_price");
        rows.push(row);
    }

    rows
}

/// 解析主力连续日K线 JSONP，只取最新一根
///
/// 列名与 akshare 的 futures_main_sina() 一致，另附合约代码列
pub fn parse_main_latest(data: &str, symbol: &str) -> Result<Option<RawRow>> {
    let start = data.find("([");
    let end = data.rfind("])");
    let (Some(start), Some(end)) = (start, end) else {
        return Err(anyhow!("无效的主力连续数据格式"));
    };

    let json_str = &data[start + 1..end + 1];
    let json_data: Value =
        serde_json::from_str(json_str).map_err(|e| anyhow!("解析JSON失败: {}", e))?;

    let latest = json_data
        .as_array()
        .and_then(|bars| bars.iter().rev().find(|bar| bar.is_object()));
    let Some(bar) = latest else {
        return Ok(None);
    };

    let field = |key: &str| bar.get(key).cloned().unwrap_or(Value::Null);
    let row = RawRow::new()
        .with("日期", field("d"))
        .with("开盘价", field("o"))
        .with("最高价", field("h"))
        .with("最低价", field("l"))
        .with("收盘价", field("c"))
        .with("成交量", field("v"))
        .with("持仓量", field("p"))
        .with("动态结算价", field("s"))
        .with("合约", symbol);

    Ok(Some(row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::futures::normalize::normalize_row;
    use chrono::NaiveDate;
    use serde_json::json;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 2).unwrap()
    }

    /// 测试品种节点解析，交易所之间不串位
    #[test]
    fn test_parse_symbol_nodes() {
        let js = r#"var ARRFUTURESNODES = {
            czce: ['郑州商品交易所', ['PTA', 'pta_qh', '16'], ['菜油', 'czy_qh', '16']],
            dce: ['大连商品交易所', ['豆一', 'dou1_qh', '16'], ['连续', 'lianxu', '16']],
            shfe: ['上海期货交易所', ['铜', 'tong_qh', '16']],
            cffex: ['中国金融期货交易所', ['沪深300', 'hs300_qh', '16']]
        };
        var other = {};"#;

        let nodes = parse_symbol_nodes(js).unwrap();
        let pairs: Vec<(&str, &str)> = nodes
            .iter()
            .map(|n| (n.exchange, n.node.as_str()))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("CZCE", "pta_qh"),
                ("CZCE", "czy_qh"),
                ("DCE", "dou1_qh"),
                ("SHFE", "tong_qh"),
                ("CFFEX", "hs300_qh"),
            ]
        );
        assert_eq!(nodes[0].variety, "PTA");
    }

    #[test]
    fn test_parse_symbol_nodes_invalid() {
        assert!(parse_symbol_nodes("var x = 1;").is_err());
    }

    /// 测试解析列表数据
    #[test]
    fn test_parse_list_rows() {
        let text = json!([
            {"symbol": "CU2501", "name": "沪铜2501", "trade": "75150", "position": "50000"},
            "garbage",
            {"symbol": "CU2502", "name": "沪铜2502", "trade": "75200", "exchange": "shfe"}
        ])
        .to_string();

        let rows = parse_list_rows(&text, "SHFE").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("exchange"), Some(&json!("SHFE")));
        assert_eq!(rows[1].get("exchange"), Some(&json!("shfe")));

        let quote = normalize_row(&rows[0], date());
        assert_eq!(quote.symbol, "CU2501");
        assert_eq!(quote.latest_price, 75150.0);
        assert_eq!(quote.open_interest, 50000);
    }

    /// 列表行由 trade 与 presettlement 算出涨跌额，保留上游自带的涨跌幅
    #[test]
    fn test_parse_list_rows_change() {
        let text = json!([
            {"symbol": "CU2501", "trade": "75150", "presettlement": "74950", "changepercent": "0.27"},
            {"symbol": "CU2502", "trade": "0", "presettlement": "74950"}
        ])
        .to_string();

        let rows = parse_list_rows(&text, "SHFE").unwrap();
        assert_eq!(rows[0].get("change"), Some(&json!(200.0)));
        assert_eq!(rows[0].get("changepercent"), Some(&json!("0.27")));
        assert_eq!(rows[1].get("change"), None);

        let quote = normalize_row(&rows[0], date());
        assert_eq!(quote.change, 200.0);
        assert_eq!(quote.change_percent, 0.27);

        let untraded = normalize_row(&rows[1], date());
        assert_eq!(untraded.change, 0.0);
        assert_eq!(untraded.change_percent, 0.0);
    }

    #[test]
    fn test_parse_list_rows_null_and_invalid() {
        assert!(parse_list_rows("null", "DCE").unwrap().is_empty());
        assert!(parse_list_rows("{\"a\": 1}", "DCE").is_err());
        assert!(parse_list_rows("<html>", "DCE").is_err());
    }

    /// 测试解析实时数据
    #[test]
    fn test_parse_realtime_rows() {
        let data = concat!(
            r#"var hq_str_nf_CU2405="铜2405,090000,75000,75500,74800,74900,75100,75200,75150,75100,74950,100,200,50000,100000,0,0";"#,
            "\n",
            r#"var hq_str_nf_XX2405="";"#,
            "\n",
            r#"var hq_str_nf_AL2405="铝2405,090000,19000";"#,
        );

        let rows = parse_realtime_rows(data);
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.get("symbol"), Some(&json!("CU2405")));
        assert_eq!(row.get("name"), Some(&json!("铜2405")));
        assert_eq!(row.get("current_price"), Some(&json!("75150")));

        let quote = normalize_row(row, date());
        assert_eq!(quote.exchange, "SHFE");
        assert_eq!(quote.latest_price, 75150.0);
        assert_eq!(quote.open, 75000.0);
        assert_eq!(quote.settlement, 74950.0);
        assert_eq!(quote.open_interest, 50000);
        assert_eq!(quote.volume, 100000);
        assert_eq!(quote.change, 200.0);
        assert!((quote.change_percent - 200.0 / 74950.0 * 100.0).abs() < 1e-9);
    }

    /// 测试解析主力连续日K线
    #[test]
    fn test_parse_main_latest() {
        let data = r#"var _V02024_12_02=([{"d":"2024-11-29","o":"5100","h":"5150","l":"5080","c":"5120","v":"300000","p":"800000","s":"5110"},{"d":"2024-12-02","o":"5120","h":"5200","l":"5100","c":"5188","v":"350000","p":"810000","s":"5160"}]);"#;

        let row = parse_main_latest(data, "V0").unwrap().unwrap();
        assert_eq!(row.get("日期"), Some(&json!("2024-12-02")));
        assert_eq!(row.get("合约"), Some(&json!("V0")));

        let quote = normalize_row(&row, date());
        assert_eq!(quote.symbol, "V0");
        assert_eq!(quote.exchange, "DCE");
        assert_eq!(quote.latest_price, 5188.0);
        assert_eq!(quote.settlement, 5160.0);
        assert_eq!(quote.open_interest, 810000);
    }

    #[test]
    fn test_parse_main_latest_empty_and_invalid() {
        assert_eq!(parse_main_latest("var _V0=([]);", "V0").unwrap(), None);
        assert!(parse_main_latest("null", "V0").is_err());
    }

    /// 测试随机码生成
    #[test]
    fn test_generate_random_code() {
        let code = generate_random_code();
        assert!(!code.is_empty());
        assert!(code.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
