//! 行情数据归一化
//!
//! 上游各数据源返回的列名不固定（中文名、英文名、缩写混用，且随接口版本变化），
//! 这里把任意一行原始数据映射为固定结构的 [`FuturesQuote`]：
//! - 字段解析：按别名列表依次查找，先精确匹配再忽略大小写匹配
//! - 合约代码：别名查找失败时按列顺序扫描「字母+数字」形状的值
//! - 交易所：无显式列时按合约代码的字母前缀推断
//! - 数值转换：容忍千分位逗号（含全角）、空白、占位符 "-"

use chrono::NaiveDate;
use serde_json::Value;

use crate::models::{FuturesQuote, RawRow, RawTable};

use super::common::extract_variety;

// ==================== 字段别名 ====================

const SYMBOL_ALIASES: &[&str] = &[
    "品种代码", "合约代码", "symbol", "代码", "code", "contract", "合约",
    "symbol_code", "variety", "品种", "variety_code", "contract_code",
];
const NAME_ALIASES: &[&str] = &[
    "品种名称", "合约名称", "name", "名称", "variety", "品种", "contract_name",
    "商品名称", "商品", "variety_name", "variety_name_cn",
];
const EXCHANGE_ALIASES: &[&str] = &["exchange", "交易所", "exchange_code", "交易所代码"];
const LATEST_PRICE_ALIASES: &[&str] = &[
    "最新价", "latest_price", "现价", "current_price", "current", "price", "最新",
    "trade", "收盘价",
];
const CHANGE_ALIASES: &[&str] = &["涨跌", "change", "涨跌额", "change_amount", "涨跌(元)"];
const CHANGE_PERCENT_ALIASES: &[&str] = &[
    "涨跌幅", "change_percent", "涨跌%", "pct_chg", "change_pct", "涨跌幅(%)",
    "changepercent",
];
const VOLUME_ALIASES: &[&str] = &["成交量", "volume", "成交", "vol", "成交量手", "成交量(手)"];
const OPEN_INTEREST_ALIASES: &[&str] = &[
    "持仓量", "open_interest", "持仓", "oi", "持仓手", "持仓量(手)", "position", "hold",
];
const OPEN_ALIASES: &[&str] = &["开盘价", "open", "今开", "open_price", "开盘"];
const HIGH_ALIASES: &[&str] = &["最高价", "high", "最高", "high_price"];
const LOW_ALIASES: &[&str] = &["最低价", "low", "最低", "low_price"];
const SETTLEMENT_ALIASES: &[&str] = &[
    "结算价", "settlement", "昨结", "昨结算", "pre_settlement", "pre_settle",
    "动态结算价", "last_settle_price", "presettlement",
];

/// 扫描合约代码时跳过的数值列
const NUMERIC_COLUMNS: &[&str] = &[
    "最新价", "涨跌", "涨跌幅", "开盘价", "最高价", "最低价", "成交量", "持仓量", "结算价",
    "latest_price", "change", "change_percent", "open", "high", "low", "volume",
    "open_interest", "settlement",
];

/// 名称和代码都缺失时的占位名称
pub const UNKNOWN_NAME: &str = "未知品种";

// ==================== 交易所前缀表 ====================

/// 品种前缀 -> 交易所，按顺序匹配，先中的生效
///
/// 金融期货排在最前：T、TS、TF 等单字母/短前缀若放在后面会与商品品种混淆。
/// NR 同时出现在 INE 与 SHFE，以先出现者为准
const EXCHANGE_PREFIXES: &[(&str, &[&str])] = &[
    ("CFFEX", &["IF", "IC", "IH", "IM", "TS", "TF", "T", "TL"]),
    ("INE", &["SC", "NR", "LU", "BC", "EC"]),
    ("GFEX", &["SI", "LC", "PS"]),
    (
        "SHFE",
        &[
            "RB", "HC", "CU", "AL", "ZN", "PB", "NI", "SN", "AU", "AG", "BU", "RU", "FU",
            "SP", "NR", "SS", "AO", "BR", "WR",
        ],
    ),
    (
        "DCE",
        &[
            "C", "CS", "A", "B", "M", "Y", "P", "L", "V", "PP", "J", "JM", "I", "JD", "FB",
            "BB", "PG", "LH", "EB", "EG", "LG",
        ],
    ),
    (
        "CZCE",
        &[
            "CF", "CY", "SR", "TA", "OI", "MA", "FG", "RS", "RM", "ZC", "JR", "LR", "PM",
            "WH", "RI", "SF", "SM", "UR", "SA", "PF", "PK", "AP", "CJ", "SH", "PX", "PR",
        ],
    ),
];

// ==================== 字段解析 ====================

/// 判断原始值是否可用：非 null、非空串、非 "nan" 缺失标记
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty() && !s.eq_ignore_ascii_case("nan"),
        _ => true,
    }
}

/// 按别名列表查找字段值
///
/// 每个候选名先精确匹配，再忽略大小写遍历整行匹配；
/// 只接受可用的值，全部落空时返回 None，由调用方决定默认值
pub fn resolve_field<'a>(row: &'a RawRow, aliases: &[&str]) -> Option<&'a Value> {
    for alias in aliases {
        if let Some(value) = row.get(alias).filter(|v| is_present(v)) {
            return Some(value);
        }

        let lowered = alias.to_lowercase();
        let found = row
            .iter()
            .find(|(column, value)| column.to_lowercase() == lowered && is_present(value))
            .map(|(_, value)| value);
        if found.is_some() {
            return found;
        }
    }
    None
}

/// 原始值转文本，null 视为空串
fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 按别名解析文本字段，去掉首尾空白，找不到时返回 default
pub fn resolve_text(row: &RawRow, aliases: &[&str], default: &str) -> String {
    resolve_field(row, aliases)
        .map(value_text)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .to_string()
}

/// 别名解析不到合约代码时，按列顺序找第一个「像合约代码」的值
///
/// 跳过位置索引列、日期（以 "20" 开头）以及已知的数值列，
/// 要求值里同时含有字母和数字，如 RB2501。
/// 这是尽力而为的启发式：形状恰好相似的其他列也会被当作代码
pub fn scan_symbol(row: &RawRow) -> Option<String> {
    row.iter().find_map(|(column, value)| {
        let is_index = column.len() == 1 && column.chars().all(|c| c.is_ascii_digit());
        if is_index || NUMERIC_COLUMNS.contains(&column.as_str()) {
            return None;
        }

        let text = value_text(value);
        let text = text.trim();
        if text.is_empty() || text.starts_with("20") {
            return None;
        }

        let has_alpha = text.chars().any(|c| c.is_alphabetic());
        let has_digit = text.chars().any(|c| c.is_ascii_digit());
        (has_alpha && has_digit).then(|| text.to_string())
    })
}

/// 根据合约代码的字母前缀推断交易所
pub fn infer_exchange(symbol: &str) -> Option<&'static str> {
    let variety = extract_variety(symbol);
    if variety.is_empty() {
        return None;
    }

    EXCHANGE_PREFIXES
        .iter()
        .find(|(_, prefixes)| prefixes.contains(&variety.as_str()))
        .map(|(exchange, _)| *exchange)
}

// ==================== 数值转换 ====================

/// 清理千分位、空白和占位符后解析为浮点数
fn parse_decimal_text(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, ',' | '，' | ' '))
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

fn decimal_of(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_decimal_text(s),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// 转为浮点数，缺失或无法解析时返回 default
pub fn to_decimal(value: Option<&Value>, default: f64) -> f64 {
    decimal_of(value).unwrap_or(default)
}

/// 转为整数，先按浮点解析再向零截断（"1,234.0" -> 1234），失败时返回 default
pub fn to_integer(value: Option<&Value>, default: i64) -> i64 {
    if let Some(Value::Number(n)) = value {
        if let Some(i) = n.as_i64() {
            return i;
        }
    }
    decimal_of(value).map(|v| v.trunc() as i64).unwrap_or(default)
}

// ==================== 记录组装 ====================

/// 把一行原始数据映射为行情记录
///
/// 交易日期不取自上游，统一使用调用方传入的处理日期
pub fn normalize_row(row: &RawRow, trading_date: NaiveDate) -> FuturesQuote {
    let mut symbol = resolve_text(row, SYMBOL_ALIASES, "");
    if symbol.is_empty() {
        symbol = scan_symbol(row).unwrap_or_default();
    }

    let mut name = resolve_text(row, NAME_ALIASES, "");
    if name.is_empty() {
        name = if symbol.is_empty() {
            UNKNOWN_NAME.to_string()
        } else {
            symbol.clone()
        };
    }

    let mut exchange = resolve_text(row, EXCHANGE_ALIASES, "");
    if exchange.is_empty() {
        exchange = infer_exchange(&symbol).unwrap_or_default().to_string();
    }

    let latest_price = to_decimal(resolve_field(row, LATEST_PRICE_ALIASES), 0.0);
    let price_default = if latest_price > 0.0 { latest_price } else { 0.0 };

    FuturesQuote {
        symbol,
        name,
        exchange,
        latest_price,
        change: to_decimal(resolve_field(row, CHANGE_ALIASES), 0.0),
        change_percent: to_decimal(resolve_field(row, CHANGE_PERCENT_ALIASES), 0.0),
        volume: to_integer(resolve_field(row, VOLUME_ALIASES), 0),
        open_interest: to_integer(resolve_field(row, OPEN_INTEREST_ALIASES), 0),
        open: to_decimal(resolve_field(row, OPEN_ALIASES), price_default),
        high: to_decimal(resolve_field(row, HIGH_ALIASES), price_default),
        low: to_decimal(resolve_field(row, LOW_ALIASES), price_default),
        settlement: to_decimal(resolve_field(row, SETTLEMENT_ALIASES), price_default),
        trading_date,
    }
}

/// 归一化整张表，丢弃代码和名称都为空的行
pub fn normalize_table(table: &RawTable, trading_date: NaiveDate) -> Vec<FuturesQuote> {
    if let Some(first) = table.rows().first() {
        log::debug!(
            "首行样本: 共 {} 列 {:?}",
            table.columns().len(),
            table.columns()
        );
        for (column, value) in first.iter().take(10) {
            log::debug!("  '{}': {}", column, value);
        }
        if first.len() > 10 {
            log::debug!("  ... 以及另外 {} 列", first.len() - 10);
        }
    }

    let mut quotes = Vec::with_capacity(table.len());
    for (index, row) in table.rows().iter().enumerate() {
        let quote = normalize_row(row, trading_date);
        if quote.symbol.is_empty() && quote.name.is_empty() {
            if index < 3 {
                log::warn!("跳过第 {} 行: 无法识别合约代码或名称", index);
            }
            continue;
        }
        quotes.push(quote);
    }
    quotes
}
