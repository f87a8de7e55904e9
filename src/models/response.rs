//! 通用 API 响应模型
//!
//! 主数据接口成功时直接返回数组，这里只定义错误、健康检查和诊断用的结构

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{FuturesExchange, RawRow, RawTable};

/// 错误响应
///
/// 所有失败都以 `success: false` 返回，traceback 为错误的完整原因链
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 恒为 false
    pub success: bool,
    /// 错误摘要
    pub error: String,
    /// 面向调用方的说明
    pub message: String,
    /// 原因链（便于运维排查）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message: message.into(),
            traceback: None,
        }
    }

    pub fn with_traceback(mut self, traceback: impl Into<String>) -> Self {
        self.traceback = Some(traceback.into());
        self
    }
}

/// 健康检查响应
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    /// ISO 8601 时间戳（北京时间）
    pub timestamp: String,
}

/// 交易所列表响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ExchangesResponse {
    pub exchanges: Vec<FuturesExchange>,
}

/// 单个数据获取方式的诊断结果
#[derive(Debug, Serialize)]
pub struct MethodDiagnostic {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    /// 首行数据，值统一转为字符串，缺失值为 null
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_row: Option<RawRow>,
    /// 前三行原始数据
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_3_rows: Option<Vec<RawRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

/// 诊断接口响应
#[derive(Debug, Serialize)]
pub struct DiagnosticReport {
    pub overall_success: bool,
    pub successful_methods: Vec<String>,
    pub results: BTreeMap<String, MethodDiagnostic>,
}

impl MethodDiagnostic {
    /// 获取成功时的诊断信息
    pub fn succeeded(table: &RawTable) -> Self {
        let sample_row = table.rows().first().map(|first| {
            let mut sample = RawRow::new();
            for column in table.columns() {
                let value = first.get(column).map(sample_value).unwrap_or(Value::Null);
                sample.insert(column.clone(), value);
            }
            sample
        });

        Self {
            success: true,
            row_count: Some(table.len()),
            columns: Some(table.columns().to_vec()),
            sample_row,
            first_3_rows: Some(table.rows().iter().take(3).cloned().collect()),
            error: None,
            traceback: None,
        }
    }

    /// 获取失败（或返回空表）时的诊断信息
    pub fn failed(error: impl Into<String>, traceback: Option<String>) -> Self {
        Self {
            success: false,
            row_count: None,
            columns: None,
            sample_row: None,
            first_3_rows: None,
            error: Some(error.into()),
            traceback,
        }
    }
}

/// 首行样本中的取值：缺失值为 null，其余转为字符串
fn sample_value(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::String(s) if s.eq_ignore_ascii_case("nan") => Value::Null,
        Value::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    }
}
