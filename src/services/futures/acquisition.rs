//! 数据获取调度
//!
//! 按固定优先级依次尝试多个上游查询方式，采用第一个返回非空表格的结果。
//! 每种方式只尝试一次，失败即换下一种，不做重试

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::models::{DiagnosticReport, MethodDiagnostic, RawTable};

/// 上游查询方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcquisitionMethod {
    /// 新浪期货列表（全市场各品种节点）
    ZhSpotSina,
    /// 新浪实时行情（指定合约）
    ZhSpot,
    /// 新浪主力连续合约日K线
    MainSina,
}

impl AcquisitionMethod {
    /// 尝试顺序
    pub const ALL: [AcquisitionMethod; 3] = [
        AcquisitionMethod::ZhSpotSina,
        AcquisitionMethod::ZhSpot,
        AcquisitionMethod::MainSina,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AcquisitionMethod::ZhSpotSina => "futures_zh_spot_sina",
            AcquisitionMethod::ZhSpot => "futures_zh_spot",
            AcquisitionMethod::MainSina => "futures_main_sina",
        }
    }
}

impl fmt::Display for AcquisitionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 行情数据源
///
/// 调度层只关心「给定查询方式，返回一张表或错误」，
/// 表的列结构随查询方式不同而不同
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch(&self, method: AcquisitionMethod) -> Result<RawTable>;

    /// 单个查询方式的超时时间
    fn method_timeout(&self) -> Duration {
        Duration::from_secs(30)
    }
}

/// 成功获取的数据
#[derive(Debug)]
pub struct Acquired {
    pub table: RawTable,
    pub method: AcquisitionMethod,
}

/// 执行单个查询方式，超时视为失败，空表也视为失败
async fn fetch_non_empty(
    source: &dyn MarketDataSource,
    method: AcquisitionMethod,
) -> Result<RawTable> {
    let timeout = source.method_timeout();
    let table = tokio::time::timeout(timeout, source.fetch(method))
        .await
        .map_err(|_| anyhow!("{} 超时（{:?}）", method, timeout))??;

    if table.is_empty() {
        return Err(anyhow!("{} 返回空数据", method));
    }
    Ok(table)
}

/// 依次尝试所有查询方式，返回第一个非空结果
///
/// 全部失败时返回的错误中汇总了每种方式的失败原因
pub async fn acquire(source: &dyn MarketDataSource) -> Result<Acquired> {
    let mut failures = Vec::new();

    for method in AcquisitionMethod::ALL {
        log::info!("尝试 {} ...", method);
        match fetch_non_empty(source, method).await {
            Ok(table) => {
                log::info!(
                    "{} 获取成功: {} 行, 列: {:?}",
                    method,
                    table.len(),
                    table.columns()
                );
                return Ok(Acquired { table, method });
            }
            Err(e) => {
                log::warn!("{} 失败: {:#}", method, e);
                failures.push(format!("{}: {:#}", method, e));
            }
        }
    }

    Err(anyhow!("所有数据获取方式均失败: {}", failures.join("; ")))
}

/// 逐个执行所有查询方式并汇总诊断信息（不因某一方式成功而停止）
pub async fn diagnose(source: &dyn MarketDataSource) -> DiagnosticReport {
    let mut results = BTreeMap::new();
    let mut successful_methods = Vec::new();

    for method in AcquisitionMethod::ALL {
        log::info!("诊断 {} ...", method);
        let diagnostic = match fetch_non_empty(source, method).await {
            Ok(table) => {
                successful_methods.push(method.name().to_string());
                MethodDiagnostic::succeeded(&table)
            }
            Err(e) => MethodDiagnostic::failed(e.to_string(), Some(format!("{:?}", e))),
        };
        results.insert(method.name().to_string(), diagnostic);
    }

    DiagnosticReport {
        overall_success: !successful_methods.is_empty(),
        successful_methods,
        results,
    }
}
