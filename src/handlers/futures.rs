//! 期货接口处理器
//!
//! 提供期货数据的 HTTP API 端点
//!
//! ## API 列表
//! - GET /api/futures/cn - 获取国内期货行情（归一化后的数组）
//! - GET /api/futures/cn/exchanges - 获取交易所列表
//! - GET /api/futures/cn/test - 诊断各数据获取方式的返回结构

use actix_web::{web, HttpResponse, Result};

use crate::models::{ErrorResponse, ExchangesResponse};
use crate::services::futures::{
    acquire, diagnose, get_beijing_date, get_exchanges, normalize_table, Acquired,
    MarketDataSource,
};

/// 获取国内期货行情
///
/// GET /api/futures/cn
///
/// 成功时直接返回行情数组；所有数据获取方式都失败时返回 500
pub async fn get_chinese_futures(source: web::Data<dyn MarketDataSource>) -> Result<HttpResponse> {
    log::info!("开始获取期货数据");

    match acquire(source.get_ref()).await {
        Ok(Acquired { table, method }) => {
            let quotes = normalize_table(&table, get_beijing_date());
            log::info!("使用 {} 映射 {} 个期货合约", method, quotes.len());
            Ok(HttpResponse::Ok().json(quotes))
        }
        Err(e) => {
            log::error!("获取期货数据失败: {:#}", e);
            let response = ErrorResponse::new(
                "No data returned from upstream",
                "All acquisition methods failed or returned empty dataset",
            )
            .with_traceback(format!("{:?}", e));
            Ok(HttpResponse::InternalServerError().json(response))
        }
    }
}

/// 获取交易所列表
///
/// GET /api/futures/cn/exchanges
pub async fn get_exchange_list() -> Result<HttpResponse> {
    let response = ExchangesResponse {
        exchanges: get_exchanges(),
    };
    Ok(HttpResponse::Ok().json(response))
}

/// 诊断各数据获取方式
///
/// GET /api/futures/cn/test
///
/// 依次执行所有方式，返回成功标志、行数、列名和样本行，仅供运维排查
pub async fn test_data_sources(source: web::Data<dyn MarketDataSource>) -> Result<HttpResponse> {
    let report = diagnose(source.get_ref()).await;
    Ok(HttpResponse::Ok().json(report))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(get_chinese_futures))
        .route("/exchanges", web::get().to(get_exchange_list))
        .route("/test", web::get().to(test_data_sources));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::{RawRow, RawTable};
    use crate::services::futures::acquisition::tests::StubSource;
    use crate::services::futures::AcquisitionMethod;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::Value;
    use std::sync::Arc;

    fn source_data(stub: StubSource) -> web::Data<dyn MarketDataSource> {
        let source: Arc<dyn MarketDataSource> = Arc::new(stub);
        web::Data::from(source)
    }

    fn two_row_table() -> RawTable {
        vec![
            RawRow::new()
                .with("合约代码", "RB2501")
                .with("合约名称", "螺纹钢2501")
                .with("最新价", "3,521")
                .with("涨跌", "-12")
                .with("涨跌幅", "-0.34")
                .with("成交量", "1,234")
                .with("持仓量", "5678.0")
                .with("开盘价", "3530")
                .with("最高价", "3540")
                .with("最低价", "3510")
                .with("结算价", "3525"),
            RawRow::new().with("合约代码", "IF2412").with("合约名称", "沪深300"),
        ]
        .into_iter()
        .collect()
    }

    #[actix_web::test]
    async fn test_get_chinese_futures() {
        let stub = StubSource::default()
            .with_error(AcquisitionMethod::ZhSpotSina, "连接超时")
            .with_table(AcquisitionMethod::ZhSpot, two_row_table());
        let app = test::init_service(
            App::new()
                .app_data(source_data(stub))
                .app_data(web::Data::new(AppConfig::default()))
                .configure(crate::handlers::config),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/futures/cn").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        let quotes = body.as_array().unwrap();
        assert_eq!(quotes.len(), 2);

        let first = &quotes[0];
        assert_eq!(first["symbol"], "RB2501");
        assert_eq!(first["exchange"], "SHFE");
        assert_eq!(first["latestPrice"], 3521.0);
        assert_eq!(first["change"], -12.0);
        assert_eq!(first["volume"], 1234);
        assert_eq!(first["openInterest"], 5678);

        let today = get_beijing_date().format("%Y-%m-%d").to_string();
        let second = &quotes[1];
        assert_eq!(second["exchange"], "CFFEX");
        assert_eq!(second["latestPrice"], 0.0);
        assert_eq!(second["open"], 0.0);
        assert_eq!(second["high"], 0.0);
        assert_eq!(second["low"], 0.0);
        assert_eq!(second["settlement"], 0.0);
        assert_eq!(second["volume"], 0);
        assert_eq!(second["tradingDate"], today.as_str());
    }

    #[actix_web::test]
    async fn test_get_chinese_futures_all_failed() {
        let stub = StubSource::default().with_error(AcquisitionMethod::MainSina, "bang");
        let app = test::init_service(
            App::new()
                .app_data(source_data(stub))
                .configure(crate::handlers::config),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/futures/cn").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
        assert!(body["message"].is_string());
        assert!(body["traceback"].as_str().unwrap().contains("bang"));
    }

    #[actix_web::test]
    async fn test_get_exchange_list() {
        let app = test::init_service(App::new().configure(crate::handlers::config)).await;

        let req = test::TestRequest::get()
            .uri("/api/futures/cn/exchanges")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        let exchanges = body["exchanges"].as_array().unwrap();
        assert_eq!(exchanges.len(), 6);
        assert_eq!(exchanges[0]["code"], "SHFE");
        assert_eq!(exchanges[0]["name"], "上海期货交易所");
        assert_eq!(exchanges[5]["code"], "GFEX");
    }

    #[actix_web::test]
    async fn test_data_source_diagnostics() {
        let table: RawTable = vec![RawRow::new()
            .with("symbol", "CU2501")
            .with("trade", "75150")
            .with("settlement", Value::Null)]
        .into_iter()
        .collect();
        let stub = StubSource::default().with_table(AcquisitionMethod::MainSina, table);
        let app = test::init_service(
            App::new()
                .app_data(source_data(stub))
                .configure(crate::handlers::config),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/futures/cn/test").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["overall_success"], true);
        assert_eq!(body["successful_methods"], serde_json::json!(["futures_main_sina"]));

        let main = &body["results"]["futures_main_sina"];
        assert_eq!(main["success"], true);
        assert_eq!(main["row_count"], 1);
        assert_eq!(main["columns"], serde_json::json!(["symbol", "trade", "settlement"]));
        assert_eq!(main["sample_row"]["trade"], "75150");
        assert!(main["sample_row"]["settlement"].is_null());
        assert_eq!(main["first_3_rows"][0]["symbol"], "CU2501");

        let spot = &body["results"]["futures_zh_spot"];
        assert_eq!(spot["success"], false);
        assert!(spot["error"].is_string());
    }
}
