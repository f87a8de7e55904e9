//! 国内期货行情后端服务
//!
//! 代理新浪财经期货行情（按 akshare 的方式查询），
//! 把各数据源不同的列结构归一化为固定的 JSON 结构供前端使用

mod config;     // 配置加载
mod handlers;   // HTTP 请求处理器
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use crate::config::AppConfig;
use crate::services::futures::{MarketDataSource, SinaSource};

/// 应用程序入口
///
/// 加载配置，启动 HTTP 服务器（默认监听 0.0.0.0:8000）
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let (config, messages) = AppConfig::load();

    // 初始化日志系统，RUST_LOG 优先于配置文件中的级别
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));
    for message in &messages {
        log::info!("{}", message);
    }

    let source = SinaSource::new(&config.upstream)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let source: Arc<dyn MarketDataSource> = Arc::new(source);
    let source = web::Data::from(source);

    let bind_addr = config.bind_addr();
    let workers = config.server.workers;
    let app_config = web::Data::new(config);

    log::info!("启动国内期货行情服务，监听 {}", bind_addr);
    log::info!("  GET /api/futures/cn - 国内期货行情");
    log::info!("  GET /api/futures/cn/exchanges - 交易所列表");
    log::info!("  GET /api/futures/cn/test - 数据源诊断");
    log::info!("  GET /health - 健康检查");

    // 创建并启动 HTTP 服务器
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())  // 允许任意来源跨域访问
            .wrap(Logger::default())  // 添加请求日志中间件
            .app_data(source.clone())
            .app_data(app_config.clone())
            .configure(handlers::config)  // 配置路由
    });

    if workers > 0 {
        server = server.workers(workers);
    }

    server.bind(bind_addr)?.run().await
}
