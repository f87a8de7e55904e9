pub mod futures;
pub mod health;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::config).service(
        web::scope("/api/futures/cn").configure(futures::config),
    );
}
