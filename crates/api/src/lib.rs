//! # Alchemist API
//!
//! 基于Axum的REST接口，所有请求共享同一个会话。
//!
//! ## API 端点
//!
//! - `GET /health` - 健康检查
//! - `POST /api/uploads/{entity}` - 上传CSV并替换整张表
//! - `GET /api/tables/{entity}` - 当前表内容（`?all=true` 忽略任务过滤视图）
//! - `PUT /api/tables/{entity}/{row}` - 修改单个字段 `{ field, value }`
//! - `POST /api/validate` - 重新校验
//! - `POST /api/corrections/suggest` / `POST /api/corrections/apply` - 纠正建议
//! - `GET|POST /api/rules`, `POST /api/rules/natural-language` - 规则
//! - `GET|PUT /api/priorities` - 优先级权重
//! - `GET /api/export/rules` - 规则导出内容
//! - `POST|DELETE /api/search` - 自然语言任务搜索
//! - `POST /api/ask-ai` - 直接调用解释器
//!
//! ## 响应格式
//!
//! ```json
//! {
//!   "success": true,
//!   "data": { "findings": [], "summary": { "clients": 0, "workers": 0, "tasks": 0 } },
//!   "message": null,
//!   "timestamp": "2024-01-01T00:00:00Z"
//! }
//! ```
//!
//! 失败时 `success` 为 false，`data` 中带有错误类型和详情。

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

use std::future::Future;

use axum::{extract::DefaultBodyLimit, Router};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use alchemist_config::ApiConfig;
use alchemist_errors::{AlchemistError, AlchemistResult};
use middleware::{cors_layer, request_logging};

pub use routes::{create_routes, AppState};

/// 创建完整的API应用
pub fn create_app(state: AppState, config: &ApiConfig) -> Router {
    let app = create_routes(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(axum::middleware::from_fn(request_logging))
            .layer(DefaultBodyLimit::max(config.max_upload_bytes())),
    );

    if config.cors_enabled {
        app.layer(cors_layer())
    } else {
        app
    }
}

/// 绑定地址并运行服务器，`shutdown` 完成后优雅退出
pub async fn serve<F>(app: Router, bind_address: &str, shutdown: F) -> AlchemistResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(|e| AlchemistError::Io(format!("绑定地址失败 {bind_address}: {e}")))?;

    info!("API服务器启动在 http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("API服务器已停止");
    Ok(())
}
