//! HTTP 客户端 - 基础设施层

use reqwest::Client;
use std::time::Duration;

/// 连接超时上限
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// 构建带超时的 HTTP 客户端
///
/// 所有平台请求都必须有上限，超时和其他失败一样处理
pub fn build_http_client(request_timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT.min(request_timeout))
        .timeout(request_timeout)
        .user_agent(concat!("clip_uploader/", env!("CARGO_PKG_VERSION")))
        .build()
}
