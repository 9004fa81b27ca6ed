use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::info;

static EXPORTER: OnceCell<SocketAddr> = OnceCell::new();
static PROMETHEUS_ENABLED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus 监听地址非法 {listen}: {source}")]
    InvalidListen {
        listen: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("安装 prometheus exporter 失败: {0}")]
    Install(#[from] BuildError),
}

/// 安装 Prometheus exporter；重复调用返回首次安装的地址。
pub fn try_init_prometheus(listen: &str) -> Result<SocketAddr, MetricsError> {
    EXPORTER
        .get_or_try_init(|| {
            let addr: SocketAddr =
                listen
                    .parse()
                    .map_err(|source| MetricsError::InvalidListen {
                        listen: listen.to_string(),
                        source,
                    })?;
            PrometheusBuilder::new().with_http_listener(addr).install()?;
            PROMETHEUS_ENABLED.store(true, Ordering::Relaxed);
            info!(target: "monitoring::metrics", %addr, "prometheus exporter 已启动");
            Ok(addr)
        })
        .copied()
}

pub fn prometheus_enabled() -> bool {
    PROMETHEUS_ENABLED.load(Ordering::Relaxed)
}
