/// 引擎配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/pos/engine | 工作目录 (订单数据库等) |
/// | SYNC_POLL_INTERVAL_SECS | 30 | 远程订单轮询间隔(秒) |
/// | SYNC_FETCH_TIMEOUT_MS | 10000 | 轮询抓取超时(毫秒) |
/// | PRINT_SUBMIT_TIMEOUT_MS | 5000 | 打印提交超时(毫秒) |
/// | EVENT_CHANNEL_CAPACITY | 1024 | 事件广播通道容量 |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | 关闭超时(毫秒) |
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储订单数据库等文件
    pub work_dir: String,
    /// 远程订单轮询间隔 (秒)
    pub sync_poll_interval_secs: u64,
    /// 轮询抓取超时 (毫秒)，超时后放弃本次抓取等待下一轮
    pub sync_fetch_timeout_ms: u64,
    /// 单张票据提交打印机的超时 (毫秒)
    pub print_submit_timeout_ms: u64,
    /// 订单事件广播通道容量
    pub event_channel_capacity: usize,
    /// 关闭超时时间 (毫秒)
    pub shutdown_timeout_ms: u64,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/pos/engine".into()),
            sync_poll_interval_secs: std::env::var("SYNC_POLL_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            sync_fetch_timeout_ms: std::env::var("SYNC_FETCH_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
            print_submit_timeout_ms: std::env::var("PRINT_SUBMIT_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5_000),
            event_channel_capacity: std::env::var("EVENT_CHANNEL_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1024),
            shutdown_timeout_ms: std::env::var("SHUTDOWN_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(
        work_dir: impl Into<String>,
        sync_poll_interval_secs: u64,
        print_submit_timeout_ms: u64,
    ) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.sync_poll_interval_secs = sync_poll_interval_secs;
        config.print_submit_timeout_ms = print_submit_timeout_ms;
        config
    }

    pub fn sync_poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sync_poll_interval_secs)
    }

    pub fn sync_fetch_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.sync_fetch_timeout_ms)
    }

    pub fn print_submit_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.print_submit_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
