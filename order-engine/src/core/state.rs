use std::sync::Arc;

use crate::core::Config;
use crate::ledger::BalanceLedger;
use crate::lifecycle::StateMachine;
use crate::printing::{PrintGroupCatalog, PrintRouter};
use crate::store::OrderStore;
use crate::sync::SyncCoordinator;

/// 引擎状态 - 持有所有服务的单例引用
///
/// EngineState 是引擎的核心数据结构，持有所有服务的共享引用。
/// 使用 Arc 实现浅拷贝，克隆成本极低。
///
/// # 服务组件
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | store | 订单存储 (唯一事实来源) |
/// | state_machine | 订单状态机 (操作员状态写入的唯一入口) |
/// | coordinator | 远程订单合并 (同步状态写入的唯一入口) |
/// | router | 厨房打印路由 |
/// | catalog | 打印组配置缓存 |
/// | ledger | 礼品卡余额账本 (余额写入的唯一入口) |
#[derive(Clone)]
pub struct EngineState {
    /// 引擎配置
    pub config: Config,
    /// 订单存储
    pub store: Arc<dyn OrderStore>,
    /// 订单状态机
    pub state_machine: Arc<StateMachine>,
    /// 远程订单合并协调器
    pub coordinator: Arc<SyncCoordinator>,
    /// 打印路由引擎
    pub router: Arc<PrintRouter>,
    /// 打印组配置
    pub catalog: Arc<PrintGroupCatalog>,
    /// 礼品卡账本
    pub ledger: Arc<BalanceLedger>,
}

impl EngineState {
    /// 获取订单存储
    pub fn store(&self) -> Arc<dyn OrderStore> {
        Arc::clone(&self.store)
    }

    /// 获取状态机
    pub fn state_machine(&self) -> Arc<StateMachine> {
        Arc::clone(&self.state_machine)
    }

    /// 获取打印路由
    pub fn router(&self) -> Arc<PrintRouter> {
        Arc::clone(&self.router)
    }

    /// 获取礼品卡账本
    pub fn ledger(&self) -> Arc<BalanceLedger> {
        Arc::clone(&self.ledger)
    }
}

impl std::fmt::Debug for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineState")
            .field("config", &self.config)
            .finish()
    }
}
