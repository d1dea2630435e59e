//! Order Engine - 订单生命周期与多渠道同步引擎
//!
//! # 架构概述
//!
//! 本 crate 是餐厅 POS 后端的核心引擎，提供以下功能：
//!
//! - **订单状态机** (`lifecycle`): 校验并应用状态流转，按订单串行化
//! - **远程同步** (`sync`): push + poll 双通道合并云端/网页订单，幂等去重
//! - **打印路由** (`printing`): 按打印组拆分订单并分发厨房票据，按组隔离故障
//! - **余额账本** (`ledger`): 礼品卡余额的原子检查-扣减
//! - **订单存储** (`store`): 内存/redb 双适配器的权威持久化
//!
//! # 模块结构
//!
//! ```text
//! order-engine/src/
//! ├── core/          # 配置、状态、后台任务、组装
//! ├── store/         # 订单存储 trait + memory/redb 适配器
//! ├── lifecycle/     # 订单状态机
//! ├── sync/          # 远程订单同步 (coordinator + worker)
//! ├── printing/      # 打印路由 (router + worker + pool)
//! ├── ledger/        # 礼品卡余额账本
//! └── utils/         # 日志等工具
//! ```
//!
//! # 数据流
//!
//! ```text
//! RemoteOrderFeed ──► SyncWorker ──► SyncCoordinator ──► OrderStore
//!                                         │ (events)
//! StateMachine ───────────────────────────┤
//!                                         ▼
//!                                   PrintWorker ──► PrintRouter ──► PrinterPool
//! ```

pub mod core;
pub mod ledger;
pub mod lifecycle;
pub mod printing;
pub mod store;
pub mod sync;
pub mod utils;

// Re-export 公共类型
pub use crate::core::{BackgroundTasks, Config, Engine, EngineState, TaskKind};
pub use ledger::{BalanceLedger, LedgerError, LedgerResult};
pub use lifecycle::{StateMachine, TransitionError, TransitionResult};
pub use printing::{
    DispatchResult, MockPrinterPool, PrintGroupCatalog, PrintRouter, PrintWorker, PrinterPool,
    SkipReason, TcpPrinterPool, Ticket,
};
pub use store::{MemoryOrderStore, OrderStore, RedbOrderStore, StoreError, StoreResult};
pub use sync::{
    BatchReport, FeedError, MemoryRemoteFeed, MergeOutcome, RemoteOrderFeed, SyncCoordinator,
    SyncCursor, SyncWorker,
};

// Re-export unified error types from shared
pub use shared::error::{AppError, AppResult, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
