//! Console Guard - 动态权限与路由守卫
//!
//! # 架构概述
//!
//! Serves two principal kinds side by side, operators under `/operator` and
//! end users under `/enduser`. Each namespace has its own session, token
//! storage, granted permissions and route table.
//!
//! - **会话** (`session`): 令牌持久化与恢复
//! - **权限** (`permission`): 按路由/全局的按钮码
//! - **路由** (`routing`): 从授权菜单构建路由表
//! - **守卫** (`guard`): 导航状态机、命名空间分发、路由器
//! - **权限门** (`gate`): page / global / level 三种模式
//! - **权限树** (`tree`): 角色授权时的勾选状态
//!
//! # 模块结构
//!
//! ```text
//! console-guard/src/
//! ├── core/          # 配置、状态
//! ├── common/        # 日志
//! ├── session/       # 会话、键值存储
//! ├── permission/    # 权限存储
//! ├── routing/       # 路由表、构建器、视图解析
//! ├── guard/         # 导航守卫
//! ├── tree/          # 权限树编辑
//! ├── context.rs     # 认证上下文
//! ├── gate.rs        # 权限门
//! └── source.rs      # 授权菜单来源
//! ```

pub mod common;
pub mod context;
pub mod core;
pub mod error;
pub mod gate;
pub mod guard;
pub mod permission;
pub mod routing;
pub mod session;
pub mod source;
pub mod tree;

// Re-export 公共类型
pub use context::AuthContext;
pub use core::{ConsoleState, GuardConfig, NamespaceConfig, NamespaceKind};
pub use error::{BuildError, NavigationError, StorageError, TreeError, ViewLoadError};
pub use gate::{CapabilityGate, GateDirective, GateMode, GateRequirement, is_permitted};
pub use guard::{
    GuardState, NavigationDispatcher, NavigationEvent, NavigationGuard, NavigationObserver,
    NavigationOutcome, NavigationReport, NavigationResult, RecordingObserver, Router,
    TracingObserver, Transition, TransitionKind,
};
pub use permission::{GrantedPermissionSet, PermissionStore, RequiredCodes};
pub use routing::{ResolvedView, RouteTable, RouteTableBuilder, ViewRegistry, ViewResolver};
pub use session::{FileKvStore, KeyValueStore, MemoryKvStore, PrincipalSession};
pub use source::{AuthBackend, MenuSource};
pub use tree::{CheckChange, PermissionTreeEditor, TreeSelectionState};

pub use shared::{AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use common::{init_logger, init_logger_with_file};

// Security logging macro
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            timestamp = chrono::Local::now().to_rfc3339(),
            $($key = $value),*
        );
    };
}
