//! 核心模块 - 配置与状态
//!
//! - [`GuardConfig`] - 环境配置
//! - [`NamespaceConfig`] - 路径命名空间
//! - [`ConsoleState`] - 两个命名空间的上下文与路由器

pub mod config;
pub mod state;

pub use config::{GuardConfig, NamespaceConfig, NamespaceKind};
pub use state::ConsoleState;
