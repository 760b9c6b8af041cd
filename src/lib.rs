//! zview - headless workbench view-models
//!
//! 模块结构：
//! - kernel::chat: 聊天响应视图模型（变更计数、字速统计）
//! - kernel::coverage: 覆盖率树同步（增量、保持身份的子节点更新）
//! - kernel::services: 服务层（ports + adapters）
//! - logging: tracing 初始化

pub mod kernel;
pub mod logging;
