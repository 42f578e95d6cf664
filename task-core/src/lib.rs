//! # 任务调度核心模型（task-core）
//!
//! ## Overview
//! 本 crate 抽取了内核任务子系统中与体系结构无关的部分：
//! - `ring`：任务环形就绪队列与状态机（任务登记表的纯模型）
//! - `argv`：用户栈参数区（argc / argv / 字符串区）的布局计算
//! - `line`：键盘行规程的缓冲状态机与交付长度规则
//!
//! 内核（`os` crate）在此模型之上挂接 TCB、内核栈与上下文切换；
//! 该 crate 本身不依赖任何平台设施，可在宿主机上直接运行单元测试。
//!
//! ## Assumptions
//! - 单处理器模型：调用者保证对 `TaskRing` 的访问互斥
//!   （内核侧通过关中断临界区保证）
//! - 任务 id 单调分配，存活期间永不复用

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod argv;
pub mod line;
pub mod ring;

pub use argv::ArgvImage;
pub use line::{LineBuffer, LineEvent};
pub use ring::{Decision, TaskRing, TaskState, Tid};
