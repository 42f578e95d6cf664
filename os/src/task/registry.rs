//! 任务注册表
//!
//! 就绪环（调度顺序与状态）和控制块存储放在同一个
//! `UPIntrFreeCell` 里：任何一次注册表变更都在关中断的
//! 临界区内完成，环与控制块表不会被中断观察到不一致的中间态。

use crate::sync::UPIntrFreeCell;
use crate::task::task::TaskControlBlock;
use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use lazy_static::lazy_static;
use task_core::{TaskRing, Tid};

pub struct TaskRegistry {
    pub ring: TaskRing,
    pub tasks: BTreeMap<Tid, Arc<TaskControlBlock>>,
}

impl TaskRegistry {
    pub fn task_of(&self, tid: Tid) -> Option<Arc<TaskControlBlock>> {
        self.tasks.get(&tid).cloned()
    }

    pub fn current_tcb(&self) -> Option<Arc<TaskControlBlock>> {
        self.ring.current().and_then(|tid| self.task_of(tid))
    }
}

lazy_static! {
    pub static ref REGISTRY: UPIntrFreeCell<TaskRegistry> = unsafe {
        UPIntrFreeCell::new(TaskRegistry {
            ring: TaskRing::new(),
            tasks: BTreeMap::new(),
        })
    };
}
