//! # 任务环与就绪选择（任务登记表的纯模型）
//!
//! ## Overview
//! 本模块以 **槽位仓（arena）+ 显式环序** 的形式维护全部任务：
//! - `slots`：任务记录仓，槽位下标在任务存活期间稳定
//! - `order`：环的遍历顺序（`order[0]` 为环头，新任务紧随环头插入）
//! - `current`：当前占有 CPU 的任务槽位
//!
//! 任务 id（`Tid`）单调分配、永不复用；相比侵入式链表，
//! 槽位仓在回收任务时不存在悬垂指针问题。
//!
//! ## Invariants
//! - 初始化（`bootstrap`）之后环永不为空
//! - 任意时刻至多一个任务处于 `Running`，且与 `current` 一致
//! - `order` 中每个存活任务恰好出现一次
//! - `Waiting*` 状态只能由外部事件（`wake`）解除，选择过程不会解除

use alloc::vec::Vec;

/// 任务标识，单调分配，永不复用。
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Tid(pub usize);

/// 任务调度状态。
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TaskState {
    Ready,
    Running,
    /// 阻塞等待键盘整行输入（GETS）
    WaitingForInput,
    /// 阻塞等待指定子任务退出（EXEC）
    WaitingForChild,
    /// 终止态，无出边
    Terminated,
}

impl TaskState {
    fn runnable(self) -> bool {
        self == TaskState::Ready
    }
    pub fn is_waiting(self) -> bool {
        matches!(self, TaskState::WaitingForInput | TaskState::WaitingForChild)
    }
}

/// 一次就绪选择的结果。
///
/// 调度器据此决定是否真正触发上下文切换：
/// - `Keep`：当前任务继续运行，不构成可观测的切换
/// - `Switch`：`from` 让出，`to` 已被置为 `Running` 并成为当前任务
/// - `Stalled`：环中无可运行任务，需要等待中断事件
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Decision {
    Keep,
    Switch { from: Tid, to: Tid },
    Stalled,
}

struct Slot {
    tid: Tid,
    state: TaskState,
}

/// 任务环。所有存活任务的唯一登记处。
pub struct TaskRing {
    slots: Vec<Option<Slot>>,
    order: Vec<usize>,
    current: Option<usize>,
    next_tid: usize,
}

impl TaskRing {
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            order: Vec::new(),
            current: None,
            next_tid: 1,
        }
    }

    /// 登记引导任务（首个任务），直接处于 `Running`。
    ///
    /// ## Panics
    /// - 重复引导
    pub fn bootstrap(&mut self) -> Tid {
        assert!(self.current.is_none() && self.order.is_empty());
        let tid = self.alloc_tid();
        let idx = self.alloc_slot(tid, TaskState::Running);
        self.order.push(idx);
        self.current = Some(idx);
        tid
    }

    /// 以 `Ready` 态登记一个新任务，紧随环头拼入（O(1) 语义）。
    pub fn insert(&mut self) -> Tid {
        let tid = self.alloc_tid();
        let idx = self.alloc_slot(tid, TaskState::Ready);
        if self.order.is_empty() {
            self.order.push(idx);
        } else {
            self.order.insert(1, idx);
        }
        tid
    }

    fn alloc_tid(&mut self) -> Tid {
        let tid = Tid(self.next_tid);
        self.next_tid += 1;
        tid
    }

    fn alloc_slot(&mut self, tid: Tid, state: TaskState) -> usize {
        let slot = Slot { tid, state };
        if let Some(idx) = self.slots.iter().position(|s| s.is_none()) {
            self.slots[idx] = Some(slot);
            idx
        } else {
            self.slots.push(Some(slot));
            self.slots.len() - 1
        }
    }

    fn idx_of(&self, tid: Tid) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| matches!(s, Some(slot) if slot.tid == tid))
    }

    fn slot(&self, idx: usize) -> &Slot {
        self.slots[idx].as_ref().unwrap()
    }

    fn slot_mut(&mut self, idx: usize) -> &mut Slot {
        self.slots[idx].as_mut().unwrap()
    }

    /// 当前任务 id。引导完成后恒为 `Some`。
    pub fn current(&self) -> Option<Tid> {
        self.current.map(|idx| self.slot(idx).tid)
    }

    pub fn state_of(&self, tid: Tid) -> Option<TaskState> {
        self.idx_of(tid).map(|idx| self.slot(idx).state)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 环序遍历（从环头开始）。
    pub fn iter(&self) -> impl Iterator<Item = Tid> + '_ {
        self.order.iter().map(|&idx| self.slot(idx).tid)
    }

    /// 将当前任务置入阻塞态。只允许从 `Running` 进入 `Waiting*`。
    ///
    /// ## Panics
    /// - `state` 不是阻塞态，或当前任务不在 `Running`
    pub fn block_current(&mut self, state: TaskState) {
        assert!(state.is_waiting());
        let idx = self.current.expect("no current task");
        let slot = self.slot_mut(idx);
        assert_eq!(slot.state, TaskState::Running);
        slot.state = state;
    }

    /// 外部事件唤醒：仅 `Waiting*` → `Ready`，其余状态为空操作。
    pub fn wake(&mut self, tid: Tid) -> bool {
        if let Some(idx) = self.idx_of(tid) {
            let slot = self.slot_mut(idx);
            if slot.state.is_waiting() {
                slot.state = TaskState::Ready;
                return true;
            }
        }
        false
    }

    /// 将当前任务置为终止态（自愿退出路径）。
    pub fn terminate_current(&mut self) {
        let idx = self.current.expect("no current task");
        self.slot_mut(idx).state = TaskState::Terminated;
    }

    /// 就绪选择：从当前任务出发沿环走一圈，取第一个 `Ready` 任务。
    ///
    /// ## Behavior
    /// - 找到他人：当前任务 `Running` 则降级为 `Ready`（`Waiting*` /
    ///   `Terminated` 保持原状态），被选任务置 `Running` 并成为当前任务
    /// - 走满一圈回到自身：`Running` 保持不动（`Keep`）；被事件唤醒成
    ///   `Ready` 的自身重新置 `Running`（`Keep`）；否则 `Stalled`
    pub fn pick_next(&mut self) -> Decision {
        let cur_idx = match self.current {
            Some(idx) => idx,
            None => return Decision::Keep,
        };
        let n = self.order.len();
        let cur_pos = self
            .order
            .iter()
            .position(|&idx| idx == cur_idx)
            .expect("current task not in ring");
        for step in 1..n {
            let idx = self.order[(cur_pos + step) % n];
            if self.slot(idx).state.runnable() {
                let from = self.slot(cur_idx).tid;
                if self.slot(cur_idx).state == TaskState::Running {
                    self.slot_mut(cur_idx).state = TaskState::Ready;
                }
                self.slot_mut(idx).state = TaskState::Running;
                self.current = Some(idx);
                return Decision::Switch {
                    from,
                    to: self.slot(idx).tid,
                };
            }
        }
        // 走满一圈，回到出发点
        match self.slot(cur_idx).state {
            TaskState::Running => Decision::Keep,
            TaskState::Ready => {
                self.slot_mut(cur_idx).state = TaskState::Running;
                Decision::Keep
            }
            _ => Decision::Stalled,
        }
    }

    /// 回收终止任务：从环中摘除并释放槽位，当前任务除外。
    ///
    /// 返回被回收的任务 id，调用方据此释放 TCB、内核栈等资源。
    pub fn reap(&mut self) -> Vec<Tid> {
        let cur_idx = self.current;
        let mut reaped = Vec::new();
        self.order.retain(|&idx| {
            let dead = self.slots[idx].as_ref().unwrap().state == TaskState::Terminated
                && Some(idx) != cur_idx;
            if dead {
                reaped.push(self.slots[idx].take().unwrap().tid);
            }
            !dead
        });
        reaped
    }

    /// 不变式自检：`Running` 任务恰好一个且与 `current` 一致。
    pub fn check_single_runner(&self) -> bool {
        let running: Vec<usize> = self
            .order
            .iter()
            .copied()
            .filter(|&idx| self.slot(idx).state == TaskState::Running)
            .collect();
        match (running.as_slice(), self.current) {
            ([idx], Some(cur)) => *idx == cur,
            ([], Some(cur)) => self.slot(cur).state != TaskState::Running,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_with_bootstrap() -> (TaskRing, Tid) {
        let mut ring = TaskRing::new();
        let boot = ring.bootstrap();
        (ring, boot)
    }

    #[test]
    fn bootstrap_is_running_and_alone() {
        let (ring, boot) = ring_with_bootstrap();
        assert_eq!(ring.current(), Some(boot));
        assert_eq!(ring.state_of(boot), Some(TaskState::Running));
        assert_eq!(ring.len(), 1);
        assert!(ring.check_single_runner());
    }

    #[test]
    fn tids_are_monotonic_and_never_reused() {
        let (mut ring, boot) = ring_with_bootstrap();
        let a = ring.insert();
        let b = ring.insert();
        assert!(boot < a && a < b);
        ring.pick_next();
        let c = ring.insert();
        assert!(b < c);
    }

    #[test]
    fn insert_splices_after_head() {
        let (mut ring, boot) = ring_with_bootstrap();
        let a = ring.insert();
        let b = ring.insert();
        // 环序：head, 最后插入者, 先插入者
        let order: Vec<Tid> = ring.iter().collect();
        assert_eq!(order, vec![boot, b, a]);
    }

    #[test]
    fn ring_closure_visits_every_task_once() {
        let (mut ring, _) = ring_with_bootstrap();
        for _ in 0..4 {
            ring.insert();
        }
        let seen: Vec<Tid> = ring.iter().collect();
        assert_eq!(seen.len(), ring.len());
        for i in 0..seen.len() {
            for j in i + 1..seen.len() {
                assert_ne!(seen[i], seen[j]);
            }
        }
    }

    #[test]
    fn round_robin_is_fair_in_ring_order() {
        // N 个全 Ready 的任务，N 次选择内每个恰好被选一次，且按环序
        let (mut ring, boot) = ring_with_bootstrap();
        let mut expected: Vec<Tid> = Vec::new();
        for _ in 0..3 {
            ring.insert();
        }
        let order: Vec<Tid> = ring.iter().collect();
        // 从 boot 出发按环序轮转一整圈
        expected.extend(order.iter().skip(1));
        expected.push(boot);
        let mut picked = Vec::new();
        for _ in 0..ring.len() {
            match ring.pick_next() {
                Decision::Switch { to, .. } => picked.push(to),
                other => panic!("unexpected decision {:?}", other),
            }
            assert!(ring.check_single_runner());
        }
        assert_eq!(picked, expected);
    }

    #[test]
    fn scenario_two_ready_tasks_alternate() {
        // A(id=1) 与 B(id=2) 均就绪，两次调度为 A→B→A
        let mut ring = TaskRing::new();
        let a = ring.bootstrap();
        let b = ring.insert();
        assert_eq!(
            ring.pick_next(),
            Decision::Switch { from: a, to: b }
        );
        assert_eq!(
            ring.pick_next(),
            Decision::Switch { from: b, to: a }
        );
    }

    #[test]
    fn sole_running_task_keeps_cpu() {
        let (mut ring, boot) = ring_with_bootstrap();
        assert_eq!(ring.pick_next(), Decision::Keep);
        assert_eq!(ring.state_of(boot), Some(TaskState::Running));
    }

    #[test]
    fn blocked_task_is_not_selected_until_woken() {
        let (mut ring, boot) = ring_with_bootstrap();
        let a = ring.insert();
        // boot 继续运行，a 先被选中并阻塞在键盘输入上
        assert_eq!(ring.pick_next(), Decision::Switch { from: boot, to: a });
        ring.block_current(TaskState::WaitingForInput);
        // a 阻塞后应切回 boot
        assert_eq!(ring.pick_next(), Decision::Switch { from: a, to: boot });
        // a 未被唤醒前，任何次数的选择都不会选中它
        for _ in 0..5 {
            assert_eq!(ring.pick_next(), Decision::Keep);
            assert_eq!(ring.state_of(a), Some(TaskState::WaitingForInput));
        }
        // 唤醒后下一次选择即轮到 a
        assert!(ring.wake(a));
        assert_eq!(ring.pick_next(), Decision::Switch { from: boot, to: a });
    }

    #[test]
    fn wake_is_noop_on_non_waiting_states() {
        let (mut ring, boot) = ring_with_bootstrap();
        let a = ring.insert();
        assert!(!ring.wake(a)); // Ready
        assert!(!ring.wake(boot)); // Running
        ring.pick_next();
        ring.terminate_current();
        assert!(!ring.wake(a)); // Terminated
    }

    #[test]
    fn terminated_task_is_never_selected_and_gets_reaped() {
        let (mut ring, boot) = ring_with_bootstrap();
        let a = ring.insert();
        ring.pick_next(); // a runs
        ring.terminate_current();
        assert_eq!(ring.pick_next(), Decision::Switch { from: a, to: boot });
        // a 不再是当前任务，回收后环中只剩 boot
        assert_eq!(ring.reap(), vec![a]);
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.state_of(a), None);
        assert_eq!(ring.pick_next(), Decision::Keep);
    }

    #[test]
    fn reap_spares_the_current_task() {
        let (mut ring, _) = ring_with_bootstrap();
        ring.terminate_current();
        assert!(ring.reap().is_empty());
        assert_eq!(ring.len(), 1);
    }

    #[test]
    fn all_blocked_ring_stalls_until_event() {
        let (mut ring, boot) = ring_with_bootstrap();
        ring.block_current(TaskState::WaitingForChild);
        assert_eq!(ring.pick_next(), Decision::Stalled);
        // 事件唤醒当前任务自身：恢复运行而非切换
        assert!(ring.wake(boot));
        assert_eq!(ring.pick_next(), Decision::Keep);
        assert_eq!(ring.state_of(boot), Some(TaskState::Running));
    }

    #[test]
    fn waiting_state_survives_switch_out() {
        // 让出 CPU 时只降级 Running，Waiting* 保持不变
        let (mut ring, boot) = ring_with_bootstrap();
        let a = ring.insert();
        ring.block_current(TaskState::WaitingForInput);
        assert_eq!(ring.pick_next(), Decision::Switch { from: boot, to: a });
        assert_eq!(ring.state_of(boot), Some(TaskState::WaitingForInput));
    }
}
