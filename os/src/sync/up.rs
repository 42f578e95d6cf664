//! # 单处理器安全内部可变性封装模块
//!
//! ## Overview
//! 提供单处理器（UP）环境下访问全局可变状态的两层封装：
//! - `UPSafeCellRaw`：基于 `UnsafeCell` 的最底层封装，完全由使用者保证安全
//! - `UPIntrFreeCell`：访问期间自动屏蔽中断，防止中断打断导致的数据竞争
//! - `UPIntrRefMut`：配合 `UPIntrFreeCell` 使用的 RAII 可变借用守卫
//!
//! ## Assumptions
//! - 系统运行在单核处理器环境中，并发只可能来自中断
//! - `INTR_MASKING_INFO` 正确维护中断屏蔽嵌套状态
//!
//! ## Invariants
//! - 若某个 `UPIntrFreeCell` 处于可变借用状态，则中断必然被屏蔽
//! - 当 `UPIntrRefMut` 被 drop 时，中断状态一定会被恢复
//! - 借用冲突将直接 panic（`RefCell` 语义）

use crate::hal::INTR_MASKING_INFO;
use core::cell::{RefCell, RefMut, UnsafeCell};
use core::ops::{Deref, DerefMut};

/// 基于 `UnsafeCell` 的最底层 UP 内部可变性封装
///
/// ## Safety
/// - 不做任何借用或并发检查，使用者必须保证仅在单处理器环境下、
///   无中断竞争地访问
pub struct UPSafeCellRaw<T> {
    inner: UnsafeCell<T>,
}

unsafe impl<T> Sync for UPSafeCellRaw<T> {}

impl<T> UPSafeCellRaw<T> {
    /// ## Safety
    /// - 调用者必须保证后续访问满足 UP 假设
    pub unsafe fn new(value: T) -> Self {
        Self {
            inner: UnsafeCell::new(value),
        }
    }

    pub fn get_mut(&self) -> &mut T {
        unsafe { &mut (*self.inner.get()) }
    }
}

/// 在访问期间自动关闭中断的 UP 内部可变性封装
///
/// ## Overview
/// 使用 `RefCell` 提供动态借用检查，并在进入临界区时屏蔽中断
pub struct UPIntrFreeCell<T> {
    inner: RefCell<T>,
}

unsafe impl<T> Sync for UPIntrFreeCell<T> {}
unsafe impl<T> Send for UPIntrFreeCell<T> {}

/// `UPIntrFreeCell` 的可变借用守卫
///
/// ## Invariants
/// - 生命周期内：中断始终被屏蔽
pub struct UPIntrRefMut<'a, T>(Option<RefMut<'a, T>>);

impl<T> UPIntrFreeCell<T> {
    /// ## Safety
    /// - 使用者需保证仅在 UP 环境下使用
    pub unsafe fn new(value: T) -> Self {
        Self {
            inner: RefCell::new(value),
        }
    }

    /// 获取内部数据的独占访问权
    ///
    /// ## Behavior
    /// - 屏蔽中断后获取 RefCell 的可变借用
    /// - 若发生借用冲突将 panic
    pub fn exclusive_access(&self) -> UPIntrRefMut<'_, T> {
        INTR_MASKING_INFO.get_mut().enter();
        UPIntrRefMut(Some(self.inner.borrow_mut()))
    }

    /// 在独占访问会话中执行闭包，自动管理中断屏蔽与恢复
    pub fn exclusive_session<F, V>(&self, f: F) -> V
    where
        F: FnOnce(&mut T) -> V,
    {
        let mut inner = self.exclusive_access();
        f(inner.deref_mut())
    }
}

impl<'a, T> Drop for UPIntrRefMut<'a, T> {
    fn drop(&mut self) {
        self.0 = None;
        INTR_MASKING_INFO.get_mut().exit();
    }
}

impl<'a, T> Deref for UPIntrRefMut<'a, T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        self.0.as_ref().unwrap().deref()
    }
}
impl<'a, T> DerefMut for UPIntrRefMut<'a, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.as_mut().unwrap().deref_mut()
    }
}
