//! 中断屏蔽计数器
//!
//! ## Overview
//! 记录当前中断屏蔽的嵌套深度以及最外层屏蔽前的 SIE 状态。
//! `UPIntrFreeCell` 的每次独占访问都通过这里成对地 enter/exit，
//! 嵌套的临界区只在最外层真正翻转 sstatus.SIE。
//!
//! ## Invariants
//! - `nested_level > 0` 期间中断一定处于屏蔽状态
//! - 最外层 `exit` 将 SIE 恢复为屏蔽前的值，而不是无条件打开

use crate::sync::UPSafeCellRaw;
use lazy_static::lazy_static;
use riscv::register::sstatus;

lazy_static! {
    pub static ref INTR_MASKING_INFO: UPSafeCellRaw<IntrMaskingInfo> =
        unsafe { UPSafeCellRaw::new(IntrMaskingInfo::new()) };
}

pub struct IntrMaskingInfo {
    nested_level: usize,
    sie_before_masking: bool,
}

impl IntrMaskingInfo {
    pub fn new() -> Self {
        Self {
            nested_level: 0,
            sie_before_masking: false,
        }
    }

    pub fn enter(&mut self) {
        let sie = sstatus::read().sie();
        unsafe {
            sstatus::clear_sie();
        }
        if self.nested_level == 0 {
            self.sie_before_masking = sie;
        }
        self.nested_level += 1;
    }

    pub fn exit(&mut self) {
        self.nested_level -= 1;
        if self.nested_level == 0 && self.sie_before_masking {
            unsafe {
                sstatus::set_sie();
            }
        }
    }
}
