//! 时钟中断源
//!
//! 定时器是唯一保证持续存在的异步事件源：它驱动抢占调度，
//! 也顺带驱动键盘轮询，因此调度器的停摆等待总能被打破。

use super::sbi::set_timer;
use crate::hal::CLOCK_FREQ;
use riscv::register::time;

/// 每秒定时器 tick 数
pub const TICKS_PER_SEC: usize = 100;

/// 当前时间戳（CPU tick）。单调递增。
pub fn get_time() -> usize {
    time::read()
}

/// 预约下一次定时器中断。
pub fn set_next_trigger() {
    set_timer(get_time() + CLOCK_FREQ / TICKS_PER_SEC);
}

pub fn get_clock_freq() -> usize {
    CLOCK_FREQ
}
