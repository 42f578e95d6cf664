//! 毫秒级时间读数，供内核任务做节拍判断。

use crate::hal::{get_clock_freq, get_time};

const MSEC_PER_SEC: usize = 1000;

pub fn get_time_ms() -> usize {
    get_time() / (get_clock_freq() / MSEC_PER_SEC)
}
