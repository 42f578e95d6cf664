//! 键盘行缓冲
//!
//! ## Overview
//! 控制台输入由定时器中断驱动轮询。字符经 `task_core::line` 的
//! 行规程进入缓冲并即时回显；退格删除缓冲末尾字符，回车结束一行。
//! 行完成时若有任务登记了读请求就立刻交付：把行内容拷入该任务的
//! 用户缓冲区、补上 `\0` 终止符、写好返回值并唤醒它。
//!
//! ## Behavior
//! - 行缓冲满后多余的可见字符被丢弃（不回显）
//! - 交付最多 `max_len - 1` 个字符，末尾写入 `\0`；
//!   行终止符不计入返回值
//! - 没有等待者时完成的行直接丢弃，不做预输入排队
//!
//! ## Invariants
//! - 同一时刻至多一个在途读请求（单控制台）

use crate::hal::console_getchar;
use crate::mm::translated_byte_buffer;
use crate::sync::UPIntrFreeCell;
use crate::task::{task_by_tid, wakeup_task, Tid};
use lazy_static::lazy_static;
use task_core::line::{delivered_len, LineBuffer, LineEvent};

const LINE_CAPACITY: usize = 256;

struct Request {
    buf: usize,
    max_len: usize,
    tid: Tid,
}

struct Keyboard {
    line: LineBuffer,
    request: Option<Request>,
}

impl Keyboard {
    fn new() -> Self {
        Self {
            line: LineBuffer::new(LINE_CAPACITY),
            request: None,
        }
    }

    /// 推进行规程一个字符，行完成时交付并返回被唤醒的任务。
    fn push_char(&mut self, c: u8) -> Option<Tid> {
        match self.line.push(c) {
            LineEvent::Echo(c) => {
                print!("{}", c as char);
                None
            }
            LineEvent::Erase => {
                // 回显退格：光标回退、抹掉字符、再回退
                print!("\x08 \x08");
                None
            }
            LineEvent::Complete => {
                print!("\n");
                let line = self.line.take_line();
                self.deliver(&line)
            }
            LineEvent::Discarded => None,
        }
    }

    /// 把一行交付给在途请求；没有等待者时整行丢弃。
    fn deliver(&mut self, line: &[u8]) -> Option<Tid> {
        let req = self.request.take()?;
        let task = task_by_tid(req.tid)?;
        let n = delivered_len(line.len(), req.max_len);
        let token = task.user_token();
        let mut buffers = translated_byte_buffer(token, req.buf as *const u8, n + 1);
        let mut src = line[..n].iter().copied().chain(core::iter::once(0));
        for buf in buffers.iter_mut() {
            for byte in buf.iter_mut() {
                *byte = src.next().unwrap();
            }
        }
        task.inner_exclusive_access().syscall_return_value = Some(n as isize);
        Some(req.tid)
    }
}

lazy_static! {
    static ref KEYBOARD: UPIntrFreeCell<Keyboard> = unsafe { UPIntrFreeCell::new(Keyboard::new()) };
}

/// 登记一个读请求，交付发生在之后某次 `poll` 的行完成时刻。
///
/// 已有在途请求时拒绝并返回 `false`（单控制台只允许一个读者）。
pub fn arm(buf: usize, max_len: usize, tid: Tid) -> bool {
    KEYBOARD.exclusive_session(|kb| {
        if kb.request.is_some() {
            return false;
        }
        kb.request = Some(Request { buf, max_len, tid });
        true
    })
}

/// 定时器中断路径调用：取走控制台里积压的字符并推进行缓冲。
pub fn poll() {
    loop {
        let c = console_getchar();
        if c == usize::MAX {
            break;
        }
        let woken = KEYBOARD.exclusive_session(|kb| kb.push_char(c as u8));
        if let Some(tid) = woken {
            wakeup_task(tid);
        }
    }
}
