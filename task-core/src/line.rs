//! # 行缓冲状态机（键盘行规程的纯模型）
//!
//! ## Overview
//! 输入字符逐个进入行缓冲：可见字符在容量内暂存，退格删除末尾
//! 字符，回车/换行结束一行。状态机只决定缓冲与回显，行的交付
//! （拷贝到读者缓冲区并补 `\0`）由调用方完成。
//!
//! ## Behavior
//! - 缓冲满后的可见字符被丢弃（不回显）
//! - 对空缓冲退格无效
//! - 行终止符不入缓冲

use alloc::vec::Vec;

/// 一次字符输入对状态机的影响，调用方据此回显。
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LineEvent {
    /// 字符已入缓冲，原样回显
    Echo(u8),
    /// 退格生效，回显 "\x08 \x08" 抹掉一个字符
    Erase,
    /// 一行结束，回显换行并经 `take_line` 取走缓冲内容
    Complete,
    /// 缓冲已满或空缓冲退格，无事发生
    Discarded,
}

pub struct LineBuffer {
    bytes: Vec<u8>,
    capacity: usize,
}

impl LineBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: Vec::new(),
            capacity,
        }
    }

    pub fn push(&mut self, c: u8) -> LineEvent {
        match c {
            b'\r' | b'\n' => LineEvent::Complete,
            0x08 | 0x7f => {
                if self.bytes.pop().is_some() {
                    LineEvent::Erase
                } else {
                    LineEvent::Discarded
                }
            }
            _ => {
                if self.bytes.len() < self.capacity {
                    self.bytes.push(c);
                    LineEvent::Echo(c)
                } else {
                    LineEvent::Discarded
                }
            }
        }
    }

    /// 取走当前行内容并清空缓冲。
    pub fn take_line(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.bytes)
    }
}

/// 交付给读者的字符数：行长与读者缓冲容量减一的较小值。
/// 留出的一个字节由调用方写入 `\0` 终止符。
pub fn delivered_len(line_len: usize, reader_capacity: usize) -> usize {
    line_len.min(reader_capacity.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_chars_buffer_in_order() {
        let mut lb = LineBuffer::new(8);
        assert_eq!(lb.push(b'h'), LineEvent::Echo(b'h'));
        assert_eq!(lb.push(b'i'), LineEvent::Echo(b'i'));
        assert_eq!(lb.push(b'\n'), LineEvent::Complete);
        assert_eq!(lb.take_line(), b"hi");
    }

    #[test]
    fn backspace_erases_only_buffered_chars() {
        let mut lb = LineBuffer::new(8);
        assert_eq!(lb.push(0x08), LineEvent::Discarded);
        lb.push(b'a');
        lb.push(b'b');
        assert_eq!(lb.push(0x7f), LineEvent::Erase);
        assert_eq!(lb.push(b'\r'), LineEvent::Complete);
        assert_eq!(lb.take_line(), b"a");
    }

    #[test]
    fn full_buffer_drops_excess_without_echo() {
        let mut lb = LineBuffer::new(2);
        lb.push(b'a');
        lb.push(b'b');
        assert_eq!(lb.push(b'c'), LineEvent::Discarded);
        assert_eq!(lb.push(b'\n'), LineEvent::Complete);
        assert_eq!(lb.take_line(), b"ab");
    }

    #[test]
    fn take_line_resets_for_the_next_line() {
        let mut lb = LineBuffer::new(8);
        lb.push(b'x');
        lb.push(b'\n');
        assert_eq!(lb.take_line(), b"x");
        lb.push(b'y');
        lb.push(b'\n');
        assert_eq!(lb.take_line(), b"y");
    }

    #[test]
    fn delivery_reserves_terminator_slot() {
        // 读者缓冲 len 字节最多装 len-1 个字符，末位留给 '\0'
        assert_eq!(delivered_len(10, 4), 3);
        assert_eq!(delivered_len(2, 256), 2);
        assert_eq!(delivered_len(0, 8), 0);
        assert_eq!(delivered_len(5, 1), 0);
        assert_eq!(delivered_len(5, 0), 0);
    }
}
