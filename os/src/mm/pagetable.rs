//! 页表抽象与跨地址空间访问
//!
//! `PageTable` 是体系结构页表实现需要满足的接口；
//! `translated_*` 系列按用户页表逐页翻译，把用户地址空间中的
//! 缓冲区、字符串、标量暴露给内核直接读写。

use crate::hal::{PageTableEntryImpl, PageTableImpl};
use crate::mm::{MapPermission, PhysAddr, PhysPageNum, StepByOne, VirtAddr, VirtPageNum};
use alloc::string::String;
use alloc::vec::Vec;

pub trait PageTable: Sized {
    /// 物理页帧耗尽时返回 `None`。
    fn new() -> Option<Self>;

    fn from_token(token: usize) -> Self;

    /// 缺失的中间级页表页就地创建；页帧耗尽返回 `None`。
    fn find_pte_create(&mut self, vpn: VirtPageNum) -> Option<&mut PageTableEntryImpl>;

    fn find_pte(&self, vpn: VirtPageNum) -> Option<&mut PageTableEntryImpl>;

    /// 页帧耗尽时返回 `None`，已建立的映射保持不变。
    fn map(&mut self, vpn: VirtPageNum, ppn: PhysPageNum, flags: MapPermission) -> Option<()>;

    fn unmap(&mut self, vpn: VirtPageNum);

    fn translate(&self, vpn: VirtPageNum) -> Option<PageTableEntryImpl>;

    fn translate_va(&self, va: VirtAddr) -> Option<PhysAddr>;

    fn activate(&self);

    fn token(&self) -> usize;
}

/// 把用户空间的一段缓冲区翻译成内核可直接访问的切片集合。
/// 缓冲区可能跨页，因此结果是按页切开的多个切片。
pub fn translated_byte_buffer(token: usize, ptr: *const u8, len: usize) -> Vec<&'static mut [u8]> {
    let page_table: PageTableImpl = PageTable::from_token(token);
    let mut start = ptr as usize;
    let end = start + len;
    let mut v = Vec::new();
    while start < end {
        let start_va = VirtAddr::from(start);
        let mut vpn = start_va.floor();
        let ppn = page_table.translate(vpn).unwrap().ppn();
        vpn.step();
        let mut end_va: VirtAddr = vpn.into();
        end_va = end_va.min(VirtAddr::from(end));
        if end_va.page_offset() == 0 {
            v.push(&mut ppn.get_bytes_array()[start_va.page_offset()..]);
        } else {
            v.push(&mut ppn.get_bytes_array()[start_va.page_offset()..end_va.page_offset()]);
        }
        start = end_va.into();
    }
    v
}

/// 从用户地址空间读出一个以 `\0` 结尾的字符串（结果不含 `\0`）。
///
/// 在 `max_len` 字节内未遇到 `\0`，或中途越过未映射页，返回 `None`。
pub fn translated_str(token: usize, ptr: *const u8, max_len: usize) -> Option<String> {
    let page_table: PageTableImpl = PageTable::from_token(token);
    let mut string = String::new();
    let mut va = ptr as usize;
    loop {
        if string.len() == max_len {
            return None;
        }
        let ch: u8 = *(page_table.translate_va(VirtAddr::from(va))?.get_ref());
        if ch == 0 {
            break;
        }
        string.push(ch as char);
        va += 1;
    }
    Some(string)
}

/// 指针落在未映射页时返回 `None`。
pub fn translated_ref<T>(token: usize, ptr: *const T) -> Option<&'static T> {
    let page_table: PageTableImpl = PageTable::from_token(token);
    page_table
        .translate_va(VirtAddr::from(ptr as usize))
        .map(|pa| pa.get_ref())
}
