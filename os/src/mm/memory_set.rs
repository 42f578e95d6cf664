//! 地址空间
//!
//! # Overview
//! `MemorySet` 描述一个完整的地址空间：一张页表加若干逻辑段
//! （`MapArea`）。内核地址空间对各段恒等映射；用户地址空间由
//! 可执行镜像构造，代码/数据段之上是固定位置的用户栈、
//! 陷入上下文页和跳板页。
//!
//! # Behavior
//! - `from_elf` 先校验镜像（魔数、架构、文件类型），任何一项
//!   不合法都返回 `LoadError` 而不产生任何副作用
//! - 构造期间物理页帧耗尽返回 `OutOfMemory`，半成品地址空间
//!   连同已分配的页帧整体回收
//! - 构造成功前不触碰调用者的地址空间，exec 失败可以安全回到
//!   原任务继续执行
//!
//! # Invariants
//! - 每个 `MapArea` 的页帧由 `data_frames` 持有，区段销毁时回收
//! - 跳板页在所有地址空间中映射到同一物理页

use crate::hal::{
    PTEFlags, PageTableEntryImpl, PageTableImpl, MEMORY_END, PAGE_SIZE, TRAMPOLINE,
    TRAP_CONTEXT_BASE, USER_STACK_SIZE, USER_STACK_TOP,
};
use crate::mm::address::{PhysAddr, PhysPageNum, StepByOne, VPNRange, VirtAddr, VirtPageNum};
use crate::mm::frame_allocator::{frame_alloc, FrameTracker};
use crate::mm::pagetable::PageTable;
use crate::sync::UPIntrFreeCell;
use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use alloc::vec::Vec;
use bitflags::*;
use lazy_static::*;

extern "C" {
    fn stext();
    fn etext();
    fn srodata();
    fn erodata();
    fn sdata();
    fn edata();
    fn sbss_with_stack();
    fn ebss();
    fn ekernel();
    fn strampoline();
}

lazy_static! {
    /// 内核地址空间。启动早期构造，此后所有内核栈都映射在其中。
    pub static ref KERNEL_SPACE: Arc<UPIntrFreeCell<MemorySet>> =
        Arc::new(unsafe { UPIntrFreeCell::new(MemorySet::new_kernel()) });
}

pub fn kernel_token() -> usize {
    KERNEL_SPACE.exclusive_access().token()
}

/// 可执行镜像校验失败的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    /// 不是 ELF（魔数错误或头部不完整）
    BadMagic,
    /// 目标架构不是 riscv64
    WrongArch,
    /// 文件类型不是可执行文件
    NotExecutable,
    /// 构造地址空间途中物理页帧耗尽
    OutOfMemory,
}

bitflags! {
    /// 逻辑段访问权限，位布局与 `PTEFlags` 的 R/W/X/U 对齐
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct MapPermission: u8 {
        const R = 1 << 1;
        const W = 1 << 2;
        const X = 1 << 3;
        const U = 1 << 4;
    }
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub enum MapType {
    Identical,
    Framed,
}

/// 一段连续虚拟页的映射
pub struct MapArea {
    vpn_range: VPNRange,
    data_frames: BTreeMap<VirtPageNum, FrameTracker>,
    map_type: MapType,
    map_perm: MapPermission,
}

impl MapArea {
    pub fn new(
        start_va: VirtAddr,
        end_va: VirtAddr,
        map_type: MapType,
        map_perm: MapPermission,
    ) -> Self {
        let start_vpn: VirtPageNum = start_va.floor();
        let end_vpn: VirtPageNum = end_va.ceil();
        Self {
            vpn_range: VPNRange::new(start_vpn, end_vpn),
            data_frames: BTreeMap::new(),
            map_type,
            map_perm,
        }
    }

    /// 页帧耗尽时返回 `None`，已挂入 `data_frames` 的页帧
    /// 留待区段整体销毁时回收。
    pub fn map_one(&mut self, page_table: &mut PageTableImpl, vpn: VirtPageNum) -> Option<()> {
        let ppn: PhysPageNum;
        match self.map_type {
            MapType::Identical => {
                ppn = PhysPageNum(vpn.0);
            }
            MapType::Framed => {
                let frame = frame_alloc()?;
                ppn = frame.ppn;
                self.data_frames.insert(vpn, frame);
            }
        }
        page_table.map(vpn, ppn, self.map_perm)
    }

    pub fn unmap_one(&mut self, page_table: &mut PageTableImpl, vpn: VirtPageNum) {
        if self.map_type == MapType::Framed {
            self.data_frames.remove(&vpn);
        }
        page_table.unmap(vpn);
    }

    pub fn map(&mut self, page_table: &mut PageTableImpl) -> Option<()> {
        for vpn in self.vpn_range {
            self.map_one(page_table, vpn)?;
        }
        Some(())
    }

    pub fn unmap(&mut self, page_table: &mut PageTableImpl) {
        for vpn in self.vpn_range {
            self.unmap_one(page_table, vpn);
        }
    }

    /// 把 `data` 逐页拷入本区段。只对 Framed 区段有意义。
    pub fn copy_data(&mut self, page_table: &mut PageTableImpl, data: &[u8]) {
        assert_eq!(self.map_type, MapType::Framed);
        let mut start: usize = 0;
        let mut current_vpn = self.vpn_range.get_start();
        let len = data.len();
        loop {
            let src = &data[start..len.min(start + PAGE_SIZE)];
            let dst = &mut page_table
                .translate(current_vpn)
                .unwrap()
                .ppn()
                .get_bytes_array()[..src.len()];
            dst.copy_from_slice(src);
            start += PAGE_SIZE;
            if start >= len {
                break;
            }
            current_vpn.step();
        }
    }
}

/// 地址空间：页表 + 逻辑段集合
pub struct MemorySet {
    page_table: PageTableImpl,
    areas: Vec<MapArea>,
}

impl MemorySet {
    pub fn new_bare() -> Option<Self> {
        Some(Self {
            page_table: PageTable::new()?,
            areas: Vec::new(),
        })
    }

    pub fn token(&self) -> usize {
        self.page_table.token()
    }

    pub fn activate(&self) {
        self.page_table.activate();
    }

    pub fn translate(&self, vpn: VirtPageNum) -> Option<PageTableEntryImpl> {
        self.page_table.translate(vpn)
    }

    /// 映射一段按帧分配的区域（内核栈使用）。页帧耗尽返回 `None`。
    pub fn insert_framed_area(
        &mut self,
        start_va: VirtAddr,
        end_va: VirtAddr,
        permission: MapPermission,
    ) -> Option<()> {
        self.push(
            MapArea::new(start_va, end_va, MapType::Framed, permission),
            None,
        )
    }

    /// 解除以 `start_vpn` 开头的区域的映射并回收其页帧。
    pub fn remove_area_with_start_vpn(&mut self, start_vpn: VirtPageNum) {
        if let Some((idx, area)) = self
            .areas
            .iter_mut()
            .enumerate()
            .find(|(_, area)| area.vpn_range.get_start() == start_vpn)
        {
            area.unmap(&mut self.page_table);
            self.areas.remove(idx);
        }
    }

    fn push(&mut self, mut map_area: MapArea, data: Option<&[u8]>) -> Option<()> {
        map_area.map(&mut self.page_table)?;
        if let Some(data) = data {
            map_area.copy_data(&mut self.page_table, data);
        }
        self.areas.push(map_area);
        Some(())
    }

    /// 跳板页不属于任何 `MapArea`，单独映射。
    fn map_trampoline(&mut self) -> Option<()> {
        let pte = self
            .page_table
            .find_pte_create(VirtAddr::from(TRAMPOLINE).into())?;
        *pte = PageTableEntryImpl::new(
            PhysAddr::from(strampoline as usize).into(),
            PTEFlags::R | PTEFlags::X | PTEFlags::V,
        );
        Some(())
    }

    /// 构造内核地址空间：各段恒等映射，可用物理内存恒等映射为 RW。
    ///
    /// 启动早期物理内存必然充足，页帧耗尽视为内核缺陷直接 panic。
    pub fn new_kernel() -> Self {
        let mut memory_set = Self::new_bare().unwrap();
        memory_set.map_trampoline().unwrap();
        log::info!(".text [{:#x}, {:#x})", stext as usize, etext as usize);
        log::info!(".rodata [{:#x}, {:#x})", srodata as usize, erodata as usize);
        log::info!(".data [{:#x}, {:#x})", sdata as usize, edata as usize);
        log::info!(
            ".bss [{:#x}, {:#x})",
            sbss_with_stack as usize,
            ebss as usize
        );
        memory_set.push(
            MapArea::new(
                (stext as usize).into(),
                (etext as usize).into(),
                MapType::Identical,
                MapPermission::R | MapPermission::X,
            ),
            None,
        )
        .unwrap();
        memory_set.push(
            MapArea::new(
                (srodata as usize).into(),
                (erodata as usize).into(),
                MapType::Identical,
                MapPermission::R,
            ),
            None,
        )
        .unwrap();
        memory_set.push(
            MapArea::new(
                (sdata as usize).into(),
                (edata as usize).into(),
                MapType::Identical,
                MapPermission::R | MapPermission::W,
            ),
            None,
        )
        .unwrap();
        memory_set.push(
            MapArea::new(
                (sbss_with_stack as usize).into(),
                (ebss as usize).into(),
                MapType::Identical,
                MapPermission::R | MapPermission::W,
            ),
            None,
        )
        .unwrap();
        memory_set.push(
            MapArea::new(
                (ekernel as usize).into(),
                MEMORY_END.into(),
                MapType::Identical,
                MapPermission::R | MapPermission::W,
            ),
            None,
        )
        .unwrap();
        memory_set
    }

    /// 从可执行镜像构造用户地址空间。
    ///
    /// ## Behavior
    /// - 校验失败立即返回 `Err`，不分配任何页帧
    /// - 构造途中页帧耗尽返回 `Err(OutOfMemory)`，已分配的页帧随
    ///   半成品地址空间一并回收
    /// - 成功时返回 (地址空间, 用户栈顶, 入口地址)
    pub fn from_elf(elf_data: &[u8]) -> Result<(Self, usize, usize), LoadError> {
        let elf = xmas_elf::ElfFile::new(elf_data).map_err(|_| LoadError::BadMagic)?;
        let elf_header = elf.header;
        let magic = elf_header.pt1.magic;
        if magic != [0x7f, 0x45, 0x4c, 0x46] {
            return Err(LoadError::BadMagic);
        }
        if elf_header.pt2.machine().as_machine() != xmas_elf::header::Machine::RISC_V {
            return Err(LoadError::WrongArch);
        }
        if elf_header.pt2.type_().as_type() != xmas_elf::header::Type::Executable {
            return Err(LoadError::NotExecutable);
        }

        let mut memory_set = Self::new_bare().ok_or(LoadError::OutOfMemory)?;
        memory_set
            .map_trampoline()
            .ok_or(LoadError::OutOfMemory)?;
        let ph_count = elf_header.pt2.ph_count();
        for i in 0..ph_count {
            let ph = elf.program_header(i).map_err(|_| LoadError::BadMagic)?;
            if ph.get_type() == Ok(xmas_elf::program::Type::Load) {
                let start_va: VirtAddr = (ph.virtual_addr() as usize).into();
                let end_va: VirtAddr = ((ph.virtual_addr() + ph.mem_size()) as usize).into();
                let mut map_perm = MapPermission::U;
                let ph_flags = ph.flags();
                if ph_flags.is_read() {
                    map_perm |= MapPermission::R;
                }
                if ph_flags.is_write() {
                    map_perm |= MapPermission::W;
                }
                if ph_flags.is_execute() {
                    map_perm |= MapPermission::X;
                }
                let map_area = MapArea::new(start_va, end_va, MapType::Framed, map_perm);
                memory_set
                    .push(
                        map_area,
                        Some(
                            &elf.input
                                [ph.offset() as usize..(ph.offset() + ph.file_size()) as usize],
                        ),
                    )
                    .ok_or(LoadError::OutOfMemory)?;
            }
        }
        // 固定位置的用户栈，栈顶紧贴陷入上下文页之下的保护页
        memory_set
            .push(
                MapArea::new(
                    (USER_STACK_TOP - USER_STACK_SIZE).into(),
                    USER_STACK_TOP.into(),
                    MapType::Framed,
                    MapPermission::R | MapPermission::W | MapPermission::U,
                ),
                None,
            )
            .ok_or(LoadError::OutOfMemory)?;
        // 陷入上下文页，仅内核可访问
        memory_set
            .push(
                MapArea::new(
                    TRAP_CONTEXT_BASE.into(),
                    TRAMPOLINE.into(),
                    MapType::Framed,
                    MapPermission::R | MapPermission::W,
                ),
                None,
            )
            .ok_or(LoadError::OutOfMemory)?;
        let entry_point = elf_header.pt2.entry_point() as usize;
        Ok((memory_set, USER_STACK_TOP, entry_point))
    }
}
