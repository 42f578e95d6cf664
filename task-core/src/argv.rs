//! # 用户栈参数区布局
//!
//! ## Overview
//! 计算新进程用户栈顶的参数区镜像：自栈顶向下依次是
//! 参数字符串（含 `\0`）、以空指针结尾的指针数组、参数个数，
//! 最终栈指针按 8 字节对齐。指针数组中的地址是 **目标地址空间**
//! 中的虚拟地址，与镜像在内核中的存放位置无关。
//!
//! 按 RISC-V 64 调用约定：指针宽 8 字节，`argc`/`argv` 同时
//! 经由 `a0`/`a1` 寄存器交付，栈上镜像保持可遍历结构。

use alloc::vec;
use alloc::vec::Vec;

const PTR_SIZE: usize = core::mem::size_of::<usize>();

/// 单次进程创建允许的参数个数上限。
pub const MAX_ARGS: usize = 16;
/// 参数区镜像总大小上限（一页），含 argc 槽、指针数组与字符串区。
/// 远小于用户栈，保证镜像铺设不会越过栈底。
pub const MAX_IMAGE_BYTES: usize = 4096;

/// 参数区镜像。`bytes` 应整体拷贝到目标地址空间的 `sp` 处。
pub struct ArgvImage {
    /// 进程入口看到的初始栈指针（8 字节对齐，指向 argc 槽）
    pub sp: usize,
    pub argc: usize,
    /// 指针数组在目标地址空间中的基址（交付到 `a1`）
    pub argv_base: usize,
    pub bytes: Vec<u8>,
}

/// 在 `stack_top` 之下构造参数区。
///
/// ## Panics
/// - 参数总长超出 `stack_top` 以下可用空间时下溢 panic；
///   调用方负责保证用户栈足够容纳参数区
pub fn build(stack_top: usize, args: &[&str]) -> ArgvImage {
    let argc = args.len();
    let strings_len: usize = args.iter().map(|s| s.len() + 1).sum();
    let strings_base = stack_top - strings_len;
    // 指针数组含结尾空项，基址对齐到指针宽度
    let argv_base = (strings_base - (argc + 1) * PTR_SIZE) & !(PTR_SIZE - 1);
    let sp = argv_base - PTR_SIZE;

    let mut bytes = vec![0u8; stack_top - sp];
    let off = |addr: usize| addr - sp;

    bytes[off(sp)..off(sp) + PTR_SIZE].copy_from_slice(&argc.to_le_bytes());

    let mut cursor = strings_base;
    for (i, arg) in args.iter().enumerate() {
        let slot = off(argv_base) + i * PTR_SIZE;
        bytes[slot..slot + PTR_SIZE].copy_from_slice(&cursor.to_le_bytes());
        bytes[off(cursor)..off(cursor) + arg.len()].copy_from_slice(arg.as_bytes());
        cursor += arg.len() + 1; // 终止符由零初始化保证
    }
    // 指针数组结尾空项同样由零初始化保证

    ArgvImage {
        sp,
        argc,
        argv_base,
        bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOP: usize = 0xffff_e000;

    fn read_ptr(img: &ArgvImage, addr: usize) -> usize {
        let off = addr - img.sp;
        usize::from_le_bytes(img.bytes[off..off + PTR_SIZE].try_into().unwrap())
    }

    fn read_str(img: &ArgvImage, addr: usize) -> String {
        let mut off = addr - img.sp;
        let mut s = String::new();
        while img.bytes[off] != 0 {
            s.push(img.bytes[off] as char);
            off += 1;
        }
        s
    }

    #[test]
    fn layout_recovers_argc_and_strings() {
        let img = build(TOP, &["fake_ai", "bonjour tout le monde"]);
        assert_eq!(img.argc, 2);
        assert_eq!(read_ptr(&img, img.sp), 2);
        assert_eq!(read_str(&img, read_ptr(&img, img.argv_base)), "fake_ai");
        assert_eq!(
            read_str(&img, read_ptr(&img, img.argv_base + PTR_SIZE)),
            "bonjour tout le monde"
        );
        // 指针数组以空项结尾
        assert_eq!(read_ptr(&img, img.argv_base + 2 * PTR_SIZE), 0);
    }

    #[test]
    fn sp_is_aligned_and_below_argv() {
        let img = build(TOP, &["shell", "x"]);
        assert_eq!(img.sp % PTR_SIZE, 0);
        assert_eq!(img.argv_base, img.sp + PTR_SIZE);
        assert_eq!(img.bytes.len(), TOP - img.sp);
    }

    #[test]
    fn strings_sit_highest_in_stack_order() {
        let img = build(TOP, &["a", "bb", "ccc"]);
        let p0 = read_ptr(&img, img.argv_base);
        let p1 = read_ptr(&img, img.argv_base + PTR_SIZE);
        let p2 = read_ptr(&img, img.argv_base + 2 * PTR_SIZE);
        assert!(img.argv_base < p0 && p0 < p1 && p1 < p2);
        assert_eq!(p2 + "ccc".len() + 1, TOP);
    }

    #[test]
    fn image_size_matches_per_arg_accounting() {
        // 内核拒收超限参数时按「argc 槽 + 结尾空指针 + 每参数
        // (长度+1+指针)」累计，该值与真实镜像只差对齐填充
        let args = ["shell", "bonjour"];
        let accounted: usize =
            2 * PTR_SIZE + args.iter().map(|a| a.len() + 1 + PTR_SIZE).sum::<usize>();
        let img = build(TOP, &args);
        assert!(img.bytes.len() >= accounted);
        assert!(img.bytes.len() < accounted + PTR_SIZE);
    }

    #[test]
    fn capped_args_always_fit_within_image_budget() {
        // 个数与字节数都贴着上限的参数组，镜像仍不超过单页预算
        let long_arg = "x".repeat(200);
        let args: Vec<&str> = (0..MAX_ARGS).map(|_| long_arg.as_str()).collect();
        let accounted: usize =
            2 * PTR_SIZE + args.iter().map(|a| a.len() + 1 + PTR_SIZE).sum::<usize>();
        assert!(accounted <= MAX_IMAGE_BYTES);
        let img = build(TOP, &args);
        assert!(img.bytes.len() <= MAX_IMAGE_BYTES);
        assert_eq!(img.argc, MAX_ARGS);
    }

    #[test]
    fn empty_argv_still_has_null_entry() {
        let img = build(TOP, &[]);
        assert_eq!(img.argc, 0);
        assert_eq!(read_ptr(&img, img.sp), 0);
        assert_eq!(read_ptr(&img, img.argv_base), 0);
        assert_eq!(img.sp % PTR_SIZE, 0);
    }
}
