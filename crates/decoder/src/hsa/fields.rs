//! Kernel descriptor layout.
//!
//! Byte offsets of the 64-byte record and bit fields of its packed words. Field
//! positions are shared across generations; which of them carry a directive on
//! a given target is decided by the reader.

use crate::isa::instruction::BitField;

/// Size of a kernel descriptor record.
pub const KERNEL_DESCRIPTOR_SIZE: usize = 64;

/// Required alignment of a kernel descriptor address.
pub const KERNEL_DESCRIPTOR_ALIGN: u64 = 64;

/// Size of a legacy `amd_kernel_code_t` header.
pub const AMD_KERNEL_CODE_T_SIZE: usize = 256;

/// Symbol name suffix of kernel descriptor objects.
pub const KD_SUFFIX: &str = ".kd";

/// `GROUP_SEGMENT_FIXED_SIZE` offset.
pub const GROUP_SEGMENT_FIXED_SIZE_OFFSET: usize = 0;

/// `PRIVATE_SEGMENT_FIXED_SIZE` offset.
pub const PRIVATE_SEGMENT_FIXED_SIZE_OFFSET: usize = 4;

/// `KERNARG_SIZE` offset.
pub const KERNARG_SIZE_OFFSET: usize = 8;

/// First reserved block (4 bytes).
pub const RESERVED0_OFFSET: usize = 12;

/// `KERNEL_CODE_ENTRY_BYTE_OFFSET` offset (8 bytes, not decoded).
pub const KERNEL_CODE_ENTRY_BYTE_OFFSET_OFFSET: usize = 16;

/// Second reserved block (20 bytes).
pub const RESERVED1_OFFSET: usize = 24;

/// `COMPUTE_PGM_RSRC3` offset.
pub const COMPUTE_PGM_RSRC3_OFFSET: usize = 44;

/// `COMPUTE_PGM_RSRC1` offset.
pub const COMPUTE_PGM_RSRC1_OFFSET: usize = 48;

/// `COMPUTE_PGM_RSRC2` offset.
pub const COMPUTE_PGM_RSRC2_OFFSET: usize = 52;

/// `KERNEL_CODE_PROPERTIES` offset (u16).
pub const KERNEL_CODE_PROPERTIES_OFFSET: usize = 56;

/// `KERNARG_PRELOAD` offset (u16).
pub const KERNARG_PRELOAD_OFFSET: usize = 58;

/// Trailing reserved block (4 bytes).
pub const RESERVED3_OFFSET: usize = 60;

/// `COMPUTE_PGM_RSRC1` fields.
#[allow(missing_docs)]
pub mod rsrc1 {
    use super::BitField;

    /// Granulated work-item VGPR count.
    pub const GRANULATED_WORKITEM_VGPR_COUNT: BitField = BitField::new(0, 6);
    /// Granulated wavefront SGPR count.
    pub const GRANULATED_WAVEFRONT_SGPR_COUNT: BitField = BitField::new(6, 4);
    pub const PRIORITY: BitField = BitField::new(10, 2);
    pub const FLOAT_ROUND_MODE_32: BitField = BitField::new(12, 2);
    pub const FLOAT_ROUND_MODE_16_64: BitField = BitField::new(14, 2);
    pub const FLOAT_DENORM_MODE_32: BitField = BitField::new(16, 2);
    pub const FLOAT_DENORM_MODE_16_64: BitField = BitField::new(18, 2);
    pub const PRIV: BitField = BitField::new(20, 1);
    /// DX10 clamp before GFX12, WG round-robin scheduling from GFX12.
    pub const DX10_CLAMP_WG_RR_EN: BitField = BitField::new(21, 1);
    pub const DEBUG_MODE: BitField = BitField::new(22, 1);
    pub const IEEE_MODE: BitField = BitField::new(23, 1);
    pub const BULKY: BitField = BitField::new(24, 1);
    pub const CDBG_USER: BitField = BitField::new(25, 1);
    /// GFX9+ only.
    pub const FP16_OVFL: BitField = BitField::new(26, 1);
    /// GFX10+ only.
    pub const WGP_MODE: BitField = BitField::new(29, 1);
    /// GFX10+ only.
    pub const MEM_ORDERED: BitField = BitField::new(30, 1);
    /// GFX10+ only.
    pub const FWD_PROGRESS: BitField = BitField::new(31, 1);
}

/// `COMPUTE_PGM_RSRC2` fields.
#[allow(missing_docs)]
pub mod rsrc2 {
    use super::BitField;

    pub const ENABLE_PRIVATE_SEGMENT: BitField = BitField::new(0, 1);
    pub const USER_SGPR_COUNT: BitField = BitField::new(1, 5);
    pub const ENABLE_SGPR_WORKGROUP_ID_X: BitField = BitField::new(7, 1);
    pub const ENABLE_SGPR_WORKGROUP_ID_Y: BitField = BitField::new(8, 1);
    pub const ENABLE_SGPR_WORKGROUP_ID_Z: BitField = BitField::new(9, 1);
    pub const ENABLE_SGPR_WORKGROUP_INFO: BitField = BitField::new(10, 1);
    pub const ENABLE_VGPR_WORKITEM_ID: BitField = BitField::new(11, 2);
    pub const EXCEPTION_IEEE_754_FP_INVALID_OPERATION: BitField = BitField::new(24, 1);
    pub const EXCEPTION_FP_DENORMAL_SOURCE: BitField = BitField::new(25, 1);
    pub const EXCEPTION_IEEE_754_FP_DIVISION_BY_ZERO: BitField = BitField::new(26, 1);
    pub const EXCEPTION_IEEE_754_FP_OVERFLOW: BitField = BitField::new(27, 1);
    pub const EXCEPTION_IEEE_754_FP_UNDERFLOW: BitField = BitField::new(28, 1);
    pub const EXCEPTION_IEEE_754_FP_INEXACT: BitField = BitField::new(29, 1);
    pub const EXCEPTION_INT_DIVIDE_BY_ZERO: BitField = BitField::new(30, 1);
}

/// `COMPUTE_PGM_RSRC3` fields.
#[allow(missing_docs)]
pub mod rsrc3 {
    use super::BitField;

    /// GFX90A: AGPR offset within the unified register file.
    pub const GFX90A_ACCUM_OFFSET: BitField = BitField::new(0, 6);
    pub const GFX90A_TG_SPLIT: BitField = BitField::new(16, 1);
    pub const GFX10_GFX11_SHARED_VGPR_COUNT: BitField = BitField::new(0, 4);
    pub const GFX11_INST_PREF_SIZE: BitField = BitField::new(4, 6);
    pub const GFX11_TRAP_ON_START: BitField = BitField::new(10, 1);
    pub const GFX11_TRAP_ON_END: BitField = BitField::new(11, 1);
    pub const GFX12_INST_PREF_SIZE: BitField = BitField::new(4, 8);
    pub const GFX12_GLG_EN: BitField = BitField::new(13, 1);
    pub const GFX11_IMAGE_OP: BitField = BitField::new(31, 1);
}

/// `KERNEL_CODE_PROPERTIES` fields.
#[allow(missing_docs)]
pub mod properties {
    use super::BitField;

    pub const ENABLE_SGPR_PRIVATE_SEGMENT_BUFFER: BitField = BitField::new(0, 1);
    pub const ENABLE_SGPR_DISPATCH_PTR: BitField = BitField::new(1, 1);
    pub const ENABLE_SGPR_QUEUE_PTR: BitField = BitField::new(2, 1);
    pub const ENABLE_SGPR_KERNARG_SEGMENT_PTR: BitField = BitField::new(3, 1);
    pub const ENABLE_SGPR_DISPATCH_ID: BitField = BitField::new(4, 1);
    pub const ENABLE_SGPR_FLAT_SCRATCH_INIT: BitField = BitField::new(5, 1);
    pub const ENABLE_SGPR_PRIVATE_SEGMENT_SIZE: BitField = BitField::new(6, 1);
    pub const ENABLE_WAVEFRONT_SIZE32: BitField = BitField::new(10, 1);
    pub const USES_DYNAMIC_STACK: BitField = BitField::new(11, 1);
}

/// `KERNARG_PRELOAD` fields.
#[allow(missing_docs)]
pub mod preload {
    use super::BitField;

    pub const LENGTH: BitField = BitField::new(0, 7);
    pub const OFFSET: BitField = BitField::new(7, 9);
}
