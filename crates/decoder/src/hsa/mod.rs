//! HSA kernel descriptor decoding.
//!
//! A kernel descriptor is the 64-byte record the command processor reads to
//! launch a kernel. This module turns one back into the `.amdhsa_kernel`
//! directive block that would reassemble to the same bytes:
//! 1. **Layout:** Offsets and bit fields live in `fields`.
//! 2. **Words:** Each packed word is read field by field; every bit no field claims must be zero.
//! 3. **Symbols:** `on_symbol_start` recognizes descriptor and legacy kernel symbols in a code object.
//!
//! Register counts are stored granulated, so `.amdhsa_next_free_vgpr` and
//! `.amdhsa_next_free_sgpr` come back as the largest count with the same
//! encoding, and the `.amdhsa_reserve_*` directives that fed the SGPR count
//! are printed as 0.

/// Kernel descriptor offsets and bit fields.
pub mod fields;

use std::fmt;

use tracing::{debug, trace};

use crate::common::cursor::ByteCursor;
use crate::common::error::{DecodeStatus, KernelDescriptorError};
use crate::config::Target;
use crate::isa::instruction::BitField;
use crate::isa::symbol::{STT_AMDGPU_HSA_KERNEL, STT_OBJECT};

use self::fields::{preload, properties, rsrc1, rsrc2, rsrc3};

/// A decoded kernel descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KernelDescriptor {
    /// Kernel name, without the `.kd` suffix.
    pub name: String,
    /// Directive lines in record order, without indentation.
    ///
    /// Pseudo-directives that the assembler does not accept are kept as
    /// comment lines starting with `;`.
    pub directives: Vec<String>,
}

impl KernelDescriptor {
    /// Returns the value of the first directive named `name`.
    pub fn directive(&self, name: &str) -> Option<u64> {
        self.directives.iter().find_map(|line| {
            let (key, value) = line.split_once(' ')?;
            if key == name { value.parse().ok() } else { None }
        })
    }
}

impl fmt::Display for KernelDescriptor {
    /// Writes the `.amdhsa_kernel` block, one tab-indented directive per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ".amdhsa_kernel {}", self.name)?;
        for line in &self.directives {
            writeln!(f, "\t{line}")?;
        }
        writeln!(f, ".end_amdhsa_kernel")
    }
}

/// Reader for one packed descriptor word.
///
/// Tracks the bits claimed by fields so that the rest can be checked for zero.
struct Word<'o> {
    name: &'static str,
    offset: usize,
    value: u32,
    claimed: u32,
    out: &'o mut Vec<String>,
}

impl<'o> Word<'o> {
    const fn new(name: &'static str, offset: usize, value: u32, out: &'o mut Vec<String>) -> Self {
        Self {
            name,
            offset,
            value,
            claimed: 0,
            out,
        }
    }

    fn get(&mut self, field: BitField) -> u32 {
        let mask = ((1u64 << field.width) - 1) << field.lo;
        self.claimed |= mask as u32;
        field.extract(u128::from(self.value)) as u32
    }

    fn directive(&mut self, directive: &str, field: BitField) {
        let value = self.get(field);
        self.out.push(format!("{directive} {value}"));
    }

    fn comment(&mut self, name: &str, field: BitField) {
        let value = self.get(field);
        self.out.push(format!("; {name} {value}"));
    }

    fn finish(self) -> Result<(), KernelDescriptorError> {
        let reserved = self.value & !self.claimed;
        if reserved == 0 {
            return Ok(());
        }
        Err(KernelDescriptorError::ReservedBits {
            field: self.name,
            offset: self.offset,
            value: u64::from(reserved),
        })
    }
}

fn reserved_bytes(name: &'static str, offset: usize, bytes: &[u8]) -> Result<(), KernelDescriptorError> {
    match bytes.iter().position(|&b| b != 0) {
        None => Ok(()),
        Some(i) => Err(KernelDescriptorError::ReservedBits {
            field: name,
            offset: offset + i,
            value: u64::from(bytes[i]),
        }),
    }
}

/// Decodes a kernel descriptor record.
///
/// # Arguments
///
/// * `target` - Active target; decides which fields exist.
/// * `name` - Kernel name for the `.amdhsa_kernel` line.
/// * `bytes` - The record.
/// * `address` - Load address of the record.
///
/// # Returns
///
/// The directive block. The record is read in ascending offset order, so
/// RSRC3 directives precede RSRC1.
///
/// # Errors
///
/// * `KernelDescriptorError::Size` - `bytes` is not 64 bytes long.
/// * `KernelDescriptorError::Misaligned` - `address` is not 64-byte aligned.
/// * `KernelDescriptorError::ReservedBits` - A bit without a directive on this target is set.
/// * `KernelDescriptorError::SgprCount` - A non-zero SGPR count on GFX10+.
pub fn decode_kernel_descriptor(
    target: &Target,
    name: &str,
    bytes: &[u8],
    address: u64,
) -> Result<KernelDescriptor, KernelDescriptorError> {
    if bytes.len() != fields::KERNEL_DESCRIPTOR_SIZE {
        return Err(KernelDescriptorError::Size {
            expected: fields::KERNEL_DESCRIPTOR_SIZE,
            actual: bytes.len(),
        });
    }
    if !address.is_multiple_of(fields::KERNEL_DESCRIPTOR_ALIGN) {
        return Err(KernelDescriptorError::Misaligned(address));
    }

    // RSRC1 needs the wavefront size, which is stored after it.
    let wave32 = target.is_gfx10_plus().then(|| {
        let at = fields::KERNEL_CODE_PROPERTIES_OFFSET;
        let props = u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        properties::ENABLE_WAVEFRONT_SIZE32.extract(u128::from(props)) != 0
    });

    let reader = DescriptorReader { target, wave32 };
    let result = reader.read(bytes);
    match &result {
        Ok(directives) => trace!(kernel = name, directives = directives.len(), "decoded kernel descriptor"),
        Err(err) => debug!(kernel = name, %err, "rejected kernel descriptor"),
    }
    Ok(KernelDescriptor {
        name: name.to_owned(),
        directives: result?,
    })
}

/// Per-record state of the reader.
struct DescriptorReader<'t> {
    target: &'t Target,
    wave32: Option<bool>,
}

impl DescriptorReader<'_> {
    fn read(&self, bytes: &[u8]) -> Result<Vec<String>, KernelDescriptorError> {
        let truncated = || KernelDescriptorError::Size {
            expected: fields::KERNEL_DESCRIPTOR_SIZE,
            actual: bytes.len(),
        };
        let mut cursor = ByteCursor::new(bytes);
        let mut out = Vec::new();

        let group = cursor.read_u32().ok_or_else(truncated)?;
        out.push(format!(".amdhsa_group_segment_fixed_size {group}"));
        let private = cursor.read_u32().ok_or_else(truncated)?;
        out.push(format!(".amdhsa_private_segment_fixed_size {private}"));
        let kernarg = cursor.read_u32().ok_or_else(truncated)?;
        out.push(format!(".amdhsa_kernarg_size {kernarg}"));

        let reserved0 = cursor.read_bytes(4).ok_or_else(truncated)?;
        reserved_bytes("RESERVED0", fields::RESERVED0_OFFSET, reserved0)?;
        if !cursor.skip(8) {
            return Err(truncated());
        }
        let reserved1 = cursor.read_bytes(20).ok_or_else(truncated)?;
        reserved_bytes("RESERVED1", fields::RESERVED1_OFFSET, reserved1)?;

        let rsrc3 = cursor.read_u32().ok_or_else(truncated)?;
        self.rsrc3(rsrc3, &mut out)?;
        let rsrc1 = cursor.read_u32().ok_or_else(truncated)?;
        self.rsrc1(rsrc1, &mut out)?;
        let rsrc2 = cursor.read_u32().ok_or_else(truncated)?;
        self.rsrc2(rsrc2, &mut out)?;
        let props = cursor.read_u16().ok_or_else(truncated)?;
        self.code_properties(props, &mut out)?;
        let preload = cursor.read_u16().ok_or_else(truncated)?;
        Self::kernarg_preload(preload, &mut out);

        let reserved3 = cursor.read_bytes(4).ok_or_else(truncated)?;
        reserved_bytes("RESERVED3", fields::RESERVED3_OFFSET, reserved3)?;
        Ok(out)
    }

    fn rsrc1(&self, value: u32, out: &mut Vec<String>) -> Result<(), KernelDescriptorError> {
        let target = self.target;
        let mut word = Word::new("COMPUTE_PGM_RSRC1", fields::COMPUTE_PGM_RSRC1_OFFSET, value, out);

        let vgprs = word.get(rsrc1::GRANULATED_WORKITEM_VGPR_COUNT);
        let next_free_vgpr = (vgprs + 1) * target.vgpr_encoding_granule(self.wave32);
        word.out.push(format!(".amdhsa_next_free_vgpr {next_free_vgpr}"));

        let sgprs = word.get(rsrc1::GRANULATED_WAVEFRONT_SGPR_COUNT);
        if target.is_gfx10_plus() && sgprs != 0 {
            return Err(KernelDescriptorError::SgprCount(sgprs));
        }
        let next_free_sgpr = (sgprs + 1) * target.sgpr_encoding_granule();
        word.out.push(".amdhsa_reserve_vcc 0".to_owned());
        if !target.has_architected_flat_scratch() {
            word.out.push(".amdhsa_reserve_flat_scratch 0".to_owned());
        }
        word.out.push(".amdhsa_reserve_xnack_mask 0".to_owned());
        word.out.push(format!(".amdhsa_next_free_sgpr {next_free_sgpr}"));

        word.directive(".amdhsa_float_round_mode_32", rsrc1::FLOAT_ROUND_MODE_32);
        word.directive(".amdhsa_float_round_mode_16_64", rsrc1::FLOAT_ROUND_MODE_16_64);
        word.directive(".amdhsa_float_denorm_mode_32", rsrc1::FLOAT_DENORM_MODE_32);
        word.directive(".amdhsa_float_denorm_mode_16_64", rsrc1::FLOAT_DENORM_MODE_16_64);
        if !target.is_gfx12_plus() {
            word.directive(".amdhsa_dx10_clamp", rsrc1::DX10_CLAMP_WG_RR_EN);
            word.directive(".amdhsa_ieee_mode", rsrc1::IEEE_MODE);
        }
        if target.is_gfx9_plus() {
            word.directive(".amdhsa_fp16_overflow", rsrc1::FP16_OVFL);
        }
        if target.is_gfx10_plus() {
            word.directive(".amdhsa_workgroup_processor_mode", rsrc1::WGP_MODE);
            word.directive(".amdhsa_memory_ordered", rsrc1::MEM_ORDERED);
            word.directive(".amdhsa_forward_progress", rsrc1::FWD_PROGRESS);
        }
        if target.is_gfx12_plus() {
            word.directive(".amdhsa_round_robin_scheduling", rsrc1::DX10_CLAMP_WG_RR_EN);
        }
        word.finish()
    }

    fn rsrc2(&self, value: u32, out: &mut Vec<String>) -> Result<(), KernelDescriptorError> {
        let mut word = Word::new("COMPUTE_PGM_RSRC2", fields::COMPUTE_PGM_RSRC2_OFFSET, value, out);
        if self.target.has_architected_flat_scratch() {
            word.directive(".amdhsa_enable_private_segment", rsrc2::ENABLE_PRIVATE_SEGMENT);
        } else {
            word.directive(
                ".amdhsa_system_sgpr_private_segment_wavefront_offset",
                rsrc2::ENABLE_PRIVATE_SEGMENT,
            );
        }
        word.directive(".amdhsa_user_sgpr_count", rsrc2::USER_SGPR_COUNT);
        word.directive(".amdhsa_system_sgpr_workgroup_id_x", rsrc2::ENABLE_SGPR_WORKGROUP_ID_X);
        word.directive(".amdhsa_system_sgpr_workgroup_id_y", rsrc2::ENABLE_SGPR_WORKGROUP_ID_Y);
        word.directive(".amdhsa_system_sgpr_workgroup_id_z", rsrc2::ENABLE_SGPR_WORKGROUP_ID_Z);
        word.directive(".amdhsa_system_sgpr_workgroup_info", rsrc2::ENABLE_SGPR_WORKGROUP_INFO);
        word.directive(".amdhsa_system_vgpr_workitem_id", rsrc2::ENABLE_VGPR_WORKITEM_ID);
        word.directive(
            ".amdhsa_exception_fp_ieee_invalid_op",
            rsrc2::EXCEPTION_IEEE_754_FP_INVALID_OPERATION,
        );
        word.directive(".amdhsa_exception_fp_denorm_src", rsrc2::EXCEPTION_FP_DENORMAL_SOURCE);
        word.directive(
            ".amdhsa_exception_fp_ieee_div_zero",
            rsrc2::EXCEPTION_IEEE_754_FP_DIVISION_BY_ZERO,
        );
        word.directive(".amdhsa_exception_fp_ieee_overflow", rsrc2::EXCEPTION_IEEE_754_FP_OVERFLOW);
        word.directive(".amdhsa_exception_fp_ieee_underflow", rsrc2::EXCEPTION_IEEE_754_FP_UNDERFLOW);
        word.directive(".amdhsa_exception_fp_ieee_inexact", rsrc2::EXCEPTION_IEEE_754_FP_INEXACT);
        word.directive(".amdhsa_exception_int_div_zero", rsrc2::EXCEPTION_INT_DIVIDE_BY_ZERO);
        word.finish()
    }

    fn rsrc3(&self, value: u32, out: &mut Vec<String>) -> Result<(), KernelDescriptorError> {
        let target = self.target;
        let mut word = Word::new("COMPUTE_PGM_RSRC3", fields::COMPUTE_PGM_RSRC3_OFFSET, value, out);
        if target.is_gfx90a() {
            let accum = word.get(rsrc3::GFX90A_ACCUM_OFFSET);
            word.out.push(format!(".amdhsa_accum_offset {}", (accum + 1) * 4));
            word.directive(".amdhsa_tg_split", rsrc3::GFX90A_TG_SPLIT);
        } else if target.is_gfx10_plus() {
            if !target.is_gfx12_plus() {
                if self.wave32 == Some(true) {
                    word.comment("SHARED_VGPR_COUNT", rsrc3::GFX10_GFX11_SHARED_VGPR_COUNT);
                } else {
                    word.directive(".amdhsa_shared_vgpr_count", rsrc3::GFX10_GFX11_SHARED_VGPR_COUNT);
                }
            }
            if target.is_gfx11() {
                word.comment("INST_PREF_SIZE", rsrc3::GFX11_INST_PREF_SIZE);
                word.comment("TRAP_ON_START", rsrc3::GFX11_TRAP_ON_START);
                word.comment("TRAP_ON_END", rsrc3::GFX11_TRAP_ON_END);
            } else if target.is_gfx12_plus() {
                word.comment("INST_PREF_SIZE", rsrc3::GFX12_INST_PREF_SIZE);
                word.comment("GLG_EN", rsrc3::GFX12_GLG_EN);
            }
            if target.is_gfx11_plus() {
                word.comment("IMAGE_OP", rsrc3::GFX11_IMAGE_OP);
            }
        }
        word.finish()
    }

    fn code_properties(&self, value: u16, out: &mut Vec<String>) -> Result<(), KernelDescriptorError> {
        let target = self.target;
        let flat_scratch = !target.has_architected_flat_scratch();
        let mut word = Word::new(
            "KERNEL_CODE_PROPERTIES",
            fields::KERNEL_CODE_PROPERTIES_OFFSET,
            u32::from(value),
            out,
        );
        if flat_scratch {
            word.directive(
                ".amdhsa_user_sgpr_private_segment_buffer",
                properties::ENABLE_SGPR_PRIVATE_SEGMENT_BUFFER,
            );
        }
        word.directive(".amdhsa_user_sgpr_dispatch_ptr", properties::ENABLE_SGPR_DISPATCH_PTR);
        word.directive(".amdhsa_user_sgpr_queue_ptr", properties::ENABLE_SGPR_QUEUE_PTR);
        word.directive(
            ".amdhsa_user_sgpr_kernarg_segment_ptr",
            properties::ENABLE_SGPR_KERNARG_SEGMENT_PTR,
        );
        word.directive(".amdhsa_user_sgpr_dispatch_id", properties::ENABLE_SGPR_DISPATCH_ID);
        if flat_scratch {
            word.directive(
                ".amdhsa_user_sgpr_flat_scratch_init",
                properties::ENABLE_SGPR_FLAT_SCRATCH_INIT,
            );
        }
        word.directive(
            ".amdhsa_user_sgpr_private_segment_size",
            properties::ENABLE_SGPR_PRIVATE_SEGMENT_SIZE,
        );
        if target.is_gfx10_plus() {
            word.directive(".amdhsa_wavefront_size32", properties::ENABLE_WAVEFRONT_SIZE32);
        }
        if target.code_object_version >= 5 {
            word.directive(".amdhsa_uses_dynamic_stack", properties::USES_DYNAMIC_STACK);
        }
        word.finish()
    }

    fn kernarg_preload(value: u16, out: &mut Vec<String>) {
        let value = u128::from(value);
        let length = preload::LENGTH.extract(value);
        if length != 0 {
            out.push(format!(".amdhsa_user_sgpr_kernarg_preload_length {length}"));
        }
        let offset = preload::OFFSET.extract(value);
        if offset != 0 {
            out.push(format!(".amdhsa_user_sgpr_kernarg_preload_offset {offset}"));
        }
    }
}

/// What a symbol at the start of a region turned out to be.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolStart {
    /// Bytes covered by the symbol's record.
    pub size: usize,
    /// The decoded descriptor, or why it could not be decoded.
    pub result: Result<KernelDescriptor, KernelDescriptorError>,
}

impl SymbolStart {
    /// `Success` for a decoded descriptor, `Fail` otherwise.
    pub const fn status(&self) -> DecodeStatus {
        match self.result {
            Ok(_) => DecodeStatus::Success,
            Err(_) => DecodeStatus::Fail,
        }
    }
}

/// Inspects a symbol before its bytes are disassembled as code.
///
/// # Arguments
///
/// * `target` - Active target.
/// * `name` - Symbol name.
/// * `st_type` - ELF symbol type.
/// * `bytes` - Bytes from the symbol's address to the end of its section.
/// * `address` - Symbol address.
///
/// # Returns
///
/// * `Some` with size 256 and a failure for legacy `amd_kernel_code_t` kernels.
/// * `Some` with size 64 and the decode result for `.kd` data objects.
/// * `None` for anything else; the bytes should be decoded as instructions.
pub fn on_symbol_start(
    target: &Target,
    name: &str,
    st_type: u8,
    bytes: &[u8],
    address: u64,
) -> Option<SymbolStart> {
    if st_type == STT_AMDGPU_HSA_KERNEL {
        return Some(SymbolStart {
            size: fields::AMD_KERNEL_CODE_T_SIZE,
            result: Err(KernelDescriptorError::LegacyKernelCode),
        });
    }
    let kernel = name.strip_suffix(fields::KD_SUFFIX)?;
    if st_type != STT_OBJECT {
        return None;
    }
    let record = &bytes[..bytes.len().min(fields::KERNEL_DESCRIPTOR_SIZE)];
    Some(SymbolStart {
        size: fields::KERNEL_DESCRIPTOR_SIZE,
        result: decode_kernel_descriptor(target, kernel, record, address),
    })
}
