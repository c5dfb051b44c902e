//! # Symbol Start Tests
//!
//! Which symbols the descriptor hook claims, how many bytes it covers, and
//! the status it reports.

use gfxdis_core::common::DecodeStatus;
use gfxdis_core::common::error::KernelDescriptorError;
use gfxdis_core::isa::symbol::{STT_AMDGPU_HSA_KERNEL, STT_NOTYPE, STT_OBJECT};
use gfxdis_core::on_symbol_start;
use rstest::rstest;

use crate::common::builder::descriptor::DescriptorBuilder;
use crate::common::harness::target;

/// `STT_FUNC`.
const STT_FUNC: u8 = 2;

/// Legacy kernels cover their 256-byte header and are not decoded.
#[test]
fn legacy_kernel_code() {
    let start = on_symbol_start(&target("gfx900"), "kernel", STT_AMDGPU_HSA_KERNEL, &[0; 256], 0x100).unwrap();
    assert_eq!(start.size, 256);
    assert_eq!(start.result, Err(KernelDescriptorError::LegacyKernelCode));
    assert_eq!(start.status(), DecodeStatus::Fail);
}

/// A `.kd` object decodes as a descriptor named after the kernel.
#[test]
fn kernel_descriptor_object() {
    let bytes = DescriptorBuilder::new().kernarg_size(32).build();
    let start = on_symbol_start(&target("gfx900"), "foo.kd", STT_OBJECT, &bytes, 0x2000).unwrap();
    assert_eq!(start.size, 64);
    assert_eq!(start.status(), DecodeStatus::Success);
    let kd = start.result.unwrap();
    assert_eq!(kd.name, "foo");
    assert_eq!(kd.directive(".amdhsa_kernarg_size"), Some(32));
}

/// Only the first 64 bytes after the symbol belong to the record.
#[test]
fn trailing_bytes_ignored() {
    let mut bytes = DescriptorBuilder::new().build().to_vec();
    bytes.extend_from_slice(&[0xFF; 16]);
    let start = on_symbol_start(&target("gfx1100"), "bar.kd", STT_OBJECT, &bytes, 0x40).unwrap();
    assert_eq!(start.size, 64);
    assert_eq!(start.status(), DecodeStatus::Success);
}

/// A bad record is still claimed, with a failing status.
#[rstest]
#[case::misaligned(DescriptorBuilder::new().build().to_vec(), 0x2010, KernelDescriptorError::Misaligned(0x2010))]
#[case::short(vec![0; 32], 0x2000, KernelDescriptorError::Size { expected: 64, actual: 32 })]
fn bad_record_claimed(#[case] bytes: Vec<u8>, #[case] address: u64, #[case] err: KernelDescriptorError) {
    let start = on_symbol_start(&target("gfx900"), "foo.kd", STT_OBJECT, &bytes, address).unwrap();
    assert_eq!(start.size, 64);
    assert_eq!(start.status(), DecodeStatus::Fail);
    assert_eq!(start.result, Err(err));
}

/// Everything else is left to the instruction decoder.
#[rstest]
#[case::plain_object("foo", STT_OBJECT)]
#[case::kd_function("foo.kd", STT_FUNC)]
#[case::kd_label("foo.kd", STT_NOTYPE)]
#[case::function("main", STT_FUNC)]
fn not_claimed(#[case] name: &str, #[case] st_type: u8) {
    let bytes = DescriptorBuilder::new().build();
    assert!(on_symbol_start(&target("gfx900"), name, st_type, &bytes, 0).is_none());
}
