use gfxdis_core::hsa::fields;

/// Fluent builder for a 64-byte kernel descriptor record.
#[derive(Clone, Debug)]
pub struct DescriptorBuilder {
    bytes: [u8; fields::KERNEL_DESCRIPTOR_SIZE],
}

impl Default for DescriptorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorBuilder {
    /// An all-zero record.
    pub const fn new() -> Self {
        Self {
            bytes: [0; fields::KERNEL_DESCRIPTOR_SIZE],
        }
    }

    pub fn u32_at(mut self, offset: usize, value: u32) -> Self {
        self.bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u16_at(mut self, offset: usize, value: u16) -> Self {
        self.bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
        self
    }

    pub fn byte_at(mut self, offset: usize, value: u8) -> Self {
        self.bytes[offset] = value;
        self
    }

    pub fn group_segment_size(self, value: u32) -> Self {
        self.u32_at(fields::GROUP_SEGMENT_FIXED_SIZE_OFFSET, value)
    }

    pub fn private_segment_size(self, value: u32) -> Self {
        self.u32_at(fields::PRIVATE_SEGMENT_FIXED_SIZE_OFFSET, value)
    }

    pub fn kernarg_size(self, value: u32) -> Self {
        self.u32_at(fields::KERNARG_SIZE_OFFSET, value)
    }

    pub fn rsrc1(self, value: u32) -> Self {
        self.u32_at(fields::COMPUTE_PGM_RSRC1_OFFSET, value)
    }

    pub fn rsrc2(self, value: u32) -> Self {
        self.u32_at(fields::COMPUTE_PGM_RSRC2_OFFSET, value)
    }

    pub fn rsrc3(self, value: u32) -> Self {
        self.u32_at(fields::COMPUTE_PGM_RSRC3_OFFSET, value)
    }

    pub fn properties(self, value: u16) -> Self {
        self.u16_at(fields::KERNEL_CODE_PROPERTIES_OFFSET, value)
    }

    pub fn kernarg_preload(self, value: u16) -> Self {
        self.u16_at(fields::KERNARG_PRELOAD_OFFSET, value)
    }

    /// Flips one bit of the record.
    pub fn flip_bit(mut self, offset: usize, bit: u8) -> Self {
        self.bytes[offset] ^= 1 << bit;
        self
    }

    pub const fn build(self) -> [u8; fields::KERNEL_DESCRIPTOR_SIZE] {
        self.bytes
    }
}
