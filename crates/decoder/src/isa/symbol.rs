//! Branch target symbolization.
//!
//! Branch operands are computed as absolute addresses during decode. A
//! `Symbolizer` gets the chance to replace the raw offset with a symbol name;
//! when it cannot, it remembers the address so a listing can synthesize a label.

/// ELF `STT_NOTYPE`: labels inside a code section.
pub const STT_NOTYPE: u8 = 0;

/// ELF `STT_OBJECT`: data objects, including kernel descriptors.
pub const STT_OBJECT: u8 = 1;

/// ELF `STT_AMDGPU_HSA_KERNEL`: legacy `amd_kernel_code_t` kernels.
pub const STT_AMDGPU_HSA_KERNEL: u8 = 10;

/// Resolves computed branch targets to names.
pub trait Symbolizer {
    /// Looks up a symbol at `target`.
    ///
    /// # Returns
    ///
    /// The symbol name, or `None` when no symbol covers the address. An
    /// implementation may record unresolved addresses for later labeling.
    fn resolve_branch_target(&mut self, target: u64) -> Option<String>;
}

/// A symbol of the section being decoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionSymbol {
    /// Address of the symbol.
    pub address: u64,
    /// Symbol name.
    pub name: String,
    /// ELF symbol type.
    pub st_type: u8,
}

/// Symbolizer over the symbols of one section.
///
/// Only untyped symbols (plain labels) resolve branch targets; function and
/// object symbols are skipped. Unresolved targets are collected in
/// `referenced_addresses`, deduplicated and in first-seen order.
#[derive(Clone, Debug, Default)]
pub struct SectionSymbolizer {
    symbols: Vec<SectionSymbol>,
    referenced_addresses: Vec<u64>,
}

impl SectionSymbolizer {
    /// Creates a symbolizer over `symbols`.
    pub fn new(mut symbols: Vec<SectionSymbol>) -> Self {
        symbols.sort_by_key(|sym| sym.address);
        Self {
            symbols,
            referenced_addresses: Vec::new(),
        }
    }

    /// Branch targets that had no symbol.
    pub fn referenced_addresses(&self) -> &[u64] {
        &self.referenced_addresses
    }

    /// Symbols known to the symbolizer, sorted by address.
    pub fn symbols(&self) -> &[SectionSymbol] {
        &self.symbols
    }
}

impl Symbolizer for SectionSymbolizer {
    fn resolve_branch_target(&mut self, target: u64) -> Option<String> {
        let start = self.symbols.partition_point(|sym| sym.address < target);
        let found = self.symbols[start..]
            .iter()
            .take_while(|sym| sym.address == target)
            .find(|sym| sym.st_type == STT_NOTYPE);
        if let Some(sym) = found {
            return Some(sym.name.clone());
        }
        if !self.referenced_addresses.contains(&target) {
            self.referenced_addresses.push(target);
        }
        None
    }
}
