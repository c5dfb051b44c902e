//! Code object loading.
//!
//! Reads an AMDGPU code object (64-bit ELF) far enough to drive the decoder:
//! 1. **Text:** The `.text` bytes and their load address.
//! 2. **Symbols:** Every named, defined symbol with its raw ELF type and the bytes it points at.
//! 3. **Walk:** Kernel descriptors via `on_symbol_start`, and instructions with text labels as branch targets.

use object::read::elf::ElfFile64;
use object::{Endianness, Object, ObjectSection, ObjectSymbol};
use tracing::debug;

use crate::common::error::LoaderError;
use crate::config::Target;
use crate::hsa::{SymbolStart, on_symbol_start};
use crate::isa::decode::{DecodeOutcome, Disassembler};
use crate::isa::symbol::{SectionSymbol, SectionSymbolizer};

/// A defined symbol of a code object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedSymbol<'data> {
    /// Symbol name.
    pub name: String,
    /// Symbol address.
    pub address: u64,
    /// Raw ELF `st_type`.
    pub st_type: u8,
    /// Bytes from the symbol to the end of its section.
    pub bytes: &'data [u8],
    /// The symbol lies in `.text`.
    pub in_text: bool,
}

/// Parsed view of a code object.
#[derive(Clone, Debug)]
pub struct CodeObject<'data> {
    text: &'data [u8],
    text_address: u64,
    symbols: Vec<LoadedSymbol<'data>>,
}

impl<'data> CodeObject<'data> {
    /// Parses a code object.
    ///
    /// # Errors
    ///
    /// * `LoaderError::Parse` - `data` is not a 64-bit ELF file.
    /// * `LoaderError::MissingText` - There is no `.text` section.
    /// * `LoaderError::SymbolOutOfBounds` - A symbol points outside its section.
    pub fn parse(data: &'data [u8]) -> Result<Self, LoaderError> {
        let elf = ElfFile64::<Endianness>::parse(data)?;
        let text_section = elf.section_by_name(".text").ok_or(LoaderError::MissingText)?;
        let text = text_section.data()?;
        let text_address = text_section.address();
        let text_index = text_section.index();

        let mut symbols = Vec::new();
        for sym in elf.symbols() {
            let Some(index) = sym.section_index() else {
                continue;
            };
            let name = sym.name()?;
            if name.is_empty() {
                continue;
            }
            let section = elf.section_by_index(index)?;
            let section_data = section.data()?;
            let address = sym.address();
            let bytes = address
                .checked_sub(section.address())
                .and_then(|start| section_data.get(usize::try_from(start).ok()?..))
                .ok_or_else(|| LoaderError::SymbolOutOfBounds {
                    name: name.to_owned(),
                    address,
                })?;
            symbols.push(LoadedSymbol {
                name: name.to_owned(),
                address,
                st_type: sym.elf_symbol().st_type(),
                bytes,
                in_text: index == text_index,
            });
        }
        symbols.sort_by_key(|sym| sym.address);
        debug!(symbols = symbols.len(), text = text.len(), "loaded code object");
        Ok(Self {
            text,
            text_address,
            symbols,
        })
    }

    /// The `.text` bytes.
    pub const fn text(&self) -> &'data [u8] {
        self.text
    }

    /// Load address of `.text`.
    pub const fn text_address(&self) -> u64 {
        self.text_address
    }

    /// Defined symbols, sorted by address.
    pub fn symbols(&self) -> &[LoadedSymbol<'data>] {
        &self.symbols
    }

    /// Symbols of `.text`, as branch target candidates.
    pub fn text_symbols(&self) -> Vec<SectionSymbol> {
        self.symbols
            .iter()
            .filter(|sym| sym.in_text)
            .map(|sym| SectionSymbol {
                address: sym.address,
                name: sym.name.clone(),
                st_type: sym.st_type,
            })
            .collect()
    }

    /// Runs the symbol-start hook over every symbol.
    ///
    /// # Returns
    ///
    /// The symbols the hook claimed, paired with their outcome.
    pub fn kernel_descriptors(&self, target: &Target) -> Vec<(&LoadedSymbol<'data>, SymbolStart)> {
        self.symbols
            .iter()
            .filter_map(|sym| {
                on_symbol_start(target, &sym.name, sym.st_type, sym.bytes, sym.address).map(|start| (sym, start))
            })
            .collect()
    }

    /// Decodes all of `.text`.
    ///
    /// Branch targets resolve against untyped text symbols.
    ///
    /// # Returns
    ///
    /// The outcomes and the symbolizer, whose `referenced_addresses` lists the
    /// branch targets that had no label.
    pub fn disassemble(&self, disassembler: &Disassembler) -> (Vec<DecodeOutcome>, SectionSymbolizer) {
        let mut symbolizer = SectionSymbolizer::new(self.text_symbols());
        let outcomes = disassembler.decode_all(self.text, self.text_address, Some(&mut symbolizer));
        (outcomes, symbolizer)
    }
}
