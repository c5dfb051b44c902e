use gfxdis_core::config::Target;
use gfxdis_core::isa::metadata::MetadataTable;
use gfxdis_core::isa::table::DecoderTables;
use gfxdis_core::{DecodeOutcome, Disassembler};
use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Looks up a preset target, panicking on an unknown name.
pub fn target(name: &str) -> Target {
    Target::preset(name).unwrap_or_else(|| panic!("unknown preset {name}"))
}

/// A decoder plus the bytes it is fed.
pub struct TestDecoder {
    pub disasm: Disassembler,
}

impl TestDecoder {
    pub fn new(preset: &str, tables: DecoderTables, info: MetadataTable) -> Self {
        init_tracing();
        Self {
            disasm: Disassembler::new(target(preset), tables, info),
        }
    }

    pub fn with_target(target: Target, tables: DecoderTables, info: MetadataTable) -> Self {
        init_tracing();
        Self {
            disasm: Disassembler::new(target, tables, info),
        }
    }

    /// Decodes one instruction at address 0 without a symbolizer.
    pub fn decode(&self, bytes: &[u8]) -> DecodeOutcome {
        self.disasm.get_instruction(bytes, 0, None)
    }
}
