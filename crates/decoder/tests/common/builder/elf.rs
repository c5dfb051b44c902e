//! Writes just enough of an ELF64 shared object for the loader: a code
//! section, a read-only data section and a symbol table.

/// Section index of the code section.
pub const TEXT_SECTION: u16 = 1;

/// Section index of the read-only data section.
pub const RODATA_SECTION: u16 = 2;

const EHDR_SIZE: usize = 64;
const SHDR_SIZE: usize = 64;
const SYM_SIZE: usize = 24;

const EM_AMDGPU: u16 = 224;
const ELFOSABI_AMDGPU_HSA: u8 = 64;
const ET_DYN: u16 = 3;

const SHT_PROGBITS: u32 = 1;
const SHT_SYMTAB: u32 = 2;
const SHT_STRTAB: u32 = 3;

const SHF_ALLOC: u64 = 0x2;
const SHF_EXECINSTR: u64 = 0x4;

const STB_LOCAL: u8 = 0;
const STB_GLOBAL: u8 = 1;

/// One symbol to emit.
#[derive(Clone, Debug)]
pub struct ElfSymbol {
    pub name: &'static str,
    pub st_type: u8,
    pub global: bool,
    pub section: u16,
    pub value: u64,
    pub size: u64,
}

#[derive(Clone, Copy)]
struct SectionHeader {
    name: u32,
    kind: u32,
    flags: u64,
    addr: u64,
    offset: u64,
    size: u64,
    link: u32,
    info: u32,
    align: u64,
    entsize: u64,
}

impl SectionHeader {
    const NULL: Self = Self {
        name: 0,
        kind: 0,
        flags: 0,
        addr: 0,
        offset: 0,
        size: 0,
        link: 0,
        info: 0,
        align: 0,
        entsize: 0,
    };

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.name.to_le_bytes());
        out.extend_from_slice(&self.kind.to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&self.addr.to_le_bytes());
        out.extend_from_slice(&self.offset.to_le_bytes());
        out.extend_from_slice(&self.size.to_le_bytes());
        out.extend_from_slice(&self.link.to_le_bytes());
        out.extend_from_slice(&self.info.to_le_bytes());
        out.extend_from_slice(&self.align.to_le_bytes());
        out.extend_from_slice(&self.entsize.to_le_bytes());
    }
}

/// Builder of a two-section code object.
#[derive(Clone, Debug)]
pub struct ElfBuilder {
    text_name: &'static str,
    text: Vec<u8>,
    text_addr: u64,
    rodata: Vec<u8>,
    rodata_addr: u64,
    symbols: Vec<ElfSymbol>,
}

impl ElfBuilder {
    pub fn new(text_addr: u64, rodata_addr: u64) -> Self {
        Self {
            text_name: ".text",
            text: Vec::new(),
            text_addr,
            rodata: Vec::new(),
            rodata_addr,
            symbols: Vec::new(),
        }
    }

    /// Renames the code section (to build objects without `.text`).
    pub fn text_name(mut self, name: &'static str) -> Self {
        self.text_name = name;
        self
    }

    pub fn text(mut self, bytes: &[u8]) -> Self {
        self.text = bytes.to_vec();
        self
    }

    pub fn rodata(mut self, bytes: &[u8]) -> Self {
        self.rodata = bytes.to_vec();
        self
    }

    pub fn symbol(mut self, symbol: ElfSymbol) -> Self {
        self.symbols.push(symbol);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut out = vec![0u8; EHDR_SIZE];

        pad_to(&mut out, 16);
        let text_off = out.len();
        out.extend_from_slice(&self.text);

        pad_to(&mut out, 64);
        let rodata_off = out.len();
        out.extend_from_slice(&self.rodata);

        // Locals must precede globals.
        let mut symbols = self.symbols.clone();
        symbols.sort_by_key(|sym| sym.global);
        let first_global = 1 + symbols.iter().filter(|sym| !sym.global).count();

        let mut strtab = vec![0u8];
        let mut name_offsets = Vec::new();
        for sym in &symbols {
            name_offsets.push(strtab.len() as u32);
            strtab.extend_from_slice(sym.name.as_bytes());
            strtab.push(0);
        }

        pad_to(&mut out, 8);
        let symtab_off = out.len();
        out.extend_from_slice(&[0u8; SYM_SIZE]);
        for (sym, &name) in symbols.iter().zip(&name_offsets) {
            let bind = if sym.global { STB_GLOBAL } else { STB_LOCAL };
            out.extend_from_slice(&name.to_le_bytes());
            out.push(bind << 4 | (sym.st_type & 0xF));
            out.push(0);
            out.extend_from_slice(&sym.section.to_le_bytes());
            out.extend_from_slice(&sym.value.to_le_bytes());
            out.extend_from_slice(&sym.size.to_le_bytes());
        }
        let symtab_size = out.len() - symtab_off;

        let strtab_off = out.len();
        out.extend_from_slice(&strtab);

        let mut shstrtab = vec![0u8];
        let mut section_name = |name: &str| {
            let offset = shstrtab.len() as u32;
            shstrtab.extend_from_slice(name.as_bytes());
            shstrtab.push(0);
            offset
        };
        let text_name = section_name(self.text_name);
        let rodata_name = section_name(".rodata");
        let symtab_name = section_name(".symtab");
        let strtab_name = section_name(".strtab");
        let shstrtab_name = section_name(".shstrtab");
        let shstrtab_off = out.len();
        out.extend_from_slice(&shstrtab);

        let headers = [
            SectionHeader::NULL,
            SectionHeader {
                name: text_name,
                kind: SHT_PROGBITS,
                flags: SHF_ALLOC | SHF_EXECINSTR,
                addr: self.text_addr,
                offset: text_off as u64,
                size: self.text.len() as u64,
                link: 0,
                info: 0,
                align: 256,
                entsize: 0,
            },
            SectionHeader {
                name: rodata_name,
                kind: SHT_PROGBITS,
                flags: SHF_ALLOC,
                addr: self.rodata_addr,
                offset: rodata_off as u64,
                size: self.rodata.len() as u64,
                link: 0,
                info: 0,
                align: 64,
                entsize: 0,
            },
            SectionHeader {
                name: symtab_name,
                kind: SHT_SYMTAB,
                flags: 0,
                addr: 0,
                offset: symtab_off as u64,
                size: symtab_size as u64,
                link: 4,
                info: first_global as u32,
                align: 8,
                entsize: SYM_SIZE as u64,
            },
            SectionHeader {
                name: strtab_name,
                kind: SHT_STRTAB,
                flags: 0,
                addr: 0,
                offset: strtab_off as u64,
                size: strtab.len() as u64,
                link: 0,
                info: 0,
                align: 1,
                entsize: 0,
            },
            SectionHeader {
                name: shstrtab_name,
                kind: SHT_STRTAB,
                flags: 0,
                addr: 0,
                offset: shstrtab_off as u64,
                size: shstrtab.len() as u64,
                link: 0,
                info: 0,
                align: 1,
                entsize: 0,
            },
        ];

        pad_to(&mut out, 8);
        let shoff = out.len();
        for header in &headers {
            header.write(&mut out);
        }

        let mut ehdr = Vec::with_capacity(EHDR_SIZE);
        ehdr.extend_from_slice(&[0x7F, b'E', b'L', b'F', 2, 1, 1, ELFOSABI_AMDGPU_HSA]);
        ehdr.extend_from_slice(&[0u8; 8]);
        ehdr.extend_from_slice(&ET_DYN.to_le_bytes());
        ehdr.extend_from_slice(&EM_AMDGPU.to_le_bytes());
        ehdr.extend_from_slice(&1u32.to_le_bytes());
        ehdr.extend_from_slice(&0u64.to_le_bytes());
        ehdr.extend_from_slice(&0u64.to_le_bytes());
        ehdr.extend_from_slice(&(shoff as u64).to_le_bytes());
        ehdr.extend_from_slice(&0u32.to_le_bytes());
        ehdr.extend_from_slice(&(EHDR_SIZE as u16).to_le_bytes());
        ehdr.extend_from_slice(&56u16.to_le_bytes());
        ehdr.extend_from_slice(&0u16.to_le_bytes());
        ehdr.extend_from_slice(&(SHDR_SIZE as u16).to_le_bytes());
        ehdr.extend_from_slice(&(headers.len() as u16).to_le_bytes());
        ehdr.extend_from_slice(&5u16.to_le_bytes());
        out[..EHDR_SIZE].copy_from_slice(&ehdr);
        out
    }
}

fn pad_to(out: &mut Vec<u8>, align: usize) {
    while out.len() % align != 0 {
        out.push(0);
    }
}
