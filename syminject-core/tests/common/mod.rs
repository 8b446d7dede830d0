//! Minimal in-memory object files for exercising the format readers.

#![allow(dead_code)]

use byteorder::{WriteBytesExt, LE};

pub const ELF_DATA_ADDR: u64 = 0x4000;
pub const ELF_DATA_OFFSET: u64 = 0x40;
pub const MACHO_DATA_ADDR: u64 = 0x1000;
pub const MACHO_DATA_OFFSET: u64 = 0x100;

const STT_OBJECT: u8 = 1;
const STT_FUNC: u8 = 2;
const STB_GLOBAL: u8 = 1;

/// A symbol for the builders. `offset` is relative to the data section.
#[derive(Debug, Clone, Copy)]
pub struct FixtureSymbol {
    pub name: &'static str,
    pub offset: u64,
    pub size: u64,
}

pub const fn sym(name: &'static str, offset: u64, size: u64) -> FixtureSymbol {
    FixtureSymbol { name, offset, size }
}

fn pad_to(buf: &mut Vec<u8>, align: usize) {
    while buf.len() % align != 0 {
        buf.push(0);
    }
}

/// Append `name` to a string table and return its offset.
fn intern(strtab: &mut Vec<u8>, name: &str) -> u32 {
    let offset = strtab.len() as u32;
    strtab.extend_from_slice(name.as_bytes());
    strtab.push(0);
    offset
}

#[allow(clippy::too_many_arguments)]
fn elf_shdr(
    out: &mut Vec<u8>,
    name: u32,
    sh_type: u32,
    flags: u64,
    addr: u64,
    offset: u64,
    size: u64,
    link: u32,
    info: u32,
    align: u64,
    entsize: u64,
) {
    out.write_u32::<LE>(name).unwrap();
    out.write_u32::<LE>(sh_type).unwrap();
    out.write_u64::<LE>(flags).unwrap();
    out.write_u64::<LE>(addr).unwrap();
    out.write_u64::<LE>(offset).unwrap();
    out.write_u64::<LE>(size).unwrap();
    out.write_u32::<LE>(link).unwrap();
    out.write_u32::<LE>(info).unwrap();
    out.write_u64::<LE>(align).unwrap();
    out.write_u64::<LE>(entsize).unwrap();
}

fn elf_sym(out: &mut Vec<u8>, name: u32, typ: u8, shndx: u16, value: u64, size: u64) {
    out.write_u32::<LE>(name).unwrap();
    out.write_u8((STB_GLOBAL << 4) | typ).unwrap();
    out.write_u8(0).unwrap();
    out.write_u16::<LE>(shndx).unwrap();
    out.write_u64::<LE>(value).unwrap();
    out.write_u64::<LE>(size).unwrap();
}

/// Build a little-endian ELF64 executable with a `.data` section holding
/// `data` at [`ELF_DATA_ADDR`], an empty `.bss`, and `symbols` as data objects.
///
/// A function symbol `helper` in `.data` and an object `bss_counter` in
/// `.bss` are always added; neither is patchable.
pub fn elf_fixture(data: &[u8], symbols: &[FixtureSymbol]) -> Vec<u8> {
    let mut strtab = vec![0u8];
    let mut symtab = vec![0u8; 24];
    for s in symbols {
        let name = intern(&mut strtab, s.name);
        elf_sym(&mut symtab, name, STT_OBJECT, 1, ELF_DATA_ADDR + s.offset, s.size);
    }
    let helper = intern(&mut strtab, "helper");
    elf_sym(&mut symtab, helper, STT_FUNC, 1, ELF_DATA_ADDR, 16);
    let bss = intern(&mut strtab, "bss_counter");
    elf_sym(&mut symtab, bss, STT_OBJECT, 2, 0x9000, 8);

    let mut shstrtab = vec![0u8];
    let names: Vec<u32> = [".data", ".bss", ".symtab", ".strtab", ".shstrtab"]
        .iter()
        .map(|n| intern(&mut shstrtab, n))
        .collect();

    let mut out = vec![0u8; ELF_DATA_OFFSET as usize];
    out.extend_from_slice(data);
    let bss_offset = out.len() as u64;
    pad_to(&mut out, 8);
    let symtab_offset = out.len() as u64;
    out.extend_from_slice(&symtab);
    let strtab_offset = out.len() as u64;
    out.extend_from_slice(&strtab);
    let shstrtab_offset = out.len() as u64;
    out.extend_from_slice(&shstrtab);
    pad_to(&mut out, 8);
    let shoff = out.len() as u64;

    elf_shdr(&mut out, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0);
    elf_shdr(&mut out, names[0], 1, 3, ELF_DATA_ADDR, ELF_DATA_OFFSET, data.len() as u64, 0, 0, 8, 0);
    elf_shdr(&mut out, names[1], 8, 3, 0x9000, bss_offset, 0x100, 0, 0, 8, 0);
    elf_shdr(&mut out, names[2], 2, 0, 0, symtab_offset, symtab.len() as u64, 4, 1, 8, 24);
    elf_shdr(&mut out, names[3], 3, 0, 0, strtab_offset, strtab.len() as u64, 0, 0, 1, 0);
    elf_shdr(&mut out, names[4], 3, 0, 0, shstrtab_offset, shstrtab.len() as u64, 0, 0, 1, 0);

    let mut header = Vec::with_capacity(64);
    header.extend_from_slice(b"\x7fELF");
    header.extend_from_slice(&[2, 1, 1, 0]);
    header.extend_from_slice(&[0; 8]);
    header.write_u16::<LE>(2).unwrap(); // ET_EXEC
    header.write_u16::<LE>(62).unwrap(); // EM_X86_64
    header.write_u32::<LE>(1).unwrap();
    header.write_u64::<LE>(0).unwrap(); // e_entry
    header.write_u64::<LE>(0).unwrap(); // e_phoff
    header.write_u64::<LE>(shoff).unwrap();
    header.write_u32::<LE>(0).unwrap();
    header.write_u16::<LE>(64).unwrap();
    header.write_u16::<LE>(56).unwrap();
    header.write_u16::<LE>(0).unwrap();
    header.write_u16::<LE>(64).unwrap();
    header.write_u16::<LE>(6).unwrap();
    header.write_u16::<LE>(5).unwrap();
    out[..64].copy_from_slice(&header);
    out
}

fn fixed16(name: &str) -> [u8; 16] {
    let mut buf = [0u8; 16];
    buf[..name.len()].copy_from_slice(name.as_bytes());
    buf
}

/// Build a little-endian 64-bit Mach-O object with one `__DATA,__data`
/// section holding `data` at [`MACHO_DATA_ADDR`].
///
/// Symbol names get the usual leading underscore and are written in
/// reverse order. A stab entry and an undefined symbol are added too.
pub fn macho_fixture(data: &[u8], symbols: &[FixtureSymbol]) -> Vec<u8> {
    const LC_SEGMENT_64: u32 = 0x19;
    const LC_SYMTAB: u32 = 0x2;
    const SEGMENT_SIZE: u32 = 72 + 80;
    const SYMTAB_SIZE: u32 = 24;

    let mut strtab = vec![0u8];
    let mut nlists = Vec::new();
    let mut nlist = |name: u32, n_type: u8, n_sect: u8, value: u64| {
        nlists.write_u32::<LE>(name).unwrap();
        nlists.write_u8(n_type).unwrap();
        nlists.write_u8(n_sect).unwrap();
        nlists.write_u16::<LE>(0).unwrap();
        nlists.write_u64::<LE>(value).unwrap();
    };
    for s in symbols.iter().rev() {
        let name = intern(&mut strtab, &format!("_{}", s.name));
        nlist(name, 0x0f, 1, MACHO_DATA_ADDR + s.offset); // N_SECT | N_EXT
    }
    let stab = intern(&mut strtab, "_debug_note");
    nlist(stab, 0x24, 1, MACHO_DATA_ADDR); // N_FUN
    let undef = intern(&mut strtab, "_printf");
    nlist(undef, 0x01, 0, 0);
    let nsyms = (nlists.len() / 16) as u32;

    let mut out = Vec::new();
    out.write_u32::<LE>(0xfeed_facf).unwrap();
    out.write_u32::<LE>(0x0100_0007).unwrap(); // x86_64
    out.write_u32::<LE>(3).unwrap();
    out.write_u32::<LE>(1).unwrap(); // MH_OBJECT
    out.write_u32::<LE>(2).unwrap();
    out.write_u32::<LE>(SEGMENT_SIZE + SYMTAB_SIZE).unwrap();
    out.write_u32::<LE>(0).unwrap();
    out.write_u32::<LE>(0).unwrap();

    let data_len = data.len() as u64;
    out.write_u32::<LE>(LC_SEGMENT_64).unwrap();
    out.write_u32::<LE>(SEGMENT_SIZE).unwrap();
    out.extend_from_slice(&fixed16(""));
    out.write_u64::<LE>(MACHO_DATA_ADDR).unwrap();
    out.write_u64::<LE>(data_len).unwrap();
    out.write_u64::<LE>(MACHO_DATA_OFFSET).unwrap();
    out.write_u64::<LE>(data_len).unwrap();
    out.write_u32::<LE>(3).unwrap();
    out.write_u32::<LE>(3).unwrap();
    out.write_u32::<LE>(1).unwrap();
    out.write_u32::<LE>(0).unwrap();

    out.extend_from_slice(&fixed16("__data"));
    out.extend_from_slice(&fixed16("__DATA"));
    out.write_u64::<LE>(MACHO_DATA_ADDR).unwrap();
    out.write_u64::<LE>(data_len).unwrap();
    out.write_u32::<LE>(MACHO_DATA_OFFSET as u32).unwrap();
    out.write_u32::<LE>(3).unwrap();
    for _ in 0..6 {
        out.write_u32::<LE>(0).unwrap();
    }

    let symoff = MACHO_DATA_OFFSET as u32 + ((data.len() as u32 + 7) & !7);
    let stroff = symoff + nlists.len() as u32;
    out.write_u32::<LE>(LC_SYMTAB).unwrap();
    out.write_u32::<LE>(SYMTAB_SIZE).unwrap();
    out.write_u32::<LE>(symoff).unwrap();
    out.write_u32::<LE>(nsyms).unwrap();
    out.write_u32::<LE>(stroff).unwrap();
    out.write_u32::<LE>(strtab.len() as u32).unwrap();

    out.resize(MACHO_DATA_OFFSET as usize, 0);
    out.extend_from_slice(data);
    out.resize(symoff as usize, 0);
    out.extend_from_slice(&nlists);
    out.extend_from_slice(&strtab);
    out
}

pub const PE_MACHINE_I386: u16 = 0x14c;
pub const PE_MACHINE_AMD64: u16 = 0x8664;
pub const PE_DATA_OFFSET: u64 = 0x200;
pub const PE_LONG_OFFSET: u64 = 0x240;
const PE_SYMTAB_OFFSET: u32 = 0x260;

fn coff_symbol(out: &mut Vec<u8>, name: [u8; 8], value: u32, section: i16, aux: u8) {
    out.extend_from_slice(&name);
    out.write_u32::<LE>(value).unwrap();
    out.write_i16::<LE>(section).unwrap();
    out.write_u16::<LE>(0).unwrap();
    out.write_u8(2).unwrap(); // IMAGE_SYM_CLASS_EXTERNAL
    out.write_u8(aux).unwrap();
}

fn short_name(name: &str) -> [u8; 8] {
    let mut buf = [0u8; 8];
    buf[..name.len()].copy_from_slice(name.as_bytes());
    buf
}

fn long_name(strx: u32) -> [u8; 8] {
    let mut buf = [0u8; 8];
    buf[4..].copy_from_slice(&strx.to_le_bytes());
    buf
}

fn pe_section(
    out: &mut Vec<u8>,
    name: [u8; 8],
    virtual_size: u32,
    virtual_address: u32,
    raw_size: u32,
    raw_offset: u32,
) {
    out.extend_from_slice(&name);
    out.write_u32::<LE>(virtual_size).unwrap();
    out.write_u32::<LE>(virtual_address).unwrap();
    out.write_u32::<LE>(raw_size).unwrap();
    out.write_u32::<LE>(raw_offset).unwrap();
    out.write_u32::<LE>(0).unwrap();
    out.write_u32::<LE>(0).unwrap();
    out.write_u16::<LE>(0).unwrap();
    out.write_u16::<LE>(0).unwrap();
    out.write_u32::<LE>(0xc000_0040).unwrap(); // initialized data, read/write
}

/// Build a PE image with a COFF symbol table and three sections:
///
/// 1. `.data`: raw data at [`PE_DATA_OFFSET`], 0x40 raw bytes but a
///    virtual size of 0x30. Holds `_early` at 0 (`"alpha"`) and `_late` at
///    0x10 (`"beta"`).
/// 2. `.stamp_data_long` (named through the string table): raw data at
///    [`PE_LONG_OFFSET`], 0x20 raw bytes, virtual size 0x100. Holds the
///    long-named `_stamp_version_label` at 0 (`"v0"`), followed by an
///    auxiliary record.
/// 3. `.bss`: no raw data. Holds `_zeroed`.
///
/// Symbols are written out of address order. An absolute and an
/// undefined symbol are included.
pub fn pe_fixture(machine: u16) -> Vec<u8> {
    let mut strtab = Vec::new();
    let section_strx = 4 + intern(&mut strtab, ".stamp_data_long");
    let label_strx = 4 + intern(&mut strtab, "_stamp_version_label");

    let mut symbols = Vec::new();
    coff_symbol(&mut symbols, short_name("_late"), 0x10, 1, 0);
    coff_symbol(&mut symbols, long_name(label_strx), 0, 2, 1);
    symbols.extend_from_slice(&[0u8; 18]);
    coff_symbol(&mut symbols, short_name("_zeroed"), 0, 3, 0);
    coff_symbol(&mut symbols, short_name("_early"), 0, 1, 0);
    coff_symbol(&mut symbols, short_name("abs"), 7, -1, 0);
    coff_symbol(&mut symbols, short_name("_undef"), 0, 0, 0);
    let nsyms = (symbols.len() / 18) as u32;

    let mut out = vec![0u8; 0x80];
    out[..2].copy_from_slice(b"MZ");
    out[0x3c..0x40].copy_from_slice(&0x80u32.to_le_bytes());
    out.extend_from_slice(b"PE\0\0");
    out.write_u16::<LE>(machine).unwrap();
    out.write_u16::<LE>(3).unwrap();
    out.write_u32::<LE>(0).unwrap();
    out.write_u32::<LE>(PE_SYMTAB_OFFSET).unwrap();
    out.write_u32::<LE>(nsyms).unwrap();
    out.write_u16::<LE>(0).unwrap(); // no optional header
    out.write_u16::<LE>(0x0002).unwrap(); // IMAGE_FILE_EXECUTABLE_IMAGE

    let mut section_name = [0u8; 8];
    let slash_name = format!("/{section_strx}");
    section_name[..slash_name.len()].copy_from_slice(slash_name.as_bytes());
    pe_section(&mut out, short_name(".data"), 0x30, 0x1000, 0x40, PE_DATA_OFFSET as u32);
    pe_section(&mut out, section_name, 0x100, 0x2000, 0x20, PE_LONG_OFFSET as u32);
    pe_section(&mut out, short_name(".bss"), 0x80, 0x3000, 0, 0);

    out.resize(PE_DATA_OFFSET as usize, 0);
    let mut data = [0u8; 0x40];
    data[..5].copy_from_slice(b"alpha");
    data[0x10..0x14].copy_from_slice(b"beta");
    out.extend_from_slice(&data);
    let mut long = [0u8; 0x20];
    long[..2].copy_from_slice(b"v0");
    out.extend_from_slice(&long);

    assert_eq!(out.len(), PE_SYMTAB_OFFSET as usize);
    out.extend_from_slice(&symbols);
    out.write_u32::<LE>(strtab.len() as u32 + 4).unwrap();
    out.extend_from_slice(&strtab);
    out
}
