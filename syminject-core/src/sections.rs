/// A contiguous region of the binary, as laid out both in memory and in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Section name. Informational only.
    pub name: String,
    /// Virtual address of the first byte of the section.
    pub vma: u64,
    /// File offset of the first byte of the section.
    pub file_offset: u64,
    /// Length of the mapped region in bytes.
    pub size: u64,
    /// False for zero-fill sections (`SHT_NOBITS`, `S_ZEROFILL`) that occupy no file bytes.
    pub file_backed: bool,
}

impl Section {
    pub fn new(name: impl Into<String>, vma: u64, file_offset: u64, size: u64) -> Self {
        Self {
            name: name.into(),
            vma,
            file_offset,
            size,
            file_backed: true,
        }
    }

    /// One past the last file offset covered by the section, if representable.
    pub fn file_end(&self) -> Option<u64> {
        self.file_offset.checked_add(self.size)
    }

    /// Returns true if the section's bytes lie inside a file of `file_len` bytes.
    pub fn fits_in(&self, file_len: u64) -> bool {
        !self.file_backed || self.file_end().is_some_and(|end| end <= file_len)
    }
}
