//! The raw block-device/segment-file abstraction the spec treats as an
//! external collaborator. The buffer manager needs a concrete
//! implementation to call, so this is the minimal one: one file per
//! segment, named by the decimal segment id, holding a flat array of
//! fixed-size pages.

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::trace;

use super::page_id::PageId;
use crate::error::DbResult;

pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    pub fn new(base_dir: impl AsRef<Path>) -> DbResult<Self> {
        std::fs::create_dir_all(&base_dir)?;
        Ok(FileStore {
            base_dir: base_dir.as_ref().to_path_buf(),
        })
    }

    fn segment_path(&self, segment_id: u16) -> PathBuf {
        self.base_dir.join(segment_id.to_string())
    }

    /// Reads one page's worth of bytes. A read past end-of-file, or of a
    /// segment file that doesn't exist yet, returns zero bytes for the
    /// missing portion.
    pub fn read_page(&self, page_id: PageId, page_size: usize) -> DbResult<Vec<u8>> {
        let path = self.segment_path(page_id.segment_id());
        let mut buf = vec![0u8; page_size];

        let mut file = match OpenOptions::new().read(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                trace!("segment file {:?} absent, returning zero page", path);
                return Ok(buf);
            }
            Err(e) => return Err(e.into()),
        };

        let offset = page_id.segment_page_id() * page_size as u64;
        file.seek(SeekFrom::Start(offset))?;
        let read = file.read(&mut buf)?;
        if read < page_size {
            // Short read at/near EOF: the rest of `buf` is already zeroed.
            trace!("short read ({} of {} bytes) for {}", read, page_size, page_id);
        }
        Ok(buf)
    }

    /// Writes one page's worth of bytes back to its segment file,
    /// creating the file (and any gap before the offset) if necessary.
    pub fn write_page(&self, page_id: PageId, data: &[u8]) -> DbResult<()> {
        let path = self.segment_path(page_id.segment_id());
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        let offset = page_id.segment_page_id() * data.len() as u64;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritten_page_reads_as_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        let page = store.read_page(PageId::new(0, 3), 64).unwrap();
        assert_eq!(page, vec![0u8; 64]);
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();
        let id = PageId::new(1, 2);
        let mut data = vec![0u8; 32];
        data[0] = 0xAB;
        data[31] = 0xCD;
        store.write_page(id, &data).unwrap();
        let back = store.read_page(id, 32).unwrap();
        assert_eq!(back, data);
    }
}
