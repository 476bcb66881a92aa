use std::fs::{File, OpenOptions};
use std::path::Path;

use memmap2::{Mmap, MmapOptions};

use crate::chunks::DecodedChunk;
use crate::container::{Container, ContainerFamily};
use crate::prelude::*;

/// A container file mapped into memory with its scanned chunk list.
pub struct ContainerFile {
    pub container: Container,
    map: Mmap,
}

impl ContainerFile {
    /// The mapped bytes of the whole file.
    pub fn image(&self) -> &[u8] {
        &self.map
    }

    /// The bytes of one chunk, cut at the end of the file.
    pub fn chunk(&self, header: &ChunkHeader) -> &[u8] {
        let start = (header.start_pos() as usize).min(self.map.len());
        let end = (header.end_pos() as usize).min(self.map.len());
        &self.map[start..end]
    }

    pub fn decode_chunks(&self) -> Vec<Result<DecodedChunk>> {
        self.container.decode_chunks(&self.map)
    }

    pub fn into_container(self) -> Container {
        self.container
    }
}

/// Maps a file read-only and scans it, picking the family from its first id.
pub fn open_container(path: impl AsRef<Path>) -> Result<ContainerFile> {
    open_container_as(path, None)
}

/// [`open_container`] with the family given instead of detected when `family` is set.
pub fn open_container_as(path: impl AsRef<Path>, family: Option<ContainerFamily>) -> Result<ContainerFile> {
    let path = path.as_ref();
    let file = File::open(path)?;
    // Safety: the map is read-only and lives no longer than the returned value.
    // Changes made to the file by other processes meanwhile are not guarded against.
    let map = unsafe { MmapOptions::new().map(&file)? };

    let name = path.display().to_string();
    let container = scan(&name, &mut Cursor::new(&map[..]), family)?;
    Ok(ContainerFile { container, map })
}

/// Opens a file for reading and writing and scans it, for use with a
/// [`crate::ContainerMutator`].
pub fn open_for_update(path: impl AsRef<Path>) -> Result<(Container, File)> {
    open_for_update_as(path, None)
}

pub fn open_for_update_as(path: impl AsRef<Path>, family: Option<ContainerFamily>) -> Result<(Container, File)> {
    let path = path.as_ref();
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    let container = scan(&path.display().to_string(), &mut file, family)?;
    Ok((container, file))
}

fn scan<Rd: Read + Seek>(name: &str, reader: &mut Rd, family: Option<ContainerFamily>) -> Result<Container> {
    match family {
        Some(family) => {
            reader.seek(SeekFrom::Start(0))?;
            Container::read(name, reader, family.endian())
        }
        None => Container::read_detected(name, reader),
    }
}

/// Cuts the file to `len` bytes, as needed after a chunk deletion.
pub fn truncate_to(file: &File, len: u64) -> Result<()> {
    debug!("truncating to {} bytes", len);
    file.set_len(len)?;
    file.sync_all()?;
    Ok(())
}
