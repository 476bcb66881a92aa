use crate::container::{Container, read_chunk_headers};
use crate::prelude::*;

const DEFAULT_BUFFER_SIZE: usize = 1024;
const SIZE_FIELD_POS: u64 = 4;

/// Structural edits of a scanned container against its backing store.
///
/// The in-memory header list and the bytes in `store` are kept in step.
/// Nothing is rolled back when a write fails halfway.
pub struct ContainerMutator<'a, S> {
    container: &'a mut Container,
    store: &'a mut S,
}

impl<'a, S: Read + Write + Seek> ContainerMutator<'a, S> {
    pub fn new(container: &'a mut Container, store: &'a mut S) -> Self {
        ContainerMutator { container, store }
    }

    /// Deletes the only chunk carrying `id`.
    ///
    /// Repeated ids do not name a single chunk; use [`Self::delete_chunk_at`] for those.
    pub fn delete_chunk(&mut self, id: FourCC) -> Result<u64> {
        let start_pos = self.container.unique_header(id)?.start_pos();
        self.delete_chunk_at(start_pos)
    }

    /// Deletes the chunk starting at `start_pos` and moves every later chunk
    /// down by its full size.
    ///
    /// Returns the new container length. The store keeps its old length,
    /// the caller truncates it.
    pub fn delete_chunk_at(&mut self, start_pos: u64) -> Result<u64> {
        self.container.sort_headers();
        let index = self
            .container
            .headers
            .iter()
            .position(|h| h.start_pos() == start_pos)
            .ok_or(ChunkError::ChunkNotFoundAt { start_pos })?;
        let removed = self.container.headers.remove(index);
        let removed_size = removed.full_size();
        debug!("deleting {}", removed);

        let mut write_pos = removed.start_pos();
        for header in self
            .container
            .headers
            .iter_mut()
            .filter(|h| h.start_pos() > removed.start_pos())
        {
            let data = Container::chunk_bytes(self.store, header)?;
            self.store.seek(SeekFrom::Start(write_pos))?;
            self.store.write_all(&data)?;
            debug!("moved {} from {} to {}", header.id(), header.start_pos(), write_pos);

            header.set_start_pos(write_pos);
            write_pos += data.len() as u64;
        }

        let size = (self.container.header.size() as u64).saturating_sub(removed_size) as u32;
        self.update_size(size)?;

        Ok(self.container.header.full_size())
    }

    /// Copies every byte of `reader` to the end of the container and grows
    /// the declared size by the copied length.
    ///
    /// `reader` should yield whole, padded chunks. They are added to the
    /// header list. Returns the number of bytes appended.
    pub fn append_chunk<Rd: Read>(&mut self, reader: &mut Rd, buffer_size: usize) -> Result<u64> {
        let buffer_size = if buffer_size == 0 {
            DEFAULT_BUFFER_SIZE
        } else {
            buffer_size
        };

        let start = self.container.header.full_size();
        self.store.seek(SeekFrom::Start(start))?;

        let mut buffer = vec![0u8; buffer_size];
        let mut appended = 0u64;
        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            self.store.write_all(&buffer[..n])?;
            appended += n as u64;
            trace!("appended {} bytes at {}", n, start + appended - n as u64);
        }

        let size = u32::try_from(self.container.header.size() as u64 + appended).map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "container size exceeds the 32-bit size field",
            )
        })?;
        self.update_size(size)?;

        self.store.seek(SeekFrom::Start(start))?;
        let added = read_chunk_headers(self.store, start, Some(start + appended), self.container.endian)?;
        self.container.headers.extend(added);

        Ok(appended)
    }

    /// Rewrites the size field at offset 4 and the in-memory header with it.
    pub fn update_size(&mut self, size: u32) -> Result<()> {
        self.store.seek(SeekFrom::Start(SIZE_FIELD_POS))?;
        self.container.endian.write_u32(self.store, size)?;
        self.store.flush()?;
        debug!("container size {} -> {}", self.container.header.size(), size);
        self.container.header.set_size(size);
        Ok(())
    }
}
