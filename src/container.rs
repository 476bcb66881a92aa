use crate::prelude::*;

/// Container families and the size byte order each one implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFamily {
    /// RIFF/WAVE and Broadcast Wave.
    Riff,
    /// AIFF and AIFF-C.
    Aiff,
}

impl ContainerFamily {
    pub fn endian(self) -> Endian {
        match self {
            ContainerFamily::Riff => Endian::Little,
            ContainerFamily::Aiff => Endian::Big,
        }
    }

    /// Maps the container id at offset 0 to its family.
    pub fn detect(id: FourCC) -> Result<Self> {
        match id {
            FourCC::RIFF => Ok(ContainerFamily::Riff),
            FourCC::FORM => Ok(ContainerFamily::Aiff),
            id => Err(ChunkError::UnknownContainer { id }),
        }
    }
}

/// A scanned container: its header and the headers of every chunk it holds.
///
/// Payload bytes stay in the backing store and are fetched by offset.
#[derive(Debug, Clone)]
pub struct Container {
    pub name: String,
    pub header: ContainerHeader,
    pub headers: Vec<ChunkHeader>,
    pub endian: Endian,
}

impl Container {
    /// Reads a RIFF/WAVE container.
    pub fn read_riff<Rd: Read + Seek>(name: &str, reader: &mut Rd) -> Result<Self> {
        Self::read(name, reader, Endian::Little)
    }

    /// Reads an AIFF/AIFF-C container.
    pub fn read_aiff<Rd: Read + Seek>(name: &str, reader: &mut Rd) -> Result<Self> {
        Self::read(name, reader, Endian::Big)
    }

    /// Reads a container of either family, picked by the id at offset 0.
    pub fn read_detected<Rd: Read + Seek>(name: &str, reader: &mut Rd) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let mut id = [0u8; 4];
        let available = read_full(reader, &mut id)?;
        if available < id.len() {
            return Err(ChunkError::TruncatedContainer { available });
        }
        let family = ContainerFamily::detect(FourCC::new(id))?;

        reader.seek(SeekFrom::Start(0))?;
        Self::read(name, reader, family.endian())
    }

    /// Reads the container header and walks the chunk headers following it.
    ///
    /// The reader must be positioned at the container start.
    pub fn read<Rd: Read + Seek>(name: &str, reader: &mut Rd, endian: Endian) -> Result<Self> {
        let header = read_container_header(reader, endian)?;
        let headers = read_chunk_headers(reader, CONTAINER_HEADER_SIZE as u64, None, endian)?;
        debug!(
            "scanned {} ({}): {} chunks",
            name,
            header.format(),
            headers.len()
        );

        Ok(Container {
            name: name.to_string(),
            header,
            headers,
            endian,
        })
    }

    /// Every header carrying `id`, in start position order.
    pub fn find_headers(&self, id: FourCC) -> Vec<&ChunkHeader> {
        self.headers.iter().filter(|h| h.id() == id).collect()
    }

    /// The header of the chunk starting at `start_pos`.
    pub fn header_at(&self, start_pos: u64) -> Option<&ChunkHeader> {
        self.headers.iter().find(|h| h.start_pos() == start_pos)
    }

    /// The single header carrying `id`. Fails when there is none or several.
    pub fn unique_header(&self, id: FourCC) -> Result<&ChunkHeader> {
        match self.find_headers(id).as_slice() {
            [] => Err(ChunkError::ChunkNotFound { id }),
            [header] => Ok(*header),
            many => Err(ChunkError::AmbiguousChunkId {
                id,
                count: many.len(),
            }),
        }
    }

    /// Sum of the full sizes of every discovered chunk plus the format tag.
    pub fn discovered_size(&self) -> u64 {
        FORMAT_SIZE as u64 + self.headers.iter().map(|h| h.full_size()).sum::<u64>()
    }

    /// Compares the declared container size with what the scan found.
    ///
    /// Scanning stops quietly on a truncated stream, so callers needing
    /// strict validation check this.
    pub fn validate_size(&self) -> SizeCheck {
        SizeCheck {
            declared: self.header.size() as u64,
            discovered: self.discovered_size(),
        }
    }

    /// Reads the `[start, start + full_size)` range of a chunk.
    ///
    /// A chunk cut short by the end of the store yields the bytes that exist.
    pub fn chunk_bytes<Rd: Read + Seek>(reader: &mut Rd, header: &ChunkHeader) -> Result<Vec<u8>> {
        reader.seek(SeekFrom::Start(header.start_pos()))?;
        let mut data = Vec::new();
        reader.by_ref().take(header.full_size()).read_to_end(&mut data)?;
        Ok(data)
    }

    /// Sorts headers by start position. Scans already produce this order.
    pub(crate) fn sort_headers(&mut self) {
        self.headers.sort_by_key(|h| h.start_pos());
    }
}

/// Declared versus discovered container size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeCheck {
    pub declared: u64,
    pub discovered: u64,
}

impl SizeCheck {
    pub fn is_consistent(&self) -> bool {
        self.declared == self.discovered
    }
}

fn read_container_header<Rd: Read>(reader: &mut Rd, endian: Endian) -> Result<ContainerHeader> {
    let mut bytes = [0u8; CONTAINER_HEADER_SIZE];
    let n = read_full(reader, &mut bytes)?;
    if n < CONTAINER_HEADER_SIZE {
        return Err(ChunkError::TruncatedContainer { available: n });
    }
    ContainerHeader::decode(&bytes, endian)
}

/// Walks chunk headers from the reader's current position, which must be `offset`.
///
/// Stops on the first short header read, or once `end` is reached. A chunk
/// whose size runs past the end of the stream is still listed.
pub(crate) fn read_chunk_headers<Rd: Read + Seek>(
    reader: &mut Rd,
    mut offset: u64,
    end: Option<u64>,
    endian: Endian,
) -> Result<Vec<ChunkHeader>> {
    let mut headers = Vec::new();

    loop {
        if end.is_some_and(|end| offset + HEADER_SIZE as u64 > end) {
            break;
        }

        let mut bytes = [0u8; HEADER_SIZE];
        if read_full(reader, &mut bytes)? < HEADER_SIZE {
            break;
        }

        let header = ChunkHeader::decode(&bytes, offset, endian)?;
        debug!("{}", header);
        headers.push(header);
        offset += header.full_size();

        // EA IFF: chunks are even sized and start at even positions,
        // so the pad byte of an odd chunk is skipped with the payload.
        let mut skip = header.size() as i64;
        if header.has_padding() {
            skip += 1;
        }
        reader.seek(SeekFrom::Current(skip))?;
    }

    Ok(headers)
}

/// Fills `buf` as far as the stream allows and returns the byte count.
fn read_full<Rd: Read>(reader: &mut Rd, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
