pub use crate::error::{ChunkError, Result};
pub use crate::fourcc::FourCC;
pub use crate::header::{ChunkHeader, ContainerHeader, Endian};
pub use crate::*;
pub use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
pub use std::io::{Cursor, Read, Seek, SeekFrom, Write};
pub use tracing::{debug, trace};
