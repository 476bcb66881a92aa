use std::io::Cursor;

use chunkwav_lib::chunks::{
    BroadcastExtensionChunk, ChunkCodec, CommonChunk, IxmlDocument, Loudness, MetadataXmlChunk,
    PcmFormatChunk,
};
use chunkwav_lib::file::{open_container, open_for_update, truncate_to};
use chunkwav_lib::*;

fn container_bytes(id: FourCC, format: FourCC, endian: Endian, chunks: &[Vec<u8>]) -> Vec<u8> {
    let body = chunks.concat();
    let size = (FORMAT_SIZE + body.len()) as u32;
    let mut data = ContainerHeader::encode(id, size, format, endian).to_bytes().to_vec();
    data.extend(body);
    data
}

fn data_chunk(samples: usize, endian: Endian) -> Vec<u8> {
    let payload: Vec<u8> = (0..samples).map(|i| i as u8).collect();
    let mut bytes = ChunkHeader::encode(FourCC::DATA, payload.len() as u32, endian)
        .to_bytes()
        .to_vec();
    bytes.extend(payload);
    header::pad(&mut bytes);
    bytes
}

fn broadcast_wave() -> Vec<u8> {
    let mut bext = BroadcastExtensionChunk::encode(
        2,
        "Door slam, close",
        "FieldRec",
        "REF-0042",
        "2023-11-05",
        "09:15:00",
        48000 * 3600,
        "A=PCM,F=48000,W=24,M=mono,T=FieldRec\r\n",
    );
    bext.set_loudness(Loudness {
        value: -1650,
        ..Loudness::default()
    });

    let mut doc = IxmlDocument::default();
    doc.set("PROJECT", "Doors");
    doc.set("SCENE", "4");
    doc.set("TAKE", "2");

    container_bytes(
        FourCC::RIFF,
        FourCC::WAVE,
        Endian::Little,
        &[
            PcmFormatChunk::pcm(1, 48000, 24).unwrap().to_bytes().unwrap(),
            bext.to_bytes().unwrap(),
            MetadataXmlChunk::from_document(&doc, Endian::Little)
                .unwrap()
                .to_bytes()
                .unwrap(),
            data_chunk(301, Endian::Little),
        ],
    )
}

#[test]
fn scans_and_decodes_a_broadcast_wave_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("door.wav");
    std::fs::write(&path, broadcast_wave()).unwrap();

    let file = open_container(&path).unwrap();
    let ids: Vec<FourCC> = file.container.headers.iter().map(|h| h.id()).collect();
    assert_eq!(ids, vec![FourCC::FMT, FourCC::BEXT, FourCC::IXML, FourCC::DATA]);
    assert!(file.container.validate_size().is_consistent());

    let bext_header = *file.container.unique_header(FourCC::BEXT).unwrap();
    let bext = BroadcastExtensionChunk::decode(file.chunk(&bext_header), Endian::Little).unwrap();
    assert_eq!(bext.description(), "Door slam, close");
    assert_eq!(bext.time_reference(), 48000 * 3600);
    assert_eq!(bext.loudness().value, -1650);

    let decoded = file.decode_chunks();
    assert!(decoded.iter().all(|c| c.is_ok()));
    match decoded[2].as_ref().unwrap() {
        DecodedChunk::MetadataXml(chunk) => {
            assert_eq!(chunk.document().unwrap().get("SCENE"), Some("4"));
        }
        chunk => panic!("unexpected {:?}", chunk.id()),
    }
}

#[test]
fn delete_and_append_round_trip_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("door.wav");
    let original = broadcast_wave();
    std::fs::write(&path, &original).unwrap();

    let before = open_container(&path).unwrap().into_container();
    let bext_full = before.unique_header(FourCC::BEXT).unwrap().full_size();
    let bext_bytes = {
        let header = *before.unique_header(FourCC::BEXT).unwrap();
        Container::chunk_bytes(&mut Cursor::new(&original), &header).unwrap()
    };

    let (mut container, mut file) = open_for_update(&path).unwrap();
    let len = ContainerMutator::new(&mut container, &mut file)
        .delete_chunk(FourCC::BEXT)
        .unwrap();
    truncate_to(&file, len).unwrap();
    assert_eq!(len, original.len() as u64 - bext_full);

    let after_delete = open_container(&path).unwrap();
    assert!(after_delete.container.find_headers(FourCC::BEXT).is_empty());
    assert_eq!(after_delete.container.header.size() as u64, before.header.size() as u64 - bext_full);
    assert!(after_delete.container.validate_size().is_consistent());
    drop(after_delete);

    let appended = ContainerMutator::new(&mut container, &mut file)
        .append_chunk(&mut bext_bytes.as_slice(), 64)
        .unwrap();
    assert_eq!(appended, bext_full);

    let after_append = open_container(&path).unwrap();
    assert_eq!(after_append.image().len(), original.len());
    assert_eq!(after_append.container.header.size(), before.header.size());
    let ids: Vec<FourCC> = after_append.container.headers.iter().map(|h| h.id()).collect();
    assert_eq!(ids, vec![FourCC::FMT, FourCC::IXML, FourCC::DATA, FourCC::BEXT]);
    assert_eq!(after_append.container.headers, container.headers);
}

#[test]
fn aifc_common_chunk_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.aifc");
    let comm = CommonChunk::encode(2, 44100, 16, 44100, FourCC::NONE, "not compressed");
    std::fs::write(
        &path,
        container_bytes(
            FourCC::FORM,
            FourCC::AIFC,
            Endian::Big,
            &[comm.to_bytes().unwrap(), data_chunk(8, Endian::Big)],
        ),
    )
    .unwrap();

    let file = open_container(&path).unwrap();
    assert_eq!(file.container.endian, Endian::Big);
    assert_eq!(file.container.header.format(), FourCC::AIFC);

    match file.decode_chunks().remove(0).unwrap() {
        DecodedChunk::Common(decoded) => {
            assert_eq!(decoded.sample_rate(), 44100);
            assert_eq!(decoded.compression_type, Some(FourCC::NONE));
            assert_eq!(decoded.compression_name(), "not compressed");
        }
        chunk => panic!("unexpected {:?}", chunk.id()),
    }
}

#[test]
fn truncated_file_lists_what_it_can() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cut.wav");
    let mut data = broadcast_wave();
    data.truncate(12 + 24 + 100);
    std::fs::write(&path, data).unwrap();

    let file = open_container(&path).unwrap();
    assert_eq!(file.container.headers.len(), 2);
    assert!(!file.container.validate_size().is_consistent());

    let decoded = file.decode_chunks();
    assert!(decoded[0].is_ok());
    assert!(matches!(
        decoded[1],
        Err(ChunkError::TruncatedPayload { kind: "broadcast extension", .. })
    ));
}
