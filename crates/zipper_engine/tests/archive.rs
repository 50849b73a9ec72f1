mod common;

use common::{read_entry, read_entry_names};
use pretty_assertions::assert_eq;
use zipper_engine::{ArchiveBuilder, ArchiveError, Compression};

#[test]
fn entries_are_named_by_ordinal_and_subtype() {
    let mut builder = ArchiveBuilder::new();
    assert_eq!(
        builder
            .add_entry(3, b"third".to_vec(), Some("image/jpeg"))
            .unwrap(),
        "image3.jpeg"
    );
    assert_eq!(
        builder
            .add_entry(1, b"first".to_vec(), Some("image/png"))
            .unwrap(),
        "image1.png"
    );
    assert_eq!(builder.len(), 2);

    let blob = builder.finalize().unwrap();
    assert_eq!(blob.entry_names(), ["image1.png", "image3.jpeg"]);
    assert_eq!(
        read_entry_names(blob.as_bytes()),
        vec!["image1.png".to_string(), "image3.jpeg".to_string()]
    );
    assert_eq!(read_entry(blob.as_bytes(), "image3.jpeg"), b"third");
}

#[test]
fn empty_builder_finalizes_to_valid_archive() {
    let blob = ArchiveBuilder::new().finalize().unwrap();
    assert!(blob.is_empty());
    assert!(!blob.as_bytes().is_empty());
    assert!(read_entry_names(blob.as_bytes()).is_empty());
}

#[test]
fn duplicate_ordinal_is_rejected() {
    let mut builder = ArchiveBuilder::new();
    builder.add_entry(2, vec![1, 2, 3], Some("image/gif")).unwrap();
    let err = builder
        .add_entry(2, vec![4, 5, 6], Some("image/png"))
        .unwrap_err();
    assert_eq!(
        err,
        ArchiveError::DuplicateEntry {
            ordinal: 2,
            name: "image2.gif".to_string(),
        }
    );
    assert_eq!(builder.len(), 1);
}

#[test]
fn unknown_content_type_uses_bin_extension() {
    let mut builder = ArchiveBuilder::new();
    builder.add_entry(1, vec![0xff], None).unwrap();
    builder.add_entry(2, vec![0xfe], Some("nonsense")).unwrap();
    let blob = builder.finalize().unwrap();
    assert_eq!(blob.entry_names(), ["image1.bin", "image2.bin"]);
}

#[test]
fn stored_and_deflated_archives_hold_identical_content() {
    let payload: Vec<u8> = (0..4096u32).map(|i| (i % 7) as u8).collect();

    let mut stored = ArchiveBuilder::with_compression(Compression::Stored);
    stored.add_entry(1, payload.clone(), Some("image/bmp")).unwrap();
    let stored = stored.finalize().unwrap();

    let mut deflated = ArchiveBuilder::with_compression(Compression::Deflated);
    deflated.add_entry(1, payload.clone(), Some("image/bmp")).unwrap();
    let deflated = deflated.finalize().unwrap();

    assert!(deflated.as_bytes().len() < stored.as_bytes().len());
    assert_eq!(read_entry(stored.as_bytes(), "image1.bmp"), payload);
    assert_eq!(read_entry(deflated.as_bytes(), "image1.bmp"), payload);
}

#[test]
fn identical_inputs_produce_identical_archives() {
    let build = |order: &[usize]| {
        let mut builder = ArchiveBuilder::new();
        for &ordinal in order {
            builder
                .add_entry(ordinal, vec![ordinal as u8; 32], Some("image/png"))
                .unwrap();
        }
        builder.finalize().unwrap()
    };
    assert_eq!(build(&[1, 2, 3]), build(&[3, 1, 2]));
}
