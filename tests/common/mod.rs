#![allow(dead_code)]

use dicom::core::{DataElement, PrimitiveValue, VR};
use dicom::object::{FileMetaTableBuilder, InMemDicomObject};
use dicom_dictionary_std::{tags, uids};
use std::{
    fs,
    path::Path,
    sync::atomic::{AtomicU32, Ordering},
};

static NEXT_INSTANCE: AtomicU32 = AtomicU32::new(1);

/// Write a minimal MR slice carrying the given temporal attributes.
pub fn write_dicom_slice(path: &Path, position: Option<i64>, acquisition_time: Option<&str>) {
    let instance_uid = format!(
        "1.2.826.0.1.3680043.2.1125.{}",
        NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed)
    );

    let mut object = InMemDicomObject::new_empty();
    object.put(DataElement::new(
        tags::SOP_CLASS_UID,
        VR::UI,
        PrimitiveValue::from(uids::MR_IMAGE_STORAGE),
    ));
    object.put(DataElement::new(
        tags::SOP_INSTANCE_UID,
        VR::UI,
        PrimitiveValue::from(instance_uid.as_str()),
    ));
    if let Some(position) = position {
        object.put(DataElement::new(
            tags::TEMPORAL_POSITION_IDENTIFIER,
            VR::IS,
            PrimitiveValue::from(position.to_string()),
        ));
    }
    if let Some(time) = acquisition_time {
        object.put(DataElement::new(
            tags::ACQUISITION_TIME,
            VR::TM,
            PrimitiveValue::from(time),
        ));
    }

    let file_object = object
        .with_meta(
            FileMetaTableBuilder::new()
                .media_storage_sop_class_uid(uids::MR_IMAGE_STORAGE)
                .media_storage_sop_instance_uid(instance_uid)
                .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN),
        )
        .expect("should have built the file meta group");
    file_object
        .write_to_file(path)
        .expect("should have written the DICOM file");
}

/// Write a single-file NIfTI-1 header (no voxel data) with the given `dim`.
pub fn write_nifti_header(path: &Path, dim: [i16; 8]) {
    let mut header = vec![0u8; 352];
    header[0..4].copy_from_slice(&348i32.to_le_bytes());
    for (i, value) in dim.iter().enumerate() {
        let offset = 40 + i * 2;
        header[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }
    // datatype uint8, 8 bits per voxel
    header[70..72].copy_from_slice(&2i16.to_le_bytes());
    header[72..74].copy_from_slice(&8i16.to_le_bytes());
    for i in 0..8 {
        let offset = 76 + i * 4;
        header[offset..offset + 4].copy_from_slice(&1f32.to_le_bytes());
    }
    header[108..112].copy_from_slice(&352f32.to_le_bytes());
    header[112..116].copy_from_slice(&1f32.to_le_bytes());
    header[344..348].copy_from_slice(b"n+1\0");
    fs::write(path, header).expect("should have written the NIfTI header");
}
