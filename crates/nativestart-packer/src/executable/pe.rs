//! Rebuilding PE images with an extra resource section.

use std::ops::Range;

use goblin::pe::header::Header;
use goblin::pe::optional_header::MAGIC_64;

use super::resources::{ResourceDirectory, get_u16, get_u32, put_u16, put_u32, to_u32};
use crate::error::{PackError, Result};

const PE_MAGIC_LEN: usize = 4;
const COFF_HEADER_LEN: usize = 20;
const SECTION_HEADER_LEN: usize = 40;

const RESOURCE_SECTION_NAME: &[u8; 8] = b".rsrc\0\0\0";
/// `IMAGE_SCN_CNT_INITIALIZED_DATA | IMAGE_SCN_MEM_READ`
const RESOURCE_SECTION_CHARACTERISTICS: u32 = 0x4000_0040;

const RESOURCE_DIRECTORY: usize = 2;
const CERTIFICATE_DIRECTORY: usize = 4;

const PADDING: &[u8] = b"PADDINGXX";

#[derive(Debug, Clone)]
struct Section {
    name: String,
    virtual_address: u32,
    virtual_size: u32,
    pointer_to_raw_data: u32,
    size_of_raw_data: u32,
}

/// Offsets and values of the headers that change when a section is added.
#[derive(Debug)]
struct Layout {
    coff_header: usize,
    optional_header: usize,
    data_directories: usize,
    section_table: usize,
    section_alignment: u32,
    file_alignment: u32,
    size_of_headers: u32,
    sections: Vec<Section>,
}

impl Layout {
    fn parse(image: &[u8]) -> Result<Self> {
        let header = Header::parse(image)?;
        let optional = header
            .optional_header
            .ok_or_else(|| PackError::Malformed("PE image has no optional header".into()))?;

        let coff_header = header.dos_header.pe_pointer as usize + PE_MAGIC_LEN;
        let optional_header = coff_header + COFF_HEADER_LEN;
        let section_table = optional_header + header.coff_header.size_of_optional_header as usize;
        let data_directories =
            optional_header + if optional.standard_fields.magic == MAGIC_64 { 112 } else { 96 };

        let mut offset = section_table;
        let sections = header
            .coff_header
            .sections(image, &mut offset)?
            .iter()
            .map(|s| Section {
                name: s.name().unwrap_or_default().to_string(),
                virtual_address: s.virtual_address,
                virtual_size: s.virtual_size,
                pointer_to_raw_data: s.pointer_to_raw_data,
                size_of_raw_data: s.size_of_raw_data,
            })
            .collect();

        Ok(Self {
            coff_header,
            optional_header,
            data_directories,
            section_table,
            section_alignment: optional.windows_fields.section_alignment,
            file_alignment: optional.windows_fields.file_alignment,
            size_of_headers: optional.windows_fields.size_of_headers,
            sections,
        })
    }

    fn directory(&self, index: usize) -> usize {
        self.data_directories + index * 8
    }
}

/// File range of the raw data of section `name`.
///
/// # Errors
///
/// Returns [`PackError::Malformed`] if the image is not a PE file or has no
/// such section.
pub(crate) fn section_range(image: &[u8], name: &str) -> Result<Range<usize>> {
    let layout = Layout::parse(image)?;
    let section = layout
        .sections
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| PackError::Malformed(format!("PE image has no {name} section")))?;

    let start = section.pointer_to_raw_data as usize;
    let end = start + section.size_of_raw_data as usize;
    if end > image.len() {
        return Err(PackError::Malformed(format!(
            "{name} section extends past the end of the file"
        )));
    }
    Ok(start..end)
}

/// Append a `.rsrc` section holding `resources` and register it as the
/// image's resource directory.
///
/// Data appended after the last section (an overlay, e.g. an embedded
/// signature) is kept after the new section.
///
/// # Errors
///
/// Returns [`PackError::Malformed`] if the image is not a PE file or its
/// headers have no room for another section header.
pub(crate) fn append_resource_section(
    image: &[u8],
    resources: &ResourceDirectory,
) -> Result<Vec<u8>> {
    let layout = Layout::parse(image)?;

    let header_at = layout.section_table + SECTION_HEADER_LEN * layout.sections.len();
    let first_raw = layout
        .sections
        .iter()
        .filter(|s| s.size_of_raw_data > 0)
        .map(|s| s.pointer_to_raw_data)
        .min()
        .unwrap_or(layout.size_of_headers)
        .min(layout.size_of_headers) as usize;
    if header_at + SECTION_HEADER_LEN > first_raw {
        return Err(PackError::Malformed("PE headers have no room for another section".into()));
    }

    let virtual_end = layout
        .sections
        .iter()
        .map(|s| s.virtual_address.saturating_add(s.virtual_size.max(s.size_of_raw_data)))
        .max()
        .unwrap_or(layout.size_of_headers);
    let raw_end = layout
        .sections
        .iter()
        .map(|s| s.pointer_to_raw_data.saturating_add(s.size_of_raw_data))
        .max()
        .unwrap_or(layout.size_of_headers);
    let virtual_address = align(virtual_end, layout.section_alignment);
    let pointer_to_raw_data = align(raw_end, layout.file_alignment) as usize;

    let data = resources.to_bytes(virtual_address)?;
    let virtual_size = to_u32(data.len())?;
    let size_of_raw_data = align(virtual_size, layout.file_alignment);
    let overlay = image.get(pointer_to_raw_data..).unwrap_or_default();

    let mut out =
        Vec::with_capacity(pointer_to_raw_data + size_of_raw_data as usize + overlay.len());
    out.extend_from_slice(&image[..pointer_to_raw_data.min(image.len())]);
    out.resize(pointer_to_raw_data, 0);
    out.extend_from_slice(&data);
    let padding = size_of_raw_data as usize - data.len();
    out.extend(PADDING.iter().cycle().take(padding));
    out.extend_from_slice(overlay);

    // Section header
    out[header_at..header_at + 8].copy_from_slice(RESOURCE_SECTION_NAME);
    put_u32(&mut out, header_at + 8, virtual_size);
    put_u32(&mut out, header_at + 12, virtual_address);
    put_u32(&mut out, header_at + 16, size_of_raw_data);
    put_u32(&mut out, header_at + 20, to_u32(pointer_to_raw_data)?);
    out[header_at + 24..header_at + 36].fill(0);
    put_u32(&mut out, header_at + 36, RESOURCE_SECTION_CHARACTERISTICS);

    // COFF NumberOfSections
    let count = get_u16(&out, layout.coff_header + 2) + 1;
    put_u16(&mut out, layout.coff_header + 2, count);

    // SizeOfInitializedData, SizeOfImage
    let initialized = get_u32(&out, layout.optional_header + 8).saturating_add(size_of_raw_data);
    put_u32(&mut out, layout.optional_header + 8, initialized);
    let size_of_image = align(
        virtual_address.saturating_add(virtual_size),
        layout.section_alignment,
    );
    put_u32(&mut out, layout.optional_header + 56, size_of_image);

    let resource_dir = layout.directory(RESOURCE_DIRECTORY);
    put_u32(&mut out, resource_dir, virtual_address);
    put_u32(&mut out, resource_dir + 4, virtual_size);

    // The certificate table is addressed by file offset, not RVA
    let certificates = layout.directory(CERTIFICATE_DIRECTORY);
    let certificate_offset = get_u32(&out, certificates) as usize;
    if certificate_offset != 0 && certificate_offset >= pointer_to_raw_data {
        put_u32(&mut out, certificates, to_u32(certificate_offset + size_of_raw_data as usize)?);
    }

    tracing::debug!(
        "added .rsrc section: rva {virtual_address:#x}, file offset {pointer_to_raw_data:#x}, {virtual_size} bytes"
    );
    Ok(out)
}

fn align(value: u32, alignment: u32) -> u32 {
    if alignment <= 1 { value } else { value.next_multiple_of(alignment) }
}
