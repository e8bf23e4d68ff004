//! Icon resources from `.ico` files.

use std::io::{Read, Seek};

use ico::{IconDir, ResourceType};

use crate::error::{PackError, Result};

const BITMAP_HEADER_LEN: usize = 16;

/// One image of an icon file, with the metadata the group icon directory
/// repeats for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IconImage {
    pub(crate) data: Vec<u8>,
    width: u8,
    height: u8,
    planes: u16,
    bit_count: u16,
}

impl IconImage {
    fn from_entry(data: Vec<u8>, is_png: bool) -> Result<Self> {
        if is_png {
            return Ok(Self { data, width: 0, height: 0, planes: 1, bit_count: 32 });
        }
        if data.len() < BITMAP_HEADER_LEN {
            return Err(PackError::Malformed("icon image lacks a bitmap header".into()));
        }
        // BITMAPINFOHEADER; the height covers the XOR and AND masks
        let width = i32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        let height = i32::from_le_bytes([data[8], data[9], data[10], data[11]]);
        let planes = u16::from_le_bytes([data[12], data[13]]);
        let bit_count = u16::from_le_bytes([data[14], data[15]]);
        Ok(Self {
            data,
            width: width as u8,
            height: (height / 2) as u8,
            planes,
            bit_count,
        })
    }
}

/// Read every image of an `.ico` file.
///
/// # Errors
///
/// Returns [`PackError::Malformed`] if the input is not an icon file.
pub(crate) fn read_icons<R: Read + Seek>(reader: R) -> Result<Vec<IconImage>> {
    let dir = IconDir::read(reader).map_err(|e| PackError::Malformed(format!("icon: {e}")))?;
    if dir.resource_type() != ResourceType::Icon {
        return Err(PackError::Malformed("icon: file is a cursor".into()));
    }
    if dir.entries().is_empty() {
        return Err(PackError::Malformed("icon: file holds no images".into()));
    }
    dir.entries()
        .iter()
        .map(|entry| IconImage::from_entry(entry.data().to_vec(), entry.is_png()))
        .collect()
}

/// `GRPICONDIR` listing `images`, which are stored as `RT_ICON` resources
/// with ids `1..=n`.
pub(crate) fn group_icon(images: &[IconImage]) -> Result<Vec<u8>> {
    let count = u16::try_from(images.len())
        .map_err(|_| PackError::Malformed("icon: too many images".into()))?;

    let mut out = Vec::with_capacity(6 + 14 * images.len());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&count.to_le_bytes());
    for (id, image) in (1..=count).zip(images) {
        out.push(image.width);
        out.push(image.height);
        out.push(0); // color count
        out.push(0);
        out.extend_from_slice(&image.planes.to_le_bytes());
        out.extend_from_slice(&image.bit_count.to_le_bytes());
        out.extend_from_slice(&super::resources::to_u32(image.data.len())?.to_le_bytes());
        out.extend_from_slice(&id.to_le_bytes());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executable::testing::bmp_icon_file;
    use std::io::Cursor;

    #[test]
    fn reads_bitmap_header() {
        let images = read_icons(Cursor::new(bmp_icon_file(16))).unwrap();
        assert_eq!(images.len(), 1);
        let image = &images[0];
        assert_eq!((image.width, image.height), (16, 16));
        assert_eq!((image.planes, image.bit_count), (1, 32));
        assert_eq!(image.data.len(), 40 + 16 * 16 * 4 + 4 * 16);
    }

    #[test]
    fn png_images_use_fixed_metadata() {
        let image = IconImage::from_entry(b"\x89PNG....".to_vec(), true).unwrap();
        assert_eq!((image.width, image.height, image.planes, image.bit_count), (0, 0, 1, 32));
    }

    #[test]
    fn group_directory_layout() {
        let images = read_icons(Cursor::new(bmp_icon_file(32))).unwrap();
        let group = group_icon(&images).unwrap();
        assert_eq!(group.len(), 6 + 14);
        assert_eq!(&group[..6], &[0, 0, 1, 0, 1, 0]);
        assert_eq!(&group[6..10], &[32, 32, 0, 0]);
        assert_eq!(u16::from_le_bytes([group[10], group[11]]), 1);
        assert_eq!(u16::from_le_bytes([group[12], group[13]]), 32);
        let bytes = u32::from_le_bytes([group[14], group[15], group[16], group[17]]);
        assert_eq!(bytes as usize, images[0].data.len());
        assert_eq!(u16::from_le_bytes([group[18], group[19]]), 1);
    }

    #[test]
    fn garbage_is_malformed() {
        let err = read_icons(Cursor::new(b"not an icon".to_vec())).unwrap_err();
        assert!(matches!(err, PackError::Malformed(_)));
    }

    #[test]
    fn truncated_bitmap_is_malformed() {
        assert!(IconImage::from_entry(vec![0; 8], false).is_err());
    }
}
