//! Synthetic stubs for tests.

use super::patch::{
    KEY_PLACEHOLDER, NAME_PLACEHOLDER, NAME_SLOT, URL_PLACEHOLDER, URL_SLOT, pad_right,
};
use super::resources::{put_u16, put_u32};

/// Offset of the name placeholder copy in `.text`, which must stay untouched.
pub(crate) const TEXT_NAME: usize = 0x400;
pub(crate) const RDATA_NAME: usize = 0x610;
pub(crate) const RDATA_URL: usize = 0x660;
pub(crate) const RDATA_KEY: usize = 0x780;

/// A PE32+ image with `.text` (file 0x400..0x600, rva 0x1000) and `.rdata`
/// (file 0x600..0xA00, rva 0x2000) holding the placeholders, followed by
/// `overlay`.
pub(crate) fn pe_image(overlay: &[u8]) -> Vec<u8> {
    let mut image = vec![0u8; 0xA00];
    image[..2].copy_from_slice(b"MZ");
    put_u32(&mut image, 0x3C, 0x80);
    image[0x80..0x84].copy_from_slice(b"PE\0\0");

    let coff = 0x84;
    put_u16(&mut image, coff, 0x8664);
    put_u16(&mut image, coff + 2, 2);
    put_u16(&mut image, coff + 16, 0xF0);
    put_u16(&mut image, coff + 18, 0x22);

    let opt = 0x98;
    put_u16(&mut image, opt, 0x20B);
    put_u32(&mut image, opt + 4, 0x200);
    put_u32(&mut image, opt + 8, 0x400);
    put_u32(&mut image, opt + 16, 0x1000);
    put_u32(&mut image, opt + 20, 0x1000);
    image[opt + 24..opt + 32].copy_from_slice(&0x1_4000_0000u64.to_le_bytes());
    put_u32(&mut image, opt + 32, 0x1000);
    put_u32(&mut image, opt + 36, 0x200);
    put_u16(&mut image, opt + 40, 6);
    put_u16(&mut image, opt + 48, 6);
    put_u32(&mut image, opt + 56, 0x3000);
    put_u32(&mut image, opt + 60, 0x400);
    put_u16(&mut image, opt + 68, 3);
    image[opt + 72..opt + 80].copy_from_slice(&0x10_0000u64.to_le_bytes());
    image[opt + 80..opt + 88].copy_from_slice(&0x1000u64.to_le_bytes());
    image[opt + 88..opt + 96].copy_from_slice(&0x10_0000u64.to_le_bytes());
    image[opt + 96..opt + 104].copy_from_slice(&0x1000u64.to_le_bytes());
    put_u32(&mut image, opt + 108, 16);

    let sections = [
        (b".text\0\0\0", 0x100, 0x1000, 0x200, 0x400, 0x6000_0020),
        (b".rdata\0\0", 0x300, 0x2000, 0x400, 0x600, 0x4000_0040),
    ];
    for (i, (name, vsize, va, raw_size, raw_ptr, flags)) in sections.into_iter().enumerate() {
        let at = 0x188 + i * 40;
        image[at..at + 8].copy_from_slice(name);
        put_u32(&mut image, at + 8, vsize);
        put_u32(&mut image, at + 12, va);
        put_u32(&mut image, at + 16, raw_size);
        put_u32(&mut image, at + 20, raw_ptr);
        put_u32(&mut image, at + 36, flags);
    }

    let name = pad_right(NAME_PLACEHOLDER, NAME_SLOT).unwrap();
    image[TEXT_NAME..TEXT_NAME + NAME_SLOT].copy_from_slice(&name);
    image[RDATA_NAME..RDATA_NAME + NAME_SLOT].copy_from_slice(&name);
    image[RDATA_URL..RDATA_URL + URL_SLOT].copy_from_slice(&pad_right(URL_PLACEHOLDER, URL_SLOT).unwrap());
    image[RDATA_KEY..RDATA_KEY + KEY_PLACEHOLDER.len()].copy_from_slice(KEY_PLACEHOLDER);

    image.extend_from_slice(overlay);
    image
}

/// A minimal single image `.ico` file with a 32 bit BMP of `size` pixels.
pub(crate) fn bmp_icon_file(size: u8) -> Vec<u8> {
    let side = if size == 0 { 256 } else { u32::from(size) };
    let mask_row = side.div_ceil(32) * 4;
    let mut bmp = Vec::new();
    for v in [40u32, side, side * 2] {
        bmp.extend_from_slice(&v.to_le_bytes());
    }
    bmp.extend_from_slice(&1u16.to_le_bytes());
    bmp.extend_from_slice(&32u16.to_le_bytes());
    bmp.extend_from_slice(&[0; 24]);
    bmp.resize(bmp.len() + (side * side * 4 + mask_row * side) as usize, 0x80);

    let mut file = Vec::new();
    for v in [0u16, 1, 1] {
        file.extend_from_slice(&v.to_le_bytes());
    }
    file.extend_from_slice(&[size, size, 0, 0]);
    file.extend_from_slice(&1u16.to_le_bytes());
    file.extend_from_slice(&32u16.to_le_bytes());
    file.extend_from_slice(&(bmp.len() as u32).to_le_bytes());
    file.extend_from_slice(&22u32.to_le_bytes());
    file.extend_from_slice(&bmp);
    file
}

