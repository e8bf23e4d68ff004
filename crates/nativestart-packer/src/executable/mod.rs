//! Launcher executables.
//!
//! A launcher is a precompiled stub with the application name, descriptor
//! URL and (for signed launchers) the descriptor public key patched into
//! reserved placeholders. Windows stubs additionally receive a resource
//! section with icon, version information and manifest.
//!
//! ```no_run
//! use nativestart_packer::{ExecutableBuilder, StubDirectory};
//! use nativestart_packer::schema::OperatingSystem;
//!
//! # fn main() -> nativestart_packer::Result<()> {
//! let stubs = StubDirectory::new("stubs");
//! let mut out = std::fs::File::create("demo.exe")?;
//! ExecutableBuilder::new("Demo", "https://example.com/demo-windows.json")
//!     .windows_icon(std::fs::File::open("demo.ico")?)?
//!     .build(OperatingSystem::Windows, &stubs, &mut out)?;
//! # Ok(())
//! # }
//! ```

mod icon;
pub mod patch;
mod pe;
mod resources;
#[cfg(test)]
mod testing;
mod version_info;

use std::io::{Cursor, Read, Write};

use ed25519_dalek::VerifyingKey;
use nativestart_schema::OperatingSystem;

use crate::error::{PackError, Result};
use crate::keys;
use crate::stub::StubSource;
use patch::Placeholders;
use resources::{
    MANIFEST_LANGUAGE, RT_GROUP_ICON, RT_ICON, RT_MANIFEST, RT_VERSION, ResourceDirectory,
    ResourceNode, STUB_LANGUAGE,
};

/// Manifest embedded when none is supplied.
pub const DEFAULT_MANIFEST: &str = include_str!("../../resources/windows/manifest.xml");

/// Builds a launcher for one OS from a generic stub.
#[derive(Debug, Clone)]
pub struct ExecutableBuilder {
    name: String,
    url: String,
    icon: Option<Vec<u8>>,
    manifest: Option<String>,
    key: Option<VerifyingKey>,
}

impl ExecutableBuilder {
    /// Launcher for application `name` loading its descriptor from `url`.
    ///
    /// The URL may contain launcher-side substitution tokens such as
    /// `${OS}`; they are stored verbatim.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            icon: None,
            manifest: None,
            key: None,
        }
    }

    /// Icon (`.ico` content) for Windows launchers. It is parsed during
    /// [`build`](Self::build).
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails.
    pub fn windows_icon(&mut self, mut reader: impl Read) -> Result<&mut Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.icon = Some(bytes);
        Ok(self)
    }

    /// Application manifest XML for Windows launchers.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the manifest is not UTF-8.
    pub fn windows_manifest(&mut self, mut reader: impl Read) -> Result<&mut Self> {
        let mut xml = String::new();
        reader
            .read_to_string(&mut xml)
            .map_err(|e| PackError::Malformed(format!("manifest: {e}")))?;
        self.manifest = Some(xml);
        Ok(self)
    }

    /// Produce a signed launcher that verifies descriptors against `key`.
    pub fn key(&mut self, key: VerifyingKey) -> &mut Self {
        self.key = Some(key);
        self
    }

    /// Like [`key`](Self::key), from the raw 32 byte public key.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::InvalidKey`] if the bytes are not a valid
    /// Ed25519 public key.
    pub fn key_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        self.key = Some(keys::verifying_key(bytes)?);
        Ok(self)
    }

    /// Whether a signed stub is used.
    pub fn is_signed(&self) -> bool {
        self.key.is_some()
    }

    /// Build the launcher for `os` and write it to `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stub cannot be loaded, lacks a placeholder,
    /// the name or URL do not fit, or the icon or PE image are malformed.
    pub fn build(
        &self,
        os: OperatingSystem,
        stubs: &dyn StubSource,
        out: &mut dyn Write,
    ) -> Result<()> {
        let bytes = self.build_bytes(os, stubs)?;
        out.write_all(&bytes)?;
        out.flush()?;
        tracing::info!(
            "built {} launcher for {} ({} bytes{})",
            os,
            self.name,
            bytes.len(),
            if self.is_signed() { ", signed" } else { "" }
        );
        Ok(())
    }

    /// Build the launcher for `os` in memory.
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_bytes(&self, os: OperatingSystem, stubs: &dyn StubSource) -> Result<Vec<u8>> {
        let placeholders = Placeholders::new(&self.name, &self.url, self.key.as_ref())?;
        let mut image = stubs.load(os, self.is_signed())?;

        match os {
            OperatingSystem::Windows => {
                let resources = self.windows_resources()?;
                let rdata = pe::section_range(&image, ".rdata")?;
                placeholders.apply(&mut image[rdata])?;
                pe::append_resource_section(&image, &resources)
            }
            OperatingSystem::Linux | OperatingSystem::Mac => {
                placeholders.apply(&mut image)?;
                Ok(image)
            }
        }
    }

    fn windows_resources(&self) -> Result<ResourceDirectory> {
        let mut root = ResourceDirectory::new();

        if let Some(icon) = &self.icon {
            let images = icon::read_icons(Cursor::new(icon))?;
            let group = icon::group_icon(&images)?;

            let mut icons = ResourceDirectory::new();
            for (id, image) in (1..).zip(images) {
                icons.insert(
                    id,
                    ResourceNode::Directory(ResourceDirectory::leaf(STUB_LANGUAGE, image.data)),
                );
            }
            root.insert(RT_ICON, ResourceNode::Directory(icons));
            let group = ResourceDirectory::single(1, ResourceDirectory::leaf(STUB_LANGUAGE, group));
            root.insert(RT_GROUP_ICON, ResourceNode::Directory(group));
        }

        let version = version_info::version_info(&self.name, 1, 0);
        let version = ResourceDirectory::single(1, ResourceDirectory::leaf(STUB_LANGUAGE, version));
        root.insert(RT_VERSION, ResourceNode::Directory(version));

        let manifest = self.manifest.as_deref().unwrap_or(DEFAULT_MANIFEST);
        root.insert(
            RT_MANIFEST,
            ResourceNode::Directory(ResourceDirectory::single(
                1,
                ResourceDirectory::leaf(MANIFEST_LANGUAGE, manifest.as_bytes().to_vec()),
            )),
        );
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;
    use patch::{NAME_SLOT, URL_SLOT, pad_right};
    use resources::{get_u16, get_u32};
    use testing::{RDATA_KEY, RDATA_NAME, RDATA_URL, TEXT_NAME, bmp_icon_file, pe_image};

    /// Serves the same image for every variant, recording what was asked.
    struct FixedStub {
        image: Vec<u8>,
        requested: std::cell::RefCell<Vec<(OperatingSystem, bool)>>,
    }

    impl FixedStub {
        fn new(image: Vec<u8>) -> Self {
            Self { image, requested: Default::default() }
        }
    }

    impl StubSource for FixedStub {
        fn load(&self, os: OperatingSystem, signed: bool) -> Result<Vec<u8>> {
            self.requested.borrow_mut().push((os, signed));
            Ok(self.image.clone())
        }
    }

    fn key() -> VerifyingKey {
        SigningKey::from_bytes(&[3u8; 32]).verifying_key()
    }

    /// Data of the type/id/language leaf in the `.rsrc` section.
    fn resource(image: &[u8], kind: u32, id: u32, language: u32) -> Option<&[u8]> {
        let layout_rva = get_u32(image, 0x98 + 112 + 16);
        let raw = 0xA00usize;
        let rsrc = &image[raw..];
        let mut table = 0usize;
        for (depth, want) in [kind, id, language].into_iter().enumerate() {
            let count = get_u16(rsrc, table + 14) as usize;
            let entry = (0..count).map(|i| table + 16 + i * 8).find(|&at| get_u32(rsrc, at) == want)?;
            let target = get_u32(rsrc, entry + 4);
            if depth < 2 {
                table = (target & 0x7FFF_FFFF) as usize;
            } else {
                let at = target as usize;
                let rva = get_u32(rsrc, at);
                let size = get_u32(rsrc, at + 4) as usize;
                assert_eq!(get_u32(rsrc, at + 8), 1252);
                let offset = (rva - layout_rva) as usize;
                return Some(&rsrc[offset..offset + size]);
            }
        }
        None
    }

    fn root_types(image: &[u8]) -> Vec<u32> {
        let rsrc = &image[0xA00..];
        let count = get_u16(rsrc, 14) as usize;
        (0..count).map(|i| get_u32(rsrc, 16 + i * 8)).collect()
    }

    #[test]
    fn linux_stub_is_patched_in_place() {
        let stub = FixedStub::new(pe_image(b"tail"));
        let out = ExecutableBuilder::new("Demo", "http://x/demo-${OS}.json")
            .build_bytes(OperatingSystem::Linux, &stub)
            .unwrap();

        assert_eq!(out.len(), stub.image.len());
        // The first occurrence wins, wherever it is
        assert_eq!(&out[TEXT_NAME..TEXT_NAME + NAME_SLOT], pad_right("Demo", NAME_SLOT).unwrap());
        assert_eq!(&out[RDATA_NAME..RDATA_NAME + NAME_SLOT], &stub.image[RDATA_NAME..RDATA_NAME + NAME_SLOT]);
        assert_eq!(
            &out[RDATA_URL..RDATA_URL + URL_SLOT],
            pad_right("http://x/demo-${OS}.json", URL_SLOT).unwrap()
        );
        assert_eq!(stub.requested.borrow().as_slice(), &[(OperatingSystem::Linux, false)]);
    }

    #[test]
    fn key_selects_signed_stub() {
        let stub = FixedStub::new(pe_image(&[]));
        let out = ExecutableBuilder::new("Demo", "http://x/")
            .key(key())
            .build_bytes(OperatingSystem::Mac, &stub)
            .unwrap();
        assert_eq!(&out[RDATA_KEY..RDATA_KEY + 32], key().as_bytes());
        assert_eq!(stub.requested.borrow().as_slice(), &[(OperatingSystem::Mac, true)]);
    }

    #[test]
    fn windows_patches_only_rdata() {
        let stub = FixedStub::new(pe_image(&[]));
        let out = ExecutableBuilder::new("Demo", "http://x/app.json")
            .key(key())
            .build_bytes(OperatingSystem::Windows, &stub)
            .unwrap();

        assert_eq!(&out[TEXT_NAME..TEXT_NAME + NAME_SLOT], &stub.image[TEXT_NAME..TEXT_NAME + NAME_SLOT]);
        assert_eq!(&out[RDATA_NAME..RDATA_NAME + NAME_SLOT], pad_right("Demo", NAME_SLOT).unwrap());
        assert_eq!(&out[RDATA_URL..RDATA_URL + URL_SLOT], pad_right("http://x/app.json", URL_SLOT).unwrap());
        assert_eq!(&out[RDATA_KEY..RDATA_KEY + 32], key().as_bytes());
    }

    #[test]
    fn windows_resources_without_icon() {
        let stub = FixedStub::new(pe_image(&[]));
        let out = ExecutableBuilder::new("Demo", "http://x/")
            .build_bytes(OperatingSystem::Windows, &stub)
            .unwrap();

        assert_eq!(get_u16(&out, 0x86), 3);
        assert_eq!(root_types(&out), vec![RT_VERSION, RT_MANIFEST]);
        assert_eq!(
            resource(&out, RT_MANIFEST, 1, MANIFEST_LANGUAGE).unwrap(),
            DEFAULT_MANIFEST.as_bytes()
        );
        let version = resource(&out, RT_VERSION, 1, STUB_LANGUAGE).unwrap();
        assert_eq!(version, version_info::version_info("Demo", 1, 0).as_slice());
    }

    #[test]
    fn windows_resources_with_icon_and_manifest() {
        let stub = FixedStub::new(pe_image(&[]));
        let icon = bmp_icon_file(16);
        let out = ExecutableBuilder::new("Demo", "http://x/")
            .windows_icon(icon.as_slice())
            .unwrap()
            .windows_manifest("<assembly/>".as_bytes())
            .unwrap()
            .build_bytes(OperatingSystem::Windows, &stub)
            .unwrap();

        assert_eq!(root_types(&out), vec![RT_ICON, RT_GROUP_ICON, RT_VERSION, RT_MANIFEST]);
        assert_eq!(resource(&out, RT_ICON, 1, STUB_LANGUAGE).unwrap(), &icon[22..]);
        let group = resource(&out, RT_GROUP_ICON, 1, STUB_LANGUAGE).unwrap();
        assert_eq!(group.len(), 20);
        assert_eq!(&group[6..8], &[16, 16]);
        assert_eq!(resource(&out, RT_MANIFEST, 1, MANIFEST_LANGUAGE).unwrap(), b"<assembly/>");
        assert!(resource(&out, RT_MANIFEST, 1, STUB_LANGUAGE).is_none());
    }

    #[test]
    fn malformed_icon_fails_the_build() {
        let stub = FixedStub::new(pe_image(&[]));
        let err = ExecutableBuilder::new("Demo", "http://x/")
            .windows_icon(&b"garbage"[..])
            .unwrap()
            .build_bytes(OperatingSystem::Windows, &stub)
            .unwrap_err();
        assert!(matches!(err, PackError::Malformed(_)));
    }

    #[test]
    fn stub_without_key_placeholder_cannot_be_signed() {
        let mut image = pe_image(&[]);
        image[RDATA_KEY..RDATA_KEY + 32].fill(0);
        let stub = FixedStub::new(image);
        let err = ExecutableBuilder::new("Demo", "http://x/")
            .key(key())
            .build_bytes(OperatingSystem::Windows, &stub)
            .unwrap_err();
        assert!(matches!(err, PackError::PlaceholderNotFound(_)));
    }

    #[test]
    fn overlong_name_is_rejected_before_loading() {
        let stub = FixedStub::new(pe_image(&[]));
        let err = ExecutableBuilder::new("n".repeat(65), "http://x/")
            .build_bytes(OperatingSystem::Linux, &stub)
            .unwrap_err();
        assert!(matches!(err, PackError::Malformed(_)));
        assert!(stub.requested.borrow().is_empty());
    }

    #[test]
    fn key_bytes_validates_length() {
        let mut builder = ExecutableBuilder::new("Demo", "http://x/");
        assert!(matches!(builder.key_bytes(&[1; 31]), Err(PackError::InvalidKey(_))));
        builder.key_bytes(key().as_bytes()).unwrap();
        assert!(builder.is_signed());
    }

    #[test]
    fn build_writes_to_sink() {
        let stub = FixedStub::new(pe_image(&[]));
        let mut out = Vec::new();
        ExecutableBuilder::new("Demo", "http://x/")
            .build(OperatingSystem::Linux, &stub, &mut out)
            .unwrap();
        assert_eq!(out.len(), stub.image.len());
    }
}
