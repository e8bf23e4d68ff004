//! Windows resource section (`.rsrc`) encoding.
//!
//! A resource section is a three level tree (type, name, language) of
//! `IMAGE_RESOURCE_DIRECTORY` tables whose leaves point at data blobs by
//! RVA. The whole tree is laid out in one pass: every table first in
//! breadth-first order, then the data entries, then the blobs.

use crate::error::{PackError, Result};

/// `RT_ICON`
pub(crate) const RT_ICON: u32 = 3;
/// `RT_GROUP_ICON`
pub(crate) const RT_GROUP_ICON: u32 = 14;
/// `RT_VERSION`
pub(crate) const RT_VERSION: u32 = 16;
/// `RT_MANIFEST`
pub(crate) const RT_MANIFEST: u32 = 24;

/// Language id of icon, group icon and version resources.
pub(crate) const STUB_LANGUAGE: u32 = 2057;
/// Language id of the manifest resource (en-US).
pub(crate) const MANIFEST_LANGUAGE: u32 = 1033;

const CODE_PAGE: u32 = 1252;
const DIRECTORY_SIZE: usize = 16;
const ENTRY_SIZE: usize = 8;
const DATA_ENTRY_SIZE: usize = 16;
const SUBDIRECTORY_FLAG: u32 = 0x8000_0000;

#[derive(Debug, Clone)]
pub(crate) enum ResourceNode {
    Directory(ResourceDirectory),
    Data(Vec<u8>),
}

#[derive(Debug, Clone)]
struct ResourceEntry {
    id: u32,
    node: ResourceNode,
}

/// One resource directory table. Entries are kept sorted by id.
#[derive(Debug, Clone, Default)]
pub(crate) struct ResourceDirectory {
    entries: Vec<ResourceEntry>,
}

enum Child {
    Table(usize),
    Data(usize),
}

impl ResourceDirectory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Directory holding a single language leaf.
    pub(crate) fn leaf(language: u32, data: Vec<u8>) -> Self {
        let mut dir = Self::new();
        dir.insert(language, ResourceNode::Data(data));
        dir
    }

    /// Directory holding one named subdirectory.
    pub(crate) fn single(id: u32, child: ResourceDirectory) -> Self {
        let mut dir = Self::new();
        dir.insert(id, ResourceNode::Directory(child));
        dir
    }

    /// Insert or replace the entry for `id`.
    pub(crate) fn insert(&mut self, id: u32, node: ResourceNode) {
        match self.entries.binary_search_by_key(&id, |e| e.id) {
            Ok(pos) => self.entries[pos].node = node,
            Err(pos) => self.entries.insert(pos, ResourceEntry { id, node }),
        }
    }

    /// Ids of the entries in this table.
    #[cfg(test)]
    pub(crate) fn ids(&self) -> Vec<u32> {
        self.entries.iter().map(|e| e.id).collect()
    }

    /// Serialize the tree for a section loaded at `section_rva`.
    pub(crate) fn to_bytes(&self, section_rva: u32) -> Result<Vec<u8>> {
        // Breadth-first; a table's index is fixed when it is enqueued.
        let mut tables: Vec<&ResourceDirectory> = vec![self];
        let mut blobs: Vec<&[u8]> = Vec::new();
        let mut children: Vec<Vec<Child>> = Vec::new();

        let mut next = 0;
        while next < tables.len() {
            let table = tables[next];
            let mut refs = Vec::with_capacity(table.entries.len());
            for entry in &table.entries {
                match &entry.node {
                    ResourceNode::Directory(dir) => {
                        refs.push(Child::Table(tables.len()));
                        tables.push(dir);
                    }
                    ResourceNode::Data(data) => {
                        refs.push(Child::Data(blobs.len()));
                        blobs.push(data);
                    }
                }
            }
            children.push(refs);
            next += 1;
        }

        let mut offset = 0;
        let mut table_offsets = Vec::with_capacity(tables.len());
        for table in &tables {
            table_offsets.push(offset);
            offset += DIRECTORY_SIZE + ENTRY_SIZE * table.entries.len();
        }
        let data_entries = offset;
        offset += DATA_ENTRY_SIZE * blobs.len();
        let mut blob_offsets = Vec::with_capacity(blobs.len());
        for blob in &blobs {
            offset = offset.next_multiple_of(8);
            blob_offsets.push(offset);
            offset += blob.len();
        }

        let mut out = vec![0u8; offset];
        for ((table, refs), &base) in tables.iter().zip(&children).zip(&table_offsets) {
            // Characteristics and TimeDateStamp stay zero
            put_u16(&mut out, base + 8, 4);
            put_u16(&mut out, base + 12, 0);
            put_u16(&mut out, base + 14, to_u16(table.entries.len())?);

            for (i, (entry, child)) in table.entries.iter().zip(refs).enumerate() {
                let at = base + DIRECTORY_SIZE + i * ENTRY_SIZE;
                let target = match child {
                    Child::Table(k) => to_u32(table_offsets[*k])? | SUBDIRECTORY_FLAG,
                    Child::Data(k) => to_u32(data_entries + k * DATA_ENTRY_SIZE)?,
                };
                put_u32(&mut out, at, entry.id);
                put_u32(&mut out, at + 4, target);
            }
        }
        for (k, blob) in blobs.iter().enumerate() {
            let at = data_entries + k * DATA_ENTRY_SIZE;
            let rva = section_rva
                .checked_add(to_u32(blob_offsets[k])?)
                .ok_or_else(|| {
                    PackError::Malformed("resource section exceeds the address space".into())
                })?;
            put_u32(&mut out, at, rva);
            put_u32(&mut out, at + 4, to_u32(blob.len())?);
            put_u32(&mut out, at + 8, CODE_PAGE);
            out[blob_offsets[k]..blob_offsets[k] + blob.len()].copy_from_slice(blob);
        }
        Ok(out)
    }
}

pub(crate) fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| PackError::Malformed(format!("{value} does not fit in 32 bits")))
}

fn to_u16(value: usize) -> Result<u16> {
    u16::try_from(value)
        .map_err(|_| PackError::Malformed(format!("{value} does not fit in 16 bits")))
}

pub(crate) fn put_u16(buf: &mut [u8], at: usize, value: u16) {
    buf[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

pub(crate) fn put_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

pub(crate) fn get_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

pub(crate) fn get_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}
