//! `VS_VERSIONINFO` resource.
//!
//! Every node is `wLength`, `wValueLength`, `wType`, a null terminated
//! UTF-16 key, padding to 32 bits, the value, padding, then children.
//! `wValueLength` counts UTF-16 words for text values and bytes for
//! binary ones.

const FIXED_FILE_INFO_SIGNATURE: u32 = 0xFEEF_04BD;
const FIXED_FILE_INFO_STRUC_VERSION: u32 = 1 << 16;
const VS_FFI_FILEFLAGSMASK: u32 = 0x1F;
const VOS_NT_WINDOWS32: u32 = 0x0004_0004;
const VFT_APP: u32 = 1;

const STRING_TABLE_KEY: &str = "000004b0";
const TRANSLATION_UNICODE: u32 = 1200 << 16;

#[derive(Debug)]
enum Value {
    None,
    Text(String),
    Binary(Vec<u8>),
}

#[derive(Debug)]
struct Node {
    key: String,
    value: Value,
    children: Vec<Node>,
}

impl Node {
    fn new(key: &str, value: Value) -> Self {
        Self { key: key.to_string(), value, children: Vec::new() }
    }

    fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    fn to_bytes(&self) -> Vec<u8> {
        let (value_length, kind, value): (u16, u16, Vec<u8>) = match &self.value {
            Value::None => (0, 1, Vec::new()),
            Value::Text(text) => {
                let words = utf16z(text);
                ((words.len() / 2) as u16, 1, words)
            }
            Value::Binary(bytes) => (bytes.len() as u16, 0, bytes.clone()),
        };

        let mut out = Vec::new();
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&value_length.to_le_bytes());
        out.extend_from_slice(&kind.to_le_bytes());
        out.extend_from_slice(&utf16z(&self.key));
        if !value.is_empty() {
            pad32(&mut out);
            out.extend_from_slice(&value);
        }
        for child in &self.children {
            pad32(&mut out);
            out.extend_from_slice(&child.to_bytes());
        }

        let length = out.len() as u16;
        out[..2].copy_from_slice(&length.to_le_bytes());
        out
    }
}

fn utf16z(text: &str) -> Vec<u8> {
    text.encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(u16::to_le_bytes)
        .collect()
}

fn pad32(out: &mut Vec<u8>) {
    out.resize(out.len().next_multiple_of(4), 0);
}

fn fixed_file_info(major: u16, minor: u16) -> Vec<u8> {
    let version_ms = (u32::from(major) << 16) | u32::from(minor);
    [
        FIXED_FILE_INFO_SIGNATURE,
        FIXED_FILE_INFO_STRUC_VERSION,
        version_ms, // FileVersionMS
        0,          // FileVersionLS
        version_ms, // ProductVersionMS
        0,          // ProductVersionLS
        VS_FFI_FILEFLAGSMASK,
        0, // FileFlags
        VOS_NT_WINDOWS32,
        VFT_APP,
        0, // FileSubtype
        0, // FileDateMS
        0, // FileDateLS
    ]
    .iter()
    .flat_map(|v| v.to_le_bytes())
    .collect()
}

/// Encoded version resource naming `product_name` at version
/// `major.minor.0`.
pub(crate) fn version_info(product_name: &str, major: u16, minor: u16) -> Vec<u8> {
    let version = format!("{major}.{minor}.0");

    let strings = Node::new("StringFileInfo", Value::None).with_children(vec![
        Node::new(STRING_TABLE_KEY, Value::None).with_children(vec![
            Node::new("ProductVersion", Value::Text(version.clone())),
            Node::new("ProductName", Value::Text(product_name.to_string())),
            Node::new("FileVersion", Value::Text(version)),
        ]),
    ]);
    let vars = Node::new("VarFileInfo", Value::None).with_children(vec![Node::new(
        "Translation",
        Value::Binary(TRANSLATION_UNICODE.to_le_bytes().to_vec()),
    )]);

    Node::new("VS_VERSION_INFO", Value::Binary(fixed_file_info(major, minor)))
        .with_children(vec![strings, vars])
        .to_bytes()
}
