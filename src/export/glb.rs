//! Binary glTF container and the embedded-buffer text form

use super::ExportError;
use base64::Engine;
use gltf::json;
use json::validation::USize64;

pub const GLB_MAGIC: u32 = 0x4654_6C67;
pub const GLB_VERSION: u32 = 2;
pub const CHUNK_JSON: u32 = 0x4E4F_534A;
pub const CHUNK_BIN: u32 = 0x004E_4942;

const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

fn pad_to_four(bytes: &mut Vec<u8>, fill: u8) {
    while bytes.len() % 4 != 0 {
        bytes.push(fill);
    }
}

/// Packs a serialized document and its binary buffer into a GLB file.
///
/// The JSON chunk is padded with spaces and the BIN chunk with zeros; the BIN chunk is omitted
/// when there is no binary payload.
pub fn assemble_glb(json: Vec<u8>, bin: Vec<u8>) -> Result<Vec<u8>, ExportError> {
    let mut json = json;
    pad_to_four(&mut json, b' ');
    let mut bin = bin;
    pad_to_four(&mut bin, 0);

    let mut total = HEADER_LEN + CHUNK_HEADER_LEN + json.len();
    if !bin.is_empty() {
        total += CHUNK_HEADER_LEN + bin.len();
    }
    let total_u32 = u32::try_from(total)
        .map_err(|_| ExportError::Encode(format!("GLB too large ({} bytes)", total)))?;

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&total_u32.to_le_bytes());

    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&json);

    if !bin.is_empty() {
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(&bin);
    }

    Ok(out)
}

fn attach_buffer(root: &mut json::Root, bin: &[u8], uri: Option<String>) {
    if bin.is_empty() {
        return;
    }
    root.buffers = vec![json::Buffer {
        byte_length: USize64::from(bin.len()),
        name: None,
        uri,
        extensions: Default::default(),
        extras: Default::default(),
    }];
}

/// GLB bytes: buffer 0 is the BIN chunk and has no URI
pub fn write_binary(mut root: json::Root, bin: Vec<u8>) -> Result<Vec<u8>, ExportError> {
    attach_buffer(&mut root, &bin, None);
    let json = json::serialize::to_vec(&root).map_err(|e| ExportError::Serialize(e.to_string()))?;
    assemble_glb(json, bin)
}

/// Self-contained `.gltf` text: buffer 0 is embedded as a base64 data URI
pub fn write_text(mut root: json::Root, bin: Vec<u8>) -> Result<Vec<u8>, ExportError> {
    let encoded = base64::engine::general_purpose::STANDARD.encode(&bin);
    attach_buffer(
        &mut root,
        &bin,
        Some(format!("data:application/octet-stream;base64,{}", encoded)),
    );
    json::serialize::to_vec_pretty(&root).map_err(|e| ExportError::Serialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_u32(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn test_glb_header_and_chunk_alignment() {
        let json = br#"{"asset":{"version":"2.0"}}"#.to_vec();
        let glb = assemble_glb(json.clone(), vec![1, 2, 3, 4, 5]).unwrap();

        assert_eq!(read_u32(&glb, 0), GLB_MAGIC);
        assert_eq!(&glb[0..4], b"glTF");
        assert_eq!(read_u32(&glb, 4), 2);
        assert_eq!(read_u32(&glb, 8) as usize, glb.len());

        let json_len = read_u32(&glb, 12) as usize;
        assert_eq!(json_len % 4, 0);
        assert_eq!(read_u32(&glb, 16), CHUNK_JSON);
        assert_eq!(&glb[20..20 + json.len()], json.as_slice());
        assert!(glb[20 + json.len()..20 + json_len].iter().all(|&b| b == b' '));

        let bin_header = 20 + json_len;
        assert_eq!(read_u32(&glb, bin_header), 8);
        assert_eq!(read_u32(&glb, bin_header + 4), CHUNK_BIN);
        assert_eq!(&glb[bin_header + 8..], &[1, 2, 3, 4, 5, 0, 0, 0]);
    }

    #[test]
    fn test_binary_document_references_bin_chunk() {
        let glb = write_binary(json::Root::default(), vec![0; 12]).unwrap();
        let json_len = read_u32(&glb, 12) as usize;
        let root = json::Root::from_slice(&glb[20..20 + json_len]).unwrap();

        assert_eq!(root.buffers.len(), 1);
        assert_eq!(root.buffers[0].byte_length, USize64(12));
        assert!(root.buffers[0].uri.is_none());

        let empty = write_text(json::Root::default(), Vec::new()).unwrap();
        assert!(json::Root::from_slice(&empty).unwrap().buffers.is_empty());
    }

    #[test]
    fn test_empty_bin_chunk_is_omitted() {
        let glb = assemble_glb(b"{}".to_vec(), Vec::new()).unwrap();
        assert_eq!(glb.len(), 12 + 8 + 4);
        assert_eq!(read_u32(&glb, 8), 24);
    }
}
