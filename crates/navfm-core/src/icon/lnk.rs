//! Parser for shell shortcut (`.lnk`) files.
//!
//! Only the parts needed for icon resolution are decoded: the link target
//! (from LinkInfo, the environment-variable block, or the relative path),
//! the working directory, and the icon location. Everything else is skipped
//! by size.

use crate::host::ShortcutInfo;

const HEADER_SIZE: u32 = 0x4C;
const LINK_CLSID: [u8; 16] = [
    0x01, 0x14, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46,
];

const HAS_LINK_TARGET_ID_LIST: u32 = 1 << 0;
const HAS_LINK_INFO: u32 = 1 << 1;
const HAS_NAME: u32 = 1 << 2;
const HAS_RELATIVE_PATH: u32 = 1 << 3;
const HAS_WORKING_DIR: u32 = 1 << 4;
const HAS_ARGUMENTS: u32 = 1 << 5;
const HAS_ICON_LOCATION: u32 = 1 << 6;
const IS_UNICODE: u32 = 1 << 7;

const VOLUME_ID_AND_LOCAL_BASE_PATH: u32 = 1 << 0;
const COMMON_NETWORK_RELATIVE_LINK: u32 = 1 << 1;

const ENVIRONMENT_BLOCK: u32 = 0xA000_0001;
const ICON_ENVIRONMENT_BLOCK: u32 = 0xA000_0007;
const ENV_BLOCK_SIZE: usize = 0x314;

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], String> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| format!("truncated at offset {}", self.pos))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u16(&mut self) -> Result<u16, String> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, String> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads a StringData item: a character count followed by the characters.
    fn counted_string(&mut self, unicode: bool) -> Result<String, String> {
        let count = self.u16()? as usize;
        if unicode {
            Ok(utf16_until_nul(self.take(count * 2)?))
        } else {
            Ok(ansi_until_nul(self.take(count)?))
        }
    }
}

fn read_u32_at(data: &[u8], offset: usize) -> Option<u32> {
    let b = data.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn ansi_until_nul(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

fn utf16_until_nul(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .take_while(|u| *u != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

fn ansi_at(data: &[u8], offset: usize) -> Option<String> {
    data.get(offset..).map(ansi_until_nul)
}

fn utf16_at(data: &[u8], offset: usize) -> Option<String> {
    data.get(offset..).map(utf16_until_nul)
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Extracts the target path recorded in a LinkInfo structure.
fn link_info_target(info: &[u8]) -> Option<String> {
    let header_size = read_u32_at(info, 4)? as usize;
    let flags = read_u32_at(info, 8)?;
    let local_base_offset = read_u32_at(info, 16)? as usize;
    let network_offset = read_u32_at(info, 20)? as usize;
    let suffix_offset = read_u32_at(info, 24)? as usize;
    let unicode_offsets = if header_size >= 0x24 {
        Some((read_u32_at(info, 28)? as usize, read_u32_at(info, 32)? as usize))
    } else {
        None
    };

    let suffix = match unicode_offsets {
        Some((_, offset)) if offset != 0 => utf16_at(info, offset),
        _ => ansi_at(info, suffix_offset),
    }
    .unwrap_or_default();

    let base = if flags & VOLUME_ID_AND_LOCAL_BASE_PATH != 0 {
        match unicode_offsets {
            Some((offset, _)) if offset != 0 => utf16_at(info, offset),
            _ => ansi_at(info, local_base_offset),
        }
    } else if flags & COMMON_NETWORK_RELATIVE_LINK != 0 {
        let net = info.get(network_offset..)?;
        let net_name_offset = read_u32_at(net, 8)? as usize;
        ansi_at(net, net_name_offset)
    } else {
        None
    }?;

    if suffix.is_empty() {
        non_empty(base)
    } else if base.ends_with('\\') {
        Some(format!("{base}{suffix}"))
    } else {
        Some(format!("{base}\\{suffix}"))
    }
}

/// Reads the Unicode (falling back to ANSI) target of an environment block.
fn env_block_target(block: &[u8]) -> Option<String> {
    let ansi = block.get(8..8 + 260).map(ansi_until_nul);
    let unicode = block.get(8 + 260..8 + 260 + 520).map(utf16_until_nul);
    unicode.and_then(non_empty).or_else(|| ansi.and_then(non_empty))
}

/// Parses the bytes of a `.lnk` file.
///
/// # Errors
///
/// Returns a description when the header is not a shell link header or the
/// data ends before a declared structure does.
pub fn parse(data: &[u8]) -> Result<ShortcutInfo, String> {
    let mut reader = Reader::new(data);
    if reader.u32()? != HEADER_SIZE {
        return Err("not a shell link: bad header size".to_string());
    }
    if reader.take(16)? != LINK_CLSID {
        return Err("not a shell link: bad class id".to_string());
    }
    let flags = reader.u32()?;
    reader.take(HEADER_SIZE as usize - 24)?;

    if flags & HAS_LINK_TARGET_ID_LIST != 0 {
        let len = reader.u16()? as usize;
        reader.take(len)?;
    }

    let mut target = None;
    if flags & HAS_LINK_INFO != 0 {
        let start = reader.pos;
        let size = read_u32_at(data, start).ok_or("truncated link info")? as usize;
        let info = reader.take(size)?;
        target = link_info_target(info);
    }

    let unicode = flags & IS_UNICODE != 0;
    let mut relative_path = None;
    let mut working_directory = None;
    let mut icon_location = None;
    if flags & HAS_NAME != 0 {
        reader.counted_string(unicode)?;
    }
    if flags & HAS_RELATIVE_PATH != 0 {
        relative_path = non_empty(reader.counted_string(unicode)?);
    }
    if flags & HAS_WORKING_DIR != 0 {
        working_directory = non_empty(reader.counted_string(unicode)?);
    }
    if flags & HAS_ARGUMENTS != 0 {
        reader.counted_string(unicode)?;
    }
    if flags & HAS_ICON_LOCATION != 0 {
        icon_location = non_empty(reader.counted_string(unicode)?);
    }

    // Extra data blocks are optional; a malformed tail keeps what was read.
    let mut env_target = None;
    let mut env_icon = None;
    let tail = &data[reader.pos..];
    let mut offset = 0usize;
    while let Some(size) = read_u32_at(tail, offset) {
        let size = size as usize;
        if size < 8 {
            break;
        }
        let Some(block) = tail.get(offset..offset + size) else {
            break;
        };
        match read_u32_at(block, 4) {
            Some(ENVIRONMENT_BLOCK) if size >= ENV_BLOCK_SIZE => {
                env_target = env_block_target(block);
            }
            Some(ICON_ENVIRONMENT_BLOCK) if size >= ENV_BLOCK_SIZE => {
                env_icon = env_block_target(block);
            }
            _ => {}
        }
        offset += size;
    }

    Ok(ShortcutInfo {
        target: target.or(env_target).or(relative_path),
        icon_location: env_icon.or(icon_location),
        working_directory,
    })
}
