//! Minimal sfnt writer for the CLI tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct TestDir {
    pub path: PathBuf,
}

impl TestDir {
    pub fn new(tag: &str) -> Self {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        let path = std::env::temp_dir().join(format!(
            "cmap_dump_cli_{tag}_{}_{}",
            std::process::id(),
            ts
        ));
        fs::create_dir_all(&path).expect("create temp test dir");
        Self { path }
    }

    pub fn write(&self, name: &str, data: &[u8]) -> PathBuf {
        let path = self.path.join(name);
        fs::write(&path, data).expect("write test font");
        path
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

pub fn run_cmap_dump(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cmap-dump"))
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("run cmap-dump")
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// A TrueType font holding the given tables, unpadded
pub fn font(tables: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
    let mut out = Vec::new();
    push_u32(&mut out, 0x0001_0000);
    push_u16(&mut out, tables.len() as u16);
    out.extend_from_slice(&[0; 6]);

    let mut offset = 12 + 16 * tables.len();
    for (tag, data) in tables {
        out.extend_from_slice(*tag);
        push_u32(&mut out, 0);
        push_u32(&mut out, offset as u32);
        push_u32(&mut out, data.len() as u32);
        offset += data.len();
    }
    for (_, data) in tables {
        out.extend_from_slice(data);
    }
    out
}

/// A cmap table with every subtable on platform 3
pub fn cmap(subtables: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    push_u16(&mut out, 0);
    push_u16(&mut out, subtables.len() as u16);

    let mut offset = 4 + 8 * subtables.len();
    for subtable in subtables {
        push_u16(&mut out, 3);
        push_u16(&mut out, 1);
        push_u32(&mut out, offset as u32);
        offset += subtable.len();
    }
    for subtable in subtables {
        out.extend_from_slice(subtable);
    }
    out
}

/// Format 4 with a single-codepoint segment per entry plus the sentinel
pub fn format4(codepoints: &[u16]) -> Vec<u8> {
    let seg_count = codepoints.len() + 1;
    let mut out = Vec::new();
    push_u16(&mut out, 4);
    push_u16(&mut out, (16 + 8 * seg_count) as u16);
    push_u16(&mut out, 0);
    push_u16(&mut out, (seg_count * 2) as u16);
    out.extend_from_slice(&[0; 6]);
    for &cp in codepoints.iter().chain([0xFFFF].iter()) {
        push_u16(&mut out, cp); // endCode
    }
    push_u16(&mut out, 0);
    for &cp in codepoints.iter().chain([0xFFFF].iter()) {
        push_u16(&mut out, cp); // startCode
    }
    for _ in 0..seg_count {
        push_u16(&mut out, 1); // idDelta
    }
    for _ in 0..seg_count {
        push_u16(&mut out, 0); // idRangeOffset
    }
    out
}

/// Format 6 covering `count` codepoints from `first_code`
pub fn format6(first_code: u16, count: u16) -> Vec<u8> {
    let mut out = Vec::new();
    push_u16(&mut out, 6);
    push_u16(&mut out, 10 + 2 * count);
    push_u16(&mut out, 0);
    push_u16(&mut out, first_code);
    push_u16(&mut out, count);
    for glyph in 1..=count {
        push_u16(&mut out, glyph);
    }
    out
}

/// Format 12 with one single-codepoint group per entry
pub fn format12(codepoints: &[u32]) -> Vec<u8> {
    let mut out = Vec::new();
    push_u16(&mut out, 12);
    push_u16(&mut out, 0);
    push_u32(&mut out, (16 + 12 * codepoints.len()) as u32);
    push_u32(&mut out, 0);
    push_u32(&mut out, codepoints.len() as u32);
    for (glyph, &cp) in (1u32..).zip(codepoints) {
        push_u32(&mut out, cp);
        push_u32(&mut out, cp);
        push_u32(&mut out, glyph);
    }
    out
}
