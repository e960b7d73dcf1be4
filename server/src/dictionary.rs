//! Canned word dictionaries, loaded once at process start and injected into
//! game construction as an immutable map. Nothing mutates them afterwards.

use log::{info, warn};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

pub type DictionaryMap = HashMap<String, Vec<String>>;

/// Loads every `<name>.txt` in `dir` as the dictionary `<name>`: one word
/// per line, surrounding whitespace trimmed, blank lines skipped. A missing
/// directory yields an empty map so the server can run without canned
/// dictionaries.
pub fn load_dir(dir: &Path) -> io::Result<DictionaryMap> {
    let mut dictionaries = DictionaryMap::new();
    if !dir.is_dir() {
        warn!(
            "dictionary directory {} not found; no canned dictionaries available",
            dir.display()
        );
        return Ok(dictionaries);
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let contents = fs::read_to_string(&path)?;
        let words: Vec<String> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        info!("loaded dictionary {} ({} words)", name, words.len());
        dictionaries.insert(name.to_string(), words);
    }
    Ok(dictionaries)
}
