#![allow(dead_code)]

use assert_cmd::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Binary started inside `cwd`, so config lookup and log files stay in the temp dir.
pub fn bin_cmd(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("xlfsync").expect("xlfsync built");
    cmd.current_dir(cwd).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

pub fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
    let p = root.join(rel);
    if let Some(parent) = p.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&p, content).unwrap();
    p
}

/// `<trans-unit>` with an optional target carrying an optional state.
pub fn unit(id: &str, source: &str, target: Option<&str>, state: Option<&str>) -> String {
    let mut s = format!("<trans-unit id=\"{id}\"><source>{source}</source>");
    if let Some(t) = target {
        match state {
            Some(st) => s.push_str(&format!("<target state=\"{st}\">{t}</target>")),
            None => s.push_str(&format!("<target>{t}</target>")),
        }
    }
    s.push_str("</trans-unit>\n");
    s
}

pub fn xlf(target_language: &str, units: &[String]) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<xliff version=\"1.2\" xmlns=\"urn:oasis:names:tc:xliff:document:1.2\"><file datatype=\"xml\" source-language=\"en-US\" target-language=\"{target_language}\" original=\"App\"><body><group id=\"body\">\n{}</group></body></file></xliff>\n",
        units.concat()
    )
}

/// A translation folder with a generator and one Swedish target.
pub fn translation_folder(root: &Path) -> (PathBuf, PathBuf) {
    let g = write(
        root,
        "Translations/App.g.xlf",
        &xlf(
            "en-US",
            &[
                unit("A", "Cat", None, None),
                unit("B", "Dog", None, None),
                unit("C", "Total", None, None),
            ],
        ),
    );
    let t = write(
        root,
        "Translations/App.sv-SE.xlf",
        &xlf(
            "sv-SE",
            &[
                unit("D", "Gone", Some("Borta"), Some("translated")),
                unit("A", "Cat", Some("Katt"), Some("translated")),
            ],
        ),
    );
    (g, t)
}

pub fn stdout_of(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stdout).to_string()
}
