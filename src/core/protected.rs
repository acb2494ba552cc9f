use std::path::Path;

pub const PROTECTED_FILES: [&str; 3] = ["pagefile.sys", "hiberfil.sys", "swapfile.sys"];

pub fn is_protected_name(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    PROTECTED_FILES.iter().any(|p| *p == name)
}

pub fn is_protected_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(is_protected_name)
}
