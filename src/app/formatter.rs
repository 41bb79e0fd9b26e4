use std::collections::HashSet;
use std::path::PathBuf;

use plugload::FileDescriptor;

pub struct OutputGenerator;

impl OutputGenerator {
    /// Flat list of root-relative paths, one per line, in traversal order.
    pub fn generate_list(files: &[FileDescriptor]) -> String {
        let lines: Vec<String> = files
            .iter()
            .map(|file| file.relative_path().to_string_lossy().replace('\\', "/"))
            .collect();
        lines.join("\n")
    }

    /// Indented tree view. Directories are printed the first time a file
    /// inside them appears, so the shape follows traversal order.
    pub fn generate_tree(files: &[FileDescriptor]) -> String {
        let mut output = String::new();
        let mut printed_dirs: HashSet<PathBuf> = HashSet::new();

        for file in files {
            let relative = file.relative_path();
            let components: Vec<_> = relative.components().collect();

            let mut current = PathBuf::new();
            for (i, component) in components.iter().enumerate().take(components.len().saturating_sub(1)) {
                current.push(component);
                if printed_dirs.insert(current.clone()) {
                    let indent = "    ".repeat(i);
                    output.push_str(&format!(
                        "{}{}/\n",
                        indent,
                        component.as_os_str().to_string_lossy()
                    ));
                }
            }

            if let Some(name) = relative.file_name() {
                let indent = "    ".repeat(components.len().saturating_sub(1));
                output.push_str(&format!("{}{}\n", indent, name.to_string_lossy()));
            }
        }

        output.trim_end().to_string()
    }
}
