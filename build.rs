use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from("src/api/generated");
    // Ensure directory exists
    std::fs::create_dir_all(&out_dir).unwrap();

    tonic_prost_build::configure()
        .out_dir(&out_dir)
        .compile_protos(&["proto/gnmi.proto", "proto/gnmi_ext.proto"], &["proto"])
        .unwrap();

    // Add SPDX header to generated files
    for name in ["gnmi.rs", "gnmi_ext.rs"] {
        let generated_file = out_dir.join(name);
        if generated_file.exists() {
            let content = std::fs::read_to_string(&generated_file).unwrap();
            if !content.starts_with("// SPDX") {
                let new_content = format!(
                    "// SPDX-License-Identifier: MIT OR Apache-2.0\n// DO NOT EDIT\n{}",
                    content
                );
                std::fs::write(generated_file, new_content).unwrap();
            }
        }
    }

    // Rerun if proto changes
    println!("cargo:rerun-if-changed=proto/gnmi.proto");
    println!("cargo:rerun-if-changed=proto/gnmi_ext.proto");
}
