fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = std::path::PathBuf::from(std::env::var("OUT_DIR")?);
    tonic_build::configure()
        .file_descriptor_set_path(out_dir.join("statefun_descriptor.bin"))
        .build_server(true)
        .build_client(false)
        .compile_protos(&["proto/entity.proto"], &["proto"])?;
    Ok(())
}
