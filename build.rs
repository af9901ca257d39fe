fn main() {
    // Rebuild if the embedded shader changes
    println!("cargo:rerun-if-changed=shaders/voxel_debug.wgsl");
}
