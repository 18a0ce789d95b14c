//! Build script for firmware: bare-metal linker arguments for the hardware binary.

fn main() {
    // Linker scripts are only needed for the bare-metal target. memory.x is
    // emitted by embassy-stm32's `memory-x` feature.
    #[cfg(feature = "hardware")]
    {
        println!("cargo:rustc-link-arg-bins=--nmagic");
        println!("cargo:rustc-link-arg-bins=-Tlink.x");
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }

    println!("cargo:rerun-if-changed=build.rs");
}
