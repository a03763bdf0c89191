fn main() {
    // LAPACK symbols come from the platform: the Accelerate framework
    // on macOS, the system OpenBLAS elsewhere (no extra flags needed)
    #[cfg(target_os = "macos")]
    println!("cargo:rustc-link-lib=framework=Accelerate");
}
