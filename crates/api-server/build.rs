fn main() {
    // Re-embed the page when its files change
    println!("cargo:rerun-if-changed=../../frontend/");
}
