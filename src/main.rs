//! # Octacubic Entry Point
//!
//! Calls into the library's `run()` to stream and draw the world headlessly.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info OCTACUBIC_CONFIG=octacubic.json cargo run --release
//! ```

fn main() {
    octacubic::run();
}
