use std::path::Path;

use dotfield::Viewer;

fn main() {
    env_logger::init();

    // An optional path argument views a single image instead of the
    // built-in page set.
    let viewer = match std::env::args().nth(1) {
        Some(path) => {
            let path = Path::new(&path);
            let label = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            Viewer::new().with_pages([label]).with_images_dir(dir)
        }
        None => Viewer::new()
            .with_pages(["0001", "0002", "0003", "0004", "0005", "0006"])
            .with_images_dir("images"),
    };

    if let Err(e) = viewer.with_title("dotfield").run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
