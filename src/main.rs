//! Desktop viewer binary.
//!
//! ```text
//! modelview [MODEL] [OPTIONS.toml]
//! ```
//!
//! `MODEL` is a `.glb`/`.gltf` path or URL, or an `.obj` whose material
//! library sits next to it with the same stem. Without it the model named
//! in the options is shown.

use std::path::Path;

use modelview::loader::ModelSource;
use modelview::options::Options;
use modelview::{Viewer, ViewerError};

/// Build a model source from a command-line path.
fn source_from_arg(arg: &str) -> ModelSource {
    let lower = arg.to_ascii_lowercase();
    match lower.strip_suffix(".obj") {
        Some(_) => {
            let stem = &arg[..arg.len() - ".obj".len()];
            ModelSource::Obj {
                obj: arg.to_owned(),
                mtl: format!("{stem}.mtl"),
            }
        }
        None => ModelSource::Gltf {
            path: arg.to_owned(),
            decoder: None,
        },
    }
}

fn run() -> Result<(), ViewerError> {
    let mut args = std::env::args().skip(1);
    let model = args.next();
    let options = match args.next() {
        Some(path) => Options::load(Path::new(&path))?,
        None => Options::default(),
    };

    let mut builder = Viewer::builder().with_options(options);
    if let Some(model) = model {
        builder = builder.with_model(source_from_arg(&model));
    }
    builder.build().run()
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
