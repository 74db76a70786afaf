//! Textcrypt CLI - interactive in-place file encryption
//!
//! Generates fresh key material at startup, then drives the interactive
//! menu on stdin/stdout. The key and IV exist only for this process run.

use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process;

use textcrypt::keymat::KeyMaterial;
use textcrypt::menu::Session;

#[derive(Parser)]
#[command(name = "textcrypt")]
#[command(version)]
#[command(about = "Interactive in-place file encryption.", long_about = None)]
struct Cli {
    /// Directory to look for candidate files in
    #[arg(long, value_name = "DIR", default_value = ".")]
    dir: PathBuf,

    /// File extension (without the dot) of candidate files
    #[arg(long, value_name = "EXT", default_value = "txt")]
    extension: String,
}

fn main() {
    let cli = Cli::parse();

    // No key material means no safe operation; give up immediately.
    let keys = match KeyMaterial::generate() {
        Ok(keys) => keys,
        Err(e) => {
            eprintln!("Error: {}", e.message());
            process::exit(1);
        }
    };

    let session = Session::new(cli.dir, cli.extension, &keys);
    let mut input = io::stdin().lock();
    let mut output = io::stdout().lock();
    if let Err(e) = session.run(&mut input, &mut output) {
        eprintln!("Error: {}", e.message());
        process::exit(1);
    }
}
