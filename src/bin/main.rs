//! This is the main entry point for the FATX inspection tool.
//!
//! The program provides an interactive command-line interface for analyzing FATX images.
//! Users can open an image, print its layout, browse its directories and extract files.
//! An image path and a volume offset may also be given as arguments.

use fatx_forensics::commands::{Command, parse_offset};
use fatx_forensics::traits::{LayoutDisplay, TreeDisplay};
use fatx_forensics::{DirEntry, FATXError, FATXVol};
use log::{error, warn};
use std::{
    env,
    fs::File,
    io::{self, Write},
    path::Path,
};

/// Represents the runtime state of the program.
///
/// This struct keeps track of the currently opened volume.
struct RunState {
    /// The currently opened FATX volume.
    vol: Option<FATXVol<File>>,
}

fn main() {
    stderrlog::new()
        .module(module_path!())
        .module("fatx_forensics")
        .verbosity(1usize)
        .init()
        .unwrap();

    let mut run_state = RunState { vol: None };

    let args: Vec<String> = env::args().collect();
    if let Some(path) = args.get(1) {
        let offset = match args.get(2).map(|s| parse_offset(s)) {
            Some(Some(offset)) => offset,
            Some(None) => {
                error!("The volume offset should be an unsigned integer.");
                return;
            }
            None => 0,
        };
        open_volume(&mut run_state, path, offset);
    }

    loop {
        print!("> ");
        io::stdout().flush().unwrap();

        let mut s = String::new();
        match io::stdin().read_line(&mut s) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                error!("Failed to read command: {err}");
                break;
            }
        }
        let cmd = Command::from_string(&s);

        match cmd {
            Command::Open(path, offset) => open_volume(&mut run_state, &path, offset),
            Command::Quit => break,
            Command::Print => match &run_state.vol {
                Some(vol) => {
                    println!("{}", vol.superblock());
                    match vol.display_layout(3) {
                        Ok(layout) => print!("{layout}"),
                        Err(e) => error!("Print layout error: {e}"),
                    }
                }
                None => warn!("Open an image first"),
            },
            Command::Ls(path) => {
                if let Some(vol) = run_state.vol.as_mut() {
                    list(vol, path.as_deref());
                } else {
                    warn!("Open an image first")
                }
            }
            Command::Tree => {
                if let Some(vol) = run_state.vol.as_mut() {
                    match vol.display_tree() {
                        Ok(tree) => print!("{tree}"),
                        Err(err) => error!("Tree printing failed: {err}"),
                    }
                } else {
                    warn!("Open an image first")
                }
            }
            Command::Cat(path) => {
                if let Some(vol) = run_state.vol.as_mut() {
                    match read(vol, &path) {
                        Ok(data) => println!("{}", String::from_utf8_lossy(&data)),
                        Err(err) => error!("{err}"),
                    }
                } else {
                    warn!("Open an image first")
                }
            }
            Command::Extract(path, dest) => {
                if let Some(vol) = run_state.vol.as_mut() {
                    extract(vol, &path, Path::new(&dest));
                } else {
                    warn!("Open an image first")
                }
            }
            Command::Unknown(s) => error!("Unknown command: {s:?}"),
            Command::Invalid(s) => error!("{s}"),
            Command::Empty => {}
        }
    }
}

fn open_volume(run_state: &mut RunState, path: &str, offset: u64) {
    match FATXVol::open(Path::new(path), offset) {
        Ok(vol) => {
            println!("FATX 0x{:08X} ~ {}", vol.superblock().volume_id(), vol.fat());
            run_state.vol = Some(vol);
        }
        Err(err) => error!("{err}"),
    }
}

fn list(vol: &mut FATXVol<File>, path: Option<&str>) {
    let entries = match path.filter(|p| !p.trim_matches('/').is_empty()) {
        None => vol.root_dir().map(Some),
        Some(path) => vol.find(path).and_then(|dir| vol.open_directory(&dir)),
    };

    match entries {
        Ok(Some(entries)) => entries.iter().for_each(print_entry),
        Ok(None) => error!("The directory is corrupted"),
        Err(err) => error!("{err}"),
    }
}

fn print_entry(entry: &DirEntry) {
    println!(
        "{:>10} {:<19} {}",
        entry.first_cluster(),
        entry.modified().to_string(),
        entry
    );
}

/// Reads a file, keeping what could be read if its chain is corrupted.
fn read(vol: &mut FATXVol<File>, path: &str) -> Result<Vec<u8>, FATXError> {
    let entry = vol.find(path)?;
    let contents = vol.read_file(&entry)?;
    if let Some(err) = contents.failure() {
        warn!(
            "Partial read of {path} ({} of {} bytes): {err}",
            contents.data().len(),
            entry.file_size()
        );
    }
    Ok(contents.into_data())
}

fn extract(vol: &mut FATXVol<File>, path: &str, dest: &Path) {
    let data = match read(vol, path) {
        Ok(data) => data,
        Err(err) => {
            error!("{err}");
            return;
        }
    };

    match File::create(dest).and_then(|mut f| f.write_all(&data)) {
        Ok(()) => println!("Extracted {} bytes to {}", data.len(), dest.display()),
        Err(err) => error!(
            "Can't write {}: {}",
            dest.to_str().unwrap_or("invalid_file_name"),
            err
        ),
    }
}
