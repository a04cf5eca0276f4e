use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use jackc::{compile, CompileError};

fn main() {
    let path = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => {
            eprintln!("Usage: jackc <file.jack | directory>");
            process::exit(64);
        }
    };

    let ok = if path.is_dir() {
        run_dir(&path)
    } else {
        run_file(&path)
    };
    if !ok {
        process::exit(1);
    }
}

fn run_file(path: &Path) -> bool {
    match read_and_compile(path) {
        Ok(code) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            if let Err(e) = handle.write_all(code.as_bytes()) {
                report(path, &CompileError::Io(e));
                return false;
            }
            true
        }
        Err(e) => {
            report(path, &e);
            false
        }
    }
}

/// Compiles every class of the directory, carrying on past failed ones.
fn run_dir(dir: &Path) -> bool {
    let mut sources = match jack_files(dir) {
        Ok(sources) => sources,
        Err(e) => {
            report(dir, &CompileError::Io(e));
            return false;
        }
    };
    sources.sort();

    let mut ok = true;
    for source in sources {
        let result = read_and_compile(&source)
            .and_then(|code| fs::write(source.with_extension("vm"), code).map_err(CompileError::from));
        if let Err(e) = result {
            report(&source, &e);
            ok = false;
        }
    }
    ok
}

fn jack_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map_or(false, |ext| ext == "jack") {
            files.push(path);
        }
    }
    Ok(files)
}

fn read_and_compile(path: &Path) -> Result<String, CompileError> {
    let source = fs::read_to_string(path)?;
    compile(&source)
}

fn report(path: &Path, error: &CompileError) {
    eprintln!("{}: {}", path.display(), error);
}
