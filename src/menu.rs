//! Interactive menu loop
//!
//! Drives the encrypt/decrypt/read/fixture commands over injectable input
//! and output handles, so the whole session can be exercised in tests with
//! in-memory buffers. Command failures are printed and the session
//! continues; only I/O failures on the handles themselves end the loop.

use crate::error::{ErrorCategory, ErrorKind, Result, TextcryptError};
use crate::file_ops;
use crate::keymat::KeyMaterial;
use crate::listing::{self, FsDirectoryLister};
use rand::Rng;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Number of fixture files the "create test files" command writes.
const TEST_FILE_COUNT: usize = 4;

const MENU: &str = "\
Choose an option:

  1. Encrypt a file
  2. Decrypt a file
  3. Read a file
  4. Create test files
  5. Exit
";

/// One interactive session: a working directory, the candidate-file
/// extension, and the process-wide key material.
pub struct Session<'k> {
    dir: PathBuf,
    extension: String,
    keys: &'k KeyMaterial,
}

impl<'k> Session<'k> {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>, keys: &'k KeyMaterial) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
            keys,
        }
    }

    /// Run the menu loop until the user exits or the input reaches EOF.
    pub fn run(&self, input: &mut impl BufRead, output: &mut impl Write) -> Result<()> {
        writeln!(
            output,
            "The encryption key lives only in this process: decrypt anything you \
             need back before exiting."
        )
        .map_err(io_error)?;

        loop {
            writeln!(output, "\n{}", MENU).map_err(io_error)?;
            write!(output, "Enter your choice: ").map_err(io_error)?;
            output.flush().map_err(io_error)?;

            let Some(line) = read_line(input)? else {
                break;
            };

            let result = match line.trim() {
                "1" => self.encrypt_command(input, output),
                "2" => self.decrypt_command(input, output),
                "3" => self.read_command(input, output),
                "4" => self.create_fixtures_command(output),
                "5" => {
                    writeln!(output, "Goodbye.").map_err(io_error)?;
                    break;
                }
                _ => {
                    writeln!(output, "Invalid input. Please enter a valid option.")
                        .map_err(io_error)?;
                    continue;
                }
            };

            // A failed command never ends the session; later commands and
            // other files are unaffected.
            if let Err(e) = result {
                writeln!(output, "Error: {}", render_chain(&e)).map_err(io_error)?;
            }
        }

        Ok(())
    }

    fn encrypt_command(&self, input: &mut impl BufRead, output: &mut impl Write) -> Result<()> {
        writeln!(output, "Which file do you want to encrypt?").map_err(io_error)?;
        let Some(path) = self.choose_file(input, output)? else {
            return Ok(());
        };
        file_ops::encrypt_file(&path, self.keys)?;
        writeln!(output, "File {} encrypted successfully.", path.display()).map_err(io_error)
    }

    fn decrypt_command(&self, input: &mut impl BufRead, output: &mut impl Write) -> Result<()> {
        writeln!(output, "Which file do you want to decrypt?").map_err(io_error)?;
        let Some(path) = self.choose_file(input, output)? else {
            return Ok(());
        };
        file_ops::decrypt_file(&path, self.keys)?;
        writeln!(output, "File {} decrypted successfully.", path.display()).map_err(io_error)
    }

    fn read_command(&self, input: &mut impl BufRead, output: &mut impl Write) -> Result<()> {
        writeln!(output, "Which file do you want to read?").map_err(io_error)?;
        let Some(path) = self.choose_file(input, output)? else {
            return Ok(());
        };
        let content = file_ops::read_file_contents(&path)?;
        writeln!(output, "{}", String::from_utf8_lossy(&content)).map_err(io_error)
    }

    fn create_fixtures_command(&self, output: &mut impl Write) -> Result<()> {
        create_test_files(&self.dir)?;
        writeln!(output, "Test files created.").map_err(io_error)
    }

    /// List candidates and let the user pick one by number.
    ///
    /// Returns `None` (after printing why) when there is nothing to pick or
    /// the selection is invalid; the caller goes back to the menu.
    fn choose_file(
        &self,
        input: &mut impl BufRead,
        output: &mut impl Write,
    ) -> Result<Option<PathBuf>> {
        let files = listing::list_candidates(&FsDirectoryLister, &self.dir, &self.extension)?;
        if files.is_empty() {
            writeln!(
                output,
                "No .{} files found in {}.",
                self.extension,
                self.dir.display()
            )
            .map_err(io_error)?;
            return Ok(None);
        }

        for (i, name) in files.iter().enumerate() {
            writeln!(output, "{}. {}", i + 1, name).map_err(io_error)?;
        }
        write!(output, "Enter the number of your choice: ").map_err(io_error)?;
        output.flush().map_err(io_error)?;

        let Some(line) = read_line(input)? else {
            return Ok(None);
        };
        match line.trim().parse::<usize>() {
            Ok(n) if (1..=files.len()).contains(&n) => Ok(Some(self.dir.join(&files[n - 1]))),
            _ => {
                writeln!(output, "Invalid choice.").map_err(io_error)?;
                Ok(None)
            }
        }
    }
}

/// Write the fixture files `test01.txt` .. `test04.txt` into `dir`, each
/// containing one line with a random number.
///
/// Returns the created filenames. The numbers only exist to make the files
/// distinguishable, so the non-cryptographic thread RNG is fine here.
pub fn create_test_files(dir: &Path) -> Result<Vec<String>> {
    let mut rng = rand::rng();
    let mut names = Vec::with_capacity(TEST_FILE_COUNT);
    for i in 1..=TEST_FILE_COUNT {
        let name = format!("test{:02}.txt", i);
        let content = format!("Random number: {}\n", rng.random_range(1..=100));
        fs::write(dir.join(&name), content).map_err(|e| {
            TextcryptError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Write,
                format!("failed to write test file {}", name),
                e,
            )
        })?;
        names.push(name);
    }
    Ok(names)
}

/// Render an error with its full source chain on one line.
fn render_chain(err: &TextcryptError) -> String {
    use std::error::Error;

    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(s) = source {
        msg.push_str(": ");
        msg.push_str(&s.to_string());
        source = s.source();
    }
    msg
}

fn read_line(input: &mut impl BufRead) -> Result<Option<String>> {
    let mut line = String::new();
    let n = input.read_line(&mut line).map_err(io_error)?;
    if n == 0 { Ok(None) } else { Ok(Some(line)) }
}

fn io_error(err: io::Error) -> TextcryptError {
    TextcryptError::with_kind_and_source(
        ErrorCategory::Internal,
        ErrorKind::Io,
        "terminal I/O failed",
        err,
    )
}
