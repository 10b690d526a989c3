pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Read typed input from `--input` if given, otherwise from piped stdin.
pub fn read_input<T: DeserializeOwned>(
    path: Option<&str>,
    command: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return file::read_structured(path);
    }
    match stdin::read_stdin()? {
        Some(parsed) => Ok(parsed),
        None => Err(format!("--input <file.json|file.yaml> or stdin required for {command}").into()),
    }
}
