use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

/// Reads the whole file at `path`. Returns `None` if the file does not exist.
pub(super) fn read(path: &Path) -> io::Result<Option<Vec<u8>>> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };

    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;

    Ok(Some(buf))
}

/// Replaces the file at `path` with `buf`. The data is written to a sibling
/// file first and renamed over `path`, readers never see a partial file.
pub(super) fn write(path: &Path, buf: &[u8]) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");

    {
        let mut file = File::create(&tmp)?;
        file.write_all(buf)?;
        file.sync_all()?;
    }

    fs::rename(&tmp, path)
}
