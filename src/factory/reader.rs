//! Buffered data source reader
use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

#[cfg(feature = "flate2")]
use flate2::read::GzDecoder;

#[derive(Debug)]
pub enum BufferedReader {
    /// Readable file
    PlainFile(BufReader<File>),
    /// gzip compressed file
    #[cfg(feature = "flate2")]
    GzFile(BufReader<GzDecoder<File>>),
}

impl BufferedReader {
    /// Opens a data source. `.gz` files are inflated on the fly,
    /// which requires the flate2 feature.
    pub fn new(path: &Path) -> std::io::Result<Self> {
        let gzip = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("gz"))
            .unwrap_or(false);

        let f = File::open(path)?;

        if gzip {
            #[cfg(feature = "flate2")]
            {
                Ok(Self::GzFile(BufReader::new(GzDecoder::new(f))))
            }
            #[cfg(not(feature = "flate2"))]
            {
                drop(f);
                Err(std::io::Error::new(
                    std::io::ErrorKind::Unsupported,
                    "gzip compressed data requires the flate2 feature",
                ))
            }
        } else {
            Ok(Self::PlainFile(BufReader::new(f)))
        }
    }
}

impl Read for BufferedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::PlainFile(h) => h.read(buf),
            #[cfg(feature = "flate2")]
            Self::GzFile(h) => h.read(buf),
        }
    }
}

impl BufRead for BufferedReader {
    fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
        match self {
            Self::PlainFile(h) => h.fill_buf(),
            #[cfg(feature = "flate2")]
            Self::GzFile(h) => h.fill_buf(),
        }
    }
    fn consume(&mut self, s: usize) {
        match self {
            Self::PlainFile(h) => h.consume(s),
            #[cfg(feature = "flate2")]
            Self::GzFile(h) => h.consume(s),
        }
    }
}
