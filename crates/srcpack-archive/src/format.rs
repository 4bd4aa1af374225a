use std::fmt;
use std::io::{self, Read, Write};
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Container format, as selected by an archive's file name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveFormat {
    Cpio,
    Tar(Compression),
}

/// File name suffixes accepted by [`ArchiveFormat::from_path`].
const ARCHIVE_SUFFIXES: &[(&str, ArchiveFormat)] = &[
    (".tar.gz", ArchiveFormat::Tar(Compression::Gzip)),
    (".tar.zst", ArchiveFormat::Tar(Compression::Zstd)),
    (".tar", ArchiveFormat::Tar(Compression::None)),
    (".obscpio", ArchiveFormat::Cpio),
    (".cpio", ArchiveFormat::Cpio),
];

impl ArchiveFormat {
    /// Select the container format from the archive's file name without
    /// touching the filesystem.
    pub fn from_path(path: &Path) -> Result<Self> {
        let unsupported = || Error::UnsupportedFormat {
            path: path.to_path_buf(),
        };
        let name = path.file_name().ok_or_else(unsupported)?.to_string_lossy();

        ARCHIVE_SUFFIXES
            .iter()
            .find(|(suffix, _)| name.ends_with(suffix))
            .map(|(_, format)| *format)
            .ok_or_else(unsupported)
    }
}

/// Compression codec wrapped around a tar stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Zstd,
}

struct Codec {
    compression: Compression,
    names: &'static [&'static str],
    suffix: &'static str,
    archive_extension: &'static str,
    writable: bool,
}

const CODECS: &[Codec] = &[
    Codec {
        compression: Compression::None,
        names: &["none"],
        suffix: ".tar",
        archive_extension: ".tar",
        writable: true,
    },
    Codec {
        compression: Compression::Gzip,
        names: &["gzip", "gz"],
        suffix: ".gz",
        archive_extension: ".tar.gz",
        writable: true,
    },
    Codec {
        compression: Compression::Bzip2,
        names: &["bzip2", "bz2"],
        suffix: ".bz2",
        archive_extension: ".tar.bz2",
        writable: false,
    },
    Codec {
        compression: Compression::Zstd,
        names: &["zstd", "zst"],
        suffix: ".zst",
        archive_extension: ".tar.zst",
        writable: true,
    },
];

impl Compression {
    fn codec(self) -> &'static Codec {
        match self {
            Self::None => &CODECS[0],
            Self::Gzip => &CODECS[1],
            Self::Bzip2 => &CODECS[2],
            Self::Zstd => &CODECS[3],
        }
    }

    /// Select the codec from the last extension of `path` (`.tar`, `.gz`,
    /// `.bz2` or `.zst`).
    pub fn from_suffix(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        CODECS
            .iter()
            .find(|codec| codec.suffix == extension)
            .map(|codec| codec.compression)
            .ok_or_else(|| Error::UnsupportedFormat {
                path: path.to_path_buf(),
            })
    }

    /// Extension of an archive written with this codec, e.g. `.tar.zst`.
    pub fn archive_extension(self) -> &'static str {
        self.codec().archive_extension
    }

    pub fn is_writable(self) -> bool {
        self.codec().writable
    }

    pub fn name(self) -> &'static str {
        self.codec().names[0]
    }

    /// Wrap `reader` in the decompressor for this codec.
    ///
    /// Codecs that read a frame header up front report a bad header as
    /// [`Error::CodecInit`]; the others report it on the first read.
    pub fn decoder<R: Read>(self, reader: R) -> Result<Decoder<R>> {
        match self {
            Self::None => Ok(Decoder::Passthrough(reader)),
            Self::Gzip => Ok(Decoder::Gzip(Box::new(flate2::read::MultiGzDecoder::new(
                reader,
            )))),
            #[cfg(feature = "bzip2")]
            Self::Bzip2 => Ok(Decoder::Bzip2(Box::new(
                bzip2::read::MultiBzDecoder::new(reader),
            ))),
            #[cfg(not(feature = "bzip2"))]
            Self::Bzip2 => Err(Error::CodecDisabled(self)),
            #[cfg(feature = "zstd")]
            Self::Zstd => {
                let decoder = zstd::stream::read::Decoder::new(reader).map_err(|source| {
                    Error::CodecInit {
                        compression: self,
                        source,
                    }
                })?;
                Ok(Decoder::Zstd(Box::new(decoder)))
            }
            #[cfg(not(feature = "zstd"))]
            Self::Zstd => Err(Error::CodecDisabled(self)),
        }
    }

    /// Wrap `writer` in the compressor for this codec.
    ///
    /// Read-only codecs are rejected here, before anything is written.
    pub fn encoder<W: Write>(self, writer: W) -> Result<Encoder<W>> {
        if !self.is_writable() {
            return Err(Error::ReadOnlyCompression(self));
        }
        match self {
            Self::None => Ok(Encoder::Passthrough(writer)),
            Self::Gzip => Ok(Encoder::Gzip(flate2::write::GzEncoder::new(
                writer,
                flate2::Compression::default(),
            ))),
            #[cfg(feature = "zstd")]
            Self::Zstd => {
                let encoder = zstd::stream::write::Encoder::new(writer, 0).map_err(|source| {
                    Error::CodecInit {
                        compression: self,
                        source,
                    }
                })?;
                Ok(Encoder::Zstd(encoder))
            }
            #[cfg(not(feature = "zstd"))]
            Self::Zstd => Err(Error::CodecDisabled(self)),
            Self::Bzip2 => Err(Error::ReadOnlyCompression(self)),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Compression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        CODECS
            .iter()
            .find(|codec| codec.names.contains(&wanted.as_str()))
            .map(|codec| codec.compression)
            .ok_or_else(|| Error::UnknownCompression(s.to_string()))
    }
}

/// Decompressing reader over a tar stream.
pub enum Decoder<R: Read> {
    Passthrough(R),
    Gzip(Box<flate2::read::MultiGzDecoder<R>>),
    #[cfg(feature = "bzip2")]
    Bzip2(Box<bzip2::read::MultiBzDecoder<R>>),
    #[cfg(feature = "zstd")]
    Zstd(Box<zstd::stream::read::Decoder<'static, io::BufReader<R>>>),
}

impl<R: Read> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Passthrough(r) => r.read(buf),
            Self::Gzip(d) => d.read(buf),
            #[cfg(feature = "bzip2")]
            Self::Bzip2(d) => d.read(buf),
            #[cfg(feature = "zstd")]
            Self::Zstd(d) => d.read(buf),
        }
    }
}

/// Compressing writer for a tar stream.
///
/// Compressing variants must be [`finish`](Encoder::finish)ed after the tar
/// writer is done and before the underlying file is published.
pub enum Encoder<W: Write> {
    Passthrough(W),
    Gzip(flate2::write::GzEncoder<W>),
    #[cfg(feature = "zstd")]
    Zstd(zstd::stream::write::Encoder<'static, W>),
}

impl<W: Write> Encoder<W> {
    /// Whether [`finish`](Encoder::finish) writes anything.
    pub fn needs_finish(&self) -> bool {
        !matches!(self, Self::Passthrough(_))
    }

    /// Write the codec trailer and hand back the inner writer.
    pub fn finish(self) -> io::Result<W> {
        match self {
            Self::Passthrough(w) => Ok(w),
            Self::Gzip(e) => e.finish(),
            #[cfg(feature = "zstd")]
            Self::Zstd(e) => e.finish(),
        }
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Passthrough(w) => w.write(buf),
            Self::Gzip(e) => e.write(buf),
            #[cfg(feature = "zstd")]
            Self::Zstd(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Passthrough(w) => w.flush(),
            Self::Gzip(e) => e.flush(),
            #[cfg(feature = "zstd")]
            Self::Zstd(e) => e.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_compound_suffix() {
        let cases = [
            ("pkg.tar.gz", ArchiveFormat::Tar(Compression::Gzip)),
            ("pkg.tar.zst", ArchiveFormat::Tar(Compression::Zstd)),
            ("pkg.tar", ArchiveFormat::Tar(Compression::None)),
            ("dir/pkg-1.0.obscpio", ArchiveFormat::Cpio),
            ("pkg.cpio", ArchiveFormat::Cpio),
        ];
        for (name, expected) in cases {
            assert_eq!(ArchiveFormat::from_path(Path::new(name)).unwrap(), expected);
        }
    }

    #[test]
    fn format_rejects_unknown() {
        for name in ["pkg.zip", "pkg.tar.bz2", "pkg.gz", "pkg", "pkg.tar.xz"] {
            let err = ArchiveFormat::from_path(Path::new(name)).unwrap_err();
            assert!(matches!(err, Error::UnsupportedFormat { .. }), "{name}");
        }
    }

    #[test]
    fn compression_from_last_suffix() {
        assert_eq!(
            Compression::from_suffix(Path::new("a.tar.gz")).unwrap(),
            Compression::Gzip
        );
        assert_eq!(
            Compression::from_suffix(Path::new("a.tar.bz2")).unwrap(),
            Compression::Bzip2
        );
        assert_eq!(
            Compression::from_suffix(Path::new("a.zst")).unwrap(),
            Compression::Zstd
        );
        assert_eq!(
            Compression::from_suffix(Path::new("a.tar")).unwrap(),
            Compression::None
        );
        assert!(Compression::from_suffix(Path::new("a.xz")).is_err());
    }

    #[test]
    fn selector_parsing() {
        assert_eq!("gzip".parse::<Compression>().unwrap(), Compression::Gzip);
        assert_eq!("GZ".parse::<Compression>().unwrap(), Compression::Gzip);
        assert_eq!("zst".parse::<Compression>().unwrap(), Compression::Zstd);
        assert_eq!("none".parse::<Compression>().unwrap(), Compression::None);
        assert_eq!("bz2".parse::<Compression>().unwrap(), Compression::Bzip2);
        assert!(matches!(
            "lzma".parse::<Compression>(),
            Err(Error::UnknownCompression(s)) if s == "lzma"
        ));
    }

    #[test]
    fn archive_extensions() {
        assert_eq!(Compression::None.archive_extension(), ".tar");
        assert_eq!(Compression::Gzip.archive_extension(), ".tar.gz");
        assert_eq!(Compression::Zstd.archive_extension(), ".tar.zst");
        assert!(!Compression::Bzip2.is_writable());
    }

    #[test]
    fn bzip2_encoder_rejected() {
        let err = Compression::Bzip2.encoder(Vec::new()).err().unwrap();
        assert!(matches!(err, Error::ReadOnlyCompression(Compression::Bzip2)));
    }

    #[test]
    fn gzip_encoder_decoder_pair() {
        let mut encoder = Compression::Gzip.encoder(Vec::new()).unwrap();
        assert!(encoder.needs_finish());
        encoder.write_all(b"hello codec").unwrap();
        let bytes = encoder.finish().unwrap();

        let mut out = String::new();
        Compression::Gzip
            .decoder(bytes.as_slice())
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "hello codec");
    }

    #[test]
    fn passthrough_needs_no_finish() {
        let encoder = Compression::None.encoder(Vec::new()).unwrap();
        assert!(!encoder.needs_finish());
    }
}
