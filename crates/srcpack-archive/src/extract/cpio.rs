use std::io::{self, Read};
use std::path::{Path, PathBuf};

use srcpack_fs::FileTime;

use super::MemberSource;
use crate::entry::{ArchiveMember, MemberKind};
use crate::error::{Error, Result};

const HEADER_LEN: usize = 110;
const MAGIC_NEWC: &[u8; 6] = b"070701";
const MAGIC_CRC: &[u8; 6] = b"070702";
const TRAILER: &str = "TRAILER!!!";
/// PATH_MAX, terminating NUL included.
const MAX_NAME_SIZE: u32 = 4096;

const S_IFMT: u32 = 0o170000;
const S_IFDIR: u32 = 0o040000;
const S_IFREG: u32 = 0o100000;
const S_IFLNK: u32 = 0o120000;

/// Header of one newc record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CpioHeader {
    pub name: String,
    pub ino: u32,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub nlink: u32,
    pub mtime: u32,
    pub file_size: u32,
    pub dev_major: u32,
    pub dev_minor: u32,
    pub rdev_major: u32,
    pub rdev_minor: u32,
    pub check: u32,
}

impl CpioHeader {
    pub fn is_dir(&self) -> bool {
        self.mode & S_IFMT == S_IFDIR
    }

    pub fn is_file(&self) -> bool {
        self.mode & S_IFMT == S_IFREG
    }

    pub fn is_symlink(&self) -> bool {
        self.mode & S_IFMT == S_IFLNK
    }
}

/// Streaming reader for SVR4 "newc" cpio archives (magic `070701`, or
/// `070702` with an unverified checksum).
///
/// [`next_entry`](CpioReader::next_entry) advances to the next record; the
/// reader itself then yields that record's payload.
pub struct CpioReader<R> {
    inner: R,
    remaining: u64,
    padding: u64,
    finished: bool,
}

impl<R: Read> CpioReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            remaining: 0,
            padding: 0,
            finished: false,
        }
    }

    /// Skip whatever is left of the current record and read the next header.
    ///
    /// Returns `None` at the trailer record or at a clean end of file.
    pub fn next_entry(&mut self) -> io::Result<Option<CpioHeader>> {
        if self.finished {
            return Ok(None);
        }

        let skip = self.remaining + self.padding;
        if skip > 0 {
            let skipped = io::copy(&mut (&mut self.inner).take(skip), &mut io::sink())?;
            if skipped < skip {
                return Err(truncated("record payload"));
            }
            self.remaining = 0;
            self.padding = 0;
        }

        let mut raw = [0u8; HEADER_LEN];
        if !read_header(&mut self.inner, &mut raw)? {
            self.finished = true;
            return Ok(None);
        }

        let magic = &raw[..6];
        if magic != MAGIC_NEWC && magic != MAGIC_CRC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "bad cpio magic '{}', only newc archives are supported",
                    String::from_utf8_lossy(magic)
                ),
            ));
        }

        let mut fields = [0u32; 13];
        for (i, field) in fields.iter_mut().enumerate() {
            let start = 6 + i * 8;
            *field = parse_hex(&raw[start..start + 8])?;
        }
        let [
            ino,
            mode,
            uid,
            gid,
            nlink,
            mtime,
            file_size,
            dev_major,
            dev_minor,
            rdev_major,
            rdev_minor,
            name_size,
            check,
        ] = fields;

        if name_size > MAX_NAME_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("cpio member name size {name_size} exceeds {MAX_NAME_SIZE}"),
            ));
        }
        let mut name = vec![0u8; name_size as usize];
        self.inner
            .read_exact(&mut name)
            .map_err(|_| truncated("record name"))?;
        let name_padding = pad4(HEADER_LEN as u64 + name_size as u64);
        let mut pad = [0u8; 3];
        self.inner
            .read_exact(&mut pad[..name_padding as usize])
            .map_err(|_| truncated("record name"))?;

        if let Some(nul) = name.iter().position(|b| *b == 0) {
            name.truncate(nul);
        }
        let name = String::from_utf8(name).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("cpio member name is not valid UTF-8: {e}"),
            )
        })?;

        if name == TRAILER {
            self.finished = true;
            return Ok(None);
        }

        self.remaining = file_size as u64;
        self.padding = pad4(file_size as u64);

        Ok(Some(CpioHeader {
            name,
            ino,
            mode,
            uid,
            gid,
            nlink,
            mtime,
            file_size,
            dev_major,
            dev_minor,
            rdev_major,
            rdev_minor,
            check,
        }))
    }
}

impl<R: Read> Read for CpioReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Ok(0);
        }
        let max = buf.len().min(self.remaining.min(usize::MAX as u64) as usize);
        let n = self.inner.read(&mut buf[..max])?;
        self.remaining -= n as u64;
        Ok(n)
    }
}

/// Fill `buf` with a full header. `Ok(false)` means the stream ended
/// cleanly before the first byte.
fn read_header<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => return Err(truncated("record header")),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

fn parse_hex(field: &[u8]) -> io::Result<u32> {
    std::str::from_utf8(field)
        .ok()
        .and_then(|s| u32::from_str_radix(s, 16).ok())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "invalid cpio header field '{}'",
                    String::from_utf8_lossy(field)
                ),
            )
        })
}

fn pad4(len: u64) -> u64 {
    (4 - len % 4) % 4
}

fn truncated(what: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("cpio archive truncated inside {what}"),
    )
}

/// Members of a cpio archive.
///
/// newc records carry no portable access time, and hard links are not
/// modelled: a record sharing an inode with an earlier one is extracted as
/// an independent file.
pub struct CpioMembers<R> {
    archive: PathBuf,
    reader: CpioReader<R>,
}

impl<R: Read> CpioMembers<R> {
    pub fn new(archive: impl Into<PathBuf>, reader: R) -> Self {
        Self {
            archive: archive.into(),
            reader: CpioReader::new(reader),
        }
    }

    fn read_error(&self, source: io::Error) -> Error {
        Error::ReadArchive {
            archive: self.archive.clone(),
            source,
        }
    }
}

impl<R: Read> MemberSource for CpioMembers<R> {
    fn archive_path(&self) -> &Path {
        &self.archive
    }

    fn for_each_member(
        &mut self,
        visit: &mut dyn FnMut(ArchiveMember, &mut dyn Read) -> Result<()>,
    ) -> Result<()> {
        loop {
            let header = match self.reader.next_entry() {
                Ok(Some(header)) => header,
                Ok(None) => return Ok(()),
                Err(e) => return Err(self.read_error(e)),
            };

            let kind = if header.is_dir() {
                MemberKind::Directory
            } else if header.is_file() {
                MemberKind::File
            } else if header.is_symlink() {
                let mut target = String::new();
                self.reader
                    .read_to_string(&mut target)
                    .map_err(|e| self.read_error(e))?;
                if target.is_empty() {
                    MemberKind::Other
                } else {
                    MemberKind::Symlink {
                        target: PathBuf::from(target),
                    }
                }
            } else {
                MemberKind::Other
            };

            let member = ArchiveMember {
                path: PathBuf::from(&header.name),
                mode: header.mode & 0o7777,
                size: header.file_size as u64,
                mtime: FileTime::from_unix_time(header.mtime as i64, 0),
                atime: None,
                kind,
            };
            visit(member, &mut self.reader)?;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal newc writer for building fixtures.
    pub(crate) fn newc_record(out: &mut Vec<u8>, name: &str, mode: u32, data: &[u8]) {
        let name_size = name.len() + 1;
        let fields = [
            1,
            mode,
            0,
            0,
            1,
            1_700_000_000,
            data.len() as u32,
            0,
            0,
            0,
            0,
            name_size as u32,
            0,
        ];
        out.extend_from_slice(b"070701");
        for field in fields {
            out.extend_from_slice(format!("{field:08X}").as_bytes());
        }
        out.extend_from_slice(name.as_bytes());
        out.push(0);
        out.resize(out.len() + pad4((HEADER_LEN + name_size) as u64) as usize, 0);
        out.extend_from_slice(data);
        out.resize(out.len() + pad4(data.len() as u64) as usize, 0);
    }

    pub(crate) fn newc_trailer(out: &mut Vec<u8>) {
        newc_record(out, TRAILER, 0, &[]);
    }

    #[test]
    fn reads_records_and_payloads() {
        let mut data = Vec::new();
        newc_record(&mut data, "dir", 0o040755, &[]);
        newc_record(&mut data, "dir/a.txt", 0o100644, b"hello");
        newc_record(&mut data, "dir/b", 0o100600, b"xyz!");
        newc_trailer(&mut data);

        let mut reader = CpioReader::new(data.as_slice());

        let dir = reader.next_entry().unwrap().unwrap();
        assert_eq!(dir.name, "dir");
        assert!(dir.is_dir());

        let a = reader.next_entry().unwrap().unwrap();
        assert_eq!(a.name, "dir/a.txt");
        assert!(a.is_file());
        let mut content = String::new();
        reader.read_to_string(&mut content).unwrap();
        assert_eq!(content, "hello");

        // payload left unread is skipped
        let b = reader.next_entry().unwrap().unwrap();
        assert_eq!(b.file_size, 4);
        assert_eq!(b.mode & 0o7777, 0o600);

        assert!(reader.next_entry().unwrap().is_none());
        assert!(reader.next_entry().unwrap().is_none());
    }

    #[test]
    fn clean_eof_without_trailer() {
        let mut data = Vec::new();
        newc_record(&mut data, "only", 0o100644, b"1");
        let mut reader = CpioReader::new(data.as_slice());
        assert!(reader.next_entry().unwrap().is_some());
        assert!(reader.next_entry().unwrap().is_none());
    }

    #[test]
    fn crc_magic_accepted() {
        let mut data = Vec::new();
        newc_record(&mut data, "f", 0o100644, b"x");
        data[5] = b'2';
        let header = CpioReader::new(data.as_slice()).next_entry().unwrap();
        assert_eq!(header.unwrap().name, "f");
    }

    #[test]
    fn bad_magic_rejected() {
        let mut data = Vec::new();
        newc_record(&mut data, "f", 0o100644, b"x");
        data[..6].copy_from_slice(b"070707");
        let err = CpioReader::new(data.as_slice()).next_entry().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn non_hex_field_rejected() {
        let mut data = Vec::new();
        newc_record(&mut data, "f", 0o100644, b"x");
        data[10] = b'Z';
        let err = CpioReader::new(data.as_slice()).next_entry().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn oversized_name_rejected() {
        let mut data = Vec::new();
        newc_record(&mut data, "f", 0o100644, b"x");
        data[94..102].copy_from_slice(b"FFFFFFF0");
        let err = CpioReader::new(data.as_slice()).next_entry().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("name size"));
    }

    #[test]
    fn truncated_header_rejected() {
        let mut data = Vec::new();
        newc_record(&mut data, "f", 0o100644, b"x");
        data.truncate(50);
        let err = CpioReader::new(data.as_slice()).next_entry().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn truncated_payload_reads_short() {
        let mut data = Vec::new();
        newc_record(&mut data, "f", 0o100644, b"0123456789");
        data.truncate(data.len() - 8);

        let mut reader = CpioReader::new(data.as_slice());
        reader.next_entry().unwrap().unwrap();
        let mut content = Vec::new();
        reader.read_to_end(&mut content).unwrap();
        assert!(content.len() < 10);
    }

    #[test]
    fn symlink_target_from_payload() {
        let mut data = Vec::new();
        newc_record(&mut data, "link", 0o120777, b"../target");
        newc_trailer(&mut data);

        let mut members = CpioMembers::new("test.cpio", data.as_slice());
        let mut seen = Vec::new();
        members
            .for_each_member(&mut |member, _| {
                seen.push(member);
                Ok(())
            })
            .unwrap();

        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0].kind,
            MemberKind::Symlink {
                target: PathBuf::from("../target")
            }
        );
        assert_eq!(seen[0].atime, None);
    }

    #[test]
    fn device_nodes_are_other() {
        let mut data = Vec::new();
        newc_record(&mut data, "dev/null", 0o020666, &[]);
        let mut members = CpioMembers::new("test.cpio", data.as_slice());
        let mut kinds = Vec::new();
        members
            .for_each_member(&mut |member, _| {
                kinds.push(member.kind);
                Ok(())
            })
            .unwrap();
        assert_eq!(kinds, vec![MemberKind::Other]);
    }
}
