use crate::expert::{ExpertField, ExpertGroup, Severity};
use crate::tree::{FieldDisplay, HeaderField};

use FieldDisplay::*;

pub static HF_SIZE: HeaderField = HeaderField::new("Size", "9p.size", Dec);
pub static HF_TYPE: HeaderField = HeaderField::new("Type", "9p.type", Str);
pub static HF_TAG: HeaderField = HeaderField::new("Tag", "9p.tag", Dec);
pub static HF_OLDTAG: HeaderField = HeaderField::new("Old tag", "9p.oldtag", Dec);
pub static HF_FID: HeaderField = HeaderField::new("Fid", "9p.fid", Dec);
pub static HF_AFID: HeaderField = HeaderField::new("Afid", "9p.afid", Dec);
pub static HF_NEWFID: HeaderField = HeaderField::new("New fid", "9p.newfid", Dec);
pub static HF_DFID: HeaderField = HeaderField::new("Directory fid", "9p.dfid", Dec);
pub static HF_MSIZE: HeaderField = HeaderField::new("Max msg size", "9p.maxsize", Dec);
pub static HF_VERSION: HeaderField = HeaderField::new("Version", "9p.version", Str);
pub static HF_UNAME: HeaderField = HeaderField::new("User name", "9p.uname", Str);
pub static HF_ANAME: HeaderField = HeaderField::new("Aname", "9p.aname", Str);
pub static HF_N_UNAME: HeaderField = HeaderField::new("Numeric user name", "9p.n_uname", Dec);
pub static HF_ENAME: HeaderField = HeaderField::new("Error", "9p.ename", Str);
pub static HF_ERRNO: HeaderField = HeaderField::new("Errno", "9p.errno", Dec);
pub static HF_LERROR: HeaderField = HeaderField::new("Linux error", "9p.lerror", Dec);
pub static HF_NWNAME: HeaderField = HeaderField::new("Nwname", "9p.nwname", Dec);
pub static HF_WNAME: HeaderField = HeaderField::new("Wname", "9p.wname", Str);
pub static HF_NWQID: HeaderField = HeaderField::new("Nwqid", "9p.nqid", Dec);
pub static HF_QID_TYPE: HeaderField = HeaderField::new("Qid type", "9p.qidtype", Hex);
pub static HF_QID_VERS: HeaderField = HeaderField::new("Qid version", "9p.qidvers", Dec);
pub static HF_QID_PATH: HeaderField = HeaderField::new("Qid path", "9p.qidpath", Dec);
pub static HF_MODE: HeaderField = HeaderField::new("Mode", "9p.mode", Hex);
pub static HF_PERM: HeaderField = HeaderField::new("Permissions", "9p.perm", Hex);
pub static HF_EXTENSION: HeaderField = HeaderField::new("Extension", "9p.extension", Str);
pub static HF_IOUNIT: HeaderField = HeaderField::new("I/O Unit", "9p.iounit", Dec);
pub static HF_OFFSET: HeaderField = HeaderField::new("Offset", "9p.offset", Dec);
pub static HF_COUNT: HeaderField = HeaderField::new("Count", "9p.count", Dec);
pub static HF_DATA: HeaderField = HeaderField::new("Data", "9p.data", Bytes);
pub static HF_NAME: HeaderField = HeaderField::new("Name", "9p.name", Str);
pub static HF_PAYLOAD: HeaderField = HeaderField::new("Payload", "9p.payload", Bytes);

pub static HF_NSTAT: HeaderField = HeaderField::new("Stat data length", "9p.nstat", Dec);
pub static HF_STAT_SIZE: HeaderField = HeaderField::new("Stat size", "9p.stat.size", Dec);
pub static HF_STAT_TYPE: HeaderField = HeaderField::new("Stat type", "9p.stat.type", Dec);
pub static HF_STAT_DEV: HeaderField = HeaderField::new("Device", "9p.dev", Dec);
pub static HF_STAT_MODE: HeaderField = HeaderField::new("Stat mode", "9p.statmode", Hex);
pub static HF_ATIME: HeaderField = HeaderField::new("Access time", "9p.atime", Dec);
pub static HF_MTIME: HeaderField = HeaderField::new("Modify time", "9p.mtime", Dec);
pub static HF_LENGTH: HeaderField = HeaderField::new("Length", "9p.length", Dec);
pub static HF_UID: HeaderField = HeaderField::new("Uid", "9p.uid", Str);
pub static HF_GID: HeaderField = HeaderField::new("Gid", "9p.gid", Str);
pub static HF_MUID: HeaderField = HeaderField::new("Muid", "9p.muid", Str);
pub static HF_N_UID: HeaderField = HeaderField::new("Numeric uid", "9p.n_uid", Dec);
pub static HF_N_GID: HeaderField = HeaderField::new("Numeric gid", "9p.n_gid", Dec);
pub static HF_N_MUID: HeaderField = HeaderField::new("Numeric muid", "9p.n_muid", Dec);

pub static HF_LFLAGS: HeaderField = HeaderField::new("Flags", "9p.lflags", Hex);
pub static HF_LMODE: HeaderField = HeaderField::new("Mode", "9p.lmode", Hex);
pub static HF_LGID: HeaderField = HeaderField::new("Gid", "9p.lgid", Dec);
pub static HF_LUID: HeaderField = HeaderField::new("Uid", "9p.luid", Dec);
pub static HF_SYMTGT: HeaderField = HeaderField::new("Symlink target", "9p.symtgt", Str);
pub static HF_MAJOR: HeaderField = HeaderField::new("Major", "9p.major", Dec);
pub static HF_MINOR: HeaderField = HeaderField::new("Minor", "9p.minor", Dec);
pub static HF_NEWNAME: HeaderField = HeaderField::new("New name", "9p.newname", Str);
pub static HF_NEWDIRFID: HeaderField = HeaderField::new("New directory fid", "9p.newdirfid", Dec);

pub static HF_STATFS_TYPE: HeaderField = HeaderField::new("File system type", "9p.statfs.type", Hex);
pub static HF_STATFS_BSIZE: HeaderField = HeaderField::new("Block size", "9p.statfs.bsize", Dec);
pub static HF_STATFS_BLOCKS: HeaderField = HeaderField::new("Blocks", "9p.statfs.blocks", Dec);
pub static HF_STATFS_BFREE: HeaderField = HeaderField::new("Free blocks", "9p.statfs.bfree", Dec);
pub static HF_STATFS_BAVAIL: HeaderField = HeaderField::new("Available blocks", "9p.statfs.bavail", Dec);
pub static HF_STATFS_FILES: HeaderField = HeaderField::new("Files", "9p.statfs.files", Dec);
pub static HF_STATFS_FFREE: HeaderField = HeaderField::new("Free files", "9p.statfs.ffree", Dec);
pub static HF_STATFS_FSID: HeaderField = HeaderField::new("File system id", "9p.statfs.fsid", Hex);
pub static HF_STATFS_NAMELEN: HeaderField = HeaderField::new("Max name length", "9p.statfs.namelen", Dec);

pub static HF_GETATTR_MASK: HeaderField = HeaderField::new("Request mask", "9p.getattr.mask", Hex);
pub static HF_GETATTR_VALID: HeaderField = HeaderField::new("Valid", "9p.getattr.valid", Hex);
pub static HF_NLINK: HeaderField = HeaderField::new("Links", "9p.nlink", Dec);
pub static HF_RDEV: HeaderField = HeaderField::new("Rdev", "9p.rdev", Dec);
pub static HF_BLKSIZE: HeaderField = HeaderField::new("Block size", "9p.blksize", Dec);
pub static HF_BLOCKS: HeaderField = HeaderField::new("Blocks", "9p.blocks", Dec);
pub static HF_LATIME: HeaderField = HeaderField::new("Access time", "9p.latime", Time);
pub static HF_LMTIME: HeaderField = HeaderField::new("Modify time", "9p.lmtime", Time);
pub static HF_LCTIME: HeaderField = HeaderField::new("Change time", "9p.lctime", Time);
pub static HF_LBTIME: HeaderField = HeaderField::new("Birth time", "9p.lbtime", Time);
pub static HF_GEN: HeaderField = HeaderField::new("Generation", "9p.gen", Dec);
pub static HF_DATA_VERSION: HeaderField = HeaderField::new("Data version", "9p.data_version", Dec);
pub static HF_SETATTR_VALID: HeaderField = HeaderField::new("Valid", "9p.setattr.valid", Hex);

pub static HF_XATTR_SIZE: HeaderField = HeaderField::new("Attribute size", "9p.xattr.size", Dec);
pub static HF_XATTR_FLAGS: HeaderField = HeaderField::new("Attribute flags", "9p.xattr.flags", Hex);
pub static HF_DATASYNC: HeaderField = HeaderField::new("Datasync", "9p.datasync", Dec);
pub static HF_LOCK_TYPE: HeaderField = HeaderField::new("Lock type", "9p.lock.type", Dec);
pub static HF_LOCK_FLAGS: HeaderField = HeaderField::new("Lock flags", "9p.lock.flags", Hex);
pub static HF_LOCK_START: HeaderField = HeaderField::new("Lock start", "9p.lock.start", Dec);
pub static HF_LOCK_LENGTH: HeaderField = HeaderField::new("Lock length", "9p.lock.length", Dec);
pub static HF_LOCK_PROC_ID: HeaderField = HeaderField::new("Process id", "9p.lock.proc_id", Dec);
pub static HF_LOCK_CLIENT_ID: HeaderField = HeaderField::new("Client id", "9p.lock.client_id", Str);
pub static HF_LOCK_STATUS: HeaderField = HeaderField::new("Lock status", "9p.lock.status", Dec);
pub static HF_UNLINKAT_FLAGS: HeaderField = HeaderField::new("Unlink flags", "9p.unlinkat.flags", Hex);

pub static HF_PATH: HeaderField = HeaderField::new("Path", "9p.path", Str);
pub static HF_NEWPATH: HeaderField = HeaderField::new("New path", "9p.newpath", Str);
pub static HF_REQUEST_IN: HeaderField = HeaderField::new("Request in frame", "9p.request_in", Dec);
pub static HF_REQUEST_TYPE: HeaderField = HeaderField::new("Request type", "9p.request_type", Str);

pub static EI_MALFORMED: ExpertField = ExpertField::new(
    "9p.malformed",
    ExpertGroup::Malformed,
    Severity::Error,
    "Malformed 9P message",
);
pub static EI_UNKNOWN_TYPE: ExpertField = ExpertField::new(
    "9p.unknown_type",
    ExpertGroup::Undecoded,
    Severity::Warn,
    "Unknown message type",
);
pub static EI_TRUNCATED_LIST: ExpertField = ExpertField::new(
    "9p.list_truncated",
    ExpertGroup::Protocol,
    Severity::Warn,
    "List longer than the protocol maximum",
);
pub static EI_TRAILING: ExpertField = ExpertField::new(
    "9p.trailing",
    ExpertGroup::Undecoded,
    Severity::Warn,
    "Trailing bytes after message body",
);
pub static EI_NO_REQUEST: ExpertField = ExpertField::new(
    "9p.no_request",
    ExpertGroup::Sequence,
    Severity::Note,
    "Response without a matching request",
);
